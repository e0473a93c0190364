use chrono::{ DateTime, Local, NaiveDateTime };
use serde::{ Deserialize, Deserializer, Serialize };

pub const GREETING: &str = "👋 ¡Hola! Soy tu asistente IA. ¿En qué puedo ayudarte hoy?";
pub const EMPTY_REPLY: &str = "🤖 Sin respuesta del servidor.";

/// Role label the backend uses for turns written by the user.
const USER_ROLE: &str = "USUARIO";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn from_role(role: &str) -> Self {
        if role == USER_ROLE { Sender::User } else { Sender::Bot }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { sender: Sender::User, text: text.into() }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { sender: Sender::Bot, text: text.into() }
    }

    pub fn greeting() -> Self {
        Self::bot(GREETING)
    }

    pub fn is_greeting(&self) -> bool {
        self.sender == Sender::Bot && self.text == GREETING
    }
}

/// The message pane shown when no conversation is active.
pub fn greeting_pane() -> Vec<ChatMessage> {
    vec![ChatMessage::greeting()]
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: i64,
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(rename = "actualizadaEn", default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

impl ConversationSummary {
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            format!("Conversación {}", self.id)
        } else {
            self.title.clone()
        }
    }
}

/// Accepts RFC 3339 timestamps (converted to local time) as well as the
/// zone-less ISO local date-times the backend emits. Unknown shapes decode
/// as `None` so one bad row never sinks the whole list.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where D: Deserializer<'de>
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(parse_timestamp))
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// One row of `GET /conversations/{id}/messages`.
#[derive(Clone, Debug, Deserialize)]
pub struct StoredTurn {
    pub rol: String,
    #[serde(default)]
    pub contenido: String,
}

impl From<StoredTurn> for ChatMessage {
    fn from(turn: StoredTurn) -> Self {
        ChatMessage {
            sender: Sender::from_role(&turn.rol),
            text: turn.contenido,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub usuario_id: String,
    pub conversacion_id: Option<i64>,
    pub mensaje: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    #[serde(default)]
    pub respuesta: Option<String>,
    #[serde(default)]
    pub conversacion_id: Option<i64>,
}

impl SendResponse {
    pub fn reply_text(&self) -> String {
        match self.respuesta.as_deref() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => EMPTY_REPLY.to_string(),
        }
    }
}
