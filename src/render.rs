use std::fmt::Write as _;

use crate::config::ASSISTANT_NAME;
use crate::models::chat::{ ConversationSummary, Sender };
use crate::notice::NotificationState;
use crate::widget::WidgetSnapshot;

const RULE: &str = "────────────────────────────────────────";

fn conversation_line(conversation: &ConversationSummary, active: bool) -> String {
    let marker = if active { "▶" } else { " " };
    let when = conversation.updated_at
        .map(|t| t.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| "—".to_string());
    format!("{} [{}] {}  ({})", marker, conversation.id, conversation.display_title(), when)
}

pub fn render_sidebar(snapshot: &WidgetSnapshot) -> String {
    let mut out = String::from("Tus conversaciones\n");
    if snapshot.conversations.is_empty() {
        out.push_str("  No tienes conversaciones aún.\n");
        return out;
    }
    for c in &snapshot.conversations {
        let active = snapshot.active_conversation == Some(c.id);
        let _ = writeln!(out, "{}", conversation_line(c, active));
    }
    out
}

pub fn render_messages(snapshot: &WidgetSnapshot) -> String {
    let mut out = String::new();
    if snapshot.loading_history {
        out.push_str("… Cargando historial...\n");
    }
    for m in &snapshot.messages {
        let who = match m.sender {
            Sender::User => "Tú",
            Sender::Bot => "IA",
        };
        let _ = writeln!(out, "{}: {}", who, m.text);
    }
    if snapshot.busy {
        out.push_str("… Pensando...\n");
    }
    out
}

/// Full widget as text: header, sidebar, message pane and snackbar.
pub fn render(snapshot: &WidgetSnapshot, notification: &NotificationState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n{}", ASSISTANT_NAME, RULE);
    out.push_str(&render_sidebar(snapshot));
    let _ = writeln!(out, "{}", RULE);
    out.push_str(&render_messages(snapshot));
    if notification.visible {
        let _ = writeln!(out, "{}\n[{}] {}", RULE, notification.severity, notification.text);
    }
    out
}
