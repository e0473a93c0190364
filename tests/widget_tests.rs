use async_trait::async_trait;
use retail_assistant::config::WidgetConfig;
use retail_assistant::events::WidgetEvent;
use retail_assistant::models::chat::{
    greeting_pane,
    ChatMessage,
    ConversationSummary,
    SendRequest,
    SendResponse,
};
use retail_assistant::notice::Severity;
use retail_assistant::storage::{
    KeyValueStore,
    MemoryStore,
    CONVERSATION_KEY,
    LEGACY_CONVERSATION_KEY,
};
use retail_assistant::transport::{ ChatTransport, RateLimitPolicy, TransportError };
use retail_assistant::widget::{
    ChatWidget,
    FailureKind,
    SendOutcome,
    BUSY_NOTICE,
    DELETE_FAILED_NOTICE,
    HISTORY_FAILED_NOTICE,
    LIST_FAILED_NOTICE,
    SEND_FAILED_NOTICE,
};
use std::collections::VecDeque;
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Default)]
struct FakeTransport {
    lists: Mutex<VecDeque<Result<Vec<ConversationSummary>, TransportError>>>,
    histories: Mutex<VecDeque<Result<Vec<ChatMessage>, TransportError>>>,
    sends: Mutex<VecDeque<Result<SendResponse, TransportError>>>,
    deletes: Mutex<VecDeque<Result<(), TransportError>>>,
    send_gate: Mutex<Option<oneshot::Receiver<()>>>,
    calls: Mutex<Vec<String>>,
    sent: Mutex<Vec<SendRequest>>,
}

impl FakeTransport {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn push_list(&self, list: Result<Vec<ConversationSummary>, TransportError>) {
        self.lists.lock().unwrap().push_back(list);
    }

    fn push_history(&self, history: Result<Vec<ChatMessage>, TransportError>) {
        self.histories.lock().unwrap().push_back(history);
    }

    fn push_send(&self, response: Result<SendResponse, TransportError>) {
        self.sends.lock().unwrap().push_back(response);
    }

    fn push_delete(&self, response: Result<(), TransportError>) {
        self.deletes.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn list_conversations(
        &self,
        user_id: &str
    ) -> Result<Vec<ConversationSummary>, TransportError> {
        self.record(format!("list {}", user_id));
        self.lists.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn load_messages(&self, conversation_id: i64) -> Result<Vec<ChatMessage>, TransportError> {
        self.record(format!("load {}", conversation_id));
        self.histories.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send(&self, request: &SendRequest) -> Result<SendResponse, TransportError> {
        self.record(format!("send {}", request.mensaje));
        self.sent.lock().unwrap().push(request.clone());
        let gate = self.send_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.sends.lock().unwrap().pop_front().unwrap_or_else(|| Ok(SendResponse::default()))
    }

    async fn delete_conversation(&self, conversation_id: i64) -> Result<(), TransportError> {
        self.record(format!("delete {}", conversation_id));
        self.deletes.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

fn summary(id: i64, title: &str) -> ConversationSummary {
    ConversationSummary { id, title: title.to_string(), updated_at: None }
}

fn http_error(status: u16, body: &str) -> TransportError {
    TransportError::Status { status, body: body.to_string() }
}

struct Harness {
    widget: Arc<ChatWidget>,
    transport: Arc<FakeTransport>,
    store: Arc<MemoryStore>,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    fn with_store(store: Arc<MemoryStore>) -> Self {
        let transport = Arc::new(FakeTransport::default());
        let widget = Arc::new(
            ChatWidget::new(transport.clone(), store.clone(), WidgetConfig::default())
        );
        Self { widget, transport, store }
    }
}

#[tokio::test]
async fn blank_message_is_ignored() {
    let h = Harness::new();
    let before = h.widget.snapshot();

    assert_eq!(h.widget.send_message("").await, SendOutcome::Skipped);
    assert_eq!(h.widget.send_message("   \n\t").await, SendOutcome::Skipped);

    assert!(h.transport.calls().is_empty());
    assert_eq!(h.widget.snapshot(), before);
}

#[tokio::test]
async fn first_message_adopts_backend_conversation() {
    let h = Harness::new();
    assert!(h.widget.snapshot().shows_greeting_only());

    h.transport.push_send(
        Ok(SendResponse {
            respuesta: Some("Hola, ¿en qué ayudo?".into()),
            conversacion_id: Some(42),
        })
    );
    h.transport.push_list(Ok(vec![summary(42, "Hola")]));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _sub = h.widget.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    let outcome = h.widget.send_message("Hola").await;
    assert_eq!(outcome, SendOutcome::Delivered { conversation_id: Some(42) });

    let snap = h.widget.snapshot();
    assert_eq!(
        snap.messages,
        vec![ChatMessage::greeting(), ChatMessage::user("Hola"), ChatMessage::bot("Hola, ¿en qué ayudo?")]
    );
    assert_eq!(snap.active_conversation, Some(42));
    assert!(!snap.busy);
    assert_eq!(snap.conversations, vec![summary(42, "Hola")]);
    assert_eq!(h.store.get(CONVERSATION_KEY).as_deref(), Some("42"));
    assert_eq!(h.store.get(LEGACY_CONVERSATION_KEY).as_deref(), Some("42"));

    let sent = h.transport.sent.lock().unwrap().clone();
    assert_eq!(sent[0].usuario_id, "user-123");
    assert_eq!(sent[0].conversacion_id, None);
    assert_eq!(h.transport.calls(), vec!["send Hola", "list user-123"]);

    let events = seen.lock().unwrap().clone();
    assert!(events.contains(&WidgetEvent::BusyChanged(true)));
    assert!(events.contains(&WidgetEvent::ActiveConversationChanged(Some(42))));
    assert_eq!(events.last(), Some(&WidgetEvent::ConversationsChanged));
}

#[tokio::test]
async fn follow_up_message_reuses_active_conversation() {
    let store = Arc::new(MemoryStore::new());
    store.set(CONVERSATION_KEY, "7").unwrap();
    let h = Harness::with_store(store);
    h.transport.push_send(Ok(SendResponse { respuesta: None, conversacion_id: None }));

    let outcome = h.widget.send_message("¿Y el stock?").await;
    assert_eq!(outcome, SendOutcome::Delivered { conversation_id: Some(7) });

    let sent = h.transport.sent.lock().unwrap().clone();
    assert_eq!(sent[0].conversacion_id, Some(7));
    let snap = h.widget.snapshot();
    assert_eq!(snap.messages.last().unwrap().text, "🤖 Sin respuesta del servidor.");
    assert_eq!(snap.active_conversation, Some(7));
}

#[tokio::test]
async fn send_while_in_flight_is_a_no_op() {
    let h = Harness::new();
    let (release, gate) = oneshot::channel();
    *h.transport.send_gate.lock().unwrap() = Some(gate);
    h.transport.push_send(Ok(SendResponse { respuesta: Some("ok".into()), conversacion_id: Some(1) }));

    let widget = h.widget.clone();
    let first = tokio::spawn(async move { widget.send_message("uno").await });

    while !h.widget.snapshot().busy {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.widget.send_message("dos").await, SendOutcome::Skipped);
    assert_eq!(h.widget.snapshot().messages.len(), 2);

    release.send(()).unwrap();
    assert_eq!(first.await.unwrap(), SendOutcome::Delivered { conversation_id: Some(1) });
    assert_eq!(h.transport.sent.lock().unwrap().len(), 1);
    assert!(!h.widget.snapshot().busy);
}

#[tokio::test]
async fn rate_limited_send_warns() {
    let h = Harness::new();
    h.widget.set_draft("Hola");
    h.transport.push_send(Err(http_error(500, "Gemini error: RESOURCE_EXHAUSTED")));

    let outcome = h.widget.send_draft().await;
    assert_eq!(outcome, SendOutcome::Failed(FailureKind::RateLimited));

    let notice = h.widget.notification();
    assert!(notice.visible);
    assert_eq!(notice.text, BUSY_NOTICE);
    assert_eq!(notice.severity, Severity::Warning);

    let snap = h.widget.snapshot();
    assert!(!snap.busy);
    assert_eq!(snap.draft, "");
    assert_eq!(snap.active_conversation, None);
    // The optimistic turn stays; no list refresh after a failure.
    assert_eq!(snap.messages.last(), Some(&ChatMessage::user("Hola")));
    assert_eq!(h.transport.calls(), vec!["send Hola"]);
}

#[tokio::test]
async fn other_send_failures_are_danger() {
    let h = Harness::new();
    h.transport.push_send(Err(TransportError::Network("connection refused".into())));
    assert_eq!(h.widget.send_message("Hola").await, SendOutcome::Failed(FailureKind::Other));
    let notice = h.widget.notification();
    assert_eq!(notice.text, SEND_FAILED_NOTICE);
    assert_eq!(notice.severity, Severity::Danger);

    h.transport.push_send(Err(http_error(429, "")));
    assert_eq!(
        h.widget.send_message("otra vez").await,
        SendOutcome::Failed(FailureKind::RateLimited)
    );
}

#[tokio::test]
async fn wrapped_upstream_429_warns() {
    let h = Harness::new();
    h.transport.push_send(Err(http_error(500, "Gemini API error 429 Too Many Requests")));

    assert_eq!(h.widget.send_message("Hola").await, SendOutcome::Failed(FailureKind::RateLimited));
    let notice = h.widget.notification();
    assert!(notice.visible);
    assert_eq!(notice.text, BUSY_NOTICE);
    assert_eq!(notice.severity, Severity::Warning);
}

#[tokio::test]
async fn rate_limit_predicate_is_configurable() {
    let transport = Arc::new(FakeTransport::default());
    let config = WidgetConfig {
        rate_limit: RateLimitPolicy::with_predicate(|e| e.status() == Some(503)),
        ..WidgetConfig::default()
    };
    let widget = ChatWidget::new(transport.clone(), Arc::new(MemoryStore::new()), config);

    transport.push_send(Err(http_error(429, "resource_exhausted")));
    assert_eq!(widget.send_message("a").await, SendOutcome::Failed(FailureKind::Other));
    transport.push_send(Err(http_error(503, "")));
    assert_eq!(widget.send_message("b").await, SendOutcome::Failed(FailureKind::RateLimited));
}

#[tokio::test]
async fn deleting_active_conversation_resets_to_greeting() {
    let h = Harness::new();
    h.transport.push_list(Ok(vec![summary(42, "Ventas"), summary(43, "Stock")]));
    h.transport.push_history(Ok(vec![ChatMessage::user("Hola"), ChatMessage::bot("Hola!")]));
    assert!(h.widget.refresh_conversations().await);
    assert!(h.widget.select_conversation(42).await);
    assert_eq!(h.widget.snapshot().messages.len(), 2);

    assert!(h.widget.delete_conversation(42).await);

    let snap = h.widget.snapshot();
    assert_eq!(snap.messages, greeting_pane());
    assert_eq!(snap.active_conversation, None);
    assert_eq!(snap.conversations, vec![summary(43, "Stock")]);
    assert_eq!(h.store.get(CONVERSATION_KEY), None);
    assert_eq!(h.store.get(LEGACY_CONVERSATION_KEY), None);
    let notice = h.widget.notification();
    assert_eq!(notice.text, "Conversación eliminada.");
    assert_eq!(notice.severity, Severity::Success);
}

#[tokio::test]
async fn deleting_other_conversation_keeps_pane() {
    let h = Harness::new();
    h.transport.push_list(Ok(vec![summary(1, "a"), summary(2, "b")]));
    h.transport.push_history(Ok(vec![ChatMessage::user("x")]));
    h.widget.refresh_conversations().await;
    h.widget.select_conversation(1).await;

    assert!(h.widget.delete_conversation(2).await);
    let snap = h.widget.snapshot();
    assert_eq!(snap.active_conversation, Some(1));
    assert_eq!(snap.messages, vec![ChatMessage::user("x")]);
    assert_eq!(snap.conversations, vec![summary(1, "a")]);
}

#[tokio::test]
async fn failed_delete_changes_nothing() {
    let h = Harness::new();
    h.transport.push_send(
        Ok(SendResponse { respuesta: Some("Hola, ¿en qué ayudo?".into()), conversacion_id: Some(42) })
    );
    h.transport.push_list(Ok(vec![summary(42, "Hola")]));
    h.widget.send_message("Hola").await;
    let before = h.widget.snapshot();

    h.transport.push_delete(Err(http_error(500, "")));
    assert!(!h.widget.delete_conversation(42).await);

    assert_eq!(h.widget.snapshot(), before);
    assert_eq!(h.widget.active_conversation(), Some(42));
    assert_eq!(h.store.get(CONVERSATION_KEY).as_deref(), Some("42"));
    let notice = h.widget.notification();
    assert_eq!(notice.text, DELETE_FAILED_NOTICE);
    assert_eq!(notice.severity, Severity::Danger);
}

#[tokio::test]
async fn empty_conversation_shows_greeting() {
    let h = Harness::new();
    h.transport.push_history(Ok(Vec::new()));
    assert!(h.widget.select_conversation(9).await);

    let snap = h.widget.snapshot();
    assert_eq!(snap.active_conversation, Some(9));
    assert!(snap.shows_greeting_only());
    assert!(!snap.loading_history);
    assert_eq!(h.store.get(CONVERSATION_KEY).as_deref(), Some("9"));
}

#[tokio::test]
async fn failed_history_keeps_selection_and_pane() {
    let h = Harness::new();
    h.transport.push_history(Ok(vec![ChatMessage::user("viejo")]));
    h.widget.select_conversation(1).await;

    h.transport.push_history(Err(http_error(404, "")));
    assert!(!h.widget.select_conversation(2).await);

    let snap = h.widget.snapshot();
    assert_eq!(snap.active_conversation, Some(2));
    assert_eq!(snap.messages, vec![ChatMessage::user("viejo")]);
    assert!(!snap.loading_history);
    assert_eq!(h.widget.notification().text, HISTORY_FAILED_NOTICE);
}

#[tokio::test]
async fn failed_list_keeps_previous_list() {
    let h = Harness::new();
    h.transport.push_list(Ok(vec![summary(1, "a")]));
    h.widget.refresh_conversations().await;

    h.transport.push_list(Err(TransportError::Decode("expected array".into())));
    assert!(!h.widget.list_conversations("user-123").await);

    assert_eq!(h.widget.snapshot().conversations, vec![summary(1, "a")]);
    let notice = h.widget.notification();
    assert_eq!(notice.text, LIST_FAILED_NOTICE);
    assert_eq!(notice.severity, Severity::Warning);
}

#[tokio::test]
async fn new_conversation_clears_storage() {
    let h = Harness::new();
    h.transport.push_history(Ok(vec![ChatMessage::user("x")]));
    h.widget.select_conversation(5).await;

    h.widget.start_new_conversation();

    let snap = h.widget.snapshot();
    assert_eq!(snap.active_conversation, None);
    assert!(snap.shows_greeting_only());
    assert_eq!(h.store.get(CONVERSATION_KEY), None);
    let notice = h.widget.notification();
    assert_eq!(notice.severity, Severity::Info);
    assert_eq!(notice.text, "Nueva conversación iniciada.");
}

#[tokio::test]
async fn opening_restores_persisted_conversation() {
    let store = Arc::new(MemoryStore::new());
    store.set(LEGACY_CONVERSATION_KEY, "42").unwrap();
    let h = Harness::with_store(store);
    h.transport.push_list(Ok(vec![summary(42, "Ventas")]));
    h.transport.push_history(Ok(vec![ChatMessage::user("Hola"), ChatMessage::bot("¡Hola!")]));

    h.widget.open().await;
    h.widget.open().await;

    let snap = h.widget.snapshot();
    assert!(snap.open);
    assert_eq!(snap.active_conversation, Some(42));
    assert_eq!(snap.messages.len(), 2);
    assert_eq!(h.transport.calls(), vec!["list user-123", "load 42"]);

    h.widget.close();
    assert!(!h.widget.snapshot().open);
}

#[tokio::test]
async fn opening_without_history_only_lists() {
    let h = Harness::new();
    h.widget.open().await;
    assert_eq!(h.transport.calls(), vec!["list user-123"]);
    assert!(h.widget.snapshot().shows_greeting_only());
}

#[tokio::test(start_paused = true)]
async fn notices_auto_hide_once() {
    let h = Harness::new();
    let hides = Arc::new(Mutex::new(0));
    let counter = hides.clone();
    let _sub = h.widget.subscribe(move |e| {
        if *e == WidgetEvent::NotificationHidden {
            *counter.lock().unwrap() += 1;
        }
    });

    h.transport.push_delete(Err(http_error(500, "")));
    h.widget.delete_conversation(1).await;
    tokio::time::sleep(Duration::from_millis(1000)).await;
    h.widget.start_new_conversation();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(!h.widget.notification().visible);
    assert_eq!(h.widget.notification().text, "Nueva conversación iniciada.");
    assert_eq!(*hides.lock().unwrap(), 1);
}

#[tokio::test]
async fn dismissing_hides_the_notice() {
    let h = Harness::new();
    h.widget.start_new_conversation();
    assert!(h.widget.notification().visible);

    h.widget.dismiss_notification();
    let notice = h.widget.notification();
    assert!(!notice.visible);
    assert_eq!(notice.text, "Nueva conversación iniciada.");
}
