mod conversations;
mod messages;

use log::{ info, warn };
use std::sync::{ Arc, Mutex, MutexGuard };
use std::time::Duration;

use crate::config::WidgetConfig;
use crate::events::{ EventBus, Subscription, WidgetEvent };
use crate::models::chat::{ greeting_pane, ChatMessage, ConversationSummary };
use crate::notice::{ NotificationState, Notifier, Severity };
use crate::storage::{ load_conversation_id, KeyValueStore };
use crate::transport::ChatTransport;

pub use self::messages::{ FailureKind, SendOutcome };

pub const NEW_CONVERSATION_NOTICE: &str = "Nueva conversación iniciada.";
pub const DELETED_NOTICE: &str = "Conversación eliminada.";
pub const DELETE_FAILED_NOTICE: &str = "No se pudo eliminar la conversación.";
pub const LIST_FAILED_NOTICE: &str = "No se pudieron cargar las conversaciones.";
pub const HISTORY_FAILED_NOTICE: &str = "No se pudo cargar el historial.";
pub const BUSY_NOTICE: &str = "Servicio saturado. Intenta en unos segundos.";
pub const SEND_FAILED_NOTICE: &str = "Error al conectar con el servidor.";

/// Everything the view needs to draw the widget.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetSnapshot {
    pub open: bool,
    pub conversations: Vec<ConversationSummary>,
    pub active_conversation: Option<i64>,
    pub messages: Vec<ChatMessage>,
    pub busy: bool,
    pub loading_history: bool,
    pub draft: String,
}

impl WidgetSnapshot {
    fn initial(active_conversation: Option<i64>) -> Self {
        Self {
            open: false,
            conversations: Vec::new(),
            active_conversation,
            messages: greeting_pane(),
            busy: false,
            loading_history: false,
            draft: String::new(),
        }
    }

    pub fn shows_greeting_only(&self) -> bool {
        self.messages.len() == 1 && self.messages[0].is_greeting()
    }
}

/// The chat widget: conversation store, message pipeline and snackbar,
/// wired to a backend transport and durable storage.
///
/// State is only touched under a short-lived lock that is never held across
/// a network call; every change is announced on the event bus.
pub struct ChatWidget {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn KeyValueStore>,
    config: WidgetConfig,
    state: Mutex<WidgetSnapshot>,
    bus: Arc<EventBus>,
    notifier: Notifier,
}

impl ChatWidget {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn KeyValueStore>,
        config: WidgetConfig
    ) -> Self {
        let restored = load_conversation_id(store.as_ref());
        if let Some(id) = restored {
            info!("Restored active conversation {}", id);
        }
        let bus = EventBus::new();
        let notifier = Notifier::new(bus.clone(), config.notice_duration);
        Self {
            transport,
            store,
            config,
            state: Mutex::new(WidgetSnapshot::initial(restored)),
            bus,
            notifier,
        }
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        self.lock_state().clone()
    }

    pub fn notification(&self) -> NotificationState {
        self.notifier.state()
    }

    pub fn active_conversation(&self) -> Option<i64> {
        self.lock_state().active_conversation
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
        where F: Fn(&WidgetEvent) + Send + Sync + 'static
    {
        self.bus.subscribe(callback)
    }

    /// Opens the widget: loads the sidebar and, if a conversation id was
    /// restored from storage, its history.
    pub async fn open(&self) {
        let restored = {
            let mut state = self.lock_state();
            if state.open {
                return;
            }
            state.open = true;
            state.active_conversation.filter(|_| state.messages.len() <= 1)
        };
        self.bus.publish(WidgetEvent::OpenChanged(true));

        self.refresh_conversations().await;
        if let Some(id) = restored {
            self.load_messages(id).await;
        }
    }

    pub fn close(&self) {
        let changed = {
            let mut state = self.lock_state();
            std::mem::replace(&mut state.open, false)
        };
        if changed {
            self.bus.publish(WidgetEvent::OpenChanged(false));
        }
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.lock_state().draft = text.into();
        self.bus.publish(WidgetEvent::DraftChanged);
    }

    pub fn dismiss_notification(&self) {
        self.notifier.hide();
    }

    fn notify(&self, text: &str, severity: Severity, millis: Option<u64>) {
        self.notifier.show(text, severity, millis.map(Duration::from_millis));
    }

    fn lock_state(&self) -> MutexGuard<'_, WidgetSnapshot> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Widget state lock was poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }

    fn publish_all(&self, events: Vec<WidgetEvent>) {
        for event in events {
            self.bus.publish(event);
        }
    }
}
