use log::{ debug, warn };
use std::fmt;
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::events::{ EventBus, WidgetEvent };

pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_millis(2500);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Success,
    Warning,
    Danger,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Success => "ok",
            Severity::Warning => "aviso",
            Severity::Danger => "error",
            Severity::Info => "info",
        };
        write!(f, "{}", label)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub severity: Severity,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationState {
    pub visible: bool,
    pub text: String,
    pub severity: Severity,
}

#[derive(Default)]
struct Slot {
    state: NotificationState,
    /// Bumped on every show/hide; a timer only hides the generation it was
    /// started for.
    generation: u64,
}

struct Shared {
    slot: Mutex<Slot>,
    bus: Arc<EventBus>,
}

impl Shared {
    fn expire(&self, generation: u64) {
        let hidden = match self.slot.lock() {
            Ok(mut slot) if slot.generation == generation && slot.state.visible => {
                slot.state.visible = false;
                true
            }
            _ => false,
        };
        if hidden {
            debug!("Notification auto-hidden");
            self.bus.publish(WidgetEvent::NotificationHidden);
        }
    }
}

/// Single-slot snackbar. The newest notification always wins and restarts
/// the auto-hide timer.
pub struct Notifier {
    shared: Arc<Shared>,
    pending: Mutex<Option<JoinHandle<()>>>,
    default_duration: Duration,
}

impl Notifier {
    pub fn new(bus: Arc<EventBus>, default_duration: Duration) -> Self {
        Self {
            shared: Arc::new(Shared { slot: Mutex::new(Slot::default()), bus }),
            pending: Mutex::new(None),
            default_duration,
        }
    }

    pub fn state(&self) -> NotificationState {
        self.shared.slot
            .lock()
            .map(|slot| slot.state.clone())
            .unwrap_or_default()
    }

    pub fn show(&self, text: impl Into<String>, severity: Severity, duration: Option<Duration>) {
        let text = text.into();
        let generation = match self.shared.slot.lock() {
            Ok(mut slot) => {
                slot.generation += 1;
                slot.state = NotificationState { visible: true, text: text.clone(), severity };
                slot.generation
            }
            Err(_) => {
                return;
            }
        };
        self.cancel_timer();
        self.shared.bus.publish(WidgetEvent::NotificationShown(Notification { text, severity }));

        let duration = duration.unwrap_or(self.default_duration);
        match Handle::try_current() {
            Ok(handle) => {
                let shared = self.shared.clone();
                let timer = handle.spawn(async move {
                    tokio::time::sleep(duration).await;
                    shared.expire(generation);
                });
                if let Ok(mut pending) = self.pending.lock() {
                    *pending = Some(timer);
                }
            }
            Err(_) => warn!("No async runtime; notification will stay until hidden"),
        }
    }

    /// Hides now. Text and severity are kept until the next `show`.
    pub fn hide(&self) {
        let was_visible = match self.shared.slot.lock() {
            Ok(mut slot) => {
                slot.generation += 1;
                std::mem::replace(&mut slot.state.visible, false)
            }
            Err(_) => false,
        };
        self.cancel_timer();
        if was_visible {
            self.shared.bus.publish(WidgetEvent::NotificationHidden);
        }
    }

    fn cancel_timer(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(timer) = pending.take() {
                timer.abort();
            }
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
