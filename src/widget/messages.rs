use log::{ debug, error, info };

use super::{ ChatWidget, BUSY_NOTICE, SEND_FAILED_NOTICE };
use crate::events::WidgetEvent;
use crate::models::chat::{ ChatMessage, SendRequest };
use crate::notice::Severity;
use crate::storage::save_conversation_id;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank text, or another send still in flight.
    Skipped,
    Delivered {
        conversation_id: Option<i64>,
    },
    Failed(FailureKind),
}

impl ChatWidget {
    pub async fn send_draft(&self) -> SendOutcome {
        let draft = self.lock_state().draft.clone();
        self.send_message(&draft).await
    }

    pub async fn send_message(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Skipped;
        }

        let conversation_id = {
            let mut state = self.lock_state();
            if state.busy {
                debug!("Send ignored: another message is in flight");
                return SendOutcome::Skipped;
            }
            state.busy = true;
            state.messages.push(ChatMessage::user(text));
            state.active_conversation
        };
        self.publish_all(vec![WidgetEvent::MessagesChanged, WidgetEvent::BusyChanged(true)]);

        let request = SendRequest {
            usuario_id: self.config.user_id.clone(),
            conversacion_id: conversation_id,
            mensaje: text.to_string(),
        };

        let outcome = match self.transport.send(&request).await {
            Ok(response) => {
                let reply = response.reply_text();
                let adopted = response.conversacion_id;
                {
                    let mut state = self.lock_state();
                    state.messages.push(ChatMessage::bot(reply));
                    if adopted.is_some() {
                        state.active_conversation = adopted;
                    }
                }
                let mut events = vec![WidgetEvent::MessagesChanged];
                if let Some(id) = adopted {
                    save_conversation_id(self.store.as_ref(), id);
                    if conversation_id != Some(id) {
                        info!("Now in conversation {}", id);
                        events.push(WidgetEvent::ActiveConversationChanged(Some(id)));
                    }
                }
                self.publish_all(events);
                SendOutcome::Delivered { conversation_id: adopted.or(conversation_id) }
            }
            Err(e) => {
                error!("Send failed: {}", e);
                let kind = if self.config.rate_limit.is_rate_limited(&e) {
                    self.notify(BUSY_NOTICE, Severity::Warning, None);
                    FailureKind::RateLimited
                } else {
                    self.notify(SEND_FAILED_NOTICE, Severity::Danger, None);
                    FailureKind::Other
                };
                SendOutcome::Failed(kind)
            }
        };

        {
            let mut state = self.lock_state();
            state.busy = false;
            state.draft.clear();
        }
        self.publish_all(vec![WidgetEvent::BusyChanged(false), WidgetEvent::DraftChanged]);

        if matches!(outcome, SendOutcome::Delivered { .. }) {
            // Titles and ordering come from the backend.
            self.refresh_conversations().await;
        }
        outcome
    }
}
