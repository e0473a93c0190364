use log::{ error, info };

use super::{
    ChatWidget,
    DELETED_NOTICE,
    DELETE_FAILED_NOTICE,
    HISTORY_FAILED_NOTICE,
    LIST_FAILED_NOTICE,
    NEW_CONVERSATION_NOTICE,
};
use crate::events::WidgetEvent;
use crate::models::chat::greeting_pane;
use crate::notice::Severity;
use crate::storage::{ clear_conversation_id, save_conversation_id };

impl ChatWidget {
    /// Replaces the sidebar list with the backend's. On failure the previous
    /// list is kept.
    pub async fn list_conversations(&self, user_id: &str) -> bool {
        match self.transport.list_conversations(user_id).await {
            Ok(conversations) => {
                info!("Loaded {} conversations for {}", conversations.len(), user_id);
                self.lock_state().conversations = conversations;
                self.bus.publish(WidgetEvent::ConversationsChanged);
                true
            }
            Err(e) => {
                error!("Error loading conversations: {}", e);
                self.notify(LIST_FAILED_NOTICE, Severity::Warning, None);
                false
            }
        }
    }

    pub async fn refresh_conversations(&self) -> bool {
        let user_id = self.config.user_id.clone();
        self.list_conversations(&user_id).await
    }

    pub async fn select_conversation(&self, id: i64) -> bool {
        self.lock_state().active_conversation = Some(id);
        save_conversation_id(self.store.as_ref(), id);
        self.bus.publish(WidgetEvent::ActiveConversationChanged(Some(id)));
        self.load_messages(id).await
    }

    pub fn start_new_conversation(&self) {
        {
            let mut state = self.lock_state();
            state.active_conversation = None;
            state.messages = greeting_pane();
        }
        clear_conversation_id(self.store.as_ref());
        self.publish_all(
            vec![WidgetEvent::ActiveConversationChanged(None), WidgetEvent::MessagesChanged]
        );
        self.notify(NEW_CONVERSATION_NOTICE, Severity::Info, Some(2000));
    }

    pub async fn delete_conversation(&self, id: i64) -> bool {
        if let Err(e) = self.transport.delete_conversation(id).await {
            error!("Could not delete conversation {}: {}", id, e);
            self.notify(DELETE_FAILED_NOTICE, Severity::Danger, Some(3000));
            return false;
        }

        let was_active = {
            let mut state = self.lock_state();
            state.conversations.retain(|c| c.id != id);
            state.active_conversation == Some(id)
        };
        self.bus.publish(WidgetEvent::ConversationsChanged);
        if was_active {
            self.start_new_conversation();
        }
        info!("Deleted conversation {}", id);
        self.notify(DELETED_NOTICE, Severity::Success, Some(2500));
        true
    }

    /// Replaces the message pane with the stored history. An empty
    /// conversation shows the greeting instead of an empty pane.
    pub async fn load_messages(&self, conversation_id: i64) -> bool {
        self.set_loading_history(true);
        let result = self.transport.load_messages(conversation_id).await;
        self.set_loading_history(false);

        match result {
            Ok(messages) => {
                let count = messages.len();
                self.lock_state().messages = if messages.is_empty() {
                    greeting_pane()
                } else {
                    messages
                };
                info!("Loaded {} messages of conversation {}", count, conversation_id);
                self.bus.publish(WidgetEvent::MessagesChanged);
                true
            }
            Err(e) => {
                error!("Error loading messages of {}: {}", conversation_id, e);
                self.notify(HISTORY_FAILED_NOTICE, Severity::Warning, None);
                false
            }
        }
    }

    fn set_loading_history(&self, loading: bool) {
        self.lock_state().loading_history = loading;
        self.bus.publish(WidgetEvent::HistoryLoading(loading));
    }
}
