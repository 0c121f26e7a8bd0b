use serde::{Deserialize, Serialize};

use crate::{chat::ConversationTurn, topic::TopicFilter};

/// Conversation state of one user, as kept by the persistence API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub user_id: String,
    #[serde(default)]
    pub conversations: Vec<ConversationTurn>,
    #[serde(default)]
    pub search_history: Vec<String>,
    #[serde(default)]
    pub selected_index: TopicFilter,
}

impl UserState {
    pub fn new(user_id: impl Into<String>, chat: SavedChat) -> Self {
        Self {
            user_id: user_id.into(),
            conversations: chat.conversations,
            search_history: chat.search_history,
            selected_index: chat.selected_index,
        }
    }

    pub fn into_chat(self) -> SavedChat {
        SavedChat {
            conversations: self.conversations,
            search_history: self.search_history,
            selected_index: self.selected_index,
        }
    }
}

/// The mutable part of a [`UserState`]: the upsert body and the session cache blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedChat {
    #[serde(default)]
    pub conversations: Vec<ConversationTurn>,
    #[serde(default)]
    pub search_history: Vec<String>,
    #[serde(default)]
    pub selected_index: TopicFilter,
}
