//! # Client State Store
//!
//! Holds the active conversation for one session and mirrors it into the
//! session cache.
//!
//! ## Hydration
//!
//! - A cache entry wins: the store loads from it and never touches the network
//! - No cache entry: the store asks the backend for the user record
//! - Not found or a failed fetch: empty defaults, still initialized
//! - A cache entry that does not decode counts as present, so defaults are used
//!   without falling back to the network
//! - When the stored query list and the turn list disagree in length, the
//!   query list is rebuilt from the turns
//!
//! ## Write-through
//!
//! Every mutation after hydration re-serializes the whole state under
//! [`CHAT_KEY`] before returning. Mutations before hydration stay in memory.
use serde_json::to_string;
use shared::{ConversationTurn, SavedChat, TopicFilter};
use tracing::{debug, warn};

use crate::{
    api::Persistence,
    cache::{CHAT_KEY, SessionCache},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrateSource {
    Cache,
    Server,
    Defaults,
}

pub struct ClientStore<C> {
    cache: C,
    conversations: Vec<ConversationTurn>,
    search_history: Vec<String>,
    selected_index: TopicFilter,
    initialized: bool,
}

impl<C: SessionCache> ClientStore<C> {
    pub fn new(cache: C) -> Self {
        Self {
            cache,
            conversations: Vec::new(),
            search_history: Vec::new(),
            selected_index: TopicFilter::default(),
            initialized: false,
        }
    }

    pub async fn hydrate<P: Persistence>(&mut self, user_id: &str, persistence: &P) -> HydrateSource {
        let (chat, source) = match self.cache.load(CHAT_KEY) {
            Some(blob) => {
                let chat = serde_json::from_str(&blob).unwrap_or_else(|e| {
                    warn!("Discarding unreadable session cache: {e}");
                    SavedChat::default()
                });
                (chat, HydrateSource::Cache)
            }
            None => match persistence.fetch_user(user_id).await {
                Ok(Some(user)) => (user.into_chat(), HydrateSource::Server),
                Ok(None) => {
                    debug!("No stored conversation for {user_id}, starting empty");
                    (SavedChat::default(), HydrateSource::Defaults)
                }
                Err(e) => {
                    warn!("Error fetching user data for {user_id}: {e}");
                    (SavedChat::default(), HydrateSource::Defaults)
                }
            },
        };

        self.apply(chat);
        self.initialized = true;

        source
    }

    pub fn append_turn(&mut self, turn: ConversationTurn, query: String) {
        self.conversations.push(turn);
        self.search_history.push(query);
        self.write_through();
    }

    pub fn reset_conversation(&mut self) {
        self.conversations.clear();
        self.search_history.clear();
        self.write_through();
    }

    /// Returns `false` and leaves the filter unchanged for an unrecognized tag.
    pub fn set_topic_filter(&mut self, tag: &str) -> bool {
        match tag.parse() {
            Ok(topic) => {
                self.selected_index = topic;
                self.write_through();
                true
            }
            Err(e) => {
                debug!("Ignoring {e}");
                false
            }
        }
    }

    /// Purges the cached blob. The session is over once this returns.
    pub fn end_session(self) {
        self.cache.remove(CHAT_KEY);
    }

    pub fn conversations(&self) -> &[ConversationTurn] {
        &self.conversations
    }

    pub fn search_history(&self) -> &[String] {
        &self.search_history
    }

    pub fn selected_index(&self) -> TopicFilter {
        self.selected_index
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn show_initial_questions(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Prior turns flattened to alternating question and answer entries.
    pub fn chat_history(&self) -> Vec<String> {
        self.conversations
            .iter()
            .flat_map(|turn| [turn.question.clone(), turn.history_answer().to_string()])
            .collect()
    }

    pub fn snapshot(&self) -> SavedChat {
        SavedChat {
            conversations: self.conversations.clone(),
            search_history: self.search_history.clone(),
            selected_index: self.selected_index,
        }
    }

    fn apply(&mut self, chat: SavedChat) {
        let SavedChat {
            conversations,
            mut search_history,
            selected_index,
        } = chat;

        if search_history.len() != conversations.len() {
            debug!(
                "Rebuilding search history ({} queries for {} turns)",
                search_history.len(),
                conversations.len()
            );
            search_history = conversations.iter().map(|turn| turn.question.clone()).collect();
        }

        self.conversations = conversations;
        self.search_history = search_history;
        self.selected_index = selected_index;
    }

    fn write_through(&self) {
        if !self.initialized {
            return;
        }

        match to_string(&self.snapshot()) {
            Ok(blob) => self.cache.store(CHAT_KEY, blob),
            Err(e) => warn!("Failed to serialize session cache: {e}"),
        }
    }
}
