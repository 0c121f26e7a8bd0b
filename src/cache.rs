//! Session-scoped cache.
//!
//! Lives as long as one browsing session (a tab), and is purged when the
//! session ends. The store holds it as an explicit handle instead of reaching
//! for ambient storage.
use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

/// Key the conversation blob is stored under.
pub const CHAT_KEY: &str = "chatData";

pub trait SessionCache {
    fn load(&self, key: &str) -> Option<String>;

    fn store(&self, key: &str, value: String);

    fn remove(&self, key: &str);
}

/// In-memory session storage. Clones share the same entries, the way every
/// view inside one tab sees the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl SessionCache for MemorySessionCache {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn store(&self, key: &str, value: String) {
        self.entries.lock().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}
