//! Client side of the Bents woodworking assistant.
//!
//! Everything the browser keeps for a chat session lives here: the conversation
//! store, its session cache, the HTTP client for the backend and the helpers
//! that turn relay answers into markup.
//!
//!
//!
//! # Flow
//!
//! - On startup the store hydrates: session cache first, backend user record
//!   only when the cache is empty, never both
//! - A question goes to `POST /chat`, which relays it to the inference service
//! - The answer becomes a [`ConversationTurn`](shared::ConversationTurn) appended
//!   together with its query, then the session cache is rewritten
//! - Only one question may be in flight; a second submit is rejected, not queued
//! - Nothing is written to the backend unless [`ChatSession::persist`] is called
//!
//!
//!
//! # Session Cache
//!
//! Single JSON blob under `chatData`:
//!
//! ```json
//! {
//!     "conversations": [{ "question": "...", "text": "...", "videoLinks": {} }],
//!     "searchHistory": ["..."],
//!     "selectedIndex": "bents"
//! }
//! ```
//!
//! - Written synchronously by every mutation once hydrated
//! - Removed when the session ends
//!
//!
//!
//! # Notes
//!
//! ## Last write wins
//! The backend upsert is a full replace. Two tabs persisting the same user will
//! overwrite each other; there is no revision check.
//!
//! ## Topic filters
//! `bents`, `shop-improvement` and `tool-recommendations`. Anything else is
//! ignored by the store and read back as `bents` from stored records.

pub mod api;
pub mod cache;
pub mod error;
pub mod format;
pub mod session;
pub mod store;

pub use api::{ApiClient, Persistence, Relay};
pub use cache::{MemorySessionCache, SessionCache};
pub use error::{ChatError, ClientError};
pub use session::ChatSession;
pub use store::{ClientStore, HydrateSource};
