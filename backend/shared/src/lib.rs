//! Wire types shared by the server and the client crate.
//!
//! Field names follow the JSON the browser client has always stored, so a
//! record written by one side decodes on the other without translation.

pub mod catalog;
pub mod chat;
pub mod topic;
pub mod user;

pub use catalog::{Contact, NewContact, NewProduct, Product, ProductId, ProductUpdate};
pub use chat::{ChatRequest, ChatResponse, ConversationTurn, ProductLink};
pub use topic::TopicFilter;
pub use user::{SavedChat, UserState};
