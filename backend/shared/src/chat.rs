use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::topic::TopicFilter;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLink {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
}

/// One question/answer exchange with its media and product annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    #[serde(rename = "text", default)]
    pub answer_text: String,
    #[serde(rename = "initial_answer", default, skip_serializing_if = "Option::is_none")]
    pub initial_answer_text: Option<String>,
    #[serde(rename = "video", default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(rename = "products", default)]
    pub related_products: Vec<ProductLink>,
    #[serde(rename = "videoLinks", default)]
    pub video_links: BTreeMap<String, String>,
}

impl ConversationTurn {
    pub fn from_response(question: impl Into<String>, response: ChatResponse) -> Self {
        Self {
            question: question.into(),
            answer_text: response.response,
            initial_answer_text: response.initial_answer,
            video_url: response.url,
            related_products: response.related_products,
            video_links: response.video_links,
        }
    }

    /// Answer fed back to the inference service as history, preferring the
    /// unprocessed text when the service returned one.
    pub fn history_answer(&self) -> &str {
        self.initial_answer_text
            .as_deref()
            .filter(|answer| !answer.is_empty())
            .unwrap_or(&self.answer_text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub selected_index: TopicFilter,
    #[serde(default)]
    pub chat_history: Vec<String>,
}

/// Payload returned by the inference service. Fields it may add later are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub initial_answer: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub related_products: Vec<ProductLink>,
    #[serde(default)]
    pub video_links: BTreeMap<String, String>,
}
