//! # Chat Relay
//!
//! Forwards chat requests to the external inference service and hands its
//! answer back untouched.
//!
//! ## Contract
//! - The request body is forwarded verbatim to `{RELAY_URL}/chat`
//! - The response body is returned verbatim, no fields added or dropped
//! - One attempt per call, no retry; the caller decides whether to resubmit
//! - Exceeding `RELAY_TIMEOUT_SECS` (60 by default), a transport failure or a
//!   non-success upstream status all surface as a generic relay error, never as
//!   a partial response
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::AppError;

pub struct Relay {
    client: Client,
    chat_url: String,
}

impl Relay {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            chat_url: format!("{}/chat", base_url.trim_end_matches('/')),
        })
    }

    pub async fn forward(&self, body: &Value) -> Result<Value, AppError> {
        debug!("Relaying chat request to {}", self.chat_url);

        let response = self
            .client
            .post(&self.chat_url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
