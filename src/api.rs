//! HTTP access to the backend: user records, the chat relay and the catalog.
use std::{future::Future, time::Duration};

use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, de::DeserializeOwned};
use shared::{ChatRequest, ChatResponse, Contact, NewContact, Product, SavedChat, UserState};
use tracing::debug;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "https://bents-model-backend.vercel.app";
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Read and write access to the server-of-record user state.
pub trait Persistence {
    /// `Ok(None)` when the backend has no record for `user_id`.
    fn fetch_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<UserState>, ClientError>> + Send;

    fn save_user(
        &self,
        user_id: &str,
        chat: &SavedChat,
    ) -> impl Future<Output = Result<UserState, ClientError>> + Send;
}

pub trait Relay {
    fn chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, ClientError>> + Send;
}

#[derive(Deserialize)]
struct ContactReceipt {
    data: Contact,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    chat_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client: Client::builder().build()?,
            base_url,
            chat_timeout: CHAT_TIMEOUT,
        })
    }

    pub fn with_chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout;
        self
    }

    pub async fn products(&self) -> Result<Vec<Product>, ClientError> {
        let response = self.client.get(self.url("/api/products")).send().await?;

        decode(response).await
    }

    pub async fn submit_contact(&self, contact: &NewContact) -> Result<Contact, ClientError> {
        let response = self
            .client
            .post(self.url("/contact"))
            .json(contact)
            .send()
            .await?;

        Ok(decode::<ContactReceipt>(response).await?.data)
    }

    fn url(&self, path: &str) -> Url {
        self.endpoint(path.split('/').filter(|segment| !segment.is_empty()))
    }

    /// `user_id` is pushed as a single percent-encoded path segment.
    fn user_url(&self, user_id: &str) -> Url {
        self.endpoint(["api", "user", user_id])
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so the segments are always editable.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

impl Persistence for ApiClient {
    async fn fetch_user(&self, user_id: &str) -> Result<Option<UserState>, ClientError> {
        let response = self
            .client
            .get(self.user_url(user_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("No stored record for {user_id}");
            return Ok(None);
        }

        decode(response).await.map(Some)
    }

    async fn save_user(&self, user_id: &str, chat: &SavedChat) -> Result<UserState, ClientError> {
        let response = self
            .client
            .post(self.user_url(user_id))
            .json(chat)
            .send()
            .await?;

        decode(response).await
    }
}

impl Relay for ApiClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/chat"))
            .timeout(self.chat_timeout)
            .json(request)
            .send()
            .await?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.error_for_status()?.bytes().await?;

    Ok(serde_json::from_slice(&bytes)?)
}
