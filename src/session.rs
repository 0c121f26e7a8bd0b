use std::sync::atomic::{AtomicBool, Ordering};

use shared::{ChatRequest, ConversationTurn, SavedChat, TopicFilter, UserState};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    api::{Persistence, Relay},
    cache::SessionCache,
    error::{ChatError, ClientError},
    store::{ClientStore, HydrateSource},
};

pub const INITIAL_QUESTIONS: [&str; 3] = [
    "What are the 10 most recommended woodworking tools?",
    "Suggest me some shop layout tips?",
    "What are the benefits of LR32 system for cabinetry?",
];

/// One user's chat: at most one question in flight, turns appended in
/// submission order.
pub struct ChatSession<C, A> {
    user_id: String,
    api: A,
    store: Mutex<ClientStore<C>>,
    in_progress: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<C, A> ChatSession<C, A>
where
    C: SessionCache,
    A: Relay + Persistence,
{
    pub fn new(user_id: impl Into<String>, cache: C, api: A) -> Self {
        Self {
            user_id: user_id.into(),
            api,
            store: Mutex::new(ClientStore::new(cache)),
            in_progress: AtomicBool::new(false),
        }
    }

    pub async fn hydrate(&self) -> HydrateSource {
        self.store.lock().await.hydrate(&self.user_id, &self.api).await
    }

    /// Sends `query` through the relay and appends the answer as a new turn.
    ///
    /// A failed or timed out relay call leaves the conversation untouched.
    pub async fn submit(&self, query: &str) -> Result<(), ChatError> {
        if query.trim().is_empty() {
            return Err(ChatError::EmptyQuery);
        }

        if self.in_progress.swap(true, Ordering::AcqRel) {
            return Err(ChatError::Busy);
        }
        let _in_flight = InFlight(&self.in_progress);

        let request = {
            let store = self.store.lock().await;
            ChatRequest {
                message: query.to_string(),
                selected_index: store.selected_index(),
                chat_history: store.chat_history(),
            }
        };

        let response = self.api.chat(&request).await.map_err(|e| {
            warn!("Error fetching response: {e}");
            e
        })?;

        self.store
            .lock()
            .await
            .append_turn(ConversationTurn::from_response(query, response), query.to_string());

        Ok(())
    }

    pub async fn submit_initial(&self, index: usize) -> Result<(), ChatError> {
        let question = INITIAL_QUESTIONS
            .get(index)
            .ok_or(ChatError::UnknownInitialQuestion(index))?;

        self.submit(question).await
    }

    pub fn is_searching(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub async fn new_conversation(&self) {
        self.store.lock().await.reset_conversation();
    }

    pub async fn set_topic_filter(&self, tag: &str) -> bool {
        self.store.lock().await.set_topic_filter(tag)
    }

    pub async fn selected_index(&self) -> TopicFilter {
        self.store.lock().await.selected_index()
    }

    pub async fn snapshot(&self) -> SavedChat {
        self.store.lock().await.snapshot()
    }

    /// Writes the full current state to the backend. Never called implicitly.
    pub async fn persist(&self) -> Result<UserState, ClientError> {
        let chat = self.snapshot().await;
        let saved = self.api.save_user(&self.user_id, &chat).await?;
        info!("Persisted {} turns for {}", saved.conversations.len(), self.user_id);

        Ok(saved)
    }

    pub fn end(self) {
        self.store.into_inner().end_session();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use parking_lot::Mutex as SyncMutex;
    use shared::{ChatResponse, ProductLink};
    use tokio::time::sleep;

    use super::*;
    use crate::{
        api::tests::{backend, spawn_backend},
        cache::{CHAT_KEY, MemorySessionCache},
        store::tests::{FakeBackend, turn},
    };

    #[derive(Default)]
    struct FakeApi {
        backend: FakeBackend,
        fail: bool,
        delay: Option<Duration>,
        requests: SyncMutex<Vec<ChatRequest>>,
        saves: AtomicUsize,
    }

    impl Relay for FakeApi {
        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
            self.requests.lock().push(request.clone());
            if let Some(delay) = self.delay {
                sleep(delay).await;
            }
            if self.fail {
                return Err(ClientError::Timeout);
            }
            Ok(ChatResponse {
                response: format!("answer to {}", request.message),
                initial_answer: Some(format!("raw answer to {}", request.message)),
                url: Some("https://www.youtube.com/watch?v=abcdefghijk".to_string()),
                related_products: vec![ProductLink {
                    title: "Clamp".to_string(),
                    link: "https://shop/clamp".to_string(),
                }],
                video_links: Default::default(),
            })
        }
    }

    impl Persistence for FakeApi {
        async fn fetch_user(&self, user_id: &str) -> Result<Option<UserState>, ClientError> {
            self.backend.fetch_user(user_id).await
        }

        async fn save_user(&self, user_id: &str, chat: &SavedChat) -> Result<UserState, ClientError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.backend.save_user(user_id, chat).await
        }
    }

    async fn session(api: FakeApi) -> ChatSession<MemorySessionCache, FakeApi> {
        let session = ChatSession::new("user123", MemorySessionCache::new(), api);
        session.hydrate().await;
        session
    }

    #[tokio::test]
    async fn test_submit_appends_turn() {
        let session = session(FakeApi::default()).await;

        session.submit("Best glue for oak?").await.unwrap();

        let chat = session.snapshot().await;
        assert_eq!(chat.conversations.len(), 1);
        assert_eq!(chat.conversations[0].question, "Best glue for oak?");
        assert_eq!(chat.conversations[0].answer_text, "answer to Best glue for oak?");
        assert_eq!(chat.conversations[0].related_products[0].title, "Clamp");
        assert_eq!(chat.search_history, ["Best glue for oak?"]);
        assert!(!session.is_searching());
    }

    #[tokio::test]
    async fn test_request_carries_history_and_filter() {
        let session = session(FakeApi::default()).await;
        session.set_topic_filter("shop-improvement").await;

        session.submit("first").await.unwrap();
        session.submit("second").await.unwrap();

        let requests = session.api.requests.lock();
        assert!(requests[0].chat_history.is_empty());
        assert_eq!(requests[1].selected_index, TopicFilter::ShopImprovement);
        assert_eq!(requests[1].chat_history, ["first", "raw answer to first"]);
    }

    #[tokio::test]
    async fn test_failed_relay_leaves_conversation_unchanged() {
        let session = session(FakeApi {
            fail: true,
            ..Default::default()
        })
        .await;

        let result = session.submit("anything").await;

        assert!(matches!(result, Err(ChatError::Relay(ClientError::Timeout))));
        assert!(session.snapshot().await.conversations.is_empty());
        assert!(!session.is_searching());
    }

    #[tokio::test]
    async fn test_timed_out_chat_over_http_leaves_conversation_unchanged() {
        let api = spawn_backend(backend())
            .await
            .with_chat_timeout(Duration::from_millis(100));
        let session = ChatSession::new("user123", MemorySessionCache::new(), api);
        session.hydrate().await;

        let result = session.submit("slow").await;

        assert!(matches!(result, Err(ChatError::Relay(ClientError::Timeout))));
        assert!(session.snapshot().await.conversations.is_empty());
        assert!(!session.is_searching());

        session.submit("hello").await.unwrap();
        assert_eq!(session.snapshot().await.search_history, ["hello"]);
    }

    #[tokio::test]
    async fn test_second_submit_while_busy_is_rejected() {
        let session = session(FakeApi {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        })
        .await;

        let (first, second) = tokio::join!(session.submit("first"), session.submit("second"));

        assert!(first.is_ok());
        assert!(matches!(second, Err(ChatError::Busy)));
        assert_eq!(session.snapshot().await.search_history, ["first"]);
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_before_relay() {
        let session = session(FakeApi::default()).await;

        assert!(matches!(session.submit("   ").await, Err(ChatError::EmptyQuery)));
        assert!(session.api.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_initial_questions() {
        let session = session(FakeApi::default()).await;

        session.submit_initial(1).await.unwrap();

        assert_eq!(session.snapshot().await.search_history, [INITIAL_QUESTIONS[1]]);
        assert!(matches!(
            session.submit_initial(3).await,
            Err(ChatError::UnknownInitialQuestion(3))
        ));
    }

    #[tokio::test]
    async fn test_relay_never_persists() {
        let session = session(FakeApi::default()).await;

        session.submit("a").await.unwrap();
        assert_eq!(session.api.saves.load(Ordering::SeqCst), 0);

        let saved = session.persist().await.unwrap();
        assert_eq!(session.api.saves.load(Ordering::SeqCst), 1);
        assert_eq!(saved.user_id, "user123");
        assert_eq!(saved.conversations.len(), 1);
    }

    #[tokio::test]
    async fn test_new_conversation_keeps_filter() {
        let session = session(FakeApi {
            backend: FakeBackend {
                user: Some(UserState::new(
                    "user123",
                    SavedChat {
                        conversations: vec![turn("old")],
                        search_history: vec!["old".to_string()],
                        selected_index: TopicFilter::ToolRecommendations,
                    },
                )),
                ..Default::default()
            },
            ..Default::default()
        })
        .await;

        session.new_conversation().await;

        let chat = session.snapshot().await;
        assert!(chat.conversations.is_empty());
        assert!(chat.search_history.is_empty());
        assert_eq!(session.selected_index().await, TopicFilter::ToolRecommendations);
    }

    #[tokio::test]
    async fn test_end_purges_cache() {
        let cache = MemorySessionCache::new();
        let session = ChatSession::new("user123", cache.clone(), FakeApi::default());
        session.hydrate().await;
        session.submit("a").await.unwrap();
        assert!(cache.load(CHAT_KEY).is_some());

        session.end();

        assert!(cache.load(CHAT_KEY).is_none());
    }
}
