//! HTTP backend for the Bents woodworking assistant.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | /api/user/{user_id} | Fetch a user's conversation state, 404 if absent |
//! | POST | /api/user/{user_id} | Full-replace upsert of a user's conversation state |
//! | GET | /api/users | Every stored user record |
//! | POST | /chat | Relay to the inference service |
//! | GET | /api/products | Catalog with base64 image data |
//! | GET | /documents | Catalog listing |
//! | POST | /add_document | Add a product |
//! | POST | /update_document | Update a product's title, tags and link |
//! | POST | /delete_document | Remove a product |
//! | POST | /contact | Store a contact form submission |
//! | GET | /, /test, /test-cors | Liveness checks |
//!
//! # Lifecycle
//!
//! - The connection pool and the relay client live in [`state::State`], built
//!   once at startup and handed to every handler through axum state
//! - Handlers share nothing else; each request runs independently
//! - On SIGINT/SIGTERM the server drains in-flight requests, then closes the pool
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};

use signal::ctrl_c;
#[cfg(unix)]
use signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod relay;
pub mod routes;
pub mod state;
pub mod users;
pub mod utils;

use config::Config;
use routes::{
    add_document_handler, chat_handler, contact_handler, delete_document_handler,
    get_user_handler, list_users_handler, products_handler, root_handler, save_user_handler,
    test_cors_handler, test_handler, update_document_handler,
};
use state::State;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading configuration...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config).await?;

    info!("Starting server...");
    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down, closing database pool...");
    state.pool.close().await;

    Ok(())
}

pub fn router(state: Arc<State>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/test", get(test_handler))
        .route("/test-cors", get(test_cors_handler))
        .route(
            "/api/user/{user_id}",
            get(get_user_handler).post(save_user_handler),
        )
        .route("/api/users", get(list_users_handler))
        .route("/chat", post(chat_handler))
        .route("/api/products", get(products_handler))
        .route("/documents", get(products_handler))
        .route("/add_document", post(add_document_handler))
        .route("/update_document", post(update_document_handler))
        .route("/delete_document", post(delete_document_handler))
        .route("/contact", post(contact_handler))
        .layer(cors(&state.config.allowed_origins))
        .with_state(state)
}

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| warn!("Skipping invalid origin {origin}: {e}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header::ORIGIN},
        response::Response,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{config::DEFAULT_ORIGINS, database::test_pool, relay::tests as upstream};

    fn test_config(relay_url: &str, relay_timeout: Duration) -> Config {
        Config {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            relay_url: relay_url.to_string(),
            relay_timeout,
            allowed_origins: DEFAULT_ORIGINS.split(',').map(str::to_string).collect(),
        }
    }

    async fn test_app() -> Router {
        let state = State::with_pool(
            test_config("http://127.0.0.1:9", Duration::from_secs(1)),
            test_pool().await,
        )
        .unwrap();

        router(state)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_user_is_404() {
        let app = test_app().await;

        let response = app.oneshot(get_request("/api/user/ghost")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "User not found");
    }

    #[tokio::test]
    async fn test_save_then_fetch_user() {
        let app = test_app().await;
        let triple = json!({
            "conversations": [],
            "searchHistory": [],
            "selectedIndex": "bents"
        });

        let saved = app
            .clone()
            .oneshot(post_json("/api/user/u1", triple.clone()))
            .await
            .unwrap();
        assert_eq!(saved.status(), StatusCode::OK);

        let fetched = app.oneshot(get_request("/api/user/u1")).await.unwrap();
        assert_eq!(fetched.status(), StatusCode::OK);

        let body = json_body(fetched).await;
        assert_eq!(body["userId"], "u1");
        assert_eq!(body["conversations"], triple["conversations"]);
        assert_eq!(body["searchHistory"], triple["searchHistory"]);
        assert_eq!(body["selectedIndex"], triple["selectedIndex"]);
    }

    #[tokio::test]
    async fn test_upsert_twice_returns_same_record() {
        let app = test_app().await;
        let chat = json!({
            "conversations": [{
                "question": "Which clamps?",
                "text": "Parallel clamps [video0]",
                "products": [{"title": "Clamp", "link": "https://shop/clamp"}],
                "videoLinks": {"[video0]": "https://youtu.be/abcdefghijk?t=3"}
            }],
            "searchHistory": ["Which clamps?"],
            "selectedIndex": "tool-recommendations"
        });

        let first = json_body(
            app.clone()
                .oneshot(post_json("/api/user/u2", chat.clone()))
                .await
                .unwrap(),
        )
        .await;
        let second = json_body(
            app.clone()
                .oneshot(post_json("/api/user/u2", chat))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(first, second);
        assert_eq!(first["conversations"][0]["videoLinks"]["[video0]"], "https://youtu.be/abcdefghijk?t=3");

        let users = json_body(app.oneshot(get_request("/api/users")).await.unwrap()).await;
        assert_eq!(users.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_chat_relays_upstream_payload() {
        let address = upstream::spawn_upstream(upstream::echo_upstream()).await;
        let state = State::with_pool(
            test_config(&format!("http://{address}"), Duration::from_secs(5)),
            test_pool().await,
        )
        .unwrap();

        let body = json!({"message": "Dust collection?", "selected_index": "shop-improvement", "chat_history": []});
        let response = router(state).oneshot(post_json("/chat", body.clone())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["response"], "You asked: Dust collection?");
        assert_eq!(payload["echo"], body);
    }

    #[tokio::test]
    async fn test_chat_failure_is_generic_500() {
        let app = test_app().await;

        let response = app
            .oneshot(post_json("/chat", json!({"message": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({"message": "An error occurred while processing your chat request."})
        );
    }

    #[tokio::test]
    async fn test_catalog_crud() {
        let app = test_app().await;

        let added = json_body(
            app.clone()
                .oneshot(post_json(
                    "/add_document",
                    json!({"title": "Miter Saw", "tags": "saw", "link": "https://shop/miter", "image_data": "/9j/"}),
                ))
                .await
                .unwrap(),
        )
        .await;
        let id = added["id"].as_str().unwrap().to_string();
        assert_eq!(added["image_data"], "/9j/");

        let updated = app
            .clone()
            .oneshot(post_json(
                "/update_document",
                json!({"id": id, "title": "Sliding Miter Saw", "tags": "saw", "link": "https://shop/miter"}),
            ))
            .await
            .unwrap();
        assert_eq!(json_body(updated).await, json!({"success": true}));

        let products = json_body(app.clone().oneshot(get_request("/api/products")).await.unwrap()).await;
        assert_eq!(products[0]["title"], "Sliding Miter Saw");

        let deleted = app
            .clone()
            .oneshot(post_json("/delete_document", json!({"id": id})))
            .await
            .unwrap();
        assert_eq!(json_body(deleted).await, json!({"success": true}));

        let documents = json_body(app.oneshot(get_request("/documents")).await.unwrap()).await;
        assert_eq!(documents, json!([]));
    }

    #[tokio::test]
    async fn test_bad_image_data_is_400() {
        let app = test_app().await;

        let response = app
            .oneshot(post_json(
                "/add_document",
                json!({"title": "Router", "image_data": "%%%"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_product_image_keys_are_snake_case() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/add_document",
                json!({"title": "Saw", "image_url": "https://img/saw.jpg", "image_data": "/9j/"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let products = json_body(app.oneshot(get_request("/api/products")).await.unwrap()).await;
        assert_eq!(products[0]["image_url"], "https://img/saw.jpg");
        assert_eq!(products[0]["image_data"], "/9j/");
        assert!(products[0].get("imageData").is_none());
    }

    #[tokio::test]
    async fn test_contact_returns_stored_row() {
        let app = test_app().await;

        let response = app
            .oneshot(post_json(
                "/contact",
                json!({"name": "Ana", "email": "ana@example.com", "subject": "Hi", "message": "Question about jigs"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Message received successfully!");
        assert_eq!(body["data"]["email"], "ana@example.com");
        assert!(body["data"]["id"].as_i64().is_some());
    }

    #[tokio::test]
    async fn test_liveness_routes() {
        let app = test_app().await;

        let root = app.clone().oneshot(get_request("/")).await.unwrap();
        let bytes = to_bytes(root.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Server is running");

        let test = json_body(app.oneshot(get_request("/test")).await.unwrap()).await;
        assert_eq!(test["message"], "Server is working");
    }

    #[tokio::test]
    async fn test_cors_allows_only_configured_origins() {
        let app = test_app().await;

        let allowed = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/test-cors")
                    .header(ORIGIN, "https://www.bentsassistant.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()["access-control-allow-origin"],
            "https://www.bentsassistant.com"
        );
        assert_eq!(allowed.headers()["access-control-allow-credentials"], "true");

        let denied = app
            .oneshot(
                Request::builder()
                    .uri("/test-cors")
                    .header(ORIGIN, "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(!denied.headers().contains_key("access-control-allow-origin"));
    }
}
