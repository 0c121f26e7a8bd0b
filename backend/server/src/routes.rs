use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::{Contact, NewContact, NewProduct, Product, ProductId, ProductUpdate, SavedChat, UserState};
use tracing::{debug, info};

use crate::{
    catalog,
    error::AppError::{self, UserNotFound},
    state, users,
    utils::{decode_image, timestamp},
};

type AppState = State<Arc<state::State>>;

#[derive(Deserialize)]
pub struct DeleteDocument {
    id: ProductId,
}

pub async fn get_user_handler(
    State(state): AppState,
    Path(user_id): Path<String>,
) -> Result<Json<UserState>, AppError> {
    users::get(&state.pool, &user_id)
        .await?
        .map(Json)
        .ok_or(UserNotFound)
}

pub async fn save_user_handler(
    State(state): AppState,
    Path(user_id): Path<String>,
    Json(chat): Json<SavedChat>,
) -> Result<Json<UserState>, AppError> {
    debug!(
        "Saving {} turns for {user_id}",
        chat.conversations.len()
    );

    Ok(Json(users::upsert(&state.pool, &user_id, &chat).await?))
}

pub async fn list_users_handler(State(state): AppState) -> Result<Json<Vec<UserState>>, AppError> {
    Ok(Json(users::list(&state.pool).await?))
}

pub async fn chat_handler(
    State(state): AppState,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.relay.forward(&body).await?))
}

pub async fn products_handler(State(state): AppState) -> Result<Json<Vec<Product>>, AppError> {
    let products = catalog::list_products(&state.pool).await?;
    debug!("Fetched {} products", products.len());

    Ok(Json(products))
}

pub async fn add_document_handler(
    State(state): AppState,
    Json(product): Json<NewProduct>,
) -> Result<Json<Product>, AppError> {
    let image = product.image_data.as_deref().map(decode_image).transpose()?;

    Ok(Json(catalog::add_product(&state.pool, &product, image).await?))
}

pub async fn update_document_handler(
    State(state): AppState,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Value>, AppError> {
    if !catalog::update_product(&state.pool, &update).await? {
        debug!("Update for unknown product {}", update.id);
    }

    Ok(Json(json!({ "success": true })))
}

pub async fn delete_document_handler(
    State(state): AppState,
    Json(DeleteDocument { id }): Json<DeleteDocument>,
) -> Result<Json<Value>, AppError> {
    if !catalog::delete_product(&state.pool, &id).await? {
        debug!("Delete for unknown product {id}");
    }

    Ok(Json(json!({ "success": true })))
}

pub async fn contact_handler(
    State(state): AppState,
    Json(contact): Json<NewContact>,
) -> Result<Json<Value>, AppError> {
    info!("Received contact form submission from {}", contact.email);

    let saved: Contact = catalog::insert_contact(&state.pool, &contact, &timestamp()).await?;

    Ok(Json(json!({
        "message": "Message received successfully!",
        "data": saved,
    })))
}

pub async fn root_handler() -> impl IntoResponse {
    "Server is running"
}

pub async fn test_handler() -> impl IntoResponse {
    Json(json!({ "message": "Server is working" }))
}

pub async fn test_cors_handler() -> impl IntoResponse {
    Json(json!({ "message": "CORS is working" }))
}
