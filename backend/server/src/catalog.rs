//! Product catalog and contact form submissions.
use shared::{Contact, NewContact, NewProduct, Product, ProductUpdate};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use crate::{error::AppError, utils::encode_image};

const PRODUCT_COLUMNS: &str = "id, title, tags, link, image_url, image_data";

pub async fn list_products(pool: &SqlitePool) -> Result<Vec<Product>, AppError> {
    let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY title"))
        .fetch_all(pool)
        .await?;

    rows.iter().map(product_from_row).collect()
}

pub async fn add_product(
    pool: &SqlitePool,
    product: &NewProduct,
    image_data: Option<Vec<u8>>,
) -> Result<Product, AppError> {
    let row = sqlx::query(&format!(
        "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(&product.title)
    .bind(&product.tags)
    .bind(&product.link)
    .bind(product.image_url.as_deref())
    .bind(image_data)
    .fetch_one(pool)
    .await?;

    product_from_row(&row)
}

/// Returns whether a row was touched. A missing id is not an error.
pub async fn update_product(pool: &SqlitePool, update: &ProductUpdate) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE products SET title = ?2, tags = ?3, link = ?4 WHERE id = ?1")
        .bind(&update.id)
        .bind(&update.title)
        .bind(&update.tags)
        .bind(&update.link)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_product(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn insert_contact(
    pool: &SqlitePool,
    contact: &NewContact,
    created_at: &str,
) -> Result<Contact, AppError> {
    let row = sqlx::query(
        r#"
        INSERT INTO contacts (name, email, subject, message, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id, name, email, subject, message, created_at
        "#,
    )
    .bind(&contact.name)
    .bind(&contact.email)
    .bind(&contact.subject)
    .bind(&contact.message)
    .bind(created_at)
    .fetch_one(pool)
    .await?;

    Ok(Contact {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        subject: row.try_get("subject")?,
        message: row.try_get("message")?,
        created_at: row.try_get("created_at")?,
    })
}

fn product_from_row(row: &SqliteRow) -> Result<Product, AppError> {
    let image_data: Option<Vec<u8>> = row.try_get("image_data")?;

    Ok(Product {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        tags: row.try_get("tags")?,
        link: row.try_get("link")?,
        image_url: row.try_get("image_url")?,
        image_data: image_data.as_deref().map(encode_image),
    })
}
