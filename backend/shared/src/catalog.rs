use serde::{Deserialize, Serialize};

pub type ProductId = String;

/// Catalog entry. `image_data` carries the stored image bytes base64 encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_data: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: String,
}
