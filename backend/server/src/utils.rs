use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{SecondsFormat, Utc};

use crate::error::AppError::{self, MalformedPayload};

pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes an uploaded image. Accepts either bare base64 or a `data:` URL.
pub fn decode_image(data: &str) -> Result<Vec<u8>, AppError> {
    let trimmed = data.trim();
    let payload = match trimmed.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    };

    STANDARD
        .decode(payload)
        .map_err(|e| MalformedPayload(format!("image data is not base64: {e}")))
}

pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
