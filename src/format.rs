//! Rendering helpers for relay answers and catalog cards.
use std::{collections::BTreeMap, sync::LazyLock};

use regex::{Captures, Regex};
use shared::Product;

pub const DEFAULT_PRODUCT_IMAGE: &str = "/images/default-product.jpg";

static VIDEO_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[video(\d+)\]").unwrap());

static NUMBERED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.\s*\*\*(.*?)\*\*(:?)\s*([-\s]*)(.+)").unwrap()
});

static TIMESTAMP_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\*\*timestamp\*\*\*\*\s*(\[video\d+\])").unwrap());

static BOLD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})\s*\*\*(.*?)\*\*").unwrap());

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").unwrap()
});

/// Turns an answer into HTML.
///
/// `[videoN]` tokens become links through `video_links`; a token with no entry
/// stays as literal text so a missing link is visible. Numbered `**title**`
/// items become a title block and an indented body block.
pub fn format_response(text: &str, video_links: &BTreeMap<String, String>) -> String {
    let linked = VIDEO_TOKEN.replace_all(text, |caps: &Captures| match video_links.get(&caps[0]) {
        Some(link) => format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer" class="text-blue-500 hover:underline">Video</a>"#,
            escape_attr(link)
        ),
        None => caps[0].to_string(),
    });

    let blocks = NUMBERED_ITEM.replace_all(
        &linked,
        r#"<div class="font-bold mt-2 mb-1">${1}. ${2}${3}</div><div class="ml-4">${4}${5}</div>"#,
    );

    let unmarked = TIMESTAMP_MARKER.replace_all(&blocks, "${1}");

    BOLD_HEADING
        .replace_all(&unmarked, "${1} <strong>${2}</strong>")
        .into_owned()
}

/// Eleven character video id from a YouTube watch, embed or short link.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    YOUTUBE_ID
        .captures(url)
        .and_then(|caps| caps.get(2))
        .map(|id| id.as_str())
        .filter(|id| id.len() == 11)
}

pub fn filter_products<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    let term = term.to_lowercase();

    products
        .iter()
        .filter(|product| product.title.to_lowercase().contains(&term))
        .collect()
}

pub fn image_src(product: &Product) -> String {
    match product.image_data.as_deref() {
        Some(data) if !data.is_empty() => format!("data:image/jpeg;base64,{data}"),
        _ => DEFAULT_PRODUCT_IMAGE.to_string(),
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
