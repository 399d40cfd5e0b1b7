//! Channel catalog loading and validation
//!
//! The catalog is a JSON array of channel entries fetched over HTTP (with
//! no-cache semantics) or read from a local file. Invalid entries are
//! dropped with a warning; an empty result counts as a load failure. Load
//! failures are retried with a fixed backoff, then fall back to a built-in
//! demo catalog.

use std::fs;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::PlayerError;
use crate::models::{Channel, MediaKind};

/// Retry budget for catalog loading.
pub const MAX_RETRIES: u32 = 3;
/// Backoff between attempts.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Raw catalog entry before validation.
#[derive(Debug, Clone, Deserialize)]
struct RawChannel {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default, rename = "type")]
    type_tag: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    logo: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Result of a catalog load, including whether the demo set was used.
#[derive(Debug, Clone)]
pub struct CatalogOutcome {
    pub channels: Vec<Channel>,
    pub demo_fallback: bool,
}

/// Fetch the catalog body. HTTP(S) sources go through ureq with no-cache
/// headers; anything else is treated as a local file path.
pub fn fetch_catalog(source: &str, user_agent: &str) -> Result<String, PlayerError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .timeout_connect(Some(Duration::from_secs(10)))
            .build()
            .new_agent();

        let mut response = agent
            .get(source)
            .header("User-Agent", user_agent)
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .call()
            .map_err(|e| PlayerError::Catalog(format!("Request failed: {}", e)))?;

        if response.status() != 200 {
            return Err(PlayerError::Catalog(format!("HTTP error: {}", response.status())));
        }

        response
            .body_mut()
            .read_to_string()
            .map_err(|e| PlayerError::Catalog(format!("Read failed: {}", e)))
    } else {
        fs::read_to_string(source)
            .map_err(|e| PlayerError::Catalog(format!("Read failed: {}", e)))
    }
}

/// Parse and validate a catalog body. Invalid entries are dropped; order of
/// the surviving entries is preserved.
pub fn parse_catalog(body: &str) -> Result<Vec<Channel>, PlayerError> {
    let data: Value = serde_json::from_str(body)
        .map_err(|e| PlayerError::Catalog(format!("Invalid JSON: {}", e)))?;

    let entries = data
        .as_array()
        .ok_or_else(|| PlayerError::Catalog("catalog is not a JSON array".to_string()))?;

    let channels: Vec<Channel> = entries
        .iter()
        .filter_map(|entry| {
            let raw: RawChannel = match serde_json::from_value(entry.clone()) {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("Dropping malformed catalog entry: {}", e);
                    return None;
                }
            };
            validate_channel(raw)
        })
        .collect();

    if channels.is_empty() {
        return Err(PlayerError::Catalog("no valid channels found".to_string()));
    }

    Ok(channels)
}

/// Validate one raw entry: id, name, category, type and url must be
/// non-empty, and the url must parse.
fn validate_channel(raw: RawChannel) -> Option<Channel> {
    let id = match &raw.id {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => {
            log::warn!("Invalid channel (missing id): {:?}", raw.name);
            return None;
        }
    };

    if raw.name.is_empty() || raw.category.is_empty() || raw.type_tag.is_empty() || raw.url.is_empty() {
        log::warn!("Invalid channel (missing fields): {:?}", raw.name);
        return None;
    }

    if url::Url::parse(&raw.url).is_err() {
        log::warn!("Invalid URL for channel: {}", raw.name);
        return None;
    }

    Some(Channel {
        id,
        name: raw.name,
        category: raw.category,
        kind: MediaKind::from_type_tag(&raw.type_tag),
        url: raw.url,
        logo: raw.logo,
        description: raw.description,
    })
}

/// Load the catalog with retries, falling back to the demo channels once
/// the retry budget is exhausted. Intended to run on a worker thread; it
/// sleeps between attempts.
pub fn load_with_retry(
    source: &str,
    user_agent: &str,
    max_retries: u32,
    backoff: Duration,
) -> CatalogOutcome {
    for attempt in 0..=max_retries {
        match fetch_catalog(source, user_agent).and_then(|body| parse_catalog(&body)) {
            Ok(channels) => {
                return CatalogOutcome { channels, demo_fallback: false };
            }
            Err(e) => {
                log::warn!("Catalog load failed (attempt {}/{}): {}", attempt + 1, max_retries + 1, e);
                if attempt < max_retries {
                    thread::sleep(backoff);
                }
            }
        }
    }

    log::info!("Falling back to demo channels");
    CatalogOutcome { channels: demo_channels(), demo_fallback: true }
}

/// Built-in demo set used when the catalog is unreachable.
pub fn demo_channels() -> Vec<Channel> {
    vec![
        Channel {
            id: "1".to_string(),
            name: "Demo Channel HD".to_string(),
            category: "Entertainment".to_string(),
            kind: MediaKind::SegmentedStream,
            url: "https://demo.unified-streaming.com/k8s/features/stable/video/tears-of-steel/tears-of-steel.ism/.m3u8".to_string(),
            logo: None,
            description: Some("Demo channel with test content".to_string()),
        },
        Channel {
            id: "2".to_string(),
            name: "Embedded Demo".to_string(),
            category: "News".to_string(),
            kind: MediaKind::EmbeddedFrame,
            url: "https://www.youtube.com/embed/dQw4w9WgXcQ".to_string(),
            logo: None,
            description: Some("Demo channel with an embedded player".to_string()),
        },
        Channel {
            id: "3".to_string(),
            name: "Music 24/7".to_string(),
            category: "Music".to_string(),
            kind: MediaKind::EmbeddedFrame,
            url: "https://www.youtube.com/embed/jfKfPfyJRdk".to_string(),
            logo: None,
            description: Some("Music around the clock".to_string()),
        },
    ]
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
