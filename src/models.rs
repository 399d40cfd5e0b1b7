//! Data models for Plan B TV

use std::fmt;

/// How a channel's stream is delivered and which backend plays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Manifest-described segmented stream (HLS), played through the
    /// adaptive backend when available.
    SegmentedStream,
    /// Externally hosted player surface, shown in an embedded frame.
    EmbeddedFrame,
    /// Plain media URL handed straight to the video sink.
    DirectFile,
}

impl MediaKind {
    /// Decode the catalog `type` tag. Unknown tags fall back to direct
    /// playback.
    pub fn from_type_tag(tag: &str) -> Self {
        match tag {
            "m3u8" => MediaKind::SegmentedStream,
            "iframe" => MediaKind::EmbeddedFrame,
            _ => MediaKind::DirectFile,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::SegmentedStream => write!(f, "segmented"),
            MediaKind::EmbeddedFrame => write!(f, "embedded"),
            MediaKind::DirectFile => write!(f, "direct"),
        }
    }
}

/// A validated catalog entry. Immutable after catalog load.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub category: String,
    pub kind: MediaKind,
    pub url: String,
    pub logo: Option<String>,
    pub description: Option<String>,
}

/// Which top-level surface is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Grid,
    Player,
}

/// Connection status indicator shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionIndicator {
    Connected,
    Loading,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_from_tag() {
        assert_eq!(MediaKind::from_type_tag("m3u8"), MediaKind::SegmentedStream);
        assert_eq!(MediaKind::from_type_tag("iframe"), MediaKind::EmbeddedFrame);
        assert_eq!(MediaKind::from_type_tag("mp4"), MediaKind::DirectFile);
        assert_eq!(MediaKind::from_type_tag(""), MediaKind::DirectFile);
    }
}
