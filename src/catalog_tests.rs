//! Tests for catalog parsing, validation and fallback

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::catalog::*;
    use crate::error::PlayerError;
    use crate::models::MediaKind;

    #[test]
    fn test_parse_drops_invalid_entries_keeps_order() {
        let body = r#"[
            {"id": 1, "name": "CNN", "category": "News", "type": "m3u8",
             "url": "https://example.com/cnn.m3u8"},
            {"id": 2, "name": "Broken", "category": "News", "type": "m3u8"},
            {"id": 3, "name": "BBC", "category": "News", "type": "iframe",
             "url": "https://example.com/embed/bbc"}
        ]"#;
        let channels = parse_catalog(body).unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].name, "CNN");
        assert_eq!(channels[1].name, "BBC");
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_catalog(r#"{"channels": []}"#).unwrap_err();
        assert!(matches!(err, PlayerError::Catalog(_)));
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(parse_catalog("not json").is_err());
    }

    #[test]
    fn test_zero_valid_entries_is_a_failure() {
        let body = r#"[{"id": 1, "name": "No URL", "category": "News", "type": "m3u8"}]"#;
        assert!(parse_catalog(body).is_err());
        assert!(parse_catalog("[]").is_err());
    }

    #[test]
    fn test_unparseable_url_is_dropped() {
        let body = r#"[
            {"id": 1, "name": "Bad", "category": "News", "type": "m3u8", "url": "not a url"},
            {"id": 2, "name": "Good", "category": "News", "type": "m3u8",
             "url": "https://example.com/ok.m3u8"}
        ]"#;
        let channels = parse_catalog(body).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "Good");
    }

    #[test]
    fn test_numeric_and_string_ids() {
        let body = r#"[
            {"id": 7, "name": "Seven", "category": "Misc", "type": "mp4",
             "url": "https://example.com/7.mp4"},
            {"id": "abc", "name": "Abc", "category": "Misc", "type": "mp4",
             "url": "https://example.com/abc.mp4"}
        ]"#;
        let channels = parse_catalog(body).unwrap();
        assert_eq!(channels[0].id, "7");
        assert_eq!(channels[1].id, "abc");
    }

    #[test]
    fn test_type_tag_maps_to_kind() {
        let body = r#"[
            {"id": 1, "name": "A", "category": "C", "type": "m3u8", "url": "https://e.com/a"},
            {"id": 2, "name": "B", "category": "C", "type": "iframe", "url": "https://e.com/b"},
            {"id": 3, "name": "D", "category": "C", "type": "webm", "url": "https://e.com/d"}
        ]"#;
        let channels = parse_catalog(body).unwrap();
        assert_eq!(channels[0].kind, MediaKind::SegmentedStream);
        assert_eq!(channels[1].kind, MediaKind::EmbeddedFrame);
        assert_eq!(channels[2].kind, MediaKind::DirectFile);
    }

    #[test]
    fn test_load_with_retry_falls_back_to_demo() {
        let outcome = load_with_retry(
            "/nonexistent/catalog.json",
            "test-agent",
            2,
            Duration::ZERO,
        );
        assert!(outcome.demo_fallback);
        assert!(!outcome.channels.is_empty());
    }

    #[test]
    fn test_demo_channels_are_valid() {
        for channel in demo_channels() {
            assert!(!channel.id.is_empty());
            assert!(!channel.name.is_empty());
            assert!(url::Url::parse(&channel.url).is_ok());
        }
    }

    #[test]
    fn test_fetch_catalog_local_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("planb_tv_catalog_test.json");
        std::fs::write(&path, r#"[{"id": 1, "name": "Local", "category": "Misc",
            "type": "mp4", "url": "https://example.com/local.mp4"}]"#)
            .unwrap();
        let body = fetch_catalog(path.to_str().unwrap(), "test-agent").unwrap();
        let channels = parse_catalog(&body).unwrap();
        assert_eq!(channels[0].name, "Local");
        let _ = std::fs::remove_file(&path);
    }
}
