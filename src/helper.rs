use std::collections::BTreeSet;

use crate::{Result, SterlingError};

// Helper method for parsing tags
pub fn parse_tags(tags: Option<String>) -> BTreeSet<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Splits comma-separated ids, keeping their order
pub fn parse_ids(ids: Option<String>) -> Vec<String> {
    ids.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Splits `key=value`, trimming both sides
pub fn parse_key_value(input: &str) -> Result<(String, String)> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(SterlingError::InvalidFormat {
            message: format!("Expected key=value, got '{}'", input),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = parse_tags(Some(" rust, notes ,,rust".to_string()));
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec!["notes".to_string(), "rust".to_string()]
        );
        assert!(parse_tags(None).is_empty());
    }

    #[test]
    fn ids_keep_their_order() {
        assert_eq!(parse_ids(Some("b, a,".to_string())), vec!["b", "a"]);
    }

    #[test]
    fn key_value_requires_a_key() {
        assert_eq!(
            parse_key_value("font_size = 16").expect("valid pair"),
            ("font_size".to_string(), "16".to_string())
        );
        assert!(parse_key_value("font_size").is_err());
        assert!(parse_key_value("=16").is_err());
    }
}
