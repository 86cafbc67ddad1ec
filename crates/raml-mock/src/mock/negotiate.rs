//! Content negotiation.
//!
//! Picks the media type a response is rendered in. Rules, in order:
//!
//! 1. a recognized extension on the request path (`/users.json`) whose media
//!    type is declared, even when `Accept` says otherwise
//! 2. the first `Accept` range that matches a declared media type
//! 3. the document default media type, if declared
//! 4. the only declared media type
//! 5. otherwise the request is not acceptable

use super::types::{MockError, ResponseSpec};
use std::cmp::Ordering;

/// Media types served for known path extensions.
const EXTENSION_MEDIA_TYPES: &[(&str, &str)] = &[
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("txt", "text/plain"),
    ("text", "text/plain"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("csv", "text/csv"),
];

/// Media type registered for a path extension (without the dot).
pub fn extension_media_type(extension: &str) -> Option<&'static str> {
    EXTENSION_MEDIA_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, media_type)| *media_type)
}

/// Extension of the last path segment, if it has one.
pub fn path_extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next()?;
    let (stem, extension) = segment.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        None
    } else {
        Some(extension)
    }
}

/// Resolve the media type for a response.
///
/// Returns the media type key as declared in `response`.
pub fn negotiate<'r>(
    request_path: &str,
    accept: Option<&str>,
    response: &'r ResponseSpec,
    default_media_type: Option<&str>,
) -> Result<&'r str, MockError> {
    if let Some(media_type) = path_extension(request_path).and_then(extension_media_type) {
        if let Some((declared, _)) = response.body_entry(media_type) {
            return Ok(declared);
        }
    }

    if let Some(accept) = accept {
        for range in parse_accept(accept) {
            if let Some(declared) = response.media_types().find(|mt| range.matches(mt)) {
                return Ok(declared);
            }
        }
    }

    if let Some((declared, _)) = default_media_type.and_then(|mt| response.body_entry(mt)) {
        return Ok(declared);
    }

    let mut declared = response.media_types();
    if let (Some(only), None) = (declared.next(), declared.next()) {
        return Ok(only);
    }

    Err(MockError::NotAcceptable {
        available: response.media_types().map(str::to_string).collect(),
    })
}

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub main_type: String,
    pub sub_type: String,
    pub quality: f32,
}

impl MediaRange {
    /// Whether `media_type` (parameters ignored) falls in this range.
    pub fn matches(&self, media_type: &str) -> bool {
        let essence = essence(media_type);
        let Some((main, sub)) = essence.split_once('/') else {
            return false;
        };
        (self.main_type == "*" || self.main_type.eq_ignore_ascii_case(main))
            && (self.sub_type == "*" || self.sub_type.eq_ignore_ascii_case(sub))
    }
}

/// Parse an `Accept` header into ranges ordered by quality.
///
/// Ranges with equal quality keep header order; `q=0` ranges are dropped.
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let (main, sub) = parts.next()?.trim().split_once('/')?;
            let quality = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (quality > 0.0 && !main.is_empty() && !sub.is_empty()).then(|| MediaRange {
                main_type: main.trim().to_ascii_lowercase(),
                sub_type: sub.trim().to_ascii_lowercase(),
                quality,
            })
        })
        .collect();
    ranges.sort_by(|a, b| b.quality.partial_cmp(&a.quality).unwrap_or(Ordering::Equal));
    ranges
}

/// Media type without parameters (`application/json; charset=utf-8` → `application/json`).
pub fn essence(media_type: &str) -> &str {
    media_type.split(';').next().unwrap_or(media_type).trim()
}

/// Whether values for `media_type` are encoded as JSON text.
pub fn is_json(media_type: &str) -> bool {
    let essence = essence(media_type).to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json") || essence == "text/json"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::types::ValueSpec;

    fn json_and_xml() -> ResponseSpec {
        ResponseSpec::new()
            .with_body("application/json", ValueSpec::new())
            .with_body("application/xml", ValueSpec::new())
    }

    #[test]
    fn test_path_extension() {
        assert_eq!(path_extension("/api/ext.json"), Some("json"));
        assert_eq!(path_extension("/api/v1.2/users"), None);
        assert_eq!(path_extension("/api/.hidden"), None);
        assert_eq!(path_extension("/api/trailing."), None);
    }

    #[test]
    fn test_extension_beats_accept() {
        let response = json_and_xml();
        let negotiated = negotiate(
            "/api/users.json",
            Some("application/xml"),
            &response,
            Some("application/xml"),
        );
        assert_eq!(negotiated.unwrap(), "application/json");
    }

    #[test]
    fn test_unknown_extension_falls_through_to_accept() {
        let response = json_and_xml();
        let negotiated = negotiate("/api/users.bin", Some("application/xml"), &response, None);
        assert_eq!(negotiated.unwrap(), "application/xml");
    }

    #[test]
    fn test_accept_quality_order() {
        let response = json_and_xml();
        let negotiated = negotiate(
            "/api/users",
            Some("application/json;q=0.5, application/xml"),
            &response,
            None,
        );
        assert_eq!(negotiated.unwrap(), "application/xml");
    }

    #[test]
    fn test_accept_wildcard_picks_first_declared() {
        let response = json_and_xml();
        let negotiated = negotiate("/api/users", Some("*/*"), &response, None);
        assert_eq!(negotiated.unwrap(), "application/json");
    }

    #[test]
    fn test_accept_is_case_insensitive() {
        let response = json_and_xml();
        let negotiated = negotiate("/api/users", Some("Application/XML"), &response, None);
        assert_eq!(negotiated.unwrap(), "application/xml");
    }

    #[test]
    fn test_document_default_when_accept_misses() {
        let response = json_and_xml();
        let negotiated = negotiate(
            "/api/users",
            Some("text/html"),
            &response,
            Some("application/xml"),
        );
        assert_eq!(negotiated.unwrap(), "application/xml");
    }

    #[test]
    fn test_single_media_type_always_served() {
        let response = ResponseSpec::new().with_body("application/vnd.mock+json", ValueSpec::new());
        let negotiated = negotiate("/api/ext.json", Some("text/html"), &response, None);
        assert_eq!(negotiated.unwrap(), "application/vnd.mock+json");
    }

    #[test]
    fn test_not_acceptable() {
        let response = json_and_xml();
        let err = negotiate("/api/users", Some("text/html"), &response, Some("text/csv"))
            .unwrap_err();
        match err {
            MockError::NotAcceptable { available } => {
                assert_eq!(available, vec!["application/json", "application/xml"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_accept_drops_zero_quality() {
        let ranges = parse_accept("text/html;q=0, application/*;q=0.8, */*;q=0.1");
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].main_type, "application");
        assert_eq!(ranges[0].sub_type, "*");
        assert!(ranges[0].matches("application/xml"));
        assert!(!ranges[0].matches("text/xml"));
    }

    #[test]
    fn test_is_json() {
        assert!(is_json("application/json"));
        assert!(is_json("application/json; charset=utf-8"));
        assert!(is_json("application/vnd.api+json"));
        assert!(!is_json("application/xml"));
        assert!(!is_json("text/plain"));
    }
}
