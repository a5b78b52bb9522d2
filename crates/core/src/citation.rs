//! Generated answers and their source citations

use serde::{Deserialize, Serialize};

/// Longest excerpt kept per citation, in characters
pub const MAX_EXCERPT_CHARS: usize = 300;

/// Appended to an excerpt that was cut
pub const TRUNCATION_MARKER: &str = "...";

/// Document name used when the backend reports no location at all
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// A source reference as the backend returns it, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievedReference {
    /// Source locator (`s3://bucket/key`, or a web URL)
    pub uri: Option<String>,
    /// Text of the retrieved chunk
    pub text: Option<String>,
}

impl RetrievedReference {
    pub fn new(uri: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            text: Some(text.into()),
        }
    }
}

/// Raw backend output for one retrieve-and-generate call
#[derive(Debug, Clone, Default)]
pub struct RawGeneration {
    pub text: String,
    /// References in backend order, flattened across citation groups
    pub references: Vec<RetrievedReference>,
    pub session_id: String,
}

/// A normalized source citation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source_document_name: String,
    pub source_uri: String,
    /// At most [`MAX_EXCERPT_CHARS`] characters, plus the marker when cut
    pub excerpt: String,
}

impl Citation {
    pub fn from_reference(reference: &RetrievedReference) -> Self {
        let uri = reference
            .uri
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(UNKNOWN_SOURCE);
        Self {
            source_document_name: document_name(uri).to_string(),
            source_uri: uri.to_string(),
            excerpt: excerpt(reference.text.as_deref().unwrap_or_default()),
        }
    }
}

/// Last path segment of a locator, or the locator itself without a `/`
pub fn document_name(uri: &str) -> &str {
    match uri.rsplit_once('/') {
        Some((_, last)) => last,
        None => uri,
    }
}

/// Cut text to [`MAX_EXCERPT_CHARS`] characters, marking the cut
pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(MAX_EXCERPT_CHARS) {
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
            out.push_str(&text[..cut]);
            out.push_str(TRUNCATION_MARKER);
            out
        },
        None => text.to_string(),
    }
}

/// Answer text with its citations, produced once per question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub generated_text: String,
    pub citations: Vec<Citation>,
    pub backend_session_id: String,
}

impl GenerationResult {
    pub fn from_raw(raw: RawGeneration) -> Self {
        Self {
            citations: raw.references.iter().map(Citation::from_reference).collect(),
            generated_text: raw.text,
            backend_session_id: raw.session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_name_from_s3_uri() {
        assert_eq!(document_name("s3://bucket/doc1.pdf"), "doc1.pdf");
        assert_eq!(document_name("s3://bucket/schemes/2024/pm-kisan.pdf"), "pm-kisan.pdf");
        assert_eq!(document_name("doc-without-path"), "doc-without-path");
    }

    #[test]
    fn test_short_excerpt_unchanged() {
        let text = "a".repeat(MAX_EXCERPT_CHARS);
        assert_eq!(excerpt(&text), text);
        assert_eq!(excerpt(""), "");
    }

    #[test]
    fn test_long_excerpt_truncated_with_marker() {
        let text = "b".repeat(MAX_EXCERPT_CHARS + 1);
        let cut = excerpt(&text);
        assert!(cut.ends_with(TRUNCATION_MARKER));
        assert_eq!(cut.chars().count(), MAX_EXCERPT_CHARS + TRUNCATION_MARKER.len());
        assert_eq!(&cut[..MAX_EXCERPT_CHARS], &text[..MAX_EXCERPT_CHARS]);
    }

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        let text = "किसान".repeat(100);
        let cut = excerpt(&text);
        let kept: String = cut.chars().take(MAX_EXCERPT_CHARS).collect();
        assert_eq!(kept, text.chars().take(MAX_EXCERPT_CHARS).collect::<String>());
        assert!(cut.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_missing_location_is_unknown() {
        let citation = Citation::from_reference(&RetrievedReference {
            uri: None,
            text: Some("text".into()),
        });
        assert_eq!(citation.source_document_name, UNKNOWN_SOURCE);
        assert_eq!(citation.source_uri, UNKNOWN_SOURCE);
    }

    #[test]
    fn test_from_raw_preserves_order() {
        let raw = RawGeneration {
            text: "PM-Kisan gives farmers income support.".into(),
            references: vec![
                RetrievedReference::new("s3://bucket/doc1.pdf", "first"),
                RetrievedReference::new("s3://bucket/doc2.pdf", "second"),
            ],
            session_id: "sess-1".into(),
        };
        let result = GenerationResult::from_raw(raw);
        let names: Vec<_> = result
            .citations
            .iter()
            .map(|c| c.source_document_name.as_str())
            .collect();
        assert_eq!(names, ["doc1.pdf", "doc2.pdf"]);
        assert_eq!(result.backend_session_id, "sess-1");
        assert_eq!(result.citations[1].excerpt, "second");
    }
}
