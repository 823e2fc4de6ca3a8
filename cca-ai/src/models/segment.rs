//! Segments, search queries and retrieved context

use serde::{Deserialize, Serialize};

/// Separator placed between passages when they are handed to the analyzer
pub const PASSAGE_SEPARATOR: &str = "\n---\n";

/// Question/answer pair as returned by the segmentation model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDraft {
    pub customer_query: String,
    pub agent_response: String,
}

/// Question/answer pair with its position in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 1-based position in segmenter order; never renumbered
    pub index: usize,
    pub customer_query: String,
    pub agent_response: String,
}

impl Segment {
    pub fn new(index: usize, draft: SegmentDraft) -> Self {
        Self {
            index,
            customer_query: draft.customer_query,
            agent_response: draft.agent_response,
        }
    }
}

/// Normalized retrieval query derived from a segment
///
/// Never empty; construct through [`SearchQuery::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Trim the raw query; `None` when nothing is left
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Ranked passages returned for one query, kept verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub passages: Vec<String>,
}

impl RetrievedContext {
    pub fn new(passages: Vec<String>) -> Self {
        Self { passages }
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Passages joined for the analyzer prompt
    pub fn joined(&self) -> String {
        self.passages.join(PASSAGE_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_rejects_blank() {
        assert!(SearchQuery::new("").is_none());
        assert!(SearchQuery::new("  \n\t").is_none());
        assert_eq!(
            SearchQuery::new("  loan term limits ").unwrap().as_str(),
            "loan term limits"
        );
    }

    #[test]
    fn test_context_joined_with_separator() {
        let context = RetrievedContext::new(vec!["Article 1".into(), "Article 2".into()]);
        assert_eq!(context.joined(), "Article 1\n---\nArticle 2");
        assert_eq!(RetrievedContext::default().joined(), "");
    }
}
