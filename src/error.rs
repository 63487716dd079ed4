use std::io;

use thiserror::Error;

pub(crate) const PAGE_RANGE_USAGE: &str = "use e.g. `5`, `5-7`, or `2,4,6-8`";

#[derive(Debug, Error)]
pub enum DocmapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("invalid page query '{token}': {reason}; {usage}", usage = PAGE_RANGE_USAGE)]
    InvalidPageRange { token: String, reason: String },

    #[error("topic '{query}' not found{}", best_candidate(.best))]
    TopicNotFound {
        query: String,
        best: Option<(String, f64)>,
    },

    #[error("no topic or page query given; ask for a topic or {usage}", usage = PAGE_RANGE_USAGE)]
    EmptyQuery,

    #[error("page {page} is outside the document (1..={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

impl DocmapError {
    pub(crate) fn invalid_page_range(token: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPageRange {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the caller can fall back to a page-number query.
    #[must_use]
    pub fn is_topic_not_found(&self) -> bool {
        matches!(self, Self::TopicNotFound { .. })
    }
}

fn best_candidate(best: &Option<(String, f64)>) -> String {
    match best {
        Some((key, score)) => format!(" (closest: '{key}', similarity {score:.2})"),
        None => String::new(),
    }
}
