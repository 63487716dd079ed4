use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::error::DocmapError;
use crate::model::PageRange;
use crate::options::ResolveOptions;
use crate::page_range::parse_page_ranges;
use crate::text_match::{best_match, closest_candidate, normalize_key};
use crate::topic_index::{TopicIndex, TopicSpan};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Fuzzy { score: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicMatch {
    /// Title as stored in the index.
    pub title: String,
    pub span: TopicSpan,
    pub kind: MatchKind,
}

/// Normalized key to the last raw title that produced it.
fn normalized_lookup(index: &TopicIndex) -> IndexMap<String, &str> {
    let mut lookup = IndexMap::new();
    for title in index.titles() {
        lookup.insert(normalize_key(title), title);
    }
    lookup
}

/// Finds the index entry a free-text topic query refers to.
///
/// An exact match on the normalized key wins; otherwise the most similar
/// normalized key is taken if it reaches `options.cutoff`.
pub fn resolve_topic(
    query: &str,
    index: &TopicIndex,
    options: &ResolveOptions,
) -> Result<TopicMatch, DocmapError> {
    options.validate()?;

    let lookup = normalized_lookup(index);
    let wanted = normalize_key(query);

    let found = lookup.get(wanted.as_str()).map(|title| (*title, MatchKind::Exact));
    let found = found.or_else(|| {
        best_match(&wanted, lookup.keys().map(String::as_str), options.cutoff)
            .and_then(|(key, score)| lookup.get(key).map(|title| (*title, MatchKind::Fuzzy { score })))
    });

    let Some((title, kind)) = found else {
        let best = closest_candidate(&wanted, lookup.keys().map(String::as_str))
            .map(|(key, score)| (key.to_string(), score));
        debug!(query, ?best, cutoff = options.cutoff, "topic not found");
        return Err(DocmapError::TopicNotFound {
            query: query.to_string(),
            best,
        });
    };

    let span = index.get(title).ok_or_else(|| DocmapError::TopicNotFound {
        query: query.to_string(),
        best: None,
    })?;
    debug!(query, title, ?kind, "topic resolved");

    Ok(TopicMatch {
        title: title.to_string(),
        span,
        kind,
    })
}

/// A query-time request: a topic, a page list, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub topic: Option<String>,
    pub pages: Option<String>,
}

impl PageQuery {
    #[must_use]
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            pages: None,
        }
    }

    #[must_use]
    pub fn pages(pages: impl Into<String>) -> Self {
        Self {
            topic: None,
            pages: Some(pages.into()),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Turns a query into concrete page ranges.
///
/// A page list takes precedence over a topic. An open-ended topic span is
/// closed at `last_page`, the document's final page.
pub fn resolve_query(
    query: &PageQuery,
    index: &TopicIndex,
    last_page: u32,
    options: &ResolveOptions,
) -> Result<Vec<PageRange>, DocmapError> {
    if let Some(pages) = non_blank(query.pages.as_deref()) {
        return parse_page_ranges(pages);
    }

    if let Some(topic) = non_blank(query.topic.as_deref()) {
        let found = resolve_topic(topic, index, options)?;
        return Ok(vec![found.span.to_page_range(last_page)]);
    }

    Err(DocmapError::EmptyQuery)
}

#[cfg(test)]
mod tests {
    use super::{MatchKind, PageQuery, resolve_query, resolve_topic};
    use crate::error::DocmapError;
    use crate::model::PageRange;
    use crate::options::ResolveOptions;
    use crate::topic_index::{TopicIndex, TopicSpan};

    fn sample_index() -> TopicIndex {
        [
            ("1 Introduction", TopicSpan::new(1, Some(4))),
            ("2.3 Data Collection", TopicSpan::new(5, Some(8))),
            ("3 Results", TopicSpan::new(9, None)),
        ]
        .into_iter()
        .map(|(title, span)| (title.to_string(), span))
        .collect()
    }

    #[test]
    fn exact_match_on_normalized_key() {
        let found = resolve_topic("data collection", &sample_index(), &ResolveOptions::default())
            .expect("exact match");
        assert_eq!(found.title, "2.3 Data Collection");
        assert_eq!(found.span, TopicSpan::new(5, Some(8)));
        assert_eq!(found.kind, MatchKind::Exact);
    }

    #[test]
    fn query_with_heading_prefix_matches_exactly() {
        let found = resolve_topic("  3   RESULTS ", &sample_index(), &ResolveOptions::default())
            .expect("exact match");
        assert_eq!(found.title, "3 Results");
        assert_eq!(found.kind, MatchKind::Exact);
    }

    #[test]
    fn typo_matches_fuzzily() {
        let found = resolve_topic("dat colection", &sample_index(), &ResolveOptions::default())
            .expect("fuzzy match");
        assert_eq!(found.title, "2.3 Data Collection");
        assert!(matches!(found.kind, MatchKind::Fuzzy { score } if score >= 0.6));
    }

    #[test]
    fn unrelated_query_is_not_found() {
        let err = resolve_topic(
            "quantum entanglement",
            &sample_index(),
            &ResolveOptions::default(),
        )
        .expect_err("no match");
        assert!(err.is_topic_not_found());
    }

    #[test]
    fn empty_index_is_not_found() {
        let err = resolve_topic("anything", &TopicIndex::new(), &ResolveOptions::default())
            .expect_err("empty index");
        assert!(matches!(err, DocmapError::TopicNotFound { best: None, .. }));
    }

    #[test]
    fn stricter_cutoff_rejects_typo() {
        let options = ResolveOptions { cutoff: 0.95 };
        assert!(resolve_topic("dat colection", &sample_index(), &options).is_err());
    }

    #[test]
    fn last_raw_title_wins_for_shared_normalized_key() {
        let index: TopicIndex = [
            ("1 Summary", TopicSpan::new(2, Some(2))),
            ("9 Summary", TopicSpan::new(40, None)),
        ]
        .into_iter()
        .map(|(title, span)| (title.to_string(), span))
        .collect();
        let found =
            resolve_topic("summary", &index, &ResolveOptions::default()).expect("exact match");
        assert_eq!(found.title, "9 Summary");
        assert_eq!(found.span, TopicSpan::new(40, None));
    }

    #[test]
    fn equal_fuzzy_scores_pick_greatest_key() {
        let index: TopicIndex = [
            ("Ax", TopicSpan::new(1, Some(1))),
            ("Xb", TopicSpan::new(2, None)),
        ]
        .into_iter()
        .map(|(title, span)| (title.to_string(), span))
        .collect();
        let options = ResolveOptions { cutoff: 0.5 };
        let found = resolve_topic("ab", &index, &options).expect("fuzzy match");
        assert_eq!(found.title, "Xb");
        assert_eq!(found.kind, MatchKind::Fuzzy { score: 0.5 });
    }

    #[test]
    fn page_query_takes_precedence_over_topic() {
        let query = PageQuery {
            topic: Some("results".to_string()),
            pages: Some("2,4-5".to_string()),
        };
        let ranges = resolve_query(&query, &sample_index(), 20, &ResolveOptions::default())
            .expect("page query");
        assert_eq!(ranges, vec![PageRange::new(2, 2), PageRange::new(4, 5)]);
    }

    #[test]
    fn open_topic_span_runs_to_last_page() {
        let ranges = resolve_query(
            &PageQuery::topic("results"),
            &sample_index(),
            20,
            &ResolveOptions::default(),
        )
        .expect("topic query");
        assert_eq!(ranges, vec![PageRange::new(9, 20)]);
    }

    #[test]
    fn blank_query_is_rejected() {
        let query = PageQuery {
            topic: Some("   ".to_string()),
            pages: None,
        };
        let err = resolve_query(&query, &sample_index(), 20, &ResolveOptions::default())
            .expect_err("blank query");
        assert!(matches!(err, DocmapError::EmptyQuery));
    }

    #[test]
    fn malformed_page_query_is_a_parse_error() {
        let err = resolve_query(
            &PageQuery::pages("x-1"),
            &sample_index(),
            20,
            &ResolveOptions::default(),
        )
        .expect_err("bad pages");
        assert!(matches!(err, DocmapError::InvalidPageRange { .. }));
    }
}
