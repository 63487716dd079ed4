use std::io::{Read, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DocmapError;
use crate::model::{PageRange, TocEntry};

/// Pages covered by one topic. `end == None` runs to the end of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, Option<u32>)", into = "(u32, Option<u32>)")]
pub struct TopicSpan {
    pub start: u32,
    pub end: Option<u32>,
}

impl TopicSpan {
    #[must_use]
    pub const fn new(start: u32, end: Option<u32>) -> Self {
        Self { start, end }
    }

    /// Closes an open span at `last_page`.
    #[must_use]
    pub fn to_page_range(self, last_page: u32) -> PageRange {
        PageRange::new(self.start, self.end.unwrap_or(last_page))
    }
}

impl From<(u32, Option<u32>)> for TopicSpan {
    fn from((start, end): (u32, Option<u32>)) -> Self {
        Self { start, end }
    }
}

impl From<TopicSpan> for (u32, Option<u32>) {
    fn from(span: TopicSpan) -> Self {
        (span.start, span.end)
    }
}

/// Raw TOC title to page span, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicIndex {
    topics: IndexMap<String, TopicSpan>,
}

impl TopicIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    #[must_use]
    pub fn get(&self, title: &str) -> Option<TopicSpan> {
        self.topics.get(title).copied()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TopicSpan)> {
        self.topics
            .iter()
            .map(|(title, span)| (title.as_str(), *span))
    }

    /// Inserts or overwrites `title`; an overwritten title keeps its position.
    pub fn insert(&mut self, title: impl Into<String>, span: TopicSpan) -> Option<TopicSpan> {
        self.topics.insert(title.into(), span)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, DocmapError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_json_writer<W: Write>(&self, writer: W) -> Result<(), DocmapError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

impl FromIterator<(String, TopicSpan)> for TopicIndex {
    fn from_iter<T: IntoIterator<Item = (String, TopicSpan)>>(iter: T) -> Self {
        Self {
            topics: iter.into_iter().collect(),
        }
    }
}

fn span_end(start: u32, next_start: Option<u32>) -> Option<u32> {
    match next_start {
        Some(next) if next > start => Some(next - 1),
        Some(next) if next == start => Some(start),
        _ => None,
    }
}

/// Pairs every entry with the page before the next entry starts.
///
/// An entry followed by one on an earlier page, like the last entry, stays
/// open-ended. A repeated title overwrites the earlier span.
#[must_use]
pub fn build_topic_index(entries: &[TocEntry]) -> TopicIndex {
    let mut index = TopicIndex::new();
    for (position, entry) in entries.iter().enumerate() {
        let next_start = entries.get(position + 1).map(|next| next.page);
        let span = TopicSpan::new(entry.page, span_end(entry.page, next_start));
        index.insert(entry.title.clone(), span);
    }
    index
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{TopicIndex, TopicSpan, build_topic_index};
    use crate::model::{PageRange, TocEntry};

    fn entries(items: &[(&str, u32)]) -> Vec<TocEntry> {
        items
            .iter()
            .map(|(title, page)| TocEntry::new(*title, *page))
            .collect()
    }

    #[test]
    fn builds_closed_spans_and_open_tail() {
        let index = build_topic_index(&entries(&[("Intro", 1), ("Methods", 5), ("Results", 9)]));
        assert_eq!(index.get("Intro"), Some(TopicSpan::new(1, Some(4))));
        assert_eq!(index.get("Methods"), Some(TopicSpan::new(5, Some(8))));
        assert_eq!(index.get("Results"), Some(TopicSpan::new(9, None)));
    }

    #[test]
    fn serializes_as_title_to_pair_object() {
        let index = build_topic_index(&entries(&[("Intro", 1), ("Methods", 5), ("Results", 9)]));
        let json = serde_json::to_string(&index).expect("serialize index");
        assert_eq!(
            json,
            r#"{"Intro":[1,4],"Methods":[5,8],"Results":[9,null]}"#
        );

        let parsed: TopicIndex = serde_json::from_str(&json).expect("parse index");
        assert_eq!(parsed, index);
    }

    #[test]
    fn out_of_order_next_page_leaves_span_open() {
        let index = build_topic_index(&entries(&[("Appendix", 40), ("Glossary", 12)]));
        assert_eq!(index.get("Appendix"), Some(TopicSpan::new(40, None)));
    }

    #[test]
    fn shared_start_page_closes_on_same_page() {
        let index = build_topic_index(&entries(&[("2.1 Setup", 7), ("2.2 Tools", 7), ("3 End", 9)]));
        assert_eq!(index.get("2.1 Setup"), Some(TopicSpan::new(7, Some(7))));
    }

    #[test]
    fn later_duplicate_title_overwrites_in_place() {
        let index = build_topic_index(&entries(&[("Notes", 2), ("Body", 4), ("Notes", 30)]));
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("Notes"), Some(TopicSpan::new(30, None)));
        assert_eq!(index.titles().collect::<Vec<_>>(), vec!["Notes", "Body"]);
    }

    #[test]
    fn empty_entries_give_empty_index() {
        assert!(build_topic_index(&[]).is_empty());
    }

    #[test]
    fn open_span_closes_at_last_page() {
        assert_eq!(
            TopicSpan::new(9, None).to_page_range(20),
            PageRange::new(9, 20)
        );
        assert_eq!(
            TopicSpan::new(1, Some(4)).to_page_range(20),
            PageRange::new(1, 4)
        );
    }
}
