use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocmapError;
use crate::model::PageRange;

/// Ordered page ranges as typed by a user, e.g. `2,4,6-8`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageRangeQuery {
    ranges: Vec<PageRange>,
}

impl PageRangeQuery {
    #[must_use]
    pub fn ranges(&self) -> &[PageRange] {
        &self.ranges
    }

    #[must_use]
    pub fn into_ranges(self) -> Vec<PageRange> {
        self.ranges
    }
}

impl FromStr for PageRangeQuery {
    type Err = DocmapError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        parse_page_ranges(spec).map(|ranges| Self { ranges })
    }
}

fn strip_page_keyword(spec: &str) -> &str {
    let trimmed = spec.trim();
    let lowered = trimmed.to_ascii_lowercase();
    for keyword in ["pages", "page"] {
        if lowered.starts_with(keyword) {
            return trimmed[keyword.len()..].trim_start();
        }
    }
    trimmed
}

fn parse_page_number(raw: &str, token: &str) -> Result<u32, DocmapError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(DocmapError::invalid_page_range(
            token,
            format!("'{raw}' is not a page number"),
        ));
    }
    let page = raw
        .parse::<u32>()
        .map_err(|error| DocmapError::invalid_page_range(token, error.to_string()))?;
    if page == 0 {
        return Err(DocmapError::invalid_page_range(token, "pages are 1-based"));
    }
    Ok(page)
}

/// Parses `5`, `5-7` or `2,4,6-8` into ranges in input order.
///
/// Ranges are neither merged nor checked against the document length, and a
/// reversed range such as `7-5` is passed through unchanged. Any malformed
/// token fails the whole query.
pub fn parse_page_ranges(spec: &str) -> Result<Vec<PageRange>, DocmapError> {
    let body = strip_page_keyword(spec);
    let mut ranges = Vec::new();

    for token in body.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some((start, end)) = token.split_once('-') {
            let start = parse_page_number(start, token)?;
            let end = parse_page_number(end, token)?;
            ranges.push(PageRange::new(start, end));
        } else {
            ranges.push(PageRange::single(parse_page_number(token, token)?));
        }
    }

    if ranges.is_empty() {
        return Err(DocmapError::invalid_page_range(
            spec.trim(),
            "page query cannot be empty",
        ));
    }

    Ok(ranges)
}
