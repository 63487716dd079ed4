use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::DocmapError;

/// Extracted plain text of one page, newline-delimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// Anything that can hand out page text by 1-based page number.
pub trait PageTextSource {
    fn page_count(&self) -> u32;

    fn extract_text(&self, page_number: u32) -> Result<String, DocmapError>;
}

impl PageTextSource for [PageText] {
    fn page_count(&self) -> u32 {
        u32::try_from(self.len()).unwrap_or(u32::MAX)
    }

    fn extract_text(&self, page_number: u32) -> Result<String, DocmapError> {
        self.iter()
            .find(|page| page.page_number == page_number)
            .map(|page| page.text.clone())
            .ok_or(DocmapError::PageOutOfRange {
                page: page_number,
                page_count: self.page_count(),
            })
    }
}

impl PageTextSource for Vec<PageText> {
    fn page_count(&self) -> u32 {
        self.as_slice().page_count()
    }

    fn extract_text(&self, page_number: u32) -> Result<String, DocmapError> {
        self.as_slice().extract_text(page_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub title: String,
    pub page: u32,
}

impl TocEntry {
    #[must_use]
    pub fn new(title: impl Into<String>, page: u32) -> Self {
        Self {
            title: title.into(),
            page,
        }
    }
}

/// Inclusive page span of the detected table of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocSpan {
    pub start: u32,
    pub end: u32,
}

impl TocSpan {
    #[must_use]
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start) + 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

/// Inclusive page range. `start <= end` is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn single(page: u32) -> Self {
        Self {
            start: page,
            end: page,
        }
    }
}

impl From<(u32, u32)> for PageRange {
    fn from((start, end): (u32, u32)) -> Self {
        Self { start, end }
    }
}

impl From<PageRange> for (u32, u32) {
    fn from(range: PageRange) -> Self {
        (range.start, range.end)
    }
}

/// A vertex in page coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub type Polygon = Vec<Point>;

fn default_column_span() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedCell {
    pub row_index: u32,
    pub column_index: u32,
    #[serde(default = "default_column_span")]
    pub column_span: u32,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub polygon: Polygon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedTable {
    pub page_number: u32,
    #[serde(default)]
    pub cells: Vec<DetectedCell>,
    /// Region of the whole table when the analysis service reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_polygon: Option<Polygon>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLine {
    pub content: String,
    #[serde(default)]
    pub polygon: Polygon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedPage {
    pub page_number: u32,
    #[serde(default)]
    pub lines: Vec<DetectedLine>,
}

/// Raw output of an external layout-analysis pass over one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    #[serde(default)]
    pub pages: Vec<AnalyzedPage>,
    #[serde(default)]
    pub tables: Vec<DetectedTable>,
}

impl DocumentAnalysis {
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, DocmapError> {
        Ok(serde_json::from_reader(reader)?)
    }
}
