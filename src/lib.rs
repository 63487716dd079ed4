mod csv_out;
mod error;
mod geometry;
mod layout;
mod model;
mod options;
mod page_range;
mod pdf_reader;
mod sheet;
mod text_match;
mod toc_detect;
mod toc_parse;
mod topic_index;
mod topic_resolve;
mod warning;

use serde::Serialize;
use tracing::{info, warn};

pub use csv_out::{write_sheet_csv, write_sheet_csv_to_string};
pub use error::DocmapError;
pub use geometry::{Bounds, centroid, is_valid_polygon, polygon_contains, polygon_shape};
pub use layout::{
    Band, BandCell, ElementKind, LayoutElement, LayoutReport, MAX_SHEET_COLUMNS, PageLayout,
    PlacedTable, assemble_sheet, layout_page, reconstruct_document,
};
pub use model::{
    AnalyzedPage, DetectedCell, DetectedLine, DetectedTable, DocumentAnalysis, PageRange,
    PageText, PageTextSource, Point, Polygon, TocEntry, TocSpan,
};
pub use options::{CsvOptions, DEFAULT_SHEET_NAME, LayoutOptions, ResolveOptions, TocOptions};
pub use page_range::{PageRangeQuery, parse_page_ranges};
pub use pdf_reader::PdfPages;
pub use sheet::{Sheet, SheetCell, SheetModel, SheetRow};
pub use text_match::{normalize_key, similarity_ratio};
pub use toc_detect::{is_toc_like_page, locate_toc};
pub use toc_parse::{extract_toc_entries, parse_toc_line};
pub use topic_index::{TopicIndex, TopicSpan, build_topic_index};
pub use topic_resolve::{MatchKind, PageQuery, TopicMatch, resolve_query, resolve_topic};
pub use warning::{DocWarning, WarningCode};

/// Outcome of one TOC indexing pass over a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocReport {
    pub span: Option<TocSpan>,
    pub entries: Vec<TocEntry>,
    pub index: TopicIndex,
    pub warnings: Vec<DocWarning>,
}

impl TocReport {
    #[must_use]
    pub fn toc_found(&self) -> bool {
        self.span.is_some()
    }
}

/// Locates the TOC, parses its entries and builds the topic index.
///
/// A document without a recognizable TOC yields an empty index plus a
/// warning; callers then fall back to page-number queries.
pub fn index_document<S>(source: &S, options: &TocOptions) -> Result<TocReport, DocmapError>
where
    S: PageTextSource + ?Sized,
{
    let mut warnings = Vec::new();

    let Some(span) = locate_toc(source, options)? else {
        warnings.push(DocWarning::new(
            WarningCode::TocNotDetected,
            format!(
                "no table of contents found in the first {} pages; use page numbers instead",
                source.page_count().min(options.max_scan_pages)
            ),
        ));
        warn!("no table of contents detected");
        return Ok(TocReport {
            span: None,
            entries: Vec::new(),
            index: TopicIndex::new(),
            warnings,
        });
    };

    let entries = extract_toc_entries(source, span)?;
    if entries.is_empty() {
        warnings.push(
            DocWarning::new(
                WarningCode::NoTocEntries,
                "table of contents pages contain no parsable entries",
            )
            .with_page(span.start),
        );
        warn!(start = span.start, end = span.end, "TOC has no parsable entries");
    }

    let index = build_topic_index(&entries);
    if index.len() < entries.len() {
        warnings.push(DocWarning::new(
            WarningCode::TocEntrySkipped,
            format!(
                "{} repeated title(s) overwritten by later entries",
                entries.len() - index.len()
            ),
        ));
    }
    info!(
        entries = entries.len(),
        topics = index.len(),
        "topic index built"
    );

    Ok(TocReport {
        span: Some(span),
        entries,
        index,
        warnings,
    })
}

/// Text of each range under a `--- Page a to b ---` header.
///
/// Ranges are clamped to the document; a range with no pages left, or only
/// blank pages, is left out.
pub fn extract_ranges_text<S>(source: &S, ranges: &[PageRange]) -> Result<String, DocmapError>
where
    S: PageTextSource + ?Sized,
{
    let page_count = source.page_count();
    let mut sections = Vec::new();

    for range in ranges {
        let first = range.start.max(1);
        let last = range.end.min(page_count);
        if first > last {
            continue;
        }

        let mut pages = Vec::new();
        for page_number in first..=last {
            pages.push(source.extract_text(page_number)?);
        }
        let content = pages.join("\n");
        let content = content.trim();
        if !content.is_empty() {
            sections.push(format!(
                "--- Page {} to {} ---\n{content}",
                range.start, range.end
            ));
        }
    }

    Ok(sections.join("\n\n"))
}
