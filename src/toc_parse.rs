use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::DocmapError;
use crate::model::{PageTextSource, TocEntry, TocSpan};

static TOC_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(.*?)(?:\.{2,}\s*|\s{2,})([0-9]{1,4})\s*$")
        .expect("hardcoded TOC entry regex is valid")
});

/// Splits one TOC line into `(title, page)`.
///
/// Returns `None` for lines without a dot leader or wide gap before a
/// trailing 1-4 digit page number, and for page `0`.
#[must_use]
pub fn parse_toc_line(line: &str) -> Option<TocEntry> {
    let captures = TOC_ENTRY_RE.captures(line.trim())?;
    let title = captures.get(1).map_or("", |value| value.as_str()).trim();
    let page = captures.get(2)?.as_str().parse::<u32>().ok()?;
    if page == 0 {
        debug!(line, "skipping TOC entry pointing at page 0");
        return None;
    }
    Some(TocEntry::new(title, page))
}

/// Parses every entry line of the given pages, in page then line order.
#[must_use]
pub fn parse_toc_text(text: &str) -> Vec<TocEntry> {
    text.lines().filter_map(parse_toc_line).collect()
}

pub fn extract_toc_entries<S>(source: &S, span: TocSpan) -> Result<Vec<TocEntry>, DocmapError>
where
    S: PageTextSource + ?Sized,
{
    let mut entries = Vec::new();
    for page_number in span.pages() {
        let text = source.extract_text(page_number)?;
        let page_entries = parse_toc_text(&text);
        debug!(
            page = page_number,
            entries = page_entries.len(),
            "parsed TOC page"
        );
        entries.extend(page_entries);
    }
    Ok(entries)
}
