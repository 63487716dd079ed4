use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::DocmapError;
use crate::model::{PageTextSource, TocSpan};
use crate::options::TocOptions;
use crate::text_match::fold_whitespace;

static TOC_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\.{2,}\s*[0-9]+|\s{2,}[0-9]+)$").expect("hardcoded TOC line regex is valid")
});

const TOC_HEADINGS: [&str; 2] = ["contents", "table of contents"];

fn non_empty_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// A line that ends the way a TOC entry does: a dot leader or a wide gap, then a page number.
#[must_use]
pub fn looks_like_toc_line(line: &str) -> bool {
    TOC_LINE_RE.is_match(line.trim())
}

#[must_use]
pub fn has_toc_heading(text: &str) -> bool {
    non_empty_lines(text)
        .iter()
        .any(|line| TOC_HEADINGS.contains(&fold_whitespace(line).as_str()))
}

#[must_use]
pub fn is_toc_like_page(text: &str, options: &TocOptions) -> bool {
    let lines = non_empty_lines(text);
    if lines.len() < options.min_total_lines {
        return false;
    }

    let entry_lines = lines
        .iter()
        .filter(|line| looks_like_toc_line(line))
        .count();
    entry_lines >= options.min_entry_lines
}

/// Finds the contiguous TOC page span among the first `max_scan_pages` pages.
///
/// A span starts on a page carrying a "Contents" heading or on the first
/// TOC-like page, grows while the following pages stay TOC-like, and is kept
/// only if it covers at least `min_toc_len` pages. `Ok(None)` means no TOC,
/// which callers treat as an empty index rather than a failure.
pub fn locate_toc<S>(source: &S, options: &TocOptions) -> Result<Option<TocSpan>, DocmapError>
where
    S: PageTextSource + ?Sized,
{
    options.validate()?;

    let last_page = source.page_count().min(options.max_scan_pages);
    let mut span: Option<TocSpan> = None;

    for page_number in 1..=last_page {
        let text = source.extract_text(page_number)?;
        match span.as_mut() {
            None => {
                let heading = has_toc_heading(&text);
                if heading || is_toc_like_page(&text, options) {
                    debug!(page = page_number, heading, "TOC start candidate");
                    span = Some(TocSpan {
                        start: page_number,
                        end: page_number,
                    });
                }
            }
            Some(current) => {
                if is_toc_like_page(&text, options) {
                    current.end = page_number;
                } else {
                    debug!(page = page_number, "TOC span ends before this page");
                    break;
                }
            }
        }
    }

    let accepted = span.filter(|span| span.len() >= options.min_toc_len);
    match (span, accepted) {
        (_, Some(found)) => info!(start = found.start, end = found.end, "TOC detected"),
        (Some(short), None) => debug!(
            start = short.start,
            end = short.end,
            min_toc_len = options.min_toc_len,
            "TOC candidate too short"
        ),
        (None, None) => debug!(scanned = last_page, "no TOC candidate"),
    }

    Ok(accepted)
}
