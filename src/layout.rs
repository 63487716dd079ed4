use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::DocmapError;
use crate::geometry::{Bounds, centroid, is_valid_polygon, polygon_contains, polygon_shape};
use crate::model::{AnalyzedPage, DetectedLine, DetectedTable, DocumentAnalysis};
use crate::options::LayoutOptions;
use crate::sheet::{SheetBuilder, SheetModel};
use crate::warning::{DocWarning, WarningCode};

/// Widest row a sheet can hold; cells beyond it are dropped.
pub const MAX_SHEET_COLUMNS: u32 = 16_384;

/// A table that survived geometry checks, with its page extents.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedTable {
    /// Position of the table in the analysis input.
    pub source: usize,
    pub bounds: Bounds,
    /// Region used to decide whether free text duplicates table content.
    pub outline: geo::Polygon<f64>,
    pub column_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandCell {
    pub col: u32,
    pub text: String,
}

/// Tables sharing a vertical strip, merged into one logical table.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub ymin: f64,
    pub ymax: f64,
    /// Indices into [`PageLayout::tables`], left to right once columns are assigned.
    pub members: Vec<usize>,
    pub rows: BTreeMap<u32, Vec<BandCell>>,
}

impl Band {
    fn overlaps(&self, bounds: &Bounds) -> bool {
        bounds.overlaps_vertically(self.ymin, self.ymax)
    }

    fn absorb(&mut self, table: usize, bounds: &Bounds) {
        self.members.push(table);
        self.ymin = self.ymin.min(bounds.ymin);
        self.ymax = self.ymax.max(bounds.ymax);
    }

    #[must_use]
    pub fn column_count(&self) -> u32 {
        self.rows
            .values()
            .flatten()
            .map(|cell| cell.col + 1)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Index into [`PageLayout::bands`].
    Band(usize),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutElement {
    pub y: f64,
    pub kind: ElementKind,
}

/// One page in reading order, before document-wide row numbering.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub page_number: u32,
    pub tables: Vec<PlacedTable>,
    pub bands: Vec<Band>,
    pub elements: Vec<LayoutElement>,
    pub dropped_lines: usize,
    pub warnings: Vec<DocWarning>,
}

impl PageLayout {
    fn emit_rows(&self, builder: &mut SheetBuilder) {
        for element in &self.elements {
            match &element.kind {
                ElementKind::Band(band) => {
                    for cells in self.bands[*band].rows.values() {
                        let mut cells = cells.iter().collect::<Vec<_>>();
                        cells.sort_by_key(|cell| cell.col);
                        builder.push_row(cells.into_iter().map(|cell| cell.text.clone()));
                    }
                    builder.push_blank();
                }
                ElementKind::Text(text) => builder.push_row([text.clone()]),
            }
        }
    }
}

fn place_table(
    page_number: u32,
    source: usize,
    table: &DetectedTable,
    warnings: &mut Vec<DocWarning>,
) -> Option<PlacedTable> {
    if table.cells.is_empty() {
        warnings.push(
            DocWarning::new(WarningCode::DegenerateTableGeometry, "table has no cells; skipped")
                .with_page(page_number)
                .with_table(source),
        );
        return None;
    }

    let mut vertices = Vec::new();
    for cell in &table.cells {
        if is_valid_polygon(&cell.polygon) {
            vertices.extend(cell.polygon.iter());
        } else {
            warnings.push(
                DocWarning::new(
                    WarningCode::DegenerateCellGeometry,
                    format!(
                        "cell ({}, {}) has a degenerate polygon; its position is ignored",
                        cell.row_index, cell.column_index
                    ),
                )
                .with_page(page_number)
                .with_table(source),
            );
        }
    }

    let Some(bounds) = Bounds::of_points(vertices) else {
        warnings.push(
            DocWarning::new(
                WarningCode::DegenerateTableGeometry,
                "no cell of the table has usable geometry; skipped",
            )
            .with_page(page_number)
            .with_table(source),
        );
        return None;
    };

    let outline = match table.bounding_polygon.as_deref() {
        Some(polygon) if is_valid_polygon(polygon) => polygon_shape(polygon),
        _ => polygon_shape(&bounds.to_polygon()),
    };

    let mut column_count = 0;
    for cell in &table.cells {
        if cell.column_index < MAX_SHEET_COLUMNS {
            column_count = column_count.max(cell.column_index + 1);
        } else {
            warnings.push(
                DocWarning::new(
                    WarningCode::DegenerateCellGeometry,
                    format!(
                        "cell ({}, {}) lies beyond column {MAX_SHEET_COLUMNS}; skipped",
                        cell.row_index, cell.column_index
                    ),
                )
                .with_page(page_number)
                .with_table(source),
            );
        }
    }

    Some(PlacedTable {
        source,
        bounds,
        outline,
        column_count,
    })
}

/// Single pass in input order: each table joins the first band it overlaps.
///
/// Not transitively closed, so tables that only become connected through a
/// later band expansion stay in separate bands.
fn cluster_bands(tables: &[PlacedTable]) -> Vec<Band> {
    let mut bands: Vec<Band> = Vec::new();
    for (position, table) in tables.iter().enumerate() {
        match bands.iter_mut().find(|band| band.overlaps(&table.bounds)) {
            Some(band) => band.absorb(position, &table.bounds),
            None => bands.push(Band {
                ymin: table.bounds.ymin,
                ymax: table.bounds.ymax,
                members: vec![position],
                rows: BTreeMap::new(),
            }),
        }
    }
    bands
}

/// Spans are cut at the band's right edge, so no cell reaches past the
/// combined column count.
fn merge_band_columns(band: &mut Band, tables: &[PlacedTable], sources: &[&DetectedTable]) {
    band.members
        .sort_by(|left, right| tables[*left].bounds.xmin.total_cmp(&tables[*right].bounds.xmin));
    let width = band
        .members
        .iter()
        .fold(0_u32, |width, &member| width.saturating_add(tables[member].column_count));

    let mut offset = 0_u32;
    for &member in &band.members {
        let placed = &tables[member];
        for cell in &sources[member].cells {
            if cell.column_index >= MAX_SHEET_COLUMNS {
                continue;
            }
            let Some(first) = offset
                .checked_add(cell.column_index)
                .filter(|first| *first < width)
            else {
                continue;
            };
            let text = cell.content.trim();
            for span in 0..cell.column_span.clamp(1, width - first) {
                band.rows.entry(cell.row_index).or_default().push(BandCell {
                    col: first + span,
                    text: text.to_string(),
                });
            }
        }
        offset = offset.saturating_add(placed.column_count);
    }
}

enum LinePlacement {
    Kept(LayoutElement),
    /// Centered inside a table, so it repeats table content.
    Covered,
    Skipped,
}

fn place_line(
    page_number: u32,
    line: &DetectedLine,
    tables: &[PlacedTable],
    warnings: &mut Vec<DocWarning>,
) -> LinePlacement {
    let center = if is_valid_polygon(&line.polygon) {
        centroid(&line.polygon)
    } else {
        None
    };
    let Some(center) = center else {
        warnings.push(
            DocWarning::new(
                WarningCode::DegenerateLineGeometry,
                format!("line '{}' has a degenerate polygon; skipped", line.content.trim()),
            )
            .with_page(page_number),
        );
        return LinePlacement::Skipped;
    };

    if tables
        .iter()
        .any(|table| polygon_contains(&table.outline, center))
    {
        return LinePlacement::Covered;
    }

    LinePlacement::Kept(LayoutElement {
        y: center.y,
        kind: ElementKind::Text(line.content.trim().to_string()),
    })
}

/// Lays out one page: bands of tables plus free text, sorted top to bottom.
///
/// `tables` pairs each table with its position in the analysis input.
#[must_use]
pub fn layout_page(
    page_number: u32,
    tables: &[(usize, &DetectedTable)],
    lines: &[DetectedLine],
) -> PageLayout {
    let mut warnings = Vec::new();
    let mut placed = Vec::new();
    let mut sources = Vec::new();
    for (source, table) in tables {
        if let Some(table_layout) = place_table(page_number, *source, table, &mut warnings) {
            placed.push(table_layout);
            sources.push(*table);
        }
    }

    let mut bands = cluster_bands(&placed);
    for band in &mut bands {
        merge_band_columns(band, &placed, &sources);
    }

    let mut elements = bands
        .iter()
        .enumerate()
        .map(|(position, band)| LayoutElement {
            y: band.ymin,
            kind: ElementKind::Band(position),
        })
        .collect::<Vec<_>>();

    let mut dropped_lines = 0;
    for line in lines {
        match place_line(page_number, line, &placed, &mut warnings) {
            LinePlacement::Kept(element) => elements.push(element),
            LinePlacement::Covered => dropped_lines += 1,
            LinePlacement::Skipped => {}
        }
    }

    elements.sort_by(|left, right| left.y.total_cmp(&right.y));

    debug!(
        page = page_number,
        tables = placed.len(),
        bands = bands.len(),
        dropped_lines,
        "page laid out"
    );

    PageLayout {
        page_number,
        tables: placed,
        bands,
        elements,
        dropped_lines,
        warnings,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutReport {
    pub page_count: usize,
    pub table_count: usize,
    pub band_count: usize,
    pub row_count: usize,
    pub dropped_line_count: usize,
    pub warnings: Vec<DocWarning>,
}

/// Numbers rows across all pages, strictly by ascending page number.
#[must_use]
pub fn assemble_sheet(mut pages: Vec<PageLayout>, sheet_name: &str) -> (SheetModel, LayoutReport) {
    pages.sort_by_key(|page| page.page_number);

    let mut builder = SheetBuilder::new();
    let mut report = LayoutReport {
        page_count: pages.len(),
        ..LayoutReport::default()
    };
    for page in pages {
        page.emit_rows(&mut builder);
        report.table_count += page.tables.len();
        report.band_count += page.bands.len();
        report.dropped_line_count += page.dropped_lines;
        report.warnings.extend(page.warnings);
    }
    report.row_count = builder.row_count();

    (SheetModel::single(builder.finish(sheet_name)), report)
}

/// First entry per page number, in input order.
fn distinct_pages<'a>(
    analysis: &'a DocumentAnalysis,
    warnings: &mut Vec<DocWarning>,
) -> Vec<&'a AnalyzedPage> {
    let mut seen = BTreeSet::new();
    let mut pages = Vec::with_capacity(analysis.pages.len());
    for page in &analysis.pages {
        if seen.insert(page.page_number) {
            pages.push(page);
        } else {
            warnings.push(
                DocWarning::new(
                    WarningCode::DuplicatePage,
                    "page appears more than once in the analysis; repeat skipped",
                )
                .with_page(page.page_number),
            );
        }
    }
    pages
}

fn tables_by_page<'a>(
    analysis: &'a DocumentAnalysis,
    warnings: &mut Vec<DocWarning>,
) -> HashMap<u32, Vec<(usize, &'a DetectedTable)>> {
    let known_pages = analysis
        .pages
        .iter()
        .map(|page| page.page_number)
        .collect::<BTreeSet<_>>();

    let mut grouped: HashMap<u32, Vec<(usize, &DetectedTable)>> = HashMap::new();
    for (source, table) in analysis.tables.iter().enumerate() {
        if known_pages.contains(&table.page_number) {
            grouped.entry(table.page_number).or_default().push((source, table));
        } else {
            warnings.push(
                DocWarning::new(
                    WarningCode::OrphanTable,
                    "table refers to a page missing from the analysis; skipped",
                )
                .with_page(table.page_number)
                .with_table(source),
            );
        }
    }
    grouped
}

/// Rebuilds a whole document into one sheet.
///
/// Pages are laid out independently (in parallel when enabled) and then
/// numbered in a single ordered pass, so the result does not depend on
/// worker scheduling. Degenerate geometry is skipped and reported, never
/// fatal.
pub fn reconstruct_document(
    analysis: &DocumentAnalysis,
    options: &LayoutOptions,
) -> Result<(SheetModel, LayoutReport), DocmapError> {
    options.validate()?;

    let mut routing_warnings = Vec::new();
    let grouped = tables_by_page(analysis, &mut routing_warnings);
    let unique_pages = distinct_pages(analysis, &mut routing_warnings);
    let no_tables = Vec::new();

    let lay_out = |page: &AnalyzedPage| {
        let tables = grouped.get(&page.page_number).unwrap_or(&no_tables);
        layout_page(page.page_number, tables, &page.lines)
    };
    let pages = if options.parallel {
        unique_pages.into_par_iter().map(lay_out).collect::<Vec<_>>()
    } else {
        unique_pages.into_iter().map(lay_out).collect::<Vec<_>>()
    };

    let (sheet, mut report) = assemble_sheet(pages, &options.sheet_name);
    routing_warnings.append(&mut report.warnings);
    report.warnings = routing_warnings;

    for warning in &report.warnings {
        warn!(code = ?warning.code, page = ?warning.page, table = ?warning.table, "{}", warning.message);
    }
    info!(
        pages = report.page_count,
        tables = report.table_count,
        bands = report.band_count,
        rows = report.row_count,
        dropped_lines = report.dropped_line_count,
        "sheet reconstructed"
    );

    Ok((sheet, report))
}
