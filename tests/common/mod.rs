#![allow(dead_code)]

use std::path::Path;

use docmap::{
    AnalyzedPage, DetectedCell, DetectedLine, DetectedTable, DocumentAnalysis, Point, Polygon,
};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Writes a text-only PDF, one `Tj` per line in Courier.
pub fn create_test_pdf(path: &Path, pages: &[Vec<String>]) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Td", vec![50.into(), 780.into()]),
        ];
        for (index, line) in lines.iter().enumerate() {
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
            if index + 1 < lines.len() {
                operations.push(Operation::new("T*", vec![]));
            }
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}

fn lines(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

/// Twelve pages: a two-page TOC, then one body page per remaining page.
pub fn report_pages() -> Vec<Vec<String>> {
    let mut pages = vec![
        lines(&[
            "Contents",
            "Introduction ........ 3",
            "Background .......... 4",
            "1.2 Scope ........... 5",
            "Methods ............. 6",
        ]),
        lines(&[
            "2.3 Data Collection .. 7",
            "Results ............. 9",
            "Discussion .......... 10",
            "References .......... 11",
            "Appendix ............ 12",
        ]),
    ];
    for page in 3..=12 {
        pages.push(vec![format!("Body of page {page}")]);
    }
    pages
}

pub fn prose_pages() -> Vec<Vec<String>> {
    vec![
        lines(&[
            "A short memo with no table of contents.",
            "It mentions chapter 3 but never lists pages.",
        ]),
        lines(&["Second page of the memo."]),
    ]
}

pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
    vec![
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ]
}

/// Table of unit cells with its top-left corner at `(x, y)`.
pub fn grid_table(page: u32, x: f64, y: f64, rows: &[&[&str]]) -> DetectedTable {
    let mut cells = Vec::new();
    for (row, values) in rows.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            let left = x + f64::from(u32::try_from(col).expect("small grid"));
            let top = y + f64::from(u32::try_from(row).expect("small grid"));
            cells.push(DetectedCell {
                row_index: u32::try_from(row).expect("small grid"),
                column_index: u32::try_from(col).expect("small grid"),
                column_span: 1,
                content: (*value).to_string(),
                polygon: rect(left, top, left + 1.0, top + 1.0),
            });
        }
    }
    DetectedTable {
        page_number: page,
        cells,
        bounding_polygon: None,
    }
}

pub fn text_line(content: &str, x: f64, y: f64) -> DetectedLine {
    DetectedLine {
        content: content.to_string(),
        polygon: rect(x, y - 0.1, x + 3.0, y + 0.1),
    }
}

/// Two pages: side-by-side tables under a title, then a page of prose with one table.
pub fn sample_analysis() -> DocumentAnalysis {
    DocumentAnalysis {
        pages: vec![
            AnalyzedPage {
                page_number: 2,
                lines: vec![
                    text_line("Closing remarks", 0.0, 5.0),
                    text_line("x", 0.2, 1.5),
                ],
            },
            AnalyzedPage {
                page_number: 1,
                lines: vec![text_line("Quarterly figures", 0.0, 0.2), text_line("a", 0.2, 1.5)],
            },
        ],
        tables: vec![
            grid_table(1, 0.0, 1.0, &[&["a", "b"], &["1", "2"]]),
            grid_table(1, 10.0, 1.2, &[&["c"], &["3"]]),
            grid_table(2, 0.0, 1.0, &[&["x", "y"]]),
        ],
    }
}
