use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::DocmapError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetCell {
    pub value: String,
    pub enable: bool,
    /// 1-based position within the row.
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    /// 1-based, unique and increasing across the whole sheet.
    pub index: u32,
    pub cells: Vec<SheetCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<SheetRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetModel {
    #[serde(rename = "activeSheet")]
    pub active_sheet: String,
    pub sheets: Vec<Sheet>,
}

impl SheetModel {
    #[must_use]
    pub fn single(sheet: Sheet) -> Self {
        Self {
            active_sheet: sheet.name.clone(),
            sheets: vec![sheet],
        }
    }

    /// The sheet named by `active_sheet`, falling back to the first one.
    #[must_use]
    pub fn active(&self) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == self.active_sheet)
            .or_else(|| self.sheets.first())
    }

    pub fn to_json_writer<W: Write>(&self, writer: W) -> Result<(), DocmapError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Appends rows under one document-wide counter.
#[derive(Debug)]
pub(crate) struct SheetBuilder {
    next_index: u32,
    rows: Vec<SheetRow>,
}

impl SheetBuilder {
    pub(crate) fn new() -> Self {
        Self {
            next_index: 1,
            rows: Vec::new(),
        }
    }

    /// Appends a row whose cells are re-indexed from 1 in the given order.
    pub(crate) fn push_row<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = String>,
    {
        let cells = values
            .into_iter()
            .zip(1_u32..)
            .map(|(value, index)| SheetCell {
                value,
                enable: true,
                index,
            })
            .collect();
        self.rows.push(SheetRow {
            index: self.next_index,
            cells,
        });
        self.next_index += 1;
    }

    pub(crate) fn push_blank(&mut self) {
        self.push_row(std::iter::empty());
    }

    pub(crate) fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn finish(self, name: &str) -> Sheet {
        Sheet {
            name: name.to_string(),
            rows: self.rows,
        }
    }
}
