use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    TocNotDetected,
    NoTocEntries,
    TocEntrySkipped,
    DegenerateCellGeometry,
    DegenerateTableGeometry,
    DegenerateLineGeometry,
    OrphanTable,
    DuplicatePage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocWarning {
    pub code: WarningCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<usize>,
}

impl DocWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
            table: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Position of the table in the analysis input.
    #[must_use]
    pub fn with_table(mut self, table: usize) -> Self {
        self.table = Some(table);
        self
    }
}
