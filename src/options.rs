use crate::error::DocmapError;

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Thresholds for locating a table of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocOptions {
    pub max_scan_pages: u32,
    pub min_total_lines: usize,
    pub min_entry_lines: usize,
    pub min_toc_len: u32,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            max_scan_pages: 50,
            min_total_lines: 5,
            min_entry_lines: 3,
            min_toc_len: 2,
        }
    }
}

impl TocOptions {
    pub fn validate(&self) -> Result<(), DocmapError> {
        if self.max_scan_pages == 0 {
            return Err(DocmapError::InvalidOption(
                "max_scan_pages must be at least 1".to_string(),
            ));
        }
        if self.min_toc_len == 0 {
            return Err(DocmapError::InvalidOption(
                "min_toc_len must be at least 1".to_string(),
            ));
        }
        if self.min_entry_lines > self.min_total_lines {
            return Err(DocmapError::InvalidOption(format!(
                "min_entry_lines ({}) cannot exceed min_total_lines ({})",
                self.min_entry_lines, self.min_total_lines
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveOptions {
    /// Minimum similarity ratio a fuzzy match must reach.
    pub cutoff: f64,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { cutoff: 0.6 }
    }
}

impl ResolveOptions {
    pub fn validate(&self) -> Result<(), DocmapError> {
        if !(0.0..=1.0).contains(&self.cutoff) {
            return Err(DocmapError::InvalidOption(format!(
                "cutoff must be within 0.0..=1.0, got {}",
                self.cutoff
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOptions {
    pub parallel: bool,
    pub sheet_name: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

impl LayoutOptions {
    pub fn validate(&self) -> Result<(), DocmapError> {
        if self.sheet_name.trim().is_empty() {
            return Err(DocmapError::InvalidOption(
                "sheet name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvOptions {
    pub fn from_delimiter(delimiter: char) -> Result<Self, DocmapError> {
        if !delimiter.is_ascii() {
            return Err(DocmapError::InvalidOption(
                "delimiter must be a single ASCII character".to_string(),
            ));
        }
        let delimiter = u8::try_from(delimiter).map_err(|_| {
            DocmapError::InvalidOption("delimiter must be a single ASCII character".to_string())
        })?;
        Ok(Self { delimiter })
    }
}
