use std::path::Path;

use csv::WriterBuilder;

use crate::error::DocmapError;
use crate::options::CsvOptions;
use crate::sheet::Sheet;

/// Lays sheet rows out as a dense grid: rows and cells land at their
/// 1-based indices, gaps become empty fields, disabled cells stay empty.
fn sheet_records(sheet: &Sheet) -> Vec<Vec<String>> {
    let width = sheet
        .rows
        .iter()
        .flat_map(|row| row.cells.iter().map(|cell| cell.index))
        .max()
        .unwrap_or(0) as usize;
    let height = sheet.rows.iter().map(|row| row.index).max().unwrap_or(0) as usize;

    let mut records = vec![vec![String::new(); width.max(1)]; height];
    for row in &sheet.rows {
        let Some(record) = (row.index as usize).checked_sub(1).and_then(|at| records.get_mut(at))
        else {
            continue;
        };
        for cell in row.cells.iter().filter(|cell| cell.enable) {
            if let Some(field) = (cell.index as usize)
                .checked_sub(1)
                .and_then(|at| record.get_mut(at))
            {
                field.clone_from(&cell.value);
            }
        }
    }
    records
}

pub fn write_sheet_csv(path: &Path, sheet: &Sheet, options: &CsvOptions) -> Result<(), DocmapError> {
    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_path(path)?;
    for record in sheet_records(sheet) {
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_sheet_csv_to_string(sheet: &Sheet, options: &CsvOptions) -> Result<String, DocmapError> {
    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(Vec::<u8>::new());
    for record in sheet_records(sheet) {
        writer.write_record(&record)?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| DocmapError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| DocmapError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
