// src/excel.rs
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook, Worksheet};

const SHEET_NAME: &str = "TC08 Log";
/// Pale column fills, cycled when a log has more columns.
const COLUMN_FILLS: [u32; 9] = [
    0xFFCCCC, 0xFFE5CC, 0xFFF2CC, 0xE5FFCC, 0xCCFFFF, 0xCCE5FF, 0xE5CCFF, 0xFFCCF2, 0xE6E6FA,
];

fn column_fill(col: usize) -> u32 {
    COLUMN_FILLS[col % COLUMN_FILLS.len()]
}
fn column_format(col: usize) -> Format {
    Format::new()
        .set_background_color(Color::RGB(column_fill(col)))
        .set_pattern(FormatPattern::Solid)
        .set_border_left(FormatBorder::Medium)
        .set_border_right(FormatBorder::Medium)
        .set_border_top(FormatBorder::Thin)
        .set_border_bottom(FormatBorder::Thin)
}
/// Writes an `.xlsx` copy next to a CSV log. From the `timestamp` header row
/// down, every column gets its own fill and bold side borders.
pub fn export_colored_xlsx(csv_path: &Path) -> Result<PathBuf> {
    let xlsx_path = csv_path.with_extension("xlsx");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("could not read {}", csv_path.display()))?;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let mut formats: Option<Vec<Format>> = None;
    for record in reader.records() {
        let record = record.context("malformed CSV row")?;
        // The reader skips blank lines; keep rows where they were in the file.
        let row = record
            .position()
            .map_or(0, |pos| pos.line().saturating_sub(1)) as u32;
        if formats.is_none() && record.get(0) == Some("timestamp") {
            formats = Some((0..record.len()).map(column_format).collect());
        }
        match &formats {
            Some(formats) => {
                for (col, format) in formats.iter().enumerate() {
                    write_cell(sheet, row, col as u16, record.get(col).unwrap_or(""), format)?;
                }
            }
            None => {
                for (col, text) in record.iter().enumerate() {
                    sheet.write_string(row, col as u16, text)?;
                }
            }
        }
    }
    workbook
        .save(&xlsx_path)
        .with_context(|| format!("could not write {}", xlsx_path.display()))?;
    log::info!("colored Excel copy saved: {}", xlsx_path.display());
    Ok(xlsx_path)
}
fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, text: &str, format: &Format) -> Result<()> {
    if text.is_empty() {
        sheet.write_blank(row, col, format)?;
    } else if let Ok(value) = text.parse::<f64>() {
        sheet.write_number_with_format(row, col, value, format)?;
    } else {
        sheet.write_string_with_format(row, col, text, format)?;
    }
    Ok(())
}
