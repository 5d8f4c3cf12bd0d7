//! Spreadsheet ingestion.
//!
//! Turns raw workbooks into [`ParsedMatrix`] values: finds the header row
//! and column layout, extracts the company display name, normalizes score
//! cells, and collects non-fatal problems instead of aborting the batch.
//! One malformed sheet never blocks the remaining sheets.

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

use crate::models::{score_from_cell, CellValue, ParsedMatrix, ParsedRow};

/// How many leading rows are searched for a header row
const HEADER_SCAN_ROWS: u32 = 30;
/// How many leading rows are searched for the company name
const NAME_SCAN_ROWS: u32 = 20;
/// How many leading columns are searched for the company name
const NAME_SCAN_COLS: u32 = 4;

/// Result of ingesting one workbook: the matrices that parsed plus the
/// problems that did not stop ingestion.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub matrices: Vec<ParsedMatrix>,
    pub errors: Vec<String>,
}

/// Hard failure opening a workbook; per-sheet problems are collected in
/// [`ImportOutcome::errors`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to open workbook '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: calamine::Error,
    },
}

/// Detected column layout for one sheet.
///
/// Columns are positional relative to the requirements-text column; the
/// requirement-number column, when present, sits wherever it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderLayout {
    header_row: u32,
    number_col: Option<u32>,
    text_col: u32,
    score_col: u32,
    past_perf_col: u32,
    comments_col: u32,
}

impl HeaderLayout {
    fn at(header_row: u32, number_col: Option<u32>, text_col: u32) -> Self {
        Self {
            header_row,
            number_col,
            text_col,
            score_col: text_col + 1,
            past_perf_col: text_col + 2,
            comments_col: text_col + 3,
        }
    }
}

/// Ingests every sheet of the workbook at `path`.
///
/// # Errors
///
/// Fails only when the workbook itself cannot be opened; everything past
/// that point degrades into [`ImportOutcome::errors`].
pub fn import_workbook<P: AsRef<Path>>(path: P) -> Result<ImportOutcome, ImportError> {
    let path = path.as_ref();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut workbook = open_workbook_auto(path).map_err(|source| ImportError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let sheet_names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::new();
    let mut errors = Vec::new();
    for name in &sheet_names {
        match workbook.worksheet_range(name) {
            Ok(range) => sheets.push((name.clone(), range)),
            Err(e) => errors.push(format!("{filename}: sheet '{name}' could not be read: {e}")),
        }
    }

    Ok(import_sheets(&sheets, &filename, errors))
}

/// Ingests already-loaded sheet ranges. This is the pure half of
/// [`import_workbook`]; tests drive it with hand-built ranges.
///
/// `errors` carries sheet-level read failures collected by the caller so
/// that the "no valid data" synthesis sees the whole picture.
pub fn import_sheets(
    sheets: &[(String, Range<Data>)],
    filename: &str,
    mut errors: Vec<String>,
) -> ImportOutcome {
    let multi_sheet = sheets.len() > 1;
    let mut matrices = Vec::new();

    for (index, (sheet_name, range)) in sheets.iter().enumerate() {
        if let Some(matrix) = parse_sheet(range, sheet_name, filename, multi_sheet, index == 0) {
            matrices.push(matrix);
        }
    }

    // A caller always gets an explanation for an empty result
    if matrices.is_empty() && errors.is_empty() {
        errors.push(format!(
            "{filename}: no valid capability matrix data found"
        ));
    }

    ImportOutcome { matrices, errors }
}

/// Parses one sheet into a matrix, or `None` when the sheet has no rows
/// with requirement text (silently dropped, not an error).
fn parse_sheet(
    range: &Range<Data>,
    sheet_name: &str,
    filename: &str,
    multi_sheet: bool,
    first_sheet: bool,
) -> Option<ParsedMatrix> {
    let (last_row, _) = range.end()?;

    let layout = detect_header(range);
    let mut rows = Vec::new();
    let mut auto_number: u64 = 0;

    for row in (layout.header_row + 1)..=last_row {
        let text_cell = cell_value(range, row, layout.text_col);
        let requirement = text_cell.as_text().trim().to_string();
        // The sole validity gate: rows without requirement text are skipped
        if requirement.is_empty() {
            continue;
        }
        auto_number += 1;

        let requirement_number = match layout.number_col {
            Some(col) => cell_value(range, row, col).as_text().trim().to_string(),
            None => auto_number.to_string(),
        };

        rows.push(ParsedRow {
            requirement_number,
            requirement,
            score: score_from_cell(&cell_value(range, row, layout.score_col)),
            past_performance: cell_value(range, row, layout.past_perf_col)
                .as_text()
                .trim()
                .to_string(),
            comments: cell_value(range, row, layout.comments_col)
                .as_text()
                .trim()
                .to_string(),
        });
    }

    if rows.is_empty() {
        return None;
    }

    Some(ParsedMatrix {
        display_name: display_name(range, sheet_name, filename, multi_sheet, first_sheet),
        source_file: filename.to_string(),
        sheet_name: multi_sheet.then(|| sheet_name.to_string()),
        rows,
    })
}

/// Locates the header row and column layout.
///
/// The first row (top to bottom, within the scan window) containing a
/// requirements-text keyword wins; later, more header-looking rows are
/// never preferred. When nothing matches, the layout defaults to header
/// row 0 with the text column in column A and no number column.
fn detect_header(range: &Range<Data>) -> HeaderLayout {
    let Some((last_row, last_col)) = range.end() else {
        return HeaderLayout::at(0, None, 0);
    };

    for row in 0..=last_row.min(HEADER_SCAN_ROWS - 1) {
        let mut number_col = None;
        let mut text_col = None;
        for col in 0..=last_col {
            let text = cell_value(range, row, col).as_text().to_lowercase();
            if is_number_header(&text) {
                number_col.get_or_insert(col);
            } else if text.contains("requirement") && !text.contains('#') {
                text_col.get_or_insert(col);
            }
        }
        if let Some(text_col) = text_col {
            return HeaderLayout::at(row, number_col, text_col);
        }
    }

    HeaderLayout::at(0, None, 0)
}

fn is_number_header(text: &str) -> bool {
    text.contains("req #")
        || text.contains("req#")
        || text.contains("requirement number")
        || text.contains("req number")
}

/// Extracts the display name: a "Company Name"/"Company" label cell in the
/// top-left corner of the sheet, with its value in the adjacent column.
/// Falls back to the filename stem, suffixed with the sheet name for
/// secondary sheets of a multi-sheet workbook.
fn display_name(
    range: &Range<Data>,
    sheet_name: &str,
    filename: &str,
    multi_sheet: bool,
    first_sheet: bool,
) -> String {
    if let Some((last_row, last_col)) = range.end() {
        for row in 0..=last_row.min(NAME_SCAN_ROWS - 1) {
            for col in 0..=last_col.min(NAME_SCAN_COLS - 1) {
                let text = cell_value(range, row, col).as_text();
                let label = text.trim().to_lowercase();
                if label.contains("company name") || label == "company" {
                    let value = cell_value(range, row, col + 1).as_text().trim().to_string();
                    if !value.is_empty() {
                        return value;
                    }
                }
            }
        }
    }

    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    if multi_sheet && !first_sheet {
        format!("{stem} - {sheet_name}")
    } else {
        stem
    }
}

/// Reads one cell into the tagged boundary representation. The dynamic
/// workbook cell type never leaks past this function.
fn cell_value(range: &Range<Data>, row: u32, col: u32) -> CellValue {
    match range.get_value((row, col)) {
        None | Some(Data::Empty) | Some(Data::Error(_)) => CellValue::Empty,
        Some(Data::String(s)) => CellValue::Text(s.clone()),
        Some(Data::Float(f)) => CellValue::Number(*f),
        Some(Data::Int(i)) => CellValue::Number(*i as f64),
        Some(Data::Bool(b)) => CellValue::Text(b.to_string()),
        Some(Data::DateTime(dt)) => CellValue::Number(dt.as_f64()),
        Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => CellValue::Text(s.clone()),
    }
}
