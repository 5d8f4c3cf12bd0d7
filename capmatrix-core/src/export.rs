//! Spreadsheet export.
//!
//! The inverse of ingestion: renders canonical rows back into a workbook
//! with a fixed layout (title, score legend, metadata block, shaded
//! header, one row per requirement) so an exported file re-imports to the
//! same numbers, texts, and scores. Rows are emitted in natural
//! requirement-number order, not stored display order.

use anyhow::{Context, Result};
use rust_xlsxwriter::{
    Color, ConditionalFormatCell, ConditionalFormatCellRule, Format, FormatBorder, Workbook,
};
use std::path::Path;

use crate::models::MatrixRow;
use crate::numbering;

/// Document metadata rendered into the export's preamble block.
#[derive(Debug, Clone, Default)]
pub struct ExportMeta {
    pub company: String,
    pub date: String,
    pub version: String,
}

/// First data row (0-indexed). Rows 0-7 are the fixed preamble, row 8 the
/// column headers.
const DATA_START_ROW: u32 = 9;
const SCORE_COL: u16 = 2;

/// Fill and font colors per score value, Excel "good/neutral/bad" palette.
fn score_colors(score: u8) -> (Color, Color) {
    match score {
        3 => (Color::RGB(0xC6EFCE), Color::RGB(0x006100)),
        2 => (Color::RGB(0xFFEB9C), Color::RGB(0x9C6500)),
        1 => (Color::RGB(0xFCD5B4), Color::RGB(0x974706)),
        _ => (Color::RGB(0xFFC7CE), Color::RGB(0x9C0006)),
    }
}

/// Legend wording per score value. Deliberately worded without the column
/// header keywords so the legend never confuses header detection on
/// re-import.
fn score_legend(score: u8) -> &'static str {
    match score {
        3 => "Extensive experience and capability",
        2 => "Moderate experience and capability",
        1 => "Limited experience and capability",
        _ => "No experience or capability",
    }
}

/// Generates the canonical export filename:
/// `Capability_Matrix_<company>_<date>.xlsx`, spaces in the company name
/// replaced by underscores.
pub fn export_filename(company: &str, date: &str) -> String {
    let company = company.trim().replace(' ', "_");
    format!("Capability_Matrix_{company}_{date}.xlsx")
}

/// Renders rows plus metadata into an in-memory workbook.
pub fn render_matrix(rows: &[MatrixRow], meta: &ExportMeta) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let title_format = Format::new().set_bold().set_font_size(14);
    let label_format = Format::new().set_bold();
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xD9D9D9))
        .set_border(FormatBorder::Thin);

    // Row 1: title
    worksheet.write_string_with_format(0, 0, "Capability Matrix", &title_format)?;

    // Rows 1-4, columns D/E: score legend, 3 down to 0
    for (offset, score) in (0u8..=3).rev().enumerate() {
        let (fill, font) = score_colors(score);
        let legend_format = Format::new()
            .set_background_color(fill)
            .set_font_color(font);
        worksheet.write_number_with_format(offset as u32, 3, f64::from(score), &legend_format)?;
        worksheet.write_string_with_format(offset as u32, 4, score_legend(score), &legend_format)?;
    }

    // Rows 5-7: metadata block
    worksheet.write_string_with_format(4, 0, "Company Name", &label_format)?;
    worksheet.write_string(4, 1, &meta.company)?;
    worksheet.write_string_with_format(5, 0, "Date", &label_format)?;
    worksheet.write_string(5, 1, &meta.date)?;
    worksheet.write_string_with_format(6, 0, "Version", &label_format)?;
    worksheet.write_string(6, 1, &meta.version)?;
    // Row 8 is a blank spacer

    // Row 9: column headers
    let headers = [
        "Req #",
        "Requirements",
        "Experience and Capability",
        "Past Performance",
        "Comments",
    ];
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(8, col as u16, *header, &header_format)?;
    }

    // Data rows, in natural requirement-number order
    let mut ordered: Vec<&MatrixRow> = rows.iter().collect();
    ordered.sort_by(|a, b| numbering::compare(&a.requirement_number, &b.requirement_number));

    for (i, row) in ordered.iter().enumerate() {
        let excel_row = DATA_START_ROW + i as u32;
        if !row.requirement_number.is_empty() {
            worksheet.write_string(excel_row, 0, &row.requirement_number)?;
        }
        worksheet.write_string(excel_row, 1, &row.requirement)?;
        if let Some(score) = row.score {
            let (fill, font) = score_colors(score);
            let score_format = Format::new()
                .set_background_color(fill)
                .set_font_color(font);
            worksheet.write_number_with_format(
                excel_row,
                SCORE_COL,
                f64::from(score),
                &score_format,
            )?;
        }
        worksheet.write_string(excel_row, 3, &row.past_performance)?;
        worksheet.write_string(excel_row, 4, &row.comments)?;
    }

    // Conditional formatting over the whole score-column range, so the
    // colors track the values if a human edits the file after export
    if !ordered.is_empty() {
        let last_row = DATA_START_ROW + ordered.len() as u32 - 1;
        for score in 0u8..=3 {
            let (fill, font) = score_colors(score);
            let format = Format::new()
                .set_background_color(fill)
                .set_font_color(font);
            let rule = ConditionalFormatCell::new()
                .set_rule(ConditionalFormatCellRule::EqualTo(i32::from(score)))
                .set_format(format);
            worksheet.add_conditional_format(DATA_START_ROW, SCORE_COL, last_row, SCORE_COL, &rule)?;
        }
    }

    // Fixed column widths: Req# / Requirements / Score / PastPerf / Comments
    worksheet.set_column_width(0, 12)?;
    worksheet.set_column_width(1, 50)?;
    worksheet.set_column_width(2, 25)?;
    worksheet.set_column_width(3, 30)?;
    worksheet.set_column_width(4, 80)?;

    Ok(workbook)
}

/// Renders and writes the workbook to `path`.
pub fn write_matrix<P: AsRef<Path>>(path: P, rows: &[MatrixRow], meta: &ExportMeta) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = render_matrix(rows, meta)?;
    workbook
        .save(path)
        .with_context(|| format!("failed to write workbook '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::import_workbook;
    use uuid::Uuid;

    fn row(number: &str, text: &str, score: Option<u8>, order: i64) -> MatrixRow {
        MatrixRow {
            id: Uuid::new_v4(),
            matrix_id: Uuid::new_v4(),
            requirement_number: number.to_string(),
            requirement: text.to_string(),
            score,
            past_performance: format!("past of {text}"),
            comments: format!("note on {text}"),
            display_order: order,
        }
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename("Acme Widget Co", "2024-03-01"),
            "Capability_Matrix_Acme_Widget_Co_2024-03-01.xlsx"
        );
        assert_eq!(
            export_filename(" Acme ", "2024-03-01"),
            "Capability_Matrix_Acme_2024-03-01.xlsx"
        );
    }

    #[test]
    fn test_export_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        // Display order disagrees with natural order on purpose
        let rows = vec![
            row("1.10", "Tenth child", Some(2), 0),
            row("1.2", "Second child", Some(3), 1),
            row("2", "Top level", None, 2),
        ];
        let meta = ExportMeta {
            company: "Acme Corp".into(),
            date: "2024-03-01".into(),
            version: "1.0".into(),
        };
        write_matrix(&path, &rows, &meta).unwrap();

        let outcome = import_workbook(&path).unwrap();
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.matrices.len(), 1);

        let matrix = &outcome.matrices[0];
        assert_eq!(matrix.display_name, "Acme Corp");

        // Natural-sort order, verbatim numbers/texts/scores
        let got: Vec<(&str, &str, Option<u8>)> = matrix
            .rows
            .iter()
            .map(|r| (r.requirement_number.as_str(), r.requirement.as_str(), r.score))
            .collect();
        assert_eq!(
            got,
            vec![
                ("1.2", "Second child", Some(3)),
                ("1.10", "Tenth child", Some(2)),
                ("2", "Top level", None),
            ]
        );
        assert_eq!(matrix.rows[0].past_performance, "past of Second child");
        assert_eq!(matrix.rows[0].comments, "note on Second child");
    }

    #[test]
    fn test_unassigned_numbers_sort_last_in_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let rows = vec![
            row("", "Unassigned", Some(1), 0),
            row("1", "Assigned", Some(2), 1),
        ];
        write_matrix(&path, &rows, &ExportMeta::default()).unwrap();

        let outcome = import_workbook(&path).unwrap();
        let texts: Vec<&str> = outcome.matrices[0]
            .rows
            .iter()
            .map(|r| r.requirement.as_str())
            .collect();
        assert_eq!(texts, vec!["Assigned", "Unassigned"]);
    }

    #[test]
    fn test_empty_matrix_still_renders() {
        let meta = ExportMeta {
            company: "Acme".into(),
            date: "2024-01-01".into(),
            version: "1".into(),
        };
        // No data rows: preamble only, no conditional format range
        assert!(render_matrix(&[], &meta).is_ok());
    }
}
