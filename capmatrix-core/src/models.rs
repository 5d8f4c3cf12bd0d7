use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single spreadsheet cell at the ingestion boundary.
///
/// Raw workbook cells are dynamically typed; they are converted into this
/// variant immediately on read and normalized into the strongly-typed row
/// fields before leaving the ingestor.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Returns the cell's text content, rendering numbers without a
    /// trailing ".0" so that "1" round-trips as "1" rather than "1.0".
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

/// Normalizes a raw cell into a capability score.
///
/// Scores are integers in 0..=3, anything else is unrated (`None`):
/// - numeric cells are rounded, then range-checked
/// - text cells are trimmed and integer-parsed, then range-checked
/// - empty, out-of-range, or non-numeric cells are unrated, never an error
pub fn score_from_cell(cell: &CellValue) -> Option<u8> {
    match cell {
        CellValue::Empty => None,
        CellValue::Number(n) => {
            let rounded = n.round();
            if (0.0..=3.0).contains(&rounded) {
                Some(rounded as u8)
            } else {
                None
            }
        }
        CellValue::Text(s) => match s.trim().parse::<i64>() {
            Ok(v) if (0..=3).contains(&v) => Some(v as u8),
            _ => None,
        },
    }
}

/// Normalizes requirement text for identity matching: trim then case-fold.
///
/// This is the single source of truth shared by the comparison builder and
/// the bulk-mutation ledger, so a bulk delete always matches exactly the set
/// of rows the comparison view grouped together.
pub fn normalize_requirement(text: &str) -> String {
    text.trim().to_lowercase()
}

/// One ingested spreadsheet line. Produced only by ingestion; the canonical
/// row persisted downstream may diverge after user edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedRow {
    /// Requirement number from the sheet's Req# column, or auto-generated
    pub requirement_number: String,
    /// Requirement text (the sole validity gate during ingestion)
    pub requirement: String,
    /// Capability score, unrated when absent or unparseable
    pub score: Option<u8>,
    /// Free-text past performance notes
    pub past_performance: String,
    /// Free-text comments
    pub comments: String,
}

/// A named group of parsed rows with provenance metadata.
///
/// Created once per detected sheet during ingestion; a sheet that yields
/// zero valid rows produces no `ParsedMatrix`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedMatrix {
    /// Display name, from document metadata or the filename
    pub display_name: String,
    /// Source filename the matrix was ingested from
    pub source_file: String,
    /// Sheet name, when the source workbook has multiple sheets
    pub sheet_name: Option<String>,
    pub rows: Vec<ParsedRow>,
}

/// A persisted capability matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matrix {
    /// Unique identifier (UUID)
    pub id: Uuid,

    /// Human-readable display name (usually a company name)
    pub display_name: String,

    /// Whether the matrix was imported from a spreadsheet
    pub imported: bool,

    /// Source filename, for imported matrices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    /// The template matrix this was imported against, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,

    /// When the matrix was created
    pub created_at: DateTime<Utc>,

    /// When the matrix was last modified
    pub updated_at: DateTime<Utc>,
}

impl Matrix {
    /// Creates a new, non-imported matrix with the given display name
    pub fn new(display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            imported: false,
            source_file: None,
            parent_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a matrix from an ingested `ParsedMatrix`, carrying over
    /// its provenance metadata. Rows are converted separately via
    /// [`MatrixRow::from_parsed`].
    pub fn from_parsed(parsed: &ParsedMatrix) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            display_name: parsed.display_name.clone(),
            imported: true,
            source_file: Some(parsed.source_file.clone()),
            parent_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A persisted requirement row belonging to one matrix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatrixRow {
    /// Unique identifier (UUID)
    pub id: Uuid,

    /// Owning matrix
    pub matrix_id: Uuid,

    /// Dotted hierarchical requirement number, empty when unassigned
    pub requirement_number: String,

    /// Requirement text
    pub requirement: String,

    /// Capability score, unrated when `None`
    pub score: Option<u8>,

    /// Free-text past performance notes
    pub past_performance: String,

    /// Free-text comments
    pub comments: String,

    /// Explicit display position within the owning matrix
    pub display_order: i64,
}

impl MatrixRow {
    /// Converts an ingested row into a canonical row owned by `matrix_id`
    pub fn from_parsed(parsed: &ParsedRow, matrix_id: Uuid, display_order: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            matrix_id,
            requirement_number: parsed.requirement_number.clone(),
            requirement: parsed.requirement.clone(),
            score: parsed.score,
            past_performance: parsed.past_performance.clone(),
            comments: parsed.comments.clone(),
            display_order,
        }
    }
}

/// Field-level partial update for a matrix row. `None` leaves the field
/// untouched; `score` uses a nested `Option` so a rating can be cleared.
#[derive(Debug, Clone, Default)]
pub struct RowPatch {
    pub requirement_number: Option<String>,
    pub requirement: Option<String>,
    pub score: Option<Option<u8>>,
    pub past_performance: Option<String>,
    pub comments: Option<String>,
}

impl RowPatch {
    /// Applies this patch to a row in place
    pub fn apply(&self, row: &mut MatrixRow) {
        if let Some(number) = &self.requirement_number {
            row.requirement_number = number.clone();
        }
        if let Some(requirement) = &self.requirement {
            row.requirement = requirement.clone();
        }
        if let Some(score) = self.score {
            row.score = score;
        }
        if let Some(past_performance) = &self.past_performance {
            row.past_performance = past_performance.clone();
        }
        if let Some(comments) = &self.comments {
            row.comments = comments.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_from_numeric_cells() {
        assert_eq!(score_from_cell(&CellValue::Number(3.0)), Some(3));
        assert_eq!(score_from_cell(&CellValue::Number(3.4)), Some(3));
        assert_eq!(score_from_cell(&CellValue::Number(2.6)), Some(3));
        assert_eq!(score_from_cell(&CellValue::Number(0.0)), Some(0));
        assert_eq!(score_from_cell(&CellValue::Number(-1.0)), None);
        assert_eq!(score_from_cell(&CellValue::Number(4.0)), None);
        assert_eq!(score_from_cell(&CellValue::Number(3.6)), None); // rounds to 4
        assert_eq!(score_from_cell(&CellValue::Number(f64::NAN)), None);
    }

    #[test]
    fn test_score_from_text_cells() {
        assert_eq!(score_from_cell(&CellValue::Text("3".into())), Some(3));
        assert_eq!(score_from_cell(&CellValue::Text(" 2 ".into())), Some(2));
        assert_eq!(score_from_cell(&CellValue::Text("abc".into())), None);
        assert_eq!(score_from_cell(&CellValue::Text("".into())), None);
        assert_eq!(score_from_cell(&CellValue::Text("4".into())), None);
        assert_eq!(score_from_cell(&CellValue::Text("-1".into())), None);
        // Fractional text is not integer-parseable, so it is unrated
        assert_eq!(score_from_cell(&CellValue::Text("2.6".into())), None);
    }

    #[test]
    fn test_score_from_empty_cell() {
        assert_eq!(score_from_cell(&CellValue::Empty), None);
    }

    #[test]
    fn test_normalize_requirement() {
        assert_eq!(normalize_requirement("  Foo Bar "), "foo bar");
        assert_eq!(normalize_requirement("FOO"), "foo");
        assert_eq!(normalize_requirement("   "), "");
    }

    #[test]
    fn test_cell_value_as_text() {
        assert_eq!(CellValue::Empty.as_text(), "");
        assert_eq!(CellValue::Text("hi".into()).as_text(), "hi");
        assert_eq!(CellValue::Number(1.0).as_text(), "1");
        assert_eq!(CellValue::Number(1.5).as_text(), "1.5");
    }

    #[test]
    fn test_row_patch_apply() {
        let mut row = MatrixRow {
            id: Uuid::new_v4(),
            matrix_id: Uuid::new_v4(),
            requirement_number: "1".into(),
            requirement: "Old text".into(),
            score: Some(2),
            past_performance: String::new(),
            comments: "note".into(),
            display_order: 0,
        };

        let patch = RowPatch {
            requirement: Some("New text".into()),
            score: Some(None),
            ..Default::default()
        };
        patch.apply(&mut row);

        assert_eq!(row.requirement, "New text");
        assert_eq!(row.score, None);
        // Untouched fields survive
        assert_eq!(row.requirement_number, "1");
        assert_eq!(row.comments, "note");
    }

    #[test]
    fn test_matrix_from_parsed_carries_provenance() {
        let parsed = ParsedMatrix {
            display_name: "Acme Corp".into(),
            source_file: "acme.xlsx".into(),
            sheet_name: None,
            rows: Vec::new(),
        };
        let matrix = Matrix::from_parsed(&parsed);
        assert!(matrix.imported);
        assert_eq!(matrix.display_name, "Acme Corp");
        assert_eq!(matrix.source_file.as_deref(), Some("acme.xlsx"));
        assert!(matrix.parent_id.is_none());
    }
}
