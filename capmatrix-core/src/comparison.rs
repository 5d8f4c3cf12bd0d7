//! Cross-matrix comparison.
//!
//! Reconciles rows from several matrices into one table keyed by
//! normalized requirement text, in first-seen order. The output is a
//! deterministic function of the caller-supplied matrix order and each
//! matrix's stored row order; no I/O happens here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{normalize_requirement, Matrix, MatrixRow};

/// One matrix's cell for a requirement in the comparison view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonCell {
    /// The canonical row this cell came from
    pub row_id: Uuid,
    pub score: Option<u8>,
    pub past_performance: String,
    pub comments: String,
}

impl ComparisonCell {
    /// True when the cell carries any rating or free text worth
    /// warning a user about before a destructive action
    pub fn has_data(&self) -> bool {
        self.score.is_some()
            || !self.past_performance.trim().is_empty()
            || !self.comments.trim().is_empty()
    }
}

/// One reconciled requirement across all scanned matrices.
///
/// Exactly one `ComparisonRow` exists per distinct normalized key; later
/// occurrences of the same key merge into it instead of duplicating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Normalized requirement key (trim + case-fold)
    pub key: String,
    /// Display text: original casing from the first occurrence in scan order
    pub requirement: String,
    /// Per-matrix cell data, keyed by matrix id
    pub cells: HashMap<Uuid, ComparisonCell>,
}

/// A participating matrix, reduced to what the comparison view needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatrixRef {
    pub id: Uuid,
    pub display_name: String,
}

/// The reconciled view over a set of matrices.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ComparisonData {
    /// Rows in first-seen order across the scanned matrices
    pub rows: Vec<ComparisonRow>,
    pub matrices: Vec<MatrixRef>,
}

/// A matrix that would lose data if a requirement were bulk-deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteImpact {
    pub matrix_id: Uuid,
    pub display_name: String,
}

/// Builds the reconciled comparison table.
///
/// Matrices are scanned in the given order, rows in their stored order.
/// Rows whose requirement text normalizes to empty are skipped. For a
/// given (key, matrix) pair the last row wins, which only matters when a
/// single matrix holds two rows with the same normalized text (allowed,
/// not deduplicated within a matrix).
pub fn build_comparison_data(matrices: &[(Matrix, Vec<MatrixRow>)]) -> ComparisonData {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<ComparisonRow> = Vec::new();

    for (matrix, matrix_rows) in matrices {
        for row in matrix_rows {
            let key = normalize_requirement(&row.requirement);
            if key.is_empty() {
                continue;
            }

            let position = *index.entry(key.clone()).or_insert_with(|| {
                rows.push(ComparisonRow {
                    key: key.clone(),
                    requirement: row.requirement.trim().to_string(),
                    cells: HashMap::new(),
                });
                rows.len() - 1
            });

            rows[position].cells.insert(
                matrix.id,
                ComparisonCell {
                    row_id: row.id,
                    score: row.score,
                    past_performance: row.past_performance.clone(),
                    comments: row.comments.clone(),
                },
            );
        }
    }

    ComparisonData {
        rows,
        matrices: matrices
            .iter()
            .map(|(m, _)| MatrixRef {
                id: m.id,
                display_name: m.display_name.clone(),
            })
            .collect(),
    }
}

/// Reports which matrices hold meaningful data for a requirement, for a
/// confirmation dialog ahead of a bulk delete. Matrices whose cell is
/// entirely empty are omitted: deleting them loses nothing.
pub fn delete_info(data: &ComparisonData, requirement_text: &str) -> Vec<DeleteImpact> {
    let key = normalize_requirement(requirement_text);
    let Some(row) = data.rows.iter().find(|r| r.key == key) else {
        return Vec::new();
    };

    data.matrices
        .iter()
        .filter(|m| row.cells.get(&m.id).is_some_and(ComparisonCell::has_data))
        .map(|m| DeleteImpact {
            matrix_id: m.id,
            display_name: m.display_name.clone(),
        })
        .collect()
}
