//! Bulk requirement deletion with exact-state undo.
//!
//! Deleting a requirement removes every matching row in every matrix;
//! the full row records are captured first so the operation can be
//! reversed exactly. Matching uses the same normalization as the
//! comparison view, so a delete always covers exactly the rows a user
//! saw grouped together.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{normalize_requirement, MatrixRow};
use crate::store::MatrixStore;

/// Everything needed to report and reverse a bulk delete.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeleteOutcome {
    /// Number of rows removed
    pub deleted_count: usize,
    /// Matrices that lost at least one row (their `updated_at` was bumped)
    pub affected_matrix_ids: Vec<Uuid>,
    /// Full pre-deletion row records, in store order
    pub deleted_rows: Vec<MatrixRow>,
}

/// Deletes every row, in every matrix, whose normalized requirement text
/// equals the normalized `requirement_text`.
///
/// Zero matches is a no-op outcome, not an error.
pub fn delete_by_requirement(
    store: &dyn MatrixStore,
    requirement_text: &str,
) -> Result<DeleteOutcome> {
    let key = normalize_requirement(requirement_text);
    if key.is_empty() {
        return Ok(DeleteOutcome::default());
    }

    // Capture before deleting: the captured rows ARE the undo record
    let mut deleted_rows = Vec::new();
    let mut affected_matrix_ids = Vec::new();
    for matrix in store.list_matrices()? {
        let matching: Vec<MatrixRow> = store
            .rows_for_matrix(&matrix.id)?
            .into_iter()
            .filter(|r| normalize_requirement(&r.requirement) == key)
            .collect();
        if !matching.is_empty() {
            affected_matrix_ids.push(matrix.id);
            deleted_rows.extend(matching);
        }
    }

    for row in &deleted_rows {
        store.delete_row(&row.id)?;
    }
    for matrix_id in &affected_matrix_ids {
        store.touch_matrix(matrix_id)?;
    }

    Ok(DeleteOutcome {
        deleted_count: deleted_rows.len(),
        affected_matrix_ids,
        deleted_rows,
    })
}

/// Reinserts previously deleted rows verbatim (same ids, same fields,
/// same display order) and bumps every touched matrix.
///
/// `restore_rows(delete_by_requirement(text)?.deleted_rows)` leaves the
/// store observably identical to its pre-delete state; this is the undo
/// contract a single-level undo affordance relies on.
pub fn restore_rows(store: &dyn MatrixStore, rows: &[MatrixRow]) -> Result<()> {
    for row in rows {
        store.add_row(row.clone())?;
    }

    let mut touched: Vec<Uuid> = Vec::new();
    for row in rows {
        if !touched.contains(&row.matrix_id) {
            touched.push(row.matrix_id);
        }
    }
    for matrix_id in &touched {
        store.touch_matrix(matrix_id)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Matrix;
    use crate::store::MemoryStore;

    fn seeded_row(matrix_id: Uuid, text: &str, order: i64) -> MatrixRow {
        MatrixRow {
            id: Uuid::new_v4(),
            matrix_id,
            requirement_number: String::new(),
            requirement: text.to_string(),
            score: Some(1),
            past_performance: String::new(),
            comments: String::new(),
            display_order: order,
        }
    }

    fn two_matrix_store() -> (MemoryStore, Uuid, Uuid) {
        let store = MemoryStore::new();
        let a = Matrix::new("A");
        let b = Matrix::new("B");
        let (a_id, b_id) = (a.id, b.id);
        store.add_matrix(a).unwrap();
        store.add_matrix(b).unwrap();
        store.add_row(seeded_row(a_id, "Foo", 0)).unwrap();
        store.add_row(seeded_row(a_id, "Bar", 1)).unwrap();
        store.add_row(seeded_row(b_id, " foo ", 0)).unwrap();
        (store, a_id, b_id)
    }

    #[test]
    fn test_delete_matches_normalized_text_across_matrices() {
        let (store, a_id, b_id) = two_matrix_store();
        let outcome = delete_by_requirement(&store, "FOO").unwrap();

        assert_eq!(outcome.deleted_count, 2);
        assert_eq!(outcome.affected_matrix_ids, vec![a_id, b_id]);
        assert_eq!(store.rows_for_matrix(&a_id).unwrap().len(), 1);
        assert!(store.rows_for_matrix(&b_id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_then_restore_is_exact_undo() {
        let (store, a_id, b_id) = two_matrix_store();
        let before_a = store.rows_for_matrix(&a_id).unwrap();
        let before_b = store.rows_for_matrix(&b_id).unwrap();

        let outcome = delete_by_requirement(&store, "Foo").unwrap();
        restore_rows(&store, &outcome.deleted_rows).unwrap();

        // Same ids, same field values, same order
        assert_eq!(store.rows_for_matrix(&a_id).unwrap(), before_a);
        assert_eq!(store.rows_for_matrix(&b_id).unwrap(), before_b);
    }

    #[test]
    fn test_delete_bumps_affected_timestamps_only() {
        let store = MemoryStore::new();
        let a = Matrix::new("A");
        let b = Matrix::new("B");
        let (a_id, b_id) = (a.id, b.id);
        let b_updated = b.updated_at;
        store.add_matrix(a).unwrap();
        store.add_matrix(b).unwrap();
        store.add_row(seeded_row(a_id, "Foo", 0)).unwrap();
        store.add_row(seeded_row(b_id, "Bar", 0)).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2));
        delete_by_requirement(&store, "Foo").unwrap();

        let a_after = store.get_matrix(&a_id).unwrap().unwrap();
        let b_after = store.get_matrix(&b_id).unwrap().unwrap();
        assert!(a_after.updated_at > a_after.created_at);
        assert_eq!(b_after.updated_at, b_updated);
    }

    #[test]
    fn test_zero_match_delete_is_noop() {
        let (store, a_id, _) = two_matrix_store();
        let outcome = delete_by_requirement(&store, "does not exist").unwrap();
        assert_eq!(outcome.deleted_count, 0);
        assert!(outcome.affected_matrix_ids.is_empty());
        assert!(outcome.deleted_rows.is_empty());
        assert_eq!(store.rows_for_matrix(&a_id).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_target_deletes_nothing() {
        let (store, a_id, _) = two_matrix_store();
        let outcome = delete_by_requirement(&store, "   ").unwrap();
        assert_eq!(outcome.deleted_count, 0);
        assert_eq!(store.rows_for_matrix(&a_id).unwrap().len(), 2);
    }

    #[test]
    fn test_outcome_round_trips_through_yaml() {
        // The CLI persists the undo record as YAML
        let (store, _, _) = two_matrix_store();
        let outcome = delete_by_requirement(&store, "Foo").unwrap();
        let yaml = serde_yaml::to_string(&outcome).unwrap();
        let back: DeleteOutcome = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.deleted_rows, outcome.deleted_rows);
        assert_eq!(back.deleted_count, 2);
    }
}
