//! Store abstraction trait.

use anyhow::Result;
use uuid::Uuid;

use crate::models::{Matrix, MatrixRow, RowPatch};

/// Narrow CRUD contract over matrices and their rows.
///
/// Design notes:
/// - "not found" is a value, not an error: readers return `Option`,
///   mutators return `Ok(false)` when the target does not exist
/// - every call is atomic on its own; no cross-call transaction is
///   assumed, matching single-actor sequential use
/// - row order within a matrix is the explicit `display_order` field,
///   renumbered as a set by [`MatrixStore::reorder_rows`]
pub trait MatrixStore: Send + Sync {
    // =========================================================================
    // Matrix operations
    // =========================================================================

    /// Adds a matrix
    fn add_matrix(&self, matrix: Matrix) -> Result<()>;

    /// Gets a matrix by id
    fn get_matrix(&self, id: &Uuid) -> Result<Option<Matrix>>;

    /// Lists all matrices in creation order
    fn list_matrices(&self) -> Result<Vec<Matrix>>;

    /// Renames a matrix; returns false if it does not exist
    fn rename_matrix(&self, id: &Uuid, display_name: &str) -> Result<bool>;

    /// Deletes a matrix and all of its rows (cascade);
    /// returns false if it does not exist
    fn delete_matrix(&self, id: &Uuid) -> Result<bool>;

    /// Bumps a matrix's `updated_at` timestamp;
    /// returns false if it does not exist
    fn touch_matrix(&self, id: &Uuid) -> Result<bool>;

    // =========================================================================
    // Row operations
    // =========================================================================

    /// Inserts a row verbatim, keeping its id and display order
    fn add_row(&self, row: MatrixRow) -> Result<()>;

    /// Gets a row by id
    fn get_row(&self, id: &Uuid) -> Result<Option<MatrixRow>>;

    /// Returns a matrix's rows sorted by display order
    fn rows_for_matrix(&self, matrix_id: &Uuid) -> Result<Vec<MatrixRow>>;

    /// Applies a field-level partial update;
    /// returns false if the row does not exist
    fn update_row(&self, id: &Uuid, patch: &RowPatch) -> Result<bool>;

    /// Deletes a single row; returns false if it does not exist
    fn delete_row(&self, id: &Uuid) -> Result<bool>;

    /// Renumbers display order for every row of `matrix_id` to match the
    /// given id sequence. Ids not in the sequence keep their relative
    /// order after the reordered ones.
    fn reorder_rows(&self, matrix_id: &Uuid, order: &[Uuid]) -> Result<()>;
}
