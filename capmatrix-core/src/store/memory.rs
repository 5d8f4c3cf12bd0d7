//! In-memory store backend.
//!
//! Backs tests and single-process CLI sessions. The interior `Mutex`
//! exists only to satisfy `Send + Sync`; there is no internal concurrency.

use anyhow::Result;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{Matrix, MatrixRow, RowPatch};

use super::traits::MatrixStore;

#[derive(Default)]
struct Inner {
    matrices: Vec<Matrix>,
    rows: Vec<MatrixRow>,
}

/// In-memory implementation of [`MatrixStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock would mean a panic mid-mutation; nothing to
        // recover in a test/session store, so propagate the panic.
        self.inner.lock().unwrap()
    }
}

impl MatrixStore for MemoryStore {
    fn add_matrix(&self, matrix: Matrix) -> Result<()> {
        self.lock().matrices.push(matrix);
        Ok(())
    }

    fn get_matrix(&self, id: &Uuid) -> Result<Option<Matrix>> {
        Ok(self.lock().matrices.iter().find(|m| &m.id == id).cloned())
    }

    fn list_matrices(&self) -> Result<Vec<Matrix>> {
        Ok(self.lock().matrices.clone())
    }

    fn rename_matrix(&self, id: &Uuid, display_name: &str) -> Result<bool> {
        let mut inner = self.lock();
        match inner.matrices.iter_mut().find(|m| &m.id == id) {
            Some(matrix) => {
                matrix.display_name = display_name.to_string();
                matrix.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_matrix(&self, id: &Uuid) -> Result<bool> {
        let mut inner = self.lock();
        let before = inner.matrices.len();
        inner.matrices.retain(|m| &m.id != id);
        if inner.matrices.len() == before {
            return Ok(false);
        }
        // Cascade: a matrix owns its rows
        inner.rows.retain(|r| &r.matrix_id != id);
        Ok(true)
    }

    fn touch_matrix(&self, id: &Uuid) -> Result<bool> {
        let mut inner = self.lock();
        match inner.matrices.iter_mut().find(|m| &m.id == id) {
            Some(matrix) => {
                matrix.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn add_row(&self, row: MatrixRow) -> Result<()> {
        self.lock().rows.push(row);
        Ok(())
    }

    fn get_row(&self, id: &Uuid) -> Result<Option<MatrixRow>> {
        Ok(self.lock().rows.iter().find(|r| &r.id == id).cloned())
    }

    fn rows_for_matrix(&self, matrix_id: &Uuid) -> Result<Vec<MatrixRow>> {
        let mut rows: Vec<MatrixRow> = self
            .lock()
            .rows
            .iter()
            .filter(|r| &r.matrix_id == matrix_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.display_order);
        Ok(rows)
    }

    fn update_row(&self, id: &Uuid, patch: &RowPatch) -> Result<bool> {
        let mut inner = self.lock();
        match inner.rows.iter_mut().find(|r| &r.id == id) {
            Some(row) => {
                patch.apply(row);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_row(&self, id: &Uuid) -> Result<bool> {
        let mut inner = self.lock();
        let before = inner.rows.len();
        inner.rows.retain(|r| &r.id != id);
        Ok(inner.rows.len() != before)
    }

    fn reorder_rows(&self, matrix_id: &Uuid, order: &[Uuid]) -> Result<()> {
        let mut inner = self.lock();

        // Renumber listed rows first, then any stragglers in their
        // current relative order
        let mut next: i64 = 0;
        for id in order {
            if let Some(row) = inner
                .rows
                .iter_mut()
                .find(|r| &r.matrix_id == matrix_id && &r.id == id)
            {
                row.display_order = next;
                next += 1;
            }
        }

        let mut leftovers: Vec<usize> = inner
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| &r.matrix_id == matrix_id && !order.contains(&r.id))
            .map(|(i, _)| i)
            .collect();
        leftovers.sort_by_key(|&i| inner.rows[i].display_order);
        for i in leftovers {
            inner.rows[i].display_order = next;
            next += 1;
        }

        Ok(())
    }
}
