//! Core library for capability matrix reconciliation.
//!
//! Ingests "requirement -> capability rating" spreadsheets from multiple
//! sources into a canonical row format, maintains hierarchical requirement
//! numbers, reconciles semantically-identical requirements across sources,
//! supports bulk deletion with exact undo, and renders matrices back out
//! to spreadsheets.

pub mod comparison;
pub mod export;
pub mod ingest;
pub mod ledger;
pub mod models;
pub mod numbering;
pub mod store;

// Re-export commonly used types
pub use comparison::{
    build_comparison_data, delete_info, ComparisonCell, ComparisonData, ComparisonRow,
    DeleteImpact, MatrixRef,
};
pub use export::{export_filename, render_matrix, write_matrix, ExportMeta};
pub use ingest::{import_sheets, import_workbook, ImportError, ImportOutcome};
pub use ledger::{delete_by_requirement, restore_rows, DeleteOutcome};
pub use models::{
    normalize_requirement, score_from_cell, CellValue, Matrix, MatrixRow, ParsedMatrix, ParsedRow,
    RowPatch,
};
pub use store::{MatrixStore, MemoryStore};
