mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use capmatrix_core::{
    build_comparison_data, delete_by_requirement, delete_info, export_filename, import_workbook,
    restore_rows, write_matrix, ComparisonData, ExportMeta, Matrix, MatrixRow, MatrixStore,
    MemoryStore,
};

use crate::cli::{Cli, Command};

/// On-disk undo record written by `delete` and consumed by `restore`.
///
/// Matrix ids only mean something within the session that produced them,
/// so the deleted rows are grouped under display names; `restore` rebinds
/// each group to whatever matrix a fresh ingest yields under that name.
#[derive(Debug, Serialize, Deserialize)]
struct UndoRecord {
    requirement: String,
    deleted_count: usize,
    matrices: Vec<UndoMatrix>,
}

#[derive(Debug, Serialize, Deserialize)]
struct UndoMatrix {
    display_name: String,
    rows: Vec<MatrixRow>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Import { files } => import_files(&files),
        Command::Compare { files, json } => compare_files(&files, json),
        Command::Export {
            file,
            output,
            company,
            date,
            version,
        } => export_file(&file, output, company, date, version),
        Command::Delete {
            files,
            requirement,
            undo_file,
            out_dir,
        } => delete_requirement(&files, &requirement, &undo_file, out_dir),
        Command::Restore {
            files,
            undo_file,
            out_dir,
        } => restore_requirement(&files, &undo_file, &out_dir),
    }
}

/// Ingests every file into a fresh in-memory store. File- and sheet-level
/// problems are collected as warnings; only a batch with zero parsed
/// matrices is treated as a failure.
fn ingest_files(files: &[PathBuf]) -> Result<(MemoryStore, Vec<String>)> {
    let store = MemoryStore::new();
    let mut warnings = Vec::new();

    for file in files {
        match import_workbook(file) {
            Ok(outcome) => {
                warnings.extend(outcome.errors);
                for parsed in &outcome.matrices {
                    let matrix = Matrix::from_parsed(parsed);
                    let matrix_id = matrix.id;
                    store.add_matrix(matrix)?;
                    for (order, row) in parsed.rows.iter().enumerate() {
                        store.add_row(MatrixRow::from_parsed(row, matrix_id, order as i64))?;
                    }
                }
            }
            Err(e) => warnings.push(e.to_string()),
        }
    }

    if store.list_matrices()?.is_empty() {
        for warning in &warnings {
            eprintln!("{} {}", "warning:".yellow().bold(), warning);
        }
        anyhow::bail!("no capability matrices could be ingested");
    }

    Ok((store, warnings))
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
}

fn import_files(files: &[PathBuf]) -> Result<()> {
    let (store, warnings) = ingest_files(files)?;

    for matrix in store.list_matrices()? {
        let rows = store.rows_for_matrix(&matrix.id)?;
        let source = matrix.source_file.unwrap_or_default();
        println!(
            "{} {} ({} rows, from {})",
            "imported".green().bold(),
            matrix.display_name,
            rows.len(),
            source
        );
    }
    print_warnings(&warnings);
    Ok(())
}

fn load_comparison(store: &MemoryStore) -> Result<ComparisonData> {
    let mut matrices = Vec::new();
    for matrix in store.list_matrices()? {
        let rows = store.rows_for_matrix(&matrix.id)?;
        matrices.push((matrix, rows));
    }
    Ok(build_comparison_data(&matrices))
}

fn compare_files(files: &[PathBuf], json: bool) -> Result<()> {
    let (store, warnings) = ingest_files(files)?;
    let data = load_comparison(&store)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
        print_warnings(&warnings);
        return Ok(());
    }

    // Header line: requirement text plus one column per source
    let text_width = data
        .rows
        .iter()
        .map(|r| r.requirement.len())
        .chain(std::iter::once("Requirement".len()))
        .max()
        .unwrap_or(0)
        .min(60);

    print!("{:<text_width$}", "Requirement".bold());
    for matrix in &data.matrices {
        print!("  {}", matrix.display_name.bold());
    }
    println!();

    for row in &data.rows {
        let mut text = row.requirement.clone();
        if text.chars().count() > text_width {
            text = text.chars().take(text_width.saturating_sub(3)).collect();
            text.push_str("...");
        }
        print!("{text:<text_width$}");
        for matrix in &data.matrices {
            let cell = row.cells.get(&matrix.id);
            let score = match cell.and_then(|c| c.score) {
                Some(s) => s.to_string(),
                None => "-".to_string(),
            };
            let pad = matrix.display_name.len().max(1);
            print!("  {score:<pad$}");
        }
        println!();
    }

    println!(
        "\n{} {} requirements across {} sources",
        "compared".green().bold(),
        data.rows.len(),
        data.matrices.len()
    );
    print_warnings(&warnings);
    Ok(())
}

fn export_file(
    file: &Path,
    output: Option<PathBuf>,
    company: Option<String>,
    date: Option<String>,
    version: String,
) -> Result<()> {
    let (store, warnings) = ingest_files(&[file.to_path_buf()])?;
    let matrix = store
        .list_matrices()?
        .into_iter()
        .next()
        .context("no matrix to export")?;
    let rows = store.rows_for_matrix(&matrix.id)?;

    let meta = ExportMeta {
        company: company.unwrap_or_else(|| matrix.display_name.clone()),
        date: date.unwrap_or_else(today),
        version,
    };
    let output = output.unwrap_or_else(|| PathBuf::from(export_filename(&meta.company, &meta.date)));
    write_matrix(&output, &rows, &meta)?;

    println!(
        "{} {} ({} rows) -> {}",
        "exported".green().bold(),
        matrix.display_name,
        rows.len(),
        output.display()
    );
    print_warnings(&warnings);
    Ok(())
}

fn delete_requirement(
    files: &[PathBuf],
    requirement: &str,
    undo_file: &Path,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let (store, warnings) = ingest_files(files)?;

    // Impact preview: which sources lose actual data
    let data = load_comparison(&store)?;
    let impact = delete_info(&data, requirement);
    for hit in &impact {
        println!(
            "{} '{}' carries data in {}",
            "note:".yellow().bold(),
            requirement,
            hit.display_name
        );
    }

    let outcome = delete_by_requirement(&store, requirement)?;
    if outcome.deleted_count == 0 {
        println!("{} no rows matched '{}'", "done".green().bold(), requirement);
        print_warnings(&warnings);
        return Ok(());
    }

    let mut groups = Vec::new();
    for matrix_id in &outcome.affected_matrix_ids {
        let Some(matrix) = store.get_matrix(matrix_id)? else {
            continue;
        };
        let rows = outcome
            .deleted_rows
            .iter()
            .filter(|r| &r.matrix_id == matrix_id)
            .cloned()
            .collect();
        groups.push(UndoMatrix {
            display_name: matrix.display_name,
            rows,
        });
    }
    let record = UndoRecord {
        requirement: requirement.to_string(),
        deleted_count: outcome.deleted_count,
        matrices: groups,
    };
    let yaml = serde_yaml::to_string(&record)?;
    fs::write(undo_file, yaml)
        .with_context(|| format!("failed to write undo record '{}'", undo_file.display()))?;
    println!(
        "{} {} rows from {} matrices (undo record: {})",
        "deleted".green().bold(),
        outcome.deleted_count,
        outcome.affected_matrix_ids.len(),
        undo_file.display()
    );

    // Optionally re-render the surviving matrices
    if let Some(out_dir) = out_dir {
        render_matrices(&store, &outcome.affected_matrix_ids, &out_dir)?;
    }

    print_warnings(&warnings);
    Ok(())
}

fn restore_requirement(files: &[PathBuf], undo_file: &Path, out_dir: &Path) -> Result<()> {
    let (store, warnings) = ingest_files(files)?;

    let text = fs::read_to_string(undo_file)
        .with_context(|| format!("failed to read undo record '{}'", undo_file.display()))?;
    let record: UndoRecord = serde_yaml::from_str(&text)
        .with_context(|| format!("'{}' is not a valid undo record", undo_file.display()))?;

    let matrices = store.list_matrices()?;
    let mut restored_matrix_ids = Vec::new();
    let mut restored_count = 0usize;
    for undo in &record.matrices {
        let Some(matrix) = matrices.iter().find(|m| m.display_name == undo.display_name) else {
            eprintln!(
                "{} no ingested matrix named '{}', skipping {} rows",
                "warning:".yellow().bold(),
                undo.display_name,
                undo.rows.len()
            );
            continue;
        };
        // The recorded ids belonged to the session that wrote the record;
        // rebind the rows to this session's matrix before reinserting.
        let rows: Vec<MatrixRow> = undo
            .rows
            .iter()
            .map(|r| {
                let mut row = r.clone();
                row.id = Uuid::new_v4();
                row.matrix_id = matrix.id;
                row
            })
            .collect();
        restore_rows(&store, &rows)?;
        restored_count += rows.len();
        restored_matrix_ids.push(matrix.id);
    }

    if restored_count == 0 {
        anyhow::bail!(
            "nothing to restore: no ingested matrix matches '{}'",
            undo_file.display()
        );
    }
    if restored_count < record.deleted_count {
        eprintln!(
            "{} restored {} of {} recorded rows",
            "warning:".yellow().bold(),
            restored_count,
            record.deleted_count
        );
    }

    render_matrices(&store, &restored_matrix_ids, out_dir)?;
    println!(
        "{} {} rows of '{}' across {} matrices",
        "restored".green().bold(),
        restored_count,
        record.requirement,
        restored_matrix_ids.len()
    );
    print_warnings(&warnings);
    Ok(())
}

/// Re-renders each matrix into `out_dir` with the canonical layout.
fn render_matrices(store: &MemoryStore, matrix_ids: &[Uuid], out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create '{}'", out_dir.display()))?;
    let date = today();
    for matrix_id in matrix_ids {
        let Some(matrix) = store.get_matrix(matrix_id)? else {
            continue;
        };
        let rows = store.rows_for_matrix(matrix_id)?;
        let meta = ExportMeta {
            company: matrix.display_name.clone(),
            date: date.clone(),
            version: "1.0".into(),
        };
        let path = out_dir.join(export_filename(&meta.company, &meta.date));
        write_matrix(&path, &rows, &meta)?;
        println!(
            "{} {} -> {}",
            "rewrote".green().bold(),
            matrix.display_name,
            path.display()
        );
    }
    Ok(())
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows(matrix_id: Uuid) -> Vec<MatrixRow> {
        vec![
            MatrixRow {
                id: Uuid::new_v4(),
                matrix_id,
                requirement_number: "1".into(),
                requirement: "Works offline".into(),
                score: Some(3),
                past_performance: "Shipped in v2".into(),
                comments: String::new(),
                display_order: 0,
            },
            MatrixRow {
                id: Uuid::new_v4(),
                matrix_id,
                requirement_number: "2".into(),
                requirement: "Exports reports".into(),
                score: Some(1),
                past_performance: String::new(),
                comments: "Partial".into(),
                display_order: 1,
            },
        ]
    }

    fn rows_in(store: &MemoryStore) -> Vec<MatrixRow> {
        let matrix = store.list_matrices().unwrap().remove(0);
        store.rows_for_matrix(&matrix.id).unwrap()
    }

    #[test]
    fn delete_then_restore_round_trips_through_workbooks() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("acme.xlsx");
        let meta = ExportMeta {
            company: "Acme".into(),
            date: "2026-01-01".into(),
            version: "1.0".into(),
        };
        write_matrix(&src, &sample_rows(Uuid::new_v4()), &meta).unwrap();

        let undo = dir.path().join("undo.yaml");
        let deleted_dir = dir.path().join("after-delete");
        delete_requirement(
            &[src.clone()],
            "works offline",
            &undo,
            Some(deleted_dir.clone()),
        )
        .unwrap();

        // The undo record carries the full row, grouped by display name
        let record: UndoRecord =
            serde_yaml::from_str(&fs::read_to_string(&undo).unwrap()).unwrap();
        assert_eq!(record.deleted_count, 1);
        assert_eq!(record.matrices.len(), 1);
        assert_eq!(record.matrices[0].display_name, "Acme");
        assert_eq!(record.matrices[0].rows[0].requirement, "Works offline");
        assert_eq!(record.matrices[0].rows[0].score, Some(3));

        // The rewritten workbook only holds the survivor
        let survivor = deleted_dir.join(export_filename("Acme", &today()));
        let (store, _) = ingest_files(&[survivor.clone()]).unwrap();
        let rows = rows_in(&store);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].requirement, "Exports reports");

        let restored_dir = dir.path().join("after-restore");
        restore_requirement(&[survivor], &undo, &restored_dir).unwrap();

        // The restored workbook holds both rows again, fields intact
        let rendered = restored_dir.join(export_filename("Acme", &today()));
        let (store, _) = ingest_files(&[rendered]).unwrap();
        let rows = rows_in(&store);
        let reqs: Vec<&str> = rows.iter().map(|r| r.requirement.as_str()).collect();
        assert_eq!(reqs, vec!["Works offline", "Exports reports"]);
        assert_eq!(rows[0].requirement_number, "1");
        assert_eq!(rows[0].score, Some(3));
        assert_eq!(rows[0].past_performance, "Shipped in v2");
    }

    #[test]
    fn restore_fails_without_a_matching_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("globex.xlsx");
        let meta = ExportMeta {
            company: "Globex".into(),
            date: "2026-01-01".into(),
            version: "1.0".into(),
        };
        write_matrix(&src, &sample_rows(Uuid::new_v4()), &meta).unwrap();

        // Record names a matrix the ingest does not contain
        let record = UndoRecord {
            requirement: "Works offline".into(),
            deleted_count: 1,
            matrices: vec![UndoMatrix {
                display_name: "Acme".into(),
                rows: sample_rows(Uuid::new_v4()),
            }],
        };
        let undo = dir.path().join("undo.yaml");
        fs::write(&undo, serde_yaml::to_string(&record).unwrap()).unwrap();

        let out_dir = dir.path().join("out");
        assert!(restore_requirement(&[src], &undo, &out_dir).is_err());
    }
}
