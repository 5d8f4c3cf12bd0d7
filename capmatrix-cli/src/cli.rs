use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "capmat",
    about = "Collect and reconcile capability matrix spreadsheets",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest workbooks and report what parsed
    Import {
        /// Spreadsheet files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Reconcile workbooks into one side-by-side comparison table
    Compare {
        /// Spreadsheet files to reconcile
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Emit the comparison as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Re-render a workbook's first matrix with the canonical layout
    Export {
        /// Spreadsheet file to re-render
        file: PathBuf,

        /// Output path (defaults to the canonical export filename)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Company name for the metadata block (defaults to the
        /// ingested display name)
        #[arg(long)]
        company: Option<String>,

        /// Date for the metadata block (defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Version for the metadata block
        #[arg(long, default_value = "1.0")]
        version: String,
    },

    /// Delete a requirement from every ingested workbook, keeping an
    /// undo record of the removed rows
    Delete {
        /// Spreadsheet files to ingest and mutate
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Requirement text to delete (matched after trim + case-fold)
        #[arg(short, long)]
        requirement: String,

        /// Where to write the undo record
        #[arg(long, default_value = "capmat-undo.yaml")]
        undo_file: PathBuf,

        /// Re-export the surviving matrices into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Reverse a prior delete: reinsert the recorded rows and re-render
    /// the restored matrices
    Restore {
        /// Spreadsheet files holding the current state of the matrices
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Undo record written by a prior delete
        #[arg(long, default_value = "capmat-undo.yaml")]
        undo_file: PathBuf,

        /// Directory for the re-rendered workbooks
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}
