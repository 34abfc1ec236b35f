use std::path::PathBuf;

use clap::Parser;
use pagetable::{TableError, TableOptions};
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

pub const HELP_TEXT: &str = "\
q            quit
<- / ->      select column
up / down    select row
n / PgDown   next page
p / PgUp     previous page
Home / End   first / last page
s            cycle page size
/ or f       filter selected column
c            clear all filters
y            copy selected row
?            this help
Esc          close popup / cancel input";

/// Page through and filter tabular data files.
#[derive(Debug, Parser)]
#[command(name = "pagetable", version, about)]
pub struct Args {
    /// Data file to show (csv, parquet, arrow, ipc, feather)
    pub path: String,

    /// Selectable page sizes, the first one is used at start
    #[arg(long, value_delimiter = ',', default_values_t = [10usize, 25, 50])]
    pub page_sizes: Vec<usize>,

    /// Match filter patterns case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,

    /// Upper bound for the rendered width of a column
    #[arg(long, default_value_t = 40)]
    pub max_column_width: usize,

    /// Where log output is written while the terminal is in use
    #[arg(long, default_value = "pagetable.log")]
    pub log_file: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub path: PathBuf,
    pub table: TableOptions,
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub log_file: PathBuf,
}

impl AppConfig {
    pub fn from_args(args: Args) -> Result<Self, AppError> {
        Ok(Self {
            path: expand_path(&args.path)?,
            table: TableOptions::default()
                .page_size_options(args.page_sizes)
                .case_sensitive(args.case_sensitive),
            event_poll_time: args.poll_ms,
            max_column_width: args.max_column_width,
            log_file: expand_path(&args.log_file)?,
        })
    }
}

fn expand_path(path: &str) -> Result<PathBuf, AppError> {
    shellexpand::full(path)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| AppError::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Invalid table configuration: {0}")]
    Table(#[from] TableError),

    #[error("Cannot expand path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Unknown file type: {}", .0.display())]
    UnknownFileType(PathBuf),

    #[error("Loading failed: {0}")]
    LoadingFailed(String),

    #[error("Failed to set up logging: {0}")]
    Logging(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    Exit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    CyclePageSize,
    Filter,
    ClearFilters,
    CopyRow,
    Help,
    RawKey(KeyEvent),
}
