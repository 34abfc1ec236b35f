/// Result alias for table construction.
pub type Result<T> = std::result::Result<T, TableError>;

/// Misconfiguration detected when a table is built.
///
/// Runtime operations never fail; only construction does.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    #[error("at least one page size option is required")]
    EmptyPageSizeOptions,

    #[error("page size options must be positive, got {size} at position {position}")]
    InvalidPageSize { position: usize, size: usize },

    #[error("column id '{id}' is defined more than once")]
    DuplicateColumn { id: String },
}
