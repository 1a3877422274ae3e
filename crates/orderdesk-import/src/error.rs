use thiserror::Error;

/// A run-level failure. The caller gets either this or a complete summary.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The header lacks required columns. Raised before any row is read.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("unreadable header row: {0}")]
    UnreadableHeader(#[source] csv::Error),

    /// The repository rejected a read or write. The unit of work must be
    /// rolled back by the caller.
    #[error("persistence failure at row {row}: {source}")]
    Persistence {
        row: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ImportError {
    /// `true` when the file was rejected before any row was processed.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ImportError::MissingColumns(_) | ImportError::UnreadableHeader(_)
        )
    }

    pub(crate) fn persistence<E>(row: usize, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ImportError::Persistence {
            row,
            source: Box::new(source),
        }
    }
}

/// A problem confined to one row. The row is reported and the run continues.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("malformed record: {0}")]
    Malformed(#[source] csv::Error),

    #[error("{column}: required value is empty")]
    MissingValue { column: String },

    #[error("{column}: unrecognized date {value:?}")]
    InvalidDate { column: String, value: String },

    #[error("{column}: invalid amount {value:?}")]
    InvalidAmount { column: String, value: String },

    #[error("{column}: invalid quantity {value:?}")]
    InvalidQuantity { column: String, value: String },

    #[error("{column}: {reason}")]
    InvalidLineItems { column: String, reason: String },
}

impl RowError {
    /// The column the error refers to, when there is one.
    #[must_use]
    pub fn column(&self) -> Option<&str> {
        match self {
            RowError::Malformed(_) => None,
            RowError::MissingValue { column }
            | RowError::InvalidDate { column, .. }
            | RowError::InvalidAmount { column, .. }
            | RowError::InvalidQuantity { column, .. }
            | RowError::InvalidLineItems { column, .. } => Some(column),
        }
    }
}
