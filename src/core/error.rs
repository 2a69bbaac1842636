use thiserror::Error;

/// SQLSTATE class reported when a transaction is aborted by a detected
/// write-write conflict under snapshot isolation.
pub const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE class reported when a transaction is aborted to break a deadlock.
pub const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";

/// SQLSTATE class reported when a write is attempted inside a read-only
/// transaction.
pub const SQLSTATE_READ_ONLY_TRANSACTION: &str = "25006";

#[derive(Error, Debug)]
pub enum DbError {
    /// Error reported by the storage backend, tagged with its SQLSTATE code.
    ///
    /// Retry machinery inspects the code exactly once, at the executor
    /// boundary, to decide whether the failure is transient.
    #[error("sql error [{code}]: {message}")]
    Sql { code: String, message: String },

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Lock error: {0}")]
    Lock(String),

    /// A retried operation ran out of attempts.
    ///
    /// `causes` holds every intermediate serialization failure, most recent
    /// first, so contention can be diagnosed after the fact.
    #[error("Retry budget exhausted after {attempts} attempts")]
    RetryExhausted { attempts: u32, causes: Vec<DbError> },

    /// A failed operation whose best-effort rollback also failed.
    ///
    /// The original error stays primary; the rollback error is carried as a
    /// secondary cause instead of being swallowed.
    #[error("{source} (rollback also failed: {rollback})")]
    RollbackFailed {
        source: Box<DbError>,
        rollback: Box<DbError>,
    },
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Backend error carrying the standard serialization-failure SQLSTATE.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Sql {
            code: SQLSTATE_SERIALIZATION_FAILURE.to_string(),
            message: message.into(),
        }
    }

    /// Backend error carrying the read-only-transaction SQLSTATE.
    pub fn read_only(message: impl Into<String>) -> Self {
        Self::Sql {
            code: SQLSTATE_READ_ONLY_TRANSACTION.to_string(),
            message: message.into(),
        }
    }

    /// SQLSTATE code attached to this error, if it originated in the backend.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Sql { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
