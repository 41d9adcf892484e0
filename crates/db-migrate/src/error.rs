//! Error types for the migration system.

/// Boxed error produced by a session when a statement fails.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while compiling or applying migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Connection, pool or transaction failure reported by the driver.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A statement was sent to the database and failed.
    #[error("Statement failed: {source} (sql: {sql})")]
    OperationFailure {
        /// The rendered statement.
        sql: String,
        /// The driver error.
        #[source]
        source: BoxError,
    },

    /// A statement violated a unique constraint.
    #[error("Unique constraint violated: {source} (sql: {sql})")]
    UniqueViolation {
        /// The rendered statement.
        sql: String,
        /// The driver error.
        #[source]
        source: BoxError,
    },

    /// The ledger already holds a record with this name.
    ///
    /// Raised when two runners pass the ledger check before either records.
    #[error("Migration '{0}' was recorded concurrently by another runner")]
    DuplicateName(String),

    /// The dialect has no syntax for the requested operation.
    #[error("Unsupported syntax: {0}")]
    UnsupportedSyntax(String),

    /// The operation cannot be compiled as declared.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A ledger row could not be decoded.
    #[error("Invalid migration record: {0}")]
    InvalidRecord(String),
}

impl MigrateError {
    /// Returns true if this error reports a unique constraint violation.
    #[must_use]
    pub const fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. } | Self::DuplicateName(_))
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
