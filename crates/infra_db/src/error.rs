//! Database error types

use domain_dues::LedgerError;
use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation (the schema's conservation guards)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Pool exhaustion - no available connections
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// A stored value could not be mapped to its domain type
    #[error("row mapping error: {0}")]
    RowMapping(String),
}

impl DatabaseError {
    /// Creates a not found error for an entity type and identifier
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{entity} with id '{id}' not found"))
    }

    /// Creates a row mapping error
    pub fn row_mapping(message: impl std::fmt::Display) -> Self {
        DatabaseError::RowMapping(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }
}

/// Maps SQLx errors onto the variants above using PostgreSQL error codes
///
/// https://www.postgresql.org/docs/current/errcodes-appendix.html
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                        "23503" => {
                            DatabaseError::ForeignKeyViolation(db_err.message().to_string())
                        }
                        "23514" => {
                            DatabaseError::ConstraintViolation(db_err.message().to_string())
                        }
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

/// Every database failure surfaces to the domain as a persistence
/// failure; the allocation unit it interrupted has been rolled back
impl From<DatabaseError> for LedgerError {
    fn from(error: DatabaseError) -> Self {
        LedgerError::Persistence(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_mentions_entity_and_id() {
        let error = DatabaseError::not_found("Member", "MBR-123");
        assert!(error.is_not_found());
        assert!(error.to_string().contains("Member"));
        assert!(error.to_string().contains("MBR-123"));
    }

    #[test]
    fn constraint_classification() {
        assert!(DatabaseError::DuplicateEntry("x".into()).is_constraint_violation());
        assert!(DatabaseError::ConstraintViolation("x".into()).is_constraint_violation());
        assert!(!DatabaseError::PoolExhausted.is_constraint_violation());
    }

    #[test]
    fn converts_into_persistence_failure() {
        let ledger_error: LedgerError = DatabaseError::PoolExhausted.into();
        assert!(matches!(ledger_error, LedgerError::Persistence(_)));
    }
}
