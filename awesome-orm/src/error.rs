/// Structured error types for awesome-orm.
///
/// Uses `thiserror` so library consumers get structured, composable errors.
/// The binary crate (awesome-cli) wraps these in `anyhow` for convenience.
use thiserror::Error;

/// Main error type for awesome-orm operations
#[derive(Error, Debug)]
pub enum OrmError {
    /// Record type definition rejected at registration time
    #[error("Schema error in table '{table}': {reason}")]
    Schema { table: String, reason: String },

    /// Caller passed an argument of the wrong shape
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Statement or connectivity failure reported by the driver
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A query was issued before `create_pool`
    #[error("Connection pool used before create_pool was called")]
    PoolNotInitialized,

    /// `create_pool` was called twice on the same handle
    #[error("Connection pool already initialized")]
    PoolAlreadyInitialized,

    /// Configuration could not be read or is inconsistent
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Attribute name that the table schema does not declare
    #[error("Table '{table}' has no field '{field}'")]
    UnknownField { table: String, field: String },

    /// Value variant does not fit the typed field
    #[error("Field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Result type alias for awesome-orm operations
pub type Result<T> = std::result::Result<T, OrmError>;

impl OrmError {
    /// Create a schema error
    pub fn schema(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(field: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected,
            found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrmError::schema("users", "primary key not found");
        assert_eq!(
            err.to_string(),
            "Schema error in table 'users': primary key not found"
        );

        let err = OrmError::unknown_field("users", "nickname");
        assert!(err.to_string().contains("users"));
        assert!(err.to_string().contains("nickname"));
    }

    #[test]
    fn test_sqlx_error_is_transparent() {
        let sqlx_err = sqlx::Error::RowNotFound;
        let expected = sqlx_err.to_string();
        let orm_err: OrmError = sqlx_err.into();

        assert!(matches!(orm_err, OrmError::Database(sqlx::Error::RowNotFound)));
        assert_eq!(orm_err.to_string(), expected);
    }
}
