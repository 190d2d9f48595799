//! Error types for nuclear-orm

use std::time::Duration;
use thiserror::Error;

/// Result type alias for nuclear-orm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for builder, model and database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Empty or otherwise unusable input (e.g. an empty insert/update payload)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Read of an attribute that is not set on the model
    #[error("Attribute {0} does not exist")]
    AttributeNotFound(String),

    /// Read of an attribute declared hidden on the model
    #[error("Attribute {0} is hidden")]
    HiddenAttribute(String),

    /// Write touching an attribute that is not mass-assignable
    #[error("Attribute {0} is not fillable")]
    MassAssignment(String),

    /// Driver-level query error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Statement could not be executed (malformed statement, driver-neutral failure)
    #[error("Execution failure: {0}")]
    Execution(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Statement timeout
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Invalid connection configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OrmError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an execution failure
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this error came from executing a statement or reaching the database.
    pub fn is_execution_failure(&self) -> bool {
        match self {
            Self::Query(_)
            | Self::Execution(_)
            | Self::Connection(_)
            | Self::Timeout(_)
            | Self::Decode { .. } => true,
            #[cfg(feature = "pool")]
            Self::Pool(_) => true,
            _ => false,
        }
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a missing attribute error
    pub fn is_attribute_not_found(&self) -> bool {
        matches!(self, Self::AttributeNotFound(_))
    }

    /// Check if this is a hidden attribute error
    pub fn is_hidden_attribute(&self) -> bool {
        matches!(self, Self::HiddenAttribute(_))
    }

    /// Check if this is a mass-assignment error
    pub fn is_mass_assignment(&self) -> bool {
        matches!(self, Self::MassAssignment(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
