use thiserror::Error;

use crate::traits::{
    CourseManagement,
    FunnelManagement,
    MembershipManagement,
    OrderManagement,
    PageManagement,
    ProductManagement,
};

/// The highest level of behaviour for backends supporting the storefront. A type implementing this trait can serve
/// every API in the engine.
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase:
    Clone
    + OrderManagement
    + MembershipManagement
    + PageManagement
    + FunnelManagement
    + CourseManagement
    + ProductManagement
{
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("A record with the same {0} already exists")]
    UniqueViolation(String),
    #[error("Could not (de)serialize a stored value: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::UniqueViolation(db_err.message().to_string())
            },
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::SerializationError(format!("column {index}: {source}"))
            },
            e => StoreError::DatabaseError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::SerializationError(e.to_string())
    }
}
