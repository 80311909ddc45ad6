//! Error types shared by the link store, the code allocator and the HTTP layer
//!
//! Every store and allocator operation returns a typed [`LinkError`] so the HTTP
//! boundary can turn each outcome into the right status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors produced while allocating, storing or resolving short links
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The request was rejected before touching the store
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A record already occupies this code (expired records included)
    ///
    /// Only the allocator's retry loop should ever observe this variant.
    #[error("short code `{0}` is already taken")]
    CodeConflict(String),

    /// No active record exists for the code
    #[error("short link `{0}` not found")]
    NotFound(String),

    /// Every candidate up to the maximum code length collided
    #[error("no free short code available up to length {max_length}")]
    AllocationExhausted { max_length: usize },

    /// The caller's deadline passed before the operation finished
    #[error("operation timed out")]
    Timeout,

    /// The persistence layer failed
    #[error("storage failure: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LinkError {
    /// Whether this error signals trouble in the service rather than a routine miss
    pub fn is_system_failure(&self) -> bool {
        matches!(
            self,
            LinkError::AllocationExhausted { .. } | LinkError::Timeout | LinkError::Storage(_)
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            LinkError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LinkError::NotFound(_) => StatusCode::NOT_FOUND,
            LinkError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            LinkError::CodeConflict(_)
            | LinkError::AllocationExhausted { .. }
            | LinkError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

macro_rules! storage_error_from {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for LinkError {
                fn from(err: $source) -> Self {
                    LinkError::Storage(Box::new(err))
                }
            }
        )+
    };
}

storage_error_from!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
    serde_json::Error,
    tokio::task::JoinError,
);

impl IntoResponse for LinkError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.is_system_failure() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        // Internal details stay in the log
        let message = match &self {
            LinkError::Storage(_) => "internal storage error".to_string(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
