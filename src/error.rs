//! Unified error handling for client-metrics.
//!
//! Two failure domains exist: misuse of the aggregator itself (calling a
//! mutation or read before `init` has completed), and failures reported by a
//! single server collaborator while a gauge fans out across the server set.
//! The former is a programming-contract violation surfaced as
//! [`MetricsError::NotInitialized`]; the latter is carried as a
//! [`ServerError`] value so the aggregator can log it and skip that server
//! without aborting the whole fan-out.

use thiserror::Error;

/// Errors raised by the aggregator's own surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    /// A mutation or read was attempted before `init` completed.
    ///
    /// This is a reproducible programming error in the caller, not a runtime
    /// fault; the contract is that `init` runs once at process startup before
    /// any server begins accepting connections.
    #[error("client metrics aggregator is not initialized")]
    NotInitialized,
}

impl MetricsError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
        }
    }
}

/// Failure reported by one server collaborator during a metrics query.
///
/// A [`ServerError`] never aborts aggregation: the fan-out logs it and moves
/// on to the next server.
#[derive(Debug, Error)]
#[error("server query failed: {context}")]
pub struct ServerError {
    context: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ServerError {
    /// A server error with a context message and no underlying cause.
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            source: None,
        }
    }

    /// A server error wrapping an underlying cause.
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for server collaborator accessors.
pub type ServerResult<T> = Result<T, ServerError>;
