//! Store Errors
//!
//! `TigerStyle`: Explicit error types with context.

use thiserror::Error;

use crate::event::ValidationError;

/// Errors from event store operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The event failed validation and was not appended
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Connection to the backing store failed
    #[error("connection error: {message}")]
    Connection {
        /// Connection error message
        message: String,
    },

    /// A query against the backing store failed
    #[error("query error: {message}")]
    Query {
        /// Query error message
        message: String,
    },

    /// Simulated fault (for DST)
    #[error("simulated fault: {fault_type}")]
    SimulatedFault {
        /// Type of simulated fault
        fault_type: String,
    },

    /// Internal error
    #[error("internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

impl StoreError {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error.
    #[must_use]
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a simulated fault error.
    #[must_use]
    pub fn simulated_fault(fault_type: impl Into<String>) -> Self {
        Self::SimulatedFault {
            fault_type: fault_type.into(),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is transient (a retry may succeed).
    ///
    /// Validation failures are permanent; the event must be dropped.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::SimulatedFault { .. }
        )
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
