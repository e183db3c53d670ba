//! Error types for SecureStore operations.
//!
//! Validation failures never show up here: reads resolve them to the
//! caller's fallback. What remains are backend failures, values that cannot
//! be encoded, and misuse of the runtime or the default store.

use crate::backend::{BackendError, BackendErrorCode};

/// Error codes for FFI and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum StoreErrorCode {
    /// Backend reported a failure
    Backend = 2000,
    /// Backend requires authentication
    Auth = 3000,
    /// Value could not be serialized
    Serialization = 5002,
    /// No async runtime to schedule on
    NoRuntime = 6000,
    /// Default store not initialized
    NotInitialized = 6001,
    /// Default store already initialized
    AlreadyInitialized = 6002,
    /// Invalid configuration
    Config = 7000,
}

/// Error type for SecureStore operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The value could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Expiration needs a Tokio runtime and none is running.
    #[error("no Tokio runtime available to schedule expiration")]
    NoRuntime,

    /// The default store has not been initialized.
    #[error("default store is not initialized; call init_default_store first")]
    NotInitialized,

    /// The default store was already initialized.
    #[error("default store is already initialized")]
    AlreadyInitialized,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Get the error code for FFI/mobile integration.
    pub fn code(&self) -> StoreErrorCode {
        match self {
            Self::Backend(e) if e.requires_auth() => StoreErrorCode::Auth,
            Self::Backend(_) => StoreErrorCode::Backend,
            Self::Serialization(_) => StoreErrorCode::Serialization,
            Self::NoRuntime => StoreErrorCode::NoRuntime,
            Self::NotInitialized => StoreErrorCode::NotInitialized,
            Self::AlreadyInitialized => StoreErrorCode::AlreadyInitialized,
            Self::Config(_) => StoreErrorCode::Config,
        }
    }

    /// The backend error code, if this came from the backend.
    pub fn backend_code(&self) -> Option<BackendErrorCode> {
        match self {
            Self::Backend(e) => Some(e.code),
            _ => None,
        }
    }

    /// Returns true if this error is potentially recoverable by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(e) if e.is_retryable())
    }

    /// Create a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }
}
