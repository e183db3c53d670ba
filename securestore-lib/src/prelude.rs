//! Prelude module for convenient imports.
//!
//! ```rust
//! use securestore_lib::prelude::*;
//! ```
//!
//! ## What's Included
//!
//! - The store: `SecureStore`, `StoreConfig`, `ExpiryHandle`
//! - Error types: `StoreError`, `StoreErrorCode`, `Result`
//! - Backends: `SecureStoreBackend`, `InMemoryBackend`, `PlatformBackend`, `ItemOptions`
//! - Schemas: `Schema`, `SchemaExt`, `Typed`, `Coerced`, `AnyJson`

// Store
pub use crate::{ExpiryHandle, SecureStore, StoreConfig};

// Error handling
pub use crate::errors::{StoreError, StoreErrorCode};
pub use crate::Result;

// Backends
pub use crate::backend::{
    BackendError, BackendErrorCode, InMemoryBackend, ItemOptions, PlatformBackend,
    SecureStoreBackend,
};

// Schemas
pub use crate::schema::{from_fn, AnyJson, Coerced, Schema, SchemaExt, Typed, ValidationError};
