//! Secure storage backends.
//!
//! This module provides a platform-agnostic trait for secure key/value
//! persistence, with implementations for:
//! - In-memory storage (for testing)
//! - OS secure storage: macOS Keychain, Windows Credential Manager,
//!   Linux Secret Service
//!
//! ## Usage
//!
//! ```rust
//! use securestore_lib::backend::{InMemoryBackend, ItemOptions, SecureStoreBackend};
//!
//! let backend = InMemoryBackend::new();
//! let options = ItemOptions::default();
//!
//! backend.set_item("session-token", "abc123", &options).unwrap();
//! assert_eq!(
//!     backend.get_item("session-token", &options).unwrap().as_deref(),
//!     Some("abc123")
//! );
//!
//! backend.delete_item("session-token", &options).unwrap();
//! ```
//!
//! ## Security Considerations
//!
//! - Items are stored with platform-specific encryption
//! - Access control via biometrics/device unlock where supported
//! - No values are ever logged or serialized to unprotected storage

mod memory;
mod platform;
mod traits;

pub use memory::InMemoryBackend;
pub use platform::PlatformBackend;
pub use traits::{
    validate_key, Accessibility, BackendError, BackendErrorCode, BackendResult, ItemOptions,
    SecureStoreBackend,
};
