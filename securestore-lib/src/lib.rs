//! SecureStore library.
//!
//! A namespaced, schema-validated key/value store over the platform's
//! secure storage (macOS Keychain, Windows Credential Manager, Linux Secret
//! Service), with timer-based expiration of individual items.
//!
//! # Features
//!
//! - **Namespacing**: keys are prefixed with `namespace:` so several logical
//!   stores can share one backend
//! - **Read-time validation**: reads take a [`Schema`](schema::Schema) and a
//!   fallback; anything missing or invalid yields the fallback
//! - **Expiration**: [`SecureStore::set_with_expiration`] schedules deletion
//!   on the current Tokio runtime
//! - **Default store**: a process-wide instance behind [`default_store`]
//!
//! # Example
//!
//! ```
//! use securestore_lib::prelude::*;
//!
//! # fn main() -> securestore_lib::Result<()> {
//! let store = SecureStore::new(InMemoryBackend::new()).with_namespace("wallet");
//!
//! store.set("pubkey", "8pinxxgqs41n4aididenw5apqp1urfmzdztr8jt4abrkdn435ewo")?;
//! assert!(store.exists("pubkey")?);
//! assert_eq!(
//!     store.backend().raw_get("wallet:pubkey").as_deref(),
//!     Some("8pinxxgqs41n4aididenw5apqp1urfmzdztr8jt4abrkdn435ewo")
//! );
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod codec;
pub mod config;
pub mod default_store;
pub mod errors;
pub mod expiry;
pub mod prelude;
pub mod schema;
pub mod store;

pub use config::StoreConfig;
pub use errors::{StoreError, StoreErrorCode};
pub use expiry::ExpiryHandle;
pub use store::SecureStore;

/// Common result alias for SecureStore operations.
pub type Result<T> = std::result::Result<T, StoreError>;
