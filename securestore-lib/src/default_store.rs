//! Process-wide default store.
//!
//! The functions here mirror [`SecureStore`] against one un-namespaced
//! store over a [`PlatformBackend`]. The store lives for the rest of the
//! process once [`init_default_store`] has installed it; every mirror
//! returns [`StoreError::NotInitialized`] before that.
//!
//! ```
//! use securestore_lib::backend::PlatformBackend;
//! use securestore_lib::default_store;
//! use securestore_lib::schema::Typed;
//!
//! # fn main() -> securestore_lib::Result<()> {
//! default_store::init_default_store(PlatformBackend::new("com.example.app").with_fallback_only())?;
//!
//! default_store::set("greeting", "hello")?;
//! assert_eq!(
//!     default_store::get("greeting", String::new(), Typed::<String>::new())?,
//!     "hello"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! [`clear`] and [`length`] exist for API parity only. The backend cannot
//! enumerate or bulk-delete items, so they log a warning and do nothing.

use std::sync::OnceLock;
use std::time::Duration;

use serde::Serialize;

use crate::backend::{ItemOptions, PlatformBackend};
use crate::errors::StoreError;
use crate::expiry::ExpiryHandle;
use crate::schema::Schema;
use crate::store::SecureStore;
use crate::Result;

static DEFAULT_STORE: OnceLock<SecureStore<PlatformBackend>> = OnceLock::new();

/// Install the default store over `backend`.
///
/// # Errors
/// [`StoreError::AlreadyInitialized`] if a default store already exists.
pub fn init_default_store(backend: PlatformBackend) -> Result<&'static SecureStore<PlatformBackend>> {
    let mut installed = false;
    let store = DEFAULT_STORE.get_or_init(|| {
        installed = true;
        SecureStore::new(backend)
    });
    if installed {
        tracing::debug!(service = store.backend().service(), "default store initialized");
        Ok(store)
    } else {
        Err(StoreError::AlreadyInitialized)
    }
}

/// The default store.
///
/// # Errors
/// [`StoreError::NotInitialized`] before [`init_default_store`].
pub fn default_store() -> Result<&'static SecureStore<PlatformBackend>> {
    DEFAULT_STORE.get().ok_or(StoreError::NotInitialized)
}

/// See [`SecureStore::namespace`].
pub fn get_namespace() -> Result<Option<String>> {
    Ok(default_store()?.namespace())
}

/// See [`SecureStore::set_namespace`].
pub fn set_namespace<N: Serialize>(namespace: N) -> Result<bool> {
    Ok(default_store()?.set_namespace(namespace))
}

/// See [`SecureStore::get`].
pub fn get<S: Schema>(key: &str, fallback: S::Output, schema: S) -> Result<S::Output> {
    default_store()?.get(key, fallback, schema)
}

/// See [`SecureStore::get_async`].
pub async fn get_async<S: Schema>(key: &str, fallback: S::Output, schema: S) -> Result<S::Output> {
    default_store()?.get_async(key, fallback, schema).await
}

/// See [`SecureStore::set`].
pub fn set<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<bool> {
    default_store()?.set(key, value)
}

/// See [`SecureStore::set_async`].
pub async fn set_async<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<bool> {
    default_store()?.set_async(key, value).await
}

/// See [`SecureStore::set_with_expiration`].
pub fn set_with_expiration<T: Serialize + ?Sized>(
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<ExpiryHandle> {
    default_store()?.set_with_expiration(key, value, ttl)
}

/// See [`SecureStore::exists`].
pub fn exists(key: &str) -> Result<bool> {
    default_store()?.exists(key)
}

/// See [`SecureStore::exists_async`].
pub async fn exists_async(key: &str) -> Result<bool> {
    default_store()?.exists_async(key).await
}

/// See [`SecureStore::remove_async`].
pub async fn remove_async(key: &str, options: Option<ItemOptions>) -> Result<bool> {
    Ok(default_store()?.remove_async(key, options).await)
}

/// See [`SecureStore::can_use_biometric_authentication`].
pub fn can_use_biometric_authentication() -> Result<bool> {
    Ok(default_store()?.can_use_biometric_authentication())
}

/// See [`SecureStore::is_available_async`]. Needs no initialization.
pub async fn is_available_async() -> bool {
    SecureStore::<PlatformBackend>::is_available_async().await
}

/// Not supported: the backend cannot bulk-delete. Logs a warning.
pub fn clear() {
    tracing::warn!("clear() is not supported by secure storage; nothing was removed");
}

/// Not supported: the backend cannot enumerate items. Logs a warning and returns 0.
pub fn length() -> usize {
    tracing::warn!("length() is not supported by secure storage; returning 0");
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    // The singleton is process-wide, so only the no-op functions are
    // exercised here; tests/default_store.rs covers the rest in its own
    // process.

    #[test]
    fn test_clear_is_noop() {
        clear();
    }

    #[test]
    fn test_length_is_zero() {
        assert_eq!(length(), 0);
    }
}
