//! In-memory backend implementation.
//!
//! This implementation is for testing and development only.
//! In production, use [`PlatformBackend`](super::PlatformBackend).
//!
//! # Thread Safety
//!
//! This backend uses `RwLock` for thread-safe access. Lock poisoning
//! is handled gracefully by returning an error rather than panicking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use super::traits::{
    validate_key, BackendError, BackendErrorCode, BackendResult, ItemOptions, SecureStoreBackend,
};

/// In-memory implementation of a secure storage backend.
///
/// **Warning**: This is for testing only. Values are not encrypted
/// and will be lost when the process exits.
///
/// Besides storage it carries switches for the device-dependent parts of
/// the contract: biometric capability and injected failures.
pub struct InMemoryBackend {
    items: RwLock<HashMap<String, String>>,
    biometrics: AtomicBool,
    failure: RwLock<Option<BackendErrorCode>>,
}

/// Helper function to handle lock poisoning gracefully.
fn lock_error(context: &str) -> BackendError {
    BackendError::new(
        BackendErrorCode::Internal,
        format!("InMemoryBackend: lock poisoned during {}", context),
    )
}

impl InMemoryBackend {
    /// Create a new, empty in-memory backend without biometric support.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            biometrics: AtomicBool::new(false),
            failure: RwLock::new(None),
        }
    }

    /// Report biometric capability (and accept `require_authentication`).
    pub fn with_biometrics(self, enabled: bool) -> Self {
        self.biometrics.store(enabled, Ordering::SeqCst);
        self
    }

    /// Make every subsequent operation fail with `code`.
    pub fn fail_with(&self, code: BackendErrorCode) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = Some(code);
        }
    }

    /// Stop injecting failures.
    pub fn clear_failure(&self) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = None;
        }
    }

    /// Get the number of stored items.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.items.read().map(|i| i.len()).unwrap_or(0)
    }

    /// Check if storage is empty.
    ///
    /// Returns true if the lock is poisoned.
    pub fn is_empty(&self) -> bool {
        self.items.read().map(|i| i.is_empty()).unwrap_or(true)
    }

    /// Read the exact stored string, bypassing options and failure injection.
    pub fn raw_get(&self, key: &str) -> Option<String> {
        self.items.read().ok().and_then(|i| i.get(key).cloned())
    }

    fn check(&self, operation: &str, key: &str, options: &ItemOptions) -> BackendResult<()> {
        let failure = *self.failure.read().map_err(|_| lock_error(operation))?;
        if let Some(code) = failure {
            return Err(BackendError::with_key(
                code,
                format!("InMemoryBackend: injected failure during {}", operation),
                key,
            ));
        }
        validate_key(key)?;
        if options.require_authentication && !self.biometrics.load(Ordering::SeqCst) {
            return Err(BackendError::unsupported(
                "authentication-protected items on a device without biometrics",
            ));
        }
        Ok(())
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureStoreBackend for InMemoryBackend {
    fn get_item(&self, key: &str, options: &ItemOptions) -> BackendResult<Option<String>> {
        self.check("get_item", key, options)?;
        let items = self.items.read().map_err(|_| lock_error("get_item"))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str, options: &ItemOptions) -> BackendResult<()> {
        self.check("set_item", key, options)?;
        let mut items = self.items.write().map_err(|_| lock_error("set_item"))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete_item(&self, key: &str, options: &ItemOptions) -> BackendResult<()> {
        self.check("delete_item", key, options)?;
        let mut items = self.items.write().map_err(|_| lock_error("delete_item"))?;
        items.remove(key);
        Ok(())
    }

    fn has_item(&self, key: &str, options: &ItemOptions) -> BackendResult<bool> {
        self.check("has_item", key, options)?;
        let items = self.items.read().map_err(|_| lock_error("has_item"))?;
        Ok(items.contains_key(key))
    }

    fn can_use_biometric_authentication(&self) -> bool {
        self.biometrics.load(Ordering::SeqCst)
    }

    async fn is_available() -> bool {
        true
    }
}
