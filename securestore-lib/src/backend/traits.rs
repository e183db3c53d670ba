//! Core traits for secure storage backends.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

/// Error codes for backend operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum BackendErrorCode {
    /// Item not found
    NotFound = 1000,
    /// Access denied (auth required)
    AccessDenied = 2000,
    /// User cancelled authentication
    UserCancelled = 2001,
    /// Biometric authentication failed
    BiometricFailed = 2002,
    /// Storage is locked
    StorageLocked = 2003,
    /// Invalid key format
    InvalidKey = 4000,
    /// Encryption failed
    EncryptionFailed = 5000,
    /// Decryption failed
    DecryptionFailed = 5001,
    /// Platform not supported
    Unsupported = 6000,
    /// Internal error
    Internal = 9999,
}

/// Error type for backend operations.
#[derive(Debug, Clone)]
pub struct BackendError {
    /// Error code for FFI/mobile integration
    pub code: BackendErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Storage key related to the error (if applicable)
    pub key: Option<String>,
}

impl BackendError {
    /// Create a new error.
    pub fn new(code: BackendErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            key: None,
        }
    }

    /// Create a new error with the associated key.
    pub fn with_key(
        code: BackendErrorCode,
        message: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a "not found" error.
    pub fn not_found(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            code: BackendErrorCode::NotFound,
            message: format!("Item not found: {}", key),
            key: Some(key),
        }
    }

    /// Create an "invalid key" error.
    pub fn invalid_key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            code: BackendErrorCode::InvalidKey,
            message: format!(
                "Invalid key '{}': keys must be non-empty and contain only alphanumerics, '.', '-', '_' or ':'",
                key
            ),
            key: Some(key),
        }
    }

    /// Create an "access denied" error.
    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::new(BackendErrorCode::AccessDenied, reason)
    }

    /// Create an "unsupported" error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::new(
            BackendErrorCode::Unsupported,
            format!("Feature not supported: {}", feature.into()),
        )
    }

    /// Check if this error indicates the item wasn't found.
    pub fn is_not_found(&self) -> bool {
        self.code == BackendErrorCode::NotFound
    }

    /// Check if this error requires user authentication.
    pub fn requires_auth(&self) -> bool {
        matches!(
            self.code,
            BackendErrorCode::AccessDenied
                | BackendErrorCode::StorageLocked
                | BackendErrorCode::BiometricFailed
        )
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code,
            BackendErrorCode::UserCancelled
                | BackendErrorCode::BiometricFailed
                | BackendErrorCode::StorageLocked
        )
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(key) = &self.key {
            write!(f, "{} (key: {})", self.message, key)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for BackendError {}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// When a stored item may be read.
///
/// Mirrors the keychain accessibility classes; backends without such a
/// concept ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    /// Readable after the first unlock following a restart.
    #[default]
    AfterFirstUnlock,
    /// Like `AfterFirstUnlock`, never migrated to another device.
    AfterFirstUnlockThisDeviceOnly,
    /// Readable only while the device is unlocked.
    WhenUnlocked,
    /// Like `WhenUnlocked`, never migrated to another device.
    WhenUnlockedThisDeviceOnly,
    /// Readable only while a device passcode is set.
    WhenPasscodeSetThisDeviceOnly,
}

/// Per-call options passed through to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemOptions {
    /// Require biometric/device authentication to access the item
    pub require_authentication: bool,
    /// Prompt shown when authentication is requested
    pub authentication_prompt: Option<String>,
    /// Override for the keychain service the item lives under
    pub keychain_service: Option<String>,
    /// Accessibility class of the item
    pub accessibility: Accessibility,
}

impl ItemOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require authentication to access.
    pub fn require_authentication(mut self) -> Self {
        self.require_authentication = true;
        self
    }

    /// Set the authentication prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.authentication_prompt = Some(prompt.into());
        self
    }

    /// Store the item under a different keychain service.
    pub fn with_keychain_service(mut self, service: impl Into<String>) -> Self {
        self.keychain_service = Some(service.into());
        self
    }

    /// Set the accessibility class.
    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }
}

/// Reject keys the platform keystores cannot hold.
pub fn validate_key(key: &str) -> BackendResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':'));
    if valid {
        Ok(())
    } else {
        Err(BackendError::invalid_key(key))
    }
}

/// Platform-agnostic secure key/value backend.
///
/// Values are strings; encoding structured data is the caller's job.
///
/// Implementations should:
/// - Encrypt items at rest using platform-specific secure storage
/// - Never log or expose stored values
/// - Treat deleting a missing item as success
///
/// The async variants default to running the sync call inline.
pub trait SecureStoreBackend: Send + Sync {
    /// Read an item.
    ///
    /// # Returns
    /// The stored string, or None if not found.
    ///
    /// # Errors
    /// - `AccessDenied` if authentication fails
    /// - `DecryptionFailed` if platform decryption fails
    fn get_item(&self, key: &str, options: &ItemOptions) -> BackendResult<Option<String>>;

    /// Write an item, replacing any previous value.
    ///
    /// # Errors
    /// - `InvalidKey` if the key is not accepted by the platform
    /// - `EncryptionFailed` if platform encryption fails
    fn set_item(&self, key: &str, value: &str, options: &ItemOptions) -> BackendResult<()>;

    /// Delete an item. Deleting a missing item succeeds.
    fn delete_item(&self, key: &str, options: &ItemOptions) -> BackendResult<()>;

    /// Check if an item exists.
    fn has_item(&self, key: &str, options: &ItemOptions) -> BackendResult<bool> {
        Ok(self.get_item(key, options)?.is_some())
    }

    /// Whether biometric authentication can protect items on this device.
    fn can_use_biometric_authentication(&self) -> bool;

    /// Whether this backend is usable on the current device.
    fn is_available() -> impl Future<Output = bool> + Send
    where
        Self: Sized;

    /// Async version of [`get_item`](Self::get_item).
    fn get_item_async(
        &self,
        key: &str,
        options: &ItemOptions,
    ) -> impl Future<Output = BackendResult<Option<String>>> + Send {
        async move { self.get_item(key, options) }
    }

    /// Async version of [`set_item`](Self::set_item).
    fn set_item_async(
        &self,
        key: &str,
        value: &str,
        options: &ItemOptions,
    ) -> impl Future<Output = BackendResult<()>> + Send {
        async move { self.set_item(key, value, options) }
    }

    /// Async version of [`delete_item`](Self::delete_item).
    fn delete_item_async(
        &self,
        key: &str,
        options: &ItemOptions,
    ) -> impl Future<Output = BackendResult<()>> + Send {
        async move { self.delete_item(key, options) }
    }

    /// Async version of [`has_item`](Self::has_item).
    fn has_item_async(
        &self,
        key: &str,
        options: &ItemOptions,
    ) -> impl Future<Output = BackendResult<bool>> + Send {
        async move { Ok(self.get_item_async(key, options).await?.is_some()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BackendError::not_found("my-key");
        assert!(err.is_not_found());
        assert!(!err.requires_auth());
        assert_eq!(err.key, Some("my-key".to_string()));
        assert_eq!(err.to_string(), "Item not found: my-key (key: my-key)");
    }

    #[test]
    fn test_error_classification() {
        assert!(BackendError::access_denied("locked").requires_auth());
        assert!(BackendError::new(BackendErrorCode::StorageLocked, "locked").is_retryable());
        assert!(!BackendError::unsupported("biometrics").is_retryable());
        assert_eq!(BackendErrorCode::InvalidKey as i32, 4000);
    }

    #[test]
    fn test_item_options() {
        let opts = ItemOptions::new()
            .require_authentication()
            .with_prompt("Unlock")
            .with_keychain_service("com.example.vault")
            .with_accessibility(Accessibility::WhenUnlocked);

        assert!(opts.require_authentication);
        assert_eq!(opts.authentication_prompt.as_deref(), Some("Unlock"));
        assert_eq!(opts.keychain_service.as_deref(), Some("com.example.vault"));
        assert_eq!(opts.accessibility, Accessibility::WhenUnlocked);
    }

    #[test]
    fn test_item_options_deserialize_defaults() {
        let opts: ItemOptions =
            serde_json::from_str(r#"{"accessibility":"when_unlocked_this_device_only"}"#).unwrap();
        assert!(!opts.require_authentication);
        assert_eq!(opts.accessibility, Accessibility::WhenUnlockedThisDeviceOnly);
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("settings").is_ok());
        assert!(validate_key("app:user.token-1_v2").is_ok());
        assert_eq!(
            validate_key("").unwrap_err().code,
            BackendErrorCode::InvalidKey
        );
        assert!(validate_key("has space").is_err());
        assert!(validate_key("slash/key").is_err());
    }
}
