//! Platform secure storage backend.
//!
//! Stores items in OS-specific secure storage:
//!
//! - **macOS**: Keychain Services (via security-framework crate)
//! - **Windows**: Windows Credential Manager (via windows crate)
//! - **Linux**: Secret Service API (via secret-service crate)
//!
//! # Thread Safety
//!
//! This backend uses `RwLock` for thread-safe access to the fallback storage.
//! Native OS storage is assumed to be thread-safe.
//!
//! # Fallback Behavior
//!
//! Native failures are returned to the caller; a missing item is not a
//! failure. The in-memory map is used only on platforms without native
//! storage and when built with `with_fallback_only()` for testing.
//!
//! # Linux
//!
//! Sync calls use the blocking Secret Service API, which drives its own Tokio
//! runtime. Inside a Tokio context they run on a scoped thread instead.

use std::collections::HashMap;
use std::sync::RwLock;

use super::traits::{
    validate_key, BackendError, BackendErrorCode, BackendResult, ItemOptions, SecureStoreBackend,
};

/// OS secure storage backend.
///
/// Items live under a keychain *service* (the application identifier by
/// default, or [`ItemOptions::keychain_service`] per call) with the storage
/// key as the account name.
///
/// On platforms without native storage, or with
/// [`with_fallback_only`](Self::with_fallback_only), items live in an
/// in-memory map instead.
/// Note: Fallback storage is NOT secure and should only be used for testing.
///
/// Desktop keystores have no biometric gate, so this backend reports no
/// biometric capability and rejects `require_authentication`.
pub struct PlatformBackend {
    /// Default keychain service for items
    service: String,
    /// Fallback to in-memory storage (NOT secure, for testing only)
    fallback_storage: RwLock<HashMap<String, String>>,
    /// Whether to use native OS storage
    use_native: bool,
}

impl PlatformBackend {
    /// Create a new platform backend.
    ///
    /// The service is used to group items in the OS keychain.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            fallback_storage: RwLock::new(HashMap::new()),
            use_native: cfg!(any(
                target_os = "macos",
                target_os = "windows",
                target_os = "linux"
            )),
        }
    }

    /// Disable native OS storage and use in-memory fallback only.
    ///
    /// **Warning**: This is NOT secure and should only be used for testing.
    pub fn with_fallback_only(mut self) -> Self {
        self.use_native = false;
        self
    }

    /// Get the default keychain service.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Check if using native OS storage.
    pub fn uses_native(&self) -> bool {
        self.use_native
    }

    fn service_for<'a>(&'a self, options: &'a ItemOptions) -> &'a str {
        options.keychain_service.as_deref().unwrap_or(&self.service)
    }

    fn check(&self, key: &str, options: &ItemOptions) -> BackendResult<()> {
        validate_key(key)?;
        if options.require_authentication {
            return Err(BackendError::unsupported(
                "authentication-protected items in desktop secure storage",
            ));
        }
        Ok(())
    }

    // ========================================================================
    // macOS Keychain implementation
    // ========================================================================

    #[cfg(target_os = "macos")]
    fn get_native(service: &str, key: &str) -> BackendResult<Option<String>> {
        use security_framework::passwords::get_generic_password;

        // errSecItemNotFound
        const NOT_FOUND: i32 = -25300;

        match get_generic_password(service, key) {
            Ok(data) => decode_utf8(key, data).map(Some),
            Err(e) if e.code() == NOT_FOUND => Ok(None),
            Err(e) => Err(BackendError::with_key(
                BackendErrorCode::DecryptionFailed,
                format!("macOS Keychain read failed: {}", e),
                key,
            )),
        }
    }

    #[cfg(target_os = "macos")]
    fn set_native(service: &str, key: &str, value: &str) -> BackendResult<()> {
        use security_framework::passwords::{delete_generic_password, set_generic_password};

        // Delete existing entry if present (ignore errors)
        let _ = delete_generic_password(service, key);

        set_generic_password(service, key, value.as_bytes()).map_err(|e| {
            BackendError::with_key(
                BackendErrorCode::EncryptionFailed,
                format!("macOS Keychain write failed: {}", e),
                key,
            )
        })
    }

    #[cfg(target_os = "macos")]
    fn delete_native(service: &str, key: &str) -> BackendResult<()> {
        use security_framework::passwords::delete_generic_password;

        const NOT_FOUND: i32 = -25300;

        match delete_generic_password(service, key) {
            Ok(()) => Ok(()),
            Err(e) if e.code() == NOT_FOUND => Ok(()),
            Err(e) => Err(BackendError::with_key(
                BackendErrorCode::Internal,
                format!("macOS Keychain delete failed: {}", e),
                key,
            )),
        }
    }

    // ========================================================================
    // Windows Credential Manager implementation
    // ========================================================================

    #[cfg(target_os = "windows")]
    fn target_name(service: &str, key: &str) -> Vec<u16> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;

        OsStr::new(&format!("{}.{}", service, key))
            .encode_wide()
            .chain(std::iter::once(0))
            .collect()
    }

    #[cfg(target_os = "windows")]
    fn get_native(service: &str, key: &str) -> BackendResult<Option<String>> {
        use windows::core::PCWSTR;
        use windows::Win32::Security::Credentials::{CredFree, CredReadW, CRED_TYPE_GENERIC};

        // ERROR_NOT_FOUND
        const NOT_FOUND: u32 = 1168;

        let target_name = Self::target_name(service, key);

        unsafe {
            let mut credential_ptr = std::ptr::null_mut();
            match CredReadW(
                PCWSTR(target_name.as_ptr()),
                CRED_TYPE_GENERIC,
                0,
                &mut credential_ptr,
            ) {
                Ok(()) => {
                    let credential = &*credential_ptr;
                    let data = std::slice::from_raw_parts(
                        credential.CredentialBlob,
                        credential.CredentialBlobSize as usize,
                    )
                    .to_vec();
                    CredFree(credential_ptr as *const std::ffi::c_void);
                    decode_utf8(key, data).map(Some)
                }
                Err(e) if (e.code().0 as u32 & 0xFFFF) == NOT_FOUND => Ok(None),
                Err(e) => Err(BackendError::with_key(
                    BackendErrorCode::DecryptionFailed,
                    format!("Windows Credential Manager read failed: {}", e),
                    key,
                )),
            }
        }
    }

    #[cfg(target_os = "windows")]
    fn set_native(service: &str, key: &str, value: &str) -> BackendResult<()> {
        use windows::core::PWSTR;
        use windows::Win32::Security::Credentials::{
            CredWriteW, CREDENTIALW, CRED_PERSIST_LOCAL_MACHINE, CRED_TYPE_GENERIC,
        };

        let target_name = Self::target_name(service, key);
        let data = value.as_bytes();

        let credential = CREDENTIALW {
            Flags: Default::default(),
            Type: CRED_TYPE_GENERIC,
            TargetName: PWSTR(target_name.as_ptr() as *mut u16),
            Comment: PWSTR::null(),
            LastWritten: Default::default(),
            CredentialBlobSize: data.len() as u32,
            CredentialBlob: data.as_ptr() as *mut u8,
            Persist: CRED_PERSIST_LOCAL_MACHINE,
            AttributeCount: 0,
            Attributes: std::ptr::null_mut(),
            TargetAlias: PWSTR::null(),
            UserName: PWSTR::null(),
        };

        unsafe {
            CredWriteW(&credential, 0).map_err(|e| {
                BackendError::with_key(
                    BackendErrorCode::EncryptionFailed,
                    format!("Windows Credential Manager write failed: {}", e),
                    key,
                )
            })
        }
    }

    #[cfg(target_os = "windows")]
    fn delete_native(service: &str, key: &str) -> BackendResult<()> {
        use windows::core::PCWSTR;
        use windows::Win32::Security::Credentials::{CredDeleteW, CRED_TYPE_GENERIC};

        const NOT_FOUND: u32 = 1168;

        let target_name = Self::target_name(service, key);

        unsafe {
            match CredDeleteW(PCWSTR(target_name.as_ptr()), CRED_TYPE_GENERIC, 0) {
                Ok(()) => Ok(()),
                Err(e) if (e.code().0 as u32 & 0xFFFF) == NOT_FOUND => Ok(()),
                Err(e) => Err(BackendError::with_key(
                    BackendErrorCode::Internal,
                    format!("Windows Credential Manager delete failed: {}", e),
                    key,
                )),
            }
        }
    }

    // ========================================================================
    // Linux Secret Service implementation
    // ========================================================================

    #[cfg(target_os = "linux")]
    fn get_native(service: &str, key: &str) -> BackendResult<Option<String>> {
        off_runtime(|| Self::get_native_blocking(service, key))
    }

    #[cfg(target_os = "linux")]
    fn set_native(service: &str, key: &str, value: &str) -> BackendResult<()> {
        off_runtime(|| Self::set_native_blocking(service, key, value))
    }

    #[cfg(target_os = "linux")]
    fn delete_native(service: &str, key: &str) -> BackendResult<()> {
        off_runtime(|| Self::delete_native_blocking(service, key))
    }

    #[cfg(target_os = "linux")]
    fn get_native_blocking(service: &str, key: &str) -> BackendResult<Option<String>> {
        use secret_service::blocking::SecretService;
        use secret_service::EncryptionType;

        let ss = SecretService::connect(EncryptionType::Dh).map_err(connect_error)?;
        let collection = ss.get_default_collection().map_err(collection_error)?;

        let items = collection
            .search_items(secret_attributes(service, key))
            .map_err(search_error)?;
        let Some(item) = items.first() else {
            return Ok(None);
        };

        if item.is_locked().unwrap_or(true) {
            item.unlock().map_err(|e| {
                BackendError::access_denied(format!("Failed to unlock item: {}", e))
            })?;
        }

        let secret = item.get_secret().map_err(|e| {
            BackendError::with_key(
                BackendErrorCode::DecryptionFailed,
                format!("Failed to read secret: {}", e),
                key,
            )
        })?;
        decode_utf8(key, secret).map(Some)
    }

    #[cfg(target_os = "linux")]
    fn set_native_blocking(service: &str, key: &str, value: &str) -> BackendResult<()> {
        use secret_service::blocking::SecretService;
        use secret_service::EncryptionType;

        let ss = SecretService::connect(EncryptionType::Dh).map_err(connect_error)?;
        let collection = ss.get_default_collection().map_err(collection_error)?;

        if collection.is_locked().unwrap_or(true) {
            collection.unlock().map_err(|e| {
                BackendError::access_denied(format!("Failed to unlock collection: {}", e))
            })?;
        }

        collection
            .create_item(
                &format!("{}.{}", service, key),
                secret_attributes(service, key),
                value.as_bytes(),
                true, // replace if exists
                "text/plain",
            )
            .map_err(|e| {
                BackendError::with_key(
                    BackendErrorCode::EncryptionFailed,
                    format!("Failed to store secret: {}", e),
                    key,
                )
            })?;

        Ok(())
    }

    #[cfg(target_os = "linux")]
    fn delete_native_blocking(service: &str, key: &str) -> BackendResult<()> {
        use secret_service::blocking::SecretService;
        use secret_service::EncryptionType;

        let ss = SecretService::connect(EncryptionType::Dh).map_err(connect_error)?;
        let collection = ss.get_default_collection().map_err(collection_error)?;

        let items = collection
            .search_items(secret_attributes(service, key))
            .map_err(search_error)?;
        for item in items {
            item.delete().map_err(|e| {
                BackendError::with_key(
                    BackendErrorCode::Internal,
                    format!("Failed to delete secret: {}", e),
                    key,
                )
            })?;
        }

        Ok(())
    }

    #[cfg(target_os = "linux")]
    async fn get_native_async(service: &str, key: &str) -> BackendResult<Option<String>> {
        use secret_service::{EncryptionType, SecretService};

        let ss = SecretService::connect(EncryptionType::Dh)
            .await
            .map_err(connect_error)?;
        let collection = ss.get_default_collection().await.map_err(collection_error)?;

        let items = collection
            .search_items(secret_attributes(service, key))
            .await
            .map_err(search_error)?;
        let Some(item) = items.first() else {
            return Ok(None);
        };

        if item.is_locked().await.unwrap_or(true) {
            item.unlock().await.map_err(|e| {
                BackendError::access_denied(format!("Failed to unlock item: {}", e))
            })?;
        }

        let secret = item.get_secret().await.map_err(|e| {
            BackendError::with_key(
                BackendErrorCode::DecryptionFailed,
                format!("Failed to read secret: {}", e),
                key,
            )
        })?;
        decode_utf8(key, secret).map(Some)
    }

    #[cfg(target_os = "linux")]
    async fn set_native_async(service: &str, key: &str, value: &str) -> BackendResult<()> {
        use secret_service::{EncryptionType, SecretService};

        let ss = SecretService::connect(EncryptionType::Dh)
            .await
            .map_err(connect_error)?;
        let collection = ss.get_default_collection().await.map_err(collection_error)?;

        if collection.is_locked().await.unwrap_or(true) {
            collection.unlock().await.map_err(|e| {
                BackendError::access_denied(format!("Failed to unlock collection: {}", e))
            })?;
        }

        collection
            .create_item(
                &format!("{}.{}", service, key),
                secret_attributes(service, key),
                value.as_bytes(),
                true, // replace if exists
                "text/plain",
            )
            .await
            .map_err(|e| {
                BackendError::with_key(
                    BackendErrorCode::EncryptionFailed,
                    format!("Failed to store secret: {}", e),
                    key,
                )
            })?;

        Ok(())
    }

    #[cfg(target_os = "linux")]
    async fn delete_native_async(service: &str, key: &str) -> BackendResult<()> {
        use secret_service::{EncryptionType, SecretService};

        let ss = SecretService::connect(EncryptionType::Dh)
            .await
            .map_err(connect_error)?;
        let collection = ss.get_default_collection().await.map_err(collection_error)?;

        let items = collection
            .search_items(secret_attributes(service, key))
            .await
            .map_err(search_error)?;
        for item in items {
            item.delete().await.map_err(|e| {
                BackendError::with_key(
                    BackendErrorCode::Internal,
                    format!("Failed to delete secret: {}", e),
                    key,
                )
            })?;
        }

        Ok(())
    }

    // macOS and Windows calls are synchronous already.
    #[cfg(not(target_os = "linux"))]
    async fn get_native_async(service: &str, key: &str) -> BackendResult<Option<String>> {
        Self::get_native(service, key)
    }

    #[cfg(not(target_os = "linux"))]
    async fn set_native_async(service: &str, key: &str, value: &str) -> BackendResult<()> {
        Self::set_native(service, key, value)
    }

    #[cfg(not(target_os = "linux"))]
    async fn delete_native_async(service: &str, key: &str) -> BackendResult<()> {
        Self::delete_native(service, key)
    }

    // ========================================================================
    // Unsupported platforms
    // ========================================================================

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    fn get_native(_service: &str, _key: &str) -> BackendResult<Option<String>> {
        Err(BackendError::unsupported("native secure storage"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    fn set_native(_service: &str, _key: &str, _value: &str) -> BackendResult<()> {
        Err(BackendError::unsupported("native secure storage"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    fn delete_native(_service: &str, _key: &str) -> BackendResult<()> {
        Err(BackendError::unsupported("native secure storage"))
    }

    // ========================================================================
    // Fallback implementation (for unsupported platforms or testing)
    // ========================================================================

    fn fallback_key(service: &str, key: &str) -> String {
        format!("{}.{}", service, key)
    }

    fn get_fallback(&self, service: &str, key: &str) -> BackendResult<Option<String>> {
        let storage = self.fallback_storage.read().map_err(|_| {
            BackendError::new(BackendErrorCode::Internal, "Lock poisoned during get_fallback")
        })?;
        Ok(storage.get(&Self::fallback_key(service, key)).cloned())
    }

    /// Store using fallback in-memory storage.
    ///
    /// **Warning**: This is NOT secure and should only be used for testing.
    fn set_fallback(&self, service: &str, key: &str, value: &str) -> BackendResult<()> {
        let mut storage = self.fallback_storage.write().map_err(|_| {
            BackendError::new(BackendErrorCode::Internal, "Lock poisoned during set_fallback")
        })?;
        storage.insert(Self::fallback_key(service, key), value.to_string());
        Ok(())
    }

    fn delete_fallback(&self, service: &str, key: &str) -> BackendResult<()> {
        let mut storage = self.fallback_storage.write().map_err(|_| {
            BackendError::new(
                BackendErrorCode::Internal,
                "Lock poisoned during delete_fallback",
            )
        })?;
        storage.remove(&Self::fallback_key(service, key));
        Ok(())
    }

    // ========================================================================
    // Resolution shared by the sync and async paths
    // ========================================================================
    //
    // `native` is None when native storage is not in use. Native results are
    // final: errors propagate and the fallback map is never consulted.

    fn resolve_get(
        &self,
        service: &str,
        key: &str,
        native: Option<BackendResult<Option<String>>>,
    ) -> BackendResult<Option<String>> {
        match native {
            Some(Err(e)) => {
                tracing::debug!(key, error = %e, "native read failed");
                Err(e)
            }
            Some(found) => found,
            None => self.get_fallback(service, key),
        }
    }

    fn resolve_set(
        &self,
        service: &str,
        key: &str,
        value: &str,
        native: Option<BackendResult<()>>,
    ) -> BackendResult<()> {
        match native {
            Some(Err(e)) => {
                tracing::debug!(key, error = %e, "native write failed");
                Err(e)
            }
            Some(Ok(())) => Ok(()),
            None => self.set_fallback(service, key, value),
        }
    }

    fn resolve_delete(
        &self,
        service: &str,
        key: &str,
        native: Option<BackendResult<()>>,
    ) -> BackendResult<()> {
        match native {
            Some(Err(e)) => {
                tracing::debug!(key, error = %e, "native delete failed");
                Err(e)
            }
            Some(Ok(())) => Ok(()),
            None => self.delete_fallback(service, key),
        }
    }
}

impl SecureStoreBackend for PlatformBackend {
    fn get_item(&self, key: &str, options: &ItemOptions) -> BackendResult<Option<String>> {
        self.check(key, options)?;
        let service = self.service_for(options);
        let native = self.use_native.then(|| Self::get_native(service, key));
        self.resolve_get(service, key, native)
    }

    fn set_item(&self, key: &str, value: &str, options: &ItemOptions) -> BackendResult<()> {
        self.check(key, options)?;
        let service = self.service_for(options);
        let native = self.use_native.then(|| Self::set_native(service, key, value));
        self.resolve_set(service, key, value, native)
    }

    fn delete_item(&self, key: &str, options: &ItemOptions) -> BackendResult<()> {
        self.check(key, options)?;
        let service = self.service_for(options);
        let native = self.use_native.then(|| Self::delete_native(service, key));
        self.resolve_delete(service, key, native)
    }

    fn can_use_biometric_authentication(&self) -> bool {
        false
    }

    async fn is_available() -> bool {
        #[cfg(target_os = "linux")]
        {
            use secret_service::{EncryptionType, SecretService};
            SecretService::connect(EncryptionType::Dh).await.is_ok()
        }

        #[cfg(any(target_os = "macos", target_os = "windows"))]
        {
            true
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            false
        }
    }

    async fn get_item_async(
        &self,
        key: &str,
        options: &ItemOptions,
    ) -> BackendResult<Option<String>> {
        self.check(key, options)?;
        let service = self.service_for(options);
        let native = if self.use_native {
            Some(Self::get_native_async(service, key).await)
        } else {
            None
        };
        self.resolve_get(service, key, native)
    }

    async fn set_item_async(
        &self,
        key: &str,
        value: &str,
        options: &ItemOptions,
    ) -> BackendResult<()> {
        self.check(key, options)?;
        let service = self.service_for(options);
        let native = if self.use_native {
            Some(Self::set_native_async(service, key, value).await)
        } else {
            None
        };
        self.resolve_set(service, key, value, native)
    }

    async fn delete_item_async(&self, key: &str, options: &ItemOptions) -> BackendResult<()> {
        self.check(key, options)?;
        let service = self.service_for(options);
        let native = if self.use_native {
            Some(Self::delete_native_async(service, key).await)
        } else {
            None
        };
        self.resolve_delete(service, key, native)
    }
}

#[cfg(any(target_os = "macos", target_os = "windows", target_os = "linux"))]
fn decode_utf8(key: &str, data: Vec<u8>) -> BackendResult<String> {
    String::from_utf8(data).map_err(|_| {
        BackendError::with_key(
            BackendErrorCode::DecryptionFailed,
            "Stored item is not valid UTF-8",
            key,
        )
    })
}

/// Run a blocking Secret Service call outside any Tokio context.
///
/// `zbus` blocks on a private runtime, which panics when nested in another.
#[cfg(target_os = "linux")]
fn off_runtime<T, F>(call: F) -> BackendResult<T>
where
    T: Send,
    F: FnOnce() -> BackendResult<T> + Send,
{
    if tokio::runtime::Handle::try_current().is_err() {
        return call();
    }
    std::thread::scope(|scope| match scope.spawn(call).join() {
        Ok(result) => result,
        Err(_) => Err(BackendError::new(
            BackendErrorCode::Internal,
            "Secret Service worker thread panicked",
        )),
    })
}

#[cfg(target_os = "linux")]
fn secret_attributes<'a>(service: &'a str, key: &'a str) -> HashMap<&'a str, &'a str> {
    let mut attributes = HashMap::new();
    attributes.insert("application", service);
    attributes.insert("key_id", key);
    attributes
}

#[cfg(target_os = "linux")]
fn connect_error(e: secret_service::Error) -> BackendError {
    BackendError::new(
        BackendErrorCode::Internal,
        format!("Secret Service connection failed: {}", e),
    )
}

#[cfg(target_os = "linux")]
fn collection_error(e: secret_service::Error) -> BackendError {
    BackendError::new(
        BackendErrorCode::StorageLocked,
        format!("Failed to get default collection: {}", e),
    )
}

#[cfg(target_os = "linux")]
fn search_error(e: secret_service::Error) -> BackendError {
    BackendError::new(
        BackendErrorCode::Internal,
        format!("Failed to search secrets: {}", e),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_backend_creation() {
        let backend = PlatformBackend::new("com.example.app");
        assert_eq!(backend.service(), "com.example.app");
        assert_eq!(
            backend.uses_native(),
            cfg!(any(
                target_os = "macos",
                target_os = "windows",
                target_os = "linux"
            ))
        );
        assert!(!backend.can_use_biometric_authentication());
    }

    #[tokio::test]
    async fn test_fallback_storage() {
        let backend = PlatformBackend::new("test").with_fallback_only();
        let opts = ItemOptions::default();
        assert!(!backend.uses_native());

        backend.set_item("key1", "data1", &opts).unwrap();
        assert_eq!(backend.get_item("key1", &opts).unwrap(), Some("data1".into()));
        assert_eq!(
            backend.get_item_async("key1", &opts).await.unwrap(),
            Some("data1".into())
        );

        backend.delete_item_async("key1", &opts).await.unwrap();
        assert!(!backend.has_item("key1", &opts).unwrap());

        // Missing items delete cleanly
        backend.delete_item("key1", &opts).unwrap();
    }

    #[test]
    fn test_keychain_service_override() {
        let backend = PlatformBackend::new("default").with_fallback_only();
        let shared = ItemOptions::new().with_keychain_service("shared");

        backend.set_item("token", "a", &shared).unwrap();

        assert_eq!(backend.get_item("token", &shared).unwrap(), Some("a".into()));
        assert_eq!(backend.get_item("token", &ItemOptions::default()).unwrap(), None);
    }

    #[test]
    fn test_authentication_rejected() {
        let backend = PlatformBackend::new("test").with_fallback_only();

        let err = backend
            .set_item("token", "v", &ItemOptions::new().require_authentication())
            .unwrap_err();
        assert_eq!(err.code, BackendErrorCode::Unsupported);
    }

    #[test]
    fn test_native_read_failure_propagates() {
        let backend = PlatformBackend::new("test");
        backend.set_fallback("test", "k", "stale").unwrap();

        let err = backend
            .resolve_get("test", "k", Some(Err(BackendError::access_denied("locked"))))
            .unwrap_err();
        assert_eq!(err.code, BackendErrorCode::AccessDenied);

        // A native miss is final too.
        assert_eq!(backend.resolve_get("test", "k", Some(Ok(None))).unwrap(), None);
    }

    #[test]
    fn test_native_write_failure_propagates() {
        let backend = PlatformBackend::new("test");

        let err = backend
            .resolve_set(
                "test",
                "k",
                "secret",
                Some(Err(BackendError::new(BackendErrorCode::EncryptionFailed, "denied"))),
            )
            .unwrap_err();
        assert_eq!(err.code, BackendErrorCode::EncryptionFailed);
        assert_eq!(backend.get_fallback("test", "k").unwrap(), None);

        backend.resolve_set("test", "k", "secret", Some(Ok(()))).unwrap();
        assert_eq!(backend.get_fallback("test", "k").unwrap(), None);
    }

    #[test]
    fn test_native_delete_failure_propagates() {
        let backend = PlatformBackend::new("test");

        let err = backend
            .resolve_delete(
                "test",
                "k",
                Some(Err(BackendError::new(BackendErrorCode::StorageLocked, "locked"))),
            )
            .unwrap_err();
        assert_eq!(err.code, BackendErrorCode::StorageLocked);
        assert!(backend.resolve_delete("test", "k", Some(Ok(()))).is_ok());
    }

    #[test]
    fn test_fallback_used_without_native() {
        let backend = PlatformBackend::new("test");

        backend.resolve_set("test", "k", "v", None).unwrap();
        assert_eq!(backend.resolve_get("test", "k", None).unwrap(), Some("v".into()));
        backend.resolve_delete("test", "k", None).unwrap();
        assert_eq!(backend.get_fallback("test", "k").unwrap(), None);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_native_sync_calls_inside_runtime() {
        // Either outcome is fine; the blocking Secret Service client must not
        // be started on this runtime's thread.
        let backend = PlatformBackend::new("com.example.securestore-tests");
        let opts = ItemOptions::default();

        let _ = backend.has_item("never-written", &opts);
        let _ = backend.get_item("never-written", &opts);
        let _ = backend.delete_item("never-written", &opts);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_native_sync_calls_outside_runtime() {
        let backend = PlatformBackend::new("com.example.securestore-tests");
        let _ = backend.has_item("never-written", &ItemOptions::default());
    }

    #[test]
    fn test_fallback_key() {
        assert_eq!(
            PlatformBackend::fallback_key("com.example.app", "my-key"),
            "com.example.app.my-key"
        );
    }
}
