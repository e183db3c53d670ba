//! The namespaced, validated store.
//!
//! [`SecureStore`] composes a [`SecureStoreBackend`] with key namespacing,
//! the string [`codec`](crate::codec) and read-time [`Schema`] validation.
//!
//! # Example
//!
//! ```
//! use securestore_lib::backend::InMemoryBackend;
//! use securestore_lib::schema::{Coerced, Typed};
//! use securestore_lib::SecureStore;
//!
//! # fn main() -> securestore_lib::Result<()> {
//! let store = SecureStore::new(InMemoryBackend::new()).with_namespace("prefs");
//!
//! store.set("theme", "dark")?;
//! store.set("font_size", &14)?;
//!
//! assert_eq!(store.get("theme", String::new(), Typed::<String>::new())?, "dark");
//! assert_eq!(store.get("font_size", 12u8, Coerced::<u8>::new())?, 14);
//! // Missing keys and values of the wrong shape both yield the fallback.
//! assert_eq!(store.get("missing", 12u8, Coerced::<u8>::new())?, 12);
//! assert_eq!(store.get("theme", 12u8, Coerced::<u8>::new())?, 12);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::backend::{ItemOptions, SecureStoreBackend};
use crate::codec;
use crate::config::{StoreConfig, DEFAULT_SEPARATOR};
use crate::errors::StoreError;
use crate::expiry::{self, ExpiryHandle};
use crate::schema::Schema;
use crate::Result;

/// Namespaced key/value store over a secure storage backend.
///
/// Every logical key is stored as `namespace<separator>key` (or bare `key`
/// without a namespace). Values are written as strings and validated against
/// a caller-supplied schema on the way out; anything missing or invalid reads
/// as the caller's fallback.
///
/// The namespace can be changed through a shared reference. Entries written
/// under the old namespace stay where they are and are no longer reachable
/// through this store.
pub struct SecureStore<B> {
    backend: Arc<B>,
    namespace: RwLock<Option<String>>,
    separator: String,
    item_options: ItemOptions,
}

impl<B> fmt::Debug for SecureStore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureStore")
            .field("namespace", &self.namespace())
            .field("separator", &self.separator)
            .field("item_options", &self.item_options)
            .finish_non_exhaustive()
    }
}

impl<B> SecureStore<B> {
    /// Get the current namespace.
    pub fn namespace(&self) -> Option<String> {
        self.namespace
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Set the namespace.
    ///
    /// Accepts anything serializable and succeeds only when it serializes
    /// to a string. Otherwise the namespace is left unchanged and `false`
    /// is returned.
    pub fn set_namespace<N: Serialize>(&self, namespace: N) -> bool {
        match serde_json::to_value(&namespace) {
            Ok(Value::String(ns)) => {
                *self.namespace.write().unwrap_or_else(PoisonError::into_inner) = Some(ns);
                true
            }
            _ => {
                tracing::debug!("rejected non-string namespace");
                false
            }
        }
    }

    /// The key actually used in the backend for a logical key.
    ///
    /// An empty namespace counts as no namespace.
    pub fn namespaced_key(&self, key: &str) -> String {
        match self.namespace() {
            Some(ns) if !ns.is_empty() => format!("{}{}{}", ns, self.separator, key),
            _ => key.to_string(),
        }
    }

    /// The backend this store writes to.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Options passed to the backend on every call.
    pub fn item_options(&self) -> &ItemOptions {
        &self.item_options
    }

    /// Set the namespace at construction.
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        *self.namespace.write().unwrap_or_else(PoisonError::into_inner) = Some(namespace.into());
        self
    }

    /// Set the namespace separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the backend options used on every call.
    pub fn with_item_options(mut self, options: ItemOptions) -> Self {
        self.item_options = options;
        self
    }
}

impl<B: SecureStoreBackend> SecureStore<B> {
    /// Create an un-namespaced store owning `backend`.
    pub fn new(backend: B) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    /// Create an un-namespaced store over a backend shared with other stores.
    pub fn from_shared(backend: Arc<B>) -> Self {
        Self {
            backend,
            namespace: RwLock::new(None),
            separator: DEFAULT_SEPARATOR.to_string(),
            item_options: ItemOptions::default(),
        }
    }

    /// Create a store with namespace, separator and options from `config`.
    pub fn from_config(backend: B, config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let store = Self::new(backend)
            .with_separator(config.separator.clone())
            .with_item_options(config.item_options.clone());
        Ok(match &config.namespace {
            Some(ns) => store.with_namespace(ns.clone()),
            None => store,
        })
    }

    /// Write `value` under `key`.
    ///
    /// Strings, numbers and booleans are stored as their text; anything else
    /// as JSON. Returns `true` once the backend has accepted the write.
    #[tracing::instrument(level = "debug", skip_all, fields(key = %key))]
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<bool> {
        let encoded = codec::encode(value)?;
        self.backend
            .set_item(&self.namespaced_key(key), &encoded, &self.item_options)?;
        Ok(true)
    }

    /// Async version of [`set`](Self::set).
    #[tracing::instrument(level = "debug", skip_all, fields(key = %key))]
    pub async fn set_async<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<bool> {
        let encoded = codec::encode(value)?;
        self.backend
            .set_item_async(&self.namespaced_key(key), &encoded, &self.item_options)
            .await?;
        Ok(true)
    }

    /// Write `value` under `key` and delete it again after `ttl`.
    ///
    /// The deletion runs on the current Tokio runtime and is lost if the
    /// process exits first. Reads never check the deadline, and a later write
    /// to the same key is still deleted at the original deadline.
    ///
    /// # Errors
    /// - [`StoreError::NoRuntime`] outside a Tokio runtime (nothing is written)
    /// - Backend and serialization errors from the write
    #[tracing::instrument(level = "debug", skip_all, fields(key = %key, ttl_ms = ttl.as_millis() as u64))]
    pub fn set_with_expiration<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<ExpiryHandle>
    where
        B: 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| StoreError::NoRuntime)?;
        let storage_key = self.namespaced_key(key);
        let encoded = codec::encode(value)?;
        self.backend
            .set_item(&storage_key, &encoded, &self.item_options)?;
        Ok(expiry::schedule_deletion(
            &runtime,
            Arc::clone(&self.backend),
            storage_key,
            self.item_options.clone(),
            ttl,
        ))
    }

    /// Read `key` and validate it against `schema`.
    ///
    /// Returns `fallback` if the key is absent or the stored value does not
    /// pass `schema`. Stored text that is not JSON is validated as a plain
    /// string.
    ///
    /// # Errors
    /// Only backend failures; validation failures never surface.
    #[tracing::instrument(level = "debug", skip_all, fields(key = %key))]
    pub fn get<S: Schema>(&self, key: &str, fallback: S::Output, schema: S) -> Result<S::Output> {
        let storage_key = self.namespaced_key(key);
        let stored = self.backend.get_item(&storage_key, &self.item_options)?;
        Ok(resolve(&storage_key, stored, fallback, &schema))
    }

    /// Async version of [`get`](Self::get).
    #[tracing::instrument(level = "debug", skip_all, fields(key = %key))]
    pub async fn get_async<S: Schema>(
        &self,
        key: &str,
        fallback: S::Output,
        schema: S,
    ) -> Result<S::Output> {
        let storage_key = self.namespaced_key(key);
        let stored = self
            .backend
            .get_item_async(&storage_key, &self.item_options)
            .await?;
        Ok(resolve(&storage_key, stored, fallback, &schema))
    }

    /// Check whether `key` is present.
    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self
            .backend
            .has_item(&self.namespaced_key(key), &self.item_options)?)
    }

    /// Async version of [`exists`](Self::exists).
    pub async fn exists_async(&self, key: &str) -> Result<bool> {
        Ok(self
            .backend
            .has_item_async(&self.namespaced_key(key), &self.item_options)
            .await?)
    }

    /// Delete `key`.
    ///
    /// Uses the store's options unless `options` is given. Returns `true` on
    /// success, including when the key did not exist, and `false` if the
    /// backend failed.
    #[tracing::instrument(level = "debug", skip_all, fields(key = %key))]
    pub async fn remove_async(&self, key: &str, options: Option<ItemOptions>) -> bool {
        let storage_key = self.namespaced_key(key);
        let options = options.unwrap_or_else(|| self.item_options.clone());
        match self.backend.delete_item_async(&storage_key, &options).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "failed to remove item");
                false
            }
        }
    }

    /// Whether the backend can protect items with biometrics on this device.
    pub fn can_use_biometric_authentication(&self) -> bool {
        self.backend.can_use_biometric_authentication()
    }

    /// Whether the backend type is usable on this device.
    pub async fn is_available_async() -> bool {
        B::is_available().await
    }
}

fn resolve<S: Schema>(
    storage_key: &str,
    stored: Option<String>,
    fallback: S::Output,
    schema: &S,
) -> S::Output {
    let Some(raw) = stored else {
        return fallback;
    };
    match schema.validate_stored(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(key = %storage_key, error = %e, "stored value rejected, using fallback");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendErrorCode, InMemoryBackend};
    use crate::schema::{AnyJson, Coerced, Typed};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        scopes: Vec<String>,
    }

    fn session() -> Session {
        Session {
            user: "ada".into(),
            scopes: vec!["read".into(), "write".into()],
        }
    }

    #[test]
    fn test_namespaced_key() {
        let store = SecureStore::new(InMemoryBackend::new());
        assert_eq!(store.namespaced_key("token"), "token");

        store.set_namespace("auth");
        assert_eq!(store.namespaced_key("token"), "auth:token");

        let dotted = SecureStore::new(InMemoryBackend::new())
            .with_namespace("auth")
            .with_separator(".");
        assert_eq!(dotted.namespaced_key("token"), "auth.token");
    }

    #[test]
    fn test_empty_namespace_is_bare() {
        let store = SecureStore::new(InMemoryBackend::new()).with_namespace("");
        assert_eq!(store.namespaced_key("token"), "token");
    }

    #[test]
    fn test_set_namespace_rejects_non_strings() {
        let store = SecureStore::new(InMemoryBackend::new()).with_namespace("a");

        assert!(!store.set_namespace(123));
        assert!(!store.set_namespace(json!({"ns": "b"})));
        assert!(!store.set_namespace(Option::<String>::None));
        assert_eq!(store.namespace().as_deref(), Some("a"));

        assert!(store.set_namespace(String::from("b")));
        assert_eq!(store.namespace().as_deref(), Some("b"));
    }

    #[test]
    fn test_primitives_stored_as_text() {
        let store = SecureStore::new(InMemoryBackend::new()).with_namespace("p");

        assert!(store.set("s", "hello").unwrap());
        assert!(store.set("n", &3.5).unwrap());
        assert!(store.set("b", &false).unwrap());

        let backend = store.backend();
        assert_eq!(backend.raw_get("p:s").as_deref(), Some("hello"));
        assert_eq!(backend.raw_get("p:n").as_deref(), Some("3.5"));
        assert_eq!(backend.raw_get("p:b").as_deref(), Some("false"));
    }

    #[test]
    fn test_structured_round_trip() {
        let store = SecureStore::new(InMemoryBackend::new());

        store.set("session", &session()).unwrap();

        let fallback = Session {
            user: String::new(),
            scopes: vec![],
        };
        assert_eq!(
            store.get("session", fallback, Typed::<Session>::new()).unwrap(),
            session()
        );
    }

    #[test]
    fn test_get_missing_returns_fallback() {
        let store = SecureStore::new(InMemoryBackend::new());
        assert_eq!(
            store.get("missing", "fb".to_string(), Typed::<String>::new()).unwrap(),
            "fb"
        );
    }

    #[test]
    fn test_get_invalid_returns_fallback() {
        let store = SecureStore::new(InMemoryBackend::new());
        store.set("session", &json!({"user": 1})).unwrap();

        let fallback = session();
        assert_eq!(
            store
                .get("session", fallback.clone(), Typed::<Session>::new())
                .unwrap(),
            fallback
        );
    }

    #[test]
    fn test_raw_text_validated_as_string() {
        let store = SecureStore::new(InMemoryBackend::new());
        store.set("greeting", "not { json").unwrap();

        assert_eq!(
            store.get("greeting", json!(null), AnyJson).unwrap(),
            json!("not { json")
        );
    }

    #[test]
    fn test_numeric_string_needs_coercion() {
        let store = SecureStore::new(InMemoryBackend::new());
        store.set("pin", "1234").unwrap();

        assert_eq!(
            store.get("pin", String::new(), Typed::<String>::new()).unwrap(),
            ""
        );
        assert_eq!(
            store.get("pin", String::new(), Coerced::<String>::new()).unwrap(),
            "1234"
        );
    }

    #[test]
    fn test_numeric_looking_strings_read_back_verbatim() {
        let store = SecureStore::new(InMemoryBackend::new());
        store.set("amount", "1.50").unwrap();
        store.set("scale", "1e5").unwrap();

        assert_eq!(
            store.get("amount", String::new(), Coerced::<String>::new()).unwrap(),
            "1.50"
        );
        assert_eq!(
            store.get("scale", String::new(), Coerced::<String>::new()).unwrap(),
            "1e5"
        );
        assert_eq!(store.get("scale", 0.0, Coerced::<f64>::new()).unwrap(), 100000.0);
    }

    #[tokio::test]
    async fn test_async_variants() {
        let store = SecureStore::new(InMemoryBackend::new()).with_namespace("a");

        assert!(store.set_async("count", &7).await.unwrap());
        assert!(store.exists_async("count").await.unwrap());
        assert_eq!(
            store.get_async("count", 0u32, Coerced::<u32>::new()).await.unwrap(),
            7
        );
        assert!(store.remove_async("count", None).await);
        assert!(!store.exists("count").unwrap());
    }

    #[tokio::test]
    async fn test_remove_missing_is_true() {
        let store = SecureStore::new(InMemoryBackend::new());
        assert!(store.remove_async("never-written", None).await);
    }

    #[tokio::test]
    async fn test_remove_reports_backend_failure() {
        let store = SecureStore::new(InMemoryBackend::new());
        store.set("token", "t").unwrap();

        store.backend().fail_with(BackendErrorCode::StorageLocked);
        assert!(!store.remove_async("token", None).await);

        store.backend().clear_failure();
        assert!(store.exists("token").unwrap());
    }

    #[test]
    fn test_backend_failures_propagate() {
        let store = SecureStore::new(InMemoryBackend::new());
        store.backend().fail_with(BackendErrorCode::AccessDenied);

        let err = store.set("token", "t").unwrap_err();
        assert_eq!(err.backend_code(), Some(BackendErrorCode::AccessDenied));

        let err = store
            .get("token", String::new(), Typed::<String>::new())
            .unwrap_err();
        assert_eq!(err.backend_code(), Some(BackendErrorCode::AccessDenied));

        assert!(store.exists("token").is_err());
    }

    #[test]
    fn test_serialization_error_propagates() {
        let store = SecureStore::new(InMemoryBackend::new());
        let mut map = std::collections::HashMap::new();
        map.insert(vec![1u8], "non-string key");

        assert!(matches!(
            store.set("map", &map).unwrap_err(),
            StoreError::Serialization(_)
        ));
        assert!(store.backend().is_empty());
    }

    #[tokio::test]
    async fn test_remove_with_explicit_options() {
        let backend = InMemoryBackend::new().with_biometrics(true);
        let store = SecureStore::new(backend)
            .with_item_options(ItemOptions::new().require_authentication());
        store.set("token", "t").unwrap();

        assert!(
            store
                .remove_async("token", Some(ItemOptions::default()))
                .await
        );
        assert!(!store.exists("token").unwrap());
    }

    #[test]
    fn test_from_config() {
        let config = StoreConfig::new("app")
            .with_namespace("cfg")
            .with_separator("-");
        let store = SecureStore::from_config(InMemoryBackend::new(), &config).unwrap();

        store.set("k", "v").unwrap();
        assert_eq!(store.backend().raw_get("cfg-k").as_deref(), Some("v"));
    }

    #[test]
    fn test_from_config_rejects_bad_namespace() {
        let config = StoreConfig::new("app").with_namespace("my app");
        let err = SecureStore::from_config(InMemoryBackend::new(), &config).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_set_with_expiration_requires_runtime() {
        let store = SecureStore::new(InMemoryBackend::new());

        let err = store
            .set_with_expiration("otp", "123456", Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, StoreError::NoRuntime));
        assert!(store.backend().is_empty());
    }

    #[tokio::test]
    async fn test_set_with_expiration() {
        let store = SecureStore::new(InMemoryBackend::new()).with_namespace("otp");

        let handle = store
            .set_with_expiration("code", "123456", Duration::from_millis(50))
            .unwrap();
        assert_eq!(handle.key(), "otp:code");
        assert!(store.exists_async("code").await.unwrap());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!store.exists_async("code").await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_does_not_cancel_expiration() {
        let store = SecureStore::new(InMemoryBackend::new());

        let handle = store
            .set_with_expiration("code", "first", Duration::from_millis(30))
            .unwrap();
        store.set("code", "second").unwrap();

        assert!(handle.expired().await);
        assert!(!store.exists("code").unwrap());
    }

    #[tokio::test]
    async fn test_expiration_survives_namespace_change() {
        let store = SecureStore::new(InMemoryBackend::new()).with_namespace("a");

        let handle = store
            .set_with_expiration("code", "v", Duration::from_millis(20))
            .unwrap();
        store.set_namespace("b");

        assert!(handle.expired().await);
        assert!(store.backend().raw_get("a:code").is_none());
    }

    #[test]
    fn test_biometric_passthrough() {
        let plain = SecureStore::new(InMemoryBackend::new());
        assert!(!plain.can_use_biometric_authentication());

        let biometric = SecureStore::new(InMemoryBackend::new().with_biometrics(true));
        assert!(biometric.can_use_biometric_authentication());
    }

    #[tokio::test]
    async fn test_is_available() {
        assert!(SecureStore::<InMemoryBackend>::is_available_async().await);
    }
}
