//! Set command - store a value, optionally with an expiration

use anyhow::{Context, Result};
use securestore_lib::backend::PlatformBackend;
use securestore_lib::SecureStore;
use serde_json::Value;
use std::time::Duration;

use crate::ui;

pub async fn run(
    store: &SecureStore<PlatformBackend>,
    key: &str,
    raw: &str,
    json: bool,
    ttl_ms: Option<u64>,
    wait: bool,
) -> Result<()> {
    let value = if json {
        serde_json::from_str(raw).context("VALUE is not valid JSON")?
    } else {
        Value::String(raw.to_string())
    };

    let Some(ttl_ms) = ttl_ms else {
        store
            .set_async(key, &value)
            .await
            .with_context(|| format!("Failed to store '{}'", key))?;
        ui::success(&format!("Stored '{}'", store.namespaced_key(key)));
        return Ok(());
    };

    let handle = store
        .set_with_expiration(key, &value, Duration::from_millis(ttl_ms))
        .with_context(|| format!("Failed to store '{}'", key))?;
    ui::success(&format!(
        "Stored '{}' until {}",
        handle.key(),
        handle.deadline().to_rfc3339()
    ));

    if !wait {
        ui::info("The expiration only runs while this process is alive");
        return Ok(());
    }

    let spinner = ui::spinner("Waiting for expiration...")?;
    let expired = handle.expired().await;
    spinner.finish_and_clear();

    if expired && !store.exists_async(key).await? {
        ui::success(&format!("'{}' expired", store.namespaced_key(key)));
    } else {
        ui::error(&format!("'{}' is still present", store.namespaced_key(key)));
    }

    Ok(())
}
