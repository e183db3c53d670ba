//! Remove command - delete a key

use anyhow::{bail, Result};
use securestore_lib::backend::PlatformBackend;
use securestore_lib::SecureStore;

use crate::ui;

pub async fn run(store: &SecureStore<PlatformBackend>, key: &str) -> Result<()> {
    if !store.remove_async(key, None).await {
        bail!("Failed to remove '{}'", store.namespaced_key(key));
    }
    ui::success(&format!("Removed '{}'", store.namespaced_key(key)));
    Ok(())
}
