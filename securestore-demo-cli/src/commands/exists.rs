//! Exists command - check for a key

use anyhow::Result;
use securestore_lib::backend::PlatformBackend;
use securestore_lib::SecureStore;

pub async fn run(store: &SecureStore<PlatformBackend>, key: &str) -> Result<()> {
    let exists = store.exists_async(key).await?;
    println!("{}", exists);
    Ok(())
}
