//! Info command - show store and backend details

use anyhow::Result;
use securestore_lib::backend::PlatformBackend;
use securestore_lib::SecureStore;

use crate::ui;

pub async fn run(store: &SecureStore<PlatformBackend>, verbose: bool) -> Result<()> {
    let backend = store.backend();
    let available = SecureStore::<PlatformBackend>::is_available_async().await;

    ui::header("SecureStore");
    ui::key_value("Service", backend.service());
    ui::key_value(
        "Namespace",
        store.namespace().as_deref().unwrap_or("(none)"),
    );
    ui::key_value(
        "Storage",
        if backend.uses_native() {
            "OS keychain"
        } else {
            "process memory (not secure)"
        },
    );
    ui::key_value("Keychain available", &available.to_string());
    ui::key_value(
        "Biometrics",
        &store.can_use_biometric_authentication().to_string(),
    );

    if verbose {
        ui::key_value("Item options", &format!("{:?}", store.item_options()));
    }

    Ok(())
}
