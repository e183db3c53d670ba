//! Get command - read and validate a value

use anyhow::{Context, Result};
use securestore_lib::backend::PlatformBackend;
use securestore_lib::schema::{AnyJson, Coerced};
use securestore_lib::SecureStore;
use serde_json::Value;

use crate::{ui, ValueKind};

pub async fn run(
    store: &SecureStore<PlatformBackend>,
    key: &str,
    fallback: Option<&str>,
    kind: ValueKind,
) -> Result<()> {
    match kind {
        ValueKind::String => {
            let fallback = fallback.unwrap_or_default().to_string();
            let value = store
                .get_async(key, fallback, Coerced::<String>::new())
                .await?;
            println!("{}", value);
        }
        ValueKind::Number => {
            let fallback = match fallback {
                Some(f) => f.parse().context("--fallback is not a number")?,
                None => 0.0,
            };
            let value = store
                .get_async(key, fallback, Coerced::<f64>::new())
                .await?;
            println!("{}", value);
        }
        ValueKind::Bool => {
            let fallback = match fallback {
                Some(f) => f.parse().context("--fallback is not true or false")?,
                None => false,
            };
            let value = store
                .get_async(key, fallback, Coerced::<bool>::new())
                .await?;
            println!("{}", value);
        }
        ValueKind::Json => {
            let fallback = match fallback {
                Some(f) => serde_json::from_str(f).context("--fallback is not valid JSON")?,
                None => Value::Null,
            };
            let value = store.get_async(key, fallback, AnyJson).await?;
            ui::json(&value);
        }
    }

    Ok(())
}
