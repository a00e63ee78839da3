pub mod prices;
pub mod subscribers;

pub use prices::PriceHistoryStore;
pub use subscribers::SubscriberStore;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Read a JSON file, falling back to the default on absence or corruption.
/// Storage read problems are recovered locally and never surfaced to callers.
async fn load_json_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            debug!("No readable file at {} ({}), starting empty", path.display(), e);
            return T::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "Malformed JSON in {} ({}), starting empty",
                path.display(),
                e
            );
            T::default()
        }
    }
}

/// Write a value as JSON, creating parent directories as needed
async fn save_json<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create storage directory")?;
        }
    }

    let content = serde_json::to_string(value).context("Failed to serialize value")?;

    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
