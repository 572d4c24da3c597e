//! TOML persistence for the mapping table.
//!
//! The table lives in a single file under the user config directory and is
//! edited externally (by the binding editor or by hand). A refresh worker
//! reloads it on a fixed interval and publishes it over a watch channel, so
//! the engine always reads whichever table is currently installed without
//! blocking a tick on storage.

use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::MappingTable;

const CONFIG_DIR: &str = ".config/padmap";
const MAP_FILE: &str = "controller_map.toml";

/// How often the refresh worker picks up external edits, in milliseconds.
pub const MAP_REFRESH_INTERVAL_MS: u64 = 5000;

/// Errors from loading or saving the mapping file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access mapping file: {0}")]
    IoError(String),

    #[error("Failed to parse mapping file: {0}")]
    ParseError(String),

    #[error("Failed to serialize mapping table: {0}")]
    SerializeError(String),
}

/// Mapping store backed by one TOML file.
#[derive(Debug, Clone)]
pub struct TomlMappingStore {
    path: PathBuf,
}

impl TomlMappingStore {
    /// Store at the default location, `~/.config/padmap/controller_map.toml`.
    pub fn new() -> Self {
        let mut path = dirs::home_dir().unwrap_or_else(|| {
            warn!("Could not determine home directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(MAP_FILE);
        Self { path }
    }

    /// Store at an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the table. A missing file is not an error: the store degrades
    /// to an empty table so the engine can run before any mapping exists.
    pub async fn load(&self) -> Result<MappingTable, StoreError> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;

        if !exists {
            debug!(
                "Mapping file {} does not exist, using empty table",
                self.path.display()
            );
            return Ok(MappingTable::default());
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| StoreError::ParseError(e.to_string()))
    }

    /// Writes the table, creating the config directory if needed.
    pub async fn save(&self, table: &MappingTable) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::IoError(e.to_string()))?;
        }

        let content = toml::to_string_pretty(table)
            .map_err(|e| StoreError::SerializeError(e.to_string()))?;

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;

        info!("Mapping table saved to {}", self.path.display());
        Ok(())
    }
}

impl Default for TomlMappingStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the periodic reload task.
///
/// On each interval the store is reloaded and the result published to
/// `table_tx`. A failed reload keeps the previously published table and only
/// logs the condition; the sampling loop is never blocked on storage.
pub fn spawn_refresh_worker(
    store: TomlMappingStore,
    table_tx: watch::Sender<MappingTable>,
    interval_ms: u64,
) -> JoinHandle<()> {
    info!("Starting mapping refresh task with interval: {}ms", interval_ms);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_millis(interval_ms));
        // The immediate first tick duplicates the startup load; harmless.
        loop {
            interval.tick().await;

            match store.load().await {
                Ok(table) => {
                    debug!("Mapping table refreshed ({} entries)", table.len());
                    if table_tx.send(table).is_err() {
                        info!("All mapping receivers dropped, stopping refresh task");
                        break;
                    }
                }
                Err(e) => {
                    warn!("Mapping refresh failed, keeping previous table: {}", e);
                }
            }
        }
    })
}
