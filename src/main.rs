pub mod engine;
pub mod focus;
pub mod gamepad;
pub mod mapping;
pub mod sink;

use crate::engine::SamplerHandle;
use crate::focus::AlwaysFocused;
use crate::gamepad::GilrsSource;
use crate::mapping::store::{spawn_refresh_worker, MAP_REFRESH_INTERVAL_MS};
use crate::mapping::{MappingTable, TomlMappingStore};
use crate::sink::DirectSink;
use color_eyre::{eyre::eyre, Result};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    info!("Starting padmap");

    let store = TomlMappingStore::new();
    let initial_table = match store.load().await {
        Ok(table) => table,
        Err(e) => {
            warn!("Failed to load mapping table, starting empty: {}", e);
            MappingTable::default()
        }
    };
    if initial_table.is_empty() {
        info!("Mapping table is empty; gamepad input will be ignored until one is saved");
    } else {
        info!("Loaded mapping table with {} entries", initial_table.len());
    }

    let (table_tx, table_rx) = watch::channel(initial_table);
    let _refresh_handle = spawn_refresh_worker(store, table_tx, MAP_REFRESH_INTERVAL_MS);

    let source = Box::new(
        GilrsSource::new().map_err(|e| eyre!("Failed to initialize gamepad source: {}", e))?,
    );

    let (key_events_tx, mut key_events_rx) = mpsc::channel(1000);
    let sink = Box::new(DirectSink::new(key_events_tx));

    let _sampler_handle = SamplerHandle::spawn(
        source,
        Box::new(AlwaysFocused),
        sink,
        table_rx,
        None, // no binding-editor surface attached
        None,
    );

    // Focused-consumer stand-in: surface delivered key events until the
    // hosting context is torn down.
    while let Some(event) = key_events_rx.recv().await {
        info!(
            "Key event: {} {} (code {}, physical {})",
            event.key.display_key,
            if event.down { "down" } else { "up" },
            event.key.key_code,
            event.key.physical_code
        );
    }

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
