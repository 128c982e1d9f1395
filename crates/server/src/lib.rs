//! Chartas HTTP server
//!
//! Exposes the canvas store over HTTP. The store itself is synchronous;
//! handlers hand each operation to tokio's blocking pool.

pub mod cli;
pub mod error;
pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use chartas_canvas::CanvasStore;
use chartas_config::{ChartasConfig, StorageBackend};
use tracing::info;

pub use routes::{AppState, router};

/// Build the store described by `config`, creating the working directory if needed
pub fn open_store(config: &ChartasConfig) -> Result<CanvasStore> {
    if config.store.backend == StorageBackend::Filesystem {
        let dir = &config.store.working_dir;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating working directory {}", dir.display()))?;
    }
    Ok(CanvasStore::from_config(&config.store)?)
}

/// Serve until Ctrl-C
pub async fn serve(config: ChartasConfig) -> Result<()> {
    let store = open_store(&config)?;
    let state = AppState::new(Arc::new(store), config.store.format);
    let app = router(state, &config.server);

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!(
        "listening on http://{}{} (tiles: {:?} in {}, {}x{} max, format {:?})",
        addr,
        config.server.request_path,
        config.store.backend,
        config.store.working_dir.display(),
        config.store.tiles.max_tile_width,
        config.store.tiles.tile_height,
        config.store.format,
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_store_creates_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ChartasConfig::default();
        config.store.working_dir = dir.path().join("nested").join("tiles");

        let store = open_store(&config).unwrap();
        assert!(config.store.working_dir.is_dir());

        let id = store.create_image(4, 4).unwrap();
        assert!(config.store.working_dir.join(id.to_string()).is_dir());
    }

    #[test]
    fn test_memory_backend_needs_no_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ChartasConfig::default();
        config.store.backend = StorageBackend::Memory;
        config.store.working_dir = dir.path().join("unused");

        open_store(&config).unwrap();
        assert!(!config.store.working_dir.exists());
    }
}
