//! Startup orchestration.
//!
//! # Responsibilities
//! - Install structured logging from the loaded configuration
//! - Start optional background tasks (metrics exporter, config reload)
//! - Bind the listener and serve until a termination signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Logging initializes first so every later step is recorded
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

use crate::config::{AppConfig, ConfigWatcher};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::logging::{self, Emitter, LoggingError};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Run the API process with `config`; `config_path` enables hot reload.
pub async fn run(config: AppConfig, config_path: Option<PathBuf>) -> Result<(), StartupError> {
    let emitter = logging::init(&config.logging)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        threshold = %config.logging.level,
        log_file = ?config.logging.file,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    // The watcher must outlive the server.
    let _watcher = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path);
            tokio::spawn(apply_reloads(emitter.clone(), updates, shutdown.subscribe()));
            match watcher.run() {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let server = HttpServer::new(config, emitter.clone());
    let result = server.run(listener, shutdown.subscribe()).await;
    shutdown.trigger();

    let _ = emitter.flush();
    result.map_err(StartupError::Serve)
}

/// Apply the log threshold of every reloaded configuration.
pub async fn apply_reloads(
    emitter: Emitter,
    mut updates: mpsc::UnboundedReceiver<AppConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(config) = update else { break };
                match config.logging.threshold() {
                    Ok(level) if level != emitter.threshold() => {
                        emitter.set_threshold(level);
                        tracing::info!(threshold = %level, "Log level changed");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Ignoring reloaded log level"),
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{EmitterConfig, Level};
    use std::time::Duration;

    #[tokio::test]
    async fn test_apply_reloads_changes_threshold() {
        let (emitter, _sink) = Emitter::in_memory(EmitterConfig {
            threshold: Level::Info,
            ..EmitterConfig::default()
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = Shutdown::new();
        let task = tokio::spawn(apply_reloads(emitter.clone(), rx, shutdown.subscribe()));

        let mut config = AppConfig::default();
        config.logging.level = "ERROR".into();
        tx.send(config).unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            while emitter.threshold() != Level::Error {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }
}
