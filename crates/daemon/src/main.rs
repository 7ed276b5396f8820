mod config;
mod scan;
mod state;
mod watch;

use std::env;
use std::sync::Arc;

use config::{config_path_from_env, load_or_create_config, resolve_library_root, resolve_path};
use library::{Index, Scanner};
use scan::{set_library_missing, start_library};
use state::AppState;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (mut config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }
    config.apply_env_override(env::var("LIBRARY_PATH").ok());

    let index_path = resolve_path(&config_path, config.index_path_or_default());
    let index = Index::open(&index_path)?;
    let state = AppState::new(config.clone());

    match resolve_library_root(&config_path, &config.library_path) {
        Some(root) => {
            if root.is_dir() {
                let scanner = Arc::new(Scanner::with_lofty(root, index, config.scan_options()));
                start_library(state.clone(), scanner);
            } else {
                warn!("Library directory not found: {:?}", root);
                set_library_missing(&state, root);
            }
        }
        None => {
            info!("Library directory not configured; set library_path or LIBRARY_PATH.");
        }
    }

    shutdown_signal().await;
    *state.watcher.write() = None;
    info!("Stopped ({})", state.status().describe());
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
}
