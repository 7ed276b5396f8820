use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use library::{LibraryError, Scanner};
use tracing::{info, warn};

use crate::state::{AppState, ScanStatus};
use crate::watch::configure_watcher;

/// Brings the library online: optional first scan, then the watcher.
pub fn start_library(state: AppState, scanner: Arc<Scanner>) {
    info!(
        "Library at {} ({:?} directory policy, prune {})",
        scanner.root().display(),
        scanner.options().directory_policy,
        scanner.options().prune_dimensions
    );
    let scan_on_start = state.config.read().scan_on_start;

    tokio::spawn(async move {
        if scan_on_start {
            if !run_scan(&state, Arc::clone(&scanner)).await {
                return;
            }
        } else {
            match scanner.index().stats() {
                Ok(stats) => {
                    info!(
                        "Startup scan disabled; serving existing index ({} tracks)",
                        stats.tracks
                    );
                    state.set_status(ScanStatus::Ready(stats));
                }
                Err(err) => {
                    warn!("Failed to read index stats: {}", err);
                    state.set_status(ScanStatus::Error(err.to_string()));
                }
            }
        }
        let root = scanner.root().to_path_buf();
        configure_watcher(&state, scanner, root);
    });
}

/// Runs one scan on the blocking pool and records the outcome. Returns
/// whether the index is usable afterwards.
pub async fn run_scan(state: &AppState, scanner: Arc<Scanner>) -> bool {
    state.set_status(ScanStatus::Scanning {
        started: SystemTime::now(),
    });
    let started = Instant::now();
    let result = tokio::task::spawn_blocking(move || {
        scanner.scan()?;
        scanner.index().stats()
    })
    .await;

    match result {
        Ok(Ok(stats)) => {
            info!(
                "Library ready in {:.1}s: {} directories, {} tracks, {} artists, {} albums",
                started.elapsed().as_secs_f64(),
                stats.directories,
                stats.tracks,
                stats.artists,
                stats.albums
            );
            state.set_status(ScanStatus::Ready(stats));
            true
        }
        Ok(Err(LibraryError::MissingRoot(path))) => {
            warn!("Library directory not found: {:?}", path);
            set_library_missing(state, path);
            false
        }
        Ok(Err(err)) => {
            warn!("Library scan failed: {}", err);
            state.set_status(ScanStatus::Error(err.to_string()));
            false
        }
        Err(err) => {
            warn!("Library scan join error: {}", err);
            state.set_status(ScanStatus::Error(err.to_string()));
            false
        }
    }
}

pub fn set_library_missing(state: &AppState, path: PathBuf) {
    state.set_status(ScanStatus::Missing(path));
}
