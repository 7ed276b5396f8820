use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use library::IndexStats;
use notify::RecommendedWatcher;
use parking_lot::RwLock;

use crate::config::DaemonConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<DaemonConfig>>,
    pub status: Arc<RwLock<ScanStatus>>,
    pub watcher: Arc<RwLock<Option<RecommendedWatcher>>>,
}

impl AppState {
    pub fn new(config: DaemonConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            status: Arc::new(RwLock::new(ScanStatus::Unconfigured)),
            watcher: Arc::new(RwLock::new(None)),
        }
    }

    pub fn set_status(&self, status: ScanStatus) {
        *self.status.write() = status;
    }

    pub fn status(&self) -> ScanStatus {
        self.status.read().clone()
    }
}

#[derive(Clone, Debug)]
pub enum ScanStatus {
    Unconfigured,
    Missing(PathBuf),
    Scanning { started: SystemTime },
    Ready(IndexStats),
    Error(String),
}

impl ScanStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ScanStatus::Unconfigured => "unconfigured",
            ScanStatus::Missing(_) => "missing",
            ScanStatus::Scanning { .. } => "scanning",
            ScanStatus::Ready(_) => "ready",
            ScanStatus::Error(_) => "error",
        }
    }

    /// One-line status for logs.
    pub fn describe(&self) -> String {
        match self {
            ScanStatus::Unconfigured => "unconfigured".to_string(),
            ScanStatus::Missing(path) => format!("missing: {}", path.display()),
            ScanStatus::Scanning { started } => {
                let secs = started.elapsed().map(|elapsed| elapsed.as_secs()).unwrap_or(0);
                format!("scanning for {}s", secs)
            }
            ScanStatus::Ready(stats) => format!(
                "ready: {} directories, {} tracks, {} artists, {} albums",
                stats.directories, stats.tracks, stats.artists, stats.albums
            ),
            ScanStatus::Error(message) => format!("error: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScanStatus;
    use library::IndexStats;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    #[test]
    fn describe_reports_counts_and_elapsed_time() {
        let ready = ScanStatus::Ready(IndexStats {
            directories: 2,
            tracks: 5,
            artists: 3,
            albums: 1,
        });
        assert_eq!(
            ready.describe(),
            "ready: 2 directories, 5 tracks, 3 artists, 1 albums"
        );

        let scanning = ScanStatus::Scanning {
            started: SystemTime::now() - Duration::from_secs(90),
        };
        assert!(scanning.describe().starts_with("scanning for 9"));

        let missing = ScanStatus::Missing(PathBuf::from("/nowhere"));
        assert_eq!(missing.describe(), "missing: /nowhere");
    }
}
