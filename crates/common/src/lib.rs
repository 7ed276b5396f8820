use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    pub id: u64,
    pub path: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: u64,
    pub name: String,
}

/// An album is owned by its album artist, so the same title under two
/// album artists is two rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: u64,
    pub name: String,
    pub artist_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub artist_id: u64,
    pub album_id: u64,
    pub dir_id: u64,
    pub filename: String,
    /// Whole seconds since the unix epoch.
    pub mtime: i64,
}

/// Track row with its dimension references resolved to names, as handed to
/// read-only consumers of the index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackView {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl TrackView {
    pub fn pretty(&self) -> String {
        format!("{} - {} ({})", self.title, self.artist, self.album)
    }
}

/// Modification time truncated to whole seconds. Times before the epoch come
/// back negative instead of failing.
pub fn mtime_secs(metadata: &Metadata) -> std::io::Result<i64> {
    let modified = metadata.modified()?;
    let secs = match modified.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(err) => -(err.duration().as_secs() as i64),
    };
    Ok(secs)
}

pub fn track_path(dir_path: &str, filename: &str) -> PathBuf {
    Path::new(dir_path).join(filename)
}

/// Rows store UTF-8 paths; anything else has no stable representation.
pub fn path_to_string(path: &Path) -> Option<String> {
    path.to_str().map(|s| s.to_string())
}

pub fn file_name_string(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::{file_name_string, mtime_secs, track_path, TrackView};
    use std::fs::{self, File};
    use std::path::Path;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn track_path_joins_directory_and_filename() {
        let path = track_path("/music/dir1", "track1.mp3");
        assert_eq!(path, Path::new("/music/dir1/track1.mp3"));
    }

    #[test]
    fn file_name_string_reads_last_component() {
        assert_eq!(
            file_name_string(Path::new("/music/dir1/track1.mp3")),
            Some("track1.mp3".to_string())
        );
        assert_eq!(file_name_string(Path::new("/")), None);
    }

    #[test]
    fn mtime_is_truncated_to_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        fs::write(&path, b"x").unwrap();
        let stamp = UNIX_EPOCH + Duration::from_millis(1_700_000_000_750);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(stamp)
            .unwrap();

        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(mtime_secs(&metadata).unwrap(), 1_700_000_000);
    }

    #[test]
    fn track_view_formats_like_search_results() {
        let view = TrackView {
            id: 1,
            title: "Macarena".to_string(),
            artist: "Macarena Band".to_string(),
            album: "Greatest Wedding Hits".to_string(),
        };
        assert_eq!(view.pretty(), "Macarena - Macarena Band (Greatest Wedding Hits)");
    }
}
