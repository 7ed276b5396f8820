use std::fs;
use std::path::Path;

use lofty::error::{ErrorKind, LoftyError};
use lofty::prelude::{ItemKey, TaggedFileExt};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Raw tag values as found in the file. Blank values count as absent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
}

/// Fully defaulted metadata for a recognised audio file; no field is ever
/// missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_artist: String,
}

impl TagInfo {
    /// Title falls back to the file name including its extension, artist and
    /// album to fixed placeholders, album artist to the resolved artist.
    pub fn resolve(self, filename: &str) -> TrackMetadata {
        let title = self.title.unwrap_or_else(|| filename.to_string());
        let artist = self.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        let album_artist = self.album_artist.unwrap_or_else(|| artist.clone());
        let album = self.album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string());
        TrackMetadata {
            title,
            artist,
            album,
            album_artist,
        }
    }
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag read error: {}", err),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

/// Source of track metadata for the synchronizer.
///
/// `Ok(None)` means the file is not audio, which is an ordinary outcome.
/// `Err` is reserved for I/O trouble reading a file that may well be audio.
pub trait Extractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<Option<TrackMetadata>, MetadataError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyExtractor;

impl Extractor for LoftyExtractor {
    fn extract(&self, path: &Path) -> Result<Option<TrackMetadata>, MetadataError> {
        read_metadata(path)
    }
}

pub fn read_metadata(path: &Path) -> Result<Option<TrackMetadata>, MetadataError> {
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(read_tags(path)?.map(|tags| tags.resolve(&filename)))
}

pub fn read_tags(path: &Path) -> Result<Option<TagInfo>, MetadataError> {
    if !fs::metadata(path)?.is_file() {
        return Ok(None);
    }

    let tagged_file = match lofty::read_from_path(path) {
        Ok(tagged_file) => tagged_file,
        Err(err) => match err.kind() {
            ErrorKind::Io(io_err) if !is_malformed_container(io_err) => return Err(err.into()),
            _ => return Ok(None),
        },
    };

    let mut info = TagInfo::default();
    if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        info.title = non_blank(tag.get_string(&ItemKey::TrackTitle));
        info.artist = non_blank(tag.get_string(&ItemKey::TrackArtist));
        info.album = non_blank(tag.get_string(&ItemKey::AlbumTitle));
        info.album_artist = non_blank(tag.get_string(&ItemKey::AlbumArtist));
    }

    Ok(Some(info))
}

/// lofty surfaces truncated or garbled containers as I/O errors raised while
/// parsing; those files are simply not audio.
fn is_malformed_container(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::InvalidData
            | std::io::ErrorKind::InvalidInput
    )
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::{read_metadata, Extractor, LoftyExtractor, TagInfo, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
    use std::fs;
    use std::path::Path;

    fn write_silent_wav(path: &Path) {
        let sample_rate: u32 = 8000;
        let data_len: u32 = sample_rate * 2 / 10;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn resolve_keeps_present_tags() {
        let tags = TagInfo {
            title: Some("Macarena".to_string()),
            artist: Some("Macarena Band".to_string()),
            album: Some("Greatest Wedding Hits".to_string()),
            album_artist: Some("Various Artists".to_string()),
        };
        let meta = tags.resolve("track1.mp3");
        assert_eq!(meta.title, "Macarena");
        assert_eq!(meta.artist, "Macarena Band");
        assert_eq!(meta.album, "Greatest Wedding Hits");
        assert_eq!(meta.album_artist, "Various Artists");
    }

    #[test]
    fn album_artist_falls_back_to_artist() {
        let tags = TagInfo {
            artist: Some("Two German Fellows".to_string()),
            ..TagInfo::default()
        };
        let meta = tags.resolve("track2.mp3");
        assert_eq!(meta.album_artist, "Two German Fellows");
        assert_eq!(meta.album, UNKNOWN_ALBUM);
    }

    #[test]
    fn untagged_fields_use_placeholders() {
        let meta = TagInfo::default().resolve("no_metadata.mp3");
        assert_eq!(meta.title, "no_metadata.mp3");
        assert_eq!(meta.artist, UNKNOWN_ARTIST);
        assert_eq!(meta.album_artist, UNKNOWN_ARTIST);
        assert_eq!(meta.album, UNKNOWN_ALBUM);
    }

    #[test]
    fn text_file_is_not_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "just some notes").unwrap();
        assert_eq!(LoftyExtractor.extract(&path).unwrap(), None);
    }

    #[test]
    fn directory_is_not_audio() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_metadata(dir.path()).unwrap(), None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_metadata(&dir.path().join("gone.mp3")).is_err());
    }

    #[test]
    fn empty_containers_are_not_audio() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["empty.mp3", "empty.wav", "empty.flac"] {
            let path = dir.path().join(name);
            fs::write(&path, b"").unwrap();
            assert_eq!(read_metadata(&path).unwrap(), None, "{}", name);
        }
    }

    #[test]
    fn truncated_wav_is_not_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.wav");
        write_silent_wav(&path);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..20]).unwrap();
        assert_eq!(read_metadata(&path).unwrap(), None);
    }

    #[test]
    fn untagged_wav_gets_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        write_silent_wav(&path);

        let meta = read_metadata(&path).unwrap().expect("wav should be audio");
        assert_eq!(meta.title, "silence.wav");
        assert_eq!(meta.artist, UNKNOWN_ARTIST);
        assert_eq!(meta.album, UNKNOWN_ALBUM);
        assert_eq!(meta.album_artist, UNKNOWN_ARTIST);
    }
}
