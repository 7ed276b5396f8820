use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{track_path, Album, Artist, Directory, Track, TrackView};
use redb::{
    Database, ReadTransaction, ReadableTable, TableDefinition, TableError, TableHandle,
    WriteTransaction,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::terms::{query_terms, title_terms};
use crate::LibraryError;

const INDEX_VERSION: u32 = 1;
const KEY_SEP: char = '\x1f';

const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");
const DIRECTORIES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("directories");
const DIRECTORIES_BY_PATH_TABLE: TableDefinition<&str, u64> =
    TableDefinition::new("directories_by_path");
const TRACKS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("tracks");
const TRACKS_BY_DIR_TABLE: TableDefinition<&str, u64> = TableDefinition::new("tracks_by_dir");
const ARTISTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("artists");
const ARTISTS_BY_NAME_TABLE: TableDefinition<&str, u64> = TableDefinition::new("artists_by_name");
const ALBUMS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("albums");
const ALBUMS_BY_KEY_TABLE: TableDefinition<&str, u64> = TableDefinition::new("albums_by_key");
const TITLE_TERMS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("title_terms");

const META_VERSION_KEY: &str = "version";
const DIRECTORY_SEQ: &str = "seq.directories";
const TRACK_SEQ: &str = "seq.tracks";
const ARTIST_SEQ: &str = "seq.artists";
const ALBUM_SEQ: &str = "seq.albums";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub directories: usize,
    pub tracks: usize,
    pub artists: usize,
    pub albums: usize,
}

/// Everything a track row holds except its surrogate id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackDraft {
    pub title: String,
    pub artist_id: u64,
    pub album_id: u64,
    pub dir_id: u64,
    pub filename: String,
    pub mtime: i64,
}

impl TrackDraft {
    fn to_track(&self, id: u64) -> Track {
        Track {
            id,
            title: self.title.clone(),
            artist_id: self.artist_id,
            album_id: self.album_id,
            dir_id: self.dir_id,
            filename: self.filename.clone(),
            mtime: self.mtime,
        }
    }
}

#[derive(Clone)]
pub struct Index {
    db: Arc<Database>,
}

impl Index {
    pub fn open(path: &Path) -> Result<Self, LibraryError> {
        let db = open_or_create_db(path)?;
        let index = Self::with_db(Arc::new(db))?;
        info!("Opened index at {:?}", path);
        Ok(index)
    }

    pub fn with_db(db: Arc<Database>) -> Result<Self, LibraryError> {
        let index = Self { db };
        index.init_tables()?;
        Ok(index)
    }

    /// Read session over one consistent snapshot of the index.
    pub fn reader(&self) -> Result<IndexReader<'_>, LibraryError> {
        Ok(IndexReader {
            txn: self.db.begin_read()?,
        })
    }

    /// Write session. Nothing is visible to readers until `commit`; dropping
    /// the writer without committing rolls everything back.
    pub fn writer(&self) -> Result<IndexWriter<'_>, LibraryError> {
        Ok(IndexWriter {
            txn: self.db.begin_write()?,
        })
    }

    pub fn stats(&self) -> Result<IndexStats, LibraryError> {
        self.reader()?.stats()
    }

    pub fn search_titles(&self, query: &str, limit: usize) -> Result<Vec<TrackView>, LibraryError> {
        self.reader()?.search_titles(query, limit)
    }

    pub fn resolve_track_path(&self, track_id: u64) -> Result<Option<PathBuf>, LibraryError> {
        self.reader()?.resolve_track_path(track_id)
    }

    fn init_tables(&self) -> Result<(), LibraryError> {
        let write_txn = self.db.begin_write()?;
        match read_version(&write_txn)? {
            Some(version) if version == INDEX_VERSION => {}
            Some(version) => {
                warn!("Index version mismatch ({}); clearing index", version);
                clear_tables(&write_txn)?;
            }
            None => info!("Initialising empty index"),
        }
        {
            let _ = write_txn.open_table(DIRECTORIES_TABLE)?;
            let _ = write_txn.open_table(DIRECTORIES_BY_PATH_TABLE)?;
            let _ = write_txn.open_table(TRACKS_TABLE)?;
            let _ = write_txn.open_table(TRACKS_BY_DIR_TABLE)?;
            let _ = write_txn.open_table(ARTISTS_TABLE)?;
            let _ = write_txn.open_table(ARTISTS_BY_NAME_TABLE)?;
            let _ = write_txn.open_table(ALBUMS_TABLE)?;
            let _ = write_txn.open_table(ALBUMS_BY_KEY_TABLE)?;
            let _ = write_txn.open_table(TITLE_TERMS_TABLE)?;
            let mut meta_table = write_txn.open_table(META_TABLE)?;
            let version_bytes = encode_value(&INDEX_VERSION)?;
            meta_table.insert(META_VERSION_KEY, version_bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

pub struct IndexReader<'db> {
    txn: ReadTransaction<'db>,
}

impl<'db> IndexReader<'db> {
    pub fn find_directory(&self, path: &str) -> Result<Option<Directory>, LibraryError> {
        let by_path = self.txn.open_table(DIRECTORIES_BY_PATH_TABLE)?;
        let id = match get_id(&by_path, path)? {
            Some(id) => id,
            None => return Ok(None),
        };
        let table = self.txn.open_table(DIRECTORIES_TABLE)?;
        get_row(&table, id)
    }

    pub fn list_directories(&self) -> Result<Vec<Directory>, LibraryError> {
        let table = self.txn.open_table(DIRECTORIES_TABLE)?;
        all_rows(&table)
    }

    pub fn tracks_in_directory(&self, dir_id: u64) -> Result<Vec<Track>, LibraryError> {
        let by_dir = self.txn.open_table(TRACKS_BY_DIR_TABLE)?;
        let ids = ids_with_prefix(&by_dir, &dir_prefix(dir_id))?;
        let table = self.txn.open_table(TRACKS_TABLE)?;
        let mut tracks = Vec::with_capacity(ids.len());
        for id in ids {
            let track = get_row(&table, id)?.ok_or_else(|| missing("track", id))?;
            tracks.push(track);
        }
        Ok(tracks)
    }

    /// Every track together with the path its file is expected at.
    pub fn list_tracks_with_paths(&self) -> Result<Vec<(Track, PathBuf)>, LibraryError> {
        let dirs: HashMap<u64, String> = self
            .list_directories()?
            .into_iter()
            .map(|dir| (dir.id, dir.path))
            .collect();
        let table = self.txn.open_table(TRACKS_TABLE)?;
        let mut out = Vec::new();
        for track in all_rows::<Track, _>(&table)? {
            let dir_path = dirs
                .get(&track.dir_id)
                .ok_or_else(|| missing("directory", track.dir_id))?;
            let path = track_path(dir_path, &track.filename);
            out.push((track, path));
        }
        Ok(out)
    }

    pub fn get_track(&self, track_id: u64) -> Result<Option<Track>, LibraryError> {
        let table = self.txn.open_table(TRACKS_TABLE)?;
        get_row(&table, track_id)
    }

    pub fn get_artist(&self, artist_id: u64) -> Result<Option<Artist>, LibraryError> {
        let table = self.txn.open_table(ARTISTS_TABLE)?;
        get_row(&table, artist_id)
    }

    pub fn get_album(&self, album_id: u64) -> Result<Option<Album>, LibraryError> {
        let table = self.txn.open_table(ALBUMS_TABLE)?;
        get_row(&table, album_id)
    }

    pub fn find_artist(&self, name: &str) -> Result<Option<Artist>, LibraryError> {
        let by_name = self.txn.open_table(ARTISTS_BY_NAME_TABLE)?;
        let id = match get_id(&by_name, name)? {
            Some(id) => id,
            None => return Ok(None),
        };
        self.get_artist(id)
    }

    pub fn find_album(&self, name: &str, artist_id: u64) -> Result<Option<Album>, LibraryError> {
        let by_key = self.txn.open_table(ALBUMS_BY_KEY_TABLE)?;
        let id = match get_id(&by_key, &album_key(artist_id, name))? {
            Some(id) => id,
            None => return Ok(None),
        };
        self.get_album(id)
    }

    pub fn resolve_track_path(&self, track_id: u64) -> Result<Option<PathBuf>, LibraryError> {
        let track = match self.get_track(track_id)? {
            Some(track) => track,
            None => return Ok(None),
        };
        let table = self.txn.open_table(DIRECTORIES_TABLE)?;
        let dir: Directory = get_row(&table, track.dir_id)?
            .ok_or_else(|| missing("directory", track.dir_id))?;
        Ok(Some(track_path(&dir.path, &track.filename)))
    }

    /// Tracks whose title contains every query term, the last term matching
    /// as a prefix. Ordered by title, then id.
    pub fn search_titles(&self, query: &str, limit: usize) -> Result<Vec<TrackView>, LibraryError> {
        let terms = query_terms(query);
        let (last, rest) = match terms.split_last() {
            Some(split) => split,
            None => return Ok(Vec::new()),
        };

        let postings = self.txn.open_table(TITLE_TERMS_TABLE)?;
        let mut matched: HashSet<u64> = ids_with_prefix(&postings, last)?.into_iter().collect();
        for term in rest {
            if matched.is_empty() {
                break;
            }
            let ids: HashSet<u64> = ids_with_prefix(&postings, &term_prefix(term))?
                .into_iter()
                .collect();
            matched.retain(|id| ids.contains(id));
        }

        let tracks = self.txn.open_table(TRACKS_TABLE)?;
        let artists = self.txn.open_table(ARTISTS_TABLE)?;
        let albums = self.txn.open_table(ALBUMS_TABLE)?;
        let mut views = Vec::with_capacity(matched.len());
        for id in matched {
            let track: Track = match get_row(&tracks, id)? {
                Some(track) => track,
                None => continue,
            };
            let artist: Artist = get_row(&artists, track.artist_id)?
                .ok_or_else(|| missing("artist", track.artist_id))?;
            let album: Album = get_row(&albums, track.album_id)?
                .ok_or_else(|| missing("album", track.album_id))?;
            views.push(TrackView {
                id: track.id,
                title: track.title,
                artist: artist.name,
                album: album.name,
            });
        }

        views.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        views.truncate(limit);
        Ok(views)
    }

    pub fn stats(&self) -> Result<IndexStats, LibraryError> {
        Ok(IndexStats {
            directories: self.txn.open_table(DIRECTORIES_TABLE)?.len()? as usize,
            tracks: self.txn.open_table(TRACKS_TABLE)?.len()? as usize,
            artists: self.txn.open_table(ARTISTS_TABLE)?.len()? as usize,
            albums: self.txn.open_table(ALBUMS_TABLE)?.len()? as usize,
        })
    }
}

pub struct IndexWriter<'db> {
    txn: WriteTransaction<'db>,
}

impl<'db> IndexWriter<'db> {
    pub fn commit(self) -> Result<(), LibraryError> {
        self.txn.commit()?;
        Ok(())
    }

    pub fn abort(self) -> Result<(), LibraryError> {
        self.txn.abort()?;
        Ok(())
    }

    pub fn find_directory(&self, path: &str) -> Result<Option<Directory>, LibraryError> {
        let id = {
            let by_path = self.txn.open_table(DIRECTORIES_BY_PATH_TABLE)?;
            match get_id(&by_path, path)? {
                Some(id) => id,
                None => return Ok(None),
            }
        };
        let table = self.txn.open_table(DIRECTORIES_TABLE)?;
        get_row(&table, id)
    }

    /// Inserting a path that is already indexed returns the existing id.
    pub fn insert_directory(&self, path: &str) -> Result<u64, LibraryError> {
        if let Some(existing) = self.find_directory(path)? {
            return Ok(existing.id);
        }
        let id = next_id(&self.txn, DIRECTORY_SEQ)?;
        let row = Directory {
            id,
            path: path.to_string(),
        };
        let row_bytes = encode_value(&row)?;
        self.txn
            .open_table(DIRECTORIES_TABLE)?
            .insert(id, row_bytes.as_slice())?;
        self.txn
            .open_table(DIRECTORIES_BY_PATH_TABLE)?
            .insert(path, id)?;
        Ok(id)
    }

    pub fn delete_directory(&self, dir_id: u64) -> Result<bool, LibraryError> {
        let removed: Option<Directory> = {
            let mut table = self.txn.open_table(DIRECTORIES_TABLE)?;
            let removed = match table.remove(dir_id)? {
                Some(value) => Some(decode_value(value.value())?),
                None => None,
            };
            removed
        };
        match removed {
            Some(dir) => {
                self.txn
                    .open_table(DIRECTORIES_BY_PATH_TABLE)?
                    .remove(dir.path.as_str())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn get_track(&self, track_id: u64) -> Result<Option<Track>, LibraryError> {
        let table = self.txn.open_table(TRACKS_TABLE)?;
        get_row(&table, track_id)
    }

    pub fn get_artist(&self, artist_id: u64) -> Result<Option<Artist>, LibraryError> {
        let table = self.txn.open_table(ARTISTS_TABLE)?;
        get_row(&table, artist_id)
    }

    pub fn get_album(&self, album_id: u64) -> Result<Option<Album>, LibraryError> {
        let table = self.txn.open_table(ALBUMS_TABLE)?;
        get_row(&table, album_id)
    }

    pub fn find_track(&self, dir_id: u64, filename: &str) -> Result<Option<Track>, LibraryError> {
        let id = {
            let by_dir = self.txn.open_table(TRACKS_BY_DIR_TABLE)?;
            match get_id(&by_dir, &track_dir_key(dir_id, filename))? {
                Some(id) => id,
                None => return Ok(None),
            }
        };
        self.get_track(id)
    }

    pub fn get_or_create_artist(&self, name: &str) -> Result<u64, LibraryError> {
        let existing = {
            let by_name = self.txn.open_table(ARTISTS_BY_NAME_TABLE)?;
            get_id(&by_name, name)?
        };
        if let Some(id) = existing {
            return Ok(id);
        }

        let id = next_id(&self.txn, ARTIST_SEQ)?;
        let row = Artist {
            id,
            name: name.to_string(),
        };
        let row_bytes = encode_value(&row)?;
        self.txn
            .open_table(ARTISTS_TABLE)?
            .insert(id, row_bytes.as_slice())?;
        self.txn.open_table(ARTISTS_BY_NAME_TABLE)?.insert(name, id)?;
        info!("Inserting artist {}", name);
        Ok(id)
    }

    pub fn get_or_create_album(&self, name: &str, artist_id: u64) -> Result<u64, LibraryError> {
        let key = album_key(artist_id, name);
        let existing = {
            let by_key = self.txn.open_table(ALBUMS_BY_KEY_TABLE)?;
            get_id(&by_key, &key)?
        };
        if let Some(id) = existing {
            return Ok(id);
        }

        let id = next_id(&self.txn, ALBUM_SEQ)?;
        let row = Album {
            id,
            name: name.to_string(),
            artist_id,
        };
        let row_bytes = encode_value(&row)?;
        self.txn
            .open_table(ALBUMS_TABLE)?
            .insert(id, row_bytes.as_slice())?;
        self.txn
            .open_table(ALBUMS_BY_KEY_TABLE)?
            .insert(key.as_str(), id)?;
        info!("Inserting album {}", name);
        Ok(id)
    }

    pub fn insert_track(&self, draft: &TrackDraft) -> Result<u64, LibraryError> {
        if self.find_track(draft.dir_id, &draft.filename)?.is_some() {
            return Err(LibraryError::Inconsistent(format!(
                "track {} already indexed in directory {}",
                draft.filename, draft.dir_id
            )));
        }
        let id = next_id(&self.txn, TRACK_SEQ)?;
        self.link_track(&draft.to_track(id))?;
        Ok(id)
    }

    /// Rewrites every column of an existing track, including its location.
    pub fn update_track(&self, track_id: u64, draft: &TrackDraft) -> Result<(), LibraryError> {
        let old = self
            .get_track(track_id)?
            .ok_or_else(|| missing("track", track_id))?;
        if old.dir_id != draft.dir_id || old.filename != draft.filename {
            if let Some(other) = self.find_track(draft.dir_id, &draft.filename)? {
                return Err(LibraryError::Inconsistent(format!(
                    "cannot move track {} onto track {}",
                    track_id, other.id
                )));
            }
        }
        self.unlink_track(&old)?;
        self.link_track(&draft.to_track(track_id))
    }

    pub fn delete_track(&self, track_id: u64) -> Result<bool, LibraryError> {
        let old = match self.get_track(track_id)? {
            Some(track) => track,
            None => return Ok(false),
        };
        self.unlink_track(&old)?;
        self.txn.open_table(TRACKS_TABLE)?.remove(track_id)?;
        Ok(true)
    }

    /// Deletes albums without tracks, then artists referenced by neither a
    /// track nor a remaining album. Returns (albums, artists) removed.
    pub fn prune_dimensions(&self) -> Result<(usize, usize), LibraryError> {
        let mut used_albums = HashSet::new();
        let mut used_artists = HashSet::new();
        {
            let tracks = self.txn.open_table(TRACKS_TABLE)?;
            for track in all_rows::<Track, _>(&tracks)? {
                used_albums.insert(track.album_id);
                used_artists.insert(track.artist_id);
            }
        }

        let mut unused_albums = Vec::new();
        {
            let albums = self.txn.open_table(ALBUMS_TABLE)?;
            for album in all_rows::<Album, _>(&albums)? {
                if used_albums.contains(&album.id) {
                    used_artists.insert(album.artist_id);
                } else {
                    unused_albums.push(album);
                }
            }
        }
        {
            let mut albums = self.txn.open_table(ALBUMS_TABLE)?;
            let mut by_key = self.txn.open_table(ALBUMS_BY_KEY_TABLE)?;
            for album in &unused_albums {
                info!("Deleting album {}", album.name);
                albums.remove(album.id)?;
                by_key.remove(album_key(album.artist_id, &album.name).as_str())?;
            }
        }

        let unused_artists: Vec<Artist> = {
            let artists = self.txn.open_table(ARTISTS_TABLE)?;
            all_rows::<Artist, _>(&artists)?
                .into_iter()
                .filter(|artist| !used_artists.contains(&artist.id))
                .collect()
        };
        {
            let mut artists = self.txn.open_table(ARTISTS_TABLE)?;
            let mut by_name = self.txn.open_table(ARTISTS_BY_NAME_TABLE)?;
            for artist in &unused_artists {
                info!("Deleting artist {}", artist.name);
                artists.remove(artist.id)?;
                by_name.remove(artist.name.as_str())?;
            }
        }

        Ok((unused_albums.len(), unused_artists.len()))
    }

    fn link_track(&self, track: &Track) -> Result<(), LibraryError> {
        let track_bytes = encode_value(track)?;
        self.txn
            .open_table(TRACKS_TABLE)?
            .insert(track.id, track_bytes.as_slice())?;
        self.txn
            .open_table(TRACKS_BY_DIR_TABLE)?
            .insert(track_dir_key(track.dir_id, &track.filename).as_str(), track.id)?;
        let mut postings = self.txn.open_table(TITLE_TERMS_TABLE)?;
        for term in title_terms(&track.title) {
            postings.insert(term_key(&term, track.id).as_str(), track.id)?;
        }
        Ok(())
    }

    fn unlink_track(&self, track: &Track) -> Result<(), LibraryError> {
        self.txn
            .open_table(TRACKS_BY_DIR_TABLE)?
            .remove(track_dir_key(track.dir_id, &track.filename).as_str())?;
        let mut postings = self.txn.open_table(TITLE_TERMS_TABLE)?;
        for term in title_terms(&track.title) {
            postings.remove(term_key(&term, track.id).as_str())?;
        }
        Ok(())
    }
}

fn open_or_create_db(path: &Path) -> Result<Database, LibraryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

fn read_version(txn: &WriteTransaction) -> Result<Option<u32>, LibraryError> {
    let table = txn.open_table(META_TABLE)?;
    let version = match table.get(META_VERSION_KEY)? {
        Some(value) => Some(decode_value(value.value())?),
        None => None,
    };
    Ok(version)
}

fn clear_tables(txn: &WriteTransaction) -> Result<(), LibraryError> {
    clear_table(txn, META_TABLE)?;
    clear_table(txn, DIRECTORIES_TABLE)?;
    clear_table(txn, DIRECTORIES_BY_PATH_TABLE)?;
    clear_table(txn, TRACKS_TABLE)?;
    clear_table(txn, TRACKS_BY_DIR_TABLE)?;
    clear_table(txn, ARTISTS_TABLE)?;
    clear_table(txn, ARTISTS_BY_NAME_TABLE)?;
    clear_table(txn, ALBUMS_TABLE)?;
    clear_table(txn, ALBUMS_BY_KEY_TABLE)?;
    clear_table(txn, TITLE_TERMS_TABLE)?;
    Ok(())
}

fn clear_table(txn: &WriteTransaction, table: impl TableHandle) -> Result<(), LibraryError> {
    match txn.delete_table(table) {
        Ok(_) => Ok(()),
        Err(TableError::TableDoesNotExist(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn next_id(txn: &WriteTransaction, seq_key: &str) -> Result<u64, LibraryError> {
    let mut meta_table = txn.open_table(META_TABLE)?;
    let current: u64 = match meta_table.get(seq_key)? {
        Some(value) => decode_value(value.value())?,
        None => 0,
    };
    let next = current + 1;
    let next_bytes = encode_value(&next)?;
    meta_table.insert(seq_key, next_bytes.as_slice())?;
    Ok(next)
}

fn get_row<T, R>(table: &R, id: u64) -> Result<Option<T>, LibraryError>
where
    T: for<'de> Deserialize<'de>,
    R: ReadableTable<u64, &'static [u8]>,
{
    let row = match table.get(id)? {
        Some(value) => Some(decode_value(value.value())?),
        None => None,
    };
    Ok(row)
}

fn all_rows<T, R>(table: &R) -> Result<Vec<T>, LibraryError>
where
    T: for<'de> Deserialize<'de>,
    R: ReadableTable<u64, &'static [u8]>,
{
    let mut rows = Vec::new();
    for entry in table.iter()? {
        let entry = entry?;
        rows.push(decode_value(entry.1.value())?);
    }
    Ok(rows)
}

fn get_id<R>(table: &R, key: &str) -> Result<Option<u64>, LibraryError>
where
    R: ReadableTable<&'static str, u64>,
{
    let id = table.get(key)?.map(|value| value.value());
    Ok(id)
}

fn ids_with_prefix<R>(table: &R, prefix: &str) -> Result<Vec<u64>, LibraryError>
where
    R: ReadableTable<&'static str, u64>,
{
    let mut end = prefix.to_string();
    end.push('\u{10ffff}');
    let mut ids = Vec::new();
    for entry in table.range(prefix..end.as_str())? {
        let entry = entry?;
        ids.push(entry.1.value());
    }
    Ok(ids)
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, LibraryError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, LibraryError> {
    Ok(bincode::deserialize(bytes)?)
}

fn missing(kind: &str, id: u64) -> LibraryError {
    LibraryError::Inconsistent(format!("{} {} is referenced but not indexed", kind, id))
}

fn dir_prefix(dir_id: u64) -> String {
    let mut out = format!("{:020}", dir_id);
    out.push(KEY_SEP);
    out
}

fn track_dir_key(dir_id: u64, filename: &str) -> String {
    let mut out = dir_prefix(dir_id);
    out.push_str(filename);
    out
}

fn album_key(artist_id: u64, name: &str) -> String {
    let mut out = format!("{:020}", artist_id);
    out.push(KEY_SEP);
    out.push_str(name);
    out
}

fn term_prefix(term: &str) -> String {
    let mut out = term.to_string();
    out.push(KEY_SEP);
    out
}

fn term_key(term: &str, track_id: u64) -> String {
    let mut out = term_prefix(term);
    out.push_str(&format!("{:020}", track_id));
    out
}
