use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use common::{file_name_string, mtime_secs, path_to_string, Directory, Track};
use metadata::{Extractor, LoftyExtractor, TrackMetadata};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::index::{Index, IndexReader, IndexWriter, TrackDraft};
use crate::LibraryError;

/// Which directories earn a row in the index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryPolicy {
    /// Only directories that directly hold an audio file.
    #[default]
    Direct,
    /// Every directory with an audio file anywhere below it.
    Subtree,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    #[serde(default)]
    pub directory_policy: DirectoryPolicy,
    #[serde(default)]
    pub prune_dimensions: bool,
}

/// Reconciles the index with the library tree under `root`.
pub struct Scanner<E = LoftyExtractor> {
    root: PathBuf,
    index: Index,
    extractor: E,
    options: ScanOptions,
    scan_lock: Mutex<()>,
}

impl Scanner<LoftyExtractor> {
    pub fn with_lofty(root: impl Into<PathBuf>, index: Index, options: ScanOptions) -> Self {
        Self::new(root, index, LoftyExtractor, options)
    }
}

impl<E: Extractor> Scanner<E> {
    pub fn new(root: impl Into<PathBuf>, index: Index, extractor: E, options: ScanOptions) -> Self {
        Self {
            root: root.into(),
            index,
            extractor,
            options,
            scan_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// One full reconciliation pass. All changes land in a single write
    /// transaction; on error nothing is committed.
    pub fn scan(&self) -> Result<(), LibraryError> {
        let _guard = self.scan_lock.lock();
        let root = resolve_root(&self.root)?;
        info!("Scanning library at {:?}", root);

        let plan = {
            let reader = self.index.reader()?;
            let mut walk = Walk::new(&reader, &self.extractor, self.options.directory_policy, &root)?;
            walk.run()?;
            walk.finish()?
        };

        let writer = self.index.writer()?;
        if let Err(err) = apply(&writer, &plan) {
            warn!("Scan failed, rolling back: {}", err);
            if let Err(abort_err) = writer.abort() {
                warn!("Rollback failed: {}", abort_err);
            }
            return Err(err);
        }
        writer.commit()?;

        let summary = plan.summary();
        info!(
            "Scan complete: {} new, {} updated, {} relocated, {} deleted tracks; {} directories added, {} removed; {} unchanged, {} skipped",
            summary.inserted,
            summary.updated,
            summary.relocated,
            summary.deleted,
            summary.dirs_added,
            summary.dirs_removed,
            plan.cache_hits,
            plan.skipped
        );

        if self.options.prune_dimensions {
            self.prune()?;
        }
        Ok(())
    }

    fn prune(&self) -> Result<(), LibraryError> {
        let writer = self.index.writer()?;
        let (albums, artists) = writer.prune_dimensions()?;
        writer.commit()?;
        if albums + artists > 0 {
            info!("Pruned {} albums and {} artists", albums, artists);
        }
        Ok(())
    }
}

/// The root as one canonical absolute path, so every spelling of the same
/// library maps onto the same directory rows.
fn resolve_root(root: &Path) -> Result<PathBuf, LibraryError> {
    let absolute = if root.is_absolute() {
        root.to_path_buf()
    } else {
        env::current_dir()?.join(root)
    };
    match fs::canonicalize(&absolute) {
        Ok(root) if root.is_dir() => Ok(root),
        _ => Err(LibraryError::MissingRoot(absolute)),
    }
}

struct PendingTrack {
    dir_path: String,
    filename: String,
    mtime: i64,
    metadata: TrackMetadata,
    existing: Option<u64>,
    relocated: bool,
}

/// A vanished track that a newly found file may turn out to be.
struct Relocatable {
    id: u64,
    title: String,
    artist: String,
    album: String,
    dir_path: String,
    filename: String,
}

impl Relocatable {
    fn matches(&self, pending: &PendingTrack) -> bool {
        self.title == pending.metadata.title
            && self.artist == pending.metadata.artist
            && self.album == pending.metadata.album
            && (self.dir_path == pending.dir_path || self.filename == pending.filename)
    }
}

struct Plan {
    stale_dirs: Vec<Directory>,
    new_dirs: Vec<String>,
    pending: Vec<PendingTrack>,
    stale_tracks: Vec<Track>,
    cache_hits: usize,
    skipped: usize,
}

struct Summary {
    inserted: usize,
    updated: usize,
    relocated: usize,
    deleted: usize,
    dirs_added: usize,
    dirs_removed: usize,
}

impl Plan {
    fn summary(&self) -> Summary {
        let relocated = self.pending.iter().filter(|p| p.relocated).count();
        let inserted = self.pending.iter().filter(|p| p.existing.is_none()).count();
        Summary {
            inserted,
            updated: self.pending.len() - inserted - relocated,
            relocated,
            deleted: self.stale_tracks.len(),
            dirs_added: self.new_dirs.len(),
            dirs_removed: self.stale_dirs.len(),
        }
    }
}

#[derive(Default)]
struct DirScan {
    cached: HashMap<String, Track>,
    direct_audio: bool,
}

struct Walk<'r, 'db, E> {
    reader: &'r IndexReader<'db>,
    extractor: &'r E,
    policy: DirectoryPolicy,
    root: &'r Path,
    known_dirs: HashMap<String, Directory>,
    open_dirs: HashMap<PathBuf, DirScan>,
    subtree_audio: HashSet<PathBuf>,
    visited: HashSet<String>,
    unreadable: HashSet<PathBuf>,
    new_dirs: Vec<String>,
    stale_dirs: Vec<Directory>,
    pending: Vec<PendingTrack>,
    demoted: HashSet<u64>,
    cache_hits: usize,
    skipped: usize,
}

impl<'r, 'db, E: Extractor> Walk<'r, 'db, E> {
    fn new(
        reader: &'r IndexReader<'db>,
        extractor: &'r E,
        policy: DirectoryPolicy,
        root: &'r Path,
    ) -> Result<Self, LibraryError> {
        let known_dirs = reader
            .list_directories()?
            .into_iter()
            .map(|dir| (dir.path.clone(), dir))
            .collect();
        Ok(Self {
            reader,
            extractor,
            policy,
            root,
            known_dirs,
            open_dirs: HashMap::new(),
            subtree_audio: HashSet::new(),
            visited: HashSet::new(),
            unreadable: HashSet::new(),
            new_dirs: Vec::new(),
            stale_dirs: Vec::new(),
            pending: Vec::new(),
            demoted: HashSet::new(),
            cache_hits: 0,
            skipped: 0,
        })
    }

    /// Post-order walk: a directory entry arrives after everything inside it.
    fn run(&mut self) -> Result<(), LibraryError> {
        let walker = WalkDir::new(self.root)
            .follow_links(false)
            .contents_first(true)
            .sort_by_file_name();
        for entry in walker {
            match entry {
                Ok(entry) => self.visit(&entry)?,
                Err(err) => {
                    warn!("Failed to read {:?}: {}", err.path(), err);
                    if let Some(path) = err.path() {
                        self.unreadable.insert(path.to_path_buf());
                    }
                }
            }
        }
        Ok(())
    }

    fn visit(&mut self, entry: &DirEntry) -> Result<(), LibraryError> {
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            debug!("Skipping symlink {:?}", entry.path());
            Ok(())
        } else if file_type.is_dir() {
            self.close_dir(entry.path());
            Ok(())
        } else if file_type.is_file() {
            self.visit_file(entry.path())
        } else {
            Ok(())
        }
    }

    fn visit_file(&mut self, path: &Path) -> Result<(), LibraryError> {
        let dir = match path.parent() {
            Some(dir) => dir,
            None => return Ok(()),
        };
        let (dir_path, filename) = match (path_to_string(dir), file_name_string(path)) {
            (Some(dir_path), Some(filename)) => (dir_path, filename),
            _ => {
                warn!("Skipping non UTF-8 path {:?}", path);
                return Ok(());
            }
        };

        self.open_dir(dir, &dir_path)?;
        let cached = self
            .open_dirs
            .get(dir)
            .and_then(|scan| scan.cached.get(&filename))
            .map(|track| (track.id, track.mtime));

        let mtime = match fs::symlink_metadata(path).and_then(|meta| mtime_secs(&meta)) {
            Ok(mtime) => mtime,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("{:?} vanished during scan", path);
                return Ok(());
            }
            Err(err) => {
                warn!("Failed to stat {:?}: {}", path, err);
                if cached.is_some() {
                    self.mark_audio(dir);
                }
                self.unreadable.insert(path.to_path_buf());
                return Ok(());
            }
        };

        if let Some((_, cached_mtime)) = cached {
            if cached_mtime == mtime {
                debug!("Unchanged {:?}", path);
                self.cache_hits += 1;
                self.mark_audio(dir);
                return Ok(());
            }
        }

        match self.extractor.extract(path) {
            Ok(Some(metadata)) => {
                self.mark_audio(dir);
                self.pending.push(PendingTrack {
                    dir_path,
                    filename,
                    mtime,
                    metadata,
                    existing: cached.map(|(id, _)| id),
                    relocated: false,
                });
            }
            Ok(None) => {
                info!("Skipping non-audio file {:?}", path);
                self.skipped += 1;
                if let Some((id, _)) = cached {
                    self.demoted.insert(id);
                }
            }
            Err(err) => {
                warn!("Failed to read tags for {:?}: {}", path, err);
                if cached.is_some() {
                    self.mark_audio(dir);
                    self.unreadable.insert(path.to_path_buf());
                }
            }
        }
        Ok(())
    }

    fn open_dir(&mut self, dir: &Path, dir_path: &str) -> Result<(), LibraryError> {
        if self.open_dirs.contains_key(dir) {
            return Ok(());
        }
        let mut scan = DirScan::default();
        if let Some(known) = self.known_dirs.get(dir_path) {
            for track in self.reader.tracks_in_directory(known.id)? {
                scan.cached.insert(track.filename.clone(), track);
            }
        }
        self.open_dirs.insert(dir.to_path_buf(), scan);
        Ok(())
    }

    fn mark_audio(&mut self, dir: &Path) {
        if let Some(scan) = self.open_dirs.get_mut(dir) {
            scan.direct_audio = true;
        }
    }

    fn close_dir(&mut self, dir: &Path) {
        let direct_audio = self
            .open_dirs
            .remove(dir)
            .map(|scan| scan.direct_audio)
            .unwrap_or(false);
        let child_audio = self.subtree_audio.remove(dir);
        let dir_path = match path_to_string(dir) {
            Some(dir_path) => dir_path,
            None => {
                warn!("Skipping non UTF-8 directory {:?}", dir);
                return;
            }
        };
        self.visited.insert(dir_path.clone());
        let known = self.known_dirs.get(&dir_path).cloned();

        // Rows under a directory we could not list stay as they are.
        if self.unreadable.contains(dir) && known.is_some() {
            self.propagate(dir);
            return;
        }

        let has_audio = match self.policy {
            DirectoryPolicy::Direct => direct_audio,
            DirectoryPolicy::Subtree => direct_audio || child_audio,
        };
        if has_audio {
            self.propagate(dir);
        }
        match (has_audio, known) {
            (true, None) => self.new_dirs.push(dir_path),
            (false, Some(known)) => self.stale_dirs.push(known),
            _ => {}
        }
    }

    fn propagate(&mut self, dir: &Path) {
        if dir == self.root {
            return;
        }
        if let Some(parent) = dir.parent() {
            self.subtree_audio.insert(parent.to_path_buf());
        }
    }

    fn finish(self) -> Result<Plan, LibraryError> {
        let mut stale_dirs = self.stale_dirs;
        for (path, dir) in &self.known_dirs {
            if self.visited.contains(path) {
                continue;
            }
            if !Path::new(path).starts_with(self.root) {
                debug!("Directory {} is outside {:?}", path, self.root);
                stale_dirs.push(dir.clone());
                continue;
            }
            match fs::symlink_metadata(path) {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => stale_dirs.push(dir.clone()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => stale_dirs.push(dir.clone()),
                Err(err) => warn!("Failed to stat directory {}: {}", path, err),
            }
        }
        stale_dirs.sort_by_key(|dir| dir.id);
        let stale_dir_ids: HashSet<u64> = stale_dirs.iter().map(|dir| dir.id).collect();
        let dir_paths: HashMap<u64, &str> = self
            .known_dirs
            .values()
            .map(|dir| (dir.id, dir.path.as_str()))
            .collect();

        let mut stale_tracks = Vec::new();
        let mut candidates = Vec::new();
        for (track, path) in self.reader.list_tracks_with_paths()? {
            let gone = match fs::symlink_metadata(&path) {
                Ok(meta) => !meta.is_file(),
                Err(err) if err.kind() == io::ErrorKind::NotFound => true,
                Err(err) => {
                    warn!("Failed to stat {:?}: {}", path, err);
                    false
                }
            };
            let dropped = stale_dir_ids.contains(&track.dir_id) || self.demoted.contains(&track.id);
            if !gone && !dropped {
                continue;
            }
            if gone {
                if let Some(candidate) = relocatable(self.reader, &track, &dir_paths)? {
                    candidates.push(candidate);
                }
            }
            stale_tracks.push(track);
        }

        let mut pending = self.pending;
        let mut relocated_ids = HashSet::new();
        for item in pending.iter_mut().filter(|item| item.existing.is_none()) {
            let found = candidates.iter().position(|candidate| candidate.matches(item));
            if let Some(pos) = found {
                let candidate = candidates.remove(pos);
                debug!(
                    "{}/{} is {}/{} relocated",
                    item.dir_path, item.filename, candidate.dir_path, candidate.filename
                );
                item.existing = Some(candidate.id);
                item.relocated = true;
                relocated_ids.insert(candidate.id);
            }
        }
        stale_tracks.retain(|track| !relocated_ids.contains(&track.id));

        Ok(Plan {
            stale_dirs,
            new_dirs: self.new_dirs,
            pending,
            stale_tracks,
            cache_hits: self.cache_hits,
            skipped: self.skipped,
        })
    }
}

fn relocatable(
    reader: &IndexReader<'_>,
    track: &Track,
    dir_paths: &HashMap<u64, &str>,
) -> Result<Option<Relocatable>, LibraryError> {
    let dir_path = match dir_paths.get(&track.dir_id) {
        Some(dir_path) => dir_path.to_string(),
        None => return Ok(None),
    };
    let artist = match reader.get_artist(track.artist_id)? {
        Some(artist) => artist.name,
        None => return Ok(None),
    };
    let album = match reader.get_album(track.album_id)? {
        Some(album) => album.name,
        None => return Ok(None),
    };
    Ok(Some(Relocatable {
        id: track.id,
        title: track.title.clone(),
        artist,
        album,
        dir_path,
        filename: track.filename.clone(),
    }))
}

/// Writes a plan in dependency order: stale directories, new directories,
/// track upserts, stale tracks.
fn apply(writer: &IndexWriter<'_>, plan: &Plan) -> Result<(), LibraryError> {
    for dir in &plan.stale_dirs {
        info!("Deleting directory {}", dir.path);
        writer.delete_directory(dir.id)?;
    }
    for path in &plan.new_dirs {
        info!("Inserting directory {}", path);
        writer.insert_directory(path)?;
    }

    for item in &plan.pending {
        let meta = &item.metadata;
        let artist_id = writer.get_or_create_artist(&meta.artist)?;
        let album_artist_id = writer.get_or_create_artist(&meta.album_artist)?;
        let album_id = writer.get_or_create_album(&meta.album, album_artist_id)?;
        let dir = writer.find_directory(&item.dir_path)?.ok_or_else(|| {
            LibraryError::Inconsistent(format!("directory {} is not indexed", item.dir_path))
        })?;
        let draft = TrackDraft {
            title: meta.title.clone(),
            artist_id,
            album_id,
            dir_id: dir.id,
            filename: item.filename.clone(),
            mtime: item.mtime,
        };
        match item.existing {
            Some(track_id) => {
                info!("Updating track {}/{}", item.dir_path, item.filename);
                writer.update_track(track_id, &draft)?;
            }
            None => {
                info!("Inserting track {}/{}", item.dir_path, item.filename);
                writer.insert_track(&draft)?;
            }
        }
    }

    for track in &plan.stale_tracks {
        info!("Deleting track {} ({})", track.title, track.filename);
        writer.delete_track(track.id)?;
    }
    Ok(())
}
