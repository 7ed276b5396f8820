use std::env;
use std::path::PathBuf;

use library::{Index, ScanOptions, Scanner};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let library_path = args
        .next()
        .or_else(|| env::var("LIBRARY_PATH").ok())
        .ok_or("LIBRARY_PATH not set and no path argument")?;
    let index_path = args
        .next()
        .or_else(|| env::var("INDEX_PATH").ok())
        .unwrap_or_else(|| "data/library.redb".to_string());

    let index = Index::open(&PathBuf::from(&index_path))?;
    let scanner = Scanner::with_lofty(PathBuf::from(&library_path), index, ScanOptions::default());
    scanner.scan()?;
    let stats = scanner.index().stats()?;

    println!(
        "Indexed: {} directories, {} tracks, {} artists, {} albums",
        stats.directories, stats.tracks, stats.artists, stats.albums
    );

    Ok(())
}
