use std::env;
use std::path::PathBuf;

use library::Index;
use tracing_subscriber::EnvFilter;

const RESULT_LIMIT: usize = 10;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let index_path = args.next().ok_or("usage: search_titles <INDEX_PATH> <QUERY...>")?;
    let query = args.collect::<Vec<_>>().join(" ");
    if query.trim().is_empty() {
        return Err("usage: search_titles <INDEX_PATH> <QUERY...>".into());
    }

    let index = Index::open(&PathBuf::from(&index_path))?;
    let reader = index.reader()?;
    let hits = reader.search_titles(&query, RESULT_LIMIT)?;
    if hits.is_empty() {
        println!("No results for \"{}\"", query);
        return Ok(());
    }

    for hit in hits {
        let path = reader
            .resolve_track_path(hit.id)?
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        println!("{}\n    {}", hit.pretty(), path);
    }

    Ok(())
}
