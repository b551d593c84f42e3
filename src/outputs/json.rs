//! JSON output for API consumers.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── top_stories.json        # always the latest published snapshot
//! └── 2025-05-06/
//!     ├── 08-00-00-000.json   # archive copies, only with json_archive_keep > 0
//!     └── 08-00-20-417.json
//! ```
//!
//! At most `json_archive_keep` archive copies are kept; older ones are
//! deleted after every write, along with date directories left empty.

use crate::models::Snapshot;
use crate::utils::write_atomically;
use chrono::NaiveDate;
use itertools::Itertools;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, instrument};

pub const LATEST_FILENAME: &str = "top_stories.json";

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Path of the archive copy for `snapshot`, derived from its fetch time.
pub fn archive_path(json_output_dir: &Path, snapshot: &Snapshot) -> PathBuf {
    json_output_dir
        .join(snapshot.fetched_at.format(DAY_FORMAT).to_string())
        .join(format!("{}.json", snapshot.fetched_at.format("%H-%M-%S-%3f")))
}

/// Write `snapshot` as the latest JSON file and, when `archive_keep > 0`,
/// as a dated archive copy, pruning the archive down to `archive_keep`.
///
/// The latest file is replaced atomically. A failed archive write or prune
/// is logged but does not fail the call.
///
/// # Returns
///
/// The path of the latest file.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display()))]
pub async fn write_snapshot(
    snapshot: &Snapshot,
    json_output_dir: &Path,
    archive_keep: usize,
) -> io::Result<PathBuf> {
    let json = serde_json::to_vec_pretty(snapshot).map_err(io::Error::other)?;

    let latest = json_output_dir.join(LATEST_FILENAME);
    write_atomically(&latest, &json).await?;
    info!(path = %latest.display(), stories = snapshot.len(), "Wrote JSON snapshot");

    if archive_keep == 0 {
        return Ok(latest);
    }

    let archive = archive_path(json_output_dir, snapshot);
    if let Err(e) = write_archive(&archive, &json).await {
        error!(path = %archive.display(), error = %e, "Failed to write JSON archive copy");
    }
    match prune_archive(json_output_dir, archive_keep).await {
        Ok(0) => {}
        Ok(removed) => debug!(removed, keep = archive_keep, "Pruned JSON archive"),
        Err(e) => error!(error = %e, "Failed to prune JSON archive"),
    }

    Ok(latest)
}

async fn write_archive(path: &Path, json: &[u8]) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }
    fs::write(path, json).await
}

/// Delete the oldest archive copies under `json_output_dir` so that at most
/// `keep` remain, then remove date directories left empty.
///
/// Only `YYYY-MM-DD` directories and the `.json` files inside them are
/// considered. Archive names sort chronologically, so path order is age
/// order.
///
/// # Returns
///
/// The number of copies deleted.
pub async fn prune_archive(json_output_dir: &Path, keep: usize) -> io::Result<usize> {
    let mut copies = Vec::new();
    let mut days = fs::read_dir(json_output_dir).await?;
    while let Some(day) = days.next_entry().await? {
        let name = day.file_name();
        let is_day = name
            .to_str()
            .is_some_and(|n| NaiveDate::parse_from_str(n, DAY_FORMAT).is_ok());
        if !is_day || !day.file_type().await?.is_dir() {
            continue;
        }
        let mut files = fs::read_dir(day.path()).await?;
        while let Some(file) = files.next_entry().await? {
            let path = file.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                copies.push(path);
            }
        }
    }

    copies.sort();
    let excess = copies.len().saturating_sub(keep);
    for path in &copies[..excess] {
        fs::remove_file(path).await?;
    }

    for day in copies[..excess].iter().filter_map(|p| p.parent()).dedup() {
        let mut entries = fs::read_dir(day).await?;
        if entries.next_entry().await?.is_none() {
            fs::remove_dir(day).await?;
        }
    }

    Ok(excess)
}
