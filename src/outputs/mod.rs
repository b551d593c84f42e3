//! Output generation: renderings of the published snapshot.
//!
//! # Submodules
//!
//! - [`json`]: writes the snapshot as JSON for API consumption
//! - [`markdown`]: renders the snapshot as a ranked Markdown page
//!
//! Both sinks are optional and independent; a failure in one never stops
//! the other.

pub mod json;
pub mod markdown;

use crate::models::Snapshot;
use std::path::PathBuf;
use tracing::error;

/// Where rendered snapshots go. `None` disables a sink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputDirs {
    pub json: Option<PathBuf>,
    /// Archive copies kept under `json`; `0` writes no archive.
    pub json_archive_keep: usize,
    pub markdown: Option<PathBuf>,
}

impl OutputDirs {
    pub fn is_empty(&self) -> bool {
        self.json.is_none() && self.markdown.is_none()
    }
}

/// Write `snapshot` to every configured sink concurrently.
///
/// Returns the number of sinks that failed.
pub async fn write_all(snapshot: &Snapshot, dirs: &OutputDirs) -> usize {
    let json = async {
        match &dirs.json {
            Some(dir) => json::write_snapshot(snapshot, dir, dirs.json_archive_keep)
                .await
                .map(drop),
            None => Ok(()),
        }
    };
    let markdown = async {
        match &dirs.markdown {
            Some(dir) => markdown::write_snapshot(snapshot, dir).await.map(drop),
            None => Ok(()),
        }
    };

    let (json, markdown) = futures::join!(json, markdown);
    let mut failed = 0;
    if let Err(e) = json {
        error!(error = %e, "Failed to write JSON output");
        failed += 1;
    }
    if let Err(e) = markdown {
        error!(error = %e, "Failed to write Markdown output");
        failed += 1;
    }
    failed
}
