//! Markdown rendering of a snapshot for human readers.
//!
//! The page is a numbered list in rank order followed by a short footer:
//!
//! ```text
//! # Top Stories
//!
//! _Fetched 2025-05-06 08:00:20 UTC_
//!
//! 1. [Title](<https://a.com/x>) (a.com) - 50 points
//! 2. [Other](<badurl>) - 10 points
//!
//! ---
//! 2 of 3 stories resolved in 0.42s
//! ```

use crate::models::{Snapshot, StoryRecord};
use crate::utils::write_atomically;
use std::fmt::Write;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const LATEST_FILENAME: &str = "top_stories.md";

/// Render `snapshot` as a Markdown page.
pub fn snapshot_to_markdown(snapshot: &Snapshot) -> String {
    let mut md = String::new();
    md.push_str("# Top Stories\n\n");
    let _ = writeln!(
        md,
        "_Fetched {}_\n",
        snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if snapshot.is_empty() {
        md.push_str("No stories could be fetched.\n");
    }
    for (rank, story) in snapshot.stories.iter().enumerate() {
        let _ = writeln!(md, "{}. {}", rank + 1, story_line(story));
    }

    let _ = write!(
        md,
        "\n---\n{} of {} stories resolved in {:.2}s\n",
        snapshot.len(),
        snapshot.requested,
        snapshot.elapsed_ms as f64 / 1000.0
    );
    md
}

fn story_line(story: &StoryRecord) -> String {
    let title = if story.title.is_empty() {
        story.url.as_str()
    } else {
        story.title.as_str()
    };
    let mut line = format!(
        "[{}](<{}>)",
        escape_link_text(title),
        escape_link_destination(&story.url)
    );
    if !story.domain.is_empty() {
        let _ = write!(line, " ({})", story.domain);
    }
    let noun = if story.score == 1 { "point" } else { "points" };
    let _ = write!(line, " - {} {}", story.score, noun);
    line
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Escape a URL for use inside a `<...>` link destination, which may hold
/// spaces and parentheses but no unescaped angle brackets or line breaks.
fn escape_link_destination(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '\\' | '<' | '>' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("%0A"),
            '\r' => out.push_str("%0D"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `snapshot` and atomically replace the Markdown page with it.
#[instrument(level = "info", skip_all, fields(markdown_output_dir = %markdown_output_dir.display()))]
pub async fn write_snapshot(snapshot: &Snapshot, markdown_output_dir: &Path) -> io::Result<PathBuf> {
    let path = markdown_output_dir.join(LATEST_FILENAME);
    write_atomically(&path, snapshot_to_markdown(snapshot).as_bytes()).await?;
    info!(path = %path.display(), "Wrote Markdown snapshot");
    Ok(path)
}
