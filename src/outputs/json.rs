//! JSON output of the daily brief.
//!
//! The brief is a flat `{date, generated_at, content}` object written to a
//! single file that each run overwrites.

use crate::models::DailyBrief;
use crate::utils::parent_dir;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`DailyBrief`] to `path` as pretty-printed JSON.
///
/// Missing parent directories are created. An existing file is replaced.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_brief(brief: &DailyBrief, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(brief)?;

    let dir = parent_dir(path);
    if let Err(e) = fs::create_dir_all(dir).await {
        error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    fs::write(path, json).await?;
    info!(date = %brief.date, bytes = brief.content.len(), "Wrote daily brief");
    Ok(())
}
