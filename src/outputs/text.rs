//! Plain-text copy of the rendered digest, for inspecting what the model saw.

use crate::utils::parent_dir;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_digest(digest: &str, path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(parent_dir(path)).await?;
    fs::write(path, digest).await?;
    info!(bytes = digest.len(), "Wrote rendered digest");
    Ok(())
}
