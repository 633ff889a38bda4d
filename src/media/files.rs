//! Output paths and small file helpers used by the nodes and the CLI.

use crate::Result;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

pub fn ensure_dir(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}

/// `{dir}/{filename}`, or `{dir}/{prefix}_{unix_millis}{extension}` when no
/// filename is given. Creates `dir`.
pub fn output_path(
    dir: &Path,
    filename: Option<&str>,
    prefix: &str,
    extension: &str,
) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let filename = match filename.map(str::trim).filter(|f| !f.is_empty()) {
        Some(name) => name.to_string(),
        None => format!("{}_{}{}", prefix, Utc::now().timestamp_millis(), extension),
    };
    Ok(dir.join(filename))
}
