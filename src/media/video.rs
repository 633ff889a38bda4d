use super::files::ensure_dir;
use crate::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// `{output_dir}/videos/{filename}`, defaulting to `gemini_video_{unix}.mp4`.
pub fn video_output_path(output_dir: &Path, filename: Option<&str>) -> Result<PathBuf> {
    let dir = ensure_dir(&output_dir.join("videos"))?;
    let filename = match filename.map(str::trim).filter(|f| !f.is_empty()) {
        Some(name) if Path::new(name).extension().is_some() => name.to_string(),
        Some(name) => format!("{}.mp4", name),
        None => format!("gemini_video_{}.mp4", Utc::now().timestamp()),
    };
    Ok(dir.join(filename))
}

pub async fn save_video(bytes: &[u8], path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    tracing::info!("Saved video ({} bytes) to {}", bytes.len(), path.display());
    Ok(path.to_path_buf())
}
