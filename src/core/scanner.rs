use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions considered candidate images, compared lowercase.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid path: {path}")]
    InvalidPath { path: String },
}

/// Whether `path` carries one of the supported image extensions.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively walk `dir`, returning every image file path found.
///
/// Entries are yielded sorted by file name within each directory so that
/// reports come out in a stable order. Directory entries that cannot be
/// read are skipped. Symlinks to files are kept, dangling ones included, so
/// that they surface as failures when hashed.
pub fn discover_images(dir: &Path, show_progress: bool) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.exists() {
        return Err(ScanError::InvalidPath {
            path: dir.display().to_string(),
        });
    }
    if !dir.is_dir() {
        return Err(ScanError::InvalidPath {
            path: format!("{} is not a directory", dir.display()),
        });
    }

    let spinner = if show_progress {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("Scanning for images…");
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    } else {
        ProgressBar::hidden()
    };

    let mut images = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {}", err);
                continue;
            }
        };

        let is_dir = entry.file_type().is_dir() || entry.path().is_dir();
        if !is_dir && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
        spinner.tick();
    }

    spinner.finish_and_clear();
    tracing::info!("Discovered {} image files under {}", images.len(), dir.display());
    Ok(images)
}
