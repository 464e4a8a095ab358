use crate::core::hash::{PerceptualHasher, distance};
use image_hasher::ImageHash;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Component, Path, PathBuf};

/// How often, in processed images, a progress line is logged.
const PROGRESS_LOG_INTERVAL: usize = 10;

/// A candidate whose hash is within the threshold of the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub path: PathBuf,
    pub distance: u32,
}

#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub matches: Vec<Match>,
    /// Candidates handled, including the skipped reference and failures.
    pub processed: usize,
    /// Candidates that could not be opened or decoded.
    pub failed: usize,
}

/// The reference image and the hash every candidate is compared against.
pub struct Reference<'a> {
    pub path: &'a Path,
    pub hash: &'a ImageHash,
}

/// Compare every candidate against the reference hash.
///
/// A candidate matches when its distance is strictly below `threshold`.
/// The reference file itself is never reported, and unreadable candidates
/// are logged and skipped.
pub fn find_matches(
    hasher: &PerceptualHasher,
    reference: &Reference<'_>,
    candidates: &[PathBuf],
    threshold: u32,
    show_progress: bool,
) -> MatchOutcome {
    let total = candidates.len();
    let reference_abs = absolute(reference.path);
    let bar = progress_bar(total, show_progress);
    let mut outcome = MatchOutcome::default();

    for path in candidates {
        if absolute(path) == reference_abs {
            tracing::debug!("Skipping reference image {}", path.display());
        } else {
            match hasher.hash_file(path) {
                Ok(hash) => {
                    let dist = distance(reference.hash, &hash);
                    tracing::debug!("{} distance={}", path.display(), dist);
                    if dist < threshold {
                        outcome.matches.push(Match {
                            path: path.clone(),
                            distance: dist,
                        });
                    }
                }
                Err(err) => {
                    let err = anyhow::Error::new(err);
                    bar.suspend(|| tracing::warn!("Error processing {}: {:#}", path.display(), err));
                    outcome.failed += 1;
                }
            }
        }

        outcome.processed += 1;
        bar.inc(1);
        if outcome.processed % PROGRESS_LOG_INTERVAL == 0 || outcome.processed == total {
            tracing::info!("Processed {}/{} images...", outcome.processed, total);
        }
    }

    bar.finish_and_clear();
    outcome
}

fn progress_bar(total: usize, show_progress: bool) -> ProgressBar {
    if !show_progress {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(total as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} images ({eta})")
    {
        bar.set_style(style.progress_chars("##-"));
    }
    bar
}

// Absolute form with `.` and `..` collapsed textually. Symlinks are not
// resolved, so an alias of the reference is still a candidate.
fn absolute(path: &Path) -> PathBuf {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
