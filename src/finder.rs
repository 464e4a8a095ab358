use crate::core::hash::{HashAlgorithm, HashError, PerceptualHasher};
use crate::core::matcher::{self, Match, Reference};
use crate::core::report::{self, Report, ReportError, ReportFormat};
use crate::core::scanner::{self, ScanError};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Candidates strictly closer than this many bits are reported.
pub const DEFAULT_THRESHOLD: u32 = 5;

#[derive(Debug, Error)]
pub enum FinderError {
    #[error("Failed to process the reference image")]
    Reference(#[source] HashError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Failed to write report {path}")]
    Report {
        path: String,
        #[source]
        source: ReportError,
    },
}

/// Fully resolved inputs for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderConfig {
    pub reference: PathBuf,
    pub directory: PathBuf,
    pub output: PathBuf,
    pub format: ReportFormat,
    pub threshold: u32,
    pub algorithm: HashAlgorithm,
    pub show_progress: bool,
}

impl FinderConfig {
    /// Fill in defaults for anything the caller left out.
    ///
    /// The directory defaults to the one holding the reference image. The
    /// format is taken from the output extension when not given, and the
    /// output defaults to `duplicate-images.<ext>`.
    pub fn resolve(
        reference: PathBuf,
        directory: Option<PathBuf>,
        output: Option<PathBuf>,
        format: Option<ReportFormat>,
    ) -> Self {
        let directory = directory.unwrap_or_else(|| default_directory(&reference));
        let format = format
            .or_else(|| output.as_deref().and_then(ReportFormat::from_path))
            .unwrap_or_default();
        let output = output.unwrap_or_else(|| format.default_output());

        Self {
            reference,
            directory,
            output,
            format,
            threshold: DEFAULT_THRESHOLD,
            algorithm: HashAlgorithm::default(),
            show_progress: true,
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

fn default_directory(reference: &Path) -> PathBuf {
    match reference.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[derive(Debug, Clone)]
pub struct FinderSummary {
    pub discovered: usize,
    pub processed: usize,
    pub failed: usize,
    pub matches: Vec<Match>,
    pub output: PathBuf,
}

/// Hash the reference, compare every image under the directory against it,
/// and write the report.
///
/// Nothing is written when the reference image cannot be hashed.
pub fn run(config: &FinderConfig) -> Result<FinderSummary, FinderError> {
    let hasher = PerceptualHasher::new(config.algorithm);
    let reference_hash = hasher
        .hash_file(&config.reference)
        .map_err(FinderError::Reference)?;
    tracing::info!(
        "Reference image hashed with {}: {}",
        config.algorithm,
        reference_hash.to_base64()
    );

    let candidates = scanner::discover_images(&config.directory, config.show_progress)?;
    if config.show_progress {
        println!("{}", discovery_line(candidates.len()));
    }

    let outcome = benchmark("comparing images", || {
        matcher::find_matches(
            &hasher,
            &Reference {
                path: &config.reference,
                hash: &reference_hash,
            },
            &candidates,
            config.threshold,
            config.show_progress,
        )
    });

    let report = Report::new(
        &config.reference,
        &config.directory,
        config.threshold,
        config.algorithm,
        &outcome.matches,
    );
    report::write_report(&config.output, config.format, &report).map_err(|source| {
        FinderError::Report {
            path: config.output.display().to_string(),
            source,
        }
    })?;

    Ok(FinderSummary {
        discovered: candidates.len(),
        processed: outcome.processed,
        failed: outcome.failed,
        matches: outcome.matches,
        output: config.output.clone(),
    })
}

fn discovery_line(count: usize) -> String {
    format!("▶ Found {} image files to process", count)
}

/// Run `f()`, log how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    tracing::info!("{} took {:.2?}", label, start.elapsed());
    result
}
