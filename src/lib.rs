//! Find images that look like a reference image anywhere in a directory tree.

pub mod core;
pub mod finder;

pub use crate::core::hash::{HashAlgorithm, PerceptualHasher};
pub use crate::core::report::ReportFormat;
pub use finder::{DEFAULT_THRESHOLD, FinderConfig, FinderError, FinderSummary, run};
