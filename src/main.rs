use anyhow::{Context, Result};
use clap::Parser;
use refmatch::{DEFAULT_THRESHOLD, FinderConfig, HashAlgorithm, ReportFormat};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "refmatch",
    version,
    about = "Find duplicates of a reference image in a directory and save the results"
)]
struct Cli {
    /// Path to the reference image
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// Directory to scan (default: directory containing the reference image)
    #[arg(short, long, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Output file (default: `duplicate-images.<ext>` for the chosen format)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report format (default: inferred from the output extension, else text)
    #[arg(short, long, value_enum)]
    format: Option<ReportFormat>,

    /// Report images whose hash distance is strictly below this value
    #[arg(short, long, env = "REFMATCH_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    threshold: u32,

    /// Perceptual hash algorithm
    #[arg(short, long, value_enum, env = "REFMATCH_ALGORITHM", default_value_t = HashAlgorithm::PHash)]
    algorithm: HashAlgorithm,

    /// Hide progress bars and log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log every comparison
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> FinderConfig {
        FinderConfig::resolve(self.reference, self.directory, self.output, self.format)
            .with_threshold(self.threshold)
            .with_algorithm(self.algorithm)
            .with_progress(!self.quiet)
    }
}

fn init_tracing(quiet: bool, verbose: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let config = cli.into_config();

    println!("Image Duplicate Finder");
    println!("=====================");
    println!("▶ Using reference image: {}", config.reference.display());
    println!("▶ Scanning directory: {}", config.directory.display());
    println!("▶ Results will be saved to: {}", config.output.display());

    let summary = refmatch::run(&config).with_context(|| {
        format!(
            "Failed to find duplicates of {}",
            config.reference.display()
        )
    })?;

    println!(
        "▶ Processed {}/{} image files",
        summary.processed, summary.discovered
    );
    if summary.failed > 0 {
        println!("⚠️  {} file(s) could not be read and were skipped", summary.failed);
    }

    println!("\n--- RESULTS ---");
    if summary.matches.is_empty() {
        println!("No duplicate images found matching the reference image.");
    } else {
        println!(
            "Found {} duplicates of the reference image.",
            summary.matches.len()
        );
        for m in &summary.matches {
            println!("   ▶ {} (distance {})", m.path.display(), m.distance);
        }
        println!(
            "✅ Duplicate filenames have been saved to {}",
            summary.output.display()
        );
    }

    Ok(())
}
