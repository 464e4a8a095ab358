use crate::core::hash::HashAlgorithm;
use crate::core::matcher::Match;
use chrono::Utc;
use clap::ValueEnum;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Base name used when no output path is given.
pub const DEFAULT_REPORT_STEM: &str = "duplicate-images";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// One filename per line
    #[default]
    Text,
    /// Product ID, Asset ID, Filename columns
    Csv,
    /// Full match details with distances
    Json,
}

impl ReportFormat {
    /// Infer the format from an output file's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(ReportFormat::Csv),
            "json" => Some(ReportFormat::Json),
            "txt" | "text" => Some(ReportFormat::Text),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }

    pub fn default_output(&self) -> PathBuf {
        PathBuf::from(format!("{}.{}", DEFAULT_REPORT_STEM, self.extension()))
    }
}

/// One matched asset as it appears in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRecord {
    pub product_id: String,
    pub asset_id: String,
    pub filename: String,
    pub path: String,
    pub distance: u32,
}

impl DuplicateRecord {
    pub fn from_match(m: &Match) -> Self {
        let filename = m
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let asset_id = Path::new(&filename)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.clone());

        Self {
            product_id: extract_product_id(&filename).to_string(),
            asset_id,
            filename,
            path: m.path.display().to_string(),
            distance: m.distance,
        }
    }
}

/// Product IDs are the part of an asset filename before the first `_`.
/// Filenames without such a prefix are their own product ID.
pub fn extract_product_id(filename: &str) -> &str {
    match filename.split_once('_') {
        Some((prefix, _)) if !prefix.is_empty() => prefix,
        _ => filename,
    }
}

/// Everything a report needs to describe one run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub reference: String,
    pub directory: String,
    pub threshold: u32,
    pub algorithm: HashAlgorithm,
    pub generated_at: String,
    pub matches: Vec<DuplicateRecord>,
}

impl Report {
    pub fn new(
        reference: &Path,
        directory: &Path,
        threshold: u32,
        algorithm: HashAlgorithm,
        matches: &[Match],
    ) -> Self {
        Self {
            reference: reference.display().to_string(),
            directory: directory.display().to_string(),
            threshold,
            algorithm,
            generated_at: Utc::now().to_rfc3339(),
            matches: matches.iter().map(DuplicateRecord::from_match).collect(),
        }
    }
}

/// Write `report` to `path` in the given format, replacing any existing file.
pub fn write_report(path: &Path, format: ReportFormat, report: &Report) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    match format {
        ReportFormat::Text => write_text(file, report),
        ReportFormat::Csv => write_csv(file, report),
        ReportFormat::Json => write_json(file, report),
    }
}

fn write_text(file: File, report: &Report) -> Result<(), ReportError> {
    let mut out = BufWriter::new(file);
    let names: Vec<&str> = report.matches.iter().map(|r| r.filename.as_str()).collect();
    out.write_all(names.join("\n").as_bytes())?;
    out.flush()?;
    Ok(())
}

fn write_csv(file: File, report: &Report) -> Result<(), ReportError> {
    // No matches leaves an empty file rather than a lone header.
    if report.matches.is_empty() {
        return Ok(());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);
    writer.write_record(["Product ID", "Asset ID", "Filename"])?;
    for record in &report.matches {
        writer.write_record([&record.product_id, &record.asset_id, &record.filename])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(file: File, report: &Report) -> Result<(), ReportError> {
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_matches() -> Vec<Match> {
        vec![
            Match {
                path: PathBuf::from("gallery/SKU123_front.jpg"),
                distance: 0,
            },
            Match {
                path: PathBuf::from("gallery/nested/banner.v2.png"),
                distance: 3,
            },
        ]
    }

    fn sample_report(matches: &[Match]) -> Report {
        Report::new(
            Path::new("ref.jpg"),
            Path::new("gallery"),
            5,
            HashAlgorithm::PHash,
            matches,
        )
    }

    #[test]
    fn test_extract_product_id() {
        assert_eq!(extract_product_id("SKU123_front.jpg"), "SKU123");
        assert_eq!(extract_product_id("a_b_c.png"), "a");
        assert_eq!(extract_product_id("noprefix.png"), "noprefix.png");
        assert_eq!(extract_product_id("_leading.png"), "_leading.png");
    }

    #[test]
    fn test_record_from_match() {
        let record = DuplicateRecord::from_match(&sample_matches()[1]);
        assert_eq!(record.filename, "banner.v2.png");
        assert_eq!(record.asset_id, "banner.v2");
        assert_eq!(record.product_id, "banner.v2.png");
        assert_eq!(record.distance, 3);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ReportFormat::from_path(Path::new("out.CSV")), Some(ReportFormat::Csv));
        assert_eq!(ReportFormat::from_path(Path::new("out.json")), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::from_path(Path::new("out.txt")), Some(ReportFormat::Text));
        assert_eq!(ReportFormat::from_path(Path::new("out.log")), None);
        assert_eq!(ReportFormat::from_path(Path::new("out")), None);
        assert_eq!(
            ReportFormat::Csv.default_output(),
            PathBuf::from("duplicate-images.csv")
        );
    }

    #[test]
    fn test_text_report() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.txt");
        write_report(&path, ReportFormat::Text, &sample_report(&sample_matches())).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "SKU123_front.jpg\nbanner.v2.png");
    }

    #[test]
    fn test_csv_report() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");
        write_report(&path, ReportFormat::Csv, &sample_report(&sample_matches())).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Product ID,Asset ID,Filename\r\n\
             SKU123,SKU123_front,SKU123_front.jpg\r\n\
             banner.v2.png,banner.v2,banner.v2.png\r\n"
        );
    }

    #[test]
    fn test_csv_quotes_commas() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");
        let matches = vec![Match {
            path: PathBuf::from("a,b_c.png"),
            distance: 1,
        }];
        write_report(&path, ReportFormat::Csv, &sample_report(&matches)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("\"a,b\",\"a,b_c\",\"a,b_c.png\"\r\n"));
    }

    #[test]
    fn test_empty_reports() {
        let temp_dir = TempDir::new().unwrap();
        let report = sample_report(&[]);

        for format in [ReportFormat::Text, ReportFormat::Csv] {
            let path = temp_dir.path().join(format.default_output());
            fs::write(&path, b"stale").unwrap();
            write_report(&path, format, &report).unwrap();
            assert_eq!(fs::read_to_string(&path).unwrap(), "");
        }

        let path = temp_dir.path().join("out.json");
        write_report(&path, ReportFormat::Json, &report).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["matches"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_json_report() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("out.json");
        write_report(&path, ReportFormat::Json, &sample_report(&sample_matches())).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["reference"], "ref.jpg");
        assert_eq!(value["threshold"], 5);
        assert_eq!(value["algorithm"], "phash");
        assert!(value["generated_at"].as_str().unwrap().contains('T'));
        assert_eq!(value["matches"][0]["product_id"], "SKU123");
        assert_eq!(value["matches"][1]["distance"], 3);
    }
}
