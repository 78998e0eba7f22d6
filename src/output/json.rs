//! JSON report export

use crate::stats::CrawlStats;
use crate::CrawlerError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Everything written by `--json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct JsonReport {
    pub sitemap: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Outcome classification, absent for a healthy crawl
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub stats: CrawlStats,
}

/// Writes a report as pretty-printed JSON
pub fn write_json_report(report: &JsonReport, output_path: &Path) -> Result<(), CrawlerError> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
