use crate::config::{Config, OutputFormat};
use crate::probe::{Vulnerability, VulnerabilitySummary};
use crate::{Result, ScanError};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Outcome of one scan of one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: String,
    pub target: String,
    pub exhaustive: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub probes_sent: usize,
    pub transport_failures: usize,
    pub vulnerabilities: Vec<VulnerabilitySummary>,
}

impl ScanReport {
    pub fn new(target: impl Into<String>, exhaustive: bool) -> Self {
        Self {
            scan_id: Uuid::new_v4().to_string(),
            target: target.into(),
            exhaustive,
            started_at: Utc::now(),
            completed_at: None,
            probes_sent: 0,
            transport_failures: 0,
            vulnerabilities: Vec::new(),
        }
    }

    pub fn record(&mut self, vuln: &Vulnerability) {
        self.vulnerabilities.push(vuln.summary());
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    target: &'a str,
    url: &'a str,
    param: &'a str,
    traversal: String,
    signature: &'a str,
    category: &'a str,
    matched_path: &'a str,
    extracted_fields: String,
    discovered_at: String,
}

pub struct ReportGenerator {
    config: Config,
}

impl ReportGenerator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn generate_report(&self, report: &ScanReport) -> Result<Vec<PathBuf>> {
        let mut generated_files = Vec::new();

        fs::create_dir_all(&self.config.reporting.output_dir).await
            .map_err(|e| ScanError::Reporting(format!("Failed to create output directory: {}", e)))?;

        let timestamp = report.started_at.format("%Y%m%d_%H%M%S");
        let base_filename = format!("lfiscan_report_{}", timestamp);

        for format in &self.config.reporting.formats {
            let file_path = match format {
                OutputFormat::Json => {
                    let path = self.config.reporting.output_dir.join(format!("{}.json", base_filename));
                    self.generate_json_report(report, &path).await?;
                    path
                }
                OutputFormat::Csv => {
                    let path = self.config.reporting.output_dir.join(format!("{}.csv", base_filename));
                    self.generate_csv_report(report, &path).await?;
                    path
                }
            };

            generated_files.push(file_path);
        }

        info!("Generated {} report files", generated_files.len());
        Ok(generated_files)
    }

    async fn generate_json_report(&self, report: &ScanReport, path: &Path) -> Result<()> {
        debug!("Generating JSON report: {}", path.display());

        let json_data = serde_json::to_string_pretty(report)?;
        fs::write(path, json_data).await
            .map_err(|e| ScanError::Reporting(format!("Failed to write JSON report: {}", e)))?;

        Ok(())
    }

    async fn generate_csv_report(&self, report: &ScanReport, path: &Path) -> Result<()> {
        debug!("Generating CSV report: {}", path.display());

        let mut writer = csv::Writer::from_writer(Vec::new());
        for vuln in &report.vulnerabilities {
            writer.serialize(CsvRow {
                target: &report.target,
                url: &vuln.url,
                param: &vuln.param,
                traversal: vuln.traversal.to_string(),
                signature: &vuln.signature,
                category: &vuln.category,
                matched_path: &vuln.matched_path,
                extracted_fields: vuln
                    .extracted_fields
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join("; "),
                discovered_at: vuln.discovered_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            })?;
        }

        let data = writer
            .into_inner()
            .map_err(|e| ScanError::Reporting(format!("Failed to flush CSV report: {}", e)))?;
        fs::write(path, data).await
            .map_err(|e| ScanError::Reporting(format!("Failed to write CSV report: {}", e)))?;

        Ok(())
    }

    /// Saves each confirmed file under `base`, mirroring its remote path.
    pub async fn mirror_files(&self, vulnerabilities: &[Vulnerability], base: &Path) -> Result<Vec<PathBuf>> {
        let mut saved = Vec::new();
        for vuln in vulnerabilities {
            saved.push(vuln.file().mirror(base).await?);
        }
        Ok(saved)
    }
}
