use crate::escape::{Escape, TraversalSpec};
use crate::signature::Category;
use crate::transport::HttpMethod;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

/// Deepest escape tried by default.
pub const MAX_DEPTH: usize = 15;

/// Deepest escape accepted at all. No real document root sits this far down.
pub const DEPTH_LIMIT: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scan: ScanConfig,
    pub http: HttpConfig,
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub min_depth: usize,
    pub max_depth: usize,
    pub separator: char,
    pub prefix: Option<String>, // overrides the depth range
    pub terminate_with_null: bool,
    pub os: Option<String>,
    pub method: HttpMethod,
    pub exhaustive: bool,
    pub workers: usize, // parameters scanned concurrently
    #[serde(default)]
    pub categories: Vec<Category>, // empty = all
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout: u64, // seconds
    pub user_agent: String,
    pub verify_ssl: bool,
    pub follow_redirects: bool,
    pub max_redirects: u32,
    pub proxy: Option<String>,
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    pub output_dir: PathBuf,
    #[serde(default)]
    pub formats: Vec<OutputFormat>,
    pub mirror_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig {
                min_depth: 0,
                max_depth: MAX_DEPTH,
                separator: '/',
                prefix: None,
                terminate_with_null: false,
                os: None,
                method: HttpMethod::Get,
                exhaustive: false,
                workers: 1,
                categories: Vec::new(),
            },
            http: HttpConfig {
                timeout: 10,
                user_agent: "lfiscan/0.1".to_string(),
                verify_ssl: false,
                follow_redirects: true,
                max_redirects: 5,
                proxy: None,
                custom_headers: HashMap::new(),
            },
            reporting: ReportingConfig {
                output_dir: PathBuf::from("./reports"),
                formats: vec![OutputFormat::Json],
                mirror_dir: None,
            },
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> crate::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn save_to_file(&self, path: &str) -> crate::Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| crate::ScanError::InvalidInput(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Rejects settings no scan can run with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.scan.prefix.is_none() {
            validate_depths(self.scan.min_depth, self.scan.max_depth)?;
        }

        if self.scan.workers == 0 {
            return Err(crate::ScanError::InvalidInput("workers must be at least 1".to_string()));
        }
        if self.http.timeout == 0 {
            return Err(crate::ScanError::InvalidInput("timeout must be at least 1 second".to_string()));
        }
        Ok(())
    }

    pub fn depth_range(&self) -> RangeInclusive<usize> {
        self.scan.min_depth..=self.scan.max_depth
    }

    /// The traversal to use at `depth`, honoring a configured literal prefix.
    pub fn traversal(&self, depth: usize) -> TraversalSpec {
        let escape = match &self.scan.prefix {
            Some(prefix) => Escape::Prefix(prefix.clone()),
            None => Escape::Depth(depth),
        };

        TraversalSpec {
            escape,
            separator: self.scan.separator,
            terminate_with_null: self.scan.terminate_with_null,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Checks an escape depth range: ascending and no deeper than [`DEPTH_LIMIT`].
pub fn validate_depths(min_depth: usize, max_depth: usize) -> crate::Result<()> {
    if min_depth > max_depth {
        return Err(crate::ScanError::InvalidInput(format!(
            "min depth {} is greater than max depth {}",
            min_depth, max_depth
        )));
    }
    if max_depth > DEPTH_LIMIT {
        return Err(crate::ScanError::InvalidInput(format!(
            "max depth {} exceeds the limit of {}",
            max_depth, DEPTH_LIMIT
        )));
    }
    Ok(())
}
