//! Known-file signatures.
//!
//! A [`Signature`] describes one operating-system file: where it may live on
//! each OS, the pattern that proves its contents came back in a response, and
//! the fields worth pulling out once it has. Signatures are assembled with a
//! [`SignatureBuilder`] and are immutable afterwards.

use crate::extractor::{ExtractedFields, Extractor};
use crate::{Result, ScanError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SystemFile,
    ConfigFile,
    LogFile,
    TestFile,
}

impl Category {
    /// Catalog iteration order: small, likely files before large config and log dumps.
    pub const ORDER: [Category; 4] = [
        Category::SystemFile,
        Category::ConfigFile,
        Category::LogFile,
        Category::TestFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SystemFile => "system",
            Category::ConfigFile => "config",
            Category::LogFile => "log",
            Category::TestFile => "test",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "system" | "system_file" | "systemfile" => Ok(Category::SystemFile),
            "config" | "config_file" | "configfile" => Ok(Category::ConfigFile),
            "log" | "log_file" | "logfile" => Ok(Category::LogFile),
            "test" | "test_file" | "testfile" => Ok(Category::TestFile),
            other => Err(ScanError::UnknownSignatureCategory(other.to_string())),
        }
    }
}

/// OS identifiers are compared case-insensitively.
pub fn normalize_os(os: &str) -> String {
    os.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct Signature {
    name: String,
    category: Category,
    paths: Vec<(String, Vec<String>)>,
    recognizer: Regex,
    extractor: Extractor,
}

impl Signature {
    pub fn builder(name: impl Into<String>, category: Category) -> SignatureBuilder {
        SignatureBuilder::new(name, category)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn recognizer(&self) -> &Regex {
        &self.recognizer
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// OS identifiers in declaration order.
    pub fn operating_systems(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(|(os, _)| os.as_str())
    }

    /// Candidate paths for `os`, or for every OS (declaration order) when `None`.
    pub fn paths_for(&self, os: Option<&str>) -> Vec<&str> {
        match os {
            Some(os) => {
                let os = normalize_os(os);
                self.paths
                    .iter()
                    .filter(|(name, _)| *name == os)
                    .flat_map(|(_, paths)| paths.iter().map(String::as_str))
                    .collect()
            }
            None => self.all_paths(),
        }
    }

    pub fn all_paths(&self) -> Vec<&str> {
        self.paths
            .iter()
            .flat_map(|(_, paths)| paths.iter().map(String::as_str))
            .collect()
    }

    pub fn recognizes(&self, body: &str) -> bool {
        self.recognizer.is_match(body)
    }

    /// Runs the extractors. Callers only do this after [`Signature::recognizes`].
    pub fn extract(&self, body: &str) -> ExtractedFields {
        self.extractor.extract(body)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.category)
    }
}

pub struct SignatureBuilder {
    name: String,
    category: Category,
    paths: Vec<(String, Vec<String>)>,
    recognizer: Option<String>,
    extractor: Extractor,
    error: Option<ScanError>,
}

impl SignatureBuilder {
    fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            paths: Vec::new(),
            recognizer: None,
            extractor: Extractor::new(),
            error: None,
        }
    }

    /// Adds a candidate path for `os`. Paths keep their insertion order.
    pub fn path(mut self, os: &str, path: impl Into<String>) -> Self {
        let os = normalize_os(os);
        let path = path.into();

        match self.paths.iter_mut().find(|(name, _)| *name == os) {
            Some((_, paths)) => {
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
            None => self.paths.push((os, vec![path])),
        }
        self
    }

    pub fn paths<I, S>(mut self, os: &str, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            self = self.path(os, path);
        }
        self
    }

    pub fn recognizer(mut self, pattern: &str) -> Self {
        self.recognizer = Some(pattern.to_string());
        self
    }

    pub fn extract(mut self, field: &str, pattern: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.extractor.add(field, pattern) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Freezes the signature. Fails if the recognizer is missing, empty, or
    /// any pattern does not compile.
    pub fn build(self) -> Result<Signature> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let pattern = match self.recognizer {
            Some(p) if !p.is_empty() => p,
            _ => {
                return Err(ScanError::InvalidSignature {
                    name: self.name,
                    reason: "recognizer pattern is required".to_string(),
                })
            }
        };

        Ok(Signature {
            recognizer: Regex::new(&pattern)?,
            name: self.name,
            category: self.category,
            paths: self.paths,
            extractor: self.extractor,
        })
    }
}
