//! A single (URL, parameter, traversal) under test.

use crate::escape::TraversalSpec;
use crate::extractor::ExtractedFields;
use crate::file::IncludedFile;
use crate::matcher::{self, MatchResult};
use crate::signature::Signature;
use crate::target::ScanTarget;
use crate::transport::{HttpMethod, Transport, TransportError, TransportResponse};
use crate::Result;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Everything needed to issue one probe.
#[derive(Debug, Clone)]
pub struct ProbeRequest<'a> {
    pub target: &'a ScanTarget,
    pub param: &'a str,
    pub traversal: &'a TraversalSpec,
    pub candidate_path: &'a str,
}

impl ProbeRequest<'_> {
    /// Value injected into the parameter.
    pub fn injected_value(&self) -> String {
        self.traversal.build_path(self.candidate_path)
    }

    pub fn query(&self) -> Vec<(String, String)> {
        self.target.with_param(self.param, &self.injected_value())
    }

    pub fn url(&self) -> Url {
        self.target.url_with_param(self.param, &self.injected_value())
    }
}

/// A confirmed inclusion. Immutable once produced.
#[derive(Debug, Clone)]
pub struct Vulnerability {
    pub url: String,
    pub param: String,
    pub traversal: TraversalSpec,
    pub signature: Arc<Signature>,
    /// Remote path whose contents were recognised.
    pub matched_path: String,
    pub extracted_fields: ExtractedFields,
    pub body: String,
    pub discovered_at: DateTime<Utc>,
}

impl Vulnerability {
    pub fn file(&self) -> IncludedFile {
        IncludedFile::new(self.matched_path.clone(), self.body.clone())
    }

    pub fn summary(&self) -> VulnerabilitySummary {
        VulnerabilitySummary::from(self)
    }
}

/// Serializable view of a [`Vulnerability`], without the file body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilitySummary {
    pub url: String,
    pub param: String,
    pub traversal: TraversalSpec,
    pub signature: String,
    pub category: String,
    pub matched_path: String,
    pub extracted_fields: ExtractedFields,
    pub discovered_at: DateTime<Utc>,
}

impl From<&Vulnerability> for VulnerabilitySummary {
    fn from(vuln: &Vulnerability) -> Self {
        Self {
            url: vuln.url.clone(),
            param: vuln.param.clone(),
            traversal: vuln.traversal.clone(),
            signature: vuln.signature.name().to_string(),
            category: vuln.signature.category().to_string(),
            matched_path: vuln.matched_path.clone(),
            extracted_fields: vuln.extracted_fields.clone(),
            discovered_at: vuln.discovered_at,
        }
    }
}

/// Tests one parameter of one URL with one fixed traversal.
pub struct LfiProbe {
    target: ScanTarget,
    param: String,
    traversal: TraversalSpec,
    method: HttpMethod,
    transport: Arc<dyn Transport>,
}

impl LfiProbe {
    pub fn new(
        target: ScanTarget,
        param: impl Into<String>,
        traversal: TraversalSpec,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            target,
            param: param.into(),
            traversal,
            method: HttpMethod::Get,
            transport,
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn target(&self) -> &ScanTarget {
        &self.target
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn traversal(&self) -> &TraversalSpec {
        &self.traversal
    }

    fn request<'a>(&'a self, path: &'a str) -> ProbeRequest<'a> {
        ProbeRequest {
            target: &self.target,
            param: &self.param,
            traversal: &self.traversal,
            candidate_path: path,
        }
    }

    /// The URL that includes the local file `path`.
    pub fn url_for(&self, path: &str) -> Url {
        self.request(path).url()
    }

    async fn fetch(&self, path: &str) -> std::result::Result<TransportResponse, TransportError> {
        let request = self.request(path);
        debug!("Probing {}={:?} via {}", self.param, request.injected_value(), self.method);
        self.transport
            .send(self.method, self.target.base(), &request.query())
            .await
    }

    /// Requests the contents of the remote file `path`.
    pub async fn include(&self, path: &str) -> Result<IncludedFile> {
        let response = self.fetch(path).await?;
        Ok(IncludedFile::new(path, response.body))
    }

    /// Probes `path` and classifies the body against `signature` alone.
    ///
    /// Transport failures count as "no match".
    pub async fn probe_path(&self, signature: &Arc<Signature>, path: &str) -> ProbeOutcome {
        match self.fetch(path).await {
            Ok(response) => {
                match matcher::classify(&response.body, std::slice::from_ref(signature)) {
                    Some(found) => ProbeOutcome::Matched(self.vulnerability(path, found, response.body)),
                    None => ProbeOutcome::NoMatch,
                }
            }
            Err(e) => {
                debug!("Probe of {} via {} failed: {}", path, self.param, e);
                ProbeOutcome::TransportFailed(e)
            }
        }
    }

    /// Tries each signature's candidate paths in order and returns the first
    /// confirmed inclusion.
    pub async fn vulnerable(
        &self,
        signatures: &[Arc<Signature>],
        os: Option<&str>,
    ) -> Option<Vulnerability> {
        for signature in signatures {
            for path in signature.paths_for(os) {
                if let ProbeOutcome::Matched(vuln) = self.probe_path(signature, path).await {
                    return Some(vuln);
                }
            }
        }
        None
    }

    fn vulnerability(&self, path: &str, found: MatchResult, body: String) -> Vulnerability {
        Vulnerability {
            url: self.url_for(path).to_string(),
            param: self.param.clone(),
            traversal: self.traversal.clone(),
            signature: found.signature,
            matched_path: path.to_string(),
            extracted_fields: found.extracted_fields,
            body,
            discovered_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub enum ProbeOutcome {
    Matched(Vulnerability),
    NoMatch,
    TransportFailed(TransportError),
}
