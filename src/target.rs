//! Target URL handling: parsing and query parameter substitution.

use crate::{Result, ScanError};
use std::fmt;
use url::Url;

/// A URL to test, split into its base and ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    base: Url,
    params: Vec<(String, String)>,
}

impl ScanTarget {
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim())
            .map_err(|e| ScanError::InvalidTarget(format!("{}: {}", input, e)))?;
        Self::from_url(url)
    }

    pub fn from_url(url: Url) -> Result<Self> {
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ScanError::InvalidTarget(format!(
                    "unsupported scheme '{}' in {}",
                    scheme, url
                )))
            }
        }

        let params = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut base = url;
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self { base, params })
    }

    /// The URL without its query string.
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Distinct parameter names in query-string order.
    pub fn param_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in &self.params {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|(k, _)| k == name)
    }

    /// The parameters to test: `param` alone if given, otherwise all of them.
    pub fn params_to_test(&self, param: Option<&str>) -> Result<Vec<String>> {
        match param {
            Some(name) if self.has_param(name) => Ok(vec![name.to_string()]),
            Some(name) => Err(ScanError::InvalidTarget(format!(
                "parameter '{}' is not present in {}",
                name, self
            ))),
            None => {
                let names = self.param_names();
                if names.is_empty() {
                    return Err(ScanError::InvalidTarget(format!(
                        "{} has no query parameters to test",
                        self
                    )));
                }
                Ok(names.into_iter().map(String::from).collect())
            }
        }
    }

    /// The query with every occurrence of `name` set to `value`, order kept.
    pub fn with_param(&self, name: &str, value: &str) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| {
                if k == name {
                    (k.clone(), value.to_string())
                } else {
                    (k.clone(), v.clone())
                }
            })
            .collect()
    }

    /// Full URL with `name` replaced; percent-encoding is applied here.
    pub fn url_with_param(&self, name: &str, value: &str) -> Url {
        compose_url(&self.base, &self.with_param(name, value))
    }

    pub fn to_url(&self) -> Url {
        compose_url(&self.base, &self.params)
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_url())
    }
}

pub fn compose_url(base: &Url, query: &[(String, String)]) -> Url {
    let mut url = base.clone();
    if query.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut()
            .clear()
            .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    url
}
