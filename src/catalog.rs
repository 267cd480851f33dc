//! The signature catalog.
//!
//! Built once at startup through [`CatalogBuilder`], then shared read-only
//! (behind `Arc` or the process-wide built-in instance) by every probe.

use crate::signature::{Category, Signature};
use crate::signatures;
use crate::{Result, ScanError};
use lazy_static::lazy_static;
use log::debug;
use std::sync::Arc;

lazy_static! {
    static ref BUILTIN: std::result::Result<SignatureCatalog, String> =
        signatures::builtin_catalog().map_err(|e| e.to_string());
}

#[derive(Debug, Clone, Default)]
pub struct SignatureCatalog {
    groups: Vec<(Category, Vec<Arc<Signature>>)>,
}

impl SignatureCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// The catalog of known-file fingerprints shipped with the scanner.
    pub fn builtin() -> Result<&'static SignatureCatalog> {
        BUILTIN.as_ref().map_err(|reason| ScanError::InvalidSignature {
            name: "builtin".to_string(),
            reason: reason.clone(),
        })
    }

    /// Every signature, grouped by category in [`Category::ORDER`], insertion
    /// order within each group.
    pub fn all(&self) -> Vec<Arc<Signature>> {
        self.groups
            .iter()
            .flat_map(|(_, sigs)| sigs.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, sigs)| sigs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Categories that have at least one signature, in catalog order.
    pub fn categories(&self) -> Vec<Category> {
        self.groups.iter().map(|(c, _)| *c).collect()
    }

    pub fn category(&self, category: Category) -> Result<&[Arc<Signature>]> {
        self.groups
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, sigs)| sigs.as_slice())
            .ok_or_else(|| ScanError::UnknownSignatureCategory(category.to_string()))
    }

    /// Signatures of the requested categories in catalog order. An empty
    /// selection means the whole catalog.
    pub fn select(&self, categories: &[Category]) -> Result<Vec<Arc<Signature>>> {
        if categories.is_empty() {
            return Ok(self.all());
        }

        for category in categories {
            self.category(*category)?;
        }

        Ok(self
            .groups
            .iter()
            .filter(|(c, _)| categories.contains(c))
            .flat_map(|(_, sigs)| sigs.iter().cloned())
            .collect())
    }

    pub fn find(&self, name: &str) -> Option<Arc<Signature>> {
        self.groups
            .iter()
            .flat_map(|(_, sigs)| sigs.iter())
            .find(|sig| sig.name() == name)
            .cloned()
    }

    pub fn paths_for<'a>(&self, signature: &'a Signature, os: Option<&str>) -> Vec<&'a str> {
        signature.paths_for(os)
    }
}

#[derive(Default)]
pub struct CatalogBuilder {
    signatures: Vec<Signature>,
}

impl CatalogBuilder {
    /// Appends a frozen signature. Within a category the first registered
    /// signature wins on ambiguous bodies, so register precise fingerprints
    /// before loose ones.
    pub fn register(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn build(self) -> SignatureCatalog {
        let mut groups: Vec<(Category, Vec<Arc<Signature>>)> = Vec::new();
        let mut remaining = self.signatures;

        for category in Category::ORDER {
            let (sigs, rest): (Vec<Signature>, Vec<Signature>) = remaining
                .into_iter()
                .partition(|sig| sig.category() == category);
            remaining = rest;

            if !sigs.is_empty() {
                groups.push((category, sigs.into_iter().map(Arc::new).collect()));
            }
        }

        let catalog = SignatureCatalog { groups };
        debug!("Built signature catalog with {} signatures", catalog.len());
        catalog
    }
}
