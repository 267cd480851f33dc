//! Response classification against signatures.

use crate::extractor::ExtractedFields;
use crate::signature::Signature;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub signature: Arc<Signature>,
    pub extracted_fields: ExtractedFields,
}

impl MatchResult {
    fn from_signature(signature: &Arc<Signature>, body: &str) -> Self {
        Self {
            signature: Arc::clone(signature),
            extracted_fields: signature.extract(body),
        }
    }
}

/// Returns the first signature, in the given order, whose recognizer matches.
///
/// This is a short-circuiting scan rather than a best-match search: ambiguous
/// bodies always resolve to the earliest signature.
pub fn classify(body: &str, signatures: &[Arc<Signature>]) -> Option<MatchResult> {
    signatures
        .iter()
        .find(|sig| sig.recognizes(body))
        .map(|sig| MatchResult::from_signature(sig, body))
}

/// Every matching signature, in the given order.
pub fn classify_all(body: &str, signatures: &[Arc<Signature>]) -> Vec<MatchResult> {
    signatures
        .iter()
        .filter(|sig| sig.recognizes(body))
        .map(|sig| MatchResult::from_signature(sig, body))
        .collect()
}
