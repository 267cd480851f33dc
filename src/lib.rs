//! lfiscan - Local File Inclusion scanner
//!
//! Probes query parameters of a web endpoint with relative path traversals
//! towards well-known operating-system files and recognises the included
//! files from a catalog of content signatures.
//!
//! # Warning
//! This tool is designed for ethical penetration testing and security assessment
//! purposes only. Users are responsible for ensuring they have proper authorization
//! before scanning any system.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod escape;
pub mod extractor;
pub mod file;
pub mod matcher;
pub mod probe;
pub mod reporting;
pub mod scanner;
pub mod signature;
pub mod signatures;
pub mod target;
pub mod transport;
pub mod utils;

pub use catalog::SignatureCatalog;
pub use error::{Result, ScanError};
pub use escape::{build_path, Escape, TraversalSpec};
pub use probe::{LfiProbe, Vulnerability};
pub use scanner::{LfiScanner, ScanAbort, ScanOptions};
pub use signature::{Category, Signature};
pub use target::ScanTarget;
pub use transport::{HttpMethod, HttpTransport, Transport, TransportError, TransportResponse};
