//! Named field extraction from confirmed file bodies.

use crate::Result;
use regex::Regex;
use std::collections::BTreeMap;

/// Fields pulled out of a matched file, keyed by field name.
pub type ExtractedFields = BTreeMap<String, String>;

/// A named pattern with one capture group.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    pub name: String,
    pub pattern: Regex,
}

/// Ordered set of field patterns owned by a signature.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    fields: Vec<FieldPattern>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field. Registering the same name twice replaces the pattern.
    pub fn add(&mut self, name: impl Into<String>, pattern: &str) -> Result<()> {
        let name = name.into();
        let pattern = Regex::new(pattern)?;

        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.pattern = pattern,
            None => self.fields.push(FieldPattern { name, pattern }),
        }
        Ok(())
    }

    pub fn fields(&self) -> &[FieldPattern] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn extract(&self, body: &str) -> ExtractedFields {
        extract(body, &self.fields)
    }
}

/// Runs each field pattern once against `body`.
///
/// A field whose pattern does not match, or whose first capture group did
/// not participate in the match, is left out of the result.
pub fn extract(body: &str, fields: &[FieldPattern]) -> ExtractedFields {
    fields
        .iter()
        .filter_map(|field| {
            field
                .pattern
                .captures(body)
                .and_then(|caps| caps.get(1))
                .map(|value| (field.name.clone(), value.as_str().trim().to_string()))
        })
        .collect()
}

/// Pattern for an Apache directive such as `ServerRoot "/etc/apache2"`.
/// Commented-out directives are ignored.
pub fn apache_directive(directive: &str) -> String {
    format!(
        r#"(?m)^[^#\n]*\b{}[ \t]+"?([^"\n]+?)"?[ \t]*\r?$"#,
        regex::escape(directive)
    )
}

/// Pattern for a quoted lighttpd setting: `server.name = "example"`.
pub fn lighttpd_string(setting: &str) -> String {
    format!(
        r#"(?m)^[^#\n]*{}[ \t]*=[ \t]*"([^"\n]+)""#,
        regex::escape(setting)
    )
}

/// Pattern for a numeric lighttpd setting: `server.port = 80`.
pub fn lighttpd_number(setting: &str) -> String {
    format!(r"(?m)^[^#\n]*{}[ \t]*=[ \t]*(\d+)", regex::escape(setting))
}

/// Pattern for a `key = value` entry inside the `[mysqld]` section of my.cnf.
pub fn mysqld_setting(setting: &str) -> String {
    format!(
        r"(?m)^\[mysqld\][^\[]*?^[ \t]*{}[ \t]*=[ \t]*([^\r\n]+)",
        regex::escape(setting)
    )
}
