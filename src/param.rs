//! Request parameters and URL encoding helpers.

use std::fmt;

/// A single named request parameter.
///
/// Parameters are kept in insertion order and never deduplicated; repeated
/// names are meaningful for multi-value query keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    value: String,
}

impl Parameter {
    /// Create a new parameter pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Percent-encode a value for use in a URI path segment or query component.
///
/// Uses URL percent-encoding (space as `%20`), not form encoding; a `+`
/// inside a path segment would corrupt it.
pub(crate) fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Assemble parameters into a percent-encoded query string, preserving
/// insertion order and repeated names.
pub(crate) fn encode_query(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|p| format!("{}={}", percent_encode(p.name()), percent_encode(p.value())))
        .collect::<Vec<_>>()
        .join("&")
}
