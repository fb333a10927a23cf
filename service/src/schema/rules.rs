//! Constraint sets for leaf and array nodes

use super::Schema;
use crate::validator::formats::NamedFormat;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Compiled regex pattern, shared through the pattern cache
#[derive(Clone)]
pub struct Pattern {
    pub(crate) source: String,
    pub(crate) flags: String,
    pub(crate) regex: Arc<Regex>,
}

impl Pattern {
    /// Pattern source text
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Flag letters the pattern was compiled with
    #[must_use]
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Test a string against the pattern
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// String normalization applied before any check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringNormalizer {
    /// Strip leading and trailing whitespace
    Trim,
    /// Lowercase the string
    Lowercase,
    /// Uppercase the string
    Uppercase,
}

impl StringNormalizer {
    pub(crate) fn apply(self, value: &str) -> String {
        match self {
            Self::Trim => value.trim().to_string(),
            Self::Lowercase => value.to_lowercase(),
            Self::Uppercase => value.to_uppercase(),
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Trim => "trim",
            Self::Lowercase => "lowercase",
            Self::Uppercase => "uppercase",
        }
    }
}

/// Constraints of a string node
#[derive(Debug, Clone, Default)]
pub struct StringRules {
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) patterns: Vec<Pattern>,
    pub(crate) format: Option<NamedFormat>,
    pub(crate) starts_with: Option<String>,
    pub(crate) ends_with: Option<String>,
    pub(crate) includes: Option<String>,
    pub(crate) normalizers: Vec<StringNormalizer>,
}

/// Constraints of a number node
#[derive(Debug, Clone, Default)]
pub struct NumberRules {
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) gt: Option<f64>,
    pub(crate) lt: Option<f64>,
    pub(crate) integer: bool,
    pub(crate) multiple_of: Option<f64>,
}

/// Element schema and constraints of an array node
#[derive(Debug, Clone)]
pub struct ArrayRules {
    pub(crate) item: Schema,
    pub(crate) min_items: Option<usize>,
    pub(crate) max_items: Option<usize>,
    pub(crate) unique: bool,
}
