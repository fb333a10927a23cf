//! Constructors for leaf, array and combinator nodes

use super::rules::{ArrayRules, NumberRules, Pattern, StringNormalizer, StringRules};
use super::{Schema, SchemaKind};
use crate::cache::PatternCache;
use crate::validator::formats::{self, NamedFormat};
use fastschema_core::error::{Result, SchemaError};
use serde_json::Value;

/// Builder for string nodes
#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    rules: StringRules,
}

impl StringSchema {
    /// Minimum length in characters
    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.rules.min_length = Some(min);
        self
    }

    /// Maximum length in characters
    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.rules.max_length = Some(max);
        self
    }

    /// Exact length in characters
    #[must_use]
    pub fn length(self, len: usize) -> Self {
        self.min_length(len).max_length(len)
    }

    /// Require a regex match.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::PatternError` if the pattern does not compile.
    pub fn pattern(self, source: &str) -> Result<Self> {
        self.pattern_with_flags(source, "")
    }

    /// Require a regex match, compiled with flag letters `i`, `m`, `s`, `x`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::PatternError` for an invalid pattern or flag.
    pub fn pattern_with_flags(mut self, source: &str, flags: &str) -> Result<Self> {
        let regex = PatternCache::global().get_or_compile(source, flags)?;
        self.rules.patterns.push(Pattern {
            source: source.to_string(),
            flags: flags.to_string(),
            regex,
        });
        Ok(self)
    }

    /// Require a named format.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidSchema` for an unknown format name.
    pub fn format(mut self, name: &str) -> Result<Self> {
        let format = formats::lookup(name).ok_or_else(|| {
            SchemaError::invalid_schema_at(format!("unknown string format '{name}'"), name)
        })?;
        self.rules.format = Some(format);
        Ok(self)
    }

    fn with_format(mut self, format: NamedFormat) -> Self {
        self.rules.format = Some(format);
        self
    }

    /// Shorthand for the `email` format
    #[must_use]
    pub fn email(self) -> Self {
        self.with_format(formats::EMAIL)
    }

    /// Shorthand for the `uuid` format
    #[must_use]
    pub fn uuid(self) -> Self {
        self.with_format(formats::UUID)
    }

    /// Shorthand for the `url` format
    #[must_use]
    pub fn url(self) -> Self {
        self.with_format(formats::URL)
    }

    #[must_use]
    pub fn starts_with(mut self, prefix: impl Into<String>) -> Self {
        self.rules.starts_with = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn ends_with(mut self, suffix: impl Into<String>) -> Self {
        self.rules.ends_with = Some(suffix.into());
        self
    }

    #[must_use]
    pub fn includes(mut self, needle: impl Into<String>) -> Self {
        self.rules.includes = Some(needle.into());
        self
    }

    /// Trim surrounding whitespace before checking
    #[must_use]
    pub fn trim(mut self) -> Self {
        self.rules.normalizers.push(StringNormalizer::Trim);
        self
    }

    /// Lowercase before checking
    #[must_use]
    pub fn to_lowercase(mut self) -> Self {
        self.rules.normalizers.push(StringNormalizer::Lowercase);
        self
    }

    /// Uppercase before checking
    #[must_use]
    pub fn to_uppercase(mut self) -> Self {
        self.rules.normalizers.push(StringNormalizer::Uppercase);
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Schema {
        Schema::from_kind(SchemaKind::String(self.rules))
    }
}

impl From<StringSchema> for Schema {
    fn from(builder: StringSchema) -> Self {
        builder.build()
    }
}

/// Builder for number nodes
#[derive(Debug, Clone, Default)]
pub struct NumberSchema {
    rules: NumberRules,
}

impl NumberSchema {
    /// Inclusive lower bound
    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.rules.min = Some(min);
        self
    }

    /// Inclusive upper bound
    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.rules.max = Some(max);
        self
    }

    /// Exclusive lower bound
    #[must_use]
    pub fn gt(mut self, bound: f64) -> Self {
        self.rules.gt = Some(bound);
        self
    }

    /// Exclusive upper bound
    #[must_use]
    pub fn lt(mut self, bound: f64) -> Self {
        self.rules.lt = Some(bound);
        self
    }

    /// Require an integral value
    #[must_use]
    pub fn int(mut self) -> Self {
        self.rules.integer = true;
        self
    }

    #[must_use]
    pub fn multiple_of(mut self, step: f64) -> Self {
        self.rules.multiple_of = Some(step);
        self
    }

    #[must_use]
    pub fn positive(self) -> Self {
        self.gt(0.0)
    }

    #[must_use]
    pub fn negative(self) -> Self {
        self.lt(0.0)
    }

    #[must_use]
    pub fn nonnegative(self) -> Self {
        self.min(0.0)
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Schema {
        Schema::from_kind(SchemaKind::Number(self.rules))
    }
}

impl From<NumberSchema> for Schema {
    fn from(builder: NumberSchema) -> Self {
        builder.build()
    }
}

/// Builder for array nodes
#[derive(Debug, Clone)]
pub struct ArraySchema {
    rules: ArrayRules,
}

impl ArraySchema {
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        self.rules.min_items = Some(min);
        self
    }

    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        self.rules.max_items = Some(max);
        self
    }

    /// Exact item count
    #[must_use]
    pub fn length(self, len: usize) -> Self {
        self.min_items(len).max_items(len)
    }

    /// At least one item
    #[must_use]
    pub fn nonempty(self) -> Self {
        self.min_items(1)
    }

    /// Items must be pairwise distinct
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.rules.unique = true;
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Schema {
        Schema::from_kind(SchemaKind::Array(self.rules))
    }
}

impl From<ArraySchema> for Schema {
    fn from(builder: ArraySchema) -> Self {
        builder.build()
    }
}

#[must_use]
pub fn string() -> StringSchema {
    StringSchema::default()
}

#[must_use]
pub fn number() -> NumberSchema {
    NumberSchema::default()
}

/// Number node restricted to integral values
#[must_use]
pub fn integer() -> NumberSchema {
    NumberSchema::default().int()
}

#[must_use]
pub fn boolean() -> Schema {
    Schema::from_kind(SchemaKind::Boolean)
}

#[must_use]
pub fn null() -> Schema {
    Schema::from_kind(SchemaKind::Null)
}

/// Accepts every value, including absence
#[must_use]
pub fn any() -> Schema {
    Schema::from_kind(SchemaKind::Any)
}

/// Rejects every value
#[must_use]
pub fn never() -> Schema {
    Schema::from_kind(SchemaKind::Never)
}

/// Exactly this value
pub fn literal(value: impl Into<Value>) -> Schema {
    Schema::from_kind(SchemaKind::Literal(value.into()))
}

/// One of a fixed set of values
pub fn enumeration<I, V>(values: I) -> Schema
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Schema::from_kind(SchemaKind::Enum(values.into_iter().map(Into::into).collect()))
}

pub fn array(item: impl Into<Schema>) -> ArraySchema {
    ArraySchema {
        rules: ArrayRules {
            item: item.into(),
            min_items: None,
            max_items: None,
            unique: false,
        },
    }
}

/// Fixed-length positional array
pub fn tuple(items: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::from_kind(SchemaKind::Tuple {
        items: items.into_iter().collect(),
        rest: None,
    })
}

/// Positional array whose trailing items all match `rest`
pub fn tuple_with_rest(items: impl IntoIterator<Item = Schema>, rest: impl Into<Schema>) -> Schema {
    Schema::from_kind(SchemaKind::Tuple {
        items: items.into_iter().collect(),
        rest: Some(rest.into()),
    })
}

/// Object with arbitrary keys; keys are checked against `key`, values against `value`
pub fn record(key: impl Into<Schema>, value: impl Into<Schema>) -> Schema {
    Schema::from_kind(SchemaKind::Record {
        key: key.into(),
        value: value.into(),
    })
}

/// First variant that accepts the value wins
pub fn union(variants: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::from_kind(SchemaKind::Union(variants.into_iter().collect()))
}

/// Both sides must accept; outputs are merged
pub fn intersection(left: impl Into<Schema>, right: impl Into<Schema>) -> Schema {
    Schema::from_kind(SchemaKind::Intersection(left.into(), right.into()))
}
