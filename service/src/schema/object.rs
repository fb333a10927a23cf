//! Object shapes and the object schema builder

use super::{Schema, SchemaKind};
use indexmap::IndexMap;

/// What happens to input keys the shape does not declare
#[derive(Debug, Clone, Default)]
pub enum UnknownKeys {
    /// Every unknown key is an issue
    Strict,
    /// Unknown keys are copied into the output verbatim
    Passthrough,
    /// Unknown keys are silently omitted from the output
    #[default]
    Strip,
    /// Unknown keys are validated against this schema
    Catchall(Schema),
}

/// Ordered field map plus unknown-key policy
#[derive(Debug, Clone, Default)]
pub struct ObjectShape {
    pub(crate) fields: IndexMap<String, Schema>,
    pub(crate) unknown_keys: UnknownKeys,
}

impl ObjectShape {
    /// Declared fields in declaration order
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, Schema> {
        &self.fields
    }

    /// Schema of one declared field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Schema> {
        self.fields.get(name)
    }

    /// Unknown-key policy
    #[must_use]
    pub fn unknown_keys(&self) -> &UnknownKeys {
        &self.unknown_keys
    }

    /// Field names in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Names of fields that must be present in the input
    #[must_use]
    pub fn required_keys(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, schema)| !schema.accepts_absent())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Builder for object schemas.
///
/// Every method consumes the builder and returns a new one; the built
/// [`Schema`] is immutable.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    shape: ObjectShape,
}

impl ObjectSchema {
    /// Empty object schema with the strip policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_shape(shape: ObjectShape) -> Self {
        Self { shape }
    }

    /// Declare (or replace) a field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.shape.fields.insert(name.into(), schema.into());
        self
    }

    /// Reject unknown keys
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.shape.unknown_keys = UnknownKeys::Strict;
        self
    }

    /// Copy unknown keys into the output
    #[must_use]
    pub fn passthrough(mut self) -> Self {
        self.shape.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    /// Drop unknown keys from the output
    #[must_use]
    pub fn strip(mut self) -> Self {
        self.shape.unknown_keys = UnknownKeys::Strip;
        self
    }

    /// Validate unknown keys against a schema
    #[must_use]
    pub fn catchall(mut self, schema: impl Into<Schema>) -> Self {
        self.shape.unknown_keys = UnknownKeys::Catchall(schema.into());
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Schema {
        Schema::from_kind(SchemaKind::Object(self.shape))
    }
}

impl From<ObjectSchema> for Schema {
    fn from(builder: ObjectSchema) -> Self {
        builder.build()
    }
}

/// Object schema from `(name, schema)` pairs, strip policy
pub fn object<K, I>(fields: I) -> ObjectSchema
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Schema)>,
{
    fields
        .into_iter()
        .fold(ObjectSchema::new(), |builder, (name, schema)| {
            builder.field(name, schema)
        })
}
