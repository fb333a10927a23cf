//! Composite node payloads: discriminated unions and closure-backed nodes

use super::{Schema, SchemaKind};
use fastschema_core::error::{Result, SchemaError};
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Predicate over a raw input value
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Fallible value mapping; the error string becomes the issue message
pub type TransformFn = Arc<dyn Fn(Value) -> std::result::Result<Value, String> + Send + Sync>;

/// Tagged union resolved through a single discriminator field
#[derive(Debug, Clone)]
pub struct DiscriminatedUnion {
    pub(crate) discriminator: String,
    pub(crate) variants: Vec<Schema>,
    /// Discriminator literal (as JSON text) to variant index
    pub(crate) lookup: IndexMap<String, usize>,
}

impl DiscriminatedUnion {
    /// Build the lookup table.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidSchema` when a variant is not an object,
    /// does not declare a literal for the discriminator, or repeats another
    /// variant's literal.
    pub fn new(discriminator: impl Into<String>, variants: Vec<Schema>) -> Result<Self> {
        let discriminator = discriminator.into();
        let mut lookup = IndexMap::new();

        for (index, variant) in variants.iter().enumerate() {
            let shape = variant.shape().ok_or_else(|| {
                SchemaError::invalid_schema_at(
                    "discriminated union variants must be object schemas",
                    format!("variant {index}"),
                )
            })?;

            let literal = shape
                .field(&discriminator)
                .and_then(Schema::literal_value)
                .ok_or_else(|| {
                    SchemaError::invalid_schema_at(
                        format!("variant does not declare a literal for '{discriminator}'"),
                        format!("variant {index}"),
                    )
                })?;

            let key = literal.to_string();
            if lookup.insert(key.clone(), index).is_some() {
                return Err(SchemaError::invalid_schema_at(
                    format!("duplicate discriminator value {key}"),
                    format!("variant {index}"),
                ));
            }
        }

        Ok(Self {
            discriminator,
            variants,
            lookup,
        })
    }

    /// Discriminator field name
    #[must_use]
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Variants in declaration order
    #[must_use]
    pub fn variants(&self) -> &[Schema] {
        &self.variants
    }

    /// Variant selected by a discriminator value
    #[must_use]
    pub fn select(&self, tag: &Value) -> Option<&Schema> {
        self.lookup
            .get(&tag.to_string())
            .and_then(|index| self.variants.get(*index))
    }

    /// Accepted discriminator literals, rendered for messages
    pub(crate) fn options(&self) -> String {
        self.lookup
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Delegates to one of two nodes depending on a predicate over the input
#[derive(Clone)]
pub struct Conditional {
    pub(crate) predicate: Predicate,
    pub(crate) then_schema: Schema,
    pub(crate) else_schema: Schema,
}

impl fmt::Debug for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conditional")
            .field("then_schema", &self.then_schema)
            .field("else_schema", &self.else_schema)
            .finish_non_exhaustive()
    }
}

/// Custom check on the inner node's output
#[derive(Clone)]
pub struct Refinement {
    pub(crate) inner: Schema,
    pub(crate) predicate: Predicate,
    pub(crate) message: String,
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("inner", &self.inner)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Maps the inner node's output
#[derive(Clone)]
pub struct Transform {
    pub(crate) inner: Schema,
    pub(crate) func: TransformFn,
    pub(crate) label: Option<String>,
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("inner", &self.inner)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Asynchronous check on a validated value
#[async_trait::async_trait]
pub trait AsyncCheck: Send + Sync {
    /// Whether the value passes
    async fn check(&self, value: &Value) -> bool;
}

/// Adapter turning a closure that returns a boxed future into an [`AsyncCheck`]
pub struct AsyncFnCheck<F> {
    func: F,
}

impl<F> AsyncFnCheck<F>
where
    F: Fn(Value) -> BoxFuture<'static, bool> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait::async_trait]
impl<F> AsyncCheck for AsyncFnCheck<F>
where
    F: Fn(Value) -> BoxFuture<'static, bool> + Send + Sync,
{
    async fn check(&self, value: &Value) -> bool {
        (self.func)(value.clone()).await
    }
}

/// Node that can only be fully validated asynchronously
#[derive(Clone)]
pub struct AsyncRefinement {
    pub(crate) inner: Schema,
    pub(crate) check: Arc<dyn AsyncCheck>,
    pub(crate) message: String,
}

impl fmt::Debug for AsyncRefinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncRefinement")
            .field("inner", &self.inner)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Discriminated union over object variants.
///
/// # Errors
///
/// See [`DiscriminatedUnion::new`].
pub fn discriminated_union(
    discriminator: impl Into<String>,
    variants: impl IntoIterator<Item = Schema>,
) -> Result<Schema> {
    let union = DiscriminatedUnion::new(discriminator, variants.into_iter().collect())?;
    Ok(Schema::from_kind(SchemaKind::DiscriminatedUnion(union)))
}

/// Conditional node: `then_schema` when the predicate holds, `else_schema` otherwise
pub fn conditional<P>(
    predicate: P,
    then_schema: impl Into<Schema>,
    else_schema: impl Into<Schema>,
) -> Schema
where
    P: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Schema::from_kind(SchemaKind::Conditional(Conditional {
        predicate: Arc::new(predicate),
        then_schema: then_schema.into(),
        else_schema: else_schema.into(),
    }))
}
