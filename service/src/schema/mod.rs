//! Schema type model
//!
//! A [`Schema`] is an immutable, cheaply clonable handle on a tree of
//! [`SchemaKind`] nodes. Builders and chaining methods always produce a new
//! handle; unchanged children are shared through `Arc`.

pub mod builders;
pub mod composite;
pub mod object;
pub mod rules;
pub mod wire;

pub use builders::{
    ArraySchema, NumberSchema, StringSchema, any, array, boolean, enumeration, integer,
    intersection, literal, never, null, number, record, string, tuple, tuple_with_rest, union,
};
pub use composite::{
    AsyncCheck, AsyncFnCheck, AsyncRefinement, Conditional, DiscriminatedUnion, Refinement,
    Transform, conditional, discriminated_union,
};
pub use object::{ObjectSchema, ObjectShape, UnknownKeys, object};
pub use rules::{ArrayRules, NumberRules, Pattern, StringNormalizer, StringRules};

use crate::validator::ReferenceEngine;
use fastschema_core::error::Result;
use fastschema_core::issue::Outcome;
use fastschema_core::wire::WireSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};
use xxhash_rust::xxh3::xxh3_64;

/// Variant of a schema node
#[derive(Debug, Clone)]
pub enum SchemaKind {
    String(StringRules),
    Number(NumberRules),
    Boolean,
    Null,
    Any,
    Never,
    Literal(Value),
    Enum(Vec<Value>),
    Object(ObjectShape),
    Array(ArrayRules),
    Tuple {
        items: Vec<Schema>,
        rest: Option<Schema>,
    },
    Record {
        key: Schema,
        value: Schema,
    },
    Union(Vec<Schema>),
    DiscriminatedUnion(DiscriminatedUnion),
    Intersection(Schema, Schema),
    Conditional(Conditional),
    Async(AsyncRefinement),
    Refinement(Refinement),
    Transform(Transform),
    Optional(Schema),
    Nullable(Schema),
    NonNullable(Schema),
    Default(Schema, Value),
    Readonly(Schema),
    Required(Schema, Vec<String>),
}

/// Field-less tag of a [`SchemaKind`], used as the auto-optimizer key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKindTag {
    String,
    Number,
    Boolean,
    Null,
    Any,
    Never,
    Literal,
    Enum,
    Object,
    Array,
    Tuple,
    Record,
    Union,
    DiscriminatedUnion,
    Intersection,
    Conditional,
    Async,
    Refinement,
    Transform,
    Optional,
    Nullable,
    NonNullable,
    Default,
    Readonly,
    Required,
}

impl SchemaKindTag {
    /// Snake-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Any => "any",
            Self::Never => "never",
            Self::Literal => "literal",
            Self::Enum => "enum",
            Self::Object => "object",
            Self::Array => "array",
            Self::Tuple => "tuple",
            Self::Record => "record",
            Self::Union => "union",
            Self::DiscriminatedUnion => "discriminated_union",
            Self::Intersection => "intersection",
            Self::Conditional => "conditional",
            Self::Async => "async",
            Self::Refinement => "refinement",
            Self::Transform => "transform",
            Self::Optional => "optional",
            Self::Nullable => "nullable",
            Self::NonNullable => "non_nullable",
            Self::Default => "default",
            Self::Readonly => "readonly",
            Self::Required => "required",
        }
    }
}

impl fmt::Display for SchemaKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct SchemaNode {
    kind: SchemaKind,
    fingerprint: OnceLock<u64>,
}

/// Immutable schema handle
#[derive(Clone)]
pub struct Schema {
    node: Arc<SchemaNode>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.kind.fmt(f)
    }
}

impl Schema {
    /// Wrap a node kind
    #[must_use]
    pub fn from_kind(kind: SchemaKind) -> Self {
        Self {
            node: Arc::new(SchemaNode {
                kind,
                fingerprint: OnceLock::new(),
            }),
        }
    }

    /// Node kind
    #[must_use]
    pub fn kind(&self) -> &SchemaKind {
        &self.node.kind
    }

    /// Whether two handles share the same node
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Field-less kind tag
    #[must_use]
    pub fn kind_tag(&self) -> SchemaKindTag {
        match self.kind() {
            SchemaKind::String(_) => SchemaKindTag::String,
            SchemaKind::Number(_) => SchemaKindTag::Number,
            SchemaKind::Boolean => SchemaKindTag::Boolean,
            SchemaKind::Null => SchemaKindTag::Null,
            SchemaKind::Any => SchemaKindTag::Any,
            SchemaKind::Never => SchemaKindTag::Never,
            SchemaKind::Literal(_) => SchemaKindTag::Literal,
            SchemaKind::Enum(_) => SchemaKindTag::Enum,
            SchemaKind::Object(_) => SchemaKindTag::Object,
            SchemaKind::Array(_) => SchemaKindTag::Array,
            SchemaKind::Tuple { .. } => SchemaKindTag::Tuple,
            SchemaKind::Record { .. } => SchemaKindTag::Record,
            SchemaKind::Union(_) => SchemaKindTag::Union,
            SchemaKind::DiscriminatedUnion(_) => SchemaKindTag::DiscriminatedUnion,
            SchemaKind::Intersection(..) => SchemaKindTag::Intersection,
            SchemaKind::Conditional(_) => SchemaKindTag::Conditional,
            SchemaKind::Async(_) => SchemaKindTag::Async,
            SchemaKind::Refinement(_) => SchemaKindTag::Refinement,
            SchemaKind::Transform(_) => SchemaKindTag::Transform,
            SchemaKind::Optional(_) => SchemaKindTag::Optional,
            SchemaKind::Nullable(_) => SchemaKindTag::Nullable,
            SchemaKind::NonNullable(_) => SchemaKindTag::NonNullable,
            SchemaKind::Default(..) => SchemaKindTag::Default,
            SchemaKind::Readonly(_) => SchemaKindTag::Readonly,
            SchemaKind::Required(..) => SchemaKindTag::Required,
        }
    }

    /// Inner node of a single-child wrapper
    #[must_use]
    pub fn wrapped(&self) -> Option<&Schema> {
        match self.kind() {
            SchemaKind::Optional(inner)
            | SchemaKind::Nullable(inner)
            | SchemaKind::NonNullable(inner)
            | SchemaKind::Default(inner, _)
            | SchemaKind::Readonly(inner)
            | SchemaKind::Required(inner, _) => Some(inner),
            SchemaKind::Refinement(refinement) => Some(&refinement.inner),
            SchemaKind::Transform(transform) => Some(&transform.inner),
            SchemaKind::Async(check) => Some(&check.inner),
            _ => None,
        }
    }

    /// Direct children, wrappers included
    #[must_use]
    pub fn children(&self) -> Vec<&Schema> {
        if let Some(inner) = self.wrapped() {
            return vec![inner];
        }
        match self.kind() {
            SchemaKind::Object(shape) => {
                let mut children: Vec<&Schema> = shape.fields.values().collect();
                if let UnknownKeys::Catchall(catchall) = &shape.unknown_keys {
                    children.push(catchall);
                }
                children
            }
            SchemaKind::Array(rules) => vec![&rules.item],
            SchemaKind::Tuple { items, rest } => items.iter().chain(rest.as_ref()).collect(),
            SchemaKind::Record { key, value } => vec![key, value],
            SchemaKind::Union(variants) => variants.iter().collect(),
            SchemaKind::DiscriminatedUnion(union) => union.variants.iter().collect(),
            SchemaKind::Intersection(left, right) => vec![left, right],
            SchemaKind::Conditional(cond) => vec![&cond.then_schema, &cond.else_schema],
            _ => Vec::new(),
        }
    }

    /// Whether an absent object field satisfies this node
    #[must_use]
    pub fn accepts_absent(&self) -> bool {
        match self.kind() {
            SchemaKind::Any | SchemaKind::Optional(_) | SchemaKind::Default(..) => true,
            SchemaKind::Union(variants) => variants.iter().any(Self::accepts_absent),
            _ => self.wrapped().is_some_and(Self::accepts_absent),
        }
    }

    /// Cost score: 1 per node, wrappers are transparent
    #[must_use]
    pub fn complexity(&self) -> usize {
        if let Some(inner) = self.wrapped() {
            return inner.complexity();
        }
        1 + self
            .children()
            .into_iter()
            .map(Self::complexity)
            .sum::<usize>()
    }

    /// Nesting depth, wrappers are transparent
    #[must_use]
    pub fn depth(&self) -> usize {
        if let Some(inner) = self.wrapped() {
            return inner.depth();
        }
        1 + self
            .children()
            .into_iter()
            .map(Self::depth)
            .max()
            .unwrap_or(0)
    }

    /// Whether the whole tree can be sent to an accelerated backend
    #[must_use]
    pub fn is_portable(&self) -> bool {
        match self.kind() {
            SchemaKind::Conditional(_)
            | SchemaKind::Async(_)
            | SchemaKind::Refinement(_)
            | SchemaKind::Transform(_) => false,
            _ => self.children().into_iter().all(Self::is_portable),
        }
    }

    /// Deterministic structural fingerprint, computed once per node
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        *self.node.fingerprint.get_or_init(|| {
            serde_json::to_vec(&self.describe()).map_or(0, |bytes| xxh3_64(&bytes))
        })
    }

    /// Serializable description of the tree
    #[must_use]
    pub fn describe(&self) -> WireSchema {
        wire::describe(self)
    }

    /// Object shape, for object nodes
    #[must_use]
    pub fn shape(&self) -> Option<&ObjectShape> {
        match self.kind() {
            SchemaKind::Object(shape) => Some(shape),
            _ => None,
        }
    }

    /// Literal value, for literal nodes
    #[must_use]
    pub fn literal_value(&self) -> Option<&Value> {
        match self.kind() {
            SchemaKind::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Whether this node carries the read-only marker.
    ///
    /// The marker does not change validation or the output value; callers
    /// that honor it freeze valid outputs with `Outcome::into_frozen`.
    #[must_use]
    pub fn is_readonly(&self) -> bool {
        matches!(self.kind(), SchemaKind::Readonly(_))
    }

    /// Validate a value on the reference engine
    #[must_use]
    pub fn validate(&self, value: &Value) -> Outcome {
        ReferenceEngine::global().validate(self, value)
    }

    /// Validate and return the output, or every issue as an error.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Validation` carrying all issues when the value
    /// does not conform.
    pub fn try_validate(&self, value: &Value) -> Result<Value> {
        self.validate(value).into_result()
    }

    /// Validate a value, running asynchronous checks
    pub async fn validate_async(&self, value: &Value) -> Outcome {
        ReferenceEngine::global().validate_async(self, value).await
    }

    /// One outcome per value, in order, with `[i]` path prefixes
    #[must_use]
    pub fn validate_many(&self, values: &[Value]) -> Vec<Outcome> {
        crate::batch::validate_many(self, values)
    }

    /// Same contract as [`Self::validate_many`], on the rayon pool
    #[must_use]
    pub fn validate_many_parallel(&self, values: &[Value]) -> Vec<Outcome> {
        crate::batch::validate_many_parallel(self, values)
    }
}

/// Wrapper constructors available on every schema and builder
pub trait SchemaExt: Into<Schema> {
    /// Accept absence (object fields) and pass it through
    #[must_use]
    fn optional(self) -> Schema {
        Schema::from_kind(SchemaKind::Optional(self.into()))
    }

    /// Accept `null`
    #[must_use]
    fn nullable(self) -> Schema {
        Schema::from_kind(SchemaKind::Nullable(self.into()))
    }

    /// Reject `null`, unwrapping an outer nullable
    #[must_use]
    fn non_nullable(self) -> Schema {
        crate::transform::non_nullable(self)
    }

    /// Substitute `value` when the field is absent
    #[must_use]
    fn default_value(self, value: Value) -> Schema {
        Schema::from_kind(SchemaKind::Default(self.into(), value))
    }

    /// Add the read-only marker; see [`Schema::is_readonly`]
    #[must_use]
    fn readonly(self) -> Schema {
        crate::transform::readonly(self)
    }

    /// Custom predicate over the validated output
    #[must_use]
    fn refine<F>(self, predicate: F, message: impl Into<String>) -> Schema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Schema::from_kind(SchemaKind::Refinement(Refinement {
            inner: self.into(),
            predicate: Arc::new(predicate),
            message: message.into(),
        }))
    }

    /// Map the validated output; an `Err` becomes a custom issue
    #[must_use]
    fn transform<F>(self, func: F) -> Schema
    where
        F: Fn(Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        Schema::from_kind(SchemaKind::Transform(Transform {
            inner: self.into(),
            func: Arc::new(func),
            label: None,
        }))
    }

    /// [`Self::transform`] with a label that distinguishes its fingerprint
    #[must_use]
    fn transform_labeled<F>(self, label: impl Into<String>, func: F) -> Schema
    where
        F: Fn(Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        Schema::from_kind(SchemaKind::Transform(Transform {
            inner: self.into(),
            func: Arc::new(func),
            label: Some(label.into()),
        }))
    }

    /// Asynchronous check over the validated output
    #[must_use]
    fn refine_async<C>(self, check: C, message: impl Into<String>) -> Schema
    where
        C: AsyncCheck + 'static,
    {
        Schema::from_kind(SchemaKind::Async(AsyncRefinement {
            inner: self.into(),
            check: Arc::new(check),
            message: message.into(),
        }))
    }
}

impl<T: Into<Schema>> SchemaExt for T {}
