//! Test backends and fixtures shared by the integration tests

#![allow(dead_code)]

use fastschema_core::error::BackendError;
use fastschema_core::traits::{AcceleratedBackend, BackendProvider};
use fastschema_core::wire::WireOutcome;
use fastschema_service::schema::{Schema, number, object, string};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Backend that answers with the reference engine's verdict for one fixed schema.
///
/// Rejects any schema payload other than that schema's wire form, so a
/// passing test also proves the dispatcher sent the compiled description.
pub struct MirrorBackend {
    schema: Schema,
    wire: String,
    delay: Duration,
    calls: AtomicUsize,
}

impl MirrorBackend {
    pub fn new(schema: &Schema) -> Arc<Self> {
        Self::with_delay(schema, Duration::ZERO)
    }

    pub fn with_delay(schema: &Schema, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            schema: schema.clone(),
            wire: serde_json::to_string(&schema.describe()).unwrap_or_default(),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, schema: &str) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if schema == self.wire {
            Ok(())
        } else {
            Err(BackendError::Protocol("unexpected schema payload".to_string()))
        }
    }
}

fn protocol(err: &serde_json::Error) -> BackendError {
    BackendError::Protocol(err.to_string())
}

impl AcceleratedBackend for MirrorBackend {
    fn name(&self) -> &str {
        "mirror"
    }

    fn validate_one(&self, schema: &str, value: &str) -> Result<String, BackendError> {
        self.enter(schema)?;
        let value: Value = serde_json::from_str(value).map_err(|e| protocol(&e))?;
        let outcome = self.schema.validate(&value);
        serde_json::to_string(&WireOutcome::from(&outcome)).map_err(|e| protocol(&e))
    }

    fn validate_batch(&self, schema: &str, values: &str) -> Result<String, BackendError> {
        self.enter(schema)?;
        let values: Vec<Value> = serde_json::from_str(values).map_err(|e| protocol(&e))?;
        let outcomes: Vec<WireOutcome> = values
            .iter()
            .map(|value| WireOutcome::from(&self.schema.validate(value)))
            .collect();
        serde_json::to_string(&outcomes).map_err(|e| protocol(&e))
    }
}

/// Backend whose every call fails
pub struct BrokenBackend {
    calls: AtomicUsize,
}

impl BrokenBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AcceleratedBackend for BrokenBackend {
    fn name(&self) -> &str {
        "broken"
    }

    fn validate_one(&self, _schema: &str, _value: &str) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::failed("broken", "segment fault in native code"))
    }

    fn validate_batch(&self, _schema: &str, _values: &str) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::failed("broken", "segment fault in native code"))
    }
}

/// Provider that hands out a fixed backend, or nothing, after an optional delay
pub struct StaticProvider {
    location: String,
    backend: Option<Arc<dyn AcceleratedBackend>>,
    delay: Duration,
}

impl StaticProvider {
    pub fn found(location: &str, backend: Arc<dyn AcceleratedBackend>) -> Arc<Self> {
        Arc::new(Self {
            location: location.to_string(),
            backend: Some(backend),
            delay: Duration::ZERO,
        })
    }

    pub fn missing(location: &str) -> Arc<Self> {
        Arc::new(Self {
            location: location.to_string(),
            backend: None,
            delay: Duration::ZERO,
        })
    }

    pub fn slow(location: &str, backend: Arc<dyn AcceleratedBackend>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            location: location.to_string(),
            backend: Some(backend),
            delay,
        })
    }
}

impl BackendProvider for StaticProvider {
    fn location(&self) -> &str {
        &self.location
    }

    fn load(&self) -> Result<Arc<dyn AcceleratedBackend>, BackendError> {
        std::thread::sleep(self.delay);
        self.backend
            .clone()
            .ok_or_else(|| BackendError::Unavailable(format!("nothing at {}", self.location)))
    }
}

/// Object schema with complexity 5, the default routing threshold
pub fn person_schema() -> Schema {
    object([
        ("name", string().min_length(2).build()),
        ("email", string().email().build()),
        ("bio", string().build()),
        ("age", number().min(18.0).build()),
    ])
    .build()
}

/// Valid person that serializes well above 100 bytes
pub fn large_person() -> Value {
    json!({
        "name": "Grace Hopper",
        "email": "grace@example.com",
        "bio": "Computer scientist and United States Navy rear admiral. ".repeat(4),
        "age": 85
    })
}

/// Valid person that serializes below 100 bytes
pub fn small_person() -> Value {
    json!({"name": "Ada", "email": "ada@example.com", "bio": "", "age": 36})
}
