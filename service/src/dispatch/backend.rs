//! Accelerated backend discovery and one-time initialization

use fastschema_core::error::BackendError;
use fastschema_core::traits::{AcceleratedBackend, BackendProvider};
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Ordered list of places a backend may be loaded from
#[derive(Clone, Default)]
pub struct BackendDiscovery {
    providers: Vec<Arc<dyn BackendProvider>>,
}

impl fmt::Debug for BackendDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDiscovery")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.location()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl BackendDiscovery {
    /// Discovery with no candidates; always reports the backend as unavailable
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate; candidates are tried in insertion order
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn BackendProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Try every provider in order and keep the first backend that loads
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unavailable` listing every location tried.
    pub fn discover(&self) -> Result<Arc<dyn AcceleratedBackend>, BackendError> {
        let mut tried = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            match provider.load() {
                Ok(backend) => {
                    info!(
                        backend = backend.name(),
                        location = provider.location(),
                        "Accelerated backend loaded"
                    );
                    return Ok(backend);
                }
                Err(err) => {
                    debug!(location = provider.location(), error = %err, "Backend candidate failed");
                    tried.push(provider.location().to_string());
                }
            }
        }

        if tried.is_empty() {
            Err(BackendError::Unavailable("no backend locations configured".to_string()))
        } else {
            Err(BackendError::Unavailable(format!("tried {}", tried.join(", "))))
        }
    }
}

/// Observable state of a [`BackendSlot`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    /// Nobody has asked for the backend yet
    Uninitialized,
    /// Loaded; carries the backend name
    Ready(String),
    /// Initialization failed or timed out; permanent for this slot
    Unavailable(BackendError),
}

/// Lazily initialized backend handle.
///
/// The first caller of [`BackendSlot::get`] runs discovery on a helper thread
/// bounded by the init timeout; concurrent callers block on the same
/// initialization. The result, success or failure, is never retried.
pub struct BackendSlot {
    discovery: Arc<BackendDiscovery>,
    timeout: Duration,
    state: OnceLock<Result<Arc<dyn AcceleratedBackend>, BackendError>>,
}

impl fmt::Debug for BackendSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSlot")
            .field("discovery", &self.discovery)
            .field("timeout", &self.timeout)
            .field("status", &self.status())
            .finish()
    }
}

impl BackendSlot {
    #[must_use]
    pub fn new(discovery: BackendDiscovery, timeout: Duration) -> Self {
        Self {
            discovery: Arc::new(discovery),
            timeout,
            state: OnceLock::new(),
        }
    }

    /// Slot that already holds a backend
    #[must_use]
    pub fn preloaded(backend: Arc<dyn AcceleratedBackend>) -> Self {
        let state = OnceLock::new();
        let _ = state.set(Ok(backend));
        Self {
            discovery: Arc::new(BackendDiscovery::new()),
            timeout: Duration::ZERO,
            state,
        }
    }

    /// The backend, initializing it on first use
    ///
    /// # Errors
    ///
    /// Returns the (cached) initialization failure.
    pub fn get(&self) -> Result<&Arc<dyn AcceleratedBackend>, BackendError> {
        self.state
            .get_or_init(|| self.initialize())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn initialize(&self) -> Result<Arc<dyn AcceleratedBackend>, BackendError> {
        if self.discovery.is_empty() {
            debug!("No backend providers configured; using reference engine only");
            return Err(BackendError::Unavailable(
                "no backend locations configured".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel();
        let discovery = Arc::clone(&self.discovery);
        thread::Builder::new()
            .name("fastschema-backend-init".to_string())
            .spawn(move || {
                // The receiver may be gone after a timeout
                let _ = tx.send(discovery.discover());
            })
            .map_err(|e| BackendError::Unavailable(format!("failed to spawn init thread: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                let millis = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(timeout_ms = millis, "Backend initialization timed out");
                Err(BackendError::InitTimeout(millis))
            }
            Err(RecvTimeoutError::Disconnected) => Err(BackendError::Unavailable(
                "backend init thread exited without a result".to_string(),
            )),
        }
    }

    /// Current state without triggering initialization
    #[must_use]
    pub fn status(&self) -> BackendStatus {
        match self.state.get() {
            None => BackendStatus::Uninitialized,
            Some(Ok(backend)) => BackendStatus::Ready(backend.name().to_string()),
            Some(Err(err)) => BackendStatus::Unavailable(err.clone()),
        }
    }

    /// Whether a backend is usable, initializing it if needed
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.get().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NamedBackend(&'static str);

    impl AcceleratedBackend for NamedBackend {
        fn name(&self) -> &str {
            self.0
        }

        fn validate_one(&self, _schema: &str, _value: &str) -> Result<String, BackendError> {
            Err(BackendError::failed(self.0, "not used"))
        }

        fn validate_batch(&self, _schema: &str, _values: &str) -> Result<String, BackendError> {
            Err(BackendError::failed(self.0, "not used"))
        }
    }

    struct Provider {
        location: &'static str,
        backend: Option<&'static str>,
        delay: Duration,
        loads: AtomicUsize,
    }

    impl Provider {
        fn new(location: &'static str, backend: Option<&'static str>) -> Self {
            Self {
                location,
                backend,
                delay: Duration::ZERO,
                loads: AtomicUsize::new(0),
            }
        }
    }

    impl BackendProvider for Provider {
        fn location(&self) -> &str {
            self.location
        }

        fn load(&self) -> Result<Arc<dyn AcceleratedBackend>, BackendError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            match self.backend {
                Some(name) => Ok(Arc::new(NamedBackend(name))),
                None => Err(BackendError::Unavailable(self.location.to_string())),
            }
        }
    }

    #[test]
    fn test_first_loading_provider_wins() -> anyhow::Result<()> {
        let missing = Arc::new(Provider::new("./missing", None));
        let found = Arc::new(Provider::new("./native", Some("native")));
        let later = Arc::new(Provider::new("./later", Some("later")));
        let discovery = BackendDiscovery::new()
            .with_provider(missing.clone())
            .with_provider(found)
            .with_provider(later.clone());

        let backend = discovery.discover()?;
        assert_eq!(backend.name(), "native");
        assert_eq!(missing.loads.load(Ordering::SeqCst), 1);
        assert_eq!(later.loads.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn test_empty_discovery_is_unavailable() {
        let slot = BackendSlot::new(BackendDiscovery::new(), Duration::from_millis(50));
        assert_eq!(slot.status(), BackendStatus::Uninitialized);
        assert!(!slot.is_available());
        assert!(matches!(
            slot.status(),
            BackendStatus::Unavailable(BackendError::Unavailable(_))
        ));
    }

    #[test]
    fn test_initialization_runs_once() {
        let provider = Arc::new(Provider::new("./native", Some("native")));
        let slot = BackendSlot::new(
            BackendDiscovery::new().with_provider(provider.clone()),
            Duration::from_secs(5),
        );

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| assert!(slot.is_available()));
            }
        });
        assert_eq!(provider.loads.load(Ordering::SeqCst), 1);
        assert_eq!(slot.status(), BackendStatus::Ready("native".to_string()));
    }

    #[test]
    fn test_timeout_is_permanent() {
        let mut slow = Provider::new("./slow", Some("slow"));
        slow.delay = Duration::from_millis(300);
        let slow = Arc::new(slow);
        let slot = BackendSlot::new(
            BackendDiscovery::new().with_provider(slow.clone()),
            Duration::from_millis(20),
        );

        assert!(matches!(slot.get(), Err(BackendError::InitTimeout(20))));
        thread::sleep(Duration::from_millis(350));
        assert!(!slot.is_available());
        assert_eq!(slow.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_preloaded_slot() {
        let slot = BackendSlot::preloaded(Arc::new(NamedBackend("fixed")));
        assert_eq!(slot.status(), BackendStatus::Ready("fixed".to_string()));
    }
}
