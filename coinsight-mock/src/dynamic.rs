use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use coinsight_core::{
    CoinsightError, CryptoIdentity, DataSnapshot, ProviderClient, normalize_query,
    require_provider_id,
};

/// Instruction for how a method should behave for a given input.
#[derive(Clone, Debug)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(CoinsightError),
    /// Hang indefinitely (simulate a timeout).
    Hang,
}

#[derive(Default)]
struct InternalState {
    // keyed by normalized query
    identity_rules: HashMap<String, MockBehavior<CryptoIdentity>>,
    // keyed by uppercase symbol
    fetch_rules: HashMap<String, MockBehavior<DataSnapshot>>,
    fetch_delay: Option<Duration>,
}

#[derive(Default)]
struct Calls {
    identity: AtomicUsize,
    fetch: AtomicUsize,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
    calls: Arc<Calls>,
}

impl DynamicMockController {
    /// Set the behavior of `resolve_identity` for a query.
    pub async fn set_identity_behavior(
        &self,
        query: &str,
        behavior: MockBehavior<CryptoIdentity>,
    ) {
        let mut guard = self.state.lock().await;
        guard.identity_rules.insert(normalize_query(query), behavior);
    }

    /// Set the behavior of `fetch_data` for a symbol.
    pub async fn set_fetch_behavior(&self, symbol: &str, behavior: MockBehavior<DataSnapshot>) {
        let mut guard = self.state.lock().await;
        guard.fetch_rules.insert(symbol.to_uppercase(), behavior);
    }

    /// List a coin: `query` resolves to the snapshot's symbol and name, and
    /// fetching returns `snapshot` re-tagged with this provider as its source.
    pub async fn set_listing(&self, query: &str, snapshot: DataSnapshot) {
        let identity = CryptoIdentity::new(query, &snapshot.symbol, snapshot.name.as_str())
            .with_provider_id(self.name, snapshot.name.to_lowercase());
        let symbol = snapshot.symbol.clone();
        let snapshot = DataSnapshot {
            source: self.name.to_string(),
            ..snapshot
        };
        let mut guard = self.state.lock().await;
        guard
            .identity_rules
            .insert(normalize_query(query), MockBehavior::Return(identity));
        guard.fetch_rules.insert(symbol, MockBehavior::Return(snapshot));
    }

    /// Delay every `fetch_data` call by `delay` before applying its behavior.
    pub async fn set_fetch_delay(&self, delay: Duration) {
        self.state.lock().await.fetch_delay = Some(delay);
    }

    /// Number of `resolve_identity` calls received so far.
    #[must_use]
    pub fn identity_calls(&self) -> usize {
        self.calls.identity.load(Ordering::SeqCst)
    }

    /// Number of `fetch_data` calls received so far.
    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.calls.fetch.load(Ordering::SeqCst)
    }

    /// Clear all configured behaviors and call counters.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.identity_rules.clear();
        guard.fetch_rules.clear();
        guard.fetch_delay = None;
        self.calls.identity.store(0, Ordering::SeqCst);
        self.calls.fetch.store(0, Ordering::SeqCst);
    }
}

/// A provider that defers all behavior to an external controller.
///
/// Unscripted queries answer `IdentityNotFound`; unscripted symbols answer
/// `ProviderUnavailable`.
pub struct DynamicMockProvider {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
    calls: Arc<Calls>,
}

impl DynamicMockProvider {
    /// Create a new dynamic mock provider and its controller.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
    ) -> (Arc<dyn ProviderClient>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let calls = Arc::new(Calls::default());
        let controller = DynamicMockController {
            name,
            state: Arc::clone(&state),
            calls: Arc::clone(&calls),
        };
        let me = Arc::new(Self { name, state, calls });
        (me as Arc<dyn ProviderClient>, controller)
    }
}

async fn play<T>(
    behavior: Option<MockBehavior<T>>,
    otherwise: CoinsightError,
) -> Result<T, CoinsightError> {
    match behavior {
        Some(MockBehavior::Return(v)) => Ok(v),
        Some(MockBehavior::Fail(e)) => Err(e),
        Some(MockBehavior::Hang) => std::future::pending().await,
        None => Err(otherwise),
    }
}

#[async_trait]
impl ProviderClient for DynamicMockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
    }

    async fn resolve_identity(&self, query: &str) -> Result<CryptoIdentity, CoinsightError> {
        self.calls.identity.fetch_add(1, Ordering::SeqCst);
        // Acquire behavior snapshot without holding the lock across await points
        let behavior = {
            let guard = self.state.lock().await;
            guard.identity_rules.get(&normalize_query(query)).cloned()
        };
        play(behavior, CoinsightError::identity_not_found(self.name, query)).await
    }

    async fn fetch_data(&self, identity: &CryptoIdentity) -> Result<DataSnapshot, CoinsightError> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        require_provider_id(self.name, identity)?;
        let (behavior, delay) = {
            let guard = self.state.lock().await;
            (
                guard.fetch_rules.get(identity.symbol()).cloned(),
                guard.fetch_delay,
            )
        };
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        play(
            behavior,
            CoinsightError::unavailable(
                self.name,
                format!("no behavior for {}", identity.symbol()),
            ),
        )
        .await
    }
}
