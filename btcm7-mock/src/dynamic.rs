use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use btcm7_core::connector::{Btcm7Connector, SeriesProvider};
use btcm7_core::{AssetClass, Btcm7Error, RawSeries, SeriesRequest, Ticker};

use crate::fixtures;

/// Instruction for how a `series` call should behave for a given symbol.
#[derive(Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(Btcm7Error),
    /// Hang indefinitely (simulate a timeout).
    Hang,
    /// Serve deterministic fixture data for the requested range.
    Fixture,
}

#[derive(Default)]
struct InternalState {
    rules: HashMap<String, MockBehavior<RawSeries>>,
    scripts: HashMap<String, VecDeque<MockBehavior<RawSeries>>>,
    calls: HashMap<String, Vec<Instant>>,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the standing behavior for `series` calls for a symbol.
    pub async fn set_behavior(&self, symbol: &str, behavior: MockBehavior<RawSeries>) {
        let mut guard = self.state.lock().await;
        guard.rules.insert(symbol.to_string(), behavior);
    }

    /// Queue behaviors consumed one per call, before the standing behavior applies.
    pub async fn script(&self, symbol: &str, steps: Vec<MockBehavior<RawSeries>>) {
        let mut guard = self.state.lock().await;
        guard
            .scripts
            .entry(symbol.to_string())
            .or_default()
            .extend(steps);
    }

    /// Instants at which `series` was called for `symbol`.
    pub async fn calls(&self, symbol: &str) -> Vec<Instant> {
        let guard = self.state.lock().await;
        guard.calls.get(symbol).cloned().unwrap_or_default()
    }

    /// Number of `series` calls for `symbol`.
    pub async fn call_count(&self, symbol: &str) -> usize {
        let guard = self.state.lock().await;
        guard.calls.get(symbol).map_or(0, Vec::len)
    }

    /// Total `series` calls across every symbol.
    pub async fn total_calls(&self) -> usize {
        let guard = self.state.lock().await;
        guard.calls.values().map(Vec::len).sum()
    }

    /// Clear all configured behaviors, scripts, and call logs.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.rules.clear();
        guard.scripts.clear();
        guard.calls.clear();
    }
}

/// A connector that defers all behavior to an external controller.
///
/// Symbols without a rule or script are served from fixtures.
pub struct DynamicMockConnector {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockConnector {
    /// Create a new dynamic mock connector and its controller.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
    ) -> (Arc<dyn Btcm7Connector>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self { name, state });
        (me as Arc<dyn Btcm7Connector>, controller)
    }
}

#[async_trait]
impl Btcm7Connector for DynamicMockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
    }

    fn supports_class(&self, _class: AssetClass) -> bool {
        true
    }

    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        Some(self as &dyn SeriesProvider)
    }
}

#[async_trait]
impl SeriesProvider for DynamicMockConnector {
    async fn series(&self, ticker: &Ticker, req: &SeriesRequest) -> Result<RawSeries, Btcm7Error> {
        let symbol = ticker.symbol();
        // Take the behavior without holding the lock across await points.
        let behavior = {
            let mut guard = self.state.lock().await;
            guard
                .calls
                .entry(symbol.to_string())
                .or_default()
                .push(Instant::now());
            let scripted = guard.scripts.get_mut(symbol).and_then(VecDeque::pop_front);
            scripted.or_else(|| guard.rules.get(symbol).cloned())
        };

        match behavior.unwrap_or(MockBehavior::Fixture) {
            MockBehavior::Return(series) => Ok(series),
            MockBehavior::Fail(e) => Err(e),
            MockBehavior::Hang => std::future::pending().await,
            MockBehavior::Fixture => RawSeries::new(
                ticker.clone(),
                fixtures::series_points(symbol, ticker.class(), req),
            ),
        }
    }
}
