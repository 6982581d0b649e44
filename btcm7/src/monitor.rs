//! Holder of the current snapshot for a presenter.

use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use btcm7_core::Btcm7Error;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::Btcm7;
use crate::snapshot::Snapshot;

/// A refresh failure kept for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshFailure {
    /// The error returned by the refresh.
    pub error: Btcm7Error,
    /// When the refresh failed.
    pub at: DateTime<Utc>,
}

#[derive(Default)]
struct MonitorState {
    current: Option<Arc<Snapshot>>,
    history: VecDeque<Arc<Snapshot>>,
    last_error: Option<RefreshFailure>,
}

/// Publishes snapshots from successive refreshes.
///
/// A successful refresh replaces the current snapshot and pushes the previous
/// one onto a bounded history. A failed refresh only records the error.
/// Refreshes through one monitor run one at a time.
pub struct Monitor {
    app: Btcm7,
    state: RwLock<MonitorState>,
    refreshing: Mutex<()>,
}

impl Monitor {
    /// Wrap an orchestrator; history depth comes from its `history_capacity`.
    #[must_use]
    pub fn new(app: Btcm7) -> Self {
        Self {
            app,
            state: RwLock::new(MonitorState::default()),
            refreshing: Mutex::new(()),
        }
    }

    /// The wrapped orchestrator.
    #[must_use]
    pub const fn app(&self) -> &Btcm7 {
        &self.app
    }

    /// Refresh over the configured period and publish the result.
    ///
    /// # Errors
    /// The refresh error; the previous snapshot stays current.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, Btcm7Error> {
        let _guard = self.refreshing.lock().await;
        let res = self.app.refresh().await;
        self.publish(res)
    }

    /// Refresh over `[start, end]` and publish the result.
    ///
    /// # Errors
    /// The refresh error; the previous snapshot stays current.
    pub async fn refresh_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<Snapshot>, Btcm7Error> {
        let _guard = self.refreshing.lock().await;
        let res = self.app.refresh_range(start, end).await;
        self.publish(res)
    }

    fn publish(&self, res: Result<Snapshot, Btcm7Error>) -> Result<Arc<Snapshot>, Btcm7Error> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match res {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                if let Some(prev) = state.current.replace(Arc::clone(&snapshot)) {
                    state.history.push_front(prev);
                    state.history.truncate(self.app.cfg.history_capacity);
                }
                state.last_error = None;
                Ok(snapshot)
            }
            Err(error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %error, "keeping previous snapshot");
                state.last_error = Some(RefreshFailure {
                    error: error.clone(),
                    at: Utc::now(),
                });
                Err(error)
            }
        }
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.current.clone()
    }

    /// Previous snapshots, newest first.
    #[must_use]
    pub fn history(&self) -> Vec<Arc<Snapshot>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.history.iter().cloned().collect()
    }

    /// The error of the latest refresh, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<RefreshFailure> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.last_error.clone()
    }
}
