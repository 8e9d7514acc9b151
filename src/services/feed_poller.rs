use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use uuid::Uuid;

use crate::api::ws_types::{FeedErrorNotice, FeedResetNotice, FeedUpdate, WsMessage};
use crate::feed::{
    project, FeedError, FeedStatus, MissingHashPolicy, SortDirection, SortKey, TradeBuffer,
    TradePredicate, DEFAULT_BUFFER_CAP,
};
use crate::models::{TradeFilter, TradeRecord};

/// Anything that can produce a page of trades for a filter.
pub trait TradeSource: Send + Sync + 'static {
    fn fetch_trades(
        &self,
        filter: &TradeFilter,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<TradeRecord>, FeedError>> + Send;
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub poll_interval: Duration,
    pub page_limit: u32,
    pub buffer_cap: usize,
    pub missing_hash: MissingHashPolicy,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            page_limit: 500,
            buffer_cap: DEFAULT_BUFFER_CAP,
            missing_hash: MissingHashPolicy::Keep,
        }
    }
}

/// Shared state of the current polling session.
#[derive(Debug)]
pub struct FeedState {
    pub buffer: TradeBuffer,
    pub status: FeedStatus,
    pub filter: TradeFilter,
    /// Bumped on every reset/shutdown. Results carrying an older value are dropped.
    pub generation: u64,
    pub session_id: Uuid,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub status: FeedStatus,
    pub label: String,
    pub filter: TradeFilter,
    pub session_id: Uuid,
    pub generation: u64,
    pub buffer_len: usize,
    pub buffer_cap: usize,
    pub missing_hash: MissingHashPolicy,
    pub poll_interval_secs: u64,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Merged { fetched: usize, added: usize },
    Failed(FeedError),
    /// The session was replaced while the fetch was in flight.
    Superseded,
}

/// Owns the polling task and the buffer it feeds.
///
/// Only one session runs at a time. `reset` cancels the running task before
/// arming the next one, and every commit is checked against the session
/// generation so a late result never lands in a newer buffer.
pub struct FeedController<S: TradeSource> {
    source: Arc<S>,
    settings: FeedSettings,
    state: Arc<RwLock<FeedState>>,
    task: Mutex<Option<JoinHandle<()>>>,
    updates: broadcast::Sender<WsMessage>,
}

impl<S: TradeSource> FeedController<S> {
    pub fn new(source: S, settings: FeedSettings, updates: broadcast::Sender<WsMessage>) -> Self {
        let state = FeedState {
            buffer: TradeBuffer::new(settings.buffer_cap, settings.missing_hash),
            status: FeedStatus::Idle,
            filter: TradeFilter::all(),
            generation: 0,
            session_id: Uuid::new_v4(),
            last_error: None,
            last_success: None,
        };

        Self {
            source: Arc::new(source),
            settings,
            state: Arc::new(RwLock::new(state)),
            task: Mutex::new(None),
            updates,
        }
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Start a fresh session for `filter`: cancel the old timer, clear the
    /// buffer, fetch immediately and then every `poll_interval`.
    pub async fn reset(&self, filter: TradeFilter) -> Uuid {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            handle.abort();
        }

        let (generation, session_id) = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.session_id = Uuid::new_v4();
            state.buffer.clear();
            state.status = FeedStatus::Loading;
            state.filter = filter.clone();
            state.last_error = None;
            state.last_success = None;
            (state.generation, state.session_id)
        };

        gauge!("feed_buffer_len").set(0.0);
        counter!("feed_resets_total").increment(1);
        tracing::info!(
            session = %session_id,
            filter = %filter,
            interval_secs = self.settings.poll_interval.as_secs(),
            "Feed session started"
        );

        let _ = self.updates.send(WsMessage::FeedReset(FeedResetNotice {
            session_id,
            label: filter.label(),
            filter: filter.clone(),
        }));

        let session = Session {
            source: self.source.clone(),
            state: self.state.clone(),
            updates: self.updates.clone(),
            page_limit: self.settings.page_limit,
            generation,
            session_id,
            filter,
        };
        *task = Some(tokio::spawn(session.run(self.settings.poll_interval)));

        session_id
    }

    /// Run one refresh cycle in the current session right now, outside the
    /// timer. Used for the manual retry action.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        let session = {
            let state = self.state.read().await;
            Session {
                source: self.source.clone(),
                state: self.state.clone(),
                updates: self.updates.clone(),
                page_limit: self.settings.page_limit,
                generation: state.generation,
                session_id: state.session_id,
                filter: state.filter.clone(),
            }
        };
        session.refresh().await
    }

    /// Cancel the polling task. The buffer is kept for reads.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
        let mut state = self.state.write().await;
        state.generation += 1;
        state.status = FeedStatus::Idle;
        tracing::info!(session = %state.session_id, "Feed session stopped");
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        let state = self.state.read().await;
        FeedSnapshot {
            status: state.status,
            label: state.filter.label(),
            filter: state.filter.clone(),
            session_id: state.session_id,
            generation: state.generation,
            buffer_len: state.buffer.len(),
            buffer_cap: state.buffer.cap(),
            missing_hash: state.buffer.missing_hash_policy(),
            poll_interval_secs: self.settings.poll_interval.as_secs(),
            last_error: state.last_error.clone(),
            last_success: state.last_success,
        }
    }

    pub async fn status(&self) -> FeedStatus {
        self.state.read().await.status
    }

    /// Copy of the buffer in buffer order.
    pub async fn trades(&self) -> Vec<TradeRecord> {
        self.state.read().await.buffer.trades().to_vec()
    }

    pub async fn project(
        &self,
        key: SortKey,
        direction: SortDirection,
        predicate: &TradePredicate,
    ) -> Vec<TradeRecord> {
        let state = self.state.read().await;
        project(state.buffer.trades(), key, direction, predicate)
    }
}

impl<S: TradeSource> Drop for FeedController<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

/// Everything one polling loop needs, captured at reset time.
struct Session<S> {
    source: Arc<S>,
    state: Arc<RwLock<FeedState>>,
    updates: broadcast::Sender<WsMessage>,
    page_limit: u32,
    generation: u64,
    session_id: Uuid,
    filter: TradeFilter,
}

impl<S: TradeSource> Session<S> {
    async fn run(self, poll_interval: Duration) {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // first tick fires immediately
            ticker.tick().await;
            if let RefreshOutcome::Superseded = self.refresh().await {
                break;
            }
        }
    }

    async fn refresh(&self) -> RefreshOutcome {
        {
            let mut state = self.state.write().await;
            if state.generation != self.generation {
                return RefreshOutcome::Superseded;
            }
            state.status = FeedStatus::Loading;
        }

        counter!("feed_polls_total").increment(1);
        let started = Instant::now();
        let result = self.source.fetch_trades(&self.filter, self.page_limit).await;
        histogram!("feed_poll_latency_seconds").record(started.elapsed().as_secs_f64());

        let mut state = self.state.write().await;
        if state.generation != self.generation {
            counter!("feed_stale_results_total").increment(1);
            tracing::debug!(
                session = %self.session_id,
                "Discarding result of superseded feed session"
            );
            return RefreshOutcome::Superseded;
        }

        match result {
            Ok(batch) => {
                let fetched = batch.len();
                let added = state.buffer.merge(batch);
                state.status = FeedStatus::Ready;
                state.last_error = None;
                state.last_success = Some(Utc::now());

                let buffer_len = state.buffer.len();
                gauge!("feed_buffer_len").set(buffer_len as f64);
                counter!("feed_trades_merged_total").increment(added as u64);

                if added == 0 {
                    tracing::debug!(
                        session = %self.session_id,
                        fetched,
                        "Feed refresh: no new trades"
                    );
                    return RefreshOutcome::Merged { fetched, added };
                }

                let trades = state.buffer.newest(added).to_vec();
                drop(state);

                tracing::info!(
                    session = %self.session_id,
                    fetched,
                    new = added,
                    buffer_len,
                    "Feed merged new trades"
                );

                let _ = self.updates.send(WsMessage::FeedUpdate(FeedUpdate {
                    session_id: self.session_id,
                    new_trades: added,
                    buffer_len,
                    trades,
                }));

                RefreshOutcome::Merged { fetched, added }
            }
            Err(e) => {
                state.status = FeedStatus::Failed;
                state.last_error = Some(e.to_string());
                drop(state);

                counter!("feed_poll_failures_total").increment(1);
                tracing::warn!(
                    session = %self.session_id,
                    error = %e,
                    "Feed refresh failed, buffer unchanged"
                );

                let _ = self.updates.send(WsMessage::FeedError(FeedErrorNotice {
                    session_id: self.session_id,
                    error: e.to_string(),
                }));

                RefreshOutcome::Failed(e)
            }
        }
    }
}
