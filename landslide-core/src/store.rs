//! The risk data store: one fetch-and-classify cycle per request, one
//! published `{data, loading, error}` state.
//!
//! Every call to [`RiskDataStore::fetch_risk_data`] takes a new request number.
//! A request only publishes its result while it is still the latest one, so a
//! slow response for a community the user already navigated away from is
//! dropped silently instead of overwriting the newer state.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    classify::{FetchOutcome, RawOutcome, classify},
    community::CommunityId,
    error::{ErrorDescriptor, TransportError},
    model::StoreState,
    transport::RiskTransport,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// What happened to the state when a fetch settled.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Published(StoreState),
    /// A later request was issued (or the store was cleared) first.
    Superseded,
}

pub struct RiskDataStore {
    transport: Arc<dyn RiskTransport>,
    timeout: Duration,
    clock: Clock,
    latest: AtomicU64,
    state: watch::Sender<StoreState>,
}

impl fmt::Debug for RiskDataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskDataStore")
            .field("transport", &self.transport)
            .field("timeout", &self.timeout)
            .field("latest", &self.latest)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl RiskDataStore {
    pub fn new(transport: Arc<dyn RiskTransport>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            transport,
            timeout: DEFAULT_TIMEOUT,
            clock: Arc::new(Utc::now),
            latest: AtomicU64::new(0),
            state,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Read-only view that is notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Fetch, classify and publish risk data for `community`.
    ///
    /// Unknown codes are rejected without touching the transport. While the
    /// request is in flight the previous `data` stays visible and the previous
    /// error is cleared. `loading` is reset even if the returned future is
    /// dropped before completion.
    pub async fn fetch_risk_data(&self, community: &str) -> Settlement {
        let request = self.next_request();

        let Ok(id) = CommunityId::try_from(community) else {
            warn!(request, community, "Rejected unknown community");
            return self.settle(
                request,
                StoreState { data: None, loading: false, error: Some(ErrorDescriptor::validation()) },
            );
        };

        self.state.send_if_modified(|s| {
            if !self.is_latest(request) {
                return false;
            }
            s.loading = true;
            s.error = None;
            true
        });
        let _loading = LoadingGuard { store: self, request };

        debug!(request, %id, "Fetching landslide risk");
        let raw = match tokio::time::timeout(self.timeout, self.transport.get_risk(id)).await {
            Ok(raw) => raw,
            Err(_) => Err(TransportError::Timeout),
        };

        let now = (self.clock)();
        let outcome = classify(&raw, now);
        log_outcome(request, id, &raw, &outcome);

        let next = match outcome {
            FetchOutcome::Success(snapshot) => {
                StoreState { data: Some(snapshot), loading: false, error: None }
            }
            failed => StoreState {
                data: None,
                loading: false,
                error: ErrorDescriptor::from_outcome(&failed, now),
            },
        };

        self.settle(request, next)
    }

    /// Back to idle. Results of requests still in flight are discarded.
    pub fn clear(&self) {
        let request = self.next_request();
        debug!(request, "Clearing risk state");
        self.state.send_replace(StoreState::default());
    }

    fn next_request(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, request: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == request
    }

    fn settle(&self, request: u64, next: StoreState) -> Settlement {
        let mut published = None;

        self.state.send_if_modified(|s| {
            if !self.is_latest(request) {
                return false;
            }
            *s = next;
            published = Some(s.clone());
            true
        });

        match published {
            Some(state) => Settlement::Published(state),
            None => {
                debug!(request, "Discarding superseded result");
                Settlement::Superseded
            }
        }
    }
}

/// Clears `loading` for the latest request on every exit path, including
/// cancellation of the fetch future.
struct LoadingGuard<'a> {
    store: &'a RiskDataStore,
    request: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let store = self.store;
        let request = self.request;
        store.state.send_if_modified(|s| {
            if !store.is_latest(request) || !s.loading {
                return false;
            }
            s.loading = false;
            true
        });
    }
}

fn log_outcome(request: u64, id: CommunityId, raw: &RawOutcome, outcome: &FetchOutcome) {
    match (raw, outcome) {
        (_, FetchOutcome::Success(snapshot)) => info!(
            request,
            %id,
            risk_level = snapshot.risk_level,
            expires_at = %snapshot.expires_at,
            "Landslide risk is current"
        ),
        (Err(err), _) => warn!(request, %id, "Landslide risk request failed: {err}"),
        (Ok(res), outcome) => warn!(
            request,
            %id,
            status = res.status,
            "Landslide risk rejected as {outcome:?}: {}",
            truncate_body(&res.body)
        ),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
