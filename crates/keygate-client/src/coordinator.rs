//! Cross-tab inactivity detection and single-shot logout.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use keygate_core::traits::Clock;

use crate::activity::ActivityStore;
use crate::channel::{TabChannel, TabEnvelope, TabPayload};

/// How often the threshold is compared against the shared timestamp.
const CHECK_INTERVAL: StdDuration = StdDuration::from_secs(10);

/// How often buffered interactions are broadcast to sibling tabs.
const DISPATCH_INTERVAL: StdDuration = StdDuration::from_secs(1);

/// Cross-tab messages older than this are discarded on receipt.
const MESSAGE_MAX_AGE_MILLIS: i64 = 5_000;

/// Reason attached to inactivity-driven logout broadcasts.
pub const LOGOUT_REASON_INACTIVITY: &str = "inactivity";

/// The callbacks a coordinator drives.
pub struct CoordinatorHooks {
    on_logout: Box<dyn Fn() + Send + Sync>,
    notify_server: Option<Box<dyn Fn() + Send + Sync>>,
}

impl CoordinatorHooks {
    /// Hooks with only the mandatory logout callback.
    pub fn new(on_logout: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            on_logout: Box::new(on_logout),
            notify_server: None,
        }
    }

    /// Adds a best-effort server notification, invoked on a local
    /// threshold breach before the logout callback. Implementations
    /// should fire-and-forget; a slow or failing notify must not block
    /// the logout.
    pub fn with_server_notify(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.notify_server = Some(Box::new(notify));
        self
    }
}

impl std::fmt::Debug for CoordinatorHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorHooks")
            .field("notify_server", &self.notify_server.is_some())
            .finish()
    }
}

/// Decides, across every tab of one origin, when the human has stopped
/// interacting, then triggers exactly one logout.
///
/// Tabs coordinate through a shared last-activity timestamp and a
/// fire-and-forget message bus; there is no leader, and the most recent
/// timestamp wins. A coordinator that has stopped, for any reason,
/// never fires its callback again.
#[derive(Debug, Clone)]
pub struct InactivityCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    tab_id: Uuid,
    store: Arc<dyn ActivityStore>,
    channel: Arc<dyn TabChannel>,
    clock: Arc<dyn Clock>,
    threshold: Duration,
    hooks: CoordinatorHooks,
    pending_broadcast: AtomicBool,
    started: AtomicBool,
    stopped: AtomicBool,
    tasks: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InactivityCoordinator")
            .field("tab_id", &self.tab_id)
            .field("threshold", &self.threshold)
            .field("stopped", &self.stopped.load(Ordering::SeqCst))
            .finish()
    }
}

impl InactivityCoordinator {
    /// Creates a coordinator for one tab. Call [`start`](Self::start) to
    /// begin tracking.
    pub fn new(
        store: Arc<dyn ActivityStore>,
        channel: Arc<dyn TabChannel>,
        clock: Arc<dyn Clock>,
        threshold: Duration,
        hooks: CoordinatorHooks,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                tab_id: Uuid::new_v4(),
                store,
                channel,
                clock,
                threshold,
                hooks,
                pending_broadcast: AtomicBool::new(false),
                started: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                tasks: std::sync::Mutex::new(Vec::new()),
            }),
        }
    }

    /// This tab's random identifier.
    pub fn tab_id(&self) -> Uuid {
        self.inner.tab_id
    }

    /// Records the tab opening as activity and spawns the recurring
    /// timers plus the sibling-message listener. A second call is
    /// ignored.
    pub fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.record_activity();

        let check = tokio::spawn(Inner::check_loop(self.inner.clone()));
        let dispatch = tokio::spawn(Inner::dispatch_loop(self.inner.clone()));
        let listen = tokio::spawn(Inner::listen_loop(self.inner.clone()));

        let mut tasks = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tasks.extend([check, dispatch, listen]);

        info!(
            tab_id = %self.inner.tab_id,
            threshold_seconds = self.inner.threshold.num_seconds(),
            "Inactivity coordinator started"
        );
    }

    /// Reports one user interaction: updates the shared timestamp and
    /// marks it for broadcast on the next dispatch tick.
    pub fn record_activity(&self) {
        self.inner.record_activity();
    }

    /// Runs one threshold comparison, as the recurring timer does.
    pub fn check_threshold(&self) {
        self.inner.check_threshold();
    }

    /// Broadcasts buffered activity now, as the dispatch timer does.
    pub fn flush_activity(&self) {
        self.inner.flush_activity();
    }

    /// Applies one sibling message, as the listener does on receipt.
    pub fn apply_message(&self, envelope: TabEnvelope) {
        self.inner.apply_message(envelope);
    }

    /// Stops tracking: clears the timers, drops the subscription, and
    /// guarantees the logout callback never fires after this returns.
    pub fn stop(&self) {
        if self.inner.halt() {
            self.inner.abort_tasks();
            info!(tab_id = %self.inner.tab_id, "Inactivity coordinator stopped");
        }
    }

    /// Whether this coordinator has stopped tracking.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }
}

impl Inner {
    /// Flips to stopped. True for the one caller that made the
    /// transition.
    fn halt(&self) -> bool {
        !self.stopped.swap(true, Ordering::SeqCst)
    }

    fn abort_tasks(&self) {
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    fn record_activity(&self) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        self.store.store_last_activity(self.clock.now());
        self.pending_broadcast.store(true, Ordering::SeqCst);
    }

    fn check_threshold(&self) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        let Some(last) = self.store.load_last_activity() else {
            return;
        };
        let idle = self.clock.now() - last;
        if idle >= self.threshold {
            self.breach(idle);
        }
    }

    /// The local-breach logout: notify the server, stop tracking,
    /// broadcast, fire the callback.
    fn breach(&self, idle: Duration) {
        if !self.halt() {
            return;
        }
        warn!(
            tab_id = %self.tab_id,
            idle_seconds = idle.num_seconds(),
            "Inactivity threshold breached, signing out"
        );
        if let Some(notify) = &self.hooks.notify_server {
            notify();
        }
        self.channel.publish(TabEnvelope {
            tab_id: self.tab_id,
            sent_at: self.clock.now(),
            payload: TabPayload::Logout {
                reason: LOGOUT_REASON_INACTIVITY.to_string(),
            },
        });
        (self.hooks.on_logout)();
        self.abort_tasks();
    }

    /// The follow-a-sibling logout: no server notify and no rebroadcast,
    /// the sibling already did both.
    fn adopt_logout(&self) {
        if !self.halt() {
            return;
        }
        (self.hooks.on_logout)();
        self.abort_tasks();
    }

    fn flush_activity(&self) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        if !self.pending_broadcast.swap(false, Ordering::SeqCst) {
            return;
        }
        let Some(at) = self.store.load_last_activity() else {
            return;
        };
        self.channel.publish(TabEnvelope {
            tab_id: self.tab_id,
            sent_at: self.clock.now(),
            payload: TabPayload::Activity { at },
        });
    }

    fn apply_message(&self, envelope: TabEnvelope) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        let age = self.clock.now() - envelope.sent_at;
        if age.num_milliseconds() > MESSAGE_MAX_AGE_MILLIS {
            debug!(
                tab_id = %envelope.tab_id,
                age_seconds = age.num_seconds(),
                "Discarded stale cross-tab message"
            );
            return;
        }
        match envelope.payload {
            TabPayload::Activity { at } => {
                // Most recent timestamp wins.
                let current = self.store.load_last_activity();
                if current.is_none_or(|known| at > known) {
                    self.store.store_last_activity(at);
                }
            }
            TabPayload::Logout { reason } => {
                info!(
                    tab_id = %envelope.tab_id,
                    reason = %reason,
                    "Sibling tab signed out, following"
                );
                self.adopt_logout();
            }
        }
    }

    async fn check_loop(inner: Arc<Self>) {
        let mut ticker = tokio::time::interval(CHECK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if inner.stopped.load(Ordering::SeqCst) {
                break;
            }
            inner.check_threshold();
        }
    }

    async fn dispatch_loop(inner: Arc<Self>) {
        let mut ticker = tokio::time::interval(DISPATCH_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if inner.stopped.load(Ordering::SeqCst) {
                break;
            }
            inner.flush_activity();
        }
    }

    async fn listen_loop(inner: Arc<Self>) {
        let mut rx = inner.channel.subscribe();
        loop {
            match rx.recv().await {
                Ok(envelope) => inner.apply_message(envelope),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(tab_id = %inner.tab_id, skipped, "Cross-tab receiver lagged");
                }
                Err(RecvError::Closed) => break,
            }
            if inner.stopped.load(Ordering::SeqCst) {
                break;
            }
        }
    }
}
