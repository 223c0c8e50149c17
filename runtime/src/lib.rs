//! # Tasklist Runtime
//!
//! Runtime for the tasklist action/reducer/effect pipeline.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling, plus the production HTTP client.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Spawns effect futures and feeds their actions back to the reducer
//! - **In-flight registry**: Cancellation tokens of running cancellable effects
//! - **`ReqwestHttpClient`**: [`HttpClient`](tasklist_core::environment::HttpClient) over reqwest
//!
//! ## Example
//!
//! ```ignore
//! use tasklist_runtime::Store;
//!
//! let store = Store::new(
//!     TodoState::default(),
//!     TodoReducer,
//!     environment,
//! );
//!
//! // Send an action
//! store.send(TodoAction::ObtainTodoList(Lifecycle::Request(()))).await?;
//!
//! // Read state
//! let count = store.state(|s| s.all_ids.len()).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tasklist_core::{effect::Effect, reducer::Reducer};
use tokio::sync::{RwLock, watch};

/// In-flight registry for cancellable effects
pub mod cancellation;

/// reqwest-backed HTTP client
pub mod http;

pub use cancellation::{InFlightRegistry, Registration};
pub use http::ReqwestHttpClient;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tasklist_runtime::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(256)
///     .with_shutdown_timeout(Duration::from_secs(10));
///
/// assert_eq!(config.broadcast_capacity, 256);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of actions buffered for each action subscriber
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects of one
/// action to complete. An effect counts as complete once its output action,
/// if any, has been reduced or dropped as cancelled.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracking clone is gone, so the counter is final
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), ()> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| ())
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: counter shared between an [`EffectHandle`] and the effects it tracks
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect, EffectHandle,
        EffectTracking, Ordering, Reducer, RwLock, StoreConfig, StoreError, watch,
    };
    use crate::cancellation::{InFlightRegistry, Registration};
    use futures::future::BoxFuture;
    use std::sync::atomic::AtomicBool;
    use tasklist_core::SmallVec;
    use tasklist_core::effect::EffectId;
    use tokio::sync::broadcast;
    use tracing::Instrument;

    /// An effect future ready to be spawned, with the cancellation
    /// registration it received while the state lock was held.
    struct Scheduled<A> {
        kind: &'static str,
        future: BoxFuture<'static, Option<A>>,
        registration: Option<Registration>,
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// # Cancellation
    ///
    /// Registering a cancellable effect, cancelling it and deciding whether
    /// its outcome is reduced all happen under the state write lock. An
    /// outcome is therefore reduced if and only if no matching
    /// `Effect::Cancel` was reduced before it.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        in_flight: Arc<InFlightRegistry>,
        /// Every action produced by an effect and reduced, for observers.
        action_broadcast: broadcast::Sender<A>,
        /// Revision counter bumped after every reduced action.
        state_changes: Arc<watch::Sender<u64>>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Clone + Send + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));
            let (state_changes, _) = watch::channel(0);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                in_flight: Arc::new(InFlightRegistry::new()),
                action_broadcast,
                state_changes: Arc::new(state_changes),
            }
        }

        /// The configuration this store was built with
        #[must_use]
        pub const fn config(&self) -> &StoreConfig {
            &self.config
        }

        /// The injected environment
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// Number of running cancellable effects tagged with `id`
        #[must_use]
        pub fn in_flight(&self, id: &EffectId) -> usize {
            self.in_flight.in_flight(id)
        }

        /// Number of effects still running, across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Initiate graceful shutdown
        ///
        /// New actions are rejected with [`StoreError::ShutdownInProgress`].
        /// Running effects are allowed to finish and their outcomes are
        /// still reduced.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running", pending
                    );
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tracing::trace!(
                    pending_effects = pending,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Waiting for effects to complete"
                );

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Registers and cancels cancellable effects, still under the lock
        /// 4. Spawns the remaining effect futures
        ///
        /// `send()` returns after starting effect execution, not completion.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let scheduled = {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");
                self.reduce_locked(&mut state, action)
            };

            tracing::trace!("Executing {} effects", scheduled.len());
            for effect in scheduled {
                self.spawn_effect(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast before sending, then returns
        /// the first action produced by an effect that matches `predicate`.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged, {} actions skipped", skipped);
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to actions produced by effects
        ///
        /// Receives a clone of every effect-produced action after it has been
        /// reduced. Outcomes dropped by cancellation are not broadcast.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Subscribe to state changes
        ///
        /// The receiver holds a revision counter bumped after every reduced
        /// action. Read the new state with [`Store::state`].
        #[must_use]
        pub fn subscribe_state(&self) -> watch::Receiver<u64> {
            self.state_changes.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.all_ids.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Reduce one action and schedule its effects. Caller holds the write lock.
        fn reduce_locked(&self, state: &mut S, action: A) -> SmallVec<[Scheduled<A>; 4]> {
            let span = tracing::debug_span!("reducer_execution");
            let _enter = span.enter();

            let start = std::time::Instant::now();
            let effects = self.reducer.reduce(state, action, &self.environment);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            tracing::trace!("Reducer completed, returned {} effects", effects.len());
            #[allow(clippy::cast_precision_loss)]
            metrics::histogram!("store.effects.count").record(effects.len() as f64);

            let scheduled = effects
                .into_iter()
                .filter_map(|effect| self.schedule(effect))
                .collect();

            self.state_changes.send_modify(|revision| *revision = revision.wrapping_add(1));

            scheduled
        }

        /// Unwrap an effect into a spawnable future. Caller holds the write lock.
        fn schedule(&self, effect: Effect<A>) -> Option<Scheduled<A>> {
            let mut ids: Vec<EffectId> = Vec::new();
            let mut effect = effect;

            loop {
                match effect {
                    Effect::None => {
                        metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                        return None;
                    },
                    Effect::Cancel(id) => {
                        let cancelled = self.in_flight.cancel(&id);
                        tracing::debug!(effect_id = %id, cancelled, "Cancelled in-flight effects");
                        metrics::counter!("store.effects.executed", "type" => "cancel").increment(1);
                        metrics::counter!("store.effects.cancelled")
                            .increment(u64::try_from(cancelled).unwrap_or(u64::MAX));
                        return None;
                    },
                    Effect::Cancellable { id, effect: inner } => {
                        ids.push(id);
                        effect = *inner;
                    },
                    Effect::Future(future) => {
                        let (kind, registration) = if ids.is_empty() {
                            ("future", None)
                        } else {
                            ("cancellable", Some(self.in_flight.register(&ids)))
                        };
                        return Some(Scheduled {
                            kind,
                            future,
                            registration,
                        });
                    },
                }
            }
        }

        fn spawn_effect(&self, scheduled: Scheduled<A>, tracking: EffectTracking) {
            let Scheduled {
                kind,
                future,
                registration,
            } = scheduled;

            tracing::trace!(kind, "Executing effect");
            metrics::counter!("store.effects.executed", "type" => kind).increment(1);
            tracking.increment();

            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            let store = self.clone();
            let span = tracing::debug_span!("execute_effect", kind);

            let task = async move {
                let _guard = DecrementGuard(tracking);
                let _pending_guard = pending_guard;
                // Dropped before the guards, so waiters never see a stale in-flight entry
                let registration = registration;

                let output = match &registration {
                    Some(registration) => {
                        let token = registration.token().clone();
                        tokio::select! {
                            biased;
                            () = token.cancelled() => {
                                tracing::debug!(ids = ?registration.ids(), "Effect cancelled before completion");
                                metrics::counter!("store.effects.discarded").increment(1);
                                return;
                            }
                            output = future => output,
                        }
                    },
                    None => future.await,
                };

                match output {
                    Some(action) => store.feedback(action, registration.as_ref()).await,
                    None => tracing::trace!("Effect completed with no action"),
                }
            };

            tokio::spawn(task.instrument(span));
        }

        /// Reduce an action produced by an effect, unless the effect was
        /// cancelled before the write lock was acquired.
        async fn feedback(&self, action: A, registration: Option<&Registration>) {
            let (handle_tracking, scheduled) = {
                let mut state = self.state.write().await;

                if registration.is_some_and(Registration::is_cancelled) {
                    tracing::debug!("Dropping outcome of cancelled effect");
                    metrics::counter!("store.effects.discarded").increment(1);
                    return;
                }

                let (_, tracking) = EffectHandle::new();
                (tracking, self.reduce_locked(&mut state, action.clone()))
            };

            let _ = self.action_broadcast.send(action);

            for effect in scheduled {
                self.spawn_effect(effect, handle_tracking.clone());
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                in_flight: Arc::clone(&self.in_flight),
                action_broadcast: self.action_broadcast.clone(),
                state_changes: Arc::clone(&self.state_changes),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
