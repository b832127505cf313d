//! SyncEngine, the orchestrator the host application talks to.
//!
//! Owns the storage engine, the dispatcher task, the queue gate, and the
//! reconciliation service, and serializes the login flow against dispatch.

use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use stride_core::config::StrideConfig;
use stride_core::errors::{ConfigError, QueueError, StrideError, StrideResult};
use stride_core::models::{
    EngineState, NetworkState, QueueEntry, QueueStats, ReconcileReport, SwitchCheck,
};
use stride_core::traits::{
    Clock, LocalTableStore, Mutation, ProgressSink, RemoteApplier, RemoteSource, SystemClock,
};
use stride_storage::{RetentionPolicy, RetentionReport, StorageEngine};

use crate::dispatch::{Dispatcher, DispatcherHandle};
use crate::gate::QueueGate;
use crate::queue::MutationQueue;
use crate::reconcile::{Decision, ReconciliationService};

/// What the engine is doing with respect to logins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// The dispatcher drains the queue.
    Dispatching,
    /// A login is in progress; the dispatcher is paused.
    Reconciling,
    /// The last login failed after local data was touched. Dispatch stays
    /// paused until a login succeeds.
    AwaitingLogin,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoginOptions {
    /// Give a blocking user's entries one final attempt before refusing.
    pub force_drain: bool,
}

impl LoginOptions {
    pub fn force_drain() -> Self {
        Self { force_drain: true }
    }
}

#[derive(Debug, Clone)]
struct Session {
    active_user: Option<String>,
    phase: EnginePhase,
}

pub struct SyncEngine<M: Mutation> {
    config: StrideConfig,
    store: Arc<StorageEngine>,
    clock: Arc<dyn Clock>,
    queue: MutationQueue<M>,
    gate: QueueGate,
    reconciler: ReconciliationService,
    dispatcher: DispatcherHandle,
    task: Mutex<Option<JoinHandle<()>>>,
    session: RwLock<Session>,
    login_lock: tokio::sync::Mutex<()>,
}

impl<M: Mutation> SyncEngine<M> {
    pub fn builder(config: StrideConfig) -> SyncEngineBuilder<M> {
        SyncEngineBuilder::new(config)
    }

    // ─── Queue ──────────────────────────────────────────────────────

    /// Durably enqueue a mutation for the active user and wake the
    /// dispatcher. Never waits on the network.
    pub fn enqueue(&self, mutation: &M) -> StrideResult<QueueEntry> {
        let user = self.active_user().ok_or(QueueError::NoActiveUser)?;
        let entry = self.queue.enqueue(&user, mutation)?;
        self.dispatcher.wake();
        Ok(entry)
    }

    pub fn get(&self, id: &str) -> StrideResult<Option<QueueEntry>> {
        Ok(self.queue.get(id)?)
    }

    pub fn stats(&self) -> StrideResult<QueueStats> {
        Ok(self.queue.stats()?)
    }

    pub fn failed_entries(&self) -> StrideResult<Vec<QueueEntry>> {
        Ok(self.queue.failed_entries()?)
    }

    pub fn retry_failed(&self, id: &str) -> StrideResult<QueueEntry> {
        let entry = self.queue.retry_failed(id)?;
        self.dispatcher.wake();
        Ok(entry)
    }

    pub fn discard_failed(&self, id: &str) -> StrideResult<()> {
        Ok(self.queue.discard_failed(id)?)
    }

    /// Sweep old completed and failed entries per the configured windows.
    pub fn apply_retention(&self) -> StrideResult<RetentionReport> {
        let policy = RetentionPolicy::from(&self.config.queue);
        Ok(self.store.apply_retention(&policy, self.clock.now())?)
    }

    // ─── Dispatch ───────────────────────────────────────────────────

    pub async fn set_network_state(&self, network: NetworkState) -> StrideResult<()> {
        Ok(self.dispatcher.set_network_state(network).await?)
    }

    pub fn wake(&self) {
        self.dispatcher.wake();
    }

    pub fn engine_state(&self) -> EngineState {
        self.dispatcher.engine_state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<EngineState> {
        self.dispatcher.subscribe()
    }

    pub fn dispatcher(&self) -> &DispatcherHandle {
        &self.dispatcher
    }

    // ─── Login ──────────────────────────────────────────────────────

    pub fn phase(&self) -> EnginePhase {
        self.read_session().phase
    }

    pub fn active_user(&self) -> Option<String> {
        self.read_session().active_user
    }

    pub fn can_switch_user(&self, incoming_user: &str) -> StrideResult<SwitchCheck> {
        Ok(self.gate.can_switch_user(incoming_user)?)
    }

    /// The restore mode a login of `user_id` would use.
    pub fn planned_restore(&self, user_id: &str) -> StrideResult<Decision> {
        Ok(self.reconciler.decide_for(user_id)?)
    }

    /// Log `user_id` in: pause dispatch, pass the queue gate, reconcile the
    /// local dataset, then resume dispatch for the new user.
    ///
    /// A blocked gate leaves the previous session untouched. A failed
    /// reconciliation leaves dispatch paused in [`EnginePhase::AwaitingLogin`]
    /// until a later login succeeds.
    pub async fn login(
        &self,
        user_id: &str,
        options: LoginOptions,
        progress: &dyn ProgressSink,
    ) -> StrideResult<ReconcileReport> {
        let _login = self.login_lock.lock().await;
        if !self.dispatcher.is_running() {
            return Err(StrideError::ShuttingDown);
        }

        let previous = self.read_session();
        self.write_session(None, EnginePhase::Reconciling);

        if let Err(e) = self.dispatcher.pause().await {
            self.write_session(previous.active_user, previous.phase);
            return Err(e.into());
        }

        let admitted = self
            .gate
            .admit(
                user_id,
                options.force_drain,
                &self.dispatcher,
                self.config.reconcile.drain_timeout(),
            )
            .await;
        if let Err(e) = admitted {
            self.write_session(previous.active_user, previous.phase);
            if previous.phase == EnginePhase::Dispatching {
                self.dispatcher.resume().await?;
            }
            return Err(e.into());
        }

        match self.reconciler.reconcile(user_id, progress).await {
            Ok(report) => {
                self.write_session(Some(user_id.to_string()), EnginePhase::Dispatching);
                self.dispatcher.resume().await?;
                tracing::info!(user_id, mode = %report.mode, "login complete");
                Ok(report)
            }
            Err(e) => {
                self.write_session(None, EnginePhase::AwaitingLogin);
                tracing::warn!(user_id, error = %e, "login failed, dispatch stays paused");
                Err(e.into())
            }
        }
    }

    /// Forget the active user. Their queued entries keep draining.
    pub fn logout(&self) {
        let mut session = self.session.write().unwrap_or_else(|p| p.into_inner());
        session.active_user = None;
    }

    /// Stop the dispatcher task and wait for it to exit.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
        let task = self.task.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "dispatcher task ended abnormally");
            }
        }
    }

    fn read_session(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    fn write_session(&self, active_user: Option<String>, phase: EnginePhase) {
        let mut session = self.session.write().unwrap_or_else(|p| p.into_inner());
        session.active_user = active_user;
        session.phase = phase;
    }
}

/// Collects collaborators and opens a [`SyncEngine`].
pub struct SyncEngineBuilder<M: Mutation> {
    config: StrideConfig,
    applier: Option<Arc<dyn RemoteApplier<M>>>,
    remote: Option<Arc<dyn RemoteSource>>,
    local: Option<Arc<dyn LocalTableStore>>,
    clock: Arc<dyn Clock>,
    in_memory: bool,
}

impl<M: Mutation> SyncEngineBuilder<M> {
    pub fn new(config: StrideConfig) -> Self {
        Self {
            config,
            applier: None,
            remote: None,
            local: None,
            clock: Arc::new(SystemClock),
            in_memory: false,
        }
    }

    pub fn applier(mut self, applier: Arc<dyn RemoteApplier<M>>) -> Self {
        self.applier = Some(applier);
        self
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Reconcile into a business-owned store instead of the built-in row table.
    pub fn local_store(mut self, local: Arc<dyn LocalTableStore>) -> Self {
        self.local = Some(local);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Keep everything in an in-memory database (tests).
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Open storage, recover interrupted entries, and start the dispatcher.
    /// Must be called inside a tokio runtime.
    pub fn open(self) -> StrideResult<SyncEngine<M>> {
        self.config.validate()?;
        let applier = self.applier.ok_or_else(|| missing("applier"))?;
        let remote = self.remote.ok_or_else(|| missing("remote"))?;

        let store = Arc::new(if self.in_memory {
            StorageEngine::open_in_memory()?
        } else {
            StorageEngine::open(&self.config.storage)?
        });
        store.recover(self.clock.now())?;

        let local = self
            .local
            .unwrap_or_else(|| Arc::clone(&store) as Arc<dyn LocalTableStore>);

        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            applier,
            Arc::clone(&self.clock),
            self.config.dispatch.clone(),
            self.config.breaker.clone(),
        )?;
        let (handle, task) = dispatcher.spawn();

        Ok(SyncEngine {
            queue: MutationQueue::new(
                Arc::clone(&store),
                Arc::clone(&self.clock),
                self.config.queue.max_retries,
            ),
            gate: QueueGate::new(Arc::clone(&store)),
            reconciler: ReconciliationService::new(
                local,
                remote,
                Arc::clone(&self.clock),
                self.config.reconcile.clone(),
            ),
            dispatcher: handle,
            task: Mutex::new(Some(task)),
            session: RwLock::new(Session {
                active_user: None,
                phase: EnginePhase::Dispatching,
            }),
            login_lock: tokio::sync::Mutex::new(()),
            store,
            clock: self.clock,
            config: self.config,
        })
    }
}

fn missing(field: &str) -> StrideError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: "required collaborator not provided".to_string(),
    }
    .into()
}
