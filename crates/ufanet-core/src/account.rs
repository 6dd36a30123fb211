// ── Account abstraction ──
//
// Full lifecycle management for one Ufanet account: a single shared
// session client, the doorphone snapshot, the periodic refresh task,
// and entity registration through the host's sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ufanet_api::{Doorphone, DoorphoneId, SessionClient};

use crate::config::AccountConfig;
use crate::doorphone::{DoorphoneController, unique_id_for};
use crate::entity::{EntitySink, LockEntity, OpenOutcome};
use crate::error::CoreError;
use crate::store::{DoorphoneStore, SnapshotDiff};

// ── ConnectionState ──────────────────────────────────────────────

/// Account state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Account ──────────────────────────────────────────────────────

/// One configured Ufanet account.
///
/// Cheaply cloneable via `Arc<AccountInner>`. Owns the only
/// [`SessionClient`] for the account; every [`DoorphoneController`] it
/// hands out shares that client, and therefore one portal session.
#[derive(Clone)]
pub struct Account {
    inner: Arc<AccountInner>,
}

struct AccountInner {
    config: AccountConfig,
    client: Arc<SessionClient>,
    store: Arc<DoorphoneStore>,
    connection_state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    /// Child token for the current setup, cancelled on unload,
    /// replaced on the next setup.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    /// Set from the start of `setup` until `unload`.
    active: AtomicBool,
    /// Registration callback installed by `setup`.
    sink: Mutex<Option<Arc<dyn EntitySink>>>,
}

impl Account {
    /// Create an account from configuration. Does NOT touch the network --
    /// call [`setup()`](Self::setup) to authenticate and start refreshing.
    pub fn new(config: AccountConfig) -> Result<Self, CoreError> {
        let client = SessionClient::new(
            config.base_url.clone(),
            config.credentials(),
            &config.transport(),
        )?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Create an account around an existing session client.
    pub fn with_client(config: AccountConfig, client: Arc<SessionClient>) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(AccountInner {
                config,
                client,
                store: Arc::new(DoorphoneStore::new()),
                connection_state,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
                active: AtomicBool::new(false),
                sink: Mutex::new(None),
            }),
        }
    }

    /// Check credentials with a single login on a throw-away client.
    ///
    /// Meant for credential-entry forms: nothing is retained, so a
    /// failure leaves no half-configured account behind.
    pub async fn validate(config: &AccountConfig) -> Result<(), CoreError> {
        let client = SessionClient::new(
            config.base_url.clone(),
            config.credentials(),
            &config.transport(),
        )?;
        client.authenticate().await?;
        debug!(contract = %config.contract, "credentials validated");
        Ok(())
    }

    /// Access the account configuration.
    pub fn config(&self) -> &AccountConfig {
        &self.inner.config
    }

    /// The shared session client.
    pub fn client(&self) -> &Arc<SessionClient> {
        &self.inner.client
    }

    /// Access the underlying DoorphoneStore.
    pub fn store(&self) -> &Arc<DoorphoneStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Bring the account up.
    ///
    /// Authenticates, performs the first refresh, registers one
    /// controller per doorphone with `sink`, then spawns the periodic
    /// refresh task (unless the interval is zero). Failure of the login
    /// or the first refresh fails the whole setup. A second setup
    /// without an [`unload`](Self::unload) in between fails with
    /// [`CoreError::AlreadySetUp`].
    pub async fn setup(&self, sink: Arc<dyn EntitySink>) -> Result<(), CoreError> {
        if self.inner.active.swap(true, Ordering::SeqCst) {
            return Err(CoreError::AlreadySetUp);
        }
        let _ = self.inner.connection_state.send(ConnectionState::Connecting);

        if let Err(e) = self.inner.client.authenticate().await {
            self.inner.active.store(false, Ordering::SeqCst);
            let _ = self.inner.connection_state.send(ConnectionState::Failed);
            return Err(e.into());
        }

        *self.inner.sink.lock().await = Some(sink);

        match self.refresh().await {
            Ok(diff) => {
                if self.inner.store.is_empty() {
                    warn!("no doorphones found for this account");
                }
                debug!(added = diff.added.len(), "initial doorphone list applied");
            }
            Err(e) => {
                *self.inner.sink.lock().await = None;
                self.inner.active.store(false, Ordering::SeqCst);
                let _ = self.inner.connection_state.send(ConnectionState::Failed);
                return Err(e);
            }
        }

        let period = self.inner.config.refresh_interval;
        if period > Duration::ZERO {
            let cancel = self.inner.cancel_child.lock().await.clone();
            let handle = tokio::spawn(refresh_task(self.clone(), period, cancel));
            self.inner.task_handles.lock().await.push(handle);
        }

        let _ = self.inner.connection_state.send(ConnectionState::Connected);
        info!(doorphones = self.inner.store.len(), "account set up");
        Ok(())
    }

    /// Tear the account down.
    ///
    /// Cancels background tasks, deregisters every entity from the sink,
    /// drops the snapshot and the session, and resets the state to
    /// [`Disconnected`](ConnectionState::Disconnected). The account can
    /// be set up again afterwards.
    pub async fn unload(&self) {
        // Cancel the child token (not the parent, so setup can run again).
        {
            let mut child = self.inner.cancel_child.lock().await;
            child.cancel();
            *child = self.inner.cancel.child_token();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        let removed = self.inner.store.clear();
        if let Some(sink) = self.inner.sink.lock().await.take() {
            let ids: Vec<String> = removed.iter().map(|d| unique_id_for(&d.id)).collect();
            if !ids.is_empty() {
                sink.remove_entities(&ids);
            }
        }

        self.inner.client.invalidate_session();
        self.inner.active.store(false, Ordering::SeqCst);

        let _ = self.inner.connection_state.send(ConnectionState::Disconnected);
        debug!("account unloaded");
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Fetch the doorphone list once and apply it.
    ///
    /// On failure the store keeps the previous list and nothing is
    /// reported to the sink.
    pub async fn refresh(&self) -> Result<SnapshotDiff, CoreError> {
        let doorphones = self.inner.client.list_doorphones().await?;
        let diff = self.inner.store.apply_snapshot(doorphones);

        if !diff.is_empty() {
            self.publish(&diff).await;
        }
        Ok(diff)
    }

    async fn publish(&self, diff: &SnapshotDiff) {
        let guard = self.inner.sink.lock().await;
        let Some(sink) = guard.as_ref() else {
            return;
        };

        let changed: Vec<DoorphoneController> = diff
            .added
            .iter()
            .chain(&diff.updated)
            .map(|d| self.controller_for(Arc::clone(d)))
            .collect();
        if !changed.is_empty() {
            debug!(count = changed.len(), "registering doorphone entities");
            sink.add_entities(changed);
        }

        if !diff.removed.is_empty() {
            let ids: Vec<String> = diff.removed.iter().map(|d| unique_id_for(&d.id)).collect();
            debug!(count = ids.len(), "removing doorphone entities");
            sink.remove_entities(&ids);
        }
    }

    // ── Controllers ──────────────────────────────────────────────

    fn controller_for(&self, doorphone: Arc<Doorphone>) -> DoorphoneController {
        DoorphoneController::new(Arc::clone(&self.inner.client), doorphone)
    }

    /// One controller per doorphone in the current snapshot.
    pub fn controllers(&self) -> Vec<DoorphoneController> {
        self.inner
            .store
            .snapshot()
            .iter()
            .map(|d| self.controller_for(Arc::clone(d)))
            .collect()
    }

    /// Controller for a known doorphone.
    pub fn controller(&self, id: &DoorphoneId) -> Option<DoorphoneController> {
        self.inner.store.get(id).map(|d| self.controller_for(d))
    }

    /// Open a doorphone from the current snapshot.
    ///
    /// Unknown ids fail with [`CoreError::DoorphoneNotFound`]; portal
    /// failures are reported through the returned [`OpenOutcome`].
    pub async fn open(&self, id: &DoorphoneId) -> Result<OpenOutcome, CoreError> {
        let controller = self
            .controller(id)
            .ok_or_else(|| CoreError::DoorphoneNotFound { id: id.to_string() })?;
        Ok(controller.open().await)
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Current doorphone snapshot.
    pub fn doorphones(&self) -> Arc<Vec<Arc<Doorphone>>> {
        self.inner.store.snapshot()
    }

    /// Subscribe to doorphone snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Doorphone>>>> {
        self.inner.store.subscribe()
    }

    pub fn last_refresh(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.inner.store.last_refresh()
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodic doorphone list refresh.
///
/// Failures are logged and skipped: the previous list stays in place
/// until a later tick succeeds.
async fn refresh_task(account: Account, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                debug!("refresh_task tick");
                match account.refresh().await {
                    Ok(diff) if !diff.is_empty() => {
                        info!(
                            added = diff.added.len(),
                            updated = diff.updated.len(),
                            removed = diff.removed.len(),
                            "doorphone list changed"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "refresh failed, keeping previous doorphone list");
                    }
                }
            }
        }
    }
    debug!("refresh_task stopped");
}
