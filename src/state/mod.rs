pub mod binding_session;
pub mod keybinds;
pub mod settings;
mod sse;
pub mod status;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use serde::Serialize;
use tokio::sync::{Mutex, RwLock, watch};
use utoipa::ToSchema;

use crate::{
    config::AppConfig,
    dao::{document_store::DocumentStore, models::ScoreEntity},
    error::ServiceError,
    identity::{IdentityProvider, UserId},
    state::{
        binding_session::{Activity, BindingSession},
        keybinds::KeyBindingTable,
        settings::GameplaySettings,
        status::StatusMessage,
    },
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

const SSE_CAPACITY: usize = 32;

/// Progress of the startup pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// Sign-in, settings load or score load still running.
    Initializing,
    /// The startup pipeline ran to completion.
    Ready,
}

/// Mutable state of the player using this backend.
#[derive(Debug)]
pub struct PlayerSession {
    /// Signed-in user, if any.
    pub user: Option<UserId>,
    pub settings: GameplaySettings,
    pub bindings: KeyBindingTable,
    pub binding: BindingSession,
    /// Set when settings or bindings differ from the last stored document.
    pub unsaved_changes: bool,
    /// Bumped on every settings or bindings mutation.
    pub revision: u64,
    /// Set once the stored document of `user` has been applied or created.
    pub config_loaded: bool,
}

impl Default for PlayerSession {
    fn default() -> Self {
        Self {
            user: None,
            settings: GameplaySettings::default(),
            bindings: KeyBindingTable::default(),
            binding: BindingSession::new(),
            unsaved_changes: false,
            revision: 0,
            config_loaded: false,
        }
    }
}

impl PlayerSession {
    /// Record an in-memory change that has not been stored yet.
    pub fn mark_changed(&mut self) {
        self.revision += 1;
        self.unsaved_changes = true;
    }

    /// Record that the state as of `revision` has been stored.
    pub fn mark_saved(&mut self, revision: u64) {
        if self.revision == revision {
            self.unsaved_changes = false;
        }
    }
}

/// Central application state holding the player session and collaborator handles.
pub struct AppState {
    config: AppConfig,
    identity: Arc<dyn IdentityProvider>,
    document_store: RwLock<Option<Arc<dyn DocumentStore>>>,
    degraded: watch::Sender<bool>,
    session: Mutex<PlayerSession>,
    busy: AtomicBool,
    readiness: watch::Sender<Readiness>,
    high_scores: RwLock<Vec<ScoreEntity>>,
    last_status: RwLock<Option<StatusMessage>>,
    sse: SseHub,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a document store is installed.
    pub fn new(config: AppConfig, identity: Arc<dyn IdentityProvider>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let (readiness_tx, _rx) = watch::channel(Readiness::Initializing);
        Arc::new(Self {
            config,
            identity,
            document_store: RwLock::new(None),
            degraded: degraded_tx,
            session: Mutex::new(PlayerSession::default()),
            busy: AtomicBool::new(false),
            readiness: readiness_tx,
            high_scores: RwLock::new(Vec::new()),
            last_status: RwLock::new(None),
            sse: SseHub::new(SSE_CAPACITY),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    /// Obtain a handle to the current document store, if one is installed.
    pub async fn document_store(&self) -> Option<Arc<dyn DocumentStore>> {
        let guard = self.document_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current document store, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_document_store(&self) -> Result<Arc<dyn DocumentStore>, ServiceError> {
        self.document_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new document store implementation and leave degraded mode.
    pub async fn install_document_store(&self, store: Arc<dyn DocumentStore>) {
        {
            let mut guard = self.document_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current document store and enter degraded mode.
    pub async fn clear_document_store(&self) {
        {
            let mut guard = self.document_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// The player session; hold the lock only for in-memory work.
    pub fn session(&self) -> &Mutex<PlayerSession> {
        &self.session
    }

    /// Mark a load or save as in flight until the returned guard drops.
    pub fn try_begin_busy(&self) -> Result<BusyGuard<'_>, ServiceError> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| BusyGuard { flag: &self.busy })
            .map_err(|_| ServiceError::Busy)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Busy flag in the shape the binding session expects.
    pub fn activity(&self) -> Activity {
        if self.is_busy() {
            Activity::Busy
        } else {
            Activity::Ready
        }
    }

    pub fn readiness(&self) -> Readiness {
        *self.readiness.borrow()
    }

    /// Subscribe to startup pipeline progress.
    pub fn readiness_watcher(&self) -> watch::Receiver<Readiness> {
        self.readiness.subscribe()
    }

    pub fn set_readiness(&self, value: Readiness) {
        self.readiness.send_replace(value);
    }

    /// Last loaded leaderboard.
    pub fn high_scores(&self) -> &RwLock<Vec<ScoreEntity>> {
        &self.high_scores
    }

    pub async fn last_status(&self) -> Option<StatusMessage> {
        self.last_status.read().await.clone()
    }

    pub async fn set_last_status(&self, status: StatusMessage) {
        *self.last_status.write().await = Some(status);
    }

    /// Broadcast hub used for the status SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }
}

/// Clears the busy flag on drop, whatever path the operation left through.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
