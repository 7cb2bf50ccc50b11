pub mod clock;
pub mod error;
pub mod lineup;
pub mod live_game;
pub mod player;
pub mod substitution;

use std::{future::Future, sync::Arc, time::Duration, time::SystemTime};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{config::AppConfig, dao::game_store::GameStore, error::ServiceError};

use self::{error::EngineError, live_game::LiveGame};

pub type SharedState = Arc<AppState>;
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of "now" for every command and read model.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock.
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Hand-driven clock for tests.
#[cfg(test)]
pub struct ManualTimeSource(std::sync::Mutex<SystemTime>);

#[cfg(test)]
impl ManualTimeSource {
    pub fn new(start: SystemTime) -> Arc<Self> {
        Arc::new(Self(std::sync::Mutex::new(start)))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

#[cfg(test)]
impl TimeSource for ManualTimeSource {
    fn now(&self) -> SystemTime {
        *self.0.lock().unwrap()
    }
}

/// Owner of one live game: a writer gate plus the last published snapshot.
///
/// Commands run against a staged copy, which is only published once it has
/// been persisted. Readers never take the gate.
pub struct LiveGameHandle {
    /// Serialises commands; holds `true` once the game has been deleted.
    gate: Mutex<bool>,
    snapshot: watch::Sender<Arc<LiveGame>>,
}

impl LiveGameHandle {
    pub fn new(game: LiveGame) -> Self {
        let (snapshot, _rx) = watch::channel(Arc::new(game));
        Self {
            gate: Mutex::new(false),
            snapshot,
        }
    }

    /// Latest published state of the game.
    pub fn snapshot(&self) -> Arc<LiveGame> {
        self.snapshot.borrow().clone()
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Arc<LiveGame>> {
        self.snapshot.subscribe()
    }

    /// Run `command` on a staged copy, persist it with `persist`, then publish.
    ///
    /// "Now" is read once the gate is held, so commands on one game observe
    /// non-decreasing instants. An engine error, a persistence error or a
    /// timeout discards the staged copy and leaves the published snapshot
    /// untouched.
    pub async fn run_command<C, T, P, Fut>(
        &self,
        time: &dyn TimeSource,
        limit: Option<Duration>,
        command: C,
        persist: P,
    ) -> Result<(T, Arc<LiveGame>), ServiceError>
    where
        C: FnOnce(&mut LiveGame, SystemTime) -> Result<T, EngineError>,
        P: FnOnce(Arc<LiveGame>) -> Fut,
        Fut: Future<Output = Result<(), ServiceError>>,
    {
        let gate = self.gate.lock().await;
        if *gate {
            return Err(self.deleted_error());
        }
        let now = time.now();
        let mut staged = (**self.snapshot.borrow()).clone();
        let value = command(&mut staged, now)?;
        staged.mark_updated(now);
        let staged = Arc::new(staged);

        let work_future = persist(staged.clone());
        let outcome = if let Some(limit) = limit {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(game_id = %staged.id, "persisting game timed out; command discarded");
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(()) => {
                self.snapshot.send_replace(staged.clone());
                drop(gate);
                Ok((value, staged))
            }
            Err(err) => {
                warn!(game_id = %staged.id, error = %err, "persisting game failed; command discarded");
                drop(gate);
                Err(err)
            }
        }
    }

    /// Run `remove` under the gate and, once it succeeds, refuse every later
    /// command. Commands already waiting on the gate fail with not found.
    pub async fn retire<F, Fut, T>(&self, remove: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut gate = self.gate.lock().await;
        if *gate {
            return Err(self.deleted_error());
        }
        let value = remove().await?;
        *gate = true;
        Ok(value)
    }

    fn deleted_error(&self) -> ServiceError {
        ServiceError::NotFound(format!("game `{}` not found", self.snapshot.borrow().id))
    }
}

/// Central application state: storage handle, live games and configuration.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    live_games: DashMap<Uuid, Arc<LiveGameHandle>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    time: Arc<dyn TimeSource>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(config: AppConfig, time: Arc<dyn TimeSource>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            game_store: RwLock::new(None),
            live_games: DashMap::new(),
            degraded: degraded_tx,
            config,
            time,
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn now(&self) -> SystemTime {
        self.time.now()
    }

    pub fn time_source(&self) -> &dyn TimeSource {
        self.time.as_ref()
    }

    pub fn transition_timeout(&self) -> Option<Duration> {
        self.transition_timeout
    }

    /// Registry of games loaded in memory, keyed by game id.
    pub fn live_games(&self) -> &DashMap<Uuid, Arc<LiveGameHandle>> {
        &self.live_games
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current game store, or [`ServiceError::Degraded`] when none is usable.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        if self.is_degraded().await {
            return Err(ServiceError::Degraded);
        }
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}
