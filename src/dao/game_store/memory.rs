use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{
        GameClockEntity, GameEntity, GameListItemEntity, LiveGameRecord, PendingSubstitutionEntity,
        PlayerEntity,
    },
    storage::{StorageError, StorageResult},
};

#[derive(Debug, Error)]
#[error("in-memory store is offline")]
pub struct MemoryStoreOffline;

/// Everything stored for one game; one map entry so a game is written as a unit.
#[derive(Default)]
struct StoredGame {
    header: Option<GameEntity>,
    players: Vec<PlayerEntity>,
    clock: Option<GameClockEntity>,
    substitutions: Vec<PendingSubstitutionEntity>,
}

#[derive(Default)]
struct MemoryInner {
    games: DashMap<Uuid, StoredGame>,
    offline: AtomicBool,
}

/// Process-local [`GameStore`], used when no database is configured and in tests.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<MemoryInner>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StorageError::Unavailable`] (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                "memory store offline".into(),
                MemoryStoreOffline,
            ));
        }
        Ok(())
    }

    fn run<T, F>(&self, op: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&MemoryInner) -> T,
    {
        let result = self.check().map(|()| op(&self.inner));
        Box::pin(async move { result })
    }

    fn read<T, F>(&self, game_id: Uuid, op: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Default + Send + 'static,
        F: FnOnce(&StoredGame) -> T,
    {
        self.run(move |inner| {
            inner
                .games
                .get(&game_id)
                .map(|entry| op(entry.value()))
                .unwrap_or_default()
        })
    }

    fn write<F>(&self, game_id: Uuid, op: F) -> BoxFuture<'static, StorageResult<()>>
    where
        F: FnOnce(&mut StoredGame),
    {
        self.run(move |inner| op(inner.games.entry(game_id).or_default().value_mut()))
    }
}

impl GameStore for MemoryGameStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(game.id, move |stored| stored.header = Some(game))
    }

    fn save_live_game(&self, record: LiveGameRecord) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |inner| {
            inner.games.insert(
                record.game.id,
                StoredGame {
                    header: Some(record.game),
                    players: record.players,
                    clock: Some(record.clock),
                    substitutions: record.substitutions,
                },
            );
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        self.read(id, |stored| stored.header.clone())
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        self.run(|inner| {
            let mut games: Vec<GameListItemEntity> = inner
                .games
                .iter()
                .filter_map(|entry| entry.value().header.clone())
                .map(Into::into)
                .collect();
            games.sort_by_key(|game| game.created_at);
            games
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |inner| {
            inner
                .games
                .remove(&id)
                .is_some_and(|(_, stored)| stored.header.is_some())
        })
    }

    fn load_game_players(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        self.read(game_id, |stored| stored.players.clone())
    }

    fn save_game_players(
        &self,
        game_id: Uuid,
        players: Vec<PlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.write(game_id, move |stored| stored.players = players)
    }

    fn load_game_clock(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameClockEntity>>> {
        self.read(game_id, |stored| stored.clock.clone())
    }

    fn save_game_clock(
        &self,
        game_id: Uuid,
        clock: GameClockEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.write(game_id, move |stored| stored.clock = Some(clock))
    }

    fn load_substitutions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PendingSubstitutionEntity>>> {
        self.read(game_id, |stored| stored.substitutions.clone())
    }

    fn save_substitutions(
        &self,
        game_id: Uuid,
        substitutions: Vec<PendingSubstitutionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.write(game_id, move |stored| stored.substitutions = substitutions)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.run(|_| ())
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.run(|_| ())
    }
}
