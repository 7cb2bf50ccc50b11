pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    GameClockEntity, GameEntity, GameListItemEntity, LiveGameRecord, PendingSubstitutionEntity,
    PlayerEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for games, their players, clock and
/// pending substitutions.
///
/// `save_*` calls replace the stored value wholesale.
pub trait GameStore: Send + Sync {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace the header, players, clock and pending substitutions of a game
    /// together: either every part is written or none is.
    fn save_live_game(&self, record: LiveGameRecord) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>>;
    /// Delete a game and everything attached to it; `false` when it did not exist.
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn load_game_players(&self, game_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    fn save_game_players(
        &self,
        game_id: Uuid,
        players: Vec<PlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn load_game_clock(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameClockEntity>>>;
    fn save_game_clock(
        &self,
        game_id: Uuid,
        clock: GameClockEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn load_substitutions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PendingSubstitutionEntity>>>;
    fn save_substitutions(
        &self,
        game_id: Uuid,
        substitutions: Vec<PendingSubstitutionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
