use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, ClientSession, Collection, Database, IndexModel, bson::doc, options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoClockDocument, MongoGameDocument, MongoPlayerDocument, MongoSubstitutionsDocument,
        doc_id, uuid_as_binary,
    },
};
use crate::dao::{
    game_store::GameStore,
    models::{
        GameClockEntity, GameEntity, GameListItemEntity, LiveGameRecord, PendingSubstitutionEntity,
        PlayerEntity,
    },
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const PLAYER_COLLECTION_NAME: &str = "game_players";
const CLOCK_COLLECTION_NAME: &str = "game_clocks";
const SUBSTITUTION_COLLECTION_NAME: &str = "pending_substitutions";

#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let index = IndexModel::builder()
            .keys(doc! {"created_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_created_idx".to_owned()))
                    .build(),
            )
            .build();
        self.games()
            .await
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "created_at",
                source,
            })?;

        let player_index = IndexModel::builder()
            .keys(doc! {"game_id": 1, "player_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("player_game_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        self.players()
            .await
            .create_index(player_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PLAYER_COLLECTION_NAME,
                index: "game_id,player_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn client(&self) -> Client {
        let guard = self.inner.state.read().await;
        guard.client.clone()
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.database().await.collection(GAME_COLLECTION_NAME)
    }

    async fn players(&self) -> Collection<MongoPlayerDocument> {
        self.database().await.collection(PLAYER_COLLECTION_NAME)
    }

    async fn clocks(&self) -> Collection<MongoClockDocument> {
        self.database().await.collection(CLOCK_COLLECTION_NAME)
    }

    async fn substitutions(&self) -> Collection<MongoSubstitutionsDocument> {
        self.database().await.collection(SUBSTITUTION_COLLECTION_NAME)
    }

    async fn save_game(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id;
        let document: MongoGameDocument = game.into();
        self.games()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveGame { id, source })?;
        Ok(())
    }

    /// Write every collection of one game inside a single transaction.
    ///
    /// Dropping the session before the commit aborts the transaction, so a
    /// failure or a cancelled call leaves the previous state untouched.
    async fn save_live_game(&self, record: LiveGameRecord) -> MongoResult<()> {
        let game_id = record.game.id;
        let fail = move |source| MongoDaoError::SaveLiveGame { game_id, source };

        let mut session = self.client().await.start_session().await.map_err(fail)?;
        session.start_transaction().await.map_err(fail)?;

        let document: MongoGameDocument = record.game.into();
        self.games()
            .await
            .replace_one(doc_id(game_id), &document)
            .upsert(true)
            .session(&mut session)
            .await
            .map_err(fail)?;

        self.replace_players(game_id, record.players, &mut session)
            .await
            .map_err(fail)?;

        let clock = MongoClockDocument::from((game_id, record.clock));
        self.clocks()
            .await
            .replace_one(doc_id(game_id), &clock)
            .upsert(true)
            .session(&mut session)
            .await
            .map_err(fail)?;

        let substitutions = MongoSubstitutionsDocument::from((game_id, record.substitutions));
        self.substitutions()
            .await
            .replace_one(doc_id(game_id), &substitutions)
            .upsert(true)
            .session(&mut session)
            .await
            .map_err(fail)?;

        session.commit_transaction().await.map_err(fail)?;
        Ok(())
    }

    async fn replace_players(
        &self,
        game_id: Uuid,
        players: Vec<PlayerEntity>,
        session: &mut ClientSession,
    ) -> Result<(), mongodb::error::Error> {
        let collection = self.players().await;
        let kept: Vec<_> = players
            .iter()
            .map(|player| uuid_as_binary(player.player_id))
            .collect();

        for (position, player) in (0u32..).zip(players) {
            let document = MongoPlayerDocument::from((game_id, position, player));
            collection
                .replace_one(player_filter(&document), &document)
                .upsert(true)
                .session(&mut *session)
                .await?;
        }

        collection
            .delete_many(doc! {
                "game_id": uuid_as_binary(game_id),
                "player_id": { "$nin": kept },
            })
            .session(&mut *session)
            .await?;
        Ok(())
    }

    async fn find_game(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadGame { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_games(&self) -> MongoResult<Vec<GameListItemEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(doc! {})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_game(&self, id: Uuid) -> MongoResult<bool> {
        let by_game = doc! {"game_id": uuid_as_binary(id)};
        self.players()
            .await
            .delete_many(by_game)
            .await
            .map_err(|source| MongoDaoError::DeleteGame { id, source })?;
        self.clocks()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteGame { id, source })?;
        self.substitutions()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteGame { id, source })?;

        let result = self
            .games()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteGame { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn load_game_players(&self, game_id: Uuid) -> MongoResult<Vec<PlayerEntity>> {
        let documents: Vec<MongoPlayerDocument> = self
            .players()
            .await
            .find(doc! {"game_id": uuid_as_binary(game_id)})
            .sort(doc! {"position": 1})
            .await
            .map_err(|source| MongoDaoError::LoadPlayers { game_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadPlayers { game_id, source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    /// Upsert every player, then drop the ones no longer part of the game.
    async fn save_game_players(&self, game_id: Uuid, players: Vec<PlayerEntity>) -> MongoResult<()> {
        let collection = self.players().await;
        let kept: Vec<_> = players
            .iter()
            .map(|player| uuid_as_binary(player.player_id))
            .collect();

        for (position, player) in (0u32..).zip(players) {
            let document = MongoPlayerDocument::from((game_id, position, player));
            collection
                .replace_one(player_filter(&document), &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::SavePlayers { game_id, source })?;
        }

        collection
            .delete_many(doc! {
                "game_id": uuid_as_binary(game_id),
                "player_id": { "$nin": kept },
            })
            .await
            .map_err(|source| MongoDaoError::SavePlayers { game_id, source })?;
        Ok(())
    }

    async fn load_game_clock(&self, game_id: Uuid) -> MongoResult<Option<GameClockEntity>> {
        let document = self
            .clocks()
            .await
            .find_one(doc_id(game_id))
            .await
            .map_err(|source| MongoDaoError::LoadClock { game_id, source })?;
        Ok(document.map(Into::into))
    }

    async fn save_game_clock(&self, game_id: Uuid, clock: GameClockEntity) -> MongoResult<()> {
        let document = MongoClockDocument::from((game_id, clock));
        self.clocks()
            .await
            .replace_one(doc_id(game_id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveClock { game_id, source })?;
        Ok(())
    }

    async fn load_substitutions(
        &self,
        game_id: Uuid,
    ) -> MongoResult<Vec<PendingSubstitutionEntity>> {
        let document = self
            .substitutions()
            .await
            .find_one(doc_id(game_id))
            .await
            .map_err(|source| MongoDaoError::LoadSubstitutions { game_id, source })?;
        Ok(document.map(Into::into).unwrap_or_default())
    }

    async fn save_substitutions(
        &self,
        game_id: Uuid,
        substitutions: Vec<PendingSubstitutionEntity>,
    ) -> MongoResult<()> {
        let document = MongoSubstitutionsDocument::from((game_id, substitutions));
        self.substitutions()
            .await
            .replace_one(doc_id(game_id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveSubstitutions { game_id, source })?;
        Ok(())
    }
}

fn player_filter(document: &MongoPlayerDocument) -> mongodb::bson::Document {
    doc! {
        "game_id": uuid_as_binary(document.game_id),
        "player_id": uuid_as_binary(document.player_id),
    }
}

impl GameStore for MongoGameStore {
    fn save_live_game(&self, record: LiveGameRecord) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_live_game(record).await.map_err(Into::into) })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games().await.map_err(Into::into) })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(id).await.map_err(Into::into) })
    }

    fn load_game_players(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load_game_players(game_id).await.map_err(Into::into) })
    }

    fn save_game_players(
        &self,
        game_id: Uuid,
        players: Vec<PlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save_game_players(game_id, players)
                .await
                .map_err(Into::into)
        })
    }

    fn load_game_clock(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameClockEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load_game_clock(game_id).await.map_err(Into::into) })
    }

    fn save_game_clock(
        &self,
        game_id: Uuid,
        clock: GameClockEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save_game_clock(game_id, clock)
                .await
                .map_err(Into::into)
        })
    }

    fn load_substitutions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PendingSubstitutionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load_substitutions(game_id).await.map_err(Into::into) })
    }

    fn save_substitutions(
        &self,
        game_id: Uuid,
        substitutions: Vec<PendingSubstitutionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save_substitutions(game_id, substitutions)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
