use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save game `{id}`")]
    SaveGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load game `{id}`")]
    LoadGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete game `{id}`")]
    DeleteGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list games")]
    ListGames {
        #[source]
        source: MongoError,
    },
    #[error("failed to save players of game `{game_id}`")]
    SavePlayers {
        game_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load players of game `{game_id}`")]
    LoadPlayers {
        game_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save clock of game `{game_id}`")]
    SaveClock {
        game_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load clock of game `{game_id}`")]
    LoadClock {
        game_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save substitutions of game `{game_id}`")]
    SaveSubstitutions {
        game_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load substitutions of game `{game_id}`")]
    LoadSubstitutions {
        game_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save game `{game_id}` as a whole")]
    SaveLiveGame {
        game_id: Uuid,
        #[source]
        source: MongoError,
    },
}
