use std::time::Duration;

use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dao::models::{
        GameClockEntity, GameEntity, GameListItemEntity, GameRulesEntity,
        PendingSubstitutionEntity, PlayerEntity, PlayerStatsEntity,
    },
    state::{clock::ClockStatus, player::FieldStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    created_at: DateTime,
    updated_at: DateTime,
    starters_required: i64,
    period_length_ms: i64,
    periods_per_game: u32,
    #[serde(default)]
    lineup_committed: bool,
    #[serde(default)]
    version: i64,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            starters_required: i64::try_from(value.rules.starters_required).unwrap_or(i64::MAX),
            period_length_ms: millis(value.rules.period_length),
            periods_per_game: value.rules.periods_per_game,
            lineup_committed: value.lineup_committed,
            version: i64::try_from(value.version).unwrap_or(i64::MAX),
        }
    }
}

impl From<MongoGameDocument> for GameEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            rules: GameRulesEntity {
                starters_required: usize::try_from(value.starters_required).unwrap_or_default(),
                period_length: duration(value.period_length_ms),
                periods_per_game: value.periods_per_game,
            },
            lineup_committed: value.lineup_committed,
            version: u64::try_from(value.version).unwrap_or_default(),
        }
    }
}

impl From<MongoGameDocument> for GameListItemEntity {
    fn from(value: MongoGameDocument) -> Self {
        GameEntity::from(value).into()
    }
}

/// One player of one game; `position` keeps roster order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    pub game_id: Uuid,
    pub player_id: Uuid,
    position: u32,
    jersey_number: u8,
    full_name: String,
    status: FieldStatus,
    field_entry: Option<DateTime>,
    accumulated_on_field_ms: i64,
    #[serde(default)]
    stats: PlayerStatsEntity,
}

impl From<(Uuid, u32, PlayerEntity)> for MongoPlayerDocument {
    fn from((game_id, position, value): (Uuid, u32, PlayerEntity)) -> Self {
        Self {
            game_id,
            player_id: value.player_id,
            position,
            jersey_number: value.jersey_number,
            full_name: value.full_name,
            status: value.status,
            field_entry: value.field_entry.map(DateTime::from_system_time),
            accumulated_on_field_ms: millis(value.accumulated_on_field),
            stats: value.stats,
        }
    }
}

impl From<MongoPlayerDocument> for PlayerEntity {
    fn from(value: MongoPlayerDocument) -> Self {
        Self {
            player_id: value.player_id,
            jersey_number: value.jersey_number,
            full_name: value.full_name,
            status: value.status,
            field_entry: value.field_entry.map(DateTime::to_system_time),
            accumulated_on_field: duration(value.accumulated_on_field_ms),
            stats: value.stats,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoClockDocument {
    #[serde(rename = "_id")]
    game_id: Uuid,
    status: ClockStatus,
    period_number: u32,
    period_start: Option<DateTime>,
    accumulated_ms: i64,
    stopped_at: Option<DateTime>,
}

impl From<(Uuid, GameClockEntity)> for MongoClockDocument {
    fn from((game_id, value): (Uuid, GameClockEntity)) -> Self {
        Self {
            game_id,
            status: value.status,
            period_number: value.period_number,
            period_start: value.period_start.map(DateTime::from_system_time),
            accumulated_ms: millis(value.accumulated),
            stopped_at: value.stopped_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoClockDocument> for GameClockEntity {
    fn from(value: MongoClockDocument) -> Self {
        Self {
            status: value.status,
            period_number: value.period_number,
            period_start: value.period_start.map(DateTime::to_system_time),
            accumulated: duration(value.accumulated_ms),
            stopped_at: value.stopped_at.map(DateTime::to_system_time),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSubstitutionsDocument {
    #[serde(rename = "_id")]
    game_id: Uuid,
    pending: Vec<MongoPendingSubstitution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoPendingSubstitution {
    sub_id: Uuid,
    out_player_id: Uuid,
    in_player_id: Uuid,
    created_at: DateTime,
}

impl From<(Uuid, Vec<PendingSubstitutionEntity>)> for MongoSubstitutionsDocument {
    fn from((game_id, pending): (Uuid, Vec<PendingSubstitutionEntity>)) -> Self {
        Self {
            game_id,
            pending: pending
                .into_iter()
                .map(|sub| MongoPendingSubstitution {
                    sub_id: sub.sub_id,
                    out_player_id: sub.out_player_id,
                    in_player_id: sub.in_player_id,
                    created_at: DateTime::from_system_time(sub.created_at),
                })
                .collect(),
        }
    }
}

impl From<MongoSubstitutionsDocument> for Vec<PendingSubstitutionEntity> {
    fn from(value: MongoSubstitutionsDocument) -> Self {
        value
            .pending
            .into_iter()
            .map(|sub| PendingSubstitutionEntity {
                sub_id: sub.sub_id,
                out_player_id: sub.out_player_id,
                in_player_id: sub.in_player_id,
                created_at: sub.created_at.to_system_time(),
            })
            .collect()
    }
}

/// BSON form of a [`Uuid`] as written by its serde implementation.
pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Generic,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}

fn millis(value: Duration) -> i64 {
    i64::try_from(value.as_millis()).unwrap_or(i64::MAX)
}

fn duration(ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or_default())
}
