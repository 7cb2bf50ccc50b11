use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::state::{clock::ClockStatus, player::FieldStatus};

/// Rules a game was created with.
#[serde_as]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameRulesEntity {
    /// Exact number of starters required at kickoff.
    pub starters_required: usize,
    /// Regulation length of one period.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub period_length: Duration,
    /// Number of regulation periods.
    pub periods_per_game: u32,
}

/// Game header persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name (usually the fixture, e.g. "U12 vs Riverside").
    pub name: String,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time any part of the game changed.
    pub updated_at: SystemTime,
    pub rules: GameRulesEntity,
    /// Whether the first period has started.
    pub lineup_committed: bool,
    /// Number of applied commands.
    pub version: u64,
}

/// Subset of [`GameEntity`] used to list games.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameListItemEntity {
    pub id: Uuid,
    pub name: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    pub lineup_committed: bool,
}

impl From<GameEntity> for GameListItemEntity {
    fn from(entity: GameEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            lineup_committed: entity.lineup_committed,
        }
    }
}

/// Shot, goal and assist counters of a player.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerStatsEntity {
    pub shots: u32,
    pub goals: u32,
    pub assists: u32,
}

/// Per-game player record.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Roster identifier of the player.
    pub player_id: Uuid,
    pub jersey_number: u8,
    pub full_name: String,
    pub status: FieldStatus,
    /// Start of the running stint, set only while on the field.
    pub field_entry: Option<SystemTime>,
    /// Time committed by completed stints.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub accumulated_on_field: Duration,
    #[serde(default)]
    pub stats: PlayerStatsEntity,
}

/// Clock state of a game.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameClockEntity {
    pub status: ClockStatus,
    pub period_number: u32,
    /// Start of the current run, set only while running.
    pub period_start: Option<SystemTime>,
    /// Time folded in by earlier runs of the period.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub accumulated: Duration,
    /// Instant of the last pause or period end.
    pub stopped_at: Option<SystemTime>,
}

/// Substitution waiting for confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingSubstitutionEntity {
    pub sub_id: Uuid,
    pub out_player_id: Uuid,
    pub in_player_id: Uuid,
    pub created_at: SystemTime,
}

/// Every record of one game, written to storage as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveGameRecord {
    pub game: GameEntity,
    pub players: Vec<PlayerEntity>,
    pub clock: GameClockEntity,
    pub substitutions: Vec<PendingSubstitutionEntity>,
}
