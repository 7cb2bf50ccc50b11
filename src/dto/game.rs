use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::GameListItemEntity,
    dto::{
        format_system_time,
        validation::{validate_full_name, validate_jersey_number},
    },
    state::{
        clock::{ClockStatus, format_clock},
        lineup::{LineupCounts, LineupIssue},
        live_game::{GameRules, LiveGame},
        player::{FieldStatus, GamePlayer},
        substitution::PendingSubstitution,
    },
};

/// Payload used to create a game together with its roster.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    #[validate(nested)]
    pub players: Vec<RosterPlayerInput>,
    /// Overrides the configured number of starters (e.g. 7 for small-sided games).
    #[validate(range(min = 1, max = 11))]
    pub starters_required: Option<usize>,
    #[validate(range(min = 60, max = 7200))]
    pub period_length_seconds: Option<u64>,
    #[validate(range(min = 1, max = 8))]
    pub periods_per_game: Option<u32>,
}

/// Roster player registered for a game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RosterPlayerInput {
    /// Roster identifier; generated when omitted.
    #[serde(default)]
    pub player_id: Option<Uuid>,
    pub jersey_number: u8,
    pub full_name: String,
}

impl Validate for RosterPlayerInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_jersey_number(self.jersey_number) {
            errors.add("jersey_number", e);
        }
        if let Err(e) = validate_full_name(&self.full_name) {
            errors.add("full_name", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<RosterPlayerInput> for GamePlayer {
    fn from(value: RosterPlayerInput) -> Self {
        GamePlayer::new(
            value.player_id.unwrap_or_else(Uuid::new_v4),
            value.jersey_number,
            value.full_name.trim().to_owned(),
        )
    }
}

/// Entry of the game list.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    /// Whether the game has kicked off.
    pub lineup_committed: bool,
}

impl From<GameListItemEntity> for GameSummary {
    fn from(value: GameListItemEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
            lineup_committed: value.lineup_committed,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RulesView {
    pub starters_required: usize,
    pub period_length_seconds: u64,
    pub periods_per_game: u32,
}

impl From<&GameRules> for RulesView {
    fn from(value: &GameRules) -> Self {
        Self {
            starters_required: value.lineup.starters_required,
            period_length_seconds: value.period_length.as_secs(),
            periods_per_game: value.periods_per_game,
        }
    }
}

/// Clock read model as shown on the touchline.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClockView {
    pub status: ClockStatus,
    pub period_number: u32,
    pub elapsed_seconds: u64,
    /// `MM:SS`, minutes not capped.
    pub formatted_elapsed_time: String,
    pub remaining_seconds: u64,
    pub is_overtime: bool,
}

impl From<(&LiveGame, SystemTime)> for ClockView {
    fn from((game, now): (&LiveGame, SystemTime)) -> Self {
        Self {
            status: game.clock().status(),
            period_number: game.clock().period_number(),
            elapsed_seconds: game.elapsed(now).as_secs(),
            formatted_elapsed_time: game.formatted_elapsed_time(now),
            remaining_seconds: game.remaining(now).as_secs(),
            is_overtime: game.is_overtime(now),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerView {
    pub player_id: Uuid,
    pub jersey_number: u8,
    pub full_name: String,
    pub status: FieldStatus,
    /// Completed stints plus the running one.
    pub on_field_seconds: u64,
    pub formatted_on_field_time: String,
    pub current_stint_seconds: u64,
    pub shots: u32,
    pub goals: u32,
    pub assists: u32,
}

impl From<(&LiveGame, &GamePlayer, SystemTime)> for PlayerView {
    fn from((game, player, now): (&LiveGame, &GamePlayer, SystemTime)) -> Self {
        let on_field = game.time_on_field(player, now);
        Self {
            player_id: player.player_id,
            jersey_number: player.jersey_number,
            full_name: player.full_name.clone(),
            status: player.status(),
            on_field_seconds: on_field.as_secs(),
            formatted_on_field_time: format_clock(on_field),
            current_stint_seconds: game.current_stint(player, now).as_secs(),
            shots: player.stats.shots,
            goals: player.stats.goals,
            assists: player.stats.assists,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubstitutionView {
    pub sub_id: Uuid,
    pub out_player_id: Uuid,
    pub in_player_id: Uuid,
    pub created_at: String,
}

impl From<&PendingSubstitution> for SubstitutionView {
    fn from(value: &PendingSubstitution) -> Self {
        Self {
            sub_id: value.sub_id,
            out_player_id: value.out_player_id,
            in_player_id: value.in_player_id,
            created_at: format_system_time(value.created_at),
        }
    }
}

/// Full game read model.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameView {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    /// Bumped on every applied command.
    pub version: u64,
    pub rules: RulesView,
    pub lineup_committed: bool,
    pub clock: ClockView,
    /// Every player in roster order.
    pub players: Vec<PlayerView>,
    /// Players on the pitch, including those waiting to come off.
    pub on_field: Vec<PlayerView>,
    /// Bench during play, including players waiting to come on.
    pub bench: Vec<PlayerView>,
    pub pending_substitutions: Vec<SubstitutionView>,
}

impl From<(&LiveGame, SystemTime)> for GameView {
    fn from((game, now): (&LiveGame, SystemTime)) -> Self {
        let view = |player: &GamePlayer| PlayerView::from((game, player, now));
        Self {
            id: game.id,
            name: game.name.clone(),
            created_at: format_system_time(game.created_at),
            updated_at: format_system_time(game.updated_at),
            version: game.version(),
            rules: game.rules().into(),
            lineup_committed: game.lineup_committed(),
            clock: (game, now).into(),
            players: game.players().map(view).collect(),
            on_field: game.on_field_players().map(view).collect(),
            bench: game.bench_players().map(view).collect(),
            pending_substitutions: game.pending_substitutions().map(Into::into).collect(),
        }
    }
}

/// Result of checking the selected lineup against the game rules.
#[derive(Debug, Serialize, ToSchema)]
pub struct LineupReport {
    pub valid: bool,
    pub starters: usize,
    pub goalkeepers: usize,
    pub bench: usize,
    pub starters_required: usize,
    /// Why kickoff would be refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

impl From<(&LiveGame, Result<LineupCounts, LineupIssue>)> for LineupReport {
    fn from((game, result): (&LiveGame, Result<LineupCounts, LineupIssue>)) -> Self {
        let counts = LineupCounts::tally(game.players());
        Self {
            valid: result.is_ok(),
            starters: counts.starters,
            goalkeepers: counts.goalkeepers,
            bench: counts.bench,
            starters_required: game.rules().lineup.starters_required,
            issue: result.err().map(|issue| issue.to_string()),
        }
    }
}
