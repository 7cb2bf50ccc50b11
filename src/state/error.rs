use thiserror::Error;
use uuid::Uuid;

use crate::state::{clock::ClockStatus, lineup::LineupIssue, player::FieldStatus};

/// Command that was rejected by the clock or by a player's field-state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Start (or restart) the clock for the given period.
    StartPeriod(u32),
    /// Pause the running clock.
    Pause,
    /// Resume a paused clock.
    Resume,
    /// Close the current period.
    EndPeriod,
    /// Add or remove a player from the starting lineup.
    ToggleStarter,
    /// Designate or clear the starting goalkeeper.
    ToggleGoalkeeper,
    /// Add or remove a player from the bench selection.
    ToggleBench,
    /// Flip a player between available and unavailable/injured.
    TogglePlayerStatus,
    /// Add a roster player to the game.
    AddPlayer,
    /// Remove a roster player from the game.
    RemovePlayer,
    /// Record or undo a shot, goal or assist.
    RecordStat,
}

/// Entity whose state rejected a [`Trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionSource {
    /// The game clock, in the given status.
    Clock(ClockStatus),
    /// A player, in the given field status.
    Player {
        /// Identifier of the player.
        player_id: Uuid,
        /// Status held when the trigger was received.
        status: FieldStatus,
    },
    /// The game as a whole (e.g. lineup already committed).
    Game,
}

/// Error returned when a trigger cannot be applied from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {trigger:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// State the engine was in when the trigger was received.
    pub from: TransitionSource,
    /// Trigger that cannot be applied from this state.
    pub trigger: Trigger,
}

/// Record that a lookup could not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// Unknown player identifier.
    Player(Uuid),
    /// Unknown pending substitution identifier.
    Substitution(Uuid),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Player(id) => write!(f, "player `{id}`"),
            Missing::Substitution(id) => write!(f, "substitution `{id}`"),
        }
    }
}

/// Failures surfaced by the game clock and substitution engine.
///
/// Every variant is a logic error: retrying the same command against the same
/// state yields the same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The clock or a player was asked to move to a disallowed state.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// A substitution referenced a player that is not eligible for its side.
    #[error("player `{player_id}` is not eligible for this substitution while {status:?}")]
    InvalidPlayerState {
        /// Offending player.
        player_id: Uuid,
        /// Status held by the player.
        status: FieldStatus,
    },
    /// The player already takes part in a pending substitution.
    #[error("player `{player_id}` already has a pending substitution")]
    AlreadyPending {
        /// Player referenced by the existing substitution.
        player_id: Uuid,
    },
    /// Unknown player or substitution.
    #[error("{0} not found")]
    NotFound(Missing),
    /// Lineup does not allow the period to start.
    #[error("incomplete lineup: {0}")]
    IncompleteLineup(LineupIssue),
    /// A roster entry clashes with a player already registered for the game.
    #[error("duplicate roster entry: {0}")]
    DuplicatePlayer(String),
}
