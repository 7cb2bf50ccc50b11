use std::fmt;

use crate::state::player::{FieldStatus, GamePlayer};

/// Default number of players a side fields at kickoff.
pub const DEFAULT_STARTERS_REQUIRED: usize = 11;

/// Lineup constraints applied before the first period can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineupRules {
    /// Exact number of starters (goalkeeper included) needed for kickoff.
    pub starters_required: usize,
}

impl Default for LineupRules {
    fn default() -> Self {
        Self {
            starters_required: DEFAULT_STARTERS_REQUIRED,
        }
    }
}

/// Reason a lineup cannot be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineupIssue {
    TooFewStarters { found: usize, required: usize },
    TooManyStarters { found: usize, allowed: usize },
    NoGoalkeeper,
    TooManyGoalkeepers { found: usize },
}

impl fmt::Display for LineupIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineupIssue::TooFewStarters { found, required } => {
                write!(f, "too few starters ({found} selected, {required} required)")
            }
            LineupIssue::TooManyStarters { found, allowed } => {
                write!(f, "too many starters ({found} selected, {allowed} allowed)")
            }
            LineupIssue::NoGoalkeeper => write!(f, "no goalkeeper designated among starters"),
            LineupIssue::TooManyGoalkeepers { found } => {
                write!(f, "{found} goalkeepers designated, expected exactly one")
            }
        }
    }
}

/// Selection counts gathered from a roster before kickoff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineupCounts {
    /// Starters, goalkeeper included.
    pub starters: usize,
    pub goalkeepers: usize,
    pub bench: usize,
}

impl LineupCounts {
    pub fn tally<'a>(players: impl IntoIterator<Item = &'a GamePlayer>) -> Self {
        players
            .into_iter()
            .fold(Self::default(), |mut counts, player| {
                match player.status() {
                    FieldStatus::Starter => counts.starters += 1,
                    FieldStatus::Goalkeeper => {
                        counts.starters += 1;
                        counts.goalkeepers += 1;
                    }
                    FieldStatus::Bench => counts.bench += 1,
                    _ => {}
                }
                counts
            })
    }
}

/// Check that the selected starters can take the field.
///
/// Reports the first problem found; the lineup is never truncated or padded.
pub fn validate_lineup<'a>(
    players: impl IntoIterator<Item = &'a GamePlayer>,
    rules: &LineupRules,
) -> Result<LineupCounts, LineupIssue> {
    let counts = LineupCounts::tally(players);
    let required = rules.starters_required;

    if counts.starters > required {
        return Err(LineupIssue::TooManyStarters {
            found: counts.starters,
            allowed: required,
        });
    }
    if counts.starters < required {
        return Err(LineupIssue::TooFewStarters {
            found: counts.starters,
            required,
        });
    }
    match counts.goalkeepers {
        0 => Err(LineupIssue::NoGoalkeeper),
        1 => Ok(counts),
        found => Err(LineupIssue::TooManyGoalkeepers { found }),
    }
}
