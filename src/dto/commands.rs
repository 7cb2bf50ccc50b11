use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::game::SubstitutionView,
    state::{
        live_game::SubstitutionToggle,
        player::{StatKind, Unavailability},
    },
};

/// Period to kick off; period 1 commits the lineup.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartPeriodRequest {
    #[validate(range(min = 1))]
    pub period: u32,
}

/// Mark (or clear) a player as unavailable or injured.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlayerStatusRequest {
    pub reason: Unavailability,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProposeSubstitutionRequest {
    pub out_player_id: Uuid,
    pub in_player_id: Uuid,
}

/// "Sub" button pressed on a player.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubToggleRequest {
    /// Player to pair with when no substitution is pending for the target.
    #[serde(default)]
    pub partner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubToggleAction {
    Proposed,
    Cancelled,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubToggleResponse {
    pub action: SubToggleAction,
    pub substitution: SubstitutionView,
}

impl From<SubstitutionToggle> for SubToggleResponse {
    fn from(value: SubstitutionToggle) -> Self {
        match value {
            SubstitutionToggle::Proposed(sub) => Self {
                action: SubToggleAction::Proposed,
                substitution: (&sub).into(),
            },
            SubstitutionToggle::Cancelled(sub) => Self {
                action: SubToggleAction::Cancelled,
                substitution: (&sub).into(),
            },
        }
    }
}

/// Record (or take back) a shot, goal or assist.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatRequest {
    pub kind: StatKind,
    #[serde(default)]
    pub undo: bool,
}
