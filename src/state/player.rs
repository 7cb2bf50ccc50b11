use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, PlayerStatsEntity},
    state::error::{EngineError, InvalidTransition, TransitionSource, Trigger},
};

/// Where a player stands within a single game.
///
/// `Available` through `Bench` are pre-kickoff selections; `OnField` through
/// `SubbingOutGk` only exist once the lineup has been committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Available,
    Starter,
    Goalkeeper,
    Bench,
    OnField,
    OnFieldGk,
    OnBench,
    SubbingIn,
    SubbingInGk,
    SubbingOut,
    SubbingOutGk,
    Unavailable,
    Injured,
}

impl FieldStatus {
    /// Playing right now, with a running stint.
    pub fn is_on_field(self) -> bool {
        matches!(self, FieldStatus::OnField | FieldStatus::OnFieldGk)
    }

    /// Selected for the starting lineup (goalkeeper included).
    pub fn is_starter(self) -> bool {
        matches!(self, FieldStatus::Starter | FieldStatus::Goalkeeper)
    }

    /// Referenced by a pending substitution.
    pub fn is_subbing(self) -> bool {
        matches!(
            self,
            FieldStatus::SubbingIn
                | FieldStatus::SubbingInGk
                | FieldStatus::SubbingOut
                | FieldStatus::SubbingOutGk
        )
    }

    /// Physically on the pitch, including a player waiting to be replaced.
    pub fn occupies_field(self) -> bool {
        matches!(
            self,
            FieldStatus::OnField
                | FieldStatus::OnFieldGk
                | FieldStatus::SubbingOut
                | FieldStatus::SubbingOutGk
        )
    }

    /// Sitting on the bench during play, including a player about to come on.
    pub fn occupies_bench(self) -> bool {
        matches!(
            self,
            FieldStatus::OnBench | FieldStatus::SubbingIn | FieldStatus::SubbingInGk
        )
    }

    /// Carries the goalkeeper role in any phase of the game.
    pub fn holds_goalkeeper(self) -> bool {
        matches!(
            self,
            FieldStatus::Goalkeeper
                | FieldStatus::OnFieldGk
                | FieldStatus::SubbingInGk
                | FieldStatus::SubbingOutGk
        )
    }

    fn is_out_of_play(self) -> bool {
        matches!(self, FieldStatus::Unavailable | FieldStatus::Injured)
    }
}

/// Reason a player cannot be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Unavailability {
    Unavailable,
    Injured,
}

impl From<Unavailability> for FieldStatus {
    fn from(value: Unavailability) -> Self {
        match value {
            Unavailability::Unavailable => FieldStatus::Unavailable,
            Unavailability::Injured => FieldStatus::Injured,
        }
    }
}

/// Counter tracked per player alongside field time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Shot,
    Goal,
    Assist,
}

/// Per-game shot/goal/assist counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerStats {
    pub shots: u32,
    pub goals: u32,
    pub assists: u32,
}

impl PlayerStats {
    fn counter_mut(&mut self, kind: StatKind) -> &mut u32 {
        match kind {
            StatKind::Shot => &mut self.shots,
            StatKind::Goal => &mut self.goals,
            StatKind::Assist => &mut self.assists,
        }
    }

    pub fn record(&mut self, kind: StatKind) {
        *self.counter_mut(kind) += 1;
    }

    /// Remove one occurrence; saturates at zero.
    pub fn undo(&mut self, kind: StatKind) {
        let counter = self.counter_mut(kind);
        *counter = counter.saturating_sub(1);
    }
}

/// Per-game projection of a roster player.
///
/// Invariant: `field_entry` is set exactly when the status is
/// [`FieldStatus::OnField`] or [`FieldStatus::OnFieldGk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamePlayer {
    pub player_id: Uuid,
    pub jersey_number: u8,
    pub full_name: String,
    pub stats: PlayerStats,
    status: FieldStatus,
    field_entry: Option<SystemTime>,
    accumulated_on_field: Duration,
}

impl GamePlayer {
    /// Register a roster player for a game; starts out available with no field time.
    pub fn new(player_id: Uuid, jersey_number: u8, full_name: String) -> Self {
        Self {
            player_id,
            jersey_number,
            full_name,
            stats: PlayerStats::default(),
            status: FieldStatus::Available,
            field_entry: None,
            accumulated_on_field: Duration::ZERO,
        }
    }

    pub fn status(&self) -> FieldStatus {
        self.status
    }

    pub fn field_entry(&self) -> Option<SystemTime> {
        self.field_entry
    }

    /// Time committed by completed stints.
    pub fn accumulated_on_field(&self) -> Duration {
        self.accumulated_on_field
    }

    /// Length of the running stint measured at `at`; zero when off the field.
    pub fn current_stint(&self, at: SystemTime) -> Duration {
        self.field_entry
            .map(|entry| at.duration_since(entry).unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn total_on_field(&self, at: SystemTime) -> Duration {
        self.accumulated_on_field + self.current_stint(at)
    }

    // ---------------------------------------------------------------------
    // Pre-kickoff selection
    // ---------------------------------------------------------------------

    pub fn toggle_starter(&mut self) -> Result<(), EngineError> {
        self.status = match self.status {
            FieldStatus::Available => FieldStatus::Starter,
            FieldStatus::Starter | FieldStatus::Goalkeeper => FieldStatus::Available,
            _ => return Err(self.reject(Trigger::ToggleStarter)),
        };
        Ok(())
    }

    /// Flip the goalkeeper flag of a starter. Clearing other goalkeepers is
    /// the caller's job since it spans several players.
    pub fn toggle_goalkeeper(&mut self) -> Result<(), EngineError> {
        self.status = match self.status {
            FieldStatus::Starter => FieldStatus::Goalkeeper,
            FieldStatus::Goalkeeper => FieldStatus::Starter,
            _ => return Err(self.reject(Trigger::ToggleGoalkeeper)),
        };
        Ok(())
    }

    pub fn toggle_bench(&mut self) -> Result<(), EngineError> {
        self.status = match self.status {
            FieldStatus::Available => FieldStatus::Bench,
            FieldStatus::Bench => FieldStatus::Available,
            _ => return Err(self.reject(Trigger::ToggleBench)),
        };
        Ok(())
    }

    /// Mark the player as `reason`, or clear it when already marked so.
    ///
    /// Before kickoff a selected player loses their selection. Once the lineup
    /// is committed only bench players can be marked, and clearing the mark
    /// returns them to the bench.
    pub fn toggle_player_status(
        &mut self,
        reason: Unavailability,
        lineup_committed: bool,
    ) -> Result<(), EngineError> {
        let target = FieldStatus::from(reason);
        let restored = if lineup_committed {
            FieldStatus::OnBench
        } else {
            FieldStatus::Available
        };

        self.status = match self.status {
            current if current == target => restored,
            current if current.is_out_of_play() => target,
            FieldStatus::Available
            | FieldStatus::Starter
            | FieldStatus::Goalkeeper
            | FieldStatus::Bench
                if !lineup_committed =>
            {
                target
            }
            FieldStatus::OnBench if lineup_committed => target,
            _ => return Err(self.reject(Trigger::TogglePlayerStatus)),
        };
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Kickoff and live play; driven by the game and the substitution coordinator
    // ---------------------------------------------------------------------

    /// Move a selected player into the live game at kickoff.
    pub(crate) fn commit_lineup(&mut self, at: SystemTime) {
        match self.status {
            FieldStatus::Starter => self.enter_field(FieldStatus::OnField, at),
            FieldStatus::Goalkeeper => self.enter_field(FieldStatus::OnFieldGk, at),
            FieldStatus::Bench => self.status = FieldStatus::OnBench,
            _ => {}
        }
    }

    /// Carry a frozen stint over a clock stoppage lasting `stoppage`.
    pub(crate) fn skip_stoppage(&mut self, stoppage: Duration) {
        if let Some(entry) = self.field_entry.as_mut() {
            *entry += stoppage;
        }
    }

    pub(crate) fn begin_sub_out(&mut self, at: SystemTime) {
        let next = match self.status {
            FieldStatus::OnFieldGk => FieldStatus::SubbingOutGk,
            _ => FieldStatus::SubbingOut,
        };
        self.leave_field(next, at);
    }

    pub(crate) fn revert_sub_out(&mut self, at: SystemTime) {
        let next = match self.status {
            FieldStatus::SubbingOutGk => FieldStatus::OnFieldGk,
            _ => FieldStatus::OnField,
        };
        self.enter_field(next, at);
    }

    pub(crate) fn complete_sub_out(&mut self) {
        self.status = FieldStatus::OnBench;
    }

    pub(crate) fn begin_sub_in(&mut self, as_goalkeeper: bool) {
        self.status = if as_goalkeeper {
            FieldStatus::SubbingInGk
        } else {
            FieldStatus::SubbingIn
        };
    }

    pub(crate) fn revert_sub_in(&mut self) {
        self.status = FieldStatus::OnBench;
    }

    pub(crate) fn complete_sub_in(&mut self, at: SystemTime) {
        let next = match self.status {
            FieldStatus::SubbingInGk => FieldStatus::OnFieldGk,
            _ => FieldStatus::OnField,
        };
        self.enter_field(next, at);
    }

    pub(crate) fn record_stat(&mut self, kind: StatKind, undo: bool) {
        if undo {
            self.stats.undo(kind);
        } else {
            self.stats.record(kind);
        }
    }

    fn enter_field(&mut self, status: FieldStatus, at: SystemTime) {
        self.status = status;
        self.field_entry = Some(at);
    }

    fn leave_field(&mut self, status: FieldStatus, at: SystemTime) {
        if let Some(entry) = self.field_entry.take() {
            self.accumulated_on_field += at.duration_since(entry).unwrap_or_default();
        }
        self.status = status;
    }

    fn reject(&self, trigger: Trigger) -> EngineError {
        InvalidTransition {
            from: TransitionSource::Player {
                player_id: self.player_id,
                status: self.status,
            },
            trigger,
        }
        .into()
    }
}

impl From<PlayerEntity> for GamePlayer {
    fn from(value: PlayerEntity) -> Self {
        let field_entry = if value.status.is_on_field() {
            value.field_entry
        } else {
            None
        };
        Self {
            player_id: value.player_id,
            jersey_number: value.jersey_number,
            full_name: value.full_name,
            stats: PlayerStats {
                shots: value.stats.shots,
                goals: value.stats.goals,
                assists: value.stats.assists,
            },
            status: value.status,
            field_entry,
            accumulated_on_field: value.accumulated_on_field,
        }
    }
}

impl From<&GamePlayer> for PlayerEntity {
    fn from(value: &GamePlayer) -> Self {
        Self {
            player_id: value.player_id,
            jersey_number: value.jersey_number,
            full_name: value.full_name.clone(),
            status: value.status,
            field_entry: value.field_entry,
            accumulated_on_field: value.accumulated_on_field,
            stats: PlayerStatsEntity {
                shots: value.stats.shots,
                goals: value.stats.goals,
                assists: value.stats.assists,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    fn player() -> GamePlayer {
        GamePlayer::new(Uuid::new_v4(), 7, "Sam Rivera".into())
    }

    #[test]
    fn starter_and_goalkeeper_toggles_follow_table() {
        let mut p = player();
        p.toggle_starter().unwrap();
        assert_eq!(p.status(), FieldStatus::Starter);
        p.toggle_goalkeeper().unwrap();
        assert_eq!(p.status(), FieldStatus::Goalkeeper);
        p.toggle_starter().unwrap();
        assert_eq!(p.status(), FieldStatus::Available);
    }

    #[test]
    fn goalkeeper_requires_starter() {
        let mut p = player();
        let err = p.toggle_goalkeeper().unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition(InvalidTransition {
                trigger: Trigger::ToggleGoalkeeper,
                ..
            })
        ));
        p.toggle_bench().unwrap();
        assert!(p.toggle_goalkeeper().is_err());
    }

    #[test]
    fn bench_and_starter_are_exclusive() {
        let mut p = player();
        p.toggle_bench().unwrap();
        assert_eq!(p.status(), FieldStatus::Bench);
        assert!(p.toggle_starter().is_err());
        p.toggle_bench().unwrap();
        assert_eq!(p.status(), FieldStatus::Available);
    }

    #[test]
    fn marking_unavailable_drops_selection_and_toggles_back() {
        let mut p = player();
        p.toggle_starter().unwrap();
        p.toggle_player_status(Unavailability::Injured, false).unwrap();
        assert_eq!(p.status(), FieldStatus::Injured);
        p.toggle_player_status(Unavailability::Unavailable, false)
            .unwrap();
        assert_eq!(p.status(), FieldStatus::Unavailable);
        p.toggle_player_status(Unavailability::Unavailable, false)
            .unwrap();
        assert_eq!(p.status(), FieldStatus::Available);
    }

    #[test]
    fn live_status_toggle_only_touches_bench_players() {
        let mut p = player();
        p.toggle_bench().unwrap();
        p.commit_lineup(at(0));
        assert_eq!(p.status(), FieldStatus::OnBench);
        p.toggle_player_status(Unavailability::Injured, true).unwrap();
        assert_eq!(p.status(), FieldStatus::Injured);
        p.toggle_player_status(Unavailability::Injured, true).unwrap();
        assert_eq!(p.status(), FieldStatus::OnBench);

        let mut starter = player();
        starter.toggle_starter().unwrap();
        starter.commit_lineup(at(0));
        assert!(
            starter
                .toggle_player_status(Unavailability::Injured, true)
                .is_err()
        );
    }

    #[test]
    fn commit_lineup_stamps_field_entry() {
        let mut p = player();
        p.toggle_starter().unwrap();
        p.toggle_goalkeeper().unwrap();
        p.commit_lineup(at(5));
        assert_eq!(p.status(), FieldStatus::OnFieldGk);
        assert_eq!(p.field_entry(), Some(at(5)));
        assert_eq!(p.current_stint(at(65)), Duration::from_secs(60));
    }

    #[test]
    fn leaving_the_field_commits_the_stint() {
        let mut p = player();
        p.toggle_starter().unwrap();
        p.commit_lineup(at(0));
        p.begin_sub_out(at(300));
        assert_eq!(p.status(), FieldStatus::SubbingOut);
        assert_eq!(p.field_entry(), None);
        assert_eq!(p.accumulated_on_field(), Duration::from_secs(300));
        assert_eq!(p.total_on_field(at(999)), Duration::from_secs(300));
    }

    #[test]
    fn stoppage_shifts_running_stint() {
        let mut p = player();
        p.toggle_starter().unwrap();
        p.commit_lineup(at(0));
        p.skip_stoppage(Duration::from_secs(100));
        assert_eq!(p.field_entry(), Some(at(100)));
    }

    #[test]
    fn stats_never_drop_below_zero() {
        let mut p = player();
        p.record_stat(StatKind::Goal, false);
        p.record_stat(StatKind::Goal, true);
        p.record_stat(StatKind::Goal, true);
        p.record_stat(StatKind::Shot, false);
        assert_eq!(p.stats.goals, 0);
        assert_eq!(p.stats.shots, 1);
    }
}
