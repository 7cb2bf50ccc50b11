use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::{
        GameClockEntity, GameEntity, GameRulesEntity, LiveGameRecord, PendingSubstitutionEntity,
        PlayerEntity,
    },
    state::{
        clock::{GameClock, format_clock},
        error::{EngineError, InvalidTransition, Missing, TransitionSource, Trigger},
        lineup::{LineupCounts, LineupIssue, LineupRules, validate_lineup},
        player::{GamePlayer, StatKind, Unavailability},
        substitution::{PendingSubstitution, SubId, SubstitutionCoordinator},
    },
};

/// Default regulation length of one period (40 minutes).
pub const DEFAULT_PERIOD_LENGTH: Duration = Duration::from_secs(40 * 60);
/// Default number of regulation periods.
pub const DEFAULT_PERIODS_PER_GAME: u32 = 2;

/// Rules fixed when the game is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    pub lineup: LineupRules,
    pub period_length: Duration,
    pub periods_per_game: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            lineup: LineupRules::default(),
            period_length: DEFAULT_PERIOD_LENGTH,
            periods_per_game: DEFAULT_PERIODS_PER_GAME,
        }
    }
}

/// Outcome of the single-click substitution toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionToggle {
    /// A new substitution was paired up.
    Proposed(PendingSubstitution),
    /// The player was already mid-substitution; that substitution was dropped.
    Cancelled(PendingSubstitution),
}

/// Clock, players and pending substitutions of one live game.
///
/// Every command validates before it mutates, so an `Err` leaves the game
/// untouched. On-field time only accrues while the clock runs: a stoppage
/// freezes every running stint at the stop instant and the restart carries it
/// forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveGame {
    pub id: Uuid,
    pub name: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    rules: GameRules,
    clock: GameClock,
    players: IndexMap<Uuid, GamePlayer>,
    substitutions: SubstitutionCoordinator,
    lineup_committed: bool,
    version: u64,
}

impl LiveGame {
    pub fn new(name: String, rules: GameRules, now: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: now,
            updated_at: now,
            rules,
            clock: GameClock::new(),
            players: IndexMap::new(),
            substitutions: SubstitutionCoordinator::new(),
            lineup_committed: false,
            version: 0,
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Monotonic counter bumped on every applied command.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the first period has started and the lineup is in play.
    pub fn lineup_committed(&self) -> bool {
        self.lineup_committed
    }

    pub fn players(&self) -> impl Iterator<Item = &GamePlayer> {
        self.players.values()
    }

    pub fn player(&self, player_id: Uuid) -> Result<&GamePlayer, EngineError> {
        self.players
            .get(&player_id)
            .ok_or(EngineError::NotFound(Missing::Player(player_id)))
    }

    pub(crate) fn mark_updated(&mut self, now: SystemTime) {
        self.version += 1;
        self.updated_at = now;
    }

    // ---------------------------------------------------------------------
    // Roster
    // ---------------------------------------------------------------------

    pub fn add_player(&mut self, player: GamePlayer) -> Result<(), EngineError> {
        self.ensure_pre_kickoff(Trigger::AddPlayer)?;
        if self.players.contains_key(&player.player_id) {
            return Err(EngineError::DuplicatePlayer(format!(
                "player `{}` is already registered",
                player.player_id
            )));
        }
        if self
            .players
            .values()
            .any(|existing| existing.jersey_number == player.jersey_number)
        {
            return Err(EngineError::DuplicatePlayer(format!(
                "jersey number {} is already taken",
                player.jersey_number
            )));
        }
        self.players.insert(player.player_id, player);
        Ok(())
    }

    pub fn remove_player(&mut self, player_id: Uuid) -> Result<GamePlayer, EngineError> {
        self.ensure_pre_kickoff(Trigger::RemovePlayer)?;
        self.players
            .shift_remove(&player_id)
            .ok_or(EngineError::NotFound(Missing::Player(player_id)))
    }

    // ---------------------------------------------------------------------
    // Lineup selection
    // ---------------------------------------------------------------------

    pub fn toggle_starter(&mut self, player_id: Uuid) -> Result<(), EngineError> {
        self.selectable_player_mut(player_id, Trigger::ToggleStarter)?
            .toggle_starter()
    }

    /// Flip the goalkeeper flag; designating a new goalkeeper demotes the
    /// previous one back to a plain starter.
    pub fn toggle_goalkeeper(&mut self, player_id: Uuid) -> Result<(), EngineError> {
        let player = self.selectable_player_mut(player_id, Trigger::ToggleGoalkeeper)?;
        player.toggle_goalkeeper()?;
        if player.status().holds_goalkeeper() {
            for other in self.players.values_mut() {
                if other.player_id != player_id && other.status().holds_goalkeeper() {
                    other.toggle_goalkeeper()?;
                }
            }
        }
        Ok(())
    }

    pub fn toggle_bench(&mut self, player_id: Uuid) -> Result<(), EngineError> {
        self.selectable_player_mut(player_id, Trigger::ToggleBench)?
            .toggle_bench()
    }

    pub fn toggle_player_status(
        &mut self,
        player_id: Uuid,
        reason: Unavailability,
    ) -> Result<(), EngineError> {
        let lineup_committed = self.lineup_committed;
        self.player_mut(player_id)?
            .toggle_player_status(reason, lineup_committed)
    }

    pub fn validate_lineup(&self) -> Result<LineupCounts, LineupIssue> {
        validate_lineup(self.players.values(), &self.rules.lineup)
    }

    // ---------------------------------------------------------------------
    // Clock
    // ---------------------------------------------------------------------

    /// Start `period_number`. The first period commits the lineup and fails
    /// with [`EngineError::IncompleteLineup`] when it is not valid; later
    /// periods resume the stints frozen when the previous period ended.
    pub fn start_period(&mut self, period_number: u32, now: SystemTime) -> Result<(), EngineError> {
        self.clock.check_start(period_number)?;
        if period_number > self.rules.periods_per_game {
            return Err(InvalidTransition {
                from: TransitionSource::Clock(self.clock.status()),
                trigger: Trigger::StartPeriod(period_number),
            }
            .into());
        }
        if !self.lineup_committed {
            self.validate_lineup()
                .map_err(EngineError::IncompleteLineup)?;
        }

        let stoppage = self.stoppage_until(now);
        self.clock.start(period_number, now)?;

        if self.lineup_committed {
            self.skip_stoppage(stoppage);
        } else {
            for player in self.players.values_mut() {
                player.commit_lineup(now);
            }
            self.lineup_committed = true;
        }
        Ok(())
    }

    pub fn pause(&mut self, now: SystemTime) -> Result<(), EngineError> {
        self.clock.pause(now)
    }

    pub fn resume(&mut self, now: SystemTime) -> Result<(), EngineError> {
        let stoppage = self.stoppage_until(now);
        self.clock.resume(now)?;
        self.skip_stoppage(stoppage);
        Ok(())
    }

    pub fn end_period(&mut self, now: SystemTime) -> Result<(), EngineError> {
        self.clock.end_period(now)
    }

    // ---------------------------------------------------------------------
    // Substitutions
    // ---------------------------------------------------------------------

    pub fn propose_substitution(
        &mut self,
        out_player_id: Uuid,
        in_player_id: Uuid,
        now: SystemTime,
    ) -> Result<PendingSubstitution, EngineError> {
        let at = self.clock.accounting_instant(now);
        self.substitutions
            .propose(&mut self.players, out_player_id, in_player_id, at, now)
    }

    pub fn cancel_substitution(
        &mut self,
        sub_id: SubId,
        now: SystemTime,
    ) -> Result<PendingSubstitution, EngineError> {
        let at = self.clock.accounting_instant(now);
        self.substitutions.cancel(&mut self.players, sub_id, at)
    }

    pub fn confirm_substitution(
        &mut self,
        sub_id: SubId,
        now: SystemTime,
    ) -> Result<PendingSubstitution, EngineError> {
        let at = self.clock.accounting_instant(now);
        self.substitutions.confirm(&mut self.players, sub_id, at)
    }

    /// "Sub" button semantics: a player already mid-substitution has it
    /// cancelled; otherwise a new substitution is paired with `partner_id`,
    /// the on-field player of the two going out.
    pub fn toggle_substitution(
        &mut self,
        player_id: Uuid,
        partner_id: Option<Uuid>,
        now: SystemTime,
    ) -> Result<SubstitutionToggle, EngineError> {
        if let Some(sub_id) = self
            .substitutions
            .pending_for(player_id)
            .map(|sub| sub.sub_id)
        {
            return self
                .cancel_substitution(sub_id, now)
                .map(SubstitutionToggle::Cancelled);
        }

        let player = self.player(player_id)?;
        let Some(partner_id) = partner_id else {
            return Err(EngineError::InvalidPlayerState {
                player_id,
                status: player.status(),
            });
        };
        let (out_id, in_id) = if player.status().is_on_field() {
            (player_id, partner_id)
        } else {
            (partner_id, player_id)
        };
        self.propose_substitution(out_id, in_id, now)
            .map(SubstitutionToggle::Proposed)
    }

    // ---------------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------------

    pub fn record_stat(
        &mut self,
        player_id: Uuid,
        kind: StatKind,
        undo: bool,
    ) -> Result<(), EngineError> {
        if !self.lineup_committed {
            return Err(InvalidTransition {
                from: TransitionSource::Game,
                trigger: Trigger::RecordStat,
            }
            .into());
        }
        self.player_mut(player_id)?.record_stat(kind, undo);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Read models
    // ---------------------------------------------------------------------

    /// Players on the pitch, including those waiting to be replaced.
    pub fn on_field_players(&self) -> impl Iterator<Item = &GamePlayer> {
        self.players
            .values()
            .filter(|player| player.status().occupies_field())
    }

    /// Players on the bench, including those about to come on.
    pub fn bench_players(&self) -> impl Iterator<Item = &GamePlayer> {
        self.players
            .values()
            .filter(|player| player.status().occupies_bench())
    }

    pub fn pending_substitutions(&self) -> impl Iterator<Item = &PendingSubstitution> {
        self.substitutions.pending()
    }

    pub fn elapsed(&self, now: SystemTime) -> Duration {
        self.clock.elapsed(now)
    }

    pub fn formatted_elapsed_time(&self, now: SystemTime) -> String {
        format_clock(self.clock.elapsed(now))
    }

    /// Regulation time left in the current period; zero once in overtime.
    pub fn remaining(&self, now: SystemTime) -> Duration {
        self.rules.period_length.saturating_sub(self.clock.elapsed(now))
    }

    pub fn is_overtime(&self, now: SystemTime) -> bool {
        self.clock.elapsed(now) > self.rules.period_length
    }

    /// Total on-field time of `player` as seen at `now`.
    pub fn time_on_field(&self, player: &GamePlayer, now: SystemTime) -> Duration {
        player.total_on_field(self.clock.accounting_instant(now))
    }

    /// Running stint of `player` as seen at `now`.
    pub fn current_stint(&self, player: &GamePlayer, now: SystemTime) -> Duration {
        player.current_stint(self.clock.accounting_instant(now))
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn ensure_pre_kickoff(&self, trigger: Trigger) -> Result<(), EngineError> {
        if self.lineup_committed {
            return Err(InvalidTransition {
                from: TransitionSource::Game,
                trigger,
            }
            .into());
        }
        Ok(())
    }

    fn player_mut(&mut self, player_id: Uuid) -> Result<&mut GamePlayer, EngineError> {
        self.players
            .get_mut(&player_id)
            .ok_or(EngineError::NotFound(Missing::Player(player_id)))
    }

    /// Player whose lineup selection may still change.
    fn selectable_player_mut(
        &mut self,
        player_id: Uuid,
        trigger: Trigger,
    ) -> Result<&mut GamePlayer, EngineError> {
        let lineup_committed = self.lineup_committed;
        let player = self.player_mut(player_id)?;
        if lineup_committed {
            return Err(InvalidTransition {
                from: TransitionSource::Player {
                    player_id,
                    status: player.status(),
                },
                trigger,
            }
            .into());
        }
        Ok(player)
    }

    fn stoppage_until(&self, now: SystemTime) -> Duration {
        self.clock
            .stopped_at()
            .map(|stopped| now.duration_since(stopped).unwrap_or_default())
            .unwrap_or_default()
    }

    fn skip_stoppage(&mut self, stoppage: Duration) {
        for player in self.players.values_mut() {
            player.skip_stoppage(stoppage);
        }
    }
}

impl
    From<(
        GameEntity,
        Vec<PlayerEntity>,
        Option<GameClockEntity>,
        Vec<PendingSubstitutionEntity>,
    )> for LiveGame
{
    fn from(
        (game, players, clock, substitutions): (
            GameEntity,
            Vec<PlayerEntity>,
            Option<GameClockEntity>,
            Vec<PendingSubstitutionEntity>,
        ),
    ) -> Self {
        Self {
            id: game.id,
            name: game.name,
            created_at: game.created_at,
            updated_at: game.updated_at,
            rules: game.rules.into(),
            clock: clock.map(Into::into).unwrap_or_default(),
            players: players
                .into_iter()
                .map(|entity| {
                    let player = GamePlayer::from(entity);
                    (player.player_id, player)
                })
                .collect(),
            substitutions: substitutions
                .into_iter()
                .map(PendingSubstitution::from)
                .collect(),
            lineup_committed: game.lineup_committed,
            version: game.version,
        }
    }
}

impl LiveGame {
    /// Split the game into the records persisted by the storage layer.
    pub fn to_record(&self) -> LiveGameRecord {
        let game = GameEntity {
            id: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            rules: self.rules.into(),
            lineup_committed: self.lineup_committed,
            version: self.version,
        };
        LiveGameRecord {
            game,
            players: self.players.values().map(PlayerEntity::from).collect(),
            clock: GameClockEntity::from(&self.clock),
            substitutions: self
                .substitutions
                .pending()
                .map(PendingSubstitutionEntity::from)
                .collect(),
        }
    }
}

impl From<GameRulesEntity> for GameRules {
    fn from(value: GameRulesEntity) -> Self {
        Self {
            lineup: LineupRules {
                starters_required: value.starters_required,
            },
            period_length: value.period_length,
            periods_per_game: value.periods_per_game,
        }
    }
}

impl From<GameRules> for GameRulesEntity {
    fn from(value: GameRules) -> Self {
        Self {
            starters_required: value.lineup.starters_required,
            period_length: value.period_length,
            periods_per_game: value.periods_per_game,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;
    use crate::state::{clock::ClockStatus, player::FieldStatus};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    struct Squad {
        game: LiveGame,
        keeper: Uuid,
        starters: Vec<Uuid>,
        bench: Vec<Uuid>,
    }

    /// Eleven starters (first one in goal) and three bench players, not yet kicked off.
    fn squad() -> Squad {
        let mut game = LiveGame::new("U12 vs Riverside".into(), GameRules::default(), at(0));
        let mut starters = Vec::new();
        let mut bench = Vec::new();
        for number in 1..=14u8 {
            let player = GamePlayer::new(Uuid::new_v4(), number, format!("Player {number}"));
            let id = player.player_id;
            game.add_player(player).unwrap();
            if number <= 11 {
                game.toggle_starter(id).unwrap();
                starters.push(id);
            } else {
                game.toggle_bench(id).unwrap();
                bench.push(id);
            }
        }
        let keeper = starters[0];
        game.toggle_goalkeeper(keeper).unwrap();
        Squad {
            game,
            keeper,
            starters,
            bench,
        }
    }

    #[test]
    fn designating_goalkeeper_demotes_previous_one() {
        let mut s = squad();
        let new_keeper = s.starters[1];
        s.game.toggle_goalkeeper(new_keeper).unwrap();
        assert_eq!(
            s.game.player(new_keeper).unwrap().status(),
            FieldStatus::Goalkeeper
        );
        assert_eq!(
            s.game.player(s.keeper).unwrap().status(),
            FieldStatus::Starter
        );
    }

    #[test]
    fn first_period_commits_lineup() {
        let mut s = squad();
        s.game.start_period(1, at(0)).unwrap();
        assert!(s.game.lineup_committed());
        assert_eq!(s.game.on_field_players().count(), 11);
        assert_eq!(s.game.bench_players().count(), 3);
        assert_eq!(
            s.game.player(s.keeper).unwrap().status(),
            FieldStatus::OnFieldGk
        );
        assert_eq!(s.game.player(s.keeper).unwrap().field_entry(), Some(at(0)));
    }

    #[test]
    fn incomplete_lineup_blocks_kickoff_without_side_effects() {
        let mut s = squad();
        s.game.toggle_goalkeeper(s.keeper).unwrap();
        let err = s.game.start_period(1, at(0)).unwrap_err();
        assert_eq!(err, EngineError::IncompleteLineup(LineupIssue::NoGoalkeeper));
        assert_eq!(s.game.clock().status(), ClockStatus::NotStarted);
        assert!(!s.game.lineup_committed());

        s.game.toggle_goalkeeper(s.keeper).unwrap();
        s.game.toggle_bench(s.bench[0]).unwrap();
        s.game.toggle_starter(s.bench[0]).unwrap();
        assert_eq!(
            s.game.start_period(1, at(0)).unwrap_err(),
            EngineError::IncompleteLineup(LineupIssue::TooManyStarters {
                found: 12,
                allowed: 11
            })
        );
    }

    #[test]
    fn selection_is_locked_after_kickoff() {
        let mut s = squad();
        s.game.start_period(1, at(0)).unwrap();
        assert!(s.game.toggle_starter(s.bench[0]).is_err());
        assert!(s.game.toggle_goalkeeper(s.starters[3]).is_err());
        assert!(
            s.game
                .add_player(GamePlayer::new(Uuid::new_v4(), 40, "Late".into()))
                .is_err()
        );
    }

    #[test]
    fn duplicate_jersey_is_rejected() {
        let mut s = squad();
        let err = s
            .game
            .add_player(GamePlayer::new(Uuid::new_v4(), 7, "Twin".into()))
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicatePlayer(_)));
    }

    #[test]
    fn pause_freezes_field_time_and_clock() {
        let mut s = squad();
        let player = s.starters[4];
        s.game.start_period(1, at(0)).unwrap();
        s.game.pause(at(600)).unwrap();

        let p = s.game.player(player).unwrap().clone();
        assert_eq!(s.game.time_on_field(&p, at(690)), Duration::from_secs(600));

        s.game.resume(at(700)).unwrap();
        assert_eq!(s.game.elapsed(at(760)).as_secs(), 660);
        let p = s.game.player(player).unwrap().clone();
        assert_eq!(s.game.time_on_field(&p, at(760)), Duration::from_secs(660));
        assert_eq!(s.game.formatted_elapsed_time(at(760)), "11:00");
    }

    #[test]
    fn substitution_during_stoppage_counts_up_to_the_stop() {
        let mut s = squad();
        let out = s.starters[5];
        s.game.start_period(1, at(0)).unwrap();
        s.game.pause(at(500)).unwrap();
        let sub = s.game.propose_substitution(out, s.bench[0], at(560)).unwrap();
        s.game.confirm_substitution(sub.sub_id, at(570)).unwrap();
        s.game.resume(at(600)).unwrap();

        let outgoing = s.game.player(out).unwrap().clone();
        assert_eq!(outgoing.accumulated_on_field(), Duration::from_secs(500));
        let incoming = s.game.player(s.bench[0]).unwrap().clone();
        assert_eq!(incoming.field_entry(), Some(at(600)));
        assert_eq!(
            s.game.time_on_field(&incoming, at(630)),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn half_time_does_not_count_as_field_time() {
        let mut s = squad();
        let player = s.starters[2];
        s.game.start_period(1, at(0)).unwrap();
        s.game.end_period(at(2400)).unwrap();
        s.game.start_period(2, at(3300)).unwrap();

        let p = s.game.player(player).unwrap().clone();
        assert_eq!(s.game.time_on_field(&p, at(3360)), Duration::from_secs(2460));
        assert_eq!(s.game.clock().period_number(), 2);
        s.game.end_period(at(5700)).unwrap();
        assert!(matches!(
            s.game.start_period(3, at(5800)),
            Err(EngineError::InvalidTransition(_))
        ));
    }

    #[test]
    fn finished_game_cannot_restart_an_earlier_period() {
        let mut s = squad();
        s.game.start_period(1, at(0)).unwrap();
        s.game.pause(at(600)).unwrap();
        assert!(s.game.start_period(1, at(700)).is_err());
        assert!(s.game.start_period(3, at(700)).is_err());
        assert_eq!(s.game.clock().status(), ClockStatus::Paused);

        s.game.resume(at(700)).unwrap();
        s.game.end_period(at(2500)).unwrap();
        s.game.start_period(2, at(3300)).unwrap();
        s.game.end_period(at(5700)).unwrap();

        let before = s.game.clone();
        assert!(matches!(
            s.game.start_period(1, at(6000)),
            Err(EngineError::InvalidTransition(_))
        ));
        assert_eq!(s.game, before);
        assert_eq!(s.game.clock().status(), ClockStatus::Ended);
        assert_eq!(s.game.clock().period_number(), 2);
    }

    #[test]
    fn toggle_sub_cancels_existing_substitution() {
        let mut s = squad();
        let out = s.starters[8];
        s.game.start_period(1, at(0)).unwrap();

        let proposed = s
            .game
            .toggle_substitution(s.bench[1], Some(out), at(100))
            .unwrap();
        let SubstitutionToggle::Proposed(sub) = proposed else {
            panic!("expected a new proposal, got {proposed:?}");
        };
        assert_eq!(sub.out_player_id, out);
        assert_eq!(sub.in_player_id, s.bench[1]);

        let cancelled = s.game.toggle_substitution(out, None, at(110)).unwrap();
        assert_eq!(cancelled, SubstitutionToggle::Cancelled(sub));
        assert_eq!(s.game.pending_substitutions().count(), 0);
        assert_eq!(
            s.game.player(out).unwrap().status(),
            FieldStatus::OnField
        );
    }

    #[test]
    fn toggle_sub_without_partner_is_rejected() {
        let mut s = squad();
        s.game.start_period(1, at(0)).unwrap();
        assert!(matches!(
            s.game.toggle_substitution(s.starters[1], None, at(5)),
            Err(EngineError::InvalidPlayerState { .. })
        ));
    }

    #[test]
    fn remaining_and_overtime_follow_period_length() {
        let mut s = squad();
        s.game.start_period(1, at(0)).unwrap();
        assert_eq!(s.game.remaining(at(2000)), Duration::from_secs(400));
        assert!(!s.game.is_overtime(at(2400)));
        assert!(s.game.is_overtime(at(2460)));
        assert_eq!(s.game.remaining(at(2460)), Duration::ZERO);
    }

    #[test]
    fn stats_require_kickoff() {
        let mut s = squad();
        let scorer = s.starters[9];
        assert!(s.game.record_stat(scorer, StatKind::Goal, false).is_err());
        s.game.start_period(1, at(0)).unwrap();
        s.game.record_stat(scorer, StatKind::Goal, false).unwrap();
        s.game.record_stat(scorer, StatKind::Shot, false).unwrap();
        let p = s.game.player(scorer).unwrap();
        assert_eq!((p.stats.goals, p.stats.shots), (1, 1));
    }

    #[test]
    fn entities_round_trip_preserves_live_state() {
        let mut s = squad();
        s.game.start_period(1, at(0)).unwrap();
        s.game
            .propose_substitution(s.starters[3], s.bench[2], at(50))
            .unwrap();
        s.game.mark_updated(at(50));

        let record = s.game.to_record();
        let restored = LiveGame::from((
            record.game,
            record.players,
            Some(record.clock),
            record.substitutions,
        ));
        assert_eq!(restored, s.game);
    }
}
