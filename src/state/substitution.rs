use std::time::SystemTime;

use indexmap::IndexMap;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::models::PendingSubstitutionEntity,
    state::{
        error::{EngineError, Missing},
        player::{FieldStatus, GamePlayer},
    },
};

/// Unique identifier of a pending substitution.
pub type SubId = Uuid;

/// Proposed but unconfirmed swap of one field player for one bench player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubstitution {
    pub sub_id: SubId,
    pub out_player_id: Uuid,
    pub in_player_id: Uuid,
    pub created_at: SystemTime,
}

impl PendingSubstitution {
    /// Whether `player_id` is either side of this substitution.
    pub fn involves(&self, player_id: Uuid) -> bool {
        self.out_player_id == player_id || self.in_player_id == player_id
    }
}

/// Pairs outgoing and incoming players and applies both halves of a swap
/// together.
///
/// Both players of a proposal are validated before either one is touched, so
/// a rejected command leaves every player as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionCoordinator {
    pending: IndexMap<SubId, PendingSubstitution>,
}

impl SubstitutionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending substitutions in proposal order.
    pub fn pending(&self) -> impl Iterator<Item = &PendingSubstitution> {
        self.pending.values()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn get(&self, sub_id: SubId) -> Option<&PendingSubstitution> {
        self.pending.get(&sub_id)
    }

    /// Pending substitution referencing `player_id`, if any.
    pub fn pending_for(&self, player_id: Uuid) -> Option<&PendingSubstitution> {
        self.pending.values().find(|sub| sub.involves(player_id))
    }

    /// Pair `out_player_id` (on field) with `in_player_id` (on bench).
    ///
    /// The outgoing stint is committed at `at`: time stops counting when the
    /// swap is decided, not when it is confirmed.
    pub fn propose(
        &mut self,
        players: &mut IndexMap<Uuid, GamePlayer>,
        out_player_id: Uuid,
        in_player_id: Uuid,
        at: SystemTime,
        created_at: SystemTime,
    ) -> Result<PendingSubstitution, EngineError> {
        let out_status = lookup(players, out_player_id)?.status();
        let in_status = lookup(players, in_player_id)?.status();

        if out_player_id == in_player_id {
            return Err(EngineError::InvalidPlayerState {
                player_id: in_player_id,
                status: in_status,
            });
        }
        for player_id in [out_player_id, in_player_id] {
            if self.pending_for(player_id).is_some() {
                return Err(EngineError::AlreadyPending { player_id });
            }
        }
        if !out_status.is_on_field() {
            return Err(EngineError::InvalidPlayerState {
                player_id: out_player_id,
                status: out_status,
            });
        }
        if in_status != FieldStatus::OnBench {
            return Err(EngineError::InvalidPlayerState {
                player_id: in_player_id,
                status: in_status,
            });
        }

        let goalkeeper = out_status == FieldStatus::OnFieldGk;
        if let Some(outgoing) = players.get_mut(&out_player_id) {
            outgoing.begin_sub_out(at);
        }
        if let Some(incoming) = players.get_mut(&in_player_id) {
            incoming.begin_sub_in(goalkeeper);
        }

        let sub = PendingSubstitution {
            sub_id: Uuid::new_v4(),
            out_player_id,
            in_player_id,
            created_at,
        };
        debug!(sub_id = %sub.sub_id, %out_player_id, %in_player_id, "substitution proposed");
        self.pending.insert(sub.sub_id, sub.clone());
        Ok(sub)
    }

    /// Drop a pending substitution and put both players back where they were.
    ///
    /// The outgoing player starts a fresh stint at `at`; the time committed at
    /// proposal is not added again.
    pub fn cancel(
        &mut self,
        players: &mut IndexMap<Uuid, GamePlayer>,
        sub_id: SubId,
        at: SystemTime,
    ) -> Result<PendingSubstitution, EngineError> {
        let sub = self.take(players, sub_id)?;
        if let Some(outgoing) = players.get_mut(&sub.out_player_id) {
            outgoing.revert_sub_out(at);
        }
        if let Some(incoming) = players.get_mut(&sub.in_player_id) {
            incoming.revert_sub_in();
        }
        debug!(%sub_id, "substitution cancelled");
        Ok(sub)
    }

    /// Apply a pending substitution: the outgoing player sits down and the
    /// incoming one takes the field (and the goalkeeper role, if it was held).
    pub fn confirm(
        &mut self,
        players: &mut IndexMap<Uuid, GamePlayer>,
        sub_id: SubId,
        at: SystemTime,
    ) -> Result<PendingSubstitution, EngineError> {
        let sub = self.take(players, sub_id)?;
        if let Some(outgoing) = players.get_mut(&sub.out_player_id) {
            outgoing.complete_sub_out();
        }
        if let Some(incoming) = players.get_mut(&sub.in_player_id) {
            incoming.complete_sub_in(at);
        }
        debug!(%sub_id, "substitution confirmed");
        Ok(sub)
    }

    /// Remove `sub_id` once both of its players are known to exist.
    fn take(
        &mut self,
        players: &IndexMap<Uuid, GamePlayer>,
        sub_id: SubId,
    ) -> Result<PendingSubstitution, EngineError> {
        let sub = self
            .pending
            .get(&sub_id)
            .ok_or(EngineError::NotFound(Missing::Substitution(sub_id)))?;
        lookup(players, sub.out_player_id)?;
        lookup(players, sub.in_player_id)?;
        self.pending
            .shift_remove(&sub_id)
            .ok_or(EngineError::NotFound(Missing::Substitution(sub_id)))
    }
}

fn lookup(
    players: &IndexMap<Uuid, GamePlayer>,
    player_id: Uuid,
) -> Result<&GamePlayer, EngineError> {
    players
        .get(&player_id)
        .ok_or(EngineError::NotFound(Missing::Player(player_id)))
}

impl From<PendingSubstitutionEntity> for PendingSubstitution {
    fn from(value: PendingSubstitutionEntity) -> Self {
        Self {
            sub_id: value.sub_id,
            out_player_id: value.out_player_id,
            in_player_id: value.in_player_id,
            created_at: value.created_at,
        }
    }
}

impl From<&PendingSubstitution> for PendingSubstitutionEntity {
    fn from(value: &PendingSubstitution) -> Self {
        Self {
            sub_id: value.sub_id,
            out_player_id: value.out_player_id,
            in_player_id: value.in_player_id,
            created_at: value.created_at,
        }
    }
}

impl FromIterator<PendingSubstitution> for SubstitutionCoordinator {
    fn from_iter<T: IntoIterator<Item = PendingSubstitution>>(iter: T) -> Self {
        Self {
            pending: iter.into_iter().map(|sub| (sub.sub_id, sub)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use proptest::prelude::*;

    use super::*;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    struct Fixture {
        players: IndexMap<Uuid, GamePlayer>,
        keeper: Uuid,
        field: Uuid,
        bench: Uuid,
        bench_two: Uuid,
    }

    /// One goalkeeper and one outfield player on the field from `t=0`, two on the bench.
    fn fixture() -> Fixture {
        let mut players = IndexMap::new();
        let mut add = |number: u8, setup: fn(&mut GamePlayer)| {
            let mut player = GamePlayer::new(Uuid::new_v4(), number, format!("Player {number}"));
            setup(&mut player);
            player.commit_lineup(at(0));
            let id = player.player_id;
            players.insert(id, player);
            id
        };
        let keeper = add(1, |p| {
            p.toggle_starter().unwrap();
            p.toggle_goalkeeper().unwrap();
        });
        let field = add(9, |p| p.toggle_starter().unwrap());
        let bench = add(14, |p| p.toggle_bench().unwrap());
        let bench_two = add(15, |p| p.toggle_bench().unwrap());
        Fixture {
            players,
            keeper,
            field,
            bench,
            bench_two,
        }
    }

    #[test]
    fn proposal_commits_outgoing_time_and_cancel_restarts_stint() {
        let mut f = fixture();
        let mut coordinator = SubstitutionCoordinator::new();

        let sub = coordinator
            .propose(&mut f.players, f.field, f.bench, at(300), at(300))
            .unwrap();
        let outgoing = &f.players[&f.field];
        assert_eq!(outgoing.status(), FieldStatus::SubbingOut);
        assert_eq!(outgoing.accumulated_on_field(), Duration::from_secs(300));
        assert_eq!(f.players[&f.bench].status(), FieldStatus::SubbingIn);

        coordinator
            .cancel(&mut f.players, sub.sub_id, at(310))
            .unwrap();
        let outgoing = &f.players[&f.field];
        assert_eq!(outgoing.status(), FieldStatus::OnField);
        assert_eq!(outgoing.field_entry(), Some(at(310)));
        assert_eq!(outgoing.accumulated_on_field(), Duration::from_secs(300));
        assert_eq!(f.players[&f.bench].status(), FieldStatus::OnBench);
        assert!(coordinator.is_empty());
    }

    #[test]
    fn confirm_swaps_exactly_one_player_each_way() {
        let mut f = fixture();
        let mut coordinator = SubstitutionCoordinator::new();
        let sub = coordinator
            .propose(&mut f.players, f.field, f.bench, at(120), at(120))
            .unwrap();
        coordinator
            .confirm(&mut f.players, sub.sub_id, at(130))
            .unwrap();

        let outgoing = &f.players[&f.field];
        assert_eq!(outgoing.status(), FieldStatus::OnBench);
        assert_eq!(outgoing.field_entry(), None);
        assert_eq!(outgoing.accumulated_on_field(), Duration::from_secs(120));

        let incoming = &f.players[&f.bench];
        assert_eq!(incoming.status(), FieldStatus::OnField);
        assert_eq!(incoming.field_entry(), Some(at(130)));

        let on_field = f
            .players
            .values()
            .filter(|p| p.status().is_on_field())
            .count();
        assert_eq!(on_field, 2);
    }

    #[test]
    fn goalkeeper_role_transfers_on_confirm() {
        let mut f = fixture();
        let mut coordinator = SubstitutionCoordinator::new();
        let sub = coordinator
            .propose(&mut f.players, f.keeper, f.bench, at(60), at(60))
            .unwrap();
        assert_eq!(f.players[&f.keeper].status(), FieldStatus::SubbingOutGk);
        assert_eq!(f.players[&f.bench].status(), FieldStatus::SubbingInGk);

        coordinator
            .confirm(&mut f.players, sub.sub_id, at(70))
            .unwrap();
        assert_eq!(f.players[&f.keeper].status(), FieldStatus::OnBench);
        assert_eq!(f.players[&f.bench].status(), FieldStatus::OnFieldGk);
    }

    #[test]
    fn cancelling_goalkeeper_swap_keeps_role() {
        let mut f = fixture();
        let mut coordinator = SubstitutionCoordinator::new();
        let sub = coordinator
            .propose(&mut f.players, f.keeper, f.bench, at(60), at(60))
            .unwrap();
        coordinator
            .cancel(&mut f.players, sub.sub_id, at(61))
            .unwrap();
        assert_eq!(f.players[&f.keeper].status(), FieldStatus::OnFieldGk);
        assert_eq!(f.players[&f.bench].status(), FieldStatus::OnBench);
    }

    #[test]
    fn second_cancel_is_not_found() {
        let mut f = fixture();
        let mut coordinator = SubstitutionCoordinator::new();
        let sub = coordinator
            .propose(&mut f.players, f.field, f.bench, at(10), at(10))
            .unwrap();
        coordinator.cancel(&mut f.players, sub.sub_id, at(11)).unwrap();
        let err = coordinator
            .cancel(&mut f.players, sub.sub_id, at(12))
            .unwrap_err();
        assert_eq!(err, EngineError::NotFound(Missing::Substitution(sub.sub_id)));
        assert_eq!(f.players[&f.field].field_entry(), Some(at(11)));
    }

    #[test]
    fn same_player_on_both_sides_is_rejected() {
        let mut f = fixture();
        let mut coordinator = SubstitutionCoordinator::new();
        let err = coordinator
            .propose(&mut f.players, f.field, f.field, at(10), at(10))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPlayerState { player_id, .. } if player_id == f.field));
        assert_eq!(f.players[&f.field].status(), FieldStatus::OnField);
    }

    #[test]
    fn a_player_can_only_be_in_one_pending_substitution() {
        let mut f = fixture();
        let mut coordinator = SubstitutionCoordinator::new();
        coordinator
            .propose(&mut f.players, f.field, f.bench, at(10), at(10))
            .unwrap();

        let err = coordinator
            .propose(&mut f.players, f.keeper, f.bench, at(11), at(11))
            .unwrap_err();
        assert_eq!(err, EngineError::AlreadyPending { player_id: f.bench });

        let err = coordinator
            .propose(&mut f.players, f.field, f.bench_two, at(11), at(11))
            .unwrap_err();
        assert_eq!(err, EngineError::AlreadyPending { player_id: f.field });

        assert_eq!(f.players[&f.keeper].status(), FieldStatus::OnFieldGk);
        assert_eq!(f.players[&f.bench_two].status(), FieldStatus::OnBench);
    }

    #[test]
    fn ineligible_sides_are_rejected_without_side_effects() {
        let mut f = fixture();
        let mut coordinator = SubstitutionCoordinator::new();

        let err = coordinator
            .propose(&mut f.players, f.bench, f.bench_two, at(10), at(10))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidPlayerState {
                player_id: f.bench,
                status: FieldStatus::OnBench
            }
        );

        let err = coordinator
            .propose(&mut f.players, f.field, f.keeper, at(10), at(10))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidPlayerState {
                player_id: f.keeper,
                status: FieldStatus::OnFieldGk
            }
        );
        assert_eq!(f.players[&f.field].field_entry(), Some(at(0)));
        assert!(coordinator.is_empty());
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut f = fixture();
        let mut coordinator = SubstitutionCoordinator::new();
        let ghost = Uuid::new_v4();
        assert_eq!(
            coordinator
                .propose(&mut f.players, ghost, f.bench, at(1), at(1))
                .unwrap_err(),
            EngineError::NotFound(Missing::Player(ghost))
        );
        assert_eq!(
            coordinator
                .confirm(&mut f.players, ghost, at(1))
                .unwrap_err(),
            EngineError::NotFound(Missing::Substitution(ghost))
        );
    }

    proptest! {
        /// Committed field time equals the sum of the stints, whatever the
        /// number of on/off cycles and whether swaps were confirmed or cancelled.
        #[test]
        fn accumulated_time_matches_stint_sum(
            cycles in proptest::collection::vec((1u64..900, 0u64..300, any::<bool>()), 1..40)
        ) {
            let mut f = fixture();
            let mut coordinator = SubstitutionCoordinator::new();
            let mut now = 0u64;
            let mut expected = 0u64;
            let (on, off) = (f.field, f.bench);

            for (stint, gap, confirm) in cycles {
                now += stint;
                expected += stint;
                let sub = coordinator
                    .propose(&mut f.players, on, off, at(now), at(now))
                    .unwrap();
                now += gap;
                if confirm {
                    coordinator.confirm(&mut f.players, sub.sub_id, at(now)).unwrap();
                    // The incoming player's stints are not part of the tally;
                    // bring the tracked player back on immediately.
                    let back = coordinator
                        .propose(&mut f.players, off, on, at(now), at(now))
                        .unwrap();
                    coordinator.confirm(&mut f.players, back.sub_id, at(now)).unwrap();
                } else {
                    coordinator.cancel(&mut f.players, sub.sub_id, at(now)).unwrap();
                }
            }

            let tracked = &f.players[&on];
            prop_assert_eq!(tracked.accumulated_on_field(), Duration::from_secs(expected));
            prop_assert!(tracked.status().is_on_field());
        }
    }
}
