//! Commands and read models of a live game.
//!
//! Every command goes through [`LiveGameHandle::run_command`]: one writer per
//! game, the new state is persisted before it is published, and a failure at
//! any step leaves the published game untouched.

use std::{sync::Arc, time::SystemTime};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::{
        commands::{ProposeSubstitutionRequest, StatRequest, SubToggleResponse},
        game::{ClockView, LineupReport, PlayerView, RosterPlayerInput, SubstitutionView},
    },
    error::ServiceError,
    services::game_service,
    state::{
        LiveGameHandle, SharedState, error::EngineError, live_game::LiveGame, player::GamePlayer,
        player::Unavailability, substitution::SubId,
    },
};

/// Run `command` against game `game_id` and return its result with the published game.
async fn execute<C, T>(
    state: &SharedState,
    game_id: Uuid,
    command: C,
) -> Result<(T, Arc<LiveGame>), ServiceError>
where
    C: FnOnce(&mut LiveGame, SystemTime) -> Result<T, EngineError>,
{
    let handle: Arc<LiveGameHandle> = game_service::live_game(state, game_id).await?;
    let store = state.require_game_store().await?;
    handle
        .run_command(
            state.time_source(),
            state.transition_timeout(),
            command,
            move |game| game_service::persist_live_game(store, game),
        )
        .await
}

async fn snapshot(state: &SharedState, game_id: Uuid) -> Result<Arc<LiveGame>, ServiceError> {
    Ok(game_service::live_game(state, game_id).await?.snapshot())
}

fn player_view(
    state: &SharedState,
    game: &LiveGame,
    player_id: Uuid,
) -> Result<PlayerView, ServiceError> {
    let player = game.player(player_id)?;
    Ok((game, player, state.now()).into())
}

// ---------------------------------------------------------------------------
// Roster and lineup selection
// ---------------------------------------------------------------------------

pub async fn add_player(
    state: &SharedState,
    game_id: Uuid,
    input: RosterPlayerInput,
) -> Result<PlayerView, ServiceError> {
    let player = GamePlayer::from(input);
    let player_id = player.player_id;
    let ((), game) = execute(state, game_id, move |game, _| game.add_player(player)).await?;
    info!(%game_id, %player_id, "player added to game");
    player_view(state, &game, player_id)
}

pub async fn remove_player(
    state: &SharedState,
    game_id: Uuid,
    player_id: Uuid,
) -> Result<(), ServiceError> {
    execute(state, game_id, |game, _| game.remove_player(player_id)).await?;
    info!(%game_id, %player_id, "player removed from game");
    Ok(())
}

pub async fn toggle_starter(
    state: &SharedState,
    game_id: Uuid,
    player_id: Uuid,
) -> Result<PlayerView, ServiceError> {
    let ((), game) = execute(state, game_id, |game, _| game.toggle_starter(player_id)).await?;
    player_view(state, &game, player_id)
}

pub async fn toggle_goalkeeper(
    state: &SharedState,
    game_id: Uuid,
    player_id: Uuid,
) -> Result<PlayerView, ServiceError> {
    let ((), game) = execute(state, game_id, |game, _| game.toggle_goalkeeper(player_id)).await?;
    player_view(state, &game, player_id)
}

pub async fn toggle_bench(
    state: &SharedState,
    game_id: Uuid,
    player_id: Uuid,
) -> Result<PlayerView, ServiceError> {
    let ((), game) = execute(state, game_id, |game, _| game.toggle_bench(player_id)).await?;
    player_view(state, &game, player_id)
}

pub async fn toggle_player_status(
    state: &SharedState,
    game_id: Uuid,
    player_id: Uuid,
    reason: Unavailability,
) -> Result<PlayerView, ServiceError> {
    let ((), game) = execute(state, game_id, |game, _| {
        game.toggle_player_status(player_id, reason)
    })
    .await?;
    let view = player_view(state, &game, player_id)?;
    info!(%game_id, %player_id, status = ?view.status, "player status toggled");
    Ok(view)
}

pub async fn lineup_report(state: &SharedState, game_id: Uuid) -> Result<LineupReport, ServiceError> {
    let game = snapshot(state, game_id).await?;
    Ok((game.as_ref(), game.validate_lineup()).into())
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

pub async fn start_period(
    state: &SharedState,
    game_id: Uuid,
    period: u32,
) -> Result<ClockView, ServiceError> {
    let ((), game) = execute(state, game_id, |game, now| game.start_period(period, now)).await?;
    info!(%game_id, period, "period started");
    Ok((game.as_ref(), state.now()).into())
}

pub async fn pause(state: &SharedState, game_id: Uuid) -> Result<ClockView, ServiceError> {
    let ((), game) = execute(state, game_id, |game, now| game.pause(now)).await?;
    info!(%game_id, elapsed = %game.formatted_elapsed_time(state.now()), "clock paused");
    Ok((game.as_ref(), state.now()).into())
}

pub async fn resume(state: &SharedState, game_id: Uuid) -> Result<ClockView, ServiceError> {
    let ((), game) = execute(state, game_id, |game, now| game.resume(now)).await?;
    info!(%game_id, "clock resumed");
    Ok((game.as_ref(), state.now()).into())
}

pub async fn end_period(state: &SharedState, game_id: Uuid) -> Result<ClockView, ServiceError> {
    let ((), game) = execute(state, game_id, |game, now| game.end_period(now)).await?;
    info!(
        %game_id,
        period = game.clock().period_number(),
        elapsed = %game.formatted_elapsed_time(state.now()),
        "period ended"
    );
    Ok((game.as_ref(), state.now()).into())
}

pub async fn clock(state: &SharedState, game_id: Uuid) -> Result<ClockView, ServiceError> {
    let game = snapshot(state, game_id).await?;
    Ok((game.as_ref(), state.now()).into())
}

// ---------------------------------------------------------------------------
// Substitutions
// ---------------------------------------------------------------------------

pub async fn pending_substitutions(
    state: &SharedState,
    game_id: Uuid,
) -> Result<Vec<SubstitutionView>, ServiceError> {
    let game = snapshot(state, game_id).await?;
    Ok(game.pending_substitutions().map(Into::into).collect())
}

pub async fn propose_substitution(
    state: &SharedState,
    game_id: Uuid,
    request: ProposeSubstitutionRequest,
) -> Result<SubstitutionView, ServiceError> {
    let (sub, _) = execute(state, game_id, |game, now| {
        game.propose_substitution(request.out_player_id, request.in_player_id, now)
    })
    .await?;
    info!(
        %game_id,
        sub_id = %sub.sub_id,
        out_player = %sub.out_player_id,
        in_player = %sub.in_player_id,
        "substitution proposed"
    );
    Ok((&sub).into())
}

pub async fn confirm_substitution(
    state: &SharedState,
    game_id: Uuid,
    sub_id: SubId,
) -> Result<SubstitutionView, ServiceError> {
    let (sub, _) = execute(state, game_id, |game, now| {
        game.confirm_substitution(sub_id, now)
    })
    .await?;
    info!(%game_id, %sub_id, "substitution confirmed");
    Ok((&sub).into())
}

pub async fn cancel_substitution(
    state: &SharedState,
    game_id: Uuid,
    sub_id: SubId,
) -> Result<SubstitutionView, ServiceError> {
    let (sub, _) = execute(state, game_id, |game, now| {
        game.cancel_substitution(sub_id, now)
    })
    .await?;
    info!(%game_id, %sub_id, "substitution cancelled");
    Ok((&sub).into())
}

/// "Sub" button: cancel the player's pending substitution, or pair them with `partner_id`.
pub async fn toggle_substitution(
    state: &SharedState,
    game_id: Uuid,
    player_id: Uuid,
    partner_id: Option<Uuid>,
) -> Result<SubToggleResponse, ServiceError> {
    let (toggle, _) = execute(state, game_id, |game, now| {
        game.toggle_substitution(player_id, partner_id, now)
    })
    .await?;
    debug!(%game_id, %player_id, ?toggle, "substitution toggled");
    Ok(toggle.into())
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

pub async fn record_stat(
    state: &SharedState,
    game_id: Uuid,
    player_id: Uuid,
    request: StatRequest,
) -> Result<PlayerView, ServiceError> {
    let ((), game) = execute(state, game_id, |game, _| {
        game.record_stat(player_id, request.kind, request.undo)
    })
    .await?;
    debug!(%game_id, %player_id, kind = ?request.kind, undo = request.undo, "stat recorded");
    player_view(state, &game, player_id)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::{GameStore, memory::MemoryGameStore},
            models::{
                GameClockEntity, GameEntity, GameListItemEntity, LiveGameRecord,
                PendingSubstitutionEntity, PlayerEntity,
            },
            storage::{StorageError, StorageResult},
        },
        dto::{commands::SubToggleAction, game::CreateGameRequest},
        state::{
            AppState, ManualTimeSource, clock::ClockStatus, error::Missing, lineup::LineupIssue,
            player::{FieldStatus, StatKind},
        },
    };

    /// Store that refuses every partial write and only accepts whole games.
    struct WholeGameWritesOnly(MemoryGameStore);

    fn partial_write() -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async {
            Err(StorageError::unavailable(
                "partial writes refused".into(),
                std::io::Error::other("partial write"),
            ))
        })
    }

    impl GameStore for WholeGameWritesOnly {
        fn save_game(&self, _game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
            partial_write()
        }
        fn save_live_game(&self, record: LiveGameRecord) -> BoxFuture<'static, StorageResult<()>> {
            self.0.save_live_game(record)
        }
        fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            self.0.find_game(id)
        }
        fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
            self.0.list_games()
        }
        fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
            self.0.delete_game(id)
        }
        fn load_game_players(
            &self,
            game_id: Uuid,
        ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
            self.0.load_game_players(game_id)
        }
        fn save_game_players(
            &self,
            _game_id: Uuid,
            _players: Vec<PlayerEntity>,
        ) -> BoxFuture<'static, StorageResult<()>> {
            partial_write()
        }
        fn load_game_clock(
            &self,
            game_id: Uuid,
        ) -> BoxFuture<'static, StorageResult<Option<GameClockEntity>>> {
            self.0.load_game_clock(game_id)
        }
        fn save_game_clock(
            &self,
            _game_id: Uuid,
            _clock: GameClockEntity,
        ) -> BoxFuture<'static, StorageResult<()>> {
            partial_write()
        }
        fn load_substitutions(
            &self,
            game_id: Uuid,
        ) -> BoxFuture<'static, StorageResult<Vec<PendingSubstitutionEntity>>> {
            self.0.load_substitutions(game_id)
        }
        fn save_substitutions(
            &self,
            _game_id: Uuid,
            _substitutions: Vec<PendingSubstitutionEntity>,
        ) -> BoxFuture<'static, StorageResult<()>> {
            partial_write()
        }
        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.0.health_check()
        }
        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.0.try_reconnect()
        }
    }

    struct Harness {
        state: SharedState,
        time: Arc<ManualTimeSource>,
        store: MemoryGameStore,
        game_id: Uuid,
        keeper: Uuid,
        starters: Vec<Uuid>,
        bench: Vec<Uuid>,
    }

    impl Harness {
        fn advance(&self, secs: u64) {
            self.time.advance(Duration::from_secs(secs));
        }
    }

    /// Seven-a-side game: seven starters (first one in goal), three on the bench.
    async fn harness() -> Harness {
        let time = ManualTimeSource::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000));
        let state = AppState::with_time_source(AppConfig::default(), time.clone());
        let store = MemoryGameStore::new();
        state.set_game_store(Arc::new(store.clone())).await;

        let view = game_service::create_game(
            &state,
            CreateGameRequest {
                name: "U11 vs Harbour".into(),
                players: (1..=10u8)
                    .map(|n| RosterPlayerInput {
                        player_id: None,
                        jersey_number: n,
                        full_name: format!("Player {n}"),
                    })
                    .collect(),
                starters_required: Some(7),
                period_length_seconds: Some(25 * 60),
                periods_per_game: Some(2),
            },
        )
        .await
        .unwrap();

        let ids: Vec<Uuid> = view.players.iter().map(|p| p.player_id).collect();
        let (starters, bench) = ids.split_at(7);
        for &id in starters {
            toggle_starter(&state, view.id, id).await.unwrap();
        }
        for &id in bench {
            toggle_bench(&state, view.id, id).await.unwrap();
        }
        toggle_goalkeeper(&state, view.id, starters[0]).await.unwrap();

        Harness {
            state,
            time,
            store,
            game_id: view.id,
            keeper: starters[0],
            starters: starters.to_vec(),
            bench: bench.to_vec(),
        }
    }

    #[tokio::test]
    async fn proposal_then_cancel_accounts_time_at_proposal() {
        let h = harness().await;
        start_period(&h.state, h.game_id, 1).await.unwrap();
        let out = h.starters[3];

        h.advance(300);
        let sub = propose_substitution(
            &h.state,
            h.game_id,
            ProposeSubstitutionRequest {
                out_player_id: out,
                in_player_id: h.bench[0],
            },
        )
        .await
        .unwrap();

        h.advance(10);
        cancel_substitution(&h.state, h.game_id, sub.sub_id)
            .await
            .unwrap();

        h.advance(20);
        let game = snapshot(&h.state, h.game_id).await.unwrap();
        let view = player_view(&h.state, &game, out).unwrap();
        assert_eq!(view.status, FieldStatus::OnField);
        assert_eq!(view.on_field_seconds, 320);
        assert_eq!(view.current_stint_seconds, 20);

        let err = cancel_substitution(&h.state, h.game_id, sub.sub_id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Engine(EngineError::NotFound(Missing::Substitution(id))) if id == sub.sub_id
        ));
    }

    #[tokio::test]
    async fn clock_view_reports_elapsed_and_remaining() {
        let h = harness().await;
        start_period(&h.state, h.game_id, 1).await.unwrap();
        h.advance(600);
        pause(&h.state, h.game_id).await.unwrap();
        h.advance(100);
        resume(&h.state, h.game_id).await.unwrap();
        h.advance(60);

        let view = clock(&h.state, h.game_id).await.unwrap();
        assert_eq!(view.status, ClockStatus::Running);
        assert_eq!(view.elapsed_seconds, 660);
        assert_eq!(view.formatted_elapsed_time, "11:00");
        assert_eq!(view.remaining_seconds, 25 * 60 - 660);
        assert!(!view.is_overtime);
    }

    #[tokio::test]
    async fn kickoff_is_blocked_by_incomplete_lineup() {
        let h = harness().await;
        toggle_goalkeeper(&h.state, h.game_id, h.keeper).await.unwrap();

        let report = lineup_report(&h.state, h.game_id).await.unwrap();
        assert!(!report.valid);
        assert_eq!(report.goalkeepers, 0);

        let err = start_period(&h.state, h.game_id, 1).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Engine(EngineError::IncompleteLineup(LineupIssue::NoGoalkeeper))
        ));
        assert_eq!(
            clock(&h.state, h.game_id).await.unwrap().status,
            ClockStatus::NotStarted
        );
    }

    #[tokio::test]
    async fn concurrent_proposals_for_one_bench_player_admit_one() {
        let h = harness().await;
        start_period(&h.state, h.game_id, 1).await.unwrap();
        h.advance(90);

        let first = propose_substitution(
            &h.state,
            h.game_id,
            ProposeSubstitutionRequest {
                out_player_id: h.starters[1],
                in_player_id: h.bench[2],
            },
        );
        let second = propose_substitution(
            &h.state,
            h.game_id,
            ProposeSubstitutionRequest {
                out_player_id: h.starters[2],
                in_player_id: h.bench[2],
            },
        );
        let (first, second) = tokio::join!(first, second);

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| matches!(
            r,
            Err(ServiceError::Engine(EngineError::AlreadyPending { player_id })) if *player_id == h.bench[2]
        )));
        assert_eq!(
            pending_substitutions(&h.state, h.game_id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn failed_persistence_discards_the_command() {
        let h = harness().await;
        start_period(&h.state, h.game_id, 1).await.unwrap();
        let before = snapshot(&h.state, h.game_id).await.unwrap();

        h.store.set_offline(true);
        let err = propose_substitution(
            &h.state,
            h.game_id,
            ProposeSubstitutionRequest {
                out_player_id: h.starters[4],
                in_player_id: h.bench[1],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));

        let after = snapshot(&h.state, h.game_id).await.unwrap();
        assert_eq!(after.version(), before.version());
        assert_eq!(after.pending_substitutions().count(), 0);
        assert_eq!(
            after.player(h.starters[4]).unwrap().status(),
            FieldStatus::OnField
        );
    }

    #[tokio::test]
    async fn goalkeeper_swap_via_toggle_transfers_role() {
        let h = harness().await;
        start_period(&h.state, h.game_id, 1).await.unwrap();
        h.advance(1200);

        let toggled = toggle_substitution(&h.state, h.game_id, h.keeper, Some(h.bench[0]))
            .await
            .unwrap();
        assert!(matches!(toggled.action, SubToggleAction::Proposed));
        confirm_substitution(&h.state, h.game_id, toggled.substitution.sub_id)
            .await
            .unwrap();

        let game = snapshot(&h.state, h.game_id).await.unwrap();
        assert_eq!(
            game.player(h.bench[0]).unwrap().status(),
            FieldStatus::OnFieldGk
        );
        assert_eq!(game.player(h.keeper).unwrap().status(), FieldStatus::OnBench);
        assert_eq!(game.on_field_players().count(), 7);
        let keeper = player_view(&h.state, &game, h.keeper).unwrap();
        assert_eq!(keeper.on_field_seconds, 1200);
        assert_eq!(keeper.formatted_on_field_time, "20:00");
    }

    #[tokio::test]
    async fn stats_and_status_after_kickoff() {
        let h = harness().await;
        start_period(&h.state, h.game_id, 1).await.unwrap();

        let scorer = h.starters[6];
        record_stat(
            &h.state,
            h.game_id,
            scorer,
            StatRequest {
                kind: StatKind::Goal,
                undo: false,
            },
        )
        .await
        .unwrap();
        let view = record_stat(
            &h.state,
            h.game_id,
            scorer,
            StatRequest {
                kind: StatKind::Assist,
                undo: true,
            },
        )
        .await
        .unwrap();
        assert_eq!((view.goals, view.assists), (1, 0));

        let injured = toggle_player_status(&h.state, h.game_id, h.bench[1], Unavailability::Injured)
            .await
            .unwrap();
        assert_eq!(injured.status, FieldStatus::Injured);
        assert!(
            toggle_player_status(&h.state, h.game_id, scorer, Unavailability::Injured)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn roster_changes_are_locked_after_kickoff() {
        let h = harness().await;
        let late = add_player(
            &h.state,
            h.game_id,
            RosterPlayerInput {
                player_id: None,
                jersey_number: 23,
                full_name: "Late Arrival".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(late.status, FieldStatus::Available);
        remove_player(&h.state, h.game_id, late.player_id)
            .await
            .unwrap();

        start_period(&h.state, h.game_id, 1).await.unwrap();
        assert!(
            remove_player(&h.state, h.game_id, h.bench[2])
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn live_state_survives_a_reload() {
        let h = harness().await;
        start_period(&h.state, h.game_id, 1).await.unwrap();
        h.advance(45);
        propose_substitution(
            &h.state,
            h.game_id,
            ProposeSubstitutionRequest {
                out_player_id: h.starters[5],
                in_player_id: h.bench[0],
            },
        )
        .await
        .unwrap();
        let before = snapshot(&h.state, h.game_id).await.unwrap();

        h.state.live_games().remove(&h.game_id);
        let after = snapshot(&h.state, h.game_id).await.unwrap();
        assert_eq!(*after, *before);
        assert_eq!(after.pending_substitutions().count(), 1);
    }

    #[tokio::test]
    async fn commands_are_stored_as_one_record() {
        let h = harness().await;
        h.state
            .set_game_store(Arc::new(WholeGameWritesOnly(h.store.clone())))
            .await;
        start_period(&h.state, h.game_id, 1).await.unwrap();
        h.advance(30);
        propose_substitution(
            &h.state,
            h.game_id,
            ProposeSubstitutionRequest {
                out_player_id: h.starters[2],
                in_player_id: h.bench[1],
            },
        )
        .await
        .unwrap();
        let published = snapshot(&h.state, h.game_id).await.unwrap();

        h.state.live_games().remove(&h.game_id);
        let reloaded = snapshot(&h.state, h.game_id).await.unwrap();
        assert_eq!(*reloaded, *published);
        assert_eq!(
            reloaded.player(h.starters[2]).unwrap().status(),
            FieldStatus::SubbingOut
        );
        assert_eq!(
            reloaded.player(h.bench[1]).unwrap().status(),
            FieldStatus::SubbingIn
        );
        assert_eq!(reloaded.pending_substitutions().count(), 1);
    }

    #[tokio::test]
    async fn rejected_write_leaves_storage_at_the_published_state() {
        let h = harness().await;
        start_period(&h.state, h.game_id, 1).await.unwrap();
        let published = snapshot(&h.state, h.game_id).await.unwrap();

        h.store.set_offline(true);
        assert!(
            propose_substitution(
                &h.state,
                h.game_id,
                ProposeSubstitutionRequest {
                    out_player_id: h.starters[2],
                    in_player_id: h.bench[1],
                },
            )
            .await
            .is_err()
        );
        h.store.set_offline(false);

        h.state.live_games().remove(&h.game_id);
        let reloaded = snapshot(&h.state, h.game_id).await.unwrap();
        assert_eq!(*reloaded, *published);
        assert_eq!(
            reloaded.player(h.starters[2]).unwrap().status(),
            FieldStatus::OnField
        );
        assert_eq!(reloaded.pending_substitutions().count(), 0);
    }
}
