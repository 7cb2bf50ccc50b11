//! Game lifecycle: creation, listing, deletion and loading games into the live registry.

use std::{sync::Arc, time::Duration};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::game_store::GameStore,
    dto::game::{CreateGameRequest, GameSummary, GameView},
    error::ServiceError,
    state::{
        LiveGameHandle, SharedState,
        lineup::LineupRules,
        live_game::{GameRules, LiveGame},
        player::GamePlayer,
    },
};

/// Create a game with its roster and register it as live.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameView, ServiceError> {
    let store = state.require_game_store().await?;
    let rules = rules_for(state, &request);
    let now = state.now();

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "game name must not be blank".into(),
        ));
    }

    let mut game = LiveGame::new(name.to_owned(), rules, now);
    for player in request.players {
        game.add_player(GamePlayer::from(player))?;
    }

    let game = Arc::new(game);
    persist_live_game(store, game.clone()).await?;
    state
        .live_games()
        .insert(game.id, Arc::new(LiveGameHandle::new((*game).clone())));

    info!(
        game_id = %game.id,
        players = game.players().count(),
        starters_required = rules.lineup.starters_required,
        "game created"
    );
    Ok((game.as_ref(), now).into())
}

/// Return the games persisted in storage, oldest first.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    let games = store.list_games().await?;
    Ok(games.into_iter().map(Into::into).collect())
}

pub async fn get_game(state: &SharedState, id: Uuid) -> Result<GameView, ServiceError> {
    let handle = live_game(state, id).await?;
    let game = handle.snapshot();
    Ok((game.as_ref(), state.now()).into())
}

/// Delete a game from storage and the live registry.
///
/// The deletion runs under the game's gate, so a command in flight either
/// completes before it or is refused after it and cannot write the game back.
pub async fn delete_game(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    let handle = live_game(state, id).await?;
    handle
        .retire(|| async move { Ok(store.delete_game(id).await?) })
        .await?;
    state
        .live_games()
        .remove_if(&id, |_, current| Arc::ptr_eq(current, &handle));

    info!(game_id = %id, "game deleted");
    Ok(())
}

/// Live handle for `id`, loading the game from storage on first access.
pub async fn live_game(state: &SharedState, id: Uuid) -> Result<Arc<LiveGameHandle>, ServiceError> {
    if let Some(handle) = state.live_games().get(&id) {
        return Ok(handle.value().clone());
    }

    let store = state.require_game_store().await?;
    let Some(header) = store.find_game(id).await? else {
        return Err(ServiceError::NotFound(format!("game `{id}` not found")));
    };
    let (players, clock, substitutions) = futures::try_join!(
        store.load_game_players(id),
        store.load_game_clock(id),
        store.load_substitutions(id),
    )?;

    debug!(game_id = %id, players = players.len(), "game loaded from storage");
    let game = LiveGame::from((header, players, clock, substitutions));

    // A concurrent loader may have won the race; keep whichever got in first.
    let handle = state
        .live_games()
        .entry(id)
        .or_insert_with(|| Arc::new(LiveGameHandle::new(game)))
        .value()
        .clone();
    Ok(handle)
}

/// Write every record of `game` to the store in one call.
pub async fn persist_live_game(
    store: Arc<dyn GameStore>,
    game: Arc<LiveGame>,
) -> Result<(), ServiceError> {
    store.save_live_game(game.to_record()).await?;
    Ok(())
}

fn rules_for(state: &SharedState, request: &CreateGameRequest) -> GameRules {
    let defaults = state.config().default_rules();
    GameRules {
        lineup: LineupRules {
            starters_required: request
                .starters_required
                .unwrap_or(defaults.lineup.starters_required),
        },
        period_length: request
            .period_length_seconds
            .map(Duration::from_secs)
            .unwrap_or(defaults.period_length),
        periods_per_game: request
            .periods_per_game
            .unwrap_or(defaults.periods_per_game),
    }
}
