use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        commands::PlayerStatusRequest,
        game::{CreateGameRequest, GameSummary, GameView, LineupReport, PlayerView, RosterPlayerInput},
    },
    error::AppError,
    services::{game_service, live_service},
    state::SharedState,
};

/// Game management and pre-kickoff lineup selection.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", get(list_games).post(create_game))
        .route("/games/{id}", get(get_game).delete(delete_game))
        .route("/games/{id}/lineup", get(lineup))
        .route("/games/{id}/players", post(add_player))
        .route("/games/{id}/players/{player_id}", delete(remove_player))
        .route("/games/{id}/players/{player_id}/starter", post(toggle_starter))
        .route(
            "/games/{id}/players/{player_id}/goalkeeper",
            post(toggle_goalkeeper),
        )
        .route("/games/{id}/players/{player_id}/bench", post(toggle_bench))
        .route(
            "/games/{id}/players/{player_id}/status",
            post(toggle_player_status),
        )
}

/// List persisted games, oldest first.
#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    responses(
        (status = 200, description = "Known games", body = [GameSummary]),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn list_games(State(state): State<SharedState>) -> Result<Json<Vec<GameSummary>>, AppError> {
    Ok(Json(game_service::list_games(&state).await?))
}

/// Create a game together with its roster.
#[utoipa::path(
    post,
    path = "/games",
    tag = "games",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game created", body = GameView),
        (status = 400, description = "Invalid roster or rules")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<(StatusCode, Json<GameView>), AppError> {
    let game = game_service::create_game(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Players, clock and pending substitutions", body = GameView),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(game_service::get_game(&state, id).await?))
}

#[utoipa::path(
    delete,
    path = "/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 204, description = "Game deleted"), (status = 404, description = "Unknown game"))
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    game_service::delete_game(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Check the current selection against the game's lineup rules.
#[utoipa::path(
    get,
    path = "/games/{id}/lineup",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Lineup validation", body = LineupReport))
)]
pub async fn lineup(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LineupReport>, AppError> {
    Ok(Json(live_service::lineup_report(&state, id).await?))
}

/// Register an extra roster player before kickoff.
#[utoipa::path(
    post,
    path = "/games/{id}/players",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = RosterPlayerInput,
    responses(
        (status = 201, description = "Player added", body = PlayerView),
        (status = 400, description = "Duplicate id or jersey number"),
        (status = 409, description = "Game already kicked off")
    )
)]
pub async fn add_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<RosterPlayerInput>>,
) -> Result<(StatusCode, Json<PlayerView>), AppError> {
    let player = live_service::add_player(&state, id, payload).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

#[utoipa::path(
    delete,
    path = "/games/{id}/players/{player_id}",
    tag = "games",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("player_id" = Uuid, Path, description = "Roster player identifier")
    ),
    responses((status = 204, description = "Player removed"), (status = 409, description = "Game already kicked off"))
)]
pub async fn remove_player(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    live_service::remove_player(&state, id, player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add the player to the starters, or take them out again.
#[utoipa::path(
    post,
    path = "/games/{id}/players/{player_id}/starter",
    tag = "games",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("player_id" = Uuid, Path, description = "Roster player identifier")
    ),
    responses((status = 200, description = "Updated player", body = PlayerView), (status = 409, description = "Not selectable"))
)]
pub async fn toggle_starter(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(live_service::toggle_starter(&state, id, player_id).await?))
}

/// Designate the starting goalkeeper; the previous one becomes a plain starter.
#[utoipa::path(
    post,
    path = "/games/{id}/players/{player_id}/goalkeeper",
    tag = "games",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("player_id" = Uuid, Path, description = "Roster player identifier")
    ),
    responses((status = 200, description = "Updated player", body = PlayerView), (status = 409, description = "Not a starter"))
)]
pub async fn toggle_goalkeeper(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(live_service::toggle_goalkeeper(&state, id, player_id).await?))
}

#[utoipa::path(
    post,
    path = "/games/{id}/players/{player_id}/bench",
    tag = "games",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("player_id" = Uuid, Path, description = "Roster player identifier")
    ),
    responses((status = 200, description = "Updated player", body = PlayerView), (status = 409, description = "Not selectable"))
)]
pub async fn toggle_bench(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(live_service::toggle_bench(&state, id, player_id).await?))
}

/// Mark the player unavailable or injured, or clear the mark.
#[utoipa::path(
    post,
    path = "/games/{id}/players/{player_id}/status",
    tag = "games",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("player_id" = Uuid, Path, description = "Roster player identifier")
    ),
    request_body = PlayerStatusRequest,
    responses((status = 200, description = "Updated player", body = PlayerView), (status = 409, description = "Player on the field"))
)]
pub async fn toggle_player_status(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<PlayerStatusRequest>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(
        live_service::toggle_player_status(&state, id, player_id, payload.reason).await?,
    ))
}
