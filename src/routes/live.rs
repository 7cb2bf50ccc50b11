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
        commands::{
            ProposeSubstitutionRequest, StartPeriodRequest, StatRequest, SubToggleRequest,
            SubToggleResponse,
        },
        game::{ClockView, PlayerView, SubstitutionView},
    },
    error::AppError,
    services::live_service,
    state::SharedState,
};

/// In-game endpoints: clock, substitutions and stats.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games/{id}/clock", get(clock))
        .route("/games/{id}/clock/start", post(start_period))
        .route("/games/{id}/clock/pause", post(pause))
        .route("/games/{id}/clock/resume", post(resume))
        .route("/games/{id}/clock/end", post(end_period))
        .route(
            "/games/{id}/substitutions",
            get(pending_substitutions).post(propose_substitution),
        )
        .route(
            "/games/{id}/substitutions/{sub_id}/confirm",
            post(confirm_substitution),
        )
        .route(
            "/games/{id}/substitutions/{sub_id}",
            delete(cancel_substitution),
        )
        .route("/games/{id}/players/{player_id}/sub", post(toggle_substitution))
        .route("/games/{id}/players/{player_id}/stats", post(record_stat))
}

#[utoipa::path(
    get,
    path = "/games/{id}/clock",
    tag = "clock",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Current clock", body = ClockView))
)]
pub async fn clock(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClockView>, AppError> {
    Ok(Json(live_service::clock(&state, id).await?))
}

/// Start a period. Period 1 validates and commits the lineup.
#[utoipa::path(
    post,
    path = "/games/{id}/clock/start",
    tag = "clock",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = StartPeriodRequest,
    responses(
        (status = 200, description = "Period started", body = ClockView),
        (status = 409, description = "Clock not startable or lineup incomplete")
    )
)]
pub async fn start_period(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<StartPeriodRequest>>,
) -> Result<Json<ClockView>, AppError> {
    Ok(Json(live_service::start_period(&state, id, payload.period).await?))
}

#[utoipa::path(
    post,
    path = "/games/{id}/clock/pause",
    tag = "clock",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Clock paused", body = ClockView), (status = 409, description = "Clock not running"))
)]
pub async fn pause(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClockView>, AppError> {
    Ok(Json(live_service::pause(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/games/{id}/clock/resume",
    tag = "clock",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Clock resumed", body = ClockView), (status = 409, description = "Clock not paused"))
)]
pub async fn resume(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClockView>, AppError> {
    Ok(Json(live_service::resume(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/games/{id}/clock/end",
    tag = "clock",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Period ended", body = ClockView), (status = 409, description = "No period in progress"))
)]
pub async fn end_period(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClockView>, AppError> {
    Ok(Json(live_service::end_period(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/games/{id}/substitutions",
    tag = "substitutions",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Pending substitutions, oldest first", body = [SubstitutionView]))
)]
pub async fn pending_substitutions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SubstitutionView>>, AppError> {
    Ok(Json(live_service::pending_substitutions(&state, id).await?))
}

/// Queue a substitution; both players are marked as subbing until it is resolved.
#[utoipa::path(
    post,
    path = "/games/{id}/substitutions",
    tag = "substitutions",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = ProposeSubstitutionRequest,
    responses(
        (status = 201, description = "Substitution pending", body = SubstitutionView),
        (status = 409, description = "Player not eligible or already pending")
    )
)]
pub async fn propose_substitution(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProposeSubstitutionRequest>,
) -> Result<(StatusCode, Json<SubstitutionView>), AppError> {
    let sub = live_service::propose_substitution(&state, id, payload).await?;
    Ok((StatusCode::CREATED, Json(sub)))
}

#[utoipa::path(
    post,
    path = "/games/{id}/substitutions/{sub_id}/confirm",
    tag = "substitutions",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("sub_id" = Uuid, Path, description = "Pending substitution identifier")
    ),
    responses((status = 200, description = "Substitution applied", body = SubstitutionView), (status = 404, description = "Unknown substitution"))
)]
pub async fn confirm_substitution(
    State(state): State<SharedState>,
    Path((id, sub_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SubstitutionView>, AppError> {
    Ok(Json(
        live_service::confirm_substitution(&state, id, sub_id).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/games/{id}/substitutions/{sub_id}",
    tag = "substitutions",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("sub_id" = Uuid, Path, description = "Pending substitution identifier")
    ),
    responses((status = 200, description = "Substitution cancelled", body = SubstitutionView), (status = 404, description = "Unknown substitution"))
)]
pub async fn cancel_substitution(
    State(state): State<SharedState>,
    Path((id, sub_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SubstitutionView>, AppError> {
    Ok(Json(
        live_service::cancel_substitution(&state, id, sub_id).await?,
    ))
}

/// "Sub" button: cancels the player's pending substitution, or proposes one with `partner_id`.
#[utoipa::path(
    post,
    path = "/games/{id}/players/{player_id}/sub",
    tag = "substitutions",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("player_id" = Uuid, Path, description = "Player the button was pressed on")
    ),
    request_body = SubToggleRequest,
    responses((status = 200, description = "Substitution proposed or cancelled", body = SubToggleResponse))
)]
pub async fn toggle_substitution(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
    payload: Option<Json<SubToggleRequest>>,
) -> Result<Json<SubToggleResponse>, AppError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    Ok(Json(
        live_service::toggle_substitution(&state, id, player_id, request.partner_id).await?,
    ))
}

/// Record a shot, goal or assist, or take one back with `undo`.
#[utoipa::path(
    post,
    path = "/games/{id}/players/{player_id}/stats",
    tag = "stats",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("player_id" = Uuid, Path, description = "Roster player identifier")
    ),
    request_body = StatRequest,
    responses((status = 200, description = "Updated player", body = PlayerView), (status = 409, description = "Game not kicked off"))
)]
pub async fn record_stat(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<StatRequest>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(
        live_service::record_stat(&state, id, player_id, payload).await?,
    ))
}
