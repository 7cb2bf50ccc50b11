use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

/// Header checked on mutating routes when an admin token is configured.
struct AdminToken;

impl Modify for AdminToken {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "admin_token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Admin-Token"))),
        );
    }
}

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Touchline Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::game_stream,
        crate::routes::games::list_games,
        crate::routes::games::create_game,
        crate::routes::games::get_game,
        crate::routes::games::delete_game,
        crate::routes::games::lineup,
        crate::routes::games::add_player,
        crate::routes::games::remove_player,
        crate::routes::games::toggle_starter,
        crate::routes::games::toggle_goalkeeper,
        crate::routes::games::toggle_bench,
        crate::routes::games::toggle_player_status,
        crate::routes::live::clock,
        crate::routes::live::start_period,
        crate::routes::live::pause,
        crate::routes::live::resume,
        crate::routes::live::end_period,
        crate::routes::live::pending_substitutions,
        crate::routes::live::propose_substitution,
        crate::routes::live::confirm_substitution,
        crate::routes::live::cancel_substitution,
        crate::routes::live::toggle_substitution,
        crate::routes::live::record_stat,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::RosterPlayerInput,
            crate::dto::game::GameSummary,
            crate::dto::game::GameView,
            crate::dto::game::RulesView,
            crate::dto::game::ClockView,
            crate::dto::game::PlayerView,
            crate::dto::game::SubstitutionView,
            crate::dto::game::LineupReport,
            crate::dto::commands::StartPeriodRequest,
            crate::dto::commands::PlayerStatusRequest,
            crate::dto::commands::ProposeSubstitutionRequest,
            crate::dto::commands::SubToggleRequest,
            crate::dto::commands::SubToggleAction,
            crate::dto::commands::SubToggleResponse,
            crate::dto::commands::StatRequest,
            crate::state::clock::ClockStatus,
            crate::state::player::FieldStatus,
            crate::state::player::Unavailability,
            crate::state::player::StatKind,
        )
    ),
    modifiers(&AdminToken),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "games", description = "Game management and lineup selection"),
        (name = "clock", description = "Game clock"),
        (name = "substitutions", description = "Pending and applied substitutions"),
        (name = "stats", description = "Per-game player counters"),
    )
)]
pub struct ApiDoc;
