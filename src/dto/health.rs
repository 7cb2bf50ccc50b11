use serde::Serialize;
use utoipa::ToSchema;

/// Body of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" or "degraded".
    pub status: &'static str,
    /// Games currently held in memory.
    pub live_games: usize,
}

impl HealthResponse {
    pub fn ok(live_games: usize) -> Self {
        Self {
            status: "ok",
            live_games,
        }
    }

    pub fn degraded(live_games: usize) -> Self {
        Self {
            status: "degraded",
            live_games,
        }
    }
}
