/// OpenAPI documentation generation.
pub mod documentation;
/// Game creation, listing, deletion and loading into the live registry.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Lineup, clock, substitution and stat commands on live games.
pub mod live_service;
/// Server-Sent Events streams of live game snapshots.
pub mod sse_service;
/// Storage connection supervision and degraded-mode tracking.
pub mod storage_supervisor;
