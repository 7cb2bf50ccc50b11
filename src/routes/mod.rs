use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::{self, Next},
    response::Response,
};

use crate::{error::AppError, state::SharedState};

pub mod docs;
pub mod games;
pub mod health;
pub mod live;
pub mod sse;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let commands = games::router()
        .merge(live::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_token,
        ));

    health::router()
        .merge(sse::router())
        .merge(commands)
        .merge(docs::router())
        .with_state(state)
}

/// Reject mutating requests without the configured `X-Admin-Token`.
///
/// Reads are always allowed, and nothing is checked when no token is configured.
async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config().admin_token() else {
        return Ok(next.run(req).await);
    };
    if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return Ok(next.run(req).await);
    }

    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    if provided == expected {
        Ok(next.run(req).await)
    } else {
        Err(AppError::Unauthorized("invalid admin token".into()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{self, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{config::AppConfig, dao::game_store::memory::MemoryGameStore, state::AppState};

    async fn app(config: AppConfig) -> Router<()> {
        let state = AppState::new(config);
        state
            .set_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        router(state)
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn roster() -> Value {
        json!({
            "name": "U12 Home",
            "starters_required": 1,
            "players": [
                { "jersey_number": 1, "full_name": "Alex Keeper" },
                { "jersey_number": 12, "full_name": "Jo Bench" }
            ]
        })
    }

    #[tokio::test]
    async fn create_then_kick_off_over_http() {
        let app = app(AppConfig::default()).await;

        let response = app.clone().oneshot(post("/games", roster())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let game = json_body(response).await;
        let id = game["id"].as_str().unwrap().to_owned();
        let keeper = game["players"][0]["player_id"].as_str().unwrap().to_owned();

        let response = app
            .clone()
            .oneshot(post(&format!("/games/{id}/clock/start"), json!({ "period": 1 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        for action in ["starter", "goalkeeper"] {
            let response = app
                .clone()
                .oneshot(post(
                    &format!("/games/{id}/players/{keeper}/{action}"),
                    json!({}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(post(&format!("/games/{id}/clock/start"), json!({ "period": 1 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "running");
    }

    #[tokio::test]
    async fn invalid_roster_is_a_bad_request() {
        let app = app(AppConfig::default()).await;
        let body = json!({
            "name": "U8",
            "players": [{ "jersey_number": 0, "full_name": "Nobody" }]
        });
        let response = app.oneshot(post("/games", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn configured_token_guards_mutations_only() {
        let app = app(AppConfig::default().with_admin_token("s3cret")).await;

        let response = app.clone().oneshot(post("/games", roster())).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut request = post("/games", roster());
        request
            .headers_mut()
            .insert(ADMIN_TOKEN_HEADER, "s3cret".parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let request = Request::builder().uri("/games").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
    }
}
