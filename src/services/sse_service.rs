use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        game::GameView,
        sse::{Handshake, ServerEvent, SystemStatus},
    },
    error::ServiceError,
    services::game_service,
    state::{SharedState, live_game::LiveGame},
};

const EVENT_HANDSHAKE: &str = "handshake";
const EVENT_GAME_UPDATED: &str = "game.updated";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Receivers feeding one game's SSE stream.
pub struct GameSubscription {
    game_id: Uuid,
    games: watch::Receiver<Arc<LiveGame>>,
    degraded: watch::Receiver<bool>,
}

/// Subscribe to the published snapshots of `game_id`, loading it if needed.
pub async fn subscribe_game(
    state: &SharedState,
    game_id: Uuid,
) -> Result<GameSubscription, ServiceError> {
    let handle = game_service::live_game(state, game_id).await?;
    Ok(GameSubscription {
        game_id,
        games: handle.subscribe(),
        degraded: state.degraded_watcher(),
    })
}

/// Spawn the task turning snapshot and degraded-mode changes into events.
///
/// The client first receives a handshake and the current game, then one
/// `game.updated` per published command. The task stops once the receiver
/// is dropped or the game leaves the live registry.
pub fn spawn_forwarder(
    state: SharedState,
    subscription: GameSubscription,
) -> mpsc::Receiver<ServerEvent> {
    let GameSubscription {
        game_id,
        mut games,
        mut degraded,
    } = subscription;
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<ServerEvent>(8);

    tokio::spawn(async move {
        let handshake = Handshake {
            game_id,
            message: format!("subscribed to game {game_id}"),
            degraded: *degraded.borrow_and_update(),
        };
        let snapshot = games.borrow_and_update().clone();
        let opening = [
            to_event(EVENT_HANDSHAKE, &handshake),
            game_updated(&state, &snapshot),
        ];
        for event in opening.into_iter().flatten() {
            if tx.send(event).await.is_err() {
                return;
            }
        }

        loop {
            let event = tokio::select! {
                _ = tx.closed() => break,
                changed = games.changed() => {
                    if changed.is_err() {
                        debug!(%game_id, "game left the live registry; closing stream");
                        break;
                    }
                    let snapshot = games.borrow_and_update().clone();
                    game_updated(&state, &snapshot)
                }
                changed = degraded.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let degraded = *degraded.borrow_and_update();
                    to_event(EVENT_SYSTEM_STATUS, &SystemStatus { degraded })
                }
            };

            if let Some(event) = event
                && tx.send(event).await.is_err()
            {
                break;
            }
        }

        info!(%game_id, "game SSE stream disconnected");
    });

    rx
}

/// Wrap forwarded events into an SSE response with keep-alive comments.
pub fn to_sse_stream(
    receiver: mpsc::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = ReceiverStream::new(receiver).map(|payload| {
        let mut event = Event::default().data(payload.data);
        if let Some(name) = payload.event {
            event = event.event(name);
        }
        Ok(event)
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn game_updated(state: &SharedState, game: &LiveGame) -> Option<ServerEvent> {
    let view = GameView::from((game, state.now()));
    to_event(EVENT_GAME_UPDATED, &view)
}

fn to_event<T: Serialize>(name: &str, payload: &T) -> Option<ServerEvent> {
    match ServerEvent::json(Some(name.to_owned()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event = name, error = %err, "failed to serialise SSE payload");
            None
        }
    }
}
