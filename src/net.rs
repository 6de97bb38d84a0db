//! WebSocket connection lifecycle: handshake, client event dispatch and
//! per-recipient fan-out of world snapshots and hit effects.

use crate::protocol::{
    ClientMessage, GameEvent, MapSaveResultDto, ServerMessage, StateDto,
};
use crate::state::{AppState, HitEffect, WorldUpdate};
use crate::utils::rng::rand_id;

use axum::{
    Error,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::sink::SinkExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// How long a connection waits for the world task to confirm a map save.
const SAVE_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

// Categorizes connection lifecycle failures so callers can decide policy.
#[derive(Debug)]
enum NetError {
    Ws(axum::Error),
    Serialization(serde_json::Error),
    InputClosed,
    WorldUpdatesClosed,
    EffectsClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // The connection identity doubles as the player id; clients never pick
    // their own, which keeps every intent bound to the issuing connection.
    let player_id = rand_id();
    let span = info_span!("conn", player_id);
    run_connection(socket, state, player_id).instrument(span).await;
}

async fn run_connection(mut socket: WebSocket, state: Arc<AppState>, player_id: u64) {
    let mut ctx = match bootstrap_connection(&mut socket, &state, player_id).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = socket.close().await;
            return;
        }
    };

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "connection closed with error");
    }
}

struct ConnCtx {
    player_id: u64,
    input_tx: mpsc::Sender<GameEvent>,
    world_rx: broadcast::Receiver<WorldUpdate>,
    effect_rx: broadcast::Receiver<HitEffect>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
    player_id: u64,
) -> Result<ConnCtx, NetError> {
    // Subscribe to updates *before* doing anything else (awaits) to not miss packets.
    let world_rx = state.world_tx.subscribe();
    let effect_rx = state.effect_tx.subscribe();

    // Tell the client "This is who you are".
    send_message(socket, &ServerMessage::Identity { player_id }).await?;

    // Tell the game loop to spawn an avatar for this id. The next tick's
    // snapshot will include the new player.
    state
        .input_tx
        .send(GameEvent::Join { player_id })
        .await
        .map_err(|_| NetError::InputClosed)?;

    info!("connection bootstrapped");

    Ok(ConnCtx {
        player_id,
        input_tx: state.input_tx.clone(),
        world_rx,
        effect_rx,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;
    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming message from the client.
            incoming = socket.recv() => {
                match handle_incoming(incoming, socket, player_id, &ctx.input_tx).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing world snapshot, filtered for this recipient.
            world_msg = ctx.world_rx.recv() => {
                match world_msg {
                    Ok(update) => {
                        match forward_world_update(&update, socket, player_id).await {
                            LoopControl::Continue => false,
                            LoopControl::Disconnect => true,
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Snapshots supersede each other; skipping ahead to
                        // the latest is safe.
                        warn!(missed = n, "world updates lagged");
                        false
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }

            // Outgoing transient hit effect.
            effect = ctx.effect_rx.recv() => {
                match effect {
                    Ok(effect) => {
                        match forward_effect(effect, socket).await {
                            LoopControl::Continue => false,
                            LoopControl::Disconnect => true,
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => false,
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::EffectsClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Err(e) = socket.close().await {
                debug!(error = %e, "error closing socket");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(ctx).await {
        warn!(error = ?e, "error cleaning up connection");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn handle_incoming(
    incoming: Option<Result<Message, Error>>,
    socket: &mut WebSocket,
    player_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
            Ok(msg) => dispatch_client_message(msg, socket, player_id, input_tx).await,
            Err(e) => {
                // One bad payload never takes down the connection.
                warn!(error = %e, "ignoring malformed client message");
                Ok(LoopControl::Continue)
            }
        },
        Some(Ok(Message::Close(_))) => Ok(LoopControl::Disconnect),
        // Ping/Pong and binary frames are ignored.
        Some(Ok(_)) => Ok(LoopControl::Continue),
        Some(Err(e)) => {
            debug!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => Ok(LoopControl::Disconnect),
    }
}

async fn dispatch_client_message(
    msg: ClientMessage,
    socket: &mut WebSocket,
    player_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
) -> Result<LoopControl, NetError> {
    match msg {
        ClientMessage::PlayerJoin(payload) => {
            send_event(
                input_tx,
                GameEvent::SetName {
                    player_id,
                    name: payload.name,
                },
            )
            .await
        }
        ClientMessage::PlayerInput(dir) => {
            // Movement intents are high-rate: drop on a full queue rather
            // than stalling the socket.
            match input_tx.try_send(GameEvent::Input {
                player_id,
                dir: dir.into(),
            }) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("input queue full, dropping movement intent");
                    Ok(LoopControl::Continue)
                }
                Err(mpsc::error::TrySendError::Closed(_)) => Err(NetError::InputClosed),
            }
        }
        ClientMessage::PlayerFacingDirection(dir) => {
            send_event(
                input_tx,
                GameEvent::Facing {
                    player_id,
                    dir: dir.into(),
                },
            )
            .await
        }
        ClientMessage::PlayerAction(action) => {
            // Attack and interact share one resolution path; only the
            // direction matters to the simulation.
            send_event(
                input_tx,
                GameEvent::Action {
                    player_id,
                    dir: action.direction.into(),
                },
            )
            .await
        }
        ClientMessage::HarvestResource(payload) => {
            send_event(
                input_tx,
                GameEvent::Harvest {
                    player_id,
                    target_id: payload.id,
                },
            )
            .await
        }
        ClientMessage::SaveMap(payload) => {
            let (reply_tx, reply_rx) = oneshot::channel();
            send_event(
                input_tx,
                GameEvent::SaveMap {
                    player_id,
                    chunks: payload.chunks,
                    reply: reply_tx,
                },
            )
            .await?;

            // The outcome goes to this connection only.
            let result = match timeout(SAVE_REPLY_TIMEOUT, reply_rx).await {
                Ok(Ok(Ok(()))) => MapSaveResultDto {
                    success: true,
                    message: "map saved".to_string(),
                },
                Ok(Ok(Err(e))) => MapSaveResultDto {
                    success: false,
                    message: e,
                },
                _ => MapSaveResultDto {
                    success: false,
                    message: "save timed out".to_string(),
                },
            };
            send_message(socket, &ServerMessage::MapSaveResult(result)).await?;
            Ok(LoopControl::Continue)
        }
    }
}

async fn send_event(
    input_tx: &mpsc::Sender<GameEvent>,
    event: GameEvent,
) -> Result<LoopControl, NetError> {
    input_tx
        .send(event)
        .await
        .map_err(|_| NetError::InputClosed)?;
    Ok(LoopControl::Continue)
}

async fn forward_world_update(
    update: &WorldUpdate,
    socket: &mut WebSocket,
    player_id: u64,
) -> LoopControl {
    // Serialization happens per connection because drop visibility depends
    // on the recipient.
    let msg = ServerMessage::State(StateDto::for_viewer(update, player_id));
    if send_message(socket, &msg).await.is_err() {
        LoopControl::Disconnect
    } else {
        LoopControl::Continue
    }
}

async fn forward_effect(effect: HitEffect, socket: &mut WebSocket) -> LoopControl {
    let msg = ServerMessage::HitEffect(effect.into());
    if send_message(socket, &msg).await.is_err() {
        LoopControl::Disconnect
    } else {
        LoopControl::Continue
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage<'_>) -> Result<(), NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)
}

async fn disconnect_cleanup(ctx: &mut ConnCtx) -> Result<(), NetError> {
    // Removing the player is the only cleanup the simulation needs; regen
    // and respawn are tick-driven state on the player record itself.
    ctx.input_tx
        .send(GameEvent::Leave {
            player_id: ctx.player_id,
        })
        .await
        .map_err(|_| NetError::InputClosed)?;
    info!("client disconnected");
    Ok(())
}
