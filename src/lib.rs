pub mod config;
pub mod game;
pub mod net;
pub mod protocol;
pub mod state;
pub mod systems;
pub mod tuning;
pub mod utils;
pub mod world;

use crate::net::ws_handler;
use crate::protocol::GameEvent;
use crate::state::{AppState, HitEffect, WorldUpdate};

use axum::{Router, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

/// Wires the channels, spawns the world task and serves the WebSocket
/// endpoint on the provided listener until the server shuts down.
pub async fn run(listener: TcpListener) -> std::io::Result<()> {
    // input_tx/rx: All client intents go to the single World Task.
    let (input_tx, input_rx) = mpsc::channel::<GameEvent>(config::INPUT_CHANNEL_CAPACITY);

    // world_tx/rx: Per-tick snapshots are broadcast to all connections.
    let (world_tx, _world_rx) = broadcast::channel::<WorldUpdate>(config::WORLD_BROADCAST_CAPACITY);

    // effect_tx/rx: Transient hit/gather effects, broadcast as they happen.
    let (effect_tx, _effect_rx) =
        broadcast::channel::<HitEffect>(config::EFFECT_BROADCAST_CAPACITY);

    let state = Arc::new(AppState {
        input_tx,
        world_tx: world_tx.clone(),
        effect_tx: effect_tx.clone(),
    });

    // Spawn the Game Loop (World Task). It owns all world state for the
    // lifetime of the process.
    tokio::spawn(game::world_task(input_rx, world_tx, effect_tx));

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state);

    axum::serve(listener, app).await
}
