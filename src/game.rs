//! The world task: a fixed-rate tick loop that owns all simulation state.
//!
//! Client events arrive over a channel and are drained at the start of each
//! tick. Movement intents are queued and applied in arrival order so the
//! outcome never depends on network jitter between clients; everything else
//! applies during the drain. No other task ever touches `WorldState`.

use crate::config;
use crate::protocol::GameEvent;
use crate::state::{
    DropSnapshot, EnemySnapshot, HitEffect, Player, PlayerSnapshot, ResourceSnapshot, Vec2,
    WorldMap, WorldState, WorldUpdate,
};
use crate::systems::{combat, enemy, harvest, movement};
use crate::tuning::player::PlayerTuning;
use crate::utils::clock::now_ms;
use crate::world;

use rand::Rng;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

pub async fn world_task(
    mut input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    effect_tx: broadcast::Sender<HitEffect>,
) {
    let tuning = PlayerTuning::default();
    let mut state = world::bootstrap_state(&config::map_path());
    let mut tick: u64 = 0;

    // Drive the fixed-step simulation at the configured tick rate.
    let mut interval = tokio::time::interval(config::TICK_INTERVAL);

    loop {
        interval.tick().await;
        // One timestamp per tick; every system observes the same clock.
        let now = now_ms();

        while let Ok(ev) = input_rx.try_recv() {
            handle_event(&mut state, ev, now, &tuning, &effect_tx);
        }

        process_movement_queue(&mut state);
        harvest::update_respawns(&mut state.resources, now);
        harvest::cleanup_drops(&mut state.enemy_drops, now);
        update_players(&mut state, now, &tuning);
        enemy::update_enemies(
            &mut state.enemies,
            &mut state.players,
            &state.resources,
            state.world_size,
            now,
        );

        tick += 1;
        let _ = world_tx.send(snapshot(&state, tick, now));
    }
}

fn handle_event(
    state: &mut WorldState,
    ev: GameEvent,
    now: u64,
    tuning: &PlayerTuning,
    effect_tx: &broadcast::Sender<HitEffect>,
) {
    match ev {
        GameEvent::Join { player_id } => {
            let mut rng = rand::thread_rng();
            let x = rng.gen_range(0.0..state.world_size);
            let y = rng.gen_range(0.0..state.world_size);
            let name = format!("Player_{}", player_id % 10_000);
            state
                .players
                .insert(player_id, Player::spawn(player_id, name, x, y, tuning));
            info!(player_id, "player joined");
        }
        GameEvent::Leave { player_id } => {
            state.players.remove(&player_id);
            // Drop any intents still queued for the departed player.
            state.movement_queue.retain(|(id, _)| *id != player_id);
            info!(player_id, "player left");
        }
        GameEvent::SetName { player_id, name } => {
            if let Some(player) = state.players.get_mut(&player_id) {
                let name = sanitize_name(&name);
                info!(player_id, name = %name, "display name set");
                player.name = name;
            }
        }
        GameEvent::Input { player_id, dir } => {
            state.movement_queue.push_back((player_id, dir));
        }
        GameEvent::Facing { player_id, dir } => {
            if let Some(player) = state.players.get_mut(&player_id) {
                let dir = dir.normalized();
                if dir != Vec2::ZERO {
                    player.facing = dir;
                }
            }
        }
        GameEvent::Action { player_id, dir } => {
            if let Some(effect) = combat::handle_player_action(state, player_id, dir, now) {
                let _ = effect_tx.send(effect);
            }
        }
        GameEvent::Harvest {
            player_id,
            target_id,
        } => {
            harvest::harvest_by_id(state, player_id, target_id, now);
        }
        GameEvent::SaveMap {
            player_id,
            chunks,
            reply,
        } => {
            info!(player_id, chunks = chunks.len(), "map save requested");
            let map = Arc::new(WorldMap { chunks });
            state.world = map.clone();

            // File I/O stays off the tick; the requester gets the outcome
            // through the oneshot.
            let path = config::map_path();
            tokio::spawn(async move {
                let result = world::save_map(&path, &map)
                    .await
                    .map_err(|e| e.to_string());
                if let Err(e) = &result {
                    warn!(path = %path.display(), error = %e, "map save failed");
                }
                let _ = reply.send(result);
            });
        }
    }
}

/// Display names are clamped to a sane length; empty input keeps nothing.
fn sanitize_name(name: &str) -> String {
    name.trim().chars().take(32).collect()
}

/// Applies queued movement intents in arrival order.
fn process_movement_queue(state: &mut WorldState) {
    let WorldState {
        players,
        resources,
        world_size,
        movement_queue,
        ..
    } = state;

    while let Some((player_id, dir)) = movement_queue.pop_front() {
        if let Some(player) = players.get_mut(&player_id) {
            movement::apply_player_movement(player, dir, *world_size, resources);
        }
    }
}

/// Tick-driven health regeneration and death/respawn handling. Regeneration
/// is a pure elapsed-time computation: damage stamps the interruption, and
/// once the quiet delay passes the player heals on the heal-tick cadence
/// until full.
fn update_players(state: &mut WorldState, now: u64, tuning: &PlayerTuning) {
    let world_size = state.world_size;
    let mut rng = rand::thread_rng();

    for player in state.players.values_mut() {
        if !player.alive {
            if player.respawn_at_ms == 0 {
                player.respawn_at_ms = now + tuning.respawn_delay_ms;
            } else if now >= player.respawn_at_ms {
                player.x = rng.gen_range(0.0..world_size);
                player.y = rng.gen_range(0.0..world_size);
                player.hp = player.hp_max;
                player.alive = true;
                player.respawn_at_ms = 0;
                player.last_damage_ms = now;
                player.last_heal_ms = now;
                info!(player_id = player.id, "player respawned");
            }
            continue;
        }

        if player.hp < player.hp_max
            && now.saturating_sub(player.last_damage_ms) >= tuning.regen_delay_ms
            && now.saturating_sub(player.last_heal_ms) >= tuning.heal_tick_ms
        {
            player.heal(tuning.heal_amount);
            player.last_heal_ms = now;
        }
    }
}

fn snapshot(state: &WorldState, tick: u64, now: u64) -> WorldUpdate {
    WorldUpdate {
        tick,
        now_ms: now,
        players: state.players.values().map(PlayerSnapshot::from).collect(),
        enemies: state.enemies.iter().map(EnemySnapshot::from).collect(),
        resources: state
            .resources
            .iter()
            .map(|r| ResourceSnapshot::capture(r, now))
            .collect(),
        enemy_drops: state
            .enemy_drops
            .iter()
            .filter(|d| !d.collected)
            .map(DropSnapshot::from)
            .collect(),
        world: state.world.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};

    fn state_with_player(id: u64) -> WorldState {
        let tuning = PlayerTuning::default();
        let mut players = HashMap::new();
        players.insert(
            id,
            Player::spawn(id, format!("p{id}"), 100.0, 100.0, &tuning),
        );
        WorldState {
            world: Arc::new(WorldMap::default()),
            world_size: 3200.0,
            players,
            enemies: Vec::new(),
            resources: Vec::new(),
            enemy_drops: Vec::new(),
            movement_queue: VecDeque::new(),
        }
    }

    #[test]
    fn regen_waits_for_the_quiet_delay_then_heals_to_full() {
        let tuning = PlayerTuning::default();
        let mut state = state_with_player(1);
        state.players.get_mut(&1).unwrap().take_damage(3.0, 0);

        // Before the delay: no healing.
        update_players(&mut state, 4_999, &tuning);
        assert_eq!(state.players[&1].hp, 97.0);

        // Delay elapsed: one heal pulse per heal tick.
        update_players(&mut state, 5_000, &tuning);
        assert_eq!(state.players[&1].hp, 98.0);
        update_players(&mut state, 5_500, &tuning);
        assert_eq!(state.players[&1].hp, 98.0);
        update_players(&mut state, 6_000, &tuning);
        assert_eq!(state.players[&1].hp, 99.0);
        update_players(&mut state, 7_000, &tuning);
        assert_eq!(state.players[&1].hp, 100.0);

        // Full: further pulses are no-ops.
        update_players(&mut state, 8_000, &tuning);
        assert_eq!(state.players[&1].hp, 100.0);
    }

    #[test]
    fn fresh_damage_interrupts_regen() {
        let tuning = PlayerTuning::default();
        let mut state = state_with_player(1);
        state.players.get_mut(&1).unwrap().take_damage(10.0, 0);

        update_players(&mut state, 5_000, &tuning);
        assert_eq!(state.players[&1].hp, 91.0);

        // New hit resets the quiet delay.
        state.players.get_mut(&1).unwrap().take_damage(1.0, 5_100);
        update_players(&mut state, 6_000, &tuning);
        assert_eq!(state.players[&1].hp, 90.0);
        update_players(&mut state, 10_100, &tuning);
        assert_eq!(state.players[&1].hp, 91.0);
    }

    #[test]
    fn dead_players_respawn_after_the_delay() {
        let tuning = PlayerTuning::default();
        let mut state = state_with_player(1);
        state.players.get_mut(&1).unwrap().take_damage(100.0, 0);
        assert!(!state.players[&1].alive);

        // First pass schedules the respawn.
        update_players(&mut state, 1_000, &tuning);
        assert!(!state.players[&1].alive);

        // Too early.
        update_players(&mut state, 2_000, &tuning);
        assert!(!state.players[&1].alive);

        update_players(&mut state, 1_000 + tuning.respawn_delay_ms, &tuning);
        let player = &state.players[&1];
        assert!(player.alive);
        assert_eq!(player.hp, player.hp_max);
    }

    #[test]
    fn movement_queue_drains_in_arrival_order_and_skips_ghosts() {
        let mut state = state_with_player(1);
        state.movement_queue.push_back((1, Vec2::new(1.0, 0.0)));
        state.movement_queue.push_back((99, Vec2::new(1.0, 0.0)));
        state.movement_queue.push_back((1, Vec2::new(1.0, 0.0)));

        process_movement_queue(&mut state);
        assert!(state.movement_queue.is_empty());
        // Two applied steps at speed 5; the unknown player id was ignored.
        assert_eq!(state.players[&1].x, 110.0);
    }

    #[test]
    fn snapshot_excludes_collected_drops() {
        let mut state = state_with_player(1);
        state.enemy_drops.push(crate::state::EnemyDrop {
            id: 5,
            item: "bone",
            x: 0.0,
            y: 0.0,
            quantity: 0,
            xp_reward: 5,
            owner_id: None,
            created_ms: 0,
            collected: true,
        });
        let update = snapshot(&state, 1, 100);
        assert!(update.enemy_drops.is_empty());
        assert_eq!(update.players.len(), 1);
    }
}
