//! Enemy AI: per-tick state machine plus the wander/chase/flee/attack
//! behaviors behind each state.

use crate::state::{AiState, Enemy, Player, Resource, Vec2};
use crate::systems::movement::{
    clamp_to_world, dist_sq, entity_radius, resolve_axis_separated,
};
use crate::tuning::enemy::{PLAYER_BLOCK_RANGE_SQ, SpeciesParams, WANDER_TURN_CHANCE};

use rand::Rng;
use std::collections::HashMap;
use tracing::debug;

/// Lateral weight of a dodge sidestep relative to the approach vector.
const DODGE_SIDESTEP: f32 = 0.75;

/// Pure transition table. Passive species only ever flee or idle; predators
/// escalate IDLE -> CHASE -> ATTACK and fall back on range.
pub fn next_state(state: AiState, dist_sq: f32, params: &SpeciesParams) -> AiState {
    if params.passive {
        return if dist_sq < params.flee_range_sq {
            AiState::Flee
        } else {
            AiState::Idle
        };
    }

    match state {
        AiState::Idle => {
            if dist_sq < params.hunt_range_sq {
                AiState::Chase
            } else {
                AiState::Idle
            }
        }
        AiState::Chase => {
            if dist_sq < params.attack_range_sq {
                AiState::Attack
            } else if dist_sq > params.hunt_range_sq {
                AiState::Idle
            } else {
                AiState::Chase
            }
        }
        AiState::Attack => {
            if dist_sq > params.attack_range_sq {
                AiState::Chase
            } else {
                AiState::Attack
            }
        }
        // Predators never enter FLEE; normalize stray state back to idle.
        AiState::Flee => AiState::Idle,
    }
}

fn find_closest_player(enemy: &Enemy, players: &HashMap<u64, Player>) -> Option<(u64, f32)> {
    let mut closest = None;
    let mut best = f32::INFINITY;

    for p in players.values().filter(|p| p.alive) {
        let d = dist_sq(enemy.x, enemy.y, p.x, p.y);
        if d < best {
            best = d;
            closest = Some(p.id);
        }
    }

    closest.map(|id| (id, best))
}

/// Runs every enemy's brain for one tick. Skipped entirely while no player
/// is alive, matching the rest of the per-tick pipeline.
pub fn update_enemies(
    enemies: &mut [Enemy],
    players: &mut HashMap<u64, Player>,
    resources: &[Resource],
    world_size: f32,
    now_ms: u64,
) {
    if !players.values().any(|p| p.alive) {
        return;
    }

    for enemy in enemies.iter_mut() {
        let Some((target_id, best)) = find_closest_player(enemy, players) else {
            continue;
        };

        let params = enemy.species.params();
        enemy.state = next_state(enemy.state, best, params);

        match enemy.state {
            AiState::Idle => wander(enemy, players, resources),
            AiState::Chase => {
                let (tx, ty, hp_ratio) = match players.get(&target_id) {
                    Some(t) => (t.x, t.y, t.hp / t.hp_max),
                    None => continue,
                };
                chase(enemy, tx, ty, hp_ratio, resources);
            }
            AiState::Attack => {
                if let Some(target) = players.get_mut(&target_id) {
                    try_attack(enemy, target, now_ms);
                }
            }
            AiState::Flee => {
                let (tx, ty) = match players.get(&target_id) {
                    Some(t) => (t.x, t.y),
                    None => continue,
                };
                flee(enemy, tx, ty, resources);
            }
        }

        let radius = entity_radius(params.size);
        let (x, y) = clamp_to_world(enemy.x, enemy.y, radius, world_size);
        enemy.x = x;
        enemy.y = y;
    }
}

/// Slowly-drifting random walk. The heading is re-rolled with a small
/// per-tick probability; a step that would land inside a player's personal
/// space is skipped outright.
fn wander(enemy: &mut Enemy, players: &HashMap<u64, Player>, resources: &[Resource]) {
    let params = enemy.species.params();
    let mut rng = rand::thread_rng();

    if enemy.wander_dir.is_none() || rng.gen_range(0.0..1.0) < WANDER_TURN_CHANCE {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        enemy.wander_dir = Some(Vec2::new(angle.cos(), angle.sin()));
    }
    let dir = enemy.wander_dir.unwrap_or(Vec2::ZERO);

    let new_x = enemy.x + dir.x * params.wander_speed;
    let new_y = enemy.y + dir.y * params.wander_speed;

    for p in players.values().filter(|p| p.alive) {
        if dist_sq(new_x, new_y, p.x, p.y) <= PLAYER_BLOCK_RANGE_SQ {
            return;
        }
    }

    let radius = entity_radius(params.size);
    let (x, y) = resolve_axis_separated(enemy.x, enemy.y, new_x, new_y, radius, resources);
    enemy.x = x;
    enemy.y = y;
}

/// Moves straight at the target. Two optional species traits layer on top:
/// a speed bonus against wounded targets and a probabilistic sidestep that
/// skews the approach vector.
fn chase(enemy: &mut Enemy, target_x: f32, target_y: f32, target_hp_ratio: f32, resources: &[Resource]) {
    let params = enemy.species.params();
    let mut rng = rand::thread_rng();

    let mut speed = params.chase_speed;
    if let Some(multiplier) = params.low_health_speed_bonus {
        if target_hp_ratio < 0.5 {
            speed *= multiplier;
        }
    }

    let angle = (target_y - enemy.y).atan2(target_x - enemy.x);
    let mut dir = Vec2::new(angle.cos(), angle.sin());
    if let Some(chance) = params.dodge_chance {
        if rng.gen_range(0.0..1.0) < chance {
            let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            dir = Vec2::new(
                dir.x - dir.y * side * DODGE_SIDESTEP,
                dir.y + dir.x * side * DODGE_SIDESTEP,
            )
            .normalized();
        }
    }

    let new_x = enemy.x + dir.x * speed;
    let new_y = enemy.y + dir.y * speed;
    let radius = entity_radius(params.size);
    let (x, y) = resolve_axis_separated(enemy.x, enemy.y, new_x, new_y, radius, resources);
    enemy.x = x;
    enemy.y = y;
}

/// Moves directly away from the threatening player.
fn flee(enemy: &mut Enemy, threat_x: f32, threat_y: f32, resources: &[Resource]) {
    let params = enemy.species.params();

    let angle = (enemy.y - threat_y).atan2(enemy.x - threat_x);
    let new_x = enemy.x + angle.cos() * params.flee_speed;
    let new_y = enemy.y + angle.sin() * params.flee_speed;

    let radius = entity_radius(params.size);
    let (x, y) = resolve_axis_separated(enemy.x, enemy.y, new_x, new_y, radius, resources);
    enemy.x = x;
    enemy.y = y;
}

/// Melee swing, gated by the species cooldown.
fn try_attack(enemy: &mut Enemy, target: &mut Player, now_ms: u64) {
    let params = enemy.species.params();
    if now_ms.saturating_sub(enemy.last_attack_ms) < params.attack_cooldown_ms {
        return;
    }

    enemy.last_attack_ms = now_ms;
    let died = target.take_damage(params.attack_damage, now_ms);
    debug!(
        enemy_id = enemy.id,
        species = enemy.species.as_str(),
        player_id = target.id,
        player_hp = target.hp,
        "enemy attack landed"
    );
    if died {
        debug!(player_id = target.id, "player downed");
    }
}
