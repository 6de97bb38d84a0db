//! Swing resolution: hit-point targeting, enemy damage, loot generation.

use crate::state::{Enemy, EnemyDrop, HitEffect, HitEffectKind, Player, Resource, Vec2, WorldState};
use crate::systems::harvest;
use crate::systems::movement::dist_sq;
use crate::tuning::enemy::Species;
use crate::utils::rng::rand_id;

use rand::Rng;
use tracing::info;

/// How far in front of the player a swing lands.
pub const REACH: f32 = 40.0;

/// Hit windows around the hit point; enemies are easier to tag than nodes.
pub const ENEMY_HIT_RADIUS_SQ: f32 = 30.0 * 30.0;
pub const RESOURCE_HIT_RADIUS_SQ: f32 = 25.0 * 25.0;

/// Drops scatter up to this far from the kill point on each axis.
const DROP_JITTER: f32 = 10.0;

/// Resolves a directional swing for a player. The client supplies only a
/// direction; reach and hit radii are enforced here. Enemies are checked
/// first, environment resources second. Returns the visual cue to broadcast
/// when something was hit.
pub fn handle_player_action(
    state: &mut WorldState,
    player_id: u64,
    direction: Vec2,
    now_ms: u64,
) -> Option<HitEffect> {
    let WorldState {
        players,
        enemies,
        resources,
        enemy_drops,
        ..
    } = state;

    let player = players.get_mut(&player_id)?;
    if !player.alive {
        return None;
    }

    // Server-side swing rate limit.
    if now_ms.saturating_sub(player.last_attack_ms) < player.attack_cooldown_ms {
        return None;
    }
    player.last_attack_ms = now_ms;

    let dir = direction.normalized();
    let hit_x = player.x + dir.x * REACH;
    let hit_y = player.y + dir.y * REACH;

    if let Some(idx) = nearest_enemy_within(enemies, hit_x, hit_y, ENEMY_HIT_RADIUS_SQ) {
        attack_enemy(player, enemies, idx, enemy_drops, now_ms);
        return Some(HitEffect {
            x: hit_x,
            y: hit_y,
            kind: HitEffectKind::Combat,
        });
    }

    if let Some(idx) = nearest_resource_within(resources, hit_x, hit_y, RESOURCE_HIT_RADIUS_SQ) {
        if harvest::harvest_world_resource(player, &mut resources[idx], now_ms) {
            return Some(HitEffect {
                x: hit_x,
                y: hit_y,
                kind: HitEffectKind::Gather,
            });
        }
    }

    None
}

fn nearest_enemy_within(enemies: &[Enemy], x: f32, y: f32, radius_sq: f32) -> Option<usize> {
    let mut best = radius_sq;
    let mut found = None;
    for (idx, e) in enemies.iter().enumerate() {
        let d = dist_sq(x, y, e.x, e.y);
        if d < best {
            best = d;
            found = Some(idx);
        }
    }
    found
}

fn nearest_resource_within(resources: &[Resource], x: f32, y: f32, radius_sq: f32) -> Option<usize> {
    let mut best = radius_sq;
    let mut found = None;
    for (idx, r) in resources.iter().enumerate() {
        let d = dist_sq(x, y, r.x, r.y);
        if d < best {
            best = d;
            found = Some(idx);
        }
    }
    found
}

/// Applies one strike to an enemy. A kill removes it from the active set,
/// rolls its loot table into owned drops and awards XP to the striker.
/// Returns true when the enemy died.
pub fn attack_enemy(
    player: &mut Player,
    enemies: &mut Vec<Enemy>,
    idx: usize,
    drops: &mut Vec<EnemyDrop>,
    now_ms: u64,
) -> bool {
    // Weapon multiplier hook; bare hands for now.
    let damage = player.damage * 1.0;

    let enemy = &mut enemies[idx];
    enemy.hp -= damage;
    if enemy.hp > 0.0 {
        return false;
    }

    let enemy = enemies.swap_remove(idx);
    let new_drops = roll_loot(enemy.species, enemy.x, enemy.y, Some(player.id), now_ms);
    info!(
        enemy_id = enemy.id,
        species = enemy.species.as_str(),
        player_id = player.id,
        drops = new_drops.len(),
        "enemy killed"
    );
    drops.extend(new_drops);

    let leveled_up = player.add_xp(enemy.species.params().xp_worth);
    if leveled_up {
        info!(player_id = player.id, level = player.level, "level up");
    }

    true
}

/// Rolls a species' loot table at a kill location. Guaranteed entries always
/// land; each random roll is independent. Every surviving entry becomes one
/// drop with a small position jitter, tagged to the killing player.
pub fn roll_loot(
    species: Species,
    x: f32,
    y: f32,
    owner_id: Option<u64>,
    now_ms: u64,
) -> Vec<EnemyDrop> {
    let table = species.loot_table();
    let mut rng = rand::thread_rng();
    let mut drops = Vec::new();

    for entry in table.guaranteed.iter().chain(table.rolls.iter()) {
        if rng.gen_range(0.0..1.0f32) > entry.chance {
            continue;
        }

        let quantity = rng.gen_range(entry.min..=entry.max);
        drops.push(EnemyDrop {
            id: rand_id(),
            item: entry.item,
            x: x + rng.gen_range(-DROP_JITTER..=DROP_JITTER),
            y: y + rng.gen_range(-DROP_JITTER..=DROP_JITTER),
            quantity,
            xp_reward: entry.xp_reward,
            owner_id,
            created_ms: now_ms,
            collected: false,
        });
    }

    drops
}
