//! Gathering and loot collection, plus the per-tick respawn and drop
//! cleanup passes.

use crate::state::{EnemyDrop, Player, Resource, WorldState};

use rand::Rng;
use tracing::debug;

/// Harvests one unit from an environment resource and credits the yield and
/// XP to the acting player. Returns false when the resource is depleted.
pub fn harvest_world_resource(player: &mut Player, resource: &mut Resource, now_ms: u64) -> bool {
    if !resource.can_harvest() {
        return false;
    }

    resource.harvest_one(now_ms);

    let params = resource.kind.params();
    let mut rng = rand::thread_rng();
    for range in params.yields {
        let amount = rng.gen_range(range.min..=range.max);
        player.add_item(range.item, amount);
    }
    player.add_xp(params.xp_reward);

    debug!(
        player_id = player.id,
        resource_id = resource.id,
        kind = resource.kind.as_str(),
        remaining = resource.quantity,
        "resource harvested"
    );
    true
}

/// Collects an enemy drop in full, honoring the ownership window. Returns
/// true when the drop was emptied by this call.
pub fn collect_enemy_drop(player: &mut Player, drop: &mut EnemyDrop, now_ms: u64) -> bool {
    if !drop.can_collect(player.id, now_ms) {
        return false;
    }

    let amount = drop.collect_all();
    if amount == 0 {
        return false;
    }

    player.add_item(drop.item, amount);
    player.add_xp(drop.xp_reward);

    debug!(
        player_id = player.id,
        drop_id = drop.id,
        item = drop.item,
        amount,
        "drop collected"
    );
    drop.collected
}

/// Explicit harvest/collect by target id. Drops take priority over
/// environment resources so loot can always be picked up even when a node
/// overlaps it. Unknown ids and dead players are silent no-ops.
pub fn harvest_by_id(state: &mut WorldState, player_id: u64, target_id: u64, now_ms: u64) {
    let WorldState {
        players,
        resources,
        enemy_drops,
        ..
    } = state;

    let Some(player) = players.get_mut(&player_id) else {
        return;
    };
    if !player.alive {
        return;
    }

    if let Some(drop) = enemy_drops.iter_mut().find(|d| d.id == target_id) {
        collect_enemy_drop(player, drop, now_ms);
        return;
    }

    if let Some(resource) = resources.iter_mut().find(|r| r.id == target_id) {
        harvest_world_resource(player, resource, now_ms);
    }
}

/// Advances every depleted resource's regrowth. Partial progress restores a
/// proportional floor of quantity and durability so regrowth is observable;
/// completion resets both and clears the depletion stamp.
pub fn update_respawns(resources: &mut [Resource], now_ms: u64) {
    for resource in resources.iter_mut() {
        if !resource.depleted {
            continue;
        }
        let Some(last) = resource.last_harvested_ms else {
            continue;
        };

        let params = resource.kind.params();
        let progress = now_ms.saturating_sub(last) as f32 / params.respawn_ms as f32;

        if progress >= 1.0 {
            resource.quantity = params.max_quantity;
            resource.hp = params.hp_max;
            resource.depleted = false;
            resource.last_harvested_ms = None;
            debug!(
                resource_id = resource.id,
                kind = resource.kind.as_str(),
                "resource regrown"
            );
        } else {
            resource.quantity = (params.max_quantity as f32 * progress) as u32;
            resource.hp = (params.hp_max * progress).floor();
        }
    }
}

/// Removes collected and expired drops.
pub fn cleanup_drops(drops: &mut Vec<EnemyDrop>, now_ms: u64) {
    drops.retain(|d| !d.should_despawn(now_ms));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorldMap;
    use crate::tuning::player::PlayerTuning;
    use crate::tuning::resource::ResourceKind;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;

    fn test_player(id: u64) -> Player {
        Player::spawn(id, format!("p{id}"), 0.0, 0.0, &PlayerTuning::default())
    }

    fn test_drop(id: u64, owner: Option<u64>, created_ms: u64) -> EnemyDrop {
        EnemyDrop {
            id,
            item: "bone",
            x: 0.0,
            y: 0.0,
            quantity: 2,
            xp_reward: 5,
            owner_id: owner,
            created_ms,
            collected: false,
        }
    }

    #[test]
    fn harvest_credits_inventory_and_xp() {
        let mut player = test_player(1);
        let mut tree = Resource::new(7, ResourceKind::Tree, 50.0, 50.0);

        assert!(harvest_world_resource(&mut player, &mut tree, 1_000));
        assert_eq!(tree.quantity, 4);
        let wood = player.inventory["wood"];
        assert!((2..=4).contains(&wood));
        assert_eq!(player.xp, 10);
    }

    #[test]
    fn depleted_resource_cannot_be_harvested_until_regrown() {
        let mut player = test_player(1);
        let mut tree = Resource::new(7, ResourceKind::Tree, 50.0, 50.0);
        for _ in 0..5 {
            assert!(harvest_world_resource(&mut player, &mut tree, 1_000));
        }
        assert!(tree.depleted);
        assert!(!harvest_world_resource(&mut player, &mut tree, 2_000));

        // Partial regrowth restores a proportional quantity but stays
        // unharvestable.
        let mut resources = vec![tree];
        update_respawns(&mut resources, 1_000 + 22_500);
        assert_eq!(resources[0].quantity, 2);
        assert!(resources[0].depleted);
        assert!(!harvest_world_resource(&mut player, &mut resources[0], 1_000 + 22_500));

        // Full regrowth restores everything.
        update_respawns(&mut resources, 1_000 + 45_000);
        assert_eq!(resources[0].quantity, 5);
        assert!(!resources[0].depleted);
        assert_eq!(resources[0].last_harvested_ms, None);
        assert!(harvest_world_resource(&mut player, &mut resources[0], 1_000 + 45_000));
    }

    #[test]
    fn quantity_is_monotone_while_regrowing() {
        let mut tree = Resource::new(7, ResourceKind::Tree, 50.0, 50.0);
        tree.quantity = 0;
        tree.depleted = true;
        tree.last_harvested_ms = Some(0);

        let mut resources = vec![tree];
        let mut previous = 0;
        for elapsed in (0..=45_000).step_by(1_500) {
            update_respawns(&mut resources, elapsed);
            assert!(resources[0].quantity >= previous);
            previous = resources[0].quantity;
        }
        assert_eq!(previous, 5);
    }

    #[test]
    fn owner_collects_immediately_stranger_must_wait() {
        let mut owner = test_player(1);
        let mut stranger = test_player(2);
        let mut drop = test_drop(10, Some(1), 1_000);

        assert!(!collect_enemy_drop(&mut stranger, &mut drop, 1_000));
        assert!(stranger.inventory.is_empty());

        assert!(collect_enemy_drop(&mut owner, &mut drop, 1_000));
        assert_eq!(owner.inventory["bone"], 2);
        assert_eq!(owner.xp, 5);

        // Emptied: nothing left for anyone.
        assert!(!collect_enemy_drop(&mut stranger, &mut drop, 1_000 + 60_000));
    }

    #[test]
    fn stranger_can_scavenge_after_the_private_window() {
        let mut stranger = test_player(2);
        let mut drop = test_drop(10, Some(1), 1_000);

        assert!(collect_enemy_drop(&mut stranger, &mut drop, 1_000 + 60_000));
        assert_eq!(stranger.inventory["bone"], 2);
    }

    #[test]
    fn cleanup_removes_collected_and_expired_drops() {
        let mut drops = vec![
            test_drop(1, None, 0),
            test_drop(2, None, 0),
            test_drop(3, None, 100_000),
        ];
        drops[1].collected = true;

        // Drop 1 is 120s old (expired), drop 2 collected, drop 3 still live.
        cleanup_drops(&mut drops, 120_000);
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].id, 3);
    }

    #[test]
    fn harvest_by_id_prefers_drops_over_resources() {
        let mut state = WorldState {
            world: Arc::new(WorldMap::default()),
            world_size: 3200.0,
            players: HashMap::new(),
            enemies: Vec::new(),
            resources: vec![Resource::new(30, ResourceKind::Grass, 0.0, 0.0)],
            enemy_drops: vec![test_drop(40, None, 0)],
            movement_queue: VecDeque::new(),
        };
        state.players.insert(1, test_player(1));

        harvest_by_id(&mut state, 1, 40, 10);
        assert!(state.enemy_drops[0].collected);
        assert_eq!(state.resources[0].quantity, 10);

        harvest_by_id(&mut state, 1, 30, 10);
        assert_eq!(state.resources[0].quantity, 9);

        // Unknown target and unknown player: both silent no-ops.
        harvest_by_id(&mut state, 1, 999, 10);
        harvest_by_id(&mut state, 99, 30, 10);
        assert_eq!(state.resources[0].quantity, 9);
    }
}
