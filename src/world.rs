//! World bootstrap: loads the authored map (or falls back to a built-in
//! default), seeds resources from chunk descriptors and spawns the starting
//! enemy population. Map generation itself is an external concern; this
//! module only consumes `{chunks}` data.

use crate::state::{
    Chunk, Enemy, Resource, ResourceDescriptor, Vec2, WorldMap, WorldState,
};
use crate::tuning::enemy::Species;
use crate::tuning::resource::ResourceKind;
use crate::utils::rng::rand_id;

use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub const CHUNK_SIZE: u32 = 10;
pub const TILE_SIZE: u32 = 32;
pub const WORLD_CHUNKS: u32 = 10;

/// Enemies roaming the map at world start.
pub const ENEMY_POPULATION: usize = 20;

pub fn world_size() -> f32 {
    (WORLD_CHUNKS * CHUNK_SIZE * TILE_SIZE) as f32
}

/// Builds the full starting state: map, seeded resources, enemy population.
pub fn bootstrap_state(map_path: &Path) -> WorldState {
    let world = match load_map_from_file(map_path) {
        Some(map) => {
            info!(path = %map_path.display(), "loaded authored map");
            map
        }
        None => {
            info!("no authored map found, using default map");
            Arc::new(default_map())
        }
    };

    let world_size = world_size();
    let resources = seed_resources(&world);
    let enemies = spawn_enemies(world_size, ENEMY_POPULATION);
    info!(
        chunks = world.chunks.len(),
        resources = resources.len(),
        enemies = enemies.len(),
        "world ready"
    );

    WorldState {
        world,
        world_size,
        players: HashMap::new(),
        enemies,
        resources,
        enemy_drops: Vec::new(),
        movement_queue: VecDeque::new(),
    }
}

/// Reads a saved map from disk. Any failure falls back to the default map
/// rather than aborting startup.
fn load_map_from_file(path: &Path) -> Option<Arc<WorldMap>> {
    let data = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<HashMap<String, Chunk>>(&data) {
        Ok(chunks) => Some(Arc::new(WorldMap { chunks })),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse saved map");
            None
        }
    }
}

/// Writes the current map for the explicit save action.
pub async fn save_map(path: &Path, world: &WorldMap) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let data = serde_json::to_vec_pretty(&world.chunks)?;
    tokio::fs::write(path, data).await
}

/// Instantiates every resource descriptor embedded in the map's chunks.
/// Unknown types are logged and skipped; authored collision overrides win
/// over the kind table.
pub fn seed_resources(world: &WorldMap) -> Vec<Resource> {
    let mut resources = Vec::new();

    for chunk in world.chunks.values() {
        for descriptor in &chunk.resources {
            match create_resource(descriptor) {
                Some(resource) => resources.push(resource),
                None => {
                    warn!(kind = %descriptor.kind, "unknown resource type in map, skipping")
                }
            }
        }
    }

    resources
}

fn create_resource(descriptor: &ResourceDescriptor) -> Option<Resource> {
    let kind = ResourceKind::from_name(&descriptor.kind)?;
    let mut resource = Resource::new(rand_id(), kind, descriptor.x, descriptor.y);

    if let Some(solid) = descriptor.is_solid {
        resource.solid = solid;
    }
    if let Some(radius) = descriptor.collision_radius {
        resource.collision_radius = radius;
    }
    resource.collision_offset = Vec2::new(
        descriptor.collision_offset_x.unwrap_or(0.0),
        descriptor.collision_offset_y.unwrap_or(0.0),
    );

    Some(resource)
}

/// Spawns the starting enemy population at random positions with uniformly
/// random species.
pub fn spawn_enemies(world_size: f32, count: usize) -> Vec<Enemy> {
    let mut rng = rand::thread_rng();
    let mut enemies = Vec::with_capacity(count);

    for _ in 0..count {
        let species = Species::ALL[rng.gen_range(0..Species::ALL.len())];
        let x = rng.gen_range(0.0..world_size);
        let y = rng.gen_range(0.0..world_size);
        enemies.push(Enemy::spawn(rand_id(), species, x, y));
    }

    enemies
}

const BIOMES: [&str; 5] = ["forest", "plains", "desert", "snow", "swamp"];

fn biome_resource_kinds(biome: &str) -> &'static [&'static str] {
    match biome {
        "forest" => &["tree", "berry", "mushroom", "log"],
        "plains" => &["grass", "tree", "flower", "herb"],
        "desert" => &["sand", "cactus", "rock"],
        "snow" => &["ice", "stone", "crystal"],
        "swamp" => &["mushroom", "herb", "log"],
        _ => &["grass"],
    }
}

/// Minimal built-in map used when no authored map exists: a chunk grid with
/// a simple biome pattern and a light scatter of fitting resources. Real map
/// content comes from the external generator or the editor.
pub fn default_map() -> WorldMap {
    let mut rng = rand::thread_rng();
    let mut chunks = HashMap::new();
    let chunk_px = (CHUNK_SIZE * TILE_SIZE) as f32;

    for cx in 0..WORLD_CHUNKS {
        for cy in 0..WORLD_CHUNKS {
            let biome = BIOMES[(((cx + cy + 1) / 2) % BIOMES.len() as u32) as usize];
            let kinds = biome_resource_kinds(biome);

            let mut resources = Vec::new();
            for _ in 0..3 {
                let kind = kinds[rng.gen_range(0..kinds.len())];
                resources.push(ResourceDescriptor {
                    kind: kind.to_string(),
                    x: cx as f32 * chunk_px + rng.gen_range(0.0..chunk_px),
                    y: cy as f32 * chunk_px + rng.gen_range(0.0..chunk_px),
                    is_solid: None,
                    collision_radius: None,
                    collision_offset_x: None,
                    collision_offset_y: None,
                });
            }

            chunks.insert(
                format!("{cx},{cy}"),
                Chunk {
                    biome: biome.to_string(),
                    tiles: vec![biome.to_string(); (CHUNK_SIZE * CHUNK_SIZE) as usize],
                    resources,
                },
            );
        }
    }

    WorldMap { chunks }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_covers_the_chunk_grid() {
        let map = default_map();
        assert_eq!(map.chunks.len(), (WORLD_CHUNKS * WORLD_CHUNKS) as usize);
        let chunk = map.chunks.get("0,0").expect("origin chunk");
        assert_eq!(chunk.tiles.len(), (CHUNK_SIZE * CHUNK_SIZE) as usize);
        assert!(!chunk.resources.is_empty());
    }

    #[test]
    fn seeding_skips_unknown_types_and_applies_overrides() {
        let mut map = WorldMap::default();
        map.chunks.insert(
            "0,0".to_string(),
            Chunk {
                biome: "forest".to_string(),
                tiles: Vec::new(),
                resources: vec![
                    ResourceDescriptor {
                        kind: "tree".to_string(),
                        x: 10.0,
                        y: 20.0,
                        is_solid: None,
                        collision_radius: Some(14.0),
                        collision_offset_x: Some(2.0),
                        collision_offset_y: None,
                    },
                    ResourceDescriptor {
                        kind: "volcano".to_string(),
                        x: 0.0,
                        y: 0.0,
                        is_solid: None,
                        collision_radius: None,
                        collision_offset_x: None,
                        collision_offset_y: None,
                    },
                ],
            },
        );

        let resources = seed_resources(&map);
        assert_eq!(resources.len(), 1);
        let tree = &resources[0];
        assert_eq!(tree.kind, ResourceKind::Tree);
        assert!(tree.solid);
        assert_eq!(tree.collision_radius, 14.0);
        assert_eq!(tree.collision_offset, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn spawned_enemies_start_idle_inside_the_world() {
        let enemies = spawn_enemies(world_size(), ENEMY_POPULATION);
        assert_eq!(enemies.len(), ENEMY_POPULATION);
        for e in &enemies {
            assert!(e.x >= 0.0 && e.x < world_size());
            assert!(e.y >= 0.0 && e.y < world_size());
            assert_eq!(e.hp, e.hp_max);
        }
    }
}
