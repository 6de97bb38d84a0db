//! Simulation entities, the `WorldState` aggregate owned by the world task,
//! and the per-tick snapshot types broadcast to connections.

use crate::protocol::GameEvent;
use crate::tuning::enemy::Species;
use crate::tuning::player::PlayerTuning;
use crate::tuning::resource::ResourceKind;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

#[derive(Clone)]
pub struct AppState {
    pub input_tx: mpsc::Sender<GameEvent>,
    pub world_tx: broadcast::Sender<WorldUpdate>,
    pub effect_tx: broadcast::Sender<HitEffect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit-length copy; a zero or non-finite vector collapses to zero
    /// rather than producing NaN components.
    pub fn normalized(self) -> Vec2 {
        let len_sq = self.x * self.x + self.y * self.y;
        if !len_sq.is_finite() || len_sq == 0.0 {
            return Vec2::ZERO;
        }
        let len = len_sq.sqrt();
        Vec2::new(self.x / len, self.y / len)
    }
}

// ---------------------------------------------------------------------------
// Player

#[derive(Debug, Clone)]
pub struct Player {
    pub id: u64,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub facing: Vec2,
    pub alive: bool,

    // Stat block.
    pub hp: f32,
    pub hp_max: f32,
    pub damage: f32,
    pub speed: f32,
    pub size: f32,
    pub attack_cooldown_ms: u64,
    pub last_attack_ms: u64,

    // Progression.
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub inventory: HashMap<String, u32>,

    // Tick-driven regeneration and respawn bookkeeping (not serialized).
    pub last_damage_ms: u64,
    pub last_heal_ms: u64,
    pub respawn_at_ms: u64,
}

impl Player {
    pub fn spawn(id: u64, name: String, x: f32, y: f32, tuning: &PlayerTuning) -> Self {
        Self {
            id,
            name,
            x,
            y,
            facing: Vec2::new(0.0, -1.0),
            alive: true,
            hp: tuning.hp_max,
            hp_max: tuning.hp_max,
            damage: tuning.damage,
            speed: tuning.speed,
            size: tuning.size,
            attack_cooldown_ms: tuning.attack_cooldown_ms(),
            last_attack_ms: 0,
            level: 1,
            xp: 0,
            xp_to_next_level: 100,
            inventory: HashMap::new(),
            last_damage_ms: 0,
            last_heal_ms: 0,
            respawn_at_ms: 0,
        }
    }

    /// Applies damage, interrupts regeneration and returns true if the hit
    /// was lethal.
    pub fn take_damage(&mut self, amount: f32, now_ms: u64) -> bool {
        if !self.alive {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        self.last_damage_ms = now_ms;
        self.last_heal_ms = now_ms;
        if self.hp <= 0.0 {
            self.alive = false;
            self.respawn_at_ms = 0;
            return true;
        }
        false
    }

    pub fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount).min(self.hp_max);
    }

    pub fn add_item(&mut self, item: &str, quantity: u32) {
        *self.inventory.entry(item.to_string()).or_insert(0) += quantity;
    }

    /// Credits XP. Overflow past the threshold rolls over, so a large award
    /// can advance several levels at once. Returns true if any level was
    /// gained.
    pub fn add_xp(&mut self, amount: u32) -> bool {
        self.xp += amount;
        let mut leveled_up = false;
        while self.xp >= self.xp_to_next_level {
            self.xp -= self.xp_to_next_level;
            self.level_up();
            leveled_up = true;
        }
        leveled_up
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.xp_to_next_level = xp_threshold(self.level);
        self.hp_max += 5.0;
        self.hp = self.hp_max;
        self.damage *= 1.5;
    }
}

/// XP required to clear the given level (exponential growth from base 100).
fn xp_threshold(level: u32) -> u32 {
    (100.0 * 1.5f64.powi(level as i32)).floor() as u32
}

// ---------------------------------------------------------------------------
// Enemy

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiState {
    Idle,
    Chase,
    Attack,
    Flee,
}

impl AiState {
    pub fn as_str(self) -> &'static str {
        match self {
            AiState::Idle => "IDLE",
            AiState::Chase => "CHASE",
            AiState::Attack => "ATTACK",
            AiState::Flee => "FLEE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: u64,
    pub species: Species,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
    pub hp_max: f32,
    pub state: AiState,
    pub last_attack_ms: u64,
    pub wander_dir: Option<Vec2>,
}

impl Enemy {
    pub fn spawn(id: u64, species: Species, x: f32, y: f32) -> Self {
        let params = species.params();
        Self {
            id,
            species,
            x,
            y,
            hp: params.hp_max,
            hp_max: params.hp_max,
            state: AiState::Idle,
            last_attack_ms: 0,
            wander_dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Environment resource

#[derive(Debug, Clone)]
pub struct Resource {
    pub id: u64,
    pub kind: ResourceKind,
    pub x: f32,
    pub y: f32,
    pub quantity: u32,
    pub hp: f32,
    pub depleted: bool,
    /// Set when the resource depletes; cleared once fully regrown.
    pub last_harvested_ms: Option<u64>,

    // Collision shape, seeded from the kind table and overridable per
    // resource by authored map descriptors.
    pub solid: bool,
    pub collision_radius: f32,
    pub collision_offset: Vec2,
}

impl Resource {
    pub fn new(id: u64, kind: ResourceKind, x: f32, y: f32) -> Self {
        let params = kind.params();
        Self {
            id,
            kind,
            x,
            y,
            quantity: params.max_quantity,
            hp: params.hp_max,
            depleted: false,
            last_harvested_ms: None,
            solid: params.solid,
            collision_radius: params.collision_radius,
            collision_offset: Vec2::ZERO,
        }
    }

    pub fn can_harvest(&self) -> bool {
        !self.depleted && self.quantity > 0
    }

    /// Removes one unit of harvest; flips to depleted and stamps the
    /// respawn countdown when the last unit is taken.
    pub fn harvest_one(&mut self, now_ms: u64) {
        if self.depleted {
            return;
        }
        self.quantity = self.quantity.saturating_sub(1);
        if self.quantity == 0 {
            self.depleted = true;
            self.last_harvested_ms = Some(now_ms);
        }
    }

    /// Regrowth fraction in [0,1]; 1.0 when the resource is not depleted.
    pub fn respawn_progress(&self, now_ms: u64) -> f32 {
        match self.last_harvested_ms {
            None => 1.0,
            Some(t) => {
                let elapsed = now_ms.saturating_sub(t) as f32;
                (elapsed / self.kind.params().respawn_ms as f32).min(1.0)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Enemy drop

/// Ephemeral loot left behind by a dead enemy. Private to the killer for a
/// window, then public, then despawned (old-school MMO style).
#[derive(Debug, Clone)]
pub struct EnemyDrop {
    pub id: u64,
    pub item: &'static str,
    pub x: f32,
    pub y: f32,
    pub quantity: u32,
    pub xp_reward: u32,
    pub owner_id: Option<u64>,
    pub created_ms: u64,
    pub collected: bool,
}

impl EnemyDrop {
    pub const OWNER_VISIBILITY_MS: u64 = 60_000;
    pub const PUBLIC_VISIBILITY_MS: u64 = 60_000;

    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_ms)
    }

    pub fn is_visible_to(&self, viewer_id: u64, now_ms: u64) -> bool {
        !self.collected && drop_visible(self.owner_id, self.created_ms, viewer_id, now_ms)
    }

    pub fn can_collect(&self, viewer_id: u64, now_ms: u64) -> bool {
        self.is_visible_to(viewer_id, now_ms)
    }

    /// Takes the full remaining quantity and marks the drop collected.
    pub fn collect_all(&mut self) -> u32 {
        if self.collected {
            return 0;
        }
        let collected = self.quantity;
        self.quantity = 0;
        self.collected = true;
        collected
    }

    pub fn should_despawn(&self, now_ms: u64) -> bool {
        self.collected
            || self.age_ms(now_ms) >= Self::OWNER_VISIBILITY_MS + Self::PUBLIC_VISIBILITY_MS
    }
}

/// Shared visibility rule for live drops and their snapshots: within the
/// private window only the owner (or anyone, for ownerless drops) may see it;
/// afterwards it is public until the total lifetime runs out.
fn drop_visible(owner_id: Option<u64>, created_ms: u64, viewer_id: u64, now_ms: u64) -> bool {
    let age = now_ms.saturating_sub(created_ms);
    if age >= EnemyDrop::OWNER_VISIBILITY_MS + EnemyDrop::PUBLIC_VISIBILITY_MS {
        return false;
    }
    if age < EnemyDrop::OWNER_VISIBILITY_MS {
        return match owner_id {
            None => true,
            Some(owner) => owner == viewer_id,
        };
    }
    true
}

// ---------------------------------------------------------------------------
// World map input

/// Chunked biome map consumed as data. Produced by an external generator or
/// authored in the map editor; the simulation only reads it and swaps the
/// whole map on an explicit save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldMap {
    pub chunks: HashMap<String, Chunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub biome: String,
    #[serde(default)]
    pub tiles: Vec<String>,
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
}

/// Resource placement embedded in a chunk. Collision fields are optional
/// per-resource overrides written by the map editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_solid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision_radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision_offset_x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision_offset_y: Option<f32>,
}

// ---------------------------------------------------------------------------
// Aggregate

/// All mutable simulation state, owned exclusively by the world task and
/// threaded explicitly through every system function.
pub struct WorldState {
    pub world: Arc<WorldMap>,
    pub world_size: f32,
    pub players: HashMap<u64, Player>,
    pub enemies: Vec<Enemy>,
    pub resources: Vec<Resource>,
    pub enemy_drops: Vec<EnemyDrop>,
    /// Movement intents queued in arrival order and drained at tick start.
    pub movement_queue: VecDeque<(u64, Vec2)>,
}

// ---------------------------------------------------------------------------
// Broadcast snapshots

#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub id: u64,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub alive: bool,
    pub hp: f32,
    pub hp_max: f32,
    pub damage: f32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub inventory: HashMap<String, u32>,
    pub facing: Vec2,
}

impl From<&Player> for PlayerSnapshot {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            x: p.x,
            y: p.y,
            alive: p.alive,
            hp: p.hp,
            hp_max: p.hp_max,
            damage: p.damage,
            level: p.level,
            xp: p.xp,
            xp_to_next_level: p.xp_to_next_level,
            inventory: p.inventory.clone(),
            facing: p.facing,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnemySnapshot {
    pub id: u64,
    pub species: Species,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
    pub hp_max: f32,
    pub size: f32,
    pub state: AiState,
}

impl From<&Enemy> for EnemySnapshot {
    fn from(e: &Enemy) -> Self {
        Self {
            id: e.id,
            species: e.species,
            x: e.x,
            y: e.y,
            hp: e.hp,
            hp_max: e.hp_max,
            size: e.species.params().size,
            state: e.state,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceSnapshot {
    pub id: u64,
    pub kind: ResourceKind,
    pub x: f32,
    pub y: f32,
    pub quantity: u32,
    pub max_quantity: u32,
    pub depleted: bool,
    pub respawn_progress: f32,
    pub solid: bool,
    pub size: f32,
}

impl ResourceSnapshot {
    /// Snapshots need the tick timestamp to report live respawn progress.
    pub fn capture(r: &Resource, now_ms: u64) -> Self {
        let params = r.kind.params();
        Self {
            id: r.id,
            kind: r.kind,
            x: r.x,
            y: r.y,
            quantity: r.quantity,
            max_quantity: params.max_quantity,
            depleted: r.depleted,
            respawn_progress: r.respawn_progress(now_ms),
            solid: r.solid,
            size: params.size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DropSnapshot {
    pub id: u64,
    pub item: &'static str,
    pub x: f32,
    pub y: f32,
    pub quantity: u32,
    pub xp_reward: u32,
    pub owner_id: Option<u64>,
    pub created_ms: u64,
}

impl DropSnapshot {
    pub fn is_visible_to(&self, viewer_id: u64, now_ms: u64) -> bool {
        drop_visible(self.owner_id, self.created_ms, viewer_id, now_ms)
    }
}

impl From<&EnemyDrop> for DropSnapshot {
    fn from(d: &EnemyDrop) -> Self {
        Self {
            id: d.id,
            item: d.item,
            x: d.x,
            y: d.y,
            quantity: d.quantity,
            xp_reward: d.xp_reward,
            owner_id: d.owner_id,
            created_ms: d.created_ms,
        }
    }
}

/// Authoritative snapshot broadcast once per tick. Connection tasks filter
/// drops per recipient before serializing; the shared world map rides along
/// as an `Arc` so fan-out never clones chunk data.
#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    pub now_ms: u64,
    pub players: Vec<PlayerSnapshot>,
    pub enemies: Vec<EnemySnapshot>,
    pub resources: Vec<ResourceSnapshot>,
    pub enemy_drops: Vec<DropSnapshot>,
    pub world: Arc<WorldMap>,
}

// ---------------------------------------------------------------------------
// Transient effects

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitEffectKind {
    Combat,
    Gather,
}

impl HitEffectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HitEffectKind::Combat => "combat",
            HitEffectKind::Gather => "gather",
        }
    }
}

/// Visual cue for a successful swing, broadcast to every connection.
#[derive(Debug, Clone, Copy)]
pub struct HitEffect {
    pub x: f32,
    pub y: f32,
    pub kind: HitEffectKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_player() -> Player {
        Player::spawn(1, "tester".to_string(), 0.0, 0.0, &PlayerTuning::default())
    }

    #[test]
    fn xp_rolls_over_and_levels_up() {
        let mut p = test_player();
        assert_eq!(p.level, 1);
        assert_eq!(p.xp_to_next_level, 100);

        assert!(p.add_xp(130));
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, 30);
        // floor(100 * 1.5^2)
        assert_eq!(p.xp_to_next_level, 225);
        // Level-up raises the cap, refills hp and scales damage.
        assert_eq!(p.hp_max, 105.0);
        assert_eq!(p.hp, 105.0);
        assert_eq!(p.damage, 15.0);
    }

    #[test]
    fn huge_xp_award_advances_multiple_levels() {
        let mut p = test_player();
        assert!(p.add_xp(100 + 225 + 10));
        assert_eq!(p.level, 3);
        assert_eq!(p.xp, 10);
    }

    #[test]
    fn lethal_damage_clears_alive_flag() {
        let mut p = test_player();
        assert!(!p.take_damage(40.0, 1_000));
        assert_eq!(p.hp, 60.0);
        assert_eq!(p.last_damage_ms, 1_000);
        assert!(p.take_damage(60.0, 2_000));
        assert!(!p.alive);
        // Further hits on a corpse are ignored.
        assert!(!p.take_damage(10.0, 3_000));
    }

    #[test]
    fn resource_depletes_and_reports_progress() {
        let mut r = Resource::new(7, ResourceKind::Tree, 100.0, 100.0);
        for _ in 0..5 {
            assert!(r.can_harvest());
            r.harvest_one(10_000);
        }
        assert!(r.depleted);
        assert!(!r.can_harvest());
        assert_eq!(r.last_harvested_ms, Some(10_000));
        assert_eq!(r.respawn_progress(10_000 + 22_500), 0.5);
        assert_eq!(r.respawn_progress(10_000 + 45_000), 1.0);
        // Progress is capped even long after the respawn window.
        assert_eq!(r.respawn_progress(10_000 + 90_000), 1.0);
    }

    #[test]
    fn drop_visibility_windows() {
        let drop = EnemyDrop {
            id: 1,
            item: "bone",
            x: 0.0,
            y: 0.0,
            quantity: 1,
            xp_reward: 5,
            owner_id: Some(42),
            created_ms: 1_000,
            collected: false,
        };

        // Private window: owner only.
        assert!(drop.is_visible_to(42, 1_000));
        assert!(!drop.is_visible_to(7, 1_000));
        assert!(!drop.is_visible_to(7, 1_000 + 59_999));

        // Public window: everyone.
        assert!(drop.is_visible_to(7, 1_000 + 60_000));
        assert!(drop.is_visible_to(42, 1_000 + 60_000));

        // Expired: no one.
        assert!(!drop.is_visible_to(42, 1_000 + 120_000));
        assert!(drop.should_despawn(1_000 + 120_000));
    }

    #[test]
    fn ownerless_drop_is_public_immediately() {
        let drop = EnemyDrop {
            id: 2,
            item: "meat",
            x: 0.0,
            y: 0.0,
            quantity: 2,
            xp_reward: 4,
            owner_id: None,
            created_ms: 0,
            collected: false,
        };
        assert!(drop.is_visible_to(7, 10));
    }

    #[test]
    fn collected_drop_despawns_and_hides() {
        let mut drop = EnemyDrop {
            id: 3,
            item: "fur",
            x: 0.0,
            y: 0.0,
            quantity: 2,
            xp_reward: 8,
            owner_id: Some(42),
            created_ms: 0,
            collected: false,
        };
        assert_eq!(drop.collect_all(), 2);
        assert_eq!(drop.collect_all(), 0);
        assert!(drop.should_despawn(1));
        assert!(!drop.is_visible_to(42, 1));
    }

    #[test]
    fn normalized_guards_degenerate_vectors() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        assert_eq!(Vec2::new(f32::NAN, 1.0).normalized(), Vec2::ZERO);
        let unit = Vec2::new(3.0, 4.0).normalized();
        assert!((unit.x - 0.6).abs() < 1e-6);
        assert!((unit.y - 0.8).abs() < 1e-6);
    }
}
