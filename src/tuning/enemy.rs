//! Per-species enemy parameters and loot tables.
//!
//! Species are a tag plus an immutable row in a parameter table; the AI and
//! combat systems read everything they need from the row, so adding a species
//! is a data change, not a code change.

/// Species tag carried by every enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Species {
    Wolf,
    Bear,
    Hyena,
    Rabbit,
}

impl Species {
    pub const ALL: [Species; 4] = [Species::Wolf, Species::Bear, Species::Hyena, Species::Rabbit];

    pub fn as_str(self) -> &'static str {
        match self {
            Species::Wolf => "wolf",
            Species::Bear => "bear",
            Species::Hyena => "hyena",
            Species::Rabbit => "rabbit",
        }
    }

    pub fn params(self) -> &'static SpeciesParams {
        match self {
            Species::Wolf => &WOLF,
            Species::Bear => &BEAR,
            Species::Hyena => &HYENA,
            Species::Rabbit => &RABBIT,
        }
    }

    pub fn loot_table(self) -> &'static LootTable {
        match self {
            Species::Wolf => &WOLF_LOOT,
            Species::Bear => &BEAR_LOOT,
            Species::Hyena => &HYENA_LOOT,
            Species::Rabbit => &RABBIT_LOOT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpeciesParams {
    /// Maximum hit points.
    pub hp_max: f32,

    /// XP awarded to the killer.
    pub xp_worth: u32,

    /// Body diameter in pixels.
    pub size: f32,

    /// Melee damage per landed attack.
    pub attack_damage: f32,

    /// Minimum time between attacks.
    pub attack_cooldown_ms: u64,

    /// Squared distance at which a predator starts chasing.
    pub hunt_range_sq: f32,

    /// Squared distance at which a chase becomes an attack.
    pub attack_range_sq: f32,

    /// Chase step length in pixels per tick.
    pub chase_speed: f32,

    /// Passive species never hunt; they flee instead.
    pub passive: bool,

    /// Squared distance at which a passive species starts fleeing.
    pub flee_range_sq: f32,

    /// Flee step length in pixels per tick.
    pub flee_speed: f32,

    /// Wander step length in pixels per tick.
    pub wander_speed: f32,

    /// Trait: chase speed multiplier when the target is under half health.
    pub low_health_speed_bonus: Option<f32>,

    /// Trait: chance per chase step to sidestep laterally while closing in.
    pub dodge_chance: Option<f32>,
}

static WOLF: SpeciesParams = SpeciesParams {
    hp_max: 55.0,
    xp_worth: 22,
    size: 20.0,
    attack_damage: 10.0,
    attack_cooldown_ms: 1000,
    hunt_range_sq: 200.0 * 200.0,
    attack_range_sq: 25.0 * 25.0,
    chase_speed: 2.0,
    passive: false,
    flee_range_sq: 0.0,
    flee_speed: 0.0,
    wander_speed: 1.0,
    // Frenzy when the target drops under 50% hp.
    low_health_speed_bonus: Some(1.45),
    dodge_chance: None,
};

static BEAR: SpeciesParams = SpeciesParams {
    hp_max: 85.0,
    xp_worth: 38,
    size: 24.0,
    // Stronger attacks + larger detection range.
    attack_damage: 18.0,
    attack_cooldown_ms: 1300,
    hunt_range_sq: 300.0 * 300.0,
    attack_range_sq: 30.0 * 30.0,
    chase_speed: 1.7,
    passive: false,
    flee_range_sq: 0.0,
    flee_speed: 0.0,
    wander_speed: 1.0,
    low_health_speed_bonus: None,
    dodge_chance: None,
};

static HYENA: SpeciesParams = SpeciesParams {
    hp_max: 48.0,
    xp_worth: 28,
    size: 18.0,
    attack_damage: 8.0,
    attack_cooldown_ms: 850,
    hunt_range_sq: 210.0 * 210.0,
    attack_range_sq: 22.0 * 22.0,
    chase_speed: 2.6,
    passive: false,
    flee_range_sq: 0.0,
    flee_speed: 0.0,
    wander_speed: 1.0,
    low_health_speed_bonus: None,
    // Agile runner with occasional dodge sidestep while chasing.
    dodge_chance: Some(0.22),
};

static RABBIT: SpeciesParams = SpeciesParams {
    hp_max: 25.0,
    xp_worth: 8,
    size: 14.0,
    attack_damage: 0.0,
    attack_cooldown_ms: 0,
    hunt_range_sq: 0.0,
    attack_range_sq: 0.0,
    chase_speed: 0.0,
    passive: true,
    flee_range_sq: 190.0 * 190.0,
    flee_speed: 3.2,
    wander_speed: 1.5,
    low_health_speed_bonus: None,
    dodge_chance: None,
};

/// One possible drop from a loot table.
#[derive(Debug, Clone, Copy)]
pub struct LootEntry {
    pub item: &'static str,
    pub min: u32,
    pub max: u32,
    /// Roll chance in [0,1]; guaranteed entries use 1.0.
    pub chance: f32,
    /// XP credited when the drop is collected.
    pub xp_reward: u32,
}

/// Loot split into guaranteed entries and independent random rolls.
#[derive(Debug, Clone, Copy)]
pub struct LootTable {
    pub guaranteed: &'static [LootEntry],
    pub rolls: &'static [LootEntry],
}

static WOLF_LOOT: LootTable = LootTable {
    guaranteed: &[LootEntry {
        item: "bone",
        min: 1,
        max: 1,
        chance: 1.0,
        xp_reward: 5,
    }],
    rolls: &[
        LootEntry {
            item: "meat",
            min: 2,
            max: 4,
            chance: 0.9,
            xp_reward: 10,
        },
        LootEntry {
            item: "fur",
            min: 1,
            max: 2,
            chance: 0.7,
            xp_reward: 8,
        },
    ],
};

static BEAR_LOOT: LootTable = LootTable {
    guaranteed: &[LootEntry {
        item: "bone",
        min: 2,
        max: 2,
        chance: 1.0,
        xp_reward: 10,
    }],
    rolls: &[
        LootEntry {
            item: "meat",
            min: 4,
            max: 6,
            chance: 0.95,
            xp_reward: 20,
        },
        LootEntry {
            item: "fur",
            min: 2,
            max: 3,
            chance: 0.8,
            xp_reward: 15,
        },
        LootEntry {
            item: "tooth",
            min: 1,
            max: 2,
            chance: 0.4,
            xp_reward: 12,
        },
    ],
};

static HYENA_LOOT: LootTable = LootTable {
    guaranteed: &[LootEntry {
        item: "bone",
        min: 1,
        max: 1,
        chance: 1.0,
        xp_reward: 5,
    }],
    rolls: &[
        LootEntry {
            item: "meat",
            min: 1,
            max: 3,
            chance: 0.85,
            xp_reward: 8,
        },
        LootEntry {
            item: "tooth",
            min: 1,
            max: 1,
            chance: 0.3,
            xp_reward: 10,
        },
    ],
};

static RABBIT_LOOT: LootTable = LootTable {
    guaranteed: &[LootEntry {
        item: "meat",
        min: 1,
        max: 1,
        chance: 1.0,
        xp_reward: 4,
    }],
    rolls: &[LootEntry {
        item: "fur",
        min: 1,
        max: 1,
        chance: 0.6,
        xp_reward: 5,
    }],
};

/// Wander heading used by every species while idle: re-roll probability per
/// tick and the personal-space radius that blocks a wander step into a player.
pub const WANDER_TURN_CHANCE: f32 = 0.01;
pub const PLAYER_BLOCK_RANGE_SQ: f32 = 20.0 * 20.0;
