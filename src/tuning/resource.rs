//! Per-kind parameters for world-anchored harvestable resources.

/// Kind tag carried by every environment resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Tree,
    Berry,
    Stone,
    Grass,
    Mushroom,
    Herb,
    Flower,
    Log,
    Rock,
    Sand,
    Cactus,
    Ore,
    Gem,
    Ice,
    Crystal,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Tree => "tree",
            ResourceKind::Berry => "berry",
            ResourceKind::Stone => "stone",
            ResourceKind::Grass => "grass",
            ResourceKind::Mushroom => "mushroom",
            ResourceKind::Herb => "herb",
            ResourceKind::Flower => "flower",
            ResourceKind::Log => "log",
            ResourceKind::Rock => "rock",
            ResourceKind::Sand => "sand",
            ResourceKind::Cactus => "cactus",
            ResourceKind::Ore => "ore",
            ResourceKind::Gem => "gem",
            ResourceKind::Ice => "ice",
            ResourceKind::Crystal => "crystal",
        }
    }

    /// Resolve a descriptor type name to a kind. `berry_bush` is accepted as
    /// an alias kept from older map files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "tree" => Some(ResourceKind::Tree),
            "berry" | "berry_bush" => Some(ResourceKind::Berry),
            "stone" => Some(ResourceKind::Stone),
            "grass" => Some(ResourceKind::Grass),
            "mushroom" => Some(ResourceKind::Mushroom),
            "herb" => Some(ResourceKind::Herb),
            "flower" => Some(ResourceKind::Flower),
            "log" => Some(ResourceKind::Log),
            "rock" => Some(ResourceKind::Rock),
            "sand" => Some(ResourceKind::Sand),
            "cactus" => Some(ResourceKind::Cactus),
            "ore" => Some(ResourceKind::Ore),
            "gem" => Some(ResourceKind::Gem),
            "ice" => Some(ResourceKind::Ice),
            "crystal" => Some(ResourceKind::Crystal),
            _ => None,
        }
    }

    pub fn params(self) -> &'static ResourceParams {
        &RESOURCE_TABLE[self as usize]
    }
}

/// One item rolled from a harvest, with a uniform quantity range.
#[derive(Debug, Clone, Copy)]
pub struct YieldRange {
    pub item: &'static str,
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceParams {
    /// Harvests available before depletion.
    pub max_quantity: u32,

    /// Time from depletion to full regrowth.
    pub respawn_ms: u64,

    /// Durability pool, restored alongside quantity while regrowing.
    pub hp_max: f32,

    /// Render diameter in pixels.
    pub size: f32,

    /// Solid resources block movement.
    pub solid: bool,

    /// Collision circle radius for solid resources.
    pub collision_radius: f32,

    /// Items credited per harvest.
    pub yields: &'static [YieldRange],

    /// XP credited per harvest.
    pub xp_reward: u32,
}

// Indexed by `ResourceKind as usize`; keep the order in sync with the enum.
static RESOURCE_TABLE: [ResourceParams; 15] = [
    // Tree
    ResourceParams {
        max_quantity: 5,
        respawn_ms: 45_000,
        hp_max: 100.0,
        size: 24.0,
        solid: true,
        collision_radius: 10.0,
        yields: &[YieldRange {
            item: "wood",
            min: 2,
            max: 4,
        }],
        xp_reward: 10,
    },
    // Berry
    ResourceParams {
        max_quantity: 8,
        respawn_ms: 20_000,
        hp_max: 50.0,
        size: 14.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[YieldRange {
            item: "berry",
            min: 1,
            max: 3,
        }],
        xp_reward: 5,
    },
    // Stone
    ResourceParams {
        max_quantity: 3,
        respawn_ms: 60_000,
        hp_max: 150.0,
        size: 16.0,
        solid: true,
        collision_radius: 15.0,
        yields: &[YieldRange {
            item: "stone",
            min: 3,
            max: 6,
        }],
        xp_reward: 15,
    },
    // Grass
    ResourceParams {
        max_quantity: 10,
        respawn_ms: 15_000,
        hp_max: 30.0,
        size: 12.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[YieldRange {
            item: "grass",
            min: 1,
            max: 2,
        }],
        xp_reward: 3,
    },
    // Mushroom
    ResourceParams {
        max_quantity: 6,
        respawn_ms: 25_000,
        hp_max: 40.0,
        size: 12.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[YieldRange {
            item: "mushroom",
            min: 1,
            max: 2,
        }],
        xp_reward: 6,
    },
    // Herb
    ResourceParams {
        max_quantity: 8,
        respawn_ms: 18_000,
        hp_max: 25.0,
        size: 10.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[YieldRange {
            item: "herb",
            min: 1,
            max: 3,
        }],
        xp_reward: 4,
    },
    // Flower
    ResourceParams {
        max_quantity: 10,
        respawn_ms: 12_000,
        hp_max: 20.0,
        size: 10.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[YieldRange {
            item: "flower",
            min: 1,
            max: 2,
        }],
        xp_reward: 2,
    },
    // Log
    ResourceParams {
        max_quantity: 4,
        respawn_ms: 40_000,
        hp_max: 120.0,
        size: 16.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[YieldRange {
            item: "log",
            min: 1,
            max: 2,
        }],
        xp_reward: 12,
    },
    // Rock
    ResourceParams {
        max_quantity: 4,
        respawn_ms: 55_000,
        hp_max: 160.0,
        size: 14.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[YieldRange {
            item: "rock",
            min: 2,
            max: 4,
        }],
        xp_reward: 14,
    },
    // Sand
    ResourceParams {
        max_quantity: 12,
        respawn_ms: 10_000,
        hp_max: 15.0,
        size: 11.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[YieldRange {
            item: "sand",
            min: 2,
            max: 4,
        }],
        xp_reward: 2,
    },
    // Cactus
    ResourceParams {
        max_quantity: 5,
        respawn_ms: 30_000,
        hp_max: 80.0,
        size: 15.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[
            YieldRange {
                item: "water",
                min: 1,
                max: 2,
            },
            YieldRange {
                item: "cactus_fiber",
                min: 1,
                max: 1,
            },
        ],
        xp_reward: 10,
    },
    // Ore
    ResourceParams {
        max_quantity: 3,
        respawn_ms: 70_000,
        hp_max: 200.0,
        size: 13.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[YieldRange {
            item: "ore",
            min: 2,
            max: 5,
        }],
        xp_reward: 20,
    },
    // Gem
    ResourceParams {
        max_quantity: 2,
        respawn_ms: 90_000,
        hp_max: 250.0,
        size: 11.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[YieldRange {
            item: "gem",
            min: 1,
            max: 2,
        }],
        xp_reward: 35,
    },
    // Ice
    ResourceParams {
        max_quantity: 5,
        respawn_ms: 22_000,
        hp_max: 90.0,
        size: 12.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[YieldRange {
            item: "ice",
            min: 2,
            max: 4,
        }],
        xp_reward: 8,
    },
    // Crystal
    ResourceParams {
        max_quantity: 2,
        respawn_ms: 100_000,
        hp_max: 280.0,
        size: 10.0,
        solid: false,
        collision_radius: 0.0,
        yields: &[YieldRange {
            item: "crystal",
            min: 1,
            max: 1,
        }],
        xp_reward: 40,
    },
];
