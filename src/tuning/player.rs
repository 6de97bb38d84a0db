/// Gameplay tuning for player avatars.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Starting and maximum hit points at level 1.
    pub hp_max: f32,

    /// Base melee damage before level bonuses.
    pub damage: f32,

    /// Movement speed in pixels per tick.
    pub speed: f32,

    /// Avatar diameter in pixels (collision radius is half of this).
    pub size: f32,

    /// Melee swings per second; the swing cooldown is derived from this.
    pub attack_speed: f32,

    /// Quiet period after taking damage before regeneration starts.
    pub regen_delay_ms: u64,

    /// Interval between heal pulses once regeneration is running.
    pub heal_tick_ms: u64,

    /// Hit points restored per heal pulse.
    pub heal_amount: f32,

    /// Delay before a dead player respawns at a fresh position.
    pub respawn_delay_ms: u64,
}

impl PlayerTuning {
    /// Minimum time between two melee swings.
    pub fn attack_cooldown_ms(&self) -> u64 {
        (1000.0 / self.attack_speed) as u64
    }
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            hp_max: 100.0,
            damage: 10.0,
            speed: 5.0,
            size: 20.0,
            attack_speed: 2.0,
            regen_delay_ms: 5000,
            heal_tick_ms: 1000,
            heal_amount: 1.0,
            respawn_delay_ms: 5000,
        }
    }
}
