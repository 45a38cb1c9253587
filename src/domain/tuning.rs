// Gameplay tuning, kept separate from runtime/server configuration
// (tick rates, channel capacities, ports).

/// Logical playfield width shared by every peer; positions wrap at the edges.
pub const FIELD_WIDTH: f32 = 1024.0;
/// Logical playfield height shared by every peer.
pub const FIELD_HEIGHT: f32 = 768.0;

/// Simulated milliseconds per tick (100 Hz logical rate).
pub const TICK_MS: u64 = 10;

#[derive(Debug, Clone, Copy)]
pub struct ShipTuning {
    /// Collision radius in pixels.
    pub radius: i32,
    /// Forward acceleration applied per tick while thrusting.
    pub thrust: i32,
    /// Degrees of rotation per tick while turning.
    pub rotate_speed: i32,
    /// Maximum concurrently live bullets per ship.
    pub max_bullets: usize,
    /// Lives granted for a fresh game.
    pub starting_lives: i32,
    /// Delay between destruction and the first respawn attempt.
    pub respawn_delay_ms: u64,
    /// Invulnerability window after spawning.
    pub materialize_ms: u64,
    /// Score step that grants an extra life.
    pub extra_life_score: i32,
    /// Extra clearance required around the spawn point before respawning.
    pub safe_haven_margin: i32,
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            radius: 24,
            thrust: 1,
            rotate_speed: 1,
            max_bullets: 4,
            starting_lives: 5,
            respawn_delay_ms: 2000,
            materialize_ms: 300,
            extra_life_score: 10_000,
            safe_haven_margin: 100,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BulletTuning {
    /// Collision radius in pixels.
    pub radius: i32,
    /// Fixed muzzle velocity.
    pub speed: i32,
    /// Lifetime before a bullet self-destructs.
    pub ttl_ms: u64,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            radius: 3,
            speed: 25,
            ttl_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AsteroidTuning {
    /// Asteroids generated at the start of each level.
    pub field_size: usize,
    /// Inclusive speed range for generated and split asteroids.
    pub min_speed: i32,
    pub max_speed: i32,
    pub large_radius: i32,
    pub medium_radius: i32,
    pub small_radius: i32,
}

impl Default for AsteroidTuning {
    fn default() -> Self {
        Self {
            field_size: 8,
            min_speed: 2,
            max_speed: 8,
            large_radius: 40,
            medium_radius: 20,
            small_radius: 10,
        }
    }
}

/// Bundle handed to the world context so every subsystem tunes consistently.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tuning {
    pub ship: ShipTuning,
    pub bullet: BulletTuning,
    pub asteroid: AsteroidTuning,
}
