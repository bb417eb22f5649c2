//! Simulation constants: pollutant presets, opening adjustments and floors.
//!
//! Plain `pub const` groups with no runtime dependency. Tunables that a
//! host may want to change per session live in [`crate::config::SimConfig`]
//! instead.

/// Base inflow rate (S) and removal constant (K) for a sealed room.
pub mod kinetics {
    pub const BASE_S_PM10: f32 = 1.0;
    pub const BASE_K_PM10: f32 = 0.005;
    pub const BASE_S_CO: f32 = 5.0;
    pub const BASE_K_CO: f32 = 0.002;
    pub const BASE_S_CL2: f32 = 0.1;
    pub const BASE_K_CL2: f32 = 0.05;

    /// Inflow added per configured passage.
    pub const S_ADJUST_PASSAGE: f32 = 5.0;
    /// Removal constant added per configured passage.
    pub const K_ADJUST_PASSAGE: f32 = 0.02;
    /// Inflow added per configured window.
    pub const S_ADJUST_WINDOW: f32 = 3.0;
    /// Removal constant added per configured window.
    pub const K_ADJUST_WINDOW: f32 = 0.05;

    /// K never drops below this, so `S / (K·V)` stays finite.
    pub const K_FLOOR: f32 = 0.0001;
    /// Room volume floor in m³.
    pub const VOLUME_FLOOR: f32 = 0.001;

    /// Initial concentration offered before the user edits it.
    pub const DEFAULT_C0: f32 = 100.0;
}

/// Simulated clock.
pub mod clock {
    /// Real seconds that must accumulate before one simulated tick.
    pub const SECONDS_PER_TICK: f32 = 1.0;
    /// Simulated minutes added per tick.
    pub const MINUTES_PER_TICK: f32 = 1.0;
}

/// Room geometry.
pub mod room {
    /// Dimensions are clamped to this before any scaling (meters).
    pub const DIMENSION_FLOOR: f32 = 0.01;
    /// Half-extent of the normalized cuboid on every axis.
    pub const HALF_EXTENT: f32 = 0.5;

    pub const DEFAULT_WIDTH: f32 = 5.0;
    pub const DEFAULT_DEPTH: f32 = 5.0;
    pub const DEFAULT_HEIGHT: f32 = 3.0;
}

/// Opening sizes as fractions of the normalized face extent.
pub mod openings {
    pub const PASSAGE_HEIGHT_FRACTION: f32 = 0.7;
    pub const PASSAGE_WIDTH_FRACTION: f32 = 0.25;
    pub const WINDOW_HEIGHT_FRACTION: f32 = 0.5;
    pub const WINDOW_WIDTH_FRACTION: f32 = 0.4;

    /// Upper bound on passages and, separately, on windows.
    pub const MAX_PER_KIND: u8 = 2;
}

/// Particle spawning ranges (normalized room units).
pub mod particles {
    /// Spawn positions stay just inside the walls.
    pub const SPAWN_POSITION_LIMIT: f32 = 0.49;
    /// Per-axis speed bound, normalized units per second.
    pub const SPAWN_SPEED_LIMIT: f32 = 0.02;
    /// Spawned lifetime is `max_lifetime` times a factor in this range.
    pub const LIFETIME_FACTOR_MIN: f32 = 0.5;
    pub const LIFETIME_FACTOR_MAX: f32 = 1.0;
    /// Remaining lifetime forced onto a particle chosen for retirement.
    pub const RETIRE_LIFETIME: f32 = 0.1;
    /// Opacity of a freshly spawned particle.
    pub const FULL_ALPHA: f32 = 255.0;
    /// Reference concentration never falls below this.
    pub const MIN_REFERENCE_CONCENTRATION: f32 = 1.0;
    /// Target above `reference × OVERSHOOT_RATIO` becomes the new reference.
    pub const OVERSHOOT_RATIO: f32 = 1.5;
    /// Sprite depth factor clamp.
    pub const MIN_DEPTH_FACTOR: f32 = 0.2;
    pub const MAX_DEPTH_FACTOR: f32 = 1.0;
}
