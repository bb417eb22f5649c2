//! Session tunables for the simulation core.
//!
//! A host builds a [`SimConfig`] (usually `Default`, optionally loaded from
//! JSON) and hands it to [`crate::simulation::SimulationCore`]. Physical
//! presets are not here; they are fixed in [`crate::constants`].
//!
//! ```
//! use airsim_logic::config::{validate_config, SimConfig};
//!
//! let mut config = SimConfig::default();
//! config.max_particles = 200;
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::Point2;

/// Tunables for particles and the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Hard cap on the particle collection.
    pub max_particles: usize,
    /// Longest lifetime a spawned particle can get, in seconds.
    pub particle_max_lifetime: f32,
    /// Most particles spawned or retired in one frame.
    pub particles_per_frame_adjust: usize,
    /// Perspective focal length in view units.
    pub focal_length: f32,
    /// Screen extent the largest room dimension is fitted to.
    pub view_extent: f32,
    /// Screen position of the room centre.
    pub view_center: Point2,
    /// Initial pitch in radians.
    pub rotation_x: f32,
    /// Initial yaw in radians.
    pub rotation_y: f32,
    /// Yaw change per dragged pixel, in radians.
    pub drag_sensitivity: f32,
    /// Unscaled particle sprite radius in pixels.
    pub particle_radius: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_particles: 500,
            particle_max_lifetime: 5.0,
            particles_per_frame_adjust: 2,
            focal_length: 500.0,
            view_extent: 350.0,
            // Centre of a 60%-wide 3D pane on a 1366×768 window.
            view_center: Point2::new(409.8, 384.0),
            rotation_x: 25.0_f32.to_radians(),
            rotation_y: (-35.0_f32).to_radians(),
            drag_sensitivity: 0.005,
            particle_radius: 2.0,
        }
    }
}

impl SimConfig {
    /// Alpha lost per second once a particle's lifetime has run out.
    ///
    /// A fully opaque particle takes `particle_max_lifetime` seconds to fade.
    pub fn fade_rate(&self) -> f32 {
        if self.particle_max_lifetime > 0.0001 {
            255.0 / self.particle_max_lifetime
        } else {
            25_500.0
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No particles would ever be drawn.
    ZeroParticleBudget,
    /// Lifetime must be positive.
    NonPositiveLifetime(f32),
    /// Population could never change.
    ZeroAdjustRate,
    /// View extent must be positive.
    NonPositiveViewExtent(f32),
    /// A rotated corner could reach the eye plane (`z <= -focal_length`).
    FocalLengthTooShort { focal_length: f32, min_exclusive: f32 },
    /// Negative or non-finite sprite radius.
    InvalidParticleRadius(f32),
}

/// Farthest a rotated, view-fitted corner can sit from the room centre.
///
/// The fitted room fits in a cube of side `view_extent`, so no corner is
/// farther than half its space diagonal.
pub fn max_view_radius(view_extent: f32) -> f32 {
    view_extent * 3.0_f32.sqrt() / 2.0
}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &SimConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.max_particles == 0 {
        errors.push(ConfigError::ZeroParticleBudget);
    }
    if config.particle_max_lifetime <= 0.0 || !config.particle_max_lifetime.is_finite() {
        errors.push(ConfigError::NonPositiveLifetime(config.particle_max_lifetime));
    }
    if config.particles_per_frame_adjust == 0 {
        errors.push(ConfigError::ZeroAdjustRate);
    }
    if config.view_extent <= 0.0 || !config.view_extent.is_finite() {
        errors.push(ConfigError::NonPositiveViewExtent(config.view_extent));
    } else {
        let min_exclusive = max_view_radius(config.view_extent);
        if config.focal_length <= min_exclusive || !config.focal_length.is_finite() {
            errors.push(ConfigError::FocalLengthTooShort {
                focal_length: config.focal_length,
                min_exclusive,
            });
        }
    }
    if config.particle_radius < 0.0 || !config.particle_radius.is_finite() {
        errors.push(ConfigError::InvalidParticleRadius(config.particle_radius));
    }

    errors
}
