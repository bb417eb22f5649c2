//! Particle cloud whose density tracks the current concentration.
//!
//! The target population is `max_particles · (C / C_ref)`, clamped to
//! `[0, max_particles]`, with `C_ref = max(C0, 1)` raised to `C` itself
//! once `C` overshoots `1.5 · C_ref`. The population moves toward the
//! target by at most `particles_per_frame_adjust` per frame, in either
//! direction, so a step change in concentration becomes a ramp.
//!
//! Particles live in normalized room coordinates and wrap toroidally at
//! the walls. Once a particle's lifetime runs out it fades at a constant
//! rate and is dropped when fully transparent. Retiring a particle only
//! shortens its lifetime, so it fades instead of vanishing.
//!
//! The population compared to the target is every particle not already
//! retiring. Expired particles keep counting while they fade, so the
//! collection itself tracks the target and a slot is refilled only once
//! its particle is gone.
//!
//! Randomness is injected: every call that spawns takes `&mut impl Rng`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::constants::particles::*;
use crate::constants::room::HALF_EXTENT;
use crate::geometry::Vec3;

/// One particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Normalized room position, each axis in `[-0.5, 0.5]`.
    pub position: Vec3,
    /// Normalized units per second.
    pub velocity: Vec3,
    /// Opacity in `[0, 255]`.
    pub alpha: f32,
    /// Seconds left before fading starts.
    pub lifetime: f32,
    /// Chosen for removal by the population controller.
    pub retiring: bool,
}

impl Particle {
    /// Counts toward the population: everything not yet marked for
    /// retirement, including particles fading out at the end of their life.
    pub fn is_active(&self) -> bool {
        !self.retiring
    }
}

/// Fresh particle at a random interior point.
pub fn spawn_particle(rng: &mut impl Rng, max_lifetime: f32) -> Particle {
    let mut coord = |limit: f32| rng.gen_range(-limit..=limit);
    let position = Vec3::new(
        coord(SPAWN_POSITION_LIMIT),
        coord(SPAWN_POSITION_LIMIT),
        coord(SPAWN_POSITION_LIMIT),
    );
    let velocity = Vec3::new(
        coord(SPAWN_SPEED_LIMIT),
        coord(SPAWN_SPEED_LIMIT),
        coord(SPAWN_SPEED_LIMIT),
    );
    let factor = rng.gen_range(LIFETIME_FACTOR_MIN..=LIFETIME_FACTOR_MAX);
    Particle {
        position,
        velocity,
        alpha: FULL_ALPHA,
        lifetime: max_lifetime * factor,
        retiring: false,
    }
}

/// Concentration the particle count is scaled against.
pub fn reference_concentration(target: f32, c0: f32) -> f32 {
    let reference = c0.max(MIN_REFERENCE_CONCENTRATION);
    if target > reference * OVERSHOOT_RATIO {
        target
    } else {
        reference
    }
}

/// Particle count that represents `target` when the run started at `c0`.
pub fn target_count(target: f32, c0: f32, max_particles: usize) -> usize {
    let reference = reference_concentration(target, c0);
    let raw = max_particles as f32 * (target / reference);
    if raw.is_nan() || raw <= 0.0 {
        return 0;
    }
    (raw as usize).min(max_particles)
}

/// Wrap one normalized coordinate back into the room, however far out.
fn wrap(v: f32) -> f32 {
    if (-HALF_EXTENT..=HALF_EXTENT).contains(&v) {
        return v;
    }
    (v + HALF_EXTENT).rem_euclid(2.0 * HALF_EXTENT) - HALF_EXTENT
}

/// What one [`ParticleSystem::tick`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub spawned: usize,
    pub retired: usize,
    pub removed: usize,
}

/// The particle collection and its population controller.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    target_concentration: f32,
    c0: f32,
    max_particles: usize,
    max_lifetime: f32,
    adjust_per_frame: usize,
    fade_rate: f32,
}

impl ParticleSystem {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            particles: Vec::with_capacity(config.max_particles),
            target_concentration: 0.0,
            c0: 0.0,
            max_particles: config.max_particles,
            max_lifetime: config.particle_max_lifetime,
            adjust_per_frame: config.particles_per_frame_adjust,
            fade_rate: config.fade_rate(),
        }
    }

    /// Set the run's initial concentration, which anchors the reference.
    pub fn set_initial_concentration(&mut self, c0: f32) {
        self.c0 = c0;
    }

    pub fn set_target_concentration(&mut self, concentration: f32) {
        self.target_concentration = concentration;
    }

    pub fn target_concentration(&self) -> f32 {
        self.target_concentration
    }

    /// Population the controller is steering toward.
    pub fn target_count(&self) -> usize {
        target_count(self.target_concentration, self.c0, self.max_particles)
    }

    /// Particles that count toward the population.
    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_active()).count()
    }

    /// All particles, oldest first.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Adjust the population toward the target, then move and fade
    /// every particle.
    pub fn tick(&mut self, dt_seconds: f32, rng: &mut impl Rng) -> TickSummary {
        let (spawned, retired) = self.adjust_population(rng);
        let removed = self.update(dt_seconds);
        TickSummary {
            spawned,
            retired,
            removed,
        }
    }

    /// Spawn or retire at most `adjust_per_frame` particles.
    ///
    /// Returns `(spawned, retired)`.
    pub fn adjust_population(&mut self, rng: &mut impl Rng) -> (usize, usize) {
        let target = self.target_count();
        let active = self.active_count();

        if target > active {
            let room = self.max_particles.saturating_sub(self.particles.len());
            let n = (target - active).min(self.adjust_per_frame).min(room);
            for _ in 0..n {
                self.particles.push(spawn_particle(rng, self.max_lifetime));
            }
            (n, 0)
        } else if target < active {
            let n = (active - target).min(self.adjust_per_frame);
            let mut retired = 0;
            for p in self.particles.iter_mut().filter(|p| p.is_active()).take(n) {
                p.retiring = true;
                p.lifetime = p.lifetime.min(RETIRE_LIFETIME);
                retired += 1;
            }
            (0, retired)
        } else {
            (0, 0)
        }
    }

    /// Integrate, wrap, age and fade. Returns how many particles were removed.
    pub fn update(&mut self, dt_seconds: f32) -> usize {
        let dt = if dt_seconds.is_finite() && dt_seconds > 0.0 {
            dt_seconds
        } else {
            0.0
        };
        let fade = self.fade_rate * dt;

        for p in &mut self.particles {
            p.position += p.velocity * dt;
            p.position = Vec3::new(wrap(p.position.x), wrap(p.position.y), wrap(p.position.z));
            p.lifetime -= dt;
            if p.lifetime <= 0.0 {
                p.alpha = (p.alpha - fade).max(0.0);
            }
        }

        let before = self.particles.len();
        self.particles.retain(|p| p.alpha > 0.0);
        before - self.particles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_config() -> SimConfig {
        SimConfig {
            max_particles: 40,
            particles_per_frame_adjust: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_target_count_proportional() {
        assert_eq!(target_count(50.0, 100.0, 500), 250);
        assert_eq!(target_count(100.0, 100.0, 500), 500);
        assert_eq!(target_count(0.0, 100.0, 500), 0);
    }

    #[test]
    fn test_target_count_bounded() {
        for c in [-10.0, 0.0, 0.5, 99.0, 140.0, 151.0, 1e6, f32::NAN] {
            let n = target_count(c, 100.0, 500);
            assert!(n <= 500, "{} particles for C={}", n, c);
        }
    }

    #[test]
    fn test_overshoot_raises_reference() {
        // Within 1.5× the reference the count saturates at the maximum...
        assert_eq!(target_count(140.0, 100.0, 500), 500);
        // ...beyond it the target becomes its own reference.
        assert_eq!(reference_concentration(200.0, 100.0), 200.0);
        assert_eq!(target_count(200.0, 100.0, 500), 500);
    }

    #[test]
    fn test_zero_c0_uses_unit_reference() {
        assert_eq!(reference_concentration(0.5, 0.0), 1.0);
        assert_eq!(target_count(0.5, 0.0, 100), 50);
    }

    #[test]
    fn test_target_count_monotonic() {
        let mut last = 0;
        for step in 0..=300 {
            let c = step as f32;
            let n = target_count(c, 100.0, 500);
            assert!(n >= last, "count fell from {} to {} at C={}", last, n, c);
            last = n;
        }
    }

    #[test]
    fn test_spawn_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = spawn_particle(&mut rng, 5.0);
            for v in [p.position.x, p.position.y, p.position.z] {
                assert!(v.abs() <= SPAWN_POSITION_LIMIT);
            }
            for v in [p.velocity.x, p.velocity.y, p.velocity.z] {
                assert!(v.abs() <= SPAWN_SPEED_LIMIT);
            }
            assert!(p.lifetime >= 2.5 && p.lifetime <= 5.0);
            assert_eq!(p.alpha, FULL_ALPHA);
        }
    }

    #[test]
    fn test_spawn_is_rate_limited() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut system = ParticleSystem::new(&small_config());
        system.set_initial_concentration(100.0);
        system.set_target_concentration(100.0);
        let summary = system.tick(1.0 / 60.0, &mut rng);
        assert_eq!(summary.spawned, 3);
        assert_eq!(system.len(), 3);
    }

    #[test]
    fn test_converges_to_target() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut system = ParticleSystem::new(&small_config());
        system.set_initial_concentration(100.0);
        system.set_target_concentration(50.0);
        for _ in 0..10 {
            system.tick(1.0 / 60.0, &mut rng);
        }
        assert_eq!(system.active_count(), 20);
        assert_eq!(system.len(), 20);
    }

    #[test]
    fn test_retire_fades_instead_of_deleting() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut system = ParticleSystem::new(&small_config());
        system.set_initial_concentration(100.0);
        system.set_target_concentration(100.0);
        for _ in 0..20 {
            system.tick(0.001, &mut rng);
        }
        assert_eq!(system.len(), 40);

        system.set_target_concentration(0.0);
        let summary = system.tick(0.001, &mut rng);
        assert_eq!(summary.retired, 3);
        assert_eq!(summary.removed, 0);
        assert_eq!(system.len(), 40);
        // The oldest particles are the ones marked.
        assert!(system.particles()[..3].iter().all(|p| p.retiring));
        assert!(system.particles()[..3].iter().all(|p| p.lifetime <= RETIRE_LIFETIME));
        assert!(!system.particles()[3].retiring);
    }

    #[test]
    fn test_fade_rate_and_removal() {
        let config = SimConfig::default();
        let mut system = ParticleSystem::new(&config);
        system.particles.push(Particle {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            alpha: FULL_ALPHA,
            lifetime: 0.0,
            retiring: false,
        });
        system.update(1.0);
        assert_eq!(system.particles()[0].alpha, FULL_ALPHA - 51.0);
        let removed = system.update(4.0);
        assert_eq!(removed, 1);
        assert!(system.is_empty());
    }

    #[test]
    fn test_toroidal_wrap() {
        let config = SimConfig::default();
        let mut system = ParticleSystem::new(&config);
        system.particles.push(Particle {
            position: Vec3::new(0.49, -0.49, 0.0),
            velocity: Vec3::new(0.02, -0.02, 0.0),
            alpha: FULL_ALPHA,
            lifetime: 10.0,
            retiring: false,
        });
        system.update(1.0);
        let p = system.particles()[0].position;
        assert!((p.x - (-0.49)).abs() < 1e-5, "x wrapped to {}", p.x);
        assert!((p.y - 0.49).abs() < 1e-5, "y wrapped to {}", p.y);
    }

    #[test]
    fn test_collection_never_exceeds_cap() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut system = ParticleSystem::new(&small_config());
        system.set_initial_concentration(10.0);
        system.set_target_concentration(10.0);
        // Long enough for many particles to expire and be replaced.
        for _ in 0..2000 {
            system.tick(1.0 / 30.0, &mut rng);
            assert!(system.len() <= 40);
        }
    }

    /// Run at 60 fps for `seconds`. Returns the mean and worst shortfall of
    /// the collection below the target, measured right after each
    /// population adjust, over the final five seconds.
    fn settle(system: &mut ParticleSystem, rng: &mut StdRng, seconds: usize) -> (f32, usize) {
        let frames = seconds * 60;
        let window = 5 * 60;
        let mut total = 0;
        let mut worst = 0;
        for frame in 0..frames {
            system.adjust_population(rng);
            assert!(system.len() <= system.max_particles());
            if frame >= frames - window {
                let shortfall = system.target_count().saturating_sub(system.len());
                assert!(system.len() <= system.target_count() + system.adjust_per_frame);
                total += shortfall;
                worst = worst.max(shortfall);
            }
            system.update(1.0 / 60.0);
        }
        (total as f32 / window as f32, worst)
    }

    #[test]
    fn test_collection_tracks_target_through_expiry() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut system = ParticleSystem::new(&SimConfig::default());
        system.set_initial_concentration(100.0);

        // Half of C0: half the budget, not the whole of it.
        system.set_target_concentration(50.0);
        let (mean, worst) = settle(&mut system, &mut rng, 60);
        assert_eq!(system.target_count(), 250);
        assert!(mean <= 2.0, "mean shortfall {} at C=50", mean);
        assert!(worst <= 10, "worst shortfall {} at C=50", worst);
        assert!(system.len() <= 252);

        // Full C0: expired particles still count while they fade.
        system.set_target_concentration(100.0);
        let (mean, worst) = settle(&mut system, &mut rng, 60);
        assert_eq!(system.target_count(), 500);
        assert!(mean <= 2.0, "mean shortfall {} at C=100", mean);
        assert!(worst <= 10, "worst shortfall {} at C=100", worst);
        assert_eq!(system.active_count(), system.len());
    }

    #[test]
    fn test_fading_particle_is_not_replaced_early() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut system = ParticleSystem::new(&small_config());
        system.set_initial_concentration(100.0);
        system.set_target_concentration(2.5);
        system.particles.push(Particle {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            alpha: 100.0,
            lifetime: -1.0,
            retiring: false,
        });
        assert_eq!(system.target_count(), 1);
        assert_eq!(system.active_count(), 1);
        assert_eq!(system.adjust_population(&mut rng), (0, 0));
        assert_eq!(system.len(), 1);
    }

    #[test]
    fn test_wrap_after_long_frame() {
        let config = SimConfig::default();
        let mut system = ParticleSystem::new(&config);
        system.particles.push(Particle {
            position: Vec3::new(0.3, -0.45, 0.0),
            velocity: Vec3::new(0.02, -0.02, 0.015),
            alpha: FULL_ALPHA,
            lifetime: 1000.0,
            retiring: false,
        });
        // 120 s moves x by 2.4 room widths.
        system.update(120.0);
        let p = system.particles()[0].position;
        for v in [p.x, p.y, p.z] {
            assert!(v.abs() <= 0.5, "{:?} left the room", p);
        }
        assert!((p.x - (-0.3)).abs() < 1e-4, "x wrapped to {}", p.x);
        assert!((p.z - (-0.2)).abs() < 1e-4, "z wrapped to {}", p.z);
    }
}
