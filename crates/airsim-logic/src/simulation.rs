//! The simulation view's state, advanced once per rendered frame.
//!
//! Frame order inside [`SimulationCore::advance`]:
//! 1. Concentration model (whole simulated minutes only)
//! 2. Particle target from the current concentration
//! 3. Particle population adjust, move, fade
//! 4. Room geometry re-projection (only if rotation, size or openings changed)
//! 5. Particle sprites

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::concentration::{
    ConcentrationModel, ParameterUpdate, RunState, SimulationParameters, SimulationState,
};
use crate::config::SimConfig;
use crate::constants::kinetics::DEFAULT_C0;
use crate::geometry::RoomDimensions;
use crate::input::format_fixed;
use crate::openings::{OpeningCatalog, OpeningKind};
use crate::particles::{ParticleSystem, TickSummary};
use crate::pollutant::PollutantType;
use crate::projection::ViewTransform;
use crate::render::{project_particles, GeometryCache, RenderFrame};
use crate::settings::RoomSettings;

/// Values shown next to the 3D view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Readouts {
    pub pollutant: PollutantType,
    pub run_state: RunState,
    pub volume: f32,
    pub time_minutes: f32,
    pub concentration: f32,
    pub c0: f32,
    pub s: f32,
    pub k: f32,
    pub particles: usize,
}

impl Readouts {
    /// Label/value pairs at display precision.
    pub fn formatted(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Pollutant", self.pollutant.name().to_string()),
            ("V (m^3)", format_fixed(self.volume, 2)),
            ("t (min)", format_fixed(self.time_minutes, 0)),
            ("C(t)", format_fixed(self.concentration, 2)),
            ("C0", format_fixed(self.c0, 1)),
            ("S", format_fixed(self.s, 2)),
            ("K", format_fixed(self.k, 3)),
            ("State", format!("{:?}", self.run_state)),
        ]
    }
}

/// What one [`SimulationCore::advance`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Simulated minutes taken this frame.
    pub ticks: u32,
    pub particles: TickSummary,
    /// Whether room geometry was re-projected.
    pub geometry_rebuilt: bool,
}

/// Concentration model, particles, openings and view for one room.
pub struct SimulationCore<R: Rng = StdRng> {
    config: SimConfig,
    dimensions: RoomDimensions,
    pollutant: PollutantType,
    catalog: OpeningCatalog,
    model: ConcentrationModel,
    particles: ParticleSystem,
    rotation_x: f32,
    rotation_y: f32,
    geometry: GeometryCache,
    frame: RenderFrame,
    rng: R,
}

impl SimulationCore<StdRng> {
    /// Default room, entropy-seeded particles.
    pub fn new(config: SimConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Default room, particles seeded from `seed`.
    pub fn seeded(config: SimConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SimulationCore<R> {
    pub fn with_rng(config: SimConfig, rng: R) -> Self {
        let dimensions = RoomDimensions::default();
        let pollutant = PollutantType::default();
        let catalog = OpeningCatalog::default();
        let model = ConcentrationModel::new(pollutant, dimensions.volume(), 0, 0);
        let particles = ParticleSystem::new(&config);
        let mut core = Self {
            rotation_x: config.rotation_x,
            rotation_y: config.rotation_y,
            config,
            dimensions,
            pollutant,
            catalog,
            model,
            particles,
            geometry: GeometryCache::new(),
            frame: RenderFrame::default(),
            rng,
        };
        core.sync_particle_target();
        core.rebuild_frame();
        core
    }

    // =====================================================================
    // Setup
    // =====================================================================

    /// Enter the simulation with a new room. Resets the run.
    pub fn load_parameters(
        &mut self,
        dimensions: RoomDimensions,
        pollutant: PollutantType,
        passages: u8,
        windows: u8,
    ) {
        self.dimensions = dimensions;
        self.pollutant = pollutant;
        self.catalog = OpeningCatalog::with_counts(passages, windows);
        self.geometry.invalidate();
        self.model.reconfigure(
            pollutant,
            dimensions.volume(),
            self.catalog.passage_count(),
            self.catalog.window_count(),
        );
        self.particles.clear();
        self.sync_particle_target();
        self.rebuild_frame();
        let p = self.model.parameters();
        log::info!(
            "loaded room {}x{}x{} m, {}, {} passages, {} windows: V={:.2} S={} K={}",
            dimensions.width,
            dimensions.depth,
            dimensions.height,
            pollutant,
            self.catalog.passage_count(),
            self.catalog.window_count(),
            p.v,
            p.s,
            p.k
        );
    }

    pub fn load_settings(&mut self, settings: &RoomSettings) {
        self.load_parameters(
            settings.dimensions,
            settings.pollutant,
            settings.passages,
            settings.windows,
        );
    }

    /// Current room as settings, for writing back to disk.
    pub fn room_settings(&self) -> RoomSettings {
        RoomSettings {
            dimensions: self.dimensions,
            pollutant: self.pollutant,
            passages: self.catalog.passage_count(),
            windows: self.catalog.window_count(),
        }
    }

    /// Add a passage or window. Returns `false` if that kind is full.
    ///
    /// S and K presets follow the new opening count, which resets the run.
    pub fn add_opening(&mut self, kind: OpeningKind) -> bool {
        let changed = self.catalog.add(kind);
        if changed {
            self.apply_openings();
        }
        changed
    }

    /// Remove the last passage or window. Returns `false` if there is none.
    pub fn remove_opening(&mut self, kind: OpeningKind) -> bool {
        let changed = self.catalog.remove(kind);
        if changed {
            self.apply_openings();
        }
        changed
    }

    fn apply_openings(&mut self) {
        self.model.reconfigure(
            self.pollutant,
            self.dimensions.volume(),
            self.catalog.passage_count(),
            self.catalog.window_count(),
        );
        self.sync_particle_target();
        self.rebuild_frame();
        let p = self.model.parameters();
        log::info!(
            "openings now {} passages, {} windows: S={} K={}",
            self.catalog.passage_count(),
            self.catalog.window_count(),
            p.s,
            p.k
        );
    }

    /// Apply the C0/S/K input boxes. See [`ConcentrationModel::set_user_parameters`].
    pub fn set_user_parameters(&mut self, c0: f32, s: f32, k: f32) -> ParameterUpdate {
        let update = self.model.set_user_parameters(c0, s, k);
        self.sync_particle_target();
        update
    }

    // =====================================================================
    // Run control
    // =====================================================================

    pub fn start(&mut self) {
        self.model.start();
        self.sync_particle_target();
    }

    pub fn stop(&mut self) {
        self.model.stop();
    }

    /// Back to Idle with the default C0; particles re-ramp from empty.
    pub fn reset_state(&mut self) {
        self.model.reset();
        self.particles.clear();
        self.sync_particle_target();
        self.rebuild_frame();
        log::info!("state reset, C0={}", DEFAULT_C0);
    }

    /// Advance one rendered frame of `dt_seconds` real time.
    pub fn advance(&mut self, dt_seconds: f32) -> FrameReport {
        let ticks = self.model.advance(dt_seconds);
        self.sync_particle_target();
        let particles = self.particles.tick(dt_seconds, &mut self.rng);
        let geometry_rebuilt = self.rebuild_frame();
        FrameReport {
            ticks,
            particles,
            geometry_rebuilt,
        }
    }

    // =====================================================================
    // View
    // =====================================================================

    /// Horizontal mouse drag of `dx_pixels` turns the room about its vertical axis.
    pub fn orbit(&mut self, dx_pixels: f32) {
        if dx_pixels.is_finite() {
            self.rotation_y += dx_pixels * self.config.drag_sensitivity;
        }
    }

    pub fn set_rotation(&mut self, rotation_x: f32, rotation_y: f32) {
        if rotation_x.is_finite() && rotation_y.is_finite() {
            self.rotation_x = rotation_x;
            self.rotation_y = rotation_y;
        }
    }

    pub fn rotation(&self) -> (f32, f32) {
        (self.rotation_x, self.rotation_y)
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn dimensions(&self) -> RoomDimensions {
        self.dimensions
    }

    pub fn pollutant(&self) -> PollutantType {
        self.pollutant
    }

    pub fn catalog(&self) -> &OpeningCatalog {
        &self.catalog
    }

    pub fn run_state(&self) -> RunState {
        self.model.run_state()
    }

    pub fn parameters(&self) -> SimulationParameters {
        self.model.parameters()
    }

    pub fn state(&self) -> SimulationState {
        self.model.state()
    }

    pub fn volume(&self) -> f32 {
        self.model.parameters().v
    }

    pub fn time_minutes(&self) -> f32 {
        self.model.time_minutes()
    }

    pub fn concentration(&self) -> f32 {
        self.model.concentration()
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Last assembled frame. Refreshed by [`advance`](Self::advance).
    pub fn frame(&self) -> &RenderFrame {
        &self.frame
    }

    pub fn readouts(&self) -> Readouts {
        let p = self.model.parameters();
        Readouts {
            pollutant: self.pollutant,
            run_state: self.model.run_state(),
            volume: p.v,
            time_minutes: self.model.time_minutes(),
            concentration: self.model.concentration(),
            c0: p.c0,
            s: p.s,
            k: p.k,
            particles: self.particles.active_count(),
        }
    }

    fn sync_particle_target(&mut self) {
        self.particles
            .set_initial_concentration(self.model.parameters().c0);
        self.particles
            .set_target_concentration(self.model.concentration());
    }

    fn rebuild_frame(&mut self) -> bool {
        let rebuilt = self.geometry.refresh(
            &self.dimensions,
            self.rotation_x,
            self.rotation_y,
            &self.catalog,
            &self.config,
        );
        if rebuilt {
            self.frame.edges = self.geometry.edges().to_vec();
            self.frame.openings = self.geometry.openings().to_vec();
        }
        let view = ViewTransform::new(
            &self.dimensions,
            self.rotation_x,
            self.rotation_y,
            self.config.view_extent,
        );
        self.frame.particles = project_particles(
            self.particles.particles(),
            &view,
            self.pollutant.tint(),
            &self.config,
        );
        rebuilt
    }
}
