//! Single-zone pollutant concentration as a closed-form first-order model.
//!
//! The room is treated as one well-mixed volume with constant inflow `S`
//! and proportional removal `K`:
//!
//! ```text
//! term = S / (K·V)
//! C(t) = (C0 − term)·e^(−K·t) + term,   clamped to ≥ 0
//! ```
//!
//! `t` is in simulated minutes. Time advances in whole ticks: every full
//! real second accumulated by [`ConcentrationModel::advance`] adds one
//! simulated minute, and `C(t)` is recomputed from the closed form rather
//! than integrated, so results do not depend on frame rate.
//!
//! # Run states
//!
//! | State | Time | C0 | S, K |
//! |-------|------|----|------|
//! | `Idle` | 0, frozen | editable | editable |
//! | `Running` | advancing | locked | locked |
//! | `Paused` | frozen | locked | editable |
//!
//! ```
//! use airsim_logic::concentration::concentration_at;
//!
//! // Pure decay: S = 0, K = 0.1, C0 = 100 → C(10) = 100·e^-1
//! let c = concentration_at(100.0, 0.0, 0.1, 75.0, 10.0);
//! assert!((c - 36.788).abs() < 0.01);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::clock::{MINUTES_PER_TICK, SECONDS_PER_TICK};
use crate::constants::kinetics::*;
use crate::pollutant::PollutantType;

/// Closed-form concentration at simulated minute `t`.
///
/// `k` and `v` are floored before use, so the result is always finite
/// for finite inputs.
pub fn concentration_at(c0: f32, s: f32, k: f32, v: f32, t: f32) -> f32 {
    let k = floor_k(k);
    let v = floor_volume(v);
    let term = steady_state(s, k, v);
    ((c0 - term) * (-k * t).exp() + term).max(0.0)
}

/// Concentration the room settles at as `t → ∞`.
pub fn steady_state(s: f32, k: f32, v: f32) -> f32 {
    s / (floor_k(k) * floor_volume(v))
}

fn floor_k(k: f32) -> f32 {
    if k > K_FLOOR {
        k
    } else {
        K_FLOOR
    }
}

fn floor_volume(v: f32) -> f32 {
    if v > VOLUME_FLOOR {
        v
    } else {
        VOLUME_FLOOR
    }
}

/// Inflow rate and removal constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinetics {
    pub s: f32,
    pub k: f32,
}

/// Default kinetics for a pollutant with the given openings.
///
/// Each passage and each window adds its own fixed increment to the
/// pollutant's sealed-room base values.
pub fn preset_kinetics(pollutant: PollutantType, passages: u8, windows: u8) -> Kinetics {
    let base = pollutant.preset();
    let p = f32::from(passages);
    let w = f32::from(windows);
    Kinetics {
        s: base.base_s + p * S_ADJUST_PASSAGE + w * S_ADJUST_WINDOW,
        k: floor_k(base.base_k + p * K_ADJUST_PASSAGE + w * K_ADJUST_WINDOW),
    }
}

/// Simulation run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RunState {
    /// Never started since the last reset; C0 editable.
    #[default]
    Idle,
    /// Time advancing; parameters locked.
    Running,
    /// Time frozen; C0 locked, S and K editable.
    Paused,
}

/// Host command driving [`RunState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunCommand {
    Start,
    Stop,
    Reset,
}

impl RunState {
    /// Transition function.
    pub fn next(self, command: RunCommand) -> RunState {
        match (self, command) {
            (_, RunCommand::Reset) => RunState::Idle,
            (_, RunCommand::Start) => RunState::Running,
            (RunState::Idle, RunCommand::Stop) => RunState::Idle,
            (RunState::Running | RunState::Paused, RunCommand::Stop) => RunState::Paused,
        }
    }

    pub fn c0_locked(self) -> bool {
        self != RunState::Idle
    }

    pub fn kinetics_editable(self) -> bool {
        self != RunState::Running
    }
}

/// C0, S, K and V as used by the closed form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub c0: f32,
    pub s: f32,
    pub k: f32,
    pub v: f32,
}

/// Current simulated time and concentration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Simulated minutes since start.
    pub time_minutes: f32,
    /// Concentration at `time_minutes`, never negative.
    pub concentration: f32,
}

/// What [`ConcentrationModel::set_user_parameters`] actually applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterUpdate {
    /// The C0 now in effect (after clamping), if C0 was accepted.
    pub c0: Option<f32>,
    /// `true` when a negative C0 was coerced to 0 and the input should be
    /// rewritten with the corrected value.
    pub c0_corrected: bool,
    /// Whether S and K were accepted.
    pub kinetics_applied: bool,
    /// `true` when K was raised to the floor.
    pub k_floored: bool,
}

/// Owns the parameters, run state and clock of one simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcentrationModel {
    params: SimulationParameters,
    state: SimulationState,
    run_state: RunState,
    preset: Kinetics,
    accumulator: f32,
}

impl ConcentrationModel {
    /// Idle model with preset kinetics and the default C0.
    pub fn new(pollutant: PollutantType, volume: f32, passages: u8, windows: u8) -> Self {
        let preset = preset_kinetics(pollutant, passages, windows);
        Self {
            params: SimulationParameters {
                c0: DEFAULT_C0,
                s: preset.s,
                k: preset.k,
                v: floor_volume(volume),
            },
            state: SimulationState {
                time_minutes: 0.0,
                concentration: DEFAULT_C0,
            },
            run_state: RunState::Idle,
            preset,
            accumulator: 0.0,
        }
    }

    pub fn parameters(&self) -> SimulationParameters {
        self.params
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn time_minutes(&self) -> f32 {
        self.state.time_minutes
    }

    pub fn concentration(&self) -> f32 {
        self.state.concentration
    }

    pub fn preset(&self) -> Kinetics {
        self.preset
    }

    /// Apply user-entered parameters where the run state allows it.
    ///
    /// C0 is honored only while Idle; S and K only while not Running.
    pub fn set_user_parameters(&mut self, c0: f32, s: f32, k: f32) -> ParameterUpdate {
        let mut update = ParameterUpdate {
            c0: None,
            c0_corrected: false,
            kinetics_applied: false,
            k_floored: false,
        };

        if !self.run_state.c0_locked() {
            let clamped = if c0 > 0.0 { c0 } else { 0.0 };
            update.c0_corrected = clamped != c0;
            self.params.c0 = clamped;
            self.state.concentration = clamped;
            update.c0 = Some(clamped);
        }

        if self.run_state.kinetics_editable() {
            self.params.s = s;
            self.params.k = floor_k(k);
            update.k_floored = self.params.k != k;
            update.kinetics_applied = true;
        } else {
            log::debug!("S/K edit ignored while running");
        }

        update
    }

    /// Idle/Paused → Running. Locks C0 on the first start.
    pub fn start(&mut self) {
        if self.params.k <= K_FLOOR {
            log::warn!("K={} at or below floor, using {}", self.params.k, K_FLOOR);
            self.params.k = K_FLOOR;
        }
        if self.state.time_minutes == 0.0 {
            self.state.concentration = self.params.c0;
        }
        self.transition(RunCommand::Start);
    }

    /// Running → Paused. Time stops accumulating.
    pub fn stop(&mut self) {
        self.transition(RunCommand::Stop);
    }

    /// Any state → Idle: clear time, restore preset S/K and default C0.
    pub fn reset(&mut self) {
        self.transition(RunCommand::Reset);
        self.accumulator = 0.0;
        self.params.s = self.preset.s;
        self.params.k = self.preset.k;
        self.params.c0 = DEFAULT_C0;
        self.state = SimulationState {
            time_minutes: 0.0,
            concentration: DEFAULT_C0,
        };
    }

    /// Replace room volume and opening-derived presets, then reset.
    pub fn reconfigure(&mut self, pollutant: PollutantType, volume: f32, passages: u8, windows: u8) {
        self.preset = preset_kinetics(pollutant, passages, windows);
        self.params.v = floor_volume(volume);
        self.reset();
    }

    /// Feed elapsed real seconds. Returns the number of simulated ticks taken.
    pub fn advance(&mut self, dt_seconds: f32) -> u32 {
        if self.run_state != RunState::Running || !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return 0;
        }
        self.accumulator += dt_seconds;
        let ticks = (self.accumulator / SECONDS_PER_TICK).floor();
        if ticks < 1.0 {
            return 0;
        }
        self.accumulator -= ticks * SECONDS_PER_TICK;
        self.state.time_minutes += ticks * MINUTES_PER_TICK;
        self.recompute();
        ticks as u32
    }

    fn recompute(&mut self) {
        let p = &self.params;
        self.state.concentration = concentration_at(p.c0, p.s, p.k, p.v, self.state.time_minutes);
    }

    fn transition(&mut self, command: RunCommand) {
        let next = self.run_state.next(command);
        if next != self.run_state {
            log::info!("simulation {:?} -> {:?}", self.run_state, next);
        }
        self.run_state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn model() -> ConcentrationModel {
        ConcentrationModel::new(PollutantType::Pm10, 75.0, 0, 0)
    }

    #[test]
    fn test_initial_value_is_c0() {
        for c0 in [0.0, 1.0, 100.0, 2500.0] {
            assert_relative_eq!(concentration_at(c0, 3.0, 0.02, 75.0, 0.0), c0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_pure_decay() {
        let c = concentration_at(100.0, 0.0, 0.1, 42.0, 10.0);
        assert_abs_diff_eq!(c, 36.79, epsilon = 0.01);
    }

    #[test]
    fn test_converges_to_steady_state() {
        let term = steady_state(5.0, 0.05, 20.0);
        for c0 in [0.0, 100.0, 1000.0] {
            let c = concentration_at(c0, 5.0, 0.05, 20.0, 2000.0);
            assert_relative_eq!(c, term, max_relative = 1e-4);
        }
    }

    #[test]
    fn test_never_negative() {
        // Huge negative transient still clamps.
        let c = concentration_at(-50.0, 0.0, 0.01, 10.0, 1.0);
        assert_eq!(c, 0.0);
    }

    #[test]
    fn test_zero_k_is_floored() {
        let c = concentration_at(100.0, 1.0, 0.0, 10.0, 5.0);
        assert!(c.is_finite());
        assert_eq!(steady_state(1.0, 0.0, 10.0), 1.0 / (K_FLOOR * 10.0));
    }

    #[test]
    fn test_preset_counts_openings() {
        let k = preset_kinetics(PollutantType::Co, 2, 1);
        assert_relative_eq!(k.s, BASE_S_CO + 2.0 * S_ADJUST_PASSAGE + S_ADJUST_WINDOW);
        assert_relative_eq!(k.k, BASE_K_CO + 2.0 * K_ADJUST_PASSAGE + K_ADJUST_WINDOW);
    }

    #[test]
    fn test_transitions() {
        use RunCommand::*;
        assert_eq!(RunState::Idle.next(Stop), RunState::Idle);
        assert_eq!(RunState::Idle.next(Start), RunState::Running);
        assert_eq!(RunState::Running.next(Stop), RunState::Paused);
        assert_eq!(RunState::Paused.next(Start), RunState::Running);
        assert_eq!(RunState::Paused.next(Reset), RunState::Idle);
        assert_eq!(RunState::Running.next(Reset), RunState::Idle);
    }

    #[test]
    fn test_one_tick_per_second() {
        let mut m = model();
        m.start();
        assert_eq!(m.advance(0.4), 0);
        assert_eq!(m.advance(0.4), 0);
        assert_eq!(m.advance(0.4), 1);
        assert_eq!(m.time_minutes(), 1.0);
    }

    #[test]
    fn test_long_frame_consumes_all_ticks() {
        let mut m = model();
        m.start();
        assert_eq!(m.advance(3.5), 3);
        assert_eq!(m.time_minutes(), 3.0);
        assert_eq!(m.advance(0.5), 1);
    }

    #[test]
    fn test_frame_rate_independence() {
        let mut fast = model();
        let mut slow = model();
        fast.start();
        slow.start();
        for _ in 0..600 {
            fast.advance(1.0 / 60.0);
        }
        for _ in 0..10 {
            slow.advance(1.0);
        }
        // 600 × (1/60) can land just under 10.0 in f32.
        assert!(fast.time_minutes() >= 9.0 && fast.time_minutes() <= 10.0);
        let reference = model();
        let p = reference.parameters();
        assert_relative_eq!(
            slow.concentration(),
            concentration_at(p.c0, p.s, p.k, p.v, 10.0),
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_idle_does_not_advance() {
        let mut m = model();
        assert_eq!(m.advance(5.0), 0);
        assert_eq!(m.time_minutes(), 0.0);
    }

    #[test]
    fn test_paused_freezes_time() {
        let mut m = model();
        m.start();
        m.advance(2.0);
        m.stop();
        assert_eq!(m.advance(10.0), 0);
        assert_eq!(m.time_minutes(), 2.0);
        assert_eq!(m.run_state(), RunState::Paused);
    }

    #[test]
    fn test_c0_locked_after_start() {
        let mut m = model();
        let update = m.set_user_parameters(250.0, 1.0, 0.01);
        assert_eq!(update.c0, Some(250.0));
        m.start();
        m.stop();
        let update = m.set_user_parameters(10.0, 2.0, 0.02);
        assert_eq!(update.c0, None);
        assert!(update.kinetics_applied);
        assert_eq!(m.parameters().c0, 250.0);
        assert_eq!(m.parameters().s, 2.0);
    }

    #[test]
    fn test_kinetics_locked_while_running() {
        let mut m = model();
        m.start();
        let before = m.parameters();
        let update = m.set_user_parameters(1.0, 99.0, 9.0);
        assert!(!update.kinetics_applied);
        assert_eq!(m.parameters(), before);
    }

    #[test]
    fn test_negative_c0_coerced() {
        let mut m = model();
        let update = m.set_user_parameters(-5.0, 1.0, 0.01);
        assert_eq!(update.c0, Some(0.0));
        assert!(update.c0_corrected);
        assert_eq!(m.concentration(), 0.0);
    }

    #[test]
    fn test_k_floor_reported() {
        let mut m = model();
        let update = m.set_user_parameters(100.0, 1.0, 0.0);
        assert!(update.k_floored);
        assert_eq!(m.parameters().k, K_FLOOR);
    }

    #[test]
    fn test_reset_restores_presets() {
        let mut m = ConcentrationModel::new(PollutantType::Cl2, 30.0, 1, 1);
        m.set_user_parameters(400.0, 50.0, 0.5);
        m.start();
        m.advance(5.0);
        m.reset();
        assert_eq!(m.run_state(), RunState::Idle);
        assert_eq!(m.time_minutes(), 0.0);
        assert_eq!(m.parameters().c0, DEFAULT_C0);
        assert_eq!(m.parameters().s, m.preset().s);
        assert_eq!(m.parameters().k, m.preset().k);
        assert_eq!(m.concentration(), DEFAULT_C0);
        // C0 editable again.
        assert_eq!(m.set_user_parameters(12.0, 1.0, 0.1).c0, Some(12.0));
    }
}
