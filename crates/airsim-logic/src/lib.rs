//! Pure simulation logic for the indoor air pollution visualizer.
//!
//! This crate contains everything behind the simulation view that does not
//! need a window: the room cuboid and its projection, the single-zone
//! concentration model, the particle cloud that visualizes it, the opening
//! catalog and the settings file the setting view writes. Functions take
//! plain data and return results, so a native window, a headless harness
//! and the tests all drive the same code.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`concentration`] | Closed-form `C(t)`, run states, parameter editing rules |
//! | [`config`] | Particle and view tunables with validation |
//! | [`constants`] | Pollutant presets, opening increments, floors, clock rate |
//! | [`geometry`] | Vectors, cuboid topology, room dimensions, opening quads |
//! | [`input`] | Numeric field filtering, parsing and label formatting |
//! | [`openings`] | Passage and window slots on the room walls |
//! | [`particles`] | Concentration-driven particle population with fade-out |
//! | [`pollutant`] | Pollutant kinds, display names and tints |
//! | [`projection`] | Cuboid transform and perspective projection |
//! | [`render`] | Projected edges, opening outlines and particle sprites |
//! | [`settings`] | `key:value` room settings file |
//! | [`simulation`] | Per-frame driver tying the above together |

pub mod concentration;
pub mod config;
pub mod constants;
pub mod geometry;
pub mod input;
pub mod openings;
pub mod particles;
pub mod pollutant;
pub mod projection;
pub mod render;
pub mod settings;
pub mod simulation;
