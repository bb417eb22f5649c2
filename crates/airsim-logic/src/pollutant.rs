//! Pollutant types and their kinetic presets.
//!
//! Each variant indexes one row of [`PRESETS`]; initialization and reset
//! both read the same row.

use serde::{Deserialize, Serialize};

use crate::constants::kinetics::*;

/// Airborne pollutant being simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PollutantType {
    /// Coarse particulate matter.
    #[default]
    Pm10 = 0,
    /// Carbon monoxide.
    Co = 1,
    /// Chlorine gas.
    Cl2 = 2,
}

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const CYAN: Self = Self::new(0, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Per-pollutant preset row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollutantPreset {
    pub name: &'static str,
    /// Inflow rate for a sealed room.
    pub base_s: f32,
    /// Removal constant for a sealed room.
    pub base_k: f32,
    /// Particle tint.
    pub tint: Rgb,
}

/// Preset table, indexed by `PollutantType as usize`.
pub const PRESETS: [PollutantPreset; 3] = [
    PollutantPreset {
        name: "PM10",
        base_s: BASE_S_PM10,
        base_k: BASE_K_PM10,
        tint: Rgb::new(200, 200, 200),
    },
    PollutantPreset {
        name: "CO",
        base_s: BASE_S_CO,
        base_k: BASE_K_CO,
        tint: Rgb::new(100, 100, 100),
    },
    PollutantPreset {
        name: "Cl2",
        base_s: BASE_S_CL2,
        base_k: BASE_K_CL2,
        tint: Rgb::new(70, 70, 180),
    },
];

impl PollutantType {
    pub const ALL: [PollutantType; 3] = [PollutantType::Pm10, PollutantType::Co, PollutantType::Cl2];

    /// Settings-file index → variant. `None` for anything outside 0..=2.
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Pm10),
            1 => Some(Self::Co),
            2 => Some(Self::Cl2),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn preset(self) -> &'static PollutantPreset {
        &PRESETS[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.preset().name
    }

    pub fn tint(self) -> Rgb {
        self.preset().tint
    }
}

impl std::fmt::Display for PollutantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for p in PollutantType::ALL {
            assert_eq!(PollutantType::from_index(p.index() as i64), Some(p));
        }
    }

    #[test]
    fn test_unknown_index() {
        assert_eq!(PollutantType::from_index(3), None);
        assert_eq!(PollutantType::from_index(-1), None);
    }

    #[test]
    fn test_table_rows_match_variants() {
        assert_eq!(PollutantType::Pm10.preset().base_k, BASE_K_PM10);
        assert_eq!(PollutantType::Co.preset().base_s, BASE_S_CO);
        assert_eq!(PollutantType::Cl2.name(), "Cl2");
        assert_eq!(PollutantType::Cl2.tint(), Rgb::new(70, 70, 180));
    }

    #[test]
    fn test_presets_are_positive() {
        for preset in PRESETS {
            assert!(preset.base_s > 0.0, "{} has no inflow", preset.name);
            assert!(preset.base_k > K_FLOOR, "{} K below floor", preset.name);
        }
    }
}
