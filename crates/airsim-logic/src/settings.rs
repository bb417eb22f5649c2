//! Plain-text room settings shared between the setting and simulation views.
//!
//! One `key:value` pair per line, in any order:
//!
//! ```text
//! width:5
//! depth:5
//! height:3
//! pollutant_index:0
//! passages_count:1
//! windows_count:2
//! ```
//!
//! Parsing never fails. Anything unreadable falls back to the default for
//! that key and is reported as a [`SettingsIssue`] (and logged).

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::openings::MAX_PER_KIND;
use crate::geometry::RoomDimensions;
use crate::pollutant::PollutantType;

/// File name the views exchange settings through.
pub const SETTINGS_FILE_NAME: &str = "Setting_values.text";

const KEY_WIDTH: &str = "width";
const KEY_DEPTH: &str = "depth";
const KEY_HEIGHT: &str = "height";
const KEY_POLLUTANT: &str = "pollutant_index";
const KEY_PASSAGES: &str = "passages_count";
const KEY_WINDOWS: &str = "windows_count";

const ALL_KEYS: [&str; 6] = [
    KEY_WIDTH,
    KEY_DEPTH,
    KEY_HEIGHT,
    KEY_POLLUTANT,
    KEY_PASSAGES,
    KEY_WINDOWS,
];

/// Everything the simulation needs from the setting view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub dimensions: RoomDimensions,
    pub pollutant: PollutantType,
    pub passages: u8,
    pub windows: u8,
}

/// A recoverable problem found while reading settings.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsIssue {
    /// Non-blank line with no `:` separator.
    MalformedLine { line: usize, text: String },
    /// Value could not be parsed for its key.
    InvalidValue { key: String, value: String },
    /// Pollutant index outside the known range.
    UnknownPollutant(i64),
    /// Opening count outside `0..=2`; the clamped value was used.
    CountOutOfRange { key: &'static str, value: i64 },
    /// Key never appeared; its default was used.
    MissingKey(&'static str),
    /// Key not recognised; the line was ignored.
    UnknownKey(String),
}

impl fmt::Display for SettingsIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedLine { line, text } => {
                write!(f, "line {} has no ':' separator: {:?}", line, text)
            }
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value for {}: {:?}, using default", key, value)
            }
            Self::UnknownPollutant(index) => {
                write!(f, "unknown pollutant index {}, using PM10", index)
            }
            Self::CountOutOfRange { key, value } => {
                write!(f, "{} = {} outside 0..={}, clamped", key, value, MAX_PER_KIND)
            }
            Self::MissingKey(key) => write!(f, "missing {}, using default", key),
            Self::UnknownKey(key) => write!(f, "ignoring unknown key {:?}", key),
        }
    }
}

fn parse_float(key: &str, value: &str, issues: &mut Vec<SettingsIssue>) -> Option<f32> {
    match value.parse::<f32>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            issues.push(SettingsIssue::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            });
            None
        }
    }
}

fn parse_int(key: &str, value: &str, issues: &mut Vec<SettingsIssue>) -> Option<i64> {
    match value.parse::<i64>() {
        Ok(v) => Some(v),
        Err(_) => {
            issues.push(SettingsIssue::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            });
            None
        }
    }
}

fn parse_count(key: &'static str, value: &str, issues: &mut Vec<SettingsIssue>) -> Option<u8> {
    let v = parse_int(key, value, issues)?;
    let clamped = v.clamp(0, i64::from(MAX_PER_KIND));
    if clamped != v {
        issues.push(SettingsIssue::CountOutOfRange { key, value: v });
    }
    Some(clamped as u8)
}

/// Parse settings text, recovering every problem to a default.
pub fn parse_settings(text: &str) -> (RoomSettings, Vec<SettingsIssue>) {
    let mut settings = RoomSettings::default();
    let mut issues = Vec::new();
    let mut seen: Vec<&'static str> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            issues.push(SettingsIssue::MalformedLine {
                line: index + 1,
                text: line.to_string(),
            });
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        let Some(&known) = ALL_KEYS.iter().find(|&&k| k == key) else {
            issues.push(SettingsIssue::UnknownKey(key.to_string()));
            continue;
        };
        seen.push(known);

        match known {
            KEY_WIDTH => {
                if let Some(v) = parse_float(known, value, &mut issues) {
                    settings.dimensions.width = v;
                }
            }
            KEY_DEPTH => {
                if let Some(v) = parse_float(known, value, &mut issues) {
                    settings.dimensions.depth = v;
                }
            }
            KEY_HEIGHT => {
                if let Some(v) = parse_float(known, value, &mut issues) {
                    settings.dimensions.height = v;
                }
            }
            KEY_POLLUTANT => {
                if let Some(v) = parse_int(known, value, &mut issues) {
                    match PollutantType::from_index(v) {
                        Some(p) => settings.pollutant = p,
                        None => issues.push(SettingsIssue::UnknownPollutant(v)),
                    }
                }
            }
            KEY_PASSAGES => {
                if let Some(v) = parse_count(known, value, &mut issues) {
                    settings.passages = v;
                }
            }
            KEY_WINDOWS => {
                if let Some(v) = parse_count(known, value, &mut issues) {
                    settings.windows = v;
                }
            }
            _ => unreachable!("key filtered against ALL_KEYS"),
        }
    }

    for key in ALL_KEYS {
        if !seen.contains(&key) {
            issues.push(SettingsIssue::MissingKey(key));
        }
    }

    for issue in &issues {
        match issue {
            SettingsIssue::MissingKey(_) | SettingsIssue::UnknownKey(_) => {
                log::info!("settings: {}", issue)
            }
            _ => log::warn!("settings: {}", issue),
        }
    }

    (settings, issues)
}

impl RoomSettings {
    /// Serialize to the `key:value` format read by [`parse_settings`].
    pub fn to_text(&self) -> String {
        let d = &self.dimensions;
        format!(
            "{}:{}\n{}:{}\n{}:{}\n{}:{}\n{}:{}\n{}:{}\n",
            KEY_WIDTH,
            d.width,
            KEY_DEPTH,
            d.depth,
            KEY_HEIGHT,
            d.height,
            KEY_POLLUTANT,
            self.pollutant.index(),
            KEY_PASSAGES,
            self.passages,
            KEY_WINDOWS,
            self.windows,
        )
    }
}

/// Read and parse a settings file.
pub fn load_settings(path: &Path) -> io::Result<(RoomSettings, Vec<SettingsIssue>)> {
    let text = fs::read_to_string(path)?;
    Ok(parse_settings(&text))
}

/// Read a settings file, falling back to defaults if it cannot be opened.
pub fn load_settings_or_default(path: &Path) -> RoomSettings {
    match load_settings(path) {
        Ok((settings, _)) => settings,
        Err(e) => {
            log::warn!(
                "could not open settings {}: {}, using defaults",
                path.display(),
                e
            );
            RoomSettings::default()
        }
    }
}

/// Write settings to `path`, replacing any existing file.
pub fn save_settings(path: &Path, settings: &RoomSettings) -> io::Result<()> {
    fs::write(path, settings.to_text())?;
    log::info!("saved settings to {}", path.display());
    Ok(())
}
