//! Operator attitude/altitude corrections and their normalization.
//!
//! Corrections arrive as a loose key/value map (usually straight from a JSON
//! config). Each recognised key that is missing or not a number is replaced by
//! `0.0` and reported once at `warn` level; the run carries on.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const DELTA_ROLL: &str = "DELTA_ROLL";
pub const DELTA_PITCH: &str = "DELTA_PITCH";
pub const DELTA_YAW: &str = "DELTA_YAW";
pub const DELTA_ALT: &str = "DELTA_ALT";

/// Keys recognised in a correction map.
pub const CORRECTION_KEYS: [&str; 4] = [DELTA_ROLL, DELTA_PITCH, DELTA_YAW, DELTA_ALT];

/// Additive offsets applied to the recorded attitude (degrees) and altitude
/// (metres).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionOffsets {
    #[serde(rename = "DELTA_ROLL")]
    pub delta_roll_deg: f64,
    #[serde(rename = "DELTA_PITCH")]
    pub delta_pitch_deg: f64,
    #[serde(rename = "DELTA_YAW")]
    pub delta_yaw_deg: f64,
    #[serde(rename = "DELTA_ALT")]
    pub delta_alt_m: f64,
}

/// Why a correction value was replaced by `0.0`.
#[derive(Clone, Debug, PartialEq)]
pub enum MalformedCorrection {
    Missing { key: &'static str },
    NotANumber { key: &'static str, found: String },
}

impl MalformedCorrection {
    pub fn key(&self) -> &'static str {
        match self {
            MalformedCorrection::Missing { key }
            | MalformedCorrection::NotANumber { key, .. } => *key,
        }
    }
}

impl fmt::Display for MalformedCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedCorrection::Missing { key } => {
                write!(f, "correction {key} missing, using 0.0")
            }
            MalformedCorrection::NotANumber { key, found } => {
                write!(f, "correction {key} is not a number ({found}), using 0.0")
            }
        }
    }
}

/// Normalized offsets plus every substitution made along the way.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrectionReport {
    pub offsets: CorrectionOffsets,
    pub substituted: Vec<MalformedCorrection>,
    /// Keys present in the map but not recognised.
    pub ignored: Vec<String>,
}

impl CorrectionOffsets {
    pub fn new(
        delta_roll_deg: f64,
        delta_pitch_deg: f64,
        delta_yaw_deg: f64,
        delta_alt_m: f64,
    ) -> Self {
        Self {
            delta_roll_deg,
            delta_pitch_deg,
            delta_yaw_deg,
            delta_alt_m,
        }
    }

    /// The offsets as a fully populated correction map.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, v) in CORRECTION_KEYS.into_iter().zip(self.values()) {
            map.insert(key.to_owned(), Value::from(v));
        }
        map
    }

    fn values(&self) -> [f64; 4] {
        [
            self.delta_roll_deg,
            self.delta_pitch_deg,
            self.delta_yaw_deg,
            self.delta_alt_m,
        ]
    }

    /// Read offsets from `map`, substituting `0.0` for absent or non-numeric
    /// entries. Each substitution is logged once.
    pub fn normalize(map: &Map<String, Value>) -> CorrectionReport {
        let mut values = [0.0f64; 4];
        let mut substituted = Vec::new();

        for (slot, key) in values.iter_mut().zip(CORRECTION_KEYS) {
            match map.get(key) {
                None | Some(Value::Null) => {
                    substituted.push(MalformedCorrection::Missing { key })
                }
                Some(v) => match v.as_f64() {
                    Some(x) if x.is_finite() => *slot = x,
                    _ => substituted.push(MalformedCorrection::NotANumber {
                        key,
                        found: v.to_string(),
                    }),
                },
            }
        }

        for s in &substituted {
            warn!("{s}");
        }

        let ignored: Vec<String> = map
            .keys()
            .filter(|k| !CORRECTION_KEYS.contains(&k.as_str()))
            .cloned()
            .collect();
        if !ignored.is_empty() {
            warn!("ignoring unknown correction keys: {}", ignored.join(", "));
        }

        let [delta_roll_deg, delta_pitch_deg, delta_yaw_deg, delta_alt_m] = values;
        CorrectionReport {
            offsets: Self::new(delta_roll_deg, delta_pitch_deg, delta_yaw_deg, delta_alt_m),
            substituted,
            ignored,
        }
    }
}
