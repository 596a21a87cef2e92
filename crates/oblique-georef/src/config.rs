use crate::corrections::CorrectionOffsets;
use crate::sensor::SensorWidthTable;
use crate::GeorefError;
use oblique_georef_core::{ExecutionStrategy, SamplingMode, WarpParams, DEFAULT_MAX_PIXELS};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a recorded pitch of zero points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchReference {
    /// `0°` looks straight down.
    #[default]
    Nadir,
    /// `0°` looks at the horizon and `-90°` straight down (gimbal convention).
    /// Negative angles tilt the image top forward, towards the horizon.
    Horizon,
}

impl PitchReference {
    /// Pitch in the nadir-referenced convention used by the rotation builder.
    pub fn to_nadir_deg(self, pitch_deg: f64) -> f64 {
        match self {
            PitchReference::Nadir => pitch_deg,
            PitchReference::Horizon => -(pitch_deg + 90.0),
        }
    }
}

/// Which coordinate reference the output is tagged with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Near-side perspective centred below the camera at flight height.
    #[default]
    CameraPerspective,
    /// Orthographic tangent plane at the camera's nadir point.
    GroundPlane,
}

/// Pipeline configuration.
///
/// Every field has a default, so `{}` is a valid JSON configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw `DELTA_*` map. `None` means no corrections and no diagnostics.
    pub corrections: Option<Map<String, Value>>,
    /// Output ground sample distance (m). `0` derives the nadir GSD.
    pub gsd_m: f64,
    pub sensor_widths: SensorWidthTable,
    pub sampling: SamplingMode,
    pub execution: ExecutionStrategy,
    pub pitch_reference: PitchReference,
    pub projection: ProjectionKind,
    /// Output grids with more pixels than this fail at grid sizing.
    pub max_output_pixels: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            corrections: None,
            gsd_m: 0.0,
            sensor_widths: SensorWidthTable::default(),
            sampling: SamplingMode::default(),
            execution: ExecutionStrategy::default(),
            pitch_reference: PitchReference::default(),
            projection: ProjectionKind::default(),
            max_output_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, GeorefError> {
        serde_json::from_str(json).map_err(|e| GeorefError::InvalidConfig(e.to_string()))
    }

    pub fn to_json_string_pretty(&self) -> Result<String, GeorefError> {
        serde_json::to_string_pretty(self).map_err(|e| GeorefError::InvalidConfig(e.to_string()))
    }

    pub fn with_corrections(mut self, offsets: CorrectionOffsets) -> Self {
        self.corrections = Some(offsets.to_map());
        self
    }

    pub fn with_gsd(mut self, gsd_m: f64) -> Self {
        self.gsd_m = gsd_m;
        self
    }

    pub fn with_pitch_reference(mut self, pitch_reference: PitchReference) -> Self {
        self.pitch_reference = pitch_reference;
        self
    }

    pub fn with_max_output_pixels(mut self, max_output_pixels: usize) -> Self {
        self.max_output_pixels = max_output_pixels;
        self
    }

    pub fn warp_params(&self) -> WarpParams {
        WarpParams {
            sampling: self.sampling,
            execution: self.execution,
        }
    }
}
