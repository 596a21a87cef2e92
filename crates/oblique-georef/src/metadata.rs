use crate::GeorefError;
use oblique_georef_core::Attitude;
use serde::{Deserialize, Serialize};

/// Orientation and sensor metadata of one photograph.
///
/// Produced by a [`MetadataProvider`](crate::io::MetadataProvider) from the
/// image's tag store; immutable once read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub maker: String,
    pub model: String,
    pub rows: usize,
    pub cols: usize,
    /// Focal length in metres.
    pub focal_length_m: f64,
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub yaw_deg: f64,
    /// Camera height above the ground plane, in metres.
    pub altitude_m: f64,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl ImageMetadata {
    /// Reject records no camera could have produced.
    pub fn validate(&self) -> Result<(), GeorefError> {
        let fail = |msg: String| Err(GeorefError::InvalidMetadata(msg));

        if self.rows == 0 || self.cols == 0 {
            return fail(format!(
                "image dimensions must be positive (got {}x{})",
                self.cols, self.rows
            ));
        }
        if !self.focal_length_m.is_finite() || self.focal_length_m <= 0.0 {
            return fail(format!(
                "focal length must be positive (got {} m)",
                self.focal_length_m
            ));
        }
        for (name, v) in [
            ("roll", self.roll_deg),
            ("pitch", self.pitch_deg),
            ("yaw", self.yaw_deg),
            ("altitude", self.altitude_m),
        ] {
            if !v.is_finite() {
                return fail(format!("{name} is not finite ({v})"));
            }
        }
        if !(-90.0..=90.0).contains(&self.latitude_deg) {
            return fail(format!("latitude {} out of range", self.latitude_deg));
        }
        if !(-180.0..=180.0).contains(&self.longitude_deg) {
            return fail(format!("longitude {} out of range", self.longitude_deg));
        }
        Ok(())
    }

    /// Attitude as recorded, before corrections.
    pub fn attitude(&self) -> Attitude {
        Attitude::new(self.roll_deg, self.pitch_deg, self.yaw_deg)
    }
}
