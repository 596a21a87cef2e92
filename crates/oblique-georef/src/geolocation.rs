//! Coordinate reference descriptors and ground footprints.

use crate::config::ProjectionKind;
use nalgebra::Point3;
use oblique_georef_core::{enu_to_geodetic, Geodetic};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference system of an output raster, centred below the camera.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionDescriptor {
    CameraPerspective {
        altitude_m: f64,
        latitude_deg: f64,
        longitude_deg: f64,
    },
    GroundPlane {
        latitude_deg: f64,
        longitude_deg: f64,
    },
}

impl ProjectionDescriptor {
    pub fn new(
        kind: ProjectionKind,
        altitude_m: f64,
        latitude_deg: f64,
        longitude_deg: f64,
    ) -> Self {
        match kind {
            ProjectionKind::CameraPerspective => ProjectionDescriptor::CameraPerspective {
                altitude_m,
                latitude_deg,
                longitude_deg,
            },
            ProjectionKind::GroundPlane => ProjectionDescriptor::GroundPlane {
                latitude_deg,
                longitude_deg,
            },
        }
    }

    /// PROJ definition string on the WGS84 datum.
    pub fn proj_string(&self) -> String {
        match *self {
            ProjectionDescriptor::CameraPerspective {
                altitude_m,
                latitude_deg,
                longitude_deg,
            } => format!(
                "+proj=nsper +h={altitude_m} +lat_0={latitude_deg} +lon_0={longitude_deg} +datum=WGS84 +type=crs"
            ),
            ProjectionDescriptor::GroundPlane {
                latitude_deg,
                longitude_deg,
            } => format!(
                "+proj=ortho +lat_0={latitude_deg} +lon_0={longitude_deg} +datum=WGS84 +units=m +type=crs"
            ),
        }
    }
}

impl fmt::Display for ProjectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.proj_string())
    }
}

/// Ground footprint of the photograph.
///
/// Local coordinates are `(E, N, U)` metres relative to the point on the
/// ground straight below the camera; geodetic coordinates are WGS84.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Top-left, top-right, bottom-right, bottom-left image corners on the
    /// ground.
    pub corners_enu: [Point3<f64>; 4],
    /// Where the optical axis meets the ground.
    pub principal_enu: Point3<f64>,
    pub corners_wgs84: [Geodetic; 4],
    pub principal_wgs84: Geodetic,
    /// Ground point below the camera (topocentric origin).
    pub origin: Geodetic,
}

impl Footprint {
    pub fn new(
        corners_enu: [Point3<f64>; 4],
        principal_enu: Point3<f64>,
        latitude_deg: f64,
        longitude_deg: f64,
    ) -> Self {
        let origin = Geodetic::new(latitude_deg, longitude_deg, 0.0);
        Self {
            corners_enu,
            principal_enu,
            corners_wgs84: corners_enu.map(|p| enu_to_geodetic(p, &origin)),
            principal_wgs84: enu_to_geodetic(principal_enu, &origin),
            origin,
        }
    }

    /// Ground area of the corner quadrilateral (m²), shoelace formula.
    pub fn area_m2(&self) -> f64 {
        let c = &self.corners_enu;
        let mut twice = 0.0;
        for i in 0..4 {
            let j = (i + 1) % 4;
            twice += c[i].x * c[j].y - c[j].x * c[i].y;
        }
        0.5 * twice.abs()
    }
}
