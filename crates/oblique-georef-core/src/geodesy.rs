//! WGS84 helpers to place topocentric ground points on the globe.

use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// WGS84 semi-major axis in metres.
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Latitude/longitude in degrees and ellipsoidal height in metres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub height_m: f64,
}

impl Geodetic {
    pub fn new(latitude_deg: f64, longitude_deg: f64, height_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            height_m,
        }
    }

    /// Earth-centred, earth-fixed position.
    pub fn to_ecef(&self) -> Vector3<f64> {
        let (sin_phi, cos_phi) = self.latitude_deg.to_radians().sin_cos();
        let (sin_lambda, cos_lambda) = self.longitude_deg.to_radians().sin_cos();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_phi * sin_phi).sqrt();
        let h = self.height_m;

        Vector3::new(
            (n + h) * cos_phi * cos_lambda,
            (n + h) * cos_phi * sin_lambda,
            (n * (1.0 - WGS84_E2) + h) * sin_phi,
        )
    }

    pub fn from_ecef(ecef: Vector3<f64>) -> Self {
        let (x, y, z) = (ecef.x, ecef.y, ecef.z);
        let lambda = y.atan2(x);
        let p = x.hypot(y);

        let mut phi = z.atan2(p * (1.0 - WGS84_E2));
        let mut h = 0.0;
        for _ in 0..10 {
            let sin_phi = phi.sin();
            let n = WGS84_A / (1.0 - WGS84_E2 * sin_phi * sin_phi).sqrt();
            h = p * phi.cos() + (z + WGS84_E2 * n * sin_phi) * sin_phi - n;
            let next = z.atan2(p * (1.0 - WGS84_E2 * n / (n + h)));
            let done = (next - phi).abs() < 1e-15;
            phi = next;
            if done {
                break;
            }
        }

        Self {
            latitude_deg: phi.to_degrees(),
            longitude_deg: lambda.to_degrees(),
            height_m: h,
        }
    }
}

/// Rotation taking local `(E, N, U)` components at `origin` to ECEF components.
pub fn enu_to_ecef_rotation(origin: &Geodetic) -> Matrix3<f64> {
    let (sin_phi, cos_phi) = origin.latitude_deg.to_radians().sin_cos();
    let (sin_lambda, cos_lambda) = origin.longitude_deg.to_radians().sin_cos();

    // columns: east, north, up
    Matrix3::new(
        -sin_lambda,
        -cos_lambda * sin_phi,
        cos_lambda * cos_phi,
        cos_lambda,
        -sin_lambda * sin_phi,
        sin_lambda * cos_phi,
        0.0,
        cos_phi,
        sin_phi,
    )
}

/// Topocentric point relative to `origin` to geodetic coordinates.
pub fn enu_to_geodetic(enu: Point3<f64>, origin: &Geodetic) -> Geodetic {
    let ecef = origin.to_ecef() + enu_to_ecef_rotation(origin) * enu.coords;
    Geodetic::from_ecef(ecef)
}
