//! Coordinate frames between the photograph and the ground plane.
//!
//! - image: `(col, row)`, pixel centres at integer coordinates, rows grow down
//! - oblique camera: `(front, right, down)`, optical axis along `down`
//! - vertical: `(x, y, z)` = north, east, down, camera at the origin
//! - topocentric: `(E, N, U)` on the ground plane below the camera
//!
//! Each converter is a small immutable value holding its parameters. They are
//! `Copy + Send + Sync` and can be shared across threads freely.

use crate::rotation::{Attitude, RotationMatrix};
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Smallest angle below the horizon (degrees) at which a ray still counts as
/// hitting the ground. Shallower rays land more than ~57 altitudes away.
pub const MIN_DEPRESSION_DEG: f64 = 1.0;

/// A vertical-frame ray cannot be intersected with the ground plane.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum DegenerateProjection {
    #[error("ray ({x:.6}, {y:.6}, {z:.6}) does not hit the ground below the camera")]
    RayMissesGround { x: f64, y: f64, z: f64 },
    #[error("camera altitude {altitude_m} m is not above the ground plane")]
    CameraNotAboveGround { altitude_m: f64 },
}

/// Image `(col, row)` to oblique camera `(front, right, down)` in metres on the
/// sensor. A pinhole projection with the principal point at the image centre.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageToOblique {
    pub rows: usize,
    pub cols: usize,
    pub pixel_size: f64,
    pub focal_length: f64,
}

impl ImageToOblique {
    pub fn new(rows: usize, cols: usize, pixel_size: f64, focal_length: f64) -> Self {
        Self {
            rows,
            cols,
            pixel_size,
            focal_length,
        }
    }

    #[inline]
    fn centre_row(&self) -> f64 {
        self.rows as f64 / 2.0 - 0.5
    }

    #[inline]
    fn centre_col(&self) -> f64 {
        self.cols as f64 / 2.0 - 0.5
    }

    #[inline]
    pub fn apply(&self, colrow: Point2<f64>) -> Point3<f64> {
        let front = (self.centre_row() - colrow.y) * self.pixel_size;
        let right = (colrow.x - self.centre_col()) * self.pixel_size;
        Point3::new(front, right, self.focal_length)
    }

    /// Inverse of [`ImageToOblique::apply`]. The `down` component is ignored.
    #[inline]
    pub fn invert(&self, frd: Point3<f64>) -> Point2<f64> {
        let row = self.centre_row() - frd.x / self.pixel_size;
        let col = frd.y / self.pixel_size + self.centre_col();
        Point2::new(col, row)
    }

    /// Where the optical axis pierces the image.
    pub fn principal_point(&self) -> Point2<f64> {
        Point2::new(self.centre_col(), self.centre_row())
    }

    /// Outer corners of the image in `(col, row)`: top-left, top-right,
    /// bottom-right, bottom-left.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        let right = self.cols as f64 - 0.5;
        let bottom = self.rows as f64 - 0.5;
        [
            Point2::new(-0.5, -0.5),
            Point2::new(right, -0.5),
            Point2::new(right, bottom),
            Point2::new(-0.5, bottom),
        ]
    }
}

/// Oblique camera frame to the local vertical frame, `xyz = R * frd`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObliqueToVertical {
    rotation: RotationMatrix,
}

impl ObliqueToVertical {
    pub fn new(attitude: Attitude) -> Self {
        Self {
            rotation: attitude.rotation(),
        }
    }

    pub fn from_rotation(rotation: RotationMatrix) -> Self {
        Self { rotation }
    }

    pub fn rotation(&self) -> &RotationMatrix {
        &self.rotation
    }

    #[inline]
    pub fn apply(&self, frd: Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.apply(frd.coords))
    }

    #[inline]
    pub fn invert(&self, xyz: Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.transpose().apply(xyz.coords))
    }
}

/// Intersects vertical-frame rays from a camera at `altitude_m` with the ground
/// plane `U = 0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerticalToTopocentric {
    pub altitude_m: f64,
}

impl VerticalToTopocentric {
    pub fn new(altitude_m: f64) -> Self {
        Self { altitude_m }
    }

    pub fn apply(&self, xyz: Point3<f64>) -> Result<Point3<f64>, DegenerateProjection> {
        let h = self.altitude_m;
        if !h.is_finite() || h <= 0.0 {
            return Err(DegenerateProjection::CameraNotAboveGround { altitude_m: h });
        }

        let (x, y, z) = (xyz.x, xyz.y, xyz.z);
        let norm = xyz.coords.norm();
        // z is "down": only rays clearly below the horizon reach the ground.
        let min_z = MIN_DEPRESSION_DEG.to_radians().sin() * norm;
        if !norm.is_finite() || z <= min_z {
            return Err(DegenerateProjection::RayMissesGround { x, y, z });
        }

        Ok(Point3::new(h * y / z, h * x / z, 0.0))
    }
}

/// Ground plane `(E, N)` to pixel `(col, row)` of the output grid whose
/// north-west corner is `(xmin, ymax)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopocentricToImage {
    pub xmin: f64,
    pub ymax: f64,
    pub gsd: f64,
}

impl TopocentricToImage {
    pub fn new(xmin: f64, ymax: f64, gsd: f64) -> Self {
        Self { xmin, ymax, gsd }
    }

    #[inline]
    pub fn apply(&self, en: Point2<f64>) -> Point2<f64> {
        let col = (en.x - self.xmin) / self.gsd - 0.5;
        let row = (self.ymax - en.y) / self.gsd - 0.5;
        Point2::new(col, row)
    }

    #[inline]
    pub fn invert(&self, colrow: Point2<f64>) -> Point2<f64> {
        let e = (colrow.x + 0.5) * self.gsd + self.xmin;
        let n = self.ymax - (colrow.y + 0.5) * self.gsd;
        Point2::new(e, n)
    }
}

/// Image → oblique → vertical → topocentric in one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameChain {
    pub image_to_oblique: ImageToOblique,
    pub oblique_to_vertical: ObliqueToVertical,
    pub vertical_to_topocentric: VerticalToTopocentric,
}

impl FrameChain {
    pub fn new(image_to_oblique: ImageToOblique, attitude: Attitude, altitude_m: f64) -> Self {
        Self {
            image_to_oblique,
            oblique_to_vertical: ObliqueToVertical::new(attitude),
            vertical_to_topocentric: VerticalToTopocentric::new(altitude_m),
        }
    }

    /// Vertical-frame ray through an image point.
    #[inline]
    pub fn ray(&self, colrow: Point2<f64>) -> Point3<f64> {
        self.oblique_to_vertical.apply(self.image_to_oblique.apply(colrow))
    }

    pub fn apply(&self, colrow: Point2<f64>) -> Result<Point3<f64>, DegenerateProjection> {
        self.vertical_to_topocentric.apply(self.ray(colrow))
    }

    /// Ground point straight below the camera, projected along the vertical
    /// frame's down axis.
    pub fn nadir(&self) -> Result<Point3<f64>, DegenerateProjection> {
        self.vertical_to_topocentric.apply(Point3::new(
            0.0,
            0.0,
            self.image_to_oblique.focal_length,
        ))
    }
}
