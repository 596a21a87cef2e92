//! Geometry and resampling primitives for single-view oblique georeferencing.
//!
//! This crate is purely numeric. It knows nothing about image files, tag
//! stores or map projections; it turns sensor/attitude parameters into frame
//! converters, sizes an output grid, estimates homographies and resamples
//! in-memory rasters.
//!
//! The building blocks, leaf first:
//! - [`RotationMatrix`] / [`Attitude`]: elemental and roll/pitch/yaw rotations.
//! - [`frames`]: image → oblique → vertical → topocentric converters.
//! - [`BoundingBox`] / [`OutputGrid`]: ground extent and raster sizing.
//! - [`homography_from_4pt`]: direct linear transform from four correspondences.
//! - [`warp_perspective_rgba`]: inverse-mapped resampling with an alpha mask.

pub mod frames;
pub mod geodesy;
mod grid;
mod homography;
mod image;
mod logger;
mod resample;
mod rotation;

pub use frames::{
    DegenerateProjection, FrameChain, ImageToOblique, ObliqueToVertical, TopocentricToImage,
    VerticalToTopocentric, MIN_DEPRESSION_DEG,
};
pub use geodesy::{enu_to_geodetic, Geodetic};
pub use grid::{nadir_gsd, BoundingBox, GridError, OutputGrid, DEFAULT_MAX_PIXELS};
pub use homography::{
    estimate_homography, homography_from_4pt, DegenerateHomography, Homography, PointSet,
};
pub use image::{sample_bilinear, sample_nearest, Raster, RasterError, RasterView, RgbaRaster};
pub use resample::{warp_perspective_rgba, ExecutionStrategy, SamplingMode, WarpParams};
pub use rotation::{Attitude, Axis, InvalidAxis, RotationMatrix};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
