//! Georeference a single oblique drone photograph from its orientation
//! metadata, without ground control points.
//!
//! Given camera roll, pitch, yaw, altitude and focal length, the pipeline
//! projects the image corners onto a flat ground plane, sizes an output grid,
//! fits a homography from that grid back to the photo and resamples the photo
//! into a north-up RGBA raster with a geotransform and a projection string.
//!
//! ## Quickstart
//!
//! ```no_run
//! use oblique_georef::{GeoreferencingPipeline, ImageMetadata, PipelineConfig};
//! use oblique_georef::core::Raster;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metadata = ImageMetadata {
//!     maker: "DJI".into(),
//!     model: "FC7303".into(),
//!     rows: 3000,
//!     cols: 4000,
//!     focal_length_m: 4.5e-3,
//!     roll_deg: 0.0,
//!     pitch_deg: -60.0,
//!     yaw_deg: 35.0,
//!     altitude_m: 80.0,
//!     latitude_deg: 41.39,
//!     longitude_deg: 2.17,
//! };
//! let pixels = Raster::new(4000, 3000, 3, vec![0u8; 4000 * 3000 * 3])?;
//!
//! let config = PipelineConfig::from_json_str(r#"{ "pitch_reference": "horizon" }"#)?;
//! let output = GeoreferencingPipeline::new(config).run(&metadata, &pixels.view())?;
//! println!("{} {:?}", output.projection, output.geotransform);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `oblique_georef::core`: rotations, frame converters, grid sizing,
//!   homographies and the resampler.
//! - [`GeoreferencingPipeline`]: `plan` (geometry only) and `run`.
//! - [`PipelineConfig`]: serde configuration, every field optional.
//! - [`io`]: provider and sink traits plus in-memory implementations.
//!
//! ## Features
//! - `tracing`: spans on the pipeline and the resampler, and [`init_tracing`].

pub use oblique_georef_core as core;

mod config;
pub mod corrections;
mod error;
pub mod geolocation;
pub mod io;
mod metadata;
mod pipeline;
pub mod sensor;

pub use config::{PipelineConfig, PitchReference, ProjectionKind};
pub use corrections::{CorrectionOffsets, CorrectionReport, MalformedCorrection};
pub use error::{GeorefError, PipelineStage};
pub use geolocation::{Footprint, ProjectionDescriptor};
pub use io::{georeference, MetadataProvider, ProviderError, RasterSink, RasterSource};
pub use metadata::ImageMetadata;
pub use pipeline::{GeorefOutput, GeorefPlan, GeoreferencingPipeline};
pub use sensor::SensorWidthTable;

pub use oblique_georef_core::{init_with_level, Raster, RgbaRaster, SamplingMode};

/// Route `log` records into `tracing` and install a subscriber filtered by
/// `RUST_LOG`.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let _ = tracing_log::LogTracer::init();
    oblique_georef_core::init_tracing(json);
}
