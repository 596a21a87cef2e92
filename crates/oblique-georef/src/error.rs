use crate::io::ProviderError;
use oblique_georef_core::{DegenerateHomography, DegenerateProjection, GridError};
use std::fmt;

/// Step of the georeferencing pipeline an error originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Metadata,
    SensorLookup,
    FrameChain,
    BoundingBox,
    GridSizing,
    Homography,
    Resampling,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Metadata => "metadata",
            PipelineStage::SensorLookup => "sensor lookup",
            PipelineStage::FrameChain => "frame chain",
            PipelineStage::BoundingBox => "bounding box",
            PipelineStage::GridSizing => "grid sizing",
            PipelineStage::Homography => "homography",
            PipelineStage::Resampling => "resampling",
        };
        f.write_str(s)
    }
}

/// Fatal errors of a georeferencing run. No partial raster accompanies them.
#[derive(thiserror::Error, Debug)]
pub enum GeorefError {
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown sensor {maker}/{model} (known sensors: {known})")]
    UnknownSensor {
        maker: String,
        model: String,
        known: String,
    },

    /// `corner` indexes the top-left, top-right, bottom-right, bottom-left
    /// corner list; `None` for interior points.
    #[error("{stage}: image point ({col}, {row}) does not project to the ground: {source}")]
    DegenerateProjection {
        stage: PipelineStage,
        corner: Option<usize>,
        col: f64,
        row: f64,
        #[source]
        source: DegenerateProjection,
    },

    #[error("{stage}: no points to bound")]
    EmptyInput { stage: PipelineStage },

    #[error("{stage}: ground sample distance must be positive and finite (got {gsd})")]
    InvalidGsd { stage: PipelineStage, gsd: f64 },

    #[error("{stage}: output grid of {cols} x {rows} pixels exceeds the limit of {max_pixels}")]
    GridTooLarge {
        stage: PipelineStage,
        cols: f64,
        rows: f64,
        max_pixels: usize,
    },

    #[error("{stage}: no homography from grid corners {grid_corners:?} to image corners {image_corners:?}: {source}")]
    DegenerateHomography {
        stage: PipelineStage,
        grid_corners: [[f64; 2]; 4],
        image_corners: [[f64; 2]; 4],
        #[source]
        source: DegenerateHomography,
    },

    #[error("{stage}: source raster is {width}x{height} but metadata says {cols}x{rows}")]
    RasterSizeMismatch {
        stage: PipelineStage,
        width: usize,
        height: usize,
        cols: usize,
        rows: usize,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl GeorefError {
    pub(crate) fn grid(stage: PipelineStage, err: GridError) -> Self {
        match err {
            GridError::EmptyInput => GeorefError::EmptyInput { stage },
            GridError::InvalidGsd { gsd } => GeorefError::InvalidGsd { stage, gsd },
            GridError::TooLarge {
                cols,
                rows,
                max_pixels,
            } => GeorefError::GridTooLarge {
                stage,
                cols,
                rows,
                max_pixels,
            },
        }
    }

    /// Pipeline stage that failed, when the error came from a pipeline step.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            GeorefError::InvalidMetadata(_) => Some(PipelineStage::Metadata),
            GeorefError::UnknownSensor { .. } => Some(PipelineStage::SensorLookup),
            GeorefError::DegenerateProjection { stage, .. }
            | GeorefError::EmptyInput { stage }
            | GeorefError::InvalidGsd { stage, .. }
            | GeorefError::DegenerateHomography { stage, .. }
            | GeorefError::RasterSizeMismatch { stage, .. }
            | GeorefError::GridTooLarge { stage, .. } => Some(*stage),
            GeorefError::InvalidConfig(_) | GeorefError::Provider(_) => None,
        }
    }
}
