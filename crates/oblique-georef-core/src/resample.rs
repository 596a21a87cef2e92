//! Inverse-mapped resampling of a source raster onto an output grid.

use crate::homography::Homography;
use crate::image::{sample_bilinear, sample_nearest, RasterView, RgbaRaster};
use nalgebra::Point2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// How a source pixel value is read at a fractional position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Pixel containing the point (truncation).
    #[default]
    Nearest,
    /// Interpolation between the four surrounding pixel centres.
    Bilinear,
}

/// How the per-pixel loop is scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    Serial,
    /// Split output rows across the global rayon pool.
    #[default]
    ParallelRows,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpParams {
    pub sampling: SamplingMode,
    pub execution: ExecutionStrategy,
}

/// Fill one output row. `y` is the output row index.
fn warp_row(
    src: &RasterView<'_>,
    h_src_from_dst: &Homography,
    sampling: SamplingMode,
    y: usize,
    row: &mut [u8],
) {
    let yc = y as f64 + 0.5;
    for (x, px) in row.chunks_exact_mut(4).enumerate() {
        // sample at pixel centre
        let ps = h_src_from_dst.apply(Point2::new(x as f64 + 0.5, yc));
        if !src.contains(ps.x, ps.y) {
            px.copy_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        let rgb = match sampling {
            SamplingMode::Nearest => sample_nearest(src, ps.x, ps.y),
            SamplingMode::Bilinear => sample_bilinear(src, ps.x, ps.y),
        };
        px[..3].copy_from_slice(&rgb);
        px[3] = 255;
    }
}

/// Warp `src` into an `out_rows × out_cols` RGBA raster.
///
/// `h_src_from_dst` maps edge-based output pixel coordinates to edge-based
/// source coordinates. Output pixels whose centre maps outside the source are
/// left transparent.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(src, h_src_from_dst)))]
pub fn warp_perspective_rgba(
    src: &RasterView<'_>,
    h_src_from_dst: &Homography,
    out_rows: usize,
    out_cols: usize,
    params: WarpParams,
) -> RgbaRaster {
    let mut out = RgbaRaster::transparent(out_cols, out_rows);
    let stride = out_cols * 4;
    if stride == 0 {
        return out;
    }

    match params.execution {
        ExecutionStrategy::Serial => {
            out.data
                .chunks_exact_mut(stride)
                .enumerate()
                .for_each(|(y, row)| warp_row(src, h_src_from_dst, params.sampling, y, row));
        }
        ExecutionStrategy::ParallelRows => {
            out.data
                .par_chunks_exact_mut(stride)
                .enumerate()
                .for_each(|(y, row)| warp_row(src, h_src_from_dst, params.sampling, y, row));
        }
    }

    out
}
