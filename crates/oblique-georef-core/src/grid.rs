//! Ground bounding box and output raster grid.

use crate::frames::TopocentricToImage;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum GridError {
    #[error("bounding box requested for zero points")]
    EmptyInput,
    #[error("ground sample distance must be positive and finite (got {gsd})")]
    InvalidGsd { gsd: f64 },
    #[error("output grid of {cols} x {rows} pixels exceeds the limit of {max_pixels}")]
    TooLarge {
        cols: f64,
        rows: f64,
        max_pixels: usize,
    },
}

/// Default cap on output pixels: 2^28, i.e. 1 GiB of RGBA.
pub const DEFAULT_MAX_PIXELS: usize = 1 << 28;

/// Axis-aligned box on the ground plane, `[xmin, ymin, xmax, ymax]` in metres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Component-wise min/max over `points`.
    pub fn from_points<I>(points: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = Point2<f64>>,
    {
        let mut it = points.into_iter();
        let first = it.next().ok_or(GridError::EmptyInput)?;
        let init = Self {
            xmin: first.x,
            ymin: first.y,
            xmax: first.x,
            ymax: first.y,
        };
        Ok(it.fold(init, |b, p| Self {
            xmin: b.xmin.min(p.x),
            ymin: b.ymin.min(p.y),
            xmax: b.xmax.max(p.x),
            ymax: b.ymax.max(p.y),
        }))
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new(0.5 * (self.xmin + self.xmax), 0.5 * (self.ymin + self.ymax))
    }

    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }
}

/// Ground sample distance of a flat, nadir-looking camera:
/// `pixel_size * altitude / focal_length`.
#[inline]
pub fn nadir_gsd(pixel_size: f64, altitude_m: f64, focal_length: f64) -> f64 {
    pixel_size * altitude_m / focal_length
}

/// Output raster grid covering a ground bounding box at a fixed GSD.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputGrid {
    pub rows: usize,
    pub cols: usize,
    pub gsd_m: f64,
    /// Exact extent: `cols * gsd_m` wide, `rows * gsd_m` tall.
    pub bbox: BoundingBox,
}

impl OutputGrid {
    /// Size a grid over `bbox` and recentre the box on the integer grid, with
    /// at most [`DEFAULT_MAX_PIXELS`] pixels.
    pub fn size(bbox: &BoundingBox, gsd_m: f64) -> Result<Self, GridError> {
        Self::size_within(bbox, gsd_m, DEFAULT_MAX_PIXELS)
    }

    /// Like [`OutputGrid::size`] with an explicit pixel budget. The RGBA byte
    /// count `cols * rows * 4` is guaranteed to fit in `usize`.
    pub fn size_within(
        bbox: &BoundingBox,
        gsd_m: f64,
        max_pixels: usize,
    ) -> Result<Self, GridError> {
        if !gsd_m.is_finite() || gsd_m <= 0.0 {
            return Err(GridError::InvalidGsd { gsd: gsd_m });
        }

        let cols_f = (bbox.width() / gsd_m).ceil().max(1.0);
        let rows_f = (bbox.height() / gsd_m).ceil().max(1.0);
        let too_large = GridError::TooLarge {
            cols: cols_f,
            rows: rows_f,
            max_pixels,
        };
        // checked in f64 first: `as usize` saturates
        if cols_f * rows_f > max_pixels as f64 {
            return Err(too_large);
        }
        let (cols, rows) = (cols_f as usize, rows_f as usize);
        match cols.checked_mul(rows) {
            Some(n) if n <= max_pixels && n.checked_mul(4).is_some() => {}
            _ => return Err(too_large),
        }

        let c = bbox.center();
        let half_w = 0.5 * cols as f64 * gsd_m;
        let half_h = 0.5 * rows as f64 * gsd_m;

        Ok(Self {
            rows,
            cols,
            gsd_m,
            bbox: BoundingBox {
                xmin: c.x - half_w,
                ymin: c.y - half_h,
                xmax: c.x + half_w,
                ymax: c.y + half_h,
            },
        })
    }

    /// GDAL-style affine geotransform `[xmin, gsd, 0, ymax, 0, -gsd]`.
    pub fn geotransform(&self) -> [f64; 6] {
        [
            self.bbox.xmin,
            self.gsd_m,
            0.0,
            self.bbox.ymax,
            0.0,
            -self.gsd_m,
        ]
    }

    /// Ground → grid pixel converter for this grid.
    pub fn to_pixel(&self) -> TopocentricToImage {
        TopocentricToImage::new(self.bbox.xmin, self.bbox.ymax, self.gsd_m)
    }
}
