//! Interleaved 8-bit rasters and pixel samplers.
//!
//! Sampling coordinates are pixel-edge based: pixel `(x, y)` covers
//! `[x, x + 1) × [y, y + 1)` and its centre sits at `(x + 0.5, y + 0.5)`.

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterError {
    #[error("unsupported channel count {0} (expected 3 for RGB or 4 for RGBA)")]
    UnsupportedChannels(usize),
    #[error("invalid raster buffer length (expected {expected} bytes, got {got})")]
    BufferSize { expected: usize, got: usize },
    #[error("raster has zero width or height ({width}x{height})")]
    EmptyRaster { width: usize, height: usize },
}

fn check_layout(
    width: usize,
    height: usize,
    channels: usize,
    len: usize,
) -> Result<(), RasterError> {
    if channels != 3 && channels != 4 {
        return Err(RasterError::UnsupportedChannels(channels));
    }
    if width == 0 || height == 0 {
        return Err(RasterError::EmptyRaster { width, height });
    }
    let expected = width * height * channels;
    if len != expected {
        return Err(RasterError::BufferSize { expected, got: len });
    }
    Ok(())
}

/// Borrowed row-major RGB or RGBA raster. Only built from a validated layout,
/// so every in-bounds `(x, y)` indexes inside `data`.
#[derive(Clone, Copy, Debug)]
pub struct RasterView<'a> {
    width: usize,
    height: usize,
    channels: usize,
    data: &'a [u8],
}

impl<'a> RasterView<'a> {
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        data: &'a [u8],
    ) -> Result<Self, RasterError> {
        check_layout(width, height, channels, data.len())?;
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// RGB of pixel `(x, y)`; any alpha channel is ignored.
    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * self.channels;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// True when the edge-based point lies inside `[0, w) × [0, h)`.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f64 && y < self.height as f64
    }
}

/// Owned row-major RGB or RGBA raster, as handed over by a raster source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Raster {
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, RasterError> {
        check_layout(width, height, channels, data.len())?;
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn view(&self) -> RasterView<'_> {
        RasterView {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: &self.data,
        }
    }
}

/// RGBA output raster. Alpha is 255 where a source sample exists, 0 elsewhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaRaster {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbaRaster {
    /// Fully transparent raster.
    pub fn transparent(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height * 4],
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn opaque_count(&self) -> usize {
        self.data.chunks_exact(4).filter(|px| px[3] == 255).count()
    }

    /// Alpha channel as a row-major mask.
    pub fn alpha_mask(&self) -> Vec<bool> {
        self.data.chunks_exact(4).map(|px| px[3] == 255).collect()
    }
}

/// Nearest-pixel sample by truncation. Caller guarantees `src.contains(x, y)`.
#[inline]
pub fn sample_nearest(src: &RasterView<'_>, x: f64, y: f64) -> [u8; 3] {
    let xi = (x as usize).min(src.width - 1);
    let yi = (y as usize).min(src.height - 1);
    src.rgb(xi, yi)
}

/// Bilinear sample between pixel centres, clamping at the raster border.
#[inline]
pub fn sample_bilinear(src: &RasterView<'_>, x: f64, y: f64) -> [u8; 3] {
    let u = x - 0.5;
    let v = y - 0.5;
    let x0 = u.floor();
    let y0 = v.floor();
    let fx = u - x0;
    let fy = v - y0;

    let max_x = src.width as i64 - 1;
    let max_y = src.height as i64 - 1;
    let cx = |i: i64| i.clamp(0, max_x) as usize;
    let cy = |i: i64| i.clamp(0, max_y) as usize;

    let (xa, ya) = (x0 as i64, y0 as i64);
    let p00 = src.rgb(cx(xa), cy(ya));
    let p10 = src.rgb(cx(xa + 1), cy(ya));
    let p01 = src.rgb(cx(xa), cy(ya + 1));
    let p11 = src.rgb(cx(xa + 1), cy(ya + 1));

    let mut out = [0u8; 3];
    for k in 0..3 {
        let a = p00[k] as f64 + fx * (p10[k] as f64 - p00[k] as f64);
        let b = p01[k] as f64 + fx * (p11[k] as f64 - p01[k] as f64);
        out[k] = (a + fy * (b - a)).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Raster {
        // 4x2 RGB, red = 10 * x, green = 100 * y, blue = 7
        let mut data = Vec::new();
        for y in 0..2u8 {
            for x in 0..4u8 {
                data.extend_from_slice(&[10 * x, 100 * y, 7]);
            }
        }
        Raster::new(4, 2, 3, data).unwrap()
    }

    #[test]
    fn rejects_bad_layouts() {
        assert_eq!(
            Raster::new(2, 2, 3, vec![0; 11]),
            Err(RasterError::BufferSize {
                expected: 12,
                got: 11
            })
        );
        assert_eq!(
            RasterView::new(2, 2, 2, &[0; 8]).unwrap_err(),
            RasterError::UnsupportedChannels(2)
        );
        assert!(matches!(
            Raster::new(0, 2, 4, vec![]),
            Err(RasterError::EmptyRaster { .. })
        ));
    }

    #[test]
    fn view_reports_validated_layout() {
        let r = ramp();
        let v = r.view();
        assert_eq!((v.width(), v.height(), v.channels()), (4, 2, 3));
        assert_eq!(v.data().len(), 24);
        assert_eq!(r.clone().into_data(), v.data());

        let data = [0u8; 24];
        assert!(RasterView::new(4, 2, 3, &data).is_ok());
        assert!(RasterView::new(4, 3, 3, &data).is_err());
    }

    #[test]
    fn nearest_truncates() {
        let r = ramp();
        let v = r.view();
        assert_eq!(sample_nearest(&v, 0.0, 0.0), [0, 0, 7]);
        assert_eq!(sample_nearest(&v, 2.99, 1.01), [20, 100, 7]);
        assert_eq!(sample_nearest(&v, 3.999, 1.999), [30, 100, 7]);
    }

    #[test]
    fn bilinear_hits_pixel_centres_exactly() {
        let r = ramp();
        let v = r.view();
        assert_eq!(sample_bilinear(&v, 1.5, 0.5), [10, 0, 7]);
        assert_eq!(sample_bilinear(&v, 2.0, 1.0), [15, 50, 7]);
        // clamped at the border
        assert_eq!(sample_bilinear(&v, 0.1, 0.1), [0, 0, 7]);
        assert_eq!(sample_bilinear(&v, 3.9, 1.9), [30, 100, 7]);
    }

    #[test]
    fn rgba_source_alpha_is_ignored() {
        let r = Raster::new(1, 1, 4, vec![1, 2, 3, 0]).unwrap();
        assert_eq!(sample_nearest(&r.view(), 0.5, 0.5), [1, 2, 3]);
    }

    #[test]
    fn transparent_raster_has_no_opaque_pixels() {
        let out = RgbaRaster::transparent(3, 2);
        assert_eq!(out.data.len(), 24);
        assert_eq!(out.opaque_count(), 0);
        assert_eq!(out.pixel(2, 1), [0, 0, 0, 0]);
    }
}
