//! Metadata in, georeferenced RGBA raster out.
//!
//! [`GeoreferencingPipeline::plan`] does all the geometry (corrections, frame
//! chain, output grid, homography) without touching pixels;
//! [`GeoreferencingPipeline::run`] adds the resampling step.

use crate::config::PipelineConfig;
use crate::corrections::{CorrectionOffsets, CorrectionReport};
use crate::error::{GeorefError, PipelineStage};
use crate::geolocation::{Footprint, ProjectionDescriptor};
use crate::metadata::ImageMetadata;
use log::{debug, info};
use nalgebra::{Point2, Point3};
use oblique_georef_core::{
    homography_from_4pt, nadir_gsd, warp_perspective_rgba, Attitude, BoundingBox, FrameChain,
    Homography, ImageToOblique, OutputGrid, RasterView, RgbaRaster,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Geometry of one georeferencing run, everything except the pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct GeorefPlan {
    pub corrections: CorrectionReport,
    /// Corrected attitude with pitch referenced to nadir.
    pub attitude: Attitude,
    /// Corrected altitude (m).
    pub altitude_m: f64,
    pub pixel_size_m: f64,
    pub chain: FrameChain,
    /// Source image corners in `(col, row)`, pixel-centre convention.
    pub image_corners: [Point2<f64>; 4],
    /// The same corners on the ground, `(E, N, 0)`.
    pub ground_corners: [Point3<f64>; 4],
    pub grid: OutputGrid,
    /// The same corners in output grid `(col, row)`, pixel-centre convention.
    pub grid_corners: [Point2<f64>; 4],
    /// Output grid pixel to source image pixel, pixel-edge convention.
    pub homography: Homography,
    pub footprint: Footprint,
    pub projection: ProjectionDescriptor,
}

impl GeorefPlan {
    pub fn geotransform(&self) -> [f64; 6] {
        self.grid.geotransform()
    }
}

/// A georeferenced raster with everything needed to place it on a map.
#[derive(Clone, Debug)]
pub struct GeorefOutput {
    /// RGBA, alpha 0 where no source pixel lands.
    pub raster: RgbaRaster,
    /// `[xmin, gsd, 0, ymax, 0, -gsd]` in the topocentric frame.
    pub geotransform: [f64; 6],
    pub projection: ProjectionDescriptor,
    pub plan: GeorefPlan,
}

impl GeorefOutput {
    pub fn footprint(&self) -> &Footprint {
        &self.plan.footprint
    }
}

#[derive(Clone, Debug, Default)]
pub struct GeoreferencingPipeline {
    config: PipelineConfig,
}

impl GeoreferencingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every geometric step for `metadata`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, metadata), fields(maker = %metadata.maker, model = %metadata.model))
    )]
    pub fn plan(&self, metadata: &ImageMetadata) -> Result<GeorefPlan, GeorefError> {
        metadata.validate()?;

        let corrections = match &self.config.corrections {
            Some(map) => CorrectionOffsets::normalize(map),
            None => CorrectionReport::default(),
        };
        let delta = corrections.offsets;
        debug!("corrections {:?}", delta);

        let pixel_size_m = self.config.sensor_widths.pixel_size(metadata)?;
        debug!(
            "{}/{}: pixel size {:.3e} m over {} columns",
            metadata.maker, metadata.model, pixel_size_m, metadata.cols
        );

        let attitude = Attitude::new(
            metadata.roll_deg + delta.delta_roll_deg,
            self.config
                .pitch_reference
                .to_nadir_deg(metadata.pitch_deg + delta.delta_pitch_deg),
            metadata.yaw_deg + delta.delta_yaw_deg,
        );
        let altitude_m = metadata.altitude_m + delta.delta_alt_m;
        debug!(
            "attitude roll={:.3} pitch={:.3} yaw={:.3} deg, altitude {:.3} m",
            attitude.roll_deg, attitude.pitch_deg, attitude.yaw_deg, altitude_m
        );

        let image_to_oblique = ImageToOblique::new(
            metadata.rows,
            metadata.cols,
            pixel_size_m,
            metadata.focal_length_m,
        );
        let chain = FrameChain::new(image_to_oblique, attitude, altitude_m);
        let image_corners = image_to_oblique.corners();

        let mut ground_corners = [Point3::origin(); 4];
        for (i, (ground, corner)) in ground_corners.iter_mut().zip(&image_corners).enumerate() {
            *ground = project(&chain, *corner, Some(i))?;
        }
        let principal = project(&chain, image_to_oblique.principal_point(), None)?;
        debug!("ground corners {:?}", ground_corners.map(|p| [p.x, p.y]));

        let bbox = BoundingBox::from_points(ground_corners.iter().map(|p| p.xy()))
            .map_err(|e| GeorefError::grid(PipelineStage::BoundingBox, e))?;

        let gsd_m = if self.config.gsd_m == 0.0 {
            nadir_gsd(pixel_size_m, altitude_m, metadata.focal_length_m)
        } else {
            self.config.gsd_m
        };
        let grid = OutputGrid::size_within(&bbox, gsd_m, self.config.max_output_pixels)
            .map_err(|e| GeorefError::grid(PipelineStage::GridSizing, e))?;
        debug!(
            "output grid {}x{} at {:.4} m, extent {:?}",
            grid.cols,
            grid.rows,
            grid.gsd_m,
            grid.bbox.to_array()
        );

        let to_pixel = grid.to_pixel();
        let grid_corners = ground_corners.map(|p| to_pixel.apply(p.xy()));

        let to_edges = |p: Point2<f64>| Point2::new(p.x + 0.5, p.y + 0.5);
        let grid_edges = grid_corners.map(to_edges);
        let image_edges = image_corners.map(to_edges);
        let homography = homography_from_4pt(&grid_edges, &image_edges).map_err(|source| {
            GeorefError::DegenerateHomography {
                stage: PipelineStage::Homography,
                grid_corners: grid_edges.map(|p| [p.x, p.y]),
                image_corners: image_edges.map(|p| [p.x, p.y]),
                source,
            }
        })?;
        debug!("homography grid -> image {:?}", homography.to_array());

        let footprint = Footprint::new(
            ground_corners,
            principal,
            metadata.latitude_deg,
            metadata.longitude_deg,
        );
        let projection = ProjectionDescriptor::new(
            self.config.projection,
            altitude_m,
            metadata.latitude_deg,
            metadata.longitude_deg,
        );

        Ok(GeorefPlan {
            corrections,
            attitude,
            altitude_m,
            pixel_size_m,
            chain,
            image_corners,
            ground_corners,
            grid,
            grid_corners,
            homography,
            footprint,
            projection,
        })
    }

    /// Plan and resample `source`, whose size must match `metadata`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, metadata, source), fields(width = source.width(), height = source.height()))
    )]
    pub fn run(
        &self,
        metadata: &ImageMetadata,
        source: &RasterView<'_>,
    ) -> Result<GeorefOutput, GeorefError> {
        if source.width() != metadata.cols || source.height() != metadata.rows {
            return Err(GeorefError::RasterSizeMismatch {
                stage: PipelineStage::Resampling,
                width: source.width(),
                height: source.height(),
                cols: metadata.cols,
                rows: metadata.rows,
            });
        }

        let plan = self.plan(metadata)?;
        let raster = warp_perspective_rgba(
            source,
            &plan.homography,
            plan.grid.rows,
            plan.grid.cols,
            self.config.warp_params(),
        );

        info!(
            "georeferenced {}x{} image onto {}x{} grid at {:.4} m ({} of {} pixels covered, {:.0} m² footprint)",
            metadata.cols,
            metadata.rows,
            plan.grid.cols,
            plan.grid.rows,
            plan.grid.gsd_m,
            raster.opaque_count(),
            plan.grid.cols * plan.grid.rows,
            plan.footprint.area_m2()
        );

        Ok(GeorefOutput {
            raster,
            geotransform: plan.geotransform(),
            projection: plan.projection,
            plan,
        })
    }
}

fn project(
    chain: &FrameChain,
    colrow: Point2<f64>,
    corner: Option<usize>,
) -> Result<Point3<f64>, GeorefError> {
    chain
        .apply(colrow)
        .map_err(|source| GeorefError::DegenerateProjection {
            stage: PipelineStage::FrameChain,
            corner,
            col: colrow.x,
            row: colrow.y,
            source,
        })
}
