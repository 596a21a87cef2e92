use approx::assert_relative_eq;
use nalgebra::Point2;
use oblique_georef::core::{ExecutionStrategy, Raster};
use oblique_georef::{
    CorrectionOffsets, GeorefError, GeorefPlan, GeoreferencingPipeline, ImageMetadata,
    PipelineConfig, PipelineStage, PitchReference, SamplingMode, SensorWidthTable,
};
use serde_json::json;

/// DJI Mini 2 frame, 3000 columns by 4000 rows, straight down from 50 m.
fn mini2_nadir() -> ImageMetadata {
    ImageMetadata {
        maker: "DJI".into(),
        model: "FC7303".into(),
        rows: 4000,
        cols: 3000,
        focal_length_m: 4.5e-3,
        roll_deg: 0.0,
        pitch_deg: 0.0,
        yaw_deg: 0.0,
        altitude_m: 50.0,
        latitude_deg: 41.3874,
        longitude_deg: 2.1686,
    }
}

fn small_camera(roll_deg: f64, pitch_deg: f64, yaw_deg: f64) -> ImageMetadata {
    ImageMetadata {
        maker: "Test".into(),
        model: "Pinhole".into(),
        rows: 48,
        cols: 64,
        focal_length_m: 1e-3,
        roll_deg,
        pitch_deg,
        yaw_deg,
        altitude_m: 20.0,
        latitude_deg: -12.0,
        longitude_deg: 130.0,
    }
}

fn small_config() -> PipelineConfig {
    let mut sensors = SensorWidthTable::empty();
    sensors.insert("Test", "Pinhole", 64.0 * 1e-5);
    PipelineConfig {
        sensor_widths: sensors,
        ..PipelineConfig::default()
    }
}

fn checker(w: usize, h: usize) -> Raster {
    let mut data = Vec::with_capacity(w * h * 3);
    for y in 0..h {
        for x in 0..w {
            let v = if (x / 8 + y / 8) % 2 == 0 { 230 } else { 25 };
            data.extend_from_slice(&[v, (4 * x) as u8, (5 * y) as u8]);
        }
    }
    Raster::new(w, h, 3, data).unwrap()
}

fn assert_same_geometry(a: &GeorefPlan, b: &GeorefPlan) {
    assert_eq!(a.grid.cols, b.grid.cols);
    assert_eq!(a.grid.rows, b.grid.rows);
    for (x, y) in a.geotransform().iter().zip(b.geotransform()) {
        assert_relative_eq!(*x, y, epsilon = 1e-9);
    }
    for (x, y) in a.homography.h.iter().zip(b.homography.h.iter()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-9);
    }
}

#[test]
fn nadir_frame_gives_scale_and_translation() {
    let plan = GeoreferencingPipeline::default().plan(&mini2_nadir()).unwrap();

    assert_relative_eq!(plan.pixel_size_m, 2.1e-6, max_relative = 1e-12);
    assert_relative_eq!(plan.grid.gsd_m, 2.1e-6 * 50.0 / 4.5e-3, max_relative = 1e-12);
    assert_relative_eq!(plan.grid.gsd_m, 0.0233, epsilon = 1e-4);
    assert!((3000..=3001).contains(&plan.grid.cols), "cols = {}", plan.grid.cols);
    assert!((4000..=4001).contains(&plan.grid.rows), "rows = {}", plan.grid.rows);

    let h = plan.homography.h;
    assert!(plan.homography.is_affine(1e-9));
    assert_relative_eq!(h[(0, 1)], 0.0, epsilon = 1e-6);
    assert_relative_eq!(h[(1, 0)], 0.0, epsilon = 1e-6);
    assert_relative_eq!(h[(0, 0)], 1.0, epsilon = 1e-6);
    assert_relative_eq!(h[(1, 1)], 1.0, epsilon = 1e-6);

    // 3000 columns of 2.33 cm each, centred on the camera
    assert_relative_eq!(plan.grid.bbox.center().x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(plan.grid.bbox.center().y, 0.0, epsilon = 1e-9);
    assert_relative_eq!(plan.footprint.area_m2(), 70.0 * 93.333_333_333, max_relative = 1e-6);

    assert_eq!(
        plan.projection.proj_string(),
        "+proj=nsper +h=50 +lat_0=41.3874 +lon_0=2.1686 +datum=WGS84 +type=crs"
    );
}

#[test]
fn horizon_referenced_pitch_matches_nadir_reference() {
    let nadir = GeoreferencingPipeline::default().plan(&mini2_nadir()).unwrap();

    let mut meta = mini2_nadir();
    meta.pitch_deg = -90.0;
    let config = PipelineConfig::default().with_pitch_reference(PitchReference::Horizon);
    let horizon = GeoreferencingPipeline::new(config).plan(&meta).unwrap();

    assert_relative_eq!(horizon.attitude.pitch_deg, 0.0, epsilon = 1e-12);
    assert_same_geometry(&nadir, &horizon);
}

#[test]
fn horizon_referenced_gimbal_looks_forward() {
    let config = small_config().with_pitch_reference(PitchReference::Horizon);
    let plan = GeoreferencingPipeline::new(config)
        .plan(&small_camera(0.0, -30.0, 0.0))
        .unwrap();

    assert_relative_eq!(plan.attitude.pitch_deg, -60.0, epsilon = 1e-12);

    // optical axis 20 m * tan(60°) north of the drone
    let principal = plan.footprint.principal_enu;
    assert_relative_eq!(principal.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(principal.y, 20.0 * 60f64.to_radians().tan(), max_relative = 1e-9);

    // top of the image is the far edge, left stays west
    let [tl, tr, br, bl] = plan.ground_corners;
    assert!(tl.y > bl.y && tr.y > br.y, "{:?}", plan.ground_corners);
    assert!(tl.x < tr.x && bl.x < br.x);
    assert!(bl.y > 0.0);
}

#[test]
fn missing_yaw_correction_defaults_to_zero() {
    let config = PipelineConfig::from_json_str(
        &json!({
            "corrections": { "DELTA_ROLL": 0.0, "DELTA_PITCH": 0.0, "DELTA_ALT": 0.0 }
        })
        .to_string(),
    )
    .unwrap();
    let pipeline = GeoreferencingPipeline::new(config);

    let first = pipeline.plan(&mini2_nadir()).unwrap();
    let second = pipeline.plan(&mini2_nadir()).unwrap();
    assert_eq!(first, second);

    assert_eq!(first.corrections.offsets, CorrectionOffsets::default());
    assert_eq!(first.corrections.substituted.len(), 1);
    assert_eq!(first.corrections.substituted[0].key(), "DELTA_YAW");

    let uncorrected = GeoreferencingPipeline::default().plan(&mini2_nadir()).unwrap();
    assert_same_geometry(&first, &uncorrected);
}

#[test]
fn corrections_shift_the_attitude() {
    let config = PipelineConfig::default()
        .with_corrections(CorrectionOffsets::new(1.0, 10.0, -20.0, 5.0));
    let plan = GeoreferencingPipeline::new(config).plan(&mini2_nadir()).unwrap();

    assert_eq!(plan.attitude.roll_deg, 1.0);
    assert_eq!(plan.attitude.pitch_deg, 10.0);
    assert_eq!(plan.attitude.yaw_deg, -20.0);
    assert_eq!(plan.altitude_m, 55.0);
    assert!(plan.corrections.substituted.is_empty());
}

#[test]
fn unknown_sensor_is_rejected() {
    let mut meta = mini2_nadir();
    meta.model = "FC9999".into();
    let err = GeoreferencingPipeline::default().plan(&meta).unwrap_err();

    assert_eq!(err.stage(), Some(PipelineStage::SensorLookup));
    match err {
        GeorefError::UnknownSensor { model, known, .. } => {
            assert_eq!(model, "FC9999");
            assert!(known.contains("DJI/FC7303"));
        }
        other => panic!("expected UnknownSensor, got {other}"),
    }
}

#[test]
fn camera_at_the_horizon_is_degenerate() {
    let mut meta = mini2_nadir();
    meta.pitch_deg = 0.0;
    let config = PipelineConfig::default().with_pitch_reference(PitchReference::Horizon);
    let err = GeoreferencingPipeline::new(config).plan(&meta).unwrap_err();

    assert_eq!(err.stage(), Some(PipelineStage::FrameChain));
    assert!(matches!(
        err,
        GeorefError::DegenerateProjection {
            corner: Some(_),
            ..
        }
    ));
}

#[test]
fn grazing_corner_is_degenerate_not_huge() {
    // top image corners 1e-4 rad below the horizon
    let front: f64 = 24.0 * 1e-5 / 1e-3;
    let pitch = front.atan() - std::f64::consts::FRAC_PI_2 + 1e-4;
    let meta = small_camera(0.0, pitch.to_degrees(), 0.0);
    let pipeline = GeoreferencingPipeline::new(small_config());

    let err = pipeline.plan(&meta).unwrap_err();
    assert_eq!(err.stage(), Some(PipelineStage::FrameChain));
    assert!(matches!(
        err,
        GeorefError::DegenerateProjection {
            corner: Some(0),
            ..
        }
    ));
    assert!(pipeline.run(&meta, &checker(64, 48).view()).is_err());
}

#[test]
fn oversized_output_grid_is_an_error() {
    let meta = small_camera(0.0, 0.0, 0.0);
    let capped = small_config().with_max_output_pixels(1000);
    let err = GeoreferencingPipeline::new(capped).plan(&meta).unwrap_err();
    assert_eq!(err.stage(), Some(PipelineStage::GridSizing));
    match err {
        GeorefError::GridTooLarge {
            cols,
            rows,
            max_pixels,
            ..
        } => {
            assert_eq!(max_pixels, 1000);
            assert!(cols * rows > 1000.0);
        }
        other => panic!("expected GridTooLarge, got {other}"),
    }

    // a tiny GSD fails before any allocation under the default cap
    let fine = GeoreferencingPipeline::new(small_config().with_gsd(1e-7));
    let err = fine.run(&meta, &checker(64, 48).view()).unwrap_err();
    assert!(matches!(
        err,
        GeorefError::GridTooLarge {
            stage: PipelineStage::GridSizing,
            ..
        }
    ));
}

#[test]
fn invalid_metadata_fails_before_geometry() {
    let mut meta = mini2_nadir();
    meta.focal_length_m = 0.0;
    let err = GeoreferencingPipeline::default().plan(&meta).unwrap_err();
    assert!(matches!(err, GeorefError::InvalidMetadata(_)));
}

#[test]
fn oblique_output_is_opaque_exactly_inside_the_footprint() {
    let meta = small_camera(4.0, 25.0, 60.0);
    let src = checker(64, 48);
    let out = GeoreferencingPipeline::new(small_config())
        .run(&meta, &src.view())
        .unwrap();

    let r = &out.raster;
    assert_eq!((r.width, r.height), (out.plan.grid.cols, out.plan.grid.rows));
    assert!(r.opaque_count() > 0);
    assert!(r.opaque_count() < r.width * r.height);

    let h = &out.plan.homography;
    for y in 0..r.height {
        for x in 0..r.width {
            let [_, _, _, a] = r.pixel(x, y);
            let p = h.apply(Point2::new(x as f64 + 0.5, y as f64 + 0.5));
            let inside = p.x >= 0.0 && p.x < 64.0 && p.y >= 0.0 && p.y < 48.0;
            assert_eq!(a == 255, inside, "pixel ({x}, {y}) maps to {p:?}");
            assert!(a == 0 || a == 255);
        }
    }

    // covered pixels add up to the footprint area
    let gsd = out.plan.grid.gsd_m;
    let covered = r.opaque_count() as f64 * gsd * gsd;
    assert_relative_eq!(covered, out.footprint().area_m2(), max_relative = 0.1);
}

#[test]
fn serial_and_parallel_runs_agree() {
    let meta = small_camera(-3.0, 15.0, 200.0);
    let src = checker(64, 48);

    for sampling in [SamplingMode::Nearest, SamplingMode::Bilinear] {
        let mut serial = small_config();
        serial.sampling = sampling;
        serial.execution = ExecutionStrategy::Serial;
        let mut parallel = serial.clone();
        parallel.execution = ExecutionStrategy::ParallelRows;

        let a = GeoreferencingPipeline::new(serial).run(&meta, &src.view()).unwrap();
        let b = GeoreferencingPipeline::new(parallel).run(&meta, &src.view()).unwrap();
        assert_eq!(a.raster, b.raster);
        assert_eq!(a.geotransform, b.geotransform);
    }
}

#[test]
fn yaw_rotates_the_footprint_about_the_nadir() {
    let config = small_config();
    let north = GeoreferencingPipeline::new(config.clone())
        .plan(&small_camera(0.0, 0.0, 0.0))
        .unwrap();
    let rotated = GeoreferencingPipeline::new(config)
        .plan(&small_camera(0.0, 0.0, 90.0))
        .unwrap();

    // a quarter turn swaps the footprint's width and height
    assert_relative_eq!(
        north.grid.bbox.width(),
        rotated.grid.bbox.height(),
        epsilon = 2.0 * north.grid.gsd_m
    );
    for (a, b) in north.ground_corners.iter().zip(&rotated.ground_corners) {
        assert_relative_eq!(a.coords.norm(), b.coords.norm(), epsilon = 1e-9);
    }
}
