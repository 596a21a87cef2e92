//! Log output of a run with an incomplete correction map.
//!
//! Kept in its own test binary: it installs the global logger.

use log::{Level, LevelFilter, Log, Metadata, Record};
use oblique_georef::{GeoreferencingPipeline, ImageMetadata, PipelineConfig};
use std::sync::Mutex;

struct Capture {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for Capture {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    records: Mutex::new(Vec::new()),
};

#[test]
fn missing_correction_warns_exactly_once() {
    log::set_logger(&CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let config = PipelineConfig::from_json_str(
        r#"{ "corrections": { "DELTA_ROLL": 0.0, "DELTA_PITCH": 0.0, "DELTA_ALT": 0.0 } }"#,
    )
    .unwrap();
    let meta = ImageMetadata {
        maker: "DJI".into(),
        model: "FC7303".into(),
        rows: 4000,
        cols: 3000,
        focal_length_m: 4.5e-3,
        roll_deg: 0.0,
        pitch_deg: 0.0,
        yaw_deg: 0.0,
        altitude_m: 50.0,
        latitude_deg: 0.0,
        longitude_deg: 0.0,
    };
    GeoreferencingPipeline::new(config).plan(&meta).unwrap();

    let records = CAPTURE.records.lock().unwrap();
    let warnings: Vec<_> = records
        .iter()
        .filter(|(level, _)| *level == Level::Warn)
        .map(|(_, msg)| msg.as_str())
        .collect();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("DELTA_YAW"));

    // stage-by-stage progress goes to debug
    assert!(records.iter().any(|(level, _)| *level == Level::Debug));
}
