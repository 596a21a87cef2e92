//! Georeference a synthetic oblique photo and write it as PNG + world file.
//!
//! ```text
//! cargo run -p oblique-georef --example georef_synthetic -- [out_dir] [config.json]
//! ```

use std::{env, fs, path::PathBuf, time::Instant};

use image::{ImageBuffer, Rgb, RgbImage, Rgba};
use oblique_georef::core::RasterError;
use oblique_georef::io::{georeference_into, InMemoryProvider, ProviderError, RasterSink};
use oblique_georef::{
    Footprint, GeorefOutput, GeoreferencingPipeline, ImageMetadata, PipelineConfig, Raster,
};
use serde::Serialize;

const ROWS: u32 = 600;
const COLS: u32 = 800;

/// Writes `<id>.png`, `<id>.pgw` and `<id>.json` into a directory.
struct PngWorldFileSink {
    dir: PathBuf,
}

#[derive(Serialize)]
struct Sidecar<'a> {
    projection: String,
    geotransform: [f64; 6],
    footprint: &'a Footprint,
}

fn sink_error(id: &str, e: impl std::error::Error + Send + Sync + 'static) -> ProviderError {
    ProviderError::Sink {
        id: id.to_owned(),
        source: Box::new(e),
    }
}

impl RasterSink for PngWorldFileSink {
    fn write_raster(&mut self, id: &str, output: &GeorefOutput) -> Result<(), ProviderError> {
        let r = &output.raster;
        let img = ImageBuffer::<Rgba<u8>, _>::from_raw(
            r.width as u32,
            r.height as u32,
            r.data.clone(),
        )
        .ok_or_else(|| ProviderError::Sink {
            id: id.to_owned(),
            source: "raster buffer does not match its size".into(),
        })?;
        img.save(self.dir.join(format!("{id}.png")))
            .map_err(|e| sink_error(id, e))?;

        // World files reference pixel centres.
        let [xmin, gsd, rot_x, ymax, rot_y, neg_gsd] = output.geotransform;
        let world = format!(
            "{gsd}\n{rot_y}\n{rot_x}\n{neg_gsd}\n{}\n{}\n",
            xmin + 0.5 * gsd,
            ymax + 0.5 * neg_gsd
        );
        fs::write(self.dir.join(format!("{id}.pgw")), world).map_err(|e| sink_error(id, e))?;

        let sidecar = Sidecar {
            projection: output.projection.proj_string(),
            geotransform: output.geotransform,
            footprint: output.footprint(),
        };
        let json = serde_json::to_string_pretty(&sidecar).map_err(|e| sink_error(id, e))?;
        fs::write(self.dir.join(format!("{id}.json")), json).map_err(|e| sink_error(id, e))?;
        Ok(())
    }
}

/// Checkerboard with a red top edge and a blue left edge, so orientation is
/// obvious in the output.
fn synthetic_photo() -> Result<Raster, RasterError> {
    let img: RgbImage = ImageBuffer::from_fn(COLS, ROWS, |x, y| {
        if y < 12 {
            Rgb([220, 30, 30])
        } else if x < 12 {
            Rgb([30, 30, 220])
        } else if (x / 50 + y / 50) % 2 == 0 {
            Rgb([235, 235, 235])
        } else {
            Rgb([40, 40, 40])
        }
    });
    Raster::new(COLS as usize, ROWS as usize, 3, img.into_raw())
}

fn synthetic_metadata() -> ImageMetadata {
    ImageMetadata {
        maker: "DJI".into(),
        model: "FC7303".into(),
        rows: ROWS as usize,
        cols: COLS as usize,
        focal_length_m: 4.5e-3,
        roll_deg: 2.0,
        pitch_deg: -55.0,
        yaw_deg: 30.0,
        altitude_m: 60.0,
        latitude_deg: 41.3874,
        longitude_deg: 2.1686,
    }
}

fn init_logging() {
    #[cfg(feature = "tracing")]
    oblique_georef::init_tracing(false);
    #[cfg(not(feature = "tracing"))]
    let _ = oblique_georef::init_with_level(log::LevelFilter::Info);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let mut args = env::args().skip(1);
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("oblique-georef"));
    let config = match args.next() {
        Some(path) => PipelineConfig::from_json_str(&fs::read_to_string(path)?)?,
        None => PipelineConfig::from_json_str(r#"{ "pitch_reference": "horizon" }"#)?,
    };
    fs::create_dir_all(&out_dir)?;

    let mut provider = InMemoryProvider::new();
    provider.insert("synthetic", synthetic_metadata(), synthetic_photo()?);

    let pipeline = GeoreferencingPipeline::new(config);
    let mut sink = PngWorldFileSink {
        dir: out_dir.clone(),
    };

    let start = Instant::now();
    georeference_into("synthetic", &provider, &provider, &pipeline, &mut sink)?;
    log::info!(
        "wrote synthetic.png/.pgw/.json to {} in {:.1} ms",
        out_dir.display(),
        start.elapsed().as_secs_f64() * 1e3
    );

    Ok(())
}
