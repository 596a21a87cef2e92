//! Physical sensor widths by camera maker and model.

use crate::{GeorefError, ImageMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Built-in `(maker, model, sensor width in millimetres)` entries.
pub const BUILTIN_SENSOR_WIDTHS_MM: &[(&str, &str, f64)] = &[
    ("DJI", "FC7303", 6.3),
    ("DJI", "FC220", 6.17),
    ("DJI", "FC6310", 13.2),
    ("Hasselblad", "L1D-20c", 13.2),
];

/// `maker → model → sensor width (m)`.
///
/// Serializes as a nested JSON object so callers can ship their own table in
/// the pipeline configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorWidthTable {
    widths_m: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Default for SensorWidthTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for &(maker, model, width_mm) in BUILTIN_SENSOR_WIDTHS_MM {
            table.insert(maker, model, width_mm * 1e-3);
        }
        table
    }
}

impl SensorWidthTable {
    pub fn empty() -> Self {
        Self {
            widths_m: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, maker: impl Into<String>, model: impl Into<String>, width_m: f64) {
        self.widths_m
            .entry(maker.into())
            .or_default()
            .insert(model.into(), width_m);
    }

    pub fn width_m(&self, maker: &str, model: &str) -> Option<f64> {
        self.widths_m.get(maker)?.get(model).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.widths_m.iter().flat_map(|(maker, models)| {
            models
                .iter()
                .map(move |(model, w)| (maker.as_str(), model.as_str(), *w))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// `maker/model` pairs, comma separated.
    pub fn known_sensors(&self) -> String {
        self.iter()
            .map(|(maker, model, _)| format!("{maker}/{model}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Size of one pixel on the sensor (m): sensor width over image columns.
    pub fn pixel_size(&self, metadata: &ImageMetadata) -> Result<f64, GeorefError> {
        let width_m = self
            .width_m(&metadata.maker, &metadata.model)
            .ok_or_else(|| GeorefError::UnknownSensor {
                maker: metadata.maker.clone(),
                model: metadata.model.clone(),
                known: self.known_sensors(),
            })?;

        if !width_m.is_finite() || width_m <= 0.0 {
            return Err(GeorefError::InvalidConfig(format!(
                "sensor width of {}/{} must be positive (got {width_m} m)",
                metadata.maker, metadata.model
            )));
        }
        if metadata.cols == 0 {
            return Err(GeorefError::InvalidMetadata("image has no columns".into()));
        }

        Ok(width_m / metadata.cols as f64)
    }
}
