//! Seams to the outside world: tag stores, pixel sources and output sinks.
//!
//! The pipeline never reads or writes files itself. Callers implement these
//! traits over whatever storage they have; [`InMemoryProvider`] covers tests
//! and callers that already hold everything in memory.

use crate::metadata::ImageMetadata;
use crate::pipeline::{GeorefOutput, GeoreferencingPipeline};
use crate::GeorefError;
use log::debug;
use oblique_georef_core::Raster;
use std::collections::HashMap;

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("cannot read tags of image '{id}': {reason}")]
    TagsUnreadable { id: String, reason: String },
    #[error("no raster for image '{id}'")]
    RasterUnavailable { id: String },
    #[error("cannot write output for image '{id}': {source}")]
    Sink {
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Reads orientation metadata for an image identifier.
pub trait MetadataProvider {
    fn read_metadata(&self, id: &str) -> Result<ImageMetadata, ProviderError>;
}

/// Reads the pixels of an image identifier.
pub trait RasterSource {
    fn read_raster(&self, id: &str) -> Result<Raster, ProviderError>;
}

/// Persists a georeferenced raster together with its geotransform and
/// projection.
pub trait RasterSink {
    fn write_raster(&mut self, id: &str, output: &GeorefOutput) -> Result<(), ProviderError>;
}

/// Metadata and rasters held in hash maps.
#[derive(Clone, Debug, Default)]
pub struct InMemoryProvider {
    metadata: HashMap<String, ImageMetadata>,
    rasters: HashMap<String, Raster>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, metadata: ImageMetadata, raster: Raster) {
        let id = id.into();
        self.metadata.insert(id.clone(), metadata);
        self.rasters.insert(id, raster);
    }

    pub fn insert_metadata(&mut self, id: impl Into<String>, metadata: ImageMetadata) {
        self.metadata.insert(id.into(), metadata);
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}

impl MetadataProvider for InMemoryProvider {
    fn read_metadata(&self, id: &str) -> Result<ImageMetadata, ProviderError> {
        self.metadata
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::TagsUnreadable {
                id: id.to_owned(),
                reason: "no such image".into(),
            })
    }
}

impl RasterSource for InMemoryProvider {
    fn read_raster(&self, id: &str) -> Result<Raster, ProviderError> {
        self.rasters
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::RasterUnavailable { id: id.to_owned() })
    }
}

/// Outputs kept in memory, keyed by image identifier.
#[derive(Debug, Default)]
pub struct InMemorySink {
    pub outputs: HashMap<String, GeorefOutput>,
}

impl RasterSink for InMemorySink {
    fn write_raster(&mut self, id: &str, output: &GeorefOutput) -> Result<(), ProviderError> {
        self.outputs.insert(id.to_owned(), output.clone());
        Ok(())
    }
}

/// Read `id` from `metadata` and `source` and run `pipeline` on it.
pub fn georeference<M, S>(
    id: &str,
    metadata: &M,
    source: &S,
    pipeline: &GeoreferencingPipeline,
) -> Result<GeorefOutput, GeorefError>
where
    M: MetadataProvider + ?Sized,
    S: RasterSource + ?Sized,
{
    let meta = metadata.read_metadata(id)?;
    debug!("{id}: {}/{} {}x{}", meta.maker, meta.model, meta.cols, meta.rows);
    let raster = source.read_raster(id)?;
    pipeline.run(&meta, &raster.view())
}

/// [`georeference`], then hand the result to `sink`.
pub fn georeference_into<M, S, K>(
    id: &str,
    metadata: &M,
    source: &S,
    pipeline: &GeoreferencingPipeline,
    sink: &mut K,
) -> Result<(), GeorefError>
where
    M: MetadataProvider + ?Sized,
    S: RasterSource + ?Sized,
    K: RasterSink + ?Sized,
{
    let output = georeference(id, metadata, source, pipeline)?;
    sink.write_raster(id, &output)?;
    Ok(())
}
