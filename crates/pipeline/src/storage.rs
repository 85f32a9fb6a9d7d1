//! Object storage for metric stacks and boundaries

use crate::boundary::Boundary;
use crate::error::{PipelineError, Result};
use burnscar_algorithms::imagery::{BurnMetric, MetricStack};
use burnscar_core::crs::CRS;
use burnscar_core::io::{read_geotiff, write_geotiff};
use burnscar_core::raster::Raster;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Remote file name of the derived boundary
pub const BOUNDARY_FILE: &str = "boundary.geojson";

/// Copies files between the local filesystem and remote keys
pub trait ObjectStore {
    fn upload(&self, local: &Path, remote: &str) -> Result<()>;
    fn download(&self, remote: &str, local: &Path) -> Result<()>;
    fn exists(&self, remote: &str) -> Result<bool>;
}

/// Object store backed by a directory; keys are `/`-separated relative paths
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, remote: &str) -> Result<PathBuf> {
        let rel = Path::new(remote.trim_start_matches('/'));
        let clean = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if remote.trim().is_empty() || !clean {
            return Err(PipelineError::Storage(format!("invalid object key '{remote}'")));
        }
        Ok(self.root.join(rel))
    }
}

impl ObjectStore for LocalObjectStore {
    fn upload(&self, local: &Path, remote: &str) -> Result<()> {
        let target = self.resolve(remote)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(local, &target)?;
        debug!("Uploaded {} to {}", local.display(), remote);
        Ok(())
    }

    fn download(&self, remote: &str, local: &Path) -> Result<()> {
        let source = self.resolve(remote)?;
        if !source.is_file() {
            return Err(PipelineError::Storage(format!("no object at '{remote}'")));
        }
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source, local)?;
        Ok(())
    }

    fn exists(&self, remote: &str) -> Result<bool> {
        Ok(self.resolve(remote)?.is_file())
    }
}

/// Persists one fire event's stack as `<prefix>/<metric>.tif` plus
/// `<prefix>/boundary.geojson`
pub struct MetricStackStore<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    prefix: String,
}

impl<'a, S: ObjectStore + ?Sized> MetricStackStore<'a, S> {
    pub fn new(store: &'a S, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim_matches('/').to_string();
        Self { store, prefix }
    }

    /// Prefix `<affiliation>/<event>` as used for published events
    pub fn for_event(store: &'a S, affiliation: &str, event: &str) -> Self {
        Self::new(store, format!("{affiliation}/{event}"))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, file: &str) -> String {
        if self.prefix.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", self.prefix, file)
        }
    }

    pub fn save_stack(&self, stack: &MetricStack) -> Result<()> {
        let tmp = TempDir::new()?;
        for (metric, layer) in stack.iter() {
            let file = format!("{}.tif", metric.name());
            let local = tmp.path().join(&file);
            write_geotiff(layer, &local)?;
            self.store.upload(&local, &self.key(&file))?;
        }
        info!("Saved metric stack under {}", self.prefix);
        Ok(())
    }

    /// Reassemble the stack from its per-layer files.
    ///
    /// Layers missing from the store are reported together.
    pub fn load_stack(&self) -> Result<MetricStack> {
        let tmp = TempDir::new()?;
        let mut layers: HashMap<BurnMetric, Raster<f64>> = HashMap::new();
        let mut missing = Vec::new();
        for metric in BurnMetric::ALL {
            let file = format!("{}.tif", metric.name());
            let key = self.key(&file);
            if !self.store.exists(&key)? {
                missing.push(metric.name().to_string());
                continue;
            }
            let local = tmp.path().join(&file);
            self.store.download(&key, &local)?;
            layers.insert(metric, read_geotiff(&local)?);
        }
        if !missing.is_empty() {
            return Err(burnscar_core::Error::MissingLayers(missing).into());
        }
        debug!("Loaded metric stack from {}", self.prefix);
        Ok(MetricStack::from_layers(layers)?)
    }

    pub fn save_boundary(&self, boundary: &Boundary) -> Result<()> {
        let tmp = TempDir::new()?;
        let local = tmp.path().join(BOUNDARY_FILE);
        fs::write(&local, boundary.to_geojson().to_string())?;
        self.store.upload(&local, &self.key(BOUNDARY_FILE))
    }

    /// Boundary GeoJSON; `default_crs` applies when the file names none
    pub fn load_boundary(&self, default_crs: &CRS) -> Result<Boundary> {
        let tmp = TempDir::new()?;
        let local = tmp.path().join(BOUNDARY_FILE);
        self.store.download(&self.key(BOUNDARY_FILE), &local)?;
        Boundary::from_geojson_str(&fs::read_to_string(&local)?, default_crs)
    }
}
