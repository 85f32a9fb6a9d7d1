//! Imagery sources backed by local files or memory

use crate::error::Result;
use crate::imagery::{DateWindow, Granule, ImagerySource};
use burnscar_algorithms::vector::BoundingBox;
use burnscar_core::crs::CRS;
use burnscar_core::io::read_geotiff;
use burnscar_core::raster::Raster;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One granule as listed in a catalog manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub date: NaiveDate,
    pub epsg: u32,
    /// Raw sentinel for missing reflectance in the band files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodata: Option<f64>,
    /// Footprint `[west, south, east, north]` in WGS84; read from the
    /// band files when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    /// Band name to GeoTIFF path, relative to the manifest
    pub bands: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogManifest {
    pub granules: Vec<ManifestEntry>,
}

/// Granules described by a JSON manifest next to their GeoTIFF bands
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    root: PathBuf,
    manifest: CatalogManifest,
}

impl LocalCatalog {
    pub fn open<P: AsRef<Path>>(manifest_path: P) -> Result<Self> {
        let path = manifest_path.as_ref();
        let manifest: CatalogManifest = serde_json::from_str(&fs::read_to_string(path)?)?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        debug!("Opened catalog {} with {} granules", path.display(), manifest.granules.len());
        Ok(Self { root, manifest })
    }

    pub fn manifest(&self) -> &CatalogManifest {
        &self.manifest
    }

    fn load(&self, entry: &ManifestEntry, bands: &[&str]) -> Result<Option<Granule>> {
        let mut loaded = Vec::with_capacity(bands.len());
        for &name in bands {
            let Some(rel) = entry.bands.get(name) else {
                warn!("Granule {} has no band {}, skipping", entry.id, name);
                return Ok(None);
            };
            let mut raster: Raster<f64> = read_geotiff(self.root.join(rel))?;
            if entry.nodata.is_some() {
                raster.set_nodata(entry.nodata);
            }
            loaded.push((name.to_string(), raster));
        }
        Granule::new(&entry.id, entry.date, CRS::from_epsg(entry.epsg), loaded).map(Some)
    }
}

impl ImagerySource for LocalCatalog {
    fn search(
        &self,
        extent: &BoundingBox,
        window: &DateWindow,
        bands: &[&str],
    ) -> Result<Vec<Granule>> {
        let mut found = Vec::new();
        for entry in &self.manifest.granules {
            if !window.contains(entry.date) {
                continue;
            }
            if let Some([w, s, e, n]) = entry.bbox {
                if !BoundingBox::new(w, s, e, n).intersects(extent) {
                    continue;
                }
            }
            let Some(granule) = self.load(entry, bands)? else {
                continue;
            };
            if entry.bbox.is_none() && !granule.footprint_wgs84()?.intersects(extent) {
                continue;
            }
            found.push(granule);
        }
        debug!("Catalog search {} matched {} granules", window, found.len());
        Ok(found)
    }
}

/// Prepared granules held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    granules: Vec<Granule>,
}

impl InMemoryCatalog {
    pub fn new(granules: Vec<Granule>) -> Self {
        Self { granules }
    }

    pub fn push(&mut self, granule: Granule) {
        self.granules.push(granule);
    }

    pub fn len(&self) -> usize {
        self.granules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.granules.is_empty()
    }
}

impl ImagerySource for InMemoryCatalog {
    fn search(
        &self,
        extent: &BoundingBox,
        window: &DateWindow,
        bands: &[&str],
    ) -> Result<Vec<Granule>> {
        self.granules
            .iter()
            .filter(|g| window.contains(g.acquired))
            .filter_map(|g| g.select_bands(bands))
            .filter_map(|g| match g.footprint_wgs84() {
                Ok(fp) if fp.intersects(extent) => Some(Ok(g)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
            .collect()
    }
}
