//! Pipeline configuration
//!
//! Every knob the pipeline components read lives in one [`PipelineConfig`]
//! record. It deserialises from JSON with any field omitted falling back to
//! the production defaults below.

use crate::error::{PipelineError, Result};
use burnscar_algorithms::classification::{OtsuThreshold, SimpleThreshold, Thresholding};
use burnscar_algorithms::imagery::BurnMetric;
use burnscar_algorithms::morphology::PostProcessParams;
use burnscar_algorithms::vector::MergePolicy;
use burnscar_core::crs::{parse_utm_epsg, CRS, WGS84_EPSG};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_BBOX_BUFFER: f64 = 0.1;
pub const DEFAULT_BBOX_PRECISION: u32 = 2;
pub const DEFAULT_RESOLUTION: f64 = 20.0;
pub const DEFAULT_NIR_BAND: &str = "B8A";
pub const DEFAULT_SWIR_BAND: &str = "B12";
/// Threshold on `rbr` when a boundary is derived right after computing metrics
pub const DEFAULT_AUTO_THRESHOLD: f64 = 0.025;
/// Threshold on `rbr` when refining a stored stack with seed points
pub const DEFAULT_REFINE_THRESHOLD: f64 = 0.2;

/// Top-level configuration of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// EPSG code of the CRS metric rasters and boundaries are delivered in
    pub working_epsg: u32,
    /// Added to every side of the boundary envelope, in working CRS units
    pub bbox_buffer: f64,
    /// Decimal places the envelope is rounded to before buffering
    pub bbox_precision: u32,
    /// Reduction cell size in the imagery's native CRS units
    pub resolution: f64,
    pub nir_band: String,
    pub swir_band: String,
    /// Sentinel code raw granules use for missing reflectance
    pub raw_nodata: Option<f64>,
    pub derivation: DerivationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            working_epsg: WGS84_EPSG,
            bbox_buffer: DEFAULT_BBOX_BUFFER,
            bbox_precision: DEFAULT_BBOX_PRECISION,
            resolution: DEFAULT_RESOLUTION,
            nir_band: DEFAULT_NIR_BAND.to_string(),
            swir_band: DEFAULT_SWIR_BAND.to_string(),
            raw_nodata: Some(0.0),
            derivation: DerivationConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn working_crs(&self) -> CRS {
        CRS::from_epsg(self.working_epsg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.working_epsg != WGS84_EPSG && parse_utm_epsg(self.working_epsg).is_none() {
            return Err(invalid(format!(
                "working_epsg {} is neither WGS84 nor a UTM zone",
                self.working_epsg
            )));
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(invalid(format!("resolution must be positive, got {}", self.resolution)));
        }
        if !(self.bbox_buffer.is_finite() && self.bbox_buffer >= 0.0) {
            return Err(invalid(format!(
                "bbox_buffer must be non-negative, got {}",
                self.bbox_buffer
            )));
        }
        if self.bbox_precision > 12 {
            return Err(invalid(format!(
                "bbox_precision {} exceeds 12 decimals",
                self.bbox_precision
            )));
        }
        if self.nir_band.trim().is_empty() || self.swir_band.trim().is_empty() {
            return Err(invalid("band names must not be empty".into()));
        }
        if self.nir_band == self.swir_band {
            return Err(invalid(format!("NIR and SWIR are both band {}", self.nir_band)));
        }
        if self.raw_nodata.is_some_and(|v| !v.is_finite()) {
            return Err(invalid("raw_nodata must be a finite sentinel".into()));
        }
        self.derivation.validate()
    }
}

/// How a continuous metric layer is cut into a disturbance mask
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ThresholdMethod {
    Otsu,
    Simple { threshold: f64 },
}

impl ThresholdMethod {
    pub fn strategy(&self) -> Thresholding {
        match *self {
            ThresholdMethod::Otsu => Thresholding::Otsu(OtsuThreshold::default()),
            ThresholdMethod::Simple { threshold } => {
                Thresholding::Simple(SimpleThreshold::new(threshold))
            }
        }
    }

    fn validate(&self, field: &str) -> Result<()> {
        match self {
            ThresholdMethod::Simple { threshold } if !threshold.is_finite() => Err(invalid(
                format!("{field} threshold must be finite, got {threshold}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Value written into no-data cells before thresholding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanFill {
    #[default]
    Zero,
    Mean,
}

/// Mask clean-up between thresholding and segmentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessConfig {
    pub fill_holes: bool,
    pub smooth_sigma: Option<f64>,
    pub dilate_iterations: Option<usize>,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            fill_holes: true,
            smooth_sigma: None,
            dilate_iterations: None,
        }
    }
}

impl PostProcessConfig {
    pub fn params(&self) -> PostProcessParams {
        PostProcessParams {
            fill_holes: self.fill_holes,
            smooth_sigma: self.smooth_sigma,
            dilate_iterations: self.dilate_iterations,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(remote = "MergePolicy", rename_all = "snake_case")]
enum MergePolicyDef {
    KeepMultiPolygon,
    ConvexHull,
}

/// Boundary derivation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// Layer thresholded to find the burn
    #[serde(with = "metric_name")]
    pub metric: BurnMetric,
    /// Used when deriving right after metric computation
    pub threshold: ThresholdMethod,
    /// Used when refining a stored stack with fresh seeds
    pub refine_threshold: ThresholdMethod,
    pub postprocess: PostProcessConfig,
    pub nan_fill: NanFill,
    #[serde(with = "MergePolicyDef")]
    pub merge_policy: MergePolicy,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            metric: BurnMetric::Rbr,
            threshold: ThresholdMethod::Simple {
                threshold: DEFAULT_AUTO_THRESHOLD,
            },
            refine_threshold: ThresholdMethod::Simple {
                threshold: DEFAULT_REFINE_THRESHOLD,
            },
            postprocess: PostProcessConfig::default(),
            nan_fill: NanFill::default(),
            merge_policy: MergePolicy::default(),
        }
    }
}

impl DerivationConfig {
    pub fn validate(&self) -> Result<()> {
        self.threshold.validate("threshold")?;
        self.refine_threshold.validate("refine_threshold")?;
        if let Some(sigma) = self.postprocess.smooth_sigma {
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(invalid(format!("smooth_sigma must be positive, got {sigma}")));
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> PipelineError {
    PipelineError::Config(reason)
}

/// Serialises a [`BurnMetric`] as its layer name
mod metric_name {
    use burnscar_algorithms::imagery::BurnMetric;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(metric: &BurnMetric, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(metric.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BurnMetric, D::Error> {
        let name = String::deserialize(d)?;
        name.parse().map_err(D::Error::custom)
    }
}
