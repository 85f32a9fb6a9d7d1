//! # burnscar-algorithms
//!
//! Raster algorithms behind burn-severity mapping.
//!
//! ## Categories
//!
//! - **imagery**: NBR, the dNBR / RdNBR / RBR metric stack, temporal
//!   median compositing, severity classification
//! - **resample**: nearest-neighbour regridding and reprojection
//! - **classification**: Otsu and fixed thresholding into binary masks
//! - **segmentation**: seeded flood fill and connected components
//! - **morphology**: hole filling, Gaussian mask smoothing, binary dilation
//! - **vector**: mask polygonisation, geometry rasterisation and clipping

pub mod classification;
pub mod imagery;
pub(crate) mod maybe_rayon;
pub mod morphology;
pub mod resample;
pub mod segmentation;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classification::{
        OtsuThreshold, SimpleThreshold, Thresholding, ThresholdingStrategy,
    };
    pub use crate::imagery::{
        classify_severity, compute_burn_metrics, median_composite, nbr, BurnMetric, MetricStack,
    };
    pub use crate::morphology::{postprocess_mask, PostProcessParams};
    pub use crate::segmentation::{Connectivity, SeededFloodFill, SegmentationStrategy};
    pub use crate::vector::{extract_boundary, polygonize, BoundingBox, MergePolicy};
    pub use burnscar_core::prelude::*;
}
