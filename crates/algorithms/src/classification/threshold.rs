//! Thresholding a continuous layer into a binary disturbance mask
//!
//! Mask cells are `1` for disturbed and `0` otherwise; NaN cells are `0`.

use crate::maybe_rayon::*;
use burnscar_core::raster::Raster;
use burnscar_core::{Error, Result};
use ndarray::Array2;

/// Turns a continuous layer into a {0, 1} mask on the same grid
pub trait ThresholdingStrategy {
    fn name(&self) -> &'static str;

    fn apply(&self, layer: &Raster<f64>) -> Result<Raster<u8>>;
}

/// Otsu's method over a histogram of the finite values.
///
/// Cells strictly above the threshold are disturbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OtsuThreshold {
    pub bins: usize,
}

impl Default for OtsuThreshold {
    fn default() -> Self {
        Self { bins: 256 }
    }
}

impl OtsuThreshold {
    /// The threshold that maximises between-class variance.
    ///
    /// Returned as a bin centre between the minimum and maximum finite value.
    /// A constant layer returns that constant.
    pub fn compute(&self, layer: &Raster<f64>) -> Result<f64> {
        if self.bins < 2 {
            return Err(Error::InvalidParameter {
                name: "bins",
                value: self.bins.to_string(),
                reason: "Otsu needs at least two histogram bins".into(),
            });
        }

        let values: Vec<f64> = layer.data().iter().copied().filter(|v| v.is_finite()).collect();
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if values.is_empty() {
            return Err(Error::Algorithm("Otsu threshold of a layer with no finite values".into()));
        }
        if min == max {
            return Ok(min);
        }

        let nbins = self.bins;
        let width = (max - min) / nbins as f64;
        let mut hist = vec![0.0f64; nbins];
        for &v in &values {
            let bin = (((v - min) / width) as usize).min(nbins - 1);
            hist[bin] += 1.0;
        }
        let centers: Vec<f64> = (0..nbins).map(|i| min + (i as f64 + 0.5) * width).collect();

        // Cumulative class weights and means from the left and from the right
        let mut w_left = vec![0.0; nbins];
        let mut m_left = vec![0.0; nbins];
        let (mut w, mut s) = (0.0, 0.0);
        for i in 0..nbins {
            w += hist[i];
            s += hist[i] * centers[i];
            w_left[i] = w;
            m_left[i] = if w > 0.0 { s / w } else { 0.0 };
        }
        let mut w_right = vec![0.0; nbins];
        let mut m_right = vec![0.0; nbins];
        let (mut w, mut s) = (0.0, 0.0);
        for i in (0..nbins).rev() {
            w += hist[i];
            s += hist[i] * centers[i];
            w_right[i] = w;
            m_right[i] = if w > 0.0 { s / w } else { 0.0 };
        }

        let mut best = 0;
        let mut best_var = f64::NEG_INFINITY;
        for i in 0..nbins - 1 {
            let diff = m_left[i] - m_right[i + 1];
            let var = w_left[i] * w_right[i + 1] * diff * diff;
            if var > best_var {
                best_var = var;
                best = i;
            }
        }

        Ok(centers[best])
    }
}

impl ThresholdingStrategy for OtsuThreshold {
    fn name(&self) -> &'static str {
        "otsu"
    }

    fn apply(&self, layer: &Raster<f64>) -> Result<Raster<u8>> {
        let t = self.compute(layer)?;
        binarize(layer, |v| v > t)
    }
}

/// Fixed cut-off: cells at or above `threshold` are disturbed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleThreshold {
    pub threshold: f64,
}

impl SimpleThreshold {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl ThresholdingStrategy for SimpleThreshold {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn apply(&self, layer: &Raster<f64>) -> Result<Raster<u8>> {
        if self.threshold.is_nan() {
            return Err(Error::InvalidParameter {
                name: "threshold",
                value: "NaN".into(),
                reason: "threshold must be a number".into(),
            });
        }
        let t = self.threshold;
        binarize(layer, |v| v >= t)
    }
}

/// Thresholding method chosen by configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Thresholding {
    Otsu(OtsuThreshold),
    Simple(SimpleThreshold),
}

impl ThresholdingStrategy for Thresholding {
    fn name(&self) -> &'static str {
        match self {
            Thresholding::Otsu(s) => s.name(),
            Thresholding::Simple(s) => s.name(),
        }
    }

    fn apply(&self, layer: &Raster<f64>) -> Result<Raster<u8>> {
        match self {
            Thresholding::Otsu(s) => s.apply(layer),
            Thresholding::Simple(s) => s.apply(layer),
        }
    }
}

fn binarize<F>(layer: &Raster<f64>, disturbed: F) -> Result<Raster<u8>>
where
    F: Fn(f64) -> bool + Sync + Send,
{
    let (rows, cols) = layer.shape();
    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let v = unsafe { layer.get_unchecked(row, col) };
                if !layer.is_nodata(v) && disturbed(v) {
                    *out = 1;
                }
            }
            row_data
        })
        .collect();

    let mut mask = layer.with_same_meta::<u8>(rows, cols);
    *mask.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(mask)
}
