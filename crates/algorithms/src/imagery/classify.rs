//! Burn severity classification
//!
//! Maps a continuous severity layer onto discrete classes using sorted
//! upper-bound breaks.

use super::indices::build_output;
use crate::maybe_rayon::*;
use burnscar_core::raster::Raster;
use burnscar_core::{Error, Result};

/// One class: cells strictly below `upper` (and not below any smaller
/// break) receive `value`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityBreak {
    pub upper: f64,
    pub value: f64,
}

impl SeverityBreak {
    pub fn new(upper: f64, value: f64) -> Self {
        Self { upper, value }
    }
}

/// Classify a severity layer.
///
/// Breaks are sorted by `upper`; each cell takes the value of the first
/// break it lies below. NaN cells, and cells at or above every break, stay
/// NaN.
///
/// ```ignore
/// let classes = classify_severity(&stack.dnbr, &[
///     SeverityBreak::new(0.1, 1.0),   // unburned
///     SeverityBreak::new(0.27, 2.0),  // low
///     SeverityBreak::new(0.66, 3.0),  // moderate
///     SeverityBreak::new(f64::INFINITY, 4.0), // high
/// ])?;
/// ```
pub fn classify_severity(layer: &Raster<f64>, breaks: &[SeverityBreak]) -> Result<Raster<f64>> {
    if breaks.iter().any(|b| b.upper.is_nan()) {
        return Err(Error::InvalidParameter {
            name: "breaks",
            value: format!("{:?}", breaks),
            reason: "break values must not be NaN".into(),
        });
    }

    let mut sorted = breaks.to_vec();
    sorted.sort_by(|a, b| a.upper.total_cmp(&b.upper));

    let (rows, cols) = layer.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let v = unsafe { layer.get_unchecked(row, col) };
                if layer.is_nodata(v) {
                    continue;
                }
                if let Some(b) = sorted.iter().find(|b| v < b.upper) {
                    *out = b.value;
                }
            }
            row_data
        })
        .collect();

    build_output(layer, rows, cols, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_first_break_wins() {
        let layer = Raster::from_vec(vec![-0.5, 0.05, 0.1, 0.5, 0.9, f64::NAN], 2, 3).unwrap();
        // deliberately unsorted
        let breaks = [
            SeverityBreak::new(0.66, 3.0),
            SeverityBreak::new(0.1, 1.0),
            SeverityBreak::new(0.27, 2.0),
        ];
        let out = classify_severity(&layer, &breaks).unwrap();

        assert_eq!(out.get(0, 0).unwrap(), 1.0);
        assert_eq!(out.get(0, 1).unwrap(), 1.0);
        assert_eq!(out.get(0, 2).unwrap(), 2.0, "upper bound is exclusive");
        assert_eq!(out.get(1, 0).unwrap(), 3.0);
        assert!(out.get(1, 1).unwrap().is_nan(), "above every break");
        assert!(out.get(1, 2).unwrap().is_nan());
    }

    #[test]
    fn test_nan_break_rejected() {
        let layer: Raster<f64> = Raster::new(1, 1);
        assert!(classify_severity(&layer, &[SeverityBreak::new(f64::NAN, 1.0)]).is_err());
    }
}
