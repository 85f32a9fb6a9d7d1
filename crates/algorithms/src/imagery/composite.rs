//! Temporal compositing of co-registered rasters

use super::indices::build_output;
use crate::maybe_rayon::*;
use burnscar_core::raster::Raster;
use burnscar_core::{Error, Result};

/// Per-cell median over a time series of rasters on one grid.
///
/// Only finite values take part; an even count averages the two middle
/// values. Cells with no finite observation are NaN.
pub fn median_composite(series: &[Raster<f64>]) -> Result<Raster<f64>> {
    let first = series.first().ok_or_else(|| Error::InvalidParameter {
        name: "series",
        value: "[]".into(),
        reason: "at least one raster is required".into(),
    })?;
    for other in &series[1..] {
        first.ensure_same_grid(other)?;
    }

    let (rows, cols) = first.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut values = Vec::with_capacity(series.len());
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                values.clear();
                values.extend(
                    series
                        .iter()
                        .map(|r| unsafe { r.get_unchecked(row, col) })
                        .filter(|v| v.is_finite()),
                );
                *out = median(&mut values);
            }
            row_data
        })
        .collect();

    build_output(first, rows, cols, data)
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
