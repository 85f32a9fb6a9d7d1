//! Normalized-difference spectral indices

use crate::maybe_rayon::*;
use burnscar_core::raster::Raster;
use burnscar_core::{Error, Result};
use ndarray::Array2;

/// Normalized difference of two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Cells where either band is no-data, or both bands sum to zero, are NaN.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };

                if band_a.is_nodata(a) || band_b.is_nodata(b) {
                    continue;
                }

                let sum = a + b;
                if sum == 0.0 {
                    continue;
                }

                *out = (a - b) / sum;
            }
            row_data
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

/// Normalized Burn Ratio
///
/// `NBR = (NIR - SWIR) / (NIR + SWIR)`
///
/// Healthy vegetation scores high; freshly burned ground is near zero or
/// negative. For Sentinel-2 the bands are B8A (narrow NIR) and B12 (SWIR2).
pub fn nbr(nir: &Raster<f64>, swir: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, swir)
}

pub(crate) fn check_dimensions(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    let (ar, ac) = a.shape();
    let (br, bc) = b.shape();
    if ar != br || ac != bc {
        return Err(Error::SizeMismatch {
            er: ar,
            ec: ac,
            ar: br,
            ac: bc,
        });
    }
    Ok(())
}

pub(crate) fn build_output(
    template: &Raster<f64>,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
) -> Result<Raster<f64>> {
    let mut output = template.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use burnscar_core::GeoTransform;

    fn band(values: Vec<f64>) -> Raster<f64> {
        let mut r = Raster::from_vec(values, 2, 2).unwrap();
        r.set_transform(GeoTransform::new(0.0, 2.0, 1.0, -1.0));
        r
    }

    #[test]
    fn test_nbr_values() {
        let nir = band(vec![0.4, 0.3, 0.0, f64::NAN]);
        let swir = band(vec![0.1, 0.3, 0.0, 0.2]);
        let result = nbr(&nir, &swir).unwrap();

        assert_relative_eq!(result.get(0, 0).unwrap(), 0.6, epsilon = 1e-12);
        assert_relative_eq!(result.get(0, 1).unwrap(), 0.0);
        assert!(result.get(1, 0).unwrap().is_nan(), "zero sum");
        assert!(result.get(1, 1).unwrap().is_nan(), "nan input");
    }

    #[test]
    fn test_nbr_bounded_for_nonnegative_reflectance() {
        let nir = band(vec![0.0, 1.0, 0.25, 0.9]);
        let swir = band(vec![1.0, 0.0, 0.75, 0.05]);
        let result = nbr(&nir, &swir).unwrap();
        for &v in result.data().iter() {
            assert!(v.is_finite() && (-1.0..=1.0).contains(&v), "{v}");
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let a: Raster<f64> = Raster::new(2, 2);
        let b: Raster<f64> = Raster::new(3, 2);
        assert!(normalized_difference(&a, &b).is_err());
    }
}
