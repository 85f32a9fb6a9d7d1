//! Cell value types accepted by [`Raster`](super::Raster)

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Numeric types that can be stored in a raster cell.
///
/// Floating point cells use NaN as their canonical no-data marker; integer
/// cells only have no-data when an explicit sentinel is configured. Binary
/// masks are stored as `u8` with values 0 and 1.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Value written to cells that hold no data
    fn default_nodata() -> Self;

    /// Whether this value is no-data, given the raster's optional sentinel
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Whether this type is a floating point type
    fn is_float() -> bool;

    /// Lossy conversion to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_raster_element_int {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata.is_some_and(|nd| *self == nd)
            }

            fn is_float() -> bool {
                false
            }
        }
    )*};
}

macro_rules! impl_raster_element_float {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) if !nd.is_nan() => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    _ => false,
                }
            }

            fn is_float() -> bool {
                true
            }
        }
    )*};
}

impl_raster_element_int!(u8, u16, i32);
impl_raster_element_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_always_nodata_for_floats() {
        assert!(f64::NAN.is_nodata(None));
        assert!(f32::NAN.is_nodata(Some(0.0)));
        assert!(!1.5f64.is_nodata(Some(f64::NAN)));
    }

    #[test]
    fn sentinel_nodata() {
        assert!(0u16.is_nodata(Some(0)));
        assert!(!1u16.is_nodata(Some(0)));
        assert!(!0u8.is_nodata(None));
        assert!((-9999.0f64).is_nodata(Some(-9999.0)));
    }
}
