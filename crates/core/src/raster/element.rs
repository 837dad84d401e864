//! Cell value types accepted by [`Raster`](super::Raster)

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Numeric types that can be stored in a raster cell.
///
/// Elevation, slope and every derived index are `f64`; flow direction codes
/// and zone labels use integer types.
pub trait RasterElement:
    Copy + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// No-data value assumed when a file carries none
    fn default_nodata() -> Self;

    /// Whether `self` should be skipped as no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Lossy conversion to `f64`
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! integer_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }
        }
    )*};
}

macro_rules! float_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if !self.is_finite() {
                    return true;
                }
                nodata.is_some_and(|nd| (self - nd).abs() <= <$t>::EPSILON * nd.abs().max(1.0))
            }
        }
    )*};
}

integer_element!(u8, u16, u32, i16, i32, i64);
float_element!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!(f64::INFINITY.is_nodata(None));
        assert!((-9999.0_f64).is_nodata(Some(-9999.0)));
        assert!(!12.5_f64.is_nodata(Some(-9999.0)));
    }

    #[test]
    fn test_integer_nodata() {
        assert!(0_u8.is_nodata(Some(0)));
        assert!(!3_i32.is_nodata(None));
        assert_eq!(i32::default_nodata(), i32::MIN);
    }
}
