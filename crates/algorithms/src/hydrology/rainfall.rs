//! Gumbel EV-I rainfall frequency analysis.
//!
//! The annual series is fitted by the method of moments:
//! `α = σ·√6/π`, `u = μ - 0.5772·α`, and the T-year quantile is `u + α·y_T`
//! with the reduced variate `y_T = -ln(-ln(1 - 1/T))`. The 24-hour design
//! depth is that quantile times a daily fraction.

use std::f64::consts::PI;

use crate::config::RainfallParams;

/// Euler-Mascheroni constant as used for the Gumbel location
const EULER_GAMMA: f64 = 0.5772;

/// Method-of-moments Gumbel fit of annual rainfall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GumbelFit {
    /// Scale α
    pub alpha: f64,
    /// Location (mode) u
    pub location: f64,
}

impl GumbelFit {
    pub fn from_moments(mean: f64, std_dev: f64) -> Self {
        let alpha = std_dev * 6f64.sqrt() / PI;
        Self {
            alpha,
            location: mean - EULER_GAMMA * alpha,
        }
    }

    /// Reduced variate for a return period in years (> 1).
    pub fn reduced_variate(return_period: f64) -> f64 {
        -(-(1.0 - 1.0 / return_period).ln()).ln()
    }

    /// Annual rainfall with the given return period.
    pub fn quantile(&self, return_period: f64) -> f64 {
        self.location + self.alpha * Self::reduced_variate(return_period)
    }
}

/// Design storm for one return period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignRainfall {
    pub return_period: f64,
    pub reduced_variate: f64,
    pub annual_mm: f64,
    /// 24-hour maximum (mm)
    pub daily_mm: f64,
}

impl DesignRainfall {
    /// `floor` is the lowest admissible 24-hour depth, if any.
    pub fn new(fit: &GumbelFit, return_period: f64, daily_fraction: f64, floor: Option<f64>) -> Self {
        let annual = fit.quantile(return_period);
        let daily = annual * daily_fraction;
        Self {
            return_period,
            reduced_variate: GumbelFit::reduced_variate(return_period),
            annual_mm: annual,
            daily_mm: floor.map_or(daily, |f| daily.max(f)),
        }
    }
}

/// Design storms for every configured return period, floored at
/// `min_daily_mm`.
pub fn design_rainfall(params: &RainfallParams) -> Vec<DesignRainfall> {
    let fit = GumbelFit::from_moments(params.annual_mean_mm, params.annual_std_mm);
    params
        .return_periods
        .iter()
        .map(|&t| DesignRainfall::new(&fit, t, params.daily_fraction, Some(params.min_daily_mm)))
        .collect()
}

/// 24-hour depth of the storm whose return period is closest to `t`.
pub fn daily_for(storms: &[DesignRainfall], t: f64) -> Option<f64> {
    storms
        .iter()
        .min_by(|a, b| {
            (a.return_period - t)
                .abs()
                .partial_cmp(&(b.return_period - t).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|s| s.daily_mm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gumbel_fit() {
        let fit = GumbelFit::from_moments(750.0, 187.0);
        assert_relative_eq!(fit.alpha, 145.8033, epsilon = 1e-3);
        assert_relative_eq!(fit.location, 665.8423, epsilon = 1e-3);
    }

    #[test]
    fn test_reduced_variate() {
        assert_relative_eq!(GumbelFit::reduced_variate(2.0), 0.366513, epsilon = 1e-6);
        assert_relative_eq!(GumbelFit::reduced_variate(100.0), 4.600149, epsilon = 1e-6);
    }

    #[test]
    fn test_default_design_storms() {
        let storms = design_rainfall(&RainfallParams::default());
        assert_eq!(storms.len(), 6);
        // 2-yr: (665.84 + 145.80 * 0.3665) * 0.22
        assert_relative_eq!(storms[0].daily_mm, 158.24, epsilon = 0.05);
        assert_relative_eq!(storms[3].daily_mm, 249.1, epsilon = 0.1);
        assert!(storms.windows(2).all(|w| w[1].daily_mm > w[0].daily_mm));
    }

    #[test]
    fn test_floor_applies() {
        let params = RainfallParams {
            annual_mean_mm: 20.0,
            annual_std_mm: 1.0,
            ..RainfallParams::default()
        };
        let storms = design_rainfall(&params);
        assert!(storms.iter().all(|s| s.daily_mm == 10.0));

        let fit = GumbelFit::from_moments(20.0, 1.0);
        let unfloored = DesignRainfall::new(&fit, 2.0, 0.22, None);
        assert!(unfloored.daily_mm < 10.0);
    }

    #[test]
    fn test_daily_for_nearest() {
        let storms = design_rainfall(&RainfallParams::default());
        assert_eq!(daily_for(&storms, 25.0), Some(storms[3].daily_mm));
        assert_eq!(daily_for(&[], 25.0), None);
    }
}
