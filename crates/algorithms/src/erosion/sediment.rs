//! Subbasin soil loss summary, sediment delivery and yield.

use crate::config::{RusleParams, SdrParams};
use crate::statistics::{mean, percentile};

const SEVERITY_NAMES: [&str; 5] = ["Slight", "Moderate", "High", "Very High", "Severe"];

/// Soil loss severity bands, `[lo, hi)` in t/ha/yr.
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityBands {
    breaks: Vec<f64>,
}

impl SeverityBands {
    pub fn new(breaks: &[f64]) -> Self {
        Self { breaks: breaks.to_vec() }
    }

    pub fn count(&self) -> usize {
        self.breaks.len() + 1
    }

    /// Band index of a soil loss value.
    pub fn classify(&self, value: f64) -> usize {
        self.breaks.iter().position(|&b| value < b).unwrap_or(self.breaks.len())
    }

    /// Label such as `"Moderate (5-15)"`.
    pub fn label(&self, band: usize) -> String {
        let name = SEVERITY_NAMES.get(band).copied().unwrap_or("Severe");
        let last = self.breaks.len();
        match band {
            0 => format!("{} (<{})", name, self.breaks.first().copied().unwrap_or(0.0)),
            b if b >= last => format!("{} (>{})", name, self.breaks.last().copied().unwrap_or(0.0)),
            b => format!("{} ({}-{})", name, self.breaks[b - 1], self.breaks[b]),
        }
    }

    pub fn labels(&self) -> Vec<String> {
        (0..self.count()).map(|b| self.label(b)).collect()
    }

    /// Percentage of `values` in each band.
    pub fn fractions(&self, values: &[f64]) -> Vec<f64> {
        let mut counts = vec![0usize; self.count()];
        for &v in values {
            counts[self.classify(v)] += 1;
        }
        let n = values.len().max(1) as f64;
        counts.into_iter().map(|c| c as f64 / n * 100.0).collect()
    }
}

/// `SDR = a·A^-b`, capped; `A` in km².
pub fn sediment_delivery_ratio(area_km2: f64, params: &SdrParams) -> f64 {
    (params.coefficient * area_km2.powf(-params.exponent)).min(params.max_ratio)
}

/// Erosion and sediment budget of one subbasin.
#[derive(Debug, Clone, PartialEq)]
pub struct SedimentBudget {
    /// t/ha/yr
    pub loss_mean: f64,
    pub loss_p95: f64,
    pub area_ha: f64,
    /// Gross erosion (t/yr)
    pub gross_t_yr: f64,
    pub sdr: f64,
    /// Sediment yield (t/yr)
    pub yield_t_yr: f64,
    /// Deposited volume (Mm³/yr)
    pub yield_mm3_yr: f64,
    /// Severity band of the mean loss
    pub loss_class: String,
    /// Share of cells per severity band (%)
    pub class_pct: Vec<f64>,
}

/// `None` when the basin has no valid soil loss cell.
pub fn sediment_budget(
    soil_loss: &[f64],
    area_km2: f64,
    rusle: &RusleParams,
    sdr: &SdrParams,
) -> Option<SedimentBudget> {
    let loss_mean = mean(soil_loss)?;
    let loss_p95 = percentile(soil_loss, 95.0)?;
    let bands = SeverityBands::new(&rusle.severity_breaks);

    let area_ha = area_km2 * 100.0;
    let gross = loss_mean * area_ha;
    let ratio = sediment_delivery_ratio(area_km2, sdr);
    let yield_t = gross * ratio;

    Some(SedimentBudget {
        loss_mean,
        loss_p95,
        area_ha,
        gross_t_yr: gross,
        sdr: ratio,
        yield_t_yr: yield_t,
        yield_mm3_yr: yield_t / (sdr.bulk_density * 1e6),
        loss_class: bands.label(bands.classify(loss_mean)),
        class_pct: bands.fractions(soil_loss),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_sdr() {
        let sdr = sediment_delivery_ratio(116.99, &SdrParams::default());
        assert_relative_eq!(sdr, 0.232, epsilon = 5e-4);
    }

    #[test]
    fn test_sdr_decreasing_and_capped() {
        let p = SdrParams::default();
        let mut prev = f64::INFINITY;
        for a in [0.5, 1.0, 10.0, 100.0, 1000.0] {
            let s = sediment_delivery_ratio(a, &p);
            assert!(s < prev);
            prev = s;
        }
        assert_eq!(sediment_delivery_ratio(1e-6, &p), 0.8);
        assert_eq!(sediment_delivery_ratio(0.0, &p), 0.8);
    }

    #[test]
    fn test_band_labels() {
        let bands = SeverityBands::new(&RusleParams::default().severity_breaks);
        assert_eq!(
            bands.labels(),
            vec!["Slight (<5)", "Moderate (5-15)", "High (15-30)", "Very High (30-60)", "Severe (>60)"]
        );
        assert_eq!(bands.classify(4.99), 0);
        assert_eq!(bands.classify(5.0), 1);
        assert_eq!(bands.classify(60.0), 4);
    }

    #[test]
    fn test_budget() {
        let loss = vec![1.0, 2.0, 8.0, 20.0, 40.0, 100.0, 3.0, 4.0];
        let b = sediment_budget(&loss, 10.0, &RusleParams::default(), &SdrParams::default()).unwrap();
        assert_relative_eq!(b.loss_mean, 22.25);
        assert_relative_eq!(b.area_ha, 1000.0);
        assert_relative_eq!(b.gross_t_yr, 22250.0);
        assert_relative_eq!(b.yield_t_yr, b.gross_t_yr * b.sdr);
        assert_relative_eq!(b.yield_mm3_yr, b.yield_t_yr / 1.3e6);
        assert_eq!(b.loss_class, "High (15-30)");
        assert_relative_eq!(b.class_pct.iter().sum::<f64>(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(b.class_pct[0], 50.0);
    }

    #[test]
    fn test_empty_budget() {
        assert!(sediment_budget(&[], 10.0, &RusleParams::default(), &SdrParams::default()).is_none());
    }
}
