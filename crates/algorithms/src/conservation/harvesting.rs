//! Water harvesting, recharge and contour-trench planning.

use std::fmt;

use hydromorph_core::raster::Raster;
use hydromorph_core::Result;

use crate::cellwise::{map_cells, value_range};
use crate::config::ConservationParams;
use crate::statistics::{mean, percentile};

use super::check_dam::CheckDamSite;

/// Groundwater recharge potential in [0, 1].
///
/// `0.5·TWI' + 0.3·FA' + 0.2·(1 - slope')` on cells flatter than
/// `recharge_max_slope_deg`, 0 elsewhere; primes denote normalization over
/// the study area (TWI min-max, FA as `ln(1 + FA)` over its maximum, slope
/// over its maximum).
pub fn percolation_potential(
    dem: &Raster<f64>,
    twi: &Raster<f64>,
    flow_acc: &Raster<f64>,
    slope_deg: &Raster<f64>,
    params: &ConservationParams,
) -> Result<Raster<f64>> {
    let (twi_min, twi_max) = value_range(twi).unwrap_or((0.0, 0.0));
    let fa_max = value_range(flow_acc).map_or(0.0, |(_, hi)| hi.max(0.0).ln_1p());
    let slope_max = value_range(slope_deg).map_or(0.0, |(_, hi)| hi.max(0.0));
    let max_slope = params.recharge_max_slope_deg;

    map_cells([dem, twi, flow_acc, slope_deg], |[z, w, fa, s]| {
        if z.is_nan() {
            return f64::NAN;
        }
        let w = if w.is_nan() { twi_min } else { w };
        let twi_n = (w - twi_min) / (twi_max - twi_min + 1e-9);
        let fa_n = (if fa.is_nan() { 0.0 } else { fa.max(0.0) }).ln_1p() / (fa_max + 1e-9);
        let s = if s.is_nan() { 0.0 } else { s };
        let flatness = 1.0 - s / (slope_max + 1e-9);
        if s >= max_slope {
            return 0.0;
        }
        (0.5 * twi_n + 0.3 * fa_n + 0.2 * flatness).clamp(0.0, 1.0)
    })
}

/// Contour-trench suitability in [0, 1].
///
/// 0.4 for slopes in the trench range, up to 0.4 for soil loss relative to
/// `loss_p95`, and 0.2 off the channel network.
pub fn contour_trench_suitability(
    dem: &Raster<f64>,
    slope_deg: &Raster<f64>,
    flow_acc: &Raster<f64>,
    soil_loss: &Raster<f64>,
    loss_p95: f64,
    params: &ConservationParams,
) -> Result<Raster<f64>> {
    let (lo, hi) = params.trench_slope_range;
    let channel = params.trench_max_accumulation;
    map_cells([dem, slope_deg, flow_acc, soil_loss], |[z, s, fa, a]| {
        if z.is_nan() {
            return f64::NAN;
        }
        let s = if s.is_nan() { 0.0 } else { s };
        let slope_ok = if s >= lo && s < hi { 1.0 } else { 0.0 };
        let loss = (a / (loss_p95 + 1e-9)).clamp(0.0, 1.0);
        let loss = if loss.is_nan() { 0.0 } else { loss };
        let off_channel = if fa.is_nan() || fa < channel { 1.0 } else { 0.0 };
        (0.4 * slope_ok + 0.4 * loss + 0.2 * off_channel).clamp(0.0, 1.0)
    })
}

/// Harvestable share of the design runoff volume (Mm³).
pub fn water_harvesting_potential(runoff_mm: f64, area_m2: f64, fraction: f64) -> f64 {
    runoff_mm * 1e-3 * area_m2 * fraction / 1e6
}

/// Dams that fit on the candidate reaches, one per `spacing_m` of channel.
pub fn check_dam_count<'a>(sites: impl IntoIterator<Item = &'a CheckDamSite>, spacing_m: f64) -> usize {
    let length: f64 = sites
        .into_iter()
        .filter(|s| s.class.is_candidate())
        .map(|s| s.length_m)
        .sum();
    if spacing_m > 0.0 {
        (length / spacing_m).floor() as usize
    } else {
        0
    }
}

/// Soil and water conservation priority from mean soil loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwcPriority {
    High,
    Moderate,
    Low,
    Unknown,
}

impl SwcPriority {
    /// `breaks` are the (High, Moderate) lower bounds, exclusive.
    pub fn from_loss(mean_loss: Option<f64>, breaks: (f64, f64)) -> Self {
        match mean_loss {
            None => Self::Unknown,
            Some(a) if a > breaks.0 => Self::High,
            Some(a) if a > breaks.1 => Self::Moderate,
            Some(_) => Self::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SwcPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Conservation potential of one subbasin.
#[derive(Debug, Clone, PartialEq)]
pub struct ConservationSummary {
    pub percolation_mean: Option<f64>,
    pub percolation_p75: Option<f64>,
    pub trench_mean: Option<f64>,
    /// Share of cells with trench suitability above 0.5 (%)
    pub trench_suitable_pct: Option<f64>,
    /// Design-storm harvesting potential (Mm³)
    pub harvest_mm3: Option<f64>,
    pub check_dams: usize,
    pub cn_mean: Option<f64>,
    pub priority: SwcPriority,
}

/// Summarize the conservation rasters over one subbasin's cells.
#[allow(clippy::too_many_arguments)]
pub fn conservation_summary<'a>(
    percolation: &[f64],
    trench: &[f64],
    curve_numbers: &[f64],
    design_runoff_mm: Option<f64>,
    area_m2: f64,
    mean_loss: Option<f64>,
    sites: impl IntoIterator<Item = &'a CheckDamSite>,
    params: &ConservationParams,
) -> ConservationSummary {
    let suitable = (!trench.is_empty())
        .then(|| trench.iter().filter(|&&v| v > 0.5).count() as f64 / trench.len() as f64 * 100.0);
    ConservationSummary {
        percolation_mean: mean(percolation),
        percolation_p75: percentile(percolation, 75.0),
        trench_mean: mean(trench),
        trench_suitable_pct: suitable,
        harvest_mm3: design_runoff_mm.map(|q| water_harvesting_potential(q, area_m2, params.harvest_fraction)),
        check_dams: check_dam_count(sites, params.dam_spacing_m),
        cn_mean: mean(curve_numbers),
        priority: SwcPriority::from_loss(mean_loss, params.priority_loss_breaks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conservation::{FactorScores, SuitabilityClass};
    use approx::assert_relative_eq;

    fn row(values: &[f64]) -> Raster<f64> {
        Raster::from_vec(values.to_vec(), 1, values.len()).unwrap()
    }

    #[test]
    fn test_percolation_prefers_wet_flat_cells() {
        let dem = row(&[10.0, 10.0, 10.0, f64::NAN]);
        let twi = row(&[12.0, 4.0, f64::NAN, 8.0]);
        let fa = row(&[1000.0, 1.0, 10.0, 5.0]);
        let slope = row(&[1.0, 2.0, 10.0, 1.0]);
        let p = percolation_potential(&dem, &twi, &fa, &slope, &ConservationParams::default()).unwrap();
        let wet = p.get(0, 0).unwrap();
        let dry = p.get(0, 1).unwrap();
        assert!(wet > dry);
        assert!(wet <= 1.0 && dry >= 0.0);
        assert_eq!(p.get(0, 2).unwrap(), 0.0);
        assert!(p.get(0, 3).unwrap().is_nan());
        // TWI 12 is the max, FA 1000 the max, slope 1 of 10
        assert_relative_eq!(wet, 0.5 + 0.3 + 0.2 * 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_contour_trench_components() {
        let dem = row(&[1.0, 1.0, 1.0, 1.0]);
        let slope = row(&[10.0, 1.0, 35.0, 10.0]);
        let fa = row(&[10.0, 10.0, 10.0, 600.0]);
        let loss = row(&[40.0, f64::NAN, 10.0, 10.0]);
        let ct = contour_trench_suitability(&dem, &slope, &fa, &loss, 20.0, &ConservationParams::default()).unwrap();
        assert_relative_eq!(ct.get(0, 0).unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(ct.get(0, 1).unwrap(), 0.2, epsilon = 1e-9);
        assert_relative_eq!(ct.get(0, 2).unwrap(), 0.4, epsilon = 1e-6);
        assert_relative_eq!(ct.get(0, 3).unwrap(), 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_harvest_volume() {
        // 100 mm over 10 km², 40 %
        assert_relative_eq!(water_harvesting_potential(100.0, 1e7, 0.4), 0.4);
    }

    fn site(class: SuitabilityClass, length_m: f64) -> CheckDamSite {
        CheckDamSite {
            segment_id: 0,
            order: 1,
            basin: Some(0),
            length_m,
            upstream_area_km2: None,
            slope_deg: None,
            slope_pct: 0.0,
            upstream_loss: None,
            scores: FactorScores { order: 0.0, area: 0.0, slope: 0.0, erosion: 0.0, valley: 0.0 },
            cdsi: 0.0,
            class,
        }
    }

    #[test]
    fn test_dam_count_uses_candidate_reaches() {
        let sites = vec![
            site(SuitabilityClass::VerySuitable, 1000.0),
            site(SuitabilityClass::Suitable, 500.0),
            site(SuitabilityClass::PoorlySuitable, 5000.0),
        ];
        assert_eq!(check_dam_count(&sites, 700.0), 2);
        assert_eq!(check_dam_count(&sites[2..], 700.0), 0);
    }

    #[test]
    fn test_priority() {
        let b = ConservationParams::default().priority_loss_breaks;
        assert_eq!(SwcPriority::from_loss(Some(20.0), b), SwcPriority::High);
        assert_eq!(SwcPriority::from_loss(Some(15.0), b), SwcPriority::Moderate);
        assert_eq!(SwcPriority::from_loss(Some(5.0), b), SwcPriority::Low);
        assert_eq!(SwcPriority::from_loss(None, b).to_string(), "Unknown");
    }

    #[test]
    fn test_summary() {
        let params = ConservationParams::default();
        let sites = vec![site(SuitabilityClass::Suitable, 1400.0)];
        let s = conservation_summary(
            &[0.2, 0.4, 0.6, 0.8],
            &[0.3, 0.7],
            &[75.0, 85.0],
            Some(100.0),
            1e7,
            Some(8.0),
            &sites,
            &params,
        );
        assert_relative_eq!(s.percolation_mean.unwrap(), 0.5);
        assert_relative_eq!(s.percolation_p75.unwrap(), 0.65, epsilon = 1e-12);
        assert_relative_eq!(s.trench_suitable_pct.unwrap(), 50.0);
        assert_relative_eq!(s.harvest_mm3.unwrap(), 0.4);
        assert_eq!(s.check_dams, 2);
        assert_eq!(s.cn_mean, Some(80.0));
        assert_eq!(s.priority, SwcPriority::Moderate);
    }
}
