//! Bankfull channel hydraulics and stability
//!
//! Bankfull flow is the rational-method peak of the `bankfull_return_period`
//! storm. Width, depth and velocity follow Leopold–Maddock power laws of that
//! discharge; bed shear stress and specific stream power are compared with
//! the Shields critical shear and a critical stream power to place the
//! channel in one of four stability bands.

use std::collections::BTreeMap;
use std::fmt;

use hydromorph_core::raster::Raster;
use hydromorph_core::StreamSegment;

use crate::config::HydraulicParams;
use crate::hydrology::{rainfall_intensity, rational_peak, runoff_coefficient};
use crate::statistics::mean;
use crate::vector::{densify, mean_at};

/// Slope assumed for an order none of whose segments could be sampled (°).
const DEFAULT_ORDER_SLOPE_DEG: f64 = 5.0;

/// Rational-method bankfull discharge (m³/s); zero when `tc_hours` is not a
/// positive duration.
pub fn bankfull_discharge(p24_mm: f64, cn: f64, tc_hours: f64, area_km2: f64, ia_ratio: f64) -> f64 {
    let c = runoff_coefficient(p24_mm, cn, ia_ratio);
    rainfall_intensity(p24_mm, tc_hours).map_or(0.0, |i| rational_peak(c, i, area_km2))
}

/// Bankfull cross-section for a discharge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydraulicGeometry {
    pub discharge_m3s: f64,
    pub width_m: f64,
    pub depth_m: f64,
    pub velocity_ms: f64,
    pub width_depth: f64,
    pub flow_area_m2: f64,
    pub hydraulic_radius_m: f64,
}

pub fn hydraulic_geometry(discharge_m3s: f64, params: &HydraulicParams) -> HydraulicGeometry {
    let width = params.width.eval(discharge_m3s);
    let depth = params.depth.eval(discharge_m3s);
    let area = width * depth * params.section_factor;
    HydraulicGeometry {
        discharge_m3s,
        width_m: width,
        depth_m: depth,
        velocity_ms: params.velocity.eval(discharge_m3s),
        width_depth: width / depth.max(0.01),
        flow_area_m2: area,
        hydraulic_radius_m: area / (width + 2.0 * depth),
    }
}

/// Manning's n, rougher on gentle beds and `manning_base` from S = 0.01 up.
pub fn manning_n(slope: f64, params: &HydraulicParams) -> f64 {
    params.manning_base + params.manning_gentle_increment * (1.0 - (slope / 0.01).min(1.0))
}

/// `Q = A·R^(2/3)·S^(1/2)/n`
pub fn manning_discharge(flow_area_m2: f64, hydraulic_radius_m: f64, slope: f64, n: f64) -> f64 {
    flow_area_m2 * hydraulic_radius_m.powf(2.0 / 3.0) * slope.sqrt() / n
}

/// Shields critical shear stress `θc·(ρs − ρ)·g·D50` (Pa).
pub fn critical_shear(params: &HydraulicParams) -> f64 {
    params.shields * (params.sediment_density - params.water_density) * params.gravity * params.d50_m
}

/// Channel stability band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChannelStability {
    Stable,
    MarginallyStable,
    Unstable,
    HighlyUnstable,
}

impl ChannelStability {
    /// Score W/D, excess shear (Pa) and excess specific power (W/m²) from 0
    /// to 3 each and band the total.
    pub fn classify(width_depth: f64, excess_shear: f64, excess_power: f64) -> Self {
        let band = |v: f64, breaks: [f64; 3]| breaks.iter().filter(|&&b| v < b).count() as u8;
        let score = band(width_depth, [12.0, 20.0, 30.0])
            + band(excess_shear, [0.0, 5.0, 15.0])
            + band(excess_power, [0.0, 20.0, 50.0]);
        match score {
            7.. => Self::Stable,
            5..=6 => Self::MarginallyStable,
            3..=4 => Self::Unstable,
            _ => Self::HighlyUnstable,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Stable => "Stable",
            Self::MarginallyStable => "Marginally Stable",
            Self::Unstable => "Unstable",
            Self::HighlyUnstable => "Highly Unstable",
        }
    }
}

impl fmt::Display for ChannelStability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bankfull hydraulics of one subbasin's main channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelHydraulics {
    pub geometry: HydraulicGeometry,
    /// Channel slope from basin relief over basin length
    pub slope: f64,
    pub manning_n: f64,
    pub manning_discharge_m3s: f64,
    pub shear_stress_pa: f64,
    pub critical_shear_pa: f64,
    pub excess_shear_pa: f64,
    /// Total stream power Ω (W/m)
    pub stream_power_w_m: f64,
    /// Specific stream power ω (W/m²)
    pub specific_power_w_m2: f64,
    pub excess_power_w_m2: f64,
    /// `(excess ω / ω_c)²`, 0 below the threshold
    pub transport_capacity: f64,
    pub stability: ChannelStability,
}

/// Hydraulics at bankfull discharge on a channel of slope `relief / length`.
///
/// `None` without flow or without a positive slope.
pub fn channel_hydraulics(
    discharge_m3s: f64,
    relief_m: f64,
    length_km: f64,
    params: &HydraulicParams,
) -> Option<ChannelHydraulics> {
    let slope = crate::statistics::ratio(relief_m, length_km * 1000.0).filter(|s| *s > 0.0)?;
    if !(discharge_m3s > 0.0) {
        return None;
    }
    let g = hydraulic_geometry(discharge_m3s, params);
    let n = manning_n(slope, params);
    let rho_g = params.water_density * params.gravity;

    let shear = rho_g * g.hydraulic_radius_m * slope;
    let tau_c = critical_shear(params);
    let power = rho_g * discharge_m3s * slope;
    let specific = power / g.width_m;
    let excess_power = specific - params.critical_stream_power;
    let transport = if excess_power > 0.0 {
        (excess_power / params.critical_stream_power).powi(2)
    } else {
        0.0
    };

    Some(ChannelHydraulics {
        geometry: g,
        slope,
        manning_n: n,
        manning_discharge_m3s: manning_discharge(g.flow_area_m2, g.hydraulic_radius_m, slope, n),
        shear_stress_pa: shear,
        critical_shear_pa: tau_c,
        excess_shear_pa: shear - tau_c,
        stream_power_w_m: power,
        specific_power_w_m2: specific,
        excess_power_w_m2: excess_power,
        transport_capacity: transport,
        stability: ChannelStability::classify(g.width_depth, shear - tau_c, excess_power),
    })
}

/// Network-wide stream power of one Strahler order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderPower {
    pub order: u32,
    pub segments: usize,
    pub total_length_km: f64,
    pub mean_length_m: f64,
    pub mean_slope_deg: f64,
    pub slope: f64,
    /// Discharge proxy (m³/s)
    pub discharge_m3s: f64,
    pub specific_power_w_m2: f64,
}

/// Stream power per order with a discharge proxy that grows with order.
///
/// `design_runoff_mm` is the design-storm runoff depth averaged over the
/// subbasins.
pub fn order_stream_power(
    segments: &[StreamSegment],
    slope_deg: &Raster<f64>,
    design_runoff_mm: f64,
    params: &HydraulicParams,
) -> Vec<OrderPower> {
    let mut by_order: BTreeMap<u32, Vec<&StreamSegment>> = BTreeMap::new();
    for s in segments {
        by_order.entry(s.order).or_default().push(s);
    }
    let step = slope_deg.cell_size();

    by_order
        .into_iter()
        .map(|(order, segs)| {
            let lengths: Vec<f64> = segs.iter().map(|s| s.length()).collect();
            let slopes: Vec<f64> = segs
                .iter()
                .filter_map(|s| mean_at(slope_deg, &densify(&s.geometry, step)))
                .collect();
            let mean_slope_deg = mean(&slopes).unwrap_or(DEFAULT_ORDER_SLOPE_DEG);
            let slope = mean_slope_deg.max(0.1).to_radians().tan();
            let q = params.order_discharge.eval(order as f64) * design_runoff_mm * 1e-3;
            let width = params.width.eval(q).max(0.5);

            OrderPower {
                order,
                segments: segs.len(),
                total_length_km: lengths.iter().sum::<f64>() / 1000.0,
                mean_length_m: mean(&lengths).unwrap_or(0.0),
                mean_slope_deg,
                slope,
                discharge_m3s: q,
                specific_power_w_m2: params.water_density * params.gravity * q * slope / width,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::line_string;
    use hydromorph_core::GeoTransform;

    #[test]
    fn test_geometry() {
        let g = hydraulic_geometry(100.0, &HydraulicParams::default());
        assert_relative_eq!(g.width_m, 32.0, epsilon = 1e-9);
        assert_relative_eq!(g.depth_m, 0.28 * 100f64.powf(0.4), epsilon = 1e-12);
        assert_relative_eq!(g.flow_area_m2, 32.0 * g.depth_m * 0.8, epsilon = 1e-9);
        assert_relative_eq!(g.hydraulic_radius_m, g.flow_area_m2 / (32.0 + 2.0 * g.depth_m), epsilon = 1e-12);
    }

    #[test]
    fn test_manning_n_taper() {
        let p = HydraulicParams::default();
        assert_relative_eq!(manning_n(0.0, &p), 0.040, epsilon = 1e-12);
        assert_relative_eq!(manning_n(0.005, &p), 0.039, epsilon = 1e-12);
        assert_relative_eq!(manning_n(0.05, &p), 0.038, epsilon = 1e-12);
    }

    #[test]
    fn test_critical_shear() {
        assert_relative_eq!(critical_shear(&HydraulicParams::default()), 11.411, epsilon = 1e-3);
    }

    #[test]
    fn test_large_steep_channel_is_unstable() {
        let p = HydraulicParams::default();
        let h = channel_hydraulics(100.0, 100.0, 10.0, &p).unwrap();
        assert_relative_eq!(h.slope, 0.01);
        assert_relative_eq!(h.stream_power_w_m, 9810.0, epsilon = 1e-9);
        assert_relative_eq!(h.specific_power_w_m2, 9810.0 / 32.0, epsilon = 1e-9);
        assert!(h.transport_capacity > 0.0);
        assert_eq!(h.stability, ChannelStability::HighlyUnstable);
    }

    #[test]
    fn test_small_gentle_channel_is_stable() {
        let h = channel_hydraulics(1.0, 10.0, 10.0, &HydraulicParams::default()).unwrap();
        assert!(h.excess_shear_pa < 0.0);
        assert_eq!(h.transport_capacity, 0.0);
        assert_eq!(h.stability, ChannelStability::Stable);
        assert_eq!(h.stability.to_string(), "Stable");
    }

    #[test]
    fn test_no_flow_or_slope() {
        let p = HydraulicParams::default();
        assert!(channel_hydraulics(0.0, 100.0, 10.0, &p).is_none());
        assert!(channel_hydraulics(10.0, 0.0, 10.0, &p).is_none());
        assert!(channel_hydraulics(10.0, 100.0, 0.0, &p).is_none());
    }

    #[test]
    fn test_stability_bands() {
        assert_eq!(ChannelStability::classify(10.0, -1.0, -1.0), ChannelStability::Stable);
        assert_eq!(ChannelStability::classify(25.0, 3.0, 10.0), ChannelStability::MarginallyStable);
        assert_eq!(ChannelStability::classify(25.0, 10.0, 30.0), ChannelStability::Unstable);
        assert_eq!(ChannelStability::classify(40.0, 20.0, 60.0), ChannelStability::HighlyUnstable);
    }

    #[test]
    fn test_bankfull_discharge() {
        let q = bankfull_discharge(100.0, 80.0, 2.0, 50.0, 0.2);
        let c = runoff_coefficient(100.0, 80.0, 0.2);
        assert_relative_eq!(q, c * rainfall_intensity(100.0, 2.0).unwrap() * 50.0 / 3.6);
        assert_eq!(bankfull_discharge(5.0, 60.0, 2.0, 50.0, 0.2), 0.0);
        assert_eq!(bankfull_discharge(100.0, 80.0, 0.0, 50.0, 0.2), 0.0);
    }

    #[test]
    fn test_order_power() {
        let mut slope = Raster::filled(10, 10, 10.0);
        slope.set_transform(GeoTransform::new(0.0, 100.0, 10.0, -10.0));
        let segments = vec![
            StreamSegment { id: 1, order: 1, geometry: line_string![(x: 5.0, y: 95.0), (x: 55.0, y: 95.0)] },
            StreamSegment { id: 2, order: 1, geometry: line_string![(x: 5.0, y: 55.0), (x: 35.0, y: 55.0)] },
            StreamSegment { id: 3, order: 2, geometry: line_string![(x: 500.0, y: 500.0), (x: 600.0, y: 500.0)] },
        ];
        let p = HydraulicParams::default();
        let rows = order_stream_power(&segments, &slope, 100.0, &p);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].segments, 2);
        assert_relative_eq!(rows[0].mean_slope_deg, 10.0);
        assert_relative_eq!(rows[0].mean_length_m, 40.0);
        // order 2 lies off the grid and falls back to the default slope
        assert_relative_eq!(rows[1].mean_slope_deg, DEFAULT_ORDER_SLOPE_DEG);
        assert!(rows[1].discharge_m3s > rows[0].discharge_m3s);
    }
}
