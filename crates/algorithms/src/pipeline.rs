//! End-to-end analysis of one study area
//!
//! [`analyze`] derives the study-wide rasters once (slope, TRI, wetness and
//! power indices, CN, RUSLE, conservation suitability), assigns streams to
//! subbasins and then evaluates every calculator per subbasin in order.
//! Nothing is written to disk here; see [`crate::report`] for tables.

use geo::LineString;
use hydromorph_core::raster::Raster;
use hydromorph_core::{Error, PourPoint, Result, StreamSegment, Subbasin};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::channel::{bankfull_discharge, channel_hydraulics, order_stream_power, ChannelHydraulics, OrderPower};
use crate::config::AnalysisConfig;
use crate::conservation::{
    check_dam_suitability, contour_trench_suitability, conservation_summary, percolation_potential, CheckDamSite,
    ConservationSummary,
};
use crate::erosion::{rusle, sediment_budget, RusleFactors, SedimentBudget};
use crate::geomorphic::{burn_segments, segment_indices, tectonic_indices, ChannelSummary, SegmentIndices, TectonicIndices};
use crate::hydrology::{
    basin_outlets, basin_runoff, curve_number, daily_for, design_rainfall, peak_discharges, snap_pour_point,
    time_of_concentration, BasinRunoff, ConcentrationTime, DesignRainfall, GumbelFit, PeakDischarge, SnappedPoint,
};
use crate::morphometry::{
    areal_aspects, linear_aspects, relief_aspects, ArealAspects, CircularityClass, HypsometricStage, LinearAspects,
    ReliefAspects, ShapeClass,
};
use crate::prioritization::{erosion_criteria, prioritize, Prioritization, EROSION_CRITERIA};
use crate::statistics::{mean, percentile, rasterize_zones, std_dev, zonal_values, Summary};
use crate::terrain::{slope, spi, sti, tri, twi, FlowIndexParams, SlopeParams};
use crate::unit_hydrograph::{flood_peaks, snyder, FloodPeak, SnyderHydrograph};
use crate::vector::{area, assign_segments, orient_downstream, perimeter};

/// Rasters and layers of one study area.
///
/// All rasters must share the DEM grid. Flow direction is optional and is
/// only checked for co-registration.
#[derive(Debug, Clone)]
pub struct BasinInputs {
    pub dem: Raster<f64>,
    pub flow_acc: Raster<f64>,
    pub flow_dir: Option<Raster<f64>>,
    pub subbasins: Vec<Subbasin>,
    pub streams: Vec<StreamSegment>,
    pub pour_points: Vec<PourPoint>,
}

impl BasinInputs {
    pub fn validate(&self) -> Result<()> {
        self.dem.ensure_same_grid(&self.flow_acc, "flow accumulation")?;
        if let Some(fd) = &self.flow_dir {
            self.dem.ensure_same_grid(fd, "flow direction")?;
        }
        if self.subbasins.is_empty() {
            return Err(Error::EmptyLayer("subbasins".into()));
        }
        if self.streams.is_empty() {
            return Err(Error::EmptyLayer("streams".into()));
        }
        Ok(())
    }
}

/// Study-wide derived rasters, all on the DEM grid.
#[derive(Debug, Clone)]
pub struct DerivedRasters {
    pub slope: Raster<f64>,
    pub tri: Raster<f64>,
    pub twi: Raster<f64>,
    pub spi: Raster<f64>,
    pub sti: Raster<f64>,
    pub curve_number: Raster<f64>,
    pub rusle: RusleFactors,
    pub percolation: Raster<f64>,
    pub contour_trench: Raster<f64>,
    /// Segment SL burned along the stream lines
    pub segment_sl: Raster<f64>,
    /// Segment SPI burned along the stream lines
    pub segment_spi: Raster<f64>,
    /// Subbasin index + 1 per cell, 0 outside
    pub zones: Raster<i32>,
}

/// Every result for one subbasin.
#[derive(Debug, Clone)]
pub struct SubbasinReport {
    pub id: String,
    /// Snapped pour point inside the subbasin
    pub outlet: Option<String>,
    pub linear: LinearAspects,
    pub areal: ArealAspects,
    pub relief: Option<ReliefAspects>,
    pub shape: ShapeClass,
    pub circularity: CircularityClass,
    pub hypsometric_stage: HypsometricStage,
    pub twi: Summary,
    pub channel: ChannelSummary,
    pub tectonic: TectonicIndices,
    pub runoff: BasinRunoff,
    /// `None` for a basin without length
    pub concentration: Option<ConcentrationTime>,
    pub peaks: Vec<PeakDischarge>,
    pub rusle: FactorMeans,
    pub sediment: Option<SedimentBudget>,
    pub conservation: ConservationSummary,
    pub unit_hydrograph: Option<SnyderHydrograph>,
    pub floods: Vec<FloodPeak>,
    pub bankfull_discharge_m3s: f64,
    pub hydraulics: Option<ChannelHydraulics>,
}

impl SubbasinReport {
    pub fn area_km2(&self) -> f64 {
        self.areal.area_km2
    }
}

/// Subbasin means of the RUSLE factor rasters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FactorMeans {
    pub r: Option<f64>,
    pub k: Option<f64>,
    pub ls: Option<f64>,
    pub c: Option<f64>,
    pub p: Option<f64>,
}

/// Complete result of [`analyze`].
#[derive(Debug, Clone)]
pub struct BasinReport {
    pub gumbel: GumbelFit,
    pub design_rainfall: Vec<DesignRainfall>,
    pub subbasins: Vec<SubbasinReport>,
    pub segments: Vec<SegmentIndices>,
    pub check_dams: Vec<CheckDamSite>,
    pub order_power: Vec<OrderPower>,
    pub prioritization: Option<Prioritization>,
    pub pour_points: Vec<SnappedPoint>,
    /// 95th percentile of soil loss over the study area
    pub loss_p95: Option<f64>,
    pub unassigned_segments: usize,
    pub rasters: DerivedRasters,
}

/// Per-zone values of every raster a subbasin summary needs.
struct ZoneSamples {
    zones: Raster<i32>,
    by_raster: Vec<HashMap<i32, Vec<f64>>>,
}

impl ZoneSamples {
    fn collect(zones: Raster<i32>, rasters: &[&Raster<f64>]) -> Result<Self> {
        let by_raster = rasters
            .iter()
            .map(|r| zonal_values(r, &zones))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { zones, by_raster })
    }

    fn get(&self, raster: usize, basin: usize) -> &[f64] {
        self.by_raster[raster]
            .get(&(basin as i32 + 1))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

const Z_DEM: usize = 0;
const Z_SLOPE: usize = 1;
const Z_TRI: usize = 2;
const Z_TWI: usize = 3;
const Z_CN: usize = 4;
const Z_LOSS: usize = 5;
const Z_PERC: usize = 6;
const Z_TRENCH: usize = 7;
const Z_R: usize = 8;
const Z_K: usize = 9;
const Z_LS: usize = 10;
const Z_C: usize = 11;
const Z_P: usize = 12;

/// Longest segment of a subbasin, oriented downstream.
fn trunk_stream(segments: &[StreamSegment], members: &[usize], dem: &Raster<f64>) -> Option<LineString<f64>> {
    members
        .iter()
        .map(|&i| &segments[i])
        .max_by(|a, b| a.length().total_cmp(&b.length()))
        .map(|s| orient_downstream(&s.geometry, dem))
}

/// Run every calculator over the study area.
pub fn analyze(inputs: &BasinInputs, config: &AnalysisConfig) -> Result<BasinReport> {
    config.validate()?;
    inputs.validate()?;
    let dem = &inputs.dem;
    let flow_acc = &inputs.flow_acc;

    if let Some(expected) = config.expected_subbasins {
        if expected != inputs.subbasins.len() {
            warn!(
                "expected {} subbasins, found {}; analysing all detected polygons",
                expected,
                inputs.subbasins.len()
            );
        }
    }
    info!(
        "Analysing {} subbasins, {} stream segments on a {} x {} grid",
        inputs.subbasins.len(),
        inputs.streams.len(),
        dem.cols(),
        dem.rows()
    );

    // Study-wide rasters
    let slope_deg = slope(dem, SlopeParams::default())?;
    let tri_r = tri(dem)?;
    let flow_params = FlowIndexParams { min_slope_deg: config.index.min_slope_deg };
    let twi_r = twi(flow_acc, &slope_deg, &flow_params)?;
    let spi_r = spi(flow_acc, &slope_deg, &flow_params)?;
    let sti_r = sti(flow_acc, &slope_deg, &flow_params)?;
    info!("Terrain rasters done");

    let cn_r = curve_number(dem, &slope_deg, &config.runoff.curve_number)?;
    let factors = rusle(dem, flow_acc, &slope_deg, &config.rusle)?;
    let loss_values: Vec<f64> = factors.soil_loss.valid_values().filter(|v| v.is_finite()).collect();
    let loss_p95 = percentile(&loss_values, 95.0);
    info!("RUSLE done, study-area A p95 = {:?}", loss_p95);

    let percolation = percolation_potential(dem, &twi_r, flow_acc, &slope_deg, &config.conservation)?;
    let trench = contour_trench_suitability(
        dem,
        &slope_deg,
        flow_acc,
        &factors.soil_loss,
        loss_p95.unwrap_or(0.0),
        &config.conservation,
    )?;

    // Streams and outlets
    let assignment = assign_segments(&inputs.subbasins, &inputs.streams);
    let basin_of = assignment.basin_of(inputs.streams.len());
    let segments = segment_indices(&inputs.streams, &basin_of, dem, flow_acc, &slope_deg, &config.index);
    let pour_points: Vec<SnappedPoint> = inputs
        .pour_points
        .iter()
        .map(|p| snap_pour_point(p, flow_acc, config.index.pour_point_snap_m))
        .collect();
    let outlets = basin_outlets(&inputs.subbasins, &pour_points);
    info!("Stream indices done for {} segments", segments.len());

    let zones = rasterize_zones(&inputs.subbasins, dem)?;
    let samples = ZoneSamples::collect(
        zones,
        &[
            dem,
            &slope_deg,
            &tri_r,
            &twi_r,
            &cn_r,
            &factors.soil_loss,
            &percolation,
            &trench,
            &factors.r,
            &factors.k,
            &factors.ls,
            &factors.c,
            &factors.p,
        ],
    )?;

    let gumbel = GumbelFit::from_moments(config.rainfall.annual_mean_mm, config.rainfall.annual_std_mm);
    let storms = design_rainfall(&config.rainfall);
    let p2 = daily_for(&storms, 2.0).unwrap_or(0.0);
    let bankfull_storm = DesignRainfall::new(
        &gumbel,
        config.hydraulics.bankfull_return_period,
        config.rainfall.daily_fraction,
        None,
    );

    // Valley-floor ratios feed check-dam scoring, so tectonic indices go first
    let tectonic: Vec<TectonicIndices> = inputs
        .subbasins
        .iter()
        .zip(&assignment.by_basin)
        .map(|(sb, members)| {
            let trunk = trunk_stream(&inputs.streams, members, dem);
            tectonic_indices(&sb.geometry, trunk.as_ref(), dem, &config.tectonic)
        })
        .collect();
    let basin_vf: Vec<Option<f64>> = tectonic.iter().map(|t| t.vf).collect();
    let check_dams = check_dam_suitability(
        &inputs.streams,
        &basin_of,
        &basin_vf,
        flow_acc,
        &slope_deg,
        &factors.soil_loss,
        loss_p95.unwrap_or(0.0),
        &config.conservation,
    );
    info!("Tectonic indices and check-dam suitability done");

    let ia_ratio = config.runoff.initial_abstraction_ratio;
    let design_t = config.runoff.design_return_period;
    let mut reports = Vec::with_capacity(inputs.subbasins.len());
    for (b, (sb, tectonic)) in inputs.subbasins.iter().zip(tectonic).enumerate() {
        let members = &assignment.by_basin[b];
        if members.is_empty() {
            warn!("subbasin {} has no stream segments; linear aspects are empty", sb.id);
        }
        let linear = linear_aspects(members.iter().map(|&i| &inputs.streams[i]));
        let area_m2 = area(&sb.geometry);
        let areal = areal_aspects(
            area_m2,
            perimeter(&sb.geometry),
            linear.total_length_km * 1000.0,
            linear.stream_count,
        );
        let relief = relief_aspects(
            samples.get(Z_DEM, b),
            samples.get(Z_SLOPE, b),
            samples.get(Z_TRI, b),
            &areal,
        );
        if relief.is_none() {
            warn!("subbasin {} covers no valid DEM cell", sb.id);
        }
        let channel = ChannelSummary::of(segments.iter().filter(|s| s.basin == Some(b)));

        let cn_values = samples.get(Z_CN, b);
        let cn_mean = mean(cn_values).unwrap_or(config.snyder.default_cn);
        let runoff = basin_runoff(cn_mean, std_dev(cn_values), area_m2, &storms, ia_ratio);
        let concentration = time_of_concentration(
            areal.basin_length_km,
            relief.as_ref().map(|r| r.relief_m),
            relief.as_ref().and_then(|r| r.slope_mean),
            cn_mean,
            p2,
            &config.concentration,
        );
        if concentration.is_none() {
            warn!("subbasin {} has no time of concentration; peaks are missing", sb.id);
        }
        let peaks = peak_discharges(
            &runoff.storms,
            concentration.as_ref().map(ConcentrationTime::tc_hours),
            areal.area_km2,
        );
        let tc_hours = concentration
            .as_ref()
            .map_or(config.concentration.default_tc_hours, ConcentrationTime::tc_hours);

        let sediment = sediment_budget(samples.get(Z_LOSS, b), areal.area_km2, &config.rusle, &config.sdr);
        let rusle_means = FactorMeans {
            r: mean(samples.get(Z_R, b)),
            k: mean(samples.get(Z_K, b)),
            ls: mean(samples.get(Z_LS, b)),
            c: mean(samples.get(Z_C, b)),
            p: mean(samples.get(Z_P, b)),
        };
        let conservation = conservation_summary(
            samples.get(Z_PERC, b),
            samples.get(Z_TRENCH, b),
            cn_values,
            runoff.storm(design_t).map(|s| s.runoff_mm),
            area_m2,
            sediment.as_ref().map(|s| s.loss_mean),
            check_dams.iter().filter(|d| d.basin == Some(b)),
            &config.conservation,
        );

        let unit_hydrograph = snyder(areal.basin_length_km, areal.area_km2, &config.snyder);
        let floods = unit_hydrograph
            .as_ref()
            .map(|uh| flood_peaks(uh, &runoff.storms))
            .unwrap_or_default();

        let bankfull = bankfull_discharge(bankfull_storm.daily_mm, cn_mean, tc_hours, areal.area_km2, ia_ratio);
        let relief_m = relief
            .as_ref()
            .map_or(config.concentration.default_relief_m, |r| r.relief_m);
        let hydraulics = channel_hydraulics(bankfull, relief_m, areal.basin_length_km, &config.hydraulics);

        debug!(
            "{}: A = {:.2} km², CN = {:.1}, Tc = {:.2} h, Qbf = {:.2} m³/s",
            sb.id, areal.area_km2, cn_mean, tc_hours, bankfull
        );

        reports.push(SubbasinReport {
            id: sb.id.clone(),
            outlet: outlets[b].clone(),
            shape: ShapeClass::from_elongation(areal.elongation_ratio),
            circularity: CircularityClass::from_circularity(areal.circularity_ratio),
            hypsometric_stage: HypsometricStage::from_integral(relief.as_ref().and_then(|r| r.hypsometric_integral)),
            twi: Summary::of(samples.get(Z_TWI, b).iter().copied()),
            linear,
            areal,
            relief,
            channel,
            tectonic,
            runoff,
            concentration,
            peaks,
            rusle: rusle_means,
            sediment,
            conservation,
            unit_hydrograph,
            floods,
            bankfull_discharge_m3s: bankfull,
            hydraulics,
        });
    }
    info!("Per-subbasin hydrology, erosion and conservation done");

    let design_runoff: Vec<f64> = reports
        .iter()
        .filter_map(|r| r.runoff.storm(design_t).map(|s| s.runoff_mm))
        .collect();
    let order_power = order_stream_power(
        &inputs.streams,
        &slope_deg,
        mean(&design_runoff).unwrap_or(0.0),
        &config.hydraulics,
    );

    let rows: Vec<Vec<Option<f64>>> = reports
        .iter()
        .map(|r| erosion_criteria(&r.linear, &r.areal, r.relief.as_ref()).to_vec())
        .collect();
    let prioritization = prioritize(&EROSION_CRITERIA, &rows);
    if let Some(p) = &prioritization {
        info!("Prioritization done, Kendall tau = {:?}", p.kendall_tau);
    }

    let segment_sl = burn_segments(dem, inputs.streams.iter().zip(&segments).map(|(s, i)| (&s.geometry, i.sl)));
    let segment_spi = burn_segments(dem, inputs.streams.iter().zip(&segments).map(|(s, i)| (&s.geometry, i.spi)));

    Ok(BasinReport {
        gumbel,
        design_rainfall: storms,
        subbasins: reports,
        segments,
        check_dams,
        order_power,
        prioritization,
        pour_points,
        loss_p95,
        unassigned_segments: assignment.unassigned.len(),
        rasters: DerivedRasters {
            slope: slope_deg,
            tri: tri_r,
            twi: twi_r,
            spi: spi_r,
            sti: sti_r,
            curve_number: cn_r,
            rusle: factors,
            percolation,
            contour_trench: trench,
            segment_sl,
            segment_spi,
            zones: samples.zones,
        },
    })
}
