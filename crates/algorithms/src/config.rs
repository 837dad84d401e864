//! Calibration constants for every calculator.
//!
//! All tables and coefficients live here so a run is fully described by one
//! [`AnalysisConfig`]. Every struct is `#[serde(default)]`, so a JSON file
//! only needs the keys it overrides.

use hydromorph_core::vector::LayerFields;
use hydromorph_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maps a slope in degrees to a factor value.
///
/// CN, K, C and P are all derived from slope when no land-use or soil map is
/// available. Any closure `Fn(f64) -> f64` works as a strategy too.
pub trait SlopeFactor {
    fn value(&self, slope_deg: f64) -> f64;
}

impl<F: Fn(f64) -> f64> SlopeFactor for F {
    fn value(&self, slope_deg: f64) -> f64 {
        self(slope_deg)
    }
}

/// Step function over slope classes.
///
/// `values[i]` applies while `slope < breaks[i]`; the last value applies above
/// the last break, so `values.len() == breaks.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlopeClassTable {
    pub breaks: Vec<f64>,
    pub values: Vec<f64>,
}

impl SlopeClassTable {
    pub fn new(breaks: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        let table = Self { breaks, values };
        table.validate("slope_class_table")?;
        Ok(table)
    }

    /// Check the break/value counts and that breaks are ascending.
    pub fn validate(&self, name: &'static str) -> Result<()> {
        if self.values.len() != self.breaks.len() + 1 {
            return Err(Error::InvalidParameter {
                name,
                value: format!("{} breaks / {} values", self.breaks.len(), self.values.len()),
                reason: "expected one more value than breaks".into(),
            });
        }
        if self.breaks.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidParameter {
                name,
                value: format!("{:?}", self.breaks),
                reason: "breaks must be strictly ascending".into(),
            });
        }
        Ok(())
    }
}

impl SlopeFactor for SlopeClassTable {
    fn value(&self, slope_deg: f64) -> f64 {
        let idx = self
            .breaks
            .iter()
            .position(|&b| slope_deg < b)
            .unwrap_or(self.breaks.len());
        self.values[idx.min(self.values.len().saturating_sub(1))]
    }
}

/// `a * x^b`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLaw {
    pub coefficient: f64,
    pub exponent: f64,
}

impl PowerLaw {
    pub const fn new(coefficient: f64, exponent: f64) -> Self {
        Self { coefficient, exponent }
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.coefficient * x.powf(self.exponent)
    }
}

/// Gumbel EV-I rainfall frequency inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainfallParams {
    /// Mean annual rainfall (mm)
    pub annual_mean_mm: f64,
    /// Standard deviation of annual rainfall (mm)
    pub annual_std_mm: f64,
    /// Ratio of 1-day maximum to annual rainfall
    pub daily_fraction: f64,
    /// Floor applied to the 24-h design depth (mm)
    pub min_daily_mm: f64,
    /// Return periods in years, each > 1
    pub return_periods: Vec<f64>,
}

impl Default for RainfallParams {
    fn default() -> Self {
        Self {
            annual_mean_mm: 750.0,
            annual_std_mm: 187.0,
            daily_fraction: 0.22,
            min_daily_mm: 10.0,
            return_periods: vec![2.0, 5.0, 10.0, 25.0, 50.0, 100.0],
        }
    }
}

/// SCS-CN runoff settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunoffParams {
    /// CN by slope class (AMC-II)
    pub curve_number: SlopeClassTable,
    /// Ia = ratio * S
    pub initial_abstraction_ratio: f64,
    /// Return period whose runoff drives harvesting and stream-power estimates
    pub design_return_period: f64,
}

impl Default for RunoffParams {
    fn default() -> Self {
        Self {
            curve_number: SlopeClassTable {
                breaks: vec![3.0, 8.0, 20.0],
                values: vec![85.0, 79.0, 75.0, 70.0],
            },
            initial_abstraction_ratio: 0.2,
            design_return_period: 25.0,
        }
    }
}

/// Time of concentration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcentrationParams {
    /// Manning's n for sheet flow
    pub overland_manning_n: f64,
    /// Longest sheet-flow path (m)
    pub overland_max_length_m: f64,
    /// Relief used when a subbasin has no valid DEM cells (m)
    pub default_relief_m: f64,
    /// Mean slope used when a subbasin has no valid slope cells (degrees)
    pub default_slope_deg: f64,
    /// Tc used downstream when none could be computed (h)
    pub default_tc_hours: f64,
}

impl Default for ConcentrationParams {
    fn default() -> Self {
        Self {
            overland_manning_n: 0.15,
            overland_max_length_m: 100.0,
            default_relief_m: 100.0,
            default_slope_deg: 5.0,
            default_tc_hours: 2.0,
        }
    }
}

/// RUSLE factor proxies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RusleParams {
    /// Basin-average erosivity (MJ mm ha⁻¹ h⁻¹ yr⁻¹)
    pub r_base: f64,
    /// Relative change of R per standard deviation of elevation
    pub r_elevation_coeff: f64,
    pub r_min: f64,
    pub r_max: f64,
    pub k_factor: SlopeClassTable,
    pub c_factor: SlopeClassTable,
    pub p_factor: SlopeClassTable,
    /// LS slope-length exponent (Moore & Burch)
    pub ls_length_exponent: f64,
    /// LS slope-steepness exponent
    pub ls_slope_exponent: f64,
    pub ls_max: f64,
    /// Slope floor for LS (degrees)
    pub min_slope_deg: f64,
    /// Optional cap on soil loss (t/ha/yr); `None` keeps A = R·K·LS·C·P exact
    pub max_soil_loss: Option<f64>,
    /// Upper bounds of the severity bands (t/ha/yr)
    pub severity_breaks: Vec<f64>,
}

impl Default for RusleParams {
    fn default() -> Self {
        let breaks = vec![3.0, 8.0, 15.0, 25.0];
        Self {
            r_base: 650.0,
            r_elevation_coeff: 0.05,
            r_min: 400.0,
            r_max: 1000.0,
            k_factor: SlopeClassTable {
                breaks: breaks.clone(),
                values: vec![0.25, 0.20, 0.15, 0.10, 0.05],
            },
            c_factor: SlopeClassTable {
                breaks: breaks.clone(),
                values: vec![0.20, 0.30, 0.45, 0.55, 0.15],
            },
            p_factor: SlopeClassTable {
                breaks,
                values: vec![1.0, 0.55, 0.65, 0.80, 1.0],
            },
            ls_length_exponent: 0.6,
            ls_slope_exponent: 1.3,
            ls_max: 50.0,
            min_slope_deg: 0.01,
            max_soil_loss: None,
            severity_breaks: vec![5.0, 15.0, 30.0, 60.0],
        }
    }
}

/// Sediment delivery ratio `SDR = coefficient * A^-exponent`, capped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdrParams {
    pub coefficient: f64,
    pub exponent: f64,
    pub max_ratio: f64,
    /// Dry bulk density of deposited sediment (t/m³)
    pub bulk_density: f64,
}

impl Default for SdrParams {
    fn default() -> Self {
        Self {
            coefficient: 0.42,
            exponent: 0.125,
            max_ratio: 0.8,
            bulk_density: 1.3,
        }
    }
}

/// Weights of the five check-dam suitability factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdsiWeights {
    pub order: f64,
    pub area: f64,
    pub slope: f64,
    pub erosion: f64,
    pub valley: f64,
}

impl Default for CdsiWeights {
    fn default() -> Self {
        Self {
            order: 0.30,
            area: 0.25,
            slope: 0.20,
            erosion: 0.15,
            valley: 0.10,
        }
    }
}

impl CdsiWeights {
    pub fn sum(&self) -> f64 {
        self.order + self.area + self.slope + self.erosion + self.valley
    }
}

/// Soil and water conservation planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConservationParams {
    pub weights: CdsiWeights,
    /// Radius around a segment start searched for upstream soil loss (m)
    pub erosion_search_radius_m: f64,
    /// Channel length served by one check dam (m)
    pub dam_spacing_m: f64,
    /// Fraction of design runoff that can be harvested
    pub harvest_fraction: f64,
    /// Slope above which recharge is excluded (degrees)
    pub recharge_max_slope_deg: f64,
    /// Slope range suited to contour trenches (degrees, half-open)
    pub trench_slope_range: (f64, f64),
    /// Flow accumulation below which a cell counts as interfluve (cells)
    pub trench_max_accumulation: f64,
    /// Basin mean soil loss above which SWC priority is High / Moderate (t/ha/yr)
    pub priority_loss_breaks: (f64, f64),
}

impl Default for ConservationParams {
    fn default() -> Self {
        Self {
            weights: CdsiWeights::default(),
            erosion_search_radius_m: 500.0,
            dam_spacing_m: 700.0,
            harvest_fraction: 0.4,
            recharge_max_slope_deg: 5.0,
            trench_slope_range: (3.0, 30.0),
            trench_max_accumulation: 500.0,
            priority_loss_breaks: (15.0, 5.0),
        }
    }
}

/// Snyder synthetic unit hydrograph coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnyderParams {
    /// Basin lag coefficient Ct
    pub ct: f64,
    /// Peaking coefficient Cp
    pub cp: f64,
    /// Lca as a fraction of main stream length
    pub lca_fraction: f64,
    /// tr = tL / divisor
    pub duration_divisor: f64,
    /// tb = factor * tp
    pub base_time_factor: f64,
    /// Points in the generated series
    pub series_points: usize,
    /// Series extends to this multiple of tb
    pub series_extent: f64,
    /// CN assumed when a subbasin has none
    pub default_cn: f64,
}

impl Default for SnyderParams {
    fn default() -> Self {
        Self {
            ct: 1.8,
            cp: 0.6,
            lca_fraction: 0.6,
            duration_divisor: 5.5,
            base_time_factor: 5.0,
            series_points: 500,
            series_extent: 1.05,
            default_cn: 78.0,
        }
    }
}

/// Bankfull channel geometry and sediment mobility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydraulicParams {
    pub bankfull_return_period: f64,
    pub width: PowerLaw,
    pub depth: PowerLaw,
    pub velocity: PowerLaw,
    /// Flow area = factor * W * D
    pub section_factor: f64,
    pub water_density: f64,
    pub gravity: f64,
    pub sediment_density: f64,
    /// Median grain size (m)
    pub d50_m: f64,
    /// Critical Shields parameter
    pub shields: f64,
    /// Critical specific stream power (W/m²)
    pub critical_stream_power: f64,
    pub manning_base: f64,
    /// Added to Manning's n on gentle channels, tapering to 0 at S = 0.01
    pub manning_gentle_increment: f64,
    /// Discharge proxy per Strahler order: coefficient * order^exponent * Q_design
    pub order_discharge: PowerLaw,
}

impl Default for HydraulicParams {
    fn default() -> Self {
        Self {
            bankfull_return_period: 1.5,
            width: PowerLaw::new(3.20, 0.50),
            depth: PowerLaw::new(0.28, 0.40),
            velocity: PowerLaw::new(1.12, 0.10),
            section_factor: 0.80,
            water_density: 1000.0,
            gravity: 9.81,
            sediment_density: 2650.0,
            d50_m: 0.015,
            shields: 0.047,
            critical_stream_power: 35.0,
            manning_base: 0.038,
            manning_gentle_increment: 0.002,
            order_discharge: PowerLaw::new(0.02, 2.5),
        }
    }
}

/// Terrain index settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexParams {
    /// tan β floor for TWI and SPI rasters, as a slope in degrees
    pub min_slope_deg: f64,
    /// Floor for tan β / sin β in per-segment SPI and STI
    pub segment_min_gradient: f64,
    /// Vertex offset used for SL gradients
    pub sl_gradient_step: usize,
    /// Search radius for moving pour points onto the channel (m)
    pub pour_point_snap_m: f64,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            min_slope_deg: 0.01,
            segment_min_gradient: 1e-6,
            sl_gradient_step: 10,
            pour_point_snap_m: 300.0,
        }
    }
}

/// Tectonic index sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TectonicParams {
    /// Number of valley-floor transects
    pub vf_transects: usize,
    /// Transect band as fractions of basin height above its southern edge
    pub vf_band: (f64, f64),
    /// Samples per transect
    pub vf_samples: usize,
    pub vf_min_valid: usize,
    /// Valley floor is within this fraction of the floor-to-divide height
    pub vf_floor_fraction: f64,
    /// Percentile taken as divide elevation
    pub vf_divide_percentile: f64,
    /// Mountain-front band as a fraction of basin height
    pub smf_band: f64,
    /// Boundary samples for the T factor
    pub t_boundary_samples: usize,
}

impl Default for TectonicParams {
    fn default() -> Self {
        Self {
            vf_transects: 5,
            vf_band: (0.05, 0.15),
            vf_samples: 100,
            vf_min_valid: 10,
            vf_floor_fraction: 0.1,
            vf_divide_percentile: 95.0,
            smf_band: 0.25,
            t_boundary_samples: 200,
        }
    }
}

/// Everything one analysis run needs besides its inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub layers: LayerFields,
    /// Subbasin count the study expects; a mismatch is only reported
    pub expected_subbasins: Option<usize>,
    pub index: IndexParams,
    pub tectonic: TectonicParams,
    pub rainfall: RainfallParams,
    pub runoff: RunoffParams,
    pub concentration: ConcentrationParams,
    pub rusle: RusleParams,
    pub sdr: SdrParams,
    pub conservation: ConservationParams,
    pub snyder: SnyderParams,
    pub hydraulics: HydraulicParams,
}

impl AnalysisConfig {
    /// Parse a (possibly partial) JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make a calculator meaningless.
    pub fn validate(&self) -> Result<()> {
        self.runoff.curve_number.validate("runoff.curve_number")?;
        self.rusle.k_factor.validate("rusle.k_factor")?;
        self.rusle.c_factor.validate("rusle.c_factor")?;
        self.rusle.p_factor.validate("rusle.p_factor")?;

        if let Some(&t) = self.rainfall.return_periods.iter().find(|&&t| t <= 1.0) {
            return Err(invalid("rainfall.return_periods", t, "return periods must exceed 1 year"));
        }
        if self.hydraulics.bankfull_return_period <= 1.0 {
            return Err(invalid(
                "hydraulics.bankfull_return_period",
                self.hydraulics.bankfull_return_period,
                "return periods must exceed 1 year",
            ));
        }
        if self.runoff.design_return_period <= 1.0 {
            return Err(invalid(
                "runoff.design_return_period",
                self.runoff.design_return_period,
                "return periods must exceed 1 year",
            ));
        }
        if self.rainfall.annual_std_mm < 0.0 {
            return Err(invalid("rainfall.annual_std_mm", self.rainfall.annual_std_mm, "must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.conservation.harvest_fraction) {
            return Err(invalid(
                "conservation.harvest_fraction",
                self.conservation.harvest_fraction,
                "must be within [0, 1]",
            ));
        }
        if self.conservation.dam_spacing_m <= 0.0 {
            return Err(invalid("conservation.dam_spacing_m", self.conservation.dam_spacing_m, "must be > 0"));
        }
        if self.snyder.series_points < 2 {
            return Err(invalid("snyder.series_points", self.snyder.series_points as f64, "need at least 2 points"));
        }
        let breaks = &self.rusle.severity_breaks;
        if breaks.is_empty() || breaks.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidParameter {
                name: "rusle.severity_breaks",
                value: format!("{:?}", breaks),
                reason: "need at least one strictly ascending break".into(),
            });
        }
        if self.index.pour_point_snap_m < 0.0 {
            return Err(invalid("index.pour_point_snap_m", self.index.pour_point_snap_m, "must be >= 0"));
        }
        if self.sdr.bulk_density <= 0.0 {
            return Err(invalid("sdr.bulk_density", self.sdr.bulk_density, "must be > 0"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, value: f64, reason: &str) -> Error {
    Error::InvalidParameter {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
