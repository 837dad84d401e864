//! Relative tectonic activity indices per subbasin
//!
//! - **AF**: drainage basin asymmetry factor, `100·Ar/At`
//! - **T**: transverse topographic symmetry, `Da/Dd`
//! - **Vf**: valley floor width-to-height ratio near the outlet
//! - **Smf**: mountain front sinuosity of the basin's lower band
//! - **IAT**: mean of the four class scores (El Hamdouni et al., 2008)

use std::fmt;

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon, Rect};
use hydromorph_core::raster::Raster;

use crate::config::TectonicParams;
use crate::statistics::{mean, percentile, ratio};
use crate::vector::{area, bounds, centroid, interpolate_normalized, line_centroid, linspace, main_exterior, perimeter, sample};

/// Asymmetry factor of a basin about its trunk axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Asymmetry {
    pub af: f64,
    /// |AF - 50|
    pub deviation: f64,
    pub right_km2: f64,
    pub left_km2: f64,
}

/// Area to the right of the trunk direction, looking downstream, as a
/// percentage of the basin.
///
/// The dividing line runs through the trunk's length-weighted centroid
/// parallel to the oriented trunk (first to last vertex).
pub fn asymmetry_factor(basin: &MultiPolygon<f64>, trunk: &LineString<f64>) -> Option<Asymmetry> {
    let anchor = line_centroid(trunk)?;
    let (first, last) = (trunk.0.first()?, trunk.0.last()?);
    let (dx, dy) = (last.x - first.x, last.y - first.y);
    let len = dx.hypot(dy);
    let b = bounds(basin)?;
    if !(len > 0.0) {
        return None;
    }
    let (ux, uy) = (dx / len, dy / len);
    // right-hand normal when facing (ux, uy)
    let (nx, ny) = (uy, -ux);
    let reach = 2.0
        * (b.width() + b.height() + (anchor.x - b.min().x).abs() + (anchor.y - b.min().y).abs())
        + 1.0;

    let pt = |along: f64, across: f64| Coord {
        x: anchor.x + ux * along * reach + nx * across * reach,
        y: anchor.y + uy * along * reach + ny * across * reach,
    };
    let half_plane = Polygon::new(
        LineString(vec![pt(-1.0, 0.0), pt(1.0, 0.0), pt(1.0, 1.0), pt(-1.0, 1.0), pt(-1.0, 0.0)]),
        vec![],
    );

    let total = area(basin);
    if !(total > 0.0) {
        return None;
    }
    let right = area(&basin.intersection(&half_plane));
    let af = 100.0 * right / total;
    Some(Asymmetry {
        af,
        deviation: (af - 50.0).abs(),
        right_km2: right / 1e6,
        left_km2: (total - right).max(0.0) / 1e6,
    })
}

/// Transverse topographic symmetry factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseSymmetry {
    pub t: f64,
    /// Basin centroid to trunk centroid (m)
    pub da_m: f64,
    /// Mean basin centroid to divide distance (m)
    pub dd_m: f64,
}

/// `T = Da/Dd`, with `Dd` averaged over `samples` points along the divide.
pub fn transverse_symmetry(
    basin: &MultiPolygon<f64>,
    trunk: &LineString<f64>,
    samples: usize,
) -> Option<TransverseSymmetry> {
    let c = centroid(basin)?;
    let s = line_centroid(trunk)?;
    let divide = main_exterior(basin)?;
    let da = (s.x - c.x).hypot(s.y - c.y);

    let dists: Vec<f64> = linspace(0.0, 1.0, samples)
        .into_iter()
        .filter_map(|f| interpolate_normalized(divide, f))
        .map(|p| (p.x - c.x).hypot(p.y - c.y))
        .collect();
    let dd = mean(&dists)?;
    Some(TransverseSymmetry {
        t: ratio(da, dd)?,
        da_m: da,
        dd_m: dd,
    })
}

/// Mean valley floor width-to-height ratio over east-west transects in the
/// lower band of the basin's bounding box.
///
/// Each transect takes the minimum as valley floor and the divide
/// percentile as both wall heights; the floor width counts samples within
/// `vf_floor_fraction` of the floor-to-wall height.
pub fn valley_floor_ratio(basin: &MultiPolygon<f64>, dem: &Raster<f64>, params: &TectonicParams) -> Option<f64> {
    let b = bounds(basin)?;
    let (min, max) = (b.min(), b.max());
    let h = max.y - min.y;
    let width = max.x - min.x;
    let spacing = width / params.vf_samples.max(1) as f64;
    let xs = linspace(min.x, max.x, params.vf_samples);

    let ratios: Vec<f64> = linspace(
        min.y + h * params.vf_band.0,
        min.y + h * params.vf_band.1,
        params.vf_transects,
    )
    .into_iter()
    .filter_map(|y| {
        let elev: Vec<f64> = xs.iter().filter_map(|&x| sample(dem, Coord { x, y })).collect();
        if elev.len() < params.vf_min_valid {
            return None;
        }
        let floor = elev.iter().copied().reduce(f64::min)?;
        let wall = percentile(&elev, params.vf_divide_percentile)?;
        let threshold = floor + (wall - floor) * params.vf_floor_fraction;
        let floor_width = elev.iter().filter(|&&z| z <= threshold).count() as f64 * spacing;
        let denom = 2.0 * (wall - floor);
        (denom > 0.0).then(|| 2.0 * floor_width / denom)
    })
    .collect();
    mean(&ratios)
}

/// `Smf = Lmf/Ls` for the lowest `band` fraction of the basin: the perimeter
/// of that part over the basin's east-west extent.
pub fn mountain_front_sinuosity(basin: &MultiPolygon<f64>, band: f64) -> Option<f64> {
    let b = bounds(basin)?;
    let (min, max) = (b.min(), b.max());
    let cut = Rect::new(min, Coord { x: max.x, y: min.y + (max.y - min.y) * band }).to_polygon();
    let lower = basin.intersection(&cut);
    if lower.0.is_empty() {
        return None;
    }
    ratio(perimeter(&lower), max.x - min.x)
}

/// Activity score: 1 high, 2 moderate, 3 low.
pub fn af_score(af: Option<f64>) -> u8 {
    match af.map(|v| (v - 50.0).abs()) {
        None => 2,
        Some(d) if d > 15.0 => 1,
        Some(d) if d > 5.0 => 2,
        Some(_) => 3,
    }
}

pub fn t_score(t: Option<f64>) -> u8 {
    match t {
        None => 2,
        Some(v) if v > 0.5 => 1,
        Some(v) if v > 0.25 => 2,
        Some(_) => 3,
    }
}

pub fn vf_score(vf: Option<f64>) -> u8 {
    match vf {
        None => 2,
        Some(v) if v < 0.5 => 1,
        Some(v) if v < 1.0 => 2,
        Some(_) => 3,
    }
}

pub fn smf_score(smf: Option<f64>) -> u8 {
    match smf {
        None => 2,
        Some(v) if v < 1.4 => 1,
        Some(v) if v < 3.0 => 2,
        Some(_) => 3,
    }
}

macro_rules! label_enum {
    ($(#[$m:meta])* $name:ident { $($variant:ident => $label:expr),* $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant,)*
            Unknown,
        }

        impl $name {
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)*
                    Self::Unknown => "Unknown",
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

label_enum!(
    /// Class of the AF deviation from 50
    AsymmetryClass {
        Symmetric => "Symmetric (Low tectonic activity)",
        Slight => "Slightly asymmetric (Moderate)",
        High => "Highly asymmetric (High tectonic activity)",
    }
);

label_enum!(
    TransverseClass {
        Symmetric => "Symmetric",
        Slight => "Slightly asymmetric",
        Moderate => "Moderately asymmetric",
        High => "Highly asymmetric",
    }
);

label_enum!(
    ValleyClass {
        VShaped => "V-shaped valley (active uplift)",
        Transitional => "Transitional",
        Flat => "Wide flat valley (tectonic quiescence)",
    }
);

label_enum!(
    FrontClass {
        Straight => "Straight/active front",
        Moderate => "Moderately sinuous",
        Sinuous => "Highly sinuous/inactive",
    }
);

label_enum!(
    /// Relative tectonic activity from IAT
    ActivityClass {
        VeryHigh => "Class 1 (Very High)",
        High => "Class 2 (High)",
        Moderate => "Class 3 (Moderate)",
        Low => "Class 4 (Low)",
    }
);

impl AsymmetryClass {
    pub fn from_af(af: Option<f64>) -> Self {
        match af.map(|v| (v - 50.0).abs()) {
            None => Self::Unknown,
            Some(d) if d < 5.0 => Self::Symmetric,
            Some(d) if d < 15.0 => Self::Slight,
            Some(_) => Self::High,
        }
    }
}

impl TransverseClass {
    pub fn from_t(t: Option<f64>) -> Self {
        match t {
            None => Self::Unknown,
            Some(v) if v < 0.1 => Self::Symmetric,
            Some(v) if v < 0.25 => Self::Slight,
            Some(v) if v < 0.5 => Self::Moderate,
            Some(_) => Self::High,
        }
    }
}

impl ValleyClass {
    pub fn from_vf(vf: Option<f64>) -> Self {
        match vf {
            None => Self::Unknown,
            Some(v) if v < 0.5 => Self::VShaped,
            Some(v) if v < 1.0 => Self::Transitional,
            Some(_) => Self::Flat,
        }
    }
}

impl FrontClass {
    pub fn from_smf(smf: Option<f64>) -> Self {
        match smf {
            None => Self::Unknown,
            Some(v) if v < 1.4 => Self::Straight,
            Some(v) if v < 3.0 => Self::Moderate,
            Some(_) => Self::Sinuous,
        }
    }
}

impl ActivityClass {
    pub fn from_iat(iat: f64) -> Self {
        match iat {
            v if v <= 1.5 => Self::VeryHigh,
            v if v <= 2.0 => Self::High,
            v if v <= 2.5 => Self::Moderate,
            _ => Self::Low,
        }
    }
}

/// All tectonic indices of one subbasin.
#[derive(Debug, Clone, PartialEq)]
pub struct TectonicIndices {
    pub asymmetry: Option<Asymmetry>,
    pub transverse: Option<TransverseSymmetry>,
    pub vf: Option<f64>,
    pub smf: Option<f64>,
    /// AF, T, Vf, Smf scores
    pub scores: [u8; 4],
    pub iat: f64,
}

impl TectonicIndices {
    pub fn af(&self) -> Option<f64> {
        self.asymmetry.map(|a| a.af)
    }

    pub fn t(&self) -> Option<f64> {
        self.transverse.map(|t| t.t)
    }

    pub fn af_class(&self) -> AsymmetryClass {
        AsymmetryClass::from_af(self.af())
    }

    pub fn t_class(&self) -> TransverseClass {
        TransverseClass::from_t(self.t())
    }

    pub fn vf_class(&self) -> ValleyClass {
        ValleyClass::from_vf(self.vf)
    }

    pub fn smf_class(&self) -> FrontClass {
        FrontClass::from_smf(self.smf)
    }

    pub fn activity_class(&self) -> ActivityClass {
        ActivityClass::from_iat(self.iat)
    }
}

/// Compute AF, T, Vf, Smf and IAT for one basin.
///
/// `trunk` is the basin's main stream oriented downstream; without one AF
/// and T are missing and score as moderate.
pub fn tectonic_indices(
    basin: &MultiPolygon<f64>,
    trunk: Option<&LineString<f64>>,
    dem: &Raster<f64>,
    params: &TectonicParams,
) -> TectonicIndices {
    let asymmetry = trunk.and_then(|t| asymmetry_factor(basin, t));
    let transverse = trunk.and_then(|t| transverse_symmetry(basin, t, params.t_boundary_samples));
    let vf = valley_floor_ratio(basin, dem, params);
    let smf = mountain_front_sinuosity(basin, params.smf_band);

    let scores = [
        af_score(asymmetry.map(|a| a.af)),
        t_score(transverse.map(|t| t.t)),
        vf_score(vf),
        smf_score(smf),
    ];
    let iat = scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64;

    TectonicIndices {
        asymmetry,
        transverse,
        vf,
        smf,
        scores,
        iat,
    }
}
