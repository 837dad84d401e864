//! Watershed prioritization
//!
//! Subbasins are ranked by erosion susceptibility from their morphometric
//! parameters in two independent ways:
//!
//! - **compound**: every parameter is ranked across subbasins (rank 1 = most
//!   susceptible) and the compound factor is the mean rank; low is urgent.
//! - **entropy**: parameters are min-max normalized towards susceptibility,
//!   weighted by Shannon-entropy divergence and summed; high is urgent.
//!
//! Kendall's τ-b between the two rankings measures their agreement.

use std::fmt;

use crate::morphometry::{ArealAspects, LinearAspects, ReliefAspects};
use crate::statistics::{kendall_tau_b, median, min_rank, percentiles};

/// How a parameter relates to erosion susceptibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Higher value, more susceptible
    Direct,
    /// Lower value, more susceptible
    Inverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Criterion {
    pub name: &'static str,
    pub relation: Relation,
}

const fn direct(name: &'static str) -> Criterion {
    Criterion { name, relation: Relation::Direct }
}

const fn inverse(name: &'static str) -> Criterion {
    Criterion { name, relation: Relation::Inverse }
}

/// Parameters used for ranking, in the order of [`erosion_criteria`].
pub const EROSION_CRITERIA: [Criterion; 10] = [
    direct("Dd"),
    direct("Fs"),
    direct("Rbm"),
    direct("Rn"),
    direct("Rh"),
    direct("HI"),
    direct("MRN"),
    inverse("Re"),
    inverse("Rc"),
    inverse("Ff"),
];

/// Values of [`EROSION_CRITERIA`] for one subbasin.
pub fn erosion_criteria(
    linear: &LinearAspects,
    areal: &ArealAspects,
    relief: Option<&ReliefAspects>,
) -> [Option<f64>; 10] {
    [
        areal.drainage_density,
        areal.stream_frequency,
        linear.mean_bifurcation_ratio,
        relief.and_then(|r| r.ruggedness_number),
        relief.and_then(|r| r.relief_ratio),
        relief.and_then(|r| r.hypsometric_integral),
        relief.and_then(|r| r.melton_ruggedness),
        areal.elongation_ratio,
        areal.circularity_ratio,
        areal.form_factor,
    ]
}

/// Treatment priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityClass {
    High,
    Moderate,
    Low,
}

impl PriorityClass {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rankings of all subbasins, indexed like the input rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Prioritization {
    /// Criteria that had at least one value
    pub criteria: Vec<Criterion>,
    pub compound_factor: Vec<f64>,
    pub compound_rank: Vec<usize>,
    pub compound_class: Vec<PriorityClass>,
    /// Entropy weight per entry of `criteria`
    pub entropy_weights: Vec<f64>,
    pub entropy_score: Vec<f64>,
    pub entropy_rank: Vec<usize>,
    pub entropy_class: Vec<PriorityClass>,
    /// Agreement of the two rankings
    pub kendall_tau: Option<f64>,
}

/// Rank subbasins from their criterion values (`rows[basin][criterion]`).
///
/// Missing values take the criterion's median; criteria with no value at
/// all are dropped. `None` without rows or usable criteria.
pub fn prioritize(criteria: &[Criterion], rows: &[Vec<Option<f64>>]) -> Option<Prioritization> {
    if rows.is_empty() {
        return None;
    }
    let mut kept = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();
    for (j, c) in criteria.iter().enumerate() {
        let present: Vec<f64> = rows
            .iter()
            .filter_map(|r| r.get(j).copied().flatten())
            .filter(|v| v.is_finite())
            .collect();
        let Some(fill) = median(&present) else {
            continue;
        };
        let column = rows
            .iter()
            .map(|r| r.get(j).copied().flatten().filter(|v| v.is_finite()).unwrap_or(fill))
            .collect();
        kept.push(*c);
        columns.push(column);
    }
    if kept.is_empty() {
        return None;
    }

    let compound_factor = compound_factor(&kept, &columns, rows.len());
    let compound_rank = to_ranks(min_rank(&compound_factor, false));
    let [c33, c66] = thresholds(&compound_factor, [33.0, 66.0]);
    let compound_class = compound_factor
        .iter()
        .map(|&cf| match cf {
            v if v <= c33 => PriorityClass::High,
            v if v <= c66 => PriorityClass::Moderate,
            _ => PriorityClass::Low,
        })
        .collect();

    let (entropy_weights, entropy_score) = entropy_scores(&kept, &columns, rows.len());
    let entropy_rank = to_ranks(min_rank(&entropy_score, true));
    let [e66, e33] = thresholds(&entropy_score, [66.0, 33.0]);
    let entropy_class = entropy_score
        .iter()
        .map(|&s| match s {
            v if v >= e66 => PriorityClass::High,
            v if v >= e33 => PriorityClass::Moderate,
            _ => PriorityClass::Low,
        })
        .collect();

    let as_f64 = |r: &[usize]| r.iter().map(|&v| v as f64).collect::<Vec<_>>();
    let kendall_tau = kendall_tau_b(&as_f64(&compound_rank), &as_f64(&entropy_rank));

    Some(Prioritization {
        criteria: kept,
        compound_factor,
        compound_rank,
        compound_class,
        entropy_weights,
        entropy_score,
        entropy_rank,
        entropy_class,
        kendall_tau,
    })
}

fn to_ranks(ranks: Vec<f64>) -> Vec<usize> {
    ranks.into_iter().map(|r| r as usize).collect()
}

fn thresholds(values: &[f64], qs: [f64; 2]) -> [f64; 2] {
    match percentiles(values, &qs).as_deref() {
        Some(&[a, b]) => [a, b],
        _ => [f64::NAN, f64::NAN],
    }
}

/// Mean per-criterion rank of each subbasin.
fn compound_factor(criteria: &[Criterion], columns: &[Vec<f64>], n: usize) -> Vec<f64> {
    let ranks: Vec<Vec<f64>> = criteria
        .iter()
        .zip(columns)
        .map(|(c, col)| min_rank(col, c.relation == Relation::Direct))
        .collect();
    (0..n)
        .map(|i| ranks.iter().map(|r| r[i]).sum::<f64>() / ranks.len() as f64)
        .collect()
}

/// Entropy weights and weighted normalized scores.
fn entropy_scores(criteria: &[Criterion], columns: &[Vec<f64>], n: usize) -> (Vec<f64>, Vec<f64>) {
    let normalized: Vec<Vec<f64>> = criteria
        .iter()
        .zip(columns)
        .map(|(c, col)| {
            let lo = col.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            col.iter()
                .map(|&v| {
                    let t = (v - lo) / (hi - lo + 1e-12);
                    match c.relation {
                        Relation::Direct => t,
                        Relation::Inverse => 1.0 - t,
                    }
                })
                .collect()
        })
        .collect();

    let divergence: Vec<f64> = if n < 2 {
        vec![1.0; normalized.len()]
    } else {
        normalized
            .iter()
            .map(|col| {
                let total = col.iter().sum::<f64>() + 1e-12;
                let h: f64 = col
                    .iter()
                    .map(|v| {
                        let p = (v / total).max(1e-12);
                        -p * p.ln()
                    })
                    .sum();
                1.0 - h / (n as f64).ln()
            })
            .collect()
    };
    let sum = divergence.iter().sum::<f64>() + 1e-12;
    let weights: Vec<f64> = divergence.iter().map(|d| d / sum).collect();

    let scores = (0..n)
        .map(|i| normalized.iter().zip(&weights).map(|(col, w)| col[i] * w).sum())
        .collect();
    (weights, scores)
}
