//! Descriptive statistics over `f64` samples.
//!
//! Non-finite values are never filtered here; callers pass clean samples.
//! Empty or degenerate input yields `None`.

use std::cmp::Ordering;

/// `num / den`, or `None` when the denominator is not positive or the
/// result is not finite.
pub fn ratio(num: f64, den: f64) -> Option<f64> {
    if !(den > 0.0) {
        return None;
    }
    let r = num / den;
    r.is_finite().then_some(r)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0)
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Sample standard deviation (ddof = 1)
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Biased (moment) skewness `m3 / m2^1.5`
pub fn skewness(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let n = values.len() as f64;
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n;
    if m2 <= 0.0 {
        return None;
    }
    Some(m3 / m2.powf(1.5))
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    v
}

fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let q = q.clamp(0.0, 100.0);
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Percentile `q` in [0, 100] with linear interpolation between order statistics.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(percentile_sorted(&sorted(values), q))
}

/// Several percentiles with a single sort.
pub fn percentiles(values: &[f64], qs: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() {
        return None;
    }
    let s = sorted(values);
    Some(qs.iter().map(|&q| percentile_sorted(&s, q)).collect())
}

pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// Competition ranks starting at 1; ties share the lowest rank.
///
/// With `descending` the largest value gets rank 1.
pub fn min_rank(values: &[f64], descending: bool) -> Vec<f64> {
    values
        .iter()
        .map(|&v| {
            let better = values
                .iter()
                .filter(|&&o| if descending { o > v } else { o < v })
                .count();
            (better + 1) as f64
        })
        .collect()
}

/// Kendall's tau-b between two paired samples.
///
/// `None` when the lengths differ, fewer than two pairs exist, or either
/// sample is constant.
pub fn kendall_tau_b(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let (mut concordant, mut discordant) = (0i64, 0i64);
    let (mut ties_x, mut ties_y) = (0i64, 0i64);

    for i in 0..x.len() {
        for j in (i + 1)..x.len() {
            let dx = (x[i] - x[j]).partial_cmp(&0.0).unwrap_or(Ordering::Equal);
            let dy = (y[i] - y[j]).partial_cmp(&0.0).unwrap_or(Ordering::Equal);
            match (dx, dy) {
                (Ordering::Equal, Ordering::Equal) => {}
                (Ordering::Equal, _) => ties_x += 1,
                (_, Ordering::Equal) => ties_y += 1,
                (a, b) if a == b => concordant += 1,
                _ => discordant += 1,
            }
        }
    }

    let n1 = (concordant + discordant + ties_x) as f64;
    let n2 = (concordant + discordant + ties_y) as f64;
    let denom = (n1 * n2).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((concordant - discordant) as f64 / denom)
}

/// Count, extremes, mean and spread of a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Population standard deviation
    pub std_dev: Option<f64>,
    /// Sample standard deviation
    pub sample_std_dev: Option<f64>,
}

impl Summary {
    /// Summarize the finite values of `values`.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Self {
        let v: Vec<f64> = values.into_iter().filter(|x| x.is_finite()).collect();
        if v.is_empty() {
            return Self::default();
        }
        Self {
            count: v.len(),
            mean: mean(&v),
            min: v.iter().copied().reduce(f64::min),
            max: v.iter().copied().reduce(f64::max),
            std_dev: std_dev(&v),
            sample_std_dev: sample_std_dev(&v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ratio_degenerate() {
        assert_eq!(ratio(1.0, 2.0), Some(0.5));
        assert_eq!(ratio(1.0, 0.0), None);
        assert_eq!(ratio(1.0, -1.0), None);
        assert_eq!(ratio(f64::NAN, 1.0), None);
        assert_eq!(ratio(1.0, f64::NAN), None);
    }

    #[test]
    fn test_moments() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&v).unwrap(), 5.0);
        assert_relative_eq!(std_dev(&v).unwrap(), 2.0);
        assert_relative_eq!(sample_std_dev(&v).unwrap(), (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert!(mean(&[]).is_none());
        assert!(sample_std_dev(&[1.0]).is_none());
    }

    #[test]
    fn test_skewness_sign() {
        assert!(skewness(&[1.0, 1.0, 1.0, 10.0]).unwrap() > 0.0);
        assert!(skewness(&[1.0, 10.0, 10.0, 10.0]).unwrap() < 0.0);
        assert_relative_eq!(skewness(&[1.0, 2.0, 3.0]).unwrap(), 0.0, epsilon = 1e-12);
        assert!(skewness(&[3.0, 3.0]).is_none());
    }

    #[test]
    fn test_percentile_linear() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(percentile(&v, 0.0).unwrap(), 1.0);
        assert_relative_eq!(percentile(&v, 100.0).unwrap(), 4.0);
        assert_relative_eq!(percentile(&v, 50.0).unwrap(), 2.5);
        // pos = 0.95 * 3 = 2.85
        assert_relative_eq!(percentile(&v, 95.0).unwrap(), 3.85, epsilon = 1e-12);
        let ps = percentiles(&v, &[25.0, 75.0]).unwrap();
        assert_relative_eq!(ps[0], 1.75);
        assert_relative_eq!(ps[1], 3.25);
    }

    #[test]
    fn test_min_rank_ties() {
        let v = [10.0, 30.0, 30.0, 20.0];
        assert_eq!(min_rank(&v, false), vec![1.0, 3.0, 3.0, 2.0]);
        assert_eq!(min_rank(&v, true), vec![4.0, 1.0, 1.0, 3.0]);
    }

    #[test]
    fn test_kendall() {
        let a = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(kendall_tau_b(&a, &a).unwrap(), 1.0);
        let rev = [4.0, 3.0, 2.0, 1.0];
        assert_relative_eq!(kendall_tau_b(&a, &rev).unwrap(), -1.0);
        // one tie in y: C=5, D=0, ties_y=1 -> 5 / sqrt(6*5)
        let y = [1.0, 2.0, 3.0, 3.0];
        assert_relative_eq!(kendall_tau_b(&a, &y).unwrap(), 5.0 / 30.0_f64.sqrt(), epsilon = 1e-12);
        assert!(kendall_tau_b(&a, &[1.0, 1.0, 1.0, 1.0]).is_none());
    }

    #[test]
    fn test_summary_skips_nan() {
        let s = Summary::of([1.0, f64::NAN, 3.0]);
        assert_eq!(s.count, 2);
        assert_eq!(s.mean, Some(2.0));
        assert_eq!(s.max, Some(3.0));
        assert_eq!(Summary::of(Vec::new()), Summary::default());
    }
}
