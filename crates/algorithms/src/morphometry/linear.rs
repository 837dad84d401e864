//! Linear aspects: Strahler order statistics of one subbasin.
//!
//! - Nu, Lu, Lsm per order
//! - Bifurcation ratio Rb(u) = Nu / Nu+1 (missing for the highest order)
//! - Stream length ratio RL(u) = Lsm(u) / Lsm(u-1) (missing for the lowest order)
//! - Mean Rb and Strahler's weighted mean Rb

use std::collections::BTreeMap;

use hydromorph_core::StreamSegment;

use crate::statistics::ratio;

/// Per-order aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAggregate {
    pub order: u32,
    /// Nu
    pub count: usize,
    /// Lu (km)
    pub total_length_km: f64,
    /// Lsm (km)
    pub mean_length_km: f64,
    pub bifurcation_ratio: Option<f64>,
    pub length_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearAspects {
    /// Ascending by order, only orders that occur
    pub orders: Vec<OrderAggregate>,
    pub stream_count: usize,
    pub total_length_km: f64,
    pub max_order: Option<u32>,
    /// Rbm
    pub mean_bifurcation_ratio: Option<f64>,
    /// wRbm, weights Nu(u) + Nu(u+1)
    pub weighted_bifurcation_ratio: Option<f64>,
}

/// Order statistics of the segments of one subbasin
pub fn linear_aspects<'a>(segments: impl IntoIterator<Item = &'a StreamSegment>) -> LinearAspects {
    let mut by_order: BTreeMap<u32, (usize, f64)> = BTreeMap::new();
    for seg in segments {
        let e = by_order.entry(seg.order).or_insert((0, 0.0));
        e.0 += 1;
        e.1 += seg.length() / 1000.0;
    }

    let mut orders: Vec<OrderAggregate> = by_order
        .into_iter()
        .map(|(order, (count, len))| OrderAggregate {
            order,
            count,
            total_length_km: len,
            mean_length_km: len / count as f64,
            bifurcation_ratio: None,
            length_ratio: None,
        })
        .collect();

    for i in 0..orders.len() {
        if i + 1 < orders.len() {
            orders[i].bifurcation_ratio = ratio(orders[i].count as f64, orders[i + 1].count as f64);
        }
        if i > 0 {
            orders[i].length_ratio = ratio(orders[i].mean_length_km, orders[i - 1].mean_length_km);
        }
    }

    let rbs: Vec<(f64, f64)> = orders
        .windows(2)
        .filter_map(|w| {
            w[0].bifurcation_ratio
                .map(|rb| (rb, (w[0].count + w[1].count) as f64))
        })
        .collect();

    let mean_bifurcation_ratio = crate::statistics::mean(&rbs.iter().map(|r| r.0).collect::<Vec<_>>());
    let weight_sum: f64 = rbs.iter().map(|r| r.1).sum();
    let weighted_bifurcation_ratio = ratio(rbs.iter().map(|(rb, w)| rb * w).sum(), weight_sum);

    LinearAspects {
        stream_count: orders.iter().map(|o| o.count).sum(),
        total_length_km: orders.iter().map(|o| o.total_length_km).sum(),
        max_order: orders.last().map(|o| o.order),
        orders,
        mean_bifurcation_ratio,
        weighted_bifurcation_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::line_string;

    fn seg(id: usize, order: u32, len_m: f64) -> StreamSegment {
        StreamSegment {
            id,
            order,
            geometry: line_string![(x: 0.0, y: 0.0), (x: len_m, y: 0.0)],
        }
    }

    fn network() -> Vec<StreamSegment> {
        let mut v = Vec::new();
        for i in 0..8 {
            v.push(seg(i, 1, 500.0));
        }
        for i in 8..10 {
            v.push(seg(i, 2, 1500.0));
        }
        v.push(seg(10, 3, 4000.0));
        v
    }

    #[test]
    fn test_counts_sum_to_total() {
        let segs = network();
        let la = linear_aspects(&segs);
        assert_eq!(la.stream_count, segs.len());
        assert_eq!(la.orders.iter().map(|o| o.count).sum::<usize>(), la.stream_count);
        assert_eq!(la.max_order, Some(3));
        assert_relative_eq!(la.total_length_km, 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ratios() {
        let la = linear_aspects(&network());
        assert_eq!(la.orders[0].bifurcation_ratio, Some(4.0));
        assert_eq!(la.orders[1].bifurcation_ratio, Some(2.0));
        assert_eq!(la.orders[2].bifurcation_ratio, None);
        assert_eq!(la.orders[0].length_ratio, None);
        assert_relative_eq!(la.orders[1].length_ratio.unwrap(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(la.orders[2].length_ratio.unwrap(), 4.0 / 1.5, epsilon = 1e-12);
        assert_relative_eq!(la.mean_bifurcation_ratio.unwrap(), 3.0);
        // (4*10 + 2*3) / 13
        assert_relative_eq!(la.weighted_bifurcation_ratio.unwrap(), 46.0 / 13.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_order_has_no_ratios() {
        let segs = vec![seg(0, 1, 100.0), seg(1, 1, 200.0)];
        let la = linear_aspects(&segs);
        assert_eq!(la.mean_bifurcation_ratio, None);
        assert_eq!(la.weighted_bifurcation_ratio, None);
    }

    #[test]
    fn test_empty() {
        let la = linear_aspects(&Vec::<StreamSegment>::new());
        assert_eq!(la.stream_count, 0);
        assert_eq!(la.max_order, None);
    }
}
