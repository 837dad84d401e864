//! End-to-end run on a synthetic two-subbasin valley.
//!
//! The grid is 60×60 cells of 30 m. A V-shaped valley drains south along
//! column 30; the northern and southern halves are separate subbasins,
//! each with a second-order trunk and two first-order tributaries.

use approx::assert_relative_eq;
use geo::{line_string, point, polygon, MultiPolygon};
use hydromorph_algorithms::config::AnalysisConfig;
use hydromorph_algorithms::erosion::sediment_delivery_ratio;
use hydromorph_algorithms::hydrology::scs_runoff;
use hydromorph_algorithms::pipeline::{analyze, BasinInputs, BasinReport};
use hydromorph_algorithms::report::{tables, write_outputs};
use hydromorph_core::io::Cell;
use hydromorph_core::raster::Raster;
use hydromorph_core::{Error, GeoTransform, PourPoint, StreamSegment, Subbasin};

const SIZE: usize = 60;
const CELL: f64 = 30.0;
const EXTENT: f64 = SIZE as f64 * CELL;

fn grid(f: impl Fn(usize, usize) -> f64) -> Raster<f64> {
    let data = (0..SIZE * SIZE).map(|i| f(i / SIZE, i % SIZE)).collect();
    let mut r = Raster::from_vec(data, SIZE, SIZE).unwrap();
    r.set_transform(GeoTransform::new(0.0, EXTENT, CELL, -CELL));
    r.set_nodata(Some(f64::NAN));
    r
}

fn dem() -> Raster<f64> {
    grid(|row, col| {
        let y = EXTENT - (row as f64 + 0.5) * CELL;
        let x = (col as f64 + 0.5) * CELL;
        400.0 + 0.08 * y + 0.15 * (x - 915.0).abs()
    })
}

fn flow_acc() -> Raster<f64> {
    grid(|row, col| if col == 30 { ((row + 1) * 40) as f64 } else { 1.0 + (row % 5) as f64 })
}

fn basin(id: &str, y0: f64, y1: f64) -> Subbasin {
    Subbasin {
        id: id.to_string(),
        geometry: MultiPolygon::new(vec![polygon![
            (x: 0.0, y: y0),
            (x: EXTENT, y: y0),
            (x: EXTENT, y: y1),
            (x: 0.0, y: y1),
        ]]),
    }
}

fn segments() -> Vec<StreamSegment> {
    let lines = [
        (2, line_string![(x: 915.0, y: 1780.0), (x: 915.0, y: 910.0)]),
        (1, line_string![(x: 300.0, y: 1700.0), (x: 600.0, y: 1480.0), (x: 915.0, y: 1300.0)]),
        (1, line_string![(x: 1500.0, y: 1700.0), (x: 1200.0, y: 1520.0), (x: 915.0, y: 1300.0)]),
        (2, line_string![(x: 915.0, y: 890.0), (x: 915.0, y: 20.0)]),
        (1, line_string![(x: 300.0, y: 800.0), (x: 640.0, y: 560.0), (x: 915.0, y: 400.0)]),
        (1, line_string![(x: 1500.0, y: 800.0), (x: 1180.0, y: 600.0), (x: 915.0, y: 400.0)]),
    ];
    lines
        .into_iter()
        .enumerate()
        .map(|(id, (order, geometry))| StreamSegment { id, order, geometry })
        .collect()
}

fn inputs() -> BasinInputs {
    BasinInputs {
        dem: dem(),
        flow_acc: flow_acc(),
        flow_dir: None,
        subbasins: vec![basin("north", 900.0, EXTENT), basin("south", 0.0, 900.0)],
        streams: segments(),
        pour_points: vec![PourPoint { id: "PP1".into(), point: point!(x: 960.0, y: 60.0) }],
    }
}

fn run() -> (BasinReport, AnalysisConfig) {
    let config = AnalysisConfig::default();
    let report = analyze(&inputs(), &config).unwrap();
    (report, config)
}

#[test]
fn every_subbasin_is_reported() {
    let (report, _) = run();
    assert_eq!(report.subbasins.len(), 2);
    assert_eq!(report.subbasins[0].id, "north");
    assert_eq!(report.unassigned_segments, 0);
    assert_eq!(report.segments.len(), 6);
    assert!(report.segments.iter().all(|s| s.basin.is_some()));
}

#[test]
fn stream_counts_add_up() {
    let (report, _) = run();
    for sb in &report.subbasins {
        let by_order: usize = sb.linear.orders.iter().map(|o| o.count).sum();
        assert_eq!(by_order, sb.linear.stream_count);
        assert_eq!(sb.linear.stream_count, 3);
        assert_eq!(sb.linear.max_order, Some(2));
        assert_eq!(sb.areal.stream_count, 3);
        // the last order has no higher order to divide by
        assert!(sb.linear.orders.last().unwrap().bifurcation_ratio.is_none());
    }
}

#[test]
fn relief_is_non_negative() {
    let (report, _) = run();
    for sb in &report.subbasins {
        let relief = sb.relief.as_ref().unwrap();
        assert!(relief.relief_m >= 0.0);
        assert_relative_eq!(relief.relief_m, relief.elev_max - relief.elev_min);
        let hi = relief.hypsometric_integral.unwrap();
        assert!((0.0..=1.0).contains(&hi));
    }
    assert_relative_eq!(report.subbasins[0].areal.area_km2, 1.62, epsilon = 1e-9);
}

#[test]
fn runoff_follows_scs_curve() {
    let (report, config) = run();
    let ia_ratio = config.runoff.initial_abstraction_ratio;
    for sb in &report.subbasins {
        let r = &sb.runoff;
        assert_relative_eq!(r.retention_mm, 25400.0 / r.cn_mean - 254.0, epsilon = 1e-9);
        let mut last = 0.0;
        for storm in &r.storms {
            assert_relative_eq!(storm.runoff_mm, scs_runoff(storm.rainfall_mm, r.cn_mean, ia_ratio), epsilon = 1e-9);
            assert!(storm.runoff_mm >= last);
            last = storm.runoff_mm;
        }
        assert_eq!(scs_runoff(r.initial_abstraction_mm, r.cn_mean, ia_ratio), 0.0);
        assert!(sb.concentration.is_some());
        assert_eq!(sb.peaks.len(), r.storms.len());
        assert!(sb.peaks.iter().all(|p| p.peak_m3s.is_some_and(|q| q >= 0.0)));
    }
}

#[test]
fn soil_loss_is_factor_product() {
    let (report, _) = run();
    let f = &report.rasters.rusle;
    for row in 0..SIZE {
        for col in 0..SIZE {
            let a = f.soil_loss.get(row, col).unwrap();
            if !a.is_finite() {
                continue;
            }
            let product = f.r.get(row, col).unwrap()
                * f.k.get(row, col).unwrap()
                * f.ls.get(row, col).unwrap()
                * f.c.get(row, col).unwrap()
                * f.p.get(row, col).unwrap();
            assert_relative_eq!(a, product, max_relative = 1e-12);
        }
    }
}

#[test]
fn sediment_yield_is_gross_times_sdr() {
    let (report, config) = run();
    for sb in &report.subbasins {
        let s = sb.sediment.as_ref().unwrap();
        assert_relative_eq!(s.yield_t_yr, s.gross_t_yr * s.sdr, max_relative = 1e-12);
        assert_relative_eq!(s.sdr, sediment_delivery_ratio(sb.area_km2(), &config.sdr));
        assert_relative_eq!(s.class_pct.iter().sum::<f64>(), 100.0, epsilon = 1e-6);
    }
}

#[test]
fn unit_hydrograph_is_deterministic() {
    let (a, _) = run();
    let (b, _) = run();
    for (x, y) in a.subbasins.iter().zip(&b.subbasins) {
        assert_eq!(x.unit_hydrograph, y.unit_hydrograph);
        let uh = x.unit_hydrograph.unwrap();
        assert!(uh.peak_time_h > uh.lag_h);
        let design = x.floods.last().unwrap();
        assert_relative_eq!(design.peak_m3s, uh.peak_m3s * design.runoff_mm);
    }
}

#[test]
fn pour_point_snaps_to_trunk() {
    let (report, _) = run();
    let pp = &report.pour_points[0];
    assert_relative_eq!(pp.snapped.x(), 915.0);
    assert_relative_eq!(pp.snapped.y(), 15.0);
    assert!(pp.distance_m > 0.0 && pp.distance_m <= 300.0);
    assert_eq!(report.subbasins[1].outlet.as_deref(), Some("PP1"));
    assert!(report.subbasins[0].outlet.is_none());
}

#[test]
fn hydraulics_and_ranking_present() {
    let (report, _) = run();
    for sb in &report.subbasins {
        assert!(sb.bankfull_discharge_m3s >= 0.0);
        if let Some(h) = &sb.hydraulics {
            assert!(h.geometry.width_m > h.geometry.depth_m);
            assert!(h.shear_stress_pa >= 0.0);
        }
    }
    let orders: Vec<u32> = report.order_power.iter().map(|o| o.order).collect();
    assert_eq!(orders, vec![1, 2]);
    let p = report.prioritization.as_ref().unwrap();
    assert_eq!(p.compound_rank.len(), 2);
    assert_relative_eq!(p.entropy_weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
}

#[test]
fn tables_have_one_row_per_subbasin() {
    let (report, config) = run();
    let all = tables(&report, &config).unwrap();
    let by_name = |n: &str| all.iter().find(|t| t.name == n).unwrap();
    assert_eq!(by_name("morphometry").len(), 2);
    assert_eq!(by_name("segments").len(), 6);
    assert_eq!(by_name("stream_orders").len(), 4);
    assert_eq!(by_name("design_rainfall").len(), config.rainfall.return_periods.len());
    assert_eq!(by_name("prioritization").len(), 2);
    let hydrology = by_name("hydrology");
    assert!(hydrology.columns().iter().any(|c| c == "Q_25yr_mm"));
    assert!(matches!(hydrology.get(1, "basin_id"), Some(Cell::Text(id)) if id == "south"));
}

#[test]
fn outputs_are_written() {
    let (report, config) = run();
    let dir = std::env::temp_dir().join(format!("hydromorph-pipeline-{}", std::process::id()));
    let written = write_outputs(&report, &config, &dir).unwrap();
    assert!(written.iter().all(|p| p.exists()));
    assert!(dir.join("morphometry.csv").exists());
    assert!(dir.join("soil_loss.tif").exists());
    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("summary.json")).unwrap()).unwrap();
    assert!(summary.get("morphometry").is_some());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn mismatched_grids_are_rejected() {
    let mut bad = inputs();
    bad.flow_acc = Raster::filled(10, 10, 1.0);
    let err = analyze(&bad, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, Error::SizeMismatch { .. }));
}

#[test]
fn empty_layers_are_rejected() {
    let mut bad = inputs();
    bad.streams.clear();
    let err = analyze(&bad, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, Error::EmptyLayer(_)));
}
