//! Result tables and output files
//!
//! [`tables`] flattens a [`BasinReport`] into one [`Table`] per topic;
//! [`write_outputs`] saves them as CSV, a combined JSON document and the
//! derived rasters as GeoTIFF.

use std::fs;
use std::path::{Path, PathBuf};

use hydromorph_core::io::{write_geotiff, Cell, Table};
use hydromorph_core::raster::Raster;
use hydromorph_core::Result;
use serde_json::{Map, Value};
use tracing::info;

use crate::config::AnalysisConfig;
use crate::erosion::SeverityBands;
use crate::geomorphic::SinuosityClass;
use crate::hydrology::ConcentrationTime;
use crate::pipeline::BasinReport;

macro_rules! row {
    ($($cell:expr),* $(,)?) => {
        vec![$(Cell::from($cell)),*]
    };
}

fn table(name: &str, columns: &[String]) -> Table {
    let refs: Vec<&str> = columns.iter().map(String::as_str).collect();
    Table::new(name, &refs)
}

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

fn label(s: impl ToString) -> Cell {
    Cell::Text(s.to_string())
}

/// Every result table of a run.
pub fn tables(report: &BasinReport, config: &AnalysisConfig) -> Result<Vec<Table>> {
    Ok(vec![
        rainfall_table(report)?,
        linear_table(report)?,
        morphometry_table(report)?,
        segment_table(report)?,
        geomorphic_table(report)?,
        hydrology_table(report)?,
        erosion_table(report, config)?,
        conservation_table(report)?,
        check_dam_table(report)?,
        unit_hydrograph_table(report)?,
        hydraulics_table(report)?,
        order_power_table(report)?,
        prioritization_table(report)?,
        pour_point_table(report)?,
    ])
}

pub fn rainfall_table(report: &BasinReport) -> Result<Table> {
    let mut t = Table::new("design_rainfall", &["return_period_yr", "reduced_variate", "annual_mm", "p24_mm"]);
    for s in &report.design_rainfall {
        t.push_row(row![s.return_period, s.reduced_variate, s.annual_mm, s.daily_mm])?;
    }
    Ok(t)
}

pub fn linear_table(report: &BasinReport) -> Result<Table> {
    let mut t = Table::new(
        "stream_orders",
        &["basin_id", "order", "Nu", "Lu_km", "Lsm_km", "Rb", "RL"],
    );
    for sb in &report.subbasins {
        for o in &sb.linear.orders {
            t.push_row(row![
                sb.id.as_str(),
                o.order,
                o.count,
                o.total_length_km,
                o.mean_length_km,
                o.bifurcation_ratio,
                o.length_ratio,
            ])?;
        }
    }
    Ok(t)
}

pub fn morphometry_table(report: &BasinReport) -> Result<Table> {
    let mut t = Table::new(
        "morphometry",
        &[
            "basin_id", "outlet", "area_km2", "perimeter_km", "Lb_km", "Nu", "Lu_km", "max_order", "Rbm", "Rbw",
            "Dd", "Fs", "T", "Ff", "Re", "Rc", "Cc", "Lg_km", "C", "If", "Di", "shape", "circularity",
            "elev_min", "elev_max", "elev_mean", "H_m", "Rh", "Rr", "Rn", "MRN", "HI", "hypsometric_stage",
            "slope_mean", "slope_std", "slope_skew", "TRI_mean", "TWI_mean", "TWI_max", "TWI_std",
        ],
    );
    for sb in &report.subbasins {
        let a = &sb.areal;
        let l = &sb.linear;
        let r = sb.relief.as_ref();
        t.push_row(row![
            sb.id.as_str(),
            sb.outlet.clone().unwrap_or_default(),
            a.area_km2,
            a.perimeter_km,
            a.basin_length_km,
            l.stream_count,
            l.total_length_km,
            l.max_order.map_or(Cell::Num(None), Cell::from),
            l.mean_bifurcation_ratio,
            l.weighted_bifurcation_ratio,
            a.drainage_density,
            a.stream_frequency,
            a.texture_ratio,
            a.form_factor,
            a.elongation_ratio,
            a.circularity_ratio,
            a.compactness,
            a.overland_flow_length,
            a.channel_maintenance,
            a.infiltration_number,
            a.drainage_intensity,
            label(sb.shape.label()),
            label(sb.circularity.label()),
            r.map(|r| r.elev_min),
            r.map(|r| r.elev_max),
            r.map(|r| r.elev_mean),
            r.map(|r| r.relief_m),
            r.and_then(|r| r.relief_ratio),
            r.and_then(|r| r.relative_relief),
            r.and_then(|r| r.ruggedness_number),
            r.and_then(|r| r.melton_ruggedness),
            r.and_then(|r| r.hypsometric_integral),
            label(sb.hypsometric_stage.label()),
            r.and_then(|r| r.slope_mean),
            r.and_then(|r| r.slope_std),
            r.and_then(|r| r.slope_skewness),
            r.and_then(|r| r.tri_mean),
            sb.twi.mean,
            sb.twi.max,
            sb.twi.std_dev,
        ])?;
    }
    Ok(t)
}

pub fn segment_table(report: &BasinReport) -> Result<Table> {
    let mut t = Table::new(
        "segments",
        &["segment_id", "order", "basin_id", "length_m", "SL", "SL_anomaly", "SI", "SI_class", "SPI", "STI"],
    );
    for s in &report.segments {
        let basin = s.basin.and_then(|b| report.subbasins.get(b)).map(|b| b.id.clone());
        t.push_row(row![
            s.id,
            s.order,
            basin.unwrap_or_default(),
            s.length_m,
            s.sl,
            s.sl_anomaly,
            s.sinuosity,
            label(SinuosityClass::from_sinuosity(s.sinuosity)),
            s.spi,
            s.sti,
        ])?;
    }
    Ok(t)
}

pub fn geomorphic_table(report: &BasinReport) -> Result<Table> {
    let mut t = Table::new(
        "tectonic",
        &[
            "basin_id", "AF", "AF_deviation", "AF_class", "T", "T_class", "Vf", "Vf_class", "Smf", "Smf_class",
            "IAT", "IAT_class", "SI_mean", "SI_max", "SI_class", "SPI_mean", "SPI_max", "STI_mean", "STI_max",
            "SL_anomaly_mean", "SL_anomaly_max",
        ],
    );
    for sb in &report.subbasins {
        let g = &sb.tectonic;
        let c = &sb.channel;
        t.push_row(row![
            sb.id.as_str(),
            g.af(),
            g.asymmetry.map(|a| a.deviation),
            label(g.af_class()),
            g.t(),
            label(g.t_class()),
            g.vf,
            label(g.vf_class()),
            g.smf,
            label(g.smf_class()),
            g.iat,
            label(g.activity_class()),
            c.sinuosity.mean,
            c.sinuosity.max,
            label(c.sinuosity_class),
            c.spi.mean,
            c.spi.max,
            c.sti.mean,
            c.sti.max,
            c.sl_anomaly.mean,
            c.sl_anomaly.max,
        ])?;
    }
    Ok(t)
}

pub fn hydrology_table(report: &BasinReport) -> Result<Table> {
    let mut columns = owned(&[
        "basin_id", "CN_mean", "CN_std", "S_mm", "Ia_mm", "Tc_kirpich_min", "Tc_scs_min", "Tt_overland_min",
        "Tc_hr",
    ]);
    for s in &report.design_rainfall {
        let rp = s.return_period;
        columns.push(format!("Q_{rp}yr_mm"));
        columns.push(format!("C_{rp}yr"));
        columns.push(format!("V_{rp}yr_Mm3"));
        columns.push(format!("Qp_{rp}yr_m3s"));
    }
    let mut t = table("hydrology", &columns);
    for sb in &report.subbasins {
        let r = &sb.runoff;
        let tc = sb.concentration.as_ref();
        let mut cells = row![
            sb.id.as_str(),
            r.cn_mean,
            r.cn_std,
            r.retention_mm,
            r.initial_abstraction_mm,
            tc.map(|t| t.kirpich_min),
            tc.map(|t| t.scs_lag_min),
            tc.map(|t| t.overland_min),
            tc.map(ConcentrationTime::tc_hours),
        ];
        for (storm, peak) in r.storms.iter().zip(&sb.peaks) {
            cells.extend(row![storm.runoff_mm, storm.coefficient, storm.volume_mm3, peak.peak_m3s]);
        }
        t.push_row(cells)?;
    }
    Ok(t)
}

pub fn erosion_table(report: &BasinReport, config: &AnalysisConfig) -> Result<Table> {
    let bands = SeverityBands::new(&config.rusle.severity_breaks);
    let mut columns = owned(&[
        "basin_id", "R_mean", "K_mean", "LS_mean", "C_mean", "P_mean", "A_mean", "A_p95", "A_class", "gross_t_yr",
        "SDR", "SY_t_yr", "SY_Mm3_yr",
    ]);
    columns.extend(bands.labels().into_iter().map(|l| format!("pct {l}")));
    let mut t = table("erosion", &columns);
    for sb in &report.subbasins {
        let f = &sb.rusle;
        let s = sb.sediment.as_ref();
        let mut cells = row![
            sb.id.as_str(),
            f.r,
            f.k,
            f.ls,
            f.c,
            f.p,
            s.map(|s| s.loss_mean),
            s.map(|s| s.loss_p95),
            label(s.map_or("Unknown", |s| s.loss_class.as_str())),
            s.map(|s| s.gross_t_yr),
            s.map(|s| s.sdr),
            s.map(|s| s.yield_t_yr),
            s.map(|s| s.yield_mm3_yr),
        ];
        for band in 0..bands.count() {
            cells.push(s.and_then(|s| s.class_pct.get(band).copied()).into());
        }
        t.push_row(cells)?;
    }
    Ok(t)
}

pub fn conservation_table(report: &BasinReport) -> Result<Table> {
    let mut t = Table::new(
        "conservation",
        &[
            "basin_id", "perc_mean", "perc_p75", "trench_mean", "trench_suitable_pct", "WHP_Mm3", "check_dams",
            "CN_mean", "SWC_priority",
        ],
    );
    for sb in &report.subbasins {
        let c = &sb.conservation;
        t.push_row(row![
            sb.id.as_str(),
            c.percolation_mean,
            c.percolation_p75,
            c.trench_mean,
            c.trench_suitable_pct,
            c.harvest_mm3,
            c.check_dams,
            c.cn_mean,
            label(c.priority),
        ])?;
    }
    Ok(t)
}

pub fn check_dam_table(report: &BasinReport) -> Result<Table> {
    let mut t = Table::new(
        "check_dams",
        &[
            "segment_id", "order", "basin_id", "length_m", "upstream_area_km2", "slope_deg", "slope_pct",
            "upstream_A", "score_order", "score_area", "score_slope", "score_erosion", "score_valley", "CDSI",
            "suitability",
        ],
    );
    for d in &report.check_dams {
        let basin = d.basin.and_then(|b| report.subbasins.get(b)).map(|b| b.id.clone());
        t.push_row(row![
            d.segment_id,
            d.order,
            basin.unwrap_or_default(),
            d.length_m,
            d.upstream_area_km2,
            d.slope_deg,
            d.slope_pct,
            d.upstream_loss,
            d.scores.order,
            d.scores.area,
            d.scores.slope,
            d.scores.erosion,
            d.scores.valley,
            d.cdsi,
            label(d.class),
        ])?;
    }
    Ok(t)
}

pub fn unit_hydrograph_table(report: &BasinReport) -> Result<Table> {
    let mut columns = owned(&[
        "basin_id", "L_km", "Lca_km", "A_km2", "tL_hr", "tr_hr", "tp_hr", "Qp_1mm_m3s", "qp_m3s_km2", "W50_hr",
        "W75_hr", "tb_hr",
    ]);
    columns.extend(report.design_rainfall.iter().map(|s| format!("Qp_{}yr_m3s", s.return_period)));
    let mut t = table("unit_hydrograph", &columns);
    for sb in &report.subbasins {
        let Some(uh) = &sb.unit_hydrograph else {
            continue;
        };
        let mut cells = row![
            sb.id.as_str(),
            uh.length_km,
            uh.lca_km,
            uh.area_km2,
            uh.lag_h,
            uh.duration_h,
            uh.peak_time_h,
            uh.peak_m3s,
            uh.unit_peak,
            uh.w50_h,
            uh.w75_h,
            uh.base_time_h,
        ];
        cells.extend(sb.floods.iter().map(|f| Cell::from(f.peak_m3s)));
        t.push_row(cells)?;
    }
    Ok(t)
}

/// Design-storm flood hydrograph of every subbasin, long format.
pub fn hydrograph_series_table(report: &BasinReport, config: &AnalysisConfig) -> Result<Table> {
    let mut t = Table::new("hydrograph_series", &["basin_id", "t_hr", "Q_m3s"]);
    let design_t = config.runoff.design_return_period;
    for sb in &report.subbasins {
        let (Some(uh), Some(storm)) = (&sb.unit_hydrograph, sb.runoff.storm(design_t)) else {
            continue;
        };
        for (time, q) in uh.series(storm.runoff_mm, &config.snyder) {
            t.push_row(row![sb.id.as_str(), time, q])?;
        }
    }
    Ok(t)
}

pub fn hydraulics_table(report: &BasinReport) -> Result<Table> {
    let mut t = Table::new(
        "channel_hydraulics",
        &[
            "basin_id", "Q_bankfull_m3s", "W_m", "D_m", "V_ms", "WD_ratio", "R_m", "S", "manning_n",
            "Q_manning_m3s", "tau_Pa", "tau_c_Pa", "excess_tau_Pa", "Omega_W_m", "omega_W_m2", "excess_omega_W_m2",
            "transport_rel", "stability",
        ],
    );
    for sb in &report.subbasins {
        let Some(h) = &sb.hydraulics else {
            let mut cells = row![sb.id.as_str(), sb.bankfull_discharge_m3s];
            cells.extend((0..15).map(|_| Cell::Num(None)));
            cells.push(label("Unknown"));
            t.push_row(cells)?;
            continue;
        };
        let g = &h.geometry;
        t.push_row(row![
            sb.id.as_str(),
            g.discharge_m3s,
            g.width_m,
            g.depth_m,
            g.velocity_ms,
            g.width_depth,
            g.hydraulic_radius_m,
            h.slope,
            h.manning_n,
            h.manning_discharge_m3s,
            h.shear_stress_pa,
            h.critical_shear_pa,
            h.excess_shear_pa,
            h.stream_power_w_m,
            h.specific_power_w_m2,
            h.excess_power_w_m2,
            h.transport_capacity,
            label(h.stability),
        ])?;
    }
    Ok(t)
}

pub fn order_power_table(report: &BasinReport) -> Result<Table> {
    let mut t = Table::new(
        "stream_order_power",
        &["order", "segments", "total_length_km", "mean_length_m", "mean_slope_deg", "slope", "Q_proxy_m3s", "omega_W_m2"],
    );
    for o in &report.order_power {
        t.push_row(row![
            o.order,
            o.segments,
            o.total_length_km,
            o.mean_length_m,
            o.mean_slope_deg,
            o.slope,
            o.discharge_m3s,
            o.specific_power_w_m2,
        ])?;
    }
    Ok(t)
}

pub fn prioritization_table(report: &BasinReport) -> Result<Table> {
    let mut t = Table::new(
        "prioritization",
        &["basin_id", "compound_factor", "rank_compound", "priority_compound", "entropy_score", "rank_entropy", "priority_entropy"],
    );
    let Some(p) = &report.prioritization else {
        return Ok(t);
    };
    for (i, sb) in report.subbasins.iter().enumerate() {
        t.push_row(row![
            sb.id.as_str(),
            p.compound_factor[i],
            p.compound_rank[i],
            label(p.compound_class[i]),
            p.entropy_score[i],
            p.entropy_rank[i],
            label(p.entropy_class[i]),
        ])?;
    }
    Ok(t)
}

pub fn pour_point_table(report: &BasinReport) -> Result<Table> {
    let mut t = Table::new("pour_points", &["id", "x", "y", "snapped_x", "snapped_y", "snap_distance_m"]);
    for p in &report.pour_points {
        t.push_row(row![
            p.id.as_str(),
            p.original.x(),
            p.original.y(),
            p.snapped.x(),
            p.snapped.y(),
            p.distance_m,
        ])?;
    }
    Ok(t)
}

/// All tables keyed by name, plus run-level values.
pub fn summary_json(report: &BasinReport, config: &AnalysisConfig) -> Result<Value> {
    let mut root = Map::new();
    root.insert("gumbel_alpha".into(), Value::from(report.gumbel.alpha));
    root.insert("gumbel_location".into(), Value::from(report.gumbel.location));
    root.insert(
        "soil_loss_p95".into(),
        report.loss_p95.map_or(Value::Null, Value::from),
    );
    root.insert("unassigned_segments".into(), Value::from(report.unassigned_segments));
    if let Some(p) = &report.prioritization {
        root.insert("kendall_tau".into(), p.kendall_tau.map_or(Value::Null, Value::from));
        let weights: Map<String, Value> = p
            .criteria
            .iter()
            .zip(&p.entropy_weights)
            .map(|(c, w)| (c.name.to_string(), Value::from(*w)))
            .collect();
        root.insert("entropy_weights".into(), Value::Object(weights));
    }
    for t in tables(report, config)? {
        root.insert(t.name.clone(), t.to_json());
    }
    Ok(Value::Object(root))
}

/// Write CSV tables, `summary.json` and the derived rasters into `dir`.
///
/// Returns the paths written.
pub fn write_outputs(report: &BasinReport, config: &AnalysisConfig, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let mut all = tables(report, config)?;
    all.push(hydrograph_series_table(report, config)?);
    for t in &all {
        let path = dir.join(format!("{}.csv", t.name));
        t.save_csv(&path)?;
        written.push(path);
    }

    let path = dir.join("summary.json");
    fs::write(&path, serde_json::to_string_pretty(&summary_json(report, config)?)?)?;
    written.push(path);

    let r = &report.rasters;
    let rasters: [(&str, &Raster<f64>); 16] = [
        ("slope", &r.slope),
        ("tri", &r.tri),
        ("twi", &r.twi),
        ("spi", &r.spi),
        ("sti", &r.sti),
        ("curve_number", &r.curve_number),
        ("rusle_r", &r.rusle.r),
        ("rusle_k", &r.rusle.k),
        ("rusle_ls", &r.rusle.ls),
        ("rusle_c", &r.rusle.c),
        ("rusle_p", &r.rusle.p),
        ("soil_loss", &r.rusle.soil_loss),
        ("percolation", &r.percolation),
        ("contour_trench", &r.contour_trench),
        ("segment_sl", &r.segment_sl),
        ("segment_spi", &r.segment_spi),
    ];
    for (name, raster) in rasters {
        let path = dir.join(format!("{name}.tif"));
        write_geotiff(raster, &path)?;
        written.push(path);
    }
    let path = dir.join("zones.tif");
    write_geotiff(&r.zones, &path)?;
    written.push(path);

    info!("Wrote {} files to {}", written.len(), dir.display());
    Ok(written)
}
