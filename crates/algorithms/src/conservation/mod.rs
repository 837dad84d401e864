//! Soil and water conservation planning
//!
//! - **check_dam**: check-dam suitability index per stream segment
//! - **harvesting**: recharge and contour-trench rasters, harvesting potential,
//!   dam counts and SWC priority per subbasin

mod check_dam;
mod harvesting;

pub use check_dam::{
    area_score, check_dam_suitability, erosion_score, mean_positive_within, order_score, slope_score,
    valley_score, CheckDamSite, FactorScores, SuitabilityClass,
};
pub use harvesting::{
    check_dam_count, conservation_summary, contour_trench_suitability, percolation_potential,
    water_harvesting_potential, ConservationSummary, SwcPriority,
};
