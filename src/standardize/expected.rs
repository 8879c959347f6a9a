//! Expected deaths on the standard population
//!
//! Three-way join of the two rate tables and the standard population: per
//! age class and per population, the number of deaths that population would
//! produce if it had the standard population's size in that class.

use crate::error::Result;
use crate::rates::{RateRow, PER_100K};
use crate::table::{join_on_age, StandardPopulationRow};

/// One population's contribution to an age class of the expected table
#[derive(Debug, Clone)]
pub struct ExpectedSide {
    pub deaths: u64,
    pub population: u64,
    pub rate_per_100k: Option<f64>,
    /// Deaths this population would produce in the standard population,
    /// `None` where the age-specific rate is undefined
    pub expected_deaths: Option<f64>,
    /// Expected deaths divided by the standard population of the class
    /// (the age-profile quantity consumed by reporting)
    pub std_ratio: Option<f64>,
}

/// Expected deaths for one age class, both populations side by side
#[derive(Debug, Clone)]
pub struct ExpectedRow {
    pub age_class: String,
    pub national: ExpectedSide,
    pub regional: ExpectedSide,
    pub std_population: f64,
}

fn expected_side(rate: &RateRow, std_population: f64) -> ExpectedSide {
    let expected_deaths = rate
        .rate_per_100k
        .map(|rate| rate / PER_100K * std_population);
    let std_ratio = expected_deaths.map(|expected| expected / std_population);

    ExpectedSide {
        deaths: rate.deaths,
        population: rate.population,
        rate_per_100k: rate.rate_per_100k,
        expected_deaths,
        std_ratio,
    }
}

/// Join both rate tables with the standard population and compute expected
/// deaths per age class
///
/// All three age-class sets must coincide.
pub fn expected_deaths(
    national: &[RateRow],
    regional: &[RateRow],
    std_population: &[StandardPopulationRow],
) -> Result<Vec<ExpectedRow>> {
    let pairs = join_on_age(national, regional, "national rates", "regional rates")?;
    let with_std = join_on_age(national, std_population, "national rates", "standard population")?;

    // Both joins are keyed in national-rate row order, so they align.
    let rows = pairs
        .iter()
        .zip(with_std.iter())
        .map(|(&(nat, reg), &(_, std_row))| ExpectedRow {
            age_class: nat.age_class.clone(),
            national: expected_side(nat, std_row.std_population),
            regional: expected_side(reg, std_row.std_population),
            std_population: std_row.std_population,
        })
        .collect();

    Ok(rows)
}
