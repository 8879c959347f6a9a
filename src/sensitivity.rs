//! Sensitivity analysis: the regional aggregate with the national subset removed
//!
//! Tests whether including the national population inside the regional
//! aggregate distorts the comparison: deaths and population of the national
//! population are subtracted out per age class and the crude/standardized
//! summary is recomputed on the remainder.

use crate::error::{AnalysisError, Result};
use crate::rates::PER_100K;
use crate::standardize::{population_summary, AgeContribution, PopulationSummary};
use crate::stratum::Stratum;
use crate::table::{join_on_age, DeathsRow, PopulationRow, StandardPopulationRow};

/// The regional-minus-national aggregate for one age class
#[derive(Debug, Clone)]
pub struct AdjustedRow {
    pub age_class: String,
    pub deaths: u64,
    pub population: u64,
    pub rate_per_100k: Option<f64>,
    pub expected_deaths: Option<f64>,
    pub std_population: f64,
}

/// Sensitivity result row for one stratum
#[derive(Debug, Clone)]
pub struct SensitivityRates {
    pub stratum: Stratum,
    /// Summary of the regional aggregate with the national subset removed
    pub adjusted: PopulationSummary,
}

/// Subtract the national population's deaths and totals from the regional
/// aggregate per age class, then compute raw rates and expected deaths on
/// the standard population for the remainder
///
/// The national population must be a true subset of the regional aggregate
/// at every age class: a negative difference in either deaths or population
/// is a [`AnalysisError::SubsetViolation`].
pub fn adjusted_aggregate(
    national_deaths: &[DeathsRow],
    national_population: &[PopulationRow],
    regional_deaths: &[DeathsRow],
    regional_population: &[PopulationRow],
    std_population: &[StandardPopulationRow],
) -> Result<Vec<AdjustedRow>> {
    // All four joins are keyed in national-deaths row order, so they align.
    let national = join_on_age(
        national_deaths,
        national_population,
        "national deaths",
        "national population",
    )?;
    let deaths_pairs = join_on_age(
        national_deaths,
        regional_deaths,
        "national deaths",
        "regional deaths",
    )?;
    let population_pairs = join_on_age(
        national_deaths,
        regional_population,
        "national deaths",
        "regional population",
    )?;
    let std_pairs = join_on_age(
        national_deaths,
        std_population,
        "national deaths",
        "standard population",
    )?;

    let mut rows = Vec::with_capacity(national.len());
    for (i, &(national_death_row, national_pop_row)) in national.iter().enumerate() {
        let age_class = national_death_row.age_class.as_str();
        let regional_death_row = deaths_pairs[i].1;
        let regional_pop_row = population_pairs[i].1;
        let std_row = std_pairs[i].1;

        let national_count = national_death_row.deaths.unwrap_or(0);
        let regional_count = regional_death_row.deaths.unwrap_or(0);
        let deaths = regional_count.checked_sub(national_count).ok_or_else(|| {
            AnalysisError::SubsetViolation {
                age_class: age_class.to_string(),
                detail: format!(
                    "national deaths {national_count} exceed regional deaths {regional_count}"
                ),
            }
        })?;
        let population = regional_pop_row
            .population
            .checked_sub(national_pop_row.population)
            .ok_or_else(|| AnalysisError::SubsetViolation {
                age_class: age_class.to_string(),
                detail: format!(
                    "national population {} exceeds regional population {}",
                    national_pop_row.population, regional_pop_row.population
                ),
            })?;
        if deaths > population {
            return Err(AnalysisError::DataIntegrity(format!(
                "age class {age_class:?}: {deaths} adjusted deaths exceed adjusted population {population}"
            )));
        }

        let rate_per_100k = if population > 0 {
            Some(deaths as f64 / population as f64 * PER_100K)
        } else {
            None
        };
        let expected_deaths = rate_per_100k.map(|rate| rate / PER_100K * std_row.std_population);

        rows.push(AdjustedRow {
            age_class: age_class.to_string(),
            deaths,
            population,
            rate_per_100k,
            expected_deaths,
            std_population: std_row.std_population,
        });
    }

    Ok(rows)
}

/// Aggregate the adjusted table to one sensitivity result row
///
/// Same crude/standardized/CI logic as the main standardization summary,
/// applied to the adjusted aggregate alone.
pub fn summarize_adjusted(
    adjusted: &[AdjustedRow],
    stratum: Stratum,
    alpha: f64,
) -> Result<SensitivityRates> {
    let rows: Vec<AgeContribution> = adjusted
        .iter()
        .map(|row| AgeContribution {
            deaths: row.deaths,
            population: row.population,
            expected_deaths: row.expected_deaths,
            std_population: row.std_population,
        })
        .collect();

    Ok(SensitivityRates {
        stratum,
        adjusted: population_summary(&rows, "regional-minus-national", stratum, alpha)?,
    })
}
