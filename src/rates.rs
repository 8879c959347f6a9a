//! Crude death-rate computation per age class
//!
//! Foundation for everything downstream: joins a deaths table and a
//! population table on age class and computes the raw rate per 100 000.

use crate::error::{AnalysisError, Result};
use crate::table::{join_on_age, AgeKeyed, DeathsRow, PopulationRow};

/// Scale factor between per-person rates and reported rates
pub const PER_100K: f64 = 100_000.0;

/// Deaths, population and crude rate for one age class
///
/// `rate_per_100k` is `None` where the population is zero: the rate is
/// undefined there and must not be folded into downstream sums as a
/// sentinel value.
#[derive(Debug, Clone)]
pub struct RateRow {
    pub age_class: String,
    pub deaths: u64,
    pub population: u64,
    pub rate_per_100k: Option<f64>,
}

impl AgeKeyed for RateRow {
    fn age_class(&self) -> &str {
        &self.age_class
    }
}

/// Join deaths and population on age class and compute crude rates
///
/// A missing death count means zero deaths, not missing data. Postconditions
/// checked per row: deaths never exceed the population, and every computed
/// rate is finite and non-negative; a violation means the upstream data is
/// corrupt and fails the run.
pub fn death_rates(deaths: &[DeathsRow], population: &[PopulationRow]) -> Result<Vec<RateRow>> {
    let joined = join_on_age(deaths, population, "deaths", "population")?;

    let mut rows = Vec::with_capacity(joined.len());
    for (death_row, pop_row) in joined {
        let deaths = death_row.deaths.unwrap_or(0);
        if deaths > pop_row.population {
            return Err(AnalysisError::DataIntegrity(format!(
                "age class {:?}: {} deaths exceed population {}",
                death_row.age_class, deaths, pop_row.population
            )));
        }

        let rate_per_100k = if pop_row.population > 0 {
            Some(deaths as f64 / pop_row.population as f64 * PER_100K)
        } else {
            None
        };
        if let Some(rate) = rate_per_100k {
            if !rate.is_finite() || rate < 0.0 {
                return Err(AnalysisError::DataIntegrity(format!(
                    "age class {:?}: invalid crude rate {}",
                    death_row.age_class, rate
                )));
            }
        }

        rows.push(RateRow {
            age_class: death_row.age_class.clone(),
            deaths,
            population: pop_row.population,
            rate_per_100k,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deaths(rows: &[(&str, Option<u64>)]) -> Vec<DeathsRow> {
        rows.iter()
            .map(|&(age, d)| DeathsRow {
                age_class: age.to_string(),
                deaths: d,
            })
            .collect()
    }

    fn population(rows: &[(&str, u64)]) -> Vec<PopulationRow> {
        rows.iter()
            .map(|&(age, p)| PopulationRow {
                age_class: age.to_string(),
                population: p,
            })
            .collect()
    }

    #[test]
    fn test_rate_per_100k() {
        let rates = death_rates(
            &deaths(&[("0-64", Some(10)), ("65+", Some(90))]),
            &population(&[("0-64", 100_000), ("65+", 50_000)]),
        )
        .unwrap();

        assert_eq!(rates[0].deaths, 10);
        assert!((rates[0].rate_per_100k.unwrap() - 10.0).abs() < 1e-9);
        assert!((rates[1].rate_per_100k.unwrap() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_deaths_default_to_zero() {
        let rates = death_rates(
            &deaths(&[("0-64", None)]),
            &population(&[("0-64", 100_000)]),
        )
        .unwrap();

        assert_eq!(rates[0].deaths, 0);
        assert_eq!(rates[0].rate_per_100k, Some(0.0));
    }

    #[test]
    fn test_zero_population_yields_missing_rate() {
        let rates = death_rates(&deaths(&[("95+", Some(0))]), &population(&[("95+", 0)])).unwrap();
        assert_eq!(rates[0].rate_per_100k, None);
    }

    #[test]
    fn test_deaths_exceeding_population_fail() {
        let err = death_rates(&deaths(&[("95+", Some(60))]), &population(&[("95+", 50)]))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::DataIntegrity(_)));
    }

    #[test]
    fn test_age_mismatch_propagates() {
        let err = death_rates(
            &deaths(&[("0-64", Some(1))]),
            &population(&[("65+", 100)]),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::AgeMismatch { .. }));
    }
}
