//! Per-stratum aggregation of expected-deaths tables into rate summaries

use super::ci::{fay_feuer_interval, poisson_interval};
use super::expected::{ExpectedRow, ExpectedSide};
use crate::error::{AnalysisError, Result};
use crate::rates::PER_100K;
use crate::stratum::Stratum;

/// A rate with its two-sided confidence interval, per 100k
#[derive(Debug, Clone, Copy)]
pub struct RateCi {
    pub rate: f64,
    pub lower: f64,
    pub upper: f64,
}

impl RateCi {
    /// Build a rate/CI triple, enforcing the postconditions: the rate is
    /// finite and non-negative and the bounds bracket it
    fn checked(rate: f64, lower: f64, upper: f64, context: &str) -> Result<Self> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(AnalysisError::DataIntegrity(format!(
                "{context}: invalid rate {rate}"
            )));
        }
        let slack = 1e-9 * rate.abs().max(1.0);
        if lower > rate + slack || upper < rate - slack {
            return Err(AnalysisError::DataIntegrity(format!(
                "{context}: confidence bounds [{lower}, {upper}] do not bracket rate {rate}"
            )));
        }
        Ok(Self { rate, lower, upper })
    }
}

/// Crude and standardized rates for one population in one stratum
#[derive(Debug, Clone, Copy)]
pub struct PopulationSummary {
    pub crude: RateCi,
    pub standardized: RateCi,
}

/// One result row: both populations' summaries for a stratum
#[derive(Debug, Clone)]
pub struct StandardizedRates {
    pub stratum: Stratum,
    pub national: PopulationSummary,
    pub regional: PopulationSummary,
}

/// One age class's contribution to a population's summary
///
/// The view shared by the standardization and sensitivity engines: deaths
/// and population for the crude side, expected deaths and standard weight
/// for the standardized side.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AgeContribution {
    pub deaths: u64,
    pub population: u64,
    pub expected_deaths: Option<f64>,
    pub std_population: f64,
}

impl AgeContribution {
    pub(crate) fn from_side(side: &ExpectedSide, std_population: f64) -> Self {
        Self {
            deaths: side.deaths,
            population: side.population,
            expected_deaths: side.expected_deaths,
            std_population,
        }
    }
}

/// Fay-Feuer effective shape parameter over the age classes
///
/// All rates are per-person here; classes with zero population carry no
/// information and are excluded from both sums.
fn fay_feuer_k(rows: &[AgeContribution], std_total: f64) -> f64 {
    let mut weighted_rate = 0.0;
    let mut variance_term = 0.0;
    for row in rows {
        if row.population == 0 {
            continue;
        }
        let weight = row.std_population / std_total;
        let population = row.population as f64;
        let deaths = row.deaths as f64;
        weighted_rate += weight * (deaths / population);
        variance_term += weight * weight * deaths / (population * population);
    }

    if variance_term > 0.0 {
        weighted_rate * weighted_rate / variance_term
    } else {
        0.0
    }
}

/// Aggregate one population's age-class contributions into crude and
/// standardized rates with confidence intervals
pub(crate) fn population_summary(
    rows: &[AgeContribution],
    label: &str,
    stratum: Stratum,
    alpha: f64,
) -> Result<PopulationSummary> {
    let deaths_total: u64 = rows.iter().map(|r| r.deaths).sum();
    let population_total: u64 = rows.iter().map(|r| r.population).sum();
    if population_total == 0 {
        return Err(AnalysisError::ZeroPopulation {
            population: label.to_string(),
            context: format!("crude rate for {stratum}"),
        });
    }

    let population = population_total as f64;
    let crude_rate = deaths_total as f64 / population * PER_100K;
    let (crude_lower, crude_upper) = poisson_interval(deaths_total, population, alpha)?;
    let crude = RateCi::checked(
        crude_rate,
        crude_lower,
        crude_upper,
        &format!("crude {label} rate for {stratum}"),
    )?;

    let std_total: f64 = rows.iter().map(|r| r.std_population).sum();
    if std_total <= 0.0 {
        return Err(AnalysisError::ZeroPopulation {
            population: "standard".to_string(),
            context: format!("standardized {label} rate for {stratum}"),
        });
    }

    let expected_total: f64 = rows.iter().filter_map(|r| r.expected_deaths).sum();
    let rate_per_person = expected_total / std_total;
    let k = fay_feuer_k(rows, std_total);
    let (std_lower, std_upper) = fay_feuer_interval(rate_per_person, k, alpha)?;
    let standardized = RateCi::checked(
        rate_per_person * PER_100K,
        std_lower,
        std_upper,
        &format!("standardized {label} rate for {stratum}"),
    )?;

    Ok(PopulationSummary {
        crude,
        standardized,
    })
}

/// Aggregate an expected-deaths table to one result row for the stratum
///
/// Applied independently per stratum; results stack into one table with no
/// cross-stratum computation.
pub fn summarize(
    expected: &[ExpectedRow],
    stratum: Stratum,
    alpha: f64,
) -> Result<StandardizedRates> {
    let national: Vec<AgeContribution> = expected
        .iter()
        .map(|row| AgeContribution::from_side(&row.national, row.std_population))
        .collect();
    let regional: Vec<AgeContribution> = expected
        .iter()
        .map(|row| AgeContribution::from_side(&row.regional, row.std_population))
        .collect();

    Ok(StandardizedRates {
        stratum,
        national: population_summary(&national, "national", stratum, alpha)?,
        regional: population_summary(&regional, "regional", stratum, alpha)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::death_rates;
    use crate::standardize::{expected_deaths, DEFAULT_ALPHA};
    use crate::stratum::Sex;
    use crate::table::{DeathsRow, PopulationRow, StandardPopulationRow};
    use approx::assert_relative_eq;

    fn deaths(rows: &[(&str, u64)]) -> Vec<DeathsRow> {
        rows.iter()
            .map(|&(age, d)| DeathsRow {
                age_class: age.to_string(),
                deaths: Some(d),
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

    fn std_pop(rows: &[(&str, f64)]) -> Vec<StandardPopulationRow> {
        rows.iter()
            .map(|&(age, std_population)| StandardPopulationRow {
                age_class: age.to_string(),
                std_population,
            })
            .collect()
    }

    fn stratum() -> Stratum {
        Stratum::new(2020, Sex::Total)
    }

    /// Two age classes with identical age-specific rates and identical age
    /// mixes; only the population sizes differ.
    fn reference_scenario() -> Vec<ExpectedRow> {
        let national = death_rates(
            &deaths(&[("0-64", 10), ("65+", 90)]),
            &population(&[("0-64", 100_000), ("65+", 50_000)]),
        )
        .unwrap();
        let regional = death_rates(
            &deaths(&[("0-64", 20), ("65+", 180)]),
            &population(&[("0-64", 200_000), ("65+", 100_000)]),
        )
        .unwrap();
        let std_population = std_pop(&[("0-64", 70_000.0), ("65+", 30_000.0)]);
        expected_deaths(&national, &regional, &std_population).unwrap()
    }

    #[test]
    fn test_equal_rates_give_equal_crude_and_standardized() {
        let result = summarize(&reference_scenario(), stratum(), DEFAULT_ALPHA).unwrap();

        // Both crude rates are 100 deaths per 150k population (scaled 2x).
        assert_relative_eq!(result.national.crude.rate, 100.0 / 150_000.0 * PER_100K, epsilon = 1e-9);
        assert_relative_eq!(
            result.national.crude.rate,
            result.regional.crude.rate,
            epsilon = 1e-9
        );

        // Identical age-specific rates: standardized rates coincide too.
        // 0.7 * 1e-4 + 0.3 * 1.8e-3 = 6.1e-4 per person.
        assert_relative_eq!(result.national.standardized.rate, 61.0, epsilon = 1e-9);
        assert_relative_eq!(
            result.national.standardized.rate,
            result.regional.standardized.rate,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_confidence_bounds_bracket_rates() {
        let result = summarize(&reference_scenario(), stratum(), DEFAULT_ALPHA).unwrap();

        for summary in [result.national, result.regional] {
            assert!(summary.crude.lower <= summary.crude.rate);
            assert!(summary.crude.rate <= summary.crude.upper);
            assert!(summary.standardized.lower <= summary.standardized.rate);
            assert!(summary.standardized.rate <= summary.standardized.upper);
            assert!(summary.crude.lower >= 0.0);
            assert!(summary.standardized.lower >= 0.0);
        }
    }

    #[test]
    fn test_single_class_k_equals_death_count() {
        let rows = [AgeContribution {
            deaths: 25,
            population: 1_000,
            expected_deaths: Some(2.5),
            std_population: 100.0,
        }];
        assert_relative_eq!(fay_feuer_k(&rows, 100.0), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_deaths_degenerate_interval() {
        let national = death_rates(&deaths(&[("0-64", 0)]), &population(&[("0-64", 50_000)])).unwrap();
        let regional = death_rates(&deaths(&[("0-64", 0)]), &population(&[("0-64", 80_000)])).unwrap();
        let std_population = std_pop(&[("0-64", 100_000.0)]);
        let expected = expected_deaths(&national, &regional, &std_population).unwrap();

        let result = summarize(&expected, stratum(), DEFAULT_ALPHA).unwrap();

        // Crude: lower bound exactly 0 when no deaths were observed.
        assert_eq!(result.national.crude.rate, 0.0);
        assert_eq!(result.national.crude.lower, 0.0);
        assert!(result.national.crude.upper > 0.0);

        // Standardized: k = 0, both bounds collapse to exactly 0.
        assert_eq!(result.national.standardized.rate, 0.0);
        assert_eq!(result.national.standardized.lower, 0.0);
        assert_eq!(result.national.standardized.upper, 0.0);
    }

    #[test]
    fn test_zero_population_sum_fails() {
        let national = death_rates(&deaths(&[("0-64", 0)]), &population(&[("0-64", 0)])).unwrap();
        let regional = death_rates(&deaths(&[("0-64", 5)]), &population(&[("0-64", 1_000)])).unwrap();
        let std_population = std_pop(&[("0-64", 100_000.0)]);
        let expected = expected_deaths(&national, &regional, &std_population).unwrap();

        let err = summarize(&expected, stratum(), DEFAULT_ALPHA).unwrap_err();
        assert!(matches!(err, AnalysisError::ZeroPopulation { .. }));
        assert!(err.to_string().contains("2020 Total"));
    }

    #[test]
    fn test_zero_population_class_excluded_from_k() {
        let rows = [
            AgeContribution {
                deaths: 25,
                population: 1_000,
                expected_deaths: Some(2.5),
                std_population: 100.0,
            },
            AgeContribution {
                deaths: 0,
                population: 0,
                expected_deaths: None,
                std_population: 50.0,
            },
        ];
        // The zero-population class changes the weights but adds no terms.
        let k = fay_feuer_k(&rows, 150.0);
        assert_relative_eq!(k, 25.0, epsilon = 1e-9);
    }
}
