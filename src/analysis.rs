//! Analysis runner: the full pipeline over all (year, sex) strata
//!
//! Each stratum is independent, so the per-stratum pipelines run in
//! parallel; any integrity violation fails the whole run, tagged with the
//! stratum that was being computed.

use log::{debug, info};
use rayon::prelude::*;

use crate::error::{AnalysisError, Result};
use crate::kitagawa::{decompose, summarize_decomposition, KitagawaResult};
use crate::rates::death_rates;
use crate::sensitivity::{adjusted_aggregate, summarize_adjusted, SensitivityRates};
use crate::standardize::{
    expected_deaths, summarize, ExpectedRow, StandardizedRates, DEFAULT_ALPHA,
};
use crate::stratum::{Sex, Stratum};
use crate::table::{DeathsRow, PopulationRow, StandardPopulationRow};

/// All inputs for one (year, sex) stratum
#[derive(Debug, Clone)]
pub struct StratumInputs {
    pub stratum: Stratum,
    pub national_deaths: Vec<DeathsRow>,
    pub national_population: Vec<PopulationRow>,
    pub regional_deaths: Vec<DeathsRow>,
    pub regional_population: Vec<PopulationRow>,
}

/// Per-age-class expected-deaths table kept for age-distribution reporting
#[derive(Debug, Clone)]
pub struct AgeProfile {
    pub stratum: Stratum,
    pub rows: Vec<ExpectedRow>,
}

/// All result tables of one run
#[derive(Debug, Clone)]
pub struct AnalysisResults {
    pub rates: Vec<StandardizedRates>,
    pub sensitivity: Vec<SensitivityRates>,
    pub kitagawa: Vec<KitagawaResult>,
    /// Expected tables for the Total-sex strata only
    pub age_profiles: Vec<AgeProfile>,
}

struct StratumOutput {
    expected: Vec<ExpectedRow>,
    rates: StandardizedRates,
    sensitivity: SensitivityRates,
    kitagawa: KitagawaResult,
}

/// Runs the full per-stratum pipeline against a shared standard population
#[derive(Debug, Clone)]
pub struct AnalysisRunner {
    std_population: Vec<StandardPopulationRow>,
    alpha: f64,
}

impl AnalysisRunner {
    /// Create a runner with 95% confidence intervals
    pub fn new(std_population: Vec<StandardPopulationRow>) -> Self {
        Self::with_alpha(std_population, DEFAULT_ALPHA)
    }

    /// Create a runner with a custom two-sided significance level
    pub fn with_alpha(std_population: Vec<StandardPopulationRow>, alpha: f64) -> Self {
        Self {
            std_population,
            alpha,
        }
    }

    /// Run every stratum and collect the stacked result tables
    ///
    /// Strata are processed in parallel; results keep the input order.
    pub fn run(&self, strata: &[StratumInputs]) -> Result<AnalysisResults> {
        info!("running {} strata", strata.len());

        let outputs: Vec<StratumOutput> = strata
            .par_iter()
            .map(|inputs| {
                self.run_stratum(inputs)
                    .map_err(|e| AnalysisError::in_stratum(inputs.stratum, e))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut results = AnalysisResults {
            rates: Vec::with_capacity(outputs.len()),
            sensitivity: Vec::with_capacity(outputs.len()),
            kitagawa: Vec::with_capacity(outputs.len()),
            age_profiles: Vec::new(),
        };
        for (inputs, output) in strata.iter().zip(outputs) {
            results.rates.push(output.rates);
            results.sensitivity.push(output.sensitivity);
            results.kitagawa.push(output.kitagawa);
            if inputs.stratum.sex == Sex::Total {
                results.age_profiles.push(AgeProfile {
                    stratum: inputs.stratum,
                    rows: output.expected,
                });
            }
        }
        Ok(results)
    }

    fn run_stratum(&self, inputs: &StratumInputs) -> Result<StratumOutput> {
        debug!("computing stratum {}", inputs.stratum);

        let national = death_rates(&inputs.national_deaths, &inputs.national_population)?;
        let regional = death_rates(&inputs.regional_deaths, &inputs.regional_population)?;

        let expected = expected_deaths(&national, &regional, &self.std_population)?;
        let rates = summarize(&expected, inputs.stratum, self.alpha)?;

        let adjusted = adjusted_aggregate(
            &inputs.national_deaths,
            &inputs.national_population,
            &inputs.regional_deaths,
            &inputs.regional_population,
            &self.std_population,
        )?;
        let sensitivity = summarize_adjusted(&adjusted, inputs.stratum, self.alpha)?;

        let decomposition = decompose(&national, &regional)?;
        let kitagawa = summarize_decomposition(&decomposition, inputs.stratum);

        Ok(StratumOutput {
            expected,
            rates,
            sensitivity,
            kitagawa,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn std_population() -> Vec<StandardPopulationRow> {
        [("0-64", 70_000.0), ("65+", 30_000.0)]
            .iter()
            .map(|&(age, std_population)| StandardPopulationRow {
                age_class: age.to_string(),
                std_population,
            })
            .collect()
    }

    fn stratum_inputs(stratum: Stratum) -> StratumInputs {
        StratumInputs {
            stratum,
            national_deaths: deaths(&[("0-64", 50), ("65+", 150)]),
            national_population: population(&[("0-64", 90_000), ("65+", 10_000)]),
            regional_deaths: deaths(&[("0-64", 300), ("65+", 2_000)]),
            regional_population: population(&[("0-64", 500_000), ("65+", 150_000)]),
        }
    }

    #[test]
    fn test_run_collects_all_result_tables() {
        let runner = AnalysisRunner::new(std_population());
        let strata = vec![
            stratum_inputs(Stratum::new(2020, Sex::Total)),
            stratum_inputs(Stratum::new(2020, Sex::Male)),
            stratum_inputs(Stratum::new(2021, Sex::Total)),
        ];

        let results = runner.run(&strata).unwrap();
        assert_eq!(results.rates.len(), 3);
        assert_eq!(results.sensitivity.len(), 3);
        assert_eq!(results.kitagawa.len(), 3);
        // Age profiles only for the Total strata, in input order.
        assert_eq!(results.age_profiles.len(), 2);
        assert_eq!(results.age_profiles[0].stratum.year, 2020);
        assert_eq!(results.age_profiles[1].stratum.year, 2021);
        assert_eq!(results.rates[1].stratum.sex, Sex::Male);
    }

    #[test]
    fn test_kitagawa_difference_matches_crude_gap_per_stratum() {
        let runner = AnalysisRunner::new(std_population());
        let strata = vec![stratum_inputs(Stratum::new(2022, Sex::Female))];

        let results = runner.run(&strata).unwrap();
        let rates = &results.rates[0];
        let kitagawa = &results.kitagawa[0];
        assert_relative_eq!(
            kitagawa.difference,
            rates.national.crude.rate - rates.regional.crude.rate,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_failing_stratum_is_named() {
        let runner = AnalysisRunner::new(std_population());
        // National deaths exceed the regional aggregate in 65+.
        let mut inputs = stratum_inputs(Stratum::new(2021, Sex::Male));
        inputs.regional_deaths = deaths(&[("0-64", 300), ("65+", 100)]);

        let err = runner.run(&[inputs]).unwrap_err();
        assert!(matches!(err, AnalysisError::InStratum { .. }));
        let message = err.to_string();
        assert!(message.contains("2021 Male"));
    }
}
