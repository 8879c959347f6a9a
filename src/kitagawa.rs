//! Kitagawa decomposition of the crude-rate gap
//!
//! Splits the national-minus-regional crude rate difference per age class
//! into a structure effect (differing age mixes) and a rate effect
//! (differing age-specific risks), using the symmetric average-weighted
//! two-factor decomposition so that neither population serves as the
//! reference.

use crate::error::{AnalysisError, Result};
use crate::rates::{RateRow, PER_100K};
use crate::stratum::Stratum;
use crate::table::join_on_age;

/// Per-age-class decomposition effects, in per-person rate units
///
/// Effects are `None` where an age-specific rate is undefined (zero
/// population); such classes contribute nothing to the aggregate.
#[derive(Debug, Clone)]
pub struct KitagawaRow {
    pub age_class: String,
    pub structure_effect: Option<f64>,
    pub rate_effect: Option<f64>,
}

/// Aggregated decomposition for one stratum, per 100k
#[derive(Debug, Clone)]
pub struct KitagawaResult {
    pub stratum: Stratum,
    pub structure_effect: f64,
    pub rate_effect: f64,
    /// `structure_effect + rate_effect`; equals the crude rate gap
    /// `national - regional`
    pub difference: f64,
}

/// Decompose the rate gap per age class
///
/// Population-mix shares and per-person rates are computed from the joined
/// rate tables; per class:
/// `structure = (share_nat - share_reg) * (rate_nat + rate_reg) / 2`,
/// `rate = (rate_nat - rate_reg) * (share_nat + share_reg) / 2`.
pub fn decompose(national: &[RateRow], regional: &[RateRow]) -> Result<Vec<KitagawaRow>> {
    let pairs = join_on_age(national, regional, "national rates", "regional rates")?;

    let national_total: u64 = national.iter().map(|r| r.population).sum();
    let regional_total: u64 = regional.iter().map(|r| r.population).sum();
    if national_total == 0 {
        return Err(AnalysisError::ZeroPopulation {
            population: "national".to_string(),
            context: "population shares for the decomposition".to_string(),
        });
    }
    if regional_total == 0 {
        return Err(AnalysisError::ZeroPopulation {
            population: "regional".to_string(),
            context: "population shares for the decomposition".to_string(),
        });
    }

    let rows = pairs
        .iter()
        .map(|&(nat, reg)| {
            let share_national = nat.population as f64 / national_total as f64;
            let share_regional = reg.population as f64 / regional_total as f64;
            let rate_national =
                (nat.population > 0).then(|| nat.deaths as f64 / nat.population as f64);
            let rate_regional =
                (reg.population > 0).then(|| reg.deaths as f64 / reg.population as f64);

            let (structure_effect, rate_effect) = match (rate_national, rate_regional) {
                (Some(rate_nat), Some(rate_reg)) => (
                    Some((share_national - share_regional) * (rate_nat + rate_reg) / 2.0),
                    Some((rate_nat - rate_reg) * (share_national + share_regional) / 2.0),
                ),
                _ => (None, None),
            };

            KitagawaRow {
                age_class: nat.age_class.clone(),
                structure_effect,
                rate_effect,
            }
        })
        .collect();

    Ok(rows)
}

/// Sum the per-class effects and scale to per 100k
pub fn summarize_decomposition(rows: &[KitagawaRow], stratum: Stratum) -> KitagawaResult {
    let structure_effect: f64 =
        rows.iter().filter_map(|r| r.structure_effect).sum::<f64>() * PER_100K;
    let rate_effect: f64 = rows.iter().filter_map(|r| r.rate_effect).sum::<f64>() * PER_100K;

    KitagawaResult {
        stratum,
        structure_effect,
        rate_effect,
        difference: structure_effect + rate_effect,
    }
}
