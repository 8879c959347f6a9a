//! Age-class keyed tables and the equi-join primitive shared by all engines
//!
//! Every input and intermediate table in the pipeline is a list of rows keyed
//! by age class (a fixed ordered categorical axis, e.g. "0", "1-4", ...,
//! "95+"). Tables are only ever combined through [`join_on_age`], which
//! requires the two age-class sets to be identical; a mismatch is a fatal
//! input error, never a silent partial join.

use std::collections::{HashMap, HashSet};

use crate::error::{AnalysisError, Result};

/// A row keyed by age class
pub trait AgeKeyed {
    fn age_class(&self) -> &str;
}

/// Death count for one age class; `None` means no recorded count
/// (treated as zero deaths at rate computation, not as missing data)
#[derive(Debug, Clone)]
pub struct DeathsRow {
    pub age_class: String,
    pub deaths: Option<u64>,
}

/// Population count for one age class
#[derive(Debug, Clone)]
pub struct PopulationRow {
    pub age_class: String,
    pub population: u64,
}

/// Standard reference population weight for one age class
///
/// Loaded once per run; the loader rejects zero or negative weights.
#[derive(Debug, Clone)]
pub struct StandardPopulationRow {
    pub age_class: String,
    pub std_population: f64,
}

impl AgeKeyed for DeathsRow {
    fn age_class(&self) -> &str {
        &self.age_class
    }
}

impl AgeKeyed for PopulationRow {
    fn age_class(&self) -> &str {
        &self.age_class
    }
}

impl AgeKeyed for StandardPopulationRow {
    fn age_class(&self) -> &str {
        &self.age_class
    }
}

/// Equi-join two tables on age class
///
/// Requires identical age-class sets on both sides and no duplicate keys on
/// either; output pairs preserve `left` row order. The table names are used
/// in error messages only.
pub fn join_on_age<'a, L, R>(
    left: &'a [L],
    right: &'a [R],
    left_name: &str,
    right_name: &str,
) -> Result<Vec<(&'a L, &'a R)>>
where
    L: AgeKeyed,
    R: AgeKeyed,
{
    let mut index: HashMap<&str, &R> = HashMap::with_capacity(right.len());
    for row in right {
        if index.insert(row.age_class(), row).is_some() {
            return Err(AnalysisError::AgeMismatch {
                left: left_name.to_string(),
                right: right_name.to_string(),
                detail: format!("duplicate age class {:?} in {}", row.age_class(), right_name),
            });
        }
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(left.len());
    let mut joined = Vec::with_capacity(left.len());
    for row in left {
        if !seen.insert(row.age_class()) {
            return Err(AnalysisError::AgeMismatch {
                left: left_name.to_string(),
                right: right_name.to_string(),
                detail: format!("duplicate age class {:?} in {}", row.age_class(), left_name),
            });
        }
        match index.get(row.age_class()) {
            Some(matched) => joined.push((row, *matched)),
            None => {
                return Err(AnalysisError::AgeMismatch {
                    left: left_name.to_string(),
                    right: right_name.to_string(),
                    detail: format!(
                        "age class {:?} is missing from {}",
                        row.age_class(),
                        right_name
                    ),
                })
            }
        }
    }

    if joined.len() != right.len() {
        let mut extra: Vec<&str> = index
            .keys()
            .copied()
            .filter(|age| !seen.contains(age))
            .collect();
        extra.sort_unstable();
        return Err(AnalysisError::AgeMismatch {
            left: left_name.to_string(),
            right: right_name.to_string(),
            detail: format!("age classes {:?} are missing from {}", extra, left_name),
        });
    }

    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_join_preserves_left_order() {
        let left = deaths(&[("65+", 90), ("0-64", 10)]);
        let right = population(&[("0-64", 100_000), ("65+", 50_000)]);

        let joined = join_on_age(&left, &right, "deaths", "population").unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].0.age_class, "65+");
        assert_eq!(joined[0].1.population, 50_000);
        assert_eq!(joined[1].0.age_class, "0-64");
    }

    #[test]
    fn test_join_rejects_missing_class_on_right() {
        let left = deaths(&[("0-64", 10), ("65+", 90)]);
        let right = population(&[("0-64", 100_000)]);

        let err = join_on_age(&left, &right, "deaths", "population").unwrap_err();
        assert!(matches!(err, AnalysisError::AgeMismatch { .. }));
        assert!(err.to_string().contains("65+"));
    }

    #[test]
    fn test_join_rejects_extra_class_on_right() {
        let left = deaths(&[("0-64", 10)]);
        let right = population(&[("0-64", 100_000), ("65+", 50_000)]);

        let err = join_on_age(&left, &right, "deaths", "population").unwrap_err();
        assert!(matches!(err, AnalysisError::AgeMismatch { .. }));
        assert!(err.to_string().contains("missing from deaths"));
    }

    #[test]
    fn test_join_rejects_duplicate_key() {
        let left = deaths(&[("0-64", 10), ("0-64", 12)]);
        let right = population(&[("0-64", 100_000)]);

        let err = join_on_age(&left, &right, "deaths", "population").unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
