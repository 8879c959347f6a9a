//! CSV loaders for deaths, population, and standard-population tables
//!
//! Two source conventions are supported: ISTAT files (national data;
//! Italian age labels, per-year population files) and Eurostat files
//! (regional data; verbose English age labels, one population file with
//! year/sex columns). Parsers take any reader; `load_*` wrappers open
//! files.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use serde::Deserialize;

use super::labels::{canonical_age_class, EUROSTAT_AGE_LABELS, ISTAT_AGE_LABELS};
use crate::error::{AnalysisError, Result};
use crate::stratum::Sex;
use crate::table::{DeathsRow, PopulationRow, StandardPopulationRow};

/// One deaths record before the per-year split
#[derive(Debug, Clone)]
pub struct YearlyDeaths {
    pub age_class: String,
    pub year: u16,
    pub deaths: Option<u64>,
}

/// National population tables split by sex column
#[derive(Debug, Clone)]
pub struct PopulationBySex {
    pub total: Vec<PopulationRow>,
    pub male: Vec<PopulationRow>,
    pub female: Vec<PopulationRow>,
}

impl PopulationBySex {
    pub fn for_sex(&self, sex: Sex) -> &[PopulationRow] {
        match sex {
            Sex::Total => &self.total,
            Sex::Male => &self.male,
            Sex::Female => &self.female,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IstatDeathsRecord {
    #[serde(rename = "Età")]
    age: String,
    #[serde(rename = "TIME_PERIOD")]
    year: u16,
    #[serde(rename = "Osservazione")]
    deaths: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct EurostatDeathsRecord {
    #[serde(rename = "Age class")]
    age: String,
    #[serde(rename = "TIME_PERIOD")]
    year: u16,
    #[serde(rename = "OBS_VALUE")]
    deaths: Option<u64>,
}

fn require_columns(headers: &csv::StringRecord, table: &str, required: &[&str]) -> Result<()> {
    for column in required {
        if !headers.iter().any(|header| header.trim() == *column) {
            return Err(AnalysisError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn find_column(headers: &csv::StringRecord, table: &str, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header.trim() == column)
        .ok_or_else(|| AnalysisError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
}

fn parse_count(table: &str, column: &str, raw: &str) -> Result<u64> {
    raw.trim().parse().map_err(|_| AnalysisError::InvalidValue {
        table: table.to_string(),
        detail: format!("column {column}: cannot parse {raw:?} as a count"),
    })
}

fn check_year(table: &str, year: u16, years: &[u16]) -> Result<()> {
    if years.contains(&year) {
        Ok(())
    } else {
        Err(AnalysisError::InvalidValue {
            table: table.to_string(),
            detail: format!("unexpected year {year} (study years: {years:?})"),
        })
    }
}

/// Parse an ISTAT deaths file: columns `Età`, `TIME_PERIOD`, `Osservazione`
///
/// Age labels are canonicalized from the Italian convention; an empty
/// observation cell means no recorded count. Rows outside the study years
/// are a fatal input error.
pub fn parse_istat_deaths<R: io::Read>(reader: R, years: &[u16]) -> Result<Vec<YearlyDeaths>> {
    const TABLE: &str = "ISTAT deaths";
    let mut rdr = csv::Reader::from_reader(reader);
    require_columns(rdr.headers()?, TABLE, &["Età", "TIME_PERIOD", "Osservazione"])?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: IstatDeathsRecord = result?;
        check_year(TABLE, record.year, years)?;
        rows.push(YearlyDeaths {
            age_class: canonical_age_class(&record.age, ISTAT_AGE_LABELS),
            year: record.year,
            deaths: record.deaths,
        });
    }
    Ok(rows)
}

/// Parse a Eurostat deaths file: columns `Age class`, `TIME_PERIOD`,
/// `OBS_VALUE`
pub fn parse_eurostat_deaths<R: io::Read>(reader: R, years: &[u16]) -> Result<Vec<YearlyDeaths>> {
    const TABLE: &str = "Eurostat deaths";
    let mut rdr = csv::Reader::from_reader(reader);
    require_columns(rdr.headers()?, TABLE, &["Age class", "TIME_PERIOD", "OBS_VALUE"])?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: EurostatDeathsRecord = result?;
        check_year(TABLE, record.year, years)?;
        rows.push(YearlyDeaths {
            age_class: canonical_age_class(&record.age, EUROSTAT_AGE_LABELS),
            year: record.year,
            deaths: record.deaths,
        });
    }
    Ok(rows)
}

/// Select one study year out of a multi-year deaths table
pub fn deaths_for_year(rows: &[YearlyDeaths], year: u16) -> Vec<DeathsRow> {
    rows.iter()
        .filter(|row| row.year == year)
        .map(|row| DeathsRow {
            age_class: row.age_class.clone(),
            deaths: row.deaths,
        })
        .collect()
}

/// Parse an ISTAT population file for one year: semicolon-separated with
/// columns `Age_Group`, `Total`, `Total_M`, `Total_F`
pub fn parse_istat_population<R: io::Read>(reader: R) -> Result<PopulationBySex> {
    const TABLE: &str = "ISTAT population";
    let mut rdr = csv::ReaderBuilder::new().delimiter(b';').from_reader(reader);

    let headers = rdr.headers()?.clone();
    let age_idx = find_column(&headers, TABLE, "Age_Group")?;
    let total_idx = find_column(&headers, TABLE, "Total")?;
    let male_idx = find_column(&headers, TABLE, "Total_M")?;
    let female_idx = find_column(&headers, TABLE, "Total_F")?;

    let mut population = PopulationBySex {
        total: Vec::new(),
        male: Vec::new(),
        female: Vec::new(),
    };
    for result in rdr.records() {
        let record = result?;
        let age_class = canonical_age_class(&record[age_idx], ISTAT_AGE_LABELS);
        for (idx, column, rows) in [
            (total_idx, "Total", &mut population.total),
            (male_idx, "Total_M", &mut population.male),
            (female_idx, "Total_F", &mut population.female),
        ] {
            rows.push(PopulationRow {
                age_class: age_class.clone(),
                population: parse_count(TABLE, column, &record[idx])?,
            });
        }
    }
    Ok(population)
}

/// Parse a Eurostat population file covering all study years and sexes:
/// semicolon-separated with columns `Age Group` plus `Total <year>`,
/// `Males <year>`, `Females <year>` per study year
pub fn parse_eurostat_population<R: io::Read>(
    reader: R,
    years: &[u16],
) -> Result<HashMap<(u16, Sex), Vec<PopulationRow>>> {
    const TABLE: &str = "Eurostat population";
    let mut rdr = csv::ReaderBuilder::new().delimiter(b';').from_reader(reader);

    let headers = rdr.headers()?.clone();
    let age_idx = find_column(&headers, TABLE, "Age Group")?;

    let mut columns = Vec::new();
    for &year in years {
        for sex in Sex::ALL {
            let prefix = match sex {
                Sex::Total => "Total",
                Sex::Male => "Males",
                Sex::Female => "Females",
            };
            let column = format!("{prefix} {year}");
            let idx = find_column(&headers, TABLE, &column)?;
            columns.push((year, sex, column, idx));
        }
    }

    let mut tables: HashMap<(u16, Sex), Vec<PopulationRow>> = HashMap::new();
    for result in rdr.records() {
        let record = result?;
        let age_class = canonical_age_class(&record[age_idx], EUROSTAT_AGE_LABELS);
        for (year, sex, column, idx) in &columns {
            tables
                .entry((*year, *sex))
                .or_default()
                .push(PopulationRow {
                    age_class: age_class.clone(),
                    population: parse_count(TABLE, column, &record[*idx])?,
                });
        }
    }
    Ok(tables)
}

/// Parse the standard population file: semicolon-separated with columns
/// `Age group` and `Standard population`
///
/// Zero or negative weights are rejected at load time, before any rate is
/// computed.
pub fn parse_standard_population<R: io::Read>(reader: R) -> Result<Vec<StandardPopulationRow>> {
    const TABLE: &str = "standard population";
    let mut rdr = csv::ReaderBuilder::new().delimiter(b';').from_reader(reader);

    let headers = rdr.headers()?.clone();
    let age_idx = find_column(&headers, TABLE, "Age group")?;
    let weight_idx = find_column(&headers, TABLE, "Standard population")?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let raw = record[weight_idx].trim();
        let std_population: f64 = raw.parse().map_err(|_| AnalysisError::InvalidValue {
            table: TABLE.to_string(),
            detail: format!("cannot parse {raw:?} as a population weight"),
        })?;
        let age_class = record[age_idx].trim().to_string();
        if std_population <= 0.0 {
            return Err(AnalysisError::InvalidValue {
                table: TABLE.to_string(),
                detail: format!(
                    "age class {age_class:?}: standard population must be positive, got {std_population}"
                ),
            });
        }
        rows.push(StandardPopulationRow {
            age_class,
            std_population,
        });
    }
    Ok(rows)
}

pub fn load_istat_deaths(path: &Path, years: &[u16]) -> Result<Vec<YearlyDeaths>> {
    parse_istat_deaths(File::open(path)?, years)
}

pub fn load_eurostat_deaths(path: &Path, years: &[u16]) -> Result<Vec<YearlyDeaths>> {
    parse_eurostat_deaths(File::open(path)?, years)
}

pub fn load_istat_population(path: &Path) -> Result<PopulationBySex> {
    parse_istat_population(File::open(path)?)
}

pub fn load_eurostat_population(
    path: &Path,
    years: &[u16],
) -> Result<HashMap<(u16, Sex), Vec<PopulationRow>>> {
    parse_eurostat_population(File::open(path)?, years)
}

pub fn load_standard_population(path: &Path) -> Result<Vec<StandardPopulationRow>> {
    parse_standard_population(File::open(path)?)
}
