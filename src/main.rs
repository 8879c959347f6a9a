//! Mortality Comparison CLI
//!
//! Loads the deaths and population tables for both populations, runs the
//! standardization pipeline for every (year, sex) stratum and writes the
//! result tables to the output directory.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::info;

use mortality_comparison::input::{
    deaths_for_year, load_eurostat_deaths, load_eurostat_population, load_istat_deaths,
    load_istat_population, load_standard_population, PopulationBySex, YearlyDeaths,
};
use mortality_comparison::{
    AgeProfile, AnalysisResults, AnalysisRunner, KitagawaResult, SensitivityRates,
    Sex, StandardizedRates, Stratum, StratumInputs,
};

#[derive(Parser, Debug)]
#[command(
    name = "mortality_comparison",
    about = "Age-standardized mortality comparison between a national population and its regional aggregate"
)]
struct Args {
    /// Directory containing the input CSV files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory the result tables are written to
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// Study years
    #[arg(long, value_delimiter = ',', default_values_t = vec![2020u16, 2021, 2022])]
    years: Vec<u16>,

    /// Two-sided significance level for the confidence intervals
    #[arg(long, default_value_t = 0.05)]
    alpha: f64,
}

fn sex_suffix(sex: Sex) -> &'static str {
    match sex {
        Sex::Total => "total",
        Sex::Male => "male",
        Sex::Female => "female",
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("Mortality Comparison System v0.1.0");
    println!("==================================\n");

    // Deaths: one multi-year file per population and sex.
    let mut national_deaths: HashMap<Sex, Vec<YearlyDeaths>> = HashMap::new();
    let mut regional_deaths: HashMap<Sex, Vec<YearlyDeaths>> = HashMap::new();
    for sex in Sex::ALL {
        let path = args
            .data_dir
            .join(format!("deaths_national_{}.csv", sex_suffix(sex)));
        let rows = load_istat_deaths(&path, &args.years)
            .with_context(|| format!("loading {}", path.display()))?;
        national_deaths.insert(sex, rows);

        let path = args
            .data_dir
            .join(format!("deaths_regional_{}.csv", sex_suffix(sex)));
        let rows = load_eurostat_deaths(&path, &args.years)
            .with_context(|| format!("loading {}", path.display()))?;
        regional_deaths.insert(sex, rows);
    }
    info!("mortality data loaded");

    // National population: one file per study year; regional: one file
    // covering all strata.
    let mut national_population: HashMap<u16, PopulationBySex> = HashMap::new();
    for &year in &args.years {
        let path = args
            .data_dir
            .join(format!("population_national_{year}.csv"));
        let tables =
            load_istat_population(&path).with_context(|| format!("loading {}", path.display()))?;
        national_population.insert(year, tables);
    }
    let path = args.data_dir.join("population_regional.csv");
    let regional_population = load_eurostat_population(&path, &args.years)
        .with_context(|| format!("loading {}", path.display()))?;
    info!("population data loaded");

    let path = args.data_dir.join("standard_population.csv");
    let std_population =
        load_standard_population(&path).with_context(|| format!("loading {}", path.display()))?;
    info!("standard population loaded ({} age classes)", std_population.len());

    let mut strata = Vec::with_capacity(args.years.len() * Sex::ALL.len());
    for &year in &args.years {
        for sex in Sex::ALL {
            let regional = regional_population
                .get(&(year, sex))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no regional population for {year} {sex}"))?;
            strata.push(StratumInputs {
                stratum: Stratum::new(year, sex),
                national_deaths: deaths_for_year(&national_deaths[&sex], year),
                national_population: national_population[&year].for_sex(sex).to_vec(),
                regional_deaths: deaths_for_year(&regional_deaths[&sex], year),
                regional_population: regional,
            });
        }
    }

    let runner = AnalysisRunner::with_alpha(std_population, args.alpha);
    let results = runner.run(&strata).context("analysis failed")?;
    info!("analysis complete");

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    write_rate_table(&args.out_dir.join("standardized_rates.csv"), &results.rates)?;
    write_sensitivity_table(
        &args.out_dir.join("sensitivity_rates.csv"),
        &results.sensitivity,
    )?;
    write_kitagawa_table(
        &args.out_dir.join("kitagawa_decomposition.csv"),
        &results.kitagawa,
    )?;
    for profile in &results.age_profiles {
        let path = args
            .out_dir
            .join(format!("age_profile_{}.csv", profile.stratum.year));
        write_age_profile(&path, profile)?;
    }
    println!("Result tables written to: {}\n", args.out_dir.display());

    print_summary(&results);
    Ok(())
}

fn write_rate_table(path: &Path, rows: &[StandardizedRates]) -> anyhow::Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(
        file,
        "Year,Sex,\
         Crude_National,Crude_National_Lower,Crude_National_Upper,\
         Std_National,Std_National_Lower,Std_National_Upper,\
         Crude_Regional,Crude_Regional_Lower,Crude_Regional_Upper,\
         Std_Regional,Std_Regional_Lower,Std_Regional_Upper"
    )?;
    for row in rows {
        writeln!(
            file,
            "{},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4}",
            row.stratum.year,
            row.stratum.sex,
            row.national.crude.rate,
            row.national.crude.lower,
            row.national.crude.upper,
            row.national.standardized.rate,
            row.national.standardized.lower,
            row.national.standardized.upper,
            row.regional.crude.rate,
            row.regional.crude.lower,
            row.regional.crude.upper,
            row.regional.standardized.rate,
            row.regional.standardized.lower,
            row.regional.standardized.upper,
        )?;
    }
    Ok(())
}

fn write_sensitivity_table(path: &Path, rows: &[SensitivityRates]) -> anyhow::Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(
        file,
        "Year,Sex,\
         Crude_Adjusted,Crude_Adjusted_Lower,Crude_Adjusted_Upper,\
         Std_Adjusted,Std_Adjusted_Lower,Std_Adjusted_Upper"
    )?;
    for row in rows {
        writeln!(
            file,
            "{},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4}",
            row.stratum.year,
            row.stratum.sex,
            row.adjusted.crude.rate,
            row.adjusted.crude.lower,
            row.adjusted.crude.upper,
            row.adjusted.standardized.rate,
            row.adjusted.standardized.lower,
            row.adjusted.standardized.upper,
        )?;
    }
    Ok(())
}

fn write_kitagawa_table(path: &Path, rows: &[KitagawaResult]) -> anyhow::Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(file, "Year,Sex,Structure_Effect,Rate_Effect,Difference")?;
    for row in rows {
        writeln!(
            file,
            "{},{},{:.4},{:.4},{:.4}",
            row.stratum.year,
            row.stratum.sex,
            row.structure_effect,
            row.rate_effect,
            row.difference,
        )?;
    }
    Ok(())
}

fn write_age_profile(path: &Path, profile: &AgeProfile) -> anyhow::Result<()> {
    fn cell(value: Option<f64>) -> String {
        value.map(|v| format!("{v:.6}")).unwrap_or_default()
    }

    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(
        file,
        "Age,Std_Population,\
         Expected_National,Ratio_National,Expected_Regional,Ratio_Regional"
    )?;
    for row in &profile.rows {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            row.age_class,
            row.std_population,
            cell(row.national.expected_deaths),
            cell(row.national.std_ratio),
            cell(row.regional.expected_deaths),
            cell(row.regional.std_ratio),
        )?;
    }
    Ok(())
}

fn print_summary(results: &AnalysisResults) {
    println!("Age-standardized rates per 100k (95% CI):");
    println!(
        "{:>5} {:>7} {:>12} {:>21} {:>12} {:>21}",
        "Year", "Sex", "National", "CI", "Regional", "CI"
    );
    println!("{}", "-".repeat(84));
    for row in &results.rates {
        println!(
            "{:>5} {:>7} {:>12.2} [{:>8.2}, {:>8.2}] {:>12.2} [{:>8.2}, {:>8.2}]",
            row.stratum.year,
            row.stratum.sex,
            row.national.standardized.rate,
            row.national.standardized.lower,
            row.national.standardized.upper,
            row.regional.standardized.rate,
            row.regional.standardized.lower,
            row.regional.standardized.upper,
        );
    }

    println!("\nRegional aggregate without the national population, standardized (per 100k):");
    println!("{:>5} {:>7} {:>12} {:>21}", "Year", "Sex", "Adjusted", "CI");
    println!("{}", "-".repeat(48));
    for row in &results.sensitivity {
        println!(
            "{:>5} {:>7} {:>12.2} [{:>8.2}, {:>8.2}]",
            row.stratum.year,
            row.stratum.sex,
            row.adjusted.standardized.rate,
            row.adjusted.standardized.lower,
            row.adjusted.standardized.upper,
        );
    }

    println!("\nKitagawa decomposition of the crude-rate gap (per 100k):");
    println!(
        "{:>5} {:>7} {:>18} {:>12} {:>12}",
        "Year", "Sex", "Structure", "Rates", "Difference"
    );
    println!("{}", "-".repeat(59));
    for row in &results.kitagawa {
        println!(
            "{:>5} {:>7} {:>18.2} {:>12.2} {:>12.2}",
            row.stratum.year,
            row.stratum.sex,
            row.structure_effect,
            row.rate_effect,
            row.difference,
        );
    }
}
