//! Error types for the mortality comparison pipeline
//!
//! Every variant is fatal: the pipeline fails fast at the first violated
//! precondition or postcondition rather than computing statistics from
//! suspect inputs.

use thiserror::Error;

/// Pipeline error type
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Two tables being joined do not share an identical age-class set
    #[error("age classes do not match between {left} and {right}: {detail}")]
    AgeMismatch {
        left: String,
        right: String,
        detail: String,
    },

    /// A population sum required as a rate denominator is zero or negative
    #[error("{population} population sum is zero or negative ({context})")]
    ZeroPopulation { population: String, context: String },

    /// A claimed subset count exceeds its superset at some age class
    #[error("subset violation in age class {age_class}: {detail}")]
    SubsetViolation { age_class: String, detail: String },

    /// A required column is absent from an input table
    #[error("required column missing from {table}: {column}")]
    MissingColumn { table: String, column: String },

    /// A postcondition failed after computation
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),

    /// A cell could not be parsed or failed load-time validation
    #[error("invalid value in {table}: {detail}")]
    InvalidValue { table: String, detail: String },

    /// An error occurred while computing a stratum
    #[error("stratum {stratum}: {source}")]
    InStratum {
        stratum: String,
        #[source]
        source: Box<AnalysisError>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AnalysisError {
    /// Attach the stratum that was being computed when the error occurred
    pub fn in_stratum(stratum: impl ToString, source: AnalysisError) -> Self {
        AnalysisError::InStratum {
            stratum: stratum.to_string(),
            source: Box::new(source),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AnalysisError>;
