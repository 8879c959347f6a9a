//! Canonical age-class labels
//!
//! Each source convention ships its own verbose age-class labels; all
//! tables are rekeyed to the short canonical codes ("0", "1-4", ...,
//! "95+") before any join. The mappings are process-wide read-only
//! lookup tables, one per source convention.

/// ISTAT (Italian national statistics) age labels to canonical codes
pub const ISTAT_AGE_LABELS: &[(&str, &str)] = &[
    ("0 anni", "0"),
    ("1-4 anni", "1-4"),
    ("5-9 anni", "5-9"),
    ("10-14 anni", "10-14"),
    ("15-19 anni", "15-19"),
    ("20-24 anni", "20-24"),
    ("25-29 anni", "25-29"),
    ("30-34 anni", "30-34"),
    ("35-39 anni", "35-39"),
    ("40-44 anni", "40-44"),
    ("45-49 anni", "45-49"),
    ("50-54 anni", "50-54"),
    ("55-59 anni", "55-59"),
    ("60-64 anni", "60-64"),
    ("65-69 anni", "65-69"),
    ("70-74 anni", "70-74"),
    ("75-79 anni", "75-79"),
    ("80-84 anni", "80-84"),
    ("85-89 anni", "85-89"),
    ("90-94 anni", "90-94"),
    ("95 anni e più", "95+"),
];

/// Eurostat age labels to canonical codes
pub const EUROSTAT_AGE_LABELS: &[(&str, &str)] = &[
    ("Less than 1 year", "0"),
    ("From 1 to 4 years", "1-4"),
    ("From 5 to 9 years", "5-9"),
    ("From 10 to 14 years", "10-14"),
    ("From 15 to 19 years", "15-19"),
    ("From 20 to 24 years", "20-24"),
    ("From 25 to 29 years", "25-29"),
    ("From 30 to 34 years", "30-34"),
    ("From 35 to 39 years", "35-39"),
    ("From 40 to 44 years", "40-44"),
    ("From 45 to 49 years", "45-49"),
    ("From 50 to 54 years", "50-54"),
    ("From 55 to 59 years", "55-59"),
    ("From 60 to 64 years", "60-64"),
    ("From 65 to 69 years", "65-69"),
    ("From 70 to 74 years", "70-74"),
    ("From 75 to 79 years", "75-79"),
    ("From 80 to 84 years", "80-84"),
    ("From 85 to 89 years", "85-89"),
    ("From 90 to 94 years", "90-94"),
    ("95 years or over", "95+"),
];

/// Map a source age label to its canonical code
///
/// Labels not present in the table pass through unchanged (they are
/// assumed to already be canonical, e.g. in the standard population file).
pub fn canonical_age_class(label: &str, table: &[(&str, &str)]) -> String {
    let trimmed = label.trim();
    table
        .iter()
        .find(|(source, _)| *source == trimmed)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_istat_labels_canonicalized() {
        assert_eq!(canonical_age_class("0 anni", ISTAT_AGE_LABELS), "0");
        assert_eq!(canonical_age_class("95 anni e più", ISTAT_AGE_LABELS), "95+");
    }

    #[test]
    fn test_eurostat_labels_canonicalized() {
        assert_eq!(
            canonical_age_class("Less than 1 year", EUROSTAT_AGE_LABELS),
            "0"
        );
        assert_eq!(
            canonical_age_class("95 years or over", EUROSTAT_AGE_LABELS),
            "95+"
        );
    }

    #[test]
    fn test_canonical_labels_pass_through() {
        assert_eq!(canonical_age_class("40-44", EUROSTAT_AGE_LABELS), "40-44");
        assert_eq!(canonical_age_class(" 95+ ", ISTAT_AGE_LABELS), "95+");
    }

    #[test]
    fn test_conventions_cover_the_same_classes() {
        let istat: Vec<&str> = ISTAT_AGE_LABELS.iter().map(|(_, c)| *c).collect();
        let eurostat: Vec<&str> = EUROSTAT_AGE_LABELS.iter().map(|(_, c)| *c).collect();
        assert_eq!(istat, eurostat);
        assert_eq!(istat.len(), 21);
    }
}
