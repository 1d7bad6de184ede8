use crate::dataset::Dataset;
use crate::domain::price::DerivedRecord;
pub use crate::domain::price::PercentChangePolicy;
use std::sync::Arc;

/// Maximum number of trading days returned for a year.
pub const DEFAULT_ROW_LIMIT: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid year input")]
    InvalidYear { input: String },

    /// The parsed year, which may lie outside the calendar range.
    #[error("No data found for year {0}")]
    NoDataForYear(i64),
}

impl QueryError {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::InvalidYear { .. } => "invalid_year",
            QueryError::NoDataForYear(_) => "no_data_for_year",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub year: i32,
    pub records: Vec<DerivedRecord>,
}

/// Any optionally signed run of digits is a year. Runs too long for `i64` saturate,
/// which no dataset can contain.
pub fn parse_year(input: &str) -> Result<i64, QueryError> {
    let trimmed = input.trim();
    let invalid = || QueryError::InvalidYear {
        input: input.to_string(),
    };

    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    Ok(trimmed.parse::<i64>().unwrap_or(if negative {
        i64::MIN
    } else {
        i64::MAX
    }))
}

#[derive(Debug, Clone)]
pub struct YearQuery {
    dataset: Arc<Dataset>,
    row_limit: usize,
    percent_change_policy: PercentChangePolicy,
}

impl YearQuery {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset,
            row_limit: DEFAULT_ROW_LIMIT,
            percent_change_policy: PercentChangePolicy::default(),
        }
    }

    /// Overrides the row cap. Zero is clamped to one.
    pub fn with_row_limit(mut self, row_limit: usize) -> Self {
        self.row_limit = row_limit.max(1);
        self
    }

    pub fn with_percent_change_policy(mut self, policy: PercentChangePolicy) -> Self {
        self.percent_change_policy = policy;
        self
    }

    pub fn row_limit(&self) -> usize {
        self.row_limit
    }

    pub fn percent_change_policy(&self) -> PercentChangePolicy {
        self.percent_change_policy
    }

    pub fn run(&self, year_input: &str) -> Result<QueryResult, QueryError> {
        let year = parse_year(year_input)?;
        self.run_year(year)
    }

    pub fn run_year(&self, year: i64) -> Result<QueryResult, QueryError> {
        let Ok(calendar_year) = i32::try_from(year) else {
            return Err(QueryError::NoDataForYear(year));
        };

        let matching = self.dataset.records_for_year(calendar_year);
        if matching.is_empty() {
            return Err(QueryError::NoDataForYear(year));
        }

        let policy = self.percent_change_policy;
        let records: Vec<DerivedRecord> = matching
            .iter()
            .take(self.row_limit)
            .map(|r| DerivedRecord::derive(r.clone(), policy))
            .collect();

        let zero_open = records.iter().filter(|r| r.record.open == 0.0).count();
        if zero_open > 0 {
            tracing::warn!(
                year,
                zero_open,
                ?policy,
                "percent change undefined for zero-open records"
            );
        }

        tracing::debug!(
            year,
            matched = matching.len(),
            rows = records.len(),
            "year query served"
        );

        Ok(QueryResult {
            year: calendar_year,
            records,
        })
    }
}
