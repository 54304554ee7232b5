// 🧾 Transaction Model
// One parsed CSV row, plus the category the classifier assigns to it

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalyzerError;

/// Source timestamp format (`YYYY-MM-DDTHH:MM:SS`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Same as [`TIMESTAMP_FORMAT`] with fractional seconds
pub const TIMESTAMP_FORMAT_FRACTIONAL: &str = "%Y-%m-%dT%H:%M:%S%.f";

// ============================================================================
// CATEGORY
// ============================================================================

/// Counterparty category. Ordering is Merchant, Friend, Stranger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Merchant,
    Friend,
    Stranger,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Merchant, Category::Friend, Category::Stranger];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Merchant => "Merchant",
            Category::Friend => "Friend",
            Category::Stranger => "Stranger",
        }
    }

    /// Slice color used by the pie chart and the terminal browser legend
    pub fn color(&self) -> &'static str {
        match self {
            Category::Merchant => "#8dd3c7",
            Category::Friend => "#fdb462",
            Category::Stranger => "#bebada",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AnalyzerError;

    /// Accepts the export labels in any letter case (`merchant`, `Friend`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AnalyzerError::UnknownCategory(s.to_string()))
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// A fully parsed input row. Never carries a defaulted amount or timestamp:
/// rows that cannot be parsed become `RowError`s instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub amount: f64,
    pub account_name: String,
    pub timestamp: NaiveDateTime,

    /// 1-based line in the uploaded file
    pub line: usize,

    /// Values of the extra input columns, aligned with `ParsedFile::extra_headers`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
}

impl Transaction {
    pub fn new(amount: f64, account_name: &str, timestamp: NaiveDateTime, line: usize) -> Self {
        Transaction {
            amount,
            account_name: account_name.to_string(),
            timestamp,
            line,
            extra: Vec::new(),
        }
    }

    /// Builder pattern: attach extra column values
    pub fn with_extra(mut self, extra: Vec<String>) -> Self {
        self.extra = extra;
        self
    }

    /// Timestamp written back in the source format
    pub fn timestamp_string(&self) -> String {
        format_source_timestamp(&self.timestamp)
    }
}

/// Parse a source timestamp, with or without fractional seconds.
pub fn parse_source_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT_FRACTIONAL))
        .ok()
}

pub fn format_source_timestamp(ts: &NaiveDateTime) -> String {
    use chrono::Timelike;

    if ts.nanosecond() == 0 {
        ts.format(TIMESTAMP_FORMAT).to_string()
    } else {
        ts.format(TIMESTAMP_FORMAT_FRACTIONAL).to_string()
    }
}

// ============================================================================
// CLASSIFIED TRANSACTION
// ============================================================================

/// A transaction with exactly one category attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category: Category,
}

impl ClassifiedTransaction {
    pub fn amount(&self) -> f64 {
        self.transaction.amount
    }

    pub fn account_name(&self) -> &str {
        &self.transaction.account_name
    }

    pub fn line(&self) -> usize {
        self.transaction.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_category_order_and_labels() {
        let mut cats = vec![Category::Stranger, Category::Merchant, Category::Friend];
        cats.sort();

        assert_eq!(cats, Category::ALL.to_vec());
        assert_eq!(Category::Friend.to_string(), "Friend");
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Merchant".parse::<Category>().unwrap(), Category::Merchant);
        assert_eq!("stranger".parse::<Category>().unwrap(), Category::Stranger);
        assert!("Family".parse::<Category>().is_err());
    }

    #[test]
    fn test_parse_source_timestamp() {
        let ts = parse_source_timestamp("2024-03-05T14:30:00").unwrap();
        assert_eq!(
            ts,
            NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap()
        );

        assert!(parse_source_timestamp("2024-03-05T14:30:00.250").is_some());
        assert!(parse_source_timestamp("05/03/2024 14:30").is_none());
        assert!(parse_source_timestamp("").is_none());
    }

    #[test]
    fn test_timestamp_string_roundtrip() {
        let whole = parse_source_timestamp("2024-01-15T09:05:07").unwrap();
        assert_eq!(format_source_timestamp(&whole), "2024-01-15T09:05:07");

        let fractional = parse_source_timestamp("2024-01-15T09:05:07.250").unwrap();
        let written = format_source_timestamp(&fractional);
        assert_eq!(parse_source_timestamp(&written), Some(fractional));
    }
}
