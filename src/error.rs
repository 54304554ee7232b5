// ⚠️ Error Taxonomy
// Fatal upload errors vs. row-level errors that only skip a row

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// FATAL ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Required headers are absent. No partial processing is attempted.
    #[error(
        "CSV must contain the columns `amount`, `account_name`, `timestamp`. Missing: {}. Found: {}",
        .missing.join(", "),
        list_or_none(.found)
    )]
    UnknownColumnSet {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown session: {0}")]
    SessionNotFound(String),

    #[error("No transaction at line {0}")]
    TransactionNotFound(usize),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

// ============================================================================
// ROW-LEVEL ERRORS (MalformedRow)
// ============================================================================

/// Why a single data row was excluded from the processed set.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RowErrorKind {
    #[error("missing value for `{0}`")]
    MissingField(String),

    #[error("amount `{0}` is not a number")]
    InvalidAmount(String),

    #[error("amount `{0}` is negative")]
    NegativeAmount(String),

    #[error("amount `{0}` would overflow the upload total")]
    TotalOverflow(String),

    #[error("timestamp `{0}` is not in YYYY-MM-DDTHH:MM:SS format")]
    InvalidTimestamp(String),

    #[error("unreadable row: {0}")]
    Unreadable(String),
}

/// A skipped row, reported back to the user.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("line {line}: {kind}")]
pub struct RowError {
    /// 1-based line in the uploaded file
    pub line: usize,
    pub kind: RowErrorKind,
}

impl RowError {
    pub fn new(line: usize, kind: RowErrorKind) -> Self {
        RowError { line, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_column_set_message() {
        let err = AnalyzerError::UnknownColumnSet {
            missing: vec!["amount".to_string()],
            found: vec!["name".to_string(), "when".to_string()],
        };

        let msg = err.to_string();
        assert!(msg.contains("Missing: amount"));
        assert!(msg.contains("Found: name, when"));
    }

    #[test]
    fn test_unknown_column_set_without_headers() {
        let err = AnalyzerError::UnknownColumnSet {
            missing: vec!["amount".to_string(), "timestamp".to_string()],
            found: vec![],
        };

        assert!(err.to_string().contains("Found: (none)"));
    }

    #[test]
    fn test_row_error_display() {
        let err = RowError::new(4, RowErrorKind::InvalidAmount("abc".to_string()));
        assert_eq!(err.to_string(), "line 4: amount `abc` is not a number");
    }

    #[test]
    fn test_row_error_serializes_kind_tag() {
        let err = RowError::new(2, RowErrorKind::MissingField("timestamp".to_string()));
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["line"], 2);
        assert_eq!(json["kind"]["kind"], "missing_field");
        assert_eq!(json["kind"]["detail"], "timestamp");
    }
}
