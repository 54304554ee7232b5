// 🏗️ Input Parser
// CSV bytes → schema check → typed transactions + row-level errors

use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{AnalyzerError, Result, RowError, RowErrorKind};
use crate::transaction::{parse_source_timestamp, Transaction};

pub const AMOUNT_COLUMN: &str = "amount";
pub const ACCOUNT_NAME_COLUMN: &str = "account_name";
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const CATEGORY_COLUMN: &str = "category";

const REQUIRED_COLUMNS: [&str; 3] = [AMOUNT_COLUMN, ACCOUNT_NAME_COLUMN, TIMESTAMP_COLUMN];

// ============================================================================
// SCHEMA
// ============================================================================

/// What an input column is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Amount,
    AccountName,
    Timestamp,
    /// Carried through to the export; index into `Transaction::extra`
    Extra(usize),
    /// A `category` column from an earlier export. Recomputed, never read.
    Derived,
}

/// Validated header layout of one uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    names: Vec<String>,
    roles: Vec<ColumnRole>,
}

impl ColumnMap {
    /// Layout used when a file has no header row at all
    pub fn standard() -> Self {
        ColumnMap {
            names: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            roles: vec![ColumnRole::Amount, ColumnRole::AccountName, ColumnRole::Timestamp],
        }
    }

    /// Validate headers. Fails only when a required column is absent.
    /// The first occurrence of a duplicated required header wins.
    pub fn from_headers(headers: &StringRecord) -> Result<Self> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

        let mut roles = Vec::with_capacity(names.len());
        let mut seen_amount = false;
        let mut seen_account = false;
        let mut seen_timestamp = false;
        let mut extra_count = 0;

        for name in &names {
            let role = match name.as_str() {
                AMOUNT_COLUMN if !seen_amount => {
                    seen_amount = true;
                    ColumnRole::Amount
                }
                ACCOUNT_NAME_COLUMN if !seen_account => {
                    seen_account = true;
                    ColumnRole::AccountName
                }
                TIMESTAMP_COLUMN if !seen_timestamp => {
                    seen_timestamp = true;
                    ColumnRole::Timestamp
                }
                CATEGORY_COLUMN => ColumnRole::Derived,
                _ => {
                    extra_count += 1;
                    ColumnRole::Extra(extra_count - 1)
                }
            };
            roles.push(role);
        }

        let missing: Vec<String> = [
            (AMOUNT_COLUMN, seen_amount),
            (ACCOUNT_NAME_COLUMN, seen_account),
            (TIMESTAMP_COLUMN, seen_timestamp),
        ]
        .iter()
        .filter(|(_, seen)| !seen)
        .map(|(name, _)| name.to_string())
        .collect();

        if !missing.is_empty() {
            return Err(AnalyzerError::UnknownColumnSet {
                missing,
                found: names.into_iter().filter(|n| !n.is_empty()).collect(),
            });
        }

        Ok(ColumnMap { names, roles })
    }

    pub fn index_of(&self, role: ColumnRole) -> Option<usize> {
        self.roles.iter().position(|r| *r == role)
    }

    /// Names of the extra columns, in input order
    pub fn extra_headers(&self) -> Vec<&str> {
        self.columns()
            .filter(|(_, role)| matches!(role, ColumnRole::Extra(_)))
            .map(|(name, _)| name)
            .collect()
    }

    /// Columns written back on export: input order, stale `category` dropped
    pub fn output_columns(&self) -> impl Iterator<Item = (&str, ColumnRole)> {
        self.columns().filter(|(_, role)| *role != ColumnRole::Derived)
    }

    fn columns(&self) -> impl Iterator<Item = (&str, ColumnRole)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.roles.iter().copied())
    }
}

// ============================================================================
// RAW ROW
// ============================================================================

/// Field values exactly as read, before any conversion.
#[derive(Debug, Clone)]
struct RawRow {
    line: usize,
    amount: Option<String>,
    account_name: Option<String>,
    timestamp: Option<String>,
    extra: Vec<String>,
}

impl RawRow {
    fn from_record(record: &StringRecord, columns: &ColumnMap, line: usize) -> Self {
        let field = |role: ColumnRole| {
            columns
                .index_of(role)
                .and_then(|i| record.get(i))
                .map(str::to_string)
        };

        let extra = columns
            .roles
            .iter()
            .enumerate()
            .filter(|(_, role)| matches!(role, ColumnRole::Extra(_)))
            .map(|(i, _)| record.get(i).unwrap_or("").to_string())
            .collect();

        RawRow {
            line,
            amount: field(ColumnRole::Amount),
            account_name: field(ColumnRole::AccountName),
            timestamp: field(ColumnRole::Timestamp),
            extra,
        }
    }

    fn into_transaction(self) -> std::result::Result<Transaction, RowError> {
        let line = self.line;
        let fail = |kind| RowError::new(line, kind);

        let amount_raw = non_empty(self.amount)
            .ok_or_else(|| fail(RowErrorKind::MissingField(AMOUNT_COLUMN.to_string())))?;
        let amount = parse_amount(&amount_raw).map_err(fail)?;

        // An empty counterparty is still classifiable (as a Stranger)
        let account_name = self
            .account_name
            .ok_or_else(|| fail(RowErrorKind::MissingField(ACCOUNT_NAME_COLUMN.to_string())))?;

        let timestamp_raw = non_empty(self.timestamp)
            .ok_or_else(|| fail(RowErrorKind::MissingField(TIMESTAMP_COLUMN.to_string())))?;
        let timestamp = parse_source_timestamp(&timestamp_raw)
            .ok_or_else(|| fail(RowErrorKind::InvalidTimestamp(timestamp_raw.clone())))?;

        Ok(Transaction::new(amount, &account_name, timestamp, line).with_extra(self.extra))
    }
}

fn record_amount(record: &StringRecord, columns: &ColumnMap) -> String {
    columns
        .index_of(ColumnRole::Amount)
        .and_then(|i| record.get(i))
        .unwrap_or("")
        .trim()
        .to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Finite, non-negative decimal. Never defaults to zero.
pub fn parse_amount(value: &str) -> std::result::Result<f64, RowErrorKind> {
    let trimmed = value.trim();
    let amount: f64 = trimmed
        .parse()
        .map_err(|_| RowErrorKind::InvalidAmount(trimmed.to_string()))?;

    if !amount.is_finite() {
        return Err(RowErrorKind::InvalidAmount(trimmed.to_string()));
    }
    if amount < 0.0 {
        return Err(RowErrorKind::NegativeAmount(trimmed.to_string()));
    }

    // Normalize -0.0
    Ok(if amount == 0.0 { 0.0 } else { amount })
}

// ============================================================================
// PARSED FILE
// ============================================================================

#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub columns: ColumnMap,
    pub transactions: Vec<Transaction>,
    pub skipped: Vec<RowError>,
}

impl ParsedFile {
    fn empty() -> Self {
        ParsedFile {
            columns: ColumnMap::standard(),
            transactions: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// No data rows at all (skipped rows count as data rows)
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.skipped.is_empty()
    }
}

/// Parse an uploaded CSV stream.
pub fn parse_csv<R: Read>(input: R) -> Result<ParsedFile> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let blank_header = headers.iter().all(|h| h.trim().is_empty());
    let mut records = reader.records().peekable();

    // Blank header with data below it falls through to UnknownColumnSet
    if blank_header && records.peek().is_none() {
        tracing::info!("upload has no header row, treating as empty file");
        return Ok(ParsedFile::empty());
    }

    let columns = ColumnMap::from_headers(&headers)?;
    let mut transactions = Vec::new();
    let mut skipped = Vec::new();
    let mut running_total = 0.0_f64;

    for (index, result) in records.enumerate() {
        // +2 because: 1-indexed + header row
        let fallback_line = index + 2;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                skipped.push(RowError::new(line, RowErrorKind::Unreadable(e.to_string())));
                continue;
            }
        };

        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        match RawRow::from_record(&record, &columns, line).into_transaction() {
            // Every category total and the grand total stay finite
            Ok(tx) if !(running_total + tx.amount).is_finite() => {
                let row_error = RowError::new(
                    line,
                    RowErrorKind::TotalOverflow(record_amount(&record, &columns)),
                );
                tracing::warn!(%row_error, "amount would overflow the upload total");
                skipped.push(row_error);
            }
            Ok(tx) => {
                running_total += tx.amount;
                transactions.push(tx);
            }
            Err(row_error) => {
                tracing::debug!(%row_error, "skipping malformed row");
                skipped.push(row_error);
            }
        }
    }

    tracing::info!(
        parsed = transactions.len(),
        skipped = skipped.len(),
        "parsed transaction CSV"
    );

    Ok(ParsedFile {
        columns,
        transactions,
        skipped,
    })
}

pub fn parse_bytes(bytes: &[u8]) -> Result<ParsedFile> {
    parse_csv(bytes)
}

pub fn parse_file(path: &Path) -> Result<ParsedFile> {
    let file = File::open(path)?;
    parse_csv(file)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_rows() {
        let csv = "amount,account_name,timestamp\n\
                   499,Swiggy,2024-01-15T13:45:00\n\
                   1200.50,Rahul,2024-01-16T09:00:00\n";

        let parsed = parse_bytes(csv.as_bytes()).unwrap();

        assert_eq!(parsed.transactions.len(), 2);
        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.transactions[0].amount, 499.0);
        assert_eq!(parsed.transactions[0].account_name, "Swiggy");
        assert_eq!(parsed.transactions[0].line, 2);
        assert_eq!(parsed.transactions[1].amount, 1200.5);
        assert_eq!(parsed.transactions[1].line, 3);
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let csv = "timestamp,note,account_name,amount\n\
                   2024-01-15T13:45:00,lunch,Swiggy,499\n";

        let parsed = parse_bytes(csv.as_bytes()).unwrap();
        let tx = &parsed.transactions[0];

        assert_eq!(tx.amount, 499.0);
        assert_eq!(tx.account_name, "Swiggy");
        assert_eq!(tx.extra, vec!["lunch".to_string()]);
        assert_eq!(parsed.columns.extra_headers(), vec!["note"]);
    }

    #[test]
    fn test_missing_required_header_is_fatal() {
        let csv = "amount,name,timestamp\n499,Swiggy,2024-01-15T13:45:00\n";

        match parse_bytes(csv.as_bytes()) {
            Err(AnalyzerError::UnknownColumnSet { missing, found }) => {
                assert_eq!(missing, vec!["account_name".to_string()]);
                assert_eq!(found, vec!["amount", "name", "timestamp"]);
            }
            other => panic!("expected UnknownColumnSet, got {:?}", other),
        }
    }

    #[test]
    fn test_headers_are_trimmed() {
        let csv = " amount , account_name ,timestamp\n10,Neha,2024-02-01T08:00:00\n";
        let parsed = parse_bytes(csv.as_bytes()).unwrap();
        assert_eq!(parsed.transactions.len(), 1);
    }

    #[test]
    fn test_non_numeric_amount_is_skipped_not_zeroed() {
        let csv = "amount,account_name,timestamp\n\
                   abc,Swiggy,2024-01-15T13:45:00\n\
                   50,RandomGuy99,2024-01-15T14:00:00\n";

        let parsed = parse_bytes(csv.as_bytes()).unwrap();

        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].account_name, "RandomGuy99");
        assert_eq!(
            parsed.skipped,
            vec![RowError::new(2, RowErrorKind::InvalidAmount("abc".to_string()))]
        );
    }

    #[test]
    fn test_row_level_error_kinds() {
        let csv = "amount,account_name,timestamp\n\
                   ,Swiggy,2024-01-15T13:45:00\n\
                   -20,Rahul,2024-01-15T13:45:00\n\
                   20,Rahul,15/01/2024\n\
                   20,Rahul,\n\
                   NaN,Rahul,2024-01-15T13:45:00\n\
                   30\n";

        let parsed = parse_bytes(csv.as_bytes()).unwrap();
        let kinds: Vec<RowErrorKind> = parsed.skipped.iter().map(|e| e.kind.clone()).collect();

        assert!(parsed.transactions.is_empty());
        assert_eq!(
            kinds,
            vec![
                RowErrorKind::MissingField("amount".to_string()),
                RowErrorKind::NegativeAmount("-20".to_string()),
                RowErrorKind::InvalidTimestamp("15/01/2024".to_string()),
                RowErrorKind::MissingField("timestamp".to_string()),
                RowErrorKind::InvalidAmount("NaN".to_string()),
                RowErrorKind::MissingField("account_name".to_string()),
            ]
        );
        let lines: Vec<usize> = parsed.skipped.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_empty_account_name_is_kept() {
        let csv = "amount,account_name,timestamp\n75,,2024-01-15T13:45:00\n";
        let parsed = parse_bytes(csv.as_bytes()).unwrap();

        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].account_name, "");
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let parsed = parse_bytes(b"amount,account_name,timestamp\n").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_zero_byte_file_is_empty() {
        let parsed = parse_bytes(b"").unwrap();
        assert!(parsed.is_empty());
        assert_eq!(parsed.columns, ColumnMap::standard());
    }

    #[test]
    fn test_blank_header_with_data_rows_is_fatal() {
        let csv = ",,\n\
                   499,Swiggy,2024-01-15T13:45:00\n\
                   1200,Rahul,2024-01-16T09:10:00\n";

        match parse_bytes(csv.as_bytes()) {
            Err(AnalyzerError::UnknownColumnSet { missing, .. }) => {
                assert_eq!(missing, vec!["amount", "account_name", "timestamp"]);
            }
            other => panic!("expected UnknownColumnSet, got {:?}", other.map(|p| p.transactions.len())),
        }
    }

    #[test]
    fn test_blank_header_without_data_is_empty() {
        let parsed = parse_bytes(b",,\n").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_utf8_bom_header_is_accepted() {
        let csv = b"\xEF\xBB\xBFamount,account_name,timestamp\n499,Swiggy,2024-01-15T13:45:00\n";
        let parsed = parse_bytes(csv).unwrap();

        assert_eq!(parsed.columns.index_of(ColumnRole::Amount), Some(0));
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].amount, 499.0);
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_amount_overflowing_total_is_skipped() {
        let csv = "amount,account_name,timestamp\n\
                   1.7e308,Swiggy,2024-01-15T13:45:00\n\
                   1.7e308,Swiggy,2024-01-16T13:45:00\n\
                   5,Rahul,2024-01-17T09:00:00\n";

        let parsed = parse_bytes(csv.as_bytes()).unwrap();

        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].line, 3);
        assert_eq!(
            parsed.skipped[0].kind,
            RowErrorKind::TotalOverflow("1.7e308".to_string())
        );

        let total: f64 = parsed.transactions.iter().map(|t| t.amount).sum();
        assert!(total.is_finite());
    }

    #[test]
    fn test_stale_category_column_is_not_read() {
        let csv = "amount,account_name,timestamp,category\n\
                   499,Swiggy,2024-01-15T13:45:00,Friend\n";

        let parsed = parse_bytes(csv.as_bytes()).unwrap();
        let output: Vec<&str> = parsed.columns.output_columns().map(|(n, _)| n).collect();

        assert!(parsed.transactions[0].extra.is_empty());
        assert_eq!(output, vec!["amount", "account_name", "timestamp"]);
    }

    #[test]
    fn test_invalid_utf8_row_is_reported() {
        let mut csv = b"amount,account_name,timestamp\n".to_vec();
        csv.extend_from_slice(b"10,\xff\xfe,2024-01-15T13:45:00\n");
        csv.extend_from_slice(b"20,Neha,2024-01-15T13:45:00\n");

        let parsed = parse_bytes(&csv).unwrap();

        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].line, 2);
        assert!(matches!(parsed.skipped[0].kind, RowErrorKind::Unreadable(_)));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("499"), Ok(499.0));
        assert_eq!(parse_amount(" 12.75 "), Ok(12.75));
        assert_eq!(parse_amount("-0"), Ok(0.0));
        assert!(parse_amount("1,200").is_err());
        assert!(parse_amount("inf").is_err());
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.csv");
        std::fs::write(&path, "amount,account_name,timestamp\n5,Arjun,2024-05-01T10:00:00\n")
            .unwrap();

        let parsed = parse_file(&path).unwrap();
        assert_eq!(parsed.transactions[0].account_name, "Arjun");
    }
}
