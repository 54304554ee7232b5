// 🔄 Analysis Pipeline
// parse → classify → aggregate, one immutable value per uploaded file

use std::path::Path;

use crate::aggregator::{aggregate, rows_for_category, Aggregation};
use crate::classifier::Classifier;
use crate::error::{AnalyzerError, Result, RowError};
use crate::parser::{parse_bytes, parse_file, ColumnMap, ParsedFile};
use crate::transaction::{Category, ClassifiedTransaction, Transaction};

/// Everything derived from one upload. Held in memory for the session only.
#[derive(Debug, Clone)]
pub struct Analysis {
    columns: ColumnMap,
    transactions: Vec<ClassifiedTransaction>,
    aggregation: Aggregation,
    skipped: Vec<RowError>,
}

impl Analysis {
    pub fn from_parsed(parsed: ParsedFile, classifier: &Classifier) -> Self {
        let transactions = classifier.classify_all(parsed.transactions);
        let aggregation = aggregate(&transactions);

        if !parsed.skipped.is_empty() {
            tracing::warn!(
                skipped = parsed.skipped.len(),
                "some rows were excluded from the analysis"
            );
        }

        Analysis {
            columns: parsed.columns,
            transactions,
            aggregation,
            skipped: parsed.skipped,
        }
    }

    /// No successfully parsed transactions (empty-state, not an error)
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// All classified transactions in input order
    pub fn transactions(&self) -> &[ClassifiedTransaction] {
        &self.transactions
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    /// Rows excluded as malformed
    pub fn skipped(&self) -> &[RowError] {
        &self.skipped
    }

    pub fn rows_for_category(&self, category: Category) -> &[ClassifiedTransaction] {
        rows_for_category(&self.aggregation, category)
    }

    /// Detail lookup by the row's line in the uploaded file
    pub fn transaction_at_line(&self, line: usize) -> Result<&ClassifiedTransaction> {
        self.transactions
            .iter()
            .find(|tx| tx.line() == line)
            .ok_or(AnalyzerError::TransactionNotFound(line))
    }

    /// Re-run classification with a different membership configuration.
    /// Returns a new value; `self` is left untouched.
    pub fn reclassify(&self, classifier: &Classifier) -> Analysis {
        let transactions: Vec<Transaction> = self
            .transactions
            .iter()
            .map(|tx| tx.transaction.clone())
            .collect();

        Analysis::from_parsed(
            ParsedFile {
                columns: self.columns.clone(),
                transactions,
                skipped: self.skipped.clone(),
            },
            classifier,
        )
    }
}

pub fn analyze_bytes(bytes: &[u8], classifier: &Classifier) -> Result<Analysis> {
    let parsed = parse_bytes(bytes)?;
    Ok(Analysis::from_parsed(parsed, classifier))
}

pub fn analyze_file(path: &Path, classifier: &Classifier) -> Result<Analysis> {
    let parsed = parse_file(path)?;
    Ok(Analysis::from_parsed(parsed, classifier))
}
