// 📥 CSV Export
// Input columns (input order) + appended `category`

use std::io::Write;

use crate::analysis::Analysis;
use crate::error::Result;
use crate::parser::{ColumnRole, CATEGORY_COLUMN};
use crate::transaction::ClassifiedTransaction;

/// Suggested download name
pub const EXPORT_FILE_NAME: &str = "transaction_analysis.csv";

/// Write every classified transaction, in input order.
pub fn write_csv<W: Write>(analysis: &Analysis, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let columns: Vec<(&str, ColumnRole)> = analysis.columns().output_columns().collect();

    let mut header: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    header.push(CATEGORY_COLUMN);
    wtr.write_record(&header)?;

    for tx in analysis.transactions() {
        let mut record: Vec<String> = columns
            .iter()
            .map(|(_, role)| field_value(tx, *role))
            .collect();
        record.push(tx.category.as_str().to_string());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn to_csv_bytes(analysis: &Analysis) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(analysis, &mut buf)?;
    Ok(buf)
}

fn field_value(tx: &ClassifiedTransaction, role: ColumnRole) -> String {
    let t = &tx.transaction;
    match role {
        // Shortest representation that parses back to the same value
        ColumnRole::Amount => t.amount.to_string(),
        ColumnRole::AccountName => t.account_name.clone(),
        ColumnRole::Timestamp => t.timestamp_string(),
        ColumnRole::Extra(i) => t.extra.get(i).cloned().unwrap_or_default(),
        ColumnRole::Derived => tx.category.as_str().to_string(),
    }
}
