// GPay Transaction Analyzer - Core Library
// Exposes all modules for use in CLI, web server, and tests

pub mod error;
pub mod transaction;
pub mod config;
pub mod parser;      // CSV input + schema validation
pub mod classifier;  // Merchant / Friend / Stranger lookup
pub mod aggregator;  // Group-by-category totals
pub mod analysis;    // parse → classify → aggregate
pub mod export;
pub mod report;      // Pie chart, drill-down, detail views
pub mod session;

// Re-export commonly used types
pub use error::{AnalyzerError, Result, RowError, RowErrorKind};
pub use transaction::{
    Category, ClassifiedTransaction, Transaction,
    parse_source_timestamp, format_source_timestamp,
};
pub use config::{AnalyzerConfig, MatchMode, Precedence};
pub use parser::{ColumnMap, ColumnRole, ParsedFile, parse_csv, parse_bytes, parse_file};
pub use classifier::{classify, Classifier};
pub use aggregator::{aggregate, rows_for_category, Aggregation, CategoryGroup};
pub use analysis::{analyze_bytes, analyze_file, Analysis};
pub use export::{write_csv, to_csv_bytes, EXPORT_FILE_NAME};
pub use report::{
    PieSlice, Summary, TransactionDetail, TransactionRow,
    pie_slices, render_pie_svg, display_timestamp, format_amount, transaction_label,
};
pub use session::{Session, SessionStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the `tracing` subscriber used by both binaries.
/// `RUST_LOG` overrides `default_filter`.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Ignore a second install (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
