// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gpay_analyzer::{
    analyze_file, format_amount, pie_slices, write_csv, AnalyzerConfig, Analysis, Category,
    TransactionRow,
};

#[derive(Parser)]
#[command(name = "gpay-analyzer", version, about = "Classify a GPay transaction export into Merchant / Friend / Stranger")]
struct Cli {
    /// Membership configuration file (JSON)
    #[arg(short, long, global = true, env = "GPAY_ANALYZER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print spending by category
    Analyze {
        /// CSV with `amount`, `account_name`, `timestamp` columns
        file: PathBuf,

        /// Also list the transactions of one category
        #[arg(long)]
        category: Option<Category>,
    },

    /// Write the classified table as CSV
    Export {
        file: PathBuf,

        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Browse categories and transactions in the terminal
    Browse { file: PathBuf },

    /// Write the default configuration to a file
    InitConfig {
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    gpay_analyzer::init_logging("warn");

    let cli = Cli::parse();
    let config = AnalyzerConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Command::Analyze { file, category } => run_analyze(&config, &file, category),
        Command::Export { file, output } => run_export(&config, &file, output.as_deref()),
        Command::Browse { file } => run_ui_mode(&config, &file),
        Command::InitConfig { path, force } => run_init_config(&path, force),
    }
}

fn load(config: &AnalyzerConfig, file: &Path) -> Result<Analysis> {
    let analysis = analyze_file(file, &config.classifier())
        .with_context(|| format!("Failed to analyze {}", file.display()))?;
    Ok(analysis)
}

fn run_analyze(config: &AnalyzerConfig, file: &Path, category: Option<Category>) -> Result<()> {
    println!("📂 Loading {}...", file.display());
    let analysis = load(config, file)?;
    let symbol = config.currency_symbol.as_str();

    println!(
        "✓ Parsed {} transactions ({} skipped)",
        analysis.transactions().len(),
        analysis.skipped().len()
    );

    if analysis.is_empty() {
        println!("\n📭 No transactions to display.");
        print_skipped(&analysis);
        return Ok(());
    }

    println!("\nSpending by Category");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for slice in pie_slices(analysis.aggregation()) {
        let bar = "█".repeat((slice.share * 30.0).round() as usize);
        println!(
            "  {:<10} {:>14} {:>6} txs {:>6.1}%  {}",
            slice.category.as_str(),
            format_amount(slice.total_amount, symbol),
            slice.count,
            slice.share * 100.0,
            bar
        );
    }

    let aggregation = analysis.aggregation();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "  {:<10} {:>14} {:>6} txs",
        "Total",
        format_amount(aggregation.grand_total(), symbol),
        aggregation.transaction_count()
    );

    if let Some(category) = category {
        println!("\n#### Transactions under: {}", category);
        let rows = analysis.rows_for_category(category);
        if rows.is_empty() {
            println!("   No transactions in this category.");
        }
        for tx in rows {
            let row = TransactionRow::new(tx, symbol);
            println!("   [line {:>4}] {}", row.line, row.label);
        }
    }

    print_skipped(&analysis);
    Ok(())
}

fn print_skipped(analysis: &Analysis) {
    if analysis.skipped().is_empty() {
        return;
    }

    println!("\n⚠️  Skipped {} malformed rows:", analysis.skipped().len());
    for err in analysis.skipped() {
        println!("   {}", err);
    }
}

fn run_export(config: &AnalyzerConfig, file: &Path, output: Option<&Path>) -> Result<()> {
    let analysis = load(config, file)?;

    match output {
        Some(path) => {
            let out = fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_csv(&analysis, io::BufWriter::new(out))?;
            eprintln!(
                "✓ Exported {} transactions to {}",
                analysis.transactions().len(),
                path.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_csv(&analysis, &mut lock)?;
            lock.flush()?;
        }
    }

    if !analysis.skipped().is_empty() {
        eprintln!("⚠️  {} malformed rows were not exported", analysis.skipped().len());
    }

    Ok(())
}

fn run_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let json = AnalyzerConfig::default().to_json_pretty()?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✓ Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AnalyzerConfig, file: &Path) -> Result<()> {
    println!("🖥️  Loading GPay Transaction Analyzer UI...\n");

    let analysis = load(config, file)?;

    if analysis.is_empty() {
        println!("📭 No transactions to display.");
        print_skipped(&analysis);
        return Ok(());
    }

    println!("✓ Loaded {} transactions\n", analysis.transactions().len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(analysis, config.currency_symbol.clone());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AnalyzerConfig, _file: &Path) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use web UI: cargo run --bin gpay-server --features server");
    std::process::exit(1);
}
