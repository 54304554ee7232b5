// 🥧 Presentation Models
// Pie slices, drill-down rows and the single-transaction detail view

use chrono::NaiveDateTime;
use serde::Serialize;
use std::f64::consts::PI;
use std::fmt::Write as _;

use crate::aggregator::Aggregation;
use crate::analysis::Analysis;
use crate::error::RowError;
use crate::transaction::{Category, ClassifiedTransaction};

/// Human-readable timestamp, e.g. `15 Jan 2024, 01:45 PM`
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%d %b %Y, %I:%M %p";

pub fn display_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(DISPLAY_TIMESTAMP_FORMAT).to_string()
}

pub fn format_amount(amount: f64, currency_symbol: &str) -> String {
    format!("{}{:.2}", currency_symbol, amount)
}

/// One-line label used by list pickers: `₹499.00  →  Swiggy  on  15 Jan 2024, 01:45 PM`
pub fn transaction_label(tx: &ClassifiedTransaction, currency_symbol: &str) -> String {
    format!(
        "{}  →  {}  on  {}",
        format_amount(tx.amount(), currency_symbol),
        tx.account_name(),
        display_timestamp(&tx.transaction.timestamp)
    )
}

// ============================================================================
// PIE CHART
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub category: Category,
    pub total_amount: f64,
    pub count: usize,
    /// Fraction of the grand total (0.0 when the grand total is zero)
    pub share: f64,
    pub color: &'static str,
}

/// Slices sorted by total, largest first; ties keep category order.
pub fn pie_slices(aggregation: &Aggregation) -> Vec<PieSlice> {
    let grand_total = aggregation.grand_total();

    let mut slices: Vec<PieSlice> = aggregation
        .iter()
        .map(|(category, group)| PieSlice {
            category,
            total_amount: group.total_amount,
            count: group.count,
            share: if grand_total > 0.0 {
                group.total_amount / grand_total
            } else {
                0.0
            },
            color: category.color(),
        })
        .collect();

    slices.sort_by(|a, b| {
        b.total_amount
            .total_cmp(&a.total_amount)
            .then(a.category.cmp(&b.category))
    });
    slices
}

/// Render slices as a standalone SVG. Each slice carries `data-category` so a
/// page can wire clicks to the drill-down table.
pub fn render_pie_svg(slices: &[PieSlice], size: u32, currency_symbol: &str) -> String {
    let r = f64::from(size) / 2.0;
    let mut svg = String::new();

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}" role="img" aria-label="Spending Distribution">"#
    );

    let drawable: Vec<&PieSlice> = slices.iter().filter(|s| s.share > 0.0).collect();

    if drawable.is_empty() {
        let _ = write!(
            svg,
            r##"<circle cx="{r}" cy="{r}" r="{r}" fill="#e0e0e0"/><text x="{r}" y="{r}" text-anchor="middle" dominant-baseline="middle" font-family="sans-serif" font-size="14">No spending</text>"##
        );
    } else if drawable.len() == 1 {
        let s = drawable[0];
        let _ = write!(
            svg,
            r#"<circle class="slice" data-category="{}" cx="{r}" cy="{r}" r="{r}" fill="{}"><title>{}</title></circle>"#,
            s.category,
            s.color,
            slice_title(s, currency_symbol)
        );
    } else {
        // Start at 12 o'clock, clockwise
        let mut angle = -PI / 2.0;
        for s in drawable {
            let sweep = s.share * 2.0 * PI;
            let (x1, y1) = (r + r * angle.cos(), r + r * angle.sin());
            let end = angle + sweep;
            let (x2, y2) = (r + r * end.cos(), r + r * end.sin());
            let large_arc = if sweep > PI { 1 } else { 0 };

            let _ = write!(
                svg,
                r##"<path class="slice" data-category="{}" d="M {r:.3} {r:.3} L {x1:.3} {y1:.3} A {r:.3} {r:.3} 0 {large_arc} 1 {x2:.3} {y2:.3} Z" fill="{}" stroke="#ffffff" stroke-width="1"><title>{}</title></path>"##,
                s.category,
                s.color,
                slice_title(s, currency_symbol)
            );
            angle = end;
        }
    }

    svg.push_str("</svg>");
    svg
}

fn slice_title(slice: &PieSlice, currency_symbol: &str) -> String {
    format!(
        "{}: {} ({:.1}%, {} transactions)",
        slice.category,
        format_amount(slice.total_amount, currency_symbol),
        slice.share * 100.0,
        slice.count
    )
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub empty: bool,
    pub message: Option<String>,
    pub total_transactions: usize,
    pub grand_total: f64,
    pub currency_symbol: String,
    pub slices: Vec<PieSlice>,
    pub skipped_count: usize,
    pub skipped: Vec<RowError>,
}

impl Summary {
    pub fn from_analysis(analysis: &Analysis, currency_symbol: &str) -> Self {
        let aggregation = analysis.aggregation();
        let skipped = analysis.skipped().to_vec();

        let message = if analysis.is_empty() {
            Some(if skipped.is_empty() {
                "No transactions to display.".to_string()
            } else {
                format!(
                    "No transactions to display: all {} rows were skipped.",
                    skipped.len()
                )
            })
        } else {
            None
        };

        Summary {
            empty: analysis.is_empty(),
            message,
            total_transactions: aggregation.transaction_count(),
            grand_total: aggregation.grand_total(),
            currency_symbol: currency_symbol.to_string(),
            slices: pie_slices(aggregation),
            skipped_count: skipped.len(),
            skipped,
        }
    }
}

// ============================================================================
// DRILL-DOWN + DETAIL
// ============================================================================

/// Row of the drill-down table
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
    pub line: usize,
    pub amount: f64,
    pub display_amount: String,
    pub account_name: String,
    pub display_timestamp: String,
    pub category: Category,
    pub label: String,
}

impl TransactionRow {
    pub fn new(tx: &ClassifiedTransaction, currency_symbol: &str) -> Self {
        TransactionRow {
            line: tx.line(),
            amount: tx.amount(),
            display_amount: format_amount(tx.amount(), currency_symbol),
            account_name: tx.account_name().to_string(),
            display_timestamp: display_timestamp(&tx.transaction.timestamp),
            category: tx.category,
            label: transaction_label(tx, currency_symbol),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtraField {
    pub name: String,
    pub value: String,
}

/// Full field set of one transaction
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetail {
    pub line: usize,
    pub amount: f64,
    pub display_amount: String,
    pub account_name: String,
    pub category: Category,
    pub timestamp: String,
    pub display_timestamp: String,
    pub extra: Vec<ExtraField>,
}

impl TransactionDetail {
    pub fn new(analysis: &Analysis, tx: &ClassifiedTransaction, currency_symbol: &str) -> Self {
        let extra = analysis
            .columns()
            .extra_headers()
            .into_iter()
            .zip(tx.transaction.extra.iter())
            .map(|(name, value)| ExtraField {
                name: name.to_string(),
                value: value.clone(),
            })
            .collect();

        TransactionDetail {
            line: tx.line(),
            amount: tx.amount(),
            display_amount: format_amount(tx.amount(), currency_symbol),
            account_name: tx.account_name().to_string(),
            category: tx.category,
            timestamp: tx.transaction.timestamp_string(),
            display_timestamp: display_timestamp(&tx.transaction.timestamp),
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_bytes;
    use crate::classifier::Classifier;

    const INPUT: &str = "amount,account_name,timestamp,note\n\
                         499,Swiggy,2024-01-15T13:45:00,dinner\n\
                         1200,Rahul,2024-01-16T09:10:00,rent share\n\
                         50,RandomGuy99,2024-01-17T22:05:00,\n\
                         101,Zomato,2024-01-18T00:30:00,lunch\n";

    fn analysis() -> Analysis {
        analyze_bytes(INPUT.as_bytes(), &Classifier::default()).unwrap()
    }

    #[test]
    fn test_display_timestamp() {
        let ts = crate::transaction::parse_source_timestamp("2024-01-18T00:30:00").unwrap();
        assert_eq!(display_timestamp(&ts), "18 Jan 2024, 12:30 AM");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(499.0, "₹"), "₹499.00");
        assert_eq!(format_amount(12.5, "$"), "$12.50");
    }

    #[test]
    fn test_pie_slices_sorted_by_total() {
        let slices = pie_slices(analysis().aggregation());
        let order: Vec<Category> = slices.iter().map(|s| s.category).collect();

        assert_eq!(order, vec![Category::Friend, Category::Merchant, Category::Stranger]);
        assert_eq!(slices[1].total_amount, 600.0);
        assert_eq!(slices[1].count, 2);

        let share_sum: f64 = slices.iter().map(|s| s.share).sum();
        assert!((share_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_total_has_zero_shares() {
        let csv = "amount,account_name,timestamp\n0,Swiggy,2024-01-15T13:45:00\n";
        let analysis = analyze_bytes(csv.as_bytes(), &Classifier::default()).unwrap();
        let slices = pie_slices(analysis.aggregation());

        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].share, 0.0);
        assert!(render_pie_svg(&slices, 200, "₹").contains("No spending"));
    }

    #[test]
    fn test_render_pie_svg_has_clickable_slices() {
        let slices = pie_slices(analysis().aggregation());
        let svg = render_pie_svg(&slices, 300, "₹");

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<path class=\"slice\"").count(), 3);
        for category in Category::ALL {
            assert!(svg.contains(&format!("data-category=\"{}\"", category)));
        }
    }

    #[test]
    fn test_render_single_slice_is_full_circle() {
        let csv = "amount,account_name,timestamp\n10,Neha,2024-01-15T13:45:00\n";
        let analysis = analyze_bytes(csv.as_bytes(), &Classifier::default()).unwrap();
        let svg = render_pie_svg(&pie_slices(analysis.aggregation()), 100, "₹");

        assert!(svg.contains("<circle class=\"slice\" data-category=\"Friend\""));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_summary_empty_state() {
        let csv = "amount,account_name,timestamp\nabc,Swiggy,2024-01-15T13:45:00\n";
        let analysis = analyze_bytes(csv.as_bytes(), &Classifier::default()).unwrap();
        let summary = Summary::from_analysis(&analysis, "₹");

        assert!(summary.empty);
        assert_eq!(summary.skipped_count, 1);
        assert!(summary.message.unwrap().contains("all 1 rows were skipped"));
        assert!(summary.slices.is_empty());
    }

    #[test]
    fn test_summary_totals() {
        let summary = Summary::from_analysis(&analysis(), "₹");

        assert!(!summary.empty);
        assert!(summary.message.is_none());
        assert_eq!(summary.total_transactions, 4);
        assert_eq!(summary.grand_total, 1850.0);
    }

    #[test]
    fn test_transaction_row_label() {
        let analysis = analysis();
        let tx = analysis.transaction_at_line(2).unwrap();
        let row = TransactionRow::new(tx, "₹");

        assert_eq!(row.label, "₹499.00  →  Swiggy  on  15 Jan 2024, 01:45 PM");
        assert_eq!(row.category, Category::Merchant);
    }

    #[test]
    fn test_transaction_detail_includes_extra_fields() {
        let analysis = analysis();
        let tx = analysis.transaction_at_line(3).unwrap();
        let detail = TransactionDetail::new(&analysis, tx, "₹");

        assert_eq!(detail.account_name, "Rahul");
        assert_eq!(detail.category, Category::Friend);
        assert_eq!(detail.timestamp, "2024-01-16T09:10:00");
        assert_eq!(detail.display_timestamp, "16 Jan 2024, 09:10 AM");
        assert_eq!(
            detail.extra,
            vec![ExtraField {
                name: "note".to_string(),
                value: "rent share".to_string()
            }]
        );
    }
}
