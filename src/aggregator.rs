// 📊 Aggregator
// Group classified transactions by category: totals, counts, ordered rows

use serde::Serialize;
use std::collections::BTreeMap;

use crate::transaction::{Category, ClassifiedTransaction};

/// One category's share of the upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
    pub total_amount: f64,
    pub count: usize,
    /// Input order preserved
    pub rows: Vec<ClassifiedTransaction>,
}

/// Category → group. Categories without transactions are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    groups: BTreeMap<Category, CategoryGroup>,
}

pub fn aggregate(transactions: &[ClassifiedTransaction]) -> Aggregation {
    let mut groups: BTreeMap<Category, CategoryGroup> = BTreeMap::new();

    for tx in transactions {
        let group = groups.entry(tx.category).or_insert_with(|| CategoryGroup {
            total_amount: 0.0,
            count: 0,
            rows: Vec::new(),
        });
        group.total_amount += tx.amount();
        group.count += 1;
        group.rows.push(tx.clone());
    }

    Aggregation { groups }
}

/// Drill-down query: the rows of one category (empty when absent).
pub fn rows_for_category(aggregation: &Aggregation, category: Category) -> &[ClassifiedTransaction] {
    aggregation
        .get(category)
        .map(|g| g.rows.as_slice())
        .unwrap_or(&[])
}

impl Aggregation {
    pub fn get(&self, category: Category) -> Option<&CategoryGroup> {
        self.groups.get(&category)
    }

    /// Groups in category order (Merchant, Friend, Stranger)
    pub fn iter(&self) -> impl Iterator<Item = (Category, &CategoryGroup)> {
        self.groups.iter().map(|(c, g)| (*c, g))
    }

    pub fn categories(&self) -> Vec<Category> {
        self.groups.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn grand_total(&self) -> f64 {
        self.groups.values().map(|g| g.total_amount).sum()
    }

    pub fn transaction_count(&self) -> usize {
        self.groups.values().map(|g| g.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{parse_source_timestamp, Transaction};

    fn classified(amount: f64, name: &str, category: Category, line: usize) -> ClassifiedTransaction {
        let ts = parse_source_timestamp("2024-01-15T12:00:00").unwrap();
        ClassifiedTransaction {
            transaction: Transaction::new(amount, name, ts, line),
            category,
        }
    }

    fn sample() -> Vec<ClassifiedTransaction> {
        vec![
            classified(499.0, "Swiggy", Category::Merchant, 2),
            classified(1200.0, "Rahul", Category::Friend, 3),
            classified(50.0, "RandomGuy99", Category::Stranger, 4),
            classified(250.0, "Zomato", Category::Merchant, 5),
        ]
    }

    #[test]
    fn test_scenario_totals_and_counts() {
        let agg = aggregate(&sample()[..3]);

        let merchant = agg.get(Category::Merchant).unwrap();
        let friend = agg.get(Category::Friend).unwrap();
        let stranger = agg.get(Category::Stranger).unwrap();

        assert_eq!((merchant.total_amount, merchant.count), (499.0, 1));
        assert_eq!((friend.total_amount, friend.count), (1200.0, 1));
        assert_eq!((stranger.total_amount, stranger.count), (50.0, 1));
    }

    #[test]
    fn test_empty_categories_are_omitted() {
        let agg = aggregate(&[classified(10.0, "Neha", Category::Friend, 2)]);

        assert_eq!(agg.categories(), vec![Category::Friend]);
        assert!(agg.get(Category::Merchant).is_none());
        assert!(rows_for_category(&agg, Category::Merchant).is_empty());
    }

    #[test]
    fn test_rows_preserve_input_order() {
        let agg = aggregate(&sample());
        let lines: Vec<usize> = rows_for_category(&agg, Category::Merchant)
            .iter()
            .map(|r| r.line())
            .collect();

        assert_eq!(lines, vec![2, 5]);
    }

    #[test]
    fn test_totals_are_order_independent() {
        let rows = sample();
        let mut reversed = rows.clone();
        reversed.reverse();

        let a = aggregate(&rows);
        let b = aggregate(&reversed);

        for category in Category::ALL {
            let (ga, gb) = (a.get(category).unwrap(), b.get(category).unwrap());
            assert_eq!(ga.total_amount, gb.total_amount);
            assert_eq!(ga.count, gb.count);
        }
    }

    #[test]
    fn test_sum_invariant() {
        let rows = sample();
        let agg = aggregate(&rows);
        let direct: f64 = rows.iter().map(|r| r.amount()).sum();

        assert_eq!(agg.grand_total(), direct);
        assert_eq!(agg.transaction_count(), rows.len());
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(aggregate(&sample()), aggregate(&sample()));
    }

    #[test]
    fn test_empty_input() {
        let agg = aggregate(&[]);
        assert!(agg.is_empty());
        assert_eq!(agg.grand_total(), 0.0);
    }
}
