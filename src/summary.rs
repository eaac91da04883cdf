// Derived views - recomputed from the current records, never stored

use crate::model::{Category, ExpenseRecord};

/// Sum of every amount. Zero for an empty ledger.
pub fn total(records: &[ExpenseRecord]) -> f64 {
    // Float `sum()` starts from -0.0, which would print as "$-0.00"
    records.iter().fold(0.0, |sum, r| sum + r.amount)
}

/// Per-category subtotals, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals {
    buckets: Vec<(Category, f64)>,
}

impl CategoryTotals {
    pub fn get(&self, category: Category) -> Option<f64> {
        self.buckets
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, amount)| *amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.buckets.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Categories without records are left out rather than reported as zero.
pub fn totals_by_category(records: &[ExpenseRecord]) -> CategoryTotals {
    let mut buckets: Vec<(Category, f64)> = Vec::new();

    for record in records {
        match buckets.iter_mut().find(|(c, _)| *c == record.category) {
            Some((_, sum)) => *sum += record.amount,
            None => buckets.push((record.category, record.amount)),
        }
    }

    CategoryTotals { buckets }
}

/// Two decimal places behind the currency symbol, e.g. `$4.50`.
pub fn format_amount(amount: f64, currency_symbol: &str) -> String {
    format!("{}{:.2}", currency_symbol, amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: &str, amount: f64, category: Category) -> ExpenseRecord {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        ExpenseRecord::new(id, format!("item {}", id), amount, category, date)
    }

    #[test]
    fn test_total_empty_is_zero() {
        assert_eq!(total(&[]), 0.0);
        assert!(total(&[]).is_sign_positive(), "Empty total must not be negative zero");
        assert_eq!(format_amount(total(&[]), "$"), "$0.00");
        assert!(totals_by_category(&[]).is_empty());
    }

    #[test]
    fn test_buckets_follow_first_appearance() {
        let records = vec![
            record("1", 10.0, Category::Shopping),
            record("2", 2.5, Category::Food),
            record("3", 7.5, Category::Shopping),
            record("4", 1.0, Category::Bills),
        ];

        let totals = totals_by_category(&records);
        let order: Vec<Category> = totals.iter().map(|(c, _)| c).collect();

        assert_eq!(order, vec![Category::Shopping, Category::Food, Category::Bills]);
        assert_eq!(totals.get(Category::Shopping), Some(17.5));
        assert_eq!(totals.get(Category::Transport), None, "Absent category has no bucket");
    }

    #[test]
    fn test_buckets_sum_to_total() {
        let records = vec![
            record("1", 0.1, Category::Food),
            record("2", 0.2, Category::Transport),
            record("3", 19.99, Category::Food),
            record("4", 0.0, Category::Other),
            record("5", 120.5, Category::Entertainment),
        ];

        let bucket_sum: f64 = totals_by_category(&records).iter().map(|(_, a)| a).sum();
        assert!((bucket_sum - total(&records)).abs() < 1e-9);
        assert_eq!(totals_by_category(&records).len(), 4);
    }

    #[test]
    fn test_format_amount_two_decimals() {
        assert_eq!(format_amount(4.5, "$"), "$4.50");
        assert_eq!(format_amount(0.0, "$"), "$0.00");
        assert_eq!(format_amount(1234.5678, "$"), "$1234.57");
    }
}
