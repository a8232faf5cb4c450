//! Property-based tests using proptest
//!
//! These tests verify the resource group filter, cost row parsing and date
//! normalisation using randomized inputs.

use azure_resource_mcp::tools::costs::{normalize_date, render_cost_report, CostReport, CostRow};
use azure_resource_mcp::tools::inventory::GroupFilter;
use proptest::prelude::*;
use serde_json::{json, Value};

/// Resource group names as Azure allows them (letters, digits, `-_.()`)
fn arb_group_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_().-]{1,40}"
}

fn arb_group_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_group_name(), 0..50)
}

fn filter_names<'a>(names: &'a [String], filter: &GroupFilter) -> Vec<&'a String> {
    names.iter().filter(|n| filter.matches(n)).collect()
}

/// A well-formed `[cost, yyyymmdd, currency]` row
fn arb_cost_row() -> impl Strategy<Value = Value> {
    (
        0.0f64..10_000.0,
        2000i32..2100,
        1u32..=12,
        1u32..=28,
        prop_oneof!["USD", "EUR", "GBP"],
    )
        .prop_map(|(cost, year, month, day, currency)| {
            json!([cost, year as u64 * 10_000 + month as u64 * 100 + day as u64, currency])
        })
}

proptest! {
    /// Empty filter returns all groups
    #[test]
    fn empty_filter_returns_all(names in arb_group_names()) {
        let filtered = filter_names(&names, &GroupFilter::new(Some("")));
        prop_assert_eq!(filtered.len(), names.len());
    }

    /// Filtering never increases the number of groups
    #[test]
    fn filter_never_increases_count(names in arb_group_names(), filter in ".*") {
        let filtered = filter_names(&names, &GroupFilter::new(Some(filter.as_str())));
        prop_assert!(filtered.len() <= names.len());
    }

    /// Filter case doesn't change the result
    #[test]
    fn filter_is_case_insensitive(names in arb_group_names(), filter in "[a-zA-Z]{1,5}") {
        let lower = filter_names(&names, &GroupFilter::new(Some(filter.to_lowercase().as_str())));
        let upper = filter_names(&names, &GroupFilter::new(Some(filter.to_uppercase().as_str())));
        prop_assert_eq!(lower, upper);
    }

    /// Every group matches a filter made from a slice of its own name
    #[test]
    fn name_fragment_always_matches(name in arb_group_name(), start in 0usize..40, len in 1usize..10) {
        let chars: Vec<char> = name.chars().collect();
        let start = start.min(chars.len() - 1);
        let end = (start + len).min(chars.len());
        let fragment: String = chars[start..end].iter().collect();
        prop_assert!(GroupFilter::new(Some(fragment.to_uppercase().as_str())).matches(&name));
    }

    /// Filtering keeps the provider order
    #[test]
    fn filter_preserves_order(names in arb_group_names(), filter in "[a-z]{1,2}") {
        let filtered = filter_names(&names, &GroupFilter::new(Some(filter.as_str())));
        let positions: Vec<usize> = filtered
            .iter()
            .map(|n| names.iter().position(|m| std::ptr::eq(m, *n)).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}

/// Tests for cost row parsing
mod cost_row_tests {
    use super::*;

    proptest! {
        /// Valid numeric dates always normalise to YYYY-MM-DD
        #[test]
        fn numeric_dates_normalise(year in 1900u64..2200, month in 1u64..=12, day in 1u64..=28) {
            let raw = year * 10_000 + month * 100 + day;
            let expected = format!("{:04}-{:02}-{:02}", year, month, day);
            prop_assert_eq!(normalize_date(&json!(raw)), expected.clone());
            prop_assert_eq!(normalize_date(&json!(raw.to_string())), expected);
        }

        /// Strings that aren't 8 digits are left untouched
        #[test]
        fn other_strings_pass_through(s in "[a-zA-Z0-9:-]{0,7}|[a-zA-Z0-9:-]{9,20}") {
            prop_assert_eq!(normalize_date(&json!(s.clone())), s);
        }

        /// Total equals the sum of parsed costs
        #[test]
        fn total_is_sum_of_rows(rows in prop::collection::vec(arb_cost_row(), 0..40)) {
            let report = CostReport::from_rows(&rows);
            let expected: f64 = rows.iter().map(|r| r[0].as_f64().unwrap()).sum();
            prop_assert_eq!(report.rows.len(), rows.len());
            prop_assert!((report.total - expected).abs() < 1e-6);
        }

        /// Junk rows are skipped without affecting the rest
        #[test]
        fn junk_rows_are_skipped(
            rows in prop::collection::vec(arb_cost_row(), 1..20),
            junk in prop::collection::vec(prop_oneof![
                Just(json!([])),
                Just(json!(["not-a-number", 20240101, "USD"])),
                Just(json!([1.0, 20240101])),
                Just(json!(null)),
            ], 0..10)
        ) {
            let mut mixed = rows.clone();
            mixed.extend(junk);
            let clean = CostReport::from_rows(&rows);
            let report = CostReport::from_rows(&mixed);
            prop_assert_eq!(report, clean);
        }

        /// Rendering has one table line per parsed row
        #[test]
        fn one_line_per_row(rows in prop::collection::vec(arb_cost_row(), 1..30)) {
            let report = CostReport::from_rows(&rows);
            let rendered = render_cost_report("sub", "MonthToDate", &report);
            let table_rows = rendered
                .lines()
                .filter(|l| l.starts_with("| ") && !l.starts_with("| Date"))
                .count();
            prop_assert_eq!(table_rows, rows.len());
        }
    }

    #[test]
    fn parse_keeps_currency_text() {
        let row = CostRow::parse(&json!([1.0, "20240101", "JPY"])).unwrap();
        assert_eq!(row.currency, "JPY");
    }
}
