//! Property-based tests for the aggregation lifecycle.
//!
//! Run with: cargo test -p rustledger-query-env --test `aggregate_property_tests`

use proptest::prelude::*;
use rust_decimal::Decimal;
use rustledger_core::{Amount, Directive, NaiveDate, Posting, Transaction};
use rustledger_query_env::{Allocator, Environment, PostingContext, Value};

// ============================================================================
// Helpers
// ============================================================================

fn arb_number() -> impl Strategy<Value = Decimal> {
    (-100_000i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_currency() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("USD".to_string()),
        Just("EUR".to_string()),
        Just("CAD".to_string()),
    ]
}

fn arb_rows(min_len: usize) -> impl Strategy<Value = Vec<(Decimal, String)>> {
    prop::collection::vec((arb_number(), arb_currency()), min_len..20)
}

/// One transaction holding a posting per amount, all to the same account.
fn ledger(amounts: &[(Decimal, String)]) -> Directive {
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let mut txn = Transaction::new(date, "Generated");
    for (number, currency) in amounts {
        txn = txn.with_posting(Posting::new(
            "Assets:Account",
            Amount::new(*number, currency.clone()),
        ));
    }
    Directive::Transaction(txn)
}

/// Compile `function(column)` as a target and run it over every posting.
fn aggregate(function: &str, column: &str, entry: &Directive) -> Value {
    let env = Environment::targets();
    let mut expr = env
        .get_function(function, vec![env.get_column(column).unwrap()])
        .unwrap();
    let mut allocator = Allocator::new();
    expr.allocate(&mut allocator).unwrap();
    let mut store = allocator.store();

    let aggregator = expr.aggregators()[0];
    aggregator.initialize(&mut store).unwrap();
    for row in PostingContext::iter(entry) {
        aggregator.update(&mut store, &row).unwrap();
    }
    aggregator.finalize(&store).unwrap()
}

// ============================================================================
// Aggregation Laws
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// `count` finalizes to the number of rows.
    #[test]
    fn prop_count_is_row_count(amounts in arb_rows(0)) {
        let entry = ledger(&amounts);
        let rows = Value::Integer(amounts.len() as i64);
        prop_assert_eq!(aggregate("count", "account", &entry), rows);
    }

    /// Reordering rows does not change `sum` over numbers or amounts.
    #[test]
    fn prop_sum_order_independent(amounts in arb_rows(0)) {
        let mut reversed = amounts.clone();
        reversed.reverse();
        let forward = ledger(&amounts);
        let backward = ledger(&reversed);

        for column in ["number", "weight"] {
            prop_assert_eq!(
                aggregate("sum", column, &forward),
                aggregate("sum", column, &backward)
            );
        }
    }

    /// `sum(number)` equals the plain decimal sum.
    #[test]
    fn prop_sum_matches_total(amounts in arb_rows(0)) {
        let total: Decimal = amounts.iter().map(|(n, _)| *n).sum();
        prop_assert_eq!(aggregate("sum", "number", &ledger(&amounts)), Value::Number(total));
    }

    /// `first` and `last` report the first and last row.
    #[test]
    fn prop_first_and_last(amounts in arb_rows(1)) {
        let entry = ledger(&amounts);
        prop_assert_eq!(aggregate("first", "number", &entry), Value::Number(amounts[0].0));
        prop_assert_eq!(
            aggregate("last", "number", &entry),
            Value::Number(amounts[amounts.len() - 1].0)
        );
    }

    /// `min` and `max` are the extremes of the rows and the zero seed.
    #[test]
    fn prop_min_max_include_zero_seed(amounts in arb_rows(0)) {
        let entry = ledger(&amounts);
        let numbers = amounts.iter().map(|(n, _)| *n);
        let min = numbers.clone().fold(Decimal::ZERO, Decimal::min);
        let max = numbers.fold(Decimal::ZERO, Decimal::max);

        prop_assert_eq!(aggregate("min", "number", &entry), Value::Number(min));
        prop_assert_eq!(aggregate("max", "number", &entry), Value::Number(max));
    }

    /// `max(weight)` is the greatest amount, or null over no rows.
    #[test]
    fn prop_max_weight_is_greatest_amount(amounts in arb_rows(0)) {
        let greatest = amounts
            .iter()
            .map(|(number, currency)| Amount::new(*number, currency.clone()))
            .max()
            .map_or(Value::Null, Value::Amount);
        prop_assert_eq!(aggregate("max", "weight", &ledger(&amounts)), greatest);
    }
}
