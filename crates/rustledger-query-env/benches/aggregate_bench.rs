//! Aggregation lifecycle benchmarks.
//!
//! Run with: cargo bench -p rustledger-query-env

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use rustledger_core::{Amount, Directive, Posting, Transaction};
use rustledger_query_env::{Allocator, Environment, Expr, PostingColumn, PostingContext};

/// Generate sample directives for benchmarking.
fn generate_directives(num_transactions: usize) -> Vec<Directive> {
    let categories = ["Food", "Coffee", "Groceries", "Transport"];
    let payees = ["Store A", "Store B", "Cafe", "Gas Station", "Supermarket"];

    (0..num_transactions)
        .map(|i| {
            let category = categories[i % categories.len()];
            let payee = payees[i % payees.len()];
            let amount = dec!(10.00) + rust_decimal::Decimal::from(i as i32 % 100);
            let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                + chrono::Days::new((i % 365) as u64);

            Directive::Transaction(
                Transaction::new(date, format!("Transaction {i}"))
                    .with_flag('*')
                    .with_payee(payee)
                    .with_posting(Posting::new(
                        format!("Expenses:{category}"),
                        Amount::new(amount, "USD"),
                    ))
                    .with_posting(Posting::new(
                        "Assets:Bank:Checking",
                        Amount::new(-amount, "USD"),
                    )),
            )
        })
        .collect()
}

fn compile_targets() -> Vec<Expr<PostingColumn>> {
    let env = Environment::targets();
    ["sum:change", "sum:number", "count:account", "max:date", "first:payee"]
        .iter()
        .map(|target| {
            let (function, column) = target.split_once(':').unwrap();
            env.get_function(function, vec![env.get_column(column).unwrap()])
                .unwrap()
        })
        .collect()
}

/// One group over every posting of the ledger.
fn run_group(directives: &[Directive], targets: &[Expr<PostingColumn>], allocator: &Allocator) {
    let mut store = allocator.store();
    let aggregators: Vec<_> = targets.iter().flat_map(Expr::aggregators).collect();
    for aggregator in &aggregators {
        aggregator.initialize(&mut store).unwrap();
    }
    for entry in directives {
        for row in PostingContext::iter(entry) {
            for aggregator in &aggregators {
                aggregator.update(&mut store, &row).unwrap();
            }
        }
    }
    for aggregator in &aggregators {
        black_box(aggregator.finalize(&store).unwrap());
    }
}

fn bench_aggregate_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_lifecycle");

    for size in [100, 1000, 5000] {
        let directives = generate_directives(size);
        let mut targets = compile_targets();
        let mut allocator = Allocator::new();
        for expr in &mut targets {
            expr.allocate(&mut allocator).unwrap();
        }

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &directives,
            |b, directives| {
                b.iter(|| run_group(black_box(directives), &targets, &allocator));
            },
        );
    }

    group.finish();
}

fn bench_column_evaluation(c: &mut Criterion) {
    let directives = generate_directives(1000);
    let env = Environment::postings();
    let columns: Vec<_> = ["account", "weight", "change", "id"]
        .iter()
        .map(|name| env.get_column(name).unwrap())
        .collect();

    let mut group = c.benchmark_group("column_evaluation");
    group.throughput(Throughput::Elements(2000));
    group.bench_function("posting_columns", |b| {
        b.iter(|| {
            for entry in &directives {
                for row in PostingContext::iter(entry) {
                    for column in &columns {
                        black_box(column.evaluate(&row));
                    }
                }
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_aggregate_lifecycle, bench_column_evaluation);
criterion_main!(benches);
