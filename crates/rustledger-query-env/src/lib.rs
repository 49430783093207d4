//! Typed evaluation environments for the Beancount query language.
//!
//! This crate turns resolved identifiers and calls into type-checked
//! expression nodes and evaluates them over ledger rows. It does not parse
//! query text or plan queries; a compiler asks an [`Environment`] for nodes
//! and an executor evaluates them.
//!
//! # Environments
//!
//! - [`Environment::entries`] - the FROM clause, evaluated against directives
//! - [`Environment::postings`] - the WHERE clause, evaluated against postings
//! - [`Environment::targets`] - the target list, postings plus aggregates
//!
//! # Aggregation
//!
//! Aggregators keep their state in a [`Store`] owned by the executor. Each
//! aggregator gets a [`Handle`] once per compiled plan, then for every group
//! the executor calls `initialize`, `update` per row and `finalize`.
//!
//! # Example
//!
//! ```
//! use rustledger_core::{Amount, Directive, NaiveDate, Posting, Transaction};
//! use rustledger_query_env::{Allocator, Environment, PostingContext, Value};
//! use rust_decimal::Decimal;
//!
//! let env = Environment::targets();
//! let mut total = env
//!     .get_function("sum", vec![env.get_column("number").unwrap()])
//!     .unwrap();
//!
//! let mut allocator = Allocator::new();
//! total.allocate(&mut allocator).unwrap();
//! let mut store = allocator.store();
//!
//! let entry = Directive::Transaction(
//!     Transaction::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), "Coffee")
//!         .with_posting(Posting::new("Expenses:Coffee", Amount::new(Decimal::new(5, 0), "USD")))
//!         .with_posting(Posting::new("Assets:Cash", Amount::new(Decimal::new(-5, 0), "USD"))),
//! );
//!
//! for aggregator in total.aggregators() {
//!     aggregator.initialize(&mut store).unwrap();
//!     for row in PostingContext::iter(&entry) {
//!         aggregator.update(&mut store, &row).unwrap();
//!     }
//! }
//! let row = PostingContext::new(&entry, 0).unwrap();
//! assert_eq!(total.evaluate_group(&row, &store).unwrap(), Value::Number(Decimal::ZERO));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregates;
pub mod columns;
pub mod context;
pub mod environment;
pub mod error;
pub mod expr;
pub mod functions;
pub mod registry;
pub mod store;
pub mod types;

pub use aggregates::AggregateFunction;
pub use columns::{Column, EntryColumn, PostingColumn};
pub use context::PostingContext;
pub use environment::{Environment, WILDCARD_COLUMNS};
pub use error::QueryError;
pub use expr::{Aggregator, Expr, Function};
pub use functions::{AccountPattern, ScalarFunction};
pub use registry::{FunctionKey, FunctionKind, Registry};
pub use store::{Accumulator, Allocator, Handle, Store};
pub use types::{DataType, InType, Value};
