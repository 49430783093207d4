//! Core ledger types for the rustledger query layer
//!
//! This crate provides the data model that query columns and functions read:
//!
//! - [`Amount`] - A decimal number with a currency
//! - [`Cost`] - Acquisition cost of a lot
//! - [`Position`] - Units held at an optional cost
//! - [`Inventory`] - Positions merged by lot, the accumulator of `sum()`
//! - [`Directive`] - The directives a query ranges over, with booked [`Posting`]s
//!
//! # Example
//!
//! ```
//! use rustledger_core::{Amount, Cost, Inventory, Posting};
//! use rust_decimal_macros::dec;
//!
//! let buy = Posting::new("Assets:Broker", Amount::new(dec!(10), "AAPL"))
//!     .with_cost(Cost::new(dec!(150.00), "USD"));
//!
//! let mut inv = Inventory::new();
//! inv.add_position(&buy.position());
//!
//! assert_eq!(inv.units("AAPL"), dec!(10));
//! assert_eq!(buy.weight(), Amount::new(dec!(1500.00), "USD"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod cost;
pub mod directive;
pub mod inventory;
pub mod position;

pub use amount::Amount;
pub use cost::Cost;
pub use directive::{
    Balance, Close, Directive, MetaValue, Metadata, Note, Open, Posting, Price, Transaction,
};
pub use inventory::Inventory;
pub use position::Position;

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
