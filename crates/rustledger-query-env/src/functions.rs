//! Scalar functions.
//!
//! Each [`ScalarFunction`] declares the types it accepts per operand position
//! and the type it produces for given operand types. Application is total:
//! operands of a well-typed call always match one of the arms below, and
//! anything else falls through to `Null`.

use chrono::Datelike;
use regex::{Regex, RegexBuilder};
use rustledger_core::Directive;

use crate::columns::cost_or_empty;
use crate::types::{DataType, InType, Value};

const NUMERIC: &[DataType] = &[DataType::Integer, DataType::Number];
const SIZED: &[DataType] = &[DataType::String, DataType::StringSet];

/// A pure, per-row function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarFunction {
    /// Number of characters of a string or members of a set.
    Length,
    /// Canonical textual form of any value.
    Str,
    /// Year of a date.
    Year,
    /// Month of a date.
    Month,
    /// Day of month of a date.
    Day,
    /// Three-letter English weekday of a date.
    Weekday,
    /// Calendar quarter of a date.
    Quarter,
    /// Account name without its last component.
    Parent,
    /// Last component of an account name.
    Leaf,
    /// First N components of an account name.
    Root,
    /// Upper-cased string.
    Upper,
    /// Lower-cased string.
    Lower,
    /// Absolute value of an integer or number.
    Abs,
    /// Number of an amount.
    Number,
    /// Currency of an amount.
    Currency,
    /// Units of a position.
    UnitsPosition,
    /// Total cost of a position.
    CostPosition,
    /// Units of every lot of an inventory.
    UnitsInventory,
    /// Costs of every lot of an inventory.
    CostInventory,
    /// Whether a transaction touches an account matching a pattern.
    HasAccount,
}

impl ScalarFunction {
    /// Name the function is called by.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Str => "str",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Weekday => "weekday",
            Self::Quarter => "quarter",
            Self::Parent => "parent",
            Self::Leaf => "leaf",
            Self::Root => "root",
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Abs => "abs",
            Self::Number => "number",
            Self::Currency => "currency",
            Self::UnitsPosition | Self::UnitsInventory => "units",
            Self::CostPosition | Self::CostInventory => "cost",
            Self::HasAccount => "has_account",
        }
    }

    /// Accepted operand types, one per position.
    #[must_use]
    pub const fn intypes(self) -> &'static [InType] {
        match self {
            Self::Length => &[InType::OneOf(SIZED)],
            Self::Str => &[InType::Any],
            Self::Year | Self::Month | Self::Day | Self::Weekday | Self::Quarter => {
                &[InType::Exact(DataType::Date)]
            }
            Self::Parent | Self::Leaf | Self::Upper | Self::Lower | Self::HasAccount => {
                &[InType::Exact(DataType::String)]
            }
            Self::Root => &[
                InType::Exact(DataType::String),
                InType::Exact(DataType::Integer),
            ],
            Self::Abs => &[InType::OneOf(NUMERIC)],
            Self::Number | Self::Currency => &[InType::Exact(DataType::Amount)],
            Self::UnitsPosition | Self::CostPosition => &[InType::Exact(DataType::Position)],
            Self::UnitsInventory | Self::CostInventory => &[InType::Exact(DataType::Inventory)],
        }
    }

    /// Result type for operands of the given types.
    #[must_use]
    pub fn output_type(self, operands: &[DataType]) -> DataType {
        match self {
            Self::Length | Self::Year | Self::Month | Self::Day | Self::Quarter => {
                DataType::Integer
            }
            Self::Str
            | Self::Weekday
            | Self::Parent
            | Self::Leaf
            | Self::Root
            | Self::Upper
            | Self::Lower
            | Self::Currency => DataType::String,
            Self::Abs => operands.first().copied().unwrap_or(DataType::Number),
            Self::Number => DataType::Number,
            Self::UnitsPosition | Self::CostPosition => DataType::Amount,
            Self::UnitsInventory | Self::CostInventory => DataType::Inventory,
            Self::HasAccount => DataType::Boolean,
        }
    }

    /// Apply the function to evaluated operands of a row from `entry`.
    #[must_use]
    pub fn apply(self, args: &[Value], entry: &Directive) -> Value {
        match (self, args) {
            (Self::Length, [Value::String(s)]) => count(s.chars().count()),
            (Self::Length, [Value::StringSet(set)]) => count(set.len()),
            (Self::Str, [value]) => Value::String(value.repr()),

            (Self::Year, [Value::Date(d)]) => Value::Integer(d.year().into()),
            (Self::Month, [Value::Date(d)]) => Value::Integer(d.month().into()),
            (Self::Day, [Value::Date(d)]) => Value::Integer(d.day().into()),
            (Self::Weekday, [Value::Date(d)]) => Value::String(d.format("%a").to_string()),
            (Self::Quarter, [Value::Date(d)]) => Value::Integer(((d.month() - 1) / 3 + 1).into()),

            (Self::Parent, [Value::String(account)]) => Value::String(
                account
                    .rsplit_once(':')
                    .map(|(parent, _)| parent.to_string())
                    .unwrap_or_default(),
            ),
            (Self::Leaf, [Value::String(account)]) => Value::String(
                account
                    .rsplit_once(':')
                    .map_or(account.as_str(), |(_, leaf)| leaf)
                    .to_string(),
            ),
            (Self::Root, [Value::String(account), Value::Integer(n)]) => {
                let n = usize::try_from(*n).unwrap_or(0);
                Value::String(account.split(':').take(n).collect::<Vec<_>>().join(":"))
            }
            (Self::Upper, [Value::String(s)]) => Value::String(s.to_uppercase()),
            (Self::Lower, [Value::String(s)]) => Value::String(s.to_lowercase()),

            (Self::Abs, [Value::Integer(i)]) => Value::Integer(i.saturating_abs()),
            (Self::Abs, [Value::Number(n)]) => Value::Number(n.abs()),
            (Self::Number, [Value::Amount(amount)]) => Value::Number(amount.number),
            (Self::Currency, [Value::Amount(amount)]) => Value::String(amount.currency.clone()),

            (Self::UnitsPosition, [Value::Position(pos)]) => Value::Amount(pos.units.clone()),
            (Self::CostPosition, [Value::Position(pos)]) => Value::Amount(cost_or_empty(pos)),
            (Self::UnitsInventory, [Value::Inventory(inv)]) => {
                Value::Inventory(inv.units_inventory())
            }
            (Self::CostInventory, [Value::Inventory(inv)]) => {
                Value::Inventory(inv.cost_inventory())
            }

            (Self::HasAccount, [Value::String(pattern)]) => {
                Value::Boolean(AccountPattern::new(pattern).matches(entry))
            }
            _ => Value::Null,
        }
    }
}

fn count(n: usize) -> Value {
    Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}

/// A case-insensitive `has_account` pattern, compiled once.
///
/// An invalid pattern matches nothing.
#[derive(Debug, Clone)]
pub struct AccountPattern(Option<Regex>);

impl AccountPattern {
    /// Compile `pattern`.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| {
                tracing::debug!(pattern, %err, "invalid has_account pattern");
                err
            })
            .ok();
        Self(regex)
    }

    /// Whether `entry` is a transaction with a posting to a matching account.
    #[must_use]
    pub fn matches(&self, entry: &Directive) -> bool {
        let (Some(regex), Some(txn)) = (&self.0, entry.as_transaction()) else {
            return false;
        };
        txn.postings.iter().any(|p| regex.is_match(&p.account))
    }

    fn as_str(&self) -> Option<&str> {
        self.0.as_ref().map(Regex::as_str)
    }
}

impl PartialEq for AccountPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use rustledger_core::{Amount, Cost, Inventory, NaiveDate, Note, Position, Posting, Transaction};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn note() -> Directive {
        Directive::Note(Note::new(date(2024, 1, 1), "Assets:Cash", "memo"))
    }

    fn string(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn test_account_helpers() {
        let entry = note();
        let account = string("Expenses:Food:Restaurant");
        assert_eq!(
            ScalarFunction::Parent.apply(&[account.clone()], &entry),
            string("Expenses:Food")
        );
        assert_eq!(ScalarFunction::Parent.apply(&[string("Assets")], &entry), string(""));
        assert_eq!(
            ScalarFunction::Leaf.apply(&[account.clone()], &entry),
            string("Restaurant")
        );
        assert_eq!(
            ScalarFunction::Root.apply(&[account.clone(), Value::Integer(2)], &entry),
            string("Expenses:Food")
        );
        assert_eq!(
            ScalarFunction::Root.apply(&[account, Value::Integer(9)], &entry),
            string("Expenses:Food:Restaurant")
        );
    }

    #[test]
    fn test_date_helpers() {
        let entry = note();
        let day = Value::Date(date(2024, 8, 17));
        assert_eq!(ScalarFunction::Year.apply(&[day.clone()], &entry), Value::Integer(2024));
        assert_eq!(ScalarFunction::Month.apply(&[day.clone()], &entry), Value::Integer(8));
        assert_eq!(ScalarFunction::Day.apply(&[day.clone()], &entry), Value::Integer(17));
        assert_eq!(ScalarFunction::Weekday.apply(&[day.clone()], &entry), string("Sat"));
        assert_eq!(ScalarFunction::Quarter.apply(&[day], &entry), Value::Integer(3));
    }

    #[test]
    fn test_length_and_str() {
        let entry = note();
        assert_eq!(ScalarFunction::Length.apply(&[string("café")], &entry), Value::Integer(4));
        assert_eq!(
            ScalarFunction::Length.apply(&[Value::StringSet(vec!["a".into(), "b".into()])], &entry),
            Value::Integer(2)
        );
        assert_eq!(ScalarFunction::Str.apply(&[string("x")], &entry), string("\"x\""));
        assert_eq!(ScalarFunction::Str.apply(&[Value::Integer(7)], &entry), string("7"));
    }

    #[test]
    fn test_position_projections() {
        let entry = note();
        let held = Position::with_cost(Amount::new(dec!(10), "AAPL"), Cost::new(dec!(150), "USD"));
        let cash = Position::simple(Amount::new(dec!(5), "USD"));

        assert_eq!(
            ScalarFunction::UnitsPosition.apply(&[Value::Position(held.clone())], &entry),
            Value::Amount(Amount::new(dec!(10), "AAPL"))
        );
        assert_eq!(
            ScalarFunction::CostPosition.apply(&[Value::Position(held)], &entry),
            Value::Amount(Amount::new(dec!(1500), "USD"))
        );
        assert_eq!(
            ScalarFunction::CostPosition.apply(&[Value::Position(cash)], &entry),
            Value::Amount(Amount::empty())
        );
    }

    #[test]
    fn test_inventory_projections() {
        let entry = note();
        let inventory: Inventory = [
            Position::with_cost(Amount::new(dec!(2), "AAPL"), Cost::new(dec!(100), "USD")),
            Position::simple(Amount::new(dec!(30), "USD")),
        ]
        .into_iter()
        .collect();

        let units =
            ScalarFunction::UnitsInventory.apply(&[Value::Inventory(inventory.clone())], &entry);
        let Value::Inventory(units) = units else {
            panic!("expected inventory");
        };
        assert_eq!(units.units("AAPL"), dec!(2));
        assert!(units.positions().iter().all(|p| p.cost.is_none()));

        let cost = ScalarFunction::CostInventory.apply(&[Value::Inventory(inventory)], &entry);
        let Value::Inventory(cost) = cost else {
            panic!("expected inventory");
        };
        assert_eq!(cost.units("USD"), dec!(230));
    }

    #[test]
    fn test_abs_keeps_operand_type() {
        let entry = note();
        assert_eq!(ScalarFunction::Abs.output_type(&[DataType::Integer]), DataType::Integer);
        assert_eq!(ScalarFunction::Abs.apply(&[Value::Integer(-3)], &entry), Value::Integer(3));
        assert_eq!(
            ScalarFunction::Abs.apply(&[Value::Number(dec!(-1.25))], &entry),
            Value::Number(dec!(1.25))
        );
    }

    #[test]
    fn test_has_account() {
        let txn = Directive::Transaction(
            Transaction::new(date(2024, 2, 1), "Lunch")
                .with_posting(Posting::new("Expenses:Food", Amount::new(dec!(12), "USD")))
                .with_posting(Posting::new("Assets:Cash", Amount::new(dec!(-12), "USD"))),
        );
        let check = |pattern: &str, entry: &Directive| {
            ScalarFunction::HasAccount.apply(&[string(pattern)], entry)
        };
        assert_eq!(check("expenses:food", &txn), Value::Boolean(true));
        assert_eq!(check("^Income", &txn), Value::Boolean(false));
        assert_eq!(check("([", &txn), Value::Boolean(false));
        assert_eq!(check("Assets", &note()), Value::Boolean(false));
    }

    #[test]
    fn test_account_pattern_compiles_once() {
        let txn = Directive::Transaction(
            Transaction::new(date(2024, 2, 1), "Rent")
                .with_posting(Posting::new("Expenses:Housing", Amount::new(dec!(900), "USD")))
                .with_posting(Posting::new("Assets:Bank", Amount::new(dec!(-900), "USD"))),
        );
        let pattern = AccountPattern::new("^expenses:");
        assert!(pattern.matches(&txn));
        assert!(!pattern.matches(&note()));
        assert_eq!(pattern, AccountPattern::new("^expenses:"));

        let invalid = AccountPattern::new("([");
        assert_eq!(invalid.as_str(), None);
        assert!(!invalid.matches(&txn));
    }

    #[test]
    fn test_mismatched_operands_read_as_null() {
        assert_eq!(ScalarFunction::Year.apply(&[Value::Null], &note()), Value::Null);
        assert_eq!(ScalarFunction::Parent.apply(&[], &note()), Value::Null);
    }
}
