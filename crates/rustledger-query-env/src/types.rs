//! Static type tags and runtime values.
//!
//! Every compiled node carries a [`DataType`] fixed at construction. Function
//! operand positions declare what they accept with an [`InType`]; resolution
//! checks the two against each other before any row is seen. At evaluation
//! time nodes produce [`Value`]s whose [`Value::data_type`] matches the node.

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;
use rustledger_core::{Amount, Inventory, NaiveDate, Position};
use serde::{Deserialize, Serialize};

/// The static type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// `true` / `false`.
    Boolean,
    /// Signed integer.
    Integer,
    /// Decimal number.
    Number,
    /// Text, including account names and currencies.
    String,
    /// Calendar date.
    Date,
    /// Set of strings (tags, links).
    StringSet,
    /// Number with a currency.
    Amount,
    /// Units with an optional cost.
    Position,
    /// Positions merged by lot.
    Inventory,
    /// Type of the null constant.
    Null,
}

impl DataType {
    /// Lower-case name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Date => "date",
            Self::StringSet => "set",
            Self::Amount => "amount",
            Self::Position => "position",
            Self::Inventory => "inventory",
            Self::Null => "null",
        }
    }

    /// The neutral element accumulators of this type start from.
    ///
    /// Types without a meaningful zero (dates, amounts, positions) return
    /// `None`; their accumulators start unset instead.
    #[must_use]
    pub fn zero_value(self) -> Option<Value> {
        match self {
            Self::Boolean => Some(Value::Boolean(false)),
            Self::Integer => Some(Value::Integer(0)),
            Self::Number => Some(Value::Number(Decimal::ZERO)),
            Self::String => Some(Value::String(String::new())),
            Self::StringSet => Some(Value::StringSet(Vec::new())),
            Self::Inventory => Some(Value::Inventory(Inventory::new())),
            Self::Date | Self::Amount | Self::Position | Self::Null => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Types accepted at one operand position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InType {
    /// Any operand type.
    Any,
    /// Exactly this type.
    Exact(DataType),
    /// Any of these types.
    OneOf(&'static [DataType]),
}

impl InType {
    /// Whether an operand of type `actual` may be passed at this position.
    #[must_use]
    pub fn accepts(self, actual: DataType) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == actual,
            Self::OneOf(types) => types.contains(&actual),
        }
    }
}

impl fmt::Display for InType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Exact(t) => write!(f, "{t}"),
            Self::OneOf(types) => {
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or ")?;
                    }
                    write!(f, "{t}")?;
                }
                Ok(())
            }
        }
    }
}

/// A value produced by evaluating a node against a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// String value.
    String(String),
    /// Numeric value.
    Number(Decimal),
    /// Integer value.
    Integer(i64),
    /// Date value.
    Date(NaiveDate),
    /// Boolean value.
    Boolean(bool),
    /// Amount (number + currency).
    Amount(Amount),
    /// Position (amount + optional cost).
    Position(Position),
    /// Inventory (aggregated positions).
    Inventory(Inventory),
    /// Set of strings (tags, links).
    StringSet(Vec<String>),
    /// NULL value.
    Null,
}

impl Value {
    /// The type tag of this value.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::String(_) => DataType::String,
            Self::Number(_) => DataType::Number,
            Self::Integer(_) => DataType::Integer,
            Self::Date(_) => DataType::Date,
            Self::Boolean(_) => DataType::Boolean,
            Self::Amount(_) => DataType::Amount,
            Self::Position(_) => DataType::Position,
            Self::Inventory(_) => DataType::Inventory,
            Self::StringSet(_) => DataType::StringSet,
            Self::Null => DataType::Null,
        }
    }

    /// Natural ordering between two values of the same orderable type.
    ///
    /// Returns `None` for mismatched types and for types without an order.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Number(a), Self::Number(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Amount(a), Self::Amount(b)) => Some(a.cmp(b)),
            (Self::Position(a), Self::Position(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Textual form used by `str()`: strings are quoted, everything else
    /// renders as displayed.
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Self::String(s) => format!("\"{s}\""),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Self::Amount(a) => write!(f, "{a}"),
            Self::Position(p) => write!(f, "{p}"),
            Self::Inventory(inv) => write!(f, "{inv}"),
            Self::StringSet(set) => write!(f, "{{{}}}", set.join(", ")),
            Self::Null => f.write_str("NULL"),
        }
    }
}
