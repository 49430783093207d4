//! Aggregate functions.
//!
//! An [`AggregateFunction`] knows its starting accumulator and how to fold one
//! row's operand into it. It never owns state: the accumulator lives in a
//! [`Store`](crate::store::Store) slot driven by [`Aggregator`](crate::expr::Aggregator).

use std::cmp::Ordering;

use rustledger_core::Inventory;

use crate::store::Accumulator;
use crate::types::{DataType, InType, Value};

const NUMERIC: &[DataType] = &[DataType::Integer, DataType::Number];

/// Operand types `min` and `max` can order.
const ORDERABLE: &[DataType] = &[
    DataType::Boolean,
    DataType::Integer,
    DataType::Number,
    DataType::String,
    DataType::Date,
    DataType::Amount,
    DataType::Position,
];

/// A function folding every row of a group into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// Number of rows.
    Count,
    /// Sum of integers or numbers.
    Sum,
    /// Amounts merged into an inventory.
    SumAmount,
    /// Positions merged into an inventory.
    SumPosition,
    /// Inventories merged into one.
    SumInventory,
    /// First non-null value.
    First,
    /// Last value.
    Last,
    /// Smallest value, starting from the type's zero.
    Min,
    /// Largest value, starting from the type's zero.
    Max,
}

impl AggregateFunction {
    /// Name the function is called by.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum | Self::SumAmount | Self::SumPosition | Self::SumInventory => "sum",
            Self::First => "first",
            Self::Last => "last",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Accepted operand types, one per position.
    #[must_use]
    pub const fn intypes(self) -> &'static [InType] {
        match self {
            Self::Count | Self::First | Self::Last => &[InType::Any],
            Self::Min | Self::Max => &[InType::OneOf(ORDERABLE)],
            Self::Sum => &[InType::OneOf(NUMERIC)],
            Self::SumAmount => &[InType::Exact(DataType::Amount)],
            Self::SumPosition => &[InType::Exact(DataType::Position)],
            Self::SumInventory => &[InType::Exact(DataType::Inventory)],
        }
    }

    /// Result type for operands of the given types.
    #[must_use]
    pub fn output_type(self, operands: &[DataType]) -> DataType {
        match self {
            Self::Count => DataType::Integer,
            Self::SumAmount | Self::SumPosition | Self::SumInventory => DataType::Inventory,
            Self::Sum | Self::First | Self::Last | Self::Min | Self::Max => {
                operands.first().copied().unwrap_or(DataType::Null)
            }
        }
    }

    /// Starting accumulator of a group for an aggregate producing `output`.
    ///
    /// `min` and `max` start from the output type's zero when it has one, so
    /// `min` over only positive values reports that zero.
    #[must_use]
    pub fn initial(self, output: DataType) -> Accumulator {
        match self {
            Self::Count => Accumulator::Set(Value::Integer(0)),
            Self::SumAmount | Self::SumPosition | Self::SumInventory => {
                Accumulator::Set(Value::Inventory(Inventory::new()))
            }
            Self::Sum | Self::Min | Self::Max => {
                output.zero_value().map_or(Accumulator::Unset, Accumulator::Set)
            }
            Self::First | Self::Last => Accumulator::Unset,
        }
    }

    /// Fold one row into `acc`.
    ///
    /// `operand` is only evaluated when the row's value is needed: `count`
    /// never reads it and `first` stops reading once set.
    pub fn fold(self, acc: &mut Accumulator, operand: impl FnOnce() -> Value) {
        match self {
            Self::Count => {
                let n = match acc {
                    Accumulator::Set(Value::Integer(n)) => *n,
                    _ => 0,
                };
                *acc = Accumulator::Set(Value::Integer(n.saturating_add(1)));
            }
            Self::Sum => match (acc, operand()) {
                (_, Value::Null) => {}
                (Accumulator::Set(Value::Integer(total)), Value::Integer(n)) => {
                    *total = total.saturating_add(n);
                }
                (Accumulator::Set(Value::Number(total)), Value::Number(n)) => *total += n,
                (slot @ Accumulator::Unset, value) => *slot = Accumulator::Set(value),
                _ => {}
            },
            Self::SumAmount | Self::SumPosition | Self::SumInventory => {
                let Accumulator::Set(Value::Inventory(inventory)) = acc else {
                    return;
                };
                match operand() {
                    Value::Amount(amount) => inventory.add_amount(&amount),
                    Value::Position(position) => inventory.add_position(&position),
                    Value::Inventory(other) => inventory.add_inventory(&other),
                    _ => {}
                }
            }
            Self::First => {
                if matches!(acc, Accumulator::Unset) {
                    let value = operand();
                    if value != Value::Null {
                        *acc = Accumulator::Set(value);
                    }
                }
            }
            Self::Last => *acc = Accumulator::Set(operand()),
            Self::Min => keep_extreme(acc, operand(), Ordering::Less),
            Self::Max => keep_extreme(acc, operand(), Ordering::Greater),
        }
    }
}

fn keep_extreme(acc: &mut Accumulator, value: Value, wanted: Ordering) {
    if value == Value::Null {
        return;
    }
    match acc {
        Accumulator::Unset => *acc = Accumulator::Set(value),
        Accumulator::Set(current) => {
            if value.compare(current) == Some(wanted) {
                *current = value;
            }
        }
    }
}
