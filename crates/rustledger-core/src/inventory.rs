//! Inventory type representing a collection of positions.
//!
//! An [`Inventory`] is the accumulator of `sum()` over amounts, positions and
//! other inventories. Positions of the same lot (same currency and same cost)
//! are merged; lots whose units reach zero are dropped. The result of a series
//! of additions does not depend on the order they were made in.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Amount, Position};

/// A multiset of positions keyed by lot.
///
/// # Examples
///
/// ```
/// use rustledger_core::{Inventory, Position, Amount, Cost};
/// use rust_decimal_macros::dec;
///
/// let mut inv = Inventory::new();
/// inv.add_amount(&Amount::new(dec!(100), "USD"));
/// let shares = Amount::new(dec!(10), "AAPL");
/// inv.add_position(&Position::with_cost(shares, Cost::new(dec!(150), "USD")));
/// inv.add_amount(&Amount::new(dec!(-40), "USD"));
///
/// assert_eq!(inv.units("USD"), dec!(60));
/// assert_eq!(inv.len(), 2);
/// ```
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
pub struct Inventory {
    positions: Vec<Position>,
}

impl Inventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all positions, in insertion order of their lots.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Check if inventory holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of distinct lots held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Get total units of a currency (ignoring cost lots).
    #[must_use]
    pub fn units(&self, currency: &str) -> Decimal {
        self.positions
            .iter()
            .filter(|p| p.units.currency == currency)
            .map(|p| p.units.number)
            .sum()
    }

    /// Get all currencies in this inventory.
    #[must_use]
    pub fn currencies(&self) -> Vec<&str> {
        let mut currencies: Vec<&str> = self.positions.iter().map(Position::currency).collect();
        currencies.sort_unstable();
        currencies.dedup();
        currencies
    }

    /// Merge a position into its lot.
    pub fn add_position(&mut self, position: &Position) {
        if position.is_empty() {
            return;
        }

        if let Some(idx) = self.positions.iter().position(|p| p.same_lot(position)) {
            self.positions[idx].units += &position.units;
            if self.positions[idx].is_empty() {
                self.positions.remove(idx);
            }
            return;
        }

        self.positions.push(position.clone());
    }

    /// Merge an amount as a position without cost.
    pub fn add_amount(&mut self, amount: &Amount) {
        self.add_position(&Position::simple(amount.clone()));
    }

    /// Merge every lot of another inventory.
    pub fn add_inventory(&mut self, other: &Self) {
        for position in &other.positions {
            self.add_position(position);
        }
    }

    /// The inventory with costs stripped: units merged per currency.
    #[must_use]
    pub fn units_inventory(&self) -> Self {
        let mut result = Self::new();
        for position in &self.positions {
            result.add_amount(&position.units);
        }
        result
    }

    /// The inventory converted to its book value.
    ///
    /// Positions held at cost contribute their total cost; positions without a
    /// cost contribute their units.
    #[must_use]
    pub fn cost_inventory(&self) -> Self {
        let mut result = Self::new();
        for position in &self.positions {
            match position.book_value() {
                Some(book) => result.add_amount(&book),
                None => result.add_amount(&position.units),
            }
        }
        result
    }

    fn sorted(&self) -> Vec<&Position> {
        let mut positions: Vec<&Position> = self.positions.iter().collect();
        positions.sort();
        positions
    }
}

/// Two inventories are equal when they hold the same lots, in any order.
impl PartialEq for Inventory {
    fn eq(&self, other: &Self) -> bool {
        self.sorted() == other.sorted()
    }
}

impl FromIterator<Position> for Inventory {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        let mut inv = Self::new();
        for position in iter {
            inv.add_position(&position);
        }
        inv
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, position) in self.sorted().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{position}")?;
        }
        write!(f, ")")
    }
}
