//! Function tables and overload resolution.
//!
//! A [`Registry`] maps either a bare function name or a `(name, type)` pair
//! to a function. Lookup tries the pair keyed on the first operand's type,
//! then falls back to the bare name:
//!
//! ```
//! use rustledger_query_env::{DataType, FunctionKind, Registry, AggregateFunction};
//!
//! let registry = Registry::aggregators();
//! assert_eq!(
//!     registry.lookup("SUM", &[DataType::Position]),
//!     Some(FunctionKind::Aggregate(AggregateFunction::SumPosition)),
//! );
//! assert_eq!(
//!     registry.lookup("sum", &[DataType::Number]),
//!     Some(FunctionKind::Aggregate(AggregateFunction::Sum)),
//! );
//! ```

use std::collections::HashMap;

use crate::aggregates::AggregateFunction;
use crate::functions::ScalarFunction;
use crate::types::DataType;

/// Key of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FunctionKey {
    /// The generic variant of a function.
    Name(String),
    /// The variant selected when the first operand has this type.
    Typed(String, DataType),
}

/// What a registry entry resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// A per-row function.
    Scalar(ScalarFunction),
    /// A per-group function.
    Aggregate(AggregateFunction),
}

impl FunctionKind {
    /// Name the function is called by.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scalar(f) => f.name(),
            Self::Aggregate(f) => f.name(),
        }
    }
}

/// A table of functions keyed by name and optional operand type.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<FunctionKey, FunctionKind>,
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scalar functions available in every clause.
    #[must_use]
    pub fn simple() -> Self {
        let mut registry = Self::new();
        for function in [
            ScalarFunction::Length,
            ScalarFunction::Str,
            ScalarFunction::Year,
            ScalarFunction::Month,
            ScalarFunction::Day,
            ScalarFunction::Weekday,
            ScalarFunction::Quarter,
            ScalarFunction::Parent,
            ScalarFunction::Leaf,
            ScalarFunction::Root,
            ScalarFunction::Upper,
            ScalarFunction::Lower,
            ScalarFunction::Abs,
            ScalarFunction::Number,
            ScalarFunction::Currency,
        ] {
            registry.register_name(FunctionKind::Scalar(function));
        }
        for (function, data_type) in [
            (ScalarFunction::UnitsPosition, DataType::Position),
            (ScalarFunction::CostPosition, DataType::Position),
            (ScalarFunction::UnitsInventory, DataType::Inventory),
            (ScalarFunction::CostInventory, DataType::Inventory),
        ] {
            registry.register_typed(FunctionKind::Scalar(function), data_type);
        }
        registry
    }

    /// Functions of the FROM clause: the simple functions plus the
    /// entry-only ones.
    #[must_use]
    pub fn entry() -> Self {
        let mut registry = Self::simple();
        registry.register_name(FunctionKind::Scalar(ScalarFunction::HasAccount));
        registry
    }

    /// The aggregate functions.
    #[must_use]
    pub fn aggregators() -> Self {
        let mut registry = Self::new();
        for function in [
            AggregateFunction::Count,
            AggregateFunction::Sum,
            AggregateFunction::First,
            AggregateFunction::Last,
            AggregateFunction::Min,
            AggregateFunction::Max,
        ] {
            registry.register_name(FunctionKind::Aggregate(function));
        }
        for (function, data_type) in [
            (AggregateFunction::SumAmount, DataType::Amount),
            (AggregateFunction::SumPosition, DataType::Position),
            (AggregateFunction::SumInventory, DataType::Inventory),
        ] {
            registry.register_typed(FunctionKind::Aggregate(function), data_type);
        }
        registry
    }

    /// Add or replace an entry.
    pub fn register(&mut self, key: FunctionKey, kind: FunctionKind) {
        self.entries.insert(key, kind);
    }

    fn register_name(&mut self, kind: FunctionKind) {
        self.register(FunctionKey::Name(kind.name().to_string()), kind);
    }

    fn register_typed(&mut self, kind: FunctionKind, data_type: DataType) {
        self.register(FunctionKey::Typed(kind.name().to_string(), data_type), kind);
    }

    /// Add every entry of `other`, replacing entries with the same key.
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Resolve `name` for operands of the given types.
    ///
    /// The `(name, first operand type)` entry wins over the bare-name entry.
    /// Names are case-insensitive.
    #[must_use]
    pub fn lookup(&self, name: &str, operand_types: &[DataType]) -> Option<FunctionKind> {
        let name = name.to_lowercase();
        if let Some(first) = operand_types.first() {
            if let Some(kind) = self.entries.get(&FunctionKey::Typed(name.clone(), *first)) {
                return Some(*kind);
            }
        }
        self.entries.get(&FunctionKey::Name(name)).copied()
    }

    /// Whether any entry, typed or not, carries this name.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.entries.keys().any(|key| match key {
            FunctionKey::Name(n) | FunctionKey::Typed(n, _) => *n == name,
        })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&FunctionKey, &FunctionKind)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_overloads_resolve_exactly() {
        for registry in [Registry::simple(), Registry::aggregators()] {
            for (key, kind) in registry.iter() {
                if let FunctionKey::Typed(name, data_type) = key {
                    assert_eq!(registry.lookup(name, &[*data_type]), Some(*kind));
                }
            }
        }
    }

    #[test]
    fn test_fallback_to_generic() {
        let registry = Registry::aggregators();
        assert_eq!(
            registry.lookup("sum", &[DataType::Integer]),
            Some(FunctionKind::Aggregate(AggregateFunction::Sum))
        );
        assert_eq!(
            registry.lookup("Count", &[DataType::Position]),
            Some(FunctionKind::Aggregate(AggregateFunction::Count))
        );
    }

    #[test]
    fn test_typed_only_name_without_match_fails() {
        let registry = Registry::simple();
        assert_eq!(
            registry.lookup("units", &[DataType::Position]),
            Some(FunctionKind::Scalar(ScalarFunction::UnitsPosition))
        );
        assert_eq!(registry.lookup("units", &[DataType::String]), None);
        assert_eq!(registry.lookup("units", &[]), None);
        assert!(registry.contains_name("UNITS"));
    }

    #[test]
    fn test_entry_registry_adds_has_account() {
        assert!(Registry::entry().contains_name("has_account"));
        assert!(!Registry::simple().contains_name("has_account"));
        assert_eq!(Registry::entry().len(), Registry::simple().len() + 1);
    }

    #[test]
    fn test_extend() {
        let mut registry = Registry::simple();
        let before = registry.len();
        registry.extend(Registry::aggregators());
        assert_eq!(registry.len(), before + Registry::aggregators().len());
        assert!(registry.lookup("max", &[DataType::Date]).is_some());
        assert!(registry.lookup("year", &[DataType::Date]).is_some());
    }
}
