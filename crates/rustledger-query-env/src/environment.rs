//! Compilation environments.
//!
//! An [`Environment`] is the namespace a clause compiles in: a column table, a
//! function registry and a label for diagnostics. There are three:
//!
//! | Constructor                  | Row              | Label              |
//! |------------------------------|------------------|--------------------|
//! | [`Environment::entries`]     | `&Directive`     | `FROM clause`      |
//! | [`Environment::postings`]    | `PostingContext` | `WHERE clause`     |
//! | [`Environment::targets`]     | `PostingContext` | `targets/column`   |
//!
//! The targets environment adds the aggregate functions and the columns a
//! wildcard target expands to.

use std::collections::HashMap;

use tracing::debug;

use crate::columns::{Column, EntryColumn, PostingColumn};
use crate::error::QueryError;
use crate::expr::{Aggregator, Expr, Function};
use crate::registry::{FunctionKind, Registry};

/// Columns a `*` target expands to, in order.
pub const WILDCARD_COLUMNS: &[&str] = &["date", "flag", "payee", "narration", "change"];

/// Namespace used to resolve identifiers and calls for one kind of clause.
#[derive(Debug, Clone)]
pub struct Environment<C: Column> {
    context_name: &'static str,
    columns: HashMap<&'static str, C>,
    functions: Registry,
    wildcard_columns: &'static [&'static str],
}

impl<C: Column> Environment<C> {
    fn new(
        context_name: &'static str,
        functions: Registry,
        wildcard_columns: &'static [&'static str],
    ) -> Self {
        Self {
            context_name,
            columns: C::ALL.iter().map(|column| (column.name(), *column)).collect(),
            functions,
            wildcard_columns,
        }
    }

    /// Label naming the clause in error messages.
    #[must_use]
    pub const fn context_name(&self) -> &'static str {
        self.context_name
    }

    /// The function registry consulted by [`get_function`](Self::get_function).
    #[must_use]
    pub const fn functions(&self) -> &Registry {
        &self.functions
    }

    /// Every column name, sorted.
    #[must_use]
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.columns.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Resolve a column by name, case-insensitively.
    pub fn get_column(&self, name: &str) -> Result<Expr<C>, QueryError> {
        let column = self
            .columns
            .get(name.to_lowercase().as_str())
            .copied()
            .ok_or_else(|| QueryError::UnknownColumn {
                name: name.to_string(),
                context: self.context_name,
            })?;
        debug!(column = column.name(), context = self.context_name, "resolved column");
        Ok(Expr::Column(column))
    }

    /// Resolve a call by name and operands, type checking the operands.
    pub fn get_function(&self, name: &str, operands: Vec<Expr<C>>) -> Result<Expr<C>, QueryError> {
        let types: Vec<_> = operands.iter().map(Expr::data_type).collect();
        let Some(kind) = self.functions.lookup(name, &types) else {
            return Err(QueryError::UnknownFunction {
                name: name.to_string(),
                context: self.context_name,
                types,
            });
        };
        debug!(?kind, ?types, context = self.context_name, "resolved function");
        match kind {
            FunctionKind::Scalar(function) => {
                Ok(Expr::Function(Function::new(function, operands)?))
            }
            FunctionKind::Aggregate(function) => {
                Ok(Expr::Aggregate(Aggregator::new(function, operands)?))
            }
        }
    }

    /// Column names a wildcard target expands to; empty outside targets.
    #[must_use]
    pub const fn wildcard_columns(&self) -> &'static [&'static str] {
        self.wildcard_columns
    }

    /// The wildcard expansion as compiled column nodes.
    pub fn wildcard_targets(&self) -> Result<Vec<Expr<C>>, QueryError> {
        self.wildcard_columns
            .iter()
            .map(|name| self.get_column(name))
            .collect()
    }
}

impl Environment<EntryColumn> {
    /// Environment of the FROM clause, evaluated against entries.
    #[must_use]
    pub fn entries() -> Self {
        Self::new("FROM clause", Registry::entry(), &[])
    }
}

impl Environment<PostingColumn> {
    /// Environment of the WHERE clause, evaluated against postings.
    #[must_use]
    pub fn postings() -> Self {
        Self::new("WHERE clause", Registry::simple(), &[])
    }

    /// Environment of the target list: postings plus aggregate functions.
    #[must_use]
    pub fn targets() -> Self {
        let mut functions = Registry::simple();
        functions.extend(Registry::aggregators());
        Self::new("targets/column", functions, WILDCARD_COLUMNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Value};

    #[test]
    fn test_context_names() {
        assert_eq!(Environment::entries().context_name(), "FROM clause");
        assert_eq!(Environment::postings().context_name(), "WHERE clause");
        assert_eq!(Environment::targets().context_name(), "targets/column");
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let env = Environment::postings();
        assert_eq!(env.get_column("Account").unwrap(), Expr::Column(PostingColumn::Account));
        assert_eq!(env.get_column("DATE").unwrap(), Expr::Column(PostingColumn::Date));
    }

    #[test]
    fn test_posting_column_unknown_in_entries() {
        let err = Environment::entries().get_column("account").unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownColumn {
                name: "account".to_string(),
                context: "FROM clause",
            }
        );
    }

    #[test]
    fn test_aggregates_only_in_targets() {
        let number = || Expr::Column(PostingColumn::Number);
        assert!(Environment::targets().get_function("sum", vec![number()]).is_ok());

        let err = Environment::postings().get_function("sum", vec![number()]).unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownFunction {
                name: "sum".to_string(),
                context: "WHERE clause",
                types: vec![DataType::Number],
            }
        );
    }

    #[test]
    fn test_has_account_only_in_entries() {
        let pattern = || Expr::Constant(Value::String("Cash".into()));
        let expr = Environment::entries().get_function("has_account", vec![pattern()]).unwrap();
        assert_eq!(expr.data_type(), DataType::Boolean);
        assert!(Environment::postings()
            .get_function("has_account", vec![Expr::Constant(Value::String("Cash".into()))])
            .is_err());
    }

    #[test]
    fn test_wildcard() {
        let env = Environment::targets();
        assert_eq!(
            env.wildcard_columns(),
            &["date", "flag", "payee", "narration", "change"]
        );
        let targets = env.wildcard_targets().unwrap();
        assert_eq!(targets.len(), 5);
        assert_eq!(targets[4].data_type(), DataType::Position);
        assert!(Environment::postings().wildcard_columns().is_empty());
    }

    #[test]
    fn test_entry_and_posting_column_sets() {
        let entries = Environment::entries().column_names();
        let postings = Environment::postings().column_names();
        assert!(entries.iter().all(|name| postings.contains(name)));
        assert!(!entries.contains(&"weight"));
        assert!(postings.contains(&"weight"));
    }
}
