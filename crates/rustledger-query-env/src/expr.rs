//! Compiled expression trees.
//!
//! An [`Expr`] is fully type checked when it is built: every node knows its
//! output [`DataType`] and evaluation cannot fail. The column type parameter
//! fixes which row shape the tree reads, so a tree compiled for postings can
//! only ever be evaluated against a [`PostingContext`](crate::PostingContext).
//!
//! Aggregators are driven by the executor through
//! [`allocate`](Aggregator::allocate), [`initialize`](Aggregator::initialize),
//! [`update`](Aggregator::update) and [`finalize`](Aggregator::finalize).

use rustledger_core::Directive;
use tracing::debug;

use crate::aggregates::AggregateFunction;
use crate::columns::Column;
use crate::error::QueryError;
use crate::functions::{AccountPattern, ScalarFunction};
use crate::store::{Allocator, Handle, Store};
use crate::types::{DataType, InType, Value};

/// A compiled expression over rows of column type `C`.
#[derive(Debug, PartialEq)]
pub enum Expr<C: Column> {
    /// A literal value.
    Constant(Value),
    /// A column of the row.
    Column(C),
    /// A scalar function call.
    Function(Function<C>),
    /// An aggregate function call.
    Aggregate(Aggregator<C>),
}

impl<C: Column> Expr<C> {
    /// Static type of the values this node produces.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Constant(value) => value.data_type(),
            Self::Column(column) => column.data_type(),
            Self::Function(function) => function.output,
            Self::Aggregate(aggregator) => aggregator.output,
        }
    }

    /// Child nodes in operand order.
    #[must_use]
    pub fn operands(&self) -> &[Self] {
        match self {
            Self::Constant(_) | Self::Column(_) => &[],
            Self::Function(function) => &function.operands,
            Self::Aggregate(aggregator) => &aggregator.operands,
        }
    }

    /// Whether this node or any node below it is an aggregator.
    #[must_use]
    pub fn contains_aggregate(&self) -> bool {
        matches!(self, Self::Aggregate(_)) || self.operands().iter().any(Self::contains_aggregate)
    }

    /// Evaluate against one row.
    ///
    /// Aggregators have no per-row value and read as `Null`; use
    /// [`evaluate_group`](Self::evaluate_group) once a group is finalized.
    pub fn evaluate(&self, row: &C::Row<'_>) -> Value {
        match self {
            Self::Constant(value) => value.clone(),
            Self::Column(column) => column.evaluate(row),
            Self::Function(function) => {
                let args: Vec<Value> = function.operands.iter().map(|e| e.evaluate(row)).collect();
                function.call(&args, C::directive(row))
            }
            Self::Aggregate(_) => Value::Null,
        }
    }

    /// Evaluate for a finished group.
    ///
    /// Aggregators read their finalized slot from `store`; every other node is
    /// evaluated against `row`, the group's representative row.
    pub fn evaluate_group(&self, row: &C::Row<'_>, store: &Store) -> Result<Value, QueryError> {
        match self {
            Self::Aggregate(aggregator) => aggregator.finalize(store),
            Self::Function(function) => {
                let args = function
                    .operands
                    .iter()
                    .map(|e| e.evaluate_group(row, store))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(function.call(&args, C::directive(row)))
            }
            Self::Constant(_) | Self::Column(_) => Ok(self.evaluate(row)),
        }
    }

    /// Allocate a slot for every aggregator in the tree.
    pub fn allocate(&mut self, allocator: &mut Allocator) -> Result<(), QueryError> {
        match self {
            Self::Aggregate(aggregator) => {
                aggregator.allocate(allocator)?;
            }
            Self::Function(function) => {
                for operand in &mut function.operands {
                    operand.allocate(allocator)?;
                }
            }
            Self::Constant(_) | Self::Column(_) => {}
        }
        Ok(())
    }

    /// Every aggregator in the tree, in operand order.
    #[must_use]
    pub fn aggregators(&self) -> Vec<&Aggregator<C>> {
        let mut found = Vec::new();
        self.collect_aggregators(&mut found);
        found
    }

    fn collect_aggregators<'s>(&'s self, found: &mut Vec<&'s Aggregator<C>>) {
        match self {
            Self::Aggregate(aggregator) => found.push(aggregator),
            _ => {
                for operand in self.operands() {
                    operand.collect_aggregators(found);
                }
            }
        }
    }
}

/// Check operand count and types against a function's declaration.
fn check_operands<C: Column>(
    function: &'static str,
    intypes: &[InType],
    operands: &[Expr<C>],
) -> Result<Vec<DataType>, QueryError> {
    if intypes.len() != operands.len() {
        return Err(QueryError::InvalidArity {
            function,
            expected: intypes.len(),
            actual: operands.len(),
        });
    }
    let mut types = Vec::with_capacity(operands.len());
    for (i, (intype, operand)) in intypes.iter().zip(operands).enumerate() {
        let actual = operand.data_type();
        if !intype.accepts(actual) {
            return Err(QueryError::InvalidArgumentType {
                function,
                position: i + 1,
                expected: intype.to_string(),
                actual,
            });
        }
        types.push(actual);
    }
    Ok(types)
}

/// A type-checked scalar function call.
#[derive(Debug, PartialEq)]
pub struct Function<C: Column> {
    function: ScalarFunction,
    operands: Vec<Expr<C>>,
    output: DataType,
    pattern: Option<AccountPattern>,
}

impl<C: Column> Function<C> {
    /// Build a call, checking the operands against the function's intypes.
    ///
    /// A `has_account` pattern given as a constant is compiled here.
    pub fn new(function: ScalarFunction, operands: Vec<Expr<C>>) -> Result<Self, QueryError> {
        let types = check_operands(function.name(), function.intypes(), &operands)?;
        let pattern = match (function, operands.as_slice()) {
            (ScalarFunction::HasAccount, [Expr::Constant(Value::String(pattern))]) => {
                Some(AccountPattern::new(pattern))
            }
            _ => None,
        };
        Ok(Self {
            output: function.output_type(&types),
            function,
            operands,
            pattern,
        })
    }

    /// The function being called.
    #[must_use]
    pub const fn function(&self) -> ScalarFunction {
        self.function
    }

    /// The precompiled `has_account` pattern, if the call has one.
    #[must_use]
    pub const fn pattern(&self) -> Option<&AccountPattern> {
        self.pattern.as_ref()
    }

    fn call(&self, args: &[Value], entry: &Directive) -> Value {
        match &self.pattern {
            Some(pattern) => Value::Boolean(pattern.matches(entry)),
            None => self.function.apply(args, entry),
        }
    }
}

/// A type-checked aggregate call and its slot in the group store.
#[derive(Debug, PartialEq)]
pub struct Aggregator<C: Column> {
    function: AggregateFunction,
    operands: Vec<Expr<C>>,
    output: DataType,
    handle: Option<Handle>,
}

impl<C: Column> Aggregator<C> {
    /// Build a call, checking the operands against the function's intypes.
    ///
    /// Operands may not contain another aggregator.
    pub fn new(function: AggregateFunction, operands: Vec<Expr<C>>) -> Result<Self, QueryError> {
        let types = check_operands(function.name(), function.intypes(), &operands)?;
        if operands.iter().any(Expr::contains_aggregate) {
            return Err(QueryError::NestedAggregate {
                function: function.name(),
            });
        }
        Ok(Self {
            output: function.output_type(&types),
            function,
            operands,
            handle: None,
        })
    }

    /// The aggregate function being called.
    #[must_use]
    pub const fn function(&self) -> AggregateFunction {
        self.function
    }

    /// Static type of the finalized value.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.output
    }

    /// The slot assigned at allocation, if any.
    #[must_use]
    pub const fn handle(&self) -> Option<Handle> {
        self.handle
    }

    /// Take a slot from the plan's allocator. Called once per compiled plan.
    pub fn allocate(&mut self, allocator: &mut Allocator) -> Result<Handle, QueryError> {
        if self.handle.is_some() {
            debug!(function = self.function.name(), "aggregator allocated twice");
            return Err(QueryError::AlreadyAllocated {
                function: self.function.name(),
            });
        }
        let handle = allocator.allocate();
        self.handle = Some(handle);
        Ok(handle)
    }

    fn require_handle(&self) -> Result<Handle, QueryError> {
        self.handle.ok_or_else(|| {
            debug!(function = self.function.name(), "aggregator used before allocation");
            QueryError::Unallocated {
                function: self.function.name(),
            }
        })
    }

    /// Write the group's starting accumulator into the slot.
    pub fn initialize(&self, store: &mut Store) -> Result<(), QueryError> {
        let handle = self.require_handle()?;
        store.initialize(handle, self.function.initial(self.output))
    }

    /// Fold one row of the group into the slot.
    pub fn update(&self, store: &mut Store, row: &C::Row<'_>) -> Result<(), QueryError> {
        let handle = self.require_handle()?;
        let acc = store.get_mut(handle).map_err(|err| {
            debug!(function = self.function.name(), %err, "update rejected");
            err
        })?;
        self.function.fold(acc, || {
            self.operands
                .first()
                .map_or(Value::Null, |operand| operand.evaluate(row))
        });
        Ok(())
    }

    /// The group's result. Leaves the slot untouched.
    pub fn finalize(&self, store: &Store) -> Result<Value, QueryError> {
        let handle = self.require_handle()?;
        store
            .get(handle)
            .map(crate::store::Accumulator::value)
            .map_err(|err| {
                debug!(function = self.function.name(), %err, "finalize rejected");
                err
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{EntryColumn, PostingColumn};
    use crate::context::PostingContext;
    use rust_decimal_macros::dec;
    use rustledger_core::{Amount, Directive, NaiveDate, Posting, Transaction};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn groceries() -> Directive {
        Directive::Transaction(
            Transaction::new(date(2024, 5, 4), "Groceries")
                .with_tag("food")
                .with_posting(Posting::new("Expenses:Food", Amount::new(dec!(42), "USD")))
                .with_posting(Posting::new("Assets:Cash", Amount::new(dec!(-42), "USD"))),
        )
    }

    #[test]
    fn test_function_types() {
        let expr: Expr<EntryColumn> = Expr::Function(
            Function::new(ScalarFunction::Year, vec![Expr::Column(EntryColumn::Date)]).unwrap(),
        );
        assert_eq!(expr.data_type(), DataType::Integer);
        assert_eq!(expr.evaluate(&&groceries()), Value::Integer(2024));
    }

    #[test]
    fn test_constant_account_pattern_is_precompiled() {
        let entry = groceries();
        let constant = Function::<EntryColumn>::new(
            ScalarFunction::HasAccount,
            vec![Expr::Constant(Value::String("^expenses:".into()))],
        )
        .unwrap();
        assert!(constant.pattern().is_some());

        let computed = Function::<EntryColumn>::new(
            ScalarFunction::HasAccount,
            vec![Expr::Function(
                Function::new(
                    ScalarFunction::Upper,
                    vec![Expr::Constant(Value::String("assets:cash".into()))],
                )
                .unwrap(),
            )],
        )
        .unwrap();
        assert!(computed.pattern().is_none());

        for function in [constant, computed] {
            let expr = Expr::Function(function);
            assert_eq!(expr.evaluate(&&entry), Value::Boolean(true));
        }
    }

    #[test]
    fn test_wrong_operand_type_is_rejected() {
        let err = Function::<EntryColumn>::new(
            ScalarFunction::Year,
            vec![Expr::Column(EntryColumn::Narration)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidArgumentType {
                function: "year",
                position: 1,
                expected: "date".to_string(),
                actual: DataType::String,
            }
        );
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        let err = Function::<EntryColumn>::new(ScalarFunction::Root, vec![Expr::Constant(
            Value::String("Assets".into()),
        )])
        .unwrap_err();
        assert!(matches!(err, QueryError::InvalidArity { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_nested_aggregate_is_rejected() {
        let inner = Aggregator::new(
            AggregateFunction::Sum,
            vec![Expr::Column(PostingColumn::Number)],
        )
        .unwrap();
        let err =
            Aggregator::new(AggregateFunction::Max, vec![Expr::Aggregate(inner)]).unwrap_err();
        assert_eq!(err, QueryError::NestedAggregate { function: "max" });
    }

    #[test]
    fn test_aggregator_lifecycle() {
        let entry = groceries();
        let mut allocator = Allocator::new();
        let mut count =
            Aggregator::new(AggregateFunction::Count, vec![Expr::Column(PostingColumn::Account)])
                .unwrap();

        let mut store = allocator.store();
        assert!(matches!(
            count.initialize(&mut store),
            Err(QueryError::Unallocated { function: "count" })
        ));

        count.allocate(&mut allocator).unwrap();
        assert!(count.allocate(&mut allocator).is_err());

        let mut store = allocator.store();
        let row = PostingContext::new(&entry, 0).unwrap();
        assert!(matches!(
            count.update(&mut store, &row),
            Err(QueryError::UninitializedSlot { .. })
        ));

        count.initialize(&mut store).unwrap();
        for row in PostingContext::iter(&entry) {
            count.update(&mut store, &row).unwrap();
        }
        assert_eq!(count.finalize(&store).unwrap(), Value::Integer(2));
        assert_eq!(count.finalize(&store).unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_evaluate_group_over_finalized_aggregate() {
        let entry = groceries();
        let mut expr: Expr<PostingColumn> = Expr::Function(
            Function::new(
                ScalarFunction::Length,
                vec![Expr::Aggregate(
                    Aggregator::new(
                        AggregateFunction::First,
                        vec![Expr::Column(PostingColumn::Tags)],
                    )
                    .unwrap(),
                )],
            )
            .unwrap(),
        );
        let mut allocator = Allocator::new();
        expr.allocate(&mut allocator).unwrap();
        assert_eq!(allocator.len(), 1);

        let mut store = allocator.store();
        let aggregators = expr.aggregators();
        for aggregator in &aggregators {
            aggregator.initialize(&mut store).unwrap();
        }
        for row in PostingContext::iter(&entry) {
            for aggregator in &aggregators {
                aggregator.update(&mut store, &row).unwrap();
            }
        }

        let representative = PostingContext::new(&entry, 0).unwrap();
        assert_eq!(expr.evaluate(&representative), Value::Null);
        assert_eq!(
            expr.evaluate_group(&representative, &store).unwrap(),
            Value::Integer(1)
        );
    }
}
