//! Query compilation errors.
//!
//! Everything here is raised while a plan is being built or while its
//! aggregation lifecycle is driven out of order. Evaluating a well-typed node
//! never fails.

use thiserror::Error;

use crate::store::Handle;
use crate::types::DataType;

/// Error returned when an expression cannot be compiled or driven.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Unknown column name in the given clause.
    #[error("unknown column '{name}' in {context}")]
    UnknownColumn {
        /// The identifier as written.
        name: String,
        /// Clause label of the environment.
        context: &'static str,
    },
    /// No overload for the name and operand types in the given clause.
    #[error("unknown function '{name}({})' in {context}", join_types(.types))]
    UnknownFunction {
        /// The function name as written.
        name: String,
        /// Clause label of the environment.
        context: &'static str,
        /// Static types of the operands that were passed.
        types: Vec<DataType>,
    },
    /// Wrong number of operands.
    #[error("function {function} expects {expected} argument(s), got {actual}")]
    InvalidArity {
        /// Function name.
        function: &'static str,
        /// Declared operand count.
        expected: usize,
        /// Operand count passed.
        actual: usize,
    },
    /// An operand's type is not accepted at its position.
    #[error("invalid argument {position} to {function}: expected {expected}, got {actual}")]
    InvalidArgumentType {
        /// Function name.
        function: &'static str,
        /// 1-based operand position.
        position: usize,
        /// Accepted type(s) at that position.
        expected: String,
        /// Static type of the operand.
        actual: DataType,
    },
    /// An aggregate was passed another aggregate as an operand.
    #[error("aggregate {function} cannot take an aggregate argument")]
    NestedAggregate {
        /// Function name of the outer aggregate.
        function: &'static str,
    },
    /// `allocate` was called twice on the same aggregator.
    #[error("aggregate {function} is already allocated")]
    AlreadyAllocated {
        /// Function name.
        function: &'static str,
    },
    /// Lifecycle operation on an aggregator without a handle.
    #[error("aggregate {function} was never allocated")]
    Unallocated {
        /// Function name.
        function: &'static str,
    },
    /// `update` or `finalize` on a slot not initialized for this group.
    #[error("aggregation slot {handle} was not initialized")]
    UninitializedSlot {
        /// The slot's handle.
        handle: Handle,
    },
    /// A handle used with a store of another plan.
    #[error("aggregation slot {handle} does not belong to this store")]
    ForeignHandle {
        /// The offending handle.
        handle: Handle,
    },

    /// A handle of this plan allocated after the store was created.
    #[error("aggregation slot {handle} was allocated after this store was created")]
    SlotOutOfRange {
        /// The offending handle.
        handle: Handle,
    },
}

fn join_types(types: &[DataType]) -> String {
    types
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(", ")
}
