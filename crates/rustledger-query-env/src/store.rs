//! Aggregation state arena.
//!
//! Aggregators hold no state of their own. At compile time each one asks the
//! plan's [`Allocator`] for a [`Handle`]; the executor then provisions a
//! [`Store`] from that allocator (one per group being computed concurrently)
//! and every accumulator lives in the slot its handle names.
//!
//! Handles are tagged with the plan that allocated them, so a store built for
//! one compiled plan rejects handles of another. A store only covers the
//! handles allocated before it was created.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::QueryError;
use crate::types::Value;

static NEXT_PLAN: AtomicU64 = AtomicU64::new(0);

/// Index of one aggregator's slot in a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    plan: u64,
    index: usize,
}

impl Handle {
    /// Position of the slot within its store.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Hands out fresh handles for one compiled plan.
#[derive(Debug)]
pub struct Allocator {
    plan: u64,
    next: usize,
}

impl Allocator {
    /// Create an allocator for a new plan.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plan: NEXT_PLAN.fetch_add(1, Ordering::Relaxed),
            next: 0,
        }
    }

    /// Allocate a handle no other aggregator of this plan holds.
    pub fn allocate(&mut self) -> Handle {
        let handle = Handle {
            plan: self.plan,
            index: self.next,
        };
        self.next += 1;
        tracing::trace!(handle = %handle, plan = self.plan, "allocated aggregation slot");
        handle
    }

    /// Number of handles allocated so far.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.next
    }

    /// Whether no handle has been allocated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.next == 0
    }

    /// A store with one uninitialized slot per allocated handle.
    #[must_use]
    pub fn store(&self) -> Store {
        Store {
            plan: self.plan,
            slots: vec![None; self.next],
        }
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

/// The running state of one aggregator for the current group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accumulator {
    /// Nothing has been contributed yet and there is no neutral element.
    Unset,
    /// The accumulated value.
    Set(Value),
}

impl Accumulator {
    /// The value to report at the end of a group; unset reads as `Null`.
    #[must_use]
    pub fn value(&self) -> Value {
        match self {
            Self::Unset => Value::Null,
            Self::Set(value) => value.clone(),
        }
    }
}

/// Per-group aggregation state, owned by the executor.
#[derive(Debug, Clone)]
pub struct Store {
    plan: u64,
    slots: Vec<Option<Accumulator>>,
}

impl Store {
    fn slot_index(&self, handle: Handle) -> Result<usize, QueryError> {
        if handle.plan != self.plan {
            return Err(QueryError::ForeignHandle { handle });
        }
        if handle.index >= self.slots.len() {
            return Err(QueryError::SlotOutOfRange { handle });
        }
        Ok(handle.index)
    }

    /// Write the starting accumulator of a slot.
    pub fn initialize(&mut self, handle: Handle, start: Accumulator) -> Result<(), QueryError> {
        let index = self.slot_index(handle)?;
        self.slots[index] = Some(start);
        Ok(())
    }

    /// Read an initialized slot.
    pub fn get(&self, handle: Handle) -> Result<&Accumulator, QueryError> {
        let index = self.slot_index(handle)?;
        self.slots[index]
            .as_ref()
            .ok_or(QueryError::UninitializedSlot { handle })
    }

    /// Mutably borrow an initialized slot.
    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut Accumulator, QueryError> {
        let index = self.slot_index(handle)?;
        self.slots[index]
            .as_mut()
            .ok_or(QueryError::UninitializedSlot { handle })
    }

    /// Return every slot to the uninitialized state.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
