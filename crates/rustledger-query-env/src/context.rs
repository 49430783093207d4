//! Row contexts.
//!
//! Entry-scoped nodes read a `&Directive`. Posting-scoped nodes read a
//! [`PostingContext`]: one posting of a transaction together with the
//! directive it belongs to.

use rustledger_core::{Directive, Posting, Transaction};

/// One posting of a transaction, with a back-reference to its parent entry.
#[derive(Debug, Clone, Copy)]
pub struct PostingContext<'a> {
    entry: &'a Directive,
    transaction: &'a Transaction,
    index: usize,
}

impl<'a> PostingContext<'a> {
    /// The context for posting `index` of `entry`.
    ///
    /// Returns `None` when `entry` is not a transaction or has no such posting.
    #[must_use]
    pub fn new(entry: &'a Directive, index: usize) -> Option<Self> {
        let transaction = entry.as_transaction()?;
        if index >= transaction.postings.len() {
            return None;
        }
        Some(Self {
            entry,
            transaction,
            index,
        })
    }

    /// One context per posting of `entry`, in posting order.
    pub fn iter(entry: &'a Directive) -> impl Iterator<Item = Self> + 'a {
        let count = entry.as_transaction().map_or(0, |t| t.postings.len());
        (0..count).filter_map(move |index| Self::new(entry, index))
    }

    /// The parent entry.
    #[must_use]
    pub const fn entry(&self) -> &'a Directive {
        self.entry
    }

    /// The parent entry as a transaction.
    #[must_use]
    pub const fn transaction(&self) -> &'a Transaction {
        self.transaction
    }

    /// Index of the posting within its transaction.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The posting itself.
    #[must_use]
    pub fn posting(&self) -> &'a Posting {
        &self.transaction.postings[self.index]
    }
}
