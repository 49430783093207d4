//! Column accessors.
//!
//! Two closed sets of zero-operand accessors: [`EntryColumn`] reads a
//! directive, [`PostingColumn`] reads a [`PostingContext`]. Posting columns
//! that describe the parent entry delegate to the entry accessor of the same
//! name, so both always agree.
//!
//! Missing optional fields read as the empty value of the column's type
//! (empty string, empty set, zero) so that every accessor is total.

use std::fmt::{self, Write};

use chrono::Datelike;
use rust_decimal::Decimal;
use rustledger_core::{Amount, Directive, Position, Transaction};
use sha2::{Digest, Sha256};

use crate::context::PostingContext;
use crate::types::{DataType, Value};

/// A column accessor bound to one kind of row.
pub trait Column: Copy + Eq + fmt::Debug + 'static {
    /// The row this column reads.
    type Row<'a>;

    /// Every column of this kind, in declaration order.
    const ALL: &'static [Self];

    /// Lower-case column name.
    fn name(self) -> &'static str;

    /// One-line description for documentation and completion.
    fn description(self) -> &'static str;

    /// Static type of the values this column produces.
    fn data_type(self) -> DataType;

    /// Read the column from a row.
    fn evaluate(self, row: &Self::Row<'_>) -> Value;

    /// The directive a row belongs to.
    fn directive<'r>(row: &'r Self::Row<'_>) -> &'r Directive;
}

/// Columns of the entries environment (FROM clause).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryColumn {
    /// Content hash of the directive.
    Id,
    /// Directive kind, lower case.
    Type,
    /// Source file.
    Filename,
    /// Source line.
    Lineno,
    /// Directive date.
    Date,
    /// Year of the date.
    Year,
    /// Month of the date.
    Month,
    /// Day of the date.
    Day,
    /// Transaction flag.
    Flag,
    /// Transaction payee.
    Payee,
    /// Transaction narration.
    Narration,
    /// Transaction tags.
    Tags,
    /// Transaction links.
    Links,
}

impl EntryColumn {
    fn transaction_string(row: &Directive, read: impl Fn(&Transaction) -> String) -> Value {
        Value::String(row.as_transaction().map(read).unwrap_or_default())
    }

    fn transaction_set(row: &Directive, read: impl Fn(&Transaction) -> &Vec<String>) -> Value {
        Value::StringSet(row.as_transaction().map(|t| read(t).clone()).unwrap_or_default())
    }
}

impl Column for EntryColumn {
    type Row<'a> = &'a Directive;

    const ALL: &'static [Self] = &[
        Self::Id,
        Self::Type,
        Self::Filename,
        Self::Lineno,
        Self::Date,
        Self::Year,
        Self::Month,
        Self::Day,
        Self::Flag,
        Self::Payee,
        Self::Narration,
        Self::Tags,
        Self::Links,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Type => "type",
            Self::Filename => "filename",
            Self::Lineno => "lineno",
            Self::Date => "date",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Flag => "flag",
            Self::Payee => "payee",
            Self::Narration => "narration",
            Self::Tags => "tags",
            Self::Links => "links",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Id => "Unique id of a directive",
            Self::Type => "The data type of the directive",
            Self::Filename => "The filename where the directive was parsed from or created",
            Self::Lineno => "The line number from the file the directive was parsed from",
            Self::Date => "The date of the directive",
            Self::Year => "The year of the date of the directive",
            Self::Month => "The month of the date of the directive",
            Self::Day => "The day of the date of the directive",
            Self::Flag => "The flag of the transaction",
            Self::Payee => "The payee of the transaction",
            Self::Narration => "The narration of the transaction",
            Self::Tags => "The set of tags of the transaction",
            Self::Links => "The set of links of the transaction",
        }
    }

    fn data_type(self) -> DataType {
        match self {
            Self::Id
            | Self::Type
            | Self::Filename
            | Self::Flag
            | Self::Payee
            | Self::Narration => DataType::String,
            Self::Lineno | Self::Year | Self::Month | Self::Day => DataType::Integer,
            Self::Date => DataType::Date,
            Self::Tags | Self::Links => DataType::StringSet,
        }
    }

    fn evaluate(self, row: &&Directive) -> Value {
        let entry: &Directive = row;
        match self {
            Self::Id => Value::String(entry_id(entry)),
            Self::Type => Value::String(entry.type_name().to_string()),
            Self::Filename => Value::String(entry.filename().unwrap_or_default().to_string()),
            Self::Lineno => Value::Integer(entry.lineno().unwrap_or(0)),
            Self::Date => Value::Date(entry.date()),
            Self::Year => Value::Integer(entry.date().year().into()),
            Self::Month => Value::Integer(entry.date().month().into()),
            Self::Day => Value::Integer(entry.date().day().into()),
            Self::Flag => Self::transaction_string(entry, |t| t.flag.to_string()),
            Self::Payee => Self::transaction_string(entry, |t| t.payee.clone().unwrap_or_default()),
            Self::Narration => Self::transaction_string(entry, |t| t.narration.clone()),
            Self::Tags => Self::transaction_set(entry, |t| &t.tags),
            Self::Links => Self::transaction_set(entry, |t| &t.links),
        }
    }

    fn directive<'r>(row: &'r &Directive) -> &'r Directive {
        row
    }
}

/// Hex SHA-256 of the directive's ledger rendering, metadata excluded.
fn entry_id(entry: &Directive) -> String {
    let digest = Sha256::digest(entry.to_string().as_bytes());
    digest.iter().fold(String::new(), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Columns of the postings and targets environments (WHERE clause, targets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostingColumn {
    /// Id of the parent entry.
    Id,
    /// Type of the parent entry.
    Type,
    /// Source file of the parent entry.
    Filename,
    /// Source line of the parent entry.
    Lineno,
    /// Date of the parent entry.
    Date,
    /// Year of the parent entry's date.
    Year,
    /// Month of the parent entry's date.
    Month,
    /// Day of the parent entry's date.
    Day,
    /// Flag of the parent entry.
    Flag,
    /// Payee of the parent entry.
    Payee,
    /// Narration of the parent entry.
    Narration,
    /// Tags of the parent entry.
    Tags,
    /// Links of the parent entry.
    Links,
    /// Flag of the posting itself.
    PostingFlag,
    /// Account of the posting.
    Account,
    /// Number of units.
    Number,
    /// Currency of the units.
    Currency,
    /// Per-unit cost number.
    CostNumber,
    /// Cost currency.
    CostCurrency,
    /// Units and cost as a position.
    Change,
    /// Price annotation.
    Price,
    /// Balancing weight.
    Weight,
}

impl PostingColumn {
    /// The entry column this posting column reads through the parent entry.
    #[must_use]
    pub const fn entry_column(self) -> Option<EntryColumn> {
        match self {
            Self::Id => Some(EntryColumn::Id),
            Self::Type => Some(EntryColumn::Type),
            Self::Filename => Some(EntryColumn::Filename),
            Self::Lineno => Some(EntryColumn::Lineno),
            Self::Date => Some(EntryColumn::Date),
            Self::Year => Some(EntryColumn::Year),
            Self::Month => Some(EntryColumn::Month),
            Self::Day => Some(EntryColumn::Day),
            Self::Flag => Some(EntryColumn::Flag),
            Self::Payee => Some(EntryColumn::Payee),
            Self::Narration => Some(EntryColumn::Narration),
            Self::Tags => Some(EntryColumn::Tags),
            Self::Links => Some(EntryColumn::Links),
            Self::PostingFlag
            | Self::Account
            | Self::Number
            | Self::Currency
            | Self::CostNumber
            | Self::CostCurrency
            | Self::Change
            | Self::Price
            | Self::Weight => None,
        }
    }
}

impl Column for PostingColumn {
    type Row<'a> = PostingContext<'a>;

    const ALL: &'static [Self] = &[
        Self::Id,
        Self::Type,
        Self::Filename,
        Self::Lineno,
        Self::Date,
        Self::Year,
        Self::Month,
        Self::Day,
        Self::Flag,
        Self::Payee,
        Self::Narration,
        Self::Tags,
        Self::Links,
        Self::PostingFlag,
        Self::Account,
        Self::Number,
        Self::Currency,
        Self::CostNumber,
        Self::CostCurrency,
        Self::Change,
        Self::Price,
        Self::Weight,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Type => "type",
            Self::Filename => "filename",
            Self::Lineno => "lineno",
            Self::Date => "date",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Flag => "flag",
            Self::Payee => "payee",
            Self::Narration => "narration",
            Self::Tags => "tags",
            Self::Links => "links",
            Self::PostingFlag => "posting_flag",
            Self::Account => "account",
            Self::Number => "number",
            Self::Currency => "currency",
            Self::CostNumber => "cost_number",
            Self::CostCurrency => "cost_currency",
            Self::Change => "change",
            Self::Price => "price",
            Self::Weight => "weight",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Id => "The unique id of the parent transaction for this posting",
            Self::Type => "The data type of the parent transaction for this posting",
            Self::Filename => "The filename where the posting was parsed from or created",
            Self::Lineno => "The line number from the file the posting was parsed from",
            Self::Date => "The date of the parent transaction for this posting",
            Self::Year => "The year of the date of the parent transaction for this posting",
            Self::Month => "The month of the date of the parent transaction for this posting",
            Self::Day => "The day of the date of the parent transaction for this posting",
            Self::Flag => "The flag of the parent transaction for this posting",
            Self::Payee => "The payee of the parent transaction for this posting",
            Self::Narration => "The narration of the parent transaction for this posting",
            Self::Tags => "The set of tags of the parent transaction for this posting",
            Self::Links => "The set of links of the parent transaction for this posting",
            Self::PostingFlag => "The flag of the posting itself",
            Self::Account => "The account of the posting",
            Self::Number => "The number of units of the posting",
            Self::Currency => "The currency of the posting",
            Self::CostNumber => "The number of cost units of the posting",
            Self::CostCurrency => "The cost currency of the posting",
            Self::Change => "The position for the posting. These can be summed into inventories",
            Self::Price => "The price attached to the posting",
            Self::Weight => "The computed weight used for this posting",
        }
    }

    fn data_type(self) -> DataType {
        match self {
            Self::Lineno | Self::Year | Self::Month | Self::Day => DataType::Integer,
            Self::Date => DataType::Date,
            Self::Tags | Self::Links => DataType::StringSet,
            Self::Number | Self::CostNumber => DataType::Number,
            Self::Change => DataType::Position,
            Self::Price | Self::Weight => DataType::Amount,
            Self::Id
            | Self::Type
            | Self::Filename
            | Self::Flag
            | Self::Payee
            | Self::Narration
            | Self::PostingFlag
            | Self::Account
            | Self::Currency
            | Self::CostCurrency => DataType::String,
        }
    }

    fn evaluate(self, row: &PostingContext<'_>) -> Value {
        let posting = row.posting();
        match self {
            Self::Id
            | Self::Type
            | Self::Filename
            | Self::Lineno
            | Self::Date
            | Self::Year
            | Self::Month
            | Self::Day
            | Self::Flag
            | Self::Payee
            | Self::Narration
            | Self::Tags
            | Self::Links => self
                .entry_column()
                .map_or(Value::Null, |column| column.evaluate(&row.entry())),
            Self::PostingFlag => Value::String(posting.flag.map(String::from).unwrap_or_default()),
            Self::Account => Value::String(posting.account.clone()),
            Self::Number => Value::Number(posting.units.number),
            Self::Currency => Value::String(posting.units.currency.clone()),
            Self::CostNumber => Value::Number(
                posting
                    .cost
                    .as_ref()
                    .map_or(Decimal::ZERO, |cost| cost.number),
            ),
            Self::CostCurrency => Value::String(
                posting
                    .cost
                    .as_ref()
                    .map(|cost| cost.currency.clone())
                    .unwrap_or_default(),
            ),
            Self::Change => Value::Position(posting.position()),
            Self::Price => Value::Amount(posting.price.clone().unwrap_or_else(Amount::empty)),
            Self::Weight => Value::Amount(posting.weight()),
        }
    }

    fn directive<'r>(row: &'r PostingContext<'_>) -> &'r Directive {
        row.entry()
    }
}

/// The cost of a position's units, or `0` with no currency when it has none.
pub(crate) fn cost_or_empty(position: &Position) -> Amount {
    position.book_value().unwrap_or_else(Amount::empty)
}
