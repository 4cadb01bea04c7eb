//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{CategoryId, CategoryKind},
    database_id::TransactionID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction adds to or subtracts from the running totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// The wire and storage representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Parse a stored kind string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

impl From<CategoryKind> for TransactionKind {
    fn from(kind: CategoryKind) -> Self {
        match kind {
            CategoryKind::Income => TransactionKind::Income,
            CategoryKind::Expense => TransactionKind::Expense,
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "Income"),
            TransactionKind::Expense => write!(f, "Expense"),
        }
    }
}

/// An income or expense record.
///
/// `date` is the instant the record was created and never changes afterwards.
/// Edits may only touch `amount`, `description`, `category_id` and `kind`.
///
/// `category_id` is a weak reference: the category it points to may no longer
/// exist. Such dangling transactions still count towards the totals but are
/// left out of the per-category breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionID,
    /// The amount of money earned or spent, always positive.
    pub amount: f64,
    /// Whether the amount counts as income or expense.
    pub kind: TransactionKind,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The donor's name, only set for transactions in the donation category.
    pub donor: Option<String>,
    /// When the transaction was recorded.
    pub date: OffsetDateTime,
}

/// The fields needed to create a [Transaction].
///
/// The creation date is assigned by [create_transaction], so the builder does
/// not carry one.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount, must be finite and positive.
    pub amount: f64,
    /// Whether the amount counts as income or expense.
    pub kind: TransactionKind,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// A human-readable description of the transaction.
    pub description: String,
    /// The donor's name for donation transactions.
    pub donor: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// The transaction's date is set to the current instant.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not a positive, finite number,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_amount(builder.amount)?;

    let date = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO \"transaction\" (amount, kind, category_id, description, donor, date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            builder.amount,
            builder.kind.as_str(),
            builder.category_id,
            &builder.description,
            &builder.donor,
            date,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Transaction {
        id,
        amount: builder.amount,
        kind: builder.kind,
        category_id: builder.category_id,
        description: builder.description,
        donor: builder.donor,
        date,
    })
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionID, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, amount, kind, category_id, description, donor, date
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve all transactions in insertion order.
///
/// Views bulk load the full list and filter in memory.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, amount, kind, category_id, description, donor, date
             FROM \"transaction\" ORDER BY id ASC",
        )?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Retrieve all transactions belonging to `category_id`, in insertion order.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_transactions_for_category(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, amount, kind, category_id, description, donor, date
             FROM \"transaction\" WHERE category_id = :category_id ORDER BY id ASC",
        )?
        .query_map(&[(":category_id", &category_id)], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the editable fields of the transaction with ID `id`.
///
/// The creation date and donor are immutable and left untouched.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not a positive, finite number,
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionID,
    amount: f64,
    description: &str,
    category_id: CategoryId,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<(), Error> {
    validate_amount(amount)?;

    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET amount = ?1, description = ?2, category_id = ?3, kind = ?4
         WHERE id = ?5",
        (amount, description, category_id, kind.as_str(), id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete a transaction by ID, returning the number of rows removed.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn delete_transaction(id: TransactionID, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = :id",
            &[(":id", &id)],
        )
        .map_err(|err| err.into())
}

/// Create the transaction table in the database.
///
/// `category_id` deliberately carries no foreign key so that transactions can
/// outlive their category.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                donor TEXT,
                date TEXT NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Index used by the category detail page.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
        (),
    )?;

    Ok(())
}

fn validate_amount(amount: f64) -> Result<(), Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let raw_kind: String = row.get(2)?;
    let category_id = row.get(3)?;
    let description = row.get(4)?;
    let donor = row.get(5)?;
    let date = row.get(6)?;

    // Rows are only ever written with a known kind, but guard against
    // hand-edited data by treating anything unrecognized as an expense.
    let kind = TransactionKind::parse(&raw_kind).unwrap_or(TransactionKind::Expense);

    Ok(Transaction {
        id,
        amount,
        kind,
        category_id,
        description,
        donor,
        date,
    })
}

// ============================================================================
// TESTS
// ============================================================================
