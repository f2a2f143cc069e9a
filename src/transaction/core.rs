//! Defines the core data model and database queries for payment transactions.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::Error;

// ============================================================================
// MODELS
// ============================================================================

/// A payment that a sender has reported along with a screenshot of the
/// confirmation.
///
/// Transactions are created once and never updated by this service, but
/// `updated_at` is kept so that the schema can support edits later.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the database row.
    pub id: i64,
    /// Who sent the payment.
    pub name: String,
    /// The identifier on the payment confirmation.
    ///
    /// Not unique, the same ID may be submitted more than once.
    pub transaction_id: String,
    /// The filename of the stored screenshot, relative to the upload directory.
    pub image_url: String,
    /// When the transaction was saved.
    pub created_at: OffsetDateTime,
    /// When the transaction was last written.
    pub updated_at: OffsetDateTime,
}

/// The data needed to save a new [Transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Who sent the payment.
    pub name: String,
    /// The identifier on the payment confirmation.
    pub transaction_id: String,
    /// The filename of the stored screenshot.
    pub image_url: String,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database.
///
/// Both timestamps are set to the current time.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = OffsetDateTime::now_utc();

    let transaction = connection
        .prepare(
            "INSERT INTO payment_transaction (name, transaction_id, image_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING id, name, transaction_id, image_url, created_at, updated_at",
        )?
        .query_row(
            (
                new_transaction.name,
                new_transaction.transaction_id,
                new_transaction.image_url,
                now,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve every transaction in the order they were saved.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
#[cfg(test)]
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, name, transaction_id, image_url, created_at, updated_at
             FROM payment_transaction ORDER BY id ASC",
        )?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS payment_transaction (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                transaction_id TEXT NOT NULL,
                image_url TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        name: row.get(1)?,
        transaction_id: row.get(2)?,
        image_url: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
