//! Defines the core data model and store functions for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Deserializer, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::Error;

// ============================================================================
// MODELS
// ============================================================================

/// The sale (or listing) of a product.
///
/// Records come verbatim from the seed dataset, so `id` is not guaranteed to
/// be unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The identifier from the dataset.
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    /// The product name.
    #[serde(default)]
    pub title: String,
    /// A text description of the product.
    #[serde(default)]
    pub description: String,
    /// The listed price of the product.
    pub price: f64,
    /// When the product was sold, always in UTC.
    #[serde(
        serialize_with = "time::serde::rfc3339::serialize",
        deserialize_with = "deserialize_utc"
    )]
    pub date_of_sale: OffsetDateTime,
    /// The product category, e.g. "electronics".
    #[serde(default)]
    pub category: Option<String>,
    /// Whether the product was sold.
    #[serde(default)]
    pub sold: bool,
}

/// Dataset IDs are sometimes numbers and sometimes strings.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(serde_json::Number),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(number) => number.to_string(),
        RawId::Text(text) => text,
    })
}

fn deserialize_utc<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    time::serde::rfc3339::deserialize(deserializer)
        .map(|date_time| date_time.to_offset(UtcOffset::UTC))
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns selected by [map_transaction_row], in order.
pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, title, description, price, date_of_sale, category, sold";

/// Create the transaction table in the database.
///
/// `row_id` preserves the dataset order for listings and `sale_month` holds the
/// UTC calendar month (1-12) of `date_of_sale` for the month-only filters.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                row_id INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                price REAL NOT NULL,
                date_of_sale TEXT NOT NULL,
                sale_month INTEGER NOT NULL CHECK (sale_month BETWEEN 1 AND 12),
                category TEXT,
                sold INTEGER NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_sale_month ON \"transaction\"(sale_month);",
        (),
    )?;

    Ok(())
}

/// Insert `transactions` into the store in order.
///
/// Returns the number of inserted transactions.
///
/// # Errors
/// Returns [Error::SqlError] if any insert fails. Callers that need all or
/// nothing should wrap this in an SQL transaction.
pub fn insert_transactions(
    transactions: &[Transaction],
    connection: &Connection,
) -> Result<usize, Error> {
    let mut statement = connection.prepare_cached(
        "INSERT INTO \"transaction\"
            (id, title, description, price, date_of_sale, sale_month, category, sold)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;

    for transaction in transactions {
        let date_of_sale = transaction.date_of_sale.to_offset(UtcOffset::UTC);

        statement.execute((
            &transaction.id,
            &transaction.title,
            &transaction.description,
            transaction.price,
            date_of_sale,
            u8::from(date_of_sale.month()),
            &transaction.category,
            transaction.sold,
        ))?;
    }

    Ok(transactions.len())
}

/// Delete every transaction in the store.
///
/// Returns the number of deleted transactions.
///
/// # Errors
/// Returns [Error::SqlError] if the delete fails.
pub fn delete_all_transactions(connection: &Connection) -> Result<usize, Error> {
    connection
        .execute("DELETE FROM \"transaction\"", ())
        .map_err(Error::from)
}

/// Replace the contents of the store with `transactions`.
///
/// The delete and the inserts happen in a single SQL transaction, so other
/// connections see either the old or the new dataset, and a failed insert
/// leaves the old dataset in place.
///
/// # Errors
/// Returns [Error::SqlError] if any part of the replacement fails.
pub fn replace_all_transactions(
    transactions: &[Transaction],
    connection: &Connection,
) -> Result<usize, Error> {
    // Using unchecked_transaction because we only have &Connection from the MutexGuard.
    let tx = connection.unchecked_transaction()?;

    let deleted = delete_all_transactions(&tx)?;
    let inserted = insert_transactions(transactions, &tx)?;

    tx.commit()?;

    tracing::debug!("Replaced {deleted} transactions with {inserted} transactions");

    Ok(inserted)
}

/// Map a database row selected with [TRANSACTION_COLUMNS] to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        date_of_sale: row.get(4)?,
        category: row.get(5)?,
        sold: row.get(6)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{db::initialize, transaction::test_utils::transaction};

    use super::{
        TRANSACTION_COLUMNS, Transaction, delete_all_transactions, insert_transactions,
        map_transaction_row, replace_all_transactions,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn get_all(conn: &Connection) -> Vec<Transaction> {
        conn.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" ORDER BY row_id"
        ))
        .unwrap()
        .query_map([], map_transaction_row)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
    }

    #[test]
    fn insert_then_read_back() {
        let conn = get_test_connection();
        let want = vec![
            transaction("1", 150.0, datetime!(2022-03-05 00:00:00 UTC)),
            transaction("2", 50.0, datetime!(2021-07-10 00:00:00 UTC)),
        ];

        let inserted = insert_transactions(&want, &conn).unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(get_all(&conn), want);
    }

    #[test]
    fn insert_allows_duplicate_ids() {
        let conn = get_test_connection();
        let date = datetime!(2022-03-05 00:00:00 UTC);

        insert_transactions(
            &[transaction("1", 1.0, date), transaction("1", 2.0, date)],
            &conn,
        )
        .unwrap();

        assert_eq!(get_all(&conn).len(), 2);
    }

    #[test]
    fn stores_month_in_utc() {
        let conn = get_test_connection();
        // 2022-04-01 03:00 at +05:30 is still March in UTC.
        let date = datetime!(2022-04-01 03:00:00 +05:30);

        insert_transactions(&[transaction("1", 1.0, date)], &conn).unwrap();

        let month: u8 = conn
            .query_row("SELECT sale_month FROM \"transaction\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(month, 3);
    }

    #[test]
    fn delete_all_empties_store() {
        let conn = get_test_connection();
        let date = datetime!(2022-03-05 00:00:00 UTC);
        insert_transactions(&[transaction("1", 1.0, date)], &conn).unwrap();

        let deleted = delete_all_transactions(&conn).unwrap();

        assert_eq!(deleted, 1);
        assert!(get_all(&conn).is_empty());
    }

    #[test]
    fn replace_all_is_idempotent() {
        let conn = get_test_connection();
        let dataset = vec![
            transaction("1", 1.0, datetime!(2022-03-05 00:00:00 UTC)),
            transaction("2", 2.0, datetime!(2022-04-05 00:00:00 UTC)),
        ];

        replace_all_transactions(&dataset, &conn).unwrap();
        replace_all_transactions(&dataset, &conn).unwrap();

        assert_eq!(get_all(&conn), dataset);
    }
}
