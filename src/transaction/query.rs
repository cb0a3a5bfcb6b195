//! Database queries for listing transactions.

use rusqlite::{Connection, params_from_iter};

use crate::{Error, pagination::Page};

use super::{
    core::{TRANSACTION_COLUMNS, Transaction, map_transaction_row},
    filter::TransactionFilter,
};

/// Get one page of the transactions matching `filter`, in dataset order.
///
/// # Errors
/// Returns [Error::SqlError] if:
/// - SQL query preparation or execution fails
/// - Transaction row mapping fails
pub fn find_transactions(
    filter: &TransactionFilter,
    page: Page,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, mut params) = filter.to_sql();
    params.push(clamp_to_i64(page.size).into());
    params.push(clamp_to_i64(page.offset()).into());

    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" {where_clause} \
        ORDER BY row_id ASC LIMIT ? OFFSET ?"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Get every transaction matching `filter`, in dataset order.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn find_all_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, params) = filter.to_sql();
    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" {where_clause} ORDER BY row_id ASC"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Count all of the transactions matching `filter`, regardless of paging.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn count_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, params) = filter.to_sql();
    let query = format!("SELECT COUNT(*) FROM \"transaction\" {where_clause}");

    connection
        .query_row(&query, params_from_iter(params), |row| row.get(0))
        .map_err(Error::from)
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
