//! Loading the transaction dataset into the store.
//!
//! The dataset is a JSON array of transactions. Loading it replaces the whole
//! store, so it is safe to run again on every start.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use rusqlite::Connection;

use crate::{AppState, Error, transaction::Transaction, transaction::replace_all_transactions};

/// Where the product transaction dataset is published.
pub const DEFAULT_DATASET_URL: &str =
    "https://s3.amazonaws.com/roxiler.com/product_transaction.json";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where to read the dataset from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// Download the dataset over HTTP(S).
    Url(String),
    /// Read the dataset from a local JSON file.
    File(PathBuf),
}

/// Download the dataset from `url`.
///
/// # Errors
/// Returns [Error::DatasetFetch] if the request fails or the server does not
/// respond with a success status, or [Error::DatasetParse] if the body is not
/// a list of transactions.
pub async fn fetch_dataset(url: &str) -> Result<Vec<Transaction>, Error> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|error| Error::DatasetFetch(error.to_string()))?;

    let body = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|error| Error::DatasetFetch(error.to_string()))?
        .bytes()
        .await
        .map_err(|error| Error::DatasetFetch(error.to_string()))?;

    parse_dataset(&body)
}

/// Read the dataset from the JSON file at `path`.
///
/// # Errors
/// Returns [Error::DatasetRead] if the file cannot be read, or
/// [Error::DatasetParse] if it is not a list of transactions.
pub async fn read_dataset(path: &Path) -> Result<Vec<Transaction>, Error> {
    let body = tokio::fs::read(path)
        .await
        .map_err(|error| Error::DatasetRead(format!("{}: {error}", path.display())))?;

    parse_dataset(&body)
}

/// Parse a JSON array of transactions.
///
/// Records that are not valid transactions, such as one without a price or
/// with an unreadable date, are logged and skipped so the rest still load.
fn parse_dataset(body: &[u8]) -> Result<Vec<Transaction>, Error> {
    let records: Vec<serde_json::Value> =
        serde_json::from_slice(body).map_err(|error| Error::DatasetParse(error.to_string()))?;
    let record_count = records.len();

    let transactions: Vec<Transaction> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            serde_json::from_value(record)
                .inspect_err(|error| tracing::warn!("Skipping dataset record {index}: {error}"))
                .ok()
        })
        .collect();

    let skipped = record_count - transactions.len();
    if skipped > 0 {
        tracing::warn!("Skipped {skipped} of {record_count} dataset records");
    }

    Ok(transactions)
}

/// Replace the contents of the store with `transactions`.
///
/// Returns the number of loaded transactions.
///
/// # Errors
/// Returns [Error::SqlError] if the store could not be updated, in which case
/// the previous contents are kept.
pub fn load_dataset(transactions: &[Transaction], connection: &Connection) -> Result<usize, Error> {
    replace_all_transactions(transactions, connection)
}

/// Load the dataset from `source` into the store and then mark it ready.
///
/// Requests for data are refused until this succeeds. On failure the store
/// and the readiness flag are left untouched.
///
/// # Errors
/// Returns an error if the dataset could not be fetched, parsed or stored.
pub async fn initialize_dataset(source: &DatasetSource, state: &AppState) -> Result<usize, Error> {
    let transactions = match source {
        DatasetSource::Url(url) => {
            tracing::info!("Fetching dataset from {url}");
            fetch_dataset(url).await?
        }
        DatasetSource::File(path) => {
            tracing::info!("Reading dataset from {}", path.display());
            read_dataset(path).await?
        }
    };

    let db_connection = state.db_connection.clone();
    let loaded = tokio::task::spawn_blocking(move || {
        let connection = db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        load_dataset(&transactions, &connection)
    })
    .await
    .map_err(|error| Error::TaskError(error.to_string()))??;

    state.dataset_status.mark_ready();
    tracing::info!("Loaded {loaded} transactions");

    Ok(loaded)
}
