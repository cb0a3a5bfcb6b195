//! Implements a struct that holds the state of the REST server.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{Error, db::initialize, pagination::PaginationConfig};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The config that controls how to page through transactions.
    pub pagination_config: PaginationConfig,

    /// Whether the transaction dataset has finished loading.
    pub dataset_status: DatasetStatus,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the transaction table.
    /// The dataset starts out as not ready, call [DatasetStatus::mark_ready] once
    /// the store holds the data that should be served.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, pagination_config: PaginationConfig) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            pagination_config,
            dataset_status: DatasetStatus::default(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

/// A readiness flag shared between the dataset loader and the request handlers.
///
/// Requests for data are refused until the loader has replaced the store
/// contents, so clients never observe a half-reset store.
#[derive(Debug, Clone, Default)]
pub struct DatasetStatus(Arc<AtomicBool>);

impl DatasetStatus {
    /// Whether the dataset can be served.
    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Allow requests to read the dataset.
    pub fn mark_ready(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl FromRef<AppState> for DatasetStatus {
    fn from_ref(state: &AppState) -> Self {
        state.dataset_status.clone()
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{AppState, PaginationConfig};

    #[test]
    fn dataset_starts_not_ready() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            PaginationConfig::default(),
        )
        .unwrap();

        assert!(!state.dataset_status.is_ready());
    }

    #[test]
    fn clones_share_readiness() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            PaginationConfig::default(),
        )
        .unwrap();
        let clone = state.clone();

        state.dataset_status.mark_ready();

        assert!(clone.dataset_status.is_ready());
    }
}
