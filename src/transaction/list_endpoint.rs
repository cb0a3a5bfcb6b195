//! Defines the route handler for listing transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    pagination::{Page, PaginationConfig},
};

use super::{
    core::Transaction,
    filter::TransactionFilter,
    query::{count_transactions, find_transactions},
};

/// The state needed for listing transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how to page through transactions.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    /// Text to look for in the title, description or price.
    pub search: Option<String>,
    /// The one-based page number.
    pub page: Option<u64>,
    /// The number of transactions per page.
    pub per_page: Option<u64>,
    /// The name of the month the transactions were sold in.
    pub month: Option<String>,
    /// Text to look for in the category.
    pub category: Option<String>,
}

/// One page of transactions and the number of transactions across all pages.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionListing {
    /// The total number of transactions matching the filter.
    pub count: u64,
    /// The transactions on the requested page.
    pub transactions: Vec<Transaction>,
}

/// Get a page of transactions matching the optional search, month and category filters.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<TransactionListing>, Error> {
    let filter = TransactionFilter::from_params(
        query.search.as_deref(),
        query.month.as_deref(),
        query.category.as_deref(),
    );
    let page = Page::new(query.page, query.per_page, &state.pagination_config);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = find_transactions(&filter, page, &connection)
        .inspect_err(|error| tracing::error!("Error fetching transactions: {error}"))?;
    let count = count_transactions(&filter, &connection)
        .inspect_err(|error| tracing::error!("Error counting transactions: {error}"))?;

    Ok(Json(TransactionListing {
        count,
        transactions,
    }))
}
