//! Route handlers for the per-month statistics and chart data.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    month::{optional_month, require_month},
    transaction::TransactionFilter,
};

use super::aggregation::{
    CategoryCount, CombinedReport, PriceBucket, Statistics, get_category_counts,
    get_combined_report, get_price_histogram, get_statistics,
};

/// The state needed for the statistics routes.
#[derive(Debug, Clone)]
pub struct StatisticsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StatisticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The month to aggregate over.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    /// The English name of a month, e.g. "March".
    pub month: Option<String>,
}

impl StatisticsState {
    fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }
}

/// Get the total sale amount and the sold and unsold item counts for a month.
///
/// Unlike the other statistics routes, the month is required and must be valid.
pub async fn get_statistics_endpoint(
    State(state): State<StatisticsState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Statistics>, Error> {
    let month = require_month(query.month.as_deref())?;
    let filter = TransactionFilter::for_month(Some(month));

    let statistics = get_statistics(&filter, &*state.connection()?)
        .inspect_err(|error| tracing::error!("Error fetching statistics: {error}"))?;

    Ok(Json(statistics))
}

/// Get the price histogram for a month, or for every month if no valid month is given.
pub async fn get_bar_chart_endpoint(
    State(state): State<StatisticsState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<PriceBucket>>, Error> {
    let filter = TransactionFilter::for_month(optional_month(query.month.as_deref()));

    let histogram = get_price_histogram(&filter, &*state.connection()?)
        .inspect_err(|error| tracing::error!("Error fetching bar chart data: {error}"))?;

    Ok(Json(histogram))
}

/// Get the category counts for a month, or for every month if no valid month is given.
pub async fn get_pie_chart_endpoint(
    State(state): State<StatisticsState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<CategoryCount>>, Error> {
    let filter = TransactionFilter::for_month(optional_month(query.month.as_deref()));

    let category_counts = get_category_counts(&filter, &*state.connection()?)
        .inspect_err(|error| tracing::error!("Error fetching pie chart data: {error}"))?;

    Ok(Json(category_counts))
}

/// Get the transactions, statistics, histogram and category counts for a month
/// in a single response.
pub async fn get_combined_endpoint(
    State(state): State<StatisticsState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<CombinedReport>, Error> {
    let filter = TransactionFilter::for_month(optional_month(query.month.as_deref()));

    let report = get_combined_report(&filter, &*state.connection()?)
        .inspect_err(|error| tracing::error!("Error fetching combined data: {error}"))?;

    Ok(Json(report))
}
