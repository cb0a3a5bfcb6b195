//! Sales dashboard is a small analytics service for a product-transaction dataset.
//!
//! This library provides a JSON REST API for filtered transaction listings and
//! per-month statistics, plus a server-rendered dashboard page.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod dashboard;
mod db;
mod endpoints;
mod html;
mod logging;
mod month;
mod pagination;
mod routing;
mod seed;
mod statistics;
mod transaction;

pub use app_state::{AppState, DatasetStatus};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use seed::{
    DEFAULT_DATASET_URL, DatasetSource, fetch_dataset, initialize_dataset, load_dataset,
    read_dataset,
};
pub use transaction::Transaction;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A route that needs a month was called without one.
    #[error("Month is required")]
    MonthRequired,

    /// The month query parameter is not the name of a calendar month.
    #[error("Invalid month \"{0}\"")]
    InvalidMonth(String),

    /// The dataset has not finished loading, so the store may be empty or stale.
    #[error("The dataset is still loading")]
    DatasetNotReady,

    /// The seed dataset could not be downloaded.
    #[error("could not fetch the dataset: {0}")]
    DatasetFetch(String),

    /// The seed dataset file could not be read.
    #[error("could not read the dataset: {0}")]
    DatasetRead(String),

    /// The seed dataset is not a list of transactions.
    #[error("could not parse the dataset: {0}")]
    DatasetParse(String),

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A blocking database task panicked or was cancelled.
    #[error("a background database task failed: {0}")]
    TaskError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::MonthRequired => (StatusCode::BAD_REQUEST, "Month is required".to_owned()),
            Error::InvalidMonth(_) => (StatusCode::BAD_REQUEST, "Invalid month".to_owned()),
            Error::DatasetNotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                "The dataset is still loading".to_owned(),
            ),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not found".to_owned()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
