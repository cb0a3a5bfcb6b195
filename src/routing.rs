//! Application router configuration with the data routes gated on the dataset having loaded.

use axum::{
    Json, Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, DatasetStatus, Error,
    dashboard::get_dashboard_page,
    endpoints,
    statistics::{
        get_bar_chart_endpoint, get_combined_endpoint, get_pie_chart_endpoint,
        get_statistics_endpoint,
    },
    transaction::list_transactions_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let data_routes = Router::new()
        .route(endpoints::ROOT, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS, get(list_transactions_endpoint))
        .route(endpoints::STATISTICS, get(get_statistics_endpoint))
        .route(endpoints::BAR_CHART, get(get_bar_chart_endpoint))
        .route(endpoints::PIE_CHART, get(get_pie_chart_endpoint))
        .route(endpoints::COMBINED, get(get_combined_endpoint))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_dataset_loaded,
        ));

    data_routes
        .route(endpoints::HEALTH, get(get_health))
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Refuse requests with a 503 until the dataset has been loaded into the store.
async fn require_dataset_loaded(
    State(dataset_status): State<DatasetStatus>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    if !dataset_status.is_ready() {
        tracing::debug!("Refusing {} while the dataset loads", request.uri());
        return Err(Error::DatasetNotReady);
    }

    Ok(next.run(request).await)
}

/// Report whether the server is ready to serve data.
async fn get_health(State(dataset_status): State<DatasetStatus>) -> Result<Json<Value>, Error> {
    if dataset_status.is_ready() {
        Ok(Json(json!({ "status": "ok" })))
    } else {
        Err(Error::DatasetNotReady)
    }
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode, header};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::datetime;

    use crate::{
        AppState, PaginationConfig, endpoints,
        transaction::{insert_transactions, test_utils::transaction},
    };

    use super::build_router;

    fn get_test_state() -> AppState {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            PaginationConfig::default(),
        )
        .unwrap();

        insert_transactions(
            &[transaction("1", 150.0, datetime!(2022-03-05 00:00:00 UTC))],
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        state
    }

    #[tokio::test]
    async fn data_routes_wait_for_dataset() {
        let server = TestServer::try_new(build_router(get_test_state())).unwrap();

        for path in [
            endpoints::ROOT,
            endpoints::TRANSACTIONS,
            endpoints::BAR_CHART,
            endpoints::PIE_CHART,
            endpoints::COMBINED,
        ] {
            let response = server.get(path).expect_failure().await;

            response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
            response.assert_json(&json!({ "message": "The dataset is still loading" }));
        }

        server
            .get(endpoints::STATISTICS)
            .add_query_param("month", "March")
            .expect_failure()
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn data_routes_serve_once_dataset_is_ready() {
        let state = get_test_state();
        state.dataset_status.mark_ready();
        let server = TestServer::try_new(build_router(state)).unwrap();

        let response = server.get(endpoints::TRANSACTIONS).await;
        response.assert_status_ok();
        response.assert_json_contains(&json!({ "count": 1 }));

        server
            .get(endpoints::STATISTICS)
            .add_query_param("month", "March")
            .await
            .assert_status_ok();
        server.get(endpoints::ROOT).await.assert_status_ok();
    }

    #[tokio::test]
    async fn health_reflects_dataset_status() {
        let state = get_test_state();
        let server = TestServer::try_new(build_router(state.clone())).unwrap();

        server
            .get(endpoints::HEALTH)
            .expect_failure()
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);

        state.dataset_status.mark_ready();

        let response = server.get(endpoints::HEALTH).await;
        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let server = TestServer::try_new(build_router(get_test_state())).unwrap();

        let response = server.get("/nope").expect_failure().await;

        response.assert_status_not_found();
        response.assert_json(&json!({ "message": "Not found" }));
    }

    #[tokio::test]
    async fn allows_cross_origin_requests() {
        let state = get_test_state();
        state.dataset_status.mark_ready();
        let server = TestServer::try_new(build_router(state)).unwrap();

        let response = server
            .get(endpoints::HEALTH)
            .add_header(
                header::ORIGIN,
                HeaderValue::from_static("http://localhost:5173"),
            )
            .await;

        response.assert_status_ok();
        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }
}
