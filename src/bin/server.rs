use std::{fs::OpenOptions, net::SocketAddr, path::PathBuf, process::exit, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use sales_dashboard::{
    AppState, DEFAULT_DATASET_URL, DatasetSource, PaginationConfig, build_router,
    graceful_shutdown, initialize_dataset, logging_middleware,
};

/// The REST API server for the sales dashboard.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database. Uses an in-memory
    /// database if not given.
    #[arg(long)]
    db_path: Option<String>,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The URL to download the transaction dataset from.
    #[arg(long, default_value = DEFAULT_DATASET_URL)]
    dataset_url: String,

    /// Load the transaction dataset from this JSON file instead of downloading it.
    #[arg(long, conflicts_with = "dataset_url")]
    dataset_file: Option<PathBuf>,

    /// Serve the transactions already in the database without loading the dataset.
    #[arg(long)]
    skip_seed: bool,

    /// The number of transactions per page when a request does not say.
    #[arg(long, default_value_t = PaginationConfig::default().default_page_size)]
    default_page_size: u64,

    /// The largest page size a client may request.
    #[arg(long, default_value_t = PaginationConfig::default().max_page_size)]
    max_page_size: u64,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let conn = match &args.db_path {
        Some(db_path) => Connection::open(db_path),
        None => Connection::open_in_memory(),
    };
    let conn = match conn {
        Ok(conn) => conn,
        Err(error) => {
            tracing::error!("Could not open the database: {error}");
            exit(1);
        }
    };

    let pagination_config = PaginationConfig {
        default_page_size: args.default_page_size,
        max_page_size: args.max_page_size,
        ..Default::default()
    };

    let state = match AppState::new(conn, pagination_config) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not initialize the database: {error}");
            exit(1);
        }
    };

    if args.skip_seed {
        tracing::info!("Skipping the dataset load, serving the existing database");
        state.dataset_status.mark_ready();
    } else {
        let source = match args.dataset_file {
            Some(path) => DatasetSource::File(path),
            None => DatasetSource::Url(args.dataset_url),
        };
        let seed_state = state.clone();

        tokio::spawn(async move {
            if let Err(error) = initialize_dataset(&source, &seed_state).await {
                tracing::error!("Could not load the dataset: {error}");
            }
        });
    }

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        exit(1);
    }
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let debug_log = match OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
    {
        Ok(log_file) => Some(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(Arc::new(log_file))
                .with_filter(filter::LevelFilter::DEBUG),
        ),
        Err(error) => {
            eprintln!("Could not create log file, logging to stdout only: {error}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
