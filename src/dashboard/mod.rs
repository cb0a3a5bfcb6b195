//! Dashboard module
//!
//! Provides the server-rendered page for browsing a month's transactions,
//! with a price range chart and a summary of the displayed page.

mod charts;
mod handlers;
mod summary;

pub use handlers::get_dashboard_page;
