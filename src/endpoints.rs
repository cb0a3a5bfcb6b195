//! The API endpoints URIs.

/// The dashboard page.
pub const ROOT: &str = "/";
/// The route for listing transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route for a month's sales totals.
pub const STATISTICS: &str = "/statistics";
/// The route for a month's price histogram.
pub const BAR_CHART: &str = "/barchart";
/// The route for a month's category counts.
pub const PIE_CHART: &str = "/piechart";
/// The route for a month's transactions and all of their aggregates.
pub const COMBINED: &str = "/combined";
/// The route for checking whether the dataset has loaded.
pub const HEALTH: &str = "/health";
