//! Per-month sales statistics and chart data.

mod aggregation;
mod handlers;

pub use handlers::{
    get_bar_chart_endpoint, get_combined_endpoint, get_pie_chart_endpoint,
    get_statistics_endpoint,
};
