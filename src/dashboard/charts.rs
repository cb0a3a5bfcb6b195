//! The ECharts bar chart of the price ranges on the current dashboard page.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisPointer, AxisPointerType, AxisType, Tooltip, Trigger},
    series::Bar,
};
use maud::{Markup, PreEscaped, html};

use crate::{
    dashboard::summary::{PRICE_RANGES, count_price_ranges},
    html::HeadElement,
    transaction::Transaction,
};

/// Where the ECharts library is loaded from.
pub(super) const ECHARTS_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML container for a chart.
pub(super) fn chart_view(chart: &DashboardChart) -> Markup {
    html!(
        div
            id=(chart.id)
            class="min-h-[380px] w-full rounded dark:bg-gray-100"
        {}
    )
}

/// Generates the JavaScript that initializes the chart once the page has loaded.
///
/// The chart follows the browser's dark mode setting and resizes with the window.
pub(super) fn chart_script(chart: &DashboardChart) -> HeadElement {
    let script = format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
            const chartDom = document.getElementById("{}");
            const chart = echarts.init(chartDom);
            const option = {};
            chart.setOption(option);

            window.addEventListener('resize', chart.resize);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                const isDarkMode = darkModeMediaQuery.matches;
                chart.setTheme(isDarkMode ? 'dark' : 'default');
            }}
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();
        }});"#,
        chart.id, chart.options
    );

    HeadElement::ScriptSource(PreEscaped(script))
}

/// A bar chart of how many of `transactions` fall in each price range.
pub(super) fn price_range_chart(transactions: &[Transaction]) -> DashboardChart {
    let labels: Vec<_> = PRICE_RANGES.iter().map(|range| range.label).collect();
    let counts: Vec<f64> = count_price_ranges(transactions)
        .into_iter()
        .map(|count| count as f64)
        .collect();

    let chart = Chart::new()
        .title(
            Title::new()
                .text("Price ranges")
                .subtext("Items on this page"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(Axis::new().type_(AxisType::Value))
        .series(Bar::new().name("Number of Items").data(counts));

    DashboardChart {
        id: "price-range-chart",
        options: chart.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use time::macros::datetime;

    use crate::transaction::test_utils::transaction;

    use super::price_range_chart;

    #[test]
    fn chart_options_are_json_with_every_range_label() {
        let transactions = [
            transaction("1", 50.0, datetime!(2022-03-01 00:00:00 UTC)),
            transaction("2", 750.0, datetime!(2022-03-01 00:00:00 UTC)),
        ];

        let chart = price_range_chart(&transactions);

        assert_eq!(chart.id, "price-range-chart");
        assert!(serde_json::from_str::<Value>(&chart.options).is_ok());
        for label in ["0-100", "100-500", "500-1000", "1000-5000", "5000+"] {
            assert!(
                chart.options.contains(&format!("\"{label}\"")),
                "missing {label} in {}",
                chart.options
            );
        }
    }
}
