//! Dashboard HTTP handler and view rendering.
//!
//! The page lists one month's transactions with a category search box,
//! previous/next paging, a price range chart and a summary of the page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    dashboard::{
        charts::{DashboardChart, ECHARTS_SCRIPT_URL, chart_script, chart_view, price_range_chart},
        summary::PageSummary,
    },
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency, link,
    },
    month::{MONTHS, optional_month},
    pagination::{Page, PaginationConfig},
    transaction::{Transaction, TransactionFilter, count_transactions, find_transactions},
};

/// The month shown when the page is opened without choosing one.
const DEFAULT_MONTH: &str = "March";

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The page size used for the transactions table.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The dashboard controls.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// The month to show. Missing means March, blank means every month.
    pub month: Option<String>,
    /// Text to search for in the category.
    pub category: Option<String>,
    /// The one-based page of the transactions table.
    pub page: Option<u64>,
}

/// Everything needed to render the dashboard page.
struct DashboardData<'a> {
    month: &'a str,
    category: &'a str,
    page: Page,
    page_count: u64,
    transactions: Vec<Transaction>,
    summary: PageSummary,
    chart: DashboardChart,
}

/// Display the dashboard page.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let month = query.month.as_deref().unwrap_or(DEFAULT_MONTH);
    let category = query.category.as_deref().unwrap_or_default();

    let filter = TransactionFilter::from_params(None, Some(month), Some(category));
    let page = Page::new(query.page, None, &state.pagination_config);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = find_transactions(&filter, page, &connection)
        .inspect_err(|error| tracing::error!("Could not get dashboard transactions: {error}"))?;
    let count = count_transactions(&filter, &connection)
        .inspect_err(|error| tracing::error!("Could not count dashboard transactions: {error}"))?;
    drop(connection);

    let data = DashboardData {
        month,
        category,
        page,
        page_count: page.page_count(count),
        summary: PageSummary::from_transactions(&transactions),
        chart: price_range_chart(&transactions),
        transactions,
    };

    Ok(dashboard_view(&data).into_response())
}

/// The URL of the dashboard showing `page_number` with the current controls.
fn page_url(month: &str, category: &str, page_number: u64) -> String {
    let page_number = page_number.to_string();
    let query = serde_urlencoded::to_string([
        ("month", month),
        ("category", category),
        ("page", page_number.as_str()),
    ])
    .inspect_err(|error| tracing::error!("Could not encode dashboard query: {error}"))
    .unwrap_or_default();

    format!("{}?{query}", endpoints::ROOT)
}

fn filters_view(month: &str, category: &str) -> Markup {
    let selected_month = optional_month(Some(month));

    html!(
        form
            method="get"
            action=(endpoints::ROOT)
            class="w-full flex flex-col md:flex-row gap-4 mb-6"
        {
            div class="flex-1"
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Search Transaction" }
                input
                    type="text"
                    name="category"
                    id="category"
                    placeholder="Search Transaction"
                    value=(category)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex-1"
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month" }
                select
                    name="month"
                    id="month"
                    onchange="this.form.submit()"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[selected_month.is_none()] { "Select Month" }

                    @for month in MONTHS {
                        option value=(month.to_string()) selected[selected_month == Some(month)] { (month.to_string()) }
                    }
                }
            }
        }
    )
}

fn transactions_table(transactions: &[Transaction]) -> Markup {
    html!(
        div class="w-full overflow-x-auto rounded-lg shadow mb-4"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "ID" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Price" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Sold" }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
                        {
                            td class=(TABLE_CELL_STYLE) { (transaction.id) }
                            td class=(TABLE_CELL_STYLE) { (transaction.title) }
                            td class=(TABLE_CELL_STYLE) { (transaction.description) }
                            td class={(TABLE_CELL_STYLE) " whitespace-nowrap"} { (format_currency(transaction.price)) }
                            td class=(TABLE_CELL_STYLE) { (transaction.category.as_deref().unwrap_or_default()) }
                            td class=(TABLE_CELL_STYLE) { @if transaction.sold { "Yes" } @else { "No" } }
                        }
                    }

                    @if transactions.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="6" class={(TABLE_CELL_STYLE) " text-center"}
                            {
                                "No transactions found"
                            }
                        }
                    }
                }
            }
        }
    )
}

fn pagination_view(data: &DashboardData) -> Markup {
    let has_previous = data.page.number > 1;
    let has_next = data.page.number < data.page_count;

    html!(
        nav id="pagination" class="w-full flex justify-between items-center mb-6"
        {
            @if has_previous {
                (link(&page_url(data.month, data.category, data.page.number - 1), "Previous"))
            } @else {
                span class="text-gray-400" { "Previous" }
            }

            span { "Page " (data.page.number) " of " (data.page_count.max(1)) }

            @if has_next {
                (link(&page_url(data.month, data.category, data.page.number + 1), "Next"))
            } @else {
                span class="text-gray-400" { "Next" }
            }
        }
    )
}

fn summary_view(summary: &PageSummary) -> Markup {
    html!(
        section id="page-summary" class="w-full max-w-md bg-white dark:bg-gray-800 rounded-lg shadow p-4"
        {
            h3 class="text-xl font-semibold mb-4" { "This page" }

            dl class="grid grid-cols-2 gap-2"
            {
                dt { "Total sale" }
                dd id="total-sales" { (format_currency(summary.total_sales)) }
                dt { "Total sold items" }
                dd id="total-sold-items" { (summary.sold_count) }
                dt { "Total not sold items" }
                dd id="total-not-sold-items" { (summary.not_sold_count) }
            }
        }
    )
}

fn dashboard_view(data: &DashboardData) -> Markup {
    let content = html!(
        div class={(PAGE_CONTAINER_STYLE) " max-w-screen-xl"}
        {
            h1 class="text-2xl font-bold mb-6" { "Transaction Dashboard" }

            (filters_view(data.month, data.category))
            (transactions_table(&data.transactions))
            (pagination_view(data))

            div class="w-full grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                (chart_view(&data.chart))
                (summary_view(&data.summary))
            }
        }
    );

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned()),
        chart_script(&data.chart),
    ];

    base("Dashboard", &scripts, &content)
}
