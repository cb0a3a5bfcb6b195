//! Summaries of the transactions shown on one page of the dashboard.
//!
//! These are computed from the displayed page only, not from the whole month,
//! so they can differ from the `/statistics` and `/barchart` routes.

use crate::transaction::Transaction;

/// Totals for the transactions on the current page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct PageSummary {
    /// The sum of the prices of the sold transactions.
    pub total_sales: f64,
    pub sold_count: usize,
    pub not_sold_count: usize,
}

impl PageSummary {
    pub(super) fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions
            .iter()
            .fold(Self::default(), |mut summary, transaction| {
                if transaction.sold {
                    summary.total_sales += transaction.price;
                    summary.sold_count += 1;
                } else {
                    summary.not_sold_count += 1;
                }

                summary
            })
    }
}

/// A price range on the page's bar chart. Each range includes its upper bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PriceRange {
    pub label: &'static str,
    /// The largest price in the range, `None` for the open-ended last range.
    pub upper_bound: Option<f64>,
}

/// The ranges are checked in order, so anything up to 100, including
/// negative prices, lands in the first range.
pub(super) const PRICE_RANGES: [PriceRange; 5] = [
    PriceRange {
        label: "0-100",
        upper_bound: Some(100.0),
    },
    PriceRange {
        label: "100-500",
        upper_bound: Some(500.0),
    },
    PriceRange {
        label: "500-1000",
        upper_bound: Some(1000.0),
    },
    PriceRange {
        label: "1000-5000",
        upper_bound: Some(5000.0),
    },
    PriceRange {
        label: "5000+",
        upper_bound: None,
    },
];

/// Count the transactions in each of [PRICE_RANGES], in the same order.
pub(super) fn count_price_ranges(transactions: &[Transaction]) -> [usize; PRICE_RANGES.len()] {
    let mut counts = [0; PRICE_RANGES.len()];

    for transaction in transactions {
        let index = PRICE_RANGES
            .iter()
            .position(|range| {
                range
                    .upper_bound
                    .is_none_or(|upper_bound| transaction.price <= upper_bound)
            })
            .unwrap_or(PRICE_RANGES.len() - 1);

        counts[index] += 1;
    }

    counts
}
