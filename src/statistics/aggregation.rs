//! Aggregate queries over the transactions matching a filter.
//!
//! Provides the sales statistics, the price histogram and the category
//! breakdown shown on the dashboard, plus a report that combines all three
//! with the matching transactions.

use rusqlite::{Connection, params_from_iter};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    transaction::{Transaction, TransactionFilter, find_all_transactions},
};

/// The width of each finite price bucket.
const BUCKET_WIDTH: u32 = 100;

/// The number of finite buckets before the open-ended bucket.
const FINITE_BUCKET_COUNT: u32 = 9;

/// The label for prices that fall outside every bucket, e.g. negative prices.
pub const OTHER_BUCKET_LABEL: &str = "other";

/// Sales totals for a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// The sum of the prices of every matching transaction, sold or not.
    pub total_sale_amount: f64,
    /// The number of matching transactions that were sold.
    pub total_sold_items: u64,
    /// The number of matching transactions that were not sold.
    pub total_not_sold_items: u64,
}

/// The number of transactions with a price in a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBucket {
    /// The price range, e.g. "100-200" for prices from 100 up to but not including 200.
    pub range: String,
    /// The number of transactions in the range.
    pub count: u64,
}

/// The number of transactions in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// The category, `None` for transactions without one.
    pub category: Option<String>,
    /// The number of transactions in the category.
    pub count: u64,
}

/// The matching transactions together with all of their aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedReport {
    /// Every matching transaction, in dataset order.
    pub transactions: Vec<Transaction>,
    /// The sales totals.
    pub statistics: Statistics,
    /// The price histogram.
    pub bar_chart: Vec<PriceBucket>,
    /// The category breakdown.
    pub pie_chart: Vec<CategoryCount>,
}

/// Calculate the sales totals for the transactions matching `filter`.
///
/// An empty selection gives zero for every total.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_statistics(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Statistics, Error> {
    let (where_clause, params) = filter.to_sql();
    let query = format!(
        "SELECT
            COALESCE(SUM(price), 0.0),
            COALESCE(SUM(CASE WHEN sold THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN sold THEN 0 ELSE 1 END), 0)
        FROM \"transaction\" {where_clause}"
    );

    connection
        .query_row(&query, params_from_iter(params), |row| {
            Ok(Statistics {
                total_sale_amount: row.get(0)?,
                total_sold_items: row.get(1)?,
                total_not_sold_items: row.get(2)?,
            })
        })
        .map_err(Error::from)
}

/// Count the transactions matching `filter` in each price range.
///
/// Ranges are lower-inclusive: `0-100`, `100-200`, ..., `800-900`. The open
/// range starts at 900 and is labelled `901-above`. Every range is listed,
/// even when empty. Prices outside all ranges are counted under
/// [OTHER_BUCKET_LABEL], which is only listed when non-empty, so the counts
/// always add up to the number of matches.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_price_histogram(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<PriceBucket>, Error> {
    let (where_clause, params) = filter.to_sql();
    let open_bucket_start = BUCKET_WIDTH * FINITE_BUCKET_COUNT;
    let query = format!(
        "SELECT
            CASE
                WHEN price >= 0 AND price < {open_bucket_start} THEN CAST(price / {BUCKET_WIDTH} AS INTEGER)
                WHEN price >= {open_bucket_start} THEN {FINITE_BUCKET_COUNT}
                ELSE -1
            END AS bucket,
            COUNT(*)
        FROM \"transaction\" {where_clause}
        GROUP BY bucket"
    );

    let mut counts = vec![0u64; FINITE_BUCKET_COUNT as usize + 1];
    let mut other_count = 0;

    let mut statement = connection.prepare(&query)?;
    let rows = statement.query_map(params_from_iter(params), |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, u64>(1)?))
    })?;

    for row in rows {
        let (bucket, count) = row?;
        match usize::try_from(bucket).ok().and_then(|i| counts.get_mut(i)) {
            Some(slot) => *slot += count,
            None => other_count += count,
        }
    }

    let mut histogram: Vec<PriceBucket> = counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| PriceBucket {
            range: bucket_label(index as u32),
            count,
        })
        .collect();

    if other_count > 0 {
        histogram.push(PriceBucket {
            range: OTHER_BUCKET_LABEL.to_owned(),
            count: other_count,
        });
    }

    Ok(histogram)
}

fn bucket_label(index: u32) -> String {
    let start = index * BUCKET_WIDTH;

    if index >= FINITE_BUCKET_COUNT {
        format!("{}-above", start + 1)
    } else {
        format!("{start}-{}", start + BUCKET_WIDTH)
    }
}

/// Count the transactions matching `filter` in each category.
///
/// Categories are compared exactly and listed in sort order, with
/// uncategorised transactions first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_category_counts(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<CategoryCount>, Error> {
    let (where_clause, params) = filter.to_sql();
    let query = format!(
        "SELECT category, COUNT(*) FROM \"transaction\" {where_clause} \
        GROUP BY category ORDER BY category"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), |row| {
            Ok(CategoryCount {
                category: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()
        .map_err(Error::from)
}

/// Get the matching transactions and all of their aggregates in one go.
///
/// # Errors
/// Returns [Error::SqlError] if any of the queries fail.
pub fn get_combined_report(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<CombinedReport, Error> {
    Ok(CombinedReport {
        transactions: find_all_transactions(filter, connection)?,
        statistics: get_statistics(filter, connection)?,
        bar_chart: get_price_histogram(filter, connection)?,
        pie_chart: get_category_counts(filter, connection)?,
    })
}

#[cfg(test)]
mod tests {
    use time::{Month, macros::datetime};

    use crate::transaction::{
        Transaction, TransactionFilter, count_transactions,
        test_utils::{connection_with, transaction},
    };

    use super::{
        CategoryCount, OTHER_BUCKET_LABEL, Statistics, bucket_label, get_category_counts,
        get_combined_report, get_price_histogram, get_statistics,
    };

    fn march_example() -> Vec<Transaction> {
        vec![
            Transaction {
                sold: true,
                category: Some("A".to_owned()),
                ..transaction("1", 150.0, datetime!(2022-03-05 00:00:00 UTC))
            },
            Transaction {
                category: Some("B".to_owned()),
                ..transaction("2", 50.0, datetime!(2022-03-10 00:00:00 UTC))
            },
        ]
    }

    fn mixed_dataset() -> Vec<Transaction> {
        let march = datetime!(2021-03-01 00:00:00 UTC);
        let july = datetime!(2022-07-20 00:00:00 UTC);

        vec![
            Transaction {
                sold: true,
                category: Some("electronics".to_owned()),
                ..transaction("1", 0.0, march)
            },
            Transaction {
                category: Some("electronics".to_owned()),
                ..transaction("2", 99.99, march)
            },
            Transaction {
                sold: true,
                ..transaction("3", 100.0, march)
            },
            Transaction {
                category: Some("jewelery".to_owned()),
                ..transaction("4", 899.5, march)
            },
            Transaction {
                sold: true,
                category: Some("jewelery".to_owned()),
                ..transaction("5", 900.0, march)
            },
            Transaction {
                category: Some("Jewelery".to_owned()),
                ..transaction("6", 12000.0, march)
            },
            Transaction {
                category: Some("electronics".to_owned()),
                ..transaction("7", 250.0, july)
            },
        ]
    }

    fn march() -> TransactionFilter {
        TransactionFilter::for_month(Some(Month::March))
    }

    fn counts(histogram: &[super::PriceBucket]) -> Vec<u64> {
        histogram.iter().map(|bucket| bucket.count).collect()
    }

    #[test]
    fn statistics_for_example_month() {
        let conn = connection_with(&march_example());

        let got = get_statistics(&march(), &conn).unwrap();

        assert_eq!(
            got,
            Statistics {
                total_sale_amount: 200.0,
                total_sold_items: 1,
                total_not_sold_items: 1,
            }
        );
    }

    #[test]
    fn statistics_sum_price_regardless_of_sold() {
        let conn = connection_with(&mixed_dataset());

        let got = get_statistics(&march(), &conn).unwrap();

        let want_amount = 0.0 + 99.99 + 100.0 + 899.5 + 900.0 + 12000.0;
        assert!((got.total_sale_amount - want_amount).abs() < 1e-6);
        assert_eq!(got.total_sold_items, 3);
        assert_eq!(got.total_not_sold_items, 3);
    }

    #[test]
    fn statistics_for_empty_month_are_zero() {
        let conn = connection_with(&march_example());

        let got = get_statistics(&TransactionFilter::for_month(Some(Month::June)), &conn).unwrap();

        assert_eq!(
            got,
            Statistics {
                total_sale_amount: 0.0,
                total_sold_items: 0,
                total_not_sold_items: 0,
            }
        );
    }

    #[test]
    fn sold_and_not_sold_add_up_to_month_count() {
        let conn = connection_with(&mixed_dataset());

        let statistics = get_statistics(&march(), &conn).unwrap();
        let count = count_transactions(&march(), &conn).unwrap();

        assert_eq!(
            statistics.total_sold_items + statistics.total_not_sold_items,
            count
        );
    }

    #[test]
    fn histogram_for_example_month() {
        let conn = connection_with(&march_example());

        let got = get_price_histogram(&march(), &conn).unwrap();

        assert_eq!(got.len(), 10);
        assert_eq!(got[0].range, "0-100");
        assert_eq!(got[1].range, "100-200");
        assert_eq!(counts(&got), [1, 1, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn histogram_boundaries_belong_to_upper_bucket() {
        let conn = connection_with(&mixed_dataset());

        let got = get_price_histogram(&march(), &conn).unwrap();

        // 0 and 99.99 -> 0-100, 100 -> 100-200, 899.5 -> 800-900, 900 and 12000 -> 901-above
        assert_eq!(counts(&got), [2, 1, 0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(got[9].range, "901-above");
    }

    #[test]
    fn histogram_is_a_partition_of_the_month() {
        let conn = connection_with(&mixed_dataset());

        let histogram = get_price_histogram(&march(), &conn).unwrap();
        let count = count_transactions(&march(), &conn).unwrap();

        assert_eq!(histogram.iter().map(|bucket| bucket.count).sum::<u64>(), count);
    }

    #[test]
    fn histogram_counts_negative_prices_as_other() {
        let conn = connection_with(&[transaction(
            "1",
            -5.0,
            datetime!(2022-03-01 00:00:00 UTC),
        )]);

        let got = get_price_histogram(&march(), &conn).unwrap();

        assert_eq!(got.len(), 11);
        assert_eq!(got[10].range, OTHER_BUCKET_LABEL);
        assert_eq!(got[10].count, 1);
    }

    #[test]
    fn bucket_labels() {
        assert_eq!(bucket_label(0), "0-100");
        assert_eq!(bucket_label(8), "800-900");
        assert_eq!(bucket_label(9), "901-above");
    }

    #[test]
    fn category_counts_for_example_month() {
        let conn = connection_with(&march_example());

        let got = get_category_counts(&march(), &conn).unwrap();

        assert_eq!(
            got,
            [
                CategoryCount {
                    category: Some("A".to_owned()),
                    count: 1
                },
                CategoryCount {
                    category: Some("B".to_owned()),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn category_counts_group_missing_categories() {
        let conn = connection_with(&mixed_dataset());

        let got = get_category_counts(&march(), &conn).unwrap();

        assert_eq!(
            got,
            [
                CategoryCount {
                    category: None,
                    count: 1
                },
                CategoryCount {
                    category: Some("Jewelery".to_owned()),
                    count: 1
                },
                CategoryCount {
                    category: Some("electronics".to_owned()),
                    count: 2
                },
                CategoryCount {
                    category: Some("jewelery".to_owned()),
                    count: 2
                },
            ]
        );
        assert_eq!(
            got.iter().map(|c| c.count).sum::<u64>(),
            count_transactions(&march(), &conn).unwrap()
        );
    }

    #[test]
    fn combined_report_matches_individual_queries() {
        let conn = connection_with(&mixed_dataset());

        let report = get_combined_report(&march(), &conn).unwrap();

        assert_eq!(report.transactions.len(), 6);
        assert_eq!(report.statistics, get_statistics(&march(), &conn).unwrap());
        assert_eq!(report.bar_chart, get_price_histogram(&march(), &conn).unwrap());
        assert_eq!(report.pie_chart, get_category_counts(&march(), &conn).unwrap());
    }

    #[test]
    fn no_month_aggregates_everything() {
        let conn = connection_with(&mixed_dataset());

        let statistics = get_statistics(&TransactionFilter::all(), &conn).unwrap();

        assert_eq!(statistics.total_sold_items + statistics.total_not_sold_items, 7);
    }
}
