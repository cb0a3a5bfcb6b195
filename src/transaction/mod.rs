//! Transaction records and the queries over them.
//!
//! This module contains:
//! - The `Transaction` model and the store functions for loading the dataset
//! - The filter builder that turns listing parameters into SQL
//! - The route handler for listing transactions

mod core;
mod filter;
mod list_endpoint;
mod query;

#[cfg(test)]
pub(crate) mod test_utils;

pub use core::{Transaction, create_transaction_table, insert_transactions, replace_all_transactions};
pub use filter::TransactionFilter;
pub use list_endpoint::list_transactions_endpoint;
pub use query::{count_transactions, find_all_transactions, find_transactions};
