#![allow(missing_docs)]

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::db::initialize;

use super::{Transaction, insert_transactions};

/// An unsold, uncategorised transaction titled after its ID.
pub(crate) fn transaction(id: &str, price: f64, date_of_sale: OffsetDateTime) -> Transaction {
    Transaction {
        id: id.to_owned(),
        title: format!("Product {id}"),
        description: String::new(),
        price,
        date_of_sale,
        category: None,
        sold: false,
    }
}

/// An initialised in-memory database holding `transactions`.
pub(crate) fn connection_with(transactions: &[Transaction]) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    initialize(&conn).unwrap();
    insert_transactions(transactions, &conn).unwrap();
    conn
}
