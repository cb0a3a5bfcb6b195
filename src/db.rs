//! Database initialisation.

use rusqlite::Connection;

use crate::{Error, transaction::create_transaction_table};

/// Create all of the database tables for the application.
///
/// Safe to call on a database that has already been initialised.
///
/// # Errors
/// This function will return an error if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    create_transaction_table(connection)?;

    Ok(())
}
