//! Parsing of calendar month names from query parameters.
//!
//! Every date filter in the app is month-only: a month name selects that
//! calendar month in any year.

use time::Month;

use crate::Error;

/// Every month in calendar order.
pub const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Get the month with the English name `name`, ignoring case and surrounding whitespace.
///
/// Returns `None` if `name` is not the full name of a month.
pub fn parse_month(name: &str) -> Option<Month> {
    let name = name.trim();

    MONTHS
        .into_iter()
        .find(|month| month.to_string().eq_ignore_ascii_case(name))
}

/// Get the month for a query parameter that must be present.
///
/// # Errors
/// Returns [Error::MonthRequired] if `name` is missing or blank, or
/// [Error::InvalidMonth] if it is not the name of a month.
pub fn require_month(name: Option<&str>) -> Result<Month, Error> {
    let name = name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(Error::MonthRequired)?;

    parse_month(name).ok_or_else(|| Error::InvalidMonth(name.to_owned()))
}

/// Get the month for an optional query parameter.
///
/// Missing, blank and unrecognised names all mean "no month filter".
pub fn optional_month(name: Option<&str>) -> Option<Month> {
    let name = name.map(str::trim).filter(|name| !name.is_empty())?;

    let month = parse_month(name);
    if month.is_none() {
        tracing::debug!("Ignoring unrecognised month \"{name}\"");
    }

    month
}

#[cfg(test)]
mod tests {
    use time::Month;

    use crate::Error;

    use super::{optional_month, parse_month, require_month};

    #[test]
    fn parses_every_month_name() {
        assert_eq!(parse_month("January"), Some(Month::January));
        assert_eq!(parse_month("June"), Some(Month::June));
        assert_eq!(parse_month("December"), Some(Month::December));
    }

    #[test]
    fn parse_ignores_case_and_whitespace() {
        assert_eq!(parse_month("march"), Some(Month::March));
        assert_eq!(parse_month(" MARCH "), Some(Month::March));
    }

    #[test]
    fn rejects_abbreviations_and_numbers() {
        assert_eq!(parse_month("Mar"), None);
        assert_eq!(parse_month("3"), None);
        assert_eq!(parse_month(""), None);
    }

    #[test]
    fn required_month_distinguishes_missing_from_invalid() {
        assert!(matches!(require_month(None), Err(Error::MonthRequired)));
        assert!(matches!(require_month(Some("  ")), Err(Error::MonthRequired)));
        assert!(matches!(
            require_month(Some("Smarch")),
            Err(Error::InvalidMonth(name)) if name == "Smarch"
        ));
        assert!(matches!(require_month(Some("April")), Ok(Month::April)));
    }

    #[test]
    fn optional_month_ignores_unrecognised_names() {
        assert_eq!(optional_month(None), None);
        assert_eq!(optional_month(Some("")), None);
        assert_eq!(optional_month(Some("Smarch")), None);
        assert_eq!(optional_month(Some("May")), Some(Month::May));
    }
}
