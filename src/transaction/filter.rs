//! Builds store-level filters from the optional listing query parameters.

use rusqlite::types::Value;
use time::Month;

use crate::month::optional_month;

/// Renders the price as text, without a fractional part for whole numbers.
const PRICE_TEXT_SQL: &str = "CASE WHEN price = CAST(price AS INTEGER) \
    THEN CAST(CAST(price AS INTEGER) AS TEXT) \
    ELSE CAST(price AS TEXT) END";

/// A single condition that a transaction must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// The title or description contains the text, ignoring case, or the
    /// price written out as text contains it, e.g. "15" matches a price of 150.
    Search(String),
    /// The transaction was sold in this calendar month of any year.
    Month(Month),
    /// The category contains the text, ignoring case.
    Category(String),
}

impl Criterion {
    fn push_sql(&self, clauses: &mut Vec<String>, params: &mut Vec<Value>) {
        match self {
            Criterion::Search(text) => {
                clauses.push(format!(
                    "(instr(lower(title), lower(?)) > 0 \
                    OR instr(lower(description), lower(?)) > 0 \
                    OR instr({PRICE_TEXT_SQL}, ?) > 0)"
                ));
                params.extend(std::iter::repeat_n(Value::Text(text.clone()), 3));
            }
            Criterion::Month(month) => {
                clauses.push("sale_month = ?".to_owned());
                params.push(Value::Integer(u8::from(*month).into()));
            }
            Criterion::Category(text) => {
                clauses.push("instr(lower(category), lower(?)) > 0".to_owned());
                params.push(Value::Text(text.clone()));
            }
        }
    }
}

/// A conjunction of [Criterion]s. An empty filter matches every transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    criteria: Vec<Criterion>,
}

impl TransactionFilter {
    /// A filter that matches every transaction.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from the listing query parameters.
    ///
    /// Blank values impose no constraint. An unrecognised month name is
    /// ignored rather than rejected.
    pub fn from_params(search: Option<&str>, month: Option<&str>, category: Option<&str>) -> Self {
        let non_blank = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };

        let mut filter = Self::all();

        if let Some(search) = non_blank(search) {
            filter = filter.and(Criterion::Search(search));
        }

        if let Some(month) = optional_month(month) {
            filter = filter.and(Criterion::Month(month));
        }

        if let Some(category) = non_blank(category) {
            filter = filter.and(Criterion::Category(category));
        }

        filter
    }

    /// A filter that only matches transactions sold in `month`, if given.
    pub fn for_month(month: Option<Month>) -> Self {
        match month {
            Some(month) => Self::all().and(Criterion::Month(month)),
            None => Self::all(),
        }
    }

    /// Add `criterion` to the conditions a transaction must satisfy.
    pub fn and(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    /// The conditions of this filter.
    #[cfg(test)]
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// Translate the filter into an SQL `WHERE` clause and its bound parameters.
    ///
    /// The clause is empty when the filter matches everything, otherwise it
    /// includes the leading `WHERE`. User text is only ever passed as a parameter.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::with_capacity(self.criteria.len());
        let mut params = Vec::new();

        for criterion in &self.criteria {
            criterion.push_sql(&mut clauses, &mut params);
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), params)
        }
    }
}
