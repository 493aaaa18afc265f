//! Constructive query builder (spec.md §4.5): assembles a canonical NRQL-
//! like query from structured parameters, escaping string literals and
//! validating numeric/boolean/timestamp literals by type. Never emits a
//! construction the validator would reject (spec.md §8 property 10).

use crate::validator::{self, ValidatedQuery, ValidationFailure};

/// A literal value in a filter predicate, rendered with the query
/// language's own escape rules (spec.md §4.5: "string literals have the
/// language's escape rules applied; numeric/boolean/timestamp literals are
/// validated for type").
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    /// RFC3339 timestamp, stored pre-validated.
    Timestamp(String),
}

impl Literal {
    fn render(&self) -> Result<String, ValidationFailure> {
        match self {
            Literal::String(s) => Ok(format!("'{}'", escape_string(s))),
            Literal::Number(n) => {
                if !n.is_finite() {
                    return Err(ValidationFailure {
                        message: "numeric literal must be finite".into(),
                        offset: 0,
                        token: n.to_string(),
                    });
                }
                Ok(n.to_string())
            }
            Literal::Bool(b) => Ok(b.to_string()),
            Literal::Timestamp(ts) => {
                if chrono::DateTime::parse_from_rfc3339(ts).is_err() {
                    return Err(ValidationFailure {
                        message: format!("timestamp literal \"{ts}\" is not valid RFC3339"),
                        offset: 0,
                        token: ts.clone(),
                    });
                }
                Ok(format!("'{ts}'"))
            }
        }
    }
}

/// Escapes single quotes and backslashes the way the domain query language
/// expects string literals to be written.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
}

impl FilterOperator {
    fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::NotEq => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::Like => "LIKE",
            FilterOperator::In => "IN",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub attribute: String,
    pub operator: FilterOperator,
    pub value: Literal,
}

/// An aggregation function applied to an attribute (or `*` for `count(*)`).
#[derive(Debug, Clone)]
pub struct Selector {
    pub function: String,
    pub attribute: Option<String>,
    pub alias: Option<String>,
}

impl Selector {
    fn render(&self) -> String {
        let inner = self.attribute.as_deref().unwrap_or("*");
        match &self.alias {
            Some(alias) => format!("{}({}) AS '{}'", self.function, inner, escape_string(alias)),
            None => format!("{}({})", self.function, inner),
        }
    }
}

/// Builds a query from structured parameters: selectors, source schema,
/// filters, grouping, window, ordering, and limit.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    selectors: Vec<Selector>,
    source: Option<String>,
    filters: Vec<Filter>,
    group_by: Vec<String>,
    since: Option<String>,
    until: Option<String>,
    order_by: Option<(String, bool)>,
    limit: Option<u32>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, selector: Selector) -> Self {
        self.selectors.push(selector);
        self
    }

    pub fn from_schema(mut self, schema: impl Into<String>) -> Self {
        self.source = Some(schema.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn group_by(mut self, attribute: impl Into<String>) -> Self {
        self.group_by.push(attribute.into());
        self
    }

    pub fn since(mut self, window: impl Into<String>) -> Self {
        self.since = Some(window.into());
        self
    }

    pub fn until(mut self, window: impl Into<String>) -> Self {
        self.until = Some(window.into());
        self
    }

    pub fn order_by(mut self, attribute: impl Into<String>, descending: bool) -> Self {
        self.order_by = Some((attribute.into(), descending));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Renders the structured parameters into a query string, then runs it
    /// back through [`crate::validator::validate`] so the builder can never
    /// hand a caller something the validator would reject.
    pub fn build(
        self,
        mutations_allowed: bool,
        max_window_days: i64,
        allow_unbounded_window: bool,
    ) -> Result<ValidatedQuery, ValidationFailure> {
        let source = self.source.clone().ok_or_else(|| ValidationFailure {
            message: "builder requires a source schema (FROM clause)".into(),
            offset: 0,
            token: String::new(),
        })?;

        let mut parts = vec!["SELECT".to_string()];
        if self.selectors.is_empty() {
            parts.push("*".to_string());
        } else {
            let rendered: Vec<String> = self.selectors.iter().map(Selector::render).collect();
            parts.push(rendered.join(", "));
        }

        parts.push("FROM".to_string());
        parts.push(source);

        if !self.filters.is_empty() {
            parts.push("WHERE".to_string());
            let mut clauses = Vec::with_capacity(self.filters.len());
            for filter in &self.filters {
                let rendered_value = filter.value.render()?;
                clauses.push(format!("{} {} {}", filter.attribute, filter.operator.as_str(), rendered_value));
            }
            parts.push(clauses.join(" AND "));
        }

        if let Some(since) = &self.since {
            parts.push("SINCE".to_string());
            parts.push(since.clone());
        }
        if let Some(until) = &self.until {
            parts.push("UNTIL".to_string());
            parts.push(until.clone());
        }
        if !self.group_by.is_empty() {
            parts.push("FACET".to_string());
            parts.push(self.group_by.join(", "));
        }
        if let Some((attribute, descending)) = &self.order_by {
            parts.push("ORDER BY".to_string());
            parts.push(attribute.clone());
            if *descending {
                parts.push("DESC".to_string());
            }
        }
        if let Some(limit) = self.limit {
            parts.push("LIMIT".to_string());
            parts.push(limit.to_string());
        }

        let rendered = parts.join(" ");
        validator::validate(&rendered, mutations_allowed, max_window_days, allow_unbounded_window)
    }
}
