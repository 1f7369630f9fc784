//! Filter operations for PostgrestClient

/// Operator for filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to
    Eq,

    /// Like (case insensitive)
    ILike,
}

impl FilterOperator {
    /// Convert the operator to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::ILike => "ilike",
        }
    }

    /// Render `op.value` as PostgREST expects it in the query string
    pub fn render(&self, value: &str) -> String {
        format!("{}.{}", self.as_str(), value)
    }
}

/// Escape the LIKE wildcards in `value` so an `ilike` filter matches it
/// literally. Emails routinely contain `_`.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Ordered list of query parameters for one request
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    params: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing an earlier one with the same key
    pub fn set(&mut self, key: &str, value: &str) {
        self.params.retain(|(k, _)| k != key);
        self.params.push((key.to_string(), value.to_string()));
    }

    /// Add a column filter
    pub fn filter(&mut self, column: &str, operator: FilterOperator, value: &str) {
        self.params
            .push((column.to_string(), operator.render(value)));
    }

    /// True when at least one column filter is present
    pub fn has_filters(&self) -> bool {
        self.params
            .iter()
            .any(|(k, _)| !matches!(k.as_str(), "select" | "order" | "limit" | "offset"))
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("john_doe@example.com"), "john\\_doe@example.com");
        assert_eq!(escape_like("100%@x.io"), "100\\%@x.io");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain@example.com"), "plain@example.com");
    }

    #[test]
    fn set_replaces_and_filter_appends() {
        let mut params = QueryParams::new();
        params.set("select", "*");
        params.set("select", "id");
        params.filter("user_id", FilterOperator::Eq, "42");
        params.filter("email", FilterOperator::ILike, "a@b.c");
        assert_eq!(
            params.as_slice(),
            &[
                ("select".to_string(), "id".to_string()),
                ("user_id".to_string(), "eq.42".to_string()),
                ("email".to_string(), "ilike.a@b.c".to_string()),
            ]
        );
        assert!(params.has_filters());
    }

    #[test]
    fn modifiers_are_not_filters() {
        let mut params = QueryParams::new();
        params.set("select", "*");
        params.set("order", "name.asc");
        assert!(!params.has_filters());
    }
}
