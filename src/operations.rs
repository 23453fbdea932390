use std::borrow::Cow;

/// Capabilities advertised to callers that would otherwise wrap work in transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseFeatures {
    pub supports_transactions: bool,
}

impl Default for DatabaseFeatures {
    fn default() -> Self {
        Self {
            supports_transactions: false,
        }
    }
}

/// Lookup name to N1QL operator fragment, `%s` marking the operand.
const OPERATORS: [(&str, &str); 12] = [
    ("exact", "= %s"),
    ("iexact", "LIKE %s"),
    ("contains", "LIKE %s"),
    ("icontains", "LIKE %s"),
    ("gt", "> %s"),
    ("gte", ">= %s"),
    ("lt", "< %s"),
    ("lte", "<= %s"),
    ("startswith", "LIKE %s"),
    ("endswith", "LIKE %s"),
    ("istartswith", "LIKE %s"),
    ("iendswith", "LIKE %s"),
];

/// Dialect formatting used when composing N1QL statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseOperations;

impl DatabaseOperations {
    /// Wrap `name` in backticks unless it already starts and ends with one.
    ///
    /// Only the two ends are inspected, so a name like `` `a`b` `` is returned
    /// unchanged even though it is not one identifier.
    #[must_use]
    pub fn quote_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if name.starts_with('`') && name.ends_with('`') {
            return Cow::Borrowed(name); // quoting once is enough
        }
        Cow::Owned(format!("`{name}`"))
    }

    /// Operator fragment for a field lookup such as `"gte"`.
    #[must_use]
    pub fn operator(&self, lookup: &str) -> Option<&'static str> {
        OPERATORS
            .iter()
            .find(|(name, _)| *name == lookup)
            .map(|(_, op)| *op)
    }
}
