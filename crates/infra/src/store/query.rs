//! Query model shared by the store adapters: filters, sort and pagination.

use serde_json::Value;

/// Which documents a query selects.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    #[default]
    All,
    /// Every listed top-level field equals the given JSON value.
    Eq(Vec<(&'static str, Value)>),
    /// At least one listed field is a string containing `needle`,
    /// ignoring case. The needle is literal text, not a pattern.
    Contains {
        fields: &'static [&'static str],
        needle: String,
    },
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Filter::Eq(vec![(field, value.into())])
    }

    /// Evaluate against a serialized document.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(pairs) => pairs.iter().all(|(field, expected)| doc.get(*field) == Some(expected)),
            Filter::Contains { fields, needle } => {
                let needle = needle.to_lowercase();
                fields.iter().any(|field| {
                    doc.get(*field)
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Exactly `"asc"` is ascending; any other value is descending.
    pub fn parse(raw: &str) -> Self {
        if raw == "asc" { SortOrder::Asc } else { SortOrder::Desc }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub order: SortOrder,
}

/// 1-based page request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl Page {
    /// `None` unless both values are at least 1.
    pub fn new(page: u64, limit: u64) -> Option<Self> {
        (page >= 1 && limit >= 1).then_some(Self { page, limit })
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

/// Full `find` request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindOptions {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn filter(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn sorted(mut self, sort: Option<Sort>) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.skip = page.skip();
        self.limit = Some(page.limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_math() {
        let page = Page::new(2, 5).unwrap();
        assert_eq!(page.skip(), 5);
        assert_eq!(page.total_pages(12), 3);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(Page::default().total_pages(10), 1);
    }

    #[test]
    fn page_rejects_zero() {
        assert!(Page::new(0, 5).is_none());
        assert!(Page::new(1, 0).is_none());
    }

    #[test]
    fn contains_is_case_insensitive_and_literal() {
        let doc = json!({ "firstName": "Jane", "email": "jane@acme.com" });
        let f = |n: &str| Filter::Contains {
            fields: &["firstName", "email"],
            needle: n.to_string(),
        };
        assert!(f("JAN").matches(&doc));
        assert!(f("acme.").matches(&doc));
        assert!(!f("j.ne").matches(&doc));
        assert!(!f("bob").matches(&doc));
    }

    #[test]
    fn eq_requires_every_pair() {
        let doc = json!({ "name": "Leek", "price": 3.0 });
        assert!(Filter::Eq(vec![("name", json!("Leek")), ("price", json!(3.0))]).matches(&doc));
        assert!(!Filter::Eq(vec![("name", json!("Leek")), ("price", json!(4.0))]).matches(&doc));
    }

    #[test]
    fn sort_order_parse() {
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("ASC"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Desc);
    }
}
