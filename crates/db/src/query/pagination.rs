//! Pagination calculator.
//!
//! Turns the raw `page`/`limit`/`sortBy`/`sortOrder` strings of a query string
//! into normalized skip/limit/sort directives. Bad input never errors: it
//! falls back to the defaults.

use serde::{Deserialize, Serialize};

use crate::store::FindOptions;

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Lenient parse: `asc`/`ascending`/`1` and `desc`/`descending`/`-1`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Some(Self::Asc),
            "desc" | "descending" | "-1" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Raw pagination parameters exactly as they arrived
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOptions {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Configured limits for the calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationDefaults {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// Normalized pagination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl Pagination {
    /// Find options for the store. Sorting only applies when both the field
    /// and the direction were supplied.
    pub fn find_options(&self) -> FindOptions {
        let sort = match (&self.sort_by, self.sort_order) {
            (Some(field), Some(order)) => Some((field.clone(), order)),
            _ => None,
        };
        FindOptions {
            sort,
            skip: self.skip,
            limit: Some(self.limit),
        }
    }
}

/// Parse a positive integer, accepting integral decimals like `"2.0"`
fn positive(raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    if let Ok(value) = raw.parse::<u64>() {
        return (value >= 1).then_some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    (value.is_finite() && value >= 1.0).then(|| value.trunc() as u64)
}

/// Compute page, limit, skip and sort from raw options
pub fn calculate_pagination(
    options: &PaginationOptions,
    defaults: PaginationDefaults,
) -> Pagination {
    let max_limit = defaults.max_limit.max(1);
    let page = positive(options.page.as_deref()).unwrap_or(1);
    let limit = positive(options.limit.as_deref())
        .unwrap_or(defaults.default_limit)
        .clamp(1, max_limit);
    let skip = page.saturating_sub(1).saturating_mul(limit);

    let sort_by = options
        .sort_by
        .as_deref()
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_string);
    let sort_order = options.sort_order.as_deref().and_then(SortOrder::parse);

    Pagination {
        page,
        limit,
        skip,
        sort_by,
        sort_order,
    }
}
