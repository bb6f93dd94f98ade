//! List queries: pagination, filtering, and the paginated result shape.

pub mod filter;
pub mod pagination;

use serde::Serialize;

pub use filter::{FilterBuilder, FilterError, FilterField, FilterMode, Filters};
pub use pagination::{
    calculate_pagination, Pagination, PaginationDefaults, PaginationOptions, SortOrder,
};

/// Query-string key carrying the free-text search term
pub const SEARCH_TERM_KEY: &str = "searchTerm";

/// Split raw query-string pairs into pagination options and filters.
///
/// Pagination keys and `searchTerm` are picked out; every other key is a
/// field filter, checked against the entity whitelist later by
/// [`FilterBuilder`].
pub fn split_query<I>(params: I) -> (PaginationOptions, Filters)
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut options = PaginationOptions::default();
    let mut filters = Filters::default();

    for (key, value) in params {
        match key.as_str() {
            "page" => options.page = Some(value),
            "limit" => options.limit = Some(value),
            "sortBy" => options.sort_by = Some(value),
            "sortOrder" => options.sort_order = Some(value),
            SEARCH_TERM_KEY => filters.search_term = Some(value),
            _ => filters.fields.push((key, value)),
        }
    }

    (options, filters)
}

/// `meta` block of a paginated response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

/// One page of results plus the total matching count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub meta: PageMeta,
    pub data: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(pagination: &Pagination, total: u64, data: Vec<T>) -> Self {
        Self {
            meta: PageMeta {
                page: pagination.page,
                limit: pagination.limit,
                total,
            },
            data,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            meta: self.meta,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}
