//! Filter builder.
//!
//! Free-text search is OR-ed across an entity's searchable fields; field
//! filters are AND-ed together; the two groups are AND-ed. Only fields an
//! entity whitelists through [`FilterField`] are accepted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::predicate::Predicate;

/// How field filters compare against stored values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Case-insensitive substring match
    #[default]
    Pattern,
    /// Case-sensitive whole-value match
    Exact,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("unsupported filter field '{0}'")]
    UnknownField(String),
}

/// Whitelisted filter field of an entity.
///
/// Implementors are enums: `parse` is the mapping from query-string name to
/// variant, `build` the predicate builder for that variant.
pub trait FilterField: Sized + Copy {
    /// Stored fields the free-text search term is matched against
    const SEARCHABLE: &'static [&'static str];

    fn parse(name: &str) -> Option<Self>;

    /// Stored field name
    fn column(self) -> &'static str;

    fn build(self, value: &str, mode: FilterMode) -> Predicate {
        match mode {
            FilterMode::Pattern => Predicate::matches(self.column(), value),
            FilterMode::Exact => Predicate::exact(self.column(), value),
        }
    }
}

/// Search term plus field filters extracted from a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub search_term: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl Filters {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search_term: Some(term.into()),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

/// Builds store predicates from [`Filters`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterBuilder {
    mode: FilterMode,
}

impl FilterBuilder {
    pub fn new(mode: FilterMode) -> Self {
        Self { mode }
    }

    pub fn build<F: FilterField>(&self, filters: &Filters) -> Result<Predicate, FilterError> {
        let mut and_conditions = Vec::new();

        if let Some(term) = filters
            .search_term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
        {
            and_conditions.push(Predicate::Or(
                F::SEARCHABLE
                    .iter()
                    .map(|field| Predicate::matches(*field, term))
                    .collect(),
            ));
        }

        let mut field_conditions = Vec::new();
        for (name, value) in &filters.fields {
            let field = F::parse(name).ok_or_else(|| FilterError::UnknownField(name.clone()))?;
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            field_conditions.push(field.build(value, self.mode));
        }
        if !field_conditions.is_empty() {
            and_conditions.push(Predicate::And(field_conditions));
        }

        Ok(if and_conditions.is_empty() {
            Predicate::All
        } else {
            Predicate::And(and_conditions)
        })
    }
}
