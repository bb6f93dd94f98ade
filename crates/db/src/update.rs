//! Update operators applied to a single document.

use serde_json::Value;

use crate::error::{DbError, DbResult};
use crate::store::Document;

/// One field-level change
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Replace the field value
    Set { field: String, value: Value },
    /// Append to an array field, creating it when missing
    Push { field: String, value: Value },
    /// Insert at the front of an array field, creating it when missing
    PushFront { field: String, value: Value },
    /// Remove every array element equal to `value`
    Pull { field: String, value: Value },
    /// Remove every array element that is an object whose `key` equals `value`
    PullBy {
        field: String,
        key: String,
        value: Value,
    },
}

/// Ordered list of operators applied together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(UpdateOp::Set {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn push(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(UpdateOp::Push {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn push_front(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(UpdateOp::PushFront {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn pull(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(UpdateOp::Pull {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn pull_by(
        mut self,
        field: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.ops.push(UpdateOp::PullBy {
            field: field.into(),
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Fields touched by this update
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().map(|op| match op {
            UpdateOp::Set { field, .. }
            | UpdateOp::Push { field, .. }
            | UpdateOp::PushFront { field, .. }
            | UpdateOp::Pull { field, .. }
            | UpdateOp::PullBy { field, .. } => field.as_str(),
        })
    }

    /// Apply every operator in order. On error the document may be partially
    /// modified; callers apply updates to a copy.
    pub fn apply(&self, document: &mut Document) -> DbResult<()> {
        for op in &self.ops {
            match op {
                UpdateOp::Set { field, value } => {
                    document.insert(field.clone(), value.clone());
                }
                UpdateOp::Push { field, value } => {
                    array_mut(document, field)?.push(value.clone());
                }
                UpdateOp::PushFront { field, value } => {
                    array_mut(document, field)?.insert(0, value.clone());
                }
                UpdateOp::Pull { field, value } => {
                    array_mut(document, field)?.retain(|item| item != value);
                }
                UpdateOp::PullBy { field, key, value } => {
                    array_mut(document, field)?
                        .retain(|item| item.get(key.as_str()) != Some(value));
                }
            }
        }
        Ok(())
    }
}

fn array_mut<'a>(document: &'a mut Document, field: &str) -> DbResult<&'a mut Vec<Value>> {
    let slot = document
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    slot.as_array_mut().ok_or_else(|| DbError::InvalidUpdate {
        field: field.to_string(),
        reason: "field is not an array".to_string(),
    })
}
