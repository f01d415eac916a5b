//! Selection predicates for scroll and delete-by-query.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Query {
    MatchAll,
    Term { field: String, value: Value },
    Terms { field: String, values: Vec<Value> },
    Exists { field: String },
    And(Vec<Query>),
}

impl Query {
    pub fn term(field: &str, value: impl Into<Value>) -> Self {
        Self::Term {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn exists(field: &str) -> Self {
        Self::Exists {
            field: field.to_string(),
        }
    }

    /// Documents written by the block with this timestamp on this shard.
    pub fn written_by_block(timestamp: u64, shard_id: u32) -> Self {
        Self::And(vec![
            Self::term("timestamp", timestamp),
            Self::term("shardID", shard_id),
        ])
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Term { field, value } => lookup(doc, field).is_some_and(|v| v == value),
            Self::Terms { field, values } => {
                lookup(doc, field).is_some_and(|v| values.contains(v))
            }
            Self::Exists { field } => lookup(doc, field).is_some_and(|v| !v.is_null()),
            Self::And(queries) => queries.iter().all(|q| q.matches(doc)),
        }
    }
}

/// Resolves a dotted field path.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, key| current.get(key))
}
