use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::TermSource;

/// A standard term saved from a confirmed unify run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredTerm {
    pub workspace_id: String,
    pub term: String,
    pub variants: Vec<String>,
    pub source: TermSource,
    pub confidence: u8,
    pub occurrence_count: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedDocument {
    pub id: String,
    pub workspace_id: String,
    pub file_name: String,
    pub change_count: u64,
    pub created_at: DateTime<Utc>,
}
