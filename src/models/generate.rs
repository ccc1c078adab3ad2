use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceCitation {
    pub id: String,
    pub doc_name: String,
    pub line: u32,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub sources: Option<Vec<SourceCitation>>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::User,
            content: content.into(),
            sources: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(reply: AssistantReply) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::Assistant,
            content: reply.content,
            sources: Some(reply.sources),
            timestamp: Utc::now(),
        }
    }
}

/// Backend answer to a chat question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    pub content: String,
    pub sources: Vec<SourceCitation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TermRecommendation {
    pub id: String,
    pub term: String,
    pub definition: String,
    pub category: String,
    pub source: String,
    pub confidence: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum GenerateTab {
    #[default]
    Guide,
    Terms,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum GuideStatus {
    #[default]
    Idle,
    Analyzing,
    Generating,
    Complete,
}

impl GuideStatus {
    pub fn is_busy(&self) -> bool {
        matches!(self, GuideStatus::Analyzing | GuideStatus::Generating)
    }
}
