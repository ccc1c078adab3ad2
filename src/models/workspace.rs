use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An isolated project scope with its own terminology set and documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub term_count: u64,
    pub document_count: u64,
    pub last_updated: DateTime<Utc>,
    pub learning_rate: Option<u8>,
}

impl Workspace {
    /// Learning rates above this earn the workspace a highlight badge.
    pub const FEATURED_LEARNING_RATE: u8 = 80;

    pub fn is_featured(&self) -> bool {
        self.learning_rate
            .map(|rate| rate > Self::FEATURED_LEARNING_RATE)
            .unwrap_or(false)
    }

    /// Human-friendly "last activity" text relative to `now`.
    pub fn last_updated_label(&self, now: DateTime<Utc>) -> String {
        let days = (now - self.last_updated).num_days();
        match days {
            d if d <= 0 => "today".to_string(),
            1 => "yesterday".to_string(),
            d if d < 7 => format!("{d} days ago"),
            _ => self.last_updated.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Form input for creating a workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkspace {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update merged into an existing workspace; `None` leaves a field alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub term_count: Option<u64>,
    pub document_count: Option<u64>,
    pub last_updated: Option<DateTime<Utc>>,
    pub learning_rate: Option<u8>,
}

impl WorkspacePatch {
    pub fn apply_to(&self, workspace: &mut Workspace) {
        if let Some(name) = &self.name {
            workspace.name = name.clone();
        }
        if let Some(description) = &self.description {
            workspace.description = Some(description.clone());
        }
        if let Some(term_count) = self.term_count {
            workspace.term_count = term_count;
        }
        if let Some(document_count) = self.document_count {
            workspace.document_count = document_count;
        }
        if let Some(last_updated) = self.last_updated {
            workspace.last_updated = last_updated;
        }
        if let Some(rate) = self.learning_rate {
            workspace.learning_rate = Some(rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample(last_updated: DateTime<Utc>) -> Workspace {
        Workspace {
            id: "w1".into(),
            name: "Camera Manual".into(),
            description: None,
            term_count: 0,
            document_count: 0,
            last_updated,
            learning_rate: None,
        }
    }

    #[test]
    fn relative_labels() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
        assert_eq!(sample(now).last_updated_label(now), "today");
        assert_eq!(
            sample(now - Duration::days(1)).last_updated_label(now),
            "yesterday"
        );
        assert_eq!(
            sample(now - Duration::days(3)).last_updated_label(now),
            "3 days ago"
        );
        assert_eq!(
            sample(now - Duration::days(30)).last_updated_label(now),
            "2024-04-20"
        );
    }

    #[test]
    fn featured_needs_rate_above_threshold() {
        let mut ws = sample(Utc::now());
        assert!(!ws.is_featured());
        ws.learning_rate = Some(80);
        assert!(!ws.is_featured());
        ws.learning_rate = Some(81);
        assert!(ws.is_featured());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut ws = sample(Utc::now());
        WorkspacePatch {
            term_count: Some(12),
            ..Default::default()
        }
        .apply_to(&mut ws);
        assert_eq!(ws.term_count, 12);
        assert_eq!(ws.name, "Camera Manual");
        assert_eq!(ws.document_count, 0);
    }
}
