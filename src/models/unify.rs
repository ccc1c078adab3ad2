use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A document handed to the unify pipeline. The handle never crosses the
/// IPC boundary; the UI only sees id, name and size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

/// What a picker or drop target hands over before an id is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInput {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl FileInput {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TermSource {
    /// Matched against the workspace terminology store.
    Db,
    /// Newly inferred by analysis.
    Ai,
}

impl TermSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TermSource::Db => "db",
            TermSource::Ai => "ai",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TermOccurrence {
    pub id: String,
    pub before: String,
    pub after: String,
    pub sentence: String,
    pub context: String,
    pub line: u32,
    pub checked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TermGroup {
    pub id: String,
    pub name: String,
    pub checked: bool,
    pub source: TermSource,
    pub total_count: u32,
    pub variants: Vec<String>,
    /// Normally one of `variants`; `UnifyState::update_standard` does not enforce it.
    pub standard: String,
    pub confidence: u8,
    pub occurrences: Vec<TermOccurrence>,
}

impl TermGroup {
    pub fn checked_occurrences(&self) -> usize {
        self.occurrences.iter().filter(|occ| occ.checked).count()
    }

    /// Variants that get rewritten to the standard form.
    pub fn replaced_variants(&self) -> Vec<String> {
        self.variants
            .iter()
            .filter(|variant| **variant != self.standard)
            .cloned()
            .collect()
    }

    pub fn standard_is_variant(&self) -> bool {
        self.variants.iter().any(|variant| *variant == self.standard)
    }

    fn matches_query(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .variants
                .iter()
                .any(|variant| variant.to_lowercase().contains(needle))
    }
}

/// Review-step source filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SourceFilter {
    #[default]
    All,
    Db,
    Ai,
}

impl SourceFilter {
    pub fn matches(&self, source: TermSource) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Db => source == TermSource::Db,
            SourceFilter::Ai => source == TermSource::Ai,
        }
    }
}

/// Case-insensitive name/variant search combined with a source filter.
pub fn filter_groups<'a>(
    groups: &'a [TermGroup],
    query: &str,
    filter: SourceFilter,
) -> Vec<&'a TermGroup> {
    let needle = query.to_lowercase();
    groups
        .iter()
        .filter(|group| group.matches_query(&needle) && filter.matches(group.source))
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub selected_count: usize,
    pub total_groups: usize,
    pub total_occurrences: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupPreview {
    pub id: String,
    pub name: String,
    pub replaced: Vec<String>,
    pub standard: String,
    pub checked_occurrences: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPreview {
    pub selected_groups: usize,
    pub total_changes: usize,
    pub groups: Vec<GroupPreview>,
    /// Selected groups not included in `groups`.
    pub remaining: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmOptions {
    pub save_to_db: bool,
    pub save_documents: bool,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            save_to_db: true,
            save_documents: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    pub source: TermSource,
    pub standard: String,
    pub checked_occurrences: usize,
}

/// What the confirm step produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnifyOutcome {
    pub processed_groups: usize,
    pub total_changes: usize,
    pub saved_to_db: bool,
    pub documents_saved: usize,
    pub groups: Vec<GroupSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, name: &str, source: TermSource, variants: &[&str]) -> TermGroup {
        TermGroup {
            id: id.into(),
            name: name.into(),
            checked: true,
            source,
            total_count: 1,
            variants: variants.iter().map(|v| v.to_string()).collect(),
            standard: variants[0].to_string(),
            confidence: 90,
            occurrences: Vec::new(),
        }
    }

    #[test]
    fn search_hits_name_or_variant_case_insensitively() {
        let groups = vec![
            group("1", "Shutter vs shutter button", TermSource::Db, &["Shutter", "Shutter button"]),
            group("2", "Exposure vs EV", TermSource::Ai, &["Exposure", "EV"]),
        ];

        let hits = filter_groups(&groups, "ev", SourceFilter::All);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");

        let hits = filter_groups(&groups, "SHUTTER", SourceFilter::All);
        assert_eq!(hits.len(), 1);

        assert_eq!(filter_groups(&groups, "", SourceFilter::Db).len(), 1);
        assert_eq!(filter_groups(&groups, "", SourceFilter::Ai)[0].id, "2");
        assert!(filter_groups(&groups, "shutter", SourceFilter::Ai).is_empty());
    }

    #[test]
    fn replaced_variants_skip_standard() {
        let mut g = group("1", "g", TermSource::Ai, &["a", "b", "c"]);
        g.standard = "b".into();
        assert_eq!(g.replaced_variants(), vec!["a".to_string(), "c".to_string()]);
        assert!(g.standard_is_variant());
        g.standard = "z".into();
        assert!(!g.standard_is_variant());
    }
}
