use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::script::ScriptPhase;
use crate::models::{
    filter_groups, ConfirmPreview, FileInput, GroupPreview, ReviewStats, SourceFilter, TermGroup,
    UploadedFile,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisStatus {
    #[default]
    Idle,
    Analyzing,
    Complete,
}

/// Everything the unify screens render from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnifyState {
    pub files: Vec<UploadedFile>,
    pub db_enabled: bool,
    pub status: AnalysisStatus,
    pub progress: u8,
    pub phase_label: Option<String>,
    pub logs: Vec<String>,
    pub term_groups: Vec<TermGroup>,
    /// Keeps ids unique when several files land in the same millisecond.
    #[serde(skip)]
    next_file_seq: u64,
}

impl UnifyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `inputs` with generated ids and returns what was added.
    pub fn add_files(&mut self, inputs: Vec<FileInput>, now: DateTime<Utc>) -> Vec<UploadedFile> {
        let stamp = now.timestamp_millis();
        let added: Vec<UploadedFile> = inputs
            .into_iter()
            .map(|input| {
                self.next_file_seq += 1;
                UploadedFile {
                    id: format!("{stamp}-{}-{}", self.next_file_seq, input.name),
                    name: input.name,
                    size: input.size,
                    path: input.path,
                }
            })
            .collect();
        self.files.extend(added.iter().cloned());
        added
    }

    pub fn remove_file(&mut self, id: &str) {
        self.files.retain(|file| file.id != id);
    }

    pub fn clear_files(&mut self) {
        self.files.clear();
    }

    pub fn toggle_db(&mut self) {
        self.db_enabled = !self.db_enabled;
    }

    pub(crate) fn begin_analysis(&mut self) {
        self.status = AnalysisStatus::Analyzing;
        self.progress = 0;
        self.phase_label = None;
        self.logs.clear();
        self.term_groups.clear();
    }

    pub(crate) fn apply_phase(&mut self, phase: &ScriptPhase) {
        if let Some(label) = phase.label {
            self.phase_label = Some(label.to_string());
        }
        if let Some(line) = &phase.log {
            self.logs.push(line.clone());
        }
        self.progress = phase.progress.apply(self.progress);
    }

    pub(crate) fn complete_analysis(&mut self) {
        self.status = AnalysisStatus::Complete;
        self.phase_label = None;
    }

    pub(crate) fn fail_analysis(&mut self, reason: &str) {
        self.status = AnalysisStatus::Idle;
        self.phase_label = None;
        self.logs.push(format!("✗ Analysis failed: {reason}"));
    }

    fn group_mut(&mut self, group_id: &str) -> Option<&mut TermGroup> {
        self.term_groups.iter_mut().find(|group| group.id == group_id)
    }

    /// Flips the group only; its occurrences keep their own flags.
    pub fn toggle_group(&mut self, group_id: &str) {
        if let Some(group) = self.group_mut(group_id) {
            group.checked = !group.checked;
        }
    }

    pub fn toggle_occurrence(&mut self, group_id: &str, occurrence_id: &str) {
        let Some(group) = self.group_mut(group_id) else {
            return;
        };
        if let Some(occ) = group.occurrences.iter_mut().find(|occ| occ.id == occurrence_id) {
            occ.checked = !occ.checked;
        }
    }

    pub fn set_all_occurrences(&mut self, group_id: &str, checked: bool) {
        if let Some(group) = self.group_mut(group_id) {
            for occ in &mut group.occurrences {
                occ.checked = checked;
            }
        }
    }

    pub fn update_standard(&mut self, group_id: &str, standard: impl Into<String>) {
        if let Some(group) = self.group_mut(group_id) {
            group.standard = standard.into();
        }
    }

    pub fn add_manual_group(&mut self, group: TermGroup) {
        self.term_groups.push(group);
    }

    pub fn filter_groups(&self, query: &str, filter: SourceFilter) -> Vec<&TermGroup> {
        filter_groups(&self.term_groups, query, filter)
    }

    pub fn selected_groups(&self) -> Vec<&TermGroup> {
        self.term_groups.iter().filter(|group| group.checked).collect()
    }

    pub fn total_changes(&self) -> usize {
        self.selected_groups()
            .iter()
            .map(|group| group.checked_occurrences())
            .sum()
    }

    pub fn review_stats(&self) -> ReviewStats {
        ReviewStats {
            selected_count: self.selected_groups().len(),
            total_groups: self.term_groups.len(),
            total_occurrences: self.total_changes(),
        }
    }

    /// Summary for the confirm screen, showing at most `limit` groups.
    pub fn preview(&self, limit: usize) -> ConfirmPreview {
        let selected = self.selected_groups();
        let groups: Vec<GroupPreview> = selected
            .iter()
            .take(limit)
            .map(|group| GroupPreview {
                id: group.id.clone(),
                name: group.name.clone(),
                replaced: group.replaced_variants(),
                standard: group.standard.clone(),
                checked_occurrences: group.checked_occurrences(),
            })
            .collect();

        ConfirmPreview {
            selected_groups: selected.len(),
            total_changes: self.total_changes(),
            remaining: selected.len() - groups.len(),
            groups,
        }
    }

    pub fn reset(&mut self) {
        *self = Self {
            next_file_seq: self.next_file_seq,
            ..Self::default()
        };
    }
}
