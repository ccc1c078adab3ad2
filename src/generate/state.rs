use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    images::ImageUpload,
    models::{ChatMessage, GenerateTab, GuideStatus, TermRecommendation},
};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateState {
    pub current_tab: GenerateTab,
    pub guide_image: Option<ImageUpload>,
    pub guide_text: String,
    pub guide_status: GuideStatus,
    pub search_query: String,
    pub is_searching: bool,
    pub term_recommendations: Vec<TermRecommendation>,
    pub selected_terms: BTreeSet<String>,
    pub messages: Vec<ChatMessage>,
    pub is_loading: bool,
}

impl GenerateState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tab(&mut self, tab: GenerateTab) {
        self.current_tab = tab;
    }

    /// Swapping or clearing the image discards any guide written for the old one.
    pub fn set_guide_image(&mut self, image: Option<ImageUpload>) {
        self.guide_image = image;
        self.guide_status = GuideStatus::Idle;
        self.guide_text.clear();
    }

    pub fn toggle_term(&mut self, id: &str) {
        if !self.selected_terms.remove(id) {
            self.selected_terms.insert(id.to_string());
        }
    }

    /// Selected recommendations as `term: definition` blocks, in list order.
    pub fn export_selected(&self) -> String {
        self.term_recommendations
            .iter()
            .filter(|rec| self.selected_terms.contains(&rec.id))
            .map(|rec| format!("{}: {}", rec.term, rec.definition))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn clear_chat(&mut self) {
        self.messages.clear();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::reference_recommendations;

    #[test]
    fn toggle_term_flips_membership() {
        let mut state = GenerateState::new();
        state.toggle_term("1");
        state.toggle_term("2");
        state.toggle_term("1");
        assert_eq!(state.selected_terms.iter().collect::<Vec<_>>(), vec!["2"]);
    }

    #[test]
    fn export_joins_selected_with_blank_line() {
        let mut state = GenerateState::new();
        state.term_recommendations = reference_recommendations();
        assert_eq!(state.export_selected(), "");

        state.toggle_term("2");
        state.toggle_term("1");
        assert_eq!(
            state.export_selected(),
            "Shutter button: The button pressed to take a picture\n\n\
             Exposure: The factor that determines how bright a photo is"
        );
    }

    #[test]
    fn clearing_image_resets_guide() {
        let mut state = GenerateState::new();
        state.guide_status = GuideStatus::Complete;
        state.guide_text = "# UI Guide".into();

        state.set_guide_image(None);
        assert_eq!(state.guide_status, GuideStatus::Idle);
        assert!(state.guide_text.is_empty());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut state = GenerateState::new();
        state.set_tab(GenerateTab::Terms);
        state.messages.push(ChatMessage::user("hi"));
        state.is_loading = true;
        state.toggle_term("1");

        state.reset();
        assert_eq!(state, GenerateState::new());
    }
}
