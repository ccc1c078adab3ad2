use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use super::TermBackend;
use crate::{
    images::ImageUpload,
    models::{
        AssistantReply, SourceCitation, TermGroup, TermOccurrence, TermRecommendation,
        TermSource, UploadedFile, Workspace,
    },
};

const GUIDE_TEMPLATE: &str = "# UI Guide

## Using the shutter button

1. **Half-press (focus)**
   - Press the shutter button halfway to focus
   - A green frame appears on the subject once focus locks

2. **Full press (capture)**
   - Press the shutter button all the way to take the picture
   - The shutter sound confirms the capture

## Notes

- Press gently to avoid camera shake
- The flash fires automatically in low light";

const CHAT_ANSWER: &str = "The shutter button is the capture button on top of the camera. \
Half-press it to focus, then press it fully to take the picture.";

/// Fixed payloads standing in for the analysis service.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockBackend;

#[async_trait]
impl TermBackend for MockBackend {
    async fn analyze(&self, documents: &[UploadedFile], use_db: bool) -> Result<Vec<TermGroup>> {
        debug!(
            "mock analysis over {} documents (db: {})",
            documents.len(),
            use_db
        );
        Ok(reference_groups())
    }

    async fn generate_guide(&self, image: &ImageUpload) -> Result<String> {
        debug!(
            "mock guide for {} ({}x{})",
            image.name, image.width, image.height
        );
        Ok(GUIDE_TEMPLATE.to_string())
    }

    async fn search_terms(&self, query: &str) -> Result<Vec<TermRecommendation>> {
        debug!("mock term search for {query:?}");
        Ok(reference_recommendations())
    }

    async fn answer(
        &self,
        question: &str,
        workspace: Option<&Workspace>,
    ) -> Result<AssistantReply> {
        debug!(
            "mock answer for {question:?} in {}",
            workspace.map(|w| w.name.as_str()).unwrap_or("no workspace")
        );
        Ok(AssistantReply {
            content: CHAT_ANSWER.to_string(),
            sources: vec![SourceCitation {
                id: "1".into(),
                doc_name: "camera_manual.pdf".into(),
                line: 42,
                snippet: "Half-press the shutter button to focus...".into(),
            }],
        })
    }
}

fn occurrence(
    id: &str,
    before: &str,
    after: &str,
    sentence: &str,
    context: &str,
    line: u32,
) -> TermOccurrence {
    TermOccurrence {
        id: id.into(),
        before: before.into(),
        after: after.into(),
        sentence: sentence.into(),
        context: context.into(),
        line,
        checked: true,
    }
}

/// The two reference groups every mock analysis returns.
pub fn reference_groups() -> Vec<TermGroup> {
    vec![
        TermGroup {
            id: "1".into(),
            name: "Shutter vs shutter button".into(),
            checked: true,
            source: TermSource::Db,
            total_count: 38,
            variants: vec![
                "Shutter".into(),
                "Shutter button".into(),
                "Capture button".into(),
            ],
            standard: "Shutter button".into(),
            confidence: 100,
            occurrences: vec![
                occurrence(
                    "1-1",
                    "Shutter",
                    "Shutter button",
                    "Half-press the shutter to focus",
                    "basic shooting instructions",
                    42,
                ),
                occurrence(
                    "1-2",
                    "Capture button",
                    "Shutter button",
                    "Press the capture button fully to take a picture",
                    "shooting guide",
                    58,
                ),
            ],
        },
        TermGroup {
            id: "2".into(),
            name: "Exposure vs exposure value".into(),
            checked: true,
            source: TermSource::Ai,
            total_count: 24,
            variants: vec!["Exposure".into(), "Exposure value".into(), "EV".into()],
            standard: "Exposure".into(),
            confidence: 92,
            occurrences: vec![occurrence(
                "2-1",
                "Exposure value",
                "Exposure",
                "Adjust the exposure value to change brightness",
                "manual mode settings",
                103,
            )],
        },
    ]
}

pub fn reference_recommendations() -> Vec<TermRecommendation> {
    vec![
        TermRecommendation {
            id: "1".into(),
            term: "Shutter button".into(),
            definition: "The button pressed to take a picture".into(),
            category: "Hardware".into(),
            source: "camera_manual.pdf".into(),
            confidence: 100,
        },
        TermRecommendation {
            id: "2".into(),
            term: "Exposure".into(),
            definition: "The factor that determines how bright a photo is".into(),
            category: "Shooting settings".into(),
            source: "basic_guide.docx".into(),
            confidence: 95,
        },
    ]
}
