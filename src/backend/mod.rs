//! The seam between the pipelines and whatever does the actual language work.
//!
//! The pipelines only ever talk to [`TermBackend`]. [`mock::MockBackend`]
//! returns fixed payloads; a networked implementation would map each method
//! onto one endpoint (`/analyze`, `/guide`, `/terms/search`, `/chat`).

pub mod mock;

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    images::ImageUpload,
    models::{AssistantReply, TermGroup, TermRecommendation, UploadedFile, Workspace},
};

pub use mock::MockBackend;

#[async_trait]
pub trait TermBackend: Send + Sync {
    /// Groups inconsistent terminology across `documents`. With `use_db`,
    /// terms already in the workspace store come back tagged `db`.
    async fn analyze(&self, documents: &[UploadedFile], use_db: bool) -> Result<Vec<TermGroup>>;

    /// Writes a usage guide for the UI shown in `image`.
    async fn generate_guide(&self, image: &ImageUpload) -> Result<String>;

    /// Recommendations for a free-text query, in relevance order.
    async fn search_terms(&self, query: &str) -> Result<Vec<TermRecommendation>>;

    async fn answer(&self, question: &str, workspace: Option<&Workspace>)
        -> Result<AssistantReply>;
}
