pub mod generate;
pub mod unify;
pub mod workspace;

pub use generate::{
    AssistantReply, ChatMessage, ChatRole, GenerateTab, GuideStatus, SourceCitation,
    TermRecommendation,
};
pub use unify::{
    filter_groups, ConfirmOptions, ConfirmPreview, FileInput, GroupPreview, GroupSummary,
    ReviewStats, SourceFilter, TermGroup, TermOccurrence, TermSource, UnifyOutcome,
    UploadedFile,
};
pub use workspace::{NewWorkspace, Workspace, WorkspacePatch};
