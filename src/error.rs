use thiserror::Error;

/// Domain failures surfaced by the controllers. They travel inside
/// `anyhow::Error`, so callers that care can `downcast_ref::<WorkflowError>()`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("workspace name must not be empty")]
    EmptyWorkspaceName,

    #[error("no files uploaded")]
    NoFiles,

    #[error("analysis already running")]
    AnalysisRunning,

    #[error("no term groups selected")]
    NothingSelected,

    #[error("no guide image uploaded")]
    MissingGuideImage,

    #[error("guide generation already in progress")]
    GuideBusy,

    #[error("a chat reply is still pending")]
    ChatBusy,

    #[error("message must not be empty")]
    EmptyMessage,

    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("operation cancelled")]
    Cancelled,
}

/// Returns the `WorkflowError` carried by `err`, if any.
pub fn workflow_error(err: &anyhow::Error) -> Option<&WorkflowError> {
    err.downcast_ref::<WorkflowError>()
}
