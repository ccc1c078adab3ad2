#[cfg(feature = "desktop")]
pub mod commands;
pub mod controller;
pub mod picker;
pub mod script;
pub mod state;
pub mod workflow;

pub use controller::{UnifyController, UnifySnapshot, UnifyTimings};
pub use script::{AnalysisScript, AnalysisTimings, ProgressStep, ScriptPhase};
pub use state::{AnalysisStatus, UnifyState};
pub use workflow::{StepInfo, WorkflowStep, TOTAL_STEPS};
