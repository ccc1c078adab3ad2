#[cfg(feature = "desktop")]
pub mod commands;
pub mod registry;

pub use registry::{read_registry, write_registry, SharedWorkspaces, WorkspaceRegistry};
