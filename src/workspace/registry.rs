use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::WorkflowError,
    models::{NewWorkspace, Workspace, WorkspacePatch},
};

pub type SharedWorkspaces = Arc<RwLock<WorkspaceRegistry>>;

pub fn read_registry(shared: &SharedWorkspaces) -> Result<RwLockReadGuard<'_, WorkspaceRegistry>> {
    shared
        .read()
        .map_err(|_| anyhow!("workspace registry lock poisoned"))
}

pub fn write_registry(
    shared: &SharedWorkspaces,
) -> Result<RwLockWriteGuard<'_, WorkspaceRegistry>> {
    shared
        .write()
        .map_err(|_| anyhow!("workspace registry lock poisoned"))
}

/// Workspaces in insertion order plus the current selection. The selection
/// is stored by id so updates to the entry show through it.
#[derive(Debug, Default, Clone)]
pub struct WorkspaceRegistry {
    workspaces: Vec<Workspace>,
    current_id: Option<String>,
}

impl WorkspaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedWorkspaces {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn list(&self) -> &[Workspace] {
        &self.workspaces
    }

    /// Replaces the whole list. A selection that no longer exists is dropped.
    pub fn set_all(&mut self, workspaces: Vec<Workspace>) {
        self.workspaces = workspaces;
        if let Some(id) = &self.current_id {
            if !self.workspaces.iter().any(|w| &w.id == id) {
                self.current_id = None;
            }
        }
    }

    pub fn add(&mut self, workspace: Workspace) {
        self.workspaces.push(workspace);
    }

    /// Builds a workspace from form input and appends it.
    pub fn create(&mut self, input: NewWorkspace) -> Result<Workspace> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(WorkflowError::EmptyWorkspaceName.into());
        }

        let workspace = Workspace {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: input
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            term_count: 0,
            document_count: 0,
            last_updated: Utc::now(),
            learning_rate: None,
        };
        self.add(workspace.clone());
        Ok(workspace)
    }

    /// Selects the matching workspace, or clears the selection when none matches.
    pub fn select(&mut self, id: &str) -> Option<&Workspace> {
        self.current_id = self
            .workspaces
            .iter()
            .find(|w| w.id == id)
            .map(|w| w.id.clone());
        self.current()
    }

    pub fn current(&self) -> Option<&Workspace> {
        let id = self.current_id.as_ref()?;
        self.workspaces.iter().find(|w| &w.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id == id)
    }

    /// Merges `patch` into the matching workspace; unknown ids are ignored.
    pub fn update(&mut self, id: &str, patch: &WorkspacePatch) -> Option<&Workspace> {
        let workspace = self.workspaces.iter_mut().find(|w| w.id == id)?;
        patch.apply_to(workspace);
        Some(&*workspace)
    }

    pub fn remove(&mut self, id: &str) {
        self.workspaces.retain(|w| w.id != id);
        if self.current_id.as_deref() == Some(id) {
            self.current_id = None;
        }
    }

    /// Case-insensitive name filter for the workspace picker.
    pub fn search(&self, query: &str) -> Vec<&Workspace> {
        let needle = query.to_lowercase();
        self.workspaces
            .iter()
            .filter(|w| w.name.to_lowercase().contains(&needle))
            .collect()
    }
}
