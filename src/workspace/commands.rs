use tauri::{AppHandle, State};

use super::{read_registry, write_registry};
use crate::{
    events::{emit_event, WORKSPACES_CHANGED},
    models::{NewWorkspace, Workspace, WorkspacePatch},
    AppState,
};

fn broadcast(app_handle: &AppHandle, state: &State<'_, AppState>) -> Result<(), String> {
    let workspaces = read_registry(&state.workspaces)
        .map_err(|e| e.to_string())?
        .list()
        .to_vec();
    emit_event(app_handle, WORKSPACES_CHANGED, &workspaces);
    Ok(())
}

#[tauri::command]
pub fn list_workspaces(state: State<'_, AppState>) -> Result<Vec<Workspace>, String> {
    let registry = read_registry(&state.workspaces).map_err(|e| e.to_string())?;
    Ok(registry.list().to_vec())
}

#[tauri::command]
pub fn create_workspace(
    state: State<'_, AppState>,
    app_handle: AppHandle,
    input: NewWorkspace,
) -> Result<Workspace, String> {
    let workspace = write_registry(&state.workspaces)
        .map_err(|e| e.to_string())?
        .create(input)
        .map_err(|e| e.to_string())?;
    broadcast(&app_handle, &state)?;
    Ok(workspace)
}

#[tauri::command]
pub fn select_workspace(
    state: State<'_, AppState>,
    workspace_id: String,
) -> Result<Option<Workspace>, String> {
    let mut registry = write_registry(&state.workspaces).map_err(|e| e.to_string())?;
    Ok(registry.select(&workspace_id).cloned())
}

#[tauri::command]
pub fn update_workspace(
    state: State<'_, AppState>,
    app_handle: AppHandle,
    workspace_id: String,
    patch: WorkspacePatch,
) -> Result<Option<Workspace>, String> {
    let updated = write_registry(&state.workspaces)
        .map_err(|e| e.to_string())?
        .update(&workspace_id, &patch)
        .cloned();
    broadcast(&app_handle, &state)?;
    Ok(updated)
}

#[tauri::command]
pub fn delete_workspace(
    state: State<'_, AppState>,
    app_handle: AppHandle,
    workspace_id: String,
) -> Result<(), String> {
    write_registry(&state.workspaces)
        .map_err(|e| e.to_string())?
        .remove(&workspace_id);
    broadcast(&app_handle, &state)
}

#[tauri::command]
pub fn search_workspaces(
    state: State<'_, AppState>,
    query: String,
) -> Result<Vec<Workspace>, String> {
    let registry = read_registry(&state.workspaces).map_err(|e| e.to_string())?;
    Ok(registry.search(&query).into_iter().cloned().collect())
}
