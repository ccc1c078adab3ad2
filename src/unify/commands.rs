use std::path::PathBuf;

use tauri::State;

use super::{picker::document_inputs, UnifyController, UnifySnapshot, WorkflowStep};
use crate::{
    db::StoredTerm,
    models::{
        ConfirmOptions, ConfirmPreview, ReviewStats, SourceFilter, TermGroup, UnifyOutcome,
        UploadedFile,
    },
    AppState,
};

const PREVIEW_LIMIT: usize = 3;

fn controller_from_state(state: &State<'_, AppState>) -> UnifyController {
    state.unify.clone()
}

#[tauri::command]
pub async fn get_unify_state(state: State<'_, AppState>) -> Result<UnifySnapshot, String> {
    Ok(controller_from_state(&state).snapshot().await)
}

#[tauri::command]
pub async fn add_files(
    state: State<'_, AppState>,
    paths: Vec<PathBuf>,
) -> Result<Vec<UploadedFile>, String> {
    let controller = controller_from_state(&state);
    Ok(controller.add_files(document_inputs(paths)).await)
}

#[tauri::command]
pub async fn remove_file(state: State<'_, AppState>, file_id: String) -> Result<(), String> {
    controller_from_state(&state).remove_file(&file_id).await;
    Ok(())
}

#[tauri::command]
pub async fn clear_files(state: State<'_, AppState>) -> Result<(), String> {
    controller_from_state(&state).clear_files().await;
    Ok(())
}

#[tauri::command]
pub async fn toggle_db(state: State<'_, AppState>) -> Result<bool, String> {
    Ok(controller_from_state(&state).toggle_db().await)
}

#[tauri::command]
pub async fn navigate_unify(
    state: State<'_, AppState>,
    step: WorkflowStep,
) -> Result<WorkflowStep, String> {
    controller_from_state(&state)
        .navigate(step)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn cancel_analysis(state: State<'_, AppState>) -> Result<(), String> {
    controller_from_state(&state).cancel_analysis().await;
    Ok(())
}

#[tauri::command]
pub async fn toggle_group(state: State<'_, AppState>, group_id: String) -> Result<(), String> {
    controller_from_state(&state).toggle_group(&group_id).await;
    Ok(())
}

#[tauri::command]
pub async fn toggle_occurrence(
    state: State<'_, AppState>,
    group_id: String,
    occurrence_id: String,
) -> Result<(), String> {
    controller_from_state(&state)
        .toggle_occurrence(&group_id, &occurrence_id)
        .await;
    Ok(())
}

#[tauri::command]
pub async fn set_all_occurrences(
    state: State<'_, AppState>,
    group_id: String,
    checked: bool,
) -> Result<(), String> {
    controller_from_state(&state)
        .set_all_occurrences(&group_id, checked)
        .await;
    Ok(())
}

#[tauri::command]
pub async fn update_standard(
    state: State<'_, AppState>,
    group_id: String,
    standard: String,
) -> Result<(), String> {
    controller_from_state(&state)
        .update_standard(&group_id, standard)
        .await;
    Ok(())
}

#[tauri::command]
pub async fn add_manual_group(state: State<'_, AppState>, group: TermGroup) -> Result<(), String> {
    controller_from_state(&state).add_manual_group(group).await;
    Ok(())
}

#[tauri::command]
pub async fn filter_groups(
    state: State<'_, AppState>,
    query: String,
    filter: Option<SourceFilter>,
) -> Result<Vec<TermGroup>, String> {
    Ok(controller_from_state(&state)
        .filter_groups(&query, filter.unwrap_or_default())
        .await)
}

#[tauri::command]
pub async fn review_stats(state: State<'_, AppState>) -> Result<ReviewStats, String> {
    Ok(controller_from_state(&state).review_stats().await)
}

#[tauri::command]
pub async fn confirm_preview(
    state: State<'_, AppState>,
    limit: Option<usize>,
) -> Result<ConfirmPreview, String> {
    Ok(controller_from_state(&state)
        .confirm_preview(limit.unwrap_or(PREVIEW_LIMIT))
        .await)
}

#[tauri::command]
pub async fn confirm_unify(
    state: State<'_, AppState>,
    options: Option<ConfirmOptions>,
) -> Result<UnifyOutcome, String> {
    let options = match options {
        Some(options) => options,
        None => {
            let settings = state.settings.pipeline().map_err(|e| e.to_string())?;
            ConfirmOptions {
                save_to_db: settings.save_to_db_by_default,
                save_documents: settings.save_documents_by_default,
            }
        }
    };
    controller_from_state(&state)
        .confirm(options)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn start_new_task(state: State<'_, AppState>) -> Result<(), String> {
    controller_from_state(&state).start_new_task().await;
    Ok(())
}

#[tauri::command]
pub async fn list_stored_terms(state: State<'_, AppState>) -> Result<Vec<StoredTerm>, String> {
    controller_from_state(&state)
        .stored_terms()
        .await
        .map_err(|e| e.to_string())
}
