use std::path::PathBuf;

use tauri::State;

use super::{GenerateController, GenerateState};
use crate::{
    images::ImageUpload,
    models::{ChatMessage, GenerateTab, TermRecommendation},
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> GenerateController {
    state.generate.clone()
}

#[tauri::command]
pub async fn get_generate_state(state: State<'_, AppState>) -> Result<GenerateState, String> {
    Ok(controller_from_state(&state).get_state().await)
}

#[tauri::command]
pub async fn set_generate_tab(state: State<'_, AppState>, tab: GenerateTab) -> Result<(), String> {
    controller_from_state(&state).set_tab(tab).await;
    Ok(())
}

/// `None` clears the current image.
#[tauri::command]
pub async fn set_guide_image(
    state: State<'_, AppState>,
    path: Option<PathBuf>,
) -> Result<Option<ImageUpload>, String> {
    let image = match path {
        Some(path) => Some(ImageUpload::from_path(&path).map_err(|e| e.to_string())?),
        None => None,
    };
    controller_from_state(&state)
        .set_guide_image(image.clone())
        .await
        .map_err(|e| e.to_string())?;
    Ok(image)
}

#[tauri::command]
pub async fn generate_guide(state: State<'_, AppState>) -> Result<String, String> {
    controller_from_state(&state)
        .generate_guide()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn search_terms(
    state: State<'_, AppState>,
    query: String,
) -> Result<Vec<TermRecommendation>, String> {
    controller_from_state(&state)
        .search_terms(&query)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn recommend_terms_from_image(
    state: State<'_, AppState>,
    path: PathBuf,
) -> Result<Vec<TermRecommendation>, String> {
    let image = ImageUpload::from_path(&path).map_err(|e| e.to_string())?;
    controller_from_state(&state)
        .recommend_from_image(image)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn toggle_recommended_term(
    state: State<'_, AppState>,
    term_id: String,
) -> Result<(), String> {
    controller_from_state(&state).toggle_term(&term_id).await;
    Ok(())
}

#[tauri::command]
pub async fn export_selected_terms(state: State<'_, AppState>) -> Result<String, String> {
    Ok(controller_from_state(&state).export_selected().await)
}

#[tauri::command]
pub async fn send_chat_message(
    state: State<'_, AppState>,
    message: String,
) -> Result<ChatMessage, String> {
    controller_from_state(&state)
        .send_message(&message)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn clear_chat(state: State<'_, AppState>) -> Result<(), String> {
    controller_from_state(&state).clear_chat().await;
    Ok(())
}

#[tauri::command]
pub async fn reset_generate(state: State<'_, AppState>) -> Result<(), String> {
    controller_from_state(&state)
        .reset()
        .await
        .map_err(|e| e.to_string())
}
