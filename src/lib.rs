pub mod backend;
pub mod db;
pub mod error;
pub mod events;
pub mod generate;
pub mod images;
pub mod models;
pub mod settings;
pub mod unify;
pub mod utils;
pub mod workspace;

use std::sync::Arc;

use anyhow::Result;

use backend::{MockBackend, TermBackend};
use db::Database;
use events::EventEmitter;
use generate::{GenerateController, GenerateTimings};
use settings::SettingsStore;
use unify::{UnifyController, UnifyTimings};
use workspace::{SharedWorkspaces, WorkspaceRegistry};

pub use error::WorkflowError;

/// Everything the desktop commands reach through `State<AppState>`.
pub struct AppState {
    pub workspaces: SharedWorkspaces,
    pub db: Database,
    pub unify: UnifyController,
    pub generate: GenerateController,
    pub settings: SettingsStore,
}

impl AppState {
    /// Wires both pipelines to one registry, one store and the mock backend.
    pub fn new(settings: SettingsStore, emitter: Arc<dyn EventEmitter>) -> Result<Self> {
        Self::with_backend(settings, emitter, Arc::new(MockBackend))
    }

    pub fn with_backend(
        settings: SettingsStore,
        emitter: Arc<dyn EventEmitter>,
        backend: Arc<dyn TermBackend>,
    ) -> Result<Self> {
        let pipeline = settings.pipeline()?;
        let workspaces = WorkspaceRegistry::shared();
        let db = Database::in_memory()?;

        let unify = UnifyController::new(
            backend.clone(),
            db.clone(),
            workspaces.clone(),
            emitter.clone(),
            UnifyTimings::from_settings(&pipeline),
        );
        let generate = GenerateController::new(
            backend,
            workspaces.clone(),
            emitter,
            GenerateTimings::from_settings(&pipeline),
        );

        Ok(Self {
            workspaces,
            db,
            unify,
            generate,
            settings,
        })
    }

    /// Cancels everything still running in either pipeline.
    pub async fn shutdown(&self) {
        self.unify.close().await;
        if let Err(err) = self.generate.close().await {
            log::warn!("failed to close generate pipeline: {err}");
        }
    }
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use generate::commands::{
        clear_chat, export_selected_terms, generate_guide, get_generate_state,
        recommend_terms_from_image, reset_generate, search_terms, send_chat_message,
        set_generate_tab, set_guide_image, toggle_recommended_term,
    };
    use tauri::Manager;
    use unify::commands::{
        add_files, add_manual_group, cancel_analysis, clear_files, confirm_preview,
        confirm_unify, filter_groups, get_unify_state, list_stored_terms, navigate_unify,
        remove_file, review_stats, set_all_occurrences, start_new_task, toggle_db,
        toggle_group, toggle_occurrence, update_standard,
    };
    use workspace::commands::{
        create_workspace, delete_workspace, list_workspaces, search_workspaces,
        select_workspace, update_workspace,
    };

    utils::logging::init_logging();
    log::info!("TermSync starting up...");

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let settings_store = SettingsStore::new(app_data_dir.join("settings.json"))?;
                let emitter: Arc<dyn EventEmitter> = Arc::new(app.handle().clone());
                app.manage(AppState::new(settings_store, emitter)?);
                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            list_workspaces,
            create_workspace,
            select_workspace,
            update_workspace,
            delete_workspace,
            search_workspaces,
            get_unify_state,
            add_files,
            remove_file,
            clear_files,
            toggle_db,
            navigate_unify,
            cancel_analysis,
            toggle_group,
            toggle_occurrence,
            set_all_occurrences,
            update_standard,
            add_manual_group,
            filter_groups,
            review_stats,
            confirm_preview,
            confirm_unify,
            start_new_task,
            list_stored_terms,
            get_generate_state,
            set_generate_tab,
            set_guide_image,
            generate_guide,
            search_terms,
            recommend_terms_from_image,
            toggle_recommended_term,
            export_selected_terms,
            send_chat_message,
            clear_chat,
            reset_generate,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|handle, event| {
        if let tauri::RunEvent::Exit = event {
            if let Some(state) = handle.try_state::<AppState>() {
                tauri::async_runtime::block_on(state.shutdown());
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        events::testing::RecordingEmitter,
        models::{ConfirmOptions, FileInput, NewWorkspace},
        unify::WorkflowStep,
    };

    #[tokio::test(start_paused = true)]
    async fn pipelines_share_the_workspace_registry() {
        let emitter = Arc::new(RecordingEmitter::default());
        let state = AppState::new(SettingsStore::ephemeral(), emitter.clone()).unwrap();

        let ws_id = {
            let mut registry = state.workspaces.write().unwrap();
            let ws = registry
                .create(NewWorkspace {
                    name: "Camera Manual".into(),
                    description: None,
                })
                .unwrap();
            registry.select(&ws.id);
            ws.id
        };

        state
            .unify
            .add_files(vec![FileInput::new("camera_manual.pdf", 4096)])
            .await;
        state.unify.navigate(WorkflowStep::Analyze).await.unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;
        state.unify.confirm(ConfirmOptions::default()).await.unwrap();

        assert_eq!(state.db.count_terms(&ws_id).await.unwrap(), 2);
        let reply = state.generate.send_message("shutter?").await.unwrap();
        assert!(reply.sources.is_some());

        state.shutdown().await;
    }
}
