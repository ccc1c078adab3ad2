use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use super::{
    script::{AnalysisScript, AnalysisTimings, ScriptPhase},
    state::UnifyState,
    workflow::{StepInfo, WorkflowStep},
};
use crate::{
    backend::TermBackend,
    db::{Database, StoredTerm},
    error::{workflow_error, WorkflowError},
    events::{
        emit_event, EventEmitter, UNIFY_ANALYSIS_COMPLETE, UNIFY_STATE_CHANGED,
        UNIFY_STEP_CHANGED, WORKSPACES_CHANGED,
    },
    models::{
        ConfirmOptions, ConfirmPreview, FileInput, GroupSummary, ReviewStats, SourceFilter,
        TermGroup, UnifyOutcome, UploadedFile, WorkspacePatch,
    },
    settings::PipelineSettings,
    utils::timing::{scaled_ms, sleep_or_cancel},
    workspace::{read_registry, write_registry, SharedWorkspaces},
};
use crate::{log_error, log_info, log_warn};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnifySnapshot {
    pub state: UnifyState,
    pub step: WorkflowStep,
    pub stats: ReviewStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifyTimings {
    pub analysis: AnalysisTimings,
    /// "Processing" pause on the confirm step.
    pub confirm: Duration,
}

impl UnifyTimings {
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            analysis: AnalysisTimings::from_settings(settings),
            confirm: scaled_ms(2000, settings.delay_scale),
        }
    }

    pub fn instant() -> Self {
        Self {
            analysis: AnalysisTimings::instant(),
            confirm: Duration::ZERO,
        }
    }
}

impl Default for UnifyTimings {
    fn default() -> Self {
        Self::from_settings(&PipelineSettings::default())
    }
}

#[derive(Debug, Default)]
struct Session {
    state: UnifyState,
    step: WorkflowStep,
}

impl Session {
    fn snapshot(&self) -> UnifySnapshot {
        UnifySnapshot {
            state: self.state.clone(),
            step: self.step,
            stats: self.state.review_stats(),
        }
    }
}

struct AnalysisRun {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the unify pipeline: file list, analysis runner, review edits and
/// the confirm step. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct UnifyController {
    session: Arc<Mutex<Session>>,
    run: Arc<Mutex<Option<AnalysisRun>>>,
    backend: Arc<dyn TermBackend>,
    db: Database,
    workspaces: SharedWorkspaces,
    emitter: Arc<dyn EventEmitter>,
    timings: UnifyTimings,
    scope: CancellationToken,
}

impl UnifyController {
    pub fn new(
        backend: Arc<dyn TermBackend>,
        db: Database,
        workspaces: SharedWorkspaces,
        emitter: Arc<dyn EventEmitter>,
        timings: UnifyTimings,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::default())),
            run: Arc::new(Mutex::new(None)),
            backend,
            db,
            workspaces,
            emitter,
            timings,
            scope: CancellationToken::new(),
        }
    }

    pub async fn snapshot(&self) -> UnifySnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn step(&self) -> WorkflowStep {
        self.session.lock().await.step
    }

    /// Applies `f` and broadcasts the new snapshot.
    async fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let (result, snapshot) = {
            let mut session = self.session.lock().await;
            let result = f(&mut session);
            (result, session.snapshot())
        };
        emit_event(self.emitter.as_ref(), UNIFY_STATE_CHANGED, &snapshot);
        result
    }

    /// Like `update`, but refuses once `token` has fired. The check happens
    /// under the state lock, so nothing lands after a cancel has returned.
    async fn update_unless_cancelled<R>(
        &self,
        token: &CancellationToken,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R> {
        let (result, snapshot) = {
            let mut session = self.session.lock().await;
            if token.is_cancelled() {
                return Err(WorkflowError::Cancelled.into());
            }
            let result = f(&mut session);
            (result, session.snapshot())
        };
        emit_event(self.emitter.as_ref(), UNIFY_STATE_CHANGED, &snapshot);
        Ok(result)
    }

    async fn set_step(&self, step: WorkflowStep) {
        self.session.lock().await.step = step;
        emit_event(self.emitter.as_ref(), UNIFY_STEP_CHANGED, &StepInfo::from(step));
    }

    pub async fn add_files(&self, inputs: Vec<FileInput>) -> Vec<UploadedFile> {
        let now = Utc::now();
        self.update(|s| s.state.add_files(inputs, now)).await
    }

    pub async fn remove_file(&self, id: &str) {
        self.update(|s| s.state.remove_file(id)).await
    }

    pub async fn clear_files(&self) {
        self.update(|s| s.state.clear_files()).await
    }

    pub async fn toggle_db(&self) -> bool {
        self.update(|s| {
            s.state.toggle_db();
            s.state.db_enabled
        })
        .await
    }

    pub async fn toggle_group(&self, group_id: &str) {
        self.update(|s| s.state.toggle_group(group_id)).await
    }

    pub async fn toggle_occurrence(&self, group_id: &str, occurrence_id: &str) {
        self.update(|s| s.state.toggle_occurrence(group_id, occurrence_id))
            .await
    }

    pub async fn set_all_occurrences(&self, group_id: &str, checked: bool) {
        self.update(|s| s.state.set_all_occurrences(group_id, checked))
            .await
    }

    pub async fn update_standard(&self, group_id: &str, standard: String) {
        self.update(|s| s.state.update_standard(group_id, standard))
            .await
    }

    pub async fn add_manual_group(&self, group: TermGroup) {
        self.update(|s| s.state.add_manual_group(group)).await
    }

    pub async fn filter_groups(&self, query: &str, filter: SourceFilter) -> Vec<TermGroup> {
        let session = self.session.lock().await;
        session
            .state
            .filter_groups(query, filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn review_stats(&self) -> ReviewStats {
        self.session.lock().await.state.review_stats()
    }

    pub async fn confirm_preview(&self, limit: usize) -> ConfirmPreview {
        self.session.lock().await.state.preview(limit)
    }

    pub async fn is_analysis_running(&self) -> bool {
        self.run
            .lock()
            .await
            .as_ref()
            .map(|run| !run.handle.is_finished())
            .unwrap_or(false)
    }

    /// Kicks off the scripted analysis over the current file list.
    pub async fn start_analysis(&self) -> Result<()> {
        let mut run = self.run.lock().await;
        if run.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return Err(WorkflowError::AnalysisRunning.into());
        }

        let db_enabled = {
            let session = self.session.lock().await;
            if session.state.files.is_empty() {
                return Err(WorkflowError::NoFiles.into());
            }
            session.state.db_enabled
        };
        let known_terms = if db_enabled {
            self.known_term_count().await?
        } else {
            0
        };

        let files = self
            .update(|s| {
                s.state.begin_analysis();
                s.state.files.clone()
            })
            .await;
        if files.is_empty() {
            return Err(WorkflowError::NoFiles.into());
        }

        log_info!(
            "starting analysis over {} files (db: {db_enabled}, known terms: {known_terms})",
            files.len()
        );

        let token = self.scope.child_token();
        let controller = self.clone();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            controller
                .run_analysis(task_token, files, db_enabled, known_terms)
                .await;
        });

        *run = Some(AnalysisRun { token, handle });
        Ok(())
    }

    /// Stops the in-flight run, if any, and waits for it to wind down.
    /// State stays wherever the run left it.
    pub async fn cancel_analysis(&self) {
        let Some(run) = self.run.lock().await.take() else {
            return;
        };
        run.token.cancel();
        if let Err(err) = run.handle.await {
            log_error!("analysis task ended abnormally: {err}");
        }
    }

    async fn known_term_count(&self) -> Result<u64> {
        let workspace_id = read_registry(&self.workspaces)?
            .current()
            .map(|w| w.id.clone());
        match workspace_id {
            Some(id) => self.db.count_terms(&id).await,
            None => Ok(0),
        }
    }

    async fn run_analysis(
        self,
        token: CancellationToken,
        files: Vec<UploadedFile>,
        db_enabled: bool,
        known_terms: u64,
    ) {
        match self
            .drive_analysis(&token, &files, db_enabled, known_terms)
            .await
        {
            Ok(group_count) => log_info!("analysis complete: {group_count} term groups"),
            Err(err) if workflow_error(&err) == Some(&WorkflowError::Cancelled) => {
                log_info!("analysis cancelled");
            }
            Err(err) => {
                log_error!("analysis failed: {err:#}");
                let reason = err.to_string();
                if let Err(err) = self
                    .update_unless_cancelled(&token, |s| s.state.fail_analysis(&reason))
                    .await
                {
                    log_warn!("dropping analysis failure: {err}");
                }
            }
        }
    }

    async fn drive_analysis(
        &self,
        token: &CancellationToken,
        files: &[UploadedFile],
        db_enabled: bool,
        known_terms: u64,
    ) -> Result<usize> {
        let timings = &self.timings.analysis;
        let script = AnalysisScript::build(files, db_enabled, known_terms, timings);
        for phase in script.phases() {
            self.run_phase(token, phase).await?;
        }

        let groups = tokio::select! {
            result = self.backend.analyze(files, db_enabled) => result?,
            _ = token.cancelled() => return Err(WorkflowError::Cancelled.into()),
        };
        let group_count = groups.len();

        let closing = AnalysisScript::results_phase(group_count, timings);
        sleep_or_cancel(token, closing.delay).await?;
        self.update_unless_cancelled(token, move |s| {
            s.state.apply_phase(&closing);
            s.state.term_groups = groups;
        })
        .await?;

        sleep_or_cancel(token, timings.handoff).await?;
        let stats = self
            .update_unless_cancelled(token, |s| {
                s.state.complete_analysis();
                s.step = WorkflowStep::Review;
                s.state.review_stats()
            })
            .await?;

        emit_event(self.emitter.as_ref(), UNIFY_ANALYSIS_COMPLETE, &stats);
        emit_event(
            self.emitter.as_ref(),
            UNIFY_STEP_CHANGED,
            &StepInfo::from(WorkflowStep::Review),
        );
        Ok(group_count)
    }

    async fn run_phase(&self, token: &CancellationToken, phase: &ScriptPhase) -> Result<()> {
        sleep_or_cancel(token, phase.delay).await?;
        self.update_unless_cancelled(token, |s| s.state.apply_phase(phase))
            .await
    }

    /// Moves the flow to `target` and returns the step it landed on.
    /// Entering Analyze without files lands on Upload; leaving Analyze
    /// cancels a run in flight.
    pub async fn navigate(&self, target: WorkflowStep) -> Result<WorkflowStep> {
        let current = self.step().await;

        if target != WorkflowStep::Analyze {
            if current == WorkflowStep::Analyze {
                self.cancel_analysis().await;
            }
            self.set_step(target).await;
            return Ok(target);
        }

        if current == WorkflowStep::Analyze && self.is_analysis_running().await {
            return Ok(WorkflowStep::Analyze);
        }

        let has_files = !self.session.lock().await.state.files.is_empty();
        if !has_files {
            self.set_step(WorkflowStep::Upload).await;
            return Ok(WorkflowStep::Upload);
        }

        // The step goes first: a run with zero delays can reach Review
        // before `start_analysis` returns.
        self.set_step(WorkflowStep::Analyze).await;
        if let Err(err) = self.start_analysis().await {
            self.set_step(current).await;
            return Err(err);
        }
        Ok(WorkflowStep::Analyze)
    }

    /// Applies the selected groups: optionally stores the terms and the
    /// unified documents, refreshes the workspace counters and moves to Result.
    pub async fn confirm(&self, options: ConfirmOptions) -> Result<UnifyOutcome> {
        let (selected, total_changes, file_names) = {
            let session = self.session.lock().await;
            let selected: Vec<TermGroup> =
                session.state.selected_groups().into_iter().cloned().collect();
            let file_names: Vec<String> =
                session.state.files.iter().map(|f| f.name.clone()).collect();
            (selected, session.state.total_changes(), file_names)
        };
        if selected.is_empty() {
            return Err(WorkflowError::NothingSelected.into());
        }

        sleep_or_cancel(&self.scope, self.timings.confirm).await?;

        let workspace_id = read_registry(&self.workspaces)?
            .current()
            .map(|w| w.id.clone());

        let mut saved_to_db = false;
        let mut documents_saved = 0;
        match workspace_id {
            Some(id) => {
                if options.save_to_db {
                    let written = self.db.upsert_terms(&id, &selected).await?;
                    log_info!("stored {written} terms for workspace {id}");
                    saved_to_db = true;
                }
                if options.save_documents {
                    documents_saved = self
                        .db
                        .record_unified_documents(&id, &file_names, total_changes as u64)
                        .await?;
                }
                let term_count = self.db.count_terms(&id).await?;
                self.refresh_workspace(&id, term_count, file_names.len() as u64)?;
            }
            None => log_warn!("no workspace selected; unified terms were not stored"),
        }

        let outcome = UnifyOutcome {
            processed_groups: selected.len(),
            total_changes,
            saved_to_db,
            documents_saved,
            groups: selected
                .iter()
                .map(|group| GroupSummary {
                    id: group.id.clone(),
                    name: group.name.clone(),
                    source: group.source,
                    standard: group.standard.clone(),
                    checked_occurrences: group.checked_occurrences(),
                })
                .collect(),
        };

        self.set_step(WorkflowStep::Result).await;
        Ok(outcome)
    }

    fn refresh_workspace(&self, id: &str, term_count: u64, new_documents: u64) -> Result<()> {
        let workspaces = {
            let mut registry = write_registry(&self.workspaces)?;
            let document_count = registry
                .get(id)
                .map(|w| w.document_count)
                .unwrap_or_default()
                + new_documents;
            registry.update(
                id,
                &WorkspacePatch {
                    term_count: Some(term_count),
                    document_count: Some(document_count),
                    last_updated: Some(Utc::now()),
                    ..Default::default()
                },
            );
            registry.list().to_vec()
        };
        emit_event(self.emitter.as_ref(), WORKSPACES_CHANGED, &workspaces);
        Ok(())
    }

    /// Terms stored for the current workspace; empty without a selection.
    pub async fn stored_terms(&self) -> Result<Vec<StoredTerm>> {
        let workspace_id = read_registry(&self.workspaces)?
            .current()
            .map(|w| w.id.clone());
        match workspace_id {
            Some(id) => self.db.list_terms(&id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Drops everything and returns to the first step.
    pub async fn start_new_task(&self) {
        self.cancel_analysis().await;
        self.update(|s| s.state.reset()).await;
        self.set_step(WorkflowStep::Upload).await;
    }

    /// Cancels the run and any pending confirm for good.
    pub async fn close(&self) {
        self.scope.cancel();
        self.cancel_analysis().await;
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        backend::MockBackend,
        events::testing::RecordingEmitter,
        images::ImageUpload,
        models::{AssistantReply, NewWorkspace, TermRecommendation, Workspace},
        unify::state::AnalysisStatus,
        utils::logging::init_test_logging,
        workspace::WorkspaceRegistry,
    };

    struct Fixture {
        controller: UnifyController,
        emitter: Arc<RecordingEmitter>,
        workspaces: SharedWorkspaces,
        db: Database,
    }

    fn fixture_with(backend: Arc<dyn TermBackend>, timings: UnifyTimings) -> Fixture {
        init_test_logging();
        let emitter = Arc::new(RecordingEmitter::default());
        let workspaces = WorkspaceRegistry::shared();
        let db = Database::in_memory().unwrap();
        let controller = UnifyController::new(
            backend,
            db.clone(),
            workspaces.clone(),
            emitter.clone(),
            timings,
        );
        Fixture {
            controller,
            emitter,
            workspaces,
            db,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(MockBackend), UnifyTimings::default())
    }

    fn select_new_workspace(workspaces: &SharedWorkspaces) -> String {
        let mut registry = workspaces.write().unwrap();
        let ws = registry
            .create(NewWorkspace {
                name: "Camera Manual".into(),
                description: None,
            })
            .unwrap();
        registry.select(&ws.id);
        ws.id
    }

    async fn add_two_files(controller: &UnifyController) {
        controller
            .add_files(vec![
                FileInput::new("camera_manual.pdf", 2048),
                FileInput::new("basic_guide.docx", 1024),
            ])
            .await;
    }

    struct FailingBackend;

    #[async_trait]
    impl TermBackend for FailingBackend {
        async fn analyze(&self, _: &[UploadedFile], _: bool) -> Result<Vec<TermGroup>> {
            anyhow::bail!("backend offline")
        }
        async fn generate_guide(&self, _: &ImageUpload) -> Result<String> {
            anyhow::bail!("backend offline")
        }
        async fn search_terms(&self, _: &str) -> Result<Vec<TermRecommendation>> {
            anyhow::bail!("backend offline")
        }
        async fn answer(&self, _: &str, _: Option<&Workspace>) -> Result<AssistantReply> {
            anyhow::bail!("backend offline")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn analyze_without_files_redirects_to_upload() {
        let fx = fixture();
        let landed = fx.controller.navigate(WorkflowStep::Analyze).await.unwrap();
        assert_eq!(landed, WorkflowStep::Upload);
        assert_eq!(fx.controller.step().await, WorkflowStep::Upload);

        let err = fx.controller.start_analysis().await.unwrap_err();
        assert_eq!(workflow_error(&err), Some(&WorkflowError::NoFiles));
    }

    #[tokio::test(start_paused = true)]
    async fn two_files_run_to_review() {
        let fx = fixture();
        fx.controller
            .add_files(vec![
                FileInput::new("a.docx", 1024),
                FileInput::new("b.pdf", 2048),
            ])
            .await;

        let landed = fx.controller.navigate(WorkflowStep::Analyze).await.unwrap();
        assert_eq!(landed, WorkflowStep::Analyze);

        tokio::time::sleep(Duration::from_secs(20)).await;

        let snapshot = fx.controller.snapshot().await;
        assert_eq!(snapshot.step, WorkflowStep::Review);
        assert_eq!(snapshot.state.status, AnalysisStatus::Complete);
        assert_eq!(snapshot.state.progress, 100);
        assert_eq!(snapshot.state.term_groups.len(), 2);
        assert_eq!(snapshot.state.logs[0], "✓ a.docx uploaded");
        assert_eq!(snapshot.state.logs[1], "✓ b.pdf uploaded");
        assert_eq!(snapshot.state.logs.last().unwrap(), "✓ Found 2 term groups");
        assert!(!snapshot.state.logs.iter().any(|l| l.contains("in DB")));

        let names = fx.emitter.names();
        assert!(names.contains(&UNIFY_ANALYSIS_COMPLETE.to_string()));
        let progress: Vec<u64> = fx
            .emitter
            .payloads(UNIFY_STATE_CHANGED)
            .iter()
            .filter_map(|p| p["state"]["progress"].as_u64())
            .collect();
        assert!(progress.windows(2).skip(1).all(|w| w[0] <= w[1]), "{progress:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn db_toggle_adds_store_lookup_logs() {
        let fx = fixture();
        let ws = select_new_workspace(&fx.workspaces);
        fx.db
            .upsert_terms(&ws, &crate::backend::mock::reference_groups())
            .await
            .unwrap();

        add_two_files(&fx.controller).await;
        assert!(fx.controller.toggle_db().await);
        fx.controller.navigate(WorkflowStep::Analyze).await.unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;

        let logs = fx.controller.snapshot().await.state.logs;
        assert!(logs.contains(&"✓ Found 2 existing terms in DB".to_string()));
        assert!(logs
            .iter()
            .any(|l| l == "✓ Automatic matching complete (confidence 100%)"));
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_while_running_is_rejected() {
        let fx = fixture();
        add_two_files(&fx.controller).await;
        fx.controller.start_analysis().await.unwrap();

        let err = fx.controller.start_analysis().await.unwrap_err();
        assert_eq!(workflow_error(&err), Some(&WorkflowError::AnalysisRunning));
        fx.controller.cancel_analysis().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_freezes_state() {
        let fx = fixture();
        add_two_files(&fx.controller).await;
        fx.controller.navigate(WorkflowStep::Analyze).await.unwrap();

        tokio::time::sleep(Duration::from_millis(350)).await;
        fx.controller.navigate(WorkflowStep::Upload).await.unwrap();

        let frozen = fx.controller.snapshot().await;
        assert_eq!(frozen.state.logs, vec!["✓ camera_manual.pdf uploaded".to_string()]);
        assert_eq!(frozen.state.progress, 10);
        assert_eq!(frozen.state.status, AnalysisStatus::Analyzing);
        assert!(!fx.controller.is_analysis_running().await);

        tokio::time::sleep(Duration::from_secs(20)).await;
        let later = fx.controller.snapshot().await;
        assert_eq!(later.state, frozen.state);
        assert_eq!(later.step, WorkflowStep::Upload);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_cancel_runs_fresh() {
        let fx = fixture();
        add_two_files(&fx.controller).await;
        fx.controller.navigate(WorkflowStep::Analyze).await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        fx.controller.navigate(WorkflowStep::Upload).await.unwrap();

        fx.controller.navigate(WorkflowStep::Analyze).await.unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;

        let state = fx.controller.snapshot().await.state;
        let uploads = state.logs.iter().filter(|l| l.ends_with("uploaded")).count();
        assert_eq!(uploads, 2);
        assert_eq!(state.status, AnalysisStatus::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_failure_returns_to_idle() {
        let fx = fixture_with(Arc::new(FailingBackend), UnifyTimings::instant());
        add_two_files(&fx.controller).await;
        fx.controller.start_analysis().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let state = fx.controller.snapshot().await.state;
        assert_eq!(state.status, AnalysisStatus::Idle);
        assert_eq!(
            state.logs.last().unwrap(),
            "✗ Analysis failed: backend offline"
        );
        assert!(state.term_groups.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_requires_a_selection() {
        let fx = fixture_with(Arc::new(MockBackend), UnifyTimings::instant());
        let err = fx
            .controller
            .confirm(ConfirmOptions::default())
            .await
            .unwrap_err();
        assert_eq!(workflow_error(&err), Some(&WorkflowError::NothingSelected));
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_skips_unchecked_groups_and_updates_workspace() {
        let fx = fixture();
        let ws = select_new_workspace(&fx.workspaces);
        add_two_files(&fx.controller).await;
        fx.controller.navigate(WorkflowStep::Analyze).await.unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;

        fx.controller.toggle_group("2").await;
        fx.controller.navigate(WorkflowStep::Confirm).await.unwrap();
        let outcome = fx
            .controller
            .confirm(ConfirmOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.processed_groups, 1);
        assert_eq!(outcome.total_changes, 2);
        assert!(outcome.saved_to_db);
        assert_eq!(outcome.documents_saved, 2);
        assert_eq!(outcome.groups[0].name, "Shutter vs shutter button");
        assert_eq!(fx.controller.step().await, WorkflowStep::Result);

        let stored = fx.controller.stored_terms().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].term, "Shutter button");

        let registry = fx.workspaces.read().unwrap();
        let updated = registry.get(&ws).unwrap();
        assert_eq!(updated.term_count, 1);
        assert_eq!(updated.document_count, 2);
        drop(registry);
        assert!(fx.emitter.names().contains(&WORKSPACES_CHANGED.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_can_skip_storage() {
        let fx = fixture_with(Arc::new(MockBackend), UnifyTimings::instant());
        let ws = select_new_workspace(&fx.workspaces);
        add_two_files(&fx.controller).await;
        fx.controller.add_manual_group(crate::backend::mock::reference_groups().remove(1)).await;

        let outcome = fx
            .controller
            .confirm(ConfirmOptions {
                save_to_db: false,
                save_documents: false,
            })
            .await
            .unwrap();

        assert!(!outcome.saved_to_db);
        assert_eq!(outcome.documents_saved, 0);
        assert_eq!(fx.db.count_terms(&ws).await.unwrap(), 0);
        assert_eq!(fx.db.count_unified_documents(&ws).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn start_new_task_resets_everything() {
        let fx = fixture();
        add_two_files(&fx.controller).await;
        fx.controller.toggle_db().await;
        fx.controller.navigate(WorkflowStep::Analyze).await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;

        fx.controller.start_new_task().await;
        let snapshot = fx.controller.snapshot().await;
        assert_eq!(snapshot.step, WorkflowStep::Upload);
        assert!(snapshot.state.files.is_empty());
        assert!(snapshot.state.logs.is_empty());
        assert!(!snapshot.state.db_enabled);
        assert_eq!(snapshot.state.progress, 0);
        assert_eq!(snapshot.state.status, AnalysisStatus::Idle);
        assert!(!fx.controller.is_analysis_running().await);
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_pending_confirm() {
        let fx = fixture();
        fx.controller
            .add_manual_group(crate::backend::mock::reference_groups().remove(0))
            .await;

        let controller = fx.controller.clone();
        let pending =
            tokio::spawn(async move { controller.confirm(ConfirmOptions::default()).await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        fx.controller.close().await;

        let err = pending.await.unwrap().unwrap_err();
        assert_eq!(workflow_error(&err), Some(&WorkflowError::Cancelled));
        assert_eq!(fx.controller.step().await, WorkflowStep::Upload);
    }
}
