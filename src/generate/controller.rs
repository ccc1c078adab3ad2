use std::{
    sync::{Arc, Mutex as StdMutex, RwLock},
    time::Duration,
};

use anyhow::{anyhow, Result};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::state::GenerateState;
use crate::{
    backend::TermBackend,
    error::WorkflowError,
    events::{emit_event, EventEmitter, CHAT_MESSAGE_ADDED, GENERATE_STATE_CHANGED},
    images::ImageUpload,
    models::{ChatMessage, GenerateTab, GuideStatus, TermRecommendation, Workspace},
    settings::PipelineSettings,
    utils::timing::{scaled_ms, sleep_or_cancel},
    workspace::{read_registry, SharedWorkspaces},
};
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

/// Query issued after scanning a screenshot for terms.
const IMAGE_QUERY: &str = "UI-related terms";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateTimings {
    pub guide_analyze: Duration,
    pub guide_generate: Duration,
    pub search: Duration,
    pub image_scan: Duration,
    pub chat_reply: Duration,
}

impl GenerateTimings {
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        let scale = settings.delay_scale;
        Self {
            guide_analyze: scaled_ms(2000, scale),
            guide_generate: scaled_ms(2000, scale),
            search: scaled_ms(500, scale),
            image_scan: scaled_ms(2000, scale),
            chat_reply: scaled_ms(1500, scale),
        }
    }

    pub fn instant() -> Self {
        Self::from_settings(&PipelineSettings {
            delay_scale: 0.0,
            ..Default::default()
        })
    }
}

impl Default for GenerateTimings {
    fn default() -> Self {
        Self::from_settings(&PipelineSettings::default())
    }
}

/// Drives guide generation, term search and chat. Every call runs on a
/// child of the controller's scope token; `reset` and `close` cancel it.
/// A call only touches state while its token is live, checked under the
/// state lock, so whoever cancels owns the cleanup.
#[derive(Clone)]
pub struct GenerateController {
    state: Arc<Mutex<GenerateState>>,
    backend: Arc<dyn TermBackend>,
    workspaces: SharedWorkspaces,
    emitter: Arc<dyn EventEmitter>,
    timings: GenerateTimings,
    scope: Arc<RwLock<CancellationToken>>,
    /// Token of the guide run in flight, replaced whenever the image changes.
    guide_run: Arc<StdMutex<Option<CancellationToken>>>,
}

impl GenerateController {
    pub fn new(
        backend: Arc<dyn TermBackend>,
        workspaces: SharedWorkspaces,
        emitter: Arc<dyn EventEmitter>,
        timings: GenerateTimings,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(GenerateState::new())),
            backend,
            workspaces,
            emitter,
            timings,
            scope: Arc::new(RwLock::new(CancellationToken::new())),
            guide_run: Arc::new(StdMutex::new(None)),
        }
    }

    pub async fn get_state(&self) -> GenerateState {
        self.state.lock().await.clone()
    }

    fn child_token(&self) -> Result<CancellationToken> {
        let scope = self
            .scope
            .read()
            .map_err(|_| anyhow!("generate scope lock poisoned"))?;
        Ok(scope.child_token())
    }

    async fn update<R>(&self, f: impl FnOnce(&mut GenerateState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.lock().await;
            let result = f(&mut state);
            (result, state.clone())
        };
        emit_event(self.emitter.as_ref(), GENERATE_STATE_CHANGED, &snapshot);
        result
    }

    /// Applies `f` unless `token` already fired, checked under the lock.
    async fn update_unless_cancelled<R>(
        &self,
        token: &CancellationToken,
        f: impl FnOnce(&mut GenerateState) -> R,
    ) -> Result<R> {
        let (result, snapshot) = {
            let mut state = self.state.lock().await;
            if token.is_cancelled() {
                return Err(WorkflowError::Cancelled.into());
            }
            let result = f(&mut state);
            (result, state.clone())
        };
        emit_event(self.emitter.as_ref(), GENERATE_STATE_CHANGED, &snapshot);
        Ok(result)
    }

    pub async fn set_tab(&self, tab: GenerateTab) {
        self.update(|s| s.set_tab(tab)).await
    }

    /// Swaps the guide image. A guide run for the previous image is
    /// cancelled before its status is reset.
    pub async fn set_guide_image(&self, image: Option<ImageUpload>) -> Result<()> {
        self.update(|s| -> Result<()> {
            self.replace_guide_run(None)?;
            s.set_guide_image(image);
            Ok(())
        })
        .await
    }

    /// Cancels the tracked guide run and tracks `next` instead. Callers hold
    /// the state lock.
    fn replace_guide_run(&self, next: Option<CancellationToken>) -> Result<()> {
        let mut run = self
            .guide_run
            .lock()
            .map_err(|_| anyhow!("guide run lock poisoned"))?;
        if let Some(previous) = run.take() {
            previous.cancel();
        }
        *run = next;
        Ok(())
    }

    pub async fn toggle_term(&self, id: &str) {
        self.update(|s| s.toggle_term(id)).await
    }

    pub async fn export_selected(&self) -> String {
        self.state.lock().await.export_selected()
    }

    pub async fn clear_chat(&self) {
        self.update(|s| s.clear_chat()).await
    }

    /// Writes a usage guide for the uploaded screenshot.
    pub async fn generate_guide(&self) -> Result<String> {
        let token = self.child_token()?;
        let image = self
            .update_unless_cancelled(&token, |s| -> Result<ImageUpload> {
                if s.guide_status.is_busy() {
                    return Err(WorkflowError::GuideBusy.into());
                }
                let image = s
                    .guide_image
                    .clone()
                    .ok_or(WorkflowError::MissingGuideImage)?;
                self.replace_guide_run(Some(token.clone()))?;
                s.guide_status = GuideStatus::Analyzing;
                s.guide_text.clear();
                Ok(image)
            })
            .await??;

        let result = self.drive_guide(&token, &image).await;
        if let Err(err) = &result {
            log_warn!("guide generation ended early: {err}");
            // Fails once cancelled; the canceller has already reset the status.
            let _ = self
                .update_unless_cancelled(&token, |s| s.guide_status = GuideStatus::Idle)
                .await;
        }
        result
    }

    async fn drive_guide(&self, token: &CancellationToken, image: &ImageUpload) -> Result<String> {
        sleep_or_cancel(token, self.timings.guide_analyze).await?;
        self.update_unless_cancelled(token, |s| s.guide_status = GuideStatus::Generating)
            .await?;
        sleep_or_cancel(token, self.timings.guide_generate).await?;

        let text = tokio::select! {
            result = self.backend.generate_guide(image) => result?,
            _ = token.cancelled() => return Err(WorkflowError::Cancelled.into()),
        };
        log_info!("guide generated for {} ({} chars)", image.name, text.len());

        self.update_unless_cancelled(token, |s| {
            s.guide_status = GuideStatus::Complete;
            s.guide_text = text.clone();
        })
        .await?;
        Ok(text)
    }

    /// Replaces the recommendations with results for `query`. A blank
    /// query leaves everything as it is.
    pub async fn search_terms(&self, query: &str) -> Result<Vec<TermRecommendation>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(self.state.lock().await.term_recommendations.clone());
        }
        let token = self.child_token()?;
        self.update_unless_cancelled(&token, |s| {
            s.search_query = query.to_string();
            s.is_searching = true;
        })
        .await?;

        let result = self.drive_search(&token, query, self.timings.search).await;
        self.finish_search(&token, &result).await;
        result
    }

    /// Scans a screenshot, then searches for the terms it suggests.
    pub async fn recommend_from_image(
        &self,
        image: ImageUpload,
    ) -> Result<Vec<TermRecommendation>> {
        let token = self.child_token()?;
        log_info!("scanning {} for term recommendations", image.name);
        self.update_unless_cancelled(&token, |s| {
            s.search_query = IMAGE_QUERY.to_string();
            s.is_searching = true;
        })
        .await?;

        let delay = self.timings.image_scan + self.timings.search;
        let result = self.drive_search(&token, IMAGE_QUERY, delay).await;
        self.finish_search(&token, &result).await;
        result
    }

    async fn drive_search(
        &self,
        token: &CancellationToken,
        query: &str,
        delay: Duration,
    ) -> Result<Vec<TermRecommendation>> {
        sleep_or_cancel(token, delay).await?;
        let recommendations = tokio::select! {
            result = self.backend.search_terms(query) => result?,
            _ = token.cancelled() => return Err(WorkflowError::Cancelled.into()),
        };
        self.update_unless_cancelled(token, |s| {
            s.term_recommendations = recommendations.clone();
            s.is_searching = false;
        })
        .await?;
        Ok(recommendations)
    }

    async fn finish_search(
        &self,
        token: &CancellationToken,
        result: &Result<Vec<TermRecommendation>>,
    ) {
        if let Err(err) = result {
            log_warn!("term search ended early: {err}");
            let _ = self
                .update_unless_cancelled(token, |s| s.is_searching = false)
                .await;
        }
    }

    /// Appends the user's message, waits for the backend and appends one
    /// assistant reply. Only one exchange may be pending at a time.
    pub async fn send_message(&self, text: &str) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(WorkflowError::EmptyMessage.into());
        }
        let token = self.child_token()?;
        let workspace = read_registry(&self.workspaces)?.current().cloned();

        let question = self
            .update_unless_cancelled(&token, |s| -> Result<ChatMessage> {
                if s.is_loading {
                    return Err(WorkflowError::ChatBusy.into());
                }
                let message = ChatMessage::user(text);
                s.messages.push(message.clone());
                s.is_loading = true;
                Ok(message)
            })
            .await??;
        emit_event(self.emitter.as_ref(), CHAT_MESSAGE_ADDED, &question);

        let result = self.drive_reply(&token, text, workspace.as_ref()).await;
        match result {
            Ok(answer) => {
                emit_event(self.emitter.as_ref(), CHAT_MESSAGE_ADDED, &answer);
                Ok(answer)
            }
            Err(err) => {
                log_warn!("chat reply abandoned: {err}");
                let _ = self
                    .update_unless_cancelled(&token, |s| s.is_loading = false)
                    .await;
                Err(err)
            }
        }
    }

    async fn drive_reply(
        &self,
        token: &CancellationToken,
        text: &str,
        workspace: Option<&Workspace>,
    ) -> Result<ChatMessage> {
        sleep_or_cancel(token, self.timings.chat_reply).await?;
        let reply = tokio::select! {
            result = self.backend.answer(text, workspace) => result?,
            _ = token.cancelled() => return Err(WorkflowError::Cancelled.into()),
        };
        self.update_unless_cancelled(token, |s| {
            let message = ChatMessage::assistant(reply);
            s.messages.push(message.clone());
            s.is_loading = false;
            message
        })
        .await
    }

    /// Cancels whatever is in flight and restores the initial state. Calls
    /// still unwinding cannot write afterwards: their token is already
    /// cancelled when the reset takes the state lock.
    pub async fn reset(&self) -> Result<()> {
        {
            let mut scope = self
                .scope
                .write()
                .map_err(|_| anyhow!("generate scope lock poisoned"))?;
            scope.cancel();
            *scope = CancellationToken::new();
        }
        self.update(|s| s.reset()).await;
        Ok(())
    }

    /// Cancels every in-flight sequence and clears their busy flags; later
    /// calls fail with `Cancelled`.
    pub async fn close(&self) -> Result<()> {
        self.scope
            .read()
            .map_err(|_| anyhow!("generate scope lock poisoned"))?
            .cancel();
        self.update(|s| {
            s.is_loading = false;
            s.is_searching = false;
            if s.guide_status.is_busy() {
                s.guide_status = GuideStatus::Idle;
            }
        })
        .await;
        Ok(())
    }
}
