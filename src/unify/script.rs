use std::time::Duration;

use crate::{models::UploadedFile, settings::PipelineSettings, utils::timing::scaled_ms};

const UPLOAD_LABEL: &str = "Uploading files...";
const DB_LABEL: &str = "Matching existing DB terms...";
const AI_LABEL: &str = "Analyzing documents...";
const RESULTS_LABEL: &str = "Organizing results...";

/// Cosmetic pacing of the analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTimings {
    pub per_file: Duration,
    pub upload_settle: Duration,
    pub db_lookup: Duration,
    pub db_match: Duration,
    pub ai_warmup: Duration,
    pub text_extracted: Duration,
    pub candidates: Duration,
    pub grouping: Duration,
    pub clustering: Duration,
    pub confidence: Duration,
    pub results: Duration,
    pub handoff: Duration,
}

impl AnalysisTimings {
    pub fn scaled(scale: f64) -> Self {
        Self {
            per_file: scaled_ms(300, scale),
            upload_settle: scaled_ms(500, scale),
            db_lookup: scaled_ms(800, scale),
            db_match: scaled_ms(500, scale),
            ai_warmup: scaled_ms(500, scale),
            text_extracted: scaled_ms(1000, scale),
            candidates: scaled_ms(1000, scale),
            grouping: scaled_ms(1200, scale),
            clustering: scaled_ms(1000, scale),
            confidence: scaled_ms(800, scale),
            results: scaled_ms(500, scale),
            handoff: scaled_ms(1000, scale),
        }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::scaled(settings.delay_scale)
    }

    pub fn instant() -> Self {
        Self::scaled(0.0)
    }
}

impl Default for AnalysisTimings {
    fn default() -> Self {
        Self::scaled(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStep {
    Set(u8),
    /// Adds `step`, never going past `cap`.
    Ramp { step: u8, cap: u8 },
    Keep,
}

impl ProgressStep {
    pub fn apply(&self, current: u8) -> u8 {
        match *self {
            ProgressStep::Set(value) => value,
            ProgressStep::Ramp { step, cap } => current.saturating_add(step).min(cap),
            ProgressStep::Keep => current,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPhase {
    pub delay: Duration,
    pub label: Option<&'static str>,
    pub log: Option<String>,
    pub progress: ProgressStep,
}

impl ScriptPhase {
    fn new(delay: Duration, label: &'static str, progress: ProgressStep) -> Self {
        Self {
            delay,
            label: Some(label),
            log: None,
            progress,
        }
    }

    fn with_log(mut self, line: impl Into<String>) -> Self {
        self.log = Some(line.into());
        self
    }
}

/// Phases that run before the backend is asked for groups. The closing
/// phase depends on the result and comes from [`AnalysisScript::results_phase`].
#[derive(Debug, Clone)]
pub struct AnalysisScript {
    phases: Vec<ScriptPhase>,
}

impl AnalysisScript {
    pub fn build(
        files: &[UploadedFile],
        db_enabled: bool,
        known_terms: u64,
        timings: &AnalysisTimings,
    ) -> Self {
        let mut phases = Vec::with_capacity(files.len() + 9);

        for file in files {
            phases.push(
                ScriptPhase::new(
                    timings.per_file,
                    UPLOAD_LABEL,
                    ProgressStep::Ramp { step: 10, cap: 15 },
                )
                .with_log(format!("✓ {} uploaded", file.name)),
            );
        }
        phases.push(ScriptPhase::new(
            timings.upload_settle,
            UPLOAD_LABEL,
            ProgressStep::Set(20),
        ));

        if db_enabled {
            phases.push(
                ScriptPhase::new(timings.db_lookup, DB_LABEL, ProgressStep::Keep)
                    .with_log(format!("✓ Found {known_terms} existing terms in DB")),
            );
            phases.push(
                ScriptPhase::new(timings.db_match, DB_LABEL, ProgressStep::Set(40))
                    .with_log("✓ Automatic matching complete (confidence 100%)"),
            );
        }

        phases.push(ScriptPhase::new(timings.ai_warmup, AI_LABEL, ProgressStep::Keep));
        for (delay, line, progress) in [
            (timings.text_extracted, "✓ Document text extracted", 50),
            (timings.candidates, "✓ Extracting term candidates", 60),
            (timings.grouping, "✓ Context-based grouping", 75),
            (timings.clustering, "✓ Clustering similar terms", 85),
        ] {
            phases.push(
                ScriptPhase::new(delay, AI_LABEL, ProgressStep::Set(progress)).with_log(line),
            );
        }

        phases.push(
            ScriptPhase::new(timings.confidence, RESULTS_LABEL, ProgressStep::Set(95))
                .with_log("✓ Confidence computed"),
        );

        Self { phases }
    }

    pub fn phases(&self) -> &[ScriptPhase] {
        &self.phases
    }

    pub fn results_phase(group_count: usize, timings: &AnalysisTimings) -> ScriptPhase {
        ScriptPhase::new(timings.results, RESULTS_LABEL, ProgressStep::Set(100))
            .with_log(format!("✓ Found {group_count} term groups"))
    }
}
