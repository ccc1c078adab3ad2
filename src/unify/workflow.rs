use serde::{Deserialize, Serialize};

pub const TOTAL_STEPS: u8 = 5;

/// The five screens of the unify flow, in order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowStep {
    #[default]
    Upload,
    Analyze,
    Review,
    Confirm,
    Result,
}

impl WorkflowStep {
    const ORDER: [WorkflowStep; TOTAL_STEPS as usize] = [
        WorkflowStep::Upload,
        WorkflowStep::Analyze,
        WorkflowStep::Review,
        WorkflowStep::Confirm,
        WorkflowStep::Result,
    ];

    /// 1-based position shown in the step indicator.
    pub fn number(&self) -> u8 {
        match self {
            WorkflowStep::Upload => 1,
            WorkflowStep::Analyze => 2,
            WorkflowStep::Review => 3,
            WorkflowStep::Confirm => 4,
            WorkflowStep::Result => 5,
        }
    }

    pub fn next(&self) -> WorkflowStep {
        let idx = (self.number() as usize).min(Self::ORDER.len() - 1);
        Self::ORDER[idx]
    }

    pub fn previous(&self) -> WorkflowStep {
        let idx = (self.number() as usize).saturating_sub(2);
        Self::ORDER[idx]
    }
}

/// Payload of `unify-step-changed`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepInfo {
    pub step: WorkflowStep,
    pub number: u8,
    pub total_steps: u8,
}

impl From<WorkflowStep> for StepInfo {
    fn from(step: WorkflowStep) -> Self {
        Self {
            step,
            number: step.number(),
            total_steps: TOTAL_STEPS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_follow_order() {
        for (idx, step) in WorkflowStep::ORDER.iter().enumerate() {
            assert_eq!(step.number() as usize, idx + 1);
        }
    }

    #[test]
    fn next_and_previous_saturate() {
        assert_eq!(WorkflowStep::Upload.next(), WorkflowStep::Analyze);
        assert_eq!(WorkflowStep::Confirm.next(), WorkflowStep::Result);
        assert_eq!(WorkflowStep::Result.next(), WorkflowStep::Result);

        assert_eq!(WorkflowStep::Review.previous(), WorkflowStep::Analyze);
        assert_eq!(WorkflowStep::Upload.previous(), WorkflowStep::Upload);
    }

    #[test]
    fn step_info_serializes_camel_case() {
        let value = serde_json::to_value(StepInfo::from(WorkflowStep::Review)).unwrap();
        assert_eq!(value["step"], "review");
        assert_eq!(value["number"], 3);
        assert_eq!(value["totalSteps"], 5);
    }
}
