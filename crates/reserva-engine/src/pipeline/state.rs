use crate::error::StepError;
use serde::Serialize;

/// Position of a run in the reservation wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    LoggingIn,
    Navigating,
    SelectingDay,
    SelectingTime,
    AdvancingStage,
    FillingForm,
    Submitted,
    Failed,
}

impl PipelineState {
    /// The forward path, `Failed` excluded.
    pub const ORDER: [PipelineState; 8] = [
        PipelineState::Idle,
        PipelineState::LoggingIn,
        PipelineState::Navigating,
        PipelineState::SelectingDay,
        PipelineState::SelectingTime,
        PipelineState::AdvancingStage,
        PipelineState::FillingForm,
        PipelineState::Submitted,
    ];

    fn position(self) -> Option<usize> {
        Self::ORDER.iter().position(|s| *s == self)
    }

    /// The state that follows on success.
    pub fn next(self) -> Option<PipelineState> {
        self.position().and_then(|i| Self::ORDER.get(i + 1).copied())
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Submitted | PipelineState::Failed)
    }

    pub fn can_transition_to(self, to: PipelineState) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == PipelineState::Failed || self.next() == Some(to)
    }
}

/// The single live state of one run, plus the path it took.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: PipelineState,
    history: Vec<PipelineState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: PipelineState::Idle,
            history: vec![PipelineState::Idle],
        }
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn transition(&mut self, to: PipelineState) -> Result<(), StepError> {
        if !self.current.can_transition_to(to) {
            return Err(StepError::InvalidTransition {
                from: self.current,
                to,
            });
        }
        self.current = to;
        self.history.push(to);
        Ok(())
    }

    /// Move to `Failed`. No-op once terminal.
    pub fn fail(&mut self) {
        if !self.current.is_terminal() {
            self.current = PipelineState::Failed;
            self.history.push(PipelineState::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        let mut machine = StateMachine::new();
        machine.transition(PipelineState::LoggingIn).unwrap();
        assert!(machine.transition(PipelineState::SelectingDay).is_err());
        assert!(machine.transition(PipelineState::Idle).is_err());
        machine.transition(PipelineState::Navigating).unwrap();
        assert_eq!(machine.current(), PipelineState::Navigating);
    }

    #[test]
    fn test_failed_is_terminal_and_reachable() {
        for state in PipelineState::ORDER.iter().take(7) {
            assert!(state.can_transition_to(PipelineState::Failed));
        }
        let mut machine = StateMachine::new();
        machine.transition(PipelineState::LoggingIn).unwrap();
        machine.fail();
        machine.fail();
        assert_eq!(
            machine.history(),
            &[
                PipelineState::Idle,
                PipelineState::LoggingIn,
                PipelineState::Failed
            ]
        );
        assert!(machine.transition(PipelineState::Navigating).is_err());
    }

    #[test]
    fn test_submitted_is_terminal() {
        assert!(PipelineState::Submitted.is_terminal());
        assert_eq!(PipelineState::Submitted.next(), None);
        assert!(!PipelineState::Submitted.can_transition_to(PipelineState::Failed));
    }
}
