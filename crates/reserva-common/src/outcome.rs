use serde::{Deserialize, Serialize};

/// Result of a resilient action primitive.
///
/// Primitives never raise for "element not there" conditions; the calling step
/// decides whether the outcome is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The strategy at index `strategy` (0 = primary) satisfied the action.
    Success { strategy: usize },
    /// Every strategy was tried and none located a usable element.
    NotFound,
    /// A wait ran out of budget.
    Timeout,
    /// A native dialog interrupted the action.
    UnexpectedPopup { text: String },
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success { .. })
    }
}
