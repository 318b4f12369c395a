//! Pledge status state machine
//!
//! ```text
//! pending --assign_backer--> pending     (only while it has no backer)
//! pending --confirm--------> completed   (requires a backer)
//! completed is terminal
//! ```

use crowdfund_common::StateError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "pledge_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PledgeStatus {
    Pending,
    Completed,
}

impl PledgeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for PledgeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Events that move a pledge through the backing workflow
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PledgeEvent {
    /// The visitor authenticated and became (or was found as) a backer
    AssignBacker,
    /// The payment provider returned the visitor to the thank-you step
    Confirm,
}

impl std::fmt::Display for PledgeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssignBacker => write!(f, "assign_backer"),
            Self::Confirm => write!(f, "confirm"),
        }
    }
}

/// Guard context for pledge transitions
#[derive(Debug, Clone)]
pub struct PledgeGuardContext {
    pub has_backer: bool,
}

pub struct PledgeStateMachine;

impl PledgeStateMachine {
    /// Attempt a state transition with guard conditions
    pub fn transition(
        current: PledgeStatus,
        event: PledgeEvent,
        context: Option<&PledgeGuardContext>,
    ) -> Result<PledgeStatus, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        match (current, event) {
            (PledgeStatus::Pending, PledgeEvent::AssignBacker) => {
                if context.is_some_and(|ctx| ctx.has_backer) {
                    return Err(StateError::GuardFailed(
                        "Pledge already belongs to another backer".to_string(),
                    ));
                }
                Ok(PledgeStatus::Pending)
            }
            (PledgeStatus::Pending, PledgeEvent::Confirm) => {
                if !context.is_some_and(|ctx| ctx.has_backer) {
                    return Err(StateError::GuardFailed(
                        "Cannot confirm a pledge without a backer".to_string(),
                    ));
                }
                Ok(PledgeStatus::Completed)
            }
            (from, event) => Err(StateError::InvalidTransition {
                from: from.to_string(),
                event: event.to_string(),
            }),
        }
    }

    /// Check if a transition is valid without guards
    pub fn can_transition(current: PledgeStatus, event: PledgeEvent) -> bool {
        matches!(
            (current, event),
            (PledgeStatus::Pending, PledgeEvent::AssignBacker)
                | (PledgeStatus::Pending, PledgeEvent::Confirm)
        )
    }
}
