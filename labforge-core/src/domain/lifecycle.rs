// labforge-core/src/domain/lifecycle.rs

use serde::Serialize;
use std::fmt;

use crate::domain::error::DomainError;

/// Lifecycle of a named resource slot as seen by the reconciler.
///
/// `Absent -> Creating -> Live -> Deleting -> Absent` repeats on every
/// reconcile. Pools never update in place; policies may go `Live -> Live`.
/// `Error` is terminal: the caller re-runs the whole reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotState {
    Absent,
    Creating,
    Live,
    Deleting,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotEvent {
    BeginCreate,
    Created,
    Updated,
    BeginDelete,
    Deleted,
    Failed,
}

impl SlotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "ABSENT",
            Self::Creating => "CREATING",
            Self::Live => "LIVE",
            Self::Deleting => "DELETING",
            Self::Error => "ERROR",
        }
    }

    /// Next state, or `None` when the event is not allowed from here.
    pub fn next(self, event: SlotEvent) -> Option<SlotState> {
        use SlotEvent::*;
        use SlotState::*;

        match (self, event) {
            (Absent, BeginCreate) => Some(Creating),
            (Creating, Created) => Some(Live),
            (Creating, Failed) => Some(Error),
            (Live, Updated) => Some(Live),
            (Live, BeginDelete) => Some(Deleting),
            (Deleting, Deleted) => Some(Absent),
            (Deleting, Failed) => Some(Error),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for SlotEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BeginCreate => "begin_create",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::BeginDelete => "begin_delete",
            Self::Deleted => "deleted",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Ordered record of the states one slot went through during a reconcile.
#[derive(Debug, Clone, Serialize)]
pub struct SlotTrace {
    slot: String,
    states: Vec<SlotState>,
}

impl SlotTrace {
    pub fn new(slot: impl Into<String>, initial: SlotState) -> Self {
        Self {
            slot: slot.into(),
            states: vec![initial],
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn current(&self) -> SlotState {
        // states is never empty: new() seeds it
        self.states.last().copied().unwrap_or(SlotState::Absent)
    }

    pub fn states(&self) -> &[SlotState] {
        &self.states
    }

    pub fn apply(&mut self, event: SlotEvent) -> Result<SlotState, DomainError> {
        let from = self.current();
        let to = from
            .next(event)
            .ok_or_else(|| DomainError::InvalidTransition {
                slot: self.slot.clone(),
                from,
                event,
            })?;
        self.states.push(to);
        Ok(to)
    }

    /// Renders the path as `LIVE -> DELETING -> ABSENT`.
    pub fn path(&self) -> String {
        self.states
            .iter()
            .map(SlotState::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
