use crate::foundation::{Result, TapeError};
use std::fmt;

/// Lifecycle of the block collector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectorState {
    Running,
    Completed,
    Aborted,
}

impl CollectorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CollectorState::Completed | CollectorState::Aborted)
    }

    pub fn can_transition_to(&self, next: CollectorState) -> bool {
        matches!((self, next), (CollectorState::Running, CollectorState::Completed) | (CollectorState::Running, CollectorState::Aborted))
    }

    pub fn transition(&mut self, next: CollectorState) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(TapeError::InvalidStateTransition { from: self.to_string(), to: next.to_string() });
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for CollectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectorState::Running => "running",
            CollectorState::Completed => "completed",
            CollectorState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}
