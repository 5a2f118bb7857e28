//! Run lifecycle state machine.

use guidecraft_shared::{GuideError, Phase, Result};

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Discovering,
    Scraping,
    Synthesizing,
    Complete,
    Error,
}

impl RunState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Complete | Error, _) => false,
            (_, Error) => true,
            (Idle, Discovering)
            | (Discovering, Scraping)
            | (Scraping, Synthesizing)
            | (Synthesizing, Complete) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    /// The wire phase for this state. `Idle` has none.
    pub fn phase(self) -> Option<Phase> {
        match self {
            Self::Idle => None,
            Self::Discovering => Some(Phase::Discovering),
            Self::Scraping => Some(Phase::Scraping),
            Self::Synthesizing => Some(Phase::Synthesizing),
            Self::Complete => Some(Phase::Complete),
            Self::Error => Some(Phase::Error),
        }
    }
}

/// Tracks one run's state and rejects illegal transitions.
#[derive(Debug)]
pub struct PhaseTracker {
    state: RunState,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Move to `next`, returning its wire phase.
    pub fn advance(&mut self, next: RunState) -> Result<Phase> {
        let illegal = || GuideError::Transition {
            from: format!("{:?}", self.state),
            to: format!("{next:?}"),
        };
        if !self.state.can_advance_to(next) {
            return Err(illegal());
        }
        let phase = next.phase().ok_or_else(illegal)?;
        self.state = next;
        Ok(phase)
    }
}
