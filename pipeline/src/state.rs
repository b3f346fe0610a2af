use tracing::debug;

use crate::error::StageError;

/// Progress of a single query through the pipeline.
///
/// ```text
/// Idle -> Staged -> FeaturesReady -> EmbeddingReady -> Matched -> Done
///   \________\___________\________________\______________\-> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Staged,
    FeaturesReady,
    EmbeddingReady,
    Matched,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// Reports whether `self -> to` is a legal step.
    pub fn can_transition(self, to: PipelineState) -> bool {
        use PipelineState::*;
        match (self, to) {
            (from, Failed) => !from.is_terminal(),
            (Idle, Staged)
            | (Staged, FeaturesReady)
            | (FeaturesReady, EmbeddingReady)
            | (EmbeddingReady, Matched)
            | (Matched, Done) => true,
            _ => false,
        }
    }
}

/// Enforces legal transitions for one run.
#[derive(Debug)]
pub(crate) struct StateMachine {
    state: PipelineState,
}

impl StateMachine {
    pub(crate) fn new() -> Self {
        Self {
            state: PipelineState::Idle,
        }
    }

    pub(crate) fn state(&self) -> PipelineState {
        self.state
    }

    pub(crate) fn advance(&mut self, to: PipelineState) -> Result<(), StageError> {
        if !self.state.can_transition(to) {
            return Err(StageError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!(from = ?self.state, to = ?to, "pipeline: state transition");
        self.state = to;
        Ok(())
    }

    /// Moves to `Failed` unless the run already finished.
    pub(crate) fn fail(&mut self) {
        if !self.state.is_terminal() {
            debug!(from = ?self.state, "pipeline: run failed");
            self.state = PipelineState::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use PipelineState::*;

    #[test]
    fn happy_path() {
        let mut sm = StateMachine::new();
        for to in [Staged, FeaturesReady, EmbeddingReady, Matched, Done] {
            sm.advance(to).unwrap();
        }
        assert_eq!(sm.state(), Done);
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let mut sm = StateMachine::new();
        sm.advance(Staged).unwrap();
        let err = sm.advance(EmbeddingReady).unwrap_err();
        assert!(matches!(
            err,
            StageError::InvalidTransition { from: Staged, to: EmbeddingReady }
        ));
        assert_eq!(sm.state(), Staged);
    }

    #[test]
    fn failed_reachable_from_every_non_terminal_state() {
        for s in [Idle, Staged, FeaturesReady, EmbeddingReady, Matched] {
            assert!(s.can_transition(Failed), "{s:?}");
        }
        assert!(!Done.can_transition(Failed));
        assert!(!Failed.can_transition(Failed));
        assert!(!Failed.can_transition(Staged));
    }

    #[test]
    fn fail_is_sticky_and_spares_done() {
        let mut sm = StateMachine::new();
        sm.advance(Staged).unwrap();
        sm.fail();
        assert_eq!(sm.state(), Failed);
        assert!(sm.advance(FeaturesReady).is_err());

        let mut done = StateMachine::new();
        for to in [Staged, FeaturesReady, EmbeddingReady, Matched, Done] {
            done.advance(to).unwrap();
        }
        done.fail();
        assert_eq!(done.state(), Done);
    }

    #[test]
    fn no_going_back() {
        assert!(!FeaturesReady.can_transition(Staged));
        assert!(!Done.can_transition(Idle));
        assert!(!Idle.can_transition(Idle));
    }
}
