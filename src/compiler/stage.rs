use crate::error::{CompileError, Stage};
use std::fmt;
use tracing::debug;

/// Where a compilation is in its pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileState {
    Created,
    SchemaValidated,
    GraphValidated,
    Ordered { node_count: usize },
    Compiling { index: usize, total: usize, node_id: String },
    Compiled { call_count: usize },
    Failed { stage: Stage },
}

impl fmt::Display for CompileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileState::Created => write!(f, "created"),
            CompileState::SchemaValidated => write!(f, "schema validated"),
            CompileState::GraphValidated => write!(f, "graph validated"),
            CompileState::Ordered { node_count } => write!(f, "ordered {} node(s)", node_count),
            CompileState::Compiling {
                index,
                total,
                node_id,
            } => write!(f, "compiling node {} of {} ('{}')", index + 1, total, node_id),
            CompileState::Compiled { call_count } => write!(f, "compiled {} call(s)", call_count),
            CompileState::Failed { stage } => write!(f, "failed during {:?}", stage),
        }
    }
}

/// Records the transitions of one compilation and logs each of them.
#[derive(Debug)]
pub(crate) struct StageTracker {
    strategy_id: String,
    history: Vec<CompileState>,
}

impl StageTracker {
    pub(crate) fn new(strategy_id: &str) -> Self {
        Self {
            strategy_id: strategy_id.to_string(),
            history: vec![CompileState::Created],
        }
    }

    pub(crate) fn set_strategy_id(&mut self, strategy_id: &str) {
        self.strategy_id = strategy_id.to_string();
    }

    pub(crate) fn advance(&mut self, next: CompileState) {
        debug!(strategy = %self.strategy_id, state = %next, "compile state");
        self.history.push(next);
    }

    /// Moves to `Failed` and hands the error back for propagation.
    pub(crate) fn fail(&mut self, err: CompileError) -> CompileError {
        self.advance(CompileState::Failed { stage: err.stage() });
        err
    }

    pub(crate) fn into_history(self) -> Vec<CompileState> {
        self.history
    }
}
