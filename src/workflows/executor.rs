// Graph executor - drives one RunState through a topology until it finishes
// or suspends at the approval gate.

use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn, Instrument};

use super::state::RunState;
use super::state_machine::{RoutingError, Step, Transition, WorkflowGraph};
use super::steps::{StepError, WorkflowSteps};
use crate::observability::workflow_metrics;
use crate::telemetry::{create_run_span, generate_run_id};

/// Upper bound on steps in a single run.
pub const DEFAULT_MAX_STEPS: usize = 100;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("step '{step}' failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: StepError,
    },

    #[error("workflow exceeded the limit of {limit} steps")]
    StepLimitExceeded { limit: usize },

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

/// One applied step: the step that ran, the state it produced, and where the
/// graph goes next.
#[derive(Debug, Clone, PartialEq)]
pub struct StepEvent {
    pub step: Step,
    pub state: RunState,
    pub transition: Transition,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunState),
    AwaitingApproval(RunState),
}

impl RunOutcome {
    pub fn into_state(self) -> RunState {
        match self {
            RunOutcome::Completed(state) | RunOutcome::AwaitingApproval(state) => state,
        }
    }
}

enum Cursor {
    At {
        step: Step,
        state: RunState,
        executed: usize,
    },
    Done,
}

pub struct GraphExecutor {
    graph: WorkflowGraph,
    steps: Arc<WorkflowSteps>,
    max_steps: usize,
}

impl GraphExecutor {
    pub fn new(graph: WorkflowGraph, steps: Arc<WorkflowSteps>) -> Self {
        Self {
            graph,
            steps,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Lazily apply steps, yielding one event per step.
    ///
    /// The stream ends after a `Finish` or `Suspend` transition, or right
    /// after the first error.
    pub fn events(&self, entry: RunState) -> impl Stream<Item = Result<StepEvent, WorkflowError>> + '_ {
        let start = Cursor::At {
            step: self.graph.entry(&entry),
            state: entry,
            executed: 0,
        };

        stream::unfold(start, move |cursor| async move {
            let Cursor::At {
                step,
                state,
                executed,
            } = cursor
            else {
                return None;
            };

            if executed >= self.max_steps {
                let err = WorkflowError::StepLimitExceeded {
                    limit: self.max_steps,
                };
                return Some((Err(err), Cursor::Done));
            }

            let next_state = match self.steps.apply(step, &state).await {
                Ok(next_state) => next_state,
                Err(source) => return Some((Err(WorkflowError::Step { step, source }), Cursor::Done)),
            };
            let transition = match self.graph.next(step, &next_state) {
                Ok(transition) => transition,
                Err(e) => return Some((Err(e.into()), Cursor::Done)),
            };
            debug!(step = %step, status = %next_state.status, ?transition, "Step applied");

            let cursor = match transition {
                Transition::Next(next) => Cursor::At {
                    step: next,
                    state: next_state.clone(),
                    executed: executed + 1,
                },
                Transition::Suspend | Transition::Finish => Cursor::Done,
            };
            let event = StepEvent {
                step,
                state: next_state,
                transition,
            };
            Some((Ok(event), cursor))
        })
    }

    pub async fn run(&self, entry: RunState) -> Result<RunOutcome, WorkflowError> {
        self.run_observed(entry, |_| {}).await
    }

    /// Run to completion, handing every step event to `observer`.
    pub async fn run_observed<F>(
        &self,
        entry: RunState,
        mut observer: F,
    ) -> Result<RunOutcome, WorkflowError>
    where
        F: FnMut(&StepEvent) + Send,
    {
        let run_id = generate_run_id();
        let span = create_run_span(&run_id, self.graph.topology().name(), &entry.file_path);

        async move {
            let mut current = entry.clone();
            let mut suspended = false;

            let mut events = std::pin::pin!(self.events(entry));
            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        workflow_metrics().record_failed();
                        warn!(error = %e, "Workflow run failed");
                        return Err(e);
                    }
                };
                observer(&event);
                suspended = event.transition == Transition::Suspend;
                current = event.state;
            }

            if suspended {
                workflow_metrics().record_suspended();
                info!(status = %current.status, "Workflow run suspended");
                Ok(RunOutcome::AwaitingApproval(current))
            } else {
                workflow_metrics().record_completed();
                info!(status = %current.status, retries = current.retry_count, "Workflow run finished");
                Ok(RunOutcome::Completed(current))
            }
        }
        .instrument(span)
        .await
    }
}
