// Workflow routing - explicit state machine over the seven steps.
//
// Routing is a pure function of (topology, step just applied, resulting
// state). It never performs I/O, so every edge is testable in isolation.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::state::{RunState, RunStatus};

/// Default number of repair cycles allowed before a run is forced to notify.
pub const DEFAULT_MAX_REPAIRS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Generate,
    Validate,
    Approve,
    Save,
    Execute,
    Repair,
    Notify,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Generate => "generate",
            Step::Validate => "validate",
            Step::Approve => "approve",
            Step::Save => "save",
            Step::Execute => "execute",
            Step::Repair => "repair",
            Step::Notify => "notify",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Graph shape a run is executed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Full pipeline from scratch: generate, validate, approve, save, execute,
    /// with repair looping back through validation.
    Generation,
    /// Fix an existing test file: enter at execute, loop repair -> save -> execute.
    Repair,
}

impl Topology {
    pub fn name(&self) -> &'static str {
        match self {
            Topology::Generation => "generation",
            Topology::Repair => "repair",
        }
    }

    pub fn contains(&self, step: Step) -> bool {
        match self {
            Topology::Generation => true,
            Topology::Repair => matches!(
                step,
                Step::Execute | Step::Repair | Step::Save | Step::Notify
            ),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where control goes after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next(Step),
    /// Run parked at the approval gate; its state has been persisted.
    Suspend,
    /// Notification sent; nothing left to do.
    Finish,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("step '{step}' is not part of the {topology} workflow")]
    StepNotInTopology { step: Step, topology: Topology },
}

/// Routing table for one topology with its repair budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowGraph {
    topology: Topology,
    max_repairs: u32,
}

impl WorkflowGraph {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            max_repairs: DEFAULT_MAX_REPAIRS,
        }
    }

    pub fn generation() -> Self {
        Self::new(Topology::Generation)
    }

    pub fn repair() -> Self {
        Self::new(Topology::Repair)
    }

    pub fn with_max_repairs(mut self, max_repairs: u32) -> Self {
        self.max_repairs = max_repairs;
        self
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn max_repairs(&self) -> u32 {
        self.max_repairs
    }

    /// First step for an incoming state.
    ///
    /// A generation run that arrives already approved (the resume path)
    /// skips straight to saving its content.
    pub fn entry(&self, state: &RunState) -> Step {
        match self.topology {
            Topology::Generation if state.approved => Step::Save,
            Topology::Generation => Step::Generate,
            Topology::Repair => Step::Execute,
        }
    }

    /// Edge taken after `step` produced `state`.
    pub fn next(&self, step: Step, state: &RunState) -> Result<Transition, RoutingError> {
        if !self.topology.contains(step) {
            return Err(RoutingError::StepNotInTopology {
                step,
                topology: self.topology,
            });
        }

        let transition = match (self.topology, step) {
            (_, Step::Execute) => self.after_execute(state),
            (_, Step::Notify) => Transition::Finish,
            (_, Step::Save) => Transition::Next(Step::Execute),
            (Topology::Generation, Step::Generate) => Transition::Next(Step::Validate),
            (Topology::Generation, Step::Validate) => Transition::Next(Step::Approve),
            (Topology::Generation, Step::Approve) => {
                if state.is_awaiting_approval() {
                    Transition::Suspend
                } else {
                    Transition::Next(Step::Save)
                }
            }
            (Topology::Generation, Step::Repair) => Transition::Next(Step::Validate),
            (Topology::Repair, Step::Repair) => Transition::Next(Step::Save),
            (Topology::Repair, _) => {
                return Err(RoutingError::StepNotInTopology {
                    step,
                    topology: self.topology,
                })
            }
        };
        Ok(transition)
    }

    /// Skipped runs (manual checklists) never enter repair.
    fn after_execute(&self, state: &RunState) -> Transition {
        match state.status {
            RunStatus::Passed | RunStatus::Skipped => Transition::Next(Step::Notify),
            _ if self.repair_budget_exhausted(state) => Transition::Next(Step::Notify),
            _ => Transition::Next(Step::Repair),
        }
    }

    pub fn repair_budget_exhausted(&self, state: &RunState) -> bool {
        state.retry_count >= self.max_repairs
    }
}
