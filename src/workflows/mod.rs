// Workflow orchestration: run state, routing, steps, and the drivers that
// push runs through the graphs.

pub mod driver;
pub mod executor;
pub mod state;
pub mod state_machine;
pub mod steps;

#[cfg(test)]
pub mod mocks;

pub use driver::{BatchReport, ConcurrencyDriver, FileOutcome, NoopObserver, RunObserver};
pub use executor::{GraphExecutor, RunOutcome, StepEvent, WorkflowError, DEFAULT_MAX_STEPS};
pub use state::{Framework, RunState, RunStatus, TestType};
pub use state_machine::{RoutingError, Step, Topology, Transition, WorkflowGraph, DEFAULT_MAX_REPAIRS};
pub use steps::{clean_code_fences, StepError, WorkflowSteps};
