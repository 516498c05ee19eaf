//! Property tests for routing decisions and the validation gate

use proptest::prelude::*;

use autoqa::workflows::steps::validate;
use autoqa::workflows::{
    Framework, RunState, RunStatus, Step, TestType, Topology, Transition, WorkflowGraph,
};

fn base(status: RunStatus, retry_count: u32) -> RunState {
    RunState {
        status,
        retry_count,
        ..RunState::new("src", "a.py", TestType::Unit, Framework::Pytest)
    }
}

fn any_status() -> impl Strategy<Value = RunStatus> {
    prop_oneof![
        Just(RunStatus::Pending),
        Just(RunStatus::Generating),
        Just(RunStatus::Validating),
        Just(RunStatus::AwaitingApproval),
        Just(RunStatus::Approved),
        Just(RunStatus::Saving),
        Just(RunStatus::Passed),
        Just(RunStatus::Failed),
        Just(RunStatus::Skipped),
        Just(RunStatus::Completed),
    ]
}

proptest! {
    #[test]
    fn execute_routes_to_repair_only_while_budget_remains(
        retry_count in 0u32..30,
        max_repairs in 0u32..15,
        failed in any::<bool>(),
        repair_topology in any::<bool>(),
    ) {
        let graph = if repair_topology { WorkflowGraph::repair() } else { WorkflowGraph::generation() }
            .with_max_repairs(max_repairs);
        let status = if failed { RunStatus::Failed } else { RunStatus::Passed };
        let transition = graph.next(Step::Execute, &base(status, retry_count)).unwrap();

        let expected = if failed && retry_count < max_repairs {
            Transition::Next(Step::Repair)
        } else {
            Transition::Next(Step::Notify)
        };
        prop_assert_eq!(transition, expected);
    }

    #[test]
    fn notify_always_finishes(status in any_status(), retry_count in 0u32..20) {
        for graph in [WorkflowGraph::generation(), WorkflowGraph::repair()] {
            prop_assert_eq!(
                graph.next(Step::Notify, &base(status, retry_count)).unwrap(),
                Transition::Finish
            );
        }
    }

    #[test]
    fn approve_suspends_only_when_awaiting(status in any_status()) {
        let transition = WorkflowGraph::generation()
            .next(Step::Approve, &base(status, 0))
            .unwrap();
        if status == RunStatus::AwaitingApproval {
            prop_assert_eq!(transition, Transition::Suspend);
        } else {
            prop_assert_eq!(transition, Transition::Next(Step::Save));
        }
    }

    #[test]
    fn validation_matches_trimmed_length(body in "[a-z ]{0,20}", pad in "[ \n\t]{0,5}") {
        let content = format!("{pad}{body}{pad}");
        let state = base(RunStatus::Generating, 0).with_generated_tests(content.clone());
        let accepted = validate(&state).is_ok();
        prop_assert_eq!(accepted, content.trim().chars().count() >= 10);
    }
}

#[test]
fn retry_nine_repairs_and_ten_notifies() {
    let graph = WorkflowGraph::generation();
    assert_eq!(
        graph.next(Step::Execute, &base(RunStatus::Failed, 9)).unwrap(),
        Transition::Next(Step::Repair)
    );
    assert_eq!(
        graph.next(Step::Execute, &base(RunStatus::Failed, 10)).unwrap(),
        Transition::Next(Step::Notify)
    );
}

#[test]
fn repair_topology_rejects_generation_only_steps() {
    let graph = WorkflowGraph::repair();
    for step in [Step::Generate, Step::Validate, Step::Approve] {
        assert!(!Topology::Repair.contains(step));
        assert!(graph.next(step, &base(RunStatus::Pending, 0)).is_err());
    }
}
