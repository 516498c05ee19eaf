//! External tool abstractions
//!
//! This module provides trait-based abstractions for the test runners the
//! workflow launches, enabling testable code through dependency injection
//! and fake implementations.

pub mod command;
pub mod test_runner;

pub use command::{CommandError, CommandExecutor, CommandOutput, Invocation, ProcessCommandExecutor};
pub use test_runner::runner_invocation;
