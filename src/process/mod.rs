//! External process execution.
//!
//! Operations describe each step as an [`Invocation`] and hand it to a
//! [`CommandRunner`]. [`SystemRunner`] spawns real child processes; tests
//! substitute a recorder to observe exactly what would have run.

mod cleanup;
mod invocation;
mod runner;

#[cfg(test)]
pub(crate) mod recorder;

pub(crate) use cleanup::blocking_cleanup;
pub use invocation::{ExitOutcome, Invocation};
pub use runner::{CommandRunner, SystemRunner};
