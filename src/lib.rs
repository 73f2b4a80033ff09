//! An interactive "open anything" prompt.
//!
//! This crate reads free-text commands from standard input and hands each one
//! to the operating system's open facility: full URLs and bare domains go to
//! the default browser, existing paths to their default application, catalog
//! application names to the application itself, and `open <file> with <app>`
//! to a named application. `sys info` prints a CPU/RAM/network snapshot.
//! Launched processes are fire-and-forget; their lifecycle is logged as they
//! start and finish, interleaved with later prompts.
//!
//! The high-level entry point is [`Repl`], which owns the line editor, the
//! [`Classifier`] decision list and the [`Launcher`]. The [`AppCatalog`] is
//! built once at startup and shared read-only between completion and
//! classification.

pub mod catalog;
pub mod classify;
pub mod launcher;
pub mod repl;
pub mod telemetry;

pub use catalog::AppCatalog;
pub use classify::{Action, Classifier};
pub use launcher::{LaunchPlan, Launcher};
pub use repl::Repl;
