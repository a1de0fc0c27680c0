//! # gam
//!
//! Library behind the `gam` command-line tool: affected-change detection and
//! sequential build, sync and tag orchestration for a monorepo of
//! Docker-built projects.
//!
//! ## Quick Example
//!
//! ```
//! use gam::command::{CommandBuilder, CommandSpec, OptionSpec, Separator};
//!
//! static LS: CommandSpec = CommandSpec::new(
//!     "ls",
//!     &[
//!         OptionSpec::switch("all", "-a"),
//!         OptionSpec::required("color", "--color", Separator::Equals),
//!     ],
//! );
//!
//! let mut ls = CommandBuilder::new(&[&LS]);
//! ls.flag("all").unwrap();
//! ls.value("color", "never").unwrap();
//! ls.parameter("src");
//! assert_eq!(ls.to_string(), "ls -a --color=never src");
//! ```
//!
//! ## Core Concepts
//!
//! - **Command building (`command`)**: declarative option tables for external
//!   tools and a builder that validates every option use against them.
//! - **Process running (`process`)**: synchronous and tokio-based
//!   asynchronous execution with bounded output capture.
//! - **Tool adapters (`docker`, `git`)**: typed wrappers over the handful of
//!   docker and git invocations the orchestrators need, each behind an
//!   `...Operations` trait so they can be replaced in tests.
//! - **Workspace model (`config`, `filesystem`, `path`)**: `gam.json`,
//!   per-project `gam-manifest.json` documents, and the host they live on.
//! - **Affected resolution (`affected`)**: which projects and variants a set
//!   of changed files touches.
//! - **Orchestration (`orchestrators`)**: build, sync and tag over a
//!   project's units, one at a time.

pub mod affected;
pub mod command;
pub mod config;
pub mod defaults;
pub mod docker;
pub mod error;
pub mod filesystem;
pub mod git;
pub mod orchestrators;
pub mod output;
pub mod path;
pub mod process;

pub use error::{Error, Result};

#[cfg(test)]
mod path_proptest;

#[cfg(test)]
mod test_support;
