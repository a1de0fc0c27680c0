//! # Build, Sync and Tag Orchestrators
//!
//! Each orchestrator walks one project's units strictly in sequence, the
//! default unit and the selected variants, and records an outcome per unit
//! instead of stopping at the first failure. Only problems that make the
//! whole project unusable (unknown project or variant, unreadable manifest,
//! missing artifact source) are returned as errors.
//!
//! Progress is reported through the `log` facade with `Start ...` and
//! `Finish ...` markers around every project and unit.

pub mod build;
pub mod sync;
pub mod tag;

pub use build::{build, build_affected, BuildReport};
pub use sync::{sync, SyncReport};
pub use tag::{tag, TagOutcome, TagReport};

use std::fmt;

use serde::Serialize;

use crate::process::ProcessResult;

/// Terminal state of one external command run for a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum UnitStatus {
    /// The process exited normally with this code.
    Exited { code: i32 },
    /// The process was terminated by a signal.
    Signaled { signal: i32 },
    /// The process could not be run at all.
    Failed { message: String },
}

impl UnitStatus {
    pub fn from_result(result: &ProcessResult) -> Self {
        if let Some(error) = result.error() {
            return UnitStatus::Failed {
                message: error.to_string(),
            };
        }
        match (result.status(), result.signal()) {
            (Some(code), _) => UnitStatus::Exited { code },
            (None, Some(signal)) => UnitStatus::Signaled { signal },
            (None, None) => UnitStatus::Failed {
                message: "process exited without status".to_string(),
            },
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, UnitStatus::Exited { code: 0 })
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Exited { code: 0 } => f.write_str("ok"),
            UnitStatus::Exited { code } => write!(f, "exited with status {}", code),
            UnitStatus::Signaled { signal } => write!(f, "killed by signal {}", signal),
            UnitStatus::Failed { message } => write!(f, "failed: {}", message),
        }
    }
}

/// Outcome recorded for one named variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantOutcome<T> {
    pub name: String,
    #[serde(flatten)]
    pub outcome: T,
}
