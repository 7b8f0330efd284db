//! Error taxonomy for a generation run.
//!
//! Surface-level kinds only — the orchestrator stores these verbatim and
//! exposes them through the job status endpoint.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Could not generate roster, ensure staff details and rules are correct.")]
    Infeasible,

    #[error("Solver did not find a feasible solution within the time budget.")]
    NotSolved,

    #[error("Please check that all shifts and shift sequences have day groups assigned: {detail}")]
    Misconfigured { detail: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GenerationError {
    /// The error taxonomy kind, as used by the job status endpoint (§7).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Infeasible => "INFEASIBLE",
            Self::NotSolved => "NOT_SOLVED",
            Self::Misconfigured { .. } => "MISCONFIGURED",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
