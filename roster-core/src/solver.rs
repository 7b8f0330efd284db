//! Solver driver (C4).
//!
//! Runs the model built by [`crate::model`] with a wall-clock budget and
//! classifies the outcome. `good_lp`'s `microlp` backend has no native
//! deadline or cancellation hook, so the budget is enforced by running the
//! solve on its own thread and racing it against a channel timeout; a solve
//! that overruns is abandoned in place (Rust gives no way to force-stop a
//! thread safely) and reported as `NOT_SOLVED`.

use std::sync::mpsc;
use std::time::Duration;

use good_lp::{microlp, Solution, SolverModel};

use crate::entities::{RoleId, TimeSlotId, WorkerId};
use crate::error::GenerationError;
use crate::model::BuiltModel;

use std::collections::HashMap;

pub struct SolvedModel {
    /// 1-valued primary variables, ready for the writer.
    pub assigned: HashMap<(WorkerId, RoleId, TimeSlotId), bool>,
}

pub fn solve(model: BuiltModel, time_budget: Duration) -> Result<SolvedModel, GenerationError> {
    let BuiltModel {
        vars,
        objective,
        constraints,
        primary,
    } = model;

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut problem = vars.maximise(objective).using(microlp);
        for c in constraints {
            problem = problem.with(c);
        }
        let outcome = problem.solve();
        // The receiver may already have timed out and gone away; that's fine.
        let _ = tx.send(outcome);
    });

    let outcome = match rx.recv_timeout(time_budget) {
        Ok(outcome) => outcome,
        Err(mpsc::RecvTimeoutError::Timeout) => return Err(GenerationError::NotSolved),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            return Err(GenerationError::Internal(
                "solver thread terminated without a result".to_string(),
            ))
        }
    };

    let solution = match outcome {
        Ok(solution) => solution,
        Err(good_lp::ResolutionError::Infeasible) => return Err(GenerationError::Infeasible),
        Err(other @ good_lp::ResolutionError::Unbounded) => {
            tracing::warn!(detail = ?other, "objective is unbounded; check the request-matrix weights");
            return Err(GenerationError::NotSolved);
        }
        Err(other) => {
            tracing::warn!(detail = ?other, "solver returned an unclassified outcome");
            return Err(GenerationError::NotSolved);
        }
    };

    let assigned = primary
        .into_iter()
        .map(|(key, var)| (key, solution.value(var) > 0.5))
        .collect();

    Ok(SolvedModel { assigned })
}
