//! Job orchestrator (C6).
//!
//! Runs a generation request on a dedicated worker thread so the request
//! path never blocks on the solver, tracks its status in a small in-memory
//! table, and enforces a per-session concurrency cap. Modelled on the
//! request-path/worker-pool split used elsewhere in this stack for
//! CPU-bound solves, minus any cooperative cancellation: the core contract
//! has no stop signal, only the solver's own wall-clock budget.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use roster_core::EntityStore;
use uuid::Uuid;

use crate::config::RosterConfig;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Processing,
    Succeeded,
    Failed { kind: String, message: String },
}

#[derive(Debug, Clone)]
struct Job {
    session: String,
    status: JobStatus,
}

#[derive(Debug)]
pub enum SubmitError {
    /// The session already has `max_concurrent_per_session` jobs in flight.
    AlreadyInProgress,
}

pub struct JobOrchestrator {
    store: Arc<dyn EntityStore>,
    config: RosterConfig,
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
    session_jobs: RwLock<HashMap<String, Vec<Uuid>>>,
}

impl JobOrchestrator {
    pub fn new(store: Arc<dyn EntityStore>, config: RosterConfig) -> Self {
        Self {
            store,
            config,
            jobs: Arc::new(RwLock::new(HashMap::new())),
            session_jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Submits a generation request for `session`, returning its job id.
    ///
    /// Rejects the submission if the session already has
    /// `max_concurrent_per_session` jobs still `PROCESSING`.
    pub async fn submit(&self, session: &str, start_date: NaiveDate) -> Result<Uuid, SubmitError> {
        {
            let jobs = self.jobs.read();
            let session_jobs = self.session_jobs.read();
            let in_flight = session_jobs
                .get(session)
                .map(|ids| {
                    ids.iter()
                        .filter(|id| {
                            jobs.get(id)
                                .map(|j| j.status == JobStatus::Processing)
                                .unwrap_or(false)
                        })
                        .count()
                })
                .unwrap_or(0);
            if in_flight >= self.config.max_concurrent_per_session {
                return Err(SubmitError::AlreadyInProgress);
            }
        }

        let job_id = Uuid::new_v4();
        {
            let mut jobs = self.jobs.write();
            jobs.insert(
                job_id,
                Job {
                    session: session.to_string(),
                    status: JobStatus::Processing,
                },
            );
            self.session_jobs
                .write()
                .entry(session.to_string())
                .or_default()
                .push(job_id);
        }

        let jobs_handle = Arc::clone(&self.jobs);
        let store = Arc::clone(&self.store);
        let time_budget = self.config.time_budget();
        tokio::task::spawn_blocking(move || {
            let outcome = roster_core::generate(store.as_ref(), start_date, time_budget);
            let status = match outcome {
                Ok(()) => JobStatus::Succeeded,
                Err(err) => {
                    tracing::warn!(%job_id, kind = err.kind(), "generation run failed");
                    JobStatus::Failed {
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                    }
                }
            };
            if let Some(job) = jobs_handle.write().get_mut(&job_id) {
                job.status = status;
            }
        });

        Ok(job_id)
    }

    pub fn status(&self, job_id: Uuid) -> Option<JobStatus> {
        self.jobs.read().get(&job_id).map(|j| j.status.clone())
    }
}
