use crate::background_job::{BackgroundJob, JobType};
use crate::errors::EnqueueError;
use std::collections::BTreeMap;

/// Name of the capability every submitted job type must have.
pub(crate) const REQUIRED_CAPABILITY: &str = "workers_client::BackgroundJob";

/// The set of job types a client accepts.
///
/// Only types registered here can be submitted. Registration goes through
/// [`BackgroundJob`], so every name in the registry belongs to a background job.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    queues: BTreeMap<&'static str, &'static str>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job type.
    pub fn register<J: BackgroundJob>(mut self) -> Self {
        self.queues.insert(J::JOB_NAME, J::QUEUE);
        self
    }

    /// Whether `job_type` names a registered background job.
    pub fn supports(&self, job_type: &JobType) -> bool {
        self.queues.contains_key(job_type.name())
    }

    /// Fails with [`EnqueueError::UnsupportedJobType`] unless `job_type` is registered.
    pub fn ensure_supported(&self, job_type: &JobType) -> Result<(), EnqueueError> {
        if self.supports(job_type) {
            return Ok(());
        }

        Err(EnqueueError::UnsupportedJobType {
            job_type: job_type.name().to_string(),
            required: REQUIRED_CAPABILITY,
        })
    }

    /// The default queue of a registered job type.
    pub fn queue(&self, job_type: &JobType) -> Option<&'static str> {
        self.queues.get(job_type.name()).copied()
    }

    /// Names of all registered job types.
    pub fn job_types(&self) -> Vec<&'static str> {
        self.queues.keys().copied().collect()
    }
}
