use crate::arguments::ToArguments;
use crate::client::JobClient;
use crate::errors::EnqueueError;
use crate::pipeline::CreationPipeline;
use crate::state::JobState;
use crate::storage::StoreConnection;
use std::borrow::Cow;
use std::fmt;
use uuid::Uuid;

/// The default queue name used when no specific queue is specified.
pub const DEFAULT_QUEUE: &str = "default";

/// Trait for defining background jobs that can be submitted for later execution.
///
/// Implementing this trait is what makes a type a background job. Workers only
/// ever see [`Self::JOB_NAME`] and the job's arguments, so both must stay stable
/// across deployments.
pub trait BackgroundJob: ToArguments {
    /// Unique name of the job type.
    ///
    /// This MUST be unique for the whole application.
    const JOB_NAME: &'static str;

    /// Job queue the job is enqueued into.
    const QUEUE: &'static str = DEFAULT_QUEUE;

    /// Enqueue this job under a freshly generated identifier.
    ///
    /// Returns the identifier of the created job.
    fn enqueue<C, P>(&self, client: &mut JobClient<C, P>) -> Result<String, EnqueueError>
    where
        Self: Sized,
        C: StoreConnection,
        P: CreationPipeline,
    {
        self.enqueue_with_id(client, &Uuid::new_v4().to_string())
    }

    /// Enqueue this job under a caller supplied identifier.
    fn enqueue_with_id<C, P>(
        &self,
        client: &mut JobClient<C, P>,
        job_id: &str,
    ) -> Result<String, EnqueueError>
    where
        Self: Sized,
        C: StoreConnection,
        P: CreationPipeline,
    {
        client.create_job_from(
            job_id,
            &JobType::of::<Self>(),
            JobState::enqueued(Self::QUEUE),
            Some(self as &dyn ToArguments),
        )
    }
}

/// Portable reference to a background job type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobType {
    name: Cow<'static, str>,
}

impl JobType {
    /// Reference to a statically known job type.
    pub fn of<J: BackgroundJob>() -> Self {
        Self {
            name: Cow::Borrowed(J::JOB_NAME),
        }
    }

    /// Reference to a job type by name, resolved against a
    /// [`JobRegistry`](crate::JobRegistry) at submission time.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
        }
    }

    /// The serialized form stored with the job.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
