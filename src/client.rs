use crate::arguments::{Arguments, ToArguments, marshal};
use crate::background_job::JobType;
use crate::context::CreateContext;
use crate::errors::{EnqueueError, StoreError};
use crate::job_registry::JobRegistry;
use crate::pipeline::{CreationPipeline, JobCreator};
use crate::record::JobRecord;
use crate::state::JobState;
use crate::storage::{ConnectionProvider, StoreConnection};
use std::fmt;
use tracing::{Span, debug, instrument};

/// Submits jobs into the store.
///
/// The client holds a single store connection for its whole lifetime and
/// releases it when closed or dropped. Submissions take `&mut self`; use one
/// client per thread for parallel submission.
pub struct JobClient<C: StoreConnection, P: CreationPipeline = JobCreator> {
    connection: Option<C>,
    registry: JobRegistry,
    pipeline: P,
}

impl<C: StoreConnection, P: CreationPipeline> JobClient<C, P> {
    /// Create a client, acquiring one connection from `provider`.
    pub fn new<Pr>(provider: &Pr, registry: JobRegistry, pipeline: P) -> Result<Self, StoreError>
    where
        Pr: ConnectionProvider<Connection = C>,
    {
        let connection = provider.get_connection()?;
        debug!(job_types = ?registry.job_types(), "Acquired store connection");

        Ok(Self {
            connection: Some(connection),
            registry,
            pipeline,
        })
    }

    /// The job types this client accepts.
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// The creation pipeline.
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Whether the connection has been released.
    pub fn is_closed(&self) -> bool {
        self.connection.is_none()
    }

    /// Create a job from an argument map.
    pub fn create_job(
        &mut self,
        job_id: &str,
        job_type: &JobType,
        state: JobState,
        args: Arguments,
    ) -> Result<String, EnqueueError> {
        self.submit(
            JobSubmission::new(job_id)
                .job_type(job_type.clone())
                .state(state)
                .arguments(args),
        )
    }

    /// Create a job from a record converted into arguments. A missing record
    /// submits empty arguments.
    pub fn create_job_from(
        &mut self,
        job_id: &str,
        job_type: &JobType,
        state: JobState,
        args: Option<&dyn ToArguments>,
    ) -> Result<String, EnqueueError> {
        self.submit(
            JobSubmission::new(job_id)
                .job_type(job_type.clone())
                .state(state)
                .arguments_from(args),
        )
    }

    /// Validate a submission and run it through the creation pipeline.
    ///
    /// Inputs are checked in order (identifier, type, state, arguments) before
    /// anything is converted or written. Returns the job identifier.
    #[instrument(
        name = "workers.submit",
        skip_all,
        fields(job.id = %submission.job_id, job.type = tracing::field::Empty)
    )]
    pub fn submit(&mut self, submission: JobSubmission<'_>) -> Result<String, EnqueueError> {
        let JobSubmission {
            job_id,
            job_type,
            state,
            args,
        } = submission;

        if job_id.is_empty() {
            return Err(EnqueueError::MissingIdentifier);
        }

        let job_type = job_type.ok_or(EnqueueError::MissingType)?;
        self.registry.ensure_supported(&job_type)?;
        Span::current().record("job.type", job_type.name());

        let state = state.ok_or(EnqueueError::MissingState)?;
        state.validate()?;

        let args = match args.ok_or(EnqueueError::MissingArguments)? {
            ArgumentSource::Map(args) => args,
            ArgumentSource::Record(record) => marshal(record)?,
        };

        let connection = self.connection.as_mut().ok_or(EnqueueError::Closed)?;
        let record = JobRecord::build(&self.registry, &job_type, &args)?;

        debug!(state = state.name(), "Running job creation pipeline…");
        let mut context = CreateContext::new(connection, job_id, record, state);
        self.pipeline.run(&mut context)?;

        Ok(context.job_id().to_string())
    }

    /// Release the store connection. Calling it again does nothing.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            debug!("Releasing store connection");
            drop(connection);
        }
    }
}

impl<C: StoreConnection, P: CreationPipeline> Drop for JobClient<C, P> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: StoreConnection, P: CreationPipeline + fmt::Debug> fmt::Debug for JobClient<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobClient")
            .field("registry", &self.registry)
            .field("pipeline", &self.pipeline)
            .field("closed", &self.is_closed())
            .finish()
    }
}

enum ArgumentSource<'a> {
    Map(Arguments),
    Record(Option<&'a dyn ToArguments>),
}

/// A job submission, assembled before it is handed to [`JobClient::submit`].
///
/// Every part except the identifier is optional here so that a submission
/// missing one fails with the matching [`EnqueueError`].
pub struct JobSubmission<'a> {
    job_id: String,
    job_type: Option<JobType>,
    state: Option<JobState>,
    args: Option<ArgumentSource<'a>>,
}

impl<'a> JobSubmission<'a> {
    /// Start a submission for the given identifier.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            job_type: None,
            state: None,
            args: None,
        }
    }

    /// Set the job type.
    pub fn job_type(mut self, job_type: JobType) -> Self {
        self.job_type = Some(job_type);
        self
    }

    /// Set the initial state.
    pub fn state(mut self, state: JobState) -> Self {
        self.state = Some(state);
        self
    }

    /// Use a ready argument map.
    pub fn arguments(mut self, args: Arguments) -> Self {
        self.args = Some(ArgumentSource::Map(args));
        self
    }

    /// Convert a record into the arguments at submission time.
    pub fn arguments_from(mut self, record: Option<&'a dyn ToArguments>) -> Self {
        self.args = Some(ArgumentSource::Record(record));
        self
    }
}

impl fmt::Debug for JobSubmission<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = match &self.args {
            Some(ArgumentSource::Map(args)) => Some(format!("{args:?}")),
            Some(ArgumentSource::Record(_)) => Some("<record>".to_string()),
            None => None,
        };

        f.debug_struct("JobSubmission")
            .field("job_id", &self.job_id)
            .field("job_type", &self.job_type)
            .field("state", &self.state)
            .field("args", &args)
            .finish()
    }
}
