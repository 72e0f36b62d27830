use std::error::Error as StdError;

/// Boxed error used as the cause of conversion and filter failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors that can occur while submitting a job.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    /// The job identifier was empty or missing.
    #[error("a job identifier is required")]
    MissingIdentifier,

    /// No job type was given.
    #[error("a job type is required")]
    MissingType,

    /// The job type is not a registered background job.
    #[error("the job type '{job_type}' must implement '{required}'")]
    UnsupportedJobType {
        /// Name of the rejected job type.
        job_type: String,
        /// Capability the job type is missing.
        required: &'static str,
    },

    /// No initial state was given.
    #[error("an initial job state is required")]
    MissingState,

    /// The initial state cannot be recorded.
    #[error("invalid job state '{state}': {reason}")]
    InvalidState {
        /// Name of the rejected state.
        state: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No arguments were given. An empty argument map is valid, a missing one is not.
    #[error("job arguments are required")]
    MissingArguments,

    /// The job arguments could not be converted to their canonical form.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The creation pipeline failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The client has already released its store connection.
    #[error("the client has been closed")]
    Closed,
}

/// A value could not be rendered to its canonical string form.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// A single field failed to convert.
    #[error("could not convert field '{field}' of type '{type_name}' to a string")]
    Field {
        /// Field name.
        field: String,
        /// Declared type of the field.
        type_name: String,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },

    /// The value does not serialize to a record of named fields.
    #[error("a value of type '{type_name}' cannot be used as job arguments, expected a record of named fields")]
    NotARecord {
        /// Type of the rejected value.
        type_name: &'static str,
    },

    /// Serializing the value failed before any field was read.
    #[error("failed to serialize job arguments")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised by the job creation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A filter canceled the creation.
    #[error("job creation was canceled: {reason}")]
    Canceled {
        /// Reason given by the canceling filter.
        reason: String,
    },

    /// A job with the same identifier already exists in the store.
    #[error("a job with id '{job_id}' already exists")]
    DuplicateJob {
        /// The conflicting identifier.
        job_id: String,
    },

    /// The store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A filter failed.
    #[error("client filter failed")]
    Filter(#[source] BoxError),
}

/// Errors raised by a store connection.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The Redis server returned an error.
    #[cfg(feature = "redis")]
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    /// The in-memory store lock was poisoned by a panicking thread.
    #[error("the in-memory store lock is poisoned")]
    Poisoned,

    /// A stored value could not be decoded.
    #[error("failed to decode '{key}': {reason}")]
    Decode {
        /// Key holding the malformed value.
        key: String,
        /// What was wrong with it.
        reason: String,
    },
}
