#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod arguments;
mod background_job;
mod client;
mod config;
mod context;
mod errors;
mod job_registry;
mod pipeline;
mod record;
/// Store key layout.
pub mod schema;
mod state;
/// Store connections and backends.
pub mod storage;
mod util;

/// Job arguments and their canonical form.
pub use self::arguments::{ArgumentValue, Arguments, ToArguments, marshal};
/// The main trait for defining background jobs.
pub use self::background_job::{BackgroundJob, DEFAULT_QUEUE, JobType};
/// The submission entry point.
pub use self::client::{JobClient, JobSubmission};
/// Storage configuration.
pub use self::config::StorageOptions;
/// Context passed through the creation pipeline.
pub use self::context::CreateContext;
/// Error types.
pub use self::errors::{BoxError, ConversionError, EnqueueError, PipelineError, StoreError};
/// Registry of accepted job types.
pub use self::job_registry::JobRegistry;
/// The job creation pipeline.
pub use self::pipeline::{ClientFilter, CreationPipeline, JobCreator};
/// The durable job record.
pub use self::record::JobRecord;
/// Job lifecycle states.
pub use self::state::{ENQUEUED_STATE, JobState};
