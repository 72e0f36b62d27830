use crate::config::StorageOptions;
use crate::context::CreateContext;
use crate::errors::PipelineError;
use crate::storage;
use std::fmt;
use tracing::{debug, trace};

/// Runs a submission through to the store.
pub trait CreationPipeline {
    /// Process and persist the job described by `context`.
    fn run(&self, context: &mut CreateContext<'_>) -> Result<(), PipelineError>;
}

impl<F> CreationPipeline for F
where
    F: Fn(&mut CreateContext<'_>) -> Result<(), PipelineError>,
{
    fn run(&self, context: &mut CreateContext<'_>) -> Result<(), PipelineError> {
        self(context)
    }
}

/// Hooks run around job creation by [`JobCreator`].
pub trait ClientFilter: Send + Sync {
    /// Called before the job is stored, in registration order.
    ///
    /// May change the context. Returning an error stops the creation.
    fn on_creating(&self, _context: &mut CreateContext<'_>) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Called after the store write, in reverse registration order.
    fn on_created(&self, _context: &CreateContext<'_>, _outcome: Result<(), &PipelineError>) {}
}

/// The default pipeline: client filters around a store write.
pub struct JobCreator {
    filters: Vec<Box<dyn ClientFilter>>,
    key_prefix: String,
}

impl JobCreator {
    /// Create a pipeline writing under the configured key prefix.
    pub fn new(options: &StorageOptions) -> Self {
        Self {
            filters: Vec::new(),
            key_prefix: options.key_prefix.clone(),
        }
    }

    /// Append a filter to the chain.
    pub fn filter(mut self, filter: impl ClientFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Prefix of the keys jobs are written under.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }
}

impl Default for JobCreator {
    fn default() -> Self {
        Self::new(&StorageOptions::default())
    }
}

impl fmt::Debug for JobCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobCreator")
            .field("filters", &self.filters.len())
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl CreationPipeline for JobCreator {
    fn run(&self, context: &mut CreateContext<'_>) -> Result<(), PipelineError> {
        for filter in &self.filters {
            filter.on_creating(context)?;
        }

        let outcome = {
            let (connection, job_id, record, state) = context.parts();
            storage::create_job(connection, &self.key_prefix, job_id, record, state)
        };

        match &outcome {
            Ok(()) => debug!("Job created"),
            Err(error) => trace!(%error, "Job creation failed"),
        }

        for filter in self.filters.iter().rev() {
            filter.on_created(context, outcome.as_ref().map(|_| ()));
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{Arguments, ToArguments};
    use crate::background_job::{BackgroundJob, JobType};
    use crate::errors::ConversionError;
    use crate::job_registry::JobRegistry;
    use crate::record::JobRecord;
    use crate::state::JobState;
    use crate::storage::memory::MemoryStore;
    use claims::{assert_matches, assert_none, assert_ok, assert_some};
    use std::sync::{Arc, Mutex};

    struct Export;

    impl ToArguments for Export {
        fn to_arguments(&self) -> Result<Arguments, ConversionError> {
            Ok(Arguments::new())
        }
    }

    impl BackgroundJob for Export {
        const JOB_NAME: &'static str = "export";
    }

    fn record() -> JobRecord {
        let registry = JobRegistry::new().register::<Export>();
        JobRecord::build(&registry, &JobType::of::<Export>(), &Arguments::new()).unwrap()
    }

    #[derive(Clone, Default)]
    struct Journal(Arc<Mutex<Vec<String>>>);

    impl Journal {
        fn log(&self, entry: String) {
            self.0.lock().unwrap().push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct Recording {
        name: &'static str,
        journal: Journal,
    }

    impl ClientFilter for Recording {
        fn on_creating(&self, context: &mut CreateContext<'_>) -> Result<(), PipelineError> {
            self.journal.log(format!("{} creating", self.name));
            context.items_mut().insert(self.name.to_string(), "seen".to_string());
            Ok(())
        }

        fn on_created(&self, _context: &CreateContext<'_>, outcome: Result<(), &PipelineError>) {
            self.journal
                .log(format!("{} created ok={}", self.name, outcome.is_ok()));
        }
    }

    struct Cancel;

    impl ClientFilter for Cancel {
        fn on_creating(&self, _context: &mut CreateContext<'_>) -> Result<(), PipelineError> {
            Err(PipelineError::Canceled {
                reason: "maintenance window".to_string(),
            })
        }
    }

    struct Reroute;

    impl ClientFilter for Reroute {
        fn on_creating(&self, context: &mut CreateContext<'_>) -> Result<(), PipelineError> {
            context.set_state(JobState::enqueued("slow"));
            Ok(())
        }
    }

    #[test]
    fn filters_wrap_the_store_write() {
        let store = MemoryStore::new();
        let mut conn = store.connection();
        let journal = Journal::default();
        let creator = JobCreator::default()
            .filter(Recording {
                name: "outer",
                journal: journal.clone(),
            })
            .filter(Recording {
                name: "inner",
                journal: journal.clone(),
            });

        let mut context =
            CreateContext::new(&mut conn, "1".into(), record(), JobState::enqueued("default"));
        assert_ok!(creator.run(&mut context));
        assert_eq!(context.items().len(), 2);

        assert_eq!(
            journal.entries(),
            vec![
                "outer creating",
                "inner creating",
                "inner created ok=true",
                "outer created ok=true",
            ]
        );
        assert_some!(assert_ok!(storage::get_job(&mut conn, "workers", "1")));
    }

    #[test]
    fn canceled_creation_writes_nothing() {
        let store = MemoryStore::new();
        let mut conn = store.connection();
        let creator = JobCreator::default().filter(Cancel);

        let mut context =
            CreateContext::new(&mut conn, "1".into(), record(), JobState::enqueued("default"));
        let result = creator.run(&mut context);

        assert_matches!(result, Err(PipelineError::Canceled { .. }));
        assert_none!(assert_ok!(storage::get_job(&mut conn, "workers", "1")));
    }

    #[test]
    fn filters_can_change_the_state() {
        let store = MemoryStore::new();
        let mut conn = store.connection();
        let creator = JobCreator::new(&StorageOptions {
            key_prefix: "app".to_string(),
            ..StorageOptions::default()
        })
        .filter(Reroute);

        let mut context =
            CreateContext::new(&mut conn, "1".into(), record(), JobState::enqueued("default"));
        assert_ok!(creator.run(&mut context));

        assert_eq!(assert_ok!(storage::enqueued_job_ids(&mut conn, "app", "slow")), vec!["1"]);
        assert!(assert_ok!(storage::enqueued_job_ids(&mut conn, "app", "default")).is_empty());
    }

    #[test]
    fn failed_writes_are_reported_to_filters() {
        let store = MemoryStore::new();
        let mut conn = store.connection();
        let journal = Journal::default();
        let creator = JobCreator::default().filter(Recording {
            name: "audit",
            journal: journal.clone(),
        });

        for _ in 0..2 {
            let mut context =
                CreateContext::new(&mut conn, "1".into(), record(), JobState::enqueued("default"));
            let _ = creator.run(&mut context);
        }

        assert_eq!(journal.entries().last().map(String::as_str), Some("audit created ok=false"));
    }
}
