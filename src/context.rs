use crate::record::JobRecord;
use crate::state::JobState;
use crate::storage::StoreConnection;
use std::collections::BTreeMap;
use std::fmt;

/// Everything the creation pipeline needs for a single submission.
///
/// The connection is borrowed from the client for the duration of the
/// pipeline run.
pub struct CreateContext<'a> {
    connection: &'a mut dyn StoreConnection,
    job_id: String,
    record: JobRecord,
    state: JobState,
    items: BTreeMap<String, String>,
}

impl<'a> CreateContext<'a> {
    pub(crate) fn new(
        connection: &'a mut dyn StoreConnection,
        job_id: String,
        record: JobRecord,
        state: JobState,
    ) -> Self {
        Self {
            connection,
            job_id,
            record,
            state,
            items: BTreeMap::new(),
        }
    }

    /// The store connection.
    pub fn connection(&mut self) -> &mut dyn StoreConnection {
        &mut *self.connection
    }

    /// Identifier of the job being created.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// The job record.
    pub fn record(&self) -> &JobRecord {
        &self.record
    }

    /// The state the job is created in.
    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Replace the state the job is created in.
    pub fn set_state(&mut self, state: JobState) {
        self.state = state;
    }

    /// Scratch values shared between filters.
    pub fn items(&self) -> &BTreeMap<String, String> {
        &self.items
    }

    /// Mutable access to the scratch values.
    pub fn items_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.items
    }

    pub(crate) fn parts(&mut self) -> (&mut dyn StoreConnection, &str, &JobRecord, &JobState) {
        (&mut *self.connection, &self.job_id, &self.record, &self.state)
    }
}

impl fmt::Debug for CreateContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateContext")
            .field("job_id", &self.job_id)
            .field("record", &self.record)
            .field("state", &self.state)
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}
