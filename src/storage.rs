//! Store connections and the job persistence layout.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use crate::errors::{PipelineError, StoreError};
use crate::record::JobRecord;
use crate::schema::{REASON_FIELD, STATE_FIELD, job_key, job_state_key, queue_key, queues_key};
use crate::state::{JobState, is_reserved_state_field};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// A single write applied as part of an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    /// Set fields of a hash.
    SetHash {
        /// Hash key.
        key: String,
        /// Field/value pairs.
        fields: Vec<(String, String)>,
    },
    /// Add a member to a set.
    AddToSet {
        /// Set key.
        key: String,
        /// Member to add.
        member: String,
    },
    /// Push a value onto the head of a list.
    PushList {
        /// List key.
        key: String,
        /// Value to push.
        value: String,
    },
}

/// A connection to the key/value store jobs are recorded in.
pub trait StoreConnection {
    /// Apply `writes` atomically, unless `guard_key` already exists.
    ///
    /// Returns `false` without writing anything if the key exists.
    fn commit_if_absent(&mut self, guard_key: &str, writes: &[Write]) -> Result<bool, StoreError>;

    /// All fields of a hash. Missing keys read as an empty hash.
    fn get_hash(&mut self, key: &str) -> Result<BTreeMap<String, String>, StoreError>;

    /// All values of a list, head first.
    fn get_list(&mut self, key: &str) -> Result<Vec<String>, StoreError>;

    /// All members of a set.
    fn get_set(&mut self, key: &str) -> Result<BTreeSet<String>, StoreError>;
}

/// Supplies ready to use store connections.
pub trait ConnectionProvider {
    /// The connection type handed out.
    type Connection: StoreConnection;

    /// Acquire a connection. Dropping it releases it.
    fn get_connection(&self) -> Result<Self::Connection, StoreError>;
}

/// Records a new job and its initial state.
///
/// Rejects identifiers that are already taken without touching the existing job.
pub(crate) fn create_job(
    connection: &mut dyn StoreConnection,
    prefix: &str,
    job_id: &str,
    record: &JobRecord,
    state: &JobState,
) -> Result<(), PipelineError> {
    let key = job_key(prefix, job_id);

    let mut job_fields = record.to_fields();
    job_fields.push((STATE_FIELD.to_string(), state.name().to_string()));

    // State and Reason go last so data fields can never shadow them.
    let mut state_fields: Vec<_> = state
        .data()
        .iter()
        .filter(|(k, _)| !is_reserved_state_field(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    state_fields.push((STATE_FIELD.to_string(), state.name().to_string()));
    if let Some(reason) = state.reason() {
        state_fields.push((REASON_FIELD.to_string(), reason.to_string()));
    }

    let mut writes = vec![
        Write::SetHash {
            key: key.clone(),
            fields: job_fields,
        },
        Write::SetHash {
            key: job_state_key(prefix, job_id),
            fields: state_fields,
        },
    ];

    if let Some(queue) = state.queue() {
        writes.push(Write::AddToSet {
            key: queues_key(prefix),
            member: queue.to_string(),
        });
        writes.push(Write::PushList {
            key: queue_key(prefix, queue),
            value: job_id.to_string(),
        });
    }

    trace!(key = %key, writes = writes.len(), "Recording job…");

    if connection.commit_if_absent(&key, &writes)? {
        Ok(())
    } else {
        Err(PipelineError::DuplicateJob {
            job_id: job_id.to_string(),
        })
    }
}

/// A job as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredJob {
    /// Job identifier.
    pub id: String,
    /// The job record.
    pub record: JobRecord,
    /// Name of the current state.
    pub state: Option<String>,
    /// Fields of the state hash.
    pub state_data: BTreeMap<String, String>,
}

/// Read a job back. Returns `None` for unknown identifiers.
pub fn get_job(
    connection: &mut dyn StoreConnection,
    prefix: &str,
    job_id: &str,
) -> Result<Option<StoredJob>, StoreError> {
    let key = job_key(prefix, job_id);
    let fields = connection.get_hash(&key)?;
    if fields.is_empty() {
        return Ok(None);
    }

    let record = JobRecord::from_fields(&fields).ok_or_else(|| StoreError::Decode {
        key: key.clone(),
        reason: "missing job record fields".to_string(),
    })?;

    Ok(Some(StoredJob {
        id: job_id.to_string(),
        record,
        state: fields.get(STATE_FIELD).cloned(),
        state_data: connection.get_hash(&job_state_key(prefix, job_id))?,
    }))
}

/// Identifiers waiting in `queue`, most recently enqueued first.
pub fn enqueued_job_ids(
    connection: &mut dyn StoreConnection,
    prefix: &str,
    queue: &str,
) -> Result<Vec<String>, StoreError> {
    connection.get_list(&queue_key(prefix, queue))
}

/// Names of every queue that has received a job.
pub fn queues(
    connection: &mut dyn StoreConnection,
    prefix: &str,
) -> Result<BTreeSet<String>, StoreError> {
    connection.get_set(&queues_key(prefix))
}
