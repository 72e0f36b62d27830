use crate::errors::EnqueueError;
use crate::schema::{REASON_FIELD, STATE_FIELD};
use crate::util::to_timestamp;
use chrono::Utc;
use std::collections::BTreeMap;

/// Name of the state jobs waiting in a queue are in.
pub const ENQUEUED_STATE: &str = "Enqueued";

/// The lifecycle state a job is created in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    name: String,
    reason: Option<String>,
    data: BTreeMap<String, String>,
    queue: Option<String>,
}

impl JobState {
    /// A state with the given name and no data.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: None,
            data: BTreeMap::new(),
            queue: None,
        }
    }

    /// Ready for pickup by workers listening on `queue`.
    pub fn enqueued(queue: impl Into<String>) -> Self {
        let queue = queue.into();
        Self::new(ENQUEUED_STATE)
            .with_data("EnqueuedAt", to_timestamp(Utc::now()))
            .with_data("Queue", queue.clone())
            .in_queue(queue)
    }

    /// Attach a human readable reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attach a data field stored alongside the state.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    fn in_queue(mut self, queue: String) -> Self {
        self.queue = Some(queue);
        self
    }

    /// State name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reason, if any.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Data fields.
    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }

    /// Queue the job is pushed onto when this state is recorded.
    pub fn queue(&self) -> Option<&str> {
        self.queue.as_deref()
    }

    /// Check the state can be recorded: it needs a name, and its data must
    /// not use the `State` or `Reason` field names.
    pub(crate) fn validate(&self) -> Result<(), EnqueueError> {
        if self.name.is_empty() {
            return Err(EnqueueError::InvalidState {
                state: String::new(),
                reason: "the state name is empty".to_string(),
            });
        }

        if let Some(field) = self.data.keys().find(|k| is_reserved_state_field(k)) {
            return Err(EnqueueError::InvalidState {
                state: self.name.clone(),
                reason: format!("'{field}' is reserved and cannot be used as state data"),
            });
        }

        Ok(())
    }
}

pub(crate) fn is_reserved_state_field(field: &str) -> bool {
    field == STATE_FIELD || field == REASON_FIELD
}
