//! Store key layout and record field names.
//!
//! Workers in any language read jobs back through these names, so they are
//! part of the on-store contract.

/// Record field holding the job type reference.
pub const TYPE_FIELD: &str = "Type";
/// Record field holding the JSON encoded arguments.
pub const ARGS_FIELD: &str = "Args";
/// Record field holding the creation timestamp in Unix seconds.
pub const CREATED_AT_FIELD: &str = "CreatedAt";
/// Job hash field holding the name of the current state.
pub const STATE_FIELD: &str = "State";
/// State hash field holding the state reason.
pub const REASON_FIELD: &str = "Reason";

/// Hash holding the job record.
pub fn job_key(prefix: &str, job_id: &str) -> String {
    format!("{prefix}:job:{job_id}")
}

/// Hash holding the current state of a job.
///
/// Lives outside the `job:` namespace so that no identifier can address
/// another job's state hash.
pub fn job_state_key(prefix: &str, job_id: &str) -> String {
    format!("{prefix}:job-state:{job_id}")
}

/// Set of every queue name that has received a job.
pub fn queues_key(prefix: &str) -> String {
    format!("{prefix}:queues")
}

/// List of job ids waiting in a queue. New ids are pushed to the head.
pub fn queue_key(prefix: &str, queue: &str) -> String {
    format!("{prefix}:queue:{queue}")
}
