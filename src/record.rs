//! The durable job record.

use crate::arguments::Arguments;
use crate::background_job::JobType;
use crate::errors::{ConversionError, EnqueueError};
use crate::job_registry::JobRegistry;
use crate::schema::{ARGS_FIELD, CREATED_AT_FIELD, TYPE_FIELD};
use crate::util::{from_timestamp, to_timestamp};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Metadata recorded for every job, in its on-store encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    job_type: String,
    args: String,
    created_at: String,
}

impl JobRecord {
    /// Build the record for a submission, stamped with the current time.
    pub fn build(
        registry: &JobRegistry,
        job_type: &JobType,
        args: &Arguments,
    ) -> Result<Self, EnqueueError> {
        Self::build_at(registry, job_type, args, Utc::now())
    }

    /// Build the record with an explicit creation time.
    pub fn build_at(
        registry: &JobRegistry,
        job_type: &JobType,
        args: &Arguments,
        created_at: DateTime<Utc>,
    ) -> Result<Self, EnqueueError> {
        registry.ensure_supported(job_type)?;

        Ok(Self {
            job_type: job_type.name().to_string(),
            args: args.to_json().map_err(ConversionError::from)?,
            created_at: to_timestamp(created_at),
        })
    }

    /// Rebuild a record from the fields of a stored job hash.
    ///
    /// Returns `None` if any record field is missing.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Option<Self> {
        Some(Self {
            job_type: fields.get(TYPE_FIELD)?.clone(),
            args: fields.get(ARGS_FIELD)?.clone(),
            created_at: fields.get(CREATED_AT_FIELD)?.clone(),
        })
    }

    /// The record as store hash fields.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            (TYPE_FIELD.to_string(), self.job_type.clone()),
            (ARGS_FIELD.to_string(), self.args.clone()),
            (CREATED_AT_FIELD.to_string(), self.created_at.clone()),
        ]
    }

    /// Serialized job type reference.
    pub fn job_type(&self) -> &str {
        &self.job_type
    }

    /// JSON encoded arguments.
    pub fn args(&self) -> &str {
        &self.args
    }

    /// Encoded creation time.
    pub fn created_at_raw(&self) -> &str {
        &self.created_at
    }

    /// Decode the arguments.
    pub fn arguments(&self) -> Result<Arguments, serde_json::Error> {
        Arguments::from_json(&self.args)
    }

    /// Decode the creation time.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        from_timestamp(&self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::ToArguments;
    use crate::background_job::BackgroundJob;
    use chrono::TimeZone;
    use claims::{assert_matches, assert_none, assert_ok, assert_some_eq};

    struct Resize;

    impl ToArguments for Resize {
        fn to_arguments(&self) -> Result<Arguments, ConversionError> {
            Ok(Arguments::new())
        }
    }

    impl BackgroundJob for Resize {
        const JOB_NAME: &'static str = "resize_image";
    }

    fn arguments() -> Arguments {
        let mut args = Arguments::new();
        args.insert("Width", Some("640".into()));
        args.insert("Crop", None);
        args
    }

    #[test]
    fn build_stamps_the_call_time() {
        let registry = JobRegistry::new().register::<Resize>();

        let before = Utc::now().timestamp();
        let record = assert_ok!(JobRecord::build(
            &registry,
            &JobType::of::<Resize>(),
            &arguments()
        ));
        let after = Utc::now().timestamp();

        let created_at = record.created_at().map(|at| at.timestamp()).unwrap();
        assert!(before <= created_at && created_at <= after);
        assert_eq!(record.job_type(), "resize_image");
        assert_eq!(assert_ok!(record.arguments()), arguments());
    }

    #[test]
    fn fixed_clock_is_deterministic() {
        let registry = JobRegistry::new().register::<Resize>();
        let at = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();

        let record = assert_ok!(JobRecord::build_at(
            &registry,
            &JobType::of::<Resize>(),
            &arguments(),
            at
        ));

        assert_eq!(record.created_at_raw(), "1700000000");
        assert_eq!(record.args(), r#"{"Crop":null,"Width":"640"}"#);
        assert_some_eq!(record.created_at(), at);
    }

    #[test]
    fn unregistered_types_build_nothing() {
        let registry = JobRegistry::new();

        let result = JobRecord::build(&registry, &JobType::of::<Resize>(), &arguments());

        assert_matches!(result, Err(EnqueueError::UnsupportedJobType { .. }));
    }

    #[test]
    fn fields_round_trip() {
        let registry = JobRegistry::new().register::<Resize>();
        let record = assert_ok!(JobRecord::build(
            &registry,
            &JobType::of::<Resize>(),
            &Arguments::new()
        ));

        let fields: BTreeMap<String, String> = record.to_fields().into_iter().collect();
        assert_eq!(JobRecord::from_fields(&fields), Some(record));

        let mut partial = fields;
        partial.remove("Args");
        assert_none!(JobRecord::from_fields(&partial));
    }
}
