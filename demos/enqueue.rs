//! Submits a few jobs and prints what was recorded.
//!
//! Uses the in-memory store, so no setup is required:
//!
//! ```bash
//! RUST_LOG=workers_client=trace cargo run --example enqueue
//! ```

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use workers_client::storage::memory::MemoryStore;
use workers_client::storage;
use workers_client::{
    Arguments, BackgroundJob, ClientFilter, ConversionError, CreateContext, JobClient, JobCreator,
    JobRegistry, PipelineError, StorageOptions, ToArguments,
};

/// Example job that sends a notification to a user
#[derive(Serialize)]
struct NotificationJob {
    user_id: u64,
    message: String,
    notification_type: String,
}

impl ToArguments for NotificationJob {
    fn to_arguments(&self) -> Result<Arguments, ConversionError> {
        Arguments::from_serialize(self)
    }
}

impl BackgroundJob for NotificationJob {
    const JOB_NAME: &'static str = "notification";
    const QUEUE: &'static str = "notifications";
}

/// Example job that settles a payment
struct PaymentJob {
    transaction_id: String,
    amount: f64,
    due: DateTime<Utc>,
}

impl ToArguments for PaymentJob {
    fn to_arguments(&self) -> Result<Arguments, ConversionError> {
        Arguments::new()
            .push("transaction_id", &self.transaction_id)?
            .push("amount", &self.amount)?
            .push("due", &self.due)
    }
}

impl BackgroundJob for PaymentJob {
    const JOB_NAME: &'static str = "payment";
}

/// Logs every job as it is created
struct AuditFilter;

impl ClientFilter for AuditFilter {
    fn on_creating(&self, context: &mut CreateContext<'_>) -> Result<(), PipelineError> {
        info!(job.id = context.job_id(), job.type = context.record().job_type(), "Creating job");
        Ok(())
    }

    fn on_created(&self, context: &CreateContext<'_>, outcome: Result<(), &PipelineError>) {
        if let Err(error) = outcome {
            info!(job.id = context.job_id(), %error, "Job was not created");
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = StorageOptions::from_env();
    let store = MemoryStore::new();
    let registry = JobRegistry::new()
        .register::<NotificationJob>()
        .register::<PaymentJob>();
    let pipeline = JobCreator::new(&options).filter(AuditFilter);

    let mut client = JobClient::new(&store, registry, pipeline)?;

    for user_id in 1..=3 {
        let job = NotificationJob {
            user_id,
            message: format!("Welcome aboard, user {user_id}!"),
            notification_type: "email".into(),
        };
        job.enqueue(&mut client)?;
    }

    let payment = PaymentJob {
        transaction_id: "tx-1001".into(),
        amount: 1299.95,
        due: Utc::now(),
    };
    payment.enqueue_with_id(&mut client, "payment-tx-1001")?;

    if let Err(error) = payment.enqueue_with_id(&mut client, "payment-tx-1001") {
        info!(%error, "Second submission rejected");
    }

    client.close();

    let mut conn = store.connection();
    for queue in storage::queues(&mut conn, &options.key_prefix)? {
        let ids = storage::enqueued_job_ids(&mut conn, &options.key_prefix, &queue)?;
        println!("{queue}: {} job(s)", ids.len());

        for id in ids {
            if let Some(job) = storage::get_job(&mut conn, &options.key_prefix, &id)? {
                println!("  {id} {} {}", job.record.job_type(), job.record.args());
            }
        }
    }

    Ok(())
}
