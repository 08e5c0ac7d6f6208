// src/scheduler.rs
//! Background job table: named jobs on fixed-interval or daily-at-hour
//! triggers, each run once immediately at startup and then on schedule.
//!
//! Jobs are idempotent and independently retryable; a tick that produces no
//! data just logs and waits for the next one. There is no mutual exclusion
//! between ticks of the same job — a slow run may overlap the next tick.

use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use metrics::{counter, gauge};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub type JobFn = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// When a job fires again after a completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fixed period between tick starts.
    Every(Duration),
    /// Once per day at the given UTC wall-clock time.
    DailyAt { hour: u32, minute: u32 },
}

impl Trigger {
    /// Delay from `now` until the next tick. For `DailyAt` the result is
    /// always in `(0, 24h]`: if today's trigger time has passed, tomorrow's
    /// is used.
    pub fn next_delay(&self, now: DateTime<Utc>) -> Duration {
        match *self {
            Trigger::Every(period) => period,
            Trigger::DailyAt { hour, minute } => {
                let today_target = now
                    .with_hour(hour)
                    .and_then(|t| t.with_minute(minute))
                    .and_then(|t| t.with_second(0))
                    .and_then(|t| t.with_nanosecond(0))
                    .unwrap_or(now);
                let target = if today_target > now {
                    today_target
                } else {
                    today_target + ChronoDuration::days(1)
                };
                (target - now).to_std().unwrap_or(Duration::from_secs(1))
            }
        }
    }
}

pub struct Job {
    pub name: &'static str,
    pub trigger: Trigger,
    task: JobFn,
}

impl Job {
    pub fn new<F, Fut>(name: &'static str, trigger: Trigger, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            name,
            trigger,
            task: Arc::new(move || {
                let fut: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(f());
                fut
            }),
        }
    }
}

/// Spawn every job onto the runtime. Each handle runs its job once
/// immediately (cold-start population), then sleeps until the next trigger.
pub fn spawn_jobs(jobs: Vec<Job>) -> Vec<JoinHandle<()>> {
    jobs.into_iter().map(spawn_job).collect()
}

fn spawn_job(job: Job) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_tick(&job).await;
        loop {
            let delay = job.trigger.next_delay(Utc::now());
            tokio::time::sleep(delay).await;
            run_tick(&job).await;
        }
    })
}

async fn run_tick(job: &Job) {
    tracing::info!(job = job.name, "scheduled job tick");
    counter!("scheduler_runs_total", "job" => job.name).increment(1);
    (job.task)().await;
    let now = Utc::now().timestamp().max(0) as f64;
    gauge!("scheduler_last_run_ts", "job" => job.name).set(now);
}
