use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    application::{handlers::dispatcher::DispatchHandler, services::scheduler::SchedulerQueue},
    domain::events::DueEvent,
};

/// Tokio-timer scheduler for single-process deployments and local
/// development: one task per job, cancelled by aborting it. Jobs do not
/// survive a restart; production wiring uses the external queue instead.
pub struct InProcessScheduler {
    jobs: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
    handler: Arc<OnceLock<Arc<DispatchHandler>>>,
}

impl InProcessScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            handler: Arc::new(OnceLock::new()),
        })
    }

    /// The dispatch handler is built on top of the scheduler, so it is
    /// attached after construction.
    pub fn attach(&self, handler: Arc<DispatchHandler>) {
        if self.handler.set(handler).is_err() {
            warn!("dispatch handler already attached");
        }
    }
}

#[async_trait]
impl SchedulerQueue for InProcessScheduler {
    async fn enqueue(&self, fire_at: DateTime<Utc>, event: DueEvent) -> anyhow::Result<String> {
        let handle_id = Uuid::new_v4().to_string();
        let delay = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        let jobs = self.jobs.clone();
        let handler_slot = self.handler.clone();
        let id = handle_id.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match handler_slot.get() {
                Some(handler) => {
                    if let Err(err) = handler.handle(event).await {
                        error!(error = ?err, "scheduled dispatch failed");
                    }
                }
                None => warn!("due timer fired with no dispatch handler attached"),
            }
            jobs.lock().await.remove(&id);
        });

        self.jobs.lock().await.insert(handle_id.clone(), task);
        Ok(handle_id)
    }

    async fn cancel(&self, handle: &str) -> anyhow::Result<()> {
        if let Some(task) = self.jobs.lock().await.remove(handle) {
            task.abort();
        }
        Ok(())
    }
}
