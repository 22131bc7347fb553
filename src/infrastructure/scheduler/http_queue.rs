use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::{
    application::services::{scheduler::SchedulerQueue, signing::CallbackSigner},
    domain::events::DueEvent,
};

#[derive(Clone)]
pub struct HttpQueueConfig {
    pub base_url: String,
    pub api_token: String,
    pub callback_url: String,
}

/// Client for an external delayed-delivery queue. Each enqueued job holds a
/// signed token the queue posts back to the callback URL at fire time; the
/// queue redelivers on non-2xx responses, at least once.
pub struct HttpQueueScheduler {
    http: Client,
    config: HttpQueueConfig,
    signer: CallbackSigner,
}

impl HttpQueueScheduler {
    pub fn new(config: HttpQueueConfig, signer: CallbackSigner) -> Arc<dyn SchedulerQueue> {
        Arc::new(Self {
            http: Client::builder()
                .user_agent("outreach/scheduler")
                .build()
                .expect("failed to build queue client"),
            config,
            signer,
        }) as Arc<dyn SchedulerQueue>
    }
}

#[async_trait]
impl SchedulerQueue for HttpQueueScheduler {
    async fn enqueue(&self, fire_at: DateTime<Utc>, event: DueEvent) -> anyhow::Result<String> {
        let token = self.signer.sign(&event, fire_at)?;
        let delay_seconds = (fire_at - Utc::now()).num_seconds().max(0);

        let response = self
            .http
            .post(format!("{}/v1/jobs", self.config.base_url))
            .bearer_auth(&self.config.api_token)
            .json(&json!({
                "url": self.config.callback_url,
                "delay_seconds": delay_seconds,
                "body": { "token": token },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("queue returned {status}: {detail}");
        }

        let payload: JobResponse = response.json().await?;
        Ok(payload.job_id)
    }

    async fn cancel(&self, handle: &str) -> anyhow::Result<()> {
        let response = self
            .http
            .delete(format!("{}/v1/jobs/{}", self.config.base_url, handle))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        // an already-fired job is gone; nothing left to cancel
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            let status = response.status();
            anyhow::bail!("queue cancel returned {status}");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    job_id: String,
}
