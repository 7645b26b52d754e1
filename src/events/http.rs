//! HTTP analytics sink
//!
//! Posts each event as JSON to a collector endpoint. Any transport failure or
//! non-2xx status becomes [`GateError::Analytics`]. Each call waits on the
//! collector, so the server runs it behind a [`super::QueuedSink`].

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{EventSink, ProgressEvent};
use crate::types::{GateError, Result};

pub struct HttpEventSink {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpEventSink {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("course-gate/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.to_string(),
            http_client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn emit(&self, event: ProgressEvent) -> Result<()> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&event)
            .send()
            .await
            .map_err(|e| GateError::Analytics(format!("delivery failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GateError::Analytics(format!("collector returned {}", status)));
        }

        debug!(endpoint = %self.endpoint, session_id = %event.session_id, "Delivered progress event");
        Ok(())
    }
}
