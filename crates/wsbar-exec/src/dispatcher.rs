use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::contracts::command_request_body;
use crate::ports::CommandDispatcher;
use crate::ports::HttpPort;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("command service responded with status {0}")]
    Status(u16),
}

/// Posts command text to the command service as `{"command": ..}`.
pub struct RestCommandDispatcher {
    http: Arc<dyn HttpPort>,
    path: String,
}

impl RestCommandDispatcher {
    pub fn new(http: Arc<dyn HttpPort>, path: impl Into<String>) -> Self {
        Self {
            http,
            path: path.into(),
        }
    }

    pub async fn send(&self, command_text: &str) -> Result<(), DispatchError> {
        let body = command_request_body(command_text);

        let response = self
            .http
            .post_json(&self.path, &body)
            .await
            .map_err(|err| DispatchError::Transport(err.0))?;

        if !response.is_success() {
            return Err(DispatchError::Status(response.status));
        }
        Ok(())
    }
}

#[async_trait]
impl CommandDispatcher for RestCommandDispatcher {
    async fn dispatch(&self, command_text: String) {
        match self.send(&command_text).await {
            Ok(()) => info!(command = %command_text, "command accepted"),
            Err(err) => warn!(command = %command_text, error = %err, "command dispatch failed"),
        }
    }
}
