use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[async_trait]
pub trait HttpPort: Send + Sync {
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<HttpResponse, TransportError>;
}

/// Boundary to the external command-execution service. Fire-and-forget: any
/// failure is the service's to report.
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(&self, command_text: String);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// The externally owned auth context.
pub trait AuthProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;

    fn sign_out(&self);
}
