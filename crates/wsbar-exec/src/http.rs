use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::header::CACHE_CONTROL;
use reqwest::header::COOKIE;
use reqwest::Client;
use reqwest::Request;
use reqwest::RequestBuilder;
use reqwest::Response;
use serde_json::Value;

use crate::ports::HttpPort;
use crate::ports::HttpResponse;
use crate::ports::TransportError;

/// [`HttpPort`] backed by reqwest. Relative paths resolve against `base_url`.
#[derive(Clone)]
pub struct ReqwestHttp {
    client: Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl ReqwestHttp {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            session_cookie: None,
        }
    }

    /// Sends `name=value` as a cookie on every request.
    pub fn with_session_cookie(mut self, name: &str, value: &str) -> Self {
        self.session_cookie = Some(format!("{name}={value}"));
        self
    }

    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, TransportError> {
        match &self.session_cookie {
            Some(cookie) => {
                let value = HeaderValue::from_str(cookie)
                    .map_err(|err| TransportError(format!("invalid session cookie: {err}")))?;
                Ok(request.header(COOKIE, value))
            }
            None => Ok(request),
        }
    }

    /// Session GETs always bypass caches so each attempt reaches the server.
    fn get_request(&self, path: &str) -> Result<Request, TransportError> {
        let request = self
            .client
            .get(self.resolve(path))
            .header(CACHE_CONTROL, "no-cache");
        self.authorize(request)?
            .build()
            .map_err(|err| TransportError(format!("invalid GET {path}: {err}")))
    }

    fn post_request(&self, path: &str, body: &Value) -> Result<Request, TransportError> {
        let request = self.client.post(self.resolve(path)).json(body);
        self.authorize(request)?
            .build()
            .map_err(|err| TransportError(format!("invalid POST {path}: {err}")))
    }
}

async fn into_response(response: Response) -> Result<HttpResponse, TransportError> {
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|err| TransportError(format!("failed to read response body: {err}")))?;
    Ok(HttpResponse {
        status,
        body: body.to_vec(),
    })
}

#[async_trait]
impl HttpPort for ReqwestHttp {
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        let request = self.get_request(path)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| TransportError(format!("GET {path} failed: {err}")))?;
        into_response(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<HttpResponse, TransportError> {
        let request = self.post_request(path, body)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| TransportError(format!("POST {path} failed: {err}")))?;
        into_response(response).await
    }
}
