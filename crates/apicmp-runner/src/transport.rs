//! HTTP transport

use std::time::Duration;

use apicmp_core::{Body, Headers, RequestBody, ResolvedRequest, ResponseSnapshot};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use tracing::{debug, trace};

use crate::error::{TransportError, TransportResult};

/// Sends a resolved request and captures the response
///
/// Any HTTP status is a successful send; only failures to obtain a response
/// are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: &ResolvedRequest,
        timeout: Duration,
    ) -> TransportResult<ResponseSnapshot>;
}

/// Transport backed by a shared reqwest client
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> TransportResult<Self> {
        let client = Client::builder().build().map_err(TransportError::Client)?;
        Ok(Self { client })
    }

    /// Use an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn capture(request: &ResolvedRequest, response: Response) -> TransportResult<ResponseSnapshot> {
        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                url: request.url.clone(),
                source,
            })?;
        trace!("Read {} body bytes from {}", bytes.len(), final_url);

        Ok(ResponseSnapshot {
            status,
            headers,
            body: Body::decode(&bytes),
            raw: Some(bytes.to_vec()),
            final_url,
            request: request.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &ResolvedRequest,
        timeout: Duration,
    ) -> TransportResult<ResponseSnapshot> {
        let invalid = |reason: String| TransportError::InvalidRequest {
            method: request.method.clone(),
            url: request.url.clone(),
            reason,
        };

        let method =
            Method::from_bytes(request.method.as_bytes()).map_err(|e| invalid(e.to_string()))?;

        let mut builder = self.client.request(method, &request.url).timeout(timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        builder = match &request.body {
            Some(RequestBody::Json(value)) => {
                let bytes = serde_json::to_vec(value).map_err(|e| invalid(e.to_string()))?;
                builder.body(bytes)
            }
            Some(RequestBody::Form(pairs)) => builder.form(pairs),
            Some(RequestBody::Raw(text)) => builder.body(text.clone()),
            None => builder,
        };

        debug!("{} {}", request.method, request.url);
        let response = builder.send().await.map_err(|source| {
            if source.is_timeout() {
                TransportError::Timeout {
                    url: request.url.clone(),
                    seconds: timeout.as_secs_f64(),
                }
            } else if source.is_connect() {
                TransportError::Connect {
                    url: request.url.clone(),
                    source,
                }
            } else if source.is_builder() {
                invalid(source.to_string())
            } else {
                TransportError::Request {
                    url: request.url.clone(),
                    source,
                }
            }
        })?;

        Self::capture(request, response).await
    }
}
