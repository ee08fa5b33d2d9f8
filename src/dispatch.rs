use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::providers::PreparedRequest;
use crate::providers::http_errors::endpoint_request_error;

#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub endpoint_url: String,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
    pub insecure_skip_verify: bool,
}

impl DispatchRequest {
    pub fn new(
        endpoint_url: impl Into<String>,
        prepared: PreparedRequest,
        insecure_skip_verify: bool,
    ) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            body: prepared.body,
            headers: prepared.headers,
            insecure_skip_verify,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<RawResponse>> + 'a>>;

pub trait Transport {
    fn send<'a>(&'a self, request: &'a DispatchRequest) -> TransportFuture<'a>;
}

/// Sends the request with reqwest. A client is built per call since each
/// process issues a single request.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport {
    timeout_secs: Option<u64>,
}

impl HttpTransport {
    pub fn new(timeout_secs: Option<u64>) -> Self {
        Self { timeout_secs }
    }

    fn client(&self, insecure_skip_verify: bool) -> Result<Client> {
        let mut builder = Client::builder();
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if insecure_skip_verify {
            eprintln!(
                "WARNING: TLS certificate verification is DISABLED (insecure_skip_verify=true). \
                 Responses could come from an impostor endpoint."
            );
            warn!("tls certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder.build().context("Failed to initialize HTTP client")
    }
}

impl Transport for HttpTransport {
    fn send<'a>(&'a self, request: &'a DispatchRequest) -> TransportFuture<'a> {
        Box::pin(async move {
            let client = self.client(request.insecure_skip_verify)?;
            let map_err = |err: reqwest::Error| {
                warn!(
                    endpoint_url = %request.endpoint_url,
                    error = %err,
                    "endpoint request failed"
                );
                endpoint_request_error(err, &request.endpoint_url, self.timeout_secs)
            };

            let response = client
                .post(&request.endpoint_url)
                .headers(request.headers.clone())
                .body(request.body.clone())
                .send()
                .await
                .map_err(map_err)?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(map_err)?.to_vec();
            Ok(RawResponse {
                status,
                headers,
                body,
            })
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpFailure {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Success { body: Vec<u8> },
    HttpFailure(HttpFailure),
}

#[derive(Debug, Clone)]
pub struct Dispatched {
    pub outcome: DispatchOutcome,
    pub elapsed: Duration,
}

/// Issues one request and classifies the response by status.
pub async fn dispatch<T: Transport + ?Sized>(
    transport: &T,
    request: &DispatchRequest,
) -> Result<Dispatched> {
    debug!(
        endpoint_url = %request.endpoint_url,
        body_len = request.body.len(),
        "sending completion request"
    );

    let started = Instant::now();
    let response = transport.send(request).await?;
    let elapsed = started.elapsed();

    let outcome = if response.status.is_success() {
        debug!(
            status = %response.status,
            response_len = response.body.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "received completion response"
        );
        DispatchOutcome::Success {
            body: response.body,
        }
    } else {
        warn!(
            endpoint_url = %request.endpoint_url,
            status = %response.status,
            response_body_len = response.body.len(),
            "endpoint returned non-success status"
        );
        DispatchOutcome::HttpFailure(HttpFailure {
            status: response.status,
            headers: response.headers,
            body: response.body,
        })
    };

    Ok(Dispatched { outcome, elapsed })
}
