use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use http::header::HeaderValue;
use http::uri::PathAndQuery;
use hyper::client::HttpConnector;
use hyper::{Body, Client, HeaderMap, Request, Response, Uri};
use tracing::{debug, warn};

use crate::address;
use crate::error::DispatchError;
use crate::registry::ServerRegistry;

/// Backend selection policy a dispatcher is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    RoundRobin,
    Intelligent,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::RoundRobin => "round-robin",
            Algorithm::Intelligent => "intelligent",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round-robin" => Ok(Algorithm::RoundRobin),
            "intelligent" => Ok(Algorithm::Intelligent),
            other => Err(DispatchError::InvalidAlgorithm(other.to_string())),
        }
    }
}

/// Applies one bound policy to every request it handles and forwards the
/// request to the chosen backend.
pub struct Dispatcher {
    registry: Arc<ServerRegistry>,
    tag: String,
    algorithm: Option<Algorithm>,
    client: Client<HttpConnector, Body>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ServerRegistry>, algorithm: Algorithm) -> Self {
        Self::from_tag(registry, algorithm.as_str())
    }

    /// Binds a dispatcher to an algorithm name as written in configuration.
    /// An unknown name is kept and rejected per request with a 400.
    pub fn from_tag(registry: Arc<ServerRegistry>, tag: &str) -> Self {
        Self {
            registry,
            tag: tag.to_string(),
            algorithm: tag.parse().ok(),
            client: Client::new(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Relays `req` and always produces a response: the backend's on success,
    /// otherwise an error response whose status reflects the failure.
    pub async fn handle(&self, req: Request<Body>, client_addr: &str) -> Response<Body> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        match self.try_handle(req, client_addr).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    client = client_addr,
                    %method,
                    path = %path,
                    algorithm = %self.tag,
                    status = e.status().as_u16(),
                    "request failed: {}",
                    e
                );
                e.into_response()
            }
        }
    }

    pub async fn try_handle(
        &self,
        req: Request<Body>,
        client_addr: &str,
    ) -> Result<Response<Body>, DispatchError> {
        let algorithm = self
            .algorithm
            .ok_or_else(|| DispatchError::InvalidAlgorithm(self.tag.clone()))?;

        // Selection holds the registry lock only inside these calls.
        let backend = match algorithm {
            Algorithm::RoundRobin => self.registry.next_round_robin(),
            Algorithm::Intelligent => self.registry.next_intelligent(client_addr),
        }
        .ok_or(DispatchError::NoAvailableBackend)?;

        debug!(
            client = client_addr,
            method = %req.method(),
            uri = %req.uri(),
            %algorithm,
            backend = %backend,
            "forwarding request"
        );

        let outbound = build_outbound_request(req, &backend).map_err(|source| {
            DispatchError::RequestConstruction {
                backend: backend.clone(),
                source,
            }
        })?;

        let resp = self.send(outbound, &backend).await?;
        debug!(backend = %backend, status = resp.status().as_u16(), "backend responded");

        Ok(relay_response(resp))
    }

    async fn send(
        &self,
        outbound: Request<Body>,
        backend: &str,
    ) -> Result<Response<Body>, DispatchError> {
        let request = self.client.request(outbound);
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, request).await.map_err(|_| {
                DispatchError::BackendTimeout {
                    backend: backend.to_string(),
                    timeout,
                }
            })?,
            None => request.await,
        };

        result.map_err(|source| DispatchError::BackendTransport {
            backend: backend.to_string(),
            source,
        })
    }
}

/// Rewrites `req` to target `backend` over plain HTTP, keeping method, body,
/// headers, path and query.
pub fn build_outbound_request(
    req: Request<Body>,
    backend: &str,
) -> Result<Request<Body>, http::Error> {
    let authority = address::backend_authority(backend)
        .map(|a| a.to_string())
        .unwrap_or_else(|| backend.to_string());

    let path_and_query = req
        .uri()
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));

    let uri = Uri::builder()
        .scheme("http")
        .authority(authority.as_str())
        .path_and_query(path_and_query)
        .build()?;

    let (mut parts, body) = req.into_parts();
    parts.uri = uri;
    strip_hop_by_hop_headers(&mut parts.headers);
    parts
        .headers
        .insert(http::header::HOST, HeaderValue::from_str(&authority)?);

    Ok(Request::from_parts(parts, body))
}

/// Copies status and headers of the backend response onto a fresh response
/// wrapping the same body stream. A header name seen again replaces the value
/// set before it.
pub fn relay_response(resp: Response<Body>) -> Response<Body> {
    let (parts, body) = resp.into_parts();

    let mut out = Response::new(body);
    *out.status_mut() = parts.status;
    let headers = out.headers_mut();
    for (name, value) in parts.headers.iter() {
        headers.insert(name.clone(), value.clone());
    }
    out
}

fn strip_hop_by_hop_headers(headers: &mut HeaderMap) {
    // Connection-scoped headers, RFC 7230 section 6.1
    static HOP_HEADERS: &[&str] = &[
        "connection",
        "proxy-connection",
        "keep-alive",
        "transfer-encoding",
        "upgrade",
        "te",
        "trailer",
    ];
    for name in HOP_HEADERS {
        headers.remove(*name);
    }
}
