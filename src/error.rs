use std::time::Duration;

use hyper::{Body, Response, StatusCode};

/// Why a single request could not be relayed. Each variant ends that request
/// only; the registry and other in-flight requests are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("No available servers")]
    NoAvailableBackend,

    #[error("invalid outbound request for backend {backend}: {source}")]
    RequestConstruction {
        backend: String,
        #[source]
        source: http::Error,
    },

    #[error("backend {backend} request failed: {source}")]
    BackendTransport {
        backend: String,
        #[source]
        source: hyper::Error,
    },

    #[error("backend {backend} did not respond within {timeout:?}")]
    BackendTimeout { backend: String, timeout: Duration },
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::InvalidAlgorithm(_) => StatusCode::BAD_REQUEST,
            DispatchError::NoAvailableBackend => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::RequestConstruction { .. }
            | DispatchError::BackendTransport { .. }
            | DispatchError::BackendTimeout { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response<Body> {
        response_with_status(self.status(), &self.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid listen address {0:?}")]
    InvalidListen(String),
}

pub(crate) fn response_with_status(status: StatusCode, msg: &str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header("x-content-type-options", "nosniff")
        .body(Body::from(format!("{}\n", msg)))
        .unwrap_or_else(|_| Response::new(Body::from(msg.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_failure_class() {
        assert_eq!(
            DispatchError::InvalidAlgorithm("least-conn".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DispatchError::NoAvailableBackend.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            DispatchError::BackendTimeout {
                backend: "http://10.0.0.1:80".into(),
                timeout: Duration::from_secs(1),
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn error_response_carries_message() {
        let resp = DispatchError::NoAvailableBackend.into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            resp.headers()[http::header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], b"No available servers\n");
    }
}
