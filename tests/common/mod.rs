//! Throwaway hyper backends for end-to-end tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};

/// A backend that counts the requests it receives.
pub struct TestBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl TestBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Answers `200 ok` with `X-Test: 1` and echoes what it saw in `x-echo-*`
/// headers. `/teapot` answers 418, `/dup` sends `x-dup` twice and `/slow`
/// waits two seconds first.
pub async fn spawn_backend() -> TestBackend {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let make_svc = make_service_fn(move |_conn| {
        let counter = Arc::clone(&counter);
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    respond(req).await
                }
            }))
        }
    });

    let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
    let addr = server.local_addr();
    tokio::spawn(server);

    TestBackend { addr, hits }
}

async fn respond(req: Request<Body>) -> Result<Response<Body>, hyper::Error> {
    let method = req.method().to_string();
    let uri = req.uri().to_string();
    let host = req
        .headers()
        .get(hyper::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let custom = req
        .headers()
        .get("x-custom")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let path = req.uri().path().to_string();
    let body = hyper::body::to_bytes(req.into_body()).await?;

    let mut builder = Response::builder()
        .header("x-test", "1")
        .header("x-echo-method", method)
        .header("x-echo-uri", uri)
        .header("x-echo-host", host)
        .header("x-echo-custom", custom)
        .header("x-echo-body", String::from_utf8_lossy(&body).into_owned());

    match path.as_str() {
        "/teapot" => builder = builder.status(StatusCode::IM_A_TEAPOT),
        "/dup" => builder = builder.header("x-dup", "first").header("x-dup", "second"),
        "/slow" => tokio::time::sleep(Duration::from_secs(2)).await,
        _ => {}
    }

    Ok(builder.body(Body::from("ok")).unwrap())
}

/// An address on which nothing is listening.
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

pub async fn body_string(resp: Response<Body>) -> String {
    let bytes = hyper::body::to_bytes(resp.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
