use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, StatusCode};
use tracing::{info, warn};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::{response_with_status, ConfigError};
use crate::registry::ServerRegistry;

/// HTTP front end: maps each configured path to its dispatcher.
pub struct LoadBalancer {
    listen: String,
    routes: HashMap<String, Dispatcher>,
}

impl LoadBalancer {
    pub fn new(config: &Config, registry: Arc<ServerRegistry>) -> Self {
        let routes = config
            .routes
            .iter()
            .map(|route| {
                let dispatcher = Dispatcher::from_tag(Arc::clone(&registry), &route.algorithm)
                    .with_timeout(config.request_timeout());
                if dispatcher.algorithm().is_none() {
                    warn!(
                        path = %route.path,
                        algorithm = %route.algorithm,
                        "route bound to unknown algorithm, requests will be rejected"
                    );
                }
                (route.path.clone(), dispatcher)
            })
            .collect();

        Self {
            listen: config.listen.clone(),
            routes,
        }
    }

    /// Routes one request by exact path match.
    pub async fn handle(&self, req: Request<Body>, remote_addr: SocketAddr) -> Response<Body> {
        match self.routes.get(req.uri().path()) {
            Some(dispatcher) => dispatcher.handle(req, &remote_addr.to_string()).await,
            None => response_with_status(StatusCode::NOT_FOUND, "404 page not found"),
        }
    }

    pub async fn start(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self
            .listen
            .parse()
            .map_err(|_| ConfigError::InvalidListen(self.listen.clone()))?;

        let balancer = Arc::new(self);
        let make_svc = make_service_fn(move |conn: &AddrStream| {
            let balancer = Arc::clone(&balancer);
            let remote_addr = conn.remote_addr();

            async move {
                Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                    let balancer = Arc::clone(&balancer);
                    async move { Ok::<_, Infallible>(balancer.handle(req, remote_addr).await) }
                }))
            }
        });

        let server = hyper::Server::try_bind(&addr)?.serve(make_svc);
        info!("HTTP load balancer listening on {}", server.local_addr());

        server.await?;
        Ok(())
    }

    /// Paths served, for startup logging.
    pub fn paths(&self) -> Vec<(&str, &str)> {
        let mut paths: Vec<_> = self
            .routes
            .iter()
            .map(|(path, dispatcher)| (path.as_str(), dispatcher.tag()))
            .collect();
        paths.sort();
        paths
    }
}
