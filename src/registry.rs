use std::sync::Arc;

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::address;
use crate::strategies::{DistanceMetric, OctetDistance};

/// Ordered backend list plus the round-robin cursor.
///
/// `cursor < servers.len()` whenever `servers` is non-empty.
#[derive(Debug, Default)]
struct Inner {
    servers: Vec<String>,
    cursor: usize,
}

impl Inner {
    fn next_round_robin(&mut self) -> Option<String> {
        if self.servers.is_empty() {
            return None;
        }

        // The list may have changed size since the cursor was last advanced.
        let index = self.cursor % self.servers.len();
        let server = self.servers[index].clone();
        self.cursor = (index + 1) % self.servers.len();
        Some(server)
    }
}

/// Thread-safe source of truth for which backend to use next.
///
/// Every operation takes the single internal lock for its own duration only,
/// so callers never hold it across I/O.
pub struct ServerRegistry {
    inner: Mutex<Inner>,
    metric: Arc<dyn DistanceMetric>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::with_metric(Arc::new(OctetDistance::new()))
    }

    pub fn with_metric(metric: Arc<dyn DistanceMetric>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            metric,
        }
    }

    pub fn from_servers<I, S>(servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for server in servers {
            registry.add_server(server);
        }
        registry
    }

    /// Appends a backend. The address is not validated here; a malformed one
    /// is skipped by intelligent selection and fails at forward time.
    pub fn add_server(&self, address: impl Into<String>) {
        self.inner.lock().servers.push(address.into());
    }

    /// Next backend in cyclic order, or `None` if the registry is empty.
    pub fn next_round_robin(&self) -> Option<String> {
        self.inner.lock().next_round_robin()
    }

    /// Backend closest to `client_addr` (`host:port`) under the configured
    /// metric. The first of several equally close backends wins.
    ///
    /// A client address without a usable IP falls back to round-robin.
    /// Backends whose address has no `host:port` IP form are skipped; if none
    /// remain the result is `None`.
    pub fn next_intelligent(&self, client_addr: &str) -> Option<String> {
        let mut inner = self.inner.lock();
        if inner.servers.is_empty() {
            return None;
        }

        let Some(client_ip) = address::client_ip(client_addr) else {
            return inner.next_round_robin();
        };

        let mut closest: Option<(&String, u64)> = None;
        for server in &inner.servers {
            let Some(distance) = address::backend_ip(server)
                .and_then(|backend_ip| self.metric.distance(client_ip, backend_ip))
            else {
                continue;
            };

            match closest {
                Some((_, best)) if distance >= best => {}
                _ => closest = Some((server, distance)),
            }
        }

        closest.map(|(server, _)| server.clone())
    }

    /// Uniformly permutes the backend list in place. The cursor is left where
    /// it was, so it may now point at a different backend.
    pub fn shuffle(&self) {
        self.shuffle_with(&mut rand::thread_rng());
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&self, rng: &mut R) {
        self.inner.lock().servers.shuffle(rng);
    }

    /// Copy of the current backend order.
    pub fn servers(&self) -> Vec<String> {
        self.inner.lock().servers.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().servers.is_empty()
    }

    pub fn metric_name(&self) -> &'static str {
        self.metric.name()
    }
}

impl Default for ServerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerRegistry")
            .field("servers", &self.inner.lock().servers)
            .field("metric", &self.metric.name())
            .finish()
    }
}
