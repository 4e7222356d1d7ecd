//! Reverse-proxying HTTP load balancer.
//!
//! A [`ServerRegistry`] holds the backend list and round-robin cursor behind a
//! single lock. Each [`Dispatcher`] is bound to one [`Algorithm`], picks a
//! backend from the registry, forwards the request over plain HTTP and relays
//! the response. [`LoadBalancer`] maps inbound paths to dispatchers.

pub mod address;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod load_balancer;
pub mod registry;
pub mod strategies;

pub use config::{Config, RouteConfig};
pub use dispatcher::{Algorithm, Dispatcher};
pub use error::{ConfigError, DispatchError};
pub use load_balancer::LoadBalancer;
pub use registry::ServerRegistry;
pub use strategies::{DistanceMetric, OctetDistance};
