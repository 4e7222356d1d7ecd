pub mod octet;
pub mod strategy;

pub use octet::OctetDistance;
pub use strategy::DistanceMetric;
