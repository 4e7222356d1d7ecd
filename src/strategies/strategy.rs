use std::net::IpAddr;

/// Proximity measure used by intelligent selection. Lower is closer.
pub trait DistanceMetric: Send + Sync {
    /// `None` means the pair cannot be compared and the backend is left out of
    /// the candidate set.
    fn distance(&self, client: IpAddr, backend: IpAddr) -> Option<u64>;

    fn name(&self) -> &'static str;
}
