use std::net::IpAddr;

use super::strategy::DistanceMetric;

/// Squared Euclidean distance between two IPv4 addresses in octet space:
/// `Σ (a_i - b_i)²` over the four octets.
///
/// A heuristic over address octets, not network topology. IPv4-mapped IPv6
/// addresses are compared as IPv4; any other IPv6 address is incomparable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OctetDistance;

impl OctetDistance {
    pub fn new() -> Self {
        Self
    }
}

impl DistanceMetric for OctetDistance {
    fn distance(&self, client: IpAddr, backend: IpAddr) -> Option<u64> {
        let (IpAddr::V4(client), IpAddr::V4(backend)) =
            (client.to_canonical(), backend.to_canonical())
        else {
            return None;
        };

        let distance = client
            .octets()
            .iter()
            .zip(backend.octets().iter())
            .map(|(&a, &b)| {
                let diff = u64::from(a.abs_diff(b));
                diff * diff
            })
            .sum();
        Some(distance)
    }

    fn name(&self) -> &'static str {
        "octet"
    }
}
