//! Parsing of the address strings the balancer deals with: client socket
//! addresses handed over by the listener and backend addresses stored in the
//! registry.

use std::net::IpAddr;

use http::uri::Authority;
use http::Uri;

/// Splits `host:port` into its two halves.
///
/// IPv6 hosts must be bracketed (`[::1]:8080`). Returns `None` when there is
/// no port separator or the host part is an unbracketed IPv6 literal.
pub fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        let port = tail.strip_prefix(':')?;
        return Some((host, port));
    }

    let (host, port) = addr.rsplit_once(':')?;
    if host.contains(':') {
        return None;
    }
    Some((host, port))
}

/// IP portion of a client address such as `192.168.1.20:51234`.
pub fn client_ip(addr: &str) -> Option<IpAddr> {
    let (host, _port) = split_host_port(addr)?;
    host.parse().ok()
}

/// Authority (`host[:port]`) of a backend address.
///
/// Both `http://10.0.0.1:8001` and the bare `10.0.0.1:8001` forms are
/// accepted; any scheme is discarded by the caller.
pub fn backend_authority(addr: &str) -> Option<Authority> {
    let uri: Uri = addr.parse().ok()?;
    uri.authority().cloned()
}

/// Host IP of a backend address, or `None` if the address has no explicit
/// port or its host is not an IP literal.
pub fn backend_ip(addr: &str) -> Option<IpAddr> {
    let authority = backend_authority(addr)?;
    authority.port_u16()?;
    authority
        .host()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .ok()
}
