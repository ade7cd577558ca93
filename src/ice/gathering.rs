use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use crate::ice::CandidateLine;

const DISCOVERY_TARGET: (&str, u16) = ("8.8.8.8", 80);
const UNSPECIFIED_BIND: &str = "0.0.0.0:0";
const RTP_COMPONENT: u8 = 1;

/// Gathers host candidates: the primary egress IPv4 interface and, when
/// `include_loopback` is set, 127.0.0.1. Each candidate gets a fresh
/// ephemeral port that is released again immediately; the engine behind the
/// adapter is responsible for binding when it actually runs checks.
#[must_use]
pub fn gather_host_candidates(include_loopback: bool) -> Vec<CandidateLine> {
    let mut out = Vec::new();

    if let Ok(ip) = discover_local_ipv4()
        && let Ok(addr) = ephemeral_addr(ip)
    {
        out.push(CandidateLine::host(addr, RTP_COMPONENT));
    }

    if include_loopback && let Ok(addr) = ephemeral_addr(IpAddr::V4(Ipv4Addr::LOCALHOST)) {
        out.push(CandidateLine::host(addr, RTP_COMPONENT));
    }

    out
}

/// Primary IPv4 address, found by "connecting" a UDP socket (no packet is sent).
fn discover_local_ipv4() -> io::Result<IpAddr> {
    let probe = UdpSocket::bind(UNSPECIFIED_BIND)?;
    probe.connect(DISCOVERY_TARGET)?;
    let ip = probe.local_addr()?.ip();
    if ip.is_loopback() || !ip.is_ipv4() || ip.is_unspecified() {
        return Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "no routable IPv4 interface",
        ));
    }
    Ok(ip)
}

fn ephemeral_addr(ip: IpAddr) -> io::Result<SocketAddr> {
    UdpSocket::bind(SocketAddr::new(ip, 0))?.local_addr()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_candidate_is_always_available() {
        let cands = gather_host_candidates(true);
        assert!(
            cands.iter().any(|c| c.address.ip().is_loopback()),
            "expected a loopback host candidate"
        );
        assert!(cands.iter().all(|c| c.address.port() != 0));
    }
}
