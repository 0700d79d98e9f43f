use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::UdpSocket;

use crate::ClientError;
use crate::Result;

/// PAC script sending every request through the given local proxies, in
/// order. No ports means go direct.
pub fn build_pac(
    local_ip: IpAddr,
    ports: &[u16],
) -> String {
    let proxies = if ports.is_empty() {
        "DIRECT".to_string()
    } else {
        ports
            .iter()
            .map(|port| format!("PROXY {}:{}", local_ip, port))
            .collect::<Vec<_>>()
            .join("; ")
    };

    format!(
        "function FindProxyForURL(url, host) {{\n    return \"{}\";\n}}",
        proxies
    )
}

/// IPv4 address of the interface carrying the default route.
///
/// Connecting a UDP socket only selects a route; nothing is sent.
pub fn local_ipv4() -> Result<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket
        .connect((Ipv4Addr::new(192, 0, 2, 1), 9))
        .map_err(|_| ClientError::NoLocalAddress)?;

    match socket.local_addr()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Ok(ip),
        _ => Err(ClientError::NoLocalAddress.into()),
    }
}
