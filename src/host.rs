use log::debug;
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};

use crate::error::PingError;

/// Resolve um nome (ou IPv4 literal) para o primeiro endereço IPv4.
pub fn resolve(host: &str) -> Result<Ipv4Addr, PingError> {
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(ip);
    }

    // Porta fictícia só para o resolvedor
    let addrs = (host, 0).to_socket_addrs().map_err(|e| PingError::Resolution {
        host: host.to_string(),
        source: Some(e),
    })?;

    let ip = addrs
        .filter_map(|sa| match sa.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| PingError::Resolution {
            host: host.to_string(),
            source: None,
        })?;

    debug!("{} resolvido para {}", host, ip);
    Ok(ip)
}

/// Identificador: usa o PID do processo (16 bits baixos)
pub fn current_identifier() -> u16 {
    (std::process::id() & 0xFFFF) as u16
}
