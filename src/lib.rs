//! Cliente ICMP Echo (IPv4, raw socket): envia um Echo Request por vez,
//! espera a resposta com o mesmo identificador e mede o atraso.
//!
//! Requer privilégios para abrir socket RAW (root/CAP_NET_RAW, ou
//! Administrador no Windows).

pub mod checksum;
pub mod error;
pub mod host;
pub mod icmp;
pub mod runner;
pub mod socket;
pub mod stats;
pub mod transceiver;

pub use error::{DecodeError, PingError};
pub use icmp::ChecksumByteOrderPolicy;
pub use runner::{RoundOutcome, Schedule};
pub use stats::PingStats;
pub use transceiver::{EchoReply, EchoTransceiver};
