//! Uma ida e volta de Echo Request/Reply por chamada.
//!
//! Cada chamada a [`EchoTransceiver::ping`] abre um socket novo, envia um único
//! pedido e espera a resposta com o nosso identificador. O prazo é calculado
//! uma vez; datagramas alheios consomem o mesmo orçamento, então a espera
//! total nunca passa do timeout configurado.

use log::{debug, trace, warn};
use std::net::Ipv4Addr;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::checksum;
use crate::error::PingError;
use crate::icmp::{self, ChecksumByteOrderPolicy, IcmpHeader};
use crate::socket::{EchoSocket, RawSocketFactory, SocketFactory};

/// Buffer de recepção (MTU típica)
const RECV_BUFFER_LEN: usize = 1500;

/// Resposta casada com o pedido.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoReply {
    /// Instante de recepção menos o timestamp embutido, em segundos
    pub delay: f64,
    pub source: Option<Ipv4Addr>,
    /// Bytes da mensagem ICMP (sem o cabeçalho IP)
    pub bytes: usize,
    pub header: IcmpHeader,
}

impl EchoReply {
    pub fn delay_ms(&self) -> f64 {
        self.delay * 1000.0
    }
}

/// Dono do identificador e do orçamento de espera de cada rodada.
#[derive(Debug, Clone)]
pub struct EchoTransceiver<F = RawSocketFactory> {
    factory: F,
    identifier: u16,
    timeout: Duration,
    policy: ChecksumByteOrderPolicy,
    strict: bool,
}

impl EchoTransceiver<RawSocketFactory> {
    pub fn new(identifier: u16, timeout: Duration) -> Self {
        Self::with_factory(RawSocketFactory, identifier, timeout)
    }
}

impl<F: SocketFactory> EchoTransceiver<F> {
    pub fn with_factory(factory: F, identifier: u16, timeout: Duration) -> Self {
        Self {
            factory,
            identifier,
            timeout,
            policy: ChecksumByteOrderPolicy::default(),
            strict: false,
        }
    }

    pub fn with_policy(mut self, policy: ChecksumByteOrderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Modo estrito: além do identificador exige type=0, code=0 e checksum
    /// válido. Por padrão qualquer datagrama com o nosso identificador casa.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Envia um Echo Request (sequence 1) para `dst` e bloqueia até a
    /// resposta ou o timeout.
    pub fn ping(&self, dst: Ipv4Addr) -> Result<EchoReply, PingError> {
        let mut sock = self.factory.open().map_err(PingError::Socket)?;

        let pkt = icmp::encode(self.identifier, icmp::ECHO_SEQUENCE, unix_now(), self.policy);
        sock.send_to(&pkt, dst).map_err(PingError::Socket)?;
        debug!("echo request enviado para {} (ident={:#06x})", dst, self.identifier);

        // O socket é fechado no drop, casando ou não
        self.await_reply(&mut sock)
    }

    fn await_reply<S: EchoSocket>(&self, sock: &mut S) -> Result<EchoReply, PingError> {
        let mut buf = [0u8; RECV_BUFFER_LEN];
        let deadline = Instant::now() + self.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(PingError::Timeout(self.timeout));
            }

            let n = match sock.recv_within(&mut buf, remaining).map_err(PingError::Socket)? {
                Some(n) => n,
                None => continue,
            };
            let received_at = unix_now();
            trace!("{} bytes recebidos", n);

            if let Some(reply) = self.match_reply(&buf[..n], received_at) {
                return Ok(reply);
            }
        }
    }

    // None = não é nosso (ou não dá para ler); continua esperando
    fn match_reply(&self, datagram: &[u8], received_at: f64) -> Option<EchoReply> {
        let header = match icmp::decode_reply_header(datagram) {
            Ok(h) => h,
            Err(e) => {
                debug!("datagrama ignorado: {}", e);
                return None;
            }
        };

        if header.identifier != self.identifier {
            trace!(
                "identificador {:#06x} não é o nosso ({:#06x})",
                header.identifier, self.identifier
            );
            return None;
        }

        if self.strict {
            if !header.is_echo_reply() {
                debug!(
                    "modo estrito: type={} code={} ignorado",
                    header.icmp_type, header.code
                );
                return None;
            }
            if !checksum::is_valid(icmp::icmp_message(datagram)) {
                debug!("modo estrito: checksum inválido ({:#06x})", header.checksum);
                return None;
            }
        }

        let sent_at = match icmp::decode_timestamp(datagram) {
            Ok(t) => t,
            Err(e) => {
                debug!("resposta sem timestamp: {}", e);
                return None;
            }
        };

        Some(EchoReply {
            delay: received_at - sent_at,
            source: icmp::source_address(datagram),
            bytes: datagram.len() - icmp::IPV4_HEADER_LEN,
            header,
        })
    }
}

/// Relógio de parede em segundos desde a época Unix.
fn unix_now() -> f64 {
    epoch_seconds(SystemTime::now())
}

// Antes da época vira valor negativo: envio e recepção usam o mesmo relógio,
// então a diferença continua certa.
fn epoch_seconds(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => {
            warn!("relógio do sistema antes da época Unix ({:?})", e.duration());
            -e.duration().as_secs_f64()
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::icmp::fake_reply;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::rc::Rc;

    /// O que chega pelo socket falso, em ordem.
    #[derive(Debug, Clone, Copy)]
    pub enum Arrival {
        /// Resposta derivada do último pedido enviado
        Reply {
            after: Duration,
            icmp_type: u8,
            ident: Option<u16>,
        },
        /// Lixo curto demais para ter cabeçalho
        Garbage { after: Duration },
    }

    impl Arrival {
        pub fn reply(after_ms: u64) -> Self {
            Self::Reply {
                after: Duration::from_millis(after_ms),
                icmp_type: icmp::ECHO_REPLY,
                ident: None,
            }
        }

        pub fn foreign(after_ms: u64, ident: u16) -> Self {
            Self::Reply {
                after: Duration::from_millis(after_ms),
                icmp_type: icmp::ECHO_REPLY,
                ident: Some(ident),
            }
        }

        pub fn own_request(after_ms: u64) -> Self {
            Self::Reply {
                after: Duration::from_millis(after_ms),
                icmp_type: icmp::ECHO_REQUEST,
                ident: None,
            }
        }

        fn after(&self) -> Duration {
            match *self {
                Self::Reply { after, .. } | Self::Garbage { after } => after,
            }
        }

        fn with_after(self, after: Duration) -> Self {
            match self {
                Self::Reply {
                    icmp_type, ident, ..
                } => Self::Reply {
                    after,
                    icmp_type,
                    ident,
                },
                Self::Garbage { .. } => Self::Garbage { after },
            }
        }
    }

    /// Socket em memória: dorme o tempo pedido como um poll de verdade.
    pub struct ScriptedSocket {
        arrivals: VecDeque<Arrival>,
        last_request: Option<Vec<u8>>,
        sent: Rc<RefCell<Vec<Vec<u8>>>>,
        corrupt: bool,
    }

    impl ScriptedSocket {
        pub fn corrupting_checksum(mut self) -> Self {
            self.corrupt = true;
            self
        }
    }

    impl EchoSocket for ScriptedSocket {
        fn send_to(&mut self, packet: &[u8], _dst: Ipv4Addr) -> io::Result<usize> {
            self.last_request = Some(packet.to_vec());
            self.sent.borrow_mut().push(packet.to_vec());
            Ok(packet.len())
        }

        fn recv_within(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
            let Some(next) = self.arrivals.pop_front() else {
                std::thread::sleep(timeout);
                return Ok(None);
            };
            if next.after() > timeout {
                std::thread::sleep(timeout);
                self.arrivals.push_front(next.with_after(next.after() - timeout));
                return Ok(None);
            }
            std::thread::sleep(next.after());

            let datagram = match next {
                Arrival::Garbage { .. } => vec![0x45; 12],
                Arrival::Reply {
                    icmp_type, ident, ..
                } => {
                    let req = self
                        .last_request
                        .as_deref()
                        .ok_or_else(|| io::Error::other("nada enviado ainda"))?;
                    let ident = ident.unwrap_or_else(|| u16::from_be_bytes([req[4], req[5]]));
                    let mut d = fake_reply(req, icmp_type, ident);
                    if self.corrupt {
                        d[icmp::TIMESTAMP_END - 1] ^= 0xFF;
                    }
                    d
                }
            };
            buf[..datagram.len()].copy_from_slice(&datagram);
            Ok(Some(datagram.len()))
        }
    }

    /// Entrega um socket roteirizado por chamada a `open`.
    #[derive(Default)]
    pub struct ScriptedFactory {
        rounds: RefCell<VecDeque<ScriptedSocket>>,
        pub sent: Rc<RefCell<Vec<Vec<u8>>>>,
        pub refuse: bool,
    }

    impl ScriptedFactory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn refusing() -> Self {
            Self {
                refuse: true,
                ..Self::default()
            }
        }

        pub fn round(self, arrivals: &[Arrival]) -> Self {
            let sock = self.socket(arrivals);
            self.push(sock)
        }

        pub fn socket(&self, arrivals: &[Arrival]) -> ScriptedSocket {
            ScriptedSocket {
                arrivals: arrivals.iter().copied().collect(),
                last_request: None,
                sent: Rc::clone(&self.sent),
                corrupt: false,
            }
        }

        pub fn push(self, sock: ScriptedSocket) -> Self {
            self.rounds.borrow_mut().push_back(sock);
            self
        }
    }

    impl SocketFactory for ScriptedFactory {
        type Socket = ScriptedSocket;

        fn open(&self) -> io::Result<ScriptedSocket> {
            if self.refuse {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            // Rodada sem roteiro: silêncio até o timeout
            Ok(self
                .rounds
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| self.socket(&[])))
        }
    }
}
