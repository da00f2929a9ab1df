// Criação e configuração de sockets de baixo nível
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use std::io::{self, Read};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

// SOCK_RAW é 3 no Linux, macOS e Windows. Usamos o valor direto pois
// Type::RAW só existe com a feature "all" do socket2.
const SOCK_RAW: i32 = 3;

/// O que o transceptor precisa de um socket ICMP.
pub trait EchoSocket {
    fn send_to(&mut self, packet: &[u8], dst: Ipv4Addr) -> io::Result<usize>;

    /// Espera no máximo `timeout` por um datagrama (cabeçalho IP incluso).
    /// `Ok(None)` quando o prazo acaba sem dados.
    fn recv_within(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>>;
}

/// Abre um socket novo para cada rodada.
pub trait SocketFactory {
    type Socket: EchoSocket;

    fn open(&self) -> io::Result<Self::Socket>;
}

/// Fábrica de sockets ICMP RAW do sistema.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSocketFactory;

impl SocketFactory for RawSocketFactory {
    type Socket = RawIcmpSocket;

    fn open(&self) -> io::Result<RawIcmpSocket> {
        RawIcmpSocket::open()
    }
}

/// Socket ICMP RAW (AF_INET, SOCK_RAW, IPPROTO_ICMP). Fecha no drop.
#[derive(Debug)]
pub struct RawIcmpSocket {
    inner: Socket,
}

impl RawIcmpSocket {
    /// Requer root/CAP_NET_RAW (ou Administrador no Windows).
    pub fn open() -> io::Result<Self> {
        let inner = Socket::new(Domain::IPV4, Type::from(SOCK_RAW), Some(Protocol::ICMPV4))?;
        Ok(Self { inner })
    }
}

impl EchoSocket for RawIcmpSocket {
    fn send_to(&mut self, packet: &[u8], dst: Ipv4Addr) -> io::Result<usize> {
        // Porta é ignorada para ICMP
        let addr = SockAddr::from(SocketAddrV4::new(dst, 0));
        self.inner.send_to(packet, &addr)
    }

    fn recv_within(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        read_within(&self.inner, buf, timeout)
    }
}

/// Leitura com timeout: o timeout de leitura do socket faz o papel do select.
fn read_within(sock: &Socket, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
    // Timeout zero é rejeitado pelo SO
    sock.set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;

    let mut sock = sock;
    match sock.read(buf) {
        Ok(n) => Ok(Some(n)),
        Err(e)
            if e.kind() == io::ErrorKind::WouldBlock
                || e.kind() == io::ErrorKind::TimedOut
                || e.kind() == io::ErrorKind::Interrupted =>
        {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
