//! Codificação do Echo Request e leitura do cabeçalho das respostas.

use byteorder::{ByteOrder, NetworkEndian};
use std::net::Ipv4Addr;

use crate::checksum::checksum;
use crate::error::DecodeError;

pub const ECHO_REQUEST: u8 = 8;
pub const ECHO_REPLY: u8 = 0;

/// Sequence fixo: um pedido por socket, o identificador basta para casar.
pub const ECHO_SEQUENCE: u16 = 1;

pub const ICMP_HEADER_LEN: usize = 8;
pub const TIMESTAMP_LEN: usize = 8;
/// Cabeçalho ICMP + timestamp, sem preenchimento.
pub const ECHO_REQUEST_LEN: usize = ICMP_HEADER_LEN + TIMESTAMP_LEN;

/// Cabeçalho IP assumido fixo (sem opções).
pub const IPV4_HEADER_LEN: usize = 20;
pub const REPLY_HEADER_END: usize = IPV4_HEADER_LEN + ICMP_HEADER_LEN;
pub const TIMESTAMP_END: usize = REPLY_HEADER_END + TIMESTAMP_LEN;

/// Como o checksum é convertido antes de voltar ao cabeçalho.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumByteOrderPolicy {
    /// Apenas host -> rede (htons)
    #[default]
    Standard,
    /// htons seguido da máscara de 16 bits usada no macOS
    LegacyDoubleSwap,
}

impl ChecksumByteOrderPolicy {
    /// Política da plataforma atual, resolvida uma vez na inicialização.
    pub fn for_host() -> Self {
        if cfg!(target_os = "macos") {
            Self::LegacyDoubleSwap
        } else {
            Self::Standard
        }
    }

    // O slot do struct é em ordem do host, por isso htons + to_ne_bytes.
    fn header_bytes(self, csum: u16) -> [u8; 2] {
        let value = match self {
            Self::Standard => csum.to_be(),
            Self::LegacyDoubleSwap => (u32::from(csum.to_be()) & 0xFFFF) as u16,
        };
        value.to_ne_bytes()
    }
}

/// Campos do cabeçalho ICMP de um datagrama recebido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
}

impl IcmpHeader {
    pub fn is_echo_reply(&self) -> bool {
        self.icmp_type == ECHO_REPLY && self.code == 0
    }
}

/// Monta um pacote ICMPv4 Echo Request (type=8, code=0) com o instante de
/// envio (segundos desde a época Unix) como payload.
pub fn encode(
    ident: u16,
    seq: u16,
    send_time: f64,
    policy: ChecksumByteOrderPolicy,
) -> [u8; ECHO_REQUEST_LEN] {
    let mut pkt = [0u8; ECHO_REQUEST_LEN];

    // Type=8 (Echo Request), Code=0, checksum zerado por enquanto
    pkt[0] = ECHO_REQUEST;
    pkt[1] = 0;

    // Identifier e Sequence (big-endian)
    NetworkEndian::write_u16(&mut pkt[4..6], ident);
    NetworkEndian::write_u16(&mut pkt[6..8], seq);

    // Payload: timestamp de envio em double
    NetworkEndian::write_f64(&mut pkt[ICMP_HEADER_LEN..], send_time);

    let csum = checksum(&pkt);
    pkt[2..4].copy_from_slice(&policy.header_bytes(csum));

    pkt
}

/// Lê o cabeçalho ICMP que segue os 20 bytes do cabeçalho IP.
pub fn decode_reply_header(datagram: &[u8]) -> Result<IcmpHeader, DecodeError> {
    let icmp = require(datagram, REPLY_HEADER_END)?;
    let icmp = &icmp[IPV4_HEADER_LEN..];
    Ok(IcmpHeader {
        icmp_type: icmp[0],
        code: icmp[1],
        checksum: NetworkEndian::read_u16(&icmp[2..4]),
        identifier: NetworkEndian::read_u16(&icmp[4..6]),
        sequence: NetworkEndian::read_u16(&icmp[6..8]),
    })
}

/// Timestamp de envio embutido logo após o cabeçalho ICMP.
pub fn decode_timestamp(datagram: &[u8]) -> Result<f64, DecodeError> {
    let bytes = require(datagram, TIMESTAMP_END)?;
    Ok(NetworkEndian::read_f64(&bytes[REPLY_HEADER_END..]))
}

/// Endereço de origem do cabeçalho IP, se houver cabeçalho completo.
pub fn source_address(datagram: &[u8]) -> Option<Ipv4Addr> {
    let ip = datagram.get(..IPV4_HEADER_LEN)?;
    Some(Ipv4Addr::new(ip[12], ip[13], ip[14], ip[15]))
}

/// Mensagem ICMP completa (tudo depois do cabeçalho IP).
pub fn icmp_message(datagram: &[u8]) -> &[u8] {
    datagram.get(IPV4_HEADER_LEN..).unwrap_or(&[])
}

fn require(datagram: &[u8], needed: usize) -> Result<&[u8], DecodeError> {
    datagram.get(..needed).ok_or(DecodeError {
        needed,
        got: datagram.len(),
    })
}

/// Resposta falsa para testes: cabeçalho IP mínimo vindo de 127.0.0.1 e a
/// mensagem ecoada com tipo e identificador trocados.
#[cfg(test)]
pub(crate) fn fake_reply(request: &[u8], icmp_type: u8, ident: u16) -> Vec<u8> {
    let mut ip = [0u8; IPV4_HEADER_LEN];
    ip[0] = 0x45;
    ip[8] = 64;
    ip[9] = 1;
    ip[12..16].copy_from_slice(&[127, 0, 0, 1]);
    ip[16..20].copy_from_slice(&[127, 0, 0, 1]);

    let mut msg = request.to_vec();
    msg[0] = icmp_type;
    msg[2..4].copy_from_slice(&[0, 0]);
    NetworkEndian::write_u16(&mut msg[4..6], ident);
    let csum = checksum(&msg);
    msg[2..4].copy_from_slice(&csum.to_be_bytes());

    let mut datagram = ip.to_vec();
    datagram.extend_from_slice(&msg);
    datagram
}
