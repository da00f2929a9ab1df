use std::fmt;
use std::io;
use std::time::Duration;

/// Datagrama curto demais para o campo pedido. Erro do codec; durante a
/// espera o transceptor só registra e continua.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError {
    /// Bytes necessários para ler o campo
    pub needed: usize,
    /// Bytes realmente recebidos
    pub got: usize,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "datagrama curto demais: {} bytes, esperado pelo menos {}",
            self.got, self.needed
        )
    }
}

impl std::error::Error for DecodeError {}

/// Falhas de uma rodada de ping.
#[derive(Debug)]
pub enum PingError {
    /// Host não resolve para um endereço IPv4
    Resolution {
        host: String,
        source: Option<io::Error>,
    },
    /// Falha ao abrir ou usar o socket RAW (privilégio, recursos do SO)
    Socket(io::Error),
    /// Nenhuma resposta com o nosso identificador dentro do prazo
    Timeout(Duration),
}

impl PingError {
    /// Erros recuperáveis não interrompem o laço externo.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl fmt::Display for PingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolution { host, .. } => write!(f, "não foi possível resolver {}", host),
            Self::Socket(e) => write!(f, "erro no socket RAW: {}", e),
            Self::Timeout(t) => {
                write!(f, "esgotado o tempo limite do pedido ({} ms)", t.as_millis())
            }
        }
    }
}

impl std::error::Error for PingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resolution { source, .. } => source
                .as_ref()
                .map(|e| e as &(dyn std::error::Error + 'static)),
            Self::Socket(e) => Some(e),
            Self::Timeout(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn only_timeout_is_recoverable() {
        assert!(PingError::Timeout(Duration::from_millis(200)).is_recoverable());
        assert!(!PingError::Socket(io::Error::from(io::ErrorKind::PermissionDenied)).is_recoverable());
        assert!(
            !PingError::Resolution {
                host: "nada.invalid".into(),
                source: None
            }
            .is_recoverable()
        );
    }

    #[test]
    fn socket_error_exposes_source() {
        let err = PingError::Socket(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("erro no socket RAW"));
    }

    #[test]
    fn decode_error_names_both_lengths() {
        let msg = DecodeError { needed: 28, got: 3 }.to_string();
        assert!(msg.contains("3 bytes"));
        assert!(msg.contains("28"));
    }

    #[test]
    fn timeout_message_has_millis() {
        let err = PingError::Timeout(Duration::from_millis(200));
        assert!(err.to_string().contains("200 ms"));
    }
}
