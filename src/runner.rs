//! Laço externo: uma rodada por intervalo até cancelar ou atingir `count`.

use log::{debug, warn};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::PingError;
use crate::socket::SocketFactory;
use crate::stats::PingStats;
use crate::transceiver::{EchoReply, EchoTransceiver};

/// Fatia máxima de sono entre checagens do sinal de cancelamento.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Ritmo do laço.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub interval: Duration,
    /// `None` = infinito (até Ctrl+C)
    pub count: Option<u64>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            count: None,
        }
    }
}

/// Resultado de uma rodada, entregue ao reporter.
#[derive(Debug)]
pub struct RoundOutcome {
    /// Número da rodada (1, 2, ...); só para o relatório
    pub round: u64,
    pub result: Result<EchoReply, PingError>,
}

impl RoundOutcome {
    pub fn is_lost(&self) -> bool {
        self.result.is_err()
    }
}

/// Executa rodadas até `running` virar `false` ou o limite ser atingido.
///
/// Timeouts e datagramas ruins viram rodadas perdidas; erro de socket é
/// fatal e encerra o laço com `Err`.
pub fn run<F, R>(
    transceiver: &EchoTransceiver<F>,
    dst: Ipv4Addr,
    schedule: &Schedule,
    running: &AtomicBool,
    mut report: R,
) -> Result<PingStats, PingError>
where
    F: SocketFactory,
    R: FnMut(&RoundOutcome),
{
    let mut stats = PingStats::new();

    loop {
        // Verifica se foi interrompido
        if !running.load(Ordering::SeqCst) {
            debug!("cancelado após {} rodadas", stats.transmitted);
            break;
        }

        // Verifica limite de contagem se houver
        if let Some(limit) = schedule.count {
            if stats.transmitted >= limit {
                break;
            }
        }

        stats.record_sent();
        let round = stats.transmitted;
        let result = transceiver.ping(dst);
        if let Ok(reply) = &result {
            stats.record_reply(reply.delay_ms());
        }
        let fatal = matches!(&result, Err(e) if !e.is_recoverable());

        let outcome = RoundOutcome { round, result };
        report(&outcome);
        if fatal {
            warn!("rodada {} abortada, encerrando o laço", round);
            return outcome.result.map(|_| stats);
        }

        // Não dorme depois da última rodada
        let last = schedule.count.is_some_and(|limit| stats.transmitted >= limit);
        if !last {
            sleep_unless_cancelled(schedule.interval, running);
        }
    }

    Ok(stats)
}

/// Dorme em fatias para reagir rápido ao Ctrl+C.
fn sleep_unless_cancelled(total: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + total;
    loop {
        if !running.load(Ordering::SeqCst) {
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        std::thread::sleep(remaining.min(SLEEP_SLICE));
    }
}
