// Tratamento de erros ergonômico
use anyhow::{Context, Result};

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pingrs::icmp::TIMESTAMP_LEN;
use pingrs::{ChecksumByteOrderPolicy, EchoTransceiver, PingError, PingStats, RoundOutcome};
use pingrs::{host, runner};

// Módulos locais
mod args;

/// Programa principal: um Echo Request por intervalo até Ctrl+C ou `-c`.
/// Requer privilégios para Raw Sockets (root/CAP_NET_RAW ou Administrador).
fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    // Parsing de argumentos via módulo args
    let args = args::parse()?;

    // Configura handler para Ctrl+C
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Erro ao configurar handler de Ctrl+C")?;

    // Resolve uma vez só
    let dst = host::resolve(&args.host)
        .with_context(|| format!("Host desconhecido: {}", args.host))?;

    let transceiver = EchoTransceiver::new(args.ident, args.timeout)
        .with_policy(ChecksumByteOrderPolicy::for_host())
        .strict(args.strict);

    println!(
        "Disparando {} [{}] com {} bytes de dados:",
        args.host, dst, TIMESTAMP_LEN
    );

    let stats = runner::run(&transceiver, dst, &args.schedule, &running, |outcome| {
        print_round(dst, outcome)
    })
    .context("Falha no socket RAW. Verifique se está rodando com privilégios (root/Administrador).")?;

    print_summary(&args.host, &stats);
    Ok(())
}

fn print_round(dst: Ipv4Addr, outcome: &RoundOutcome) {
    match &outcome.result {
        Ok(reply) => println!(
            "Resposta de {}: bytes={} icmp_seq={} tempo={:.2}ms",
            reply.source.unwrap_or(dst),
            reply.bytes,
            reply.header.sequence,
            reply.delay_ms()
        ),
        Err(PingError::Timeout(_)) => println!("Esgotado o tempo limite do pedido."),
        Err(e) => println!("Falha no pedido {}: {}", outcome.round, e),
    }
}

// Exibe estatísticas ao sair
fn print_summary(host: &str, stats: &PingStats) {
    println!("\n--- estatísticas de ping para {} ---", host);
    println!(
        "{} pacotes transmitidos, {} recebidos, {:.0}% de perda de pacotes",
        stats.transmitted,
        stats.received,
        stats.loss_percent()
    );

    if let Some((min, avg, max)) = stats.rtt_summary() {
        println!("rtt min/avg/max = {:.3}/{:.3}/{:.3} ms", min, avg, max);
    }
}
