use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;

use pingrs::Schedule;
use pingrs::host;

/// Envia ICMP Echo Request a um host, uma vez por intervalo.
#[derive(Parser, Debug)]
#[command(name = "pingrs", version, about, long_about = None)]
pub struct Cli {
    /// Host de destino (nome ou IPv4)
    pub host: String,

    /// Para depois de N pedidos (padrão: até Ctrl+C)
    #[arg(short, long)]
    pub count: Option<u64>,

    /// Tempo máximo de espera por resposta, em ms
    #[arg(short, long = "timeout-ms", default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Intervalo entre pedidos, em ms
    #[arg(short, long = "interval-ms", default_value_t = 1000)]
    pub interval_ms: u64,

    /// Identificador ICMP (padrão: PID do processo)
    #[arg(long)]
    pub ident: Option<u16>,

    /// Só aceita Echo Reply (type 0) com checksum válido
    #[arg(long)]
    pub strict: bool,
}

pub struct PingArgs {
    pub host: String,
    pub ident: u16,
    pub timeout: Duration,
    pub schedule: Schedule,
    pub strict: bool,
}

impl TryFrom<Cli> for PingArgs {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self> {
        if cli.timeout_ms == 0 {
            anyhow::bail!("Valor inválido para --timeout-ms: precisa ser maior que zero");
        }
        if cli.count == Some(0) {
            anyhow::bail!("Valor inválido para -c: precisa ser maior que zero");
        }

        Ok(PingArgs {
            host: cli.host,
            ident: cli.ident.unwrap_or_else(host::current_identifier),
            timeout: Duration::from_millis(cli.timeout_ms),
            schedule: Schedule {
                interval: Duration::from_millis(cli.interval_ms),
                count: cli.count,
            },
            strict: cli.strict,
        })
    }
}

pub fn parse() -> Result<PingArgs> {
    PingArgs::try_from(Cli::parse()).context("Uso: pingrs <host> [-c <count>]")
}
