/// Estatísticas acumuladas ao longo das rodadas (atrasos em ms).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PingStats {
    pub transmitted: u64,
    pub received: u64,
    rtts: Vec<f64>,
}

impl PingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&mut self) {
        self.transmitted += 1;
    }

    pub fn record_reply(&mut self, rtt_ms: f64) {
        self.received += 1;
        self.rtts.push(rtt_ms);
    }

    pub fn loss_percent(&self) -> f64 {
        if self.transmitted > 0 {
            (self.transmitted - self.received) as f64 / self.transmitted as f64 * 100.0
        } else {
            0.0
        }
    }

    /// (min, avg, max) em ms, se houve alguma resposta.
    pub fn rtt_summary(&self) -> Option<(f64, f64, f64)> {
        if self.rtts.is_empty() {
            return None;
        }
        let min = self.rtts.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = self.rtts.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let sum: f64 = self.rtts.iter().sum();
        Some((min, sum / self.rtts.len() as f64, max))
    }
}
