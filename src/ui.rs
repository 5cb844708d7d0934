//! Interface de terminal do jobwatch: spinners e saída colorida.
//!
//! Usa `indicatif` para o spinner exibido durante as leituras da chain e
//! `console` para estilizar os relatórios de `check` e `networks`.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::chain::{NetworkId, Window, network_label};
use crate::monitor::{AlertDecision, WindowMode};
use crate::watcher::CheckReport;

/// Spinner exibido enquanto o comando consulta a chain.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    /// Inicia o spinner com a mensagem informada.
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    pub fn set_message(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    /// Remove o spinner do terminal.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// Imprime o resultado de uma verificação, um job por linha.
///
/// Alertas em vermelho, jobs sem alerta em verde e falhas de leitura em amarelo.
pub fn print_check_report(report: &CheckReport, threshold: u64) {
    let green = Style::new().green().bold();
    let red = Style::new().red().bold();
    let yellow = Style::new().yellow();
    let dim = Style::new().dim();

    println!(
        "{}",
        Style::new()
            .bold()
            .apply_to(format!("─── Block {} ───", report.current_block))
    );

    if report.jobs.is_empty() {
        println!("  {}", dim.apply_to("no jobs registered"));
    }

    for job in &report.jobs {
        match &job.outcome {
            Ok(AlertDecision::Alert(alert)) => println!(
                "  {} {} idle {} blocks on {}",
                red.apply_to("✗"),
                job.job,
                alert.idle_blocks(),
                network_label(&alert.network)
            ),
            Ok(AlertDecision::Quiet(reason)) => {
                println!("  {} {} {}", green.apply_to("✓"), job.job, dim.apply_to(reason))
            }
            Err(e) => println!("  {} {} {e}", yellow.apply_to("?"), job.job),
        }
    }

    println!();
    println!(
        "  {} job(s), {} inactive past {threshold} blocks, {} error(s)",
        report.jobs.len(),
        report.alerts(),
        report.errors()
    );
    if report.delivered + report.delivery_failures > 0 {
        println!(
            "  {} alert(s) sent, {} failed",
            report.delivered, report.delivery_failures
        );
    }
}

/// Imprime as redes do sequencer, marcando a que está ativa em `current_block`.
pub fn print_networks(
    current_block: u64,
    networks: &[(NetworkId, Window)],
    mode: WindowMode,
    active: Option<NetworkId>,
) {
    let green = Style::new().green().bold();
    let dim = Style::new().dim();

    println!(
        "{}",
        Style::new()
            .bold()
            .apply_to(format!("─── Networks at block {current_block} ({mode}) ───"))
    );
    if networks.is_empty() {
        println!("  {}", dim.apply_to("no networks registered"));
        return;
    }

    for (network, window) in networks {
        let marker = if active == Some(*network) {
            green.apply_to("●").to_string()
        } else {
            dim.apply_to("○").to_string()
        };
        println!(
            "  {marker} {:<24} start {:>8} length {:>6}",
            network_label(network),
            window.start,
            window.length
        );
    }
}
