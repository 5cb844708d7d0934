//! Interface de linha de comando do jobwatch baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, check, networks)
//! e flags globais (--config, --threshold, --interval, --verbose).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// jobwatch: monitor de inatividade de jobs de keepers on-chain.
#[derive(Debug, Parser)]
#[command(name = "jobwatch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho para o arquivo de configuração (padrão: `jobwatch.toml`).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Limite de inatividade em blocos (sobrepõe o arquivo).
    #[arg(long, global = true)]
    pub threshold: Option<u64>,

    /// Intervalo entre verificações em segundos (sobrepõe o arquivo).
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Monitora os jobs continuamente e envia alertas ao Discord.
    Run,

    /// Executa uma única verificação e imprime o relatório.
    Check {
        /// Reconstrói a última execução a partir dos logs dos últimos N blocos.
        #[arg(long)]
        since: Option<u64>,

        /// Também envia os alertas encontrados ao Discord.
        #[arg(long, default_value_t = false)]
        notify: bool,
    },

    /// Lista as redes registradas no sequencer e suas janelas.
    Networks,
}
