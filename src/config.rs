//! Configuração do jobwatch carregada a partir de `jobwatch.toml`.
//!
//! A struct [`MonitorConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! Variáveis de ambiente (também lidas de um `.env`) têm precedência sobre o
//! arquivo para o endpoint, o sequencer e as credenciais do Discord.

use alloy::primitives::Address;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use crate::alert::discord::DEFAULT_API_URL;
use crate::chain::abi::DEFAULT_WORK_EVENT_SIGNATURES;
use crate::error::JobwatchError;
use crate::monitor::{WindowMode, WorkablePolicy};
use crate::watcher::WatchSettings;

/// Arquivo procurado no diretório atual quando `--config` não é informado.
pub const DEFAULT_CONFIG_FILE: &str = "jobwatch.toml";

/// Configuração de nível superior carregada de `jobwatch.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// URL do nó JSON-RPC.
    #[serde(default)]
    pub provider_url: String,

    /// Endereço do contrato sequencer.
    #[serde(default = "default_sequencer_address")]
    pub sequencer_address: String,

    /// Token do bot do Discord.
    #[serde(default)]
    pub discord_bot_token: String,

    /// Canal do Discord que recebe os alertas.
    #[serde(default)]
    pub discord_channel_id: String,

    /// URL base da API REST do Discord.
    #[serde(default = "default_discord_api_url")]
    pub discord_api_url: String,

    /// Blocos sem execução a partir dos quais um job é considerado inativo.
    #[serde(default = "default_inactivity_threshold_blocks")]
    pub inactivity_threshold_blocks: u64,

    /// Intervalo entre verificações periódicas, em segundos.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Intervalo entre consultas de logs, em segundos.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maior intervalo de blocos pedido em uma única consulta `eth_getLogs`.
    #[serde(default = "default_max_block_range")]
    pub max_block_range: u64,

    /// Capacidade da fila de eventos entre as assinaturas e o watcher.
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,

    /// Interpretação das janelas de rede.
    #[serde(default)]
    pub window_mode: WindowMode,

    /// Se `workable` deve ser confirmado antes de alertar.
    #[serde(default)]
    pub workable_policy: WorkablePolicy,

    /// Assinaturas de evento reconhecidas como execução de um job.
    #[serde(default = "default_work_event_signatures")]
    pub work_event_signatures: Vec<String>,
}

// Sequencer de produção usado por padrão.
fn default_sequencer_address() -> String {
    "0x238b4E35dAed6100C6162fAE4510261f88996EC9".to_string()
}

fn default_discord_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

// Valor padrão do limite de inatividade: 10 blocos.
fn default_inactivity_threshold_blocks() -> u64 {
    10
}

// Dez blocos de 12 segundos.
fn default_check_interval_secs() -> u64 {
    120
}

// Um bloco.
fn default_poll_interval_secs() -> u64 {
    12
}

fn default_max_block_range() -> u64 {
    1000
}

fn default_event_queue_capacity() -> usize {
    256
}

fn default_work_event_signatures() -> Vec<String> {
    DEFAULT_WORK_EVENT_SIGNATURES
        .iter()
        .map(|sig| sig.to_string())
        .collect()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            provider_url: String::new(),
            sequencer_address: default_sequencer_address(),
            discord_bot_token: String::new(),
            discord_channel_id: String::new(),
            discord_api_url: default_discord_api_url(),
            inactivity_threshold_blocks: default_inactivity_threshold_blocks(),
            check_interval_secs: default_check_interval_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            max_block_range: default_max_block_range(),
            event_queue_capacity: default_event_queue_capacity(),
            window_mode: WindowMode::default(),
            workable_policy: WorkablePolicy::default(),
            work_event_signatures: default_work_event_signatures(),
        }
    }
}

impl MonitorConfig {
    /// Carrega a configuração de `path` (ou de `jobwatch.toml` no diretório atual).
    /// Usa valores padrão se o arquivo padrão não existir; um caminho explícito
    /// inexistente é erro.
    pub fn load(path: Option<&Path>) -> Result<Self, JobwatchError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, JobwatchError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<MonitorConfig>(&contents)?)
    }

    /// Aplica variáveis de ambiente não vazias por cima dos valores do arquivo.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields: [(&str, &mut String); 4] = [
            ("PROVIDER_URL", &mut self.provider_url),
            ("SEQUENCER_ADDRESS", &mut self.sequencer_address),
            ("DISCORD_BOT_TOKEN", &mut self.discord_bot_token),
            ("DISCORD_CHANNEL_ID", &mut self.discord_channel_id),
        ];
        for (key, field) in fields {
            match lookup(key) {
                Some(value) if !value.is_empty() => *field = value,
                _ => {}
            }
        }
    }

    /// Rejeita configurações com as quais o monitor não consegue operar.
    pub fn validate(&self) -> Result<(), JobwatchError> {
        if self.provider_url.trim().is_empty() {
            return Err(JobwatchError::Config(
                "provider_url is required (set PROVIDER_URL)".into(),
            ));
        }
        self.sequencer()?;

        let positive = [
            ("inactivity_threshold_blocks", self.inactivity_threshold_blocks),
            ("check_interval_secs", self.check_interval_secs),
            ("poll_interval_secs", self.poll_interval_secs),
            ("max_block_range", self.max_block_range),
            ("event_queue_capacity", self.event_queue_capacity as u64),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(JobwatchError::Config(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }

    /// Exige as credenciais do Discord (necessárias para entregar alertas).
    pub fn require_discord(&self) -> Result<(), JobwatchError> {
        if self.discord_bot_token.is_empty() || self.discord_channel_id.is_empty() {
            return Err(JobwatchError::Config(
                "discord_bot_token and discord_channel_id are required \
                 (set DISCORD_BOT_TOKEN and DISCORD_CHANNEL_ID)"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Endereço do sequencer já validado.
    pub fn sequencer(&self) -> Result<Address, JobwatchError> {
        Address::from_str(self.sequencer_address.trim()).map_err(|e| {
            JobwatchError::Config(format!(
                "invalid sequencer address '{}': {e}",
                self.sequencer_address
            ))
        })
    }

    pub fn watch_settings(&self) -> WatchSettings {
        WatchSettings {
            threshold: self.inactivity_threshold_blocks,
            window_mode: self.window_mode,
            workable_policy: self.workable_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn valid() -> MonitorConfig {
        MonitorConfig {
            provider_url: "http://localhost:8545".into(),
            ..MonitorConfig::default()
        }
    }

    #[test]
    fn default_config_values() {
        let config = MonitorConfig::default();
        assert_eq!(config.inactivity_threshold_blocks, 10);
        assert_eq!(config.check_interval_secs, 120);
        assert_eq!(config.poll_interval_secs, 12);
        assert_eq!(config.max_block_range, 1000);
        assert_eq!(config.window_mode, WindowMode::Cyclic);
        assert_eq!(config.workable_policy, WorkablePolicy::Ignore);
        assert_eq!(config.work_event_signatures.len(), 3);
        assert!(config.provider_url.is_empty());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            provider_url = "https://rpc.example"
            inactivity_threshold_blocks = 25
            window_mode = "absolute"
            workable_policy = "require"
        "#;
        let config: MonitorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider_url, "https://rpc.example");
        assert_eq!(config.inactivity_threshold_blocks, 25);
        assert_eq!(config.window_mode, WindowMode::Absolute);
        assert_eq!(config.workable_policy, WorkablePolicy::Require);
        assert_eq!(config.check_interval_secs, 120);
        assert_eq!(
            config.sequencer_address,
            "0x238b4E35dAed6100C6162fAE4510261f88996EC9"
        );
    }

    #[test]
    fn load_reads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provider_url = \"http://node:8545\"").unwrap();
        writeln!(file, "max_block_range = 200").unwrap();

        let config = MonitorConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_block_range, 200);
    }

    #[test]
    fn load_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = MonitorConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(JobwatchError::Io(_))));
    }

    #[test]
    fn load_invalid_toml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "inactivity_threshold_blocks = \"ten\"").unwrap();
        let result = MonitorConfig::load(Some(file.path()));
        assert!(matches!(result, Err(JobwatchError::Toml(_))));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let env: HashMap<&str, &str> = [
            ("PROVIDER_URL", "http://env-node"),
            ("DISCORD_BOT_TOKEN", "token"),
            ("DISCORD_CHANNEL_ID", ""),
        ]
        .into_iter()
        .collect();

        let mut config = MonitorConfig {
            provider_url: "http://file-node".into(),
            discord_channel_id: "file-channel".into(),
            ..MonitorConfig::default()
        };
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.provider_url, "http://env-node");
        assert_eq!(config.discord_bot_token, "token");
        // Empty values do not clobber the file.
        assert_eq!(config.discord_channel_id, "file-channel");
    }

    #[test]
    fn validate_requires_provider_url() {
        let err = MonitorConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("provider_url"));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_sequencer_address() {
        let config = MonitorConfig {
            sequencer_address: "not-an-address".into(),
            ..valid()
        };
        assert!(matches!(config.validate(), Err(JobwatchError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_threshold() {
        let config = MonitorConfig {
            inactivity_threshold_blocks: 0,
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("inactivity_threshold_blocks"));
    }

    #[test]
    fn require_discord_checks_credentials() {
        assert!(valid().require_discord().is_err());
        let config = MonitorConfig {
            discord_bot_token: "t".into(),
            discord_channel_id: "c".into(),
            ..valid()
        };
        assert!(config.require_discord().is_ok());
    }

    #[test]
    fn watch_settings_follow_config() {
        let settings = valid().watch_settings();
        assert_eq!(settings.threshold, 10);
        assert_eq!(settings.window_mode, WindowMode::Cyclic);
    }
}
