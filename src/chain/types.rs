//! Tipos de dados compartilhados entre o leitor de chain e o monitor.
//!
//! Endereços de job e identificadores de rede são opacos: usamos diretamente
//! os tipos de `alloy::primitives` ([`Address`] e [`B256`]) sem reinterpretá-los.

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Endereço de 20 bytes de um contrato de job.
pub type JobAddress = Address;

/// Identificador de 32 bytes de uma rede de coordenação.
pub type NetworkId = B256;

/// Janela de blocos de uma rede, como lida do mapping `windows` do sequencer.
///
/// Uma janela com `length == 0` nunca está ativa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Posição inicial da janela.
    pub start: u64,
    /// Comprimento da janela em blocos.
    pub length: u64,
}

impl Window {
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }
}

/// Notificação vinda das assinaturas de eventos da chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEvent {
    /// O sequencer adicionou um job (`AddJob`).
    JobAdded(JobAddress),
    /// O sequencer removeu um job (`RemoveJob`).
    JobRemoved(JobAddress),
    /// Um job emitiu `Work` no bloco indicado.
    Worked {
        job: JobAddress,
        block_number: u64,
    },
}

impl ChainEvent {
    /// Job ao qual o evento se refere.
    pub fn job(&self) -> JobAddress {
        match self {
            ChainEvent::JobAdded(job) | ChainEvent::JobRemoved(job) => *job,
            ChainEvent::Worked { job, .. } => *job,
        }
    }
}

/// Um [`ChainEvent`] com sua posição na chain, usada para ordenar eventos
/// vindos de consultas de log diferentes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencedEvent {
    pub block_number: u64,
    pub log_index: u64,
    pub event: ChainEvent,
}

impl SequencedEvent {
    /// Chave de ordenação `(bloco, índice do log)`.
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }
}

/// Nome legível de uma rede.
///
/// Redes costumam ser strings codificadas em `bytes32` (ex.: `"GELATO"`);
/// quando o conteúdo não é ASCII imprimível, cai para a forma hexadecimal.
pub fn network_label(network: &NetworkId) -> String {
    let bytes = network.as_slice();
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    let text = &bytes[..end];

    let printable = !text.is_empty() && text.iter().all(|b| b.is_ascii_graphic() || *b == b' ');
    if printable {
        String::from_utf8_lossy(text).into_owned()
    } else {
        network.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes32(name: &str) -> NetworkId {
        let mut buf = [0u8; 32];
        buf[..name.len()].copy_from_slice(name.as_bytes());
        B256::from(buf)
    }

    #[test]
    fn network_label_decodes_ascii() {
        assert_eq!(network_label(&bytes32("GELATO")), "GELATO");
        assert_eq!(network_label(&bytes32("TECHOPS 2")), "TECHOPS 2");
    }

    #[test]
    fn network_label_falls_back_to_hex() {
        let mut buf = [0u8; 32];
        buf[0] = 0xff;
        buf[31] = 0x01;
        let label = network_label(&B256::from(buf));
        assert!(label.starts_with("0xff"));
        assert_eq!(label.len(), 66);
    }

    #[test]
    fn network_label_zero_is_hex() {
        assert_eq!(network_label(&B256::ZERO), B256::ZERO.to_string());
    }

    #[test]
    fn chain_event_job_accessor() {
        let job = Address::repeat_byte(0x11);
        assert_eq!(ChainEvent::JobAdded(job).job(), job);
        assert_eq!(ChainEvent::JobRemoved(job).job(), job);
        assert_eq!(
            ChainEvent::Worked {
                job,
                block_number: 7
            }
            .job(),
            job
        );
    }

    #[test]
    fn sequenced_events_sort_by_position() {
        let job = Address::repeat_byte(0x22);
        let mut events = vec![
            SequencedEvent {
                block_number: 10,
                log_index: 3,
                event: ChainEvent::JobRemoved(job),
            },
            SequencedEvent {
                block_number: 9,
                log_index: 5,
                event: ChainEvent::JobAdded(job),
            },
            SequencedEvent {
                block_number: 10,
                log_index: 1,
                event: ChainEvent::Worked {
                    job,
                    block_number: 10,
                },
            },
        ];
        events.sort_by_key(SequencedEvent::position);
        assert_eq!(events[0].event, ChainEvent::JobAdded(job));
        assert!(matches!(events[1].event, ChainEvent::Worked { .. }));
        assert_eq!(events[2].event, ChainEvent::JobRemoved(job));
    }
}
