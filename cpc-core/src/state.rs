use crate::block::Block;
use crate::payload::CopyrightType;
use crate::utxo::{OutPoint, Utxo, UtxoKind, UtxoSet};
use shared::types::{Amount, Timestamp, WorkHash};

/// Janela padrão de varredura: os últimos 3 meses de blocos.
///
/// É uma otimização, não uma regra de consenso: nenhuma UTXO de copyright
/// sobrevive além dela, porque o prazo de autorização é menor.
pub const SCAN_WINDOW_SECS: Timestamp = 3 * 30 * 24 * 3600;

/// Motor de estado baseado em varredura de blocos.
///
/// Não existe índice persistente: o conjunto de UTXOs é reconstruído a cada
/// consulta percorrendo a cadeia em ordem de índice. Dentro de cada transação
/// os inputs são consumidos antes de os outputs nascerem, portanto uma
/// transação nunca gasta os próprios outputs; a ordem dos blocos é soberana.
#[derive(Debug, Clone, Copy)]
pub struct ChainState<'a> {
    blocks: &'a [Block],
}

impl<'a> ChainState<'a> {
    /// Cria uma visão de estado sobre a cadeia dada
    #[must_use]
    pub const fn new(blocks: &'a [Block]) -> Self {
        Self { blocks }
    }

    /// Varre a cadeia e reconstrói o conjunto de UTXOs.
    ///
    /// Se `start_time` for dado, blocos anteriores a ele são pulados.
    #[must_use]
    pub fn scan(&self, start_time: Option<Timestamp>) -> UtxoSet {
        let mut utxos = UtxoSet::new();

        for block in self.blocks {
            if let Some(start) = start_time {
                if block.timestamp < start {
                    continue;
                }
            }

            for tx in &block.transactions {
                for input in &tx.inputs {
                    utxos.remove(&input.previous_output);
                }

                for (vout, output) in tx.outputs.iter().enumerate() {
                    utxos.insert(Utxo {
                        outpoint: OutPoint::new(tx.txid, vout as u32),
                        amount: output.amount,
                        address: output.address.clone(),
                        script: output.script.clone(),
                        kind: output.kind,
                        payload: output.payload.clone(),
                        created_time: block.timestamp,
                    });
                }
            }
        }

        utxos
    }

    /// Conjunto de UTXOs visto em `now`, usando a janela padrão
    #[must_use]
    pub fn utxo_map(&self, now: Timestamp) -> UtxoSet {
        self.scan(Some(now - SCAN_WINDOW_SECS))
    }

    /// Busca uma UTXO específica
    #[must_use]
    pub fn get_utxo(&self, outpoint: &OutPoint, now: Timestamp) -> Option<Utxo> {
        let mut utxos = self.utxo_map(now);
        utxos.remove(outpoint)
    }

    /// Todas as UTXOs de um endereço
    #[must_use]
    pub fn utxos_of(&self, address: &str, now: Timestamp) -> Vec<Utxo> {
        self.utxo_map(now)
            .into_iter()
            .map(|(_, utxo)| utxo)
            .filter(|utxo| utxo.address == address)
            .collect()
    }

    /// Saldo de CPC de um endereço
    #[must_use]
    pub fn balance(&self, address: &str, now: Timestamp) -> Amount {
        self.utxos_of(address, now)
            .iter()
            .map(|utxo| utxo.amount)
            .sum()
    }

    /// UTXOs de copyright de um endereço
    #[must_use]
    pub fn copyright_utxos_of(&self, address: &str, now: Timestamp) -> Vec<Utxo> {
        self.utxos_of(address, now)
            .into_iter()
            .filter(|utxo| utxo.kind == UtxoKind::Copyright)
            .collect()
    }

    /// UTXOs de copyright vigentes que carregam o hash de obra dado
    #[must_use]
    pub fn copyright_by_work(&self, work_hash: &WorkHash, now: Timestamp) -> Vec<Utxo> {
        self.utxo_map(now)
            .into_iter()
            .map(|(_, utxo)| utxo)
            .filter(|utxo| {
                utxo.kind == UtxoKind::Copyright
                    && utxo.payload.as_ref().is_some_and(|payload| {
                        payload.work_hash == *work_hash && !payload.is_expired(now)
                    })
            })
            .collect()
    }

    /// Procura uma prova vigente da obra em posse do endereço.
    ///
    /// É a consulta usada por terceiros para conferir se uma empresa detém
    /// licença ativa sobre uma obra.
    #[must_use]
    pub fn verify_proof(&self, address: &str, work_hash: &WorkHash, now: Timestamp) -> Option<Utxo> {
        self.copyright_utxos_of(address, now)
            .into_iter()
            .find(|utxo| {
                utxo.payload.as_ref().is_some_and(|payload| {
                    payload.copyright_type == CopyrightType::Proof
                        && payload.work_hash == *work_hash
                        && !payload.is_expired(now)
                })
            })
    }
}
