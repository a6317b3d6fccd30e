use crate::payload::CopyrightPayload;
use serde::{Deserialize, Serialize};
use shared::types::{Address, Amount, Timestamp};
use shared::Hash256;
use std::collections::{btree_map, BTreeMap};
use std::fmt;

/// Referência única a uma saída de transação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    /// Transação que criou a saída
    pub txid: Hash256,
    /// Índice da saída dentro da transação
    pub vout: u32,
}

impl OutPoint {
    /// Cria um novo `OutPoint`
    #[must_use]
    pub const fn new(txid: Hash256, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Natureza de uma UTXO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtxoKind {
    /// Combustível: CPC distribuído pelo sistema, usado em taxas
    Fuel,
    /// UTXO de copyright, com payload de direitos autorais
    Copyright,
}

/// Saída de transação não gasta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utxo {
    /// Identificador único (txid + vout)
    pub outpoint: OutPoint,
    /// Quantidade de CPC
    pub amount: Amount,
    /// Endereço que controla a saída
    pub address: Address,
    /// Script de bloqueio codificado
    pub script: String,
    /// Natureza da UTXO
    pub kind: UtxoKind,
    /// Payload de direitos autorais, presente apenas em UTXOs de copyright
    pub payload: Option<CopyrightPayload>,
    /// Timestamp do bloco em que a UTXO nasceu
    pub created_time: Timestamp,
}

impl Utxo {
    /// Momento em que a UTXO deixa de ser gastável, se houver.
    ///
    /// UTXOs de copyright expiram junto com o payload; combustível não expira.
    #[must_use]
    pub fn end_time(&self) -> Option<Timestamp> {
        match self.kind {
            UtxoKind::Copyright => self.payload.as_ref().map(CopyrightPayload::end_time),
            UtxoKind::Fuel => None,
        }
    }
}

/// Conjunto de UTXOs indexado por `OutPoint`.
///
/// É sempre derivado por varredura de blocos; nenhuma instância sobrevive a
/// uma consulta.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UtxoSet {
    utxos: BTreeMap<OutPoint, Utxo>,
}

impl UtxoSet {
    /// Cria um conjunto vazio
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insere uma UTXO no conjunto
    pub fn insert(&mut self, utxo: Utxo) {
        self.utxos.insert(utxo.outpoint, utxo);
    }

    /// Remove uma UTXO (quando é gasta)
    pub fn remove(&mut self, outpoint: &OutPoint) -> Option<Utxo> {
        self.utxos.remove(outpoint)
    }

    /// Obtém uma UTXO pelo `OutPoint`
    #[must_use]
    pub fn get(&self, outpoint: &OutPoint) -> Option<&Utxo> {
        self.utxos.get(outpoint)
    }

    /// Verifica se a UTXO existe
    #[must_use]
    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.utxos.contains_key(outpoint)
    }

    /// Número de UTXOs no conjunto
    #[must_use]
    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    /// Verifica se o conjunto está vazio
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Itera sobre as UTXOs em ordem de `OutPoint`
    pub fn values(&self) -> btree_map::Values<'_, OutPoint, Utxo> {
        self.utxos.values()
    }
}

impl IntoIterator for UtxoSet {
    type Item = (OutPoint, Utxo);
    type IntoIter = btree_map::IntoIter<OutPoint, Utxo>;

    fn into_iter(self) -> Self::IntoIter {
        self.utxos.into_iter()
    }
}
