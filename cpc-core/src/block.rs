use crate::script::LockScript;
use crate::transaction::{Transaction, TxOutput, TxType};
use serde::{Deserialize, Serialize};
use shared::types::{Amount, Timestamp};
use shared::{canonical_digest, Hash256, Result};
use std::collections::BTreeMap;

// Preimage do hash do bloco: todos os campos menos o próprio hash
#[derive(Serialize)]
struct BlockPreimage<'a> {
    index: u64,
    timestamp: Timestamp,
    transactions: &'a [Transaction],
    previous_hash: &'a Hash256,
    nonce: u64,
}

/// Bloco da cadeia CPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Posição na cadeia; o gênese tem índice 0
    pub index: u64,
    /// Timestamp do bloco
    pub timestamp: Timestamp,
    /// Transações em ordem; a coinbase vem por último
    pub transactions: Vec<Transaction>,
    /// Hash do bloco anterior
    pub previous_hash: Hash256,
    /// Nonce encontrado pela prova de trabalho
    pub nonce: u64,
    /// Impressão digital do bloco
    pub hash: Hash256,
}

impl Block {
    /// Cria um bloco, calculando sua impressão digital
    ///
    /// # Errors
    ///
    /// Retorna erro se a serialização do preimage falhar
    pub fn new(
        index: u64,
        timestamp: Timestamp,
        transactions: Vec<Transaction>,
        previous_hash: Hash256,
        nonce: u64,
    ) -> Result<Self> {
        let hash = Self::fingerprint(index, timestamp, &transactions, &previous_hash, nonce)?;
        Ok(Self {
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce,
            hash,
        })
    }

    /// Impressão digital de um candidato a bloco, sem construí-lo.
    ///
    /// A busca de nonce da mineração chama isto a cada passo.
    ///
    /// # Errors
    ///
    /// Retorna erro se a serialização do preimage falhar
    pub fn fingerprint(
        index: u64,
        timestamp: Timestamp,
        transactions: &[Transaction],
        previous_hash: &Hash256,
        nonce: u64,
    ) -> Result<Hash256> {
        canonical_digest(&BlockPreimage {
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce,
        })
    }

    /// Recalcula o hash a partir dos campos correntes
    ///
    /// # Errors
    ///
    /// Retorna erro se a serialização do preimage falhar
    pub fn calculate_hash(&self) -> Result<Hash256> {
        Self::fingerprint(
            self.index,
            self.timestamp,
            &self.transactions,
            &self.previous_hash,
            self.nonce,
        )
    }

    /// Cria o bloco gênese: uma única transação de torneira creditando o
    /// subsídio inicial ao minerador
    ///
    /// # Errors
    ///
    /// Retorna erro se a construção da transação ou o hash falharem
    pub fn genesis(miner_address: &str, grant: Amount, timestamp: Timestamp) -> Result<Self> {
        let mut metadata = BTreeMap::new();
        metadata.insert("note".to_string(), "torneira do bloco gênese".to_string());

        let faucet = Transaction::new(
            vec![],
            vec![TxOutput::fuel(
                grant,
                miner_address,
                LockScript::p2pkh(miner_address).to_string(),
            )],
            TxType::Faucet,
            metadata,
            timestamp,
        )?;

        Self::new(0, timestamp, vec![faucet], Hash256::zero(), 0)
    }

    /// Verifica se a impressão digital atende à dificuldade (dígitos
    /// hexadecimais zero no início)
    #[must_use]
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.hash.meets_difficulty(difficulty)
    }
}
