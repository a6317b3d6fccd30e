use crate::block::Block;
use crate::config::ChainParams;
use crate::error::ValidationError;
use crate::script::LockScript;
use crate::state::ChainState;
use crate::transaction::{Transaction, TxOutput, TxType};
use crate::utxo::OutPoint;
use crate::validator::TransactionValidator;
use shared::types::{now, Amount, Timestamp};
use shared::{ChainError, Hash256, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Modelo de bloco pronto para a prova de trabalho
#[derive(Debug, Clone)]
pub struct BlockTemplate {
    /// Índice do bloco candidato
    pub index: u64,
    /// Hash do último bloco da cadeia
    pub previous_hash: Hash256,
    /// Transações aceitas, com a coinbase por último
    pub transactions: Vec<Transaction>,
    /// Soma das taxas recolhidas
    pub total_fees: Amount,
    /// Transações descartadas na revalidação
    pub dropped: usize,
}

/// Revalida o lote pendente, recolhe as taxas e anexa a coinbase.
///
/// Cada transação foi validada na submissão; a revalidação aqui captura
/// mudanças de dependência, inclusive o gasto duplo dentro do próprio lote.
/// Ofensoras são descartadas com o motivo registrado no log. A coinbase
/// entra por último, quando as taxas já são todas conhecidas.
///
/// # Errors
///
/// Retorna erro se a cadeia estiver vazia ou a coinbase não puder ser selada
pub fn assemble_template(
    chain: &[Block],
    pending: &[Transaction],
    params: &ChainParams,
    miner_address: &str,
    timestamp: Timestamp,
) -> Result<BlockTemplate> {
    let validator = TransactionValidator::new(chain);
    let utxos = ChainState::new(chain).utxo_map(timestamp);

    let mut accepted = Vec::new();
    let mut spent_in_batch: BTreeSet<OutPoint> = BTreeSet::new();
    let mut total_fees = 0.0;
    let mut dropped = 0;

    for tx in pending {
        if let Err(reason) = validator.validate(tx, timestamp) {
            warn!(txid = %tx.txid, %reason, "transação descartada na montagem do bloco");
            dropped += 1;
            continue;
        }

        // gasto duplo dentro do próprio lote: a primeira transação vence
        if let Some(input) = tx
            .inputs
            .iter()
            .find(|input| spent_in_batch.contains(&input.previous_output))
        {
            let reason = ValidationError::SpentOrUnknown {
                outpoint: input.previous_output,
            };
            warn!(txid = %tx.txid, %reason, "transação descartada na montagem do bloco");
            dropped += 1;
            continue;
        }

        let mut input_total = 0.0;
        for input in &tx.inputs {
            spent_in_batch.insert(input.previous_output);
            if let Some(utxo) = utxos.get(&input.previous_output) {
                input_total += utxo.amount;
            }
        }

        // torneira não paga taxa
        let fee = if tx.inputs.is_empty() {
            0.0
        } else {
            input_total - tx.total_output_value()
        };
        if fee > 0.0 {
            debug!(txid = %tx.txid, fee, "taxa recolhida");
        }
        total_fees += fee;
        accepted.push(tx.clone());
    }

    accepted.push(coinbase(
        miner_address,
        params.block_reward,
        total_fees,
        timestamp,
    )?);

    let last = chain
        .last()
        .ok_or_else(|| ChainError::InvalidBlock("cadeia vazia".to_string()))?;

    Ok(BlockTemplate {
        index: last.index + 1,
        previous_hash: last.hash,
        transactions: accepted,
        total_fees,
        dropped,
    })
}

// Transação de recompensa do minerador: torneira creditando recompensa fixa
// mais as taxas do bloco
fn coinbase(
    miner_address: &str,
    block_reward: Amount,
    fees: Amount,
    timestamp: Timestamp,
) -> Result<Transaction> {
    let total = block_reward + fees;

    let mut metadata = BTreeMap::new();
    metadata.insert("note".to_string(), "recompensa de mineração".to_string());
    metadata.insert("block_reward".to_string(), block_reward.to_string());
    metadata.insert("fees".to_string(), fees.to_string());
    metadata.insert("total".to_string(), total.to_string());

    Transaction::new(
        vec![],
        vec![TxOutput::fuel(
            total,
            miner_address,
            LockScript::p2pkh(miner_address).to_string(),
        )],
        TxType::Faucet,
        metadata,
        timestamp,
    )
}

/// Prova de trabalho: procura, a partir de zero, o primeiro nonce cuja
/// impressão digital começa com `difficulty` dígitos hexadecimais zero.
///
/// O sinal de desligamento é observado a cada 1000 nonces; este é o único
/// ponto de quiescência da mineração.
///
/// # Errors
///
/// Retorna erro se o desligamento for sinalizado ou a serialização falhar
pub fn proof_of_work(
    template: &BlockTemplate,
    timestamp: Timestamp,
    difficulty: u32,
    shutdown: &AtomicBool,
) -> Result<Block> {
    let mut nonce = 0u64;

    loop {
        let hash = Block::fingerprint(
            template.index,
            timestamp,
            &template.transactions,
            &template.previous_hash,
            nonce,
        )?;

        if hash.meets_difficulty(difficulty) {
            return Block::new(
                template.index,
                timestamp,
                template.transactions.clone(),
                template.previous_hash,
                nonce,
            );
        }

        nonce += 1;
        if nonce % 1000 == 0 && shutdown.load(Ordering::SeqCst) {
            return Err(ChainError::MiningInterrupted);
        }
    }
}

/// Mineração síncrona: monta o modelo, executa a prova de trabalho e anexa
/// o bloco à cadeia
///
/// # Errors
///
/// Retorna erro se a montagem ou a prova de trabalho falharem
pub fn mine_block(
    chain: &mut Vec<Block>,
    pending: &[Transaction],
    params: &ChainParams,
    miner_address: &str,
    shutdown: &AtomicBool,
) -> Result<Block> {
    let timestamp = now();
    let template = assemble_template(chain, pending, params, miner_address, timestamp)?;
    let block = proof_of_work(&template, timestamp, params.difficulty, shutdown)?;

    info!(
        index = block.index,
        hash = %block.hash,
        nonce = block.nonce,
        transactions = block.transactions.len(),
        fees = template.total_fees,
        "bloco minerado"
    );

    chain.push(block.clone());
    Ok(block)
}
