use crate::block::Block;
use crate::config::ChainParams;
use crate::mining::{assemble_template, proof_of_work};
use crate::script::LockScript;
use crate::state::ChainState;
use crate::transaction::{Transaction, TxOutput, TxType};
use crate::utxo::{Utxo, UtxoKind};
use crate::validator::TransactionValidator;
use serde::{Deserialize, Serialize};
use shared::types::{now, Address, Amount, WorkHash};
use shared::{ChainError, Hash256, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::Duration;
use tracing::{error, info};

/// Resposta da submissão de uma transação
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResult {
    pub success: bool,
    pub message: String,
    pub txid: Option<Hash256>,
}

/// Resumo das UTXOs de um endereço
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressSummary {
    pub address: Address,
    pub balance: Amount,
    pub utxo_count: usize,
    pub copyright_count: usize,
    pub utxos: Vec<Utxo>,
}

/// Situação corrente do nó
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatus {
    pub height: u64,
    pub pending: usize,
    pub miner_address: Address,
}

/// Nó CPC: a cadeia, o mempool e o minerador em um único processo.
///
/// Threads de atendimento anexam ao mempool e respondem consultas; o
/// trabalhador de mineração drena o mempool e anexa à cadeia. O minerador
/// nunca segura o bloqueio do mempool durante a prova de trabalho, apenas
/// no instantâneo e no anexo final.
#[derive(Clone)]
pub struct Node {
    chain: Arc<RwLock<Vec<Block>>>,
    mempool: Arc<Mutex<Vec<Transaction>>>,
    params: ChainParams,
    miner_address: Address,
    shutdown: Arc<AtomicBool>,
}

impl Node {
    /// Cria um nó com o bloco gênese creditando o subsídio ao minerador
    ///
    /// # Errors
    ///
    /// Retorna erro se o bloco gênese não puder ser construído
    pub fn new(miner_address: impl Into<Address>, params: ChainParams) -> Result<Self> {
        let miner_address = miner_address.into();
        let genesis = Block::genesis(&miner_address, params.genesis_grant, now())?;

        Ok(Self {
            chain: Arc::new(RwLock::new(vec![genesis])),
            mempool: Arc::new(Mutex::new(Vec::new())),
            params,
            miner_address,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Valida e enfileira uma transação.
    ///
    /// A validação acontece contra a cadeia comprometida no momento da
    /// submissão; a transação será revalidada na montagem do bloco.
    pub fn submit_transaction(&self, tx: Transaction) -> SubmitResult {
        let verdict = {
            let chain = self.chain.read().unwrap();
            TransactionValidator::new(&chain).validate(&tx, now())
        };

        match verdict {
            Ok(()) => {
                let txid = tx.txid;
                self.mempool.lock().unwrap().push(tx);
                info!(%txid, "transação aceita no mempool");
                SubmitResult {
                    success: true,
                    message: "transação aceita".to_string(),
                    txid: Some(txid),
                }
            }
            Err(reason) => SubmitResult {
                success: false,
                message: reason.to_string(),
                txid: None,
            },
        }
    }

    /// Sintetiza um pedido à torneira para o endereço dado e o enfileira
    ///
    /// # Errors
    ///
    /// Retorna erro se a transação não puder ser selada
    pub fn request_faucet(&self, address: &str) -> Result<SubmitResult> {
        let mut metadata = BTreeMap::new();
        metadata.insert("note".to_string(), "torneira".to_string());

        let tx = Transaction::new(
            vec![],
            vec![TxOutput::fuel(
                self.params.faucet_grant,
                address,
                LockScript::p2pkh(address).to_string(),
            )],
            TxType::Faucet,
            metadata,
            now(),
        )?;

        Ok(self.submit_transaction(tx))
    }

    /// Despejo completo da cadeia, em ordem
    #[must_use]
    pub fn blocks(&self) -> Vec<Block> {
        self.chain.read().unwrap().clone()
    }

    /// Altura corrente da cadeia (número de blocos, gênese incluído)
    #[must_use]
    pub fn height(&self) -> u64 {
        self.chain.read().unwrap().len() as u64
    }

    /// Saldo e UTXOs de um endereço
    #[must_use]
    pub fn address_summary(&self, address: &str) -> AddressSummary {
        let chain = self.chain.read().unwrap();
        let state = ChainState::new(&chain);
        let at = now();

        let utxos = state.utxos_of(address, at);
        let balance = utxos.iter().map(|utxo| utxo.amount).sum();
        let copyright_count = utxos
            .iter()
            .filter(|utxo| utxo.kind == UtxoKind::Copyright)
            .count();

        AddressSummary {
            address: address.to_string(),
            balance,
            utxo_count: utxos.len(),
            copyright_count,
            utxos,
        }
    }

    /// UTXOs de copyright vigentes de uma obra
    #[must_use]
    pub fn copyright_by_work(&self, work_hash: &WorkHash) -> Vec<Utxo> {
        let chain = self.chain.read().unwrap();
        ChainState::new(&chain).copyright_by_work(work_hash, now())
    }

    /// Prova vigente de uma obra em posse de um endereço, se houver
    #[must_use]
    pub fn verify_proof(&self, address: &str, work_hash: &WorkHash) -> Option<Utxo> {
        let chain = self.chain.read().unwrap();
        ChainState::new(&chain).verify_proof(address, work_hash, now())
    }

    /// Situação corrente do nó
    #[must_use]
    pub fn status(&self) -> NodeStatus {
        NodeStatus {
            height: self.height(),
            pending: self.mempool.lock().unwrap().len(),
            miner_address: self.miner_address.clone(),
        }
    }

    /// Executa um passo de mineração: fotografa o mempool, monta o bloco,
    /// prova e anexa. Devolve `None` se não havia transações pendentes.
    ///
    /// O instantâneo é não destrutivo: o lote só sai do mempool depois que o
    /// bloco foi anexado com sucesso. Uma prova de trabalho interrompida pelo
    /// desligamento deixa o mempool intacto. Submissões que chegarem durante
    /// a prova de trabalho esperam o próximo passo; como só o minerador anexa
    /// blocos, o modelo montado continua válido depois que o bloqueio de
    /// leitura é solto.
    ///
    /// # Errors
    ///
    /// Retorna erro se a montagem ou a prova de trabalho falharem
    pub fn mine_pending(&self) -> Result<Option<Block>> {
        let batch: Vec<Transaction> = {
            let pool = self.mempool.lock().unwrap();
            if pool.is_empty() {
                return Ok(None);
            }
            pool.clone()
        };

        let timestamp = now();
        let template = {
            let chain = self.chain.read().unwrap();
            assemble_template(
                &chain,
                &batch,
                &self.params,
                &self.miner_address,
                timestamp,
            )?
        };

        let block = proof_of_work(&template, timestamp, self.params.difficulty, &self.shutdown)?;

        {
            let mut chain = self.chain.write().unwrap();
            chain.push(block.clone());
        }

        // só agora o lote processado sai do mempool, incluídas e descartadas;
        // as descartadas já tiveram o motivo registrado na montagem
        let processed: BTreeSet<Hash256> = batch.iter().map(|tx| tx.txid).collect();
        self.mempool
            .lock()
            .unwrap()
            .retain(|tx| !processed.contains(&tx.txid));

        info!(
            index = block.index,
            hash = %block.hash,
            transactions = block.transactions.len(),
            dropped = template.dropped,
            "bloco anexado à cadeia"
        );

        Ok(Some(block))
    }

    /// Dispara o trabalhador de mineração em segundo plano.
    ///
    /// O laço dorme enquanto o mempool está vazio e encerra quando o
    /// desligamento é sinalizado.
    #[must_use]
    pub fn spawn_miner(&self) -> thread::JoinHandle<()> {
        let node = self.clone();
        thread::spawn(move || {
            while !node.shutdown.load(Ordering::SeqCst) {
                match node.mine_pending() {
                    Ok(Some(_)) => {}
                    Ok(None) => thread::sleep(Duration::from_secs(1)),
                    Err(ChainError::MiningInterrupted) => break,
                    Err(e) => {
                        error!(error = %e, "erro no laço de mineração");
                        thread::sleep(Duration::from_secs(1));
                    }
                }
            }
        })
    }

    /// Sinaliza o desligamento; a mineração observa no próximo checkpoint
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}
