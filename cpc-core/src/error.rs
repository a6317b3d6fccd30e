use crate::config::FAUCET_TX_CAP;
use crate::payload::CopyrightType;
use crate::transaction::TxType;
use crate::utxo::OutPoint;
use shared::types::{Address, Amount, WorkHash};
use thiserror::Error;

/// Motivos de rejeição do validador de transações.
///
/// Cada variante corresponde a uma razão de linha única devolvida ao
/// remetente; o minerador registra a mesma razão ao descartar uma transação.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("input #{input_index} ainda aguarda assinaturas de: {missing:?}")]
    MissingSignature {
        input_index: usize,
        missing: Vec<Address>,
    },

    #[error("input #{input_index} carrega assinatura inválida")]
    BadSignature { input_index: usize },

    #[error("UTXO {outpoint} não existe ou já foi gasta")]
    SpentOrUnknown { outpoint: OutPoint },

    #[error("condições de bloqueio da UTXO {outpoint} não satisfeitas (pode ter expirado)")]
    LockedOrExpired { outpoint: OutPoint },

    #[error("saídas ({output_total}) excedem entradas ({input_total})")]
    ValueImbalance {
        input_total: Amount,
        output_total: Amount,
    },

    #[error("transação {tx_type} malformada: {detail}")]
    TypeRule { tx_type: TxType, detail: String },

    #[error("transição de estado proibida: {from} -> {to}")]
    StateMachine {
        from: CopyrightType,
        to: CopyrightType,
    },

    #[error("transação {tx_type} não pode mudar o endereço da obra {work_hash}")]
    AddressOwnership { tx_type: TxType, work_hash: WorkHash },

    #[error("escopo de direitos da sublicença não é subconjunto do escopo da licença-mãe")]
    RightsScope,

    #[error("torneira limitada a {FAUCET_TX_CAP} CPC por transação")]
    FaucetOverdraw,
}

/// Alias para o resultado do validador
pub type ValidationResult = std::result::Result<(), ValidationError>;
