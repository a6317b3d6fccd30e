pub mod block;
pub mod config;
pub mod error;
pub mod mining;
pub mod node;
pub mod payload;
pub mod script;
pub mod state;
pub mod transaction;
pub mod utxo;
pub mod validator;

// Re-exports principais
pub use block::Block;
pub use config::ChainParams;
pub use error::{ValidationError, ValidationResult};
pub use mining::{assemble_template, mine_block, proof_of_work, BlockTemplate};
pub use node::{AddressSummary, Node, NodeStatus, SubmitResult};
pub use payload::{CopyrightPayload, CopyrightType, LICENSE_TERM_SECS};
pub use script::{LockScript, ScriptType};
pub use state::ChainState;
pub use transaction::{Transaction, TxInput, TxOutput, TxType};
pub use utxo::{OutPoint, Utxo, UtxoKind, UtxoSet};
pub use validator::TransactionValidator;

// Re-exports de tipos compartilhados
pub use shared::{ChainError, Hash256, Result};
