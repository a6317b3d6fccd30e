use serde::{Deserialize, Serialize};
use shared::types::Amount;

/// Teto de emissão por transação de torneira (regra de consenso)
pub const FAUCET_TX_CAP: Amount = 10.0;

/// Quantidade distribuída por pedido à torneira
pub const FAUCET_GRANT: Amount = 5.0;

/// Subsídio da torneira do bloco gênese
pub const GENESIS_GRANT: Amount = 100.0;

/// Recompensa fixa por bloco, creditada na coinbase junto com as taxas
pub const BLOCK_REWARD: Amount = 1.0;

/// Dificuldade padrão: dígitos hexadecimais zero exigidos no hash do bloco
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Parâmetros da rede CPC
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainParams {
    /// Dificuldade da prova de trabalho
    pub difficulty: u32,
    /// Recompensa por bloco
    pub block_reward: Amount,
    /// Subsídio do gênese
    pub genesis_grant: Amount,
    /// Valor de cada pedido à torneira
    pub faucet_grant: Amount,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            block_reward: BLOCK_REWARD,
            genesis_grant: GENESIS_GRANT,
            faucet_grant: FAUCET_GRANT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = ChainParams::default();

        assert_eq!(params.difficulty, 4);
        assert_eq!(params.block_reward, 1.0);
        assert_eq!(params.genesis_grant, 100.0);
        assert_eq!(params.faucet_grant, 5.0);
    }
}
