use thiserror::Error;

/// Erros de infraestrutura da cadeia
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Transação inválida: {0}")]
    InvalidTransaction(String),

    #[error("Bloco inválido: {0}")]
    InvalidBlock(String),

    #[error("Hash inválido: {0}")]
    InvalidHash(String),

    #[error("Script ilegível: {0}")]
    InvalidScript(String),

    #[error("Mineração interrompida")]
    MiningInterrupted,

    #[error("Assinatura inválida")]
    InvalidSignature,

    #[error("Chave inválida: {0}")]
    InvalidKey(String),

    #[error("Erro criptográfico: {0}")]
    CryptographicError(String),

    #[error("Erro de serialização: {0}")]
    SerializationError(String),

    #[error("Erro de I/O: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}
