//! Tipos compartilhados entre módulos da Time-Rights Chain

use chrono::Utc;

/// Alias para identificador único de transação
pub type TxId = crate::Hash256;

/// Alias para identificador único de bloco
pub type BlockId = crate::Hash256;

/// Alias para endereço de carteira (chave pública comprimida em base64)
pub type Address = String;

/// Alias para o digesto SHA-256 de uma obra, em hexadecimal
pub type WorkHash = String;

/// Alias para quantidade de CPC (real não-negativo)
pub type Amount = f64;

/// Alias para timestamp Unix em segundos
pub type Timestamp = i64;

/// Alias para altura do bloco na cadeia
pub type BlockHeight = u64;

/// Timestamp Unix corrente
#[must_use]
pub fn now() -> Timestamp {
    Utc::now().timestamp()
}
