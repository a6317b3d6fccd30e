//! Primitivas de assinatura ECDSA (secp256k1) da Time-Rights Chain
//!
//! Chaves públicas e assinaturas viajam em base64; o endereço de uma carteira
//! é a própria chave pública comprimida codificada em base64.

use crate::types::Address;
use crate::{ChainError, Hash256, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

/// Par de chaves secp256k1
#[derive(Debug, Clone)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Gera um novo par de chaves aleatório
    #[must_use]
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut rand::thread_rng());
        Self {
            secret_key,
            public_key,
        }
    }

    /// Reconstrói um par de chaves a partir da chave privada em hexadecimal
    ///
    /// # Errors
    ///
    /// Retorna erro se os bytes não formarem uma chave secp256k1 válida
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self> {
        let bytes = hex::decode(secret_hex).map_err(|e| ChainError::InvalidKey(e.to_string()))?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|e| ChainError::InvalidKey(e.to_string()))?;
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self {
            secret_key,
            public_key,
        })
    }

    /// Chave privada em hexadecimal (para armazenamento pela carteira)
    #[must_use]
    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Endereço da carteira: chave pública comprimida em base64
    #[must_use]
    pub fn address(&self) -> Address {
        BASE64.encode(self.public_key.serialize())
    }

    /// Assina um txid, devolvendo a assinatura compacta em base64
    #[must_use]
    pub fn sign_txid(&self, txid: &Hash256) -> String {
        let secp = Secp256k1::signing_only();
        let signature = secp.sign_ecdsa(&signing_message(txid), &self.secret_key);
        BASE64.encode(signature.serialize_compact())
    }
}

// A mensagem canônica é o txid como string hexadecimal (UTF-8), digerida com
// SHA-256 para caber nos 32 bytes que o secp256k1 exige.
fn signing_message(txid: &Hash256) -> Message {
    let digest = Hash256::sha256(txid.to_string().as_bytes());
    Message::from_digest(*digest.as_bytes())
}

/// Verifica uma assinatura em base64 contra um endereço e um txid
#[must_use]
pub fn verify_signature(address: &str, signature_b64: &str, txid: &Hash256) -> bool {
    let Ok(key_bytes) = BASE64.decode(address) else {
        return false;
    };
    let Ok(public_key) = PublicKey::from_slice(&key_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = BASE64.decode(signature_b64) else {
        return false;
    };
    let Ok(signature) = Signature::from_compact(&sig_bytes) else {
        return false;
    };

    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&signing_message(txid), &signature, &public_key)
        .is_ok()
}
