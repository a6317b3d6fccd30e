use crate::{ChainError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Hash de 256 bits usado para identificar blocos, transações e obras
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// Creates a zeroed hash
    #[must_use]
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Creates a hash from a 32-byte array
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes of the hash
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Computes the SHA-256 hash of the provided data
    #[must_use]
    pub fn sha256(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        Self(hash)
    }

    /// Verifica se o hash atende à dificuldade
    /// (número de dígitos hexadecimais zero no início)
    #[must_use]
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.leading_zero_digits() >= difficulty
    }

    /// Conta os dígitos hexadecimais zero no início do hash
    #[must_use]
    pub fn leading_zero_digits(&self) -> u32 {
        let mut digits = 0;
        for &byte in &self.0 {
            if byte == 0 {
                digits += 2;
            } else {
                if byte >> 4 == 0 {
                    digits += 1;
                }
                break;
            }
        }
        digits
    }
}

/// Calcula a impressão digital canônica de um valor serializável.
///
/// O valor passa por `serde_json::Value` antes de ser codificado: o mapa de
/// objetos padrão do `serde_json` é um `BTreeMap`, portanto as chaves saem
/// ordenadas e o mesmo valor produz sempre os mesmos bytes. Todos os txids e
/// hashes de bloco da cadeia nascem aqui.
///
/// # Errors
///
/// Retorna erro se a serialização falhar
pub fn canonical_digest<T: Serialize>(value: &T) -> Result<Hash256> {
    let canonical = serde_json::to_value(value)
        .map_err(|e| ChainError::SerializationError(e.to_string()))?;
    let encoded = serde_json::to_vec(&canonical)
        .map_err(|e| ChainError::SerializationError(e.to_string()))?;
    Ok(Hash256::sha256(&encoded))
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Hash256 {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| ChainError::InvalidHash(e.to_string()))?;
        let hash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ChainError::InvalidHash(format!("comprimento inválido: {s}")))?;
        Ok(Self(hash))
    }
}

// No formato de fio todos os hashes viajam como strings hexadecimais
impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_hash_creation_and_display() {
        let hash = Hash256::zero();
        assert_eq!(
            hash.to_string(),
            "0000000000000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_sha256_known_vector() {
        let hash = Hash256::sha256(b"hello");
        assert_eq!(
            hash.to_string(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_hex_round_trip() {
        let hash = Hash256::sha256(b"round trip");
        let parsed: Hash256 = hash.to_string().parse().unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let hash = Hash256::sha256(b"wire");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{hash}\""));

        let back: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, back);
    }

    #[test]
    fn test_difficulty_counts_hex_digits() {
        let easy = Hash256::from_bytes([
            0, 0, 0x0f, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0,
        ]);
        // dois bytes zero + nibble alto zero = 5 dígitos
        assert_eq!(easy.leading_zero_digits(), 5);
        assert!(easy.meets_difficulty(4));
        assert!(!easy.meets_difficulty(6));
    }

    #[test]
    fn test_canonical_digest_is_key_order_independent() {
        let mut a = BTreeMap::new();
        a.insert("beta", 2);
        a.insert("alpha", 1);

        #[derive(Serialize)]
        struct Reordered {
            beta: i32,
            alpha: i32,
        }

        let digest_map = canonical_digest(&a).unwrap();
        let digest_struct = canonical_digest(&Reordered { beta: 2, alpha: 1 }).unwrap();
        assert_eq!(digest_map, digest_struct);
    }
}
