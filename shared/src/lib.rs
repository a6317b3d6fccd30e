pub mod crypto;
pub mod error;
pub mod hash;
pub mod types;

// Re-exports principais
pub use crypto::{verify_signature, KeyPair};
pub use error::ChainError;
pub use hash::{canonical_digest, Hash256};

pub type Result<T> = std::result::Result<T, ChainError>;
