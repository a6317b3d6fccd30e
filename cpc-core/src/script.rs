use serde::{Deserialize, Serialize};
use shared::types::{Address, Timestamp};
use shared::ChainError;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Wire tokens of the pipe-delimited script encoding
const TOKEN_TIMELOCK: &str = "CHECKLOCKTIMEVERIFY";
const TOKEN_MULTISIG: &str = "MULTISIG";

/// Locking predicate families supported by the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptType {
    /// Pay-to-public-key-hash (single signer)
    #[serde(rename = "P2PKH")]
    P2pkh,
    /// m-of-n multisignature
    #[serde(rename = "MULTISIG")]
    Multisig,
    /// Spendable only after a given time
    #[serde(rename = "TIMELOCK")]
    Timelock,
}

impl ScriptType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::P2pkh => "P2PKH",
            Self::Multisig => "MULTISIG",
            Self::Timelock => "TIMELOCK",
        }
    }
}

impl FromStr for ScriptType {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P2PKH" => Ok(Self::P2pkh),
            "MULTISIG" => Ok(Self::Multisig),
            "TIMELOCK" => Ok(Self::Timelock),
            other => Err(ChainError::InvalidScript(format!(
                "unknown script type: {other}"
            ))),
        }
    }
}

/// Locking script carried by every output.
///
/// Spendability is a pure function of (time, presented signers, optional
/// payload expiry); there is no stack machine beyond these three forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockScript {
    pub script_type: ScriptType,
    /// Addresses allowed to unlock the output
    pub addresses: Vec<Address>,
    /// Signatures required among `addresses` (>= 1)
    pub required_sigs: usize,
    /// Earliest spendable time, if any
    pub time_lock: Option<Timestamp>,
}

impl LockScript {
    /// Single-signer script for the given address
    #[must_use]
    pub fn p2pkh(address: impl Into<Address>) -> Self {
        Self {
            script_type: ScriptType::P2pkh,
            addresses: vec![address.into()],
            required_sigs: 1,
            time_lock: None,
        }
    }

    /// m-of-n multisignature script
    #[must_use]
    pub fn multisig(addresses: Vec<Address>, required_sigs: usize) -> Self {
        Self {
            script_type: ScriptType::Multisig,
            addresses,
            required_sigs,
            time_lock: None,
        }
    }

    /// Single-signer script that matures at `time_lock`
    #[must_use]
    pub fn timelock(address: impl Into<Address>, time_lock: Timestamp) -> Self {
        Self {
            script_type: ScriptType::Timelock,
            addresses: vec![address.into()],
            required_sigs: 1,
            time_lock: Some(time_lock),
        }
    }

    /// Decides whether the output can be spent at `now` by `signers`.
    ///
    /// `end_time` carries a payload-derived expiry (copyright outputs lapse 90
    /// days after creation); once reached the output is unspendable no matter
    /// which signatures are presented.
    #[must_use]
    pub fn can_spend(
        &self,
        now: Timestamp,
        signers: &[Address],
        end_time: Option<Timestamp>,
    ) -> bool {
        if let Some(end) = end_time {
            if now >= end {
                return false;
            }
        }

        if let Some(lock) = self.time_lock {
            if now < lock {
                return false;
            }
        }

        let valid: BTreeSet<&Address> = signers
            .iter()
            .filter(|signer| self.addresses.contains(signer))
            .collect();
        valid.len() >= self.required_sigs
    }
}

// Canonical wire form:
//   TYPE[|CHECKLOCKTIMEVERIFY:<ts>][|MULTISIG:<r>:<n>]|addr|addr|...
// Addresses are base64 and can never contain the `|` separator.
impl fmt::Display for LockScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![self.script_type.as_str().to_string()];

        if let Some(lock) = self.time_lock {
            parts.push(format!("{TOKEN_TIMELOCK}:{lock}"));
        }

        if self.required_sigs > 1 {
            parts.push(format!(
                "{TOKEN_MULTISIG}:{}:{}",
                self.required_sigs,
                self.addresses.len()
            ));
        }

        parts.extend(self.addresses.iter().cloned());
        write!(f, "{}", parts.join("|"))
    }
}

impl FromStr for LockScript {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('|');
        let script_type = parts
            .next()
            .ok_or_else(|| ChainError::InvalidScript("empty script".to_string()))?
            .parse()?;

        let mut time_lock = None;
        let mut required_sigs = 1;
        let mut addresses = Vec::new();

        for part in parts {
            if let Some(value) = part.strip_prefix(&format!("{TOKEN_TIMELOCK}:")) {
                time_lock = Some(value.parse().map_err(|_| {
                    ChainError::InvalidScript(format!("bad time lock: {value}"))
                })?);
            } else if let Some(value) = part.strip_prefix(&format!("{TOKEN_MULTISIG}:")) {
                let required = value.split(':').next().unwrap_or_default();
                required_sigs = required.parse().map_err(|_| {
                    ChainError::InvalidScript(format!("bad multisig header: {part}"))
                })?;
            } else {
                addresses.push(part.to_string());
            }
        }

        Ok(Self {
            script_type,
            addresses,
            required_sigs,
            time_lock,
        })
    }
}
