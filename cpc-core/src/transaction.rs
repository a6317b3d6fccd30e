use crate::payload::CopyrightPayload;
use crate::utxo::{OutPoint, UtxoKind};
use serde::{Deserialize, Serialize};
use shared::types::{Address, Amount, Timestamp};
use shared::{canonical_digest, ChainError, Hash256, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Tipos de transação da cadeia CPC.
///
/// CPC é um crédito funcional, não uma moeda de uso geral: não existe
/// transferência livre entre usuários, apenas as operações do ciclo de vida
/// de direitos autorais e a torneira do sistema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    /// Torneira: o sistema distribui combustível (também usada na coinbase)
    Faucet,
    /// Registro de obra: cunha a UTXO de soberania
    CopyrightRegister,
    /// Bloqueio de autorização: soberania emite uma instrução
    AuthorizationLock,
    /// Ativação de autorização: instrução amadurece em prova
    AuthorizationActivate,
    /// Renovação de uma prova vigente
    Renewal,
    /// Resgate de autorização
    Redemption,
    /// Sublicenciamento de uma prova
    SubLicense,
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Faucet => "faucet",
            Self::CopyrightRegister => "copyright_register",
            Self::AuthorizationLock => "authorization_lock",
            Self::AuthorizationActivate => "authorization_activate",
            Self::Renewal => "renewal",
            Self::Redemption => "redemption",
            Self::SubLicense => "sub_license",
        };
        write!(f, "{name}")
    }
}

/// Input de transação: referência a uma UTXO existente mais a tabela de
/// assinaturas dos participantes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxInput {
    /// UTXO sendo gasta
    pub previous_output: OutPoint,
    /// Chave pública do gastador na forma de assinatura única
    pub public_key: Option<Address>,
    /// Endereços que precisam assinar em conjunto
    pub required_signers: Vec<Address>,
    /// Assinaturas coletadas, por endereço
    pub signatures: BTreeMap<Address, String>,
}

impl TxInput {
    /// Cria um input multi-parte, ainda sem assinaturas
    #[must_use]
    pub fn new(previous_output: OutPoint, required_signers: Vec<Address>) -> Self {
        Self {
            previous_output,
            public_key: None,
            required_signers,
            signatures: BTreeMap::new(),
        }
    }

    /// Forma de assinatura única: o próprio gastador é o único signatário
    #[must_use]
    pub fn single_signer(previous_output: OutPoint, public_key: impl Into<Address>) -> Self {
        let public_key = public_key.into();
        Self {
            previous_output,
            public_key: Some(public_key.clone()),
            required_signers: vec![public_key],
            signatures: BTreeMap::new(),
        }
    }

    /// Registra a assinatura de um participante
    pub fn add_signature(&mut self, address: impl Into<Address>, signature: impl Into<String>) {
        self.signatures.insert(address.into(), signature.into());
    }

    /// Verifica se todos os signatários exigidos já assinaram
    #[must_use]
    pub fn is_fully_signed(&self) -> bool {
        self.required_signers
            .iter()
            .all(|signer| self.signatures.contains_key(signer))
    }

    /// Endereços exigidos que ainda não assinaram
    #[must_use]
    pub fn unsigned_signers(&self) -> Vec<Address> {
        self.required_signers
            .iter()
            .filter(|signer| !self.signatures.contains_key(*signer))
            .cloned()
            .collect()
    }
}

// Contribuição de um input para o txid. As assinaturas ficam de fora do
// preimage: adicionar uma assinatura não altera a identidade da transação,
// adicionar um input ou um signatário altera.
#[derive(Serialize)]
struct InputPreimage<'a> {
    previous_output: &'a OutPoint,
    public_key: &'a Option<Address>,
    required_signers: &'a [Address],
}

#[derive(Serialize)]
struct TxPreimage<'a> {
    inputs: Vec<InputPreimage<'a>>,
    outputs: &'a [TxOutput],
    tx_type: TxType,
    timestamp: Timestamp,
    metadata: &'a BTreeMap<String, String>,
}

/// Output de transação: cria uma nova UTXO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Quantidade de CPC
    pub amount: Amount,
    /// Endereço de destino
    pub address: Address,
    /// Script de bloqueio codificado
    pub script: String,
    /// Natureza da UTXO criada
    pub kind: UtxoKind,
    /// Payload de direitos autorais, para outputs de copyright
    pub payload: Option<CopyrightPayload>,
}

impl TxOutput {
    /// Output de combustível
    #[must_use]
    pub fn fuel(amount: Amount, address: impl Into<Address>, script: impl Into<String>) -> Self {
        Self {
            amount,
            address: address.into(),
            script: script.into(),
            kind: UtxoKind::Fuel,
            payload: None,
        }
    }

    /// Output de copyright com o payload dado
    #[must_use]
    pub fn copyright(
        amount: Amount,
        address: impl Into<Address>,
        script: impl Into<String>,
        payload: CopyrightPayload,
    ) -> Self {
        Self {
            amount,
            address: address.into(),
            script: script.into(),
            kind: UtxoKind::Copyright,
            payload: Some(payload),
        }
    }
}

/// Transação CPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub tx_type: TxType,
    /// Metadados livres (título da obra, licenciado, ...)
    pub metadata: BTreeMap<String, String>,
    /// Momento da criação
    pub timestamp: Timestamp,
    /// Identidade da transação, derivada do preimage canônico
    pub txid: Hash256,
}

impl Transaction {
    /// Cria e sela uma transação
    ///
    /// # Errors
    ///
    /// Retorna erro se a serialização do preimage falhar
    pub fn new(
        inputs: Vec<TxInput>,
        outputs: Vec<TxOutput>,
        tx_type: TxType,
        metadata: BTreeMap<String, String>,
        timestamp: Timestamp,
    ) -> Result<Self> {
        let mut tx = Self {
            inputs,
            outputs,
            tx_type,
            metadata,
            timestamp,
            txid: Hash256::zero(),
        };
        tx.seal()?;
        Ok(tx)
    }

    /// Recalcula o txid. Deve ser chamado sempre que inputs, outputs, tipo,
    /// metadados ou timestamp mudarem; assinaturas não participam.
    ///
    /// # Errors
    ///
    /// Retorna erro se a serialização do preimage falhar
    pub fn seal(&mut self) -> Result<()> {
        self.txid = self.compute_txid()?;
        Ok(())
    }

    /// Calcula o txid sobre o preimage canônico (sem assinaturas)
    ///
    /// # Errors
    ///
    /// Retorna erro se a serialização do preimage falhar
    pub fn compute_txid(&self) -> Result<Hash256> {
        let preimage = TxPreimage {
            inputs: self
                .inputs
                .iter()
                .map(|input| InputPreimage {
                    previous_output: &input.previous_output,
                    public_key: &input.public_key,
                    required_signers: &input.required_signers,
                })
                .collect(),
            outputs: &self.outputs,
            tx_type: self.tx_type,
            timestamp: self.timestamp,
            metadata: &self.metadata,
        };
        canonical_digest(&preimage)
    }

    /// Registra a assinatura de um participante em um input.
    ///
    /// O txid permanece inalterado.
    ///
    /// # Errors
    ///
    /// Retorna erro se o índice do input não existir
    pub fn add_signature(
        &mut self,
        input_index: usize,
        address: impl Into<Address>,
        signature: impl Into<String>,
    ) -> Result<()> {
        let input = self.inputs.get_mut(input_index).ok_or_else(|| {
            ChainError::InvalidTransaction(format!("input #{input_index} não existe"))
        })?;
        input.add_signature(address, signature);
        Ok(())
    }

    /// Verifica se todos os inputs com signatários exigidos estão completos
    #[must_use]
    pub fn is_fully_signed(&self) -> bool {
        self.inputs
            .iter()
            .filter(|input| !input.required_signers.is_empty())
            .all(TxInput::is_fully_signed)
    }

    /// Signatários pendentes, por input
    #[must_use]
    pub fn unsigned_signers(&self) -> Vec<(usize, Vec<Address>)> {
        self.inputs
            .iter()
            .enumerate()
            .filter_map(|(index, input)| {
                let missing = input.unsigned_signers();
                (!missing.is_empty()).then_some((index, missing))
            })
            .collect()
    }

    /// Soma dos valores de saída
    #[must_use]
    pub fn total_output_value(&self) -> Amount {
        self.outputs.iter().map(|output| output.amount).sum()
    }
}
