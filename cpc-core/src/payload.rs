use crate::utxo::OutPoint;
use serde::{Deserialize, Serialize};
use shared::types::{Address, Timestamp, WorkHash};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Prazo de autorização: fixo em 3 meses (90 dias), contado a partir da
/// criação da UTXO
pub const LICENSE_TERM_SECS: Timestamp = 90 * 24 * 3600;

/// Estado de direitos autorais carregado por uma UTXO de copyright.
///
/// O ciclo de vida segue a máquina de estados do minerador:
/// `sovereignty -> instruction -> proof -> secondary`, com recunhagem
/// permitida para `sovereignty` e `proof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyrightType {
    /// Soberania: posse plena, cunhada no registro da obra
    Sovereignty,
    /// Instrução: licença pendente, em posse do licenciado
    Instruction,
    /// Prova: licença ativa; renovável e sublicenciável
    Proof,
    /// Sublicença derivada de uma prova; estado terminal
    Secondary,
}

impl fmt::Display for CopyrightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sovereignty => "sovereignty",
            Self::Instruction => "instruction",
            Self::Proof => "proof",
            Self::Secondary => "secondary",
        };
        write!(f, "{name}")
    }
}

/// Payload de direitos autorais armazenado nas UTXOs de copyright
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyrightPayload {
    /// Hash SHA-256 do conteúdo da obra
    pub work_hash: WorkHash,
    /// Título da obra
    pub work_title: String,
    /// Endereço do autor original
    pub author: Address,
    /// Tipo da UTXO de copyright
    pub copyright_type: CopyrightType,
    /// Direitos concedidos (impressão, distribuição, adaptação, ...)
    pub rights_scope: BTreeSet<String>,
    /// UTXO mãe, presente apenas em sublicenças
    pub parent_outpoint: Option<OutPoint>,
    /// Metadados livres
    pub metadata: BTreeMap<String, String>,
    /// Momento da criação; a expiração é derivada daqui
    pub created_at: Timestamp,
}

impl CopyrightPayload {
    /// Cria um novo payload sem vínculo com UTXO mãe
    #[must_use]
    pub fn new(
        work_hash: impl Into<WorkHash>,
        work_title: impl Into<String>,
        author: impl Into<Address>,
        copyright_type: CopyrightType,
        rights_scope: BTreeSet<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            work_hash: work_hash.into(),
            work_title: work_title.into(),
            author: author.into(),
            copyright_type,
            rights_scope,
            parent_outpoint: None,
            metadata: BTreeMap::new(),
            created_at,
        }
    }

    /// Vincula o payload à UTXO mãe (sublicenças)
    #[must_use]
    pub fn with_parent(mut self, parent: OutPoint) -> Self {
        self.parent_outpoint = Some(parent);
        self
    }

    /// Escopo de direitos padrão de um registro de obra
    #[must_use]
    pub fn default_rights() -> BTreeSet<String> {
        ["print", "distribute", "adapt", "perform"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Momento em que a autorização expira (`created_at` + 3 meses)
    #[must_use]
    pub const fn end_time(&self) -> Timestamp {
        self.created_at + LICENSE_TERM_SECS
    }

    /// Verifica se a autorização já expirou em `now`
    #[must_use]
    pub const fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.end_time()
    }
}
