pub mod pending;

pub use pending::PendingStore;

use cpc_core::{
    CopyrightPayload, CopyrightType, LockScript, Transaction, TxInput, TxOutput, TxType, Utxo,
    UtxoKind,
};
use shared::types::{now, Address, Amount, WorkHash};
use shared::{ChainError, Hash256, KeyPair};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Valor fixo da UTXO de soberania cunhada no registro
pub const SOVEREIGNTY_AMOUNT: Amount = 1.0;

/// Valor da UTXO de instrução emitida no bloqueio de autorização
pub const INSTRUCTION_AMOUNT: Amount = 0.04;

/// Valor das UTXOs de prova e de sublicença
pub const PROOF_AMOUNT: Amount = 0.01;

/// Taxa padrão deixada para o minerador
pub const STANDARD_FEE: Amount = 0.01;

/// Combustível mínimo exigido para iniciar uma operação
pub const MIN_FUEL: Amount = 0.1;

/// Erros da carteira
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("combustível insuficiente: necessário {needed} CPC, disponível {available}")]
    InsufficientFuel { needed: Amount, available: Amount },

    #[error("UTXO inadequada: {0}")]
    WrongUtxo(String),

    #[error("autorização expirada (prazo fixo de 3 meses)")]
    Expired,

    #[error("direitos solicitados fora do escopo da licença-mãe")]
    RightsNotSubset,

    #[error("esta carteira não é o licenciado da transação")]
    NotTheLicensee,

    #[error("transação pendente não encontrada: {0}")]
    PendingNotFound(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

pub type WalletResult<T> = std::result::Result<T, WalletError>;

/// Carteira CPC: um par de chaves mais os construtores de transação do ciclo
/// de vida de direitos autorais
pub struct Wallet {
    keypair: KeyPair,
}

impl Wallet {
    /// Gera uma carteira nova
    #[must_use]
    pub fn generate() -> Self {
        Self {
            keypair: KeyPair::generate(),
        }
    }

    /// Restaura uma carteira a partir da chave privada em hexadecimal
    ///
    /// # Errors
    ///
    /// Retorna erro se a chave for inválida
    pub fn from_secret_hex(secret_hex: &str) -> WalletResult<Self> {
        Ok(Self {
            keypair: KeyPair::from_secret_hex(secret_hex)?,
        })
    }

    /// Chave privada em hexadecimal, para persistência
    #[must_use]
    pub fn secret_hex(&self) -> String {
        self.keypair.secret_hex()
    }

    /// Endereço da carteira (a chave pública em base64)
    #[must_use]
    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    /// Digesto SHA-256 do conteúdo de uma obra, em hexadecimal
    #[must_use]
    pub fn work_fingerprint(content: &[u8]) -> WorkHash {
        Hash256::sha256(content).to_string()
    }

    /// Assina todos os inputs que listam esta carteira entre os signatários.
    ///
    /// Devolve `true` se a transação ficou completamente assinada.
    pub fn sign_transaction(&self, tx: &mut Transaction) -> bool {
        let address = self.address();
        let signature = self.keypair.sign_txid(&tx.txid);

        for input in &mut tx.inputs {
            if input.required_signers.contains(&address) {
                input.add_signature(address.clone(), signature.clone());
            }
        }

        tx.is_fully_signed()
    }

    fn own_script(&self) -> String {
        LockScript::p2pkh(self.address()).to_string()
    }

    fn require_own_fuel(&self, fuel: &Utxo, needed: Amount) -> WalletResult<()> {
        if fuel.kind != UtxoKind::Fuel {
            return Err(WalletError::WrongUtxo(
                "esperava UTXO de combustível".to_string(),
            ));
        }
        if fuel.address != self.address() {
            return Err(WalletError::WrongUtxo(
                "o combustível não pertence a esta carteira".to_string(),
            ));
        }
        if fuel.amount < needed {
            return Err(WalletError::InsufficientFuel {
                needed,
                available: fuel.amount,
            });
        }
        Ok(())
    }

    fn own_copyright_payload<'u>(
        &self,
        utxo: &'u Utxo,
        expected: CopyrightType,
    ) -> WalletResult<&'u CopyrightPayload> {
        let payload = utxo
            .payload
            .as_ref()
            .filter(|_| utxo.kind == UtxoKind::Copyright)
            .ok_or_else(|| WalletError::WrongUtxo("esperava UTXO de copyright".to_string()))?;

        if payload.copyright_type != expected {
            return Err(WalletError::WrongUtxo(format!(
                "esperava UTXO {expected}, recebida {}",
                payload.copyright_type
            )));
        }
        if utxo.address != self.address() {
            return Err(WalletError::WrongUtxo(
                "a UTXO não pertence a esta carteira".to_string(),
            ));
        }
        Ok(payload)
    }

    /// Fase um: registro de obra.
    ///
    /// Consome combustível e cunha a UTXO de soberania (1 CPC fixo), com o
    /// troco de combustível de volta para o autor.
    ///
    /// # Errors
    ///
    /// Retorna erro se o combustível for inadequado ou a selagem falhar
    pub fn register_copyright(
        &self,
        fuel: &Utxo,
        work_hash: impl Into<WorkHash>,
        work_title: impl Into<String>,
        rights_scope: BTreeSet<String>,
    ) -> WalletResult<Transaction> {
        self.require_own_fuel(fuel, SOVEREIGNTY_AMOUNT + STANDARD_FEE)?;

        let work_title = work_title.into();
        let payload = CopyrightPayload::new(
            work_hash,
            work_title.clone(),
            self.address(),
            CopyrightType::Sovereignty,
            rights_scope,
            now(),
        );

        let mut outputs = vec![TxOutput::copyright(
            SOVEREIGNTY_AMOUNT,
            self.address(),
            self.own_script(),
            payload,
        )];

        let change = fuel.amount - SOVEREIGNTY_AMOUNT - STANDARD_FEE;
        if change > 0.0 {
            outputs.push(TxOutput::fuel(change, self.address(), self.own_script()));
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("work_title".to_string(), work_title);

        let mut tx = Transaction::new(
            vec![TxInput::single_signer(fuel.outpoint, self.address())],
            outputs,
            TxType::CopyrightRegister,
            metadata,
            now(),
        )?;
        self.sign_transaction(&mut tx);
        Ok(tx)
    }

    /// Fase dois: bloqueio de autorização.
    ///
    /// O autor consome a soberania e emite uma instrução para o licenciado,
    /// recunhando a soberania para si. Com `fuel` presente o autor paga a
    /// operação e a transação sai assinada; sem combustível a transação sai
    /// SEM assinaturas, incompleta, para o licenciado anexar o próprio
    /// combustível via [`Wallet::attach_fuel_input`] — assinar antes disso
    /// seria inútil, porque o txid muda quando o input entra.
    ///
    /// # Errors
    ///
    /// Retorna erro se as UTXOs forem inadequadas ou a selagem falhar
    pub fn lock_authorization(
        &self,
        sovereignty: &Utxo,
        fuel: Option<&Utxo>,
        licensee: &str,
        rights_scope: BTreeSet<String>,
    ) -> WalletResult<Transaction> {
        let sovereignty_payload = self.own_copyright_payload(sovereignty, CopyrightType::Sovereignty)?;

        let instruction = CopyrightPayload::new(
            sovereignty_payload.work_hash.clone(),
            sovereignty_payload.work_title.clone(),
            self.address(),
            CopyrightType::Instruction,
            rights_scope,
            now(),
        );
        let rebuilt = CopyrightPayload::new(
            sovereignty_payload.work_hash.clone(),
            sovereignty_payload.work_title.clone(),
            self.address(),
            CopyrightType::Sovereignty,
            sovereignty_payload.rights_scope.clone(),
            now(),
        );

        let mut inputs = vec![TxInput::single_signer(sovereignty.outpoint, self.address())];
        let mut outputs = vec![
            TxOutput::copyright(
                INSTRUCTION_AMOUNT,
                licensee,
                LockScript::p2pkh(licensee).to_string(),
                instruction,
            ),
            TxOutput::copyright(
                sovereignty.amount,
                self.address(),
                self.own_script(),
                rebuilt,
            ),
        ];

        let mut metadata = BTreeMap::new();
        metadata.insert("author".to_string(), self.address());
        metadata.insert("licensee".to_string(), licensee.to_string());

        if let Some(fuel) = fuel {
            self.require_own_fuel(fuel, INSTRUCTION_AMOUNT + STANDARD_FEE)?;
            inputs.push(TxInput::single_signer(fuel.outpoint, self.address()));

            let change = fuel.amount - INSTRUCTION_AMOUNT - STANDARD_FEE;
            if change > 0.0 {
                outputs.push(TxOutput::fuel(change, self.address(), self.own_script()));
            }

            let mut tx =
                Transaction::new(inputs, outputs, TxType::AuthorizationLock, metadata, now())?;
            self.sign_transaction(&mut tx);
            Ok(tx)
        } else {
            metadata.insert("multisig".to_string(), "true".to_string());
            Ok(Transaction::new(
                inputs,
                outputs,
                TxType::AuthorizationLock,
                metadata,
                now(),
            )?)
        }
    }

    /// Completa um bloqueio multi-parte anexando o combustível do licenciado.
    ///
    /// O conjunto de inputs muda, então o txid é recalculado e qualquer
    /// assinatura anterior é descartada; os dois participantes assinam a
    /// identidade final.
    ///
    /// # Errors
    ///
    /// Retorna erro se a carteira não for o licenciado designado ou o
    /// combustível for inadequado
    pub fn attach_fuel_input(&self, tx: &mut Transaction, fuel: &Utxo) -> WalletResult<()> {
        let licensee = tx
            .metadata
            .get("licensee")
            .ok_or(WalletError::NotTheLicensee)?;
        if *licensee != self.address() {
            return Err(WalletError::NotTheLicensee);
        }

        self.require_own_fuel(fuel, INSTRUCTION_AMOUNT + STANDARD_FEE)?;

        tx.inputs
            .push(TxInput::single_signer(fuel.outpoint, self.address()));

        let change = fuel.amount - INSTRUCTION_AMOUNT - STANDARD_FEE;
        if change > 0.0 {
            tx.outputs
                .push(TxOutput::fuel(change, self.address(), self.own_script()));
        }

        for input in &mut tx.inputs {
            input.signatures.clear();
        }
        tx.seal()?;
        Ok(())
    }

    /// Fase três: ativação da autorização.
    ///
    /// O licenciado consome a instrução e cunha a prova, herdando obra,
    /// direitos e o momento de criação — o prazo corre desde a instrução.
    ///
    /// # Errors
    ///
    /// Retorna erro se a instrução não pertencer à carteira ou já expirou
    pub fn activate_authorization(&self, instruction: &Utxo) -> WalletResult<Transaction> {
        let instruction_payload =
            self.own_copyright_payload(instruction, CopyrightType::Instruction)?;

        if instruction_payload.is_expired(now()) {
            return Err(WalletError::Expired);
        }

        let proof = CopyrightPayload::new(
            instruction_payload.work_hash.clone(),
            instruction_payload.work_title.clone(),
            instruction_payload.author.clone(),
            CopyrightType::Proof,
            instruction_payload.rights_scope.clone(),
            instruction_payload.created_at,
        );

        let mut tx = Transaction::new(
            vec![TxInput::single_signer(instruction.outpoint, self.address())],
            vec![TxOutput::copyright(
                PROOF_AMOUNT,
                self.address(),
                self.own_script(),
                proof,
            )],
            TxType::AuthorizationActivate,
            BTreeMap::new(),
            now(),
        )?;
        self.sign_transaction(&mut tx);
        Ok(tx)
    }

    /// Fase quatro: renovação de uma prova vigente.
    ///
    /// A prova antiga é consumida e uma nova nasce com o prazo reiniciado.
    ///
    /// # Errors
    ///
    /// Retorna erro se a prova for inadequada, já expirou ou falta combustível
    pub fn renew_license(&self, proof: &Utxo, fuel: &Utxo) -> WalletResult<Transaction> {
        let proof_payload = self.own_copyright_payload(proof, CopyrightType::Proof)?;

        if proof_payload.is_expired(now()) {
            return Err(WalletError::Expired);
        }
        self.require_own_fuel(fuel, STANDARD_FEE)?;

        let renewed = CopyrightPayload::new(
            proof_payload.work_hash.clone(),
            proof_payload.work_title.clone(),
            proof_payload.author.clone(),
            CopyrightType::Proof,
            proof_payload.rights_scope.clone(),
            now(),
        );

        let mut outputs = vec![TxOutput::copyright(
            PROOF_AMOUNT,
            self.address(),
            self.own_script(),
            renewed,
        )];
        let change = fuel.amount - STANDARD_FEE;
        if change > 0.0 {
            outputs.push(TxOutput::fuel(change, self.address(), self.own_script()));
        }

        let mut tx = Transaction::new(
            vec![
                TxInput::single_signer(proof.outpoint, self.address()),
                TxInput::single_signer(fuel.outpoint, self.address()),
            ],
            outputs,
            TxType::Renewal,
            BTreeMap::new(),
            now(),
        )?;
        self.sign_transaction(&mut tx);
        Ok(tx)
    }

    /// Fase cinco: sublicenciamento.
    ///
    /// A prova da licença-mãe é recunhada intacta (o prazo original se
    /// mantém) e a sublicença nasce vinculada a ela, com um subconjunto dos
    /// direitos.
    ///
    /// # Errors
    ///
    /// Retorna erro se a prova for inadequada, os direitos extrapolarem o
    /// escopo da licença-mãe ou faltar combustível
    pub fn sub_license(
        &self,
        proof: &Utxo,
        fuel: &Utxo,
        licensee: &str,
        rights_scope: BTreeSet<String>,
    ) -> WalletResult<Transaction> {
        let proof_payload = self.own_copyright_payload(proof, CopyrightType::Proof)?;

        if proof_payload.is_expired(now()) {
            return Err(WalletError::Expired);
        }
        if !rights_scope.is_subset(&proof_payload.rights_scope) {
            return Err(WalletError::RightsNotSubset);
        }
        self.require_own_fuel(fuel, PROOF_AMOUNT + STANDARD_FEE)?;

        let rebuilt = CopyrightPayload::new(
            proof_payload.work_hash.clone(),
            proof_payload.work_title.clone(),
            proof_payload.author.clone(),
            CopyrightType::Proof,
            proof_payload.rights_scope.clone(),
            proof_payload.created_at,
        );
        let secondary = CopyrightPayload::new(
            proof_payload.work_hash.clone(),
            proof_payload.work_title.clone(),
            proof_payload.author.clone(),
            CopyrightType::Secondary,
            rights_scope,
            now(),
        )
        .with_parent(proof.outpoint);

        let mut outputs = vec![
            TxOutput::copyright(proof.amount, self.address(), self.own_script(), rebuilt),
            TxOutput::copyright(
                PROOF_AMOUNT,
                licensee,
                LockScript::p2pkh(licensee).to_string(),
                secondary,
            ),
        ];
        let change = fuel.amount - PROOF_AMOUNT - STANDARD_FEE;
        if change > 0.0 {
            outputs.push(TxOutput::fuel(change, self.address(), self.own_script()));
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("licensee".to_string(), licensee.to_string());

        let mut tx = Transaction::new(
            vec![
                TxInput::single_signer(proof.outpoint, self.address()),
                TxInput::single_signer(fuel.outpoint, self.address()),
            ],
            outputs,
            TxType::SubLicense,
            metadata,
            now(),
        )?;
        self.sign_transaction(&mut tx);
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpc_core::{Block, ChainState, OutPoint, TransactionValidator, LICENSE_TERM_SECS};

    // planta UTXOs na cadeia e as devolve resolvidas
    fn seed_chain(outputs: Vec<TxOutput>) -> (Vec<Block>, Vec<Utxo>) {
        let mut chain = vec![Block::genesis("miner", 100.0, now() - 100).unwrap()];
        let seed =
            Transaction::new(vec![], outputs, TxType::Faucet, BTreeMap::new(), now() - 50).unwrap();
        let txid = seed.txid;
        let last_hash = chain[0].hash;
        chain.push(Block::new(1, now() - 50, vec![seed], last_hash, 0).unwrap());

        let utxos = {
            let state = ChainState::new(&chain);
            let map = state.utxo_map(now());
            (0..)
                .map_while(|vout| map.get(&OutPoint::new(txid, vout)).cloned())
                .collect()
        };
        (chain, utxos)
    }

    fn fuel_output(wallet: &Wallet, amount: Amount) -> TxOutput {
        TxOutput::fuel(
            amount,
            wallet.address(),
            LockScript::p2pkh(wallet.address()).to_string(),
        )
    }

    fn copyright_output(
        wallet: &Wallet,
        copyright_type: CopyrightType,
        amount: Amount,
        created_at: i64,
    ) -> TxOutput {
        let payload = CopyrightPayload::new(
            "obra-hash",
            "Obra",
            wallet.address(),
            copyright_type,
            CopyrightPayload::default_rights(),
            created_at,
        );
        TxOutput::copyright(
            amount,
            wallet.address(),
            LockScript::p2pkh(wallet.address()).to_string(),
            payload,
        )
    }

    #[test]
    fn test_work_fingerprint_is_sha256_hex() {
        let digest = Wallet::work_fingerprint(b"hello");
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_register_builds_valid_transaction() {
        let alice = Wallet::generate();
        let (chain, utxos) = seed_chain(vec![fuel_output(&alice, 5.0)]);

        let tx = alice
            .register_copyright(
                &utxos[0],
                Wallet::work_fingerprint(b"hello"),
                "Sob o Céu Estrelado",
                CopyrightPayload::default_rights(),
            )
            .unwrap();

        assert!(tx.is_fully_signed());
        assert_eq!(tx.tx_type, TxType::CopyrightRegister);
        // soberania de 1.0 + troco de 3.99
        assert_eq!(tx.outputs.len(), 2);
        assert!((tx.outputs[1].amount - 3.99).abs() < 1e-9);

        let validator = TransactionValidator::new(&chain);
        assert_eq!(validator.validate(&tx, now()), Ok(()));
    }

    #[test]
    fn test_register_refuses_insufficient_fuel() {
        let alice = Wallet::generate();
        let (_, utxos) = seed_chain(vec![fuel_output(&alice, 0.5)]);

        let result = alice.register_copyright(
            &utxos[0],
            Wallet::work_fingerprint(b"hello"),
            "Obra",
            CopyrightPayload::default_rights(),
        );
        assert!(matches!(
            result,
            Err(WalletError::InsufficientFuel { .. })
        ));
    }

    #[test]
    fn test_register_refuses_foreign_fuel() {
        let alice = Wallet::generate();
        let bob = Wallet::generate();
        let (_, utxos) = seed_chain(vec![fuel_output(&bob, 5.0)]);

        let result = alice.register_copyright(
            &utxos[0],
            Wallet::work_fingerprint(b"hello"),
            "Obra",
            CopyrightPayload::default_rights(),
        );
        assert!(matches!(result, Err(WalletError::WrongUtxo(_))));
    }

    #[test]
    fn test_single_signer_lock_is_valid() {
        let alice = Wallet::generate();
        let bob = Wallet::generate();
        let (chain, utxos) = seed_chain(vec![
            copyright_output(&alice, CopyrightType::Sovereignty, 1.0, now() - 50),
            fuel_output(&alice, 5.0),
        ]);

        let tx = alice
            .lock_authorization(
                &utxos[0],
                Some(&utxos[1]),
                &bob.address(),
                CopyrightPayload::default_rights(),
            )
            .unwrap();

        assert!(tx.is_fully_signed());
        let validator = TransactionValidator::new(&chain);
        assert_eq!(validator.validate(&tx, now()), Ok(()));

        // a instrução sai para o licenciado
        let instruction = &tx.outputs[0];
        assert_eq!(instruction.address, bob.address());
        assert!((instruction.amount - INSTRUCTION_AMOUNT).abs() < 1e-9);
    }

    #[test]
    fn test_activation_inherits_instruction_created_at() {
        let bob = Wallet::generate();
        let created_at = now() - 1000;
        let (chain, utxos) = seed_chain(vec![copyright_output(
            &bob,
            CopyrightType::Instruction,
            INSTRUCTION_AMOUNT,
            created_at,
        )]);

        let tx = bob.activate_authorization(&utxos[0]).unwrap();

        let proof = tx.outputs[0].payload.as_ref().unwrap();
        assert_eq!(proof.copyright_type, CopyrightType::Proof);
        // o prazo corre desde a criação da instrução
        assert_eq!(proof.created_at, created_at);

        let validator = TransactionValidator::new(&chain);
        assert_eq!(validator.validate(&tx, now()), Ok(()));
    }

    #[test]
    fn test_activation_refuses_expired_instruction() {
        let bob = Wallet::generate();
        let created_at = now() - LICENSE_TERM_SECS - 10;
        let (_, utxos) = seed_chain(vec![copyright_output(
            &bob,
            CopyrightType::Instruction,
            INSTRUCTION_AMOUNT,
            created_at,
        )]);

        assert!(matches!(
            bob.activate_authorization(&utxos[0]),
            Err(WalletError::Expired)
        ));
    }

    #[test]
    fn test_renewal_restarts_term() {
        let bob = Wallet::generate();
        let created_at = now() - 1000;
        let (chain, utxos) = seed_chain(vec![
            copyright_output(&bob, CopyrightType::Proof, PROOF_AMOUNT, created_at),
            fuel_output(&bob, 1.0),
        ]);

        let tx = bob.renew_license(&utxos[0], &utxos[1]).unwrap();

        let renewed = tx.outputs[0].payload.as_ref().unwrap();
        assert!(renewed.created_at > created_at);

        let validator = TransactionValidator::new(&chain);
        assert_eq!(validator.validate(&tx, now()), Ok(()));
    }

    #[test]
    fn test_sub_license_valid_subset() {
        let bob = Wallet::generate();
        let carol = Wallet::generate();
        let created_at = now() - 1000;
        let (chain, utxos) = seed_chain(vec![
            copyright_output(&bob, CopyrightType::Proof, PROOF_AMOUNT, created_at),
            fuel_output(&bob, 1.0),
        ]);

        let granted: BTreeSet<String> = ["print".to_string()].into_iter().collect();
        let tx = bob
            .sub_license(&utxos[0], &utxos[1], &carol.address(), granted)
            .unwrap();

        // a prova recunhada mantém o prazo original
        let rebuilt = tx.outputs[0].payload.as_ref().unwrap();
        assert_eq!(rebuilt.created_at, created_at);
        assert!(rebuilt.parent_outpoint.is_none());

        // a sublicença aponta para a UTXO mãe
        let secondary = tx.outputs[1].payload.as_ref().unwrap();
        assert_eq!(secondary.copyright_type, CopyrightType::Secondary);
        assert_eq!(secondary.parent_outpoint, Some(utxos[0].outpoint));

        let validator = TransactionValidator::new(&chain);
        assert_eq!(validator.validate(&tx, now()), Ok(()));
    }

    #[test]
    fn test_sub_license_refuses_wider_rights() {
        let bob = Wallet::generate();
        let carol = Wallet::generate();
        let (_, utxos) = seed_chain(vec![
            copyright_output(&bob, CopyrightType::Proof, PROOF_AMOUNT, now() - 1000),
            fuel_output(&bob, 1.0),
        ]);

        let granted: BTreeSet<String> = ["translate".to_string()].into_iter().collect();
        assert!(matches!(
            bob.sub_license(&utxos[0], &utxos[1], &carol.address(), granted),
            Err(WalletError::RightsNotSubset)
        ));
    }

    #[test]
    fn test_secret_round_trip() {
        let wallet = Wallet::generate();
        let restored = Wallet::from_secret_hex(&wallet.secret_hex()).unwrap();
        assert_eq!(wallet.address(), restored.address());
    }

    // intercalações aleatórias de operações do ciclo de vida; qualquer cadeia
    // aceita precisa sustentar as invariantes universais
    #[test]
    fn test_random_interleavings_hold_invariants() {
        use cpc_core::{ChainParams, Node, TxType, UtxoKind};
        use rand::Rng;
        use std::collections::BTreeMap as Map;
        use std::collections::BTreeSet as Set;

        let params = ChainParams {
            difficulty: 1,
            ..ChainParams::default()
        };
        let node = Node::new("miner-addr", params).unwrap();
        let wallets: Vec<Wallet> = (0..3).map(|_| Wallet::generate()).collect();
        let mut rng = rand::thread_rng();

        let find = |address: &str, pick: &dyn Fn(&Utxo) -> bool| {
            node.address_summary(address)
                .utxos
                .into_iter()
                .find(|utxo| pick(utxo))
        };
        let is_fuel = |utxo: &Utxo| utxo.kind == UtxoKind::Fuel && utxo.amount >= MIN_FUEL;
        let of_type = |wanted: CopyrightType| {
            move |utxo: &Utxo| {
                utxo.payload
                    .as_ref()
                    .is_some_and(|p| p.copyright_type == wanted)
            }
        };

        // rodada inicial determinística: todo mundo com combustível
        for wallet in &wallets {
            let _ = node.request_faucet(&wallet.address());
        }
        let _ = node.mine_pending().unwrap();

        for round in 0..10 {
            for (index, wallet) in wallets.iter().enumerate() {
                let address = wallet.address();
                let peer = &wallets[(index + 1) % wallets.len()];

                let attempt: WalletResult<Transaction> = match rng.gen_range(0..6) {
                    0 => {
                        let _ = node.request_faucet(&address);
                        continue;
                    }
                    1 => match find(&address, &is_fuel) {
                        Some(fuel) => wallet.register_copyright(
                            &fuel,
                            Wallet::work_fingerprint(format!("obra-{index}-{round}").as_bytes()),
                            "Obra",
                            CopyrightPayload::default_rights(),
                        ),
                        None => continue,
                    },
                    2 => match (
                        find(&address, &of_type(CopyrightType::Sovereignty)),
                        find(&address, &is_fuel),
                    ) {
                        (Some(sovereignty), Some(fuel)) => wallet.lock_authorization(
                            &sovereignty,
                            Some(&fuel),
                            &peer.address(),
                            CopyrightPayload::default_rights(),
                        ),
                        _ => continue,
                    },
                    3 => match find(&address, &of_type(CopyrightType::Instruction)) {
                        Some(instruction) => wallet.activate_authorization(&instruction),
                        None => continue,
                    },
                    4 => match (
                        find(&address, &of_type(CopyrightType::Proof)),
                        find(&address, &is_fuel),
                    ) {
                        (Some(proof), Some(fuel)) => wallet.renew_license(&proof, &fuel),
                        _ => continue,
                    },
                    _ => match (
                        find(&address, &of_type(CopyrightType::Proof)),
                        find(&address, &is_fuel),
                    ) {
                        (Some(proof), Some(fuel)) => {
                            let granted = ["print".to_string()].into_iter().collect();
                            wallet.sub_license(&proof, &fuel, &peer.address(), granted)
                        }
                        _ => continue,
                    },
                };

                if let Ok(tx) = attempt {
                    let _ = node.submit_transaction(tx);
                }
            }

            let _ = node.mine_pending().unwrap();
        }

        // reexecuta a cadeia aceita conferindo as invariantes
        let blocks = node.blocks();
        assert!(blocks.len() > 1, "nenhum bloco minerado");

        let allowed = |from: CopyrightType, to: CopyrightType| {
            matches!(
                (from, to),
                (CopyrightType::Sovereignty, CopyrightType::Sovereignty)
                    | (CopyrightType::Sovereignty, CopyrightType::Instruction)
                    | (CopyrightType::Instruction, CopyrightType::Proof)
                    | (CopyrightType::Proof, CopyrightType::Proof)
                    | (CopyrightType::Proof, CopyrightType::Secondary)
            )
        };

        let mut spent: Set<OutPoint> = Set::new();
        let mut live: Map<OutPoint, (f64, Option<CopyrightPayload>, String)> = Map::new();

        for block in &blocks {
            // P8: prova de trabalho; P3: o hash recalculado bate com o gravado
            if block.index > 0 {
                assert!(block.meets_difficulty(1));
            }
            assert_eq!(block.calculate_hash().unwrap(), block.hash);

            for tx in &block.transactions {
                let mut input_total = 0.0;
                let mut consumed: Vec<(CopyrightPayload, String)> = Vec::new();

                for input in &tx.inputs {
                    // P1: nenhum outpoint é consumido duas vezes na cadeia
                    assert!(
                        spent.insert(input.previous_output),
                        "gasto duplo de {}",
                        input.previous_output
                    );
                    let (amount, payload, owner) = live
                        .remove(&input.previous_output)
                        .expect("input sem UTXO viva");
                    input_total += amount;
                    if let Some(payload) = payload {
                        // P6: nenhuma UTXO de copyright expirada é aceita
                        assert!(payload.end_time() > block.timestamp - 60);
                        consumed.push((payload, owner));
                    }
                }

                // P2: conservação de valor fora da torneira
                if tx.tx_type != TxType::Faucet {
                    assert!(tx.total_output_value() <= input_total + 1e-9);
                }

                for (vout, output) in tx.outputs.iter().enumerate() {
                    if let Some(payload) = &output.payload {
                        let matching: Vec<&(CopyrightPayload, String)> = consumed
                            .iter()
                            .filter(|(p, _)| p.work_hash == payload.work_hash)
                            .collect();

                        if !matching.is_empty() {
                            // P4: fechamento da máquina de estados
                            assert!(
                                matching
                                    .iter()
                                    .any(|(p, _)| allowed(p.copyright_type, payload.copyright_type)),
                                "transição proibida para {}",
                                payload.copyright_type
                            );
                        }

                        // P5: recunhagens de soberania/prova preservam o endereço
                        let rebuilt = matches!(
                            payload.copyright_type,
                            CopyrightType::Sovereignty | CopyrightType::Proof
                        ) && payload.parent_outpoint.is_none();
                        if rebuilt {
                            if let Some((_, owner)) = matching
                                .iter()
                                .find(|(p, _)| p.copyright_type == payload.copyright_type)
                            {
                                assert_eq!(*owner, output.address);
                            }
                        }

                        // P7: sublicenças dentro do escopo da licença-mãe
                        if payload.copyright_type == CopyrightType::Secondary {
                            if let Some((parent, _)) = matching
                                .iter()
                                .find(|(p, _)| p.copyright_type == CopyrightType::Proof)
                            {
                                assert!(payload.rights_scope.is_subset(&parent.rights_scope));
                            }
                        }
                    }

                    live.insert(
                        OutPoint::new(tx.txid, vout as u32),
                        (
                            output.amount,
                            output.payload.clone(),
                            output.address.clone(),
                        ),
                    );
                }
            }
        }
    }
}
