use crate::block::Block;
use crate::config::FAUCET_TX_CAP;
use crate::error::{ValidationError, ValidationResult};
use crate::payload::{CopyrightPayload, CopyrightType};
use crate::script::LockScript;
use crate::state::ChainState;
use crate::transaction::{Transaction, TxInput, TxOutput, TxType};
use crate::utxo::{OutPoint, Utxo, UtxoKind, UtxoSet};
use shared::types::{Address, Amount, Timestamp};
use shared::verify_signature;
use std::collections::{BTreeMap, BTreeSet};

/// Transições permitidas na máquina de estados de direitos autorais.
///
/// | origem       | destinos permitidos          |
/// |--------------|------------------------------|
/// | sovereignty  | sovereignty (recunhagem), instruction |
/// | instruction  | proof                        |
/// | proof        | proof (recunhagem/renovação), secondary |
/// | secondary    | nenhum (estado terminal)     |
const fn transition_allowed(from: CopyrightType, to: CopyrightType) -> bool {
    matches!(
        (from, to),
        (CopyrightType::Sovereignty, CopyrightType::Sovereignty)
            | (CopyrightType::Sovereignty, CopyrightType::Instruction)
            | (CopyrightType::Instruction, CopyrightType::Proof)
            | (CopyrightType::Proof, CopyrightType::Proof)
            | (CopyrightType::Proof, CopyrightType::Secondary)
    )
}

/// Validador de transações.
///
/// A validação é pura sobre `(transação, cadeia, now)`: nenhuma E/S, nenhuma
/// mutação de estado. As UTXOs são resolvidas por varredura da cadeia no
/// momento da chamada.
pub struct TransactionValidator<'a> {
    state: ChainState<'a>,
}

impl<'a> TransactionValidator<'a> {
    /// Cria um validador sobre a cadeia dada
    #[must_use]
    pub const fn new(blocks: &'a [Block]) -> Self {
        Self {
            state: ChainState::new(blocks),
        }
    }

    /// Valida uma transação contra a cadeia corrente.
    ///
    /// Percorre, nesta ordem: completude de assinaturas, curto-circuitos por
    /// tipo (torneira, registro), resolução e autorização de cada input,
    /// conservação de valor, regras semânticas por tipo, máquina de estados
    /// e invariante de posse de endereço. A primeira falha aborta com o
    /// motivo correspondente.
    ///
    /// # Errors
    ///
    /// Retorna o primeiro [`ValidationError`] encontrado
    pub fn validate(&self, tx: &Transaction, now: Timestamp) -> ValidationResult {
        check_signature_completeness(tx)?;

        // torneira: sem inputs, teto de emissão; nada mais a verificar
        if tx.tx_type == TxType::Faucet {
            return validate_faucet(tx);
        }

        check_copyright_outputs_carry_payload(tx)?;

        if tx.tx_type == TxType::CopyrightRegister {
            validate_register_shape(tx)?;
        }

        let utxos = self.state.utxo_map(now);

        let input_total = check_inputs(tx, &utxos, now)?;
        check_value_conservation(tx, input_total)?;

        match tx.tx_type {
            TxType::AuthorizationLock => validate_authorization_lock(tx, &utxos)?,
            TxType::AuthorizationActivate => validate_authorization_activate(tx, &utxos, now)?,
            TxType::Renewal => validate_renewal(tx, &utxos, now)?,
            TxType::SubLicense => validate_sub_license(tx, &utxos)?,
            _ => {}
        }

        if matches!(
            tx.tx_type,
            TxType::AuthorizationLock
                | TxType::AuthorizationActivate
                | TxType::Renewal
                | TxType::SubLicense
        ) {
            check_state_machine(tx, &utxos)?;
            check_address_ownership(tx, &utxos)?;
        }

        Ok(())
    }
}

// Passo 0: todo input com signatários exigidos precisa estar completo
fn check_signature_completeness(tx: &Transaction) -> ValidationResult {
    for (input_index, input) in tx.inputs.iter().enumerate() {
        if !input.required_signers.is_empty() && !input.is_fully_signed() {
            return Err(ValidationError::MissingSignature {
                input_index,
                missing: input.unsigned_signers(),
            });
        }
    }
    Ok(())
}

fn validate_faucet(tx: &Transaction) -> ValidationResult {
    if !tx.inputs.is_empty() {
        return Err(ValidationError::TypeRule {
            tx_type: TxType::Faucet,
            detail: "torneira não pode ter inputs".to_string(),
        });
    }

    if tx.total_output_value() > FAUCET_TX_CAP {
        return Err(ValidationError::FaucetOverdraw);
    }

    Ok(())
}

fn check_copyright_outputs_carry_payload(tx: &Transaction) -> ValidationResult {
    for output in &tx.outputs {
        if output.kind == UtxoKind::Copyright && output.payload.is_none() {
            return Err(ValidationError::TypeRule {
                tx_type: tx.tx_type,
                detail: "output de copyright sem payload".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_register_shape(tx: &Transaction) -> ValidationResult {
    if tx.inputs.is_empty() {
        return Err(ValidationError::TypeRule {
            tx_type: TxType::CopyrightRegister,
            detail: "registro precisa consumir combustível".to_string(),
        });
    }

    let mut minted = false;
    for (_, payload) in copyright_outputs(tx) {
        if payload.work_hash.is_empty() {
            return Err(ValidationError::TypeRule {
                tx_type: TxType::CopyrightRegister,
                detail: "UTXO de copyright precisa do hash da obra".to_string(),
            });
        }
        if payload.copyright_type != CopyrightType::Sovereignty {
            return Err(ValidationError::TypeRule {
                tx_type: TxType::CopyrightRegister,
                detail: "registro só cunha UTXOs de soberania".to_string(),
            });
        }
        minted = true;
    }

    if !minted {
        return Err(ValidationError::TypeRule {
            tx_type: TxType::CopyrightRegister,
            detail: "registro deve criar UTXO de soberania".to_string(),
        });
    }

    Ok(())
}

// Passo 2: resolução, assinaturas e script de cada input; devolve a soma
// dos valores de entrada
fn check_inputs(
    tx: &Transaction,
    utxos: &UtxoSet,
    now: Timestamp,
) -> Result<Amount, ValidationError> {
    let mut input_total = 0.0;
    let mut consumed: BTreeSet<OutPoint> = BTreeSet::new();

    for (input_index, input) in tx.inputs.iter().enumerate() {
        // a mesma UTXO não pode aparecer duas vezes na própria transação;
        // sem este bloqueio o valor dela entraria na soma mais de uma vez
        if !consumed.insert(input.previous_output) {
            return Err(ValidationError::SpentOrUnknown {
                outpoint: input.previous_output,
            });
        }

        let utxo = utxos
            .get(&input.previous_output)
            .ok_or(ValidationError::SpentOrUnknown {
                outpoint: input.previous_output,
            })?;

        let signers = verify_input_signatures(input_index, input, utxo, tx)?;

        // script ilegível nunca é gastável
        let script: LockScript =
            utxo.script
                .parse()
                .map_err(|_| ValidationError::LockedOrExpired {
                    outpoint: input.previous_output,
                })?;

        if !script.can_spend(now, &signers, utxo.end_time()) {
            return Err(ValidationError::LockedOrExpired {
                outpoint: input.previous_output,
            });
        }

        input_total += utxo.amount;
    }

    Ok(input_total)
}

// Verifica cada par (endereço, assinatura) por ECDSA sobre o txid e devolve
// os signatários comprovados
fn verify_input_signatures(
    input_index: usize,
    input: &TxInput,
    utxo: &Utxo,
    tx: &Transaction,
) -> Result<Vec<Address>, ValidationError> {
    if input.signatures.is_empty() {
        return Err(ValidationError::BadSignature { input_index });
    }

    for (address, signature) in &input.signatures {
        if !verify_signature(address, signature, &tx.txid) {
            return Err(ValidationError::BadSignature { input_index });
        }
    }

    if !input.is_fully_signed() {
        return Err(ValidationError::MissingSignature {
            input_index,
            missing: input.unsigned_signers(),
        });
    }

    // forma de assinatura única: o endereço declarado deve ser o dono da UTXO
    if let Some(public_key) = &input.public_key {
        if *public_key != utxo.address {
            return Err(ValidationError::BadSignature { input_index });
        }
    }

    Ok(input.signatures.keys().cloned().collect())
}

// Passo 3: Σ entradas >= Σ saídas; o excedente é a taxa do minerador
fn check_value_conservation(tx: &Transaction, input_total: Amount) -> ValidationResult {
    let output_total = tx.total_output_value();
    if output_total > input_total {
        return Err(ValidationError::ValueImbalance {
            input_total,
            output_total,
        });
    }
    Ok(())
}

// Inputs de copyright resolvidos, com seus payloads
fn copyright_inputs<'t>(tx: &Transaction, utxos: &'t UtxoSet) -> Vec<(&'t Utxo, &'t CopyrightPayload)> {
    tx.inputs
        .iter()
        .filter_map(|input| utxos.get(&input.previous_output))
        .filter(|utxo| utxo.kind == UtxoKind::Copyright)
        .filter_map(|utxo| utxo.payload.as_ref().map(|payload| (utxo, payload)))
        .collect()
}

// Outputs de copyright com seus payloads
fn copyright_outputs(tx: &Transaction) -> impl Iterator<Item = (&TxOutput, &CopyrightPayload)> {
    tx.outputs
        .iter()
        .filter(|output| output.kind == UtxoKind::Copyright)
        .filter_map(|output| output.payload.as_ref().map(|payload| (output, payload)))
}

fn validate_authorization_lock(tx: &Transaction, utxos: &UtxoSet) -> ValidationResult {
    let has_sovereignty = copyright_inputs(tx, utxos)
        .iter()
        .any(|(_, payload)| payload.copyright_type == CopyrightType::Sovereignty);
    if !has_sovereignty {
        return Err(ValidationError::TypeRule {
            tx_type: TxType::AuthorizationLock,
            detail: "exige UTXO de soberania como input".to_string(),
        });
    }

    let mints_instruction = copyright_outputs(tx)
        .any(|(_, payload)| payload.copyright_type == CopyrightType::Instruction);
    if !mints_instruction {
        return Err(ValidationError::TypeRule {
            tx_type: TxType::AuthorizationLock,
            detail: "deve criar UTXO de instrução".to_string(),
        });
    }

    Ok(())
}

fn validate_authorization_activate(
    tx: &Transaction,
    utxos: &UtxoSet,
    now: Timestamp,
) -> ValidationResult {
    let inputs = copyright_inputs(tx, utxos);
    let Some((utxo, instruction)) = inputs
        .iter()
        .find(|(_, payload)| payload.copyright_type == CopyrightType::Instruction)
    else {
        return Err(ValidationError::TypeRule {
            tx_type: TxType::AuthorizationActivate,
            detail: "exige UTXO de instrução como input".to_string(),
        });
    };

    // a expiração é derivada do payload, não do relógio do sistema
    if instruction.is_expired(now) {
        return Err(ValidationError::LockedOrExpired {
            outpoint: utxo.outpoint,
        });
    }

    let mut mints_proof = false;
    for (_, payload) in copyright_outputs(tx) {
        if payload.copyright_type != CopyrightType::Proof {
            continue;
        }
        if payload.work_hash != instruction.work_hash {
            return Err(ValidationError::TypeRule {
                tx_type: TxType::AuthorizationActivate,
                detail: "prova deve herdar o hash da obra da instrução".to_string(),
            });
        }
        mints_proof = true;
    }

    if !mints_proof {
        return Err(ValidationError::TypeRule {
            tx_type: TxType::AuthorizationActivate,
            detail: "deve criar UTXO de prova".to_string(),
        });
    }

    Ok(())
}

fn validate_renewal(tx: &Transaction, utxos: &UtxoSet, now: Timestamp) -> ValidationResult {
    let inputs = copyright_inputs(tx, utxos);
    let Some((utxo, proof)) = inputs
        .iter()
        .find(|(_, payload)| payload.copyright_type == CopyrightType::Proof)
    else {
        return Err(ValidationError::TypeRule {
            tx_type: TxType::Renewal,
            detail: "exige UTXO de prova como input".to_string(),
        });
    };

    if proof.is_expired(now) {
        return Err(ValidationError::LockedOrExpired {
            outpoint: utxo.outpoint,
        });
    }

    let mints_proof = copyright_outputs(tx)
        .any(|(_, payload)| payload.copyright_type == CopyrightType::Proof);
    if !mints_proof {
        return Err(ValidationError::TypeRule {
            tx_type: TxType::Renewal,
            detail: "deve criar nova UTXO de prova".to_string(),
        });
    }

    Ok(())
}

fn validate_sub_license(tx: &Transaction, utxos: &UtxoSet) -> ValidationResult {
    let inputs = copyright_inputs(tx, utxos);
    let Some((_, parent)) = inputs
        .iter()
        .find(|(_, payload)| payload.copyright_type == CopyrightType::Proof)
    else {
        return Err(ValidationError::TypeRule {
            tx_type: TxType::SubLicense,
            detail: "exige a prova da licença-mãe como input".to_string(),
        });
    };

    // a prova da licença-mãe é recunhada sem vínculo; as sublicenças nascem
    // com o vínculo para a UTXO mãe
    let rebuilds_parent = copyright_outputs(tx).any(|(_, payload)| {
        payload.copyright_type == CopyrightType::Proof && payload.parent_outpoint.is_none()
    });
    if !rebuilds_parent {
        return Err(ValidationError::TypeRule {
            tx_type: TxType::SubLicense,
            detail: "deve recunhar a prova da licença-mãe".to_string(),
        });
    }

    let secondaries: Vec<_> = copyright_outputs(tx)
        .filter(|(_, payload)| payload.copyright_type == CopyrightType::Secondary)
        .collect();
    if secondaries.is_empty() {
        return Err(ValidationError::TypeRule {
            tx_type: TxType::SubLicense,
            detail: "deve criar UTXO de sublicença".to_string(),
        });
    }

    for (_, secondary) in secondaries {
        if !secondary.rights_scope.is_subset(&parent.rights_scope) {
            return Err(ValidationError::RightsScope);
        }
    }

    Ok(())
}

// Passo 5: para cada par input/output de copyright com o mesmo hash de obra,
// a transição de tipo precisa constar da tabela
fn check_state_machine(tx: &Transaction, utxos: &UtxoSet) -> ValidationResult {
    let inputs = copyright_inputs(tx, utxos);

    for (_, out_payload) in copyright_outputs(tx) {
        let matching: Vec<CopyrightType> = inputs
            .iter()
            .filter(|(_, payload)| payload.work_hash == out_payload.work_hash)
            .map(|(_, payload)| payload.copyright_type)
            .collect();

        if matching.is_empty() {
            continue;
        }

        if !matching
            .iter()
            .any(|from| transition_allowed(*from, out_payload.copyright_type))
        {
            return Err(ValidationError::StateMachine {
                from: matching[0],
                to: out_payload.copyright_type,
            });
        }
    }

    Ok(())
}

// Passo 6: UTXOs recunhadas preservam o endereço do antecessor, casando
// inputs e outputs por (tipo, hash da obra)
fn check_address_ownership(tx: &Transaction, utxos: &UtxoSet) -> ValidationResult {
    let inputs = copyright_inputs(tx, utxos);
    let mut owners: BTreeMap<(CopyrightType, &str), &str> = BTreeMap::new();
    for (utxo, payload) in &inputs {
        owners.insert(
            (payload.copyright_type, payload.work_hash.as_str()),
            utxo.address.as_str(),
        );
    }

    for (output, payload) in copyright_outputs(tx) {
        let source = match tx.tx_type {
            TxType::AuthorizationLock => (payload.copyright_type == CopyrightType::Sovereignty)
                .then_some(CopyrightType::Sovereignty),
            TxType::Renewal => matches!(
                payload.copyright_type,
                CopyrightType::Sovereignty | CopyrightType::Proof
            )
            .then_some(payload.copyright_type),
            TxType::SubLicense => (payload.copyright_type == CopyrightType::Proof
                && payload.parent_outpoint.is_none())
            .then_some(CopyrightType::Proof),
            // na ativação o endereço do licenciado atravessa: instrução -> prova
            TxType::AuthorizationActivate => {
                (payload.copyright_type == CopyrightType::Proof).then_some(CopyrightType::Instruction)
            }
            _ => None,
        };

        let Some(from) = source else { continue };
        if let Some(owner) = owners.get(&(from, payload.work_hash.as_str())) {
            if *owner != output.address {
                return Err(ValidationError::AddressOwnership {
                    tx_type: tx.tx_type,
                    work_hash: payload.work_hash.clone(),
                });
            }
        }
    }

    Ok(())
}
