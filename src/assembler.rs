// TxForge
//
// Copyright (c) 2026 TxForge Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Fee-convergent transaction assembly
//!
//! The fee owed by a transaction depends on its final encoded size, which
//! depends on which inputs are selected, which depends on how large a fee
//! must be covered. [`TxAssembler`] resolves the cycle with an explicit
//! fixed-point loop: estimate the size of the current template, derive the
//! fee, select more inputs if the retrieved amount falls short, and repeat
//! until fee and inputs agree.
//!
//! The loop re-runs the full size estimate after every expansion rather than
//! patching the fee incrementally: newly added inputs can be of a different
//! address kind, changing the per-unit constants mid-flight.

use std::collections::{HashMap, HashSet};

use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize;
use bitcoin::transaction::Version;
use bitcoin::{
    psbt, Address, Amount, Network, OutPoint, Psbt, ScriptBuf, Sequence, Transaction, TxIn, TxOut,
    Txid, Witness, XOnlyPublicKey,
};

use log::debug;

use crate::address_kind::AddressKind;
use crate::coin_selection::{select_coins, spendable_amount, SelectionOrder};
use crate::error::Error;
use crate::types::{FeeRate, Utxo};
use crate::vsize::estimate_vsize;

/// Signing metadata required by an input's address kind
#[derive(Debug, Clone, PartialEq)]
pub enum SigningMeta {
    /// Legacy inputs embed the full previous transaction for validation
    Legacy {
        /// The transaction that created the utxo being spent
        prev_tx: Transaction,
    },
    /// Segwit inputs (nested or native) are satisfied by the value+script
    /// witness descriptor already present in the utxo
    Segwit,
    /// Taproot inputs carry the wallet's untweaked internal key
    Taproot {
        /// X-only internal key the signer will tweak and sign with
        internal_key: XOnlyPublicKey,
    },
}

/// A utxo prepared for inclusion as a transaction input.
///
/// Construction classifies the locking script and rejects signing metadata
/// that does not belong to the resulting kind, so every template resolves to
/// exactly one [`AddressKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct InputTemplate {
    utxo: Utxo,
    kind: AddressKind,
    meta: SigningMeta,
}

impl InputTemplate {
    /// Build a template for `utxo`, validating `meta` against the utxo's
    /// address kind
    pub fn new(utxo: Utxo, meta: SigningMeta) -> Result<Self, Error> {
        let kind = AddressKind::from_script(&utxo.txout.script_pubkey)?;
        let meta_matches = match (kind, &meta) {
            (AddressKind::Legacy, SigningMeta::Legacy { .. }) => true,
            (AddressKind::NestedSegwit, SigningMeta::Segwit) => true,
            (AddressKind::NativeSegwit, SigningMeta::Segwit) => true,
            (AddressKind::Taproot, SigningMeta::Taproot { .. }) => true,
            _ => false,
        };
        if !meta_matches {
            return Err(Error::InvalidSigningMeta(utxo.outpoint));
        }

        if let SigningMeta::Legacy { prev_tx } = &meta {
            if prev_tx.compute_txid() != utxo.outpoint.txid
                || utxo.outpoint.vout as usize >= prev_tx.output.len()
            {
                return Err(Error::InvalidPrevTx(utxo.outpoint));
            }
        }

        Ok(InputTemplate { utxo, kind, meta })
    }

    /// The utxo this template spends
    pub fn utxo(&self) -> &Utxo {
        &self.utxo
    }

    /// The address kind the template resolved to
    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    /// The signing metadata attached at construction
    pub fn meta(&self) -> &SigningMeta {
        &self.meta
    }

    fn psbt_input(&self) -> psbt::Input {
        let mut input = psbt::Input::default();
        match &self.meta {
            SigningMeta::Legacy { prev_tx } => {
                input.non_witness_utxo = Some(prev_tx.clone());
            }
            SigningMeta::Segwit => {
                input.witness_utxo = Some(self.utxo.txout.clone());
            }
            SigningMeta::Taproot { internal_key } => {
                input.witness_utxo = Some(self.utxo.txout.clone());
                input.tap_internal_key = Some(*internal_key);
            }
        }
        input
    }
}

/// A destination address and satoshi value
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTemplate {
    /// Destination address
    pub address: Address,
    /// Amount in satoshi
    pub value: u64,
}

/// Collaborator that supplies the signing metadata a utxo's address kind
/// requires: key material for taproot, previous transactions for legacy.
pub trait SigningMetaProvider {
    /// Return the metadata needed to spend `utxo`
    fn signing_meta(&self, utxo: &Utxo) -> Result<SigningMeta, Error>;
}

/// [`SigningMetaProvider`] for a wallet spending its own single-key utxos.
///
/// Holds an optional taproot internal key and the previous transactions
/// fetched for any legacy utxos in the pool.
#[derive(Debug, Clone, Default)]
pub struct SpendContext {
    internal_key: Option<XOnlyPublicKey>,
    prev_txs: HashMap<Txid, Transaction>,
}

impl SpendContext {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the wallet's taproot internal key
    pub fn with_internal_key(mut self, internal_key: XOnlyPublicKey) -> Self {
        self.internal_key = Some(internal_key);
        self
    }

    /// Register the previous transaction for a legacy utxo
    pub fn insert_prev_tx(&mut self, prev_tx: Transaction) {
        self.prev_txs.insert(prev_tx.compute_txid(), prev_tx);
    }
}

impl SigningMetaProvider for SpendContext {
    fn signing_meta(&self, utxo: &Utxo) -> Result<SigningMeta, Error> {
        match AddressKind::from_script(&utxo.txout.script_pubkey)? {
            AddressKind::Legacy => self
                .prev_txs
                .get(&utxo.outpoint.txid)
                .cloned()
                .map(|prev_tx| SigningMeta::Legacy { prev_tx })
                .ok_or(Error::MissingPrevTx(utxo.outpoint)),
            AddressKind::NestedSegwit | AddressKind::NativeSegwit => Ok(SigningMeta::Segwit),
            AddressKind::Taproot => self
                .internal_key
                .map(|internal_key| SigningMeta::Taproot { internal_key })
                .ok_or(Error::MissingInternalKey(utxo.outpoint)),
        }
    }
}

/// The terminal artifact of a successful assembly, handed to an external
/// signer and then to a broadcaster
#[derive(Debug, Clone)]
pub struct BuiltTransaction {
    /// The unsigned transaction wrapped in its interchange structure
    pub psbt: Psbt,
    /// Fee committed to, in satoshi
    pub fee: u64,
    /// Estimated virtual size the fee was derived from
    pub vsize: u64,
    /// Final input templates, in transaction order
    pub inputs: Vec<InputTemplate>,
    /// Final output templates, change last when present
    pub outputs: Vec<OutputTemplate>,
}

impl BuiltTransaction {
    /// Consensus-encoded bytes of the unsigned transaction
    pub fn raw_tx(&self) -> Vec<u8> {
        serialize(&self.psbt.unsigned_tx)
    }

    /// Base64 PSBT interchange encoding
    pub fn to_base64(&self) -> String {
        self.psbt.to_string()
    }

    /// Txid of the unsigned transaction
    pub fn txid(&self) -> Txid {
        self.psbt.unsigned_tx.compute_txid()
    }
}

/// Builder for a fee-convergent transaction assembly.
///
/// Mirrors the two-state machine of the convergence loop: the assembler stays
/// *expanding* while the retrieved amount cannot cover spend + fee, and
/// *converges* once it can. Each [`assemble`](TxAssembler::assemble) call owns
/// its state exclusively; nothing is shared across concurrent assemblies and
/// no utxo reservation is performed across calls.
#[derive(Debug, Clone)]
pub struct TxAssembler {
    network: Network,
    change_address: Address,
    fee_rate: FeeRate,
    recipients: Vec<OutputTemplate>,
    initial_inputs: Vec<InputTemplate>,
    pool: Vec<Utxo>,
    excluded: HashSet<OutPoint>,
    confirmed_only: bool,
    order: SelectionOrder,
    signed_witness: Option<Vec<u8>>,
}

impl TxAssembler {
    pub fn new(network: Network, change_address: Address, fee_rate: FeeRate) -> Self {
        TxAssembler {
            network,
            change_address,
            fee_rate,
            recipients: vec![],
            initial_inputs: vec![],
            pool: vec![],
            excluded: HashSet::new(),
            confirmed_only: false,
            order: SelectionOrder::default(),
            signed_witness: None,
        }
    }

    /// Add a recipient output
    pub fn add_recipient(mut self, address: Address, value: u64) -> Self {
        self.recipients.push(OutputTemplate { address, value });
        self
    }

    /// Add a caller-supplied input template, placed before any selected
    /// inputs. Used by swap flows that must pin inputs to protocol-mandated
    /// positions.
    pub fn add_input(mut self, input: InputTemplate) -> Self {
        self.initial_inputs.push(input);
        self
    }

    /// Set the utxo pool selection draws from
    pub fn utxo_pool(mut self, pool: Vec<Utxo>) -> Self {
        self.pool = pool;
        self
    }

    /// Never select the given outpoint
    pub fn add_unspendable(mut self, outpoint: OutPoint) -> Self {
        self.excluded.insert(outpoint);
        self
    }

    /// Only select confirmed utxos
    pub fn confirmed_only(mut self, confirmed_only: bool) -> Self {
        self.confirmed_only = confirmed_only;
        self
    }

    /// Selection ordering policy
    pub fn selection_order(mut self, order: SelectionOrder) -> Self {
        self.order = order;
        self
    }

    /// Supply the concrete witness bytes measured after signing.
    ///
    /// Signature-dependent witness sizes differ slightly from pre-signature
    /// estimates, so callers re-run the assembly once after signing to
    /// correct the fee using the real measured size.
    pub fn signed_witness(mut self, witness: Vec<u8>) -> Self {
        self.signed_witness = Some(witness);
        self
    }

    /// Run the convergence loop and return the finalized template.
    ///
    /// Change strictly above zero goes to the change address; no dust floor
    /// is applied at this layer, callers owning a dust policy enforce it
    /// above. Terminates within at most `|pool|` expansions: every expansion
    /// strictly increases the retrieved amount or fails with
    /// [`Error::InsufficientFunds`].
    pub fn assemble<M: SigningMetaProvider>(self, meta: &M) -> Result<BuiltTransaction, Error> {
        let TxAssembler {
            network,
            change_address,
            fee_rate,
            recipients,
            initial_inputs,
            pool,
            excluded: unspendable,
            confirmed_only,
            order,
            signed_witness,
        } = self;

        if recipients.is_empty() {
            return Err(Error::NoRecipients);
        }
        for recipient in &recipients {
            if !recipient.address.as_unchecked().is_valid_for_network(network) {
                return Err(Error::InvalidNetwork(recipient.address.clone()));
            }
        }
        if !change_address.as_unchecked().is_valid_for_network(network) {
            return Err(Error::InvalidNetwork(change_address));
        }

        let spend_amount: u64 = recipients.iter().map(|output| output.value).sum();
        let output_kinds = recipients
            .iter()
            .map(|output| AddressKind::from_address(&output.address))
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = ConvergenceState {
            inputs: initial_inputs,
            outputs: recipients,
            excluded: unspendable,
            amount_retrieved: 0,
            spend_amount,
            fee_rate,
        };
        for template in &state.inputs {
            state.amount_retrieved += template.utxo.value();
            state.excluded.insert(template.utxo.outpoint);
        }

        // The estimator rejects empty templates, so a send that starts from
        // a blank slate seeds itself with a selection for the spend amount
        // alone; the loop then grows it to cover the fee.
        if state.inputs.is_empty() {
            state.expand(&pool, spend_amount, spend_amount, confirmed_only, order, meta)?;
        }

        let mut converged = None;
        for iteration in 0..=pool.len() {
            let input_kinds: Vec<AddressKind> =
                state.inputs.iter().map(|template| template.kind).collect();
            let vsize = estimate_vsize(&input_kinds, &output_kinds, signed_witness.as_deref())?;
            let fee = state.fee_rate.fee_for(vsize);
            let needed_total = state.spend_amount + fee;

            debug!(
                "iteration {}: vsize = `{}`, fee = `{}`, retrieved = `{}` of `{}`",
                iteration, vsize, fee, state.amount_retrieved, needed_total
            );

            if state.amount_retrieved >= needed_total {
                converged = Some((vsize, fee, state.amount_retrieved - needed_total));
                break;
            }

            let shortfall = needed_total - state.amount_retrieved;
            state.expand(&pool, shortfall, needed_total, confirmed_only, order, meta)?;
        }

        // Expansion failure surfaces from the loop body, so reaching the
        // iteration bound without converging cannot happen for a finite pool.
        let (vsize, fee, change) = converged.ok_or(Error::InsufficientFunds {
            needed: spend_amount,
            available: state.amount_retrieved,
        })?;

        if change > 0 {
            debug!("appending change output of `{}` sat", change);
            state.outputs.push(OutputTemplate {
                address: change_address,
                value: change,
            });
        }

        state.into_built(fee, vsize)
    }
}

/// Mutable loop state threaded through one assembly call, discarded on
/// completion
#[derive(Debug)]
struct ConvergenceState {
    inputs: Vec<InputTemplate>,
    outputs: Vec<OutputTemplate>,
    // Everything already retrieved plus caller exclusions
    excluded: HashSet<OutPoint>,
    amount_retrieved: u64,
    spend_amount: u64,
    fee_rate: FeeRate,
}

impl ConvergenceState {
    /// Select utxos covering `amount_needed` and append their templates.
    /// `needed_total` is only reported in the failure case.
    fn expand<M: SigningMetaProvider>(
        &mut self,
        pool: &[Utxo],
        amount_needed: u64,
        needed_total: u64,
        confirmed_only: bool,
        order: SelectionOrder,
        meta: &M,
    ) -> Result<(), Error> {
        let batch = select_coins(pool, amount_needed, &self.excluded, confirmed_only, order);
        if batch.is_empty() {
            return Err(Error::InsufficientFunds {
                needed: needed_total,
                available: self.amount_retrieved
                    + spendable_amount(pool, &self.excluded, confirmed_only),
            });
        }

        self.amount_retrieved += batch.selected_amount;
        for utxo in batch.selected {
            self.excluded.insert(utxo.outpoint);
            let signing_meta = meta.signing_meta(&utxo)?;
            self.inputs.push(InputTemplate::new(utxo, signing_meta)?);
        }
        Ok(())
    }

    fn into_built(self, fee: u64, vsize: u64) -> Result<BuiltTransaction, Error> {
        let unsigned_tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: self
                .inputs
                .iter()
                .map(|template| TxIn {
                    previous_output: template.utxo.outpoint,
                    script_sig: ScriptBuf::new(),
                    sequence: Sequence::MAX,
                    witness: Witness::new(),
                })
                .collect(),
            output: self
                .outputs
                .iter()
                .map(|template| TxOut {
                    value: Amount::from_sat(template.value),
                    script_pubkey: template.address.script_pubkey(),
                })
                .collect(),
        };

        let mut psbt = Psbt::from_unsigned_tx(unsigned_tx)?;
        for (index, template) in self.inputs.iter().enumerate() {
            psbt.inputs[index] = template.psbt_input();
        }

        Ok(BuiltTransaction {
            psbt,
            fee,
            vsize,
            inputs: self.inputs,
            outputs: self.outputs,
        })
    }
}
