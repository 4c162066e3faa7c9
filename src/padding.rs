// TxForge
//
// Copyright (c) 2026 TxForge Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Padding utxo provisioning
//!
//! Cross-party atomic-swap protocols require the buyer to contribute a fixed
//! number of fixed-value "padding" inputs positioned before the
//! counterparty's partially-signed input, so that an input signed with
//! `SIGHASH_SINGLE | ANYONECANPAY` lands at the index the protocol expects.
//! [`ensure_padding`] checks the wallet's pool and, when short, assembles a
//! preparatory transaction that fans out the missing padding outputs to the
//! wallet's own address.

use bitcoin::{Address, Network};

use log::debug;

use crate::assembler::{BuiltTransaction, SigningMetaProvider, TxAssembler};
use crate::coin_selection::SelectionOrder;
use crate::error::Error;
use crate::types::{FeeRate, Utxo};

/// Protocol-mandated value of one padding utxo, in satoshi
pub const PADDING_VALUE: u64 = 600;

/// Number of padding utxos usable by a swap: exact-value outputs at the
/// wallet address that carry no asset annotations
pub fn count_padding(wallet_address: &Address, pool: &[Utxo]) -> usize {
    let script_pubkey = wallet_address.script_pubkey();
    pool.iter()
        .filter(|utxo| utxo.txout.script_pubkey == script_pubkey)
        .filter(|utxo| utxo.value() == PADDING_VALUE)
        .filter(|utxo| !utxo.has_annotations())
        .count()
}

/// Guarantee `wallet_address` holds `required_count` padding utxos.
///
/// Returns `None` when the pool already satisfies the requirement, otherwise
/// a preparatory transaction paying `required_count` outputs of
/// [`PADDING_VALUE`] to the wallet's own address, change returned to the same
/// address. The caller signs and broadcasts it before continuing with the
/// swap. Existing padding-valued utxos are excluded from funding selection:
/// spending them would undo the very invariant being established.
///
/// Propagates [`Error::InsufficientFunds`] when the wallet cannot fund the
/// padding outputs plus fee.
pub fn ensure_padding<M: SigningMetaProvider>(
    wallet_address: &Address,
    pool: &[Utxo],
    required_count: usize,
    fee_rate: FeeRate,
    network: Network,
    meta: &M,
) -> Result<Option<BuiltTransaction>, Error> {
    let existing = count_padding(wallet_address, pool);
    if existing >= required_count {
        debug!(
            "padding satisfied: `{}` of `{}` required",
            existing, required_count
        );
        return Ok(None);
    }

    debug!(
        "provisioning padding: `{}` of `{}` required",
        existing, required_count
    );

    let mut assembler = TxAssembler::new(network, wallet_address.clone(), fee_rate)
        .utxo_pool(pool.to_vec())
        .selection_order(SelectionOrder::LargestFirst);
    for _ in 0..required_count {
        assembler = assembler.add_recipient(wallet_address.clone(), PADDING_VALUE);
    }
    for utxo in pool.iter().filter(|utxo| utxo.value() == PADDING_VALUE) {
        assembler = assembler.add_unspendable(utxo.outpoint);
    }

    assembler.assemble(meta).map(Some)
}
