// TxForge
//
// Copyright (c) 2026 TxForge Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! End-to-end assembly scenarios through the public API

use std::collections::HashSet;

use bitcoin::hashes::Hash;
use bitcoin::key::TweakedPublicKey;
use bitcoin::{Address, Amount, Network, OutPoint, ScriptBuf, TxOut, Txid, XOnlyPublicKey};

use txforge::{
    ensure_padding, estimate_vsize, select_coins, AddressKind, Error, FeeRate, InputTemplate,
    SelectionOrder, SigningMeta, SpendContext, TxAssembler, Utxo, PADDING_VALUE,
};

fn internal_key() -> XOnlyPublicKey {
    // secp256k1 generator point x coordinate
    "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        .parse()
        .unwrap()
}

fn taproot_script() -> ScriptBuf {
    ScriptBuf::new_p2tr_tweaked(TweakedPublicKey::dangerous_assume_tweaked(internal_key()))
}

fn taproot_address() -> Address {
    Address::from_script(&taproot_script(), Network::Bitcoin).unwrap()
}

fn taproot_utxo(index: u32, value: u64) -> Utxo {
    Utxo {
        outpoint: OutPoint::new(Txid::from_byte_array([0xCD; 32]), index),
        txout: TxOut {
            value: Amount::from_sat(value),
            script_pubkey: taproot_script(),
        },
        confirmations: 6,
        annotations: vec![],
    }
}

fn context() -> SpendContext {
    SpendContext::new().with_internal_key(internal_key())
}

// Scenario A: overshoot selection picks the single large utxo and appends a
// change output for the excess.
#[test]
fn plain_send_selects_large_utxo_and_returns_change() {
    let pool = vec![
        taproot_utxo(0, 600),
        taproot_utxo(1, 600),
        taproot_utxo(2, 100_000),
    ];

    let built = TxAssembler::new(
        Network::Bitcoin,
        taproot_address(),
        FeeRate::from_sat_per_vb(3.0),
    )
    .add_recipient(taproot_address(), 50_000)
    .utxo_pool(pool)
    .assemble(&context())
    .unwrap();

    assert_eq!(built.inputs.len(), 1);
    assert_eq!(built.inputs[0].utxo().value(), 100_000);
    assert_eq!(built.inputs[0].kind(), AddressKind::Taproot);

    let change = 100_000 - 50_000 - built.fee;
    assert!(change > 0);
    assert_eq!(built.outputs.len(), 2);
    assert_eq!(built.outputs[1].value, change);

    assert_eq!(built.psbt.unsigned_tx.output.len(), 2);
    assert_eq!(
        built.psbt.unsigned_tx.output[0].value,
        Amount::from_sat(50_000)
    );
}

// Scenario B: two padding utxos already present, no preparatory transaction.
#[test]
fn padding_requirement_already_met() {
    let pool = vec![
        taproot_utxo(0, PADDING_VALUE),
        taproot_utxo(1, PADDING_VALUE),
    ];

    let result = ensure_padding(
        &taproot_address(),
        &pool,
        2,
        FeeRate::from_sat_per_vb(1.0),
        Network::Bitcoin,
        &context(),
    )
    .unwrap();

    assert!(result.is_none());
}

// Scenario C: empty pool fails with InsufficientFunds.
#[test]
fn empty_pool_is_insufficient() {
    let err = TxAssembler::new(
        Network::Bitcoin,
        taproot_address(),
        FeeRate::from_sat_per_vb(1.0),
    )
    .add_recipient(taproot_address(), 1_000)
    .utxo_pool(vec![])
    .assemble(&context())
    .unwrap_err();

    assert!(matches!(err, Error::InsufficientFunds { .. }));
}

// Scenario D: the published per-kind constants give 202 vbytes for two
// taproot inputs against one taproot and one native segwit output.
#[test]
fn vsize_matches_hand_computed_value() {
    let vsize = estimate_vsize(
        &[AddressKind::Taproot, AddressKind::Taproot],
        &[AddressKind::Taproot, AddressKind::NativeSegwit],
        None,
    )
    .unwrap();

    assert_eq!(vsize, 202);
}

// Convergence terminates within the pool-size bound even when the target
// forces the pool to be drained utxo by utxo.
#[test]
fn convergence_terminates_on_fragmented_pool() {
    let pool: Vec<Utxo> = (0..50).map(|index| taproot_utxo(index, 2_000)).collect();

    let built = TxAssembler::new(
        Network::Bitcoin,
        taproot_address(),
        FeeRate::from_sat_per_vb(1.0),
    )
    .add_recipient(taproot_address(), 90_000)
    .utxo_pool(pool)
    .selection_order(SelectionOrder::SmallestFirst)
    .assemble(&context())
    .unwrap();

    assert!(built.inputs.len() <= 50);
    let retrieved: u64 = built.inputs.iter().map(|input| input.utxo().value()).sum();
    assert!(retrieved >= 90_000 + built.fee);
}

// Selection postconditions: strict overshoot on success, all-or-nothing on
// failure, exclusions always respected.
#[test]
fn selection_contract_holds_across_targets() {
    let pool: Vec<Utxo> = (0..10).map(|index| taproot_utxo(index, 1_000)).collect();
    let mut excluded = HashSet::new();
    excluded.insert(pool[0].outpoint);

    for target in [0u64, 999, 1_000, 4_500, 8_999, 9_000, 20_000].iter() {
        let result = select_coins(
            &pool,
            *target,
            &excluded,
            false,
            SelectionOrder::Untouched,
        );

        if result.is_empty() {
            // Nine spendable utxos of 1_000 sat: failure only past 9_000.
            assert!(*target >= 9_000);
        } else {
            assert!(result.selected_amount > *target);
            assert!(result
                .selected
                .iter()
                .all(|utxo| !excluded.contains(&utxo.outpoint)));
        }
    }
}

// A marketplace-style flow: provision padding first, then assemble a
// purchase that pins the padding inputs ahead of selection.
#[test]
fn padding_then_purchase_flow() {
    let pool = vec![taproot_utxo(0, 200_000)];

    let provisioning = ensure_padding(
        &taproot_address(),
        &pool,
        2,
        FeeRate::from_sat_per_vb(2.0),
        Network::Bitcoin,
        &context(),
    )
    .unwrap()
    .expect("padding must be provisioned");

    let padding_outputs: Vec<_> = provisioning
        .outputs
        .iter()
        .enumerate()
        .filter(|(_, output)| output.value == PADDING_VALUE)
        .collect();
    assert_eq!(padding_outputs.len(), 2);

    // The wallet's pool after broadcasting the provisioning transaction.
    let provisioned_pool: Vec<Utxo> = provisioning
        .psbt
        .unsigned_tx
        .output
        .iter()
        .enumerate()
        .map(|(vout, txout)| Utxo {
            outpoint: OutPoint::new(provisioning.txid(), vout as u32),
            txout: txout.clone(),
            confirmations: 1,
            annotations: vec![],
        })
        .collect();

    let satisfied = ensure_padding(
        &taproot_address(),
        &provisioned_pool,
        2,
        FeeRate::from_sat_per_vb(2.0),
        Network::Bitcoin,
        &context(),
    )
    .unwrap();
    assert!(satisfied.is_none());

    // The purchase pins the two padding utxos ahead of any selected funding
    // input, the slot layout swap protocols sign against.
    let mut purchase = TxAssembler::new(
        Network::Bitcoin,
        taproot_address(),
        FeeRate::from_sat_per_vb(2.0),
    )
    .add_recipient(taproot_address(), 150_000)
    .utxo_pool(provisioned_pool.clone());
    for utxo in provisioned_pool
        .iter()
        .filter(|utxo| utxo.value() == PADDING_VALUE)
    {
        let template = InputTemplate::new(
            utxo.clone(),
            SigningMeta::Taproot {
                internal_key: internal_key(),
            },
        )
        .unwrap();
        purchase = purchase.add_input(template);
    }

    let built = purchase.assemble(&context()).unwrap();

    assert_eq!(built.inputs.len(), 3);
    assert_eq!(built.inputs[0].utxo().value(), PADDING_VALUE);
    assert_eq!(built.inputs[1].utxo().value(), PADDING_VALUE);
    assert!(built.inputs[2].utxo().value() > PADDING_VALUE);
    let retrieved: u64 = built.inputs.iter().map(|input| input.utxo().value()).sum();
    assert_eq!(retrieved - 150_000 - built.fee, built.outputs[1].value);
}
