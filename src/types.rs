// TxForge
//
// Copyright (c) 2026 TxForge Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Shared value types

use bitcoin::{OutPoint, TxOut};

use serde::{Deserialize, Serialize};

/// Fee rate
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
// Internally stored as satoshi/vbyte
pub struct FeeRate(f32);

impl FeeRate {
    /// Create a new instance of [`FeeRate`] given a float fee rate in btc/kvbytes
    pub fn from_btc_per_kvb(btc_per_kvb: f32) -> Self {
        FeeRate(btc_per_kvb * 1e5)
    }

    /// Create a new instance of [`FeeRate`] given a float fee rate in satoshi/vbyte
    pub const fn from_sat_per_vb(sat_per_vb: f32) -> Self {
        FeeRate(sat_per_vb)
    }

    /// Create a new [`FeeRate`] with the default min relay fee value
    pub const fn default_min_relay_fee() -> Self {
        FeeRate(1.0)
    }

    /// Return the value as satoshi/vbyte
    pub fn as_sat_per_vb(&self) -> f32 {
        self.0
    }

    /// Absolute fee in satoshi owed by a transaction of `vsize` virtual bytes,
    /// rounded to the nearest satoshi
    pub fn fee_for(&self, vsize: u64) -> u64 {
        (vsize as f32 * self.0).round() as u64
    }
}

impl std::default::Default for FeeRate {
    fn default() -> Self {
        FeeRate::default_min_relay_fee()
    }
}

/// An unspent output owned by the wallet, as reported by an external indexer.
///
/// Immutable once observed: the engine reads it during selection and template
/// construction but never mutates it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Utxo {
    /// Reference to the transaction output
    pub outpoint: OutPoint,
    /// Amount and locking script
    pub txout: TxOut,
    /// Number of confirmations at observation time, `0` for mempool utxos
    pub confirmations: u32,
    /// Opaque asset annotations (inscriptions, runes). Only ever tested for
    /// emptiness when deciding whether a utxo is spendable as plain value.
    pub annotations: Vec<String>,
}

impl Utxo {
    /// Amount in satoshi
    pub fn value(&self) -> u64 {
        self.txout.value.to_sat()
    }

    /// Whether the utxo has at least one confirmation
    pub fn is_confirmed(&self) -> bool {
        self.confirmations > 0
    }

    /// Whether any asset annotation is attached
    pub fn has_annotations(&self) -> bool {
        !self.annotations.is_empty()
    }
}
