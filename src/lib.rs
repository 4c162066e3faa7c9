// TxForge
//
// Copyright (c) 2026 TxForge Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! TxForge
//!
//! A coin-selection and fee-convergent transaction assembly engine for
//! Bitcoin wallet SDKs. Given a wallet's unspent outputs, a set of
//! recipients and a fee rate, the engine selects a covering utxo set,
//! estimates the virtual size from the address kinds involved, and iterates
//! until fee and inputs agree, producing a PSBT ready for an external signer
//! and broadcaster.
//!
//! The engine is a pure computation: it performs no networking, key
//! derivation, signing or broadcasting. Utxos, fee rates and previous
//! transactions are supplied by the caller's own collaborators.
//!
//! ## Example
//!
//! ```no_run
//! use std::str::FromStr;
//!
//! use bitcoin::{Address, Network};
//! use txforge::assembler::{SpendContext, TxAssembler};
//! use txforge::types::FeeRate;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let change = Address::from_str("bc1pxwww0ct9ue7e8tdnlmug5m2tamfn7q06sahstg39ys4c9f3340qqxrdu9k")?
//!     .require_network(Network::Bitcoin)?;
//! let recipient = Address::from_str("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4")?
//!     .require_network(Network::Bitcoin)?;
//!
//! let utxos = vec![]; // fetched from an indexer
//! let context = SpendContext::new();
//!
//! let built = TxAssembler::new(Network::Bitcoin, change, FeeRate::from_sat_per_vb(3.0))
//!     .add_recipient(recipient, 50_000)
//!     .utxo_pool(utxos)
//!     .assemble(&context)?;
//!
//! // inspect, sign, broadcast, ...
//! println!("fee: {} sat, psbt: {}", built.fee, built.to_base64());
//! # Ok(())
//! # }
//! ```

pub extern crate bitcoin;
extern crate log;
extern crate serde;

pub mod address_kind;
pub mod assembler;
pub mod coin_selection;
pub mod error;
pub mod padding;
pub mod types;
pub mod vsize;

pub use address_kind::AddressKind;
pub use assembler::{
    BuiltTransaction, InputTemplate, OutputTemplate, SigningMeta, SigningMetaProvider,
    SpendContext, TxAssembler,
};
pub use coin_selection::{select_coins, CoinSelectionResult, SelectionOrder};
pub use error::Error;
pub use padding::{count_padding, ensure_padding, PADDING_VALUE};
pub use types::{FeeRate, Utxo};
pub use vsize::estimate_vsize;
