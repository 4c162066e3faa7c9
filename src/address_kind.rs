// TxForge
//
// Copyright (c) 2026 TxForge Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Address kind classification
//!
//! Every input and output handled by the engine resolves to exactly one
//! [`AddressKind`]. The kind decides the signing metadata an input template
//! must carry and supplies the per-kind size constants used by
//! [`estimate_vsize`](crate::vsize::estimate_vsize).

use bitcoin::{Address, Script};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The spending-script family of an address or locking script
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// P2PKH. Inputs carry no witness data and require the full previous
    /// transaction to be embeddable for validation
    Legacy,
    /// P2SH-wrapped segwit
    NestedSegwit,
    /// P2WPKH / P2WSH
    NativeSegwit,
    /// P2TR
    Taproot,
}

/// Per-kind size constants in virtual bytes.
///
/// These are heuristic engineering estimates, kept frozen for fee-behavior
/// compatibility. They are deliberately not derived from exact script
/// lengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SizeProfile {
    /// Non-witness vbytes contributed by one input
    pub input: f64,
    /// Vbytes contributed by one output
    pub output: f64,
    /// Transaction-wide header vbytes
    pub tx_header: f64,
    /// Witness vbytes contributed by one input
    pub witness: f64,
}

impl AddressKind {
    /// Classify a locking script.
    ///
    /// Attempts, in a fixed priority order, to interpret the script as nested
    /// segwit, then native segwit, then taproot; legacy is inferred from the
    /// P2PKH form. Anything else is fatal: the engine does not guess.
    pub fn from_script(script: &Script) -> Result<AddressKind, Error> {
        if script.is_p2sh() {
            Ok(AddressKind::NestedSegwit)
        } else if script.is_p2wpkh() || script.is_p2wsh() {
            Ok(AddressKind::NativeSegwit)
        } else if script.is_p2tr() {
            Ok(AddressKind::Taproot)
        } else if script.is_p2pkh() {
            Ok(AddressKind::Legacy)
        } else {
            Err(Error::UnclassifiableScript(script.to_owned()))
        }
    }

    /// Classify an address through its locking script
    pub fn from_address(address: &Address) -> Result<AddressKind, Error> {
        Self::from_script(&address.script_pubkey())
    }

    /// Whether inputs of this kind contribute witness data
    pub fn uses_witness(&self) -> bool {
        !matches!(self, AddressKind::Legacy)
    }

    pub(crate) fn size_profile(&self) -> SizeProfile {
        match self {
            AddressKind::Legacy => SizeProfile {
                input: 148.0,
                output: 34.0,
                tx_header: 10.0,
                witness: 0.0,
            },
            AddressKind::NestedSegwit => SizeProfile {
                input: 64.0,
                output: 32.0,
                tx_header: 10.5,
                witness: 105.0,
            },
            AddressKind::NativeSegwit => SizeProfile {
                input: 41.0,
                output: 31.0,
                tx_header: 10.5,
                witness: 105.0,
            },
            AddressKind::Taproot => SizeProfile {
                input: 42.0,
                output: 43.0,
                tx_header: 10.5,
                witness: 66.0,
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    use bitcoin::hashes::Hash;
    use bitcoin::key::TweakedPublicKey;
    use bitcoin::script::Builder;
    use bitcoin::{PubkeyHash, ScriptBuf, ScriptHash, WPubkeyHash, WScriptHash, XOnlyPublicKey};

    pub(crate) fn p2pkh_script() -> ScriptBuf {
        ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array([0x05; 20]))
    }

    pub(crate) fn p2sh_script() -> ScriptBuf {
        ScriptBuf::new_p2sh(&ScriptHash::from_byte_array([0x06; 20]))
    }

    pub(crate) fn p2wpkh_script() -> ScriptBuf {
        ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array([0x07; 20]))
    }

    pub(crate) fn p2tr_script() -> ScriptBuf {
        // secp256k1 generator point x coordinate, a known-valid x-only key
        let key: XOnlyPublicKey =
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
                .parse()
                .unwrap();
        ScriptBuf::new_p2tr_tweaked(TweakedPublicKey::dangerous_assume_tweaked(key))
    }

    #[test]
    fn test_classify_priority_order() {
        assert_eq!(
            AddressKind::from_script(&p2sh_script()).unwrap(),
            AddressKind::NestedSegwit
        );
        assert_eq!(
            AddressKind::from_script(&p2wpkh_script()).unwrap(),
            AddressKind::NativeSegwit
        );
        assert_eq!(
            AddressKind::from_script(&ScriptBuf::new_p2wsh(&WScriptHash::from_byte_array(
                [0x08; 32]
            )))
            .unwrap(),
            AddressKind::NativeSegwit
        );
        assert_eq!(
            AddressKind::from_script(&p2tr_script()).unwrap(),
            AddressKind::Taproot
        );
        assert_eq!(
            AddressKind::from_script(&p2pkh_script()).unwrap(),
            AddressKind::Legacy
        );
    }

    #[test]
    fn test_classify_unknown_script_is_fatal() {
        let op_return = Builder::new()
            .push_opcode(bitcoin::opcodes::all::OP_RETURN)
            .push_slice(b"hello")
            .into_script();

        match AddressKind::from_script(&op_return) {
            Err(Error::UnclassifiableScript(script)) => assert_eq!(script, op_return),
            other => panic!("expected UnclassifiableScript, got {:?}", other),
        }
    }

    #[test]
    fn test_witness_kinds() {
        assert!(!AddressKind::Legacy.uses_witness());
        assert!(AddressKind::NestedSegwit.uses_witness());
        assert!(AddressKind::NativeSegwit.uses_witness());
        assert!(AddressKind::Taproot.uses_witness());
        assert_eq!(AddressKind::Legacy.size_profile().witness, 0.0);
    }
}
