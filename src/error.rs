// TxForge
//
// Copyright (c) 2026 TxForge Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

use std::fmt;

use bitcoin::{Address, OutPoint, ScriptBuf};

/// Errors that can be returned by the assembly engine
///
/// Every public entry point returns either a
/// [`BuiltTransaction`](crate::assembler::BuiltTransaction) or one of these
/// kinds; there is no partially-assembled success state. The engine never
/// retries internally — any retry policy belongs to the collaborators that
/// feed it data.
#[derive(Debug)]
pub enum Error {
    /// The wallet's utxo set cannot cover the requested amount plus fee, at
    /// initial selection or during a convergence expansion
    InsufficientFunds {
        /// Sats needed for the transaction
        needed: u64,
        /// Sats available for spending
        available: u64,
    },
    /// Fee estimation was invoked with zero inputs or zero outputs; indicates
    /// a programming error in the calling feature, not a funds problem
    EmptyTransaction,
    /// A locking script could not be matched to any known address kind
    UnclassifiableScript(ScriptBuf),
    /// Cannot assemble a transaction without recipients
    NoRecipients,
    /// Signing metadata does not match the address kind of the utxo it was
    /// attached to
    InvalidSigningMeta(OutPoint),
    /// A legacy input requires the full previous transaction and none was
    /// supplied
    MissingPrevTx(OutPoint),
    /// The previous transaction supplied for a legacy input does not hash to
    /// the outpoint's txid
    InvalidPrevTx(OutPoint),
    /// A taproot input requires the wallet's internal key and none was
    /// supplied
    MissingInternalKey(OutPoint),
    /// An address handed to the assembler belongs to a different network than
    /// the one the transaction is being assembled for
    InvalidNetwork(Address),
    /// Partially signed bitcoin transaction error
    Psbt(bitcoin::psbt::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientFunds { needed, available } => write!(
                f,
                "Insufficient funds: {} sat available of {} sat needed",
                available, needed
            ),
            Self::EmptyTransaction => {
                write!(f, "Cannot estimate a transaction without inputs and outputs")
            }
            Self::UnclassifiableScript(script) => {
                write!(f, "Script doesn't match any known address kind: {}", script)
            }
            Self::NoRecipients => write!(f, "Cannot assemble a tx without recipients"),
            Self::InvalidSigningMeta(outpoint) => write!(
                f,
                "Signing metadata doesn't match the address kind of {}",
                outpoint
            ),
            Self::MissingPrevTx(outpoint) => write!(
                f,
                "Legacy input {} requires the full previous transaction",
                outpoint
            ),
            Self::InvalidPrevTx(outpoint) => write!(
                f,
                "Previous transaction doesn't match the txid of {}",
                outpoint
            ),
            Self::MissingInternalKey(outpoint) => write!(
                f,
                "Taproot input {} requires the wallet's internal key",
                outpoint
            ),
            Self::InvalidNetwork(address) => {
                write!(f, "Address {} is for a different network", address)
            }
            Self::Psbt(err) => write!(f, "PSBT error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

macro_rules! impl_error {
    ( $from:ty, $to:ident ) => {
        impl std::convert::From<$from> for Error {
            fn from(err: $from) -> Self {
                Error::$to(err)
            }
        }
    };
}

impl_error!(bitcoin::psbt::Error, Psbt);
