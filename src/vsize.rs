// TxForge
//
// Copyright (c) 2026 TxForge Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Virtual-size estimation
//!
//! Computes the estimated virtual size of a candidate transaction from the
//! address kinds of its inputs and outputs, using the per-kind constants in
//! [`AddressKind`]. Sizes are engineering estimates sufficient to converge
//! fees, not consensus-exact byte counts.

use log::trace;

use crate::address_kind::AddressKind;
use crate::error::Error;

// Segwit marker and flag bytes.
const WITNESS_SCAFFOLD_VBYTES: f64 = 2.0;

/// Estimate the virtual size of a transaction template.
///
/// Per input kind, input vbytes and witness vbytes accumulate while the
/// header contribution is transaction-wide (last writer wins). Per output
/// kind, output vbytes accumulate. The BIP141 weight formula counts
/// non-witness bytes four times and witness bytes once; `vsize` is the weight
/// divided by four, rounded up.
///
/// When `signed_witness` is supplied (the post-signature re-estimation pass),
/// its literal byte length replaces the witness estimate and is assumed to
/// already include the segwit scaffold.
///
/// Pure function: identical templates always yield identical sizes.
pub fn estimate_vsize(
    inputs: &[AddressKind],
    outputs: &[AddressKind],
    signed_witness: Option<&[u8]>,
) -> Result<u64, Error> {
    if inputs.is_empty() || outputs.is_empty() {
        return Err(Error::EmptyTransaction);
    }

    let mut input_vbytes = 0.0;
    let mut witness_vbytes = 0.0;
    let mut header_vbytes = 0.0;
    for kind in inputs {
        let profile = kind.size_profile();
        input_vbytes += profile.input;
        witness_vbytes += profile.witness;
        header_vbytes = profile.tx_header;
    }

    let mut output_vbytes = 0.0;
    for kind in outputs {
        output_vbytes += kind.size_profile().output;
    }

    let base_total = input_vbytes + header_vbytes + output_vbytes;
    let witness_total = match signed_witness {
        Some(witness) => witness.len() as f64,
        None if witness_vbytes > 0.0 => WITNESS_SCAFFOLD_VBYTES + witness_vbytes,
        None => 0.0,
    };

    let weight = base_total * 3.0 + (base_total + witness_total);
    let vsize = (weight / 4.0).ceil() as u64;

    trace!(
        "estimated vsize = `{}` (base = `{}`, witness = `{}`)",
        vsize,
        base_total,
        witness_total
    );

    Ok(vsize)
}
