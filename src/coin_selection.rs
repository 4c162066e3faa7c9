// TxForge
//
// Copyright (c) 2026 TxForge Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Coin selection
//!
//! Deterministic greedy selection of a covering utxo subset. This is not a
//! solver: utxos are taken in the order given by [`SelectionOrder`] until the
//! running sum strictly exceeds the target.

use std::collections::HashSet;

use bitcoin::OutPoint;

use log::debug;

use crate::types::Utxo;

/// Ordering applied to the utxo pool before the selection scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrder {
    /// Largest amounts first, minimizing input count
    LargestFirst,
    /// Smallest amounts first, consolidating small outputs
    SmallestFirst,
    /// Keep the caller-supplied order
    Untouched,
}

impl Default for SelectionOrder {
    fn default() -> Self {
        SelectionOrder::LargestFirst
    }
}

/// Result of a coin selection
///
/// Either `selected` is empty (selection failed) or `selected_amount` strictly
/// exceeds the requested target: the excess becomes the next convergence
/// iteration's change or fee buffer. A non-empty-but-insufficient list is
/// never returned.
#[derive(Debug, Clone, Default)]
pub struct CoinSelectionResult {
    /// Utxos to spend, in selection order
    pub selected: Vec<Utxo>,
    /// Sum of the selected utxos' value
    pub selected_amount: u64,
}

impl CoinSelectionResult {
    /// Whether the selection failed to cover its target
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Select utxos from `pool` until their sum strictly exceeds `amount_needed`.
///
/// Utxos listed in `excluded` are skipped, as are unconfirmed ones when
/// `confirmed_only` is set. Asset-annotated utxos are never spent as plain
/// value. All-or-nothing: if the pool is exhausted without a strict excess,
/// the result is empty. Pure function of its inputs.
pub fn select_coins(
    pool: &[Utxo],
    amount_needed: u64,
    excluded: &HashSet<OutPoint>,
    confirmed_only: bool,
    order: SelectionOrder,
) -> CoinSelectionResult {
    let mut candidates: Vec<&Utxo> = pool.iter().collect();
    match order {
        SelectionOrder::LargestFirst => {
            candidates.sort_by(|a, b| b.value().cmp(&a.value()));
        }
        SelectionOrder::SmallestFirst => {
            candidates.sort_by(|a, b| a.value().cmp(&b.value()));
        }
        SelectionOrder::Untouched => {}
    }

    let mut selected = vec![];
    let mut selected_amount: u64 = 0;
    for utxo in candidates {
        if excluded.contains(&utxo.outpoint) {
            continue;
        }
        if confirmed_only && !utxo.is_confirmed() {
            continue;
        }
        if utxo.has_annotations() {
            continue;
        }

        selected_amount += utxo.value();
        selected.push(utxo.clone());
        debug!(
            "selected {} ({} sat), running total = `{}`",
            utxo.outpoint,
            utxo.value(),
            selected_amount
        );

        if selected_amount > amount_needed {
            return CoinSelectionResult {
                selected,
                selected_amount,
            };
        }
    }

    debug!(
        "pool exhausted: `{}` sat gathered of > `{}` needed",
        selected_amount, amount_needed
    );
    CoinSelectionResult::default()
}

/// Sum of the pool's spendable value under the same filters as
/// [`select_coins`], used to report how much was actually available when a
/// selection fails.
pub(crate) fn spendable_amount(
    pool: &[Utxo],
    excluded: &HashSet<OutPoint>,
    confirmed_only: bool,
) -> u64 {
    pool.iter()
        .filter(|utxo| !excluded.contains(&utxo.outpoint))
        .filter(|utxo| !confirmed_only || utxo.is_confirmed())
        .filter(|utxo| !utxo.has_annotations())
        .map(|utxo| utxo.value())
        .sum()
}
