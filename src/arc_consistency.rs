//! This module contains a crossword-specific implementation of the AC-3 algorithm. For our
//! purposes, a pair of slots `(x, y)` is arc-consistent when every word remaining for `x` places a
//! letter in the shared cell that at least one word remaining for `y` also places there.
//!
//! We keep revising arcs until no more eliminations are possible, or until some slot has no
//! options left, which means the grid can't be filled.

use std::collections::{HashSet, VecDeque};

use log::debug;
use thiserror::Error;

use crate::domains::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::WordId;
use crate::CHECK_INVARIANTS;

/// An ordered pair of slots `(x, y)`, meaning "make `x` consistent with `y`".
pub type SlotArc = (SlotId, SlotId);

/// Result from a failed call to `ac3`, naming the slot whose domain was wiped out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("slot {slot_id} has no remaining options")]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
}

pub type ArcConsistencyResult = Result<(), ArcConsistencyFailure>;

/// Every ordered pair of distinct slots, which is the initial worklist for a global pass.
pub fn all_arcs(config: &GridConfig) -> Vec<SlotArc> {
    config
        .slot_ids()
        .flat_map(|x| {
            config
                .slot_ids()
                .filter(move |&y| y != x)
                .map(move |y| (x, y))
        })
        .collect()
}

/// Make `x` arc-consistent with `y`, removing any word from `x`'s domain that no word in `y`'s
/// domain agrees with at the shared cell. Returns whether anything was removed. Slots that don't
/// cross never constrain each other directly, so nothing is removed for them.
pub fn revise(config: &GridConfig, domains: &mut Domains, x: SlotId, y: SlotId) -> bool {
    let overlap = match config.overlap(x, y) {
        Some(overlap) => overlap,
        None => return false,
    };
    let words = &config.word_list.words;

    // Which letters can `y` still put in the shared cell?
    let supported: HashSet<char> = domains
        .words(y)
        .filter_map(|word_id| words[word_id].glyphs.get(overlap.offset_b).copied())
        .collect();

    let unsupported: Vec<WordId> = domains
        .words(x)
        .filter(|&word_id| {
            words[word_id]
                .glyphs
                .get(overlap.offset_a)
                .map_or(true, |glyph| !supported.contains(glyph))
        })
        .collect();

    for &word_id in &unsupported {
        domains.remove(x, word_id);
    }

    !unsupported.is_empty()
}

/// Drain a worklist of arcs, revising each one. Whenever `x` loses options, every arc `(z, x)`
/// from its other neighbors goes back on the queue. If `arcs` is `None`, start from every ordered
/// pair of distinct slots.
pub fn ac3(
    config: &GridConfig,
    domains: &mut Domains,
    arcs: Option<Vec<SlotArc>>,
) -> ArcConsistencyResult {
    let mut queue: VecDeque<SlotArc> = match arcs {
        Some(arcs) => arcs.into(),
        None => all_arcs(config).into(),
    };
    let mut revisions = 0;

    while let Some((x, y)) = queue.pop_front() {
        if !revise(config, domains, x, y) {
            continue;
        }
        revisions += 1;

        if domains.is_empty(x) {
            debug!("Arc consistency wiped out slot {} while revising against {}", x, y);
            return Err(ArcConsistencyFailure { slot_id: x });
        }

        for &z in config.neighbors(x) {
            if z != y {
                queue.push_back((z, x));
            }
        }
    }

    debug!("Arc consistency established after {} revisions", revisions);

    if CHECK_INVARIANTS && !is_arc_consistent(config, domains) {
        panic!("ac3 succeeded but left an unsupported value");
    }

    Ok(())
}

/// Check that every value of every slot has a supporting value in each crossing slot.
pub fn is_arc_consistent(config: &GridConfig, domains: &Domains) -> bool {
    let words = &config.word_list.words;

    config.slot_ids().all(|x| {
        config.neighbors(x).iter().all(|&y| {
            let overlap = match config.overlap(x, y) {
                Some(overlap) => overlap,
                None => return true,
            };

            domains.words(x).all(|x_word_id| {
                let x_glyph = words[x_word_id].glyphs.get(overlap.offset_a);
                x_glyph.is_some()
                    && domains
                        .words(y)
                        .any(|y_word_id| words[y_word_id].glyphs.get(overlap.offset_b) == x_glyph)
            })
        })
    })
}
