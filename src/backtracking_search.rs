//! This module fills a grid using chronological backtracking search. Slots are chosen with the
//! minimum-remaining-values heuristic (ties going to the slot with the most crossings), and words
//! are tried least-constraining first. Optionally, each choice is followed by a round of AC-3
//! restricted to the arcs pointing at the chosen slot.

use std::cmp::Reverse;

use instant::{Duration, Instant};
use log::{debug, info, trace};
use thiserror::Error;

use crate::arc_consistency::ac3;
use crate::assignment::Assignment;
use crate::domains::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::WordId;

/// How many search states should we visit between deadline checks?
pub const INTERRUPT_FREQUENCY: u64 = 10;

/// Settings for a fill attempt.
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    /// Run arc consistency after each choice, pruning a private copy of the domains for the
    /// subtree below it.
    pub inference: bool,

    /// Give up once this much time has passed since the start of the fill.
    pub timeout: Option<Duration>,
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub duration: Duration,
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillFailure {
    /// Node or arc consistency left a slot without options, so there's nothing to search.
    #[error("slot {slot_id} has no remaining options")]
    Unsatisfiable { slot_id: SlotId },

    /// Every branch of the search failed.
    #[error("no assignment satisfies every constraint")]
    Exhausted,

    #[error("gave up after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Misuse of the search primitives, as opposed to a grid that can't be filled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("every slot is already assigned")]
    AssignmentComplete,
}

/// Choose the unassigned slot with the fewest remaining options, preferring slots that cross more
/// other slots when there's a tie.
pub fn select_unassigned_variable(
    config: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
) -> Result<SlotId, SearchError> {
    assignment
        .unassigned()
        .min_by_key(|&slot_id| (domains.len(slot_id), Reverse(config.neighbors(slot_id).len())))
        .ok_or(SearchError::AssignmentComplete)
}

/// Return the words in the domain of `slot_id`, ordered by how many options each one would rule
/// out for the unassigned crossing slots. The first word rules out the fewest.
pub fn order_domain_values(
    config: &GridConfig,
    domains: &Domains,
    slot_id: SlotId,
    assignment: &Assignment,
) -> Vec<WordId> {
    let words = &config.word_list.words;
    let mut values: Vec<WordId> = domains.words(slot_id).collect();

    values.sort_by_cached_key(|&word_id| {
        let word = &words[word_id];

        config
            .neighbors(slot_id)
            .iter()
            .filter(|&&other_slot_id| !assignment.is_assigned(other_slot_id))
            .filter_map(|&other_slot_id| {
                config
                    .overlap(slot_id, other_slot_id)
                    .map(|overlap| (other_slot_id, overlap))
            })
            .map(|(other_slot_id, overlap)| {
                let glyph = word.glyphs.get(overlap.offset_a);
                domains
                    .words(other_slot_id)
                    .filter(|&other_word_id| {
                        words[other_word_id].glyphs.get(overlap.offset_b) != glyph
                    })
                    .count()
            })
            .sum::<usize>()
    });

    values
}

/// Search for a complete, consistent extension of `assignment` using the given domains as the
/// candidate pool. Returns `None` if there isn't one.
pub fn backtrack(
    config: &GridConfig,
    domains: &Domains,
    mut assignment: Assignment,
) -> Option<Assignment> {
    let options = FillOptions::default();
    let mut search = Search::new(config, &options, Instant::now());

    search.backtrack(&mut assignment, domains).ok()
}

/// State shared across the frames of a single fill attempt.
struct Search<'a> {
    config: &'a GridConfig,
    options: &'a FillOptions,
    start: Instant,
    statistics: Statistics,
}

impl<'a> Search<'a> {
    fn new(config: &'a GridConfig, options: &'a FillOptions, start: Instant) -> Search<'a> {
        Search {
            config,
            options,
            start,
            statistics: Statistics::default(),
        }
    }

    fn check_deadline(&self) -> Result<(), FillFailure> {
        if let Some(timeout) = self.options.timeout {
            if self.statistics.states % INTERRUPT_FREQUENCY == 0 && self.start.elapsed() >= timeout
            {
                return Err(FillFailure::TimedOut(timeout));
            }
        }
        Ok(())
    }

    /// Propagate the implications of choosing `word_id` for `slot_id` into a copy of `domains`.
    /// Returns `None` if some crossing slot would be left without options.
    fn infer(&self, domains: &Domains, slot_id: SlotId, word_id: WordId) -> Option<Domains> {
        let mut pruned = domains.clone();
        pruned.restrict_to(slot_id, word_id);

        let arcs = self
            .config
            .neighbors(slot_id)
            .iter()
            .map(|&other_slot_id| (other_slot_id, slot_id))
            .collect();

        match ac3(self.config, &mut pruned, Some(arcs)) {
            Ok(()) => Some(pruned),
            Err(failure) => {
                trace!("Rejecting word {} for slot {}: {}", word_id, slot_id, failure);
                None
            }
        }
    }

    fn backtrack(
        &mut self,
        assignment: &mut Assignment,
        domains: &Domains,
    ) -> Result<Assignment, FillFailure> {
        if assignment.is_complete() {
            return Ok(assignment.clone());
        }

        self.check_deadline()?;
        self.statistics.states += 1;

        let slot_id = select_unassigned_variable(self.config, domains, assignment)?;
        trace!(
            "Filling slot {} ({} options, {} of {} slots assigned)",
            slot_id,
            domains.len(slot_id),
            assignment.assigned_count(),
            assignment.slot_count()
        );

        for word_id in order_domain_values(self.config, domains, slot_id, assignment) {
            let mut choice = assignment.tentative(slot_id, word_id);
            if !choice.is_consistent(self.config) {
                continue;
            }

            let result = if self.options.inference {
                match self.infer(domains, slot_id, word_id) {
                    Some(pruned) => self.backtrack(&mut choice, &pruned),
                    None => continue,
                }
            } else {
                self.backtrack(&mut choice, domains)
            };

            match result {
                Err(FillFailure::Exhausted) => self.statistics.backtracks += 1,
                result => return result,
            }
        }

        Err(FillFailure::Exhausted)
    }
}

/// Enforce node and arc consistency, and then search for a fill.
pub fn find_fill(config: &GridConfig, options: &FillOptions) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();

    let mut domains = Domains::new(config);
    domains.enforce_node_consistency(config);
    if let Some(slot_id) = domains.first_empty() {
        debug!("Slot {} has no words of the right length", slot_id);
        return Err(FillFailure::Unsatisfiable { slot_id });
    }

    ac3(config, &mut domains, None)
        .map_err(|failure| FillFailure::Unsatisfiable { slot_id: failure.slot_id })?;

    let mut search = Search::new(config, options, start);
    let mut assignment = Assignment::new(config.slot_count());
    let result = search.backtrack(&mut assignment, &domains);

    let mut statistics = search.statistics;
    statistics.duration = start.elapsed();
    info!("{:?}", statistics);

    result.map(|assignment| FillSuccess {
        statistics,
        assignment,
    })
}

/// Fill the grid with default options, returning `None` if it can't be done.
pub fn solve(config: &GridConfig) -> Option<Assignment> {
    find_fill(config, &FillOptions::default())
        .ok()
        .map(|success| success.assignment)
}
