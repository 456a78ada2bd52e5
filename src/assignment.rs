use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use bit_set::BitSet;

use crate::grid_config::{GridConfig, Slot, SlotId};
use crate::word_list::WordId;

/// A mapping from slots to chosen words. Unassigned slots are `None`, never an empty word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
}

impl Assignment {
    /// An assignment for a grid with the given number of slots, with nothing assigned yet.
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            words: vec![None; slot_count],
        }
    }

    pub fn slot_count(&self) -> usize {
        self.words.len()
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id]
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.words[slot_id].is_some()
    }

    /// Assign a word to a slot, returning whatever was there before.
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) -> Option<WordId> {
        self.words[slot_id].replace(word_id)
    }

    pub fn unassign(&mut self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id].take()
    }

    pub fn assigned_count(&self) -> usize {
        self.words.iter().flatten().count()
    }

    /// Does every slot have a word?
    pub fn is_complete(&self) -> bool {
        self.words.iter().all(Option::is_some)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| (slot_id, word_id)))
    }

    pub fn unassigned(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, word_id)| word_id.is_none())
            .map(|(slot_id, _)| slot_id)
    }

    /// Is this assignment valid so far? Assigned words must be distinct, must fit their slots, and
    /// must agree wherever two assigned slots cross. Unassigned slots don't constrain anything.
    pub fn is_consistent(&self, config: &GridConfig) -> bool {
        let words = &config.word_list.words;
        let mut used = BitSet::with_capacity(words.len());

        for (slot_id, word_id) in self.iter() {
            if !used.insert(word_id) {
                return false;
            }
            if words[word_id].len() != config.slot(slot_id).length {
                return false;
            }
        }

        self.iter().all(|(slot_id, word_id)| {
            config
                .neighbors(slot_id)
                .iter()
                .filter(|&&other_slot_id| other_slot_id > slot_id)
                .all(|&other_slot_id| {
                    match (self.get(other_slot_id), config.overlap(slot_id, other_slot_id)) {
                        (Some(other_word_id), Some(overlap)) => {
                            words[word_id].glyphs[overlap.offset_a]
                                == words[other_word_id].glyphs[overlap.offset_b]
                        }
                        _ => true,
                    }
                })
        })
    }

    /// Tentatively assign a word to an unassigned slot. The returned guard derefs to the extended
    /// assignment and removes the word again when it goes out of scope.
    pub fn tentative(&mut self, slot_id: SlotId, word_id: WordId) -> TentativeChoice<'_> {
        self.assign(slot_id, word_id);
        TentativeChoice {
            assignment: self,
            slot_id,
        }
    }

    pub fn word<'a>(&self, config: &'a GridConfig, slot_id: SlotId) -> Option<&'a str> {
        self.get(slot_id)
            .map(|word_id| config.word_list.words[word_id].string.as_str())
    }

    /// Convert to a map keyed by slot geometry, for callers that don't deal in slot ids.
    pub fn to_map(&self, config: &GridConfig) -> HashMap<Slot, String> {
        self.iter()
            .map(|(slot_id, word_id)| {
                (*config.slot(slot_id), config.word_list.words[word_id].string.clone())
            })
            .collect()
    }
}

/// A word placed in a slot for the duration of one search step.
pub struct TentativeChoice<'a> {
    assignment: &'a mut Assignment,
    slot_id: SlotId,
}

impl Deref for TentativeChoice<'_> {
    type Target = Assignment;

    fn deref(&self) -> &Assignment {
        self.assignment
    }
}

impl DerefMut for TentativeChoice<'_> {
    fn deref_mut(&mut self) -> &mut Assignment {
        self.assignment
    }
}

impl Drop for TentativeChoice<'_> {
    fn drop(&mut self) {
        self.assignment.unassign(self.slot_id);
    }
}

#[cfg(test)]
mod tests {
    use super::Assignment;
    use crate::grid_config::GridConfig;
    use crate::word_list::WordList;

    fn sample_config() -> GridConfig {
        GridConfig::from_template(
            include_str!("../data/structure0.txt"),
            WordList::parse(include_str!("../data/words0.txt")),
        )
        .unwrap()
    }

    fn assign(config: &GridConfig, assignment: &mut Assignment, slot_id: usize, word: &str) {
        assignment.assign(slot_id, config.word_list.id_of(word).unwrap());
    }

    #[test]
    fn test_complete_only_when_every_slot_is_assigned() {
        let config = sample_config();
        let mut assignment = Assignment::new(config.slot_count());
        assert!(!assignment.is_complete());
        assert_eq!(assignment.unassigned().collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        assign(&config, &mut assignment, 0, "six");
        assign(&config, &mut assignment, 1, "nine");
        assign(&config, &mut assignment, 2, "seven");
        assert!(!assignment.is_complete());

        assign(&config, &mut assignment, 3, "five");
        assert!(assignment.is_complete());
        assert!(assignment.is_consistent(&config));
        assert_eq!(assignment.assigned_count(), 4);
    }

    #[test]
    fn test_empty_assignment_is_consistent() {
        let config = sample_config();
        assert!(Assignment::new(config.slot_count()).is_consistent(&config));
    }

    #[test]
    fn test_inconsistent_on_duplicate_words() {
        let config = sample_config();
        let mut assignment = Assignment::new(config.slot_count());
        assign(&config, &mut assignment, 1, "nine");
        assign(&config, &mut assignment, 3, "nine");

        assert!(!assignment.is_consistent(&config));
    }

    #[test]
    fn test_inconsistent_on_wrong_length() {
        let config = sample_config();
        let mut assignment = Assignment::new(config.slot_count());
        assign(&config, &mut assignment, 0, "seven");

        assert!(!assignment.is_consistent(&config));
    }

    #[test]
    fn test_inconsistent_on_crossing_conflict() {
        let config = sample_config();
        let mut assignment = Assignment::new(config.slot_count());
        assign(&config, &mut assignment, 0, "ten");
        assign(&config, &mut assignment, 2, "seven");

        assert!(!assignment.is_consistent(&config));

        // Slots 0 and 3 never cross, so any pair of distinct words is fine.
        let mut assignment = Assignment::new(config.slot_count());
        assign(&config, &mut assignment, 0, "ten");
        assign(&config, &mut assignment, 3, "four");
        assert!(assignment.is_consistent(&config));
    }

    #[test]
    fn test_consistency_survives_removing_any_entry() {
        let config = sample_config();
        let mut assignment = Assignment::new(config.slot_count());
        assign(&config, &mut assignment, 0, "six");
        assign(&config, &mut assignment, 1, "nine");
        assign(&config, &mut assignment, 2, "seven");
        assign(&config, &mut assignment, 3, "five");
        assert!(assignment.is_consistent(&config));

        for slot_id in config.slot_ids() {
            let mut restricted = assignment.clone();
            restricted.unassign(slot_id);
            assert!(restricted.is_consistent(&config));
        }
    }

    #[test]
    fn test_tentative_choice_rolls_back() {
        let config = sample_config();
        let mut assignment = Assignment::new(config.slot_count());
        let six = config.word_list.id_of("six").unwrap();

        {
            let choice = assignment.tentative(0, six);
            assert_eq!(choice.get(0), Some(six));
            assert!(choice.is_consistent(&config));
        }

        assert_eq!(assignment.get(0), None);
        assert_eq!(assignment.assigned_count(), 0);
    }

    #[test]
    fn test_to_map_keys_by_slot_geometry() {
        let config = sample_config();
        let mut assignment = Assignment::new(config.slot_count());
        assign(&config, &mut assignment, 2, "seven");

        let map = assignment.to_map(&config);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(config.slot(2)).map(String::as_str), Some("SEVEN"));
        assert_eq!(assignment.word(&config, 2), Some("SEVEN"));
        assert_eq!(assignment.word(&config, 0), None);
    }
}
