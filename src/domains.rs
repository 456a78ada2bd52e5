use bit_set::BitSet;
use log::debug;

use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::WordId;

/// The words still considered possible for each slot, stored as a set of word ids per slot. The
/// store only ever shrinks; search branches that want to prune further work on their own clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    by_slot: Vec<BitSet>,
}

impl Domains {
    /// Start every slot off with the full vocabulary.
    pub fn new(config: &GridConfig) -> Domains {
        let word_count = config.vocabulary().len();
        let full: BitSet = (0..word_count).collect();

        Domains {
            by_slot: config.slot_ids().map(|_| full.clone()).collect(),
        }
    }

    pub fn get(&self, slot_id: SlotId) -> &BitSet {
        &self.by_slot[slot_id]
    }

    pub fn len(&self, slot_id: SlotId) -> usize {
        self.by_slot[slot_id].len()
    }

    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.by_slot[slot_id].is_empty()
    }

    pub fn words(&self, slot_id: SlotId) -> impl Iterator<Item = WordId> + '_ {
        self.by_slot[slot_id].iter()
    }

    /// The first slot with no options left, if any.
    pub fn first_empty(&self) -> Option<SlotId> {
        self.by_slot.iter().position(BitSet::is_empty)
    }

    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.by_slot[slot_id].remove(word_id)
    }

    /// Reduce a slot's domain to the single given word (or to nothing, if the word had already
    /// been eliminated).
    pub fn restrict_to(&mut self, slot_id: SlotId, word_id: WordId) {
        let had_word = self.by_slot[slot_id].contains(word_id);
        self.by_slot[slot_id].clear();
        if had_word {
            self.by_slot[slot_id].insert(word_id);
        }
    }

    /// Remove every word whose length doesn't match its slot, or which contradicts a letter
    /// given in the grid template.
    pub fn enforce_node_consistency(&mut self, config: &GridConfig) {
        for slot_config in &config.slot_configs {
            let domain = &mut self.by_slot[slot_config.id];
            let rejected: Vec<WordId> = domain
                .iter()
                .filter(|&word_id| {
                    let word = &config.vocabulary().words[word_id];

                    word.len() != slot_config.slot.length
                        || word
                            .glyphs
                            .iter()
                            .zip(&slot_config.prefilled)
                            .any(|(glyph, prefilled)| prefilled.map_or(false, |p| p != *glyph))
                })
                .collect();

            for word_id in rejected {
                domain.remove(word_id);
            }

            debug!(
                "Slot {} has {} options after node consistency",
                slot_config.id,
                domain.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Domains;
    use crate::grid_config::GridConfig;
    use crate::word_list::WordList;

    fn sample_config() -> GridConfig {
        GridConfig::from_template(
            include_str!("../data/structure0.txt"),
            WordList::parse(include_str!("../data/words0.txt")),
        )
        .unwrap()
    }

    #[test]
    fn test_initial_domains_hold_full_vocabulary() {
        let config = sample_config();
        let domains = Domains::new(&config);

        assert_eq!(config.vocabulary().len(), 10);
        for slot_id in config.slot_ids() {
            assert_eq!(domains.len(slot_id), 10);
        }
    }

    #[test]
    fn test_node_consistency_filters_by_length() {
        let config = sample_config();
        let mut domains = Domains::new(&config);
        domains.enforce_node_consistency(&config);

        for slot_id in config.slot_ids() {
            let length = config.slot(slot_id).length;
            assert!(domains.len(slot_id) > 0);
            for word_id in domains.words(slot_id) {
                assert_eq!(config.word_list.words[word_id].len(), length);
            }
        }

        // ONE TWO SIX TEN
        assert_eq!(domains.len(0), 4);
        // THREE SEVEN EIGHT
        assert_eq!(domains.len(2), 3);
    }

    #[test]
    fn test_node_consistency_is_idempotent() {
        let config = sample_config();
        let mut once = Domains::new(&config);
        once.enforce_node_consistency(&config);

        let mut twice = once.clone();
        twice.enforce_node_consistency(&config);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_node_consistency_respects_prefilled_letters() {
        let config =
            GridConfig::from_template("_a_", WordList::new(["cat", "car", "dog", "arc", "at"]))
                .unwrap();
        let mut domains = Domains::new(&config);
        domains.enforce_node_consistency(&config);

        let words: Vec<&str> = domains
            .words(0)
            .map(|word_id| config.word_list.words[word_id].string.as_str())
            .collect();
        assert_eq!(words, vec!["CAT", "CAR"]);
    }

    #[test]
    fn test_node_consistency_can_empty_a_domain() {
        let config = GridConfig::from_template("____", WordList::new(["cat", "dog"])).unwrap();
        let mut domains = Domains::new(&config);
        domains.enforce_node_consistency(&config);

        assert!(domains.is_empty(0));
        assert_eq!(domains.first_empty(), Some(0));
    }

    #[test]
    fn test_restrict_to() {
        let config = GridConfig::from_template("___", WordList::new(["cat", "dog"])).unwrap();
        let mut domains = Domains::new(&config);

        domains.restrict_to(0, 1);
        assert_eq!(domains.words(0).collect::<Vec<_>>(), vec![1]);

        domains.remove(0, 1);
        domains.restrict_to(0, 1);
        assert!(domains.is_empty(0));
    }
}
