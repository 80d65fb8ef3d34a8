//! Lookup tables kept in step with a lexicon document.
//!
//! Entries and synsets are found by position in their lexicon vectors; senses
//! by the entry and synset that hold them. Every edit updates these maps in
//! the same step as the document, so they are never recomputed lazily.

use crate::models::{LexicalEntry, Lexicon};
use std::collections::HashMap;

/// Where a sense lives: the entry holding it and the synset it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenseLocation {
    pub entry: String,
    pub synset: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentIndex {
    entries: HashMap<String, usize>,
    synsets: HashMap<String, usize>,
    senses: HashMap<String, SenseLocation>,
    /// Sense ids pointing at each synset, in insertion order.
    synset_senses: HashMap<String, Vec<String>>,
    /// Entry ids by lemma written form, in insertion order.
    forms: HashMap<String, Vec<String>>,
}

impl DocumentIndex {
    /// Full rebuild; used after a bulk load or when the document is replaced.
    pub fn build(lexicon: &Lexicon) -> Self {
        let mut index = DocumentIndex {
            entries: HashMap::with_capacity(lexicon.entries.len()),
            synsets: HashMap::with_capacity(lexicon.synsets.len()),
            ..Default::default()
        };
        for (position, synset) in lexicon.synsets.iter().enumerate() {
            index.insert_synset(&synset.id, position);
        }
        for (position, entry) in lexicon.entries.iter().enumerate() {
            index.insert_entry(entry, position);
        }
        index
    }

    pub fn entry_position(&self, id: &str) -> Option<usize> {
        self.entries.get(id).copied()
    }

    pub fn synset_position(&self, id: &str) -> Option<usize> {
        self.synsets.get(id).copied()
    }

    pub fn sense_location(&self, id: &str) -> Option<&SenseLocation> {
        self.senses.get(id)
    }

    pub fn entries_for_form(&self, form: &str) -> &[String] {
        self.forms.get(form).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn senses_of_synset(&self, synset_id: &str) -> &[String] {
        self.synset_senses
            .get(synset_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True if any entry, synset or sense already uses `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.entries.contains_key(id) || self.synsets.contains_key(id) || self.senses.contains_key(id)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn synset_count(&self) -> usize {
        self.synsets.len()
    }

    pub fn sense_count(&self) -> usize {
        self.senses.len()
    }

    /// Registers an entry, its lemma form and all of its senses.
    pub fn insert_entry(&mut self, entry: &LexicalEntry, position: usize) {
        self.entries.insert(entry.id.clone(), position);
        self.forms
            .entry(entry.lemma.written_form.clone())
            .or_default()
            .push(entry.id.clone());
        for sense in &entry.senses {
            self.insert_sense(&sense.id, &entry.id, &sense.synset);
        }
    }

    pub fn insert_synset(&mut self, id: &str, position: usize) {
        self.synsets.insert(id.to_string(), position);
    }

    pub fn insert_sense(&mut self, sense_id: &str, entry_id: &str, synset_id: &str) {
        self.senses.insert(
            sense_id.to_string(),
            SenseLocation {
                entry: entry_id.to_string(),
                synset: synset_id.to_string(),
            },
        );
        self.synset_senses
            .entry(synset_id.to_string())
            .or_default()
            .push(sense_id.to_string());
    }

    pub fn remove_sense(&mut self, sense_id: &str) -> Option<SenseLocation> {
        let location = self.senses.remove(sense_id)?;
        if let Some(ids) = self.synset_senses.get_mut(&location.synset) {
            ids.retain(|id| id != sense_id);
            if ids.is_empty() {
                self.synset_senses.remove(&location.synset);
            }
        }
        Some(location)
    }

    /// Unregisters an entry with its form and senses. Positions of later
    /// entries are left for [`DocumentIndex::reposition_entries`].
    pub fn remove_entry(&mut self, entry: &LexicalEntry) {
        self.entries.remove(&entry.id);
        let lemma = &entry.lemma.written_form;
        if let Some(ids) = self.forms.get_mut(lemma) {
            ids.retain(|id| id != &entry.id);
            if ids.is_empty() {
                self.forms.remove(lemma);
            }
        }
        for sense in &entry.senses {
            self.remove_sense(&sense.id);
        }
    }

    /// Unregisters a synset and returns the ids of senses still pointing at it.
    pub fn remove_synset(&mut self, id: &str) -> Vec<String> {
        self.synsets.remove(id);
        self.synset_senses.get(id).cloned().unwrap_or_default()
    }

    /// Re-records positions of `entries[from..]` after removals.
    pub fn reposition_entries(&mut self, entries: &[LexicalEntry], from: usize) {
        for (offset, entry) in entries.iter().enumerate().skip(from) {
            self.entries.insert(entry.id.clone(), offset);
        }
    }

    pub fn reposition_synsets(&mut self, lexicon: &Lexicon, from: usize) {
        for (offset, synset) in lexicon.synsets.iter().enumerate().skip(from) {
            self.synsets.insert(synset.id.clone(), offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Lemma, PartOfSpeech, Sense, Synset};

    fn lexicon() -> Lexicon {
        let mut lexicon = Lexicon::new("L", "L", "en", "a@b.c", "lic", "1.0").unwrap();
        lexicon.synsets.push(Synset::new("L-1-n", PartOfSpeech::N));
        lexicon.synsets.push(Synset::new("L-2-v", PartOfSpeech::V));

        let mut dog_n = LexicalEntry::new("L-dog-n", Lemma::new("dog", PartOfSpeech::N));
        dog_n.senses.push(Sense::new("L-dog-n-L-1-n", "L-1-n"));
        let mut dog_v = LexicalEntry::new("L-dog-v", Lemma::new("dog", PartOfSpeech::V));
        dog_v.senses.push(Sense::new("L-dog-v-L-2-v", "L-2-v"));
        lexicon.entries = vec![dog_n, dog_v];
        lexicon
    }

    #[test]
    fn test_build() {
        let lexicon = lexicon();
        let index = DocumentIndex::build(&lexicon);
        assert_eq!(index.entry_count(), 2);
        assert_eq!(index.synset_count(), 2);
        assert_eq!(index.sense_count(), 2);
        assert_eq!(index.entry_position("L-dog-v"), Some(1));
        assert_eq!(index.synset_position("L-2-v"), Some(1));
        assert_eq!(index.entries_for_form("dog"), &["L-dog-n", "L-dog-v"]);
        assert_eq!(
            index.sense_location("L-dog-n-L-1-n"),
            Some(&SenseLocation {
                entry: "L-dog-n".to_string(),
                synset: "L-1-n".to_string()
            })
        );
        assert_eq!(index.senses_of_synset("L-1-n"), &["L-dog-n-L-1-n"]);
        assert!(index.contains_id("L-1-n"));
        assert!(!index.contains_id("L-3-n"));
    }

    #[test]
    fn test_remove_entry_and_reposition() {
        let mut lexicon = lexicon();
        let mut index = DocumentIndex::build(&lexicon);

        let removed = lexicon.entries.remove(0);
        index.remove_entry(&removed);
        index.reposition_entries(&lexicon.entries, 0);

        assert_eq!(index.entry_position("L-dog-n"), None);
        assert_eq!(index.entry_position("L-dog-v"), Some(0));
        assert_eq!(index.entries_for_form("dog"), &["L-dog-v"]);
        assert!(index.senses_of_synset("L-1-n").is_empty());
        assert_eq!(index.sense_count(), 1);
    }

    #[test]
    fn test_remove_synset_reports_senses() {
        let lexicon = lexicon();
        let mut index = DocumentIndex::build(&lexicon);
        let senses = index.remove_synset("L-1-n");
        assert_eq!(senses, vec!["L-dog-n-L-1-n".to_string()]);
        assert_eq!(index.synset_position("L-1-n"), None);

        assert!(index.remove_sense("L-dog-n-L-1-n").is_some());
        assert!(index.remove_sense("L-dog-n-L-1-n").is_none());
        assert!(index.senses_of_synset("L-1-n").is_empty());
    }
}
