//! Grouping stage: partitions flat row sets by their parent key.

use crate::bulk::{
    DefinitionRow, DependencyRow, EntryRow, ExampleRow, FormRow, FrameRow, FrameSenseRow,
    LexiconRow, LexiconRows, PronunciationRow, RelationRow, SenseRow, SynsetRow, TagRow,
};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Rows partitioned by a parent key. Each group keeps the input order.
#[derive(Debug, Clone)]
pub struct Groups<K, R> {
    map: HashMap<K, Vec<R>>,
}

impl<K: Eq + Hash, R> Groups<K, R> {
    pub fn by_key<I, F>(rows: I, key: F) -> Self
    where
        I: IntoIterator<Item = R>,
        F: Fn(&R) -> K,
    {
        let mut map: HashMap<K, Vec<R>> = HashMap::new();
        for row in rows {
            map.entry(key(&row)).or_default().push(row);
        }
        Groups { map }
    }

    /// Removes and returns the group for `key`, empty if there is none.
    pub fn take(&mut self, key: &K) -> Vec<R> {
        self.map.remove(key).unwrap_or_default()
    }

    pub fn get(&self, key: &K) -> &[R] {
        self.map.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct parent keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Row sets of one lexicon, keyed for the assembler.
#[derive(Debug)]
pub struct GroupedRows {
    pub lexicon: LexiconRow,
    pub dependencies: Vec<DependencyRow>,
    pub entries: Vec<EntryRow>,
    pub synsets: Vec<SynsetRow>,
    pub frames: Vec<FrameRow>,
    /// By entry rowid, ordered by rank; rank 0 is the lemma.
    pub forms: Groups<i64, FormRow>,
    /// By form rowid.
    pub pronunciations: Groups<i64, PronunciationRow>,
    pub tags: Groups<i64, TagRow>,
    /// By entry rowid, ordered by entry rank.
    pub senses: Groups<i64, SenseRow>,
    /// By source sense rowid; sense targets first, then synset targets.
    pub sense_relations: Groups<i64, RelationRow>,
    pub sense_examples: Groups<i64, ExampleRow>,
    pub counts: Groups<i64, u32>,
    pub unlexicalized_senses: HashSet<i64>,
    pub adjpositions: HashMap<i64, String>,
    /// By synset rowid.
    pub definitions: Groups<i64, DefinitionRow>,
    pub synset_relations: Groups<i64, RelationRow>,
    pub synset_examples: Groups<i64, ExampleRow>,
    pub unlexicalized_synsets: HashSet<i64>,
    /// Member sense ids by synset rowid, ordered by synset rank.
    pub members: Groups<i64, String>,
    /// Proposed ILI definition by synset rowid.
    pub proposed_ilis: HashMap<i64, Option<String>>,
    /// By frame rowid.
    pub frame_senses: Groups<i64, FrameSenseRow>,
    /// Frame rowids by sense rowid.
    pub sense_frames: Groups<i64, i64>,
}

pub fn group_rows(rows: LexiconRows) -> GroupedRows {
    let sense_frames = Groups::by_key(
        rows.frame_senses.iter().map(|fs| (fs.sense_rowid, fs.frame_rowid)),
        |(sense, _)| *sense,
    );
    let sense_frames = Groups {
        map: sense_frames
            .map
            .into_iter()
            .map(|(sense, pairs)| (sense, pairs.into_iter().map(|(_, frame)| frame).collect()))
            .collect(),
    };

    GroupedRows {
        lexicon: rows.lexicon,
        dependencies: rows.dependencies,
        entries: rows.entries,
        synsets: rows.synsets,
        frames: rows.frames,
        forms: Groups::by_key(rows.forms, |f| f.entry_rowid),
        pronunciations: Groups::by_key(rows.pronunciations, |p| p.form_rowid),
        tags: Groups::by_key(rows.tags, |t| t.form_rowid),
        senses: Groups::by_key(rows.senses, |s| s.entry_rowid),
        sense_relations: Groups::by_key(
            rows.sense_relations
                .into_iter()
                .chain(rows.sense_synset_relations),
            |r| r.source_rowid,
        ),
        sense_examples: Groups::by_key(rows.sense_examples, |e| e.owner_rowid),
        counts: Groups {
            map: Groups::by_key(rows.counts, |c| c.sense_rowid)
                .map
                .into_iter()
                .map(|(sense, counts)| (sense, counts.into_iter().map(|c| c.value).collect()))
                .collect(),
        },
        unlexicalized_senses: rows.unlexicalized_senses.into_iter().collect(),
        adjpositions: rows
            .adjpositions
            .into_iter()
            .map(|a| (a.sense_rowid, a.adjposition))
            .collect(),
        definitions: Groups::by_key(rows.definitions, |d| d.synset_rowid),
        synset_relations: Groups::by_key(rows.synset_relations, |r| r.source_rowid),
        synset_examples: Groups::by_key(rows.synset_examples, |e| e.owner_rowid),
        unlexicalized_synsets: rows.unlexicalized_synsets.into_iter().collect(),
        members: Groups {
            map: Groups::by_key(rows.members, |m| m.synset_rowid)
                .map
                .into_iter()
                .map(|(synset, members)| {
                    (synset, members.into_iter().map(|m| m.sense_id).collect())
                })
                .collect(),
        },
        proposed_ilis: rows
            .proposed_ilis
            .into_iter()
            .map(|p| (p.synset_rowid, p.definition))
            .collect(),
        frame_senses: Groups::by_key(rows.frame_senses, |fs| fs.frame_rowid),
        sense_frames,
    }
}
