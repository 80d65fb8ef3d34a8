//! Document assembler: turns grouped rows into a nested `Lexicon`.

use crate::bulk::{ExampleRow, FormRow, LexiconRows};
use crate::error::{Result, WnEditError};
use crate::group::{GroupedRows, group_rows};
use crate::models::{
    Count, Definition, Dependency, Example, Form, IliDefinition, Lemma, LexicalEntry, Lexicon,
    PartOfSpeech, Pronunciation, Relation, Sense, Synset, SyntacticBehaviour, Tag,
};
use crate::vocab::PROPOSED_ILI;
use log::debug;
use std::collections::HashMap;
use std::time::Instant;

/// Builds the lexicon document for `lmf_version` from its bulk-read rows.
pub fn assemble_lexicon(rows: LexiconRows, lmf_version: &str) -> Result<Lexicon> {
    let start_time = Instant::now();
    let mut grouped = group_rows(rows);

    // Frames with an id are referenced from each sense's `subcat`;
    // anonymous frames list their senses themselves.
    let frame_ids: HashMap<i64, String> = grouped
        .frames
        .iter()
        .filter_map(|f| f.id.clone().filter(|id| !id.is_empty()).map(|id| (f.rowid, id)))
        .collect();

    let entries = std::mem::take(&mut grouped.entries);
    let mut lexicon_entries = Vec::with_capacity(entries.len());
    for entry_row in entries {
        let forms = grouped.forms.take(&entry_row.rowid);
        let mut forms = forms.into_iter();
        let lemma_row = forms.next().ok_or_else(|| {
            WnEditError::Internal(format!("Entry {} has no forms", entry_row.id))
        })?;
        let pos: PartOfSpeech = entry_row.pos.parse()?;

        let mut lemma = Lemma::new(&lemma_row.form, pos);
        lemma.script = lemma_row.script.clone().unwrap_or_default();
        lemma.pronunciations = take_pronunciations(&mut grouped, lemma_row.rowid);
        lemma.tags = take_tags(&mut grouped, lemma_row.rowid);

        let mut entry = LexicalEntry::new(&entry_row.id, lemma);
        entry.forms = forms.map(|row| build_form(&mut grouped, row)).collect();

        let has_index = entry_row.index.is_some();
        entry.index = entry_row.index.unwrap_or_default();

        for (i, sense_row) in grouped.senses.take(&entry_row.rowid).into_iter().enumerate() {
            let mut sense = Sense::new(&sense_row.id, &sense_row.synset_id);
            let position = i as i64 + 1;
            if has_index && sense_row.entry_rank != position {
                sense.n = u32::try_from(sense_row.entry_rank).map_err(|_| {
                    WnEditError::Internal(format!(
                        "Sense {} has invalid rank {}",
                        sense_row.id, sense_row.entry_rank
                    ))
                })?;
            }
            sense.lexicalized = !grouped.unlexicalized_senses.contains(&sense_row.rowid);
            if let Some(adjposition) = grouped.adjpositions.get(&sense_row.rowid) {
                sense.adjposition = Some(adjposition.parse()?);
            }
            sense.subcat = grouped
                .sense_frames
                .get(&sense_row.rowid)
                .iter()
                .filter_map(|frame_rowid| frame_ids.get(frame_rowid).cloned())
                .collect();
            sense.relations = grouped
                .sense_relations
                .take(&sense_row.rowid)
                .into_iter()
                .map(|r| Relation {
                    target: r.target_id,
                    rel_type: r.rel_type,
                })
                .collect();
            sense.examples = build_examples(grouped.sense_examples.take(&sense_row.rowid));
            sense.counts = grouped
                .counts
                .take(&sense_row.rowid)
                .into_iter()
                .map(|value| Count { value })
                .collect();
            entry.senses.push(sense);
        }
        lexicon_entries.push(entry);
    }

    let synsets = std::mem::take(&mut grouped.synsets);
    let mut lexicon_synsets = Vec::with_capacity(synsets.len());
    for synset_row in synsets {
        let pos: PartOfSpeech = synset_row
            .pos
            .as_deref()
            .ok_or_else(|| {
                WnEditError::InvalidArgument(format!(
                    "Synset {} has no part of speech",
                    synset_row.id
                ))
            })?
            .parse()?;
        let mut synset = Synset::new(&synset_row.id, pos);

        let proposed = grouped.proposed_ilis.remove(&synset_row.rowid);
        synset.ili = match (&synset_row.ili, &proposed) {
            (Some(ili), _) => ili.clone(),
            (None, Some(_)) => PROPOSED_ILI.to_string(),
            (None, None) => String::new(),
        };
        synset.ili_definition = proposed.flatten().map(|text| IliDefinition { text });

        synset.lexicalized = !grouped.unlexicalized_synsets.contains(&synset_row.rowid);
        synset.members = grouped.members.take(&synset_row.rowid);
        synset.definitions = grouped
            .definitions
            .take(&synset_row.rowid)
            .into_iter()
            .map(|d| Definition {
                language: d.language.unwrap_or_default(),
                source_sense: d.source_sense.unwrap_or_default(),
                text: d.text.unwrap_or_default(),
            })
            .collect();
        synset.relations = grouped
            .synset_relations
            .take(&synset_row.rowid)
            .into_iter()
            .map(|r| Relation {
                target: r.target_id,
                rel_type: r.rel_type,
            })
            .collect();
        synset.examples = build_examples(grouped.synset_examples.take(&synset_row.rowid));
        lexicon_synsets.push(synset);
    }

    let frames = std::mem::take(&mut grouped.frames);
    let lexicon_frames = frames
        .into_iter()
        .map(|frame| {
            let id = frame.id.unwrap_or_default();
            let senses = if id.is_empty() {
                grouped
                    .frame_senses
                    .take(&frame.rowid)
                    .into_iter()
                    .map(|fs| fs.sense_id)
                    .collect()
            } else {
                Vec::new()
            };
            SyntacticBehaviour {
                id,
                frame: frame.frame,
                senses,
            }
        })
        .collect();

    let row = grouped.lexicon;
    let mut lexicon = Lexicon {
        id: row.id,
        label: row.label,
        language: row.language,
        email: row.email,
        license: row.license,
        version: row.version,
        url: row.url.unwrap_or_default(),
        citation: row.citation.unwrap_or_default(),
        logo: row.logo.unwrap_or_default(),
        requires: grouped
            .dependencies
            .into_iter()
            .map(|d| Dependency {
                id: d.id,
                version: d.version,
                url: d.url.unwrap_or_default(),
            })
            .collect(),
        entries: lexicon_entries,
        synsets: lexicon_synsets,
        frames: lexicon_frames,
    };
    lexicon.conform_to_lmf(lmf_version);
    debug!(
        "Assembled lexicon {} in {:.2?}",
        lexicon.specifier(),
        start_time.elapsed()
    );
    Ok(lexicon)
}

fn take_pronunciations(grouped: &mut GroupedRows, form_rowid: i64) -> Vec<Pronunciation> {
    grouped
        .pronunciations
        .take(&form_rowid)
        .into_iter()
        .map(|p| Pronunciation {
            variety: p.variety.unwrap_or_default(),
            notation: p.notation.unwrap_or_default(),
            phonemic: p.phonemic,
            audio: p.audio.unwrap_or_default(),
            text: p.value.unwrap_or_default(),
        })
        .collect()
}

fn take_tags(grouped: &mut GroupedRows, form_rowid: i64) -> Vec<Tag> {
    grouped
        .tags
        .take(&form_rowid)
        .into_iter()
        .map(|t| Tag {
            category: t.category.unwrap_or_default(),
            text: t.tag.unwrap_or_default(),
        })
        .collect()
}

fn build_form(grouped: &mut GroupedRows, row: FormRow) -> Form {
    Form {
        id: row.id.unwrap_or_default(),
        written_form: row.form,
        script: row.script.unwrap_or_default(),
        pronunciations: take_pronunciations(grouped, row.rowid),
        tags: take_tags(grouped, row.rowid),
    }
}

fn build_examples(rows: Vec<ExampleRow>) -> Vec<Example> {
    rows.into_iter()
        .map(|e| Example {
            language: e.language.unwrap_or_default(),
            text: e.text.unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::{
        EntryRow, FormRow, LexiconRow, ProposedIliRow, SenseRow, SynsetRow, MemberRow,
    };

    fn empty_rows() -> LexiconRows {
        LexiconRows {
            lexicon: LexiconRow {
                rowid: 1,
                id: "L".to_string(),
                label: "Lex".to_string(),
                language: "en".to_string(),
                email: "a@b.c".to_string(),
                license: "lic".to_string(),
                version: "1.0".to_string(),
                url: None,
                citation: None,
                logo: None,
            },
            dependencies: Vec::new(),
            entries: Vec::new(),
            forms: Vec::new(),
            pronunciations: Vec::new(),
            tags: Vec::new(),
            senses: Vec::new(),
            sense_relations: Vec::new(),
            sense_synset_relations: Vec::new(),
            sense_examples: Vec::new(),
            counts: Vec::new(),
            unlexicalized_senses: Vec::new(),
            adjpositions: Vec::new(),
            synsets: Vec::new(),
            definitions: Vec::new(),
            synset_relations: Vec::new(),
            synset_examples: Vec::new(),
            unlexicalized_synsets: Vec::new(),
            members: Vec::new(),
            proposed_ilis: Vec::new(),
            frames: Vec::new(),
            frame_senses: Vec::new(),
        }
    }

    fn form(rowid: i64, entry_rowid: i64, text: &str, rank: i64) -> FormRow {
        FormRow {
            rowid,
            entry_rowid,
            id: None,
            form: text.to_string(),
            script: None,
            rank,
        }
    }

    fn sense(rowid: i64, entry_rowid: i64, id: &str, rank: i64) -> SenseRow {
        SenseRow {
            rowid,
            entry_rowid,
            id: id.to_string(),
            synset_id: "L-1-n".to_string(),
            entry_rank: rank,
        }
    }

    fn with_entry(index: Option<&str>, ranks: &[i64]) -> LexiconRows {
        let mut rows = empty_rows();
        rows.entries.push(EntryRow {
            rowid: 10,
            id: "L-run-n".to_string(),
            pos: "n".to_string(),
            index: index.map(String::from),
        });
        rows.forms.push(form(100, 10, "run", 0));
        for (i, rank) in ranks.iter().enumerate() {
            rows.senses
                .push(sense(200 + i as i64, 10, &format!("L-run-n-{}", i + 1), *rank));
        }
        rows.synsets.push(SynsetRow {
            rowid: 50,
            id: "L-1-n".to_string(),
            pos: Some("n".to_string()),
            ili: None,
        });
        rows
    }

    #[test]
    fn test_first_form_is_lemma() {
        let mut rows = with_entry(None, &[1]);
        rows.forms.push(form(101, 10, "runs", 1));
        rows.forms.push(form(102, 10, "ran", 2));

        let lexicon = assemble_lexicon(rows, "1.4").unwrap();
        let entry = &lexicon.entries[0];
        assert_eq!(entry.lemma.written_form, "run");
        assert_eq!(entry.lemma.part_of_speech, PartOfSpeech::N);
        let forms: Vec<&str> = entry.forms.iter().map(|f| f.written_form.as_str()).collect();
        assert_eq!(forms, vec!["runs", "ran"]);
    }

    #[test]
    fn test_sense_number_needs_index_and_rank_mismatch() {
        // Without an index marker, ranks are never shown.
        let lexicon = assemble_lexicon(with_entry(None, &[1, 5]), "1.4").unwrap();
        assert!(lexicon.entries[0].senses.iter().all(|s| s.n == 0));

        // With an index marker, ranks that match the position are still hidden.
        let lexicon = assemble_lexicon(with_entry(Some("run"), &[1, 2]), "1.4").unwrap();
        assert!(lexicon.entries[0].senses.iter().all(|s| s.n == 0));

        let lexicon = assemble_lexicon(with_entry(Some("run"), &[1, 5]), "1.4").unwrap();
        let numbers: Vec<u32> = lexicon.entries[0].senses.iter().map(|s| s.n).collect();
        assert_eq!(numbers, vec![0, 5]);
        assert_eq!(lexicon.entries[0].index, "run");
    }

    #[test]
    fn test_ili_policy() {
        let mut rows = with_entry(None, &[1]);
        rows.synsets.push(SynsetRow {
            rowid: 51,
            id: "L-2-n".to_string(),
            pos: Some("n".to_string()),
            ili: Some("i123".to_string()),
        });
        rows.synsets.push(SynsetRow {
            rowid: 52,
            id: "L-3-n".to_string(),
            pos: Some("n".to_string()),
            ili: None,
        });
        rows.proposed_ilis.push(ProposedIliRow {
            synset_rowid: 52,
            definition: Some("a new concept".to_string()),
        });

        let lexicon = assemble_lexicon(rows, "1.4").unwrap();
        assert_eq!(lexicon.synsets[0].ili, "");
        assert_eq!(lexicon.synsets[1].ili, "i123");
        assert_eq!(lexicon.synsets[2].ili, PROPOSED_ILI);
        assert_eq!(
            lexicon.synsets[2].ili_definition,
            Some(IliDefinition {
                text: "a new concept".to_string()
            })
        );
    }

    #[test]
    fn test_members_depend_on_lmf_version() {
        let mut rows = with_entry(None, &[1]);
        rows.members.push(MemberRow {
            synset_rowid: 50,
            sense_id: "L-run-n-1".to_string(),
        });
        let lexicon = assemble_lexicon(rows.clone(), "1.1").unwrap();
        assert_eq!(lexicon.synsets[0].members, vec!["L-run-n-1".to_string()]);

        let lexicon = assemble_lexicon(rows, "1.0").unwrap();
        assert!(lexicon.synsets[0].members.is_empty());
    }

    #[test]
    fn test_nullable_metadata_becomes_empty() {
        let lexicon = assemble_lexicon(empty_rows(), "1.4").unwrap();
        assert_eq!(lexicon.url, "");
        assert_eq!(lexicon.citation, "");
        assert_eq!(lexicon.logo, "");
    }

    #[test]
    fn test_entry_without_forms_is_an_error() {
        let mut rows = with_entry(None, &[1]);
        rows.forms.clear();
        assert!(matches!(
            assemble_lexicon(rows, "1.4"),
            Err(WnEditError::Internal(_))
        ));
    }
}
