//! Bulk reader: one query per row kind, each returning every row of one lexicon.
//!
//! Reading a lexicon costs a fixed number of queries no matter how many
//! entries it holds. Rows come back in the store's natural order (rowid or
//! explicit rank columns) so that grouping can rely on first-row semantics.

use crate::error::{Result, WnEditError};
use crate::specifier::Specifier;
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashSet;
use std::time::Instant;

/// Tables and columns the bulk queries touch.
pub const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "lexicons",
        &["rowid", "id", "label", "language", "email", "license", "version", "url", "citation", "logo"],
    ),
    ("lexicon_dependencies", &["dependent_rowid", "provider_id", "provider_version", "provider_url"]),
    ("entries", &["rowid", "id", "lexicon_rowid", "pos"]),
    ("entry_index", &["entry_rowid", "lemma"]),
    ("forms", &["rowid", "id", "lexicon_rowid", "entry_rowid", "form", "script", "rank"]),
    ("pronunciations", &["form_rowid", "lexicon_rowid", "value", "variety", "notation", "phonemic", "audio"]),
    ("tags", &["form_rowid", "lexicon_rowid", "tag", "category"]),
    ("senses", &["rowid", "id", "lexicon_rowid", "entry_rowid", "entry_rank", "synset_rowid", "synset_rank"]),
    ("relation_types", &["rowid", "type"]),
    ("sense_relations", &["lexicon_rowid", "source_rowid", "target_rowid", "type_rowid"]),
    ("sense_synset_relations", &["lexicon_rowid", "source_rowid", "target_rowid", "type_rowid"]),
    ("sense_examples", &["lexicon_rowid", "sense_rowid", "example", "language"]),
    ("counts", &["lexicon_rowid", "sense_rowid", "count"]),
    ("unlexicalized_senses", &["sense_rowid"]),
    ("adjpositions", &["sense_rowid", "adjposition"]),
    ("ilis", &["rowid", "id"]),
    ("synsets", &["rowid", "id", "lexicon_rowid", "ili_rowid", "pos"]),
    ("definitions", &["lexicon_rowid", "synset_rowid", "definition", "language", "sense_rowid"]),
    ("synset_relations", &["lexicon_rowid", "source_rowid", "target_rowid", "type_rowid"]),
    ("synset_examples", &["lexicon_rowid", "synset_rowid", "example", "language"]),
    ("unlexicalized_synsets", &["synset_rowid"]),
    ("proposed_ilis", &["synset_rowid", "definition"]),
    ("syntactic_behaviours", &["rowid", "id", "lexicon_rowid", "frame"]),
    ("syntactic_behaviour_senses", &["syntactic_behaviour_rowid", "sense_rowid"]),
];

/// Outcome of checking the store against [`REQUIRED_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    Compatible,
    /// Names of the missing tables (`table`) or columns (`table.column`).
    Incompatible { missing: Vec<String> },
}

impl SchemaStatus {
    pub fn is_compatible(&self) -> bool {
        matches!(self, SchemaStatus::Compatible)
    }
}

/// Lightweight schema check run before choosing a load path.
pub fn probe_schema(conn: &Connection) -> Result<SchemaStatus> {
    let mut missing = Vec::new();
    for (table, columns) in REQUIRED_COLUMNS {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let present = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<HashSet<String>, _>>()?;
        if present.is_empty() {
            missing.push(table.to_string());
            continue;
        }
        for column in columns.iter() {
            // `rowid` is implicit unless a table aliases it
            if *column != "rowid" && !present.contains(*column) {
                missing.push(format!("{}.{}", table, column));
            }
        }
    }
    if missing.is_empty() {
        Ok(SchemaStatus::Compatible)
    } else {
        debug!("Schema probe found missing structures: {:?}", missing);
        Ok(SchemaStatus::Incompatible { missing })
    }
}

// --- Row Types ---

#[derive(Debug, Clone, PartialEq)]
pub struct LexiconRow {
    pub rowid: i64,
    pub id: String,
    pub label: String,
    pub language: String,
    pub email: String,
    pub license: String,
    pub version: String,
    pub url: Option<String>,
    pub citation: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DependencyRow {
    pub id: String,
    pub version: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryRow {
    pub rowid: i64,
    pub id: String,
    pub pos: String,
    pub index: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormRow {
    pub rowid: i64,
    pub entry_rowid: i64,
    pub id: Option<String>,
    pub form: String,
    pub script: Option<String>,
    pub rank: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PronunciationRow {
    pub form_rowid: i64,
    pub value: Option<String>,
    pub variety: Option<String>,
    pub notation: Option<String>,
    pub phonemic: bool,
    pub audio: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagRow {
    pub form_rowid: i64,
    pub tag: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SenseRow {
    pub rowid: i64,
    pub entry_rowid: i64,
    pub id: String,
    pub synset_id: String,
    pub entry_rank: i64,
}

/// A relation from a sense or synset (`source_rowid`) to an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationRow {
    pub source_rowid: i64,
    pub target_id: String,
    pub rel_type: String,
}

/// An example owned by a sense or synset.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleRow {
    pub owner_rowid: i64,
    pub text: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountRow {
    pub sense_rowid: i64,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdjPositionRow {
    pub sense_rowid: i64,
    pub adjposition: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynsetRow {
    pub rowid: i64,
    pub id: String,
    pub pos: Option<String>,
    pub ili: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionRow {
    pub synset_rowid: i64,
    pub text: Option<String>,
    pub language: Option<String>,
    pub source_sense: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberRow {
    pub synset_rowid: i64,
    pub sense_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProposedIliRow {
    pub synset_rowid: i64,
    pub definition: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameRow {
    pub rowid: i64,
    pub id: Option<String>,
    pub frame: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameSenseRow {
    pub frame_rowid: i64,
    pub sense_rowid: i64,
    pub sense_id: String,
}

/// Every row set needed to rebuild one lexicon.
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconRows {
    pub lexicon: LexiconRow,
    pub dependencies: Vec<DependencyRow>,
    pub entries: Vec<EntryRow>,
    pub forms: Vec<FormRow>,
    pub pronunciations: Vec<PronunciationRow>,
    pub tags: Vec<TagRow>,
    pub senses: Vec<SenseRow>,
    pub sense_relations: Vec<RelationRow>,
    pub sense_synset_relations: Vec<RelationRow>,
    pub sense_examples: Vec<ExampleRow>,
    pub counts: Vec<CountRow>,
    pub unlexicalized_senses: Vec<i64>,
    pub adjpositions: Vec<AdjPositionRow>,
    pub synsets: Vec<SynsetRow>,
    pub definitions: Vec<DefinitionRow>,
    pub synset_relations: Vec<RelationRow>,
    pub synset_examples: Vec<ExampleRow>,
    pub unlexicalized_synsets: Vec<i64>,
    pub members: Vec<MemberRow>,
    pub proposed_ilis: Vec<ProposedIliRow>,
    pub frames: Vec<FrameRow>,
    pub frame_senses: Vec<FrameSenseRow>,
}

// --- Queries ---

const LEXICON_SQL: &str = "
SELECT rowid, id, label, language, email, license, version, url, citation, logo
  FROM lexicons
 WHERE id = ?1 AND (?2 IS NULL OR version = ?2)
 ORDER BY rowid DESC
 LIMIT 1";

const DEPENDENCIES_SQL: &str = "
SELECT provider_id, provider_version, provider_url
  FROM lexicon_dependencies
 WHERE dependent_rowid = ?1
 ORDER BY rowid";

const ENTRIES_SQL: &str = "
SELECT e.rowid, e.id, e.pos, i.lemma
  FROM entries AS e
  LEFT JOIN entry_index AS i ON i.entry_rowid = e.rowid
 WHERE e.lexicon_rowid = ?1
 ORDER BY e.rowid";

const FORMS_SQL: &str = "
SELECT rowid, entry_rowid, id, form, script, rank
  FROM forms
 WHERE lexicon_rowid = ?1
 ORDER BY entry_rowid, rank, rowid";

const PRONUNCIATIONS_SQL: &str = "
SELECT form_rowid, value, variety, notation, phonemic, audio
  FROM pronunciations
 WHERE lexicon_rowid = ?1
 ORDER BY rowid";

const TAGS_SQL: &str = "
SELECT form_rowid, tag, category
  FROM tags
 WHERE lexicon_rowid = ?1
 ORDER BY rowid";

const SENSES_SQL: &str = "
SELECT s.rowid, s.entry_rowid, s.id, ss.id, s.entry_rank
  FROM senses AS s
  JOIN synsets AS ss ON ss.rowid = s.synset_rowid
 WHERE s.lexicon_rowid = ?1
 ORDER BY s.entry_rowid, s.entry_rank, s.rowid";

const SENSE_RELATIONS_SQL: &str = "
SELECT r.source_rowid, t.id, rt.type
  FROM sense_relations AS r
  JOIN senses AS t ON t.rowid = r.target_rowid
  JOIN relation_types AS rt ON rt.rowid = r.type_rowid
 WHERE r.lexicon_rowid = ?1
 ORDER BY r.rowid";

const SENSE_SYNSET_RELATIONS_SQL: &str = "
SELECT r.source_rowid, t.id, rt.type
  FROM sense_synset_relations AS r
  JOIN synsets AS t ON t.rowid = r.target_rowid
  JOIN relation_types AS rt ON rt.rowid = r.type_rowid
 WHERE r.lexicon_rowid = ?1
 ORDER BY r.rowid";

const SENSE_EXAMPLES_SQL: &str = "
SELECT sense_rowid, example, language
  FROM sense_examples
 WHERE lexicon_rowid = ?1
 ORDER BY rowid";

const COUNTS_SQL: &str = "
SELECT sense_rowid, count
  FROM counts
 WHERE lexicon_rowid = ?1
 ORDER BY rowid";

const UNLEXICALIZED_SENSES_SQL: &str = "
SELECT u.sense_rowid
  FROM unlexicalized_senses AS u
  JOIN senses AS s ON s.rowid = u.sense_rowid
 WHERE s.lexicon_rowid = ?1";

const ADJPOSITIONS_SQL: &str = "
SELECT a.sense_rowid, a.adjposition
  FROM adjpositions AS a
  JOIN senses AS s ON s.rowid = a.sense_rowid
 WHERE s.lexicon_rowid = ?1";

const SYNSETS_SQL: &str = "
SELECT s.rowid, s.id, s.pos, i.id
  FROM synsets AS s
  LEFT JOIN ilis AS i ON i.rowid = s.ili_rowid
 WHERE s.lexicon_rowid = ?1
 ORDER BY s.rowid";

const DEFINITIONS_SQL: &str = "
SELECT d.synset_rowid, d.definition, d.language, s.id
  FROM definitions AS d
  LEFT JOIN senses AS s ON s.rowid = d.sense_rowid
 WHERE d.lexicon_rowid = ?1
 ORDER BY d.rowid";

const SYNSET_RELATIONS_SQL: &str = "
SELECT r.source_rowid, t.id, rt.type
  FROM synset_relations AS r
  JOIN synsets AS t ON t.rowid = r.target_rowid
  JOIN relation_types AS rt ON rt.rowid = r.type_rowid
 WHERE r.lexicon_rowid = ?1
 ORDER BY r.rowid";

const SYNSET_EXAMPLES_SQL: &str = "
SELECT synset_rowid, example, language
  FROM synset_examples
 WHERE lexicon_rowid = ?1
 ORDER BY rowid";

const UNLEXICALIZED_SYNSETS_SQL: &str = "
SELECT u.synset_rowid
  FROM unlexicalized_synsets AS u
  JOIN synsets AS s ON s.rowid = u.synset_rowid
 WHERE s.lexicon_rowid = ?1";

const MEMBERS_SQL: &str = "
SELECT synset_rowid, id
  FROM senses
 WHERE lexicon_rowid = ?1
 ORDER BY synset_rowid, synset_rank, rowid";

const PROPOSED_ILIS_SQL: &str = "
SELECT p.synset_rowid, p.definition
  FROM proposed_ilis AS p
  JOIN synsets AS s ON s.rowid = p.synset_rowid
 WHERE s.lexicon_rowid = ?1";

const FRAMES_SQL: &str = "
SELECT rowid, id, frame
  FROM syntactic_behaviours
 WHERE lexicon_rowid = ?1
 ORDER BY rowid";

const FRAME_SENSES_SQL: &str = "
SELECT fs.syntactic_behaviour_rowid, fs.sense_rowid, s.id
  FROM syntactic_behaviour_senses AS fs
  JOIN senses AS s ON s.rowid = fs.sense_rowid
 WHERE s.lexicon_rowid = ?1
 ORDER BY fs.rowid";

fn query_rows<T, F>(conn: &Connection, sql: &str, lexicon_rowid: i64, map: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![lexicon_rowid], map)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn relation_row(row: &Row<'_>) -> rusqlite::Result<RelationRow> {
    Ok(RelationRow {
        source_rowid: row.get(0)?,
        target_id: row.get(1)?,
        rel_type: row.get(2)?,
    })
}

fn example_row(row: &Row<'_>) -> rusqlite::Result<ExampleRow> {
    Ok(ExampleRow {
        owner_rowid: row.get(0)?,
        text: row.get(1)?,
        language: row.get(2)?,
    })
}

/// Finds the newest installed lexicon matching `specifier`.
pub fn resolve_lexicon(conn: &Connection, specifier: &Specifier) -> Result<LexiconRow> {
    conn.query_row(
        LEXICON_SQL,
        params![specifier.id, specifier.version],
        |row| {
            Ok(LexiconRow {
                rowid: row.get(0)?,
                id: row.get(1)?,
                label: row.get(2)?,
                language: row.get(3)?,
                email: row.get(4)?,
                license: row.get(5)?,
                version: row.get(6)?,
                url: row.get(7)?,
                citation: row.get(8)?,
                logo: row.get(9)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| WnEditError::LexiconNotFound(specifier.to_string()))
}

/// Reads every row of the lexicon named by `specifier`. Issues no writes.
///
/// Callers should run [`probe_schema`] first; on an incompatible schema the
/// queries fail with a plain database error.
pub fn read_lexicon(conn: &Connection, specifier: &Specifier) -> Result<LexiconRows> {
    let start_time = Instant::now();
    let lexicon = resolve_lexicon(conn, specifier)?;
    let lex = lexicon.rowid;
    debug!("Bulk reading lexicon {}:{} (rowid {})", lexicon.id, lexicon.version, lex);

    let rows = LexiconRows {
        dependencies: query_rows(conn, DEPENDENCIES_SQL, lex, |row| {
            Ok(DependencyRow {
                id: row.get(0)?,
                version: row.get(1)?,
                url: row.get(2)?,
            })
        })?,
        entries: query_rows(conn, ENTRIES_SQL, lex, |row| {
            Ok(EntryRow {
                rowid: row.get(0)?,
                id: row.get(1)?,
                pos: row.get(2)?,
                index: row.get(3)?,
            })
        })?,
        forms: query_rows(conn, FORMS_SQL, lex, |row| {
            Ok(FormRow {
                rowid: row.get(0)?,
                entry_rowid: row.get(1)?,
                id: row.get(2)?,
                form: row.get(3)?,
                script: row.get(4)?,
                rank: row.get(5)?,
            })
        })?,
        pronunciations: query_rows(conn, PRONUNCIATIONS_SQL, lex, |row| {
            Ok(PronunciationRow {
                form_rowid: row.get(0)?,
                value: row.get(1)?,
                variety: row.get(2)?,
                notation: row.get(3)?,
                phonemic: row.get(4)?,
                audio: row.get(5)?,
            })
        })?,
        tags: query_rows(conn, TAGS_SQL, lex, |row| {
            Ok(TagRow {
                form_rowid: row.get(0)?,
                tag: row.get(1)?,
                category: row.get(2)?,
            })
        })?,
        senses: query_rows(conn, SENSES_SQL, lex, |row| {
            Ok(SenseRow {
                rowid: row.get(0)?,
                entry_rowid: row.get(1)?,
                id: row.get(2)?,
                synset_id: row.get(3)?,
                entry_rank: row.get(4)?,
            })
        })?,
        sense_relations: query_rows(conn, SENSE_RELATIONS_SQL, lex, relation_row)?,
        sense_synset_relations: query_rows(conn, SENSE_SYNSET_RELATIONS_SQL, lex, relation_row)?,
        sense_examples: query_rows(conn, SENSE_EXAMPLES_SQL, lex, example_row)?,
        counts: query_rows(conn, COUNTS_SQL, lex, |row| {
            Ok(CountRow {
                sense_rowid: row.get(0)?,
                value: row.get(1)?,
            })
        })?,
        unlexicalized_senses: query_rows(conn, UNLEXICALIZED_SENSES_SQL, lex, |row| row.get(0))?,
        adjpositions: query_rows(conn, ADJPOSITIONS_SQL, lex, |row| {
            Ok(AdjPositionRow {
                sense_rowid: row.get(0)?,
                adjposition: row.get(1)?,
            })
        })?,
        synsets: query_rows(conn, SYNSETS_SQL, lex, |row| {
            Ok(SynsetRow {
                rowid: row.get(0)?,
                id: row.get(1)?,
                pos: row.get(2)?,
                ili: row.get(3)?,
            })
        })?,
        definitions: query_rows(conn, DEFINITIONS_SQL, lex, |row| {
            Ok(DefinitionRow {
                synset_rowid: row.get(0)?,
                text: row.get(1)?,
                language: row.get(2)?,
                source_sense: row.get(3)?,
            })
        })?,
        synset_relations: query_rows(conn, SYNSET_RELATIONS_SQL, lex, relation_row)?,
        synset_examples: query_rows(conn, SYNSET_EXAMPLES_SQL, lex, example_row)?,
        unlexicalized_synsets: query_rows(conn, UNLEXICALIZED_SYNSETS_SQL, lex, |row| row.get(0))?,
        members: query_rows(conn, MEMBERS_SQL, lex, |row| {
            Ok(MemberRow {
                synset_rowid: row.get(0)?,
                sense_id: row.get(1)?,
            })
        })?,
        proposed_ilis: query_rows(conn, PROPOSED_ILIS_SQL, lex, |row| {
            Ok(ProposedIliRow {
                synset_rowid: row.get(0)?,
                definition: row.get(1)?,
            })
        })?,
        frames: query_rows(conn, FRAMES_SQL, lex, |row| {
            Ok(FrameRow {
                rowid: row.get(0)?,
                id: row.get(1)?,
                frame: row.get(2)?,
            })
        })?,
        frame_senses: query_rows(conn, FRAME_SENSES_SQL, lex, |row| {
            Ok(FrameSenseRow {
                frame_rowid: row.get(0)?,
                sense_rowid: row.get(1)?,
                sense_id: row.get(2)?,
            })
        })?,
        lexicon,
    };

    info!(
        "Read {} entries, {} senses, {} synsets in {:.2?}",
        rows.entries.len(),
        rows.senses.len(),
        rows.synsets.len(),
        start_time.elapsed()
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::lmf;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE LexicalResource SYSTEM "http://globalwordnet.github.io/schemas/WN-LMF-1.4.dtd">
<LexicalResource xmlns:dc="http://purl.org/dc/elements/1.1/">
  <Lexicon id="test" label="Test" language="en" email="a@b.c" license="lic" version="1.0">
    <LexicalEntry id="test-colour-n">
      <Lemma writtenForm="colour" partOfSpeech="n"/>
      <Form writtenForm="color"/>
      <Sense id="test-colour-n-1" synset="test-1-n"/>
    </LexicalEntry>
    <Synset id="test-1-n" ili="in" partOfSpeech="n" members="test-colour-n-1">
      <Definition>a visual attribute</Definition>
      <ILIDefinition>a visual attribute of things</ILIDefinition>
    </Synset>
  </Lexicon>
</LexicalResource>
"#;

    fn loaded_db() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        db::initialize_database(&mut conn).unwrap();
        let resource = lmf::parse(SAMPLE).unwrap();
        db::populate_database(&mut conn, &resource, None).unwrap();
        conn
    }

    #[test]
    fn test_probe_compatible_schema() {
        let conn = loaded_db();
        assert_eq!(probe_schema(&conn).unwrap(), SchemaStatus::Compatible);
    }

    #[test]
    fn test_probe_reports_missing_structures() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE lexicons (rowid INTEGER PRIMARY KEY, id TEXT, label TEXT, language TEXT,
                                    email TEXT, license TEXT, version TEXT);",
        )
        .unwrap();
        match probe_schema(&conn).unwrap() {
            SchemaStatus::Incompatible { missing } => {
                assert!(missing.contains(&"lexicons.url".to_string()));
                assert!(missing.contains(&"senses".to_string()));
            }
            SchemaStatus::Compatible => panic!("expected an incompatible schema"),
        }
    }

    #[test]
    fn test_read_lexicon_rows() {
        let conn = loaded_db();
        let rows = read_lexicon(&conn, &"test:1.0".parse().unwrap()).unwrap();
        assert_eq!(rows.lexicon.id, "test");
        assert_eq!(rows.lexicon.url, None);
        assert_eq!(rows.entries.len(), 1);
        assert_eq!(rows.forms.len(), 2);
        assert_eq!(rows.forms[0].form, "colour");
        assert_eq!(rows.forms[0].rank, 0);
        assert_eq!(rows.forms[1].form, "color");
        assert_eq!(rows.senses[0].synset_id, "test-1-n");
        assert_eq!(rows.synsets[0].ili, None);
        assert_eq!(rows.proposed_ilis.len(), 1);
        assert_eq!(
            rows.proposed_ilis[0].definition.as_deref(),
            Some("a visual attribute of things")
        );
        assert_eq!(rows.members.len(), 1);
    }

    #[test]
    fn test_unknown_lexicon() {
        let conn = loaded_db();
        let err = read_lexicon(&conn, &"other".parse().unwrap()).unwrap_err();
        assert!(matches!(err, WnEditError::LexiconNotFound(_)));
        let err = read_lexicon(&conn, &"test:2.0".parse().unwrap()).unwrap_err();
        assert!(matches!(err, WnEditError::LexiconNotFound(_)));
    }
}
