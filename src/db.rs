use crate::error::{Result, WnEditError};
use crate::models::{LexicalEntry, LexicalResource, Lexicon, Pronunciation, Relation, Tag};
use crate::progress::{ProgressCallback, ProgressReporter};
use crate::specifier::Specifier;
use crate::vocab::PROPOSED_ILI;
use log::{debug, info, warn};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::time::Instant;

// --- Schema Definition ---

pub const SCHEMA_VERSION: u32 = 1;

const CREATE_METADATA_TABLE: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);";

const CREATE_ILIS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS ilis (
    rowid INTEGER PRIMARY KEY,
    id TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL DEFAULT 'presupposed',
    definition TEXT
);";

const CREATE_LEXICONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS lexicons (
    rowid INTEGER PRIMARY KEY,
    specifier TEXT NOT NULL UNIQUE,
    id TEXT NOT NULL,
    label TEXT NOT NULL,
    language TEXT NOT NULL,
    email TEXT NOT NULL,
    license TEXT NOT NULL,
    version TEXT NOT NULL,
    url TEXT,
    citation TEXT,
    logo TEXT,
    UNIQUE (id, version)
);";

const CREATE_LEXICON_DEPENDENCIES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS lexicon_dependencies (
    dependent_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    provider_id TEXT NOT NULL,
    provider_version TEXT NOT NULL,
    provider_url TEXT
);";

const CREATE_ENTRIES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS entries (
    rowid INTEGER PRIMARY KEY,
    id TEXT NOT NULL,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    pos TEXT NOT NULL,
    UNIQUE (id, lexicon_rowid)
);";

// The `index` attribute of an entry, when it has one.
const CREATE_ENTRY_INDEX_TABLE: &str = "
CREATE TABLE IF NOT EXISTS entry_index (
    entry_rowid INTEGER NOT NULL UNIQUE REFERENCES entries (rowid) ON DELETE CASCADE,
    lemma TEXT NOT NULL
);";

// Rank 0 is the lemma; alternate forms follow from rank 1.
const CREATE_FORMS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS forms (
    rowid INTEGER PRIMARY KEY,
    id TEXT,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    entry_rowid INTEGER NOT NULL REFERENCES entries (rowid) ON DELETE CASCADE,
    form TEXT NOT NULL,
    normalized_form TEXT,
    script TEXT,
    rank INTEGER NOT NULL DEFAULT 1
);";

const CREATE_PRONUNCIATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS pronunciations (
    form_rowid INTEGER NOT NULL REFERENCES forms (rowid) ON DELETE CASCADE,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    value TEXT,
    variety TEXT,
    notation TEXT,
    phonemic INTEGER NOT NULL DEFAULT 1, -- 0 for false, 1 for true
    audio TEXT
);";

const CREATE_TAGS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS tags (
    form_rowid INTEGER NOT NULL REFERENCES forms (rowid) ON DELETE CASCADE,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    tag TEXT,
    category TEXT
);";

const CREATE_SYNSETS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS synsets (
    rowid INTEGER PRIMARY KEY,
    id TEXT NOT NULL,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    ili_rowid INTEGER REFERENCES ilis (rowid),
    pos TEXT,
    UNIQUE (id, lexicon_rowid)
);";

const CREATE_UNLEXICALIZED_SYNSETS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS unlexicalized_synsets (
    synset_rowid INTEGER NOT NULL REFERENCES synsets (rowid) ON DELETE CASCADE
);";

const CREATE_PROPOSED_ILIS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS proposed_ilis (
    rowid INTEGER PRIMARY KEY,
    synset_rowid INTEGER NOT NULL UNIQUE REFERENCES synsets (rowid) ON DELETE CASCADE,
    definition TEXT
);";

const CREATE_RELATION_TYPES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS relation_types (
    rowid INTEGER PRIMARY KEY,
    type TEXT NOT NULL UNIQUE
);";

const CREATE_SYNSET_RELATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS synset_relations (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    source_rowid INTEGER NOT NULL REFERENCES synsets (rowid) ON DELETE CASCADE,
    target_rowid INTEGER NOT NULL REFERENCES synsets (rowid) ON DELETE CASCADE,
    type_rowid INTEGER NOT NULL REFERENCES relation_types (rowid)
);";

const CREATE_DEFINITIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS definitions (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    synset_rowid INTEGER NOT NULL REFERENCES synsets (rowid) ON DELETE CASCADE,
    definition TEXT,
    language TEXT,
    sense_rowid INTEGER REFERENCES senses (rowid) ON DELETE SET NULL
);";

const CREATE_SYNSET_EXAMPLES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS synset_examples (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    synset_rowid INTEGER NOT NULL REFERENCES synsets (rowid) ON DELETE CASCADE,
    example TEXT,
    language TEXT
);";

const CREATE_SENSES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS senses (
    rowid INTEGER PRIMARY KEY,
    id TEXT NOT NULL,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    entry_rowid INTEGER NOT NULL REFERENCES entries (rowid) ON DELETE CASCADE,
    entry_rank INTEGER NOT NULL DEFAULT 1,
    synset_rowid INTEGER NOT NULL REFERENCES synsets (rowid) ON DELETE CASCADE,
    synset_rank INTEGER NOT NULL DEFAULT 1,
    UNIQUE (id, lexicon_rowid)
);";

const CREATE_UNLEXICALIZED_SENSES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS unlexicalized_senses (
    sense_rowid INTEGER NOT NULL REFERENCES senses (rowid) ON DELETE CASCADE
);";

const CREATE_SENSE_RELATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS sense_relations (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    source_rowid INTEGER NOT NULL REFERENCES senses (rowid) ON DELETE CASCADE,
    target_rowid INTEGER NOT NULL REFERENCES senses (rowid) ON DELETE CASCADE,
    type_rowid INTEGER NOT NULL REFERENCES relation_types (rowid)
);";

const CREATE_SENSE_SYNSET_RELATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS sense_synset_relations (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    source_rowid INTEGER NOT NULL REFERENCES senses (rowid) ON DELETE CASCADE,
    target_rowid INTEGER NOT NULL REFERENCES synsets (rowid) ON DELETE CASCADE,
    type_rowid INTEGER NOT NULL REFERENCES relation_types (rowid)
);";

const CREATE_ADJPOSITIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS adjpositions (
    sense_rowid INTEGER NOT NULL REFERENCES senses (rowid) ON DELETE CASCADE,
    adjposition TEXT NOT NULL
);";

const CREATE_SENSE_EXAMPLES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS sense_examples (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    sense_rowid INTEGER NOT NULL REFERENCES senses (rowid) ON DELETE CASCADE,
    example TEXT,
    language TEXT
);";

const CREATE_COUNTS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS counts (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    sense_rowid INTEGER NOT NULL REFERENCES senses (rowid) ON DELETE CASCADE,
    count INTEGER NOT NULL
);";

const CREATE_SYNTACTIC_BEHAVIOURS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS syntactic_behaviours (
    rowid INTEGER PRIMARY KEY,
    id TEXT,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    frame TEXT NOT NULL
);";

const CREATE_SYNTACTIC_BEHAVIOUR_SENSES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS syntactic_behaviour_senses (
    syntactic_behaviour_rowid INTEGER NOT NULL REFERENCES syntactic_behaviours (rowid) ON DELETE CASCADE,
    sense_rowid INTEGER NOT NULL REFERENCES senses (rowid) ON DELETE CASCADE
);";

const CREATE_TABLES: &[&str] = &[
    CREATE_METADATA_TABLE,
    CREATE_ILIS_TABLE,
    CREATE_LEXICONS_TABLE,
    CREATE_LEXICON_DEPENDENCIES_TABLE,
    CREATE_ENTRIES_TABLE,
    CREATE_ENTRY_INDEX_TABLE,
    CREATE_FORMS_TABLE,
    CREATE_PRONUNCIATIONS_TABLE,
    CREATE_TAGS_TABLE,
    CREATE_SYNSETS_TABLE,
    CREATE_UNLEXICALIZED_SYNSETS_TABLE,
    CREATE_PROPOSED_ILIS_TABLE,
    CREATE_RELATION_TYPES_TABLE,
    CREATE_SYNSET_RELATIONS_TABLE,
    CREATE_DEFINITIONS_TABLE,
    CREATE_SYNSET_EXAMPLES_TABLE,
    CREATE_SENSES_TABLE,
    CREATE_UNLEXICALIZED_SENSES_TABLE,
    CREATE_SENSE_RELATIONS_TABLE,
    CREATE_SENSE_SYNSET_RELATIONS_TABLE,
    CREATE_ADJPOSITIONS_TABLE,
    CREATE_SENSE_EXAMPLES_TABLE,
    CREATE_COUNTS_TABLE,
    CREATE_SYNTACTIC_BEHAVIOURS_TABLE,
    CREATE_SYNTACTIC_BEHAVIOUR_SENSES_TABLE,
];

// --- Indices ---

// Every foreign key column gets an index so that lexicon removal cascades quickly.
const CREATE_INDICES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_entry_lexicon ON entries (lexicon_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_form_entry ON forms (entry_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_form_form ON forms (form);",
    "CREATE INDEX IF NOT EXISTS idx_pronunciation_form ON pronunciations (form_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_tag_form ON tags (form_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_synset_lexicon ON synsets (lexicon_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_synset_ili ON synsets (ili_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_sense_entry ON senses (entry_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_sense_synset ON senses (synset_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_sense_lexicon ON senses (lexicon_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_synset_rel_source ON synset_relations (source_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_synset_rel_target ON synset_relations (target_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_sense_rel_source ON sense_relations (source_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_sense_rel_target ON sense_relations (target_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_sense_synset_rel_source ON sense_synset_relations (source_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_sense_synset_rel_target ON sense_synset_relations (target_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_definition_synset ON definitions (synset_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_definition_sense ON definitions (sense_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_synset_example_synset ON synset_examples (synset_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_sense_example_sense ON sense_examples (sense_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_count_sense ON counts (sense_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_adjposition_sense ON adjpositions (sense_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_unlexicalized_sense ON unlexicalized_senses (sense_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_unlexicalized_synset ON unlexicalized_synsets (synset_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_sb_lexicon ON syntactic_behaviours (lexicon_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_sb_sense_sb ON syntactic_behaviour_senses (syntactic_behaviour_rowid);",
    "CREATE INDEX IF NOT EXISTS idx_sb_sense_sense ON syntactic_behaviour_senses (sense_rowid);",
];

// --- Initialization Function ---

/// Creates all tables and indices that are missing and records the schema
/// version. A database stamped with any other version is rejected.
pub fn initialize_database(conn: &mut Connection) -> Result<()> {
    info!(
        "Initializing database schema (version {})...",
        SCHEMA_VERSION
    );
    let tx = conn.transaction()?;

    for ddl in CREATE_TABLES.iter().chain(CREATE_INDICES) {
        tx.execute(ddl, [])?;
    }

    let recorded: Option<String> = tx
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    match recorded {
        None => {
            tx.execute(
                "INSERT INTO metadata (key, value) VALUES ('schema_version', ?1)",
                params![SCHEMA_VERSION.to_string()],
            )?;
            debug!("Recorded schema version {}", SCHEMA_VERSION);
        }
        Some(version) if version == SCHEMA_VERSION.to_string() => {
            debug!("Schema version {} already recorded", version);
        }
        Some(version) => {
            return Err(WnEditError::SchemaIncompatible(format!(
                "database schema version {} (expected {})",
                version, SCHEMA_VERSION
            )));
        }
    }

    tx.commit()?;
    info!("Database schema initialization complete.");
    Ok(())
}

/// True if a table called `name` exists.
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

// --- Lexicon Listing & Removal ---

/// Summary of one installed lexicon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconInfo {
    pub rowid: i64,
    pub id: String,
    pub version: String,
    pub label: String,
    pub language: String,
}

impl LexiconInfo {
    pub fn specifier(&self) -> String {
        format!("{}:{}", self.id, self.version)
    }
}

pub fn list_lexicons(conn: &Connection) -> Result<Vec<LexiconInfo>> {
    let mut stmt =
        conn.prepare("SELECT rowid, id, version, label, language FROM lexicons ORDER BY rowid")?;
    let lexicons = stmt
        .query_map([], |row| {
            Ok(LexiconInfo {
                rowid: row.get(0)?,
                id: row.get(1)?,
                version: row.get(2)?,
                label: row.get(3)?,
                language: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(lexicons)
}

/// Installed lexicons matching `specifier`, oldest first.
pub fn find_lexicons(conn: &Connection, specifier: &Specifier) -> Result<Vec<LexiconInfo>> {
    Ok(list_lexicons(conn)?
        .into_iter()
        .filter(|info| specifier.matches(&info.id, &info.version))
        .collect())
}

/// Deletes every lexicon matching `specifier` together with all rows it owns.
///
/// Returns the number of lexicons removed. Requires `PRAGMA foreign_keys = ON`.
pub fn remove_lexicons(conn: &mut Connection, specifier: &Specifier) -> Result<usize> {
    let matches = find_lexicons(conn, specifier)?;
    if matches.is_empty() {
        return Err(WnEditError::LexiconNotFound(specifier.to_string()));
    }
    let tx = conn.transaction()?;
    for info in &matches {
        info!("Removing lexicon {}", info.specifier());
        tx.execute("DELETE FROM lexicons WHERE rowid = ?1", params![info.rowid])?;
    }
    tx.commit()?;
    Ok(matches.len())
}

// --- Data Population Function ---

/// Adds every lexicon of `resource` to the database in one transaction.
///
/// Fails with `LexiconExists` if a lexicon with the same id and version is
/// already installed; nothing is written in that case.
pub fn populate_database(
    conn: &mut Connection,
    resource: &LexicalResource,
    progress: Option<ProgressCallback>,
) -> Result<()> {
    info!("Populating database from LexicalResource...");
    let start_time = Instant::now();
    let mut reporter = ProgressReporter::new(progress);

    let tx = conn.transaction()?;
    for lexicon in &resource.lexicons {
        LexiconWriter::insert(&tx, lexicon, &mut reporter)?;
    }
    tx.commit()?;

    info!(
        "Database population complete. Took {:.2?}",
        start_time.elapsed()
    );
    Ok(())
}

fn none_if_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

/// Per-lexicon insertion state: rowids of everything written so far.
struct LexiconWriter<'t, 'l> {
    tx: &'t Connection,
    lexicon: &'l Lexicon,
    lexicon_rowid: i64,
    entries: HashMap<&'l str, i64>,
    synsets: HashMap<&'l str, i64>,
    senses: HashMap<&'l str, i64>,
    relation_types: HashMap<String, i64>,
}

impl<'t, 'l> LexiconWriter<'t, 'l> {
    fn insert(
        tx: &'t Connection,
        lexicon: &'l Lexicon,
        reporter: &mut ProgressReporter,
    ) -> Result<()> {
        let existing: Option<i64> = tx
            .query_row(
                "SELECT rowid FROM lexicons WHERE id = ?1 AND version = ?2",
                params![lexicon.id, lexicon.version],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(WnEditError::LexiconExists(lexicon.specifier()));
        }

        debug!("Inserting lexicon: {}", lexicon.specifier());
        tx.execute(
            "INSERT INTO lexicons (specifier, id, label, language, email, license, version, url, citation, logo)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                lexicon.specifier(),
                lexicon.id,
                lexicon.label,
                lexicon.language,
                lexicon.email,
                lexicon.license,
                lexicon.version,
                none_if_empty(&lexicon.url),
                none_if_empty(&lexicon.citation),
                none_if_empty(&lexicon.logo),
            ],
        )?;
        let lexicon_rowid = tx.last_insert_rowid();

        for dependency in &lexicon.requires {
            tx.execute(
                "INSERT INTO lexicon_dependencies (dependent_rowid, provider_id, provider_version, provider_url)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    lexicon_rowid,
                    dependency.id,
                    dependency.version,
                    none_if_empty(&dependency.url)
                ],
            )?;
        }

        let mut writer = LexiconWriter {
            tx,
            lexicon,
            lexicon_rowid,
            entries: HashMap::with_capacity(lexicon.entries.len()),
            synsets: HashMap::with_capacity(lexicon.synsets.len()),
            senses: HashMap::new(),
            relation_types: HashMap::new(),
        };
        writer.insert_core(reporter)?;
        writer.insert_details(reporter)?;
        writer.insert_relations(reporter)?;
        Ok(())
    }

    // --- Pass 1: Entries (with forms) and Synsets ---

    fn insert_core(&mut self, reporter: &mut ProgressReporter) -> Result<()> {
        let lexicon = self.lexicon;
        let stage = "Pass 1/3: Inserting Core Entities";
        info!("Population {}", stage);
        reporter.begin_stage(stage, (lexicon.entries.len() + lexicon.synsets.len()) as u64);

        for entry in &lexicon.entries {
            let entry_rowid = self.insert_entry(entry)?;
            if self.entries.insert(entry.id.as_str(), entry_rowid).is_some() {
                return Err(WnEditError::InvalidArgument(format!(
                    "Duplicate entry id: {}",
                    entry.id
                )));
            }
            reporter.advance(|| format!("Entry: {}", entry.id));
        }

        for synset in &lexicon.synsets {
            let ili_rowid = if synset.ili.is_empty() || synset.ili == PROPOSED_ILI {
                None
            } else {
                self.tx.execute(
                    "INSERT OR IGNORE INTO ilis (id) VALUES (?1)",
                    params![synset.ili],
                )?;
                let rowid: i64 = self.tx.query_row(
                    "SELECT rowid FROM ilis WHERE id = ?1",
                    params![synset.ili],
                    |row| row.get(0),
                )?;
                Some(rowid)
            };

            self.tx
                .prepare_cached(
                    "INSERT INTO synsets (id, lexicon_rowid, ili_rowid, pos) VALUES (?1, ?2, ?3, ?4)",
                )?
                .execute(params![
                    synset.id,
                    self.lexicon_rowid,
                    ili_rowid,
                    synset.part_of_speech.as_str()
                ])?;
            let synset_rowid = self.tx.last_insert_rowid();
            if self.synsets.insert(synset.id.as_str(), synset_rowid).is_some() {
                return Err(WnEditError::InvalidArgument(format!(
                    "Duplicate synset id: {}",
                    synset.id
                )));
            }

            if !synset.lexicalized {
                self.tx.execute(
                    "INSERT INTO unlexicalized_synsets (synset_rowid) VALUES (?1)",
                    params![synset_rowid],
                )?;
            }
            if synset.ili == PROPOSED_ILI {
                self.tx.execute(
                    "INSERT INTO proposed_ilis (synset_rowid, definition) VALUES (?1, ?2)",
                    params![
                        synset_rowid,
                        synset.ili_definition.as_ref().map(|d| d.text.as_str())
                    ],
                )?;
            }
            reporter.advance(|| format!("Synset: {}", synset.id));
        }
        info!("Pass 1 complete.");
        Ok(())
    }

    fn insert_entry(&self, entry: &LexicalEntry) -> Result<i64> {
        self.tx
            .prepare_cached("INSERT INTO entries (id, lexicon_rowid, pos) VALUES (?1, ?2, ?3)")?
            .execute(params![
                entry.id,
                self.lexicon_rowid,
                entry.lemma.part_of_speech.as_str()
            ])?;
        let entry_rowid = self.tx.last_insert_rowid();

        if !entry.index.is_empty() {
            self.tx.execute(
                "INSERT INTO entry_index (entry_rowid, lemma) VALUES (?1, ?2)",
                params![entry_rowid, entry.index],
            )?;
        }

        let lemma = &entry.lemma;
        self.insert_form(
            entry_rowid,
            None,
            &lemma.written_form,
            &lemma.script,
            0,
            &lemma.pronunciations,
            &lemma.tags,
        )?;
        for (i, form) in entry.forms.iter().enumerate() {
            self.insert_form(
                entry_rowid,
                none_if_empty(&form.id),
                &form.written_form,
                &form.script,
                i as i64 + 1,
                &form.pronunciations,
                &form.tags,
            )?;
        }
        Ok(entry_rowid)
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_form(
        &self,
        entry_rowid: i64,
        id: Option<&str>,
        written_form: &str,
        script: &str,
        rank: i64,
        pronunciations: &[Pronunciation],
        tags: &[Tag],
    ) -> Result<()> {
        let lowered = written_form.to_lowercase();
        let normalized = if lowered != written_form { Some(lowered) } else { None };
        self.tx
            .prepare_cached(
                "INSERT INTO forms (id, lexicon_rowid, entry_rowid, form, normalized_form, script, rank)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?
            .execute(params![
                id,
                self.lexicon_rowid,
                entry_rowid,
                written_form,
                normalized,
                none_if_empty(script),
                rank
            ])?;
        let form_rowid = self.tx.last_insert_rowid();

        for pron in pronunciations {
            self.tx
                .prepare_cached(
                    "INSERT INTO pronunciations (form_rowid, lexicon_rowid, value, variety, notation, phonemic, audio)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )?
                .execute(params![
                    form_rowid,
                    self.lexicon_rowid,
                    pron.text,
                    none_if_empty(&pron.variety),
                    none_if_empty(&pron.notation),
                    pron.phonemic,
                    none_if_empty(&pron.audio)
                ])?;
        }
        for tag in tags {
            self.tx
                .prepare_cached(
                    "INSERT INTO tags (form_rowid, lexicon_rowid, tag, category) VALUES (?1, ?2, ?3, ?4)",
                )?
                .execute(params![form_rowid, self.lexicon_rowid, tag.text, tag.category])?;
        }
        Ok(())
    }

    // --- Pass 2: Senses, Definitions, Examples, Frames ---

    fn insert_details(&mut self, reporter: &mut ProgressReporter) -> Result<()> {
        let lexicon = self.lexicon;
        let stage = "Pass 2/3: Inserting Details";
        info!("Population {}", stage);
        let total_senses: usize = lexicon.entries.iter().map(|e| e.senses.len()).sum();
        reporter.begin_stage(
            stage,
            (total_senses + lexicon.synsets.len() + lexicon.frames.len()) as u64,
        );

        // Position of each sense in its synset's member list.
        let mut member_rank: HashMap<&str, i64> = HashMap::new();
        for synset in &lexicon.synsets {
            for (i, member) in synset.members.iter().enumerate() {
                member_rank.insert(member.as_str(), i as i64 + 1);
            }
        }

        for entry in &lexicon.entries {
            let entry_rowid = self.entries[entry.id.as_str()];
            for (i, sense) in entry.senses.iter().enumerate() {
                let synset_rowid = *self.synsets.get(sense.synset.as_str()).ok_or_else(|| {
                    WnEditError::InvalidArgument(format!(
                        "Sense {} refers to unknown synset {}",
                        sense.id, sense.synset
                    ))
                })?;
                let entry_rank = if sense.n != 0 { i64::from(sense.n) } else { i as i64 + 1 };
                let synset_rank = member_rank
                    .get(sense.id.as_str())
                    .copied()
                    .unwrap_or(i64::from(u32::MAX));

                self.tx
                    .prepare_cached(
                        "INSERT INTO senses (id, lexicon_rowid, entry_rowid, entry_rank, synset_rowid, synset_rank)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    )?
                    .execute(params![
                        sense.id,
                        self.lexicon_rowid,
                        entry_rowid,
                        entry_rank,
                        synset_rowid,
                        synset_rank
                    ])?;
                let sense_rowid = self.tx.last_insert_rowid();
                if self.senses.insert(sense.id.as_str(), sense_rowid).is_some() {
                    return Err(WnEditError::InvalidArgument(format!(
                        "Duplicate sense id: {}",
                        sense.id
                    )));
                }

                if !sense.lexicalized {
                    self.tx.execute(
                        "INSERT INTO unlexicalized_senses (sense_rowid) VALUES (?1)",
                        params![sense_rowid],
                    )?;
                }
                if let Some(adjposition) = sense.adjposition {
                    self.tx.execute(
                        "INSERT INTO adjpositions (sense_rowid, adjposition) VALUES (?1, ?2)",
                        params![sense_rowid, adjposition.as_str()],
                    )?;
                }
                for example in &sense.examples {
                    self.tx
                        .prepare_cached(
                            "INSERT INTO sense_examples (lexicon_rowid, sense_rowid, example, language)
                             VALUES (?1, ?2, ?3, ?4)",
                        )?
                        .execute(params![
                            self.lexicon_rowid,
                            sense_rowid,
                            example.text,
                            none_if_empty(&example.language)
                        ])?;
                }
                for count in &sense.counts {
                    self.tx
                        .prepare_cached(
                            "INSERT INTO counts (lexicon_rowid, sense_rowid, count) VALUES (?1, ?2, ?3)",
                        )?
                        .execute(params![self.lexicon_rowid, sense_rowid, count.value])?;
                }
                reporter.advance(|| format!("Sense: {}", sense.id));
            }
        }

        for synset in &lexicon.synsets {
            let synset_rowid = self.synsets[synset.id.as_str()];
            for definition in &synset.definitions {
                let source_sense = if definition.source_sense.is_empty() {
                    None
                } else {
                    let found = self.senses.get(definition.source_sense.as_str()).copied();
                    if found.is_none() {
                        warn!(
                            "Definition of {} cites unknown sense {}; dropping the reference",
                            synset.id, definition.source_sense
                        );
                    }
                    found
                };
                self.tx
                    .prepare_cached(
                        "INSERT INTO definitions (lexicon_rowid, synset_rowid, definition, language, sense_rowid)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )?
                    .execute(params![
                        self.lexicon_rowid,
                        synset_rowid,
                        definition.text,
                        none_if_empty(&definition.language),
                        source_sense
                    ])?;
            }
            for example in &synset.examples {
                self.tx
                    .prepare_cached(
                        "INSERT INTO synset_examples (lexicon_rowid, synset_rowid, example, language)
                         VALUES (?1, ?2, ?3, ?4)",
                    )?
                    .execute(params![
                        self.lexicon_rowid,
                        synset_rowid,
                        example.text,
                        none_if_empty(&example.language)
                    ])?;
            }
            reporter.advance(|| format!("Synset details: {}", synset.id));
        }

        self.insert_frames(reporter)?;
        info!("Pass 2 complete.");
        Ok(())
    }

    /// Frames are linked to senses either through the frame's `senses` list
    /// or through a sense's `subcat` ids; both end up in one link table.
    fn insert_frames(&mut self, reporter: &mut ProgressReporter) -> Result<()> {
        let lexicon = self.lexicon;
        let mut subcat_users: HashMap<&str, Vec<&str>> = HashMap::new();
        for sense in lexicon.entries.iter().flat_map(|e| &e.senses) {
            for frame_id in &sense.subcat {
                subcat_users
                    .entry(frame_id.as_str())
                    .or_default()
                    .push(sense.id.as_str());
            }
        }

        for frame in &lexicon.frames {
            self.tx.execute(
                "INSERT INTO syntactic_behaviours (id, lexicon_rowid, frame) VALUES (?1, ?2, ?3)",
                params![none_if_empty(&frame.id), self.lexicon_rowid, frame.frame],
            )?;
            let frame_rowid = self.tx.last_insert_rowid();

            let mut linked: Vec<&str> = frame.senses.iter().map(String::as_str).collect();
            if !frame.id.is_empty() {
                if let Some(users) = subcat_users.get(frame.id.as_str()) {
                    linked.extend(users.iter().copied());
                }
            }
            let mut seen = std::collections::HashSet::new();
            for sense_id in linked {
                if !seen.insert(sense_id) {
                    continue;
                }
                match self.senses.get(sense_id) {
                    Some(&sense_rowid) => {
                        self.tx
                            .prepare_cached(
                                "INSERT INTO syntactic_behaviour_senses (syntactic_behaviour_rowid, sense_rowid)
                                 VALUES (?1, ?2)",
                            )?
                            .execute(params![frame_rowid, sense_rowid])?;
                    }
                    None => warn!("Frame {:?} lists unknown sense {}", frame.id, sense_id),
                }
            }
            reporter.advance(|| format!("Frame: {}", frame.frame));
        }
        Ok(())
    }

    // --- Pass 3: Relations ---

    fn insert_relations(&mut self, reporter: &mut ProgressReporter) -> Result<()> {
        let lexicon = self.lexicon;
        let stage = "Pass 3/3: Inserting Relations";
        info!("Population {}", stage);
        let total_sense_relations: usize = lexicon
            .entries
            .iter()
            .flat_map(|e| &e.senses)
            .map(|s| s.relations.len())
            .sum();
        let total_synset_relations: usize = lexicon.synsets.iter().map(|s| s.relations.len()).sum();
        reporter.begin_stage(stage, (total_sense_relations + total_synset_relations) as u64);

        for sense in lexicon.entries.iter().flat_map(|e| &e.senses) {
            let source_rowid = self.senses[sense.id.as_str()];
            for relation in &sense.relations {
                self.insert_sense_relation(source_rowid, &sense.id, relation)?;
                reporter.advance(|| format!("Sense Relation from: {}", sense.id));
            }
        }

        for synset in &lexicon.synsets {
            let source_rowid = self.synsets[synset.id.as_str()];
            for relation in &synset.relations {
                match self.resolve_synset(&relation.target)? {
                    Some(target_rowid) => {
                        let type_rowid = self.relation_type(&relation.rel_type)?;
                        self.tx
                            .prepare_cached(
                                "INSERT INTO synset_relations (lexicon_rowid, source_rowid, target_rowid, type_rowid)
                                 VALUES (?1, ?2, ?3, ?4)",
                            )?
                            .execute(params![
                                self.lexicon_rowid,
                                source_rowid,
                                target_rowid,
                                type_rowid
                            ])?;
                    }
                    None => warn!(
                        "Skipping {} relation from {}: unknown target {}",
                        relation.rel_type, synset.id, relation.target
                    ),
                }
                reporter.advance(|| format!("Synset Relation from: {}", synset.id));
            }
        }
        info!("Pass 3 complete.");
        Ok(())
    }

    fn insert_sense_relation(
        &mut self,
        source_rowid: i64,
        source_id: &str,
        relation: &Relation,
    ) -> Result<()> {
        let (table, target_rowid) = match self.resolve_sense(&relation.target)? {
            Some(rowid) => ("sense_relations", rowid),
            None => match self.resolve_synset(&relation.target)? {
                Some(rowid) => ("sense_synset_relations", rowid),
                None => {
                    warn!(
                        "Skipping {} relation from {}: unknown target {}",
                        relation.rel_type, source_id, relation.target
                    );
                    return Ok(());
                }
            },
        };
        let type_rowid = self.relation_type(&relation.rel_type)?;
        self.tx
            .prepare_cached(&format!(
                "INSERT INTO {} (lexicon_rowid, source_rowid, target_rowid, type_rowid) VALUES (?1, ?2, ?3, ?4)",
                table
            ))?
            .execute(params![self.lexicon_rowid, source_rowid, target_rowid, type_rowid])?;
        Ok(())
    }

    // Targets outside this lexicon are looked up among installed lexicons.

    fn resolve_sense(&self, id: &str) -> Result<Option<i64>> {
        if let Some(&rowid) = self.senses.get(id) {
            return Ok(Some(rowid));
        }
        Ok(self
            .tx
            .query_row(
                "SELECT rowid FROM senses WHERE id = ?1 ORDER BY rowid LIMIT 1",
                params![id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn resolve_synset(&self, id: &str) -> Result<Option<i64>> {
        if let Some(&rowid) = self.synsets.get(id) {
            return Ok(Some(rowid));
        }
        Ok(self
            .tx
            .query_row(
                "SELECT rowid FROM synsets WHERE id = ?1 ORDER BY rowid LIMIT 1",
                params![id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn relation_type(&mut self, rel_type: &str) -> Result<i64> {
        if let Some(&rowid) = self.relation_types.get(rel_type) {
            return Ok(rowid);
        }
        self.tx.execute(
            "INSERT OR IGNORE INTO relation_types (type) VALUES (?1)",
            params![rel_type],
        )?;
        let rowid: i64 = self.tx.query_row(
            "SELECT rowid FROM relation_types WHERE type = ?1",
            params![rel_type],
            |row| row.get(0),
        )?;
        self.relation_types.insert(rel_type.to_string(), rowid);
        Ok(rowid)
    }
}
