// Declare modules
pub mod assemble;
pub mod bulk;
pub mod db;
pub mod editor;
pub mod error;
pub mod fallback;
pub mod group;
pub mod index;
pub mod lmf;
pub mod models;
pub mod progress;
pub mod specifier;
pub mod vocab;

// Re-export key types for easier use
pub use editor::{
    Capabilities, LexiconMetadata, MetadataUpdate, NewLexicon, NewSynset, Stats, SynsetUpdate,
    WordnetEditor,
};
pub use error::{Result, WnEditError};
pub use fallback::LexiconExporter;
pub use models::{
    AdjPosition, Count, Definition, Example, Form, IliDefinition, Lemma, LexicalEntry,
    LexicalResource, Lexicon, PartOfSpeech, Pronunciation, Relation, Sense, Synset,
    SyntacticBehaviour, Tag,
};
pub use specifier::Specifier;
pub use vocab::Advisory;

use bulk::SchemaStatus;
use db::LexiconInfo;
use directories_next::ProjectDirs;
use log::{error, info, warn};
use progress::ProgressCallback;
use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::{Path, PathBuf};

/// How a lexicon taken from the store is presented for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Replaces the lexicon id (for derivative works).
    pub lexicon_id: Option<String>,
    pub label: Option<String>,
    pub version: Option<String>,
    /// WN-LMF version the document is assembled for.
    pub lmf_version: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            lexicon_id: None,
            label: None,
            version: None,
            lmf_version: vocab::DEFAULT_LMF_VERSION.to_string(),
        }
    }
}

/// Accepts a whole resource for ingestion.
pub trait ResourceSink {
    fn add_lexical_resource(&mut self, resource: &LexicalResource) -> Result<()>;
}

/// The SQLite lexicon store.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
    exporter: Option<Box<dyn LexiconExporter>>,
}

// Opens or creates the database file and applies the connection pragmas.
fn open_db_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
    )?;

    // WAL lets readers proceed while a commit is running.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "cache_size", "-64000")?; // 64MB
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    // Lexicon removal relies on ON DELETE CASCADE.
    conn.pragma_update(None, "foreign_keys", "ON")?;

    Ok(conn)
}

impl Store {
    /// Opens the database at `path`, creating the schema if the file is new.
    ///
    /// An existing database with a different layout is left untouched; loads
    /// from it go through the export fallback.
    pub fn open(path: &Path) -> Result<Self> {
        info!("Using database path: {:?}", path);
        let mut conn = open_db_connection(path)?;
        if !db::table_exists(&conn, "lexicons")? {
            db::initialize_database(&mut conn)?;
        }
        Ok(Store {
            conn,
            path: Some(path.to_path_buf()),
            exporter: None,
        })
    }

    /// Opens the database at the default per-user location.
    pub fn open_default() -> Result<Self> {
        Self::open(&Self::default_db_path()?)
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        db::initialize_database(&mut conn)?;
        Ok(Store {
            conn,
            path: None,
            exporter: None,
        })
    }

    /// Wraps a connection as is, without creating any schema.
    pub fn from_connection(conn: Connection) -> Self {
        Store {
            conn,
            path: None,
            exporter: None,
        }
    }

    /// Sets the collaborator used when the bulk reader cannot read this database.
    pub fn with_exporter(mut self, exporter: Box<dyn LexiconExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Gets the default path for the SQLite database file.
    pub fn default_db_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("org", "WnEdit", "wn-edit").ok_or(WnEditError::DataDirNotFound)?;
        let data_dir = project_dirs.data_dir();
        fs::create_dir_all(data_dir)?;
        Ok(data_dir.join("wn.db"))
    }

    /// Deletes the database file and its WAL/SHM companions.
    ///
    /// Uses the default location when `db_path_override` is `None`. A missing
    /// file is not an error.
    pub fn clear_database(db_path_override: Option<PathBuf>) -> Result<()> {
        let path_to_clear = match db_path_override {
            Some(path) => path,
            None => Self::default_db_path()?,
        };
        info!("Attempting to clear database file: {:?}", path_to_clear);

        if !path_to_clear.exists() {
            info!(
                "Database file not found, nothing to clear: {:?}",
                path_to_clear
            );
            return Ok(());
        }
        if let Err(e) = fs::remove_file(&path_to_clear) {
            error!("Failed to delete database file {:?}: {}", path_to_clear, e);
            return Err(WnEditError::Io(e));
        }
        info!("Successfully deleted database file: {:?}", path_to_clear);
        for suffix in ["-wal", "-shm"] {
            let mut companion = path_to_clear.as_os_str().to_owned();
            companion.push(suffix);
            let companion = PathBuf::from(companion);
            if companion.exists() {
                let _ = fs::remove_file(companion);
            }
        }
        Ok(())
    }

    pub fn lexicons(&self) -> Result<Vec<LexiconInfo>> {
        db::list_lexicons(&self.conn)
    }

    /// Removes every lexicon matching `specifier` (`id`, `id:version` or `id:*`).
    pub fn remove_lexicon(&mut self, specifier: &str) -> Result<usize> {
        let specifier: Specifier = specifier.parse()?;
        db::remove_lexicons(&mut self.conn, &specifier)
    }

    /// Adds a resource in one transaction, reporting progress per pass.
    pub fn import_resource(
        &mut self,
        resource: &LexicalResource,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        db::populate_database(&mut self.conn, resource, progress)
    }

    /// Reads a WN-LMF file and adds its lexicons.
    pub fn import_file(&mut self, path: &Path, progress: Option<ProgressCallback>) -> Result<()> {
        info!("Reading WN-LMF file: {:?}", path);
        let resource = lmf::load_file(path)?;
        self.import_resource(&resource, progress)
    }

    /// Loads one lexicon as a resource tagged with `lmf_version`.
    ///
    /// The schema is probed first: a compatible store is read in bulk, an
    /// incompatible one goes through the exporter if one is set.
    pub fn load_resource(&self, specifier: &Specifier, lmf_version: &str) -> Result<LexicalResource> {
        match bulk::probe_schema(&self.conn)? {
            SchemaStatus::Compatible => {
                let rows = bulk::read_lexicon(&self.conn, specifier)?;
                let lexicon = assemble::assemble_lexicon(rows, lmf_version)?;
                LexicalResource::new(lmf_version, vec![lexicon])
            }
            SchemaStatus::Incompatible { missing } => {
                let reason = format!("missing {}", missing.join(", "));
                match &self.exporter {
                    Some(exporter) => {
                        warn!("Database schema not readable in bulk ({}); falling back to export", reason);
                        fallback::load_via_export(exporter.as_ref(), specifier, lmf_version)
                    }
                    None => Err(WnEditError::SchemaIncompatible(reason)),
                }
            }
        }
    }
}

impl ResourceSink for Store {
    fn add_lexical_resource(&mut self, resource: &LexicalResource) -> Result<()> {
        self.import_resource(resource, None)
    }
}

// A store with the native schema can serve as the export collaborator for another.
impl LexiconExporter for Store {
    fn export(&self, specifier: &Specifier, lmf_version: &str, destination: &Path) -> Result<()> {
        let resource = self.load_resource(specifier, lmf_version)?;
        lmf::dump_file(&resource, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> LexicalResource {
        let mut editor =
            WordnetEditor::create_new(NewLexicon::new("test"), Capabilities::default()).unwrap();
        editor
            .create_synset(
                NewSynset::new(PartOfSpeech::N)
                    .definition("A domesticated canine")
                    .word("dog")
                    .word("hound"),
            )
            .unwrap();
        editor.resource().clone()
    }

    #[test]
    fn test_store_lifecycle_on_disk() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("wn.db");

        {
            let mut store = Store::open(&db_path).unwrap();
            assert_eq!(store.path(), Some(db_path.as_path()));
            assert!(store.lexicons().unwrap().is_empty());
            store.add_lexical_resource(&sample()).unwrap();
        }

        let mut store = Store::open(&db_path).unwrap();
        let lexicons = store.lexicons().unwrap();
        assert_eq!(lexicons.len(), 1);
        assert_eq!(lexicons[0].specifier(), "test:1.0");

        assert_eq!(store.remove_lexicon("test:*").unwrap(), 1);
        assert!(store.lexicons().unwrap().is_empty());
        drop(store);

        Store::clear_database(Some(db_path.clone())).unwrap();
        assert!(!db_path.exists());
        // Clearing twice is fine.
        Store::clear_database(Some(db_path)).unwrap();
    }

    #[test]
    fn test_load_resource_from_compatible_store() {
        let mut store = Store::open_in_memory().unwrap();
        let resource = sample();
        store.import_resource(&resource, None).unwrap();

        let loaded = store.load_resource(&"test:1.0".parse().unwrap(), "1.4").unwrap();
        assert_eq!(loaded, resource);
    }

    #[test]
    fn test_incompatible_schema_without_exporter() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE lexicons (id TEXT, version TEXT);")
            .unwrap();
        let store = Store::from_connection(conn);
        let err = store.load_resource(&"test".parse().unwrap(), "1.4").unwrap_err();
        assert!(matches!(err, WnEditError::SchemaIncompatible(_)));
    }

    #[test]
    fn test_incompatible_schema_uses_exporter() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE lexicons (id TEXT, version TEXT);")
            .unwrap();
        let resource = sample();
        let expected = resource.clone();
        let store = Store::from_connection(conn).with_exporter(Box::new(
            move |_: &Specifier, _: &str, destination: &Path| lmf::dump_file(&resource, destination),
        ));

        let loaded = store.load_resource(&"test".parse().unwrap(), "1.4").unwrap();
        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_store_as_exporter() {
        let temp_dir = tempdir().unwrap();
        let out = temp_dir.path().join("test.xml.gz");
        let resource = sample();
        let mut store = Store::open_in_memory().unwrap();
        store.import_resource(&resource, None).unwrap();

        store.export(&"test".parse().unwrap(), "1.4", &out).unwrap();
        assert_eq!(lmf::load_file(&out).unwrap(), resource);
        assert!(store.export(&"other".parse().unwrap(), "1.4", &out).is_err());
    }
}
