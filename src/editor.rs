//! The edit engine: an in-memory lexicon document plus the index that keeps
//! lookups constant-time while it is being changed.
//!
//! The first lexicon of the resource is the one being edited. Every mutation
//! updates the document and the [`DocumentIndex`] together.

use crate::error::{Result, WnEditError};
use crate::index::DocumentIndex;
use crate::lmf;
use crate::models::{
    Definition, Example, Form, Lemma, LexicalEntry, LexicalResource, Lexicon, PartOfSpeech,
    Relation, Sense, Synset,
};
use crate::specifier::Specifier;
use crate::vocab::{self, Advisory, DEFAULT_LMF_VERSION, RelationScope};
use crate::{LoadOptions, ResourceSink, Store};
use log::{debug, info};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Optional features the editor may rely on, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Relation types can be checked against the known vocabularies.
    pub validation: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities { validation: true }
    }
}

/// Metadata for a fresh, empty lexicon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLexicon {
    pub id: String,
    /// Falls back to the id when unset.
    pub label: Option<String>,
    pub language: String,
    pub email: String,
    pub license: String,
    pub version: String,
    pub lmf_version: String,
}

impl NewLexicon {
    pub fn new(id: &str) -> Self {
        NewLexicon {
            id: id.to_string(),
            label: None,
            language: "en".to_string(),
            email: "user@example.com".to_string(),
            license: "https://creativecommons.org/licenses/by/4.0/".to_string(),
            version: "1.0".to_string(),
            lmf_version: DEFAULT_LMF_VERSION.to_string(),
        }
    }
}

/// Everything needed to create a synset; built up with the chained setters.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSynset {
    pub pos: PartOfSpeech,
    /// Generated when unset.
    pub id: Option<String>,
    pub definitions: Vec<String>,
    pub examples: Vec<String>,
    pub ili: Option<String>,
    /// Written forms added to the synset once it exists.
    pub words: Vec<String>,
}

impl NewSynset {
    pub fn new(pos: PartOfSpeech) -> Self {
        NewSynset {
            pos,
            id: None,
            definitions: Vec::new(),
            examples: Vec::new(),
            ili: None,
            words: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn definition(mut self, text: &str) -> Self {
        self.definitions.push(text.to_string());
        self
    }

    pub fn example(mut self, text: &str) -> Self {
        self.examples.push(text.to_string());
        self
    }

    pub fn ili(mut self, ili: &str) -> Self {
        self.ili = Some(ili.to_string());
        self
    }

    pub fn word(mut self, written_form: &str) -> Self {
        self.words.push(written_form.to_string());
        self
    }
}

/// Changes to an existing synset. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynsetUpdate {
    /// Replaces all current definitions.
    pub definition: Option<String>,
    pub add_definitions: Vec<String>,
    pub add_examples: Vec<String>,
    pub ili: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataUpdate {
    pub version: Option<String>,
    pub label: Option<String>,
    pub email: Option<String>,
    pub license: Option<String>,
    pub url: Option<String>,
    pub citation: Option<String>,
}

/// Lexicon metadata with empty strings for unset fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconMetadata {
    pub id: String,
    pub label: String,
    pub language: String,
    pub version: String,
    pub email: String,
    pub license: String,
    pub url: String,
    pub citation: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub synsets: usize,
    pub entries: usize,
    pub senses: usize,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} synsets, {} entries, {} senses",
            self.synsets, self.entries, self.senses
        )
    }
}

pub struct WordnetEditor {
    resource: LexicalResource,
    index: DocumentIndex,
    capabilities: Capabilities,
}

impl WordnetEditor {
    // --- Construction ---

    /// Starts an empty document holding one lexicon.
    pub fn create_new(new: NewLexicon, capabilities: Capabilities) -> Result<Self> {
        let label = new.label.unwrap_or_else(|| new.id.clone());
        let lexicon = Lexicon::new(
            &new.id,
            &label,
            &new.language,
            &new.email,
            &new.license,
            &new.version,
        )?;
        let resource = LexicalResource::new(&new.lmf_version, vec![lexicon])?;
        info!("Created new lexicon {}", resource.lexicons[0].specifier());
        Self::from_resource(resource, capabilities)
    }

    /// Wraps an existing document. Its first lexicon becomes the edited one.
    pub fn from_resource(mut resource: LexicalResource, capabilities: Capabilities) -> Result<Self> {
        if resource.lexicons.is_empty() {
            return Err(WnEditError::InvalidArgument(
                "Resource contains no lexicons".to_string(),
            ));
        }
        if resource.lmf_version.trim().is_empty() {
            resource.lmf_version = DEFAULT_LMF_VERSION.to_string();
        }
        let index = DocumentIndex::build(&resource.lexicons[0]);
        Ok(WordnetEditor {
            resource,
            index,
            capabilities,
        })
    }

    /// Loads a lexicon from the store, applying any metadata overrides.
    pub fn open(
        store: &Store,
        specifier: &str,
        options: &LoadOptions,
        capabilities: Capabilities,
    ) -> Result<Self> {
        let specifier: Specifier = specifier.parse()?;
        let mut resource = store.load_resource(&specifier, &options.lmf_version)?;
        if let Some(lexicon) = resource.lexicons.first_mut() {
            if let Some(id) = &options.lexicon_id {
                if id.trim().is_empty() {
                    return Err(WnEditError::InvalidArgument(
                        "Lexicon id must not be empty".to_string(),
                    ));
                }
                lexicon.id = id.clone();
            }
            if let Some(label) = &options.label {
                lexicon.label = label.clone();
            }
            if let Some(version) = &options.version {
                lexicon.version = version.clone();
            }
        }
        Self::from_resource(resource, capabilities)
    }

    /// Loads a WN-LMF file (plain or gzip) for editing.
    pub fn load_from_file(path: &Path, capabilities: Capabilities) -> Result<Self> {
        let resource = lmf::load_file(path)?;
        if resource.lexicons.is_empty() {
            return Err(WnEditError::InvalidArgument(format!(
                "No lexicons found in file: {:?}",
                path
            )));
        }
        Self::from_resource(resource, capabilities)
    }

    /// Swaps in a whole new document and rebuilds the index.
    pub fn replace_resource(&mut self, resource: LexicalResource) -> Result<()> {
        *self = Self::from_resource(resource, self.capabilities)?;
        Ok(())
    }

    // --- Accessors ---

    pub fn resource(&self) -> &LexicalResource {
        &self.resource
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.resource.lexicons[0]
    }

    fn lexicon_mut(&mut self) -> &mut Lexicon {
        &mut self.resource.lexicons[0]
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn get_synset(&self, id: &str) -> Option<&Synset> {
        self.index
            .synset_position(id)
            .and_then(|position| self.lexicon().synsets.get(position))
    }

    pub fn get_entry(&self, id: &str) -> Option<&LexicalEntry> {
        self.index
            .entry_position(id)
            .and_then(|position| self.lexicon().entries.get(position))
    }

    pub fn get_sense(&self, id: &str) -> Option<&Sense> {
        let location = self.index.sense_location(id)?;
        self.get_entry(&location.entry)?
            .senses
            .iter()
            .find(|sense| sense.id == id)
    }

    /// The entry holding the sense `sense_id`.
    pub fn get_sense_entry(&self, sense_id: &str) -> Option<&LexicalEntry> {
        let location = self.index.sense_location(sense_id)?;
        self.get_entry(&location.entry)
    }

    /// Senses pointing at `synset_id`, in the order they were added.
    pub fn senses_for_synset(&self, synset_id: &str) -> Vec<&Sense> {
        self.index
            .senses_of_synset(synset_id)
            .iter()
            .filter_map(|id| self.get_sense(id))
            .collect()
    }

    /// Entries whose lemma is `written_form`, optionally of one part of speech.
    pub fn find_entries(&self, written_form: &str, pos: Option<PartOfSpeech>) -> Vec<&LexicalEntry> {
        self.index
            .entries_for_form(written_form)
            .iter()
            .filter_map(|id| self.get_entry(id))
            .filter(|entry| pos.is_none_or(|p| entry.lemma.part_of_speech == p))
            .collect()
    }

    pub fn stats(&self) -> Stats {
        let lexicon = self.lexicon();
        Stats {
            synsets: lexicon.synsets.len(),
            entries: lexicon.entries.len(),
            senses: lexicon.entries.iter().map(|e| e.senses.len()).sum(),
        }
    }

    // --- Lexicon Metadata ---

    pub fn set_id(&mut self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(WnEditError::InvalidArgument(
                "Lexicon id must not be empty".to_string(),
            ));
        }
        self.lexicon_mut().id = id.to_string();
        Ok(())
    }

    pub fn set_label(&mut self, label: &str) {
        self.lexicon_mut().label = label.to_string();
    }

    pub fn set_version(&mut self, version: &str) {
        self.lexicon_mut().version = version.to_string();
    }

    pub fn set_email(&mut self, email: &str) {
        self.lexicon_mut().email = email.to_string();
    }

    pub fn set_license(&mut self, license: &str) {
        self.lexicon_mut().license = license.to_string();
    }

    pub fn set_url(&mut self, url: &str) {
        self.lexicon_mut().url = url.to_string();
    }

    pub fn set_citation(&mut self, citation: &str) {
        self.lexicon_mut().citation = citation.to_string();
    }

    pub fn update_metadata(&mut self, update: MetadataUpdate) {
        let lexicon = self.lexicon_mut();
        if let Some(version) = update.version {
            lexicon.version = version;
        }
        if let Some(label) = update.label {
            lexicon.label = label;
        }
        if let Some(email) = update.email {
            lexicon.email = email;
        }
        if let Some(license) = update.license {
            lexicon.license = license;
        }
        if let Some(url) = update.url {
            lexicon.url = url;
        }
        if let Some(citation) = update.citation {
            lexicon.citation = citation;
        }
    }

    pub fn metadata(&self) -> LexiconMetadata {
        let lexicon = self.lexicon();
        LexiconMetadata {
            id: lexicon.id.clone(),
            label: lexicon.label.clone(),
            language: lexicon.language.clone(),
            version: lexicon.version.clone(),
            email: lexicon.email.clone(),
            license: lexicon.license.clone(),
            url: lexicon.url.clone(),
            citation: lexicon.citation.clone(),
        }
    }

    /// Changes the WN-LMF version the document is written as.
    ///
    /// Going below 1.1 drops what older versions cannot express (see
    /// [`Lexicon::conform_to_lmf`]); coming up to 1.1 fills synset `members`
    /// from the index.
    pub fn set_lmf_version(&mut self, version: &str) -> Result<()> {
        if version.trim().is_empty() {
            return Err(WnEditError::InvalidArgument(
                "LMF version tag must not be empty".to_string(),
            ));
        }
        let had_members = vocab::lmf_version_at_least(&self.resource.lmf_version, (1, 1));
        let has_members = vocab::lmf_version_at_least(version, (1, 1));
        self.resource.lmf_version = version.to_string();

        let lexicon = &mut self.resource.lexicons[0];
        if !has_members {
            lexicon.conform_to_lmf(version);
        } else if !had_members {
            for synset in &mut lexicon.synsets {
                synset.members = self.index.senses_of_synset(&synset.id).to_vec();
            }
        }
        Ok(())
    }

    // --- Synsets ---

    /// Creates a synset and adds its words, creating entries as needed.
    pub fn create_synset(&mut self, new: NewSynset) -> Result<&Synset> {
        if let Some(word) = new.words.iter().find(|w| w.trim().is_empty()) {
            return Err(WnEditError::InvalidArgument(format!(
                "Invalid word: '{}'",
                word
            )));
        }
        let id = match new.id {
            Some(id) if self.index.contains_id(&id) => {
                return Err(WnEditError::InvalidArgument(format!(
                    "Identifier already in use: {}",
                    id
                )));
            }
            Some(id) => id,
            None => self.generate_id("synset", new.pos.as_str()),
        };

        let mut synset = Synset::new(&id, new.pos);
        synset.ili = new.ili.unwrap_or_default();
        synset.definitions = new.definitions.iter().map(|d| Definition::new(d)).collect();
        synset.examples = new.examples.iter().map(|e| Example::new(e)).collect();

        let lexicon = &mut self.resource.lexicons[0];
        let position = lexicon.synsets.len();
        lexicon.synsets.push(synset);
        self.index.insert_synset(&id, position);
        debug!("Created synset {}", id);

        for word in &new.words {
            self.add_word_to_synset(&id, word, Some(new.pos))?;
        }
        Ok(&self.resource.lexicons[0].synsets[position])
    }

    pub fn modify_synset(&mut self, id: &str, update: SynsetUpdate) -> Result<&Synset> {
        let position = self.synset_position(id)?;
        let synset = &mut self.resource.lexicons[0].synsets[position];
        if let Some(definition) = update.definition {
            synset.definitions = vec![Definition::new(&definition)];
        }
        synset
            .definitions
            .extend(update.add_definitions.iter().map(|d| Definition::new(d)));
        synset
            .examples
            .extend(update.add_examples.iter().map(|e| Example::new(e)));
        if let Some(ili) = update.ili {
            synset.ili = ili;
        }
        debug!("Modified synset {}", id);
        Ok(&*synset)
    }

    /// Removes a synset, the senses pointing at it, and any entry those
    /// senses leave empty.
    ///
    /// Relations elsewhere that target the synset are kept.
    pub fn remove_synset(&mut self, id: &str) -> Result<()> {
        let position = self.synset_position(id)?;
        let lexicon = &mut self.resource.lexicons[0];
        lexicon.synsets.remove(position);
        let sense_ids = self.index.remove_synset(id);
        self.index.reposition_synsets(lexicon, position);

        let mut touched: Vec<usize> = Vec::new();
        for sense_id in &sense_ids {
            let Some(location) = self.index.remove_sense(sense_id) else {
                continue;
            };
            let Some(entry_position) = self.index.entry_position(&location.entry) else {
                continue;
            };
            lexicon.entries[entry_position]
                .senses
                .retain(|sense| &sense.id != sense_id);
            if !touched.contains(&entry_position) {
                touched.push(entry_position);
            }
        }
        strip_frame_senses(lexicon, &sense_ids.iter().map(String::as_str).collect());

        let mut emptied: Vec<usize> = touched
            .into_iter()
            .filter(|&p| lexicon.entries[p].senses.is_empty())
            .collect();
        emptied.sort_unstable();
        for &entry_position in emptied.iter().rev() {
            let entry = lexicon.entries.remove(entry_position);
            self.index.remove_entry(&entry);
        }
        if let Some(&first) = emptied.first() {
            self.index.reposition_entries(&lexicon.entries, first);
        }

        debug!(
            "Removed synset {} with {} sense(s); pruned {} entr(ies)",
            id,
            sense_ids.len(),
            emptied.len()
        );
        Ok(())
    }

    /// Appends a synset relation. Unknown relation types are written anyway;
    /// when `validate` is set the mismatch comes back as an advisory.
    pub fn add_synset_relation(
        &mut self,
        source_id: &str,
        target_id: &str,
        rel_type: &str,
        validate: bool,
    ) -> Result<Option<Advisory>> {
        let position = self.synset_position(source_id)?;
        self.resource.lexicons[0].synsets[position]
            .relations
            .push(Relation::new(target_id, rel_type));
        debug!("Added synset relation {} -{}-> {}", source_id, rel_type, target_id);
        Ok(self.advise(validate, RelationScope::Synset, source_id, rel_type))
    }

    // --- Entries & Senses ---

    /// Creates an entry with `lemma` as its lemma and `forms` as alternates.
    pub fn create_entry(
        &mut self,
        lemma: &str,
        pos: PartOfSpeech,
        forms: &[&str],
    ) -> Result<&LexicalEntry> {
        if lemma.trim().is_empty() {
            return Err(WnEditError::InvalidArgument(
                "Lemma must not be empty".to_string(),
            ));
        }
        let id = self.generate_id(&lemma.replace(' ', "_"), pos.as_str());
        let mut entry = LexicalEntry::new(&id, Lemma::new(lemma, pos));
        entry.forms = forms.iter().map(|f| Form::new(f)).collect();

        let lexicon = &mut self.resource.lexicons[0];
        let position = lexicon.entries.len();
        self.index.insert_entry(&entry, position);
        lexicon.entries.push(entry);
        debug!("Created entry {}", id);
        Ok(&lexicon.entries[position])
    }

    /// Links `lemma` to a synset, reusing an entry with the same lemma and
    /// part of speech when there is one. Calling it again is a no-op.
    ///
    /// The part of speech defaults to the synset's.
    pub fn add_word_to_synset(
        &mut self,
        synset_id: &str,
        lemma: &str,
        pos: Option<PartOfSpeech>,
    ) -> Result<&LexicalEntry> {
        let synset_position = self.synset_position(synset_id)?;
        let pos = pos.unwrap_or(self.lexicon().synsets[synset_position].part_of_speech);

        let existing = self
            .find_entries(lemma, Some(pos))
            .first()
            .map(|entry| entry.id.clone());
        let entry_id = match existing {
            Some(id) => id,
            None => self.create_entry(lemma, pos, &[])?.id.clone(),
        };
        let entry_position = self.index.entry_position(&entry_id).ok_or_else(|| {
            WnEditError::Internal(format!("Entry {} missing from index", entry_id))
        })?;

        let with_members = vocab::lmf_version_at_least(&self.resource.lmf_version, (1, 1));
        let lexicon = &mut self.resource.lexicons[0];
        let entry = &mut lexicon.entries[entry_position];
        if !entry.senses.iter().any(|sense| sense.synset == synset_id) {
            let sense_id = format!("{}-{}", entry_id, synset_id);
            if self.index.contains_id(&sense_id) {
                return Err(WnEditError::InvalidArgument(format!(
                    "Identifier already in use: {}",
                    sense_id
                )));
            }
            entry.senses.push(Sense::new(&sense_id, synset_id));
            self.index.insert_sense(&sense_id, &entry_id, synset_id);
            if with_members {
                lexicon.synsets[synset_position].members.push(sense_id.clone());
            }
            debug!("Added sense {}", sense_id);
        }
        Ok(&lexicon.entries[entry_position])
    }

    /// Removes an entry and its senses. Synsets are kept even if this leaves
    /// them without members.
    pub fn remove_entry(&mut self, id: &str) -> Result<()> {
        let position = self
            .index
            .entry_position(id)
            .ok_or_else(|| WnEditError::LexicalEntryNotFound(id.to_string()))?;
        let lexicon = &mut self.resource.lexicons[0];
        let entry = lexicon.entries.remove(position);
        self.index.remove_entry(&entry);
        self.index.reposition_entries(&lexicon.entries, position);

        for sense in &entry.senses {
            if let Some(synset_position) = self.index.synset_position(&sense.synset) {
                lexicon.synsets[synset_position]
                    .members
                    .retain(|member| member != &sense.id);
            }
        }
        strip_frame_senses(lexicon, &entry.senses.iter().map(|s| s.id.as_str()).collect());
        debug!("Removed entry {} with {} sense(s)", id, entry.senses.len());
        Ok(())
    }

    pub fn add_sense_relation(
        &mut self,
        source_sense_id: &str,
        target_id: &str,
        rel_type: &str,
        validate: bool,
    ) -> Result<Option<Advisory>> {
        let not_found = || WnEditError::SenseNotFound(source_sense_id.to_string());
        let location = self.index.sense_location(source_sense_id).ok_or_else(not_found)?;
        let entry_position = self.index.entry_position(&location.entry).ok_or_else(not_found)?;
        let sense = self.resource.lexicons[0].entries[entry_position]
            .senses
            .iter_mut()
            .find(|sense| sense.id == source_sense_id)
            .ok_or_else(not_found)?;
        sense.relations.push(Relation::new(target_id, rel_type));
        debug!(
            "Added sense relation {} -{}-> {}",
            source_sense_id, rel_type, target_id
        );
        Ok(self.advise(validate, RelationScope::Sense, source_sense_id, rel_type))
    }

    // --- Output ---

    /// Writes the document as WN-LMF; a `.gz` extension compresses it.
    pub fn export(&self, path: &Path) -> Result<()> {
        info!("Exporting {} to {:?}", self.lexicon().specifier(), path);
        lmf::dump_file(&self.resource, path)
    }

    /// Hands the whole document to `sink` for ingestion.
    pub fn commit<S: ResourceSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        info!("Committing {}", self.lexicon().specifier());
        sink.add_lexical_resource(&self.resource)
    }

    // --- Helpers ---

    fn synset_position(&self, id: &str) -> Result<usize> {
        self.index
            .synset_position(id)
            .ok_or_else(|| WnEditError::SynsetNotFound(id.to_string()))
    }

    fn advise(
        &self,
        requested: bool,
        scope: RelationScope,
        source: &str,
        rel_type: &str,
    ) -> Option<Advisory> {
        if requested && self.capabilities.validation {
            vocab::check_relation(scope, source, rel_type)
        } else {
            None
        }
    }

    /// `{lexicon}-{prefix}-{8 hex digits}[-{suffix}]`, unique in the document.
    fn generate_id(&self, prefix: &str, suffix: &str) -> String {
        loop {
            let unique = format!("{:08x}", rand::random::<u32>());
            let mut parts = vec![self.lexicon().id.as_str(), prefix, unique.as_str()];
            if !suffix.is_empty() {
                parts.push(suffix);
            }
            let id = parts.join("-");
            if !self.index.contains_id(&id) {
                return id;
            }
        }
    }
}

fn strip_frame_senses(lexicon: &mut Lexicon, removed: &HashSet<&str>) {
    for frame in &mut lexicon.frames {
        frame.senses.retain(|id| !removed.contains(id.as_str()));
    }
}

impl fmt::Display for WordnetEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        write!(
            f,
            "WordnetEditor(lexicon='{}', synsets={}, entries={})",
            self.lexicon().id,
            stats.synsets,
            stats.entries
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> WordnetEditor {
        WordnetEditor::create_new(NewLexicon::new("L"), Capabilities::default()).unwrap()
    }

    struct Collected(Vec<LexicalResource>);

    impl ResourceSink for Collected {
        fn add_lexical_resource(&mut self, resource: &LexicalResource) -> Result<()> {
            self.0.push(resource.clone());
            Ok(())
        }
    }

    #[test]
    fn test_create_new_defaults() {
        let editor = editor();
        let metadata = editor.metadata();
        assert_eq!(metadata.id, "L");
        assert_eq!(metadata.label, "L");
        assert_eq!(metadata.language, "en");
        assert_eq!(metadata.email, "user@example.com");
        assert_eq!(metadata.version, "1.0");
        assert_eq!(metadata.url, "");
        assert_eq!(editor.resource().lmf_version, "1.4");
        assert_eq!(editor.stats(), Stats::default());
        assert_eq!(
            editor.to_string(),
            "WordnetEditor(lexicon='L', synsets=0, entries=0)"
        );

        assert!(WordnetEditor::create_new(NewLexicon::new(""), Capabilities::default()).is_err());
    }

    #[test]
    fn test_create_then_remove_synset_stats() {
        let mut editor = editor();
        let synset = editor
            .create_synset(
                NewSynset::new(PartOfSpeech::N)
                    .definition("A domesticated canine")
                    .word("dog")
                    .word("hound"),
            )
            .unwrap();
        let id = synset.id.clone();
        assert!(id.starts_with("L-synset-"));
        assert!(id.ends_with("-n"));
        assert_eq!(synset.ili, "");
        assert_eq!(synset.members.len(), 2);
        assert_eq!(
            editor.stats(),
            Stats {
                synsets: 1,
                entries: 2,
                senses: 2
            }
        );
        let senses = editor.senses_for_synset(&id);
        assert_eq!(senses.len(), 2);
        let hound = editor.get_sense_entry(&senses[1].id).unwrap();
        assert_eq!(hound.lemma.written_form, "hound");

        editor.remove_synset(&id).unwrap();
        assert_eq!(editor.stats(), Stats::default());
        assert!(editor.find_entries("dog", None).is_empty());
        assert!(editor.get_synset(&id).is_none());
    }

    #[test]
    fn test_find_entries_with_pos_filter() {
        let mut editor = editor();
        editor.create_entry("dog", PartOfSpeech::N, &[]).unwrap();
        let verb_id = editor
            .create_entry("dog", PartOfSpeech::V, &[])
            .unwrap()
            .id
            .clone();
        assert!(verb_id.starts_with("L-dog-"));
        assert!(verb_id.ends_with("-v"));

        assert_eq!(editor.find_entries("dog", None).len(), 2);
        let nouns = editor.find_entries("dog", Some(PartOfSpeech::N));
        assert_eq!(nouns.len(), 1);
        assert_eq!(nouns[0].lemma.part_of_speech, PartOfSpeech::N);
        assert!(editor.find_entries("cat", None).is_empty());
    }

    #[test]
    fn test_entry_with_spaces_and_forms() {
        let mut editor = editor();
        let entry = editor
            .create_entry("hot dog", PartOfSpeech::N, &["hot-dog"])
            .unwrap();
        assert!(entry.id.starts_with("L-hot_dog-"));
        assert_eq!(entry.lemma.written_form, "hot dog");
        assert_eq!(entry.forms[0].written_form, "hot-dog");
        assert!(entry.senses.is_empty());
        assert!(editor.create_entry(" ", PartOfSpeech::N, &[]).is_err());
    }

    #[test]
    fn test_add_synset_relation() {
        let mut editor = editor();
        let animal = editor
            .create_synset(NewSynset::new(PartOfSpeech::N).definition("A living organism"))
            .unwrap()
            .id
            .clone();
        let dog = editor
            .create_synset(NewSynset::new(PartOfSpeech::N).word("dog"))
            .unwrap()
            .id
            .clone();

        let advisory = editor
            .add_synset_relation(&dog, &animal, "hypernym", true)
            .unwrap();
        assert!(advisory.is_none());

        let relations = &editor.get_synset(&dog).unwrap().relations;
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].target, animal);
        assert_eq!(relations[0].rel_type, "hypernym");
    }

    #[test]
    fn test_unknown_relation_is_advisory() {
        let mut editor = editor();
        let a = editor
            .create_synset(NewSynset::new(PartOfSpeech::N).word("cat"))
            .unwrap()
            .id
            .clone();
        let b = editor
            .create_synset(NewSynset::new(PartOfSpeech::N))
            .unwrap()
            .id
            .clone();

        let advisory = editor.add_synset_relation(&a, &b, "pertainym", true).unwrap();
        assert_eq!(advisory.unwrap().rel_type, "pertainym");
        assert!(editor.add_synset_relation(&a, &b, "pertainym", false).unwrap().is_none());
        assert_eq!(editor.get_synset(&a).unwrap().relations.len(), 2);

        let sense_id = editor.senses_for_synset(&a)[0].id.clone();
        assert!(editor.add_sense_relation(&sense_id, &b, "hypernym", true).unwrap().is_some());
        assert!(editor.add_sense_relation(&sense_id, &b, "domain_topic", true).unwrap().is_none());
        assert_eq!(editor.get_sense(&sense_id).unwrap().relations.len(), 2);

        let mut quiet = WordnetEditor::create_new(
            NewLexicon::new("Q"),
            Capabilities { validation: false },
        )
        .unwrap();
        let s = quiet.create_synset(NewSynset::new(PartOfSpeech::N)).unwrap().id.clone();
        assert!(quiet.add_synset_relation(&s, &s, "pertainym", true).unwrap().is_none());
    }

    #[test]
    fn test_add_word_is_idempotent() {
        let mut editor = editor();
        let id = editor
            .create_synset(NewSynset::new(PartOfSpeech::N))
            .unwrap()
            .id
            .clone();

        let entry_id = editor.add_word_to_synset(&id, "dog", None).unwrap().id.clone();
        let again = editor.add_word_to_synset(&id, "dog", None).unwrap();
        assert_eq!(again.id, entry_id);
        assert_eq!(again.senses.len(), 1);
        assert_eq!(again.senses[0].id, format!("{}-{}", entry_id, id));
        assert_eq!(editor.stats().senses, 1);
        assert_eq!(editor.get_synset(&id).unwrap().members.len(), 1);
    }

    #[test]
    fn test_shared_form_survives_removal() {
        let mut editor = editor();
        let cat = editor
            .create_synset(NewSynset::new(PartOfSpeech::N).word("cat"))
            .unwrap()
            .id
            .clone();
        let pet = editor
            .create_synset(NewSynset::new(PartOfSpeech::N).word("cat").word("dog"))
            .unwrap()
            .id
            .clone();
        assert_eq!(editor.find_entries("cat", None).len(), 1);
        assert_eq!(editor.stats().senses, 3);

        editor.remove_synset(&pet).unwrap();
        let cats = editor.find_entries("cat", None);
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].senses.len(), 1);
        assert_eq!(cats[0].senses[0].synset, cat);
        assert!(editor.find_entries("dog", None).is_empty());
        assert_eq!(
            editor.stats(),
            Stats {
                synsets: 1,
                entries: 1,
                senses: 1
            }
        );
    }

    #[test]
    fn test_create_then_remove_restores_document() {
        let mut editor = editor();
        editor
            .create_synset(
                NewSynset::new(PartOfSpeech::N)
                    .definition("A small feline")
                    .word("cat")
                    .word("kitty"),
            )
            .unwrap();
        editor.create_entry("lonely", PartOfSpeech::A, &[]).unwrap();
        let before = lmf::dump(editor.resource()).unwrap();

        let id = editor
            .create_synset(
                NewSynset::new(PartOfSpeech::N)
                    .definition("A pet")
                    .example("the cat sat")
                    .word("cat")
                    .word("pet"),
            )
            .unwrap()
            .id
            .clone();
        assert_ne!(lmf::dump(editor.resource()).unwrap(), before);

        editor.remove_synset(&id).unwrap();
        assert_eq!(lmf::dump(editor.resource()).unwrap(), before);
        // Already sense-less entries are not pruned.
        assert_eq!(editor.find_entries("lonely", None).len(), 1);
    }

    #[test]
    fn test_positions_stay_valid_after_removals() {
        let mut editor = editor();
        let ids: Vec<String> = ["a", "b", "c"]
            .iter()
            .map(|w| {
                editor
                    .create_synset(NewSynset::new(PartOfSpeech::N).word(w))
                    .unwrap()
                    .id
                    .clone()
            })
            .collect();
        editor.remove_synset(&ids[0]).unwrap();

        assert_eq!(editor.get_synset(&ids[2]).unwrap().id, ids[2]);
        let c = editor.find_entries("c", None)[0].id.clone();
        assert_eq!(editor.get_entry(&c).unwrap().lemma.written_form, "c");

        editor.remove_entry(&c).unwrap();
        let b = editor.find_entries("b", None)[0].id.clone();
        assert_eq!(editor.get_entry(&b).unwrap().lemma.written_form, "b");
        assert!(editor.get_synset(&ids[2]).unwrap().members.is_empty());
        assert!(editor.senses_for_synset(&ids[2]).is_empty());
    }

    #[test]
    fn test_modify_synset() {
        let mut editor = editor();
        let id = editor
            .create_synset(NewSynset::new(PartOfSpeech::V).definition("old"))
            .unwrap()
            .id
            .clone();

        let synset = editor
            .modify_synset(
                &id,
                SynsetUpdate {
                    definition: Some("new".to_string()),
                    add_definitions: vec!["extra".to_string()],
                    add_examples: vec!["they ran".to_string()],
                    ili: Some("i12345".to_string()),
                },
            )
            .unwrap();
        let texts: Vec<&str> = synset.definitions.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["new", "extra"]);
        assert_eq!(synset.examples[0].text, "they ran");
        assert_eq!(synset.ili, "i12345");

        let synset = editor.modify_synset(&id, SynsetUpdate::default()).unwrap();
        assert_eq!(synset.definitions.len(), 2);
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let mut editor = editor();
        assert!(editor.modify_synset("nope", SynsetUpdate::default()).unwrap_err().is_not_found());
        assert!(editor.remove_synset("nope").unwrap_err().is_not_found());
        assert!(editor.add_synset_relation("nope", "x", "hypernym", true).unwrap_err().is_not_found());
        assert!(editor.add_word_to_synset("nope", "dog", None).unwrap_err().is_not_found());
        assert!(editor.remove_entry("nope").unwrap_err().is_not_found());
        assert!(matches!(
            editor.add_sense_relation("nope", "x", "antonym", true),
            Err(WnEditError::SenseNotFound(_))
        ));
        assert_eq!(editor.stats(), Stats::default());
    }

    #[test]
    fn test_custom_synset_id() {
        let mut editor = editor();
        editor
            .create_synset(NewSynset::new(PartOfSpeech::N).with_id("L-0001-n"))
            .unwrap();
        assert!(editor.get_synset("L-0001-n").is_some());
        assert!(matches!(
            editor.create_synset(NewSynset::new(PartOfSpeech::N).with_id("L-0001-n")),
            Err(WnEditError::InvalidArgument(_))
        ));
        assert!(editor
            .create_synset(NewSynset::new(PartOfSpeech::N).word(""))
            .is_err());
        assert_eq!(editor.stats().synsets, 1);
    }

    #[test]
    fn test_update_metadata() {
        let mut editor = editor();
        editor.update_metadata(MetadataUpdate {
            version: Some("1.1".to_string()),
            label: Some("My WordNet (Extended)".to_string()),
            ..Default::default()
        });
        editor.set_url("https://example.com");
        editor.set_citation("Someone, 2024");
        editor.set_email("me@example.com");
        editor.set_license("https://example.com/license");
        editor.set_id("L2").unwrap();
        assert!(editor.set_id("").is_err());

        let metadata = editor.metadata();
        assert_eq!(metadata.id, "L2");
        assert_eq!(metadata.version, "1.1");
        assert_eq!(metadata.label, "My WordNet (Extended)");
        assert_eq!(metadata.url, "https://example.com");
        assert_eq!(metadata.citation, "Someone, 2024");
        assert_eq!(metadata.email, "me@example.com");
        assert_eq!(metadata.language, "en");

        editor.set_label("Plain");
        editor.set_version("2.0");
        assert_eq!(editor.lexicon().specifier(), "L2:2.0");
    }

    #[test]
    fn test_members_follow_lmf_version() {
        let mut editor = editor();
        let id = editor
            .create_synset(NewSynset::new(PartOfSpeech::N).word("dog"))
            .unwrap()
            .id
            .clone();
        editor.set_lmf_version("1.0").unwrap();
        assert!(editor.get_synset(&id).unwrap().members.is_empty());

        editor.add_word_to_synset(&id, "hound", None).unwrap();
        assert!(editor.get_synset(&id).unwrap().members.is_empty());

        editor.set_lmf_version("1.3").unwrap();
        assert_eq!(editor.get_synset(&id).unwrap().members.len(), 2);
        assert!(editor.set_lmf_version("").is_err());
    }

    #[test]
    fn test_export_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");
        let mut editor = editor();
        editor
            .create_synset(
                NewSynset::new(PartOfSpeech::N)
                    .definition("A domesticated canine")
                    .word("dog"),
            )
            .unwrap();
        editor.export(&path).unwrap();

        let loaded = WordnetEditor::load_from_file(&path, Capabilities::default()).unwrap();
        assert_eq!(loaded.resource(), editor.resource());
        assert_eq!(loaded.stats(), editor.stats());
        assert_eq!(loaded.find_entries("dog", None).len(), 1);

        let empty = dir.path().join("empty.xml");
        std::fs::write(&empty, "<LexicalResource></LexicalResource>").unwrap();
        assert!(matches!(
            WordnetEditor::load_from_file(&empty, Capabilities::default()),
            Err(WnEditError::InvalidArgument(_))
        ));
        assert!(WordnetEditor::load_from_file(&dir.path().join("missing.xml"), Capabilities::default()).is_err());
    }

    #[test]
    fn test_commit_hands_over_resource() {
        let mut editor = editor();
        editor
            .create_synset(NewSynset::new(PartOfSpeech::N).word("dog"))
            .unwrap();
        let mut sink = Collected(Vec::new());
        editor.commit(&mut sink).unwrap();
        assert_eq!(sink.0.len(), 1);
        assert_eq!(&sink.0[0], editor.resource());
    }

    #[test]
    fn test_replace_resource_rebuilds_index() {
        let mut editor = editor();
        let mut other = WordnetEditor::create_new(NewLexicon::new("M"), Capabilities::default()).unwrap();
        other
            .create_synset(NewSynset::new(PartOfSpeech::R).word("quickly"))
            .unwrap();

        editor.replace_resource(other.resource().clone()).unwrap();
        assert_eq!(editor.lexicon().id, "M");
        assert_eq!(editor.find_entries("quickly", Some(PartOfSpeech::R)).len(), 1);
        assert!(editor.replace_resource(LexicalResource::default()).is_err());
    }
}
