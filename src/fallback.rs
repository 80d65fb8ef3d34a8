//! Slow, schema-agnostic load path.
//!
//! The store's owner exports the lexicon as WN-LMF into a scratch directory,
//! and the file is parsed back into the same document shape the bulk reader
//! produces.

use crate::error::{Result, WnEditError};
use crate::lmf;
use crate::models::{LexicalResource, Lexicon};
use crate::specifier::Specifier;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

/// Something that can write an installed lexicon out as a WN-LMF file.
pub trait LexiconExporter {
    fn export(&self, specifier: &Specifier, lmf_version: &str, destination: &Path) -> Result<()>;
}

impl<F> LexiconExporter for F
where
    F: Fn(&Specifier, &str, &Path) -> Result<()>,
{
    fn export(&self, specifier: &Specifier, lmf_version: &str, destination: &Path) -> Result<()> {
        self(specifier, lmf_version, destination)
    }
}

/// Loads `specifier` by exporting it to a temporary file and parsing that file.
///
/// The temporary directory is removed on every exit path. The returned
/// resource holds only the requested lexicon.
pub fn load_via_export(
    exporter: &dyn LexiconExporter,
    specifier: &Specifier,
    lmf_version: &str,
) -> Result<LexicalResource> {
    info!("Loading {} through the export fallback...", specifier);
    let start_time = Instant::now();

    let temp_dir = tempfile::Builder::new().prefix("wn-edit-").tempdir()?;
    let dir_path = temp_dir.path().to_path_buf();
    let _cleanup = scopeguard::guard(temp_dir, |dir| {
        let path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            warn!("Failed to remove temporary directory {:?}: {}", path, e);
        }
    });

    let export_path = dir_path.join("export.xml");
    exporter.export(specifier, lmf_version, &export_path)?;
    debug!("Exported {} to {:?}", specifier, export_path);

    // The newest match wins, as on the bulk path; exports list lexicons in
    // installation order.
    let parsed = lmf::load_file(&export_path)?;
    let mut lexicon = parsed
        .lexicons
        .into_iter()
        .rev()
        .find(|lexicon| specifier.matches(&lexicon.id, &lexicon.version))
        .ok_or_else(|| WnEditError::LexiconNotFound(specifier.to_string()))?;
    normalize(&mut lexicon, lmf_version);
    let resource = LexicalResource::new(lmf_version, vec![lexicon])?;

    info!(
        "Fallback load of {} finished in {:.2?}",
        specifier,
        start_time.elapsed()
    );
    Ok(resource)
}

/// Brings a parsed lexicon to the shape the bulk path produces.
fn normalize(lexicon: &mut Lexicon, lmf_version: &str) {
    // Whitespace-only ILI values are treated as unset.
    for synset in &mut lexicon.synsets {
        if synset.ili.trim().is_empty() {
            synset.ili.clear();
        }
    }
    complete_members(lexicon);
    lexicon.conform_to_lmf(lmf_version);
}

/// Orders each synset's members the way the store ranks them: listed members
/// first, then any other sense pointing at the synset in document order.
fn complete_members(lexicon: &mut Lexicon) {
    let mut pointing: HashMap<&str, Vec<&str>> = HashMap::new();
    for sense in lexicon.entries.iter().flat_map(|e| &e.senses) {
        pointing
            .entry(sense.synset.as_str())
            .or_default()
            .push(sense.id.as_str());
    }
    let mut completed: Vec<Vec<String>> = Vec::with_capacity(lexicon.synsets.len());
    for synset in &lexicon.synsets {
        let senses = pointing.get(synset.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        let mut members: Vec<String> = synset
            .members
            .iter()
            .filter(|member| senses.contains(&member.as_str()))
            .cloned()
            .collect();
        for sense_id in senses {
            if !members.iter().any(|member| member == sense_id) {
                members.push(sense_id.to_string());
            }
        }
        completed.push(members);
    }
    for (synset, members) in lexicon.synsets.iter_mut().zip(completed) {
        synset.members = members;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Lemma, LexicalEntry, PartOfSpeech, Sense, Synset};
    use std::cell::RefCell;
    use std::path::PathBuf;

    fn resource_with(ids: &[(&str, &str)]) -> LexicalResource {
        let lexicons = ids
            .iter()
            .map(|(id, version)| {
                let mut lexicon = Lexicon::new(id, id, "en", "a@b.c", "lic", version).unwrap();
                let mut synset = Synset::new(&format!("{}-1-n", id), PartOfSpeech::N);
                synset.ili = " ".to_string();
                lexicon.synsets.push(synset);
                lexicon
            })
            .collect();
        LexicalResource::new("1.4", lexicons).unwrap()
    }

    #[test]
    fn test_load_via_export_cleans_up() {
        let seen_path: RefCell<Option<PathBuf>> = RefCell::new(None);
        let source = resource_with(&[("A", "1.0"), ("B", "2.0")]);
        let exporter = |_: &Specifier, _: &str, destination: &Path| -> Result<()> {
            *seen_path.borrow_mut() = Some(destination.to_path_buf());
            lmf::dump_file(&source, destination)
        };

        let resource = load_via_export(&exporter, &"B".parse().unwrap(), "1.1").unwrap();
        assert_eq!(resource.lmf_version, "1.1");
        assert_eq!(resource.lexicons.len(), 1);
        assert_eq!(resource.lexicons[0].id, "B");
        assert_eq!(resource.lexicons[0].synsets[0].ili, "");

        let path = seen_path.borrow().clone().unwrap();
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());
    }

    #[test]
    fn test_export_failure_still_cleans_up() {
        let seen_dir: RefCell<Option<PathBuf>> = RefCell::new(None);
        let exporter = |_: &Specifier, _: &str, destination: &Path| -> Result<()> {
            *seen_dir.borrow_mut() = destination.parent().map(Path::to_path_buf);
            Err(WnEditError::Internal("export failed".to_string()))
        };

        let err = load_via_export(&exporter, &"A".parse().unwrap(), "1.4").unwrap_err();
        assert!(matches!(err, WnEditError::Internal(_)));
        let dir = seen_dir.borrow().clone().unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_unversioned_specifier_takes_newest_export() {
        let source = resource_with(&[("A", "1.0"), ("A", "2.0")]);
        let exporter =
            |_: &Specifier, _: &str, destination: &Path| lmf::dump_file(&source, destination);
        let resource = load_via_export(&exporter, &"A".parse().unwrap(), "1.4").unwrap();
        assert_eq!(resource.lexicons.len(), 1);
        assert_eq!(resource.lexicons[0].specifier(), "A:2.0");

        let resource = load_via_export(&exporter, &"A:1.0".parse().unwrap(), "1.4").unwrap();
        assert_eq!(resource.lexicons[0].specifier(), "A:1.0");
    }

    #[test]
    fn test_members_follow_requested_lmf_version() {
        let mut source = resource_with(&[("A", "1.0")]);
        let lexicon = &mut source.lexicons[0];
        for (entry_id, lemma) in [("A-dog-n", "dog"), ("A-hound-n", "hound")] {
            let mut entry = LexicalEntry::new(entry_id, Lemma::new(lemma, PartOfSpeech::N));
            entry
                .senses
                .push(Sense::new(&format!("{}-1", entry_id), "A-1-n"));
            lexicon.entries.push(entry);
        }
        lexicon.synsets[0].members = vec!["A-hound-n-1".to_string()];
        let exporter =
            |_: &Specifier, _: &str, destination: &Path| lmf::dump_file(&source, destination);

        let old = load_via_export(&exporter, &"A".parse().unwrap(), "1.0").unwrap();
        assert_eq!(old.lmf_version, "1.0");
        assert!(old.lexicons[0].synsets[0].members.is_empty());

        let new = load_via_export(&exporter, &"A".parse().unwrap(), "1.4").unwrap();
        assert_eq!(
            new.lexicons[0].synsets[0].members,
            vec!["A-hound-n-1".to_string(), "A-dog-n-1".to_string()]
        );
    }

    #[test]
    fn test_missing_lexicon_in_export() {
        let source = resource_with(&[("A", "1.0")]);
        let exporter =
            |_: &Specifier, _: &str, destination: &Path| lmf::dump_file(&source, destination);
        let err = load_via_export(&exporter, &"Z".parse().unwrap(), "1.4").unwrap_err();
        assert!(matches!(err, WnEditError::LexiconNotFound(_)));
    }
}
