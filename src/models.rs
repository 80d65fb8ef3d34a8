use crate::error::{Result, WnEditError};
use crate::vocab;
use serde::{Deserialize, Serialize};

// Field order matters for serialization: attributes (`@...`) come first,
// then child elements in WN-LMF DTD order.

// --- Top Level ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexicalResource {
    /// WN-LMF version tag, taken from the DOCTYPE on load and written back on dump.
    #[serde(skip)]
    pub lmf_version: String,
    #[serde(rename = "Lexicon", default)]
    pub lexicons: Vec<Lexicon>,
}

impl LexicalResource {
    pub fn new(lmf_version: &str, lexicons: Vec<Lexicon>) -> Result<Self> {
        if lmf_version.trim().is_empty() {
            return Err(WnEditError::InvalidArgument(
                "LMF version tag must not be empty".to_string(),
            ));
        }
        Ok(LexicalResource {
            lmf_version: lmf_version.to_string(),
            lexicons,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@label", default)]
    pub label: String,
    #[serde(rename = "@language", default)]
    pub language: String,
    #[serde(rename = "@email", default)]
    pub email: String,
    #[serde(rename = "@license", default)]
    pub license: String,
    #[serde(rename = "@version", default)]
    pub version: String,
    #[serde(rename = "@url", default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(rename = "@citation", default, skip_serializing_if = "String::is_empty")]
    pub citation: String,
    #[serde(rename = "@logo", default, skip_serializing_if = "String::is_empty")]
    pub logo: String,

    #[serde(rename = "Requires", default)]
    pub requires: Vec<Dependency>,
    #[serde(rename = "LexicalEntry", default)]
    pub entries: Vec<LexicalEntry>,
    #[serde(rename = "Synset", default)]
    pub synsets: Vec<Synset>,
    #[serde(rename = "SyntacticBehaviour", default)]
    pub frames: Vec<SyntacticBehaviour>,
}

impl Lexicon {
    pub fn new(
        id: &str,
        label: &str,
        language: &str,
        email: &str,
        license: &str,
        version: &str,
    ) -> Result<Self> {
        if id.trim().is_empty() {
            return Err(WnEditError::InvalidArgument(
                "Lexicon id must not be empty".to_string(),
            ));
        }
        Ok(Lexicon {
            id: id.to_string(),
            label: label.to_string(),
            language: language.to_string(),
            email: email.to_string(),
            license: license.to_string(),
            version: version.to_string(),
            ..Default::default()
        })
    }

    /// `id:version` specifier of this lexicon.
    pub fn specifier(&self) -> String {
        format!("{}:{}", self.id, self.version)
    }

    /// Drops what WN-LMF `lmf_version` cannot express.
    ///
    /// Synset members, `Requires`, lexicon-level syntactic behaviours and
    /// sense `subcat` references all arrived in 1.1.
    pub fn conform_to_lmf(&mut self, lmf_version: &str) {
        if vocab::lmf_version_at_least(lmf_version, (1, 1)) {
            return;
        }
        self.requires.clear();
        self.frames.clear();
        for synset in &mut self.synsets {
            synset.members.clear();
        }
        for sense in self.entries.iter_mut().flat_map(|e| e.senses.iter_mut()) {
            sense.subcat.clear();
        }
    }
}

/// A `Requires` declaration: another lexicon this one depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@version", default)]
    pub version: String,
    #[serde(rename = "@url", default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

// --- Lexical Entry ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalEntry {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@index", default, skip_serializing_if = "String::is_empty")]
    pub index: String,
    #[serde(rename = "Lemma")]
    pub lemma: Lemma,
    #[serde(rename = "Form", default)]
    pub forms: Vec<Form>,
    #[serde(rename = "Sense", default)]
    pub senses: Vec<Sense>,
}

impl LexicalEntry {
    pub fn new(id: &str, lemma: Lemma) -> Self {
        LexicalEntry {
            id: id.to_string(),
            index: String::new(),
            lemma,
            forms: Vec::new(),
            senses: Vec::new(),
        }
    }

    /// Lemma followed by the alternate forms.
    pub fn written_forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.lemma.written_form.as_str())
            .chain(self.forms.iter().map(|f| f.written_form.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lemma {
    #[serde(rename = "@writtenForm")]
    pub written_form: String,
    #[serde(rename = "@partOfSpeech")]
    pub part_of_speech: PartOfSpeech,
    #[serde(rename = "@script", default, skip_serializing_if = "String::is_empty")]
    pub script: String,
    #[serde(rename = "Pronunciation", default)]
    pub pronunciations: Vec<Pronunciation>,
    #[serde(rename = "Tag", default)]
    pub tags: Vec<Tag>,
}

impl Lemma {
    pub fn new(written_form: &str, part_of_speech: PartOfSpeech) -> Self {
        Lemma {
            written_form: written_form.to_string(),
            part_of_speech,
            script: String::new(),
            pronunciations: Vec::new(),
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    #[serde(rename = "@id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "@writtenForm")]
    pub written_form: String,
    #[serde(rename = "@script", default, skip_serializing_if = "String::is_empty")]
    pub script: String,
    #[serde(rename = "Pronunciation", default)]
    pub pronunciations: Vec<Pronunciation>,
    #[serde(rename = "Tag", default)]
    pub tags: Vec<Tag>,
}

impl Form {
    pub fn new(written_form: &str) -> Self {
        Form {
            id: String::new(),
            written_form: written_form.to_string(),
            script: String::new(),
            pronunciations: Vec::new(),
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pronunciation {
    #[serde(rename = "@variety", default, skip_serializing_if = "String::is_empty")]
    pub variety: String, // e.g., "en-GB-fonipa"
    #[serde(rename = "@notation", default, skip_serializing_if = "String::is_empty")]
    pub notation: String,
    #[serde(
        rename = "@phonemic",
        default = "default_true",
        skip_serializing_if = "is_true"
    )]
    pub phonemic: bool,
    #[serde(rename = "@audio", default, skip_serializing_if = "String::is_empty")]
    pub audio: String, // URL
    #[serde(rename = "$text", default)]
    pub text: String, // IPA text
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "@category")]
    pub category: String,
    #[serde(rename = "$text", default)]
    pub text: String,
}

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

// --- Sense ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sense {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@synset")]
    pub synset: String, // Reference to Synset ID
    /// Display-order number; zero means "use document order".
    #[serde(rename = "@n", default, skip_serializing_if = "is_zero")]
    pub n: u32,
    #[serde(
        rename = "@lexicalized",
        default = "default_true",
        skip_serializing_if = "is_true"
    )]
    pub lexicalized: bool,
    #[serde(rename = "@adjposition", default, skip_serializing_if = "Option::is_none")]
    pub adjposition: Option<AdjPosition>,
    #[serde(
        rename = "@subcat",
        with = "space_separated",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub subcat: Vec<String>,
    #[serde(rename = "SenseRelation", default)]
    pub relations: Vec<Relation>,
    #[serde(rename = "Example", default)]
    pub examples: Vec<Example>,
    #[serde(rename = "Count", default)]
    pub counts: Vec<Count>,
}

impl Sense {
    pub fn new(id: &str, synset: &str) -> Self {
        Sense {
            id: id.to_string(),
            synset: synset.to_string(),
            n: 0,
            lexicalized: true,
            adjposition: None,
            subcat: Vec::new(),
            relations: Vec::new(),
            examples: Vec::new(),
            counts: Vec::new(),
        }
    }
}

/// A typed link to another sense or synset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    #[serde(rename = "@target")]
    pub target: String,
    #[serde(rename = "@relType")]
    pub rel_type: String,
}

impl Relation {
    pub fn new(target: &str, rel_type: &str) -> Self {
        Relation {
            target: target.to_string(),
            rel_type: rel_type.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Count {
    #[serde(rename = "$text")]
    pub value: u32,
}

impl Count {
    pub fn new(value: i64) -> Result<Self> {
        Ok(Count {
            value: vocab::validate_count_value(value)?,
        })
    }

    pub fn parse(value: &str) -> Result<Self> {
        Ok(Count {
            value: vocab::validate_count(value)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjPosition {
    A,  // attributive
    Ip, // immediately postnominal
    P,  // predicative
}

impl AdjPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjPosition::A => "a",
            AdjPosition::Ip => "ip",
            AdjPosition::P => "p",
        }
    }
}

impl std::str::FromStr for AdjPosition {
    type Err = WnEditError;
    fn from_str(s: &str) -> Result<Self> {
        vocab::validate_adjposition(s)?;
        Ok(match s {
            "a" => AdjPosition::A,
            "ip" => AdjPosition::Ip,
            _ => AdjPosition::P,
        })
    }
}

// --- Synset ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synset {
    #[serde(rename = "@id")]
    pub id: String,
    /// Interlingual index; empty when unset, never absent.
    #[serde(rename = "@ili", default)]
    pub ili: String,
    #[serde(rename = "@partOfSpeech")]
    pub part_of_speech: PartOfSpeech,
    #[serde(
        rename = "@lexicalized",
        default = "default_true",
        skip_serializing_if = "is_true"
    )]
    pub lexicalized: bool,
    /// Member sense ids, written for WN-LMF 1.1 and later.
    #[serde(
        rename = "@members",
        with = "space_separated",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub members: Vec<String>,
    #[serde(rename = "Definition", default)]
    pub definitions: Vec<Definition>,
    #[serde(rename = "ILIDefinition", default, skip_serializing_if = "Option::is_none")]
    pub ili_definition: Option<IliDefinition>,
    #[serde(rename = "Example", default)]
    pub examples: Vec<Example>,
    #[serde(rename = "SynsetRelation", default)]
    pub relations: Vec<Relation>,
}

impl Synset {
    pub fn new(id: &str, part_of_speech: PartOfSpeech) -> Self {
        Synset {
            id: id.to_string(),
            ili: String::new(),
            part_of_speech,
            lexicalized: true,
            members: Vec::new(),
            definitions: Vec::new(),
            ili_definition: None,
            examples: Vec::new(),
            relations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Definition {
    #[serde(rename = "@language", default, skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(rename = "@sourceSense", default, skip_serializing_if = "String::is_empty")]
    pub source_sense: String,
    #[serde(rename = "$text", default)]
    pub text: String,
}

impl Definition {
    pub fn new(text: &str) -> Self {
        Definition {
            language: String::new(),
            source_sense: String::new(),
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IliDefinition {
    #[serde(rename = "$text", default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Example {
    #[serde(rename = "@language", default, skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(rename = "$text", default)]
    pub text: String,
}

impl Example {
    pub fn new(text: &str) -> Self {
        Example {
            language: String::new(),
            text: text.to_string(),
        }
    }
}

/// A lexicon-level subcategorization frame shared by senses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntacticBehaviour {
    #[serde(rename = "@id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "@subcategorizationFrame")]
    pub frame: String,
    #[serde(
        rename = "@senses",
        with = "space_separated",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub senses: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    N, // Noun
    V, // Verb
    A, // Adjective
    R, // Adverb
    S, // Adjective Satellite
}

impl PartOfSpeech {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartOfSpeech::N => "n",
            PartOfSpeech::V => "v",
            PartOfSpeech::A => "a",
            PartOfSpeech::R => "r",
            PartOfSpeech::S => "s",
        }
    }
}

impl std::fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PartOfSpeech::N => "noun",
                PartOfSpeech::V => "verb",
                PartOfSpeech::A => "adjective",
                PartOfSpeech::R => "adverb",
                PartOfSpeech::S => "adjective satellite",
            }
        )
    }
}

// Only the one-letter codes are accepted; anything else is rejected rather than coerced.
impl std::str::FromStr for PartOfSpeech {
    type Err = WnEditError;
    fn from_str(s: &str) -> Result<Self> {
        vocab::validate_pos(s, "part of speech")?;
        Ok(match s {
            "n" => PartOfSpeech::N,
            "v" => PartOfSpeech::V,
            "a" => PartOfSpeech::A,
            "r" => PartOfSpeech::R,
            _ => PartOfSpeech::S,
        })
    }
}

/// Serde adapter for whitespace-separated id lists stored in one attribute.
mod space_separated {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&items.join(" "))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.split_whitespace().map(String::from).collect())
    }
}
