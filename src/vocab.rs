//! Closed vocabularies of the WN-LMF format and the validators built on them.

use crate::error::{Result, WnEditError};
use log::warn;
use std::fmt;

/// WN-LMF version written when nothing else is requested.
pub const DEFAULT_LMF_VERSION: &str = "1.4";

/// Placeholder ILI for a synset that proposes a new interlingual concept.
pub const PROPOSED_ILI: &str = "in";

/// Compares a `major.minor` WN-LMF version tag against a minimum.
///
/// Unparseable tags compare as 1.0.
pub fn lmf_version_at_least(version: &str, minimum: (u32, u32)) -> bool {
    let mut parts = version.trim().split('.').map(|p| p.parse::<u32>().ok());
    let major = parts.next().flatten().unwrap_or(1);
    let minor = parts.next().flatten().unwrap_or(0);
    (major, minor) >= minimum
}

pub const PARTS_OF_SPEECH: &[&str] = &["n", "v", "a", "r", "s"];

pub const ADJPOSITIONS: &[&str] = &["a", "ip", "p"];

pub const SYNSET_RELATIONS: &[&str] = &[
    "agent",
    "also",
    "anto_converse",
    "anto_gradable",
    "anto_simple",
    "antonym",
    "attribute",
    "augmentative",
    "be_in_state",
    "causes",
    "classified_by",
    "classifies",
    "co_agent_instrument",
    "co_agent_patient",
    "co_agent_result",
    "co_instrument_agent",
    "co_instrument_patient",
    "co_instrument_result",
    "co_patient_agent",
    "co_patient_instrument",
    "co_result_agent",
    "co_result_instrument",
    "co_role",
    "diminutive",
    "direction",
    "domain_region",
    "domain_topic",
    "entails",
    "eq_synonym",
    "exemplifies",
    "feminine",
    "has_augmentative",
    "has_diminutive",
    "has_domain_region",
    "has_domain_topic",
    "has_feminine",
    "has_masculine",
    "has_young",
    "holo_location",
    "holo_member",
    "holo_part",
    "holo_portion",
    "holo_substance",
    "holonym",
    "hypernym",
    "hyponym",
    "in_manner",
    "instance_hypernym",
    "instance_hyponym",
    "instrument",
    "involved",
    "involved_agent",
    "involved_direction",
    "involved_instrument",
    "involved_location",
    "involved_patient",
    "involved_result",
    "involved_source_direction",
    "involved_target_direction",
    "ir_synonym",
    "is_caused_by",
    "is_entailed_by",
    "is_exemplified_by",
    "is_subevent_of",
    "location",
    "manner_of",
    "masculine",
    "mero_location",
    "mero_member",
    "mero_part",
    "mero_portion",
    "mero_substance",
    "meronym",
    "other",
    "patient",
    "restricted_by",
    "restricts",
    "result",
    "role",
    "similar",
    "source_direction",
    "state_of",
    "subevent",
    "target_direction",
    "young",
];

pub const SENSE_RELATIONS: &[&str] = &[
    "agent",
    "also",
    "anto_converse",
    "anto_gradable",
    "anto_simple",
    "antonym",
    "augmentative",
    "body_part",
    "by_means_of",
    "derivation",
    "destination",
    "diminutive",
    "domain_region",
    "domain_topic",
    "event",
    "exemplifies",
    "feminine",
    "has_augmentative",
    "has_diminutive",
    "has_domain_region",
    "has_domain_topic",
    "has_feminine",
    "has_masculine",
    "has_metaphor",
    "has_metonym",
    "has_young",
    "instrument",
    "is_exemplified_by",
    "location",
    "masculine",
    "material",
    "metaphor",
    "metonym",
    "other",
    "participle",
    "pertainym",
    "property",
    "result",
    "secondary_aspect_ip",
    "secondary_aspect_pi",
    "similar",
    "simple_aspect_ip",
    "simple_aspect_pi",
    "state",
    "undergoer",
    "uses",
    "vehicle",
    "young",
];

/// Relation types a sense may carry towards a synset.
pub const SENSE_SYNSET_RELATIONS: &[&str] = &["domain_region", "domain_topic", "exemplifies", "other"];

/// Checks that `value` is one of the known parts of speech.
///
/// `context` names the field in the error message, e.g. "synset part of speech".
pub fn validate_pos(value: &str, context: &str) -> Result<()> {
    if PARTS_OF_SPEECH.contains(&value) {
        Ok(())
    } else {
        Err(WnEditError::InvalidArgument(format!(
            "Invalid {}: '{}'. Must be one of: {}",
            context,
            value,
            PARTS_OF_SPEECH.join(", ")
        )))
    }
}

pub fn validate_adjposition(value: &str) -> Result<()> {
    if ADJPOSITIONS.contains(&value) {
        Ok(())
    } else {
        Err(WnEditError::InvalidArgument(format!(
            "Invalid adjective position: '{}'. Must be one of: {}",
            value,
            ADJPOSITIONS.join(", ")
        )))
    }
}

/// Parses a sense count given as text. Counts are non-negative integers.
pub fn validate_count(value: &str) -> Result<u32> {
    let parsed: i64 = value.trim().parse().map_err(|_| {
        WnEditError::InvalidArgument(format!("Invalid count '{}': Must be an integer", value))
    })?;
    validate_count_value(parsed)
}

pub fn validate_count_value(value: i64) -> Result<u32> {
    if value < 0 {
        return Err(WnEditError::InvalidArgument(format!(
            "Invalid count {}: Must be non-negative",
            value
        )));
    }
    u32::try_from(value).map_err(|_| {
        WnEditError::InvalidArgument(format!("Invalid count {}: too large", value))
    })
}

/// Which relation vocabulary a relation type is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationScope {
    Synset,
    Sense,
}

impl RelationScope {
    fn vocabulary(self) -> &'static [&'static str] {
        match self {
            RelationScope::Synset => SYNSET_RELATIONS,
            RelationScope::Sense => SENSE_RELATIONS,
        }
    }
}

impl fmt::Display for RelationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationScope::Synset => write!(f, "synset"),
            RelationScope::Sense => write!(f, "sense"),
        }
    }
}

/// Non-fatal notice that a relation type is outside the known vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub scope: RelationScope,
    pub source: String,
    pub rel_type: String,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown {} relation type '{}' on {}",
            self.scope, self.rel_type, self.source
        )
    }
}

/// Returns an advisory (and logs a warning) when `rel_type` is not a known relation.
///
/// Sense relations may also use the sense-to-synset vocabulary.
pub fn check_relation(scope: RelationScope, source: &str, rel_type: &str) -> Option<Advisory> {
    let known = scope.vocabulary().contains(&rel_type)
        || (scope == RelationScope::Sense && SENSE_SYNSET_RELATIONS.contains(&rel_type));
    if known {
        return None;
    }
    let advisory = Advisory {
        scope,
        source: source.to_string(),
        rel_type: rel_type.to_string(),
    };
    warn!("Relation check: {}", advisory);
    Some(advisory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_pos() {
        for pos in PARTS_OF_SPEECH {
            assert!(validate_pos(pos, "part of speech").is_ok());
        }
        let err = validate_pos("x", "part of speech").unwrap_err().to_string();
        assert!(err.contains("Invalid part of speech: 'x'. Must be one of:"));

        let err = validate_pos("invalid", "synset part of speech")
            .unwrap_err()
            .to_string();
        assert!(err.contains("Invalid synset part of speech: 'invalid'"));
    }

    #[test]
    fn test_validate_count() {
        assert_eq!(validate_count("100").unwrap(), 100);
        assert_eq!(validate_count("0").unwrap(), 0);
        assert!(
            validate_count("not a number")
                .unwrap_err()
                .to_string()
                .contains("Must be an integer")
        );
        assert!(
            validate_count_value(-1)
                .unwrap_err()
                .to_string()
                .contains("Must be non-negative")
        );
    }

    #[test]
    fn test_validate_adjposition() {
        assert!(validate_adjposition("ip").is_ok());
        assert!(matches!(
            validate_adjposition("q"),
            Err(WnEditError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_lmf_version_at_least() {
        assert!(lmf_version_at_least("1.4", (1, 1)));
        assert!(lmf_version_at_least("1.1", (1, 1)));
        assert!(!lmf_version_at_least("1.0", (1, 1)));
        assert!(!lmf_version_at_least("garbage", (1, 1)));
        assert!(lmf_version_at_least("2", (1, 1)));
    }

    #[test]
    fn test_check_relation() {
        assert!(check_relation(RelationScope::Synset, "s1", "hypernym").is_none());
        assert!(check_relation(RelationScope::Sense, "s1", "antonym").is_none());
        assert!(check_relation(RelationScope::Sense, "s1", "domain_topic").is_none());

        let advisory = check_relation(RelationScope::Synset, "s1", "pertainym").unwrap();
        assert_eq!(advisory.scope, RelationScope::Synset);
        assert_eq!(advisory.rel_type, "pertainym");
        assert!(check_relation(RelationScope::Sense, "s1", "hypernym").is_some());
    }
}
