//! WN-LMF XML reading and writing.

use crate::error::{Result, WnEditError};
use crate::models::{LexicalResource, Lexicon};
use crate::vocab::{self, DEFAULT_LMF_VERSION};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::debug;
use quick_xml::de::from_str;
use quick_xml::se::Serializer;
use serde::Serialize;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Root element wrapper; carries the namespace declaration on output.
#[derive(Serialize)]
struct LmfDocument<'a> {
    #[serde(rename = "@xmlns:dc")]
    dc: &'static str,
    #[serde(rename = "Lexicon")]
    lexicons: &'a [Lexicon],
}

/// Parses WN-LMF XML content into a LexicalResource.
///
/// The version tag comes from the DOCTYPE system id (`WN-LMF-1.3.dtd`) and
/// defaults to `1.0` when absent.
pub fn parse(xml_content: &str) -> Result<LexicalResource> {
    debug!("Starting WN-LMF XML parsing...");
    let mut resource: LexicalResource = from_str(xml_content)?;
    resource.lmf_version = detect_version(xml_content).unwrap_or_else(|| "1.0".to_string());
    debug!(
        "Parsed WN-LMF {} document with {} lexicon(s).",
        resource.lmf_version,
        resource.lexicons.len()
    );
    Ok(resource)
}

fn detect_version(xml_content: &str) -> Option<String> {
    let prolog_end = xml_content.find("<LexicalResource").unwrap_or(xml_content.len());
    let prolog = &xml_content[..prolog_end];
    let start = prolog.find("WN-LMF-")? + "WN-LMF-".len();
    let rest = &prolog[start..];
    let version = &rest[..rest.find(".dtd")?];
    if version.is_empty() || !version.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    Some(version.to_string())
}

/// Reads a WN-LMF file, plain or gzip-compressed.
pub fn load_file(path: &Path) -> Result<LexicalResource> {
    debug!("Reading WN-LMF file: {:?}", path);
    let bytes = fs::read(path)?;
    let xml_content = if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = String::new();
        GzDecoder::new(bytes.as_slice()).read_to_string(&mut decoded)?;
        decoded
    } else {
        String::from_utf8(bytes).map_err(|e| {
            WnEditError::InvalidArgument(format!("{:?} is not valid UTF-8: {}", path, e))
        })?
    };
    parse(&xml_content)
}

/// Serializes a resource to WN-LMF XML text.
pub fn dump(resource: &LexicalResource) -> Result<String> {
    let version = if resource.lmf_version.is_empty() {
        DEFAULT_LMF_VERSION
    } else {
        resource.lmf_version.as_str()
    };

    let conformed: Vec<Lexicon>;
    let lexicons = if vocab::lmf_version_at_least(version, (1, 1)) {
        resource.lexicons.as_slice()
    } else {
        conformed = resource
            .lexicons
            .iter()
            .cloned()
            .map(|mut lexicon| {
                lexicon.conform_to_lmf(version);
                lexicon
            })
            .collect();
        conformed.as_slice()
    };

    let mut body = String::new();
    let mut serializer = Serializer::with_root(&mut body, Some("LexicalResource"))
        .map_err(|e| WnEditError::XmlWrite(e.to_string()))?;
    serializer.indent(' ', 2);
    LmfDocument {
        dc: DC_NAMESPACE,
        lexicons,
    }
    .serialize(serializer)
    .map_err(|e| WnEditError::XmlWrite(e.to_string()))?;

    let mut xml = String::with_capacity(body.len() + 200);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<!DOCTYPE LexicalResource SYSTEM \"http://globalwordnet.github.io/schemas/WN-LMF-{}.dtd\">\n",
        version
    ));
    xml.push_str(&body);
    xml.push('\n');
    Ok(xml)
}

/// Writes a resource to `path`; a `.gz` extension selects gzip compression.
pub fn dump_file(resource: &LexicalResource, path: &Path) -> Result<()> {
    let xml = dump(resource)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        let file = fs::File::create(path)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(xml.as_bytes())?;
        encoder.finish()?;
    } else {
        fs::write(path, xml)?;
    }
    debug!("Wrote WN-LMF file: {:?}", path);
    Ok(())
}
