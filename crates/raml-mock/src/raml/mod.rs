//! RAML document loading.
//!
//! Reads a RAML 0.8 or 1.0 file into the [`MockDocument`] model: resources
//! are flattened into routes, `!include`s are resolved relative to the
//! including file, and named types are collected for example composition.
//!
//! Only the parts of RAML that affect mock responses are read: media types,
//! the base URI path, resources and methods, responses with their headers and
//! bodies, and type declarations with their examples.

mod convert;
mod document;
mod error;
mod include;
mod types;

pub use convert::{key_to_string, yaml_to_json};
pub use document::FALLBACK_MEDIA_TYPE;
pub use error::DocumentLoadError;

use crate::mock::MockDocument;
use serde_yaml::{Mapping, Value as YamlValue};
use std::fs;
use std::path::Path;
use tracing::info;

/// RAML versions the loader understands.
const SUPPORTED_VERSIONS: &[&str] = &["0.8", "1.0"];

/// Load and parse a RAML file.
pub fn load_file(path: impl AsRef<Path>) -> Result<MockDocument, DocumentLoadError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| DocumentLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let document = parse_str(&source, base_dir)?;
    info!(
        "Loaded RAML document {} ({} routes)",
        path.display(),
        document.routes.len()
    );
    Ok(document)
}

/// Parse RAML source. Includes resolve relative to `base_dir`.
pub fn parse_str(source: &str, base_dir: &Path) -> Result<MockDocument, DocumentLoadError> {
    raml_version(source)?;

    let root: YamlValue = serde_yaml::from_str(source)?;
    let root = match include::resolve_includes(root, base_dir)? {
        YamlValue::Mapping(root) => root,
        YamlValue::Null => Mapping::new(),
        _ => return Err(DocumentLoadError::InvalidRoot),
    };

    document::build(&root)
}

/// Version named in the `#%RAML <version>` header line.
fn raml_version(source: &str) -> Result<&str, DocumentLoadError> {
    let header = source
        .trim_start_matches('\u{feff}')
        .lines()
        .next()
        .unwrap_or_default();
    let rest = header
        .strip_prefix("#%RAML")
        .ok_or(DocumentLoadError::NotRaml)?;
    let version = rest.split_whitespace().next().unwrap_or_default();

    if SUPPORTED_VERSIONS.contains(&version) {
        Ok(version)
    } else {
        Err(DocumentLoadError::UnsupportedVersion(version.to_string()))
    }
}
