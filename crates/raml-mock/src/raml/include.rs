//! `!include` resolution.
//!
//! Replaces every `!include <path>` node with the content of the referenced
//! file, resolved relative to the including document. YAML and RAML files are
//! parsed (and their own includes resolved relative to them), JSON files are
//! parsed as JSON, anything else is included as a string.

use super::error::DocumentLoadError;
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value as YamlValue};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maximum nesting of included files.
const MAX_INCLUDE_DEPTH: usize = 16;

/// Resolve all includes in `value`.
pub fn resolve_includes(
    value: YamlValue,
    base_dir: &Path,
) -> Result<YamlValue, DocumentLoadError> {
    resolve(value, base_dir, 0)
}

fn is_include(tag: &Tag) -> bool {
    tag.to_string().trim_start_matches('!') == "include"
}

fn resolve(
    value: YamlValue,
    base_dir: &Path,
    depth: usize,
) -> Result<YamlValue, DocumentLoadError> {
    match value {
        YamlValue::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            if is_include(&tag) {
                let target = value.as_str().map(str::trim).unwrap_or_default();
                if target.is_empty() {
                    return Err(DocumentLoadError::Include {
                        path: base_dir.to_path_buf(),
                        reason: "!include needs a file path".to_string(),
                    });
                }
                include(base_dir.join(target), depth + 1)
            } else {
                Ok(YamlValue::Tagged(Box::new(TaggedValue {
                    tag,
                    value: resolve(value, base_dir, depth)?,
                })))
            }
        }
        YamlValue::Sequence(items) => items
            .into_iter()
            .map(|item| resolve(item, base_dir, depth))
            .collect::<Result<Vec<_>, _>>()
            .map(YamlValue::Sequence),
        YamlValue::Mapping(mapping) => {
            let mut resolved = Mapping::with_capacity(mapping.len());
            for (key, value) in mapping {
                resolved.insert(key, resolve(value, base_dir, depth)?);
            }
            Ok(YamlValue::Mapping(resolved))
        }
        other => Ok(other),
    }
}

fn include(path: PathBuf, depth: usize) -> Result<YamlValue, DocumentLoadError> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(DocumentLoadError::Include {
            path,
            reason: format!("includes nested deeper than {MAX_INCLUDE_DEPTH} levels"),
        });
    }

    let text = fs::read_to_string(&path).map_err(|source| DocumentLoadError::Io {
        path: path.clone(),
        source,
    })?;
    debug!("Including {}", path.display());

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("raml" | "yaml" | "yml") => {
            let parsed: YamlValue =
                serde_yaml::from_str(&text).map_err(|e| DocumentLoadError::Include {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            resolve(parsed, dir, depth)
        }
        Some("json") => {
            let parsed: serde_json::Value =
                serde_json::from_str(&text).map_err(|e| DocumentLoadError::Include {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            serde_yaml::to_value(parsed).map_err(|e| DocumentLoadError::Include {
                path,
                reason: e.to_string(),
            })
        }
        _ => Ok(YamlValue::String(text)),
    }
}
