//! Config file discovery and loading.
//!
//! Loading runs in this order, and fails before iTerm2 is touched:
//!
//! 1. Read and parse the YAML document
//! 2. Splice `!include <path>` nodes (paths relative to the including file)
//! 3. Merge a stored profile, if one was requested
//! 4. Interpolate `${VAR}` references
//! 5. Deserialize into [`Config`] and validate every tab layout

use crate::config::Config;
use crate::error::{Result, TermisError};
use crate::interpolate::{interpolate_value, process_env, tag_is};
use crate::profile::ProfileStore;
use serde_yaml_ng::{Mapping, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "termis.yml";

/// Tag splicing another YAML file into the document.
pub const INCLUDE_TAG: &str = "include";

/// Resolve the config path from the CLI flag, defaulting to `./termis.yml`.
pub fn config_path(flag: Option<&Path>) -> PathBuf {
    flag.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

/// Directory holding stored profiles: `~/.termis/profiles`.
///
/// # Errors
///
/// Returns [`TermisError::NoConfigDir`] if the home directory cannot be determined.
pub fn profiles_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(TermisError::NoConfigDir)?;
    Ok(home.join(".termis").join("profiles"))
}

/// Read a YAML file and splice its `!include`s.
///
/// # Errors
///
/// - [`TermisError::ConfigNotFound`] if the file doesn't exist
/// - [`TermisError::IncludeNotFound`] if an included file doesn't exist
/// - [`TermisError::CircularInclude`] if includes form a cycle
/// - [`TermisError::ConfigParse`] if YAML parsing fails
pub fn read_document(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(TermisError::ConfigNotFound(path.to_path_buf()));
    }
    let mut visiting = HashSet::new();
    read_included(path, &mut visiting)
}

fn read_included(path: &Path, visiting: &mut HashSet<PathBuf>) -> Result<Value> {
    let canonical = path.canonicalize()?;
    if !visiting.insert(canonical.clone()) {
        return Err(TermisError::CircularInclude(canonical));
    }

    debug!("Reading {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    let value = parse_document(&contents)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let value = splice_includes(value, base, visiting)?;

    visiting.remove(&canonical);
    Ok(value)
}

/// Parse YAML text; an empty document is an empty mapping.
pub fn parse_document(contents: &str) -> Result<Value> {
    let value: Value = serde_yaml_ng::from_str(contents)?;
    Ok(match value {
        Value::Null => Value::Mapping(Mapping::new()),
        other => other,
    })
}

fn splice_includes(value: Value, base: &Path, visiting: &mut HashSet<PathBuf>) -> Result<Value> {
    match value {
        Value::Tagged(tagged) if tag_is(&tagged.tag, INCLUDE_TAG) => {
            let target = match &tagged.value {
                Value::String(s) => s.clone(),
                other => {
                    return Err(TermisError::InvalidInput(format!(
                        "!include expects a path, got {:?}",
                        other
                    )));
                }
            };
            let mut include = PathBuf::from(&target);
            if include.is_relative() {
                include = base.join(include);
            }
            if !include.is_file() {
                return Err(TermisError::IncludeNotFound(include));
            }
            read_included(&include, visiting)
        }
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| splice_includes(item, base, visiting))
            .collect::<Result<Vec<_>>>()
            .map(Value::Sequence),
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k, splice_includes(v, base, visiting)?);
            }
            Ok(Value::Mapping(out))
        }
        other => Ok(other),
    }
}

/// Layer a stored profile under a config document.
///
/// Keys missing from `config` are taken from `profile`. When both hold a
/// mapping under the same key the two are merged one level deep, with
/// `config`'s entries winning.
pub fn merge_profile(config: Value, profile: Value) -> Value {
    let (mut config, profile) = match (config, profile) {
        (Value::Mapping(config), Value::Mapping(profile)) => (config, profile),
        (config, _) => return config,
    };

    for (key, value) in profile {
        match config.get_mut(&key) {
            None => {
                config.insert(key, value);
            }
            Some(Value::Mapping(existing)) => {
                if let Value::Mapping(from_profile) = value {
                    let mut merged = from_profile;
                    for (k, v) in std::mem::take(existing) {
                        merged.insert(k, v);
                    }
                    *existing = merged;
                }
            }
            Some(_) => {}
        }
    }
    Value::Mapping(config)
}

/// Turn a (merged, spliced) document into a validated [`Config`].
///
/// `lookup` resolves `${VAR}` references.
pub fn build_config<F>(document: Value, lookup: &F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let document = interpolate_value(document, lookup)?;
    let config = Config::from_value(document)?;
    config.validate()?;
    Ok(config)
}

/// Fetch a stored profile and splice its `!include`s relative to the store.
fn read_profile(store: &dyn ProfileStore, name: &str) -> Result<Value> {
    let doc = parse_document(&store.get(name)?)?;
    let base = store.base_dir().unwrap_or_else(|| Path::new("."));
    splice_includes(doc, base, &mut HashSet::new())
}

/// Load the config at `path`, optionally layered over a stored profile.
///
/// If a profile is named and `path` does not exist, the profile alone is used.
///
/// # Errors
///
/// - [`TermisError::ProfileNotFound`] if the named profile doesn't exist
/// - [`TermisError::ConfigNotFound`] if neither config nor profile is available
/// - any parse-time error from [`build_config`]
pub fn load(path: &Path, profile: Option<&str>, store: &dyn ProfileStore) -> Result<Config> {
    let profile_doc = match profile {
        Some(name) => {
            let doc = read_profile(store, name)?;
            info!("Loaded profile: {}", name);
            Some(doc)
        }
        None => None,
    };

    let document = match (profile_doc, path.is_file()) {
        (Some(profile_doc), false) => {
            debug!("{} not found, using profile alone", path.display());
            profile_doc
        }
        (Some(profile_doc), true) => merge_profile(read_document(path)?, profile_doc),
        (None, _) => read_document(path)?,
    };

    let config = build_config(document, &process_env)?;
    info!(
        "Loaded config with {} tab(s) from {}",
        config.tabs.len(),
        path.display()
    );
    Ok(config)
}
