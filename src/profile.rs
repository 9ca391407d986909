//! Stored profiles: named layout configs kept for reuse.
//!
//! A profile is an ordinary termis YAML file saved under a name. The
//! [`ProfileStore`] trait abstracts where they live; [`FsProfileStore`] keeps
//! them as `<name>.yml` under `~/.termis/profiles`, [`MemoryProfileStore`]
//! keeps them in a map.

use crate::error::{Result, TermisError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extension of stored profiles.
pub const PROFILE_EXT: &str = "yml";

/// Key-value storage for named profiles.
pub trait ProfileStore {
    /// Fetch a profile's YAML text.
    ///
    /// # Errors
    ///
    /// [`TermisError::ProfileNotFound`] if no profile has that name.
    fn get(&self, name: &str) -> Result<String>;

    /// All profile names, sorted.
    fn list(&self) -> Result<Vec<String>>;

    /// Store a profile, replacing any existing one with the same name.
    fn put(&mut self, name: &str, contents: &str) -> Result<()>;

    /// Directory that relative `!include` paths in a profile resolve against.
    /// `None` means the current directory.
    fn base_dir(&self) -> Option<&Path> {
        None
    }

    fn contains(&self, name: &str) -> Result<bool> {
        match self.get(name) {
            Ok(_) => Ok(true),
            Err(TermisError::ProfileNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Check a profile name: letters, digits, `_` and `-` only.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(TermisError::InvalidProfileName(name.to_string()))
    }
}

/// Profiles stored as `<dir>/<name>.yml`.
#[derive(Debug, Clone)]
pub struct FsProfileStore {
    dir: PathBuf,
}

impl FsProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, PROFILE_EXT))
    }
}

impl ProfileStore for FsProfileStore {
    fn get(&self, name: &str) -> Result<String> {
        validate_name(name).map_err(|_| TermisError::ProfileNotFound(name.to_string()))?;
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(TermisError::ProfileNotFound(name.to_string()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            debug!("Profile directory {} does not exist", self.dir.display());
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PROFILE_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn base_dir(&self) -> Option<&Path> {
        Some(&self.dir)
    }

    fn put(&mut self, name: &str, contents: &str) -> Result<()> {
        validate_name(name)?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);

        // Write to a temp file then rename so a crash never leaves half a profile.
        let temp = path.with_extension("yml.tmp");
        std::fs::write(&temp, contents)?;
        std::fs::rename(&temp, &path)?;
        debug!("Saved profile to {}", path.display());
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    profiles: BTreeMap<String, String>,
}

impl ProfileStore for MemoryProfileStore {
    fn get(&self, name: &str) -> Result<String> {
        self.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| TermisError::ProfileNotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.profiles.keys().cloned().collect())
    }

    fn put(&mut self, name: &str, contents: &str) -> Result<()> {
        validate_name(name)?;
        self.profiles.insert(name.to_string(), contents.to_string());
        Ok(())
    }
}

/// One line of `--list-profiles` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    /// Stored name.
    pub name: String,
    /// `metadata.name`, or the stored name.
    pub display_name: String,
    /// `metadata.description`, or empty.
    pub description: String,
}

#[derive(Deserialize, Default)]
struct MetadataOnly {
    #[serde(default)]
    metadata: Option<crate::config::Metadata>,
}

/// Summarize every stored profile. Unreadable profiles are listed by name only.
pub fn summaries(store: &dyn ProfileStore) -> Result<Vec<ProfileSummary>> {
    let mut out = Vec::new();
    for name in store.list()? {
        let metadata = store
            .get(&name)
            .and_then(|text| Ok(serde_yaml_ng::from_str::<Option<MetadataOnly>>(&text)?))
            .map(|doc| doc.unwrap_or_default().metadata.unwrap_or_default())
            .unwrap_or_else(|e| {
                warn!("Could not read profile '{}': {}", name, e);
                Default::default()
            });
        out.push(ProfileSummary {
            display_name: metadata.name.unwrap_or_else(|| name.clone()),
            description: metadata.description.unwrap_or_default(),
            name,
        });
    }
    Ok(out)
}

/// Render summaries as the `--list-profiles` table.
pub fn format_summaries(profiles: &[ProfileSummary]) -> String {
    if profiles.is_empty() {
        return "No global profiles found.\n".to_string();
    }
    let rule = "-".repeat(60);
    let mut out = format!("Available global profiles:\n{}\n", "=".repeat(60));
    for p in profiles {
        out.push_str(&format!("{:20} | {}\n", p.name, p.display_name));
        if !p.description.is_empty() {
            out.push_str(&format!("{:20} | {}\n", "", p.description));
        }
        out.push_str(&rule);
        out.push('\n');
    }
    out
}

/// Save the config file at `config_path` as profile `name`.
///
/// # Errors
///
/// - [`TermisError::InvalidProfileName`] for a bad name
/// - [`TermisError::ConfigNotFound`] if the config file doesn't exist
pub fn save_config(store: &mut dyn ProfileStore, config_path: &Path, name: &str) -> Result<()> {
    validate_name(name)?;
    if !config_path.is_file() {
        return Err(TermisError::ConfigNotFound(config_path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(config_path)?;
    store.put(name, &contents)
}
