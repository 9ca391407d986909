//! Error types for termis.
//!
//! All errors in termis are represented by [`TermisError`]. Parse-time errors
//! (`ConfigParse`, `MissingEnvironmentVariable`, `InvalidPositionFormat`,
//! `DuplicatePosition`) are raised while loading, before iTerm2 is touched.

use crate::position::Coordinate;
use std::path::PathBuf;
use thiserror::Error;

/// All possible errors that can occur in termis.
#[derive(Error, Debug)]
pub enum TermisError {
    /// Config file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Could not determine the user's home directory.
    #[error("Could not determine home directory")]
    NoConfigDir,

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or typed deserialization failed.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml_ng::Error),

    /// A `${VAR}` reference names a variable that is not set.
    #[error("Environment variable not set: {0}")]
    MissingEnvironmentVariable(String),

    /// An `!include` points at a file that does not exist.
    #[error("Included file does not exist: {0}")]
    IncludeNotFound(PathBuf),

    /// `!include`s form a cycle (a.yml -> b.yml -> a.yml).
    #[error("Circular include detected: {0}")]
    CircularInclude(PathBuf),

    /// A pane position is not `column/row` or `column/row/sub_column`.
    #[error("Invalid position format: '{0}' (expected column/row or column/row/sub_column)")]
    InvalidPositionFormat(String),

    /// Two panes in the same tab share a coordinate.
    #[error("Duplicate position {position} in tab '{tab}'")]
    DuplicatePosition {
        /// Tab containing the duplicate.
        tab: String,
        /// The coordinate used twice.
        position: Coordinate,
    },

    /// A terminal call failed while configuring a tab.
    #[error("Tab '{tab}'{}: {step} failed: {source}", pane_suffix(.pane))]
    ExternalApi {
        /// Tab being configured.
        tab: String,
        /// Pane being configured, if the failure was pane-specific.
        pane: Option<Coordinate>,
        /// The step that failed (e.g. "split", "send command").
        step: &'static str,
        /// Underlying backend error.
        #[source]
        source: Box<TermisError>,
    },

    /// An iTerm2 scripting call failed.
    #[error("iTerm2 error: {0}")]
    ITerm(String),

    /// iTerm2 is not installed or not scriptable from this process.
    #[error("iTerm2 is not available (is it installed and is automation permitted?)")]
    ITermUnavailable,

    /// Requested stored profile does not exist.
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Profile name contains characters other than letters, digits, `_` and `-`.
    #[error("Invalid profile name: '{0}'. Use alphanumeric characters, underscores, and hyphens only")]
    InvalidProfileName(String),

    /// Input (config or wizard answers) could not be interpreted.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A layout run finished but some tabs could not be configured.
    #[error("{failed} of {total} tab(s) failed")]
    TabsFailed {
        /// Number of failed tabs.
        failed: usize,
        /// Number of tabs attempted.
        total: usize,
    },
}

fn pane_suffix(pane: &Option<Coordinate>) -> String {
    match pane {
        Some(p) => format!(", pane {}", p),
        None => String::new(),
    }
}

impl TermisError {
    /// Wrap a backend error with the tab/pane/step it happened in.
    pub fn external(
        tab: &str,
        pane: Option<Coordinate>,
        step: &'static str,
        source: TermisError,
    ) -> Self {
        TermisError::ExternalApi {
            tab: tab.to_string(),
            pane,
            step,
            source: Box::new(source),
        }
    }
}

/// Convenient Result type alias for termis operations.
pub type Result<T> = std::result::Result<T, TermisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_message_names_context() {
        let err = TermisError::external(
            "api",
            Some(Coordinate::new(1, 2, 1)),
            "split",
            TermisError::ITerm("session not found".into()),
        );
        assert_eq!(
            err.to_string(),
            "Tab 'api', pane 1/2/1: split failed: iTerm2 error: session not found"
        );

        let err = TermisError::external("api", None, "create tab", TermisError::ITermUnavailable);
        assert!(err.to_string().starts_with("Tab 'api': create tab failed"));
    }
}
