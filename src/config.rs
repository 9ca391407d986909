//! Configuration types for termis.
//!
//! This module defines the data structures that map to the YAML layout file.
//! Reserved top-level keys are `profile`, `metadata` and `tabs`; anything else
//! is ignored.
//!
//! # Config Format
//!
//! ```yaml
//! profile: Default
//! metadata:
//!   name: Backend
//!   description: API + worker + database shell
//! tabs:
//!   api:
//!     title: API
//!     root: ~/src/api
//!     panes:
//!       - position: 1/1
//!         title: server
//!         badge: { text: API, theme: success }
//!         commands: cargo run
//!         focus: true
//!       - position: 2/1
//!         commands: ["git fetch", "git status"]
//!         command_delay: 1
//!       - position: 2/2
//!         prompt: "cargo test "
//! ```
//!
//! Tabs keep their document order; panes are addressed by [`Coordinate`].

use crate::error::Result;
use crate::position::{Coordinate, parse_position};
use crate::resolver::{self, LayoutPlan};
use crate::tools::ToolsConfig;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// iTerm2 profile used when neither the config nor a tab names one.
pub const DEFAULT_PROFILE: &str = "Default";

/// Command field that accepts either a single string or array of strings.
///
/// This allows flexible config syntax:
/// ```yaml
/// commands: single command
/// # or
/// commands: ["command 1", "command 2"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cmd {
    /// A single command string.
    Single(String),
    /// Multiple commands executed in sequence.
    Multiple(Vec<String>),
}

impl Cmd {
    /// Convert to a `Vec<String>`, normalizing both variants.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Cmd::Single(s) => vec![s.clone()],
            Cmd::Multiple(v) => v.clone(),
        }
    }
}

/// Badge colour themes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTheme {
    #[default]
    Default,
    Success,
    Error,
    Warning,
    Info,
    Primary,
    Secondary,
    Dark,
    Light,
}

impl BadgeTheme {
    pub const ALL: [BadgeTheme; 9] = [
        BadgeTheme::Default,
        BadgeTheme::Success,
        BadgeTheme::Error,
        BadgeTheme::Warning,
        BadgeTheme::Info,
        BadgeTheme::Primary,
        BadgeTheme::Secondary,
        BadgeTheme::Dark,
        BadgeTheme::Light,
    ];

    /// Foreground colour of the badge.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            BadgeTheme::Default => (213, 194, 194),
            BadgeTheme::Success => (76, 175, 80),
            BadgeTheme::Error => (244, 67, 54),
            BadgeTheme::Warning => (255, 193, 7),
            BadgeTheme::Info => (33, 150, 243),
            BadgeTheme::Primary => (156, 39, 176),
            BadgeTheme::Secondary => (96, 125, 139),
            BadgeTheme::Dark => (33, 33, 33),
            BadgeTheme::Light => (227, 227, 227),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BadgeTheme::Default => "default",
            BadgeTheme::Success => "success",
            BadgeTheme::Error => "error",
            BadgeTheme::Warning => "warning",
            BadgeTheme::Info => "info",
            BadgeTheme::Primary => "primary",
            BadgeTheme::Secondary => "secondary",
            BadgeTheme::Dark => "dark",
            BadgeTheme::Light => "light",
        }
    }

    /// Look a theme up by its config name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for BadgeTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Badge overlay text, either bare or with a theme.
///
/// ```yaml
/// badge: API
/// # or
/// badge: { text: API, theme: success }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Badge {
    Text(String),
    Styled {
        text: String,
        #[serde(default)]
        theme: BadgeTheme,
    },
}

impl Badge {
    pub fn text(&self) -> &str {
        match self {
            Badge::Text(text) | Badge::Styled { text, .. } => text,
        }
    }

    pub fn theme(&self) -> BadgeTheme {
        match self {
            Badge::Text(_) => BadgeTheme::Default,
            Badge::Styled { theme, .. } => *theme,
        }
    }
}

fn default_position() -> String {
    "1/1".to_string()
}

/// Accept any scalar for `position`, so an unquoted `1` reaches position
/// validation instead of failing as a type error.
fn position_scalar<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Text(s) => s,
    })
}

/// One pane of a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pane {
    /// `column/row` or `column/row/sub_column`.
    #[serde(default = "default_position", deserialize_with = "position_scalar")]
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
    /// Overrides the tab's `root`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Cmd>,
    /// Seconds to wait between consecutive commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_delay: Option<f64>,
    /// Typed into the pane without pressing Enter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsConfig>,
    /// iTerm2 profile override for this pane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// iTerm2 colour preset name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub focus: bool,
}

impl Default for Pane {
    fn default() -> Self {
        Self {
            position: default_position(),
            title: None,
            badge: None,
            working_directory: None,
            commands: None,
            command_delay: None,
            prompt: None,
            tools: None,
            profile: None,
            color: None,
            focus: false,
        }
    }
}

impl Pane {
    /// Parse this pane's `position`.
    pub fn coordinate(&self) -> Result<Coordinate> {
        parse_position(&self.position)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.as_ref().map(Cmd::to_vec).unwrap_or_default()
    }

    /// `command_delay` as a duration; `None` when unset, zero, or not a
    /// valid number of seconds.
    pub fn delay(&self) -> Option<Duration> {
        self.command_delay
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

/// One tab and its pane grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Working directory for panes without their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// iTerm2 profile override for this tab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Reuse an existing tab with the same title instead of creating one.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reuse: bool,
    #[serde(default)]
    pub panes: Vec<Pane>,
}

impl Tab {
    /// Panes keyed by coordinate, in ascending coordinate order.
    pub fn positioned_panes(&self) -> Result<Vec<(Coordinate, &Pane)>> {
        let mut panes = self
            .panes
            .iter()
            .map(|p| Ok((p.coordinate()?, p)))
            .collect::<Result<Vec<_>>>()?;
        panes.sort_by_key(|(c, _)| *c);
        Ok(panes)
    }

    /// Resolve the split sequence for this tab.
    pub fn plan(&self, name: &str) -> Result<LayoutPlan> {
        let coords: Vec<Coordinate> = self
            .panes
            .iter()
            .map(Pane::coordinate)
            .collect::<Result<_>>()?;
        resolver::resolve(name, &coords)
    }

    /// The pane that receives focus: the last flagged one in coordinate order.
    pub fn focus_target(&self) -> Result<Option<Coordinate>> {
        Ok(self
            .positioned_panes()?
            .into_iter()
            .filter(|(_, p)| p.focus)
            .map(|(c, _)| c)
            .last())
    }

    pub fn profile_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.profile.as_deref().unwrap_or(default)
    }
}

/// Descriptive information shown by `--list-profiles`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Tabs in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tabs(pub Vec<(String, Tab)>);

impl Tabs {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tab)> {
        self.0.iter().map(|(name, tab)| (name.as_str(), tab))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Tab> {
        self.iter().find(|(n, _)| *n == name).map(|(_, t)| t)
    }

    /// Insert or replace a tab, keeping the original position on replace.
    pub fn insert(&mut self, name: String, tab: Tab) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = tab,
            None => self.0.push((name, tab)),
        }
    }
}

impl Serialize for Tabs {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, tab) in &self.0 {
            map.serialize_entry(name, tab)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Tabs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TabsVisitor;

        impl<'de> Visitor<'de> for TabsVisitor {
            type Value = Tabs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of tab names to tabs")
            }

            fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Tabs, E> {
                Ok(Tabs::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Tabs, A::Error> {
                let mut tabs = Tabs::default();
                while let Some((name, tab)) = access.next_entry::<String, Tab>()? {
                    tabs.insert(name, tab);
                }
                Ok(tabs)
            }
        }

        deserializer.deserialize_any(TabsVisitor)
    }
}

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// iTerm2 profile for new windows, tabs and splits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub tabs: Tabs,
}

impl Config {
    /// Build a config from an already-interpolated YAML tree.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TermisError::ConfigParse`] if the tree doesn't match
    /// the expected structure.
    pub fn from_value(value: serde_yaml_ng::Value) -> Result<Self> {
        Ok(serde_yaml_ng::from_value(value)?)
    }

    pub fn profile_name(&self) -> &str {
        self.profile.as_deref().unwrap_or(DEFAULT_PROFILE)
    }

    /// Check every pane position and tab layout.
    ///
    /// # Errors
    ///
    /// The first [`crate::TermisError::InvalidPositionFormat`] or
    /// [`crate::TermisError::DuplicatePosition`] found, in tab order.
    pub fn validate(&self) -> Result<()> {
        for (name, tab) in self.tabs.iter() {
            tab.plan(name)?;
        }
        Ok(())
    }

    /// List tab names in document order.
    pub fn list_tabs(&self) -> Vec<&str> {
        self.tabs.iter().map(|(name, _)| name).collect()
    }
}
