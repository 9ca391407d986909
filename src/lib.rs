//! # Termis
//!
//! An iTerm2 layout orchestrator that creates tabs and split panes from YAML
//! configuration.
//!
//! Each pane is placed on a grid by a `column/row[/sub_column]` position.
//! Termis works out the order of splits that produces that grid, then types
//! each pane's commands into it.
//!
//! ## Quick Example
//!
//! ```yaml
//! # ./termis.yml
//! profile: Default
//! tabs:
//!   dev:
//!     title: Dev
//!     root: ~/src/app
//!     panes:
//!       - position: 1/1
//!         title: Editor
//!         commands: nvim .
//!         focus: true
//!       - position: 2/1
//!         badge: { text: SERVER, theme: success }
//!         commands: [cargo build, cargo run]
//!         command_delay: 1.5
//!       - position: 2/2
//!         working_directory: ${HOME}/logs
//!         prompt: tail -f
//! ```
//!
//! ## Architecture
//!
//! The crate is organized into these modules:
//!
//! - [`position`]: pane coordinates and `column/row` parsing
//! - [`resolver`]: coordinate set to split sequence
//! - [`config`]: YAML configuration data structures
//! - [`interpolate`]: `${VAR}` substitution
//! - [`loader`]: config discovery, `!include`, profile merge
//! - [`profile`]: stored profiles under `~/.termis/profiles`
//! - [`tools`]: VS Code, git and docker command generation
//! - [`terminal`]: the backend trait; [`iterm`] and [`dry_run`] implement it
//! - [`driver`]: replays layouts against a backend
//! - [`wizard`]: interactive config authoring
//! - [`cli`], [`logging`]: command line and diagnostics
//! - [`error`]: error types

pub mod cli;
pub mod config;
pub mod driver;
pub mod dry_run;
pub mod error;
pub mod interpolate;
pub mod iterm;
pub mod loader;
pub mod logging;
pub mod position;
pub mod profile;
pub mod resolver;
pub mod terminal;
pub mod tools;
pub mod wizard;

pub use config::{Badge, BadgeTheme, Cmd, Config, Pane, Tab};
pub use error::{Result, TermisError};
pub use position::Coordinate;
