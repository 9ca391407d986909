//! The terminal automation seam.
//!
//! [`Terminal`] is everything the session driver needs from an emulator.
//! [`crate::iterm::ITerm2`] implements it against a running iTerm2;
//! [`crate::dry_run::DryRun`] records the calls instead of making them.

use crate::config::BadgeTheme;
use crate::error::Result;
use crate::resolver::Direction;
use std::fmt;
use std::time::Duration;

/// Opaque handle to one pane (an iTerm2 "session").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operations the session driver issues, one at a time.
///
/// Every call completes before the next is made; a later call may depend on
/// a session returned by an earlier one.
pub trait Terminal {
    /// Bring up the window to lay tabs out in and return its current pane.
    ///
    /// With `new_window` a fresh window is opened with `profile`; otherwise
    /// the frontmost window is used (opening one if none exists).
    fn prepare_window(&mut self, new_window: bool, profile: &str) -> Result<SessionId>;

    /// Find a tab in the window whose title is `title`, returning its current pane.
    fn find_tab(&mut self, title: &str) -> Result<Option<SessionId>>;

    /// Open a new tab with `profile` and return its only pane.
    fn create_tab(&mut self, profile: &str) -> Result<SessionId>;

    /// Title the tab that contains `session`.
    fn set_tab_title(&mut self, session: &SessionId, title: &str) -> Result<()>;

    /// Split `parent`, returning the new pane.
    fn split(&mut self, parent: &SessionId, direction: Direction, profile: &str)
    -> Result<SessionId>;

    fn set_title(&mut self, session: &SessionId, title: &str) -> Result<()>;

    fn set_profile(&mut self, session: &SessionId, profile: &str) -> Result<()>;

    fn set_color_preset(&mut self, session: &SessionId, preset: &str) -> Result<()>;

    fn set_badge(&mut self, session: &SessionId, text: &str, theme: BadgeTheme) -> Result<()>;

    /// Type `text` into the pane, followed by Enter when `enter` is set.
    fn send_text(&mut self, session: &SessionId, text: &str, enter: bool) -> Result<()>;

    /// Pause between commands.
    fn wait(&mut self, delay: Duration);

    /// Make `session` the active pane (and its tab the active tab).
    fn focus(&mut self, session: &SessionId) -> Result<()>;

    /// Give `session` a readable name (`tab:column/row/sub`) for logs and plans.
    fn bind(&mut self, _session: &SessionId, _label: &str) {}
}
