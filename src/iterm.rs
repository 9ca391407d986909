//! iTerm2 automation.
//!
//! Drives iTerm2 through its AppleScript dictionary via `osascript`. Panes
//! are addressed by iTerm2's session `id`, so calls stay correct even while
//! the user clicks around.
//!
//! Some settings have no AppleScript verb. Those are sent as iTerm2's
//! proprietary escape sequences written directly to the pane's tty:
//!
//! - badge text: `OSC 1337 ; SetBadgeFormat=<base64> BEL`
//! - profile: `OSC 1337 ; SetProfile=<name> BEL`
//! - colour preset: `OSC 1337 ; SetColors=preset=<name> BEL`
//! - tab title: `OSC 1 ; <title> BEL`, plus the `user.termis_tab` variable
//!   (`OSC 1337 ; SetUserVar=termis_tab=<base64> BEL`) that [`find_tab`]
//!   matches on
//!
//! Pane titles use the session `name`, so they never clobber the tab title.
//!
//! [`find_tab`]: Terminal::find_tab

use crate::config::{BadgeTheme, DEFAULT_PROFILE};
use crate::error::{Result, TermisError};
use crate::resolver::Direction;
use crate::terminal::{SessionId, Terminal};
use base64::Engine;
use std::collections::HashMap;
use std::io::Write;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, instrument};

const OSC: &str = "\x1b]";
const BEL: &str = "\x07";

/// User variable carrying the tab title termis assigned.
const TAB_VAR: &str = "termis_tab";

/// Quote a string as an AppleScript string literal.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// AppleScript clause selecting a profile.
fn profile_clause(profile: &str) -> String {
    if profile == DEFAULT_PROFILE {
        "default profile".to_string()
    } else {
        format!("profile {}", quote(profile))
    }
}

/// Wrap `body` so it runs with `s` bound to the session `id` (and `t`, `w`
/// to its tab and window).
fn session_script(id: &SessionId, body: &str) -> String {
    format!(
        r#"tell application "iTerm2"
    repeat with w in windows
        repeat with t in tabs of w
            repeat with s in sessions of t
                if (id of s as text) is {id} then
{body}
                    return ""
                end if
            end repeat
        end repeat
    end repeat
    error "session {raw} not found"
end tell"#,
        id = quote(&id.0),
        raw = id.0.replace('"', ""),
        body = body
    )
}

/// Build an `OSC 1337` sequence.
fn osc_1337(payload: &str) -> String {
    format!("{}1337;{}{}", OSC, payload, BEL)
}

/// Drop control characters, which would end an escape sequence early.
fn printable(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}

fn base64(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text)
}

/// Sequences setting the tab title and recording it for [`find_tab_script`].
fn tab_title_escape(title: &str) -> String {
    format!(
        "{}1;{}{}{}",
        OSC,
        printable(title),
        BEL,
        osc_1337(&format!("SetUserVar={}={}", TAB_VAR, base64(title)))
    )
}

/// Session-name assignment, which iTerm2 shows as the pane title.
fn pane_title_body(title: &str) -> String {
    format!("                    tell s to set name to {}", quote(title))
}

fn badge_escape(text: &str) -> String {
    osc_1337(&format!("SetBadgeFormat={}", base64(text)))
}

/// Find a tab of the current window titled `title`, first by the variable
/// termis sets, then by session name for tabs titled by hand.
fn find_tab_script(title: &str) -> String {
    format!(
        r#"tell application "iTerm2"
    repeat with t in tabs of current window
        repeat with s in sessions of t
            tell s to set tabVar to (variable named "user.{var}")
            if tabVar is {title} then
                return id of current session of t
            end if
        end repeat
    end repeat
    repeat with t in tabs of current window
        repeat with s in sessions of t
            if name of s is {title} then
                return id of current session of t
            end if
        end repeat
    end repeat
    return ""
end tell"#,
        var = TAB_VAR,
        title = quote(title)
    )
}

/// iTerm2 backend.
#[derive(Debug, Default)]
pub struct ITerm2 {
    labels: HashMap<SessionId, String>,
}

impl ITerm2 {
    /// Connect to iTerm2, verifying that it can be scripted.
    ///
    /// # Errors
    ///
    /// [`TermisError::ITermUnavailable`] if `osascript` is missing or iTerm2
    /// refuses automation.
    #[instrument]
    pub fn connect() -> Result<Self> {
        let term = Self::default();
        match run_applescript(r#"tell application "iTerm2" to version"#) {
            Ok(version) => {
                info!("Connected to iTerm2 {}", version);
                Ok(term)
            }
            Err(e) => {
                debug!("iTerm2 check failed: {}", e);
                Err(TermisError::ITermUnavailable)
            }
        }
    }

    fn label<'a>(&'a self, session: &'a SessionId) -> &'a str {
        self.labels
            .get(session)
            .map(String::as_str)
            .unwrap_or(&session.0)
    }

    fn in_session(&self, session: &SessionId, body: &str) -> Result<String> {
        run_applescript(&session_script(session, body))
    }

    /// Path of the session's tty device, e.g. `/dev/ttys004`.
    fn tty(&self, session: &SessionId) -> Result<String> {
        let tty = self.in_session(session, "                    return tty of s")?;
        if tty.is_empty() {
            return Err(TermisError::ITerm(format!(
                "no tty for session {}",
                self.label(session)
            )));
        }
        Ok(tty)
    }

    /// Write an escape sequence straight to the pane's tty.
    fn write_escape(&self, session: &SessionId, sequence: &str) -> Result<()> {
        let tty = self.tty(session)?;
        let mut device = std::fs::OpenOptions::new().write(true).open(&tty)?;
        device.write_all(sequence.as_bytes())?;
        device.flush()?;
        Ok(())
    }
}

/// Execute an AppleScript program and return its trimmed output.
fn run_applescript(script: &str) -> Result<String> {
    let output = Command::new("osascript")
        .arg("-e")
        .arg(script)
        .output()
        .map_err(|e| TermisError::ITerm(format!("failed to run osascript: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TermisError::ITerm(stderr.trim().to_string()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

impl Terminal for ITerm2 {
    #[instrument(skip(self))]
    fn prepare_window(&mut self, new_window: bool, profile: &str) -> Result<SessionId> {
        let script = format!(
            r#"tell application "iTerm2"
    activate
    if {new} or (count of windows) is 0 then
        set w to (create window with {profile})
    else
        set w to current window
    end if
    return id of current session of current tab of w
end tell"#,
            new = new_window,
            profile = profile_clause(profile)
        );
        let id = run_applescript(&script)?;
        debug!("Window ready, current session {}", id);
        Ok(SessionId(id))
    }

    #[instrument(skip(self))]
    fn find_tab(&mut self, title: &str) -> Result<Option<SessionId>> {
        let id = run_applescript(&find_tab_script(title))?;
        Ok((!id.is_empty()).then_some(SessionId(id)))
    }

    #[instrument(skip(self))]
    fn create_tab(&mut self, profile: &str) -> Result<SessionId> {
        let script = format!(
            r#"tell application "iTerm2"
    tell current window
        set t to (create tab with {profile})
    end tell
    return id of current session of t
end tell"#,
            profile = profile_clause(profile)
        );
        Ok(SessionId(run_applescript(&script)?))
    }

    fn set_tab_title(&mut self, session: &SessionId, title: &str) -> Result<()> {
        debug!("Titling tab of {} {:?}", self.label(session), title);
        self.write_escape(session, &tab_title_escape(title))
    }

    fn split(
        &mut self,
        parent: &SessionId,
        direction: Direction,
        profile: &str,
    ) -> Result<SessionId> {
        debug!("Splitting {} {}", self.label(parent), direction);
        let body = format!(
            "                    tell s to set n to (split {} with {})\n                    return id of n",
            direction,
            profile_clause(profile)
        );
        let id = self.in_session(parent, &body)?;
        if id.is_empty() {
            return Err(TermisError::ITerm("split returned no session".into()));
        }
        Ok(SessionId(id))
    }

    fn set_title(&mut self, session: &SessionId, title: &str) -> Result<()> {
        self.in_session(session, &pane_title_body(title)).map(drop)
    }

    fn set_profile(&mut self, session: &SessionId, profile: &str) -> Result<()> {
        debug!("Profile {:?} on {}", profile, self.label(session));
        self.write_escape(session, &osc_1337(&format!("SetProfile={}", profile)))
    }

    fn set_color_preset(&mut self, session: &SessionId, preset: &str) -> Result<()> {
        self.write_escape(session, &osc_1337(&format!("SetColors=preset={}", preset)))
    }

    fn set_badge(&mut self, session: &SessionId, text: &str, theme: BadgeTheme) -> Result<()> {
        self.write_escape(session, &badge_escape(text))?;
        // Badge colour is a profile setting with no scripting or escape hook.
        let (r, g, b) = theme.rgb();
        debug!(
            "Badge {:?} on {} (theme {} = #{:02x}{:02x}{:02x})",
            text,
            self.label(session),
            theme,
            r,
            g,
            b
        );
        Ok(())
    }

    fn send_text(&mut self, session: &SessionId, text: &str, enter: bool) -> Result<()> {
        let newline = if enter { "" } else { " newline NO" };
        let body = format!(
            "                    tell s to write text {}{}",
            quote(text),
            newline
        );
        self.in_session(session, &body).map(drop)
    }

    fn wait(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }

    fn focus(&mut self, session: &SessionId) -> Result<()> {
        let body = "                    tell w to select\n                    tell t to select\n                    tell s to select";
        self.in_session(session, body).map(drop)
    }

    fn bind(&mut self, session: &SessionId, label: &str) {
        debug!("{} is {}", session, label);
        self.labels.insert(session.clone(), label.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote(r#"say "hi" \n"#), r#""say \"hi\" \\n""#);
    }

    #[test]
    fn test_profile_clause() {
        assert_eq!(profile_clause("Default"), "default profile");
        assert_eq!(profile_clause("Solarized Dark"), "profile \"Solarized Dark\"");
    }

    #[test]
    fn test_session_script_targets_id() {
        let script = session_script(&SessionId("ABC-123".into()), "                    tell s to select");
        assert!(script.contains(r#"if (id of s as text) is "ABC-123" then"#));
        assert!(script.contains("tell s to select"));
        assert!(script.contains(r#"error "session ABC-123 not found""#));
    }

    #[test]
    fn test_osc_1337() {
        assert_eq!(osc_1337("SetProfile=Dark"), "\x1b]1337;SetProfile=Dark\x07");
        assert_eq!(badge_escape("API"), "\x1b]1337;SetBadgeFormat=QVBJ\x07");
    }

    #[test]
    fn test_tab_title_is_separate_from_pane_name() {
        // "Dev" is the tab, "Editor" the origin pane's session name.
        let tab = tab_title_escape("Dev");
        assert_eq!(
            tab,
            "\x1b]1;Dev\x07\x1b]1337;SetUserVar=termis_tab=RGV2\x07"
        );
        assert!(!tab.contains("set name"));

        let pane = session_script(&SessionId("S1".into()), &pane_title_body("Editor"));
        assert!(pane.contains(r#"tell s to set name to "Editor""#));
        assert!(!pane.contains("Dev"));
    }

    #[test]
    fn test_tab_title_strips_control_characters() {
        assert!(tab_title_escape("a\x07b\x1b").starts_with("\x1b]1;ab\x07"));
    }

    #[test]
    fn test_find_tab_matches_tab_variable_first() {
        let script = find_tab_script("Dev");
        let by_var = script
            .find(r#"(variable named "user.termis_tab")"#)
            .unwrap();
        let by_name = script.find(r#"if name of s is "Dev" then"#).unwrap();
        assert!(by_var < by_name);
        assert!(script.contains(r#"if tabVar is "Dev" then"#));
    }
}
