//! Session driver: replays tab layouts against a [`Terminal`].
//!
//! Tabs are laid out in document order. Each tab's splits are replayed from
//! its [`LayoutPlan`](crate::resolver::LayoutPlan), then every pane is
//! configured in coordinate order. A backend failure ends that tab only; it
//! is recorded in the [`RunReport`] and the next tab is attempted.

use crate::config::{Config, Pane, Tab};
use crate::error::{Result, TermisError};
use crate::position::Coordinate;
use crate::terminal::{SessionId, Terminal};
use crate::tools::{tool_commands, ToolProbe};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Tabs laid out completely.
    pub configured: Vec<String>,
    /// Tabs skipped because they have no panes.
    pub skipped: Vec<String>,
    /// One error per failed tab.
    pub failures: Vec<TermisError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives one [`Terminal`].
pub struct Driver<'a, T: Terminal> {
    terminal: &'a mut T,
    probe: &'a dyn ToolProbe,
    new_window: bool,
}

/// Where the current step is happening, for error context.
struct Step<'a> {
    tab: &'a str,
    pane: Option<Coordinate>,
}

impl Step<'_> {
    fn wrap<R>(&self, step: &'static str, result: Result<R>) -> Result<R> {
        result.map_err(|e| TermisError::external(self.tab, self.pane, step, e))
    }

    fn session<'s>(
        &self,
        sessions: &'s HashMap<Coordinate, SessionId>,
        pane: Coordinate,
    ) -> Result<&'s SessionId> {
        sessions.get(&pane).ok_or_else(|| {
            TermisError::external(
                self.tab,
                self.pane,
                "look up pane",
                TermisError::ITerm(format!("no session for pane {}", pane)),
            )
        })
    }
}

impl<'a, T: Terminal> Driver<'a, T> {
    pub fn new(terminal: &'a mut T, probe: &'a dyn ToolProbe) -> Self {
        Self {
            terminal,
            probe,
            new_window: false,
        }
    }

    /// Open a new window instead of using the frontmost one.
    pub fn new_window(mut self, new_window: bool) -> Self {
        self.new_window = new_window;
        self
    }

    /// Lay out every tab of `config`.
    ///
    /// # Errors
    ///
    /// Only a failure to prepare the window is returned; per-tab failures
    /// are collected in the report.
    pub fn run(&mut self, config: &Config) -> Result<RunReport> {
        let mut report = RunReport::default();
        let profile = config.profile_name();

        let mut window_ready = false;
        for (name, tab) in config.tabs.iter() {
            if tab.panes.is_empty() {
                warn!("Tab '{}' has no panes, skipping", name);
                report.skipped.push(name.to_string());
                continue;
            }

            // The first laid-out tab takes over the window's current tab.
            let initial = if window_ready {
                None
            } else {
                let session = self
                    .terminal
                    .prepare_window(self.new_window, profile)
                    .map_err(|e| TermisError::external(name, None, "prepare window", e))?;
                window_ready = true;
                Some(session)
            };

            match self.run_tab(name, tab, profile, initial) {
                Ok(()) => {
                    info!("Configured tab '{}'", name);
                    report.configured.push(name.to_string());
                }
                Err(e) => {
                    warn!("{}", e);
                    report.failures.push(e);
                }
            }
        }
        Ok(report)
    }

    fn run_tab(
        &mut self,
        name: &str,
        tab: &Tab,
        default_profile: &str,
        initial: Option<SessionId>,
    ) -> Result<()> {
        let step = Step { tab: name, pane: None };
        let profile = tab.profile_or(default_profile);
        let plan = step.wrap("resolve layout", tab.plan(name))?;
        let Some(origin) = plan.initial else {
            return Ok(());
        };

        let session = match initial {
            Some(session) => {
                if let Some(p) = &tab.profile {
                    step.wrap("set profile", self.terminal.set_profile(&session, p))?;
                }
                session
            }
            None => self.open_tab(&step, tab, profile)?,
        };
        if let Some(title) = &tab.title {
            step.wrap("set tab title", self.terminal.set_tab_title(&session, title))?;
        }

        let mut sessions = HashMap::new();
        self.terminal.bind(&session, &format!("{}:{}", name, origin));
        sessions.insert(origin, session);

        for split in &plan.splits {
            let step = Step {
                tab: name,
                pane: Some(split.child),
            };
            let parent = step.session(&sessions, split.parent)?.clone();
            debug!("{}: {}", name, split);
            let child = step.wrap(
                "split",
                self.terminal.split(&parent, split.direction, profile),
            )?;
            self.terminal
                .bind(&child, &format!("{}:{}", name, split.child));
            sessions.insert(split.child, child);
        }

        for (coordinate, pane) in step.wrap("resolve layout", tab.positioned_panes())? {
            let step = Step {
                tab: name,
                pane: Some(coordinate),
            };
            let session = step.session(&sessions, coordinate)?;
            self.configure_pane(&step, session, tab, pane)?;
        }

        if let Some(target) = step.wrap("resolve layout", tab.focus_target())? {
            let step = Step {
                tab: name,
                pane: Some(target),
            };
            let session = step.session(&sessions, target)?;
            step.wrap("focus", self.terminal.focus(session))?;
        }
        Ok(())
    }

    fn open_tab(&mut self, step: &Step<'_>, tab: &Tab, profile: &str) -> Result<SessionId> {
        if tab.reuse {
            if let Some(title) = &tab.title {
                if let Some(session) = step.wrap("find tab", self.terminal.find_tab(title))? {
                    info!("Reusing tab '{}'", title);
                    return Ok(session);
                }
            } else {
                warn!("Tab '{}' sets reuse without a title, creating a new tab", step.tab);
            }
        }
        step.wrap("create tab", self.terminal.create_tab(profile))
    }

    fn configure_pane(
        &mut self,
        step: &Step<'_>,
        session: &SessionId,
        tab: &Tab,
        pane: &Pane,
    ) -> Result<()> {
        if let Some(title) = &pane.title {
            step.wrap("set title", self.terminal.set_title(session, title))?;
        }

        let working_dir = pane.working_directory.as_deref().or(tab.root.as_deref());
        if let Some(dir) = working_dir {
            step.wrap(
                "change directory",
                self.terminal.send_text(session, &format!("cd {}", dir), true),
            )?;
        }

        if let Some(profile) = &pane.profile {
            step.wrap("set profile", self.terminal.set_profile(session, profile))?;
        }
        if let Some(color) = &pane.color {
            step.wrap("set color", self.terminal.set_color_preset(session, color))?;
        }
        if let Some(badge) = &pane.badge {
            step.wrap(
                "set badge",
                self.terminal.set_badge(session, badge.text(), badge.theme()),
            )?;
        }

        let mut commands = match &pane.tools {
            Some(tools) => tool_commands(tools, working_dir, self.probe),
            None => Vec::new(),
        };
        commands.extend(pane.commands());

        let delay = pane.delay();
        for (i, command) in commands.iter().enumerate() {
            if i > 0 {
                if let Some(delay) = delay {
                    self.terminal.wait(delay);
                }
            }
            step.wrap("send command", self.terminal.send_text(session, command, true))?;
        }

        if let Some(prompt) = &pane.prompt {
            step.wrap("send prompt", self.terminal.send_text(session, prompt, false))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BadgeTheme;
    use crate::dry_run::DryRun;
    use crate::loader::{build_config, parse_document};
    use crate::resolver::Direction;
    use std::time::Duration;

    fn config(yaml: &str) -> Config {
        build_config(parse_document(yaml).unwrap(), &|_: &str| None).unwrap()
    }

    fn nothing_installed(_: &str) -> bool {
        false
    }

    fn dry_run(config: &Config) -> (String, RunReport) {
        let mut dry = DryRun::new();
        let report = Driver::new(&mut dry, &nothing_installed)
            .run(config)
            .unwrap();
        (dry.render(), report)
    }

    #[test]
    fn test_full_pane_configuration() {
        let config = config(
            r#"
tabs:
  dev:
    title: Dev
    root: ~/src/app
    panes:
      - position: 2/1
        commands: htop
      - position: 1/1
        title: Editor
        badge: { text: EDIT, theme: success }
        color: Solarized
        commands: [git status, cargo build]
        command_delay: 0.5
        prompt: cargo run
        focus: true
"#,
        );
        let (plan, report) = dry_run(&config);
        assert_eq!(report.configured, ["dev"]);
        assert!(report.is_success());
        assert_eq!(
            plan,
            "use current window (profile \"Default\") -> dev:1/1/1\n\
             dev:1/1/1  set tab title \"Dev\"\n\
             dev:1/1/1  split vertically (profile \"Default\") -> dev:2/1/1\n\
             dev:1/1/1  set title \"Editor\"\n\
             dev:1/1/1  type \"cd ~/src/app\" + Enter\n\
             dev:1/1/1  set color preset \"Solarized\"\n\
             dev:1/1/1  set badge \"EDIT\" (success)\n\
             dev:1/1/1  type \"git status\" + Enter\n\
             wait 500ms\n\
             dev:1/1/1  type \"cargo build\" + Enter\n\
             dev:1/1/1  type \"cargo run\" (no Enter)\n\
             dev:2/1/1  type \"cd ~/src/app\" + Enter\n\
             dev:2/1/1  type \"htop\" + Enter\n\
             dev:1/1/1  focus\n"
        );
    }

    #[test]
    fn test_later_tabs_create_or_reuse() {
        let config = config(
            r#"
profile: Dark
tabs:
  empty: {}
  first:
    panes: [{ position: 1/1 }]
  second:
    title: Logs
    reuse: true
    profile: Light
    panes: [{ position: 1/1 }, { position: 1/2 }]
"#,
        );
        let (plan, report) = dry_run(&config);
        assert_eq!(report.skipped, ["empty"]);
        assert_eq!(report.configured, ["first", "second"]);
        assert_eq!(
            plan,
            "use current window (profile \"Dark\") -> first:1/1/1\n\
             look for tab titled \"Logs\"\n\
             create tab (profile \"Light\") -> second:1/1/1\n\
             second:1/1/1  set tab title \"Logs\"\n\
             second:1/1/1  split horizontally (profile \"Light\") -> second:1/2/1\n"
        );
    }

    #[test]
    fn test_focus_last_flagged_wins() {
        let config = config(
            "tabs:\n  t:\n    panes:\n      - { position: 2/1, focus: true }\n      - { position: 1/1, focus: true }\n",
        );
        let (plan, _) = dry_run(&config);
        assert!(plan.ends_with("t:2/1/1  focus\n"));
    }

    #[test]
    fn test_tools_prepended_when_available() {
        let config = config(
            "tabs:\n  t:\n    panes:\n      - position: 1/1\n        working_directory: /w\n        commands: make\n        tools:\n          git: { pull: true }\n          docker: { compose: up -d }\n",
        );
        let git_only = |bin: &str| bin == "git";
        let mut dry = DryRun::new();
        Driver::new(&mut dry, &git_only).run(&config).unwrap();
        assert!(dry.render().ends_with(
            "t:1/1/1  type \"cd /w\" + Enter\n\
             t:1/1/1  type \"git pull\" + Enter\n\
             t:1/1/1  type \"make\" + Enter\n"
        ));
    }

    /// Fails every split, succeeds otherwise.
    #[derive(Default)]
    struct BrokenSplits {
        inner: DryRun,
    }

    impl Terminal for BrokenSplits {
        fn prepare_window(&mut self, new_window: bool, profile: &str) -> Result<SessionId> {
            self.inner.prepare_window(new_window, profile)
        }
        fn find_tab(&mut self, title: &str) -> Result<Option<SessionId>> {
            self.inner.find_tab(title)
        }
        fn create_tab(&mut self, profile: &str) -> Result<SessionId> {
            self.inner.create_tab(profile)
        }
        fn set_tab_title(&mut self, s: &SessionId, title: &str) -> Result<()> {
            self.inner.set_tab_title(s, title)
        }
        fn split(&mut self, _: &SessionId, _: Direction, _: &str) -> Result<SessionId> {
            Err(TermisError::ITerm("split refused".into()))
        }
        fn set_title(&mut self, s: &SessionId, title: &str) -> Result<()> {
            self.inner.set_title(s, title)
        }
        fn set_profile(&mut self, s: &SessionId, profile: &str) -> Result<()> {
            self.inner.set_profile(s, profile)
        }
        fn set_color_preset(&mut self, s: &SessionId, preset: &str) -> Result<()> {
            self.inner.set_color_preset(s, preset)
        }
        fn set_badge(&mut self, s: &SessionId, text: &str, theme: BadgeTheme) -> Result<()> {
            self.inner.set_badge(s, text, theme)
        }
        fn send_text(&mut self, s: &SessionId, text: &str, enter: bool) -> Result<()> {
            self.inner.send_text(s, text, enter)
        }
        fn wait(&mut self, delay: Duration) {
            self.inner.wait(delay)
        }
        fn focus(&mut self, s: &SessionId) -> Result<()> {
            self.inner.focus(s)
        }
    }

    #[test]
    fn test_failure_is_reported_and_run_continues() {
        let config = config(
            "tabs:\n  split:\n    panes: [{ position: 1/1 }, { position: 2/1 }]\n  single:\n    panes: [{ position: 1/1, commands: ls }]\n",
        );
        let mut term = BrokenSplits::default();
        let report = Driver::new(&mut term, &nothing_installed)
            .run(&config)
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.configured, ["single"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].to_string(),
            "Tab 'split', pane 2/1/1: split failed: iTerm2 error: split refused"
        );
        assert!(term.inner.render().ends_with("s1  type \"ls\" + Enter\n"));
    }
}
