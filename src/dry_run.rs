//! Dry-run backend.
//!
//! [`DryRun`] implements [`Terminal`] by recording each call. Sessions get
//! sequential ids (`s0`, `s1`, ...) which [`DryRun::render`] replaces with
//! the pane labels the driver binds, so the plan reads in layout terms:
//!
//! ```text
//! use current window (profile "Default") -> dev:1/1/1
//! dev:1/1/1  split vertically (profile "Default") -> dev:2/1/1
//! dev:1/1/1  type "cargo run" + Enter
//! dev:2/1/1  focus
//! ```

use crate::config::{BadgeTheme, Config};
use crate::driver::{Driver, RunReport};
use crate::error::Result;
use crate::resolver::Direction;
use crate::terminal::{SessionId, Terminal};
use crate::tools::ToolProbe;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Window {
        new_window: bool,
        profile: String,
        session: SessionId,
    },
    FindTab {
        title: String,
    },
    CreateTab {
        profile: String,
        session: SessionId,
    },
    TabTitle(SessionId, String),
    Split {
        parent: SessionId,
        direction: Direction,
        profile: String,
        session: SessionId,
    },
    Title(SessionId, String),
    Profile(SessionId, String),
    ColorPreset(SessionId, String),
    Badge(SessionId, String, BadgeTheme),
    Text(SessionId, String, bool),
    Wait(Duration),
    Focus(SessionId),
}

/// Records terminal calls instead of performing them.
#[derive(Debug, Default)]
pub struct DryRun {
    events: Vec<Event>,
    labels: HashMap<SessionId, String>,
    next_id: usize,
}

impl DryRun {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_session(&mut self) -> SessionId {
        let id = SessionId(format!("s{}", self.next_id));
        self.next_id += 1;
        id
    }

    fn name<'a>(&'a self, session: &'a SessionId) -> &'a str {
        self.labels
            .get(session)
            .map(String::as_str)
            .unwrap_or(&session.0)
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The recorded plan, one call per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            let line = match event {
                Event::Window {
                    new_window,
                    profile,
                    session,
                } => format!(
                    "{} (profile {:?}) -> {}",
                    if *new_window {
                        "open new window"
                    } else {
                        "use current window"
                    },
                    profile,
                    self.name(session)
                ),
                Event::FindTab { title } => format!("look for tab titled {:?}", title),
                Event::CreateTab { profile, session } => {
                    format!("create tab (profile {:?}) -> {}", profile, self.name(session))
                }
                Event::TabTitle(s, title) => {
                    format!("{}  set tab title {:?}", self.name(s), title)
                }
                Event::Split {
                    parent,
                    direction,
                    profile,
                    session,
                } => format!(
                    "{}  split {} (profile {:?}) -> {}",
                    self.name(parent),
                    direction,
                    profile,
                    self.name(session)
                ),
                Event::Title(s, title) => format!("{}  set title {:?}", self.name(s), title),
                Event::Profile(s, profile) => {
                    format!("{}  set profile {:?}", self.name(s), profile)
                }
                Event::ColorPreset(s, preset) => {
                    format!("{}  set color preset {:?}", self.name(s), preset)
                }
                Event::Badge(s, text, theme) => {
                    format!("{}  set badge {:?} ({})", self.name(s), text, theme)
                }
                Event::Text(s, text, true) => {
                    format!("{}  type {:?} + Enter", self.name(s), text)
                }
                Event::Text(s, text, false) => {
                    format!("{}  type {:?} (no Enter)", self.name(s), text)
                }
                Event::Wait(delay) => format!("wait {:?}", delay),
                Event::Focus(s) => format!("{}  focus", self.name(s)),
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

/// Run `config` through the driver exactly as a real run would, returning
/// the rendered plan and the report.
pub fn plan(
    config: &Config,
    new_window: bool,
    probe: &dyn ToolProbe,
) -> Result<(String, RunReport)> {
    let mut dry = DryRun::new();
    let report = Driver::new(&mut dry, probe)
        .new_window(new_window)
        .run(config)?;
    Ok((dry.render(), report))
}

impl Terminal for DryRun {
    fn prepare_window(&mut self, new_window: bool, profile: &str) -> Result<SessionId> {
        let session = self.new_session();
        self.events.push(Event::Window {
            new_window,
            profile: profile.to_string(),
            session: session.clone(),
        });
        Ok(session)
    }

    fn find_tab(&mut self, title: &str) -> Result<Option<SessionId>> {
        // No live tabs to search, so reuse always falls back to a new tab.
        self.events.push(Event::FindTab {
            title: title.to_string(),
        });
        Ok(None)
    }

    fn create_tab(&mut self, profile: &str) -> Result<SessionId> {
        let session = self.new_session();
        self.events.push(Event::CreateTab {
            profile: profile.to_string(),
            session: session.clone(),
        });
        Ok(session)
    }

    fn set_tab_title(&mut self, session: &SessionId, title: &str) -> Result<()> {
        self.events
            .push(Event::TabTitle(session.clone(), title.to_string()));
        Ok(())
    }

    fn split(
        &mut self,
        parent: &SessionId,
        direction: Direction,
        profile: &str,
    ) -> Result<SessionId> {
        let session = self.new_session();
        self.events.push(Event::Split {
            parent: parent.clone(),
            direction,
            profile: profile.to_string(),
            session: session.clone(),
        });
        Ok(session)
    }

    fn set_title(&mut self, session: &SessionId, title: &str) -> Result<()> {
        self.events.push(Event::Title(session.clone(), title.to_string()));
        Ok(())
    }

    fn set_profile(&mut self, session: &SessionId, profile: &str) -> Result<()> {
        self.events
            .push(Event::Profile(session.clone(), profile.to_string()));
        Ok(())
    }

    fn set_color_preset(&mut self, session: &SessionId, preset: &str) -> Result<()> {
        self.events
            .push(Event::ColorPreset(session.clone(), preset.to_string()));
        Ok(())
    }

    fn set_badge(&mut self, session: &SessionId, text: &str, theme: BadgeTheme) -> Result<()> {
        self.events
            .push(Event::Badge(session.clone(), text.to_string(), theme));
        Ok(())
    }

    fn send_text(&mut self, session: &SessionId, text: &str, enter: bool) -> Result<()> {
        self.events
            .push(Event::Text(session.clone(), text.to_string(), enter));
        Ok(())
    }

    fn wait(&mut self, delay: Duration) {
        self.events.push(Event::Wait(delay));
    }

    fn focus(&mut self, session: &SessionId) -> Result<()> {
        self.events.push(Event::Focus(session.clone()));
        Ok(())
    }

    fn bind(&mut self, session: &SessionId, label: &str) {
        self.labels.insert(session.clone(), label.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_uses_bound_labels() {
        let mut dry = DryRun::new();
        let root = dry.prepare_window(false, "Default").unwrap();
        dry.bind(&root, "dev:1/1/1");
        let right = dry.split(&root, Direction::Vertical, "Default").unwrap();
        dry.bind(&right, "dev:2/1/1");
        dry.send_text(&right, "htop", true).unwrap();
        dry.send_text(&root, "git commit -m \"", false).unwrap();
        dry.wait(Duration::from_millis(1500));
        dry.focus(&right).unwrap();

        assert_eq!(
            dry.render(),
            "use current window (profile \"Default\") -> dev:1/1/1\n\
             dev:1/1/1  split vertically (profile \"Default\") -> dev:2/1/1\n\
             dev:2/1/1  type \"htop\" + Enter\n\
             dev:1/1/1  type \"git commit -m \\\"\" (no Enter)\n\
             wait 1.5s\n\
             dev:2/1/1  focus\n"
        );
    }

    #[test]
    fn test_plan_honours_new_window() {
        let config = crate::loader::build_config(
            crate::loader::parse_document("tabs:\n  dev:\n    panes: [{ position: 1/1 }]\n")
                .unwrap(),
            &|_: &str| None,
        )
        .unwrap();
        let none = |_: &str| false;

        let (rendered, report) = plan(&config, true, &none).unwrap();
        assert!(report.is_success());
        assert_eq!(rendered, "open new window (profile \"Default\") -> dev:1/1/1\n");

        let (rendered, _) = plan(&config, false, &none).unwrap();
        assert!(rendered.starts_with("use current window"));
    }

    #[test]
    fn test_unbound_sessions_show_ids() {
        let mut dry = DryRun::new();
        assert_eq!(dry.find_tab("API").unwrap(), None);
        let tab = dry.create_tab("Dark").unwrap();
        dry.set_badge(&tab, "API", BadgeTheme::Info).unwrap();
        assert_eq!(dry.len(), 3);
        assert_eq!(
            dry.render(),
            "look for tab titled \"API\"\n\
             create tab (profile \"Dark\") -> s0\n\
             s0  set badge \"API\" (info)\n"
        );
    }
}
