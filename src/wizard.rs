//! Interactive config authoring (`--wizard`).
//!
//! [`Prompter`] reads answers from any [`BufRead`] and writes questions to
//! any [`Write`], so the whole flow runs against in-memory buffers in tests.

use crate::config::{Badge, BadgeTheme, Cmd, Config, Pane, Tab, DEFAULT_PROFILE};
use crate::error::{Result, TermisError};
use crate::loader::DEFAULT_CONFIG;
use crate::position::parse_position;
use crate::profile::{validate_name, ProfileStore};
use crate::tools::{DockerConfig, DockerRun, GitConfig, ToolsConfig, VsCodeConfig};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Line-oriented question and answer over a reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a line of text.
    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Ask a question and return the trimmed answer (possibly empty).
    ///
    /// # Errors
    ///
    /// [`TermisError::InvalidInput`] if input ends before an answer.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(TermisError::InvalidInput("unexpected end of input".into()));
        }
        Ok(line.trim().to_string())
    }

    /// Ask, substituting `default` for an empty answer.
    pub fn ask_or(&mut self, question: &str, default: &str) -> Result<String> {
        let answer = self.ask(&format!("{} [{}]: ", question, default))?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    /// Ask for an optional value; an empty answer is `None`.
    pub fn ask_optional(&mut self, question: &str) -> Result<Option<String>> {
        let answer = self.ask(&format!("{} [optional]: ", question))?;
        Ok((!answer.is_empty()).then_some(answer))
    }

    /// Yes/no question, defaulting to no.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} (y/n) [n]: ", question))?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    /// Ask until the answer is a non-negative integer.
    pub fn count(&mut self, question: &str) -> Result<usize> {
        loop {
            let answer = self.ask(&format!("{}: ", question))?;
            match answer.parse() {
                Ok(n) => return Ok(n),
                Err(_) => self.say(&format!("'{}' is not a number", answer))?,
            }
        }
    }

    /// Collect lines until an empty one.
    pub fn lines(&mut self, intro: &str) -> Result<Vec<String>> {
        self.say(intro)?;
        let mut lines = Vec::new();
        loop {
            let line = self.ask("> ")?;
            if line.is_empty() {
                return Ok(lines);
            }
            lines.push(line);
        }
    }
}

/// Run the wizard, returning where to save and what was configured.
pub fn run<R: BufRead, W: Write>(prompt: &mut Prompter<R, W>) -> Result<(PathBuf, Config)> {
    prompt.say("Termis Configuration Wizard")?;
    prompt.say("===========================")?;

    let mut config = Config {
        profile: Some(prompt.ask_or("Default iTerm profile to use", DEFAULT_PROFILE)?),
        ..Default::default()
    };

    let tab_count = prompt.count("Number of tabs to configure")?;
    for i in 1..=tab_count {
        let name = loop {
            let name = prompt.ask(&format!("Tab {} ID: ", i))?;
            if name.is_empty() {
                prompt.say("Tab ID cannot be empty")?;
            } else {
                break name;
            }
        };
        let tab = configure_tab(prompt, &name)?;
        config.tabs.insert(name, tab);
    }

    let path = prompt.ask_or("Save configuration to", DEFAULT_CONFIG)?;
    Ok((PathBuf::from(path), config))
}

fn configure_tab<R: BufRead, W: Write>(prompt: &mut Prompter<R, W>, name: &str) -> Result<Tab> {
    let title = prompt.ask_optional(&format!("Title for tab '{}'", name))?;
    let root = prompt.ask_optional(&format!("Root directory for tab '{}'", name))?;
    let reuse = prompt.confirm("Reuse existing tab with same title?")?;

    let pane_count = prompt.count(&format!("Number of panes for tab '{}'", name))?;
    let mut panes = Vec::with_capacity(pane_count);
    for j in 1..=pane_count {
        panes.push(configure_pane(prompt, j)?);
    }

    Ok(Tab {
        title,
        root,
        profile: None,
        reuse,
        panes,
    })
}

fn configure_pane<R: BufRead, W: Write>(prompt: &mut Prompter<R, W>, j: usize) -> Result<Pane> {
    let position = loop {
        let answer = prompt.ask(&format!("Position for pane {} (e.g., '1/1', '1/2'): ", j))?;
        match parse_position(&answer) {
            Ok(_) => break answer,
            Err(e) => prompt.say(&e.to_string())?,
        }
    };
    let title = prompt.ask_optional(&format!("Title for pane {}", j))?;

    let badge = match prompt.ask_optional(&format!("Badge for pane {}", j))? {
        Some(text) => {
            let names: Vec<&str> = BadgeTheme::ALL.iter().map(|t| t.name()).collect();
            let theme = prompt.ask(&format!("Badge theme ({}) [default]: ", names.join("/")))?;
            Some(match BadgeTheme::from_name(&theme) {
                Some(theme) if theme != BadgeTheme::Default => Badge::Styled { text, theme },
                _ => Badge::Text(text),
            })
        }
        None => None,
    };

    let working_directory = prompt.ask_optional(&format!("Working directory for pane {}", j))?;
    let profile = prompt.ask_optional(&format!(
        "Profile for pane {} (defaults to tab profile)",
        j
    ))?;

    let commands = prompt.lines(&format!(
        "Enter commands for pane {} (empty line to finish):",
        j
    ))?;
    let commands = match commands.len() {
        0 => None,
        1 => commands.into_iter().next().map(Cmd::Single),
        _ => Some(Cmd::Multiple(commands)),
    };

    let tools = configure_tools(prompt)?;

    Ok(Pane {
        position,
        title,
        badge,
        working_directory,
        commands,
        profile,
        tools: (!tools.is_empty()).then_some(tools),
        ..Default::default()
    })
}

fn configure_tools<R: BufRead, W: Write>(prompt: &mut Prompter<R, W>) -> Result<ToolsConfig> {
    let mut tools = ToolsConfig::default();
    if !prompt.confirm("Configure tool integrations?")? {
        return Ok(tools);
    }

    if prompt.confirm("Configure VS Code integration?")? {
        let files = prompt.ask("Files to open (space-separated) [optional]: ")?;
        tools.vscode = Some(VsCodeConfig {
            files: files.split_whitespace().map(String::from).collect(),
            new_window: prompt.confirm("Open in new window?")?,
            extensions: Vec::new(),
        });
    }

    if prompt.confirm("Configure Git integration?")? {
        tools.git = Some(GitConfig {
            clone: prompt.ask_optional("Repository to clone")?,
            checkout: prompt.ask_optional("Branch to checkout")?,
            pull: prompt.confirm("Pull updates?")?,
            ..Default::default()
        });
    }

    if prompt.confirm("Configure Docker integration?")? {
        let mut docker = DockerConfig::default();
        if prompt.confirm("Configure docker-compose?")? {
            docker.compose = Some(prompt.ask("docker-compose command (e.g., 'up -d'): ")?);
            docker.compose_file = prompt.ask_optional("Path to docker-compose.yml")?;
        }
        if prompt.confirm("Configure docker run?")? {
            docker.run = Some(DockerRun {
                image: prompt.ask("Docker image: ")?,
                detach: prompt.confirm("Run in detached mode?")?,
                interactive: prompt.confirm("Run in interactive mode?")?,
                ..Default::default()
            });
        }
        tools.docker = Some(docker);
    }
    Ok(tools)
}

/// Serialize `config` as YAML to `path`.
pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    let yaml = serde_yaml_ng::to_string(config)?;
    std::fs::write(path, yaml)?;
    info!("Configuration saved to {}", path.display());
    Ok(())
}

/// Offer to store the config at `path` as a named profile.
///
/// Returns the profile name if one was saved.
pub fn offer_profile<R: BufRead, W: Write>(
    prompt: &mut Prompter<R, W>,
    store: &mut dyn ProfileStore,
    path: &Path,
) -> Result<Option<String>> {
    if !prompt.confirm("Save this configuration as a global profile?")? {
        return Ok(None);
    }
    let name = loop {
        let name = prompt.ask("Profile name: ")?;
        match validate_name(&name) {
            Ok(()) => break name,
            Err(e) => prompt.say(&e.to_string())?,
        }
    };
    if store.contains(&name)? && !prompt.confirm(&format!("Profile '{}' exists. Overwrite?", name))? {
        return Ok(None);
    }
    crate::profile::save_config(store, path, &name)?;
    prompt.say(&format!("Profile '{}' saved", name))?;
    Ok(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{build_config, parse_document};
    use crate::profile::MemoryProfileStore;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn prompter(answers: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(answers.as_bytes().to_vec()), Vec::new())
    }

    const SESSION: &str = "\
Solarized
two
1
api

~/src/api
y
2
1/1
Server
API
success

Dark
cargo run

n
9
1/2




make test
npm test

y
n
y

main
y
n
my.yml
";

    #[test]
    fn test_wizard_builds_config() {
        let mut prompt = prompter(SESSION);
        let (path, config) = run(&mut prompt).unwrap();
        assert_eq!(path, PathBuf::from("my.yml"));
        assert_eq!(config.profile.as_deref(), Some("Solarized"));

        let api = config.tabs.get("api").unwrap();
        assert_eq!(api.title, None);
        assert_eq!(api.root.as_deref(), Some("~/src/api"));
        assert!(api.reuse);
        assert_eq!(api.panes.len(), 2);

        let server = &api.panes[0];
        assert_eq!(server.position, "1/1");
        assert_eq!(server.title.as_deref(), Some("Server"));
        assert_eq!(
            server.badge,
            Some(Badge::Styled {
                text: "API".into(),
                theme: BadgeTheme::Success
            })
        );
        assert_eq!(server.profile.as_deref(), Some("Dark"));
        assert_eq!(server.commands(), ["cargo run"]);
        assert!(server.tools.is_none());

        let tests = &api.panes[1];
        assert_eq!(tests.position, "1/2");
        assert_eq!(tests.commands(), ["make test", "npm test"]);
        let git = tests.tools.as_ref().and_then(|t| t.git.as_ref()).unwrap();
        assert_eq!(git.checkout.as_deref(), Some("main"));
        assert!(git.pull);

        let output = String::from_utf8(prompt.output).unwrap();
        assert!(output.contains("'two' is not a number"));
        assert!(output.contains("Invalid position format: '9'"));
    }

    #[test]
    fn test_written_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let mut prompt = prompter(SESSION);
        let (_, config) = run(&mut prompt).unwrap();

        let path = dir.path().join("termis.yml");
        write_config(&path, &config).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let loaded = build_config(parse_document(&text).unwrap(), &|_: &str| None).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_eof_is_an_error() {
        let mut prompt = prompter("Default\n");
        assert!(matches!(
            run(&mut prompt),
            Err(TermisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_offer_profile() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("termis.yml");
        std::fs::write(&path, "tabs: {}\n").unwrap();
        let mut store = MemoryProfileStore::default();

        let mut prompt = prompter("y\nbad name\nwork\n");
        assert_eq!(
            offer_profile(&mut prompt, &mut store, &path).unwrap().as_deref(),
            Some("work")
        );
        assert_eq!(store.get("work").unwrap(), "tabs: {}\n");

        std::fs::write(&path, "tabs: null\n").unwrap();
        let mut prompt = prompter("y\nwork\nn\n");
        assert_eq!(offer_profile(&mut prompt, &mut store, &path).unwrap(), None);
        assert_eq!(store.get("work").unwrap(), "tabs: {}\n");

        let mut prompt = prompter("n\n");
        assert_eq!(offer_profile(&mut prompt, &mut store, &path).unwrap(), None);
    }
}
