//! Development tool integrations.
//!
//! A pane's `tools` block turns into shell commands that run before the
//! pane's own `commands`:
//!
//! ```yaml
//! tools:
//!   git:
//!     checkout: main
//!     pull: true
//!   docker:
//!     compose: up -d
//!   vscode:
//!     files: [README.md]
//! ```
//!
//! Tools whose binaries are not on `PATH` are skipped with a warning.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Answers "is this binary installed?".
pub trait ToolProbe {
    fn has(&self, binary: &str) -> bool;
}

impl<F> ToolProbe for F
where
    F: Fn(&str) -> bool,
{
    fn has(&self, binary: &str) -> bool {
        self(binary)
    }
}

/// Looks binaries up on the `PATH` of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathProbe;

impl ToolProbe for PathProbe {
    fn has(&self, binary: &str) -> bool {
        let Some(paths) = std::env::var_os("PATH") else {
            return false;
        };
        std::env::split_paths(&paths).any(|dir| is_executable(&dir.join(binary)))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// The supported integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    VsCode,
    Git,
    Docker,
}

impl Tool {
    /// All integrations, in the order their commands are generated.
    pub const ALL: [Tool; 3] = [Tool::VsCode, Tool::Git, Tool::Docker];

    /// Key used in the `tools` block.
    pub fn name(self) -> &'static str {
        match self {
            Tool::VsCode => "vscode",
            Tool::Git => "git",
            Tool::Docker => "docker",
        }
    }

    /// Binaries that satisfy this tool, in order of preference.
    pub fn binaries(self) -> &'static [&'static str] {
        match self {
            Tool::VsCode => &["code", "code-insiders"],
            Tool::Git => &["git"],
            Tool::Docker => &["docker"],
        }
    }

    /// First installed binary for this tool.
    pub fn binary(self, probe: &dyn ToolProbe) -> Option<&'static str> {
        self.binaries().iter().copied().find(|b| probe.has(b))
    }

    pub fn is_available(self, probe: &dyn ToolProbe) -> bool {
        self.binary(probe).is_some()
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Availability of every integration, for `--tools-check`.
pub fn check_tools(probe: &dyn ToolProbe) -> Vec<(Tool, bool)> {
    Tool::ALL
        .iter()
        .map(|&tool| (tool, tool.is_available(probe)))
        .collect()
}

/// The `tools` block of a pane.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vscode: Option<VsCodeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerConfig>,
    /// Unrecognized tool sections; warned about and ignored.
    #[serde(flatten, default)]
    pub unknown: BTreeMap<String, serde_yaml_ng::Value>,
}

impl ToolsConfig {
    pub fn is_empty(&self) -> bool {
        self.vscode.is_none() && self.git.is_none() && self.docker.is_none()
    }
}

/// Open files or the working directory in VS Code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VsCodeConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub new_window: bool,
    /// Extensions to install before opening.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pull: bool,
    /// `git config <key> '<value>'` entries.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockerConfig {
    /// Arguments to `docker-compose`, e.g. `up -d`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compose_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<DockerRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<DockerBuild>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockerRun {
    pub image: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub detach: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub interactive: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockerBuild {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Build the commands for every available tool in `tools`.
///
/// Output order is vscode, git, docker regardless of the order in the config.
pub fn tool_commands(
    tools: &ToolsConfig,
    working_dir: Option<&str>,
    probe: &dyn ToolProbe,
) -> Vec<String> {
    for name in tools.unknown.keys() {
        warn!("Unknown tool '{}' ignored", name);
    }

    let mut commands = Vec::new();
    for tool in Tool::ALL {
        let configured = match tool {
            Tool::VsCode => tools.vscode.is_some(),
            Tool::Git => tools.git.is_some(),
            Tool::Docker => tools.docker.is_some(),
        };
        if !configured {
            continue;
        }
        let Some(binary) = tool.binary(probe) else {
            warn!("Tool '{}' is not available on this system", tool);
            continue;
        };

        let generated = match tool {
            Tool::VsCode => tools
                .vscode
                .as_ref()
                .map(|c| vscode_commands(c, binary, working_dir)),
            Tool::Git => tools.git.as_ref().map(git_commands),
            Tool::Docker => tools.docker.as_ref().map(docker_commands),
        }
        .unwrap_or_default();

        debug!("{} generated {} command(s)", tool, generated.len());
        commands.extend(generated);
    }
    commands
}

fn vscode_commands(config: &VsCodeConfig, binary: &str, working_dir: Option<&str>) -> Vec<String> {
    let mut commands: Vec<String> = config
        .extensions
        .iter()
        .map(|ext| format!("{} --install-extension {}", binary, ext))
        .collect();

    let mut open = binary.to_string();
    if let Some(dir) = working_dir {
        open.push(' ');
        open.push_str(dir);
    }
    for file in &config.files {
        open.push(' ');
        open.push_str(file);
    }
    if config.new_window {
        open.push_str(" --new-window");
    }
    commands.push(open);
    commands
}

fn git_commands(config: &GitConfig) -> Vec<String> {
    let mut commands = Vec::new();
    if let Some(url) = &config.clone {
        match &config.target_dir {
            Some(dir) if !dir.is_empty() => commands.push(format!("git clone {} {}", url, dir)),
            _ => commands.push(format!("git clone {}", url)),
        }
    }
    if let Some(branch) = &config.checkout {
        commands.push(format!("git checkout {}", branch));
    }
    if config.pull {
        commands.push("git pull".to_string());
    }
    for (key, value) in &config.config {
        commands.push(format!("git config {} '{}'", key, value));
    }
    commands
}

fn docker_commands(config: &DockerConfig) -> Vec<String> {
    let mut commands = Vec::new();

    if let Some(compose) = &config.compose {
        let mut cmd = String::from("docker-compose");
        if let Some(file) = &config.compose_file {
            cmd.push_str(&format!(" -f {}", file));
        }
        cmd.push_str(&format!(" {}", compose));
        commands.push(cmd);
    }

    if let Some(run) = &config.run {
        let mut cmd = String::from("docker run");
        if run.detach {
            cmd.push_str(" -d");
        }
        if run.interactive {
            cmd.push_str(" -it");
        }
        for port in &run.ports {
            cmd.push_str(&format!(" -p {}", port));
        }
        for volume in &run.volumes {
            cmd.push_str(&format!(" -v {}", volume));
        }
        for (key, value) in &run.env {
            cmd.push_str(&format!(" -e {}={}", key, value));
        }
        cmd.push_str(&format!(" {}", run.image));
        if let Some(command) = &run.command {
            cmd.push_str(&format!(" {}", command));
        }
        commands.push(cmd);
    }

    if let Some(build) = &config.build {
        let mut cmd = format!("docker build -t {}", build.tag);
        if let Some(dockerfile) = &build.dockerfile {
            cmd.push_str(&format!(" -f {}", dockerfile));
        }
        cmd.push_str(&format!(" {}", build.context.as_deref().unwrap_or(".")));
        commands.push(cmd);
    }

    commands
}
