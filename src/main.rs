//! Termis CLI entry point.
//!
//! This binary provides the `termis` command for laying out iTerm2 tabs and
//! panes from YAML configuration.

use clap::Parser;
use std::io;
use termis::cli::Cli;
use termis::driver::{Driver, RunReport};
use termis::dry_run;
use termis::error::Result;
use termis::iterm::ITerm2;
use termis::profile::{self, FsProfileStore, ProfileStore};
use termis::tools::{self, PathProbe};
use termis::wizard::{self, Prompter};
use termis::{Config, TermisError, loader, logging};
use tracing::info;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: &Cli) -> Result<()> {
    if cli.tools_check {
        print_tools();
        return Ok(());
    }

    if cli.wizard {
        return run_wizard();
    }

    let mut store = FsProfileStore::new(loader::profiles_dir()?);
    let config_path = loader::config_path(cli.config.as_deref());

    if cli.list_profiles {
        print!("{}", profile::format_summaries(&profile::summaries(&store)?));
        return Ok(());
    }

    if let Some(name) = &cli.save_profile {
        return save_profile(&mut store, &config_path, name);
    }

    let config = loader::load(&config_path, cli.profile.as_deref(), &store)?;
    if cli.dry_run {
        run_dry(&config, cli.new)
    } else {
        run_iterm(&config, cli.new)
    }
}

/// Print the availability of every supported tool.
fn print_tools() {
    println!("Checking available development tools:");
    for (tool, available) in tools::check_tools(&PathProbe) {
        let status = if available { "Available" } else { "Not available" };
        println!("  {:10}: {}", tool.name(), status);
    }
}

fn run_wizard() -> Result<()> {
    let mut prompt = Prompter::new(io::stdin().lock(), io::stdout());
    let (path, config) = wizard::run(&mut prompt)?;
    wizard::write_config(&path, &config)?;
    prompt.say(&format!("Configuration created at {}", path.display()))?;

    let mut store = FsProfileStore::new(loader::profiles_dir()?);
    wizard::offer_profile(&mut prompt, &mut store, &path)?;
    prompt.say("Run 'termis' to apply this configuration.")
}

/// Store the config file as a profile, confirming before replacing one.
fn save_profile(store: &mut FsProfileStore, config_path: &std::path::Path, name: &str) -> Result<()> {
    profile::validate_name(name)?;
    if store.contains(name)? {
        let mut prompt = Prompter::new(io::stdin().lock(), io::stdout());
        if !prompt.confirm(&format!("Profile '{}' already exists. Overwrite?", name))? {
            println!("Operation cancelled.");
            return Ok(());
        }
    }
    profile::save_config(store, config_path, name)?;
    println!(
        "Saved {} as profile '{}' in {}",
        config_path.display(),
        name,
        store.dir().display()
    );
    Ok(())
}

/// Print the operations a run would perform.
fn run_dry(config: &Config, new_window: bool) -> Result<()> {
    let (plan, report) = dry_run::plan(config, new_window, &PathProbe)?;
    print!("{}", plan);
    finish(report)
}

fn run_iterm(config: &Config, new_window: bool) -> Result<()> {
    let mut iterm = ITerm2::connect()?;
    let report = Driver::new(&mut iterm, &PathProbe)
        .new_window(new_window)
        .run(config)?;
    finish(report)
}

fn finish(report: RunReport) -> Result<()> {
    info!(
        "{} tab(s) configured, {} skipped",
        report.configured.len(),
        report.skipped.len()
    );
    if report.is_success() {
        return Ok(());
    }
    for failure in &report.failures {
        eprintln!("Error: {}", failure);
    }
    Err(TermisError::TabsFailed {
        failed: report.failures.len(),
        total: report.configured.len() + report.failures.len(),
    })
}
