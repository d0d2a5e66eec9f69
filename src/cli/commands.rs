//! Command dispatch

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::diagnostics::{DumpOptions, GraphDumper};
use crate::domain::Tree;
use crate::script::{Runner, DEMO_SCRIPT};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Run {
            script,
            dump_on_error,
            max_nodes,
            no_render,
        }) => {
            let mut settings = load_settings(cli)?;
            if *dump_on_error {
                settings.dump_on_error = true;
            }
            if max_nodes.is_some() {
                settings.max_nodes = *max_nodes;
            }
            if *no_render {
                settings.render = false;
            }
            run_script(&settings, script)
        }
        Some(Commands::Demo { dump }) => demo(&load_settings(cli)?, *dump),
        Some(Commands::Config { command }) => config(cli, command),
        Some(Commands::Completion { shell }) => {
            completion(*shell);
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see --help".to_string(),
        )),
    }
}

fn config_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.config_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().map_err(|e| CliError::io(".", e)),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let dir = config_dir(cli)?;
    if !dir.is_dir() {
        output::warning(&format!(
            "config directory not found, using defaults: {}",
            dir.display()
        ));
    }
    Ok(Settings::load(Some(dir.as_path()))?)
}

/// Runner over a fresh tree, configured from `settings`.
pub fn build_runner<W: Write>(settings: &Settings, out: W) -> Runner<W> {
    let tree = match settings.max_nodes {
        Some(limit) => Tree::with_node_limit(limit),
        None => Tree::new(),
    };
    let dumper = GraphDumper::new(DumpOptions::from_settings(settings));
    debug!(
        node_limit = ?tree.node_limit(),
        dump_dir = %dumper.options().dump_dir.display(),
        renderer = ?dumper.options().renderer,
        "runner configured"
    );
    Runner::new(tree, dumper, out).with_dump_on_error(settings.dump_on_error)
}

fn read_script(path: &Path) -> CliResult<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| CliError::io("<stdin>", e))?;
        return Ok(source);
    }
    fs::read_to_string(path).map_err(|e| CliError::io(path, e))
}

#[instrument(skip(settings))]
fn run_script(settings: &Settings, script: &Path) -> CliResult<()> {
    let source = read_script(script)?;
    debug!(bytes = source.len(), "script loaded");

    let mut runner = build_runner(settings, io::stdout().lock());
    runner.run_source(&source)?;
    Ok(())
}

#[instrument(skip(settings))]
fn demo(settings: &Settings, dump: bool) -> CliResult<()> {
    output::header("sample tree");
    let mut runner = build_runner(settings, io::stdout().lock());
    runner.run_source(DEMO_SCRIPT)?;
    if dump {
        runner.run_source("dump")?;
    }
    Ok(())
}

fn config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                local_config_path(&config_dir(cli)?)
            };
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| CliError::io(parent, e))?;
            }
            fs::write(&path, Settings::template()).map_err(|e| CliError::io(&path, e))?;
            output::action("Created", &path.display());
        }
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unavailable>".to_string());
            output::info(&format!("global: {}", global));
            output::info(&format!(
                "local:  {}",
                local_config_path(&config_dir(cli)?).display()
            ));
        }
    }
    Ok(())
}

fn completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
