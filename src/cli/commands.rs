//! Command dispatch for the CLI.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::{load_literal, load_script, ApplicationError, ScriptRunner};
use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::outline::ToOutline;
use crate::cli::output;
use crate::config::Settings;
use crate::domain::TreeEngine;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Some(command) => {
            let settings = Settings::load(cli.config.as_deref())?;
            debug!("settings: {:?}", settings);
            match command {
                Commands::Build { file, outline } => _build(&settings, file, *outline),
                Commands::Run { script, outline } => _run(&settings, script, *outline),
                Commands::Config => _config(&settings),
                Commands::Completion { .. } => Ok(()),
            }
        }
        None => Err(CliError::Usage(
            "no command given, try 'structree --help'".to_string(),
        )),
    }
}

#[instrument(skip(settings))]
fn _build(settings: &Settings, file: &Path, outline: bool) -> CliResult<()> {
    let literal = load_literal(file)?;
    let mut engine = TreeEngine::with_options(settings.engine_options());
    let root = engine.build(literal)?;

    if outline {
        output::info(&root.to_outline());
    } else {
        output::info(&to_json(root, settings.pretty)?);
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _run(settings: &Settings, script: &Path, outline: bool) -> CliResult<()> {
    let content = load_script(script)?;
    let mut runner = ScriptRunner::new(TreeEngine::with_options(settings.engine_options()));

    // one outcome per line, so never pretty
    let applied = runner.run_each(&content, |outcome| {
        output::info(&to_json(outcome, false)?);
        Ok(())
    })?;
    debug!("applied {} commands", applied);

    if outline {
        output::header("structure");
        output::info(&runner.engine().structure().to_outline());
    }
    if applied == 0 {
        output::warning(&format!("no commands in {}", script.display()));
    }
    Ok(())
}

fn _config(settings: &Settings) -> CliResult<()> {
    output::info(&settings.to_toml()?);
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, ApplicationError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}
