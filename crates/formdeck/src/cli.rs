use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::app::App;
use crate::cmd::{
    self, check::CheckArgs, docs::DocsCommand, field::FieldCommand, forms::FormsCommand,
    submit::SubmitArgs,
};
use crate::config::{ConfigFile, Overrides, Settings};
use crate::logging;

#[derive(Parser, Debug)]
#[command(
    name = "formdeck",
    about = "Manage form definitions, submissions and documents for the cabinet inventory",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Path to formdeck.toml
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the table files
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level or tracing filter directives
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Print machine readable JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Insert the built-in form definitions that are missing
    Seed,
    /// Inspect and manage form definitions
    #[command(subcommand)]
    Forms(FormsCommand),
    /// Add, update, move or remove fields of a form
    #[command(subcommand)]
    Field(FieldCommand),
    /// Validate values against a form without saving them
    Check(CheckArgs),
    /// Validate values and save them to the form's table
    Submit(SubmitArgs),
    /// Manage the document library
    #[command(subcommand)]
    Docs(DocsCommand),
}

/// Output switches shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let (file, config_path) =
        ConfigFile::discover(cli.config.as_deref()).context("failed to load configuration")?;
    let settings = Settings::resolve(
        file,
        config_path,
        Overrides {
            data_dir: cli.data_dir.clone(),
            log_level: cli.log_level.clone(),
        },
    )?;
    logging::init(settings.log_level.as_deref());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let app = App::open(settings)?;
    let out = Output { json: cli.json };
    runtime.block_on(dispatch(&app, cli.command, out))
}

async fn dispatch(app: &App, command: Commands, out: Output) -> Result<()> {
    match command {
        Commands::Seed => cmd::seed::run(app, out).await,
        Commands::Forms(command) => cmd::forms::run(app, command, out).await,
        Commands::Field(command) => cmd::field::run(app, command, out).await,
        Commands::Check(args) => cmd::check::run(app, args, out).await,
        Commands::Submit(args) => cmd::submit::run(app, args, out).await,
        Commands::Docs(command) => cmd::docs::run(app, command, out).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "formdeck",
            "forms",
            "list",
            "--json",
            "--data-dir",
            "/tmp/formdeck",
            "--log-level",
            "debug",
        ])
        .expect("expected CLI to parse");
        assert!(cli.json);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/formdeck")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Commands::Forms(FormsCommand::List)));
    }

    #[test]
    fn parses_submit_with_record() {
        let cli = Cli::try_parse_from([
            "formdeck",
            "submit",
            "suppliers",
            "--values",
            "values.json",
            "--record",
            "sup-1",
        ])
        .expect("expected CLI to parse");
        match cli.command {
            Commands::Submit(args) => {
                assert_eq!(args.form, "suppliers");
                assert_eq!(args.values, PathBuf::from("values.json"));
                assert_eq!(args.record.as_deref(), Some("sup-1"));
            }
            _ => panic!("expected submit args"),
        }
    }

    #[test]
    fn field_move_accepts_negative_order() {
        let cli = Cli::try_parse_from(["formdeck", "field", "move", "suppliers", "phone", "-2"])
            .expect("expected CLI to parse");
        match cli.command {
            Commands::Field(FieldCommand::Move(args)) => {
                assert_eq!(args.field, "phone");
                assert_eq!(args.order, -2);
            }
            _ => panic!("expected field move"),
        }
    }

    #[test]
    fn check_requires_values() {
        assert!(Cli::try_parse_from(["formdeck", "check", "suppliers"]).is_err());
    }
}
