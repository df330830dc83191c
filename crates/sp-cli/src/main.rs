use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use sp_core::ScheduleGateway;
use tracing_subscriber::EnvFilter;

use sp_cli::commands::generate::GenerateArgs;
use sp_cli::commands::{generate, show, subjects};
use sp_cli::{Cli, Commands, Config, Store, SubjectsAction, gateway_error};

/// Load config and open the configured backend.
fn open_store(config_path: Option<&Path>) -> Result<(Store, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let store = Store::open(&config)?;
    Ok((store, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout().lock();

    match cli.command {
        Some(Commands::Subjects(action)) => {
            let (store, _config) = open_store(cli.config.as_deref())?;
            match action {
                SubjectsAction::Add {
                    name,
                    hours,
                    studied,
                    deadline,
                } => subjects::add(&mut stdout, store.local()?, &name, hours, studied, deadline)?,
                SubjectsAction::List { json } => {
                    let runtime =
                        tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
                    let all = runtime.block_on(store.subjects())?;
                    subjects::list(&mut stdout, &all, json)?;
                }
                SubjectsAction::Studied { name, hours } => {
                    subjects::set_studied(&mut stdout, store.local()?, &name, hours)?;
                }
                SubjectsAction::Remove { name } => {
                    subjects::remove(&mut stdout, store.local()?, &name)?;
                }
            }
        }
        Some(Commands::Generate {
            start,
            end,
            subjects: selected,
            blocks,
            no_blocks,
        }) => {
            let (mut store, config) = open_store(cli.config.as_deref())?;
            let planner = config.planner_config()?;
            let retry = config.retry_policy();
            let args = GenerateArgs {
                start,
                end,
                subjects: selected,
                blocks,
                no_blocks,
            };
            let runtime =
                tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
            runtime.block_on(async {
                let known = store.subjects().await?;
                generate::run(&mut stdout, &mut store, known, &args, &planner, &retry).await
            })?;
        }
        Some(Commands::Show { json, date }) => {
            let (mut store, _config) = open_store(cli.config.as_deref())?;
            let runtime =
                tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
            let loaded = runtime
                .block_on(store.load_schedules())
                .map_err(|err| gateway_error(err, "failed to load schedules"))?;
            show::run(&mut stdout, &loaded, date, json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
