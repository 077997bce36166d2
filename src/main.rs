//! Workbasket engine CLI
//!
//! A thin shell over the engine facade: every subcommand maps to one manager
//! call and prints its result as JSON.

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use workbasket_engine::cli::{Cli, Command, WorkbasketArgs};
use workbasket_engine::config::Config;
use workbasket_engine::engine::Engine;
use workbasket_engine::logging::{self, LogTarget};
use workbasket_engine::types::{Workbasket, WorkbasketAccessItem};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn workbasket_from_args(args: WorkbasketArgs) -> Workbasket {
    Workbasket {
        id: args.id.unwrap_or_default(),
        name: args.name,
        description: args.description,
        owner: args.owner,
        distribution_targets: args.targets,
        ..Workbasket::default()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load(path)?;
            config.apply_env_overrides();
            config
        }
        None => Config::load_or_default(),
    };
    if let Some(database) = &cli.database {
        config.database.path = PathBuf::from(database);
    }
    if let Some(mode) = cli.mode {
        config.engine.connection_mode = mode;
    }
    if let Some(principal) = &cli.principal {
        config.engine.principal = Some(principal.clone());
    }

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    logging::init(&LogTarget::parse(&cli.log), &level)?;

    let engine = Engine::open(&config).with_context(|| {
        format!("failed to open database {}", config.database.path.display())
    })?;
    tracing::debug!(
        mode = %engine.connection_mode(),
        principal = ?engine.current_principal(),
        "Engine ready"
    );

    match cli.command {
        Command::Create(args) => {
            let created = engine
                .workbasket_manager()
                .create(workbasket_from_args(args))?;
            print_json(&created)?;
        }
        Command::Get { id } => {
            print_json(&engine.workbasket_manager().get(&id)?)?;
        }
        Command::List => {
            print_json(&engine.workbasket_manager().list()?)?;
        }
        Command::Update(args) => {
            if args.id.is_none() {
                bail!("--id is required for update");
            }
            let updated = engine
                .workbasket_manager()
                .update(workbasket_from_args(args))?;
            print_json(&updated)?;
        }
        Command::Targets { id } => {
            print_json(&engine.workbasket_manager().get_distribution_targets(&id)?)?;
        }
        Command::Grant(args) => {
            let item = args
                .permissions
                .apply(WorkbasketAccessItem::new(args.workbasket, args.grantee));
            print_json(&engine.access_control_manager().create(item)?)?;
        }
        Command::AccessGet { id } => {
            print_json(&engine.access_control_manager().get(&id)?)?;
        }
        Command::AccessUpdate(args) => {
            let item = WorkbasketAccessItem {
                id: args.id,
                principal: args.principal_id,
                ..WorkbasketAccessItem::default()
            };
            let item = args.permissions.apply(item);
            print_json(&engine.access_control_manager().update(item)?)?;
        }
    }

    engine.close_connection();
    Ok(())
}
