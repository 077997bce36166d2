//! CLI command definitions for the workbasket engine.
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::types::{ConnectionManagementMode, Permission, WorkbasketAccessItem};
use clap::{Args, Parser, Subcommand};

/// Workbasket engine command-line tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Connection management mode (overrides config)
    #[arg(long, global = true)]
    pub mode: Option<ConnectionManagementMode>,

    /// Principal to act as (overrides config)
    #[arg(long, global = true)]
    pub principal: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a workbasket
    Create(WorkbasketArgs),

    /// Show a workbasket and its distribution-target ids
    Get {
        id: String,
    },

    /// List all workbaskets
    List,

    /// Replace a workbasket's fields and distribution targets
    Update(WorkbasketArgs),

    /// Resolve a workbasket's distribution targets one level deep
    Targets {
        id: String,
    },

    /// Grant a principal permissions on a workbasket
    Grant(GrantArgs),

    /// Show an access item
    AccessGet {
        id: String,
    },

    /// Replace an access item's principal and permissions
    AccessUpdate(AccessUpdateArgs),
}

#[derive(Args, Debug)]
pub struct WorkbasketArgs {
    /// Workbasket id (generated on create if omitted; required on update)
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long, default_value = "")]
    pub name: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub owner: Option<String>,

    /// Comma-separated distribution-target ids
    #[arg(long, value_delimiter = ',')]
    pub targets: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PermissionArgs {
    /// Comma-separated permissions: read, open, write, append, transfer, distribute
    #[arg(long = "allow", value_delimiter = ',', value_parser = parse_permission)]
    pub allow: Vec<Permission>,
}

impl PermissionArgs {
    /// Apply the listed permissions to an item; unlisted flags are cleared.
    pub fn apply(&self, mut item: WorkbasketAccessItem) -> WorkbasketAccessItem {
        for permission in [
            Permission::Read,
            Permission::Open,
            Permission::Write,
            Permission::Append,
            Permission::Transfer,
            Permission::Distribute,
        ] {
            item = item.with(permission, self.allow.contains(&permission));
        }
        item
    }
}

#[derive(Args, Debug)]
pub struct GrantArgs {
    #[arg(long)]
    pub workbasket: String,

    /// Principal receiving the permissions
    #[arg(long = "to")]
    pub grantee: String,

    #[command(flatten)]
    pub permissions: PermissionArgs,
}

#[derive(Args, Debug)]
pub struct AccessUpdateArgs {
    pub id: String,

    /// Principal the item applies to
    #[arg(long)]
    pub principal_id: String,

    #[command(flatten)]
    pub permissions: PermissionArgs,
}

fn parse_permission(s: &str) -> Result<Permission, String> {
    match s.trim().to_lowercase().as_str() {
        "read" => Ok(Permission::Read),
        "open" => Ok(Permission::Open),
        "write" => Ok(Permission::Write),
        "append" => Ok(Permission::Append),
        "transfer" => Ok(Permission::Transfer),
        "distribute" => Ok(Permission::Distribute),
        other => Err(format!("unknown permission '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "workbasket",
            "create",
            "--name",
            "inbox",
            "--targets",
            "a,b",
        ])
        .unwrap();

        match cli.command {
            Command::Create(args) => {
                assert_eq!(args.name, "inbox");
                assert_eq!(args.targets, vec!["a", "b"]);
                assert!(args.id.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_mode() {
        let cli = Cli::try_parse_from(["workbasket", "list", "--mode", "autocommit"]).unwrap();
        assert_eq!(cli.mode, Some(ConnectionManagementMode::Autocommit));
    }

    #[test]
    fn test_parse_grant_permissions() {
        let cli = Cli::try_parse_from([
            "workbasket",
            "grant",
            "--workbasket",
            "1",
            "--to",
            "Arthur Dent",
            "--allow",
            "read,open",
        ])
        .unwrap();

        let Command::Grant(args) = cli.command else {
            panic!("expected grant");
        };
        let item = args
            .permissions
            .apply(WorkbasketAccessItem::new(&args.workbasket, &args.grantee));
        assert!(item.read);
        assert!(item.open);
        assert!(!item.write);
        assert!(cli.principal.is_none());
    }

    #[test]
    fn test_grantee_does_not_replace_acting_principal() {
        let cli = Cli::try_parse_from([
            "workbasket",
            "grant",
            "--workbasket",
            "1",
            "--to",
            "Arthur Dent",
            "--allow",
            "read",
            "--principal",
            "Ford Prefect",
        ])
        .unwrap();

        assert_eq!(cli.principal.as_deref(), Some("Ford Prefect"));
        let Command::Grant(args) = cli.command else {
            panic!("expected grant");
        };
        assert_eq!(args.grantee, "Arthur Dent");
    }

    #[test]
    fn test_access_update_principal_id_is_separate_from_global() {
        let cli = Cli::try_parse_from([
            "workbasket",
            "--principal",
            "Ford Prefect",
            "access-update",
            "item-1",
            "--principal-id",
            "Zaphod Beeblebrox",
        ])
        .unwrap();

        assert_eq!(cli.principal.as_deref(), Some("Ford Prefect"));
        let Command::AccessUpdate(args) = cli.command else {
            panic!("expected access-update");
        };
        assert_eq!(args.id, "item-1");
        assert_eq!(args.principal_id, "Zaphod Beeblebrox");
        assert!(args.permissions.allow.is_empty());
    }

    #[test]
    fn test_unknown_permission_rejected() {
        let result = Cli::try_parse_from([
            "workbasket",
            "grant",
            "--workbasket",
            "1",
            "--to",
            "x",
            "--allow",
            "admin",
        ]);
        assert!(result.is_err());
    }
}
