//! # Lifecycle Subcommand
//!
//! - `table` — the transition table of a kind, as text or JSON.
//! - `check` — whether one role may take one edge. Prints `allowed` or
//!   `denied: <reason>` and exits 0 or 2. Unknown status tags are denied.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use navette_core::{EntityKind, Role};
use navette_state::{check_transition, describe_kind, Lifecycle, MandateStatus, ParcelStatus, TableRow};

use crate::EXIT_DENIED;

/// Arguments for the `navette lifecycle` subcommand.
#[derive(Args, Debug)]
pub struct LifecycleArgs {
    #[command(subcommand)]
    pub command: LifecycleCommand,
}

#[derive(Subcommand, Debug)]
pub enum LifecycleCommand {
    /// Print the transition table.
    Table {
        /// `parcel` or `mandate`.
        #[arg(long)]
        kind: String,
        /// Emit JSON instead of aligned text.
        #[arg(long)]
        json: bool,
    },

    /// Check a single transition for a role.
    Check {
        #[arg(long)]
        kind: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// `client`, `livreur`, `gerant` or `admin`.
        #[arg(long)]
        role: String,
    },
}

/// Execute the lifecycle subcommand.
pub fn run_lifecycle(args: &LifecycleArgs) -> Result<u8> {
    match &args.command {
        LifecycleCommand::Table { kind, json } => {
            let kind: EntityKind = kind.parse()?;
            let rows = describe_kind(kind);
            if *json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", render_table(&rows));
            }
            Ok(0)
        }
        LifecycleCommand::Check {
            kind,
            from,
            to,
            role,
        } => {
            let kind: EntityKind = kind.parse()?;
            let role: Role = role.parse().context("invalid --role")?;
            match check(kind, from, to, role) {
                Ok(()) => {
                    println!("allowed");
                    Ok(0)
                }
                Err(reason) => {
                    println!("denied: {reason}");
                    Ok(EXIT_DENIED)
                }
            }
        }
    }
}

fn check(kind: EntityKind, from: &str, to: &str, role: Role) -> Result<(), String> {
    fn typed<S: Lifecycle>(from: &str, to: &str, role: Role) -> Result<(), String> {
        let from: S = from.parse().map_err(|e| format!("{e}"))?;
        let to: S = to.parse().map_err(|e| format!("{e}"))?;
        check_transition(from, to, role).map_err(|e| e.reason.as_str().to_string())
    }
    match kind {
        EntityKind::Parcel => typed::<ParcelStatus>(from, to, role),
        EntityKind::Mandate => typed::<MandateStatus>(from, to, role),
    }
}

fn render_table(rows: &[TableRow]) -> String {
    let width = rows.iter().map(|r| r.status.len()).max().unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        let next = if row.terminal {
            "(terminal)".to_string()
        } else {
            row.next.join(", ")
        };
        let roles: Vec<&str> = row.roles.iter().map(Role::as_str).collect();
        let roles = if roles.is_empty() {
            String::new()
        } else {
            format!("  [{}]", roles.join(", "))
        };
        out.push_str(&format!("{:<width$}  -> {next}{roles}\n", row.status));
    }
    out
}
