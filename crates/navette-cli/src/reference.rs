//! # Ref Subcommand
//!
//! - `normalize` — canonical form of each code, or the error kind.
//! - `inspect` — structural breakdown of a stored code (no year window).

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use navette_core::ReferenceCode;

/// Arguments for the `navette ref` subcommand.
#[derive(Args, Debug)]
pub struct RefArgs {
    #[command(subcommand)]
    pub command: RefCommand,
}

#[derive(Subcommand, Debug)]
pub enum RefCommand {
    /// Normalize codes as typed by a customer; exits 1 if any is rejected.
    Normalize {
        /// Codes, full (`CLS-2025-000123`) or short (`cls-123`).
        #[arg(required = true)]
        codes: Vec<String>,
        /// Current year to validate against (defaults to the UTC year).
        #[arg(long, value_parser = clap::value_parser!(i32).range(1000..=9999))]
        year: Option<i32>,
    },

    /// Break a stored code into kind, year and serial.
    Inspect {
        /// Full-form code.
        code: String,
    },
}

/// Execute the ref subcommand.
pub fn run_ref(args: &RefArgs) -> Result<u8> {
    match &args.command {
        RefCommand::Normalize { codes, year } => {
            let lines = normalize_all(codes, *year);
            let mut failed = false;
            for line in &lines {
                match line {
                    Ok(text) => println!("{text}"),
                    Err(text) => {
                        failed = true;
                        eprintln!("{text}");
                    }
                }
            }
            Ok(u8::from(failed))
        }
        RefCommand::Inspect { code } => {
            println!("{}", inspect(code)?);
            Ok(0)
        }
    }
}

/// One output line per code: `input -> canonical` or `input: Kind: message`.
fn normalize_all(codes: &[String], year: Option<i32>) -> Vec<Result<String, String>> {
    codes
        .iter()
        .map(|raw| {
            let result = match year {
                Some(year) => ReferenceCode::normalize_for_year(raw, year),
                None => ReferenceCode::normalize(raw),
            };
            match result {
                Ok(code) => Ok(format!("{raw} -> {code}")),
                Err(err) => {
                    tracing::debug!(input = %raw, kind = err.kind(), "reference rejected");
                    Err(format!("{raw}: {}: {err}", err.kind()))
                }
            }
        })
        .collect()
}

fn inspect(raw: &str) -> Result<String> {
    let code = ReferenceCode::parse(raw).with_context(|| format!("cannot inspect {raw:?}"))?;
    Ok(format!(
        "{code}\n  kind:   {}\n  prefix: {}\n  year:   {}\n  serial: {}",
        code.kind(),
        code.prefix(),
        code.year(),
        code.serial()
    ))
}
