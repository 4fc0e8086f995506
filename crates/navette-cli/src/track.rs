//! # Track Subcommand
//!
//! A local ledger of tracked records for counters running without the HTTP
//! service. Each record is stored as `{CODE}.json` under `$NAVETTE_HOME`
//! (default `./.navette/tracked`), in the same shape the service uses.
//!
//! ## Subcommands
//!
//! - `create` — issue the next code of a kind and open its record.
//! - `transition` — move a record, as a role.
//! - `show` — print one record and its history.
//! - `list` — list every record with its status.
//!
//! Serials are allocated as one past the highest serial already in the
//! ledger for the kind and the current year.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use navette_core::{EntityKind, NavetteError, ReferenceCode, Role, Timestamp};
use navette_state::{Lifecycle, MandateStatus, ParcelStatus, Tracked, TrackedError};

use crate::EXIT_DENIED;

/// Arguments for the `navette track` subcommand.
#[derive(Args, Debug)]
pub struct TrackArgs {
    /// Ledger directory.
    #[arg(long, env = "NAVETTE_HOME", default_value = "./.navette/tracked", global = true)]
    pub home: PathBuf,

    #[command(subcommand)]
    pub command: TrackCommand,
}

#[derive(Subcommand, Debug)]
pub enum TrackCommand {
    /// Issue a new code and open its record.
    Create {
        /// `parcel` or `mandate`.
        #[arg(long)]
        kind: String,
        /// First history line.
        #[arg(long)]
        description: Option<String>,
    },

    /// Move a record to another status.
    Transition {
        /// Code, full or short form.
        code: String,
        /// Target status tag.
        #[arg(long)]
        to: String,
        /// Role performing the change.
        #[arg(long)]
        role: String,
        /// History line, defaults to the new status.
        #[arg(long)]
        description: Option<String>,
    },

    /// Print a record and its history.
    Show {
        /// Code, full or short form.
        code: String,
        /// Print the stored JSON.
        #[arg(long)]
        json: bool,
    },

    /// List every record in the ledger.
    List,
}

/// Execute the track subcommand.
pub fn run_track(args: &TrackArgs) -> Result<u8> {
    let ledger = Ledger::open(&args.home);
    match &args.command {
        TrackCommand::Create { kind, description } => {
            let kind: EntityKind = kind.parse()?;
            cmd_create(&ledger, kind, Timestamp::now().year(), description.as_deref())
        }
        TrackCommand::Transition {
            code,
            to,
            role,
            description,
        } => {
            let role: Role = role.parse().context("invalid --role")?;
            cmd_transition(&ledger, code, to, role, description.as_deref())
        }
        TrackCommand::Show { code, json } => cmd_show(&ledger, code, *json),
        TrackCommand::List => cmd_list(&ledger),
    }
}

// ── Ledger ──────────────────────────────────────────────────────────

/// Directory of tracked records, one JSON file per canonical code.
#[derive(Debug, Clone)]
pub struct Ledger {
    dir: PathBuf,
}

impl Ledger {
    /// A ledger rooted at `dir`. Nothing is touched until the first write.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the record files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, code: &ReferenceCode) -> PathBuf {
        self.dir.join(format!("{code}.json"))
    }

    /// Whether a record exists for `code`.
    pub fn contains(&self, code: &ReferenceCode) -> bool {
        self.path(code).is_file()
    }

    /// Load a record. The caller picks the vocabulary matching the code's kind.
    pub fn load<S: Lifecycle>(&self, code: &ReferenceCode) -> Result<Tracked<S>, NavetteError> {
        let content = std::fs::read_to_string(self.path(code))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write a record, creating the directory on first use.
    pub fn save<S: Lifecycle>(&self, tracked: &Tracked<S>) -> Result<(), NavetteError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(tracked)?;
        std::fs::write(self.path(tracked.reference()), json)?;
        Ok(())
    }

    /// Every code in the ledger, sorted. Files whose name is not a canonical
    /// code (`shp-2026-000001.json`, `notes.json`) are skipped.
    pub fn codes(&self) -> Result<Vec<ReferenceCode>, NavetteError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut codes = Vec::new();
        for entry in std::fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match ReferenceCode::parse(stem) {
                Ok(code) if code.as_str() == stem => codes.push(code),
                Ok(code) => tracing::debug!(file = %path.display(), canonical = %code, "skipping non-canonical file name"),
                Err(err) => tracing::debug!(file = %path.display(), error = %err, "skipping non-record file"),
            }
        }
        codes.sort();
        Ok(codes)
    }

    /// The next unused code for `kind` in `year`, or `None` once the serials are spent.
    pub fn next_code(&self, kind: EntityKind, year: i32) -> Result<Option<ReferenceCode>, NavetteError> {
        let highest = self
            .codes()?
            .iter()
            .filter(|c| c.kind() == kind && c.year() == year)
            .map(ReferenceCode::serial)
            .max()
            .unwrap_or(0);
        Ok(ReferenceCode::issue(kind, year, highest + 1))
    }
}

// ── Commands ────────────────────────────────────────────────────────

fn cmd_create(ledger: &Ledger, kind: EntityKind, year: i32, description: Option<&str>) -> Result<u8> {
    let code = ledger
        .next_code(kind, year)
        .context("failed to read ledger")?
        .with_context(|| format!("no {kind} serials left for {year}"))?;

    match kind {
        EntityKind::Parcel => {
            open::<ParcelStatus>(ledger, code.clone(), description.unwrap_or("Colis enregistré"))?
        }
        EntityKind::Mandate => {
            open::<MandateStatus>(ledger, code.clone(), description.unwrap_or("Mandat enregistré"))?
        }
    }

    tracing::info!(reference = %code, "record created");
    println!("OK: created {code}");
    Ok(0)
}

fn open<S: Lifecycle>(ledger: &Ledger, code: ReferenceCode, description: &str) -> Result<()> {
    let tracked = Tracked::<S>::new(code, description, None)?;
    ledger
        .save(&tracked)
        .with_context(|| format!("failed to write {}", tracked.reference()))
}

fn cmd_transition(
    ledger: &Ledger,
    raw: &str,
    to: &str,
    role: Role,
    description: Option<&str>,
) -> Result<u8> {
    let code = ReferenceCode::normalize(raw)?;
    if !ledger.contains(&code) {
        bail!("no record for {code} in {}", ledger.dir().display());
    }
    match code.kind() {
        EntityKind::Parcel => move_record::<ParcelStatus>(ledger, &code, to, role, description),
        EntityKind::Mandate => move_record::<MandateStatus>(ledger, &code, to, role, description),
    }
}

fn move_record<S: Lifecycle>(
    ledger: &Ledger,
    code: &ReferenceCode,
    to: &str,
    role: Role,
    description: Option<&str>,
) -> Result<u8> {
    let to: S = to.parse()?;
    let mut tracked: Tracked<S> = ledger
        .load(code)
        .with_context(|| format!("failed to read {code}"))?;
    let description = description
        .map(str::to_string)
        .unwrap_or_else(|| format!("Statut changé en {to}"));

    match tracked.transition(to, role, &description, None) {
        Ok(from) => {
            ledger
                .save(&tracked)
                .with_context(|| format!("failed to write {code}"))?;
            tracing::info!(reference = %code, from = %from, to = %to, role = %role, "status changed");
            println!("OK: {code} {from} -> {to}");
            Ok(0)
        }
        Err(TrackedError::Illegal(err)) => {
            tracing::warn!(reference = %code, error = %err, "transition rejected");
            eprintln!("REJECTED: {err}");
            Ok(EXIT_DENIED)
        }
        Err(err) => Err(err.into()),
    }
}

fn cmd_show(ledger: &Ledger, raw: &str, json: bool) -> Result<u8> {
    let code = ReferenceCode::normalize(raw)?;
    if !ledger.contains(&code) {
        bail!("no record for {code} in {}", ledger.dir().display());
    }
    let text = match code.kind() {
        EntityKind::Parcel => describe_record::<ParcelStatus>(ledger, &code, json)?,
        EntityKind::Mandate => describe_record::<MandateStatus>(ledger, &code, json)?,
    };
    println!("{text}");
    Ok(0)
}

fn describe_record<S: Lifecycle>(ledger: &Ledger, code: &ReferenceCode, json: bool) -> Result<String> {
    let tracked: Tracked<S> = ledger
        .load(code)
        .with_context(|| format!("failed to read {code}"))?;
    if json {
        return Ok(serde_json::to_string_pretty(&tracked)?);
    }

    let mut lines = vec![
        format!("{code} ({})", S::KIND),
        format!("  Status:  {}{}", tracked.status(), if tracked.is_closed() { " (terminal)" } else { "" }),
        format!("  Created: {}", tracked.created_at()),
        format!("  Updated: {}", tracked.updated_at()),
        "  History:".to_string(),
    ];
    for (i, entry) in tracked.history().into_iter().enumerate() {
        let actor = entry
            .actor
            .as_ref()
            .map(|a| format!(" by {} {} ({})", a.first_name, a.last_name, a.role))
            .unwrap_or_default();
        lines.push(format!(
            "    [{i}] {} {}: {}{actor}",
            entry.date, entry.status, entry.description
        ));
    }
    Ok(lines.join("\n"))
}

fn status_of(ledger: &Ledger, code: &ReferenceCode) -> Result<&'static str, NavetteError> {
    Ok(match code.kind() {
        EntityKind::Parcel => ledger.load::<ParcelStatus>(code)?.status().as_str(),
        EntityKind::Mandate => ledger.load::<MandateStatus>(code)?.status().as_str(),
    })
}

fn cmd_list(ledger: &Ledger) -> Result<u8> {
    let codes = ledger.codes().context("failed to read ledger")?;
    if codes.is_empty() {
        println!("No records found.");
        return Ok(0);
    }

    println!("Records ({}):", codes.len());
    for code in &codes {
        match status_of(ledger, code) {
            Ok(status) => println!("  {code}: {status}"),
            Err(err) => tracing::warn!(reference = %code, error = %err, "unreadable record"),
        }
    }
    Ok(0)
}
