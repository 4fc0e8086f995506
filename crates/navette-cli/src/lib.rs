//! # navette-cli — Command-Line Tool for Navette
//!
//! Provides the `navette` command-line interface for counter staff and
//! operators working without the HTTP service.
//!
//! ## Subcommands
//!
//! - `navette ref` — normalize and inspect tracking codes.
//! - `navette lifecycle` — print transition tables, check a single move.
//! - `navette track` — a local ledger of tracked records, one JSON file per code.
//!
//! ```bash
//! navette ref normalize cls-42 SHP-2025-000123
//! navette lifecycle check --kind parcel --from en_attente --to pris_en_charge --role client
//! navette track create --kind mandate
//! ```
//!
//! Every handler returns the process exit code: `0` on success, `1` for
//! errors, `2` when the lifecycle refuses a move.

pub mod lifecycle;
pub mod reference;
pub mod track;

/// Exit code for a move the lifecycle refuses.
pub const EXIT_DENIED: u8 = 2;
