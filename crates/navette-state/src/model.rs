//! # Lifecycle Model
//!
//! The shared machinery behind both status machines. Each status enum
//! declares its transition table once through [`Lifecycle`]; every
//! decision (can this role move this record from A to B, what buttons does
//! the UI render) is answered from that table and nowhere else.
//!
//! A rule reads "from `from`, any of `to` may follow, performed by any of
//! `roles`". Terminal statuses have no rules, so every request out of them
//! fails closed.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use navette_core::{EntityKind, Role};

use crate::mandate::MandateStatus;
use crate::parcel::ParcelStatus;

/// One row of a transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule<S: 'static> {
    /// Status the record is in.
    pub from: S,
    /// Statuses that may follow.
    pub to: &'static [S],
    /// Roles allowed to perform any transition of this row.
    pub roles: &'static [Role],
}

/// A status vocabulary with its transition table.
pub trait Lifecycle:
    Copy
    + Eq
    + Hash
    + fmt::Debug
    + fmt::Display
    + FromStr<Err = UnknownStatus>
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Which entity this vocabulary belongs to.
    const KIND: EntityKind;

    /// Status of a freshly created record.
    const INITIAL: Self;

    /// Older tags still found in stored data, mapped to their canonical status.
    const LEGACY_TAGS: &'static [(&'static str, Self)] = &[];

    /// Every status, in lifecycle order.
    fn all() -> &'static [Self];

    /// The canonical wire tag.
    fn as_str(&self) -> &'static str;

    /// The transition table.
    fn transitions() -> &'static [TransitionRule<Self>];

    /// Whether no further transition is possible.
    fn is_terminal(&self) -> bool;

    /// Resolve a canonical or legacy tag, ignoring case and surrounding
    /// whitespace. Backs `FromStr`, which reads typed input (request
    /// bodies, CLI flags, query strings). Serde stays exact-case: stored
    /// data is always written with canonical tags.
    fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::all()
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(tag))
            .or_else(|| {
                Self::LEGACY_TAGS
                    .iter()
                    .find(|(legacy, _)| legacy.eq_ignore_ascii_case(tag))
                    .map(|(_, s)| *s)
            })
    }
}

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The current status is terminal.
    Terminal,
    /// The target does not follow the current status.
    NotAllowed,
    /// The edge exists but this role may not take it.
    RoleNotPermitted,
}

impl Rejection {
    /// Stable label, also used as a metric dimension.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Terminal => "terminal",
            Self::NotAllowed => "not_allowed",
            Self::RoleNotPermitted => "role_not_permitted",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Terminal => "current status is terminal",
            Self::NotAllowed => "target status does not follow the current one",
            Self::RoleNotPermitted => "role is not permitted to perform this transition",
        };
        f.write_str(s)
    }
}

/// A status change the lifecycle does not permit.
///
/// Recoverable: the caller presents it as a rejected action. Nothing has
/// been written when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("illegal {kind} transition {from} -> {to} for role {role}: {reason}")]
pub struct IllegalTransition {
    /// Entity kind.
    pub kind: EntityKind,
    /// Current status tag.
    pub from: &'static str,
    /// Requested status tag.
    pub to: &'static str,
    /// Role that asked.
    pub role: Role,
    /// Which check failed.
    pub reason: Rejection,
}

/// A status tag that belongs to neither the canonical nor the legacy vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} status: \"{tag}\"")]
pub struct UnknownStatus {
    /// Vocabulary the tag was looked up in.
    pub kind: EntityKind,
    /// The tag as given.
    pub tag: String,
}

/// Decide a transition, reporting why it is refused.
pub fn check_transition<S: Lifecycle>(from: S, to: S, role: Role) -> Result<(), IllegalTransition> {
    let reject = |reason| IllegalTransition {
        kind: S::KIND,
        from: from.as_str(),
        to: to.as_str(),
        role,
        reason,
    };

    if from.is_terminal() {
        return Err(reject(Rejection::Terminal));
    }
    let rule = S::transitions()
        .iter()
        .find(|r| r.from == from && r.to.contains(&to))
        .ok_or_else(|| reject(Rejection::NotAllowed))?;
    if !rule.roles.contains(&role) {
        return Err(reject(Rejection::RoleNotPermitted));
    }
    Ok(())
}

/// Whether `role` may move a record from `from` to `to`.
pub fn can_transition<S: Lifecycle>(from: S, to: S, role: Role) -> bool {
    check_transition(from, to, role).is_ok()
}

/// String-tagged form of [`can_transition`] for callers holding raw tags.
///
/// Unknown tags fail closed.
pub fn can_transition_tagged(kind: EntityKind, from: &str, to: &str, role: Role) -> bool {
    fn tagged<S: Lifecycle>(from: &str, to: &str, role: Role) -> bool {
        match (S::from_tag(from), S::from_tag(to)) {
            (Some(from), Some(to)) => can_transition(from, to, role),
            _ => false,
        }
    }
    match kind {
        EntityKind::Parcel => tagged::<ParcelStatus>(from, to, role),
        EntityKind::Mandate => tagged::<MandateStatus>(from, to, role),
    }
}

/// Every status that may follow `from`, whatever the role.
pub fn allowed_next<S: Lifecycle>(from: S) -> Vec<S> {
    collect_targets(from, |_| true)
}

/// The transitions `role` may perform from `from`, i.e. the action buttons to render.
pub fn allowed_actions<S: Lifecycle>(from: S, role: Role) -> Vec<S> {
    collect_targets(from, |rule| rule.roles.contains(&role))
}

fn collect_targets<S: Lifecycle>(from: S, keep: impl Fn(&TransitionRule<S>) -> bool) -> Vec<S> {
    let mut out: Vec<S> = Vec::new();
    for rule in S::transitions().iter().filter(|r| r.from == from && keep(r)) {
        for to in rule.to {
            if !out.contains(to) {
                out.push(*to);
            }
        }
    }
    out
}

/// One line of a rendered transition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// Status tag.
    pub status: &'static str,
    /// Whether the status is terminal.
    pub terminal: bool,
    /// Tags that may follow.
    pub next: Vec<&'static str>,
    /// Roles that may move a record out of this status.
    pub roles: Vec<Role>,
}

/// The full table of a vocabulary, one row per status in lifecycle order.
pub fn describe<S: Lifecycle>() -> Vec<TableRow> {
    S::all()
        .iter()
        .map(|status| {
            let mut roles: Vec<Role> = Vec::new();
            for rule in S::transitions().iter().filter(|r| r.from == *status) {
                for role in rule.roles {
                    if !roles.contains(role) {
                        roles.push(*role);
                    }
                }
            }
            roles.sort();
            TableRow {
                status: status.as_str(),
                terminal: status.is_terminal(),
                next: allowed_next(*status).iter().map(|s| s.as_str()).collect(),
                roles,
            }
        })
        .collect()
}

/// [`describe`] dispatched on an entity kind.
pub fn describe_kind(kind: EntityKind) -> Vec<TableRow> {
    match kind {
        EntityKind::Parcel => describe::<ParcelStatus>(),
        EntityKind::Mandate => describe::<MandateStatus>(),
    }
}

/// Parse a tag through the vocabulary's canonical and legacy tags.
pub(crate) fn parse_tag<S: Lifecycle>(tag: &str) -> Result<S, UnknownStatus> {
    S::from_tag(tag).ok_or_else(|| UnknownStatus {
        kind: S::KIND,
        tag: tag.to_string(),
    })
}
