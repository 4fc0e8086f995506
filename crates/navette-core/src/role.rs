//! # Actor Roles
//!
//! The four roles of the platform. A role is always passed explicitly to
//! the state machines; there is no ambient "current user".

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Roles, ordered by privilege level.
///
/// The `Ord` derivation respects variant declaration order:
/// `Client < Livreur < Gerant < Admin`. Route guards use `>=` for
/// "at least" checks. The lifecycle tables list their roles explicitly:
/// a manager may not mark a parcel delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Customer who ships parcels or orders mandates.
    Client,
    /// Courier responsible for pickup and physical delivery.
    Livreur,
    /// Manager operating a single agency.
    Gerant,
    /// Platform administrator.
    Admin,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Role; 4] = [Role::Client, Role::Livreur, Role::Gerant, Role::Admin];

    /// The wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Livreur => "livreur",
            Self::Gerant => "gerant",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    /// Accepts the wire tags, the accented `gérant`, and the English
    /// `courier`/`manager` used by some older exports.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "livreur" | "courier" => Ok(Self::Livreur),
            "gerant" | "gérant" | "manager" => Ok(Self::Gerant),
            "admin" => Ok(Self::Admin),
            _ => Err(ValidationError::UnknownRole(s.to_string())),
        }
    }
}
