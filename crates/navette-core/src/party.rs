//! # Parties and Payment Methods
//!
//! Inert record pieces shared by parcels and mandates.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A sender, recipient, or mandate requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Full name as printed on the slip.
    pub name: String,
    /// Contact phone number, kept as entered (national or `+225…` form).
    pub phone: String,
    /// Street address or landmark description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Party {
    /// Check that name and phone are present and the phone looks dialable.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidParty`] naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidParty("name must not be empty".into()));
        }
        let digits = self.phone.chars().filter(|c| c.is_ascii_digit()).count();
        let allowed = self
            .phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '.'));
        if !allowed || !(8..=15).contains(&digits) {
            return Err(ValidationError::InvalidParty(format!(
                "phone {:?} must contain 8-15 digits",
                self.phone
            )));
        }
        Ok(())
    }
}

/// How the customer settles the tariff.
///
/// Selection only — collection through the mobile-money gateway happens
/// outside this system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash at the counter or on delivery.
    #[default]
    Especes,
    /// Orange Money wallet.
    OrangeMoney,
    /// Wave wallet.
    Wave,
    /// MTN Mobile Money wallet.
    MtnMomo,
    /// Moov Money wallet.
    MoovMoney,
}

impl PaymentMethod {
    /// All methods in display order.
    pub const ALL: [PaymentMethod; 5] = [
        Self::Especes,
        Self::OrangeMoney,
        Self::Wave,
        Self::MtnMomo,
        Self::MoovMoney,
    ];

    /// The wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Especes => "especes",
            Self::OrangeMoney => "orange_money",
            Self::Wave => "wave",
            Self::MtnMomo => "mtn_momo",
            Self::MoovMoney => "moov_money",
        }
    }

    /// Whether the payment goes through a mobile-money wallet.
    pub fn is_mobile_money(&self) -> bool {
        !matches!(self, Self::Especes)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == tag)
            .or(match tag.as_str() {
                "cash" | "espèces" => Some(Self::Especes),
                "momo" => Some(Self::MtnMomo),
                _ => None,
            })
            .ok_or_else(|| ValidationError::UnknownPaymentMethod(s.to_string()))
    }
}
