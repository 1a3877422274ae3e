use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::orders::BillingInfo;
use crate::CoreError;

/// Display name given to a lead created from a row with no billing company.
pub const UNKNOWN_STORE_NAME: &str = "Unknown Store";

/// `normalize_company_name(UNKNOWN_STORE_NAME)`. The lead uniqueness index
/// excludes this key.
pub const UNKNOWN_STORE_KEY: &str = "unknown store";

const LEAD_NOTES: &str = "Created from order import (needs review)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Lead,
    Active,
    Dormant,
    Closed,
}

impl std::fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreStatus::Lead => write!(f, "lead"),
            StoreStatus::Active => write!(f, "active"),
            StoreStatus::Dormant => write!(f, "dormant"),
            StoreStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for StoreStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lead" => Ok(StoreStatus::Lead),
            "active" => Ok(StoreStatus::Active),
            "dormant" => Ok(StoreStatus::Dormant),
            "closed" => Ok(StoreStatus::Closed),
            _ => Err(CoreError::InvalidStoreStatus(s.to_string())),
        }
    }
}

/// A persisted store as seen by the import matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: i64,
    pub company_name: String,
    /// Always equal to `normalize_company_name(&company_name)`.
    pub normalized_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: StoreStatus,
    pub flagged_for_review: bool,
    pub owner_user_id: Option<i64>,
    pub last_order_date: Option<NaiveDate>,
}

/// The minimal projection needed to score a store by name similarity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCandidate {
    pub id: i64,
    pub normalized_name: String,
}

/// A Lead store to be created for an order that matched no existing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeadStore {
    pub company_name: String,
    pub normalized_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address1: Option<String>,
    pub city: Option<String>,
    /// Two-letter province code, see [`infer_province_code`].
    pub province: String,
    pub postal_code: Option<String>,
    pub owner_user_id: Option<i64>,
    pub notes: String,
}

impl NewLeadStore {
    /// Build a lead from an order's billing block.
    ///
    /// Blank company names fall back to [`UNKNOWN_STORE_NAME`]; such leads
    /// are placeholders, see [`NewLeadStore::is_placeholder`].
    #[must_use]
    pub fn from_billing(billing: &BillingInfo, owner_user_id: Option<i64>) -> Self {
        let company_name = billing
            .company
            .clone()
            .unwrap_or_else(|| UNKNOWN_STORE_NAME.to_string());
        let normalized_name = normalize_company_name(&company_name);

        Self {
            company_name,
            normalized_name,
            email: billing.email.as_ref().map(|e| e.to_lowercase()),
            phone: billing.phone.clone(),
            address1: billing.address1.clone(),
            city: billing.city.clone(),
            province: infer_province_code(billing.region.as_deref().unwrap_or_default()),
            postal_code: billing.postcode.clone(),
            owner_user_id,
            notes: LEAD_NOTES.to_string(),
        }
    }

    /// `true` for a lead with no usable company name. Placeholders are never
    /// deduplicated by name: unrelated nameless customers each get their own
    /// lead, and later orders reach it through email or phone matching.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.normalized_name.is_empty() || self.normalized_name == UNKNOWN_STORE_KEY
    }
}

/// Canonical matching key for a company name.
///
/// Lower-cases, drops punctuation, and collapses runs of whitespace into a
/// single space. Pure and idempotent: `normalize(normalize(x)) == normalize(x)`.
#[must_use]
pub fn normalize_company_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip everything but ASCII digits, so `(604) 555-0100` and `604.555.0100`
/// compare equal.
#[must_use]
pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Reduce a free-form state/province field to a two-letter code.
///
/// Two-letter inputs pass through upper-cased; known Canadian province names
/// map to their postal abbreviation; anything else keeps its first two
/// letters. Blank input yields `"NA"`.
#[must_use]
pub fn infer_province_code(raw: &str) -> String {
    let province = raw.trim().to_uppercase();
    if province.chars().count() == 2 {
        return province;
    }

    let mapped = match province.as_str() {
        "ALBERTA" => Some("AB"),
        "BRITISH COLUMBIA" => Some("BC"),
        "MANITOBA" => Some("MB"),
        "NEW BRUNSWICK" => Some("NB"),
        "NEWFOUNDLAND AND LABRADOR" => Some("NL"),
        "NOVA SCOTIA" => Some("NS"),
        "ONTARIO" => Some("ON"),
        "PRINCE EDWARD ISLAND" => Some("PE"),
        "QUEBEC" | "QUÉBEC" => Some("QC"),
        "SASKATCHEWAN" => Some("SK"),
        _ => None,
    };
    if let Some(code) = mapped {
        return code.to_string();
    }

    let prefix: String = province.chars().take(2).collect();
    if prefix.is_empty() {
        "NA".to_string()
    } else {
        prefix
    }
}

#[cfg(test)]
#[path = "stores_test.rs"]
mod tests;
