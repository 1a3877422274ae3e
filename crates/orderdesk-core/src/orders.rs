use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Billing block of an imported order. Blank cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingInfo {
    pub company: Option<String>,
    pub email: Option<String>,
    pub address1: Option<String>,
    pub city: Option<String>,
    /// State or province, as written in the export.
    pub region: Option<String>,
    pub postcode: Option<String>,
    pub phone: Option<String>,
}

/// One product line on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: Option<String>,
    pub product_name: String,
    pub category: Option<String>,
    pub quantity: i32,
    /// Scale-normalized, so `4.50` and `4.5` are stored identically.
    pub unit_price: Decimal,
    /// Nicotine strength read from a `20mg` token in the product name.
    pub nicotine_mg: Option<Decimal>,
    /// Puff count read from a `5000puffs` token in the product name.
    pub puff_count: Option<i32>,
    /// `Some("ICE")` when the product name has an `ice` or `iced` token.
    pub ice_level: Option<String>,
}

/// A validated order row, ready for matching and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedOrder {
    /// External identifier from the storefront; the sole identity key.
    pub order_id: String,
    pub order_date: NaiveDate,
    pub billing: BillingInfo,
    pub subtotal: Decimal,
    pub shipping_total: Decimal,
    pub discount_total: Decimal,
    pub tax_total: Decimal,
    pub excise_tax: Decimal,
    pub total: Decimal,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub line_items: Vec<LineItem>,
    /// The source row, keyed by normalized header, kept for audit.
    pub raw_payload: serde_json::Value,
}

/// Identity of a persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: i64,
    pub store_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Admin,
    Salesman,
    Subsalesman,
    Client,
}

impl ActorRole {
    /// Field roles take ownership of the leads their imports create.
    #[must_use]
    pub fn owns_created_leads(self) -> bool {
        matches!(self, ActorRole::Salesman | ActorRole::Subsalesman)
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorRole::Admin => write!(f, "admin"),
            ActorRole::Salesman => write!(f, "salesman"),
            ActorRole::Subsalesman => write!(f, "subsalesman"),
            ActorRole::Client => write!(f, "client"),
        }
    }
}

impl FromStr for ActorRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(ActorRole::Admin),
            "salesman" => Ok(ActorRole::Salesman),
            "subsalesman" | "sub-salesman" | "sub_salesman" => Ok(ActorRole::Subsalesman),
            "client" => Ok(ActorRole::Client),
            _ => Err(CoreError::InvalidActorRole(s.to_string())),
        }
    }
}

/// The user on whose behalf an import runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<i64>,
    pub role: ActorRole,
}

impl Actor {
    #[must_use]
    pub fn new(user_id: Option<i64>, role: ActorRole) -> Self {
        Self { user_id, role }
    }

    /// Owner to stamp on a newly created lead, if any.
    #[must_use]
    pub fn lead_owner(&self) -> Option<i64> {
        if self.role.owns_created_leads() {
            self.user_id
        } else {
            None
        }
    }
}

/// An audit entry written alongside each imported order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub entity_type: &'static str,
    pub entity_id: i64,
    pub action: &'static str,
    pub actor_user_id: Option<i64>,
    pub metadata: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_roles_own_created_leads() {
        assert!(ActorRole::Salesman.owns_created_leads());
        assert!(ActorRole::Subsalesman.owns_created_leads());
        assert!(!ActorRole::Admin.owns_created_leads());
        assert!(!ActorRole::Client.owns_created_leads());
    }

    #[test]
    fn lead_owner_requires_field_role() {
        assert_eq!(Actor::new(Some(3), ActorRole::Salesman).lead_owner(), Some(3));
        assert_eq!(Actor::new(Some(3), ActorRole::Admin).lead_owner(), None);
        assert_eq!(Actor::new(None, ActorRole::Salesman).lead_owner(), None);
    }

    #[test]
    fn actor_role_parses_aliases() {
        assert_eq!(
            "Sub-Salesman".parse::<ActorRole>().unwrap(),
            ActorRole::Subsalesman
        );
        assert_eq!("ADMIN".parse::<ActorRole>().unwrap(), ActorRole::Admin);
        assert!("owner".parse::<ActorRole>().is_err());
    }
}
