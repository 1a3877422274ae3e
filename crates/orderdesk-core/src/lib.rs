pub mod app_config;
pub mod config;
pub mod orders;
pub mod repository;
pub mod stores;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, DEFAULT_FUZZY_THRESHOLD};
pub use config::{load_app_config, load_app_config_from_env};
pub use orders::{Actor, ActorRole, BillingInfo, LineItem, NewActivity, OrderRecord, ParsedOrder};
pub use repository::{LeadInsert, OrderRepository};
pub use stores::{
    infer_province_code, normalize_company_name, phone_digits, NewLeadStore, StoreCandidate,
    StoreRecord, StoreStatus, UNKNOWN_STORE_KEY, UNKNOWN_STORE_NAME,
};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid store status: {0}")]
    InvalidStoreStatus(String),
    #[error("invalid actor role: {0}")]
    InvalidActorRole(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
