//! Order export ingestion.
//!
//! [`import_orders`] reads a CSV export, resolves every order to a store
//! (creating flagged lead stores where nothing matches), upserts orders by
//! their external id, and returns an [`ImportSummary`]. All storage access
//! goes through [`orderdesk_core::OrderRepository`].

mod coerce;
pub mod error;
pub mod line_items;
pub mod matcher;
pub mod memory;
pub mod pipeline;
pub mod registrar;
pub mod schema;
pub mod summary;
pub mod upsert;

pub use error::{ImportError, RowError};
pub use line_items::{
    extract_line_items, infer_item_attributes, ItemAttributes, LineItemEncoding, ICE_LEVEL,
    UNKNOWN_ITEM_NAME,
};
pub use matcher::{similarity, MatchMethod, MatchResult, MatcherConfig, StoreMatcher};
pub use memory::{MemoryError, MemoryStore, MemoryTransaction};
pub use pipeline::{import_orders, MISSING_ORDER_ID, NO_LINE_ITEMS};
pub use registrar::{LeadRegistrar, LeadResolution};
pub use schema::{parse_order, OrderFile, RawRow, REQUIRED_COLUMNS};
pub use summary::{ImportOutcome, ImportSummary, MatchCounts, OutcomeKind, RowIssue};
pub use upsert::{upsert_order, UpsertKind, Upserted};
