//! Line-item extraction from the two export encodings.
//!
//! A file carries its line items either as numbered column groups
//! (`line_1_name`, `line_1_quantity`, `line_1_price`, `line_2_…`) or as a
//! single `line_items` cell holding a JSON list of
//! `{"name", "quantity", "price"}` objects. Both encodings may also carry
//! `sku` and `category`. The encoding is chosen once per file from its
//! header; both produce identical [`LineItem`] values for the same data,
//! including where they stop: the first entry with no data ends the list.

use std::str::FromStr;

use orderdesk_core::LineItem;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::coerce::{parse_quantity, parse_unit_price};
use crate::error::RowError;
use crate::schema::RawRow;

pub const LINE_ITEMS_COLUMN: &str = "line_items";

/// Name given to a line that has a quantity or price but no product name.
pub const UNKNOWN_ITEM_NAME: &str = "Unknown";

/// Value of [`LineItem::ice_level`] for iced flavours.
pub const ICE_LEVEL: &str = "ICE";

const NUMBERED_FIELDS: &[&str] = &[
    "name",
    "product_name",
    "quantity",
    "price",
    "sku",
    "category",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineItemEncoding {
    /// Numbered column groups; `groups` is the highest index in the header.
    Numbered { groups: usize },
    JsonBlob,
    Absent,
}

impl LineItemEncoding {
    /// Pick the encoding for a file from its normalized header.
    ///
    /// Numbered groups win when both encodings are present.
    #[must_use]
    pub fn detect<S: AsRef<str>>(headers: &[S]) -> Self {
        let highest = headers
            .iter()
            .filter_map(|h| numbered_group_index(h.as_ref()))
            .max();

        match highest {
            Some(groups) => {
                if headers.iter().any(|h| h.as_ref() == LINE_ITEMS_COLUMN) {
                    tracing::warn!(
                        "file has both numbered line columns and a line_items column; \
                         using numbered columns"
                    );
                }
                LineItemEncoding::Numbered { groups }
            }
            None if headers.iter().any(|h| h.as_ref() == LINE_ITEMS_COLUMN) => {
                LineItemEncoding::JsonBlob
            }
            None => LineItemEncoding::Absent,
        }
    }
}

/// Returns `N` for a `line_N_<field>` header, `None` for anything else.
fn numbered_group_index(header: &str) -> Option<usize> {
    let rest = header.strip_prefix("line_")?;
    let (index, field) = rest.split_once('_')?;
    if !NUMBERED_FIELDS.contains(&field) {
        return None;
    }
    index.parse::<usize>().ok().filter(|n| *n > 0)
}

/// Product attributes encoded in a storefront product name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemAttributes {
    pub nicotine_mg: Option<Decimal>,
    pub puff_count: Option<i32>,
    pub ice_level: Option<String>,
}

/// Read nicotine strength, puff count, and ice level from a product name.
///
/// Tokens are whitespace-separated; `20mg` sets the strength, `5000puffs` (or
/// `5000puff`) the puff count, and a bare `ice` or `iced` the ice level. When
/// a token kind repeats, the last one wins.
#[must_use]
pub fn infer_item_attributes(name: &str) -> ItemAttributes {
    let mut attrs = ItemAttributes::default();

    for token in name.split_whitespace() {
        let lower = token.to_lowercase();

        if let Some(strength) = lower.strip_suffix("mg") {
            if let Ok(mg) = Decimal::from_str(strength) {
                attrs.nicotine_mg = Some(mg.normalize());
            }
        }

        if lower.ends_with("puff") || lower.ends_with("puffs") {
            let digits: String = lower.chars().filter(char::is_ascii_digit).collect();
            if let Ok(puffs) = digits.parse::<i32>() {
                attrs.puff_count = Some(puffs);
            }
        }

        if lower == "ice" || lower == "iced" {
            attrs.ice_level = Some(ICE_LEVEL.to_string());
        }
    }

    attrs
}

/// Extract the ordered line items of one row.
///
/// An empty result is valid; the pipeline annotates it as a warning.
///
/// # Errors
///
/// Returns [`RowError::InvalidQuantity`], [`RowError::InvalidAmount`], or
/// [`RowError::InvalidLineItems`] naming the offending column.
pub fn extract_line_items(
    row: &RawRow,
    encoding: LineItemEncoding,
) -> Result<Vec<LineItem>, RowError> {
    match encoding {
        LineItemEncoding::Numbered { groups } => extract_numbered(row, groups),
        LineItemEncoding::JsonBlob => match row.get(LINE_ITEMS_COLUMN) {
            Some(blob) => extract_blob(blob),
            None => Ok(Vec::new()),
        },
        LineItemEncoding::Absent => Ok(Vec::new()),
    }
}

/// The cells of one line, before coercion, with the column names used in
/// error messages.
struct RawLine<'a> {
    name: Option<&'a str>,
    sku: Option<&'a str>,
    category: Option<&'a str>,
    quantity: Option<&'a str>,
    quantity_column: String,
    price: Option<&'a str>,
    price_column: String,
}

impl RawLine<'_> {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sku.is_none()
            && self.category.is_none()
            && self.quantity.is_none()
            && self.price.is_none()
    }
}

fn extract_numbered(row: &RawRow, groups: usize) -> Result<Vec<LineItem>, RowError> {
    let mut items = Vec::new();

    for n in 1..=groups {
        let line = RawLine {
            name: row
                .get(&format!("line_{n}_name"))
                .or_else(|| row.get(&format!("line_{n}_product_name"))),
            sku: row.get(&format!("line_{n}_sku")),
            category: row.get(&format!("line_{n}_category")),
            quantity: row.get(&format!("line_{n}_quantity")),
            quantity_column: format!("line_{n}_quantity"),
            price: row.get(&format!("line_{n}_price")),
            price_column: format!("line_{n}_price"),
        };

        if line.is_empty() {
            break;
        }
        items.push(build_item(&line)?);
    }

    Ok(items)
}

#[derive(Debug, Deserialize)]
struct BlobItem {
    #[serde(default)]
    name: Value,
    #[serde(default)]
    sku: Value,
    #[serde(default)]
    category: Value,
    #[serde(default)]
    quantity: Value,
    #[serde(default)]
    price: Value,
}

fn extract_blob(blob: &str) -> Result<Vec<LineItem>, RowError> {
    let parsed: Vec<BlobItem> =
        serde_json::from_str(blob).map_err(|e| RowError::InvalidLineItems {
            column: LINE_ITEMS_COLUMN.to_string(),
            reason: format!("expected a JSON list of line objects ({e})"),
        })?;

    let mut items = Vec::with_capacity(parsed.len());
    for (idx, entry) in parsed.iter().enumerate() {
        let field = |name: &str| format!("{LINE_ITEMS_COLUMN}[{idx}].{name}");

        let name = cell_text(&entry.name, &field("name"))?;
        let sku = cell_text(&entry.sku, &field("sku"))?;
        let category = cell_text(&entry.category, &field("category"))?;
        let quantity = cell_text(&entry.quantity, &field("quantity"))?;
        let price = cell_text(&entry.price, &field("price"))?;

        let line = RawLine {
            name: name.as_deref(),
            sku: sku.as_deref(),
            category: category.as_deref(),
            quantity: quantity.as_deref(),
            quantity_column: field("quantity"),
            price: price.as_deref(),
            price_column: field("price"),
        };

        if line.is_empty() {
            break;
        }
        items.push(build_item(&line)?);
    }

    Ok(items)
}

/// Render a JSON scalar the way it would appear in a CSV cell.
fn cell_text(value: &Value, column: &str) -> Result<Option<String>, RowError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(RowError::InvalidLineItems {
            column: column.to_string(),
            reason: format!("expected a string or number, got {value}"),
        }),
    }
}

/// Shared by both encodings so identical cells yield identical items.
/// Missing quantity defaults to 1 and missing price to 0.
fn build_item(line: &RawLine<'_>) -> Result<LineItem, RowError> {
    let quantity = match line.quantity {
        Some(raw) => parse_quantity(raw).ok_or_else(|| RowError::InvalidQuantity {
            column: line.quantity_column.clone(),
            value: raw.to_string(),
        })?,
        None => 1,
    };

    let unit_price = match line.price {
        Some(raw) => parse_unit_price(raw).ok_or_else(|| RowError::InvalidAmount {
            column: line.price_column.clone(),
            value: raw.to_string(),
        })?,
        None => Decimal::ZERO,
    };

    // The stored line total is quantity * unit_price; it must stay representable.
    if unit_price.checked_mul(Decimal::from(quantity)).is_none() {
        return Err(RowError::InvalidAmount {
            column: line.price_column.clone(),
            value: format!("{quantity} x {unit_price} overflows the line total"),
        });
    }

    let product_name = line.name.unwrap_or(UNKNOWN_ITEM_NAME);
    let attrs = infer_item_attributes(product_name);

    Ok(LineItem {
        sku: line.sku.map(str::to_string),
        product_name: product_name.to_string(),
        category: line.category.map(str::to_string),
        quantity,
        unit_price,
        nicotine_mg: attrs.nicotine_mg,
        puff_count: attrs.puff_count,
        ice_level: attrs.ice_level,
    })
}

#[cfg(test)]
#[path = "line_items_test.rs"]
mod tests;
