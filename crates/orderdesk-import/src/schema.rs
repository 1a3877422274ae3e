//! Header validation and per-row coercion into [`ParsedOrder`].

use std::collections::BTreeMap;
use std::io::Read;

use orderdesk_core::{BillingInfo, ParsedOrder};
use rust_decimal::Decimal;

use crate::coerce::{parse_money, parse_order_date};
use crate::error::{ImportError, RowError};
use crate::line_items::{extract_line_items, LineItemEncoding};

/// Columns every order export must declare, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "order_id",
    "order_date",
    "billing_company",
    "billing_email",
    "billing_address1",
    "billing_city",
    "billing_state/province",
    "billing_postcode",
    "subtotal",
    "total",
    "payment_method",
    "status",
];

const BILLING_PHONE: &str = "billing_phone";

/// Normalize a header cell: strip a UTF-8 byte-order mark, trim, lower-case.
#[must_use]
pub fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Required columns absent from `headers`, in [`REQUIRED_COLUMNS`] order.
#[must_use]
pub fn missing_columns<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h.as_ref() == **required))
        .map(|c| (*c).to_string())
        .collect()
}

/// One data row, keyed by normalized header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based position among the data rows (the header is not counted).
    pub index: usize,
    fields: BTreeMap<String, String>,
}

impl RawRow {
    #[must_use]
    pub fn new(index: usize, fields: BTreeMap<String, String>) -> Self {
        Self { index, fields }
    }

    /// The trimmed cell for `column`, or `None` when absent or blank.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn owned(&self, column: &str) -> Option<String> {
        self.get(column).map(str::to_string)
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

/// A CSV order export whose header has been validated.
pub struct OrderFile<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    encoding: LineItemEncoding,
}

impl<R: Read> OrderFile<R> {
    /// Read and validate the header row.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::MissingColumns`] naming every absent required
    /// column, or [`ImportError::UnreadableHeader`] if the header cannot be
    /// decoded. No rows are read in either case.
    pub fn open(input: R) -> Result<Self, ImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_reader(input);

        let headers: Vec<String> = reader
            .headers()
            .map_err(ImportError::UnreadableHeader)?
            .iter()
            .map(normalize_header)
            .collect();

        let missing = missing_columns(&headers);
        if !missing.is_empty() {
            return Err(ImportError::MissingColumns(missing));
        }

        let encoding = LineItemEncoding::detect(&headers);

        Ok(Self {
            reader,
            headers,
            encoding,
        })
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn line_item_encoding(&self) -> LineItemEncoding {
        self.encoding
    }

    /// Lazily yield `(row_index, row)` pairs. Undecodable records surface as
    /// [`RowError::Malformed`] for that row and do not end the stream.
    pub fn into_rows(self) -> impl Iterator<Item = (usize, Result<RawRow, RowError>)> {
        let headers = self.headers;
        self.reader
            .into_records()
            .enumerate()
            .map(move |(idx, record)| {
                let index = idx + 1;
                let row = record.map_err(RowError::Malformed).map(|record| {
                    let fields = headers
                        .iter()
                        .zip(record.iter())
                        .map(|(h, v)| (h.clone(), v.to_string()))
                        .collect();
                    RawRow::new(index, fields)
                });
                (index, row)
            })
    }
}

/// Coerce a raw row into a [`ParsedOrder`].
///
/// Returns `Ok(None)` when the row has no `order_id` and should be skipped.
///
/// # Errors
///
/// Returns a [`RowError`] naming the first column that fails coercion.
pub fn parse_order(
    row: &RawRow,
    encoding: LineItemEncoding,
) -> Result<Option<ParsedOrder>, RowError> {
    let Some(order_id) = row.owned("order_id") else {
        return Ok(None);
    };

    let order_date = {
        let raw = required(row, "order_date")?;
        parse_order_date(raw).ok_or_else(|| RowError::InvalidDate {
            column: "order_date".to_string(),
            value: raw.to_string(),
        })?
    };

    let subtotal = required_amount(row, "subtotal")?;
    let total = required_amount(row, "total")?;
    let shipping_total = optional_amount(row, "shipping_total")?;
    let discount_total = optional_amount(row, "discount_total")?;
    let tax_total = optional_amount(row, "tax_total")?;
    let excise_tax = optional_amount(row, "excise_tax")?;

    let line_items = extract_line_items(row, encoding)?;

    Ok(Some(ParsedOrder {
        order_id,
        order_date,
        billing: BillingInfo {
            company: row.owned("billing_company"),
            email: row.owned("billing_email"),
            address1: row.owned("billing_address1"),
            city: row.owned("billing_city"),
            region: row.owned("billing_state/province"),
            postcode: row.owned("billing_postcode"),
            phone: row.owned(BILLING_PHONE),
        },
        subtotal,
        shipping_total,
        discount_total,
        tax_total,
        excise_tax,
        total,
        payment_method: row.owned("payment_method"),
        status: row.owned("status"),
        line_items,
        raw_payload: row.payload(),
    }))
}

fn required<'r>(row: &'r RawRow, column: &str) -> Result<&'r str, RowError> {
    row.get(column).ok_or_else(|| RowError::MissingValue {
        column: column.to_string(),
    })
}

fn required_amount(row: &RawRow, column: &str) -> Result<Decimal, RowError> {
    let raw = required(row, column)?;
    amount(raw, column)
}

fn optional_amount(row: &RawRow, column: &str) -> Result<Decimal, RowError> {
    match row.get(column) {
        Some(raw) => amount(raw, column),
        None => Ok(Decimal::ZERO),
    }
}

fn amount(raw: &str, column: &str) -> Result<Decimal, RowError> {
    parse_money(raw).ok_or_else(|| RowError::InvalidAmount {
        column: column.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
