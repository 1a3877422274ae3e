use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use super::*;

fn row(cells: &[(&str, &str)]) -> RawRow {
    let fields: BTreeMap<String, String> = cells
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    RawRow::new(1, fields)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ---------------------------------------------------------------------------
// detect
// ---------------------------------------------------------------------------

#[test]
fn detect_numbered_uses_highest_index() {
    let headers = ["order_id", "line_1_name", "line_1_price", "line_3_quantity"];
    assert_eq!(
        LineItemEncoding::detect(&headers),
        LineItemEncoding::Numbered { groups: 3 }
    );
}

#[test]
fn detect_blob() {
    let headers = ["order_id", "line_items"];
    assert_eq!(LineItemEncoding::detect(&headers), LineItemEncoding::JsonBlob);
}

#[test]
fn detect_prefers_numbered_over_blob() {
    let headers = ["line_items", "line_1_name"];
    assert_eq!(
        LineItemEncoding::detect(&headers),
        LineItemEncoding::Numbered { groups: 1 }
    );
}

#[test]
fn detect_absent_ignores_unrelated_line_columns() {
    let headers = ["order_id", "line_1_notes", "line_count", "line_0_name"];
    assert_eq!(LineItemEncoding::detect(&headers), LineItemEncoding::Absent);
}

// ---------------------------------------------------------------------------
// numbered groups
// ---------------------------------------------------------------------------

#[test]
fn numbered_groups_in_order() {
    let r = row(&[
        ("line_1_name", "Mango Ice 20mg"),
        ("line_1_quantity", "10"),
        ("line_1_price", "12.50"),
        ("line_2_name", "Blue Razz"),
        ("line_2_quantity", "4"),
        ("line_2_price", "$9"),
    ]);

    let items = extract_line_items(&r, LineItemEncoding::Numbered { groups: 2 }).unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].product_name, "Mango Ice 20mg");
    assert_eq!(items[0].quantity, 10);
    assert_eq!(items[0].unit_price, dec("12.5"));
    assert_eq!(items[1].product_name, "Blue Razz");
    assert_eq!(items[1].unit_price, dec("9"));
}

#[test]
fn numbered_stops_at_first_empty_group() {
    let r = row(&[
        ("line_1_name", "A"),
        ("line_1_quantity", "1"),
        ("line_1_price", "1"),
        ("line_2_name", ""),
        ("line_2_quantity", " "),
        ("line_2_price", ""),
        ("line_3_name", "C"),
        ("line_3_quantity", "1"),
        ("line_3_price", "1"),
    ]);

    let items = extract_line_items(&r, LineItemEncoding::Numbered { groups: 3 }).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_name, "A");
}

#[test]
fn numbered_partial_group_uses_defaults() {
    let r = row(&[("line_1_name", "Sample Pack")]);
    let items = extract_line_items(&r, LineItemEncoding::Numbered { groups: 1 }).unwrap();

    assert_eq!(items[0].quantity, 1);
    assert_eq!(items[0].unit_price, Decimal::ZERO);
}

#[test]
fn numbered_group_without_name_is_unknown() {
    let r = row(&[("line_1_quantity", "2"), ("line_1_price", "3.00")]);
    let items = extract_line_items(&r, LineItemEncoding::Numbered { groups: 1 }).unwrap();
    assert_eq!(items[0].product_name, UNKNOWN_ITEM_NAME);
}

#[test]
fn numbered_accepts_product_name_alias() {
    let r = row(&[("line_1_product_name", "Grape"), ("line_1_quantity", "1")]);
    let items = extract_line_items(&r, LineItemEncoding::Numbered { groups: 1 }).unwrap();
    assert_eq!(items[0].product_name, "Grape");
}

#[test]
fn numbered_bad_quantity_names_column() {
    let r = row(&[
        ("line_1_name", "A"),
        ("line_1_quantity", "1"),
        ("line_2_name", "B"),
        ("line_2_quantity", "lots"),
    ]);
    let err = extract_line_items(&r, LineItemEncoding::Numbered { groups: 2 }).unwrap_err();
    assert_eq!(err.column(), Some("line_2_quantity"));
}

#[test]
fn numbered_carries_sku_and_category() {
    let r = row(&[
        ("line_1_name", "Mango Ice 20mg"),
        ("line_1_sku", "MI-20"),
        ("line_1_category", "disposable"),
    ]);
    let items = extract_line_items(&r, LineItemEncoding::Numbered { groups: 1 }).unwrap();
    assert_eq!(items[0].sku.as_deref(), Some("MI-20"));
    assert_eq!(items[0].category.as_deref(), Some("disposable"));
}

#[test]
fn numbered_group_with_only_a_sku_is_kept() {
    let r = row(&[("line_1_sku", "MI-20")]);
    let items = extract_line_items(&r, LineItemEncoding::Numbered { groups: 1 }).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_name, UNKNOWN_ITEM_NAME);
}

#[test]
fn line_total_overflow_is_a_row_error() {
    let r = row(&[
        ("line_1_name", "A"),
        ("line_1_quantity", "2000000000"),
        ("line_1_price", "79228162514264337593543950335"),
    ]);
    let err = extract_line_items(&r, LineItemEncoding::Numbered { groups: 1 }).unwrap_err();
    assert!(matches!(err, RowError::InvalidAmount { .. }));
    assert_eq!(err.column(), Some("line_1_price"));
}

#[test]
fn large_but_representable_line_is_accepted() {
    let r = row(&[
        ("line_1_name", "A"),
        ("line_1_quantity", "2000000000"),
        ("line_1_price", "10"),
    ]);
    let items = extract_line_items(&r, LineItemEncoding::Numbered { groups: 1 }).unwrap();
    assert_eq!(items[0].quantity, 2_000_000_000);
}

#[test]
fn numbered_negative_price_is_rejected() {
    let r = row(&[("line_1_name", "A"), ("line_1_price", "-2.00")]);
    let err = extract_line_items(&r, LineItemEncoding::Numbered { groups: 1 }).unwrap_err();
    assert_eq!(err.column(), Some("line_1_price"));
}

// ---------------------------------------------------------------------------
// JSON blob
// ---------------------------------------------------------------------------

#[test]
fn blob_parses_numbers_and_strings() {
    let r = row(&[(
        "line_items",
        r#"[{"name":"Mango Ice 20mg","quantity":10,"price":12.50},
            {"name":"Blue Razz","quantity":"4","price":"9"}]"#,
    )]);

    let items = extract_line_items(&r, LineItemEncoding::JsonBlob).unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].quantity, 10);
    assert_eq!(items[0].unit_price, dec("12.5"));
    assert_eq!(items[1].quantity, 4);
}

#[test]
fn blob_carries_sku_and_category_and_ignores_unknown_fields() {
    let r = row(&[(
        "line_items",
        r#"[{"name":"A","quantity":1,"price":2,"sku":"X-1","category":"disposable","color":"red"}]"#,
    )]);
    let items = extract_line_items(&r, LineItemEncoding::JsonBlob).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].sku.as_deref(), Some("X-1"));
    assert_eq!(items[0].category.as_deref(), Some("disposable"));
}

#[test]
fn blob_stops_at_first_empty_entry() {
    let r = row(&[(
        "line_items",
        r#"[{"name":"A","quantity":1},{},{"name":"C","quantity":1}]"#,
    )]);
    let items = extract_line_items(&r, LineItemEncoding::JsonBlob).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_name, "A");
}

#[test]
fn leading_empty_entry_yields_nothing_in_either_encoding() {
    let blob = row(&[("line_items", r#"[{}, {"name":"A"}]"#)]);
    let numbered = row(&[("line_1_name", ""), ("line_2_name", "A")]);

    let a = extract_line_items(&blob, LineItemEncoding::JsonBlob).unwrap();
    let b = extract_line_items(&numbered, LineItemEncoding::Numbered { groups: 2 }).unwrap();

    assert!(a.is_empty());
    assert!(b.is_empty());
}

#[test]
fn blob_empty_cell_yields_no_items() {
    let r = row(&[("line_items", "  ")]);
    let items = extract_line_items(&r, LineItemEncoding::JsonBlob).unwrap();
    assert!(items.is_empty());
}

#[test]
fn blob_malformed_json_names_column() {
    let r = row(&[("line_items", "[{name: oops")]);
    let err = extract_line_items(&r, LineItemEncoding::JsonBlob).unwrap_err();
    assert_eq!(err.column(), Some("line_items"));
}

#[test]
fn blob_non_scalar_quantity_is_rejected() {
    let r = row(&[("line_items", r#"[{"name":"A","quantity":[1]}]"#)]);
    let err = extract_line_items(&r, LineItemEncoding::JsonBlob).unwrap_err();
    assert_eq!(err.column(), Some("line_items[0].quantity"));
}

#[test]
fn encodings_produce_identical_items() {
    let numbered = row(&[
        ("line_1_name", "Mango Ice 20mg"),
        ("line_1_quantity", "10"),
        ("line_1_price", "12.50"),
        ("line_2_name", "Blue Razz"),
        ("line_2_quantity", "4"),
        ("line_2_price", "9.00"),
    ]);
    let blob = row(&[(
        "line_items",
        r#"[{"name":"Mango Ice 20mg","quantity":10,"price":12.5},
            {"name":"Blue Razz","quantity":4,"price":"9.00"}]"#,
    )]);

    let a = extract_line_items(&numbered, LineItemEncoding::Numbered { groups: 2 }).unwrap();
    let b = extract_line_items(&blob, LineItemEncoding::JsonBlob).unwrap();

    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn encodings_agree_on_inferred_attributes() {
    let numbered = row(&[
        ("line_1_name", "Mango Ice 20mg 5000puffs"),
        ("line_1_sku", "MI-20"),
    ]);
    let blob = row(&[(
        "line_items",
        r#"[{"name":"Mango Ice 20mg 5000puffs","sku":"MI-20"}]"#,
    )]);

    let a = extract_line_items(&numbered, LineItemEncoding::Numbered { groups: 1 }).unwrap();
    let b = extract_line_items(&blob, LineItemEncoding::JsonBlob).unwrap();

    assert_eq!(a, b);
    assert_eq!(a[0].nicotine_mg, Some(dec("20")));
    assert_eq!(a[0].puff_count, Some(5000));
    assert_eq!(a[0].ice_level.as_deref(), Some(ICE_LEVEL));
}

// ---------------------------------------------------------------------------
// attribute inference
// ---------------------------------------------------------------------------

#[test]
fn infers_strength_puffs_and_ice() {
    let attrs = infer_item_attributes("Mango Ice 20mg 5000puffs");
    assert_eq!(attrs.nicotine_mg, Some(dec("20")));
    assert_eq!(attrs.puff_count, Some(5000));
    assert_eq!(attrs.ice_level.as_deref(), Some(ICE_LEVEL));
}

#[test]
fn attribute_tokens_are_case_insensitive() {
    let attrs = infer_item_attributes("ICED Grape 5.0MG 800Puff");
    assert_eq!(attrs.nicotine_mg, Some(dec("5")));
    assert_eq!(attrs.puff_count, Some(800));
    assert_eq!(attrs.ice_level.as_deref(), Some(ICE_LEVEL));
}

#[test]
fn plain_name_has_no_attributes() {
    assert_eq!(infer_item_attributes("Blue Razz"), ItemAttributes::default());
}

#[test]
fn ice_must_be_a_whole_token() {
    let attrs = infer_item_attributes("Licorice mg puffs");
    assert_eq!(attrs, ItemAttributes::default());
}

#[test]
fn absent_encoding_yields_nothing() {
    let r = row(&[("line_1_name", "ignored")]);
    assert!(extract_line_items(&r, LineItemEncoding::Absent)
        .unwrap()
        .is_empty());
}
