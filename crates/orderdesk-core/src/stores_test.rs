use super::*;

#[test]
fn normalize_strips_punctuation_and_case() {
    assert_eq!(normalize_company_name("Vape Hut Inc."), "vape hut inc");
    assert_eq!(normalize_company_name("VAPE-HUT, LTD"), "vapehut ltd");
}

#[test]
fn normalize_collapses_whitespace() {
    assert_eq!(normalize_company_name("  Cloud \t Nine\n Vapes "), "cloud nine vapes");
}

#[test]
fn normalize_is_idempotent() {
    let once = normalize_company_name("The  Smoke & Mirror Co.");
    assert_eq!(normalize_company_name(&once), once);
}

#[test]
fn normalize_keeps_unicode_letters() {
    assert_eq!(normalize_company_name("Café Québec"), "café québec");
}

#[test]
fn normalize_empty_is_empty() {
    assert_eq!(normalize_company_name(" ... "), "");
}

#[test]
fn phone_digits_strips_formatting() {
    assert_eq!(phone_digits("(604) 555-0100"), "6045550100");
    assert_eq!(phone_digits("+1 604.555.0100"), "16045550100");
    assert_eq!(phone_digits("n/a"), "");
}

#[test]
fn province_two_letter_passthrough() {
    assert_eq!(infer_province_code("bc"), "BC");
}

#[test]
fn province_full_name_mapped() {
    assert_eq!(infer_province_code("British Columbia"), "BC");
    assert_eq!(infer_province_code("quebec"), "QC");
}

#[test]
fn province_unknown_takes_prefix() {
    assert_eq!(infer_province_code("Yukon Territory"), "YU");
}

#[test]
fn province_blank_is_na() {
    assert_eq!(infer_province_code("   "), "NA");
}

#[test]
fn store_status_round_trips_through_display() {
    for status in [
        StoreStatus::Lead,
        StoreStatus::Active,
        StoreStatus::Dormant,
        StoreStatus::Closed,
    ] {
        assert_eq!(status.to_string().parse::<StoreStatus>().unwrap(), status);
    }
}

#[test]
fn store_status_rejects_unknown() {
    let err = "prospect".parse::<StoreStatus>().unwrap_err();
    assert!(matches!(err, CoreError::InvalidStoreStatus(ref s) if s == "prospect"));
}

#[test]
fn lead_from_billing_copies_fields() {
    let billing = BillingInfo {
        company: Some("Vape Hut Inc.".to_string()),
        email: Some("Owner@VapeHut.ca".to_string()),
        address1: Some("12 Main St".to_string()),
        city: Some("Calgary".to_string()),
        region: Some("Alberta".to_string()),
        postcode: Some("T2P 1J9".to_string()),
        phone: Some("403-555-0199".to_string()),
    };

    let lead = NewLeadStore::from_billing(&billing, Some(7));

    assert_eq!(lead.company_name, "Vape Hut Inc.");
    assert_eq!(lead.normalized_name, "vape hut inc");
    assert_eq!(lead.email.as_deref(), Some("owner@vapehut.ca"));
    assert_eq!(lead.province, "AB");
    assert_eq!(lead.owner_user_id, Some(7));
    assert!(lead.notes.contains("needs review"));
}

#[test]
fn lead_from_billing_without_company_uses_placeholder() {
    let lead = NewLeadStore::from_billing(&BillingInfo::default(), None);
    assert_eq!(lead.company_name, UNKNOWN_STORE_NAME);
    assert_eq!(lead.normalized_name, UNKNOWN_STORE_KEY);
    assert_eq!(lead.province, "NA");
    assert!(lead.is_placeholder());
}

#[test]
fn placeholder_key_matches_normalized_placeholder_name() {
    assert_eq!(normalize_company_name(UNKNOWN_STORE_NAME), UNKNOWN_STORE_KEY);
}

#[test]
fn punctuation_only_company_is_a_placeholder() {
    let billing = BillingInfo {
        company: Some("!!!".to_string()),
        ..BillingInfo::default()
    };
    assert!(NewLeadStore::from_billing(&billing, None).is_placeholder());
}

#[test]
fn named_lead_is_not_a_placeholder() {
    let billing = BillingInfo {
        company: Some("Puff Palace".to_string()),
        ..BillingInfo::default()
    };
    assert!(!NewLeadStore::from_billing(&billing, None).is_placeholder());
}
