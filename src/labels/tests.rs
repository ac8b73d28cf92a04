use super::*;

fn extractors() -> LabelExtractors {
    LabelExtractors::new().expect("label patterns should compile")
}

#[test]
fn w2_marker_block_yields_name_address_and_ids() {
    let parser = W2Parser::new().expect("w2 parser");
    let text = "a Employee's social security number 123-45-6789\n\
                b Employer identification number (EIN) 12-3456789\n\
                c Employer's name, address, and ZIP code\n\
                ACME WIDGETS INC ACME WIDGETS INC 52000.00\n\
                100 Main St, Springfield IL 62701\n";

    let info = parser.parse(text);
    assert_eq!(info.ssn.as_deref(), Some("123-45-6789"));
    assert_eq!(info.ein.as_deref(), Some("12-3456789"));
    assert_eq!(info.employer_name.as_deref(), Some("ACME WIDGETS INC"));
    assert_eq!(
        info.employer_address.as_deref(),
        Some("100 Main St, Springfield IL 62701")
    );
}

#[test]
fn w2_marker_survives_ocr_glyphs_and_repetition() {
    let parser = W2Parser::new().expect("w2 parser");
    let text = "© Employer's name, address, and ZIP code |[e Employer's name, address, and ZIP code\n\
                \n\
                BIG CO | BIG CO\n";
    assert_eq!(parser.bookmark(text), "BIG CO");
}

#[test]
fn w2_falls_back_to_secondary_caption_then_payroll_marker() {
    let parser = W2Parser::new().expect("w2 parser");

    let caption = "Employer name\nGlobex Corporation | 12-3456789\n";
    assert_eq!(parser.bookmark(caption), "Globex Corporation");

    let payroll = "0042 - PAYROLL DEPT\nINITECH LLC b Employer identification\n";
    assert_eq!(parser.bookmark(payroll), "INITECH LLC");
}

#[test]
fn w2_known_employers_override_structural_scans() {
    let parser = W2Parser::new().expect("w2 parser");
    let text = "c Employer's name, address, and ZIP code\nSalesforce, Inc 415 Mission St\n";
    assert_eq!(parser.bookmark(text), "SALESFORCE, INC");
}

#[test]
fn w2_without_employer_reports_sentinels() {
    let parser = W2Parser::new().expect("w2 parser");
    let info = parser.parse("nothing useful here");
    assert_eq!(info.employer_name, None);
    assert_eq!(info.ssn, None);
    assert_eq!(info.ein_or_na(), "N/A");
    assert_eq!(info.address_or_na(), "N/A");
    assert_eq!(parser.bookmark("nothing useful here"), forms::W2);
}

#[test]
fn entity_names_are_normalized() {
    let parser = W2Parser::new().expect("w2 parser");
    assert_eq!(
        parser.normalize_entity_name("ACME CORP 123-45-6789 TAX WITHHELD 1,234.00"),
        "ACME CORP"
    );
    assert_eq!(parser.normalize_entity_name("ACME ACME   CORP"), "ACME CORP");
    assert_eq!(parser.normalize_entity_name("Acme Corp ACME CORP"), "Acme Corp");
}

#[test]
fn interest_overrides_use_canonical_names() {
    let payer = InterestPayer::new().expect("interest payer");
    assert_eq!(payer.bookmark("U.S. BANK N.A.\nForm 1099-INT"), "US Bank NA");
    assert_eq!(payer.bookmark("CAPITAL ONE\nInterest Income"), "Capital One NA");
    assert_eq!(
        payer.bookmark("Bank of America, N.A.\nInterest Income"),
        "Bank of America, N.A"
    );
}

#[test]
fn interest_payer_block_is_cleaned() {
    let payer = InterestPayer::new().expect("interest payer");
    let text = "PAYER'S name, street address, city or town, state or province, country, \
                ZIP or foreign postal code, and telephone no.\n\
                RECIPIENT'S TIN\n\
                ALLY BANK reel Form 1099-INT (Rev. January 2024)\n";
    assert_eq!(payer.bookmark(text), "ALLY BANK");
}

#[test]
fn interest_payer_block_skips_servicer_lines() {
    let payer = InterestPayer::new().expect("interest payer");
    let text = "Federal ID Number: 12-3456789\n\
                Mortgage Servicer Dept\n\
                FIRST CITIZENS BANK, N.A.\n";
    assert_eq!(payer.bookmark(text), "FIRST CITIZENS BANK");
}

#[test]
fn interest_without_header_falls_back_to_form_name() {
    let payer = InterestPayer::new().expect("interest payer");
    assert_eq!(payer.bookmark("Form 1099-INT\n1 Interest income 12.00"), forms::INT_1099);
}

#[test]
fn dividend_payer_follows_caption_then_headers() {
    let payer = DividendPayer::new();
    let caption = "PAYER’S name, street address, city or town, state or province, country, \
                   ZIP or foreign postal code, and telephone no.\n\
                   \n\
                   VANGUARD MARKETING CORP.\n";
    assert_eq!(payer.bookmark(caption), "VANGUARD MARKETING CORP");

    let recipient = "RECIPIENT'S name, street address\nJANE DOE\n";
    assert_eq!(payer.bookmark(recipient), "JANE DOE");

    assert_eq!(payer.bookmark("1a Total ordinary dividends"), forms::DIV_1099);
}

#[test]
fn mortgage_overrides_are_cleaned() {
    let lender = MortgageLender::new().expect("mortgage lender");
    assert_eq!(
        lender.bookmark("Dovenmuehle Mortgage, Inc. 1 Corporate Dr"),
        "Dovenmuehle Mortgage, Inc"
    );
    assert_eq!(
        lender.bookmark("The Huntington National Bank Mortgage Interest Statement"),
        "The Huntington National Bank"
    );
    assert_eq!(
        lender.bookmark("united nations fcu\nPO Box 1"),
        "UNITED NATIONS FCU"
    );
}

#[test]
fn mortgage_loan_limits_caption_takes_first_clause() {
    let lender = MortgageLender::new().expect("mortgage lender");
    let text = "may be subject to limits based on the loan amount\n\
                \n\
                ROCKET MORTGAGE and its affiliates Interest received\n";
    assert_eq!(lender.bookmark(text), "ROCKET MORTGAGE");
}

#[test]
fn mortgage_structural_strategies_apply_in_order() {
    let lender = MortgageLender::new().expect("mortgage lender");

    assert_eq!(lender.bookmark("NAVY FCU 820 Follin Lane"), "NAVY FCU");

    let borrower = "PAYER'S/BORROWER'S name\n-----\nJOHN Q PUBLIC d/b/a Public Rentals\n";
    assert_eq!(lender.bookmark(borrower), "JOHN Q PUBLIC");

    let recipient = "RECIPIENT'S/LENDER'S name, street address\nWELLS FARGO BANK, N.A.\n";
    assert_eq!(lender.bookmark(recipient), "WELLS FARGO BANK, N.A");

    assert_eq!(lender.bookmark("Form 1098"), forms::MORTGAGE_1098);
}

#[test]
fn entity_label_is_none_for_generic_fallbacks_and_other_forms() {
    let extractors = extractors();
    assert_eq!(extractors.entity_label(forms::W2, "no employer block"), None);
    assert_eq!(extractors.entity_label(forms::TUITION_1098, "anything"), None);
    assert_eq!(
        extractors.entity_label(forms::INT_1099, "CAPITAL ONE"),
        Some("Capital One NA".to_string())
    );
}

#[test]
fn shared_helpers_trim_punctuation_and_skip_blank_lines() {
    assert_eq!(strip_trailing_punctuation("  ACME CORP.,; "), "ACME CORP");
    assert_eq!(next_non_blank(&["a", "  ", " b "], 1), Some((2, "b")));
    assert_eq!(normalize_quotes("PAYER’S\u{00A0}name"), "PAYER'S name");
}

#[test]
fn retirement_payer_reads_below_either_caption() {
    let payer = RetirementPayer::new().expect("retirement payer");

    let schwab = "country, ZIP or foreign postal code, and telephone no.\n\
                  CHARLES SCHWAB & CO., INC.\n\
                  211 Main Street\n";
    assert_eq!(payer.bookmark(schwab), "Charles Schwab & Co., Inc.");

    let continued = "PAYER'S name, street address, city or town\n\
                     \n\
                     FIDELITY INVESTMENTS\n\
                     INSTITUTIONAL OPERATIONS CO\n\
                     100 Crosby Pkwy\n";
    assert_eq!(
        payer.bookmark(continued),
        "Fidelity Investments Institutional Operations Co"
    );
}

#[test]
fn retirement_payer_stops_at_recipient_section() {
    let payer = RetirementPayer::new().expect("retirement payer");
    let text = "PAYER'S name\nRECIPIENT'S name\nJOHN DOE\n";
    assert_eq!(payer.bookmark(text), forms::RETIREMENT_1099);
    assert_eq!(retirement::title_case("o'neil FINANCIAL"), "O'Neil Financial");
}

#[test]
fn hsa_trustee_prefers_known_names_then_institution_suffixes() {
    let trustee = HsaTrustee::new().expect("hsa trustee");
    assert_eq!(
        trustee.bookmark("Do Not Cut or Separate Forms on This Page\nForm 5498-SA\nOptumBank, PO Box 271"),
        "Optum Bank"
    );
    assert_eq!(
        trustee.bookmark("TRUSTEE'S name, street address\nHealthEquity Inc 15 W Scenic Pointe Dr"),
        "HealthEquity Inc"
    );
}

#[test]
fn hsa_trustee_falls_back_to_line_below_postal_caption() {
    let trustee = HsaTrustee::new().expect("hsa trustee");
    let text = "country, ZIP or foreign postal code, and telephone no.\n\
                2 Total contributions made in 2024\n\
                Lively HSA.\n";
    assert_eq!(trustee.bookmark(text), "Lively HSA");
    assert_eq!(trustee.bookmark("nothing here"), forms::HSA_5498);
}

#[test]
fn employer_coverage_pages_get_a_fixed_title() {
    let extractors = extractors();
    assert_eq!(
        extractors.entity_label(forms::EMPLOYER_COVERAGE_1095, "Form 1095-C\nPart II Employee Offer of Coverage"),
        Some("1095-C – Employer-Provided Coverage".to_string())
    );
    assert_eq!(
        extractors.entity_label(forms::EMPLOYER_COVERAGE_1095, "Employee Offer of Coverage"),
        None
    );
}

#[test]
fn forms_without_extractors_keep_positional_labels() {
    let extractors = extractors();
    for form_type in [
        forms::K1,
        forms::GOVERNMENT_1099,
        forms::PROPERTY_TAX,
        forms::MARKETPLACE_1095,
        forms::COVERAGE_1095,
        forms::PLAN_529,
        forms::CHILD_CARE,
    ] {
        assert_eq!(extractors.entity_label(form_type, "ACME BANK"), None, "{form_type}");
    }
}
