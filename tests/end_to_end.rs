//! End-to-end coverage of the pipeline: parse a small hand-built filing
//! bundle, resolve roles, select periods, and generate line items,
//! exercising the case where one role serves two canonical statement
//! types and a dimensional-breakdown case.

use bigdecimal::BigDecimal;
use std::str::FromStr;

use regex::Regex;

use xbrl_statements::model::FactValue;
use xbrl_statements::parser::NamedBuffer;
use xbrl_statements::resolver::ResolutionTier;
use xbrl_statements::{GenerationOptions, ParsedFiling, RegistryBundle, ResolutionOutcome, StatementType};

const SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<schema xmlns="http://www.w3.org/2001/XMLSchema"
        xmlns:link="http://www.xbrl.org/2003/linkbase"
        xmlns:xbrli="http://www.xbrl.org/2003/instance"
        xmlns:co="http://xbrlstatements.test/co/20231231"
        xmlns:dei="http://xbrl.sec.gov/dei/2023"
        targetNamespace="http://xbrlstatements.test/co/20231231"
        elementFormDefault="qualified">

  <element name="StatementOfFinancialPositionAbstract" abstract="true" substitutionGroup="xbrli:item" type="xbrli:stringItemType"/>
  <element name="Assets" type="xbrli:monetaryItemType" periodType="instant" balance="debit" substitutionGroup="xbrli:item"/>
  <element name="Liabilities" type="xbrli:monetaryItemType" periodType="instant" balance="credit" substitutionGroup="xbrli:item"/>
  <element name="StockholdersEquity" type="xbrli:monetaryItemType" periodType="instant" balance="credit" substitutionGroup="xbrli:item"/>

  <element name="StatementOfIncomeAndComprehensiveIncomeAbstract" abstract="true" substitutionGroup="xbrli:item" type="xbrli:stringItemType"/>
  <element name="Revenues" type="xbrli:monetaryItemType" periodType="duration" balance="credit" substitutionGroup="xbrli:item"/>
  <element name="NetIncomeLoss" type="xbrli:monetaryItemType" periodType="duration" balance="credit" substitutionGroup="xbrli:item"/>
  <element name="ComprehensiveIncomeNetOfTax" type="xbrli:monetaryItemType" periodType="duration" balance="credit" substitutionGroup="xbrli:item"/>

  <link:roleType roleURI="http://co.com/role/BalanceSheets" id="BalanceSheets">
    <link:definition>1002 - Statement - Consolidated Balance Sheets</link:definition>
    <link:usedOn>link:presentationLink</link:usedOn>
  </link:roleType>

  <link:roleType roleURI="http://co.com/role/StatementsOfOperationsAndComprehensiveIncome" id="Operations">
    <link:definition>1003 - Statement - Consolidated Statements of Operations and Comprehensive Income</link:definition>
    <link:usedOn>link:presentationLink</link:usedOn>
  </link:roleType>
</schema>
"#;

const PRESENTATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase" xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:presentationLink xlink:type="extended" xlink:role="http://co.com/role/BalanceSheets">
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_StatementOfFinancialPositionAbstract" xlink:label="loc_bs_abstract"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_Assets" xlink:label="loc_assets"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_Liabilities" xlink:label="loc_liabilities"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_StockholdersEquity" xlink:label="loc_equity"/>
    <link:presentationArc xlink:type="arc" xlink:from="loc_bs_abstract" xlink:to="loc_assets" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" order="1"/>
    <link:presentationArc xlink:type="arc" xlink:from="loc_bs_abstract" xlink:to="loc_liabilities" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" order="2"/>
    <link:presentationArc xlink:type="arc" xlink:from="loc_bs_abstract" xlink:to="loc_equity" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" order="3"/>
  </link:presentationLink>

  <link:presentationLink xlink:type="extended" xlink:role="http://co.com/role/StatementsOfOperationsAndComprehensiveIncome">
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_StatementOfIncomeAndComprehensiveIncomeAbstract" xlink:label="loc_oci_abstract"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_Revenues" xlink:label="loc_revenues"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_NetIncomeLoss" xlink:label="loc_ni"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_ComprehensiveIncomeNetOfTax" xlink:label="loc_ci"/>
    <link:presentationArc xlink:type="arc" xlink:from="loc_oci_abstract" xlink:to="loc_revenues" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" order="1"/>
    <link:presentationArc xlink:type="arc" xlink:from="loc_oci_abstract" xlink:to="loc_ni" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" order="2"/>
    <link:presentationArc xlink:type="arc" xlink:from="loc_oci_abstract" xlink:to="loc_ci" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" order="3"/>
  </link:presentationLink>
</link:linkbase>
"#;

const LABELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase" xmlns:xlink="http://www.w3.org/1999/xlink" xmlns:xml="http://www.w3.org/XML/1998/namespace">
  <link:labelLink xlink:type="extended" xlink:role="http://www.xbrl.org/2003/role/link">
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_StatementOfFinancialPositionAbstract" xlink:label="loc_bs_abstract"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_Assets" xlink:label="loc_assets"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_Liabilities" xlink:label="loc_liabilities"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_StockholdersEquity" xlink:label="loc_equity"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_StatementOfIncomeAndComprehensiveIncomeAbstract" xlink:label="loc_oci_abstract"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_Revenues" xlink:label="loc_revenues"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_NetIncomeLoss" xlink:label="loc_ni"/>
    <link:loc xlink:type="locator" xlink:href="co-20231231.xsd#co_ComprehensiveIncomeNetOfTax" xlink:label="loc_ci"/>

    <link:label xlink:type="resource" xlink:label="label_bs_abstract" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Statement of Financial Position [Abstract]</link:label>
    <link:label xlink:type="resource" xlink:label="label_assets" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Total assets</link:label>
    <link:label xlink:type="resource" xlink:label="label_liabilities" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Total liabilities</link:label>
    <link:label xlink:type="resource" xlink:label="label_equity" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Total stockholders' equity</link:label>
    <link:label xlink:type="resource" xlink:label="label_oci_abstract" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Statement of Income and Comprehensive Income [Abstract]</link:label>
    <link:label xlink:type="resource" xlink:label="label_revenues" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Total revenues</link:label>
    <link:label xlink:type="resource" xlink:label="label_ni" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Net income</link:label>
    <link:label xlink:type="resource" xlink:label="label_ci" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Comprehensive income</link:label>

    <link:labelArc xlink:type="arc" xlink:from="loc_bs_abstract" xlink:to="label_bs_abstract" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label"/>
    <link:labelArc xlink:type="arc" xlink:from="loc_assets" xlink:to="label_assets" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label"/>
    <link:labelArc xlink:type="arc" xlink:from="loc_liabilities" xlink:to="label_liabilities" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label"/>
    <link:labelArc xlink:type="arc" xlink:from="loc_equity" xlink:to="label_equity" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label"/>
    <link:labelArc xlink:type="arc" xlink:from="loc_oci_abstract" xlink:to="label_oci_abstract" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label"/>
    <link:labelArc xlink:type="arc" xlink:from="loc_revenues" xlink:to="label_revenues" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label"/>
    <link:labelArc xlink:type="arc" xlink:from="loc_ni" xlink:to="label_ni" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label"/>
    <link:labelArc xlink:type="arc" xlink:from="loc_ci" xlink:to="label_ci" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label"/>
  </link:labelLink>
</link:linkbase>
"#;

const INSTANCE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance" xmlns:co="http://xbrlstatements.test/co/20231231" xmlns:dei="http://xbrl.sec.gov/dei/2023" xmlns:xbrldi="http://xbrl.org/2006/xbrldi" xmlns:iso4217="http://www.xbrl.org/2003/iso4217">

  <context id="ctx_bs">
    <entity>
      <identifier scheme="http://www.sec.gov/CIK">0000000001</identifier>
    </entity>
    <period>
      <instant>2023-12-31</instant>
    </period>
  </context>

  <context id="ctx_fy">
    <entity>
      <identifier scheme="http://www.sec.gov/CIK">0000000001</identifier>
    </entity>
    <period>
      <startDate>2023-01-01</startDate>
      <endDate>2023-12-31</endDate>
    </period>
  </context>

  <context id="ctx_fy_auto">
    <entity>
      <identifier scheme="http://www.sec.gov/CIK">0000000001</identifier>
      <segment>
        <xbrldi:explicitMember dimension="co:ProductOrServiceAxis">co:AutomotiveSegmentMember</xbrldi:explicitMember>
      </segment>
    </entity>
    <period>
      <startDate>2023-01-01</startDate>
      <endDate>2023-12-31</endDate>
    </period>
  </context>

  <context id="ctx_fy_energy">
    <entity>
      <identifier scheme="http://www.sec.gov/CIK">0000000001</identifier>
      <segment>
        <xbrldi:explicitMember dimension="co:ProductOrServiceAxis">co:EnergyGenerationAndStorageSegmentMember</xbrldi:explicitMember>
      </segment>
    </entity>
    <period>
      <startDate>2023-01-01</startDate>
      <endDate>2023-12-31</endDate>
    </period>
  </context>

  <context id="ctx_fy_services">
    <entity>
      <identifier scheme="http://www.sec.gov/CIK">0000000001</identifier>
      <segment>
        <xbrldi:explicitMember dimension="co:ProductOrServiceAxis">co:ServicesAndOtherSegmentMember</xbrldi:explicitMember>
      </segment>
    </entity>
    <period>
      <startDate>2023-01-01</startDate>
      <endDate>2023-12-31</endDate>
    </period>
  </context>

  <unit id="usd">
    <measure>iso4217:USD</measure>
  </unit>

  <dei:DocumentPeriodEndDate contextRef="ctx_bs">2023-12-31</dei:DocumentPeriodEndDate>

  <co:Assets contextRef="ctx_bs" unitRef="usd" decimals="-6">50000000000</co:Assets>
  <co:Liabilities contextRef="ctx_bs" unitRef="usd" decimals="-6">20000000000</co:Liabilities>
  <co:StockholdersEquity contextRef="ctx_bs" unitRef="usd" decimals="-6">30000000000</co:StockholdersEquity>

  <co:Revenues contextRef="ctx_fy" unitRef="usd" decimals="-6">96000000000</co:Revenues>
  <co:NetIncomeLoss contextRef="ctx_fy" unitRef="usd" decimals="-6">15000000000</co:NetIncomeLoss>
  <co:ComprehensiveIncomeNetOfTax contextRef="ctx_fy" unitRef="usd" decimals="-6">14500000000</co:ComprehensiveIncomeNetOfTax>

  <co:Revenues contextRef="ctx_fy_auto" unitRef="usd" decimals="-6">70000000000</co:Revenues>
  <co:Revenues contextRef="ctx_fy_energy" unitRef="usd" decimals="-6">15000000000</co:Revenues>
  <co:Revenues contextRef="ctx_fy_services" unitRef="usd" decimals="-6">11000000000</co:Revenues>
</xbrl>
"#;

fn parse_filing() -> ParsedFiling {
    let buffers = vec![
        NamedBuffer::new("co-20231231.xsd", SCHEMA.as_bytes()),
        NamedBuffer::new("co-20231231_pre.xml", PRESENTATION.as_bytes()),
        NamedBuffer::new("co-20231231_lab.xml", LABELS.as_bytes()),
        NamedBuffer::new("co-20231231.xml", INSTANCE.as_bytes()),
    ];
    ParsedFiling::parse(&buffers).expect("synthetic bundle should parse cleanly")
}

fn decimal(value: &FactValue) -> BigDecimal {
    match value {
        FactValue::Decimal(d) => d.clone(),
        other => panic!("expected a decimal value, got {other:?}"),
    }
}

#[test]
fn balance_sheet_resolves_by_primary_concept_and_generates_rows() {
    let filing = parse_filing();
    let registry = RegistryBundle::default();

    let outcome = filing.generate_statement(
        StatementType::BalanceSheet,
        false,
        None,
        &GenerationOptions::default(),
        &registry,
    );

    let ResolutionOutcome::Found(statement) = outcome else {
        panic!("expected the balance sheet to resolve");
    };
    assert_eq!(statement.role, "http://co.com/role/BalanceSheets");
    assert_eq!(statement.tier, ResolutionTier::PrimaryConcept);
    assert!((statement.confidence - 0.90).abs() < 1e-9);
    assert_eq!(statement.periods.len(), 1);
    assert_eq!(statement.periods[0].period.end_date().to_string(), "2023-12-31");

    assert_eq!(statement.line_items.len(), 1);
    let root = &statement.line_items[0];
    assert!(root.is_abstract);
    assert_eq!(root.children.len(), 3);

    let period_key = statement.periods[0].period_key.clone();
    let by_label: Vec<&str> = root.children.iter().map(|c| c.concept.local_name.as_str()).collect();
    assert_eq!(by_label, vec!["Assets", "Liabilities", "StockholdersEquity"]);

    let assets = root.children[0].values.get(&period_key).expect("assets value present");
    assert_eq!(decimal(&assets.value), BigDecimal::from(50_000_000_000i64));
    let liabilities = root.children[1].values.get(&period_key).unwrap();
    assert_eq!(decimal(&liabilities.value), BigDecimal::from(20_000_000_000i64));
    let equity = root.children[2].values.get(&period_key).unwrap();
    assert_eq!(decimal(&equity.value), BigDecimal::from(30_000_000_000i64));
}

/// A single role ("Statements of Operations and Comprehensive Income")
/// serves both the Income Statement and the Comprehensive Income
/// canonical types, via different resolver tiers.
#[test]
fn combined_operations_and_comprehensive_income_role_serves_both_types() {
    let filing = parse_filing();
    let registry = RegistryBundle::default();

    let income = filing
        .resolve(StatementType::IncomeStatement, false, &registry)
        .expect("income statement should resolve");
    let comprehensive = filing
        .resolve(StatementType::ComprehensiveIncome, false, &registry)
        .expect("comprehensive income should resolve");

    assert_eq!(income.role, comprehensive.role);
    assert_eq!(income.role, "http://co.com/role/StatementsOfOperationsAndComprehensiveIncome");
    assert_eq!(income.tier, ResolutionTier::RoleText);
    assert_eq!(comprehensive.tier, ResolutionTier::PrimaryConcept);

    let outcome = filing.generate_statement(
        StatementType::IncomeStatement,
        false,
        None,
        &GenerationOptions::default(),
        &registry,
    );
    let ResolutionOutcome::Found(statement) = outcome else {
        panic!("expected income statement line items");
    };
    let root = &statement.line_items[0];
    assert_eq!(root.children.len(), 3);
    assert_eq!(root.children[0].concept.local_name, "Revenues");
    assert_eq!(root.children[1].concept.local_name, "NetIncomeLoss");
    assert_eq!(root.children[2].concept.local_name, "ComprehensiveIncomeNetOfTax");

    let period_key = statement.periods[0].period_key.clone();
    let revenues = decimal(&root.children[0].values.get(&period_key).unwrap().value);
    assert_eq!(revenues, BigDecimal::from(96_000_000_000i64));
}

/// A dimensionally-tagged revenue line expands into its segment breakdown
/// only when the caller opts in.
#[test]
fn dimensional_breakdown_is_opt_in() {
    let filing = parse_filing();
    let registry = RegistryBundle::default();

    let without_dims = filing.generate_statement(
        StatementType::IncomeStatement,
        false,
        None,
        &GenerationOptions::default(),
        &registry,
    );
    let revenues_no_dims = match without_dims {
        ResolutionOutcome::Found(s) => s.line_items[0].children[0].clone(),
        ResolutionOutcome::NotFound { .. } => panic!("expected a statement"),
    };
    assert!(revenues_no_dims.children.is_empty());

    let with_dims = filing.generate_statement(
        StatementType::IncomeStatement,
        false,
        None,
        &GenerationOptions {
            include_dimensions: true,
            standardize: false,
        },
        &registry,
    );
    let ResolutionOutcome::Found(statement) = with_dims else {
        panic!("expected a statement");
    };
    let revenues = &statement.line_items[0].children[0];
    assert_eq!(revenues.children.len(), 3);

    let period_key = statement.periods[0].period_key.clone();
    let segment_total: BigDecimal = revenues
        .children
        .iter()
        .map(|c| decimal(&c.values.get(&period_key).unwrap().value))
        .sum();
    assert_eq!(segment_total, BigDecimal::from(96_000_000_000i64));

    let labels: Vec<&str> = revenues.children.iter().map(|c| c.label.as_str()).collect();
    assert!(labels.contains(&"AutomotiveSegmentMember"));
    assert!(labels.contains(&"EnergyGenerationAndStorageSegmentMember"));
    assert!(labels.contains(&"ServicesAndOtherSegmentMember"));

    // Segment rows are sorted by a stable key, not hash-map iteration
    // order, so generating the statement twice produces the same order.
    let with_dims_again = filing.generate_statement(
        StatementType::IncomeStatement,
        false,
        None,
        &GenerationOptions {
            include_dimensions: true,
            standardize: false,
        },
        &registry,
    );
    let ResolutionOutcome::Found(statement_again) = with_dims_again else {
        panic!("expected a statement");
    };
    let labels_again: Vec<&str> =
        statement_again.line_items[0].children[0].children.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, labels_again);
}

/// Regression coverage for the schema parser correctly pairing each
/// `roleType`'s own `<definition>` child with its URI when a schema
/// declares more than one role, rather than misattributing definitions by
/// hash-map iteration order.
#[test]
fn role_definitions_are_not_cross_attributed() {
    let filing = parse_filing();
    assert_eq!(
        filing.document.role_definitions.get("http://co.com/role/BalanceSheets").map(String::as_str),
        Some("1002 - Statement - Consolidated Balance Sheets")
    );
    assert_eq!(
        filing
            .document
            .role_definitions
            .get("http://co.com/role/StatementsOfOperationsAndComprehensiveIncome")
            .map(String::as_str),
        Some("1003 - Statement - Consolidated Statements of Operations and Comprehensive Income")
    );
}

#[test]
fn fact_query_filters_by_concept_pattern() {
    let filing = parse_filing();
    let net_income = filing
        .query()
        .concept_pattern(Regex::new("NetIncome").unwrap())
        .execute();
    assert_eq!(net_income.len(), 1);
    assert_eq!(decimal(&net_income[0].value), BigDecimal::from(15_000_000_000i64));
}
