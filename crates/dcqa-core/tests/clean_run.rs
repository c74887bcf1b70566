//! End-to-end runs over a project folder.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use dcqa_core::{ProjectPaths, run_brand_check, run_clean};
use dcqa_model::Record;
use tempfile::TempDir;

const PLANS: &str = "\
Plan ID,Plan Name,Plan Status,Market,Region,Currency,Brand,Variant,Vendor,Channel,Sub-Channel,Campaign Name,Start Date,End Date,Total Cost to Client (Local),Total Cost to Client (Global)
P-1,Acme spring,,DK,Nordics,DKK,acme,,fb,Digital,Social,spring,01/03/2024,31/03/2024,\"1,000\",134
P-2,Acme promo,Cancelled,DK,Nordics,DKK,acme,,fb,Digital,Social,spring,01/03/2024,31/03/2024,200,27
P-3,Zed plan,Planned,DK,Nordics,DKK,zzz,,tiktok,Digital,Social,autumn,01/04/2024,30/04/2024,500,10
P-1,Acme spring,,DK,Nordics,DKK,acme,,fb,Digital,Social,spring,01/03/2024,31/03/2024,\"1,000\",134
";

const BUDGETS: &str = "\
Market,Region,Brand,Channel,Sub-Channel,Planned (Local)
DK,Nordics,Acme Corp,Digital,Social,5000
DK,Nordics,Acme Corp,Digital,Social,5000
";

const RULES: &str = r#"
[brand_mapping]
precedence = [["market", "raw_brand"], ["raw_brand"]]

[brand_mapping.outputs]
brand_clean = "Brand_clean"

[campaign_mapping]
precedence = [["raw_campaign", "market"]]

[campaign_mapping.outputs]
campaign_clean = "Campaign_clean"

[fx_rules.compute_pairs]
EUR = [["Total Cost to Client (Local)", "Planned_Spend_EUR"]]
"#;

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    write(&base.join("input/raw/plans_2024_q1.csv"), PLANS);
    write(&base.join("input/raw/budgets_2024.csv"), BUDGETS);
    write(&base.join("rules/validation_rules.toml"), RULES);
    let taxonomy = base.join("taxonomy");
    write(
        &taxonomy.join("brands.csv"),
        "market,raw_brand,raw_variant,brand_clean\nDK,acme,,Acme Corp\n",
    );
    write(
        &taxonomy.join("vendors.csv"),
        "raw_vendor,vendor_clean,vendor_house,vendor_type\nfb,Meta,Meta Platforms,Social\n",
    );
    write(
        &taxonomy.join("campaigns.csv"),
        "raw_campaign,market,brand,campaign_clean\nspring,DK,,Spring Launch\n",
    );
    write(
        &taxonomy.join("channels.csv"),
        "Channel,Sub-Channel,ChannelFinanceGroup,ExComChannel\nDigital,Social,Paid Social,Digital\n",
    );
    write(
        &taxonomy.join("fx_rates.csv"),
        "market,currency,fx_year,fx_to_eur,fx_to_dkk,region\nDK,DKK,2024,0.134,1,Nordics\n",
    );
    write(
        &taxonomy.join("cbht.csv"),
        "brand,market,fx_year,brand_league\nAcme Corp,DK,2024,Gold\n",
    );
    dir
}

fn plan<'a>(records: &'a [Record], id: &str) -> &'a Record {
    records.iter().find(|record| record.text("Plan ID") == id).unwrap()
}

#[test]
fn clean_run_attributes_plans_and_logs_gaps() {
    let dir = project();
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let run = run_clean(&ProjectPaths::new(dir.path()), as_of).unwrap();

    let records = &run.plans.records;
    assert_eq!(records.len(), 2, "cancelled row dropped and duplicate removed");

    let acme = plan(records, "P-1");
    assert_eq!(acme.text("Plan Status"), "Planned");
    assert_eq!(acme.text("Brand_clean"), "Acme Corp");
    assert_eq!(acme.text("Brand_final"), "Acme Corp");
    assert_eq!(acme.text("Vendor_clean"), "Meta");
    assert_eq!(acme.text("SubChannel_clean"), "Social");
    assert_eq!(acme.text("Campaign_clean"), "Spring Launch");
    assert_eq!(acme.text("CBHT_Brand_League"), "Gold");
    let eur = acme.get("Planned_Spend_EUR").and_then(|value| value.as_number()).unwrap();
    assert!((eur - 134.0).abs() < 1e-9);

    let zed = plan(records, "P-3");
    assert!(zed.is_blank("Brand_clean"));
    assert_eq!(zed.text("Vendor_clean"), "_Placeholder");
    assert_eq!(zed.text("Campaign_clean"), "autumn");

    let counts = run.ledger.counts_by_issue();
    assert_eq!(counts.get("row_dropped_cancelled"), Some(&1));
    assert_eq!(counts.get("status_defaulted"), Some(&2));
    assert_eq!(counts.get("brand_unmapped"), Some(&1));
    assert_eq!(counts.get("vendor_unmapped"), Some(&1));
    assert_eq!(counts.get("campaign_unmapped"), Some(&1));
    assert_eq!(counts.get("cbht_missing"), Some(&1));
    assert_eq!(counts.get("eur_mismatch"), Some(&1));
    assert_eq!(counts.get("fx_missing"), None);

    assert_eq!(run.plans.mapping_diff.rows.len(), 2);
    assert_eq!(run.plans.mapping_diff.columns[0], "Plan ID");

    let budgets = &run.budgets.records;
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].text("ChannelFinanceGroup_clean"), "Paid Social");
    assert!(!budgets[0].contains("fx_to_eur"));
}

#[test]
fn brand_check_uses_the_latest_plans_batch() {
    let dir = project();
    let run = run_brand_check(&ProjectPaths::new(dir.path())).unwrap();
    assert!(run.source.ends_with("plans_2024_q1.csv"));
    assert!(run.columns.iter().any(|column| column == "Reason_title"));
    let counts = run.ledger.counts_by_issue();
    assert_eq!(counts.get("brand_unmapped"), Some(&1));
    assert_eq!(counts.get("brand_conflict"), None);
}

#[test]
fn missing_taxonomy_table_fails_the_run() {
    let dir = project();
    fs::remove_file(dir.path().join("taxonomy/cbht.csv")).unwrap();
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let err = run_clean(&ProjectPaths::new(dir.path()), as_of).unwrap_err();
    assert!(format!("{err:#}").contains("cbht"));
}
