//! Precedence ordering across key-sets.

use dcqa_map::{FallbackJoiner, KeyPair, OutputMapping, PrecedenceRule};
use dcqa_model::{Provenance, Record, ReferenceTable};
use proptest::prelude::*;

fn campaigns() -> ReferenceTable {
    ReferenceTable::from_rows(
        "campaigns",
        ["raw_campaign", "market", "campaign_clean"],
        [
            vec!["spring", "", "Spring Global"],
            vec!["spring", "DK", "Spring DK"],
            vec!["", "SE", "Sweden Default"],
        ],
    )
}

fn joiner(table: &ReferenceTable) -> FallbackJoiner<'_> {
    FallbackJoiner::new(
        "campaign",
        table,
        vec![
            PrecedenceRule::new(vec![
                KeyPair::new("Campaign Name", "raw_campaign"),
                KeyPair::new("Market", "market"),
            ]),
            PrecedenceRule::new(vec![KeyPair::new("Campaign Name", "raw_campaign")]),
            PrecedenceRule::new(vec![KeyPair::new("Market", "market")]),
        ],
        vec![OutputMapping::new("campaign_clean", "Campaign_clean")],
    )
}

#[test]
fn earlier_rules_take_precedence() {
    let table = campaigns();
    let records = vec![
        Record::new(0).with("Campaign Name", "spring").with("Market", "DK"),
        Record::new(1).with("Campaign Name", "spring").with("Market", "NO"),
        Record::new(2).with("Campaign Name", "autumn").with("Market", "SE"),
    ];
    let (out, stats) = joiner(&table).apply_with_stats(records);

    assert_eq!(out[0].text("Campaign_clean"), "Spring DK");
    assert_eq!(out[0].provenance("Campaign_clean"), Provenance::rule("campaign", 0));
    assert_eq!(out[1].text("Campaign_clean"), "Spring Global");
    assert_eq!(out[1].provenance("Campaign_clean"), Provenance::rule("campaign", 1));
    assert_eq!(out[2].text("Campaign_clean"), "Sweden Default");
    assert_eq!(stats.filled_by_rule, vec![1, 1, 1]);
}

#[test]
fn input_values_are_never_overwritten() {
    let table = campaigns();
    let out = joiner(&table).apply(vec![
        Record::new(0)
            .with("Campaign Name", "spring")
            .with("Market", "DK")
            .with("Campaign_clean", "Hand Picked"),
    ]);
    assert_eq!(out[0].text("Campaign_clean"), "Hand Picked");
    assert_eq!(out[0].provenance("Campaign_clean"), Provenance::Input);
}

proptest! {
    #[test]
    fn first_matching_key_set_wins(k1 in "[a-z]{1,6}", k2 in "[a-z]{1,6}", v1 in "[A-Z]{1,6}", v2 in "[A-Z]{1,6}") {
        let table = ReferenceTable::from_rows(
            "ref",
            ["k1", "k2", "value"],
            [vec![String::new(), k2.clone(), v2.clone()], vec![k1.clone(), String::new(), v1.clone()]],
        );
        let joiner = FallbackJoiner::new(
            "prop",
            &table,
            vec![
                PrecedenceRule::new(vec![KeyPair::same("k1")]),
                PrecedenceRule::new(vec![KeyPair::same("k2")]),
            ],
            vec![OutputMapping::new("value", "out")],
        );
        let out = joiner.apply(vec![Record::new(0).with("k1", k1.as_str()).with("k2", k2.as_str())]);
        prop_assert_eq!(out[0].text("out"), v1);
    }
}
