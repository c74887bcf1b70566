use dcqa_map::FallbackJoiner;
use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Provenance, Record};

use crate::context::PipelineContext;
use crate::pipeline::Stage;
use crate::stages::{output_mappings, precedence_rules};

const KEY_FIELDS: [(&str, &str); 3] = [
    ("raw_campaign", "Campaign Name"),
    ("market", "Market"),
    ("brand", "Brand_clean"),
];

/// Campaign attribution; unknown campaigns keep their raw name.
pub struct CampaignStage;

impl Stage for CampaignStage {
    fn run(
        &self,
        mut records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        for record in &mut records {
            for field in ["Campaign_clean", "Campaign_Type", "Campaign_SubType"] {
                record.ensure(field);
            }
        }
        let mapping = &ctx.rules.campaign_mapping;
        let joiner = FallbackJoiner::new(
            self.name(),
            &ctx.taxonomy.campaigns,
            precedence_rules(&mapping.precedence, &KEY_FIELDS),
            output_mappings(&mapping.outputs),
        )
        .with_key_match(mapping.key_match);
        joiner
            .apply(records)
            .into_iter()
            .map(|mut record| {
                if record.is_blank("Campaign_clean") {
                    let raw = record.text("Campaign Name");
                    ledger.append(
                        ExceptionEvent::for_record(&record, "Campaign Name", IssueType::CampaignUnmapped)
                            .with_current(raw.as_str()),
                    );
                    record.set_by("Campaign_clean", raw, Provenance::stage(self.name()));
                }
                record
            })
            .collect()
    }

    fn name(&self) -> &str {
        "campaign"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use dcqa_map::KeyMatch;
    use dcqa_taxonomy::{RulesConfig, Taxonomy};

    use super::*;
    use crate::stages::testing::{context, table};

    #[test]
    fn market_specific_campaign_beats_global() {
        let taxonomy = Taxonomy {
            campaigns: table(
                "campaigns",
                ["raw_campaign", "market", "brand", "campaign_clean", "campaign_type"],
                &[
                    ["spring", "DK", "", "Spring DK", "Seasonal"],
                    ["spring", "", "", "Spring", "Seasonal"],
                ],
            ),
            ..Taxonomy::default()
        };
        let mut rules = RulesConfig::default();
        rules.campaign_mapping.precedence = vec![
            vec!["raw_campaign".to_string(), "market".to_string()],
            vec!["raw_campaign".to_string()],
        ];
        rules.campaign_mapping.outputs = BTreeMap::from([
            ("campaign_clean".to_string(), "Campaign_clean".to_string()),
            ("campaign_type".to_string(), "Campaign_Type".to_string()),
        ]);
        let ctx = context(taxonomy, rules);
        let ledger = ExceptionLedger::new();
        let out = CampaignStage.run(
            vec![
                Record::new(0).with("Campaign Name", "spring").with("Market", "DK"),
                Record::new(1).with("Campaign Name", "spring").with("Market", "SE"),
                Record::new(2).with("Campaign Name", "Autumn push").with("Market", "SE"),
            ],
            &ctx,
            &ledger,
        );
        assert_eq!(out[0].text("Campaign_clean"), "Spring DK");
        assert_eq!(out[1].text("Campaign_clean"), "Spring");
        assert_eq!(out[2].text("Campaign_clean"), "Autumn push");
        assert!(out[2].contains("Campaign_SubType"));
        let events = ledger.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].field, "Campaign Name");
        assert_eq!(events[0].issue_type, IssueType::CampaignUnmapped);
    }

    #[test]
    fn normalized_key_match_folds_campaign_spelling() {
        let taxonomy = Taxonomy {
            campaigns: table(
                "campaigns",
                ["raw_campaign", "campaign_clean"],
                &[["Spring Sale", "Spring Sale 2024"]],
            ),
            ..Taxonomy::default()
        };
        let mut rules = RulesConfig::default();
        rules.campaign_mapping.precedence = vec![vec!["raw_campaign".to_string()]];
        rules.campaign_mapping.outputs =
            BTreeMap::from([("campaign_clean".to_string(), "Campaign_clean".to_string())]);

        let ledger = ExceptionLedger::new();
        let exact = CampaignStage.run(
            vec![Record::new(0).with("Campaign Name", " SPRING-sale! ")],
            &context(taxonomy.clone(), rules.clone()),
            &ledger,
        );
        assert!(exact[0].contains("Campaign_clean"));
        assert_eq!(ledger.snapshot()[0].issue_type, IssueType::CampaignUnmapped);

        rules.campaign_mapping.key_match = KeyMatch::Normalized;
        let ledger = ExceptionLedger::new();
        let normalized = CampaignStage.run(
            vec![Record::new(0).with("Campaign Name", " SPRING-sale! ")],
            &context(taxonomy, rules),
            &ledger,
        );
        assert_eq!(normalized[0].text("Campaign_clean"), "Spring Sale 2024");
        assert!(ledger.is_empty());
    }
}
