use tracing::{debug, info};

use dcqa_map::{BrandOutcome, BrandResolver, FallbackJoiner};
use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Record};

use crate::context::PipelineContext;
use crate::pipeline::Stage;
use crate::stages::{output_mappings, precedence_rules};

const KEY_FIELDS: [(&str, &str); 3] = [
    ("raw_brand", "Brand"),
    ("raw_variant", "Variant"),
    ("market", "Market"),
];

/// Extra event column carrying the raw variant for fix packs.
pub const VARIANT_EXTRA: &str = "Variant";

const CLEAN_FIELDS: [&str; 5] = [
    "Brand_clean",
    "Brand_Type",
    "Category_clean",
    "SubCategory_clean",
    "Variant_clean",
];

/// Brand attribution: precedence join, then the two-pass resolver or the
/// plan-name hint check.
pub struct BrandStage;

impl BrandStage {
    fn check_unresolved(&self, records: &[Record], ctx: &PipelineContext, ledger: &ExceptionLedger) {
        for record in records {
            let clean = record.text("Brand_clean");
            if clean.trim().is_empty() {
                ledger.append(
                    ExceptionEvent::for_record(record, "Brand", IssueType::BrandUnmapped)
                        .with_current(record.text("Brand"))
                        .with_extra(VARIANT_EXTRA, record.text("Variant")),
                );
                continue;
            }
            let plan_name = record.text("Plan Name");
            let hinted = ctx
                .brand_hints
                .iter()
                .find(|(_, pattern)| pattern.is_match(&plan_name));
            if let Some((brand, _)) = hinted
                && *brand != clean
            {
                ledger.append(
                    ExceptionEvent::for_record(record, "Brand", IssueType::BrandConflictWithPlanName)
                        .with_current(clean)
                        .with_suggested(brand.as_str()),
                );
            }
        }
    }
}

impl Stage for BrandStage {
    fn run(
        &self,
        mut records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        let mapping = &ctx.rules.brand_mapping;
        for record in &mut records {
            for field in CLEAN_FIELDS {
                record.ensure(field);
            }
        }
        let joiner = FallbackJoiner::new(
            self.name(),
            &ctx.taxonomy.brands,
            precedence_rules(&mapping.precedence, &KEY_FIELDS),
            output_mappings(&mapping.outputs),
        )
        .with_key_match(mapping.key_match);
        let (records, stats) = joiner.apply_with_stats(records);
        debug!(unresolved = stats.unresolved, "brand join");

        match &ctx.aliases {
            Some(aliases) if mapping.two_pass.enabled => {
                let resolver = BrandResolver::new(aliases).with_clean_field("Brand_clean");
                let mut unmapped = 0usize;
                let records: Vec<Record> = records
                    .into_iter()
                    .map(|mut record| {
                        let resolution = resolver.annotate(&mut record);
                        if let Some(event) = resolver.event(&record, &resolution) {
                            if resolution.outcome() == BrandOutcome::Unmapped {
                                unmapped += 1;
                            }
                            ledger.append(event.with_extra(VARIANT_EXTRA, record.text("Variant")));
                        }
                        record
                    })
                    .collect();
                info!(rows = records.len(), unmapped, "brand two-pass resolved");
                records
            }
            _ => {
                self.check_unresolved(&records, ctx, ledger);
                records
            }
        }
    }

    fn name(&self) -> &str {
        "brand"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use dcqa_taxonomy::{RulesConfig, Taxonomy};

    use super::*;
    use crate::stages::testing::{context, table};

    fn taxonomy() -> Taxonomy {
        Taxonomy {
            brands: table(
                "brands",
                ["market", "raw_brand", "raw_variant", "brand_clean", "variant_clean"],
                &[
                    ["DK", "acme", "lite", "Acme Corp", "Acme Lite"],
                    ["DK", "acme", "", "Acme Corp", ""],
                    ["", "beta", "", "Beta Foods", ""],
                ],
            ),
            ..Taxonomy::default()
        }
    }

    fn rules(two_pass: bool) -> RulesConfig {
        let mut rules = RulesConfig::default();
        rules.brand_mapping.precedence = vec![
            vec!["market".to_string(), "raw_brand".to_string(), "raw_variant".to_string()],
            vec!["market".to_string(), "raw_brand".to_string()],
            vec!["raw_brand".to_string()],
        ];
        rules.brand_mapping.outputs = BTreeMap::from([
            ("brand_clean".to_string(), "Brand_clean".to_string()),
            ("variant_clean".to_string(), "Variant_clean".to_string()),
        ]);
        rules.brand_mapping.two_pass.enabled = two_pass;
        rules
    }

    #[test]
    fn join_fills_clean_columns_by_precedence() {
        let ctx = context(taxonomy(), rules(false));
        let ledger = ExceptionLedger::new();
        let out = BrandStage.run(
            vec![
                Record::new(0).with("Market", "DK").with("Brand", " acme ").with("Variant", "lite"),
                Record::new(1).with("Market", "SE").with("Brand", "beta").with("Variant", ""),
            ],
            &ctx,
            &ledger,
        );
        assert_eq!(out[0].text("Brand_clean"), "Acme Corp");
        assert_eq!(out[0].text("Variant_clean"), "Acme Lite");
        assert_eq!(out[1].text("Brand_clean"), "Beta Foods");
        assert!(out[1].contains("Category_clean"));
        assert!(ledger.is_empty());
    }

    #[test]
    fn without_two_pass_blank_brands_and_hints_are_reported() {
        let mut rules = rules(false);
        rules
            .brand_mapping
            .conflict_hints
            .brand_regex
            .insert("Beta Foods".to_string(), "(?i)beta".to_string());
        let ctx = context(taxonomy(), rules);
        let ledger = ExceptionLedger::new();
        BrandStage.run(
            vec![
                Record::new(0).with("Brand", "unknown").with("Plan Name", "Q1"),
                Record::new(1)
                    .with("Market", "DK")
                    .with("Brand", "acme")
                    .with("Plan Name", "BETA launch"),
            ],
            &ctx,
            &ledger,
        );
        let events = ledger.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].issue_type, IssueType::BrandUnmapped);
        assert_eq!(events[0].current_value, "unknown");
        assert!(events[0].extra.iter().any(|(column, _)| column == VARIANT_EXTRA));
        assert_eq!(events[1].issue_type, IssueType::BrandConflictWithPlanName);
        assert_eq!(events[1].current_value, "Acme Corp");
        assert_eq!(events[1].suggested_value, "Beta Foods");
    }

    #[test]
    fn two_pass_fills_clean_brand_from_title() {
        let ctx = context(taxonomy(), rules(true));
        let ledger = ExceptionLedger::new();
        let out = BrandStage.run(
            vec![
                Record::new(0)
                    .with("Market", "NO")
                    .with("Brand", "")
                    .with("Plan Name", "Summer Beta Foods push")
                    .with("Campaign Name", ""),
            ],
            &ctx,
            &ledger,
        );
        assert_eq!(out[0].text("Brand_final"), "Beta Foods");
        assert_eq!(out[0].text("Brand_clean"), "Beta Foods");
        let events = ledger.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].issue_type, IssueType::BrandInferredFromTitle);
        assert_eq!(events[0].column(VARIANT_EXTRA), "");
    }
}
