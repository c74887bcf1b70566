use dcqa_map::{FallbackJoiner, KeyPair, OutputMapping, PrecedenceRule};
use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Provenance, Record};

use crate::context::PipelineContext;
use crate::pipeline::Stage;

/// Vendor attribution with a placeholder for unknown vendors.
pub struct VendorStage;

impl Stage for VendorStage {
    fn run(
        &self,
        records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        let joiner = FallbackJoiner::new(
            self.name(),
            &ctx.taxonomy.vendors,
            vec![PrecedenceRule::new(vec![KeyPair::new("Vendor", "raw_vendor")])],
            vec![
                OutputMapping::new("vendor_clean", "Vendor_clean"),
                OutputMapping::new("vendor_house", "Vendor_House"),
                OutputMapping::new("vendor_type", "Vendor_Type"),
            ],
        );
        let placeholder = ctx.rules.vendor_rules.placeholder.as_str();
        joiner
            .apply(records)
            .into_iter()
            .map(|mut record| {
                if record.is_blank("Vendor_clean") {
                    ledger.append(
                        ExceptionEvent::for_record(&record, "Vendor", IssueType::VendorUnmapped)
                            .with_current(record.text("Vendor"))
                            .with_suggested(placeholder),
                    );
                    record.set_by("Vendor_clean", placeholder, Provenance::stage(self.name()));
                }
                record
            })
            .collect()
    }

    fn name(&self) -> &str {
        "vendor"
    }
}

#[cfg(test)]
mod tests {
    use dcqa_taxonomy::{RulesConfig, Taxonomy};

    use super::*;
    use crate::stages::testing::{context, table};

    #[test]
    fn unknown_vendor_gets_placeholder() {
        let taxonomy = Taxonomy {
            vendors: table(
                "vendors",
                ["raw_vendor", "vendor_clean", "vendor_house", "vendor_type"],
                &[["fb", "Meta", "Meta Platforms", "Social"]],
            ),
            ..Taxonomy::default()
        };
        let ctx = context(taxonomy, RulesConfig::default());
        let ledger = ExceptionLedger::new();
        let out = VendorStage.run(
            vec![
                Record::new(0).with("Vendor", "fb"),
                Record::new(1).with("Vendor", "tiktok"),
            ],
            &ctx,
            &ledger,
        );
        assert_eq!(out[0].text("Vendor_Type"), "Social");
        assert_eq!(out[1].text("Vendor_clean"), "_Placeholder");
        assert!(out[1].is_blank("Vendor_House"));
        let events = ledger.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].current_value, "tiktok");
        assert_eq!(events[0].suggested_value, "_Placeholder");
    }
}
