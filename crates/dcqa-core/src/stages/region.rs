use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Record};

use crate::context::PipelineContext;
use crate::pipeline::Stage;

/// Compares each record's region with the market's region in the FX table.
pub struct RegionCheckStage;

impl Stage for RegionCheckStage {
    fn run(
        &self,
        records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        for record in &records {
            let market = record.text("Market");
            let region = record.text("Region");
            match ctx.fx.expected_region(&market) {
                Some(expected) => {
                    if !expected.is_empty() && !region.is_empty() && expected != region {
                        ledger.append(
                            ExceptionEvent::for_record(record, "Region", IssueType::RegionMismatch)
                                .with_current(region)
                                .with_suggested(expected),
                        );
                    }
                }
                None if !market.is_empty() => {
                    ledger.append(
                        ExceptionEvent::for_record(record, "Market", IssueType::MarketUnknown)
                            .with_current(market),
                    );
                }
                None => {}
            }
        }
        records
    }

    fn name(&self) -> &str {
        "region_check"
    }

    fn should_skip(&self, ctx: &PipelineContext) -> bool {
        !ctx.rules.region_check.enabled
    }
}
