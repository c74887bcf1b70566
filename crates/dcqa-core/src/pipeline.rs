//! Ordered stage execution for one batch.
//!
//! # Plans pipeline order
//!
//! 1. **coercion**: dates and numeric-looking columns
//! 2. **plan_status**: default blank status, drop cancelled rows
//! 3. **dates**: drop empty rows, apply date placeholders
//! 4. **defaults**: fill blank plan attributes
//! 5. **objectives**: whitelist objectives
//! 6. **region_check**: market/region consistency (opt-in)
//! 7. **brand**, **vendor**, **channel**, **campaign**: taxonomy joins
//! 8. **actualisation_backfill**: planned values into stale actuals
//! 9. **fx**: rates, derived currency columns, audit
//! 10. **cbht**: brand league

use tracing::{debug, info_span};

use dcqa_model::{ExceptionLedger, Record};

use crate::context::PipelineContext;
use crate::stages::{
    ActualisationBackfillStage, BrandStage, CampaignStage, CbhtStage, ChannelStage,
    CoercionStage, DatesStage, DefaultsStage, ObjectiveStage, PlanStatusStage, RegionCheckStage,
    VendorStage,
};
use crate::fx::FxStage;

/// One transformation over a batch of records.
///
/// Stages never fail: anomalies degrade to a safe value plus a ledger event.
pub trait Stage: Send + Sync {
    fn run(
        &self,
        records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record>;

    /// Human-readable name for this stage (for logging).
    fn name(&self) -> &str;

    /// Whether this stage should be skipped based on context.
    fn should_skip(&self, _ctx: &PipelineContext) -> bool {
        false
    }
}

#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn execute(
        &self,
        mut records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        for stage in &self.stages {
            if stage.should_skip(ctx) {
                debug!(stage = stage.name(), "stage skipped");
                continue;
            }
            let span = info_span!("stage", stage = stage.name());
            let _guard = span.enter();
            let rows_in = records.len();
            let events_before = ledger.len();
            records = stage.run(records, ctx, ledger);
            debug!(
                rows_in,
                rows_out = records.len(),
                events = ledger.len() - events_before,
                "stage complete"
            );
        }
        records
    }
}

pub fn build_plans_pipeline() -> Pipeline {
    Pipeline::new()
        .add_stage(Box::new(CoercionStage::plans()))
        .add_stage(Box::new(PlanStatusStage))
        .add_stage(Box::new(DatesStage))
        .add_stage(Box::new(DefaultsStage))
        .add_stage(Box::new(ObjectiveStage))
        .add_stage(Box::new(RegionCheckStage))
        .add_stage(Box::new(BrandStage))
        .add_stage(Box::new(VendorStage))
        .add_stage(Box::new(ChannelStage))
        .add_stage(Box::new(CampaignStage))
        .add_stage(Box::new(ActualisationBackfillStage))
        .add_stage(Box::new(FxStage))
        .add_stage(Box::new(CbhtStage))
}

/// Budgets: channel join, numeric coercion, and FX when the batch carries
/// a `Currency` column.
pub fn build_budgets_pipeline(has_currency: bool) -> Pipeline {
    let pipeline = Pipeline::new()
        .add_stage(Box::new(ChannelStage))
        .add_stage(Box::new(CoercionStage::numeric_only()));
    if has_currency {
        pipeline.add_stage(Box::new(FxStage))
    } else {
        pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plans_pipeline_order() {
        assert_eq!(
            build_plans_pipeline().stage_names(),
            vec![
                "coercion",
                "plan_status",
                "dates",
                "defaults",
                "objectives",
                "region_check",
                "brand",
                "vendor",
                "channel",
                "campaign",
                "actualisation_backfill",
                "fx",
                "cbht",
            ]
        );
    }

    #[test]
    fn budgets_pipeline_skips_fx_without_currency() {
        assert_eq!(build_budgets_pipeline(false).stage_names(), vec!["channel", "coercion"]);
        assert_eq!(
            build_budgets_pipeline(true).stage_names(),
            vec!["channel", "coercion", "fx"]
        );
    }
}
