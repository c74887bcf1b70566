use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Provenance, Record};

use crate::context::PipelineContext;
use crate::pipeline::Stage;

/// Objective written over values outside the whitelist.
pub const FALLBACK_OBJECTIVE: &str = "Awareness";

/// Fills blank plan attributes with configured defaults.
pub struct DefaultsStage;

impl Stage for DefaultsStage {
    fn run(
        &self,
        mut records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        let defaults = &ctx.rules.defaults;
        let fills = [
            ("Objective", ctx.rules.temporary_fills.objective.as_str()),
            ("Buying Model", defaults.buying_model.as_str()),
            ("Innovation", defaults.innovation.as_str()),
            ("Inventory Buy", defaults.inventory_buy.as_str()),
            ("Creative Source", defaults.creative_source.as_str()),
        ];
        for record in &mut records {
            for (field, value) in fills {
                if !record.is_blank(field) {
                    continue;
                }
                ledger.append(
                    ExceptionEvent::for_record(record, field, IssueType::defaulted(field))
                        .with_suggested(value),
                );
                record.set_by(field, value, Provenance::stage(self.name()));
            }
        }
        records
    }

    fn name(&self) -> &str {
        "defaults"
    }
}

/// Replaces objectives outside `allowed_objectives` with [`FALLBACK_OBJECTIVE`].
pub struct ObjectiveStage;

impl Stage for ObjectiveStage {
    fn run(
        &self,
        mut records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        let allowed = &ctx.rules.allowed_objectives;
        for record in &mut records {
            let objective = record.text("Objective");
            if allowed.iter().any(|value| *value == objective) {
                continue;
            }
            ledger.append(
                ExceptionEvent::for_record(record, "Objective", IssueType::ObjectiveNormalised)
                    .with_current(objective)
                    .with_suggested(FALLBACK_OBJECTIVE),
            );
            record.set_by("Objective", FALLBACK_OBJECTIVE, Provenance::stage(self.name()));
        }
        records
    }

    fn name(&self) -> &str {
        "objectives"
    }

    fn should_skip(&self, ctx: &PipelineContext) -> bool {
        ctx.rules.allowed_objectives.is_empty()
    }
}
