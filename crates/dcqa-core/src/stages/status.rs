use tracing::debug;

use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Provenance, Record};

use crate::context::PipelineContext;
use crate::pipeline::Stage;

const FIELD: &str = "Plan Status";

/// Defaults blank statuses and drops cancelled plan lines.
pub struct PlanStatusStage;

fn is_cancelled(status: &str) -> bool {
    matches!(status.to_lowercase().as_str(), "cancelled" | "canceled")
}

impl Stage for PlanStatusStage {
    fn run(
        &self,
        records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        let default = ctx.rules.defaults.plan_status.as_str();
        let mut dropped = 0usize;
        let kept: Vec<Record> = records
            .into_iter()
            .filter_map(|mut record| {
                if !record.contains(FIELD) {
                    return Some(record);
                }
                if record.is_blank(FIELD) {
                    ledger.append(
                        ExceptionEvent::for_record(&record, FIELD, IssueType::StatusDefaulted)
                            .with_suggested(default),
                    );
                    record.set_by(FIELD, default, Provenance::stage(self.name()));
                }
                if is_cancelled(&record.text(FIELD)) {
                    ledger.append(ExceptionEvent::for_record(
                        &record,
                        FIELD,
                        IssueType::RowDroppedCancelled,
                    ));
                    dropped += 1;
                    return None;
                }
                Some(record)
            })
            .collect();
        debug!(dropped, "cancelled plan lines removed");
        kept
    }

    fn name(&self) -> &str {
        "plan_status"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::empty_context;

    #[test]
    fn blank_status_defaults_and_cancelled_rows_drop() {
        let ctx = empty_context();
        let ledger = ExceptionLedger::new();
        let out = PlanStatusStage.run(
            vec![
                Record::new(0).with("Plan Status", ""),
                Record::new(1).with("Plan Status", " Canceled "),
                Record::new(2).with("Plan Status", "Live"),
            ],
            &ctx,
            &ledger,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text("Plan Status"), "Planned");
        let events = ledger.snapshot();
        assert_eq!(events[0].issue_type, IssueType::StatusDefaulted);
        assert_eq!(events[0].suggested_value, "Planned");
        assert_eq!(events[1].issue_type, IssueType::RowDroppedCancelled);
    }
}
