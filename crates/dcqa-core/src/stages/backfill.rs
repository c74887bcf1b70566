use chrono::NaiveDate;
use tracing::debug;

use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Provenance, Record, Value};
use dcqa_taxonomy::BackfillScope;
use dcqa_transform::normalization::{parse_date_value, parse_number_value};

use crate::context::PipelineContext;
use crate::pipeline::Stage;

/// Copies planned spend into blank or zero actuals once a line is old enough.
pub struct ActualisationBackfillStage;

/// Days between the record's end (or start) date and `as_of`.
fn days_since_end(record: &Record, as_of: NaiveDate) -> Option<i64> {
    let end = ["End Date", "Start Date"]
        .iter()
        .find_map(|field| record.get(field).and_then(parse_date_value))?;
    Some((as_of - end).num_days())
}

fn issue_for(scope: &BackfillScope) -> IssueType {
    scope
        .qa_flag
        .parse()
        .unwrap_or_else(|_| IssueType::Flagged("missing_actualisation".to_string()))
}

impl Stage for ActualisationBackfillStage {
    fn run(
        &self,
        mut records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        let config = &ctx.rules.actualisation_backfill;
        let mut filled = 0usize;
        for record in &mut records {
            let Some(days) = days_since_end(record, ctx.as_of) else {
                continue;
            };
            if days < config.age_days_threshold {
                continue;
            }
            for scope in config.scopes() {
                if !record.contains(&scope.actual_col) || !record.contains(&scope.planned_col) {
                    continue;
                }
                let actual = record
                    .get(&scope.actual_col)
                    .and_then(parse_number_value)
                    .unwrap_or(0.0);
                if actual != 0.0 {
                    continue;
                }
                let planned = record
                    .get(&scope.planned_col)
                    .and_then(parse_number_value)
                    .unwrap_or(0.0);
                let planned = Value::Number(planned);
                ledger.append(
                    ExceptionEvent::for_record(record, scope.actual_col.as_str(), issue_for(scope))
                        .with_current("0/blank")
                        .with_suggested(planned.to_string())
                        .with_extra("Days_Since_End", days.to_string()),
                );
                record.set_by(&scope.actual_col, planned, Provenance::stage(self.name()));
                filled += 1;
            }
        }
        debug!(filled, "actualisation backfill");
        records
    }

    fn name(&self) -> &str {
        "actualisation_backfill"
    }

    fn should_skip(&self, ctx: &PipelineContext) -> bool {
        !ctx.rules.actualisation_backfill.enabled
    }
}

#[cfg(test)]
mod tests {
    use dcqa_taxonomy::{RulesConfig, Taxonomy};

    use super::*;
    use crate::stages::testing::context;

    fn rules() -> RulesConfig {
        let mut rules = RulesConfig::default();
        rules.actualisation_backfill.local = Some(BackfillScope {
            actual_col: "Total Cost to Client Actual (Local)".to_string(),
            planned_col: "Total Cost to Client (Local)".to_string(),
            qa_flag: "missing_actualisation".to_string(),
        });
        rules
    }

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn stale_lines_receive_planned_values() {
        let ctx = context(Taxonomy::default(), rules());
        let ledger = ExceptionLedger::new();
        let out = ActualisationBackfillStage.run(
            vec![
                Record::new(0)
                    .with("End Date", date(2024, 5, 1))
                    .with("Total Cost to Client (Local)", 1500.0)
                    .with("Total Cost to Client Actual (Local)", Value::Null),
                Record::new(1)
                    .with("End Date", date(2024, 6, 20))
                    .with("Total Cost to Client (Local)", 800.0)
                    .with("Total Cost to Client Actual (Local)", 0.0),
                Record::new(2)
                    .with("End Date", date(2024, 1, 31))
                    .with("Total Cost to Client (Local)", 900.0)
                    .with("Total Cost to Client Actual (Local)", 850.0),
            ],
            &ctx,
            &ledger,
        );
        assert_eq!(
            out[0].get("Total Cost to Client Actual (Local)"),
            Some(&Value::Number(1500.0))
        );
        assert_eq!(
            out[1].get("Total Cost to Client Actual (Local)"),
            Some(&Value::Number(0.0))
        );
        assert_eq!(
            out[2].get("Total Cost to Client Actual (Local)"),
            Some(&Value::Number(850.0))
        );
        let events = ledger.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].issue_type.code(), "missing_actualisation");
        assert_eq!(events[0].suggested_value, "1500");
        assert_eq!(events[0].column("Days_Since_End"), "60");
    }

    #[test]
    fn start_date_stands_in_for_missing_end() {
        let ctx = context(Taxonomy::default(), rules());
        let record = Record::new(0).with("Start Date", date(2024, 5, 31));
        assert_eq!(days_since_end(&record, ctx.as_of), Some(30));
        assert_eq!(days_since_end(&Record::new(1), ctx.as_of), None);
    }
}
