use chrono::{Datelike, NaiveDate};
use tracing::warn;

use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Provenance, Record, Value};
use dcqa_taxonomy::DatePlaceholders;
use dcqa_transform::normalization::{parse_date, parse_date_value, parse_number_value, parse_year};

use crate::context::PipelineContext;
use crate::pipeline::Stage;
use crate::stages::coercion::is_metric_column;

const START: &str = "Start Date";
const END: &str = "End Date";

/// Drops undated rows without values and fills missing dates from the
/// configured placeholders.
pub struct DatesStage;

fn date_of(record: &Record, field: &str) -> Option<NaiveDate> {
    record.get(field).and_then(parse_date_value)
}

fn carries_values(record: &Record) -> bool {
    record
        .fields()
        .filter(|(name, _)| is_metric_column(name))
        .any(|(_, value)| parse_number_value(value).is_some_and(|number| number != 0.0))
}

impl DatesStage {
    fn placeholder(
        &self,
        record: &mut Record,
        field: &str,
        template: Option<&str>,
        fx_year: i32,
        ledger: &ExceptionLedger,
    ) {
        let Some(template) = template else {
            return;
        };
        let rendered = DatePlaceholders::render(template, fx_year);
        let Some(date) = parse_date(&rendered) else {
            warn!(%field, template, "date placeholder does not parse");
            return;
        };
        ledger.append(
            ExceptionEvent::for_record(record, field, IssueType::DatePlaceholderApplied)
                .with_suggested(date.to_string()),
        );
        record.set_by(field, Value::Date(date), Provenance::stage(self.name()));
    }
}

impl Stage for DatesStage {
    fn run(
        &self,
        records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        let placeholders = &ctx.rules.date_placeholders;
        records
            .into_iter()
            .filter_map(|mut record| {
                let start = date_of(&record, START);
                let end = date_of(&record, END);
                if start.is_none() && end.is_none() && !carries_values(&record) {
                    ledger.append(ExceptionEvent::for_record(
                        &record,
                        "Row",
                        IssueType::RowDroppedEmpty,
                    ));
                    return None;
                }
                let fx_year = record
                    .get("FX_Year")
                    .and_then(parse_year)
                    .unwrap_or_else(|| ctx.as_of.year());
                if start.is_none() {
                    let template = placeholders.start_if_missing.as_deref();
                    self.placeholder(&mut record, START, template, fx_year, ledger);
                }
                if end.is_none() {
                    let template = placeholders.end_if_missing.as_deref();
                    self.placeholder(&mut record, END, template, fx_year, ledger);
                }
                Some(record)
            })
            .collect()
    }

    fn name(&self) -> &str {
        "dates"
    }
}

#[cfg(test)]
mod tests {
    use dcqa_taxonomy::{RulesConfig, Taxonomy};

    use super::*;
    use crate::stages::testing::context;

    fn rules() -> RulesConfig {
        let mut rules = RulesConfig::default();
        rules.date_placeholders.start_if_missing = Some("01/01/{FX_Year}".to_string());
        rules.date_placeholders.end_if_missing = Some("31/12/{FX_Year}".to_string());
        rules
    }

    #[test]
    fn empty_undated_rows_are_dropped() {
        let ctx = context(Taxonomy::default(), rules());
        let ledger = ExceptionLedger::new();
        let out = DatesStage.run(
            vec![Record::new(0).with("Planned Spend", 0.0).with("Plan Name", "Ghost")],
            &ctx,
            &ledger,
        );
        assert!(out.is_empty());
        assert_eq!(ledger.snapshot()[0].issue_type, IssueType::RowDroppedEmpty);
    }

    #[test]
    fn placeholders_use_the_row_fiscal_year() {
        let ctx = context(Taxonomy::default(), rules());
        let ledger = ExceptionLedger::new();
        let start = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        let out = DatesStage.run(
            vec![
                Record::new(0)
                    .with("Start Date", start)
                    .with("End Date", Value::Null)
                    .with("FX_Year", 2023.0),
            ],
            &ctx,
            &ledger,
        );
        assert_eq!(out[0].text("End Date"), "2023-12-31");
        assert_eq!(out[0].text("Start Date"), "2023-03-01");
        let events = ledger.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].field, "End Date");
        assert_eq!(events[0].suggested_value, "2023-12-31");
    }

    #[test]
    fn rows_with_values_are_kept_without_templates() {
        let ctx = context(Taxonomy::default(), RulesConfig::default());
        let ledger = ExceptionLedger::new();
        let out = DatesStage.run(
            vec![Record::new(0).with("Planned Spend", 10.0)],
            &ctx,
            &ledger,
        );
        assert_eq!(out.len(), 1);
        assert!(ledger.is_empty());
    }
}
