use dcqa_map::{FallbackJoiner, OutputMapping};
use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Record};

use crate::context::PipelineContext;
use crate::pipeline::Stage;
use crate::stages::precedence_rules;

/// Reference key name for each record field used in `join_keys_order`.
const KEY_COLUMNS: [(&str, &str); 3] = [
    ("Brand_clean", "brand"),
    ("Market", "market"),
    ("FX_Year", "fx_year"),
];

/// Historical brand league lookup.
pub struct CbhtStage;

impl Stage for CbhtStage {
    fn run(
        &self,
        records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        // Configured keys name record fields; translate them to cbht columns.
        let key_sets: Vec<Vec<String>> = ctx
            .rules
            .cbht_rules
            .join_keys_order
            .iter()
            .map(|keys| {
                keys.iter()
                    .map(|field| {
                        KEY_COLUMNS
                            .iter()
                            .find(|(name, _)| *name == field.as_str())
                            .map_or(field.clone(), |(_, column)| (*column).to_string())
                    })
                    .collect()
            })
            .collect();
        let aliases: Vec<(&str, &str)> = KEY_COLUMNS
            .iter()
            .map(|(field, column)| (*column, *field))
            .collect();
        let joiner = FallbackJoiner::new(
            self.name(),
            &ctx.taxonomy.cbht,
            precedence_rules(&key_sets, &aliases),
            vec![OutputMapping::new("brand_league", "CBHT_Brand_League")],
        );
        let records = joiner.apply(records);
        for record in &records {
            if record.is_blank("CBHT_Brand_League") {
                ledger.append(
                    ExceptionEvent::for_record(record, "CBHT_Brand_League", IssueType::CbhtMissing)
                        .with_current(record.text("Brand_clean")),
                );
            }
        }
        records
    }

    fn name(&self) -> &str {
        "cbht"
    }
}
