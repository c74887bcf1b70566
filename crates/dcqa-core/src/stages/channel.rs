use dcqa_map::{FallbackJoiner, OutputMapping};
use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Record};

use crate::context::PipelineContext;
use crate::pipeline::Stage;
use crate::stages::precedence_rules;

/// `reference column -> record field` for the channel join.
pub const CHANNEL_OUTPUTS: [(&str, &str); 4] = [
    ("Channel", "Channel_clean"),
    ("Sub-Channel", "SubChannel_clean"),
    ("Channel Finance Group", "ChannelFinanceGroup_clean"),
    ("ExComChannel", "ExComChannel"),
];

/// Channel attribution keyed on the preferred channel column first.
pub struct ChannelStage;

impl Stage for ChannelStage {
    fn run(
        &self,
        records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        let joiner = FallbackJoiner::new(
            self.name(),
            &ctx.channels,
            precedence_rules(&ctx.rules.channel_rules.key_sets(), &[]),
            CHANNEL_OUTPUTS
                .iter()
                .map(|(column, field)| OutputMapping::new(*column, *field))
                .collect(),
        );
        let records = joiner.apply(records);
        for record in &records {
            let unresolved = CHANNEL_OUTPUTS[..3]
                .iter()
                .any(|(_, field)| record.is_blank(field));
            if unresolved {
                let current = format!("{}|{}", record.text("Channel"), record.text("Sub-Channel"));
                ledger.append(
                    ExceptionEvent::for_record(record, "Channel", IssueType::ChannelUnmapped)
                        .with_current(current),
                );
            }
        }
        records
    }

    fn name(&self) -> &str {
        "channel"
    }
}
