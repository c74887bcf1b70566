//! Plan and budget cleaning stages.
//!
//! - **coercion**: typed dates and numbers
//! - **plan_status**, **dates**, **defaults**: row hygiene
//! - **region**: market/region consistency
//! - **brand**, **vendor**, **channel**, **campaign**, **cbht**: taxonomy joins
//! - **backfill**: actualisation of stale plan lines

mod backfill;
mod brand;
mod campaign;
mod cbht;
mod channel;
mod coercion;
mod dates;
mod defaults;
mod region;
mod status;
mod vendor;

pub use backfill::ActualisationBackfillStage;
pub use brand::{BrandStage, VARIANT_EXTRA};
pub use campaign::CampaignStage;
pub use cbht::CbhtStage;
pub use channel::{CHANNEL_OUTPUTS, ChannelStage};
pub use coercion::{CoercionStage, is_metric_column, is_numeric_column};
pub use dates::DatesStage;
pub use defaults::{DefaultsStage, FALLBACK_OBJECTIVE, ObjectiveStage};
pub use region::RegionCheckStage;
pub use status::PlanStatusStage;
pub use vendor::VendorStage;

use std::collections::BTreeMap;

use dcqa_map::{KeyPair, OutputMapping, PrecedenceRule};

/// Turns configured key-sets into joiner rules. `aliases` maps a reference
/// key name to the record field it reads; other keys use the same name on
/// both sides.
pub(crate) fn precedence_rules(
    key_sets: &[Vec<String>],
    aliases: &[(&str, &str)],
) -> Vec<PrecedenceRule> {
    key_sets
        .iter()
        .map(|keys| {
            PrecedenceRule::new(
                keys.iter()
                    .map(|key| {
                        let field = aliases
                            .iter()
                            .find(|(name, _)| *name == key.as_str())
                            .map_or(key.as_str(), |(_, field)| *field);
                        KeyPair::new(field, key.as_str())
                    })
                    .collect(),
            )
        })
        .collect()
}

pub(crate) fn output_mappings(outputs: &BTreeMap<String, String>) -> Vec<OutputMapping> {
    outputs
        .iter()
        .map(|(column, field)| OutputMapping::new(column.as_str(), field.as_str()))
        .collect()
}
