//! Shared, read-only inputs of a cleaning run.

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, warn};

use dcqa_map::{AliasColumns, AliasIndex};
use dcqa_model::ReferenceTable;
use dcqa_taxonomy::{RulesConfig, Taxonomy};

use crate::fx::FxTable;

/// Everything stages read besides the records themselves.
///
/// Built once per run; batches may be processed against it in any order.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub taxonomy: Taxonomy,
    pub rules: RulesConfig,
    /// Present when the brands table is non-empty.
    pub aliases: Option<AliasIndex>,
    pub fx: FxTable,
    /// Channels table with `ChannelFinanceGroup` renamed for joining.
    pub channels: ReferenceTable,
    /// Compiled `brand -> pattern` plan-name hints, in configured order.
    pub brand_hints: Vec<(String, Regex)>,
    /// Reference date for age-based rules.
    pub as_of: NaiveDate,
}

impl PipelineContext {
    pub fn new(taxonomy: Taxonomy, rules: RulesConfig, as_of: NaiveDate) -> Self {
        let aliases = (!taxonomy.brands.is_empty()).then(|| {
            AliasIndex::from_table(&taxonomy.brands, &AliasColumns::detect(&taxonomy.brands))
        });
        let fx = FxTable::from_reference(&taxonomy.fx_rates);
        let mut channels = taxonomy.channels.clone();
        channels.rename_column("ChannelFinanceGroup", "Channel Finance Group");
        let brand_hints = compile_hints(&rules);
        debug!(
            aliases = aliases.as_ref().map_or(0, AliasIndex::len),
            fx_rates = fx.len(),
            hints = brand_hints.len(),
            %as_of,
            "pipeline context ready"
        );
        Self {
            taxonomy,
            rules,
            aliases,
            fx,
            channels,
            brand_hints,
            as_of,
        }
    }
}

fn compile_hints(rules: &RulesConfig) -> Vec<(String, Regex)> {
    rules
        .brand_mapping
        .conflict_hints
        .brand_regex
        .iter()
        .filter_map(|(brand, pattern)| match Regex::new(pattern) {
            Ok(regex) => Some((brand.clone(), regex)),
            Err(error) => {
                warn!(%brand, %pattern, %error, "skipping invalid brand hint");
                None
            }
        })
        .collect()
}
