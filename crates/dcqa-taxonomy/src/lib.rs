//! Reference taxonomy and rules for the cleaning pipeline.
//!
//! - **csv_io**: encoding-tolerant CSV reading and BOM-prefixed writing
//! - **taxonomy**: the six reference tables and their required-ness
//! - **rules**: the TOML rules configuration
//! - **fixes**: folding reviewed fix packs back into the taxonomy

pub mod csv_io;
pub mod error;
pub mod fixes;
pub mod rules;
pub mod taxonomy;

pub use crate::csv_io::{decode_text, parse_table, read_table, write_table};
pub use crate::error::{Result, TaxonomyError};
pub use crate::fixes::{AppliedFix, FIX_TARGETS, FixTarget, append_unique, apply_fixes};
pub use crate::rules::{
    ActualisationBackfill, BackfillScope, BrandMapping, CbhtRules, ChannelRules, ConflictHints,
    DatePlaceholders, Defaults, FxAudit, FxRules, MappingRules, ProrationRules, RegionCheck,
    RulesConfig, TemporaryFills, TwoPass, VendorRules,
};
pub use crate::taxonomy::{Taxonomy, TaxonomyFile};
