//! Deterministic attribution of canonical taxonomy values to raw records.
//!
//! All matching is exact (optionally after text normalization) or plain
//! substring containment; there is no fuzzy scoring.

pub mod alias;
pub mod brand;
pub mod joiner;

pub use alias::{AliasColumns, AliasIndex, AliasTier, Resolved};
pub use brand::{
    BRAND_FINAL, BRAND_TAXONOMY, BRAND_TITLE, BrandFields, BrandOutcome, BrandResolution,
    BrandResolver, MIN_TITLE_MATCH_LEN, REASON_TAX, REASON_TITLE, TaxonomyMatch, TaxonomyReason,
    TitleMatch, TitleReason,
};
pub use joiner::{FallbackJoiner, JoinStats, KeyMatch, KeyPair, OutputMapping, PrecedenceRule};
