//! Alias index: `(scope, normalized alias) -> canonical value`.
//!
//! Entries live in three tiers, consulted in order:
//!
//! 1. `Market`: aliases registered by rows that name a market.
//! 2. `Global`: aliases registered by rows without a market.
//! 3. `Derived`: the global fallback copy of market-scoped rows, so a market
//!    alias still resolves elsewhere when no explicit global row claims it.
//!
//! Within a tier the first row to register a key wins, which makes the
//! reference table's row order part of the result.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use dcqa_model::ReferenceTable;
use dcqa_transform::normalize_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AliasTier {
    Market,
    Global,
    Derived,
}

/// Reference columns feeding the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasColumns {
    pub canonical: String,
    pub market: String,
    pub alias: String,
}

impl AliasColumns {
    /// Picks the first known column name present in `table` for each role.
    pub fn detect(table: &ReferenceTable) -> Self {
        let pick = |candidates: &[&str]| -> String {
            let found = candidates.iter().copied().find(|name| table.has_column(name));
            found.unwrap_or(candidates[0]).to_string()
        };
        Self {
            canonical: pick(&["brand_canonical", "brand_clean", "canonical", "brand"]),
            market: pick(&["market"]),
            alias: pick(&["alias", "raw_brand"]),
        }
    }
}

impl Default for AliasColumns {
    fn default() -> Self {
        Self {
            canonical: "brand_canonical".to_string(),
            market: "market".to_string(),
            alias: "alias".to_string(),
        }
    }
}

/// Successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub canonical: &'a str,
    pub tier: AliasTier,
}

#[derive(Debug, Clone)]
struct AliasEntry {
    tier: AliasTier,
    market: String,
    alias: String,
    canonical: String,
}

#[derive(Debug, Clone, Default)]
pub struct AliasIndex {
    entries: Vec<AliasEntry>,
    lookup: HashMap<(AliasTier, String, String), usize>,
    /// Canonical values in sorted order with their normalized form.
    canonicals: Vec<(String, String)>,
}

impl AliasIndex {
    /// Builds an index from `(canonical, market, alias)` triples in order.
    ///
    /// Rows with a blank canonical are skipped; a blank alias falls back to
    /// the canonical value.
    pub fn build<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    {
        let mut index = Self::default();
        let mut canonicals = BTreeMap::new();
        for (canonical, market, alias) in rows {
            let canonical = canonical.trim();
            if canonical.is_empty() {
                continue;
            }
            let alias = if alias.trim().is_empty() {
                canonical
            } else {
                alias
            };
            let market = normalize_text(market);
            let alias_key = normalize_text(alias);
            let canonical_key = normalize_text(canonical);
            canonicals
                .entry(canonical.to_string())
                .or_insert_with(|| canonical_key.clone());

            for key in [&alias_key, &canonical_key] {
                if market.is_empty() {
                    index.register(AliasTier::Global, "", key, canonical);
                } else {
                    index.register(AliasTier::Market, &market, key, canonical);
                    index.register(AliasTier::Derived, "", key, canonical);
                }
            }
        }
        index.canonicals = canonicals.into_iter().collect();
        debug!(
            entries = index.entries.len(),
            canonicals = index.canonicals.len(),
            "built alias index"
        );
        index
    }

    pub fn from_table(table: &ReferenceTable, columns: &AliasColumns) -> Self {
        Self::build(table.rows().map(|row| {
            (
                row.get(&columns.canonical),
                row.get(&columns.market),
                row.get(&columns.alias),
            )
        }))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scoped lookup first, then explicit global, then derived global.
    /// Both arguments are expected in normalized form.
    pub fn resolve(&self, market: &str, alias: &str) -> Option<Resolved<'_>> {
        if alias.is_empty() {
            return None;
        }
        let scoped = (!market.is_empty())
            .then(|| self.find(AliasTier::Market, market, alias))
            .flatten();
        scoped
            .or_else(|| self.find(AliasTier::Global, "", alias))
            .or_else(|| self.find(AliasTier::Derived, "", alias))
            .map(|entry| Resolved {
                canonical: entry.canonical.as_str(),
                tier: entry.tier,
            })
    }

    /// Canonical values and their normalized forms, sorted by value.
    pub fn canonicals(&self) -> impl Iterator<Item = (&str, &str)> {
        self.canonicals
            .iter()
            .map(|(canonical, key)| (canonical.as_str(), key.as_str()))
    }

    /// First canonical (in sorted order) whose normalized form equals `key`.
    pub fn canonical_equal(&self, key: &str) -> Option<&str> {
        self.canonicals()
            .find(|(_, normalized)| *normalized == key)
            .map(|(canonical, _)| canonical)
    }

    /// Aliases registered for `market`, in registration order.
    pub fn market_aliases<'a>(&'a self, market: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.tier == AliasTier::Market && entry.market == market)
            .map(|entry| entry.alias.as_str())
    }

    /// Distinct global alias texts: explicit global rows first, then derived.
    pub fn global_aliases(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut aliases = Vec::new();
        for tier in [AliasTier::Global, AliasTier::Derived] {
            for entry in self.entries.iter().filter(|entry| entry.tier == tier) {
                if seen.insert(entry.alias.as_str()) {
                    aliases.push(entry.alias.as_str());
                }
            }
        }
        aliases
    }

    fn find(&self, tier: AliasTier, market: &str, alias: &str) -> Option<&AliasEntry> {
        self.lookup
            .get(&(tier, market.to_string(), alias.to_string()))
            .map(|idx| &self.entries[*idx])
    }

    fn register(&mut self, tier: AliasTier, market: &str, alias: &str, canonical: &str) {
        if alias.is_empty() {
            return;
        }
        let key = (tier, market.to_string(), alias.to_string());
        if self.lookup.contains_key(&key) {
            return;
        }
        self.lookup.insert(key, self.entries.len());
        self.entries.push(AliasEntry {
            tier,
            market: market.to_string(),
            alias: alias.to_string(),
            canonical: canonical.to_string(),
        });
    }
}
