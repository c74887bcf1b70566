//! Two-pass brand resolution.
//!
//! Pass A maps the raw brand through the [`AliasIndex`] with market context.
//! Pass B looks for canonical names and aliases inside the plan and campaign
//! titles. The two signals are then reconciled into a final brand and at most
//! one exception event per record.

use std::fmt;

use tracing::{debug, info};

use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Provenance, Record};
use dcqa_transform::normalize_text;

use crate::alias::{AliasIndex, AliasTier};

/// Shortest normalized name that may count as a title hit.
pub const MIN_TITLE_MATCH_LEN: usize = 4;

const STAGE: &str = "brand_two_pass";

pub const BRAND_TAXONOMY: &str = "Brand_taxonomy";
pub const BRAND_TITLE: &str = "Brand_title";
pub const BRAND_FINAL: &str = "Brand_final";
pub const REASON_TAX: &str = "Reason_tax";
pub const REASON_TITLE: &str = "Reason_title";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyReason {
    ExactLocal,
    ExactGlobal,
    CanonicalEqual,
}

impl TaxonomyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactLocal => "tax_exact_local",
            Self::ExactGlobal => "tax_exact_global",
            Self::CanonicalEqual => "tax_canonical_equal",
        }
    }
}

impl fmt::Display for TaxonomyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleReason {
    Contains,
    /// Several canonical brands appear in the titles.
    Ambiguous,
}

impl TitleReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "title_contains",
            Self::Ambiguous => "title_ambiguous",
        }
    }
}

impl fmt::Display for TitleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyMatch {
    pub canonical: String,
    pub reason: TaxonomyReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMatch {
    pub canonical: String,
    pub reason: TitleReason,
    /// Distinct canonical brands hit, in discovery order.
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrandOutcome {
    /// Both passes agree.
    Agreed,
    Conflict,
    TaxonomyOnly,
    InferredFromTitle,
    Unmapped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandResolution {
    pub taxonomy: Option<TaxonomyMatch>,
    pub title: Option<TitleMatch>,
}

impl BrandResolution {
    pub fn outcome(&self) -> BrandOutcome {
        match (&self.taxonomy, &self.title) {
            (Some(tax), Some(title)) if tax.canonical == title.canonical => BrandOutcome::Agreed,
            (Some(_), Some(_)) => BrandOutcome::Conflict,
            (Some(_), None) => BrandOutcome::TaxonomyOnly,
            (None, Some(_)) => BrandOutcome::InferredFromTitle,
            (None, None) => BrandOutcome::Unmapped,
        }
    }

    /// Taxonomy value first, then the title value. Blank when unresolved.
    pub fn final_brand(&self) -> &str {
        self.taxonomy
            .as_ref()
            .map(|tax| tax.canonical.as_str())
            .or_else(|| self.title.as_ref().map(|title| title.canonical.as_str()))
            .unwrap_or("")
    }

    pub fn taxonomy_brand(&self) -> &str {
        self.taxonomy.as_ref().map_or("", |tax| tax.canonical.as_str())
    }

    pub fn title_brand(&self) -> &str {
        self.title.as_ref().map_or("", |title| title.canonical.as_str())
    }

    pub fn issue(&self) -> Option<IssueType> {
        match self.outcome() {
            BrandOutcome::Agreed => None,
            BrandOutcome::Conflict => Some(IssueType::BrandConflict),
            BrandOutcome::TaxonomyOnly => Some(IssueType::BrandOkNoTitleSignal),
            BrandOutcome::InferredFromTitle => Some(IssueType::BrandInferredFromTitle),
            BrandOutcome::Unmapped => Some(IssueType::BrandUnmapped),
        }
    }

    /// Reviewer guidance for the outcome.
    pub fn recommendation(&self) -> String {
        let mut note = match self.outcome() {
            BrandOutcome::Agreed | BrandOutcome::TaxonomyOnly => String::new(),
            BrandOutcome::Conflict => format!(
                "Check Market and Brand: taxonomy maps to '{}' but titles suggest '{}'.",
                self.taxonomy_brand(),
                self.title_brand()
            ),
            BrandOutcome::InferredFromTitle => format!(
                "Titles suggest '{}'. Add an alias to the taxonomy if correct.",
                self.title_brand()
            ),
            BrandOutcome::Unmapped => "Add an alias to the taxonomy or fix the Brand field.".to_string(),
        };
        if let Some(title) = &self.title
            && title.reason == TitleReason::Ambiguous
        {
            if !note.is_empty() {
                note.push(' ');
            }
            note.push_str(&format!("Titles match several brands: {}.", title.candidates.join(", ")));
        }
        note
    }
}

/// Record fields read and written by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandFields {
    pub brand: String,
    pub market: String,
    pub plan_name: String,
    pub campaign_name: String,
    /// Filled from the final brand when still blank.
    pub clean: Option<String>,
}

impl Default for BrandFields {
    fn default() -> Self {
        Self {
            brand: "Brand".to_string(),
            market: "Market".to_string(),
            plan_name: "Plan Name".to_string(),
            campaign_name: "Campaign Name".to_string(),
            clean: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrandResolver<'a> {
    index: &'a AliasIndex,
    fields: BrandFields,
}

impl<'a> BrandResolver<'a> {
    pub fn new(index: &'a AliasIndex) -> Self {
        Self {
            index,
            fields: BrandFields::default(),
        }
    }

    #[must_use]
    pub fn with_clean_field(mut self, field: impl Into<String>) -> Self {
        self.fields.clean = Some(field.into());
        self
    }

    /// Pass A: market-scoped alias, then global alias, then canonical equality.
    pub fn pass_a(&self, raw_brand: &str, market: &str) -> Option<TaxonomyMatch> {
        let brand = normalize_text(raw_brand);
        if brand.is_empty() {
            return None;
        }
        let market = normalize_text(market);
        if let Some(hit) = self.index.resolve(&market, &brand) {
            let reason = match hit.tier {
                AliasTier::Market => TaxonomyReason::ExactLocal,
                AliasTier::Global | AliasTier::Derived => TaxonomyReason::ExactGlobal,
            };
            return Some(TaxonomyMatch {
                canonical: hit.canonical.to_string(),
                reason,
            });
        }
        self.index
            .canonical_equal(&brand)
            .map(|canonical| TaxonomyMatch {
                canonical: canonical.to_string(),
                reason: TaxonomyReason::CanonicalEqual,
            })
    }

    /// Pass B: substring containment over the normalized titles.
    pub fn pass_b(&self, plan_name: &str, campaign_name: &str, market: &str) -> Option<TitleMatch> {
        let text = normalize_text(&format!("{plan_name} {campaign_name}"));
        if text.is_empty() {
            return None;
        }
        let market = normalize_text(market);
        let mut candidates: Vec<String> = Vec::new();
        let mut push = |canonical: &str| {
            if !candidates.iter().any(|seen| seen == canonical) {
                candidates.push(canonical.to_string());
            }
        };

        for (canonical, key) in self.index.canonicals() {
            if key.chars().count() >= MIN_TITLE_MATCH_LEN && text.contains(key) {
                push(canonical);
            }
        }
        let local = if market.is_empty() {
            Vec::new()
        } else {
            self.index.market_aliases(&market).collect()
        };
        for alias in local.into_iter().chain(self.index.global_aliases()) {
            if alias.chars().count() < MIN_TITLE_MATCH_LEN || !text.contains(alias) {
                continue;
            }
            if let Some(hit) = self.index.resolve(&market, alias) {
                push(hit.canonical);
            }
        }

        match candidates.len() {
            0 => None,
            1 => Some(TitleMatch {
                canonical: candidates[0].clone(),
                reason: TitleReason::Contains,
                candidates,
            }),
            _ => {
                // Longest name wins; ties keep discovery order.
                let mut best = &candidates[0];
                for candidate in &candidates[1..] {
                    if candidate.chars().count() > best.chars().count() {
                        best = candidate;
                    }
                }
                Some(TitleMatch {
                    canonical: best.clone(),
                    reason: TitleReason::Ambiguous,
                    candidates: candidates.clone(),
                })
            }
        }
    }

    pub fn resolve(&self, record: &Record) -> BrandResolution {
        let market = record.text(&self.fields.market);
        BrandResolution {
            taxonomy: self.pass_a(&record.text(&self.fields.brand), &market),
            title: self.pass_b(
                &record.text(&self.fields.plan_name),
                &record.text(&self.fields.campaign_name),
                &market,
            ),
        }
    }

    /// Writes the resolution columns onto `record` and returns the resolution.
    pub fn annotate(&self, record: &mut Record) -> BrandResolution {
        let resolution = self.resolve(record);
        let provenance = Provenance::stage(STAGE);
        let tax_reason = resolution.taxonomy.as_ref().map_or("", |tax| tax.reason.as_str());
        let title_reason = resolution.title.as_ref().map_or("", |title| title.reason.as_str());
        record.set_by(BRAND_TAXONOMY, resolution.taxonomy_brand(), provenance.clone());
        record.set_by(BRAND_TITLE, resolution.title_brand(), provenance.clone());
        record.set_by(BRAND_FINAL, resolution.final_brand(), provenance.clone());
        record.set_by(REASON_TAX, tax_reason, provenance.clone());
        record.set_by(REASON_TITLE, title_reason, provenance.clone());
        if let Some(clean) = &self.fields.clean {
            record.ensure(clean);
            record.fill_if_blank(clean, resolution.final_brand(), provenance);
        }
        resolution
    }

    /// Event describing `resolution` for `record`, if the outcome warrants one.
    pub fn event(&self, record: &Record, resolution: &BrandResolution) -> Option<ExceptionEvent> {
        let issue = resolution.issue()?;
        let raw_brand = record.text(&self.fields.brand);
        let (current, suggested) = match resolution.outcome() {
            BrandOutcome::Conflict => (
                resolution.taxonomy_brand().to_string(),
                resolution.title_brand().to_string(),
            ),
            BrandOutcome::InferredFromTitle => (raw_brand, resolution.title_brand().to_string()),
            BrandOutcome::TaxonomyOnly => (raw_brand, resolution.taxonomy_brand().to_string()),
            BrandOutcome::Agreed | BrandOutcome::Unmapped => (raw_brand, String::new()),
        };
        Some(
            ExceptionEvent::for_record(record, "Brand", issue)
                .with_current(current)
                .with_suggested(suggested)
                .with_notes(resolution.recommendation()),
        )
    }

    pub fn apply(&self, records: Vec<Record>, ledger: &ExceptionLedger) -> Vec<Record> {
        let mut counts = [0usize; 5];
        let out: Vec<Record> = records
            .into_iter()
            .map(|mut record| {
                let resolution = self.annotate(&mut record);
                counts[resolution.outcome() as usize] += 1;
                if let Some(event) = self.event(&record, &resolution) {
                    ledger.append(event);
                }
                record
            })
            .collect();
        debug!(
            agreed = counts[BrandOutcome::Agreed as usize],
            taxonomy_only = counts[BrandOutcome::TaxonomyOnly as usize],
            "brand two-pass detail"
        );
        info!(
            rows = out.len(),
            conflicts = counts[BrandOutcome::Conflict as usize],
            inferred = counts[BrandOutcome::InferredFromTitle as usize],
            unmapped = counts[BrandOutcome::Unmapped as usize],
            "brand two-pass resolved"
        );
        out
    }
}
