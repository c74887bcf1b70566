//! FX reconciliation: rate lookup, derived currency columns, and the audit
//! of externally reported EUR totals.
//!
//! A missing rate never becomes zero. Rate columns and everything derived
//! from them carry `NaN`, which the audit skips as missing.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Provenance, Record, ReferenceTable, Value};
use dcqa_taxonomy::{FxAudit, FxRules};
use dcqa_transform::normalization::{parse_number, parse_number_value, parse_year};

use crate::context::PipelineContext;
use crate::pipeline::Stage;

pub const FX_TO_EUR: &str = "fx_to_eur";
pub const FX_TO_DKK: &str = "fx_to_dkk";

/// Year column names, plans first.
const YEAR_FIELDS: [&str; 2] = ["FX_Year", "FX Year"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxRate {
    pub to_eur: f64,
    pub to_dkk: f64,
}

impl FxRate {
    /// Both multipliers present; a blank or unreadable cell loads as `NaN`.
    pub fn is_complete(self) -> bool {
        self.to_eur.is_finite() && self.to_dkk.is_finite()
    }
}

/// Rate key: trimmed market, upper-cased currency, fiscal year.
type RateKey = (String, String, i32);

#[derive(Debug, Clone, Default)]
pub struct FxTable {
    rates: HashMap<RateKey, FxRate>,
    regions: HashMap<String, String>,
}

impl FxTable {
    /// Reads `market, currency, fx_year, fx_to_eur, fx_to_dkk, region`.
    /// The first row per key wins; so does the first region per market.
    pub fn from_reference(table: &ReferenceTable) -> Self {
        let mut fx = Self::default();
        let mut skipped = 0usize;
        for row in table.rows() {
            let market = row.get("market").trim().to_string();
            if market.is_empty() {
                skipped += 1;
                continue;
            }
            fx.regions
                .entry(market.clone())
                .or_insert_with(|| row.get("region").trim().to_string());
            let Some(year) = parse_year(&Value::text(row.get("fx_year"))) else {
                skipped += 1;
                continue;
            };
            let rate = |column: &str| parse_number(row.get(column)).unwrap_or(f64::NAN);
            fx.rates
                .entry((market, row.get("currency").trim().to_uppercase(), year))
                .or_insert(FxRate {
                    to_eur: rate(FX_TO_EUR),
                    to_dkk: rate(FX_TO_DKK),
                });
        }
        if skipped > 0 {
            debug!(skipped, "fx rows without market or year");
        }
        fx
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn rate(&self, market: &str, currency: &str, year: i32) -> Option<FxRate> {
        self.rates
            .get(&(market.trim().to_string(), currency.trim().to_uppercase(), year))
            .copied()
    }

    /// First region listed for `market`; `None` for unknown markets.
    pub fn expected_region(&self, market: &str) -> Option<&str> {
        self.regions.get(market.trim()).map(String::as_str)
    }
}

fn record_year(record: &Record) -> (String, Option<i32>) {
    YEAR_FIELDS
        .iter()
        .find(|field| record.contains(field))
        .and_then(|field| record.get(field))
        .map_or((String::new(), None), |value| (value.to_string(), parse_year(value)))
}

/// Attaches `fx_to_eur` / `fx_to_dkk` to every record. Records without a
/// complete rate get `NaN` in the missing columns and an `fx_missing` event.
pub fn convert(records: Vec<Record>, fx: &FxTable, ledger: &ExceptionLedger) -> Vec<Record> {
    let mut missing = 0usize;
    let out: Vec<Record> = records
        .into_iter()
        .map(|mut record| {
            let market = record.text("Market");
            let currency = record.text("Currency");
            let (year_text, year) = record_year(&record);
            let found = year.and_then(|year| fx.rate(&market, &currency, year));
            if !found.is_some_and(FxRate::is_complete) {
                missing += 1;
                ledger.append(
                    ExceptionEvent::for_record(&record, "FX", IssueType::FxMissing).with_current(
                        format!("{}/{}/{}", market.trim(), currency.trim().to_uppercase(), year_text.trim()),
                    ),
                );
            }
            let rate = found.unwrap_or(FxRate {
                to_eur: f64::NAN,
                to_dkk: f64::NAN,
            });
            record.set_by(FX_TO_EUR, rate.to_eur, Provenance::stage("fx"));
            record.set_by(FX_TO_DKK, rate.to_dkk, Provenance::stage("fx"));
            record
        })
        .collect();
    if missing > 0 {
        warn!(missing, "records without an fx rate");
    }
    out
}

/// `output = local * rate` for each configured pair. A blank local value
/// counts as zero; a missing rate stays `NaN`.
pub fn compute_pairs(records: &mut [Record], rules: &FxRules) {
    for (target, pairs) in &rules.compute_pairs {
        let rate_field = match target.trim().to_uppercase().as_str() {
            "EUR" => FX_TO_EUR,
            "DKK" => FX_TO_DKK,
            other => {
                warn!(target = other, "unsupported fx target currency");
                continue;
            }
        };
        for record in records.iter_mut() {
            let rate = record
                .get(rate_field)
                .and_then(Value::as_number)
                .unwrap_or(f64::NAN);
            for (local, output) in pairs {
                if !record.contains(local) {
                    continue;
                }
                let value = record.get(local).and_then(parse_number_value).unwrap_or(0.0);
                record.set_by(output, value * rate, Provenance::stage("fx"));
            }
        }
    }
}

/// Flags `eur_mismatch` where a positive reported total differs from the
/// computed one by more than the tolerance ratio.
pub fn audit(records: &[Record], config: &FxAudit, ledger: &ExceptionLedger) -> usize {
    let mut flagged = 0usize;
    for record in records {
        for (reported_col, computed_col) in &config.checks {
            let Some(reported) = record.get(reported_col).and_then(parse_number_value) else {
                continue;
            };
            let Some(computed) = record.get(computed_col).and_then(parse_number_value) else {
                continue;
            };
            if reported <= 0.0 {
                continue;
            }
            let ratio = (reported - computed).abs() / reported;
            if ratio > config.tolerance_ratio {
                flagged += 1;
                ledger.append(
                    ExceptionEvent::for_record(record, reported_col.as_str(), IssueType::EurMismatch)
                        .with_current(Value::Number(reported).to_string())
                        .with_suggested(Value::Number(computed).to_string())
                        .with_notes(format!("{computed_col} differs by {:.2}%", ratio * 100.0)),
                );
            }
        }
    }
    flagged
}

/// Rates, derived columns, then the audit.
pub struct FxStage;

impl Stage for FxStage {
    fn run(
        &self,
        records: Vec<Record>,
        ctx: &PipelineContext,
        ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        let mut records = convert(records, &ctx.fx, ledger);
        compute_pairs(&mut records, &ctx.rules.fx_rules);
        let audit_config = &ctx.rules.fx_rules.audit_global_vs_eur;
        if audit_config.enabled {
            let flagged = audit(&records, audit_config, ledger);
            info!(rows = records.len(), flagged, "fx audit complete");
        }
        records
    }

    fn name(&self) -> &str {
        "fx"
    }
}
