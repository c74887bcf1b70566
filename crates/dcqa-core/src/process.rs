//! Batch processing for a project folder.
//!
//! A project folder holds:
//! - `input/raw/plans_*.csv` and `input/raw/budgets_*.csv`: raw batches
//! - `taxonomy/*.csv`: reference tables
//! - `rules/validation_rules.toml`: cleaning rules (optional)
//!
//! Each batch runs through its pipeline with a ledger of its own, which is
//! merged into the run ledger once the batch completes.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, info_span, warn};

use dcqa_ingest::{Batch, BatchKind, discover_batches, latest_batch, load_batch};
use dcqa_map::{AliasColumns, AliasIndex, BrandResolver};
use dcqa_model::{ExceptionLedger, Record};
use dcqa_taxonomy::{RulesConfig, Taxonomy, TaxonomyFile};

use crate::context::PipelineContext;
use crate::dedupe::{MappingDiff, dedupe_records, mapping_diff, union_columns};
use crate::pipeline::{build_budgets_pipeline, build_plans_pipeline};

pub const RULES_FILE: &str = "validation_rules.toml";

/// Standard locations under a project folder, each of which can be overridden.
#[derive(Debug, Clone, Default)]
pub struct ProjectPaths {
    pub base: PathBuf,
    pub input: Option<PathBuf>,
    pub taxonomy: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl ProjectPaths {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_input(mut self, dir: Option<PathBuf>) -> Self {
        self.input = dir;
        self
    }

    #[must_use]
    pub fn with_taxonomy(mut self, dir: Option<PathBuf>) -> Self {
        self.taxonomy = dir;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, file: Option<PathBuf>) -> Self {
        self.rules = file;
        self
    }

    #[must_use]
    pub fn with_output(mut self, dir: Option<PathBuf>) -> Self {
        self.output = dir;
        self
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.input
            .clone()
            .unwrap_or_else(|| self.base.join("input").join("raw"))
    }

    pub fn taxonomy_dir(&self) -> PathBuf {
        self.taxonomy
            .clone()
            .unwrap_or_else(|| self.base.join("taxonomy"))
    }

    pub fn rules_file(&self) -> PathBuf {
        self.rules
            .clone()
            .unwrap_or_else(|| self.base.join("rules").join(RULES_FILE))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.base.join("output"))
    }

    pub fn fixes_dir(&self) -> PathBuf {
        self.base.join("fixes")
    }
}

// ============================================================================
// Setup
// ============================================================================

/// Rules from the project, or defaults when the file is absent.
pub fn load_rules(paths: &ProjectPaths) -> Result<RulesConfig> {
    let path = paths.rules_file();
    if !path.is_file() {
        warn!(path = %path.display(), "rules file not found, using defaults");
        return Ok(RulesConfig::default());
    }
    RulesConfig::load(&path).context("load cleaning rules")
}

pub fn load_context(paths: &ProjectPaths, as_of: NaiveDate) -> Result<PipelineContext> {
    let taxonomy = Taxonomy::load(&paths.taxonomy_dir()).context("load taxonomy")?;
    let rules = load_rules(paths)?;
    Ok(PipelineContext::new(taxonomy, rules, as_of))
}

pub fn load_batches(paths: &ProjectPaths, kind: BatchKind) -> Result<Vec<Batch>> {
    let files = discover_batches(&paths.raw_dir(), kind)
        .with_context(|| format!("discover {} batches", kind.prefix()))?;
    if files.is_empty() {
        warn!(dir = %paths.raw_dir().display(), prefix = kind.prefix(), "no batches found");
    }
    files
        .iter()
        .map(|path| load_batch(path, kind).with_context(|| format!("read {}", path.display())))
        .collect()
}

// ============================================================================
// Plans and budgets
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct PlansOutput {
    pub records: Vec<Record>,
    pub columns: Vec<String>,
    pub mapping_diff: MappingDiff,
    pub batches: usize,
}

#[derive(Debug, Clone, Default)]
pub struct BudgetsOutput {
    pub records: Vec<Record>,
    pub columns: Vec<String>,
    pub batches: usize,
}

pub fn process_plans(
    batches: Vec<Batch>,
    ctx: &PipelineContext,
    ledger: &ExceptionLedger,
) -> PlansOutput {
    let pipeline = build_plans_pipeline();
    let count = batches.len();
    let mut records = Vec::new();
    for batch in batches {
        let file = batch.file_name();
        let span = info_span!("batch", %file, kind = "plans");
        let _guard = span.enter();
        let batch_ledger = ExceptionLedger::new();
        let rows_in = batch.records.len();
        let cleaned = pipeline.execute(batch.records, ctx, &batch_ledger);
        info!(
            rows_in,
            rows_out = cleaned.len(),
            exceptions = batch_ledger.len(),
            "plans batch cleaned"
        );
        ledger.absorb(batch_ledger);
        records.extend(cleaned);
    }
    let records = dedupe_records(records);
    PlansOutput {
        columns: union_columns(&records),
        mapping_diff: mapping_diff(&records),
        records,
        batches: count,
    }
}

pub fn process_budgets(
    batches: Vec<Batch>,
    ctx: &PipelineContext,
    ledger: &ExceptionLedger,
) -> BudgetsOutput {
    let count = batches.len();
    let mut records = Vec::new();
    for batch in batches {
        let file = batch.file_name();
        let span = info_span!("batch", %file, kind = "budgets");
        let _guard = span.enter();
        let pipeline = build_budgets_pipeline(batch.has_column("Currency"));
        let batch_ledger = ExceptionLedger::new();
        let cleaned = pipeline.execute(batch.records, ctx, &batch_ledger);
        info!(rows = cleaned.len(), exceptions = batch_ledger.len(), "budgets batch cleaned");
        ledger.absorb(batch_ledger);
        records.extend(cleaned);
    }
    let records = dedupe_records(records);
    BudgetsOutput {
        columns: union_columns(&records),
        records,
        batches: count,
    }
}

/// Everything a `clean` run produces.
#[derive(Debug)]
pub struct CleanRun {
    pub plans: PlansOutput,
    pub budgets: BudgetsOutput,
    pub ledger: ExceptionLedger,
}

pub fn run_clean(paths: &ProjectPaths, as_of: NaiveDate) -> Result<CleanRun> {
    let start = Instant::now();
    let ctx = load_context(paths, as_of)?;
    let ledger = ExceptionLedger::new();

    let plans = process_plans(load_batches(paths, BatchKind::Plans)?, &ctx, &ledger);
    let budgets = process_budgets(load_batches(paths, BatchKind::Budgets)?, &ctx, &ledger);

    info!(
        plans = plans.records.len(),
        budgets = budgets.records.len(),
        exceptions = ledger.len(),
        duration_ms = start.elapsed().as_millis(),
        "clean run complete"
    );
    Ok(CleanRun {
        plans,
        budgets,
        ledger,
    })
}

// ============================================================================
// Brand check
// ============================================================================

#[derive(Debug)]
pub struct BrandCheckRun {
    pub source: PathBuf,
    pub records: Vec<Record>,
    pub columns: Vec<String>,
    pub ledger: ExceptionLedger,
}

/// Two-pass brand resolution alone over the newest plans batch.
pub fn run_brand_check(paths: &ProjectPaths) -> Result<BrandCheckRun> {
    let source = latest_batch(&paths.raw_dir(), BatchKind::Plans)
        .context("find latest plans batch")?
        .with_context(|| format!("no plans batch in {}", paths.raw_dir().display()))?;
    let batch = load_batch(&source, BatchKind::Plans)
        .with_context(|| format!("read {}", source.display()))?;
    let taxonomy = Taxonomy::load_only(&paths.taxonomy_dir(), &[TaxonomyFile::Brands])
        .context("load brand taxonomy")?;
    let index = AliasIndex::from_table(&taxonomy.brands, &AliasColumns::detect(&taxonomy.brands));

    let ledger = ExceptionLedger::new();
    let span = info_span!("batch", file = %batch.file_name(), kind = "brand_check");
    let _guard = span.enter();
    let records = BrandResolver::new(&index).apply(batch.records, &ledger);
    Ok(BrandCheckRun {
        source,
        columns: union_columns(&records),
        records,
        ledger,
    })
}

/// Resolves `base` to a project folder, failing early when it does not exist.
pub fn project(base: &Path) -> Result<ProjectPaths> {
    anyhow::ensure!(base.is_dir(), "project folder not found: {}", base.display());
    Ok(ProjectPaths::new(base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_their_own_location() {
        let paths = ProjectPaths::new("/work/q1")
            .with_rules(Some(PathBuf::from("/shared/rules.toml")))
            .with_output(None);
        assert_eq!(paths.rules_file(), PathBuf::from("/shared/rules.toml"));
        assert_eq!(paths.raw_dir(), PathBuf::from("/work/q1/input/raw"));
        assert_eq!(paths.output_dir(), PathBuf::from("/work/q1/output"));
        assert_eq!(paths.fixes_dir(), PathBuf::from("/work/q1/fixes"));
    }
}
