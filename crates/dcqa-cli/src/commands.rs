use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use comfy_table::Table;
use tracing::{info, info_span, warn};

use dcqa_core::{CleanRun, ProjectPaths, project, run_brand_check, run_clean};
use dcqa_cli::outputs::{prorate_file, write_brand_check_outputs, write_clean_outputs};
use dcqa_report::{build_fix_packs, write_fix_packs};
use dcqa_taxonomy::{RulesConfig, apply_fixes};
use dcqa_transform::ProrationLayout;

use crate::cli::{CleanArgs, LayoutArg, PathOverrides, ProjectArgs, ProrateArgs};
use crate::summary::{apply_table_style, header_cell};
use crate::types::RunSummary;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn project_paths(base: &Path, overrides: &PathOverrides) -> Result<ProjectPaths> {
    Ok(project(base)?
        .with_input(overrides.input_dir.clone())
        .with_taxonomy(overrides.taxonomy_dir.clone())
        .with_rules(overrides.rules.clone())
        .with_output(overrides.output_dir.clone()))
}

fn summarize(run: &CleanRun) -> RunSummary {
    RunSummary {
        plans: run.plans.records.len(),
        budgets: run.budgets.records.len(),
        batches: run.plans.batches + run.budgets.batches,
        by_issue: run.ledger.counts_by_issue(),
        by_priority: run.ledger.counts_by_priority(),
        written: Vec::new(),
    }
}

// ============================================================================
// clean
// ============================================================================

pub fn run_clean_command(args: &CleanArgs) -> Result<RunSummary> {
    let paths = project_paths(&args.base, &args.paths)?;
    let as_of = args.as_of.unwrap_or_else(today);
    let span = info_span!("clean", base = %args.base.display(), %as_of);
    let _guard = span.enter();

    let start = Instant::now();
    let run = run_clean(&paths, as_of)?;
    let mut summary = summarize(&run);
    if args.dry_run {
        info!("dry run, skipping output files");
    } else {
        summary.written = write_clean_outputs(&paths.output_dir(), &run, as_of)?;
    }
    info!(duration_ms = start.elapsed().as_millis(), "clean finished");
    Ok(summary)
}

// ============================================================================
// brand-check
// ============================================================================

pub fn run_brand_check_command(args: &ProjectArgs) -> Result<()> {
    let paths = project_paths(&args.base, &args.paths)?;
    let run = run_brand_check(&paths)?;
    let written = write_brand_check_outputs(&paths.output_dir(), &run, today())?;

    println!("Source: {}", run.source.display());
    println!("Rows: {}", run.records.len());
    println!("Brand issues: {}", run.ledger.len());
    for path in written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

// ============================================================================
// prorate
// ============================================================================

fn layout_for(args: &ProrateArgs) -> Result<ProrationLayout> {
    let rules = match &args.rules {
        Some(path) => RulesConfig::load(path)
            .with_context(|| format!("load rules {}", path.display()))?
            .proration,
        None => RulesConfig::default().proration,
    };
    Ok(match args.layout {
        LayoutArg::Budgets => rules.budgets,
        LayoutArg::Plans => rules.plans,
    })
}

pub fn run_prorate_command(args: &ProrateArgs) -> Result<()> {
    let layout = layout_for(args)?;
    let span = info_span!("prorate", input = %args.input.display());
    let _guard = span.enter();

    let result = prorate_file(&args.input, &layout, &args.output)?;
    if !result.ledger.is_empty() {
        warn!(
            exceptions = result.ledger.len(),
            "some rows could not be prorated"
        );
    }
    println!(
        "Expanded {} rows into {} daily rows: {}",
        result.input_rows,
        result.daily_rows,
        args.output.display()
    );
    if let Some(path) = result.review {
        println!("Manual review: {}", path.display());
    }
    Ok(())
}

// ============================================================================
// fix packs
// ============================================================================

pub fn run_fix_packs_command(args: &CleanArgs) -> Result<RunSummary> {
    let paths = project_paths(&args.base, &args.paths)?;
    let as_of = args.as_of.unwrap_or_else(today);
    let run = run_clean(&paths, as_of)?;
    let packs = build_fix_packs(&run.ledger.snapshot());
    let mut summary = summarize(&run);
    for pack in &packs {
        info!(file = pack.file_name, rows = pack.rows.len(), "fix pack");
    }
    if !args.dry_run {
        summary.written = write_fix_packs(&paths.fixes_dir(), &packs).context("write fix packs")?;
    }
    Ok(summary)
}

// ============================================================================
// apply-fixes
// ============================================================================

pub fn run_apply_fixes_command(args: &ProjectArgs) -> Result<()> {
    let paths = project_paths(&args.base, &args.paths)?;
    let fixes_dir = paths.fixes_dir();
    let applied = apply_fixes(&fixes_dir, &paths.taxonomy_dir())
        .with_context(|| format!("apply fixes from {}", fixes_dir.display()))?;
    if applied.is_empty() {
        println!("No fix packs found in {}", fixes_dir.display());
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Taxonomy"),
        header_cell("Added"),
        header_cell("Total"),
    ]);
    apply_table_style(&mut table);
    for fix in applied {
        table.add_row(vec![
            fix.taxonomy.to_string(),
            fix.added.to_string(),
            fix.total.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
