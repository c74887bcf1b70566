//! Cleaning pipelines for media plans and budgets.
//!
//! Records flow through ordered [`pipeline::Stage`]s sharing one read-only
//! [`PipelineContext`]; every correction or gap lands in the run's
//! [`dcqa_model::ExceptionLedger`].

pub mod context;
pub mod dedupe;
pub mod fx;
pub mod pipeline;
pub mod process;
pub mod stages;

pub use context::PipelineContext;
pub use dedupe::{MAPPING_DIFF_COLUMNS, MappingDiff, dedupe_records, mapping_diff, union_columns};
pub use fx::{FX_TO_DKK, FX_TO_EUR, FxRate, FxStage, FxTable, audit, compute_pairs, convert};
pub use pipeline::{Pipeline, Stage, build_budgets_pipeline, build_plans_pipeline};
pub use process::{
    BrandCheckRun, BudgetsOutput, CleanRun, PlansOutput, ProjectPaths, RULES_FILE, load_batches,
    load_context, load_rules, process_budgets, process_plans, project, run_brand_check, run_clean,
};
