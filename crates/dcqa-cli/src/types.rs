use std::collections::BTreeMap;
use std::path::PathBuf;

use dcqa_model::Priority;

/// What `clean` and `fix-packs` report back to the terminal.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub plans: usize,
    pub budgets: usize,
    pub batches: usize,
    pub by_issue: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<Priority, usize>,
    pub written: Vec<PathBuf>,
}

impl RunSummary {
    pub fn exceptions(&self) -> usize {
        self.by_issue.values().sum()
    }
}
