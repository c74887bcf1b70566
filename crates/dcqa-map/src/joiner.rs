//! Precedence fallback joins.
//!
//! A joiner fills blank output fields from a reference table by trying an
//! ordered list of key-sets. For each output field the first rule whose
//! matched reference row has a non-blank value wins; later rules never
//! overwrite it. Within one rule the first matching reference row (table
//! order) is the match.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use dcqa_model::{Provenance, Record, ReferenceTable};
use dcqa_transform::normalize_text;

/// `record[field] == reference[column]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub field: String,
    pub column: String,
}

impl KeyPair {
    pub fn new(field: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            column: column.into(),
        }
    }

    /// Same name on both sides.
    pub fn same(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            field: name.clone(),
            column: name,
        }
    }
}

/// One key-set tried as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecedenceRule {
    pub keys: Vec<KeyPair>,
}

impl PrecedenceRule {
    pub fn new(keys: Vec<KeyPair>) -> Self {
        Self { keys }
    }
}

/// Reference column copied into a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMapping {
    pub column: String,
    pub field: String,
}

impl OutputMapping {
    pub fn new(column: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            field: field.into(),
        }
    }
}

/// How key values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMatch {
    /// Trimmed values compared as-is.
    #[default]
    Exact,
    /// Trimmed values compared case-insensitively.
    CaseInsensitive,
    /// Values compared after full text normalization.
    Normalized,
}

impl KeyMatch {
    fn key(self, value: &str) -> String {
        match self {
            Self::Exact => value.trim().to_string(),
            Self::CaseInsensitive => value.trim().to_lowercase(),
            Self::Normalized => normalize_text(value),
        }
    }
}

/// Fill counts for one `apply` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Fields filled, per rule index.
    pub filled_by_rule: Vec<usize>,
    /// Records with every output field still blank afterwards.
    pub unresolved: usize,
}

#[derive(Debug, Clone)]
pub struct FallbackJoiner<'a> {
    stage: String,
    reference: &'a ReferenceTable,
    rules: Vec<PrecedenceRule>,
    outputs: Vec<OutputMapping>,
    key_match: KeyMatch,
}

impl<'a> FallbackJoiner<'a> {
    pub fn new(
        stage: impl Into<String>,
        reference: &'a ReferenceTable,
        rules: Vec<PrecedenceRule>,
        outputs: Vec<OutputMapping>,
    ) -> Self {
        Self {
            stage: stage.into(),
            reference,
            rules,
            outputs,
            key_match: KeyMatch::default(),
        }
    }

    #[must_use]
    pub fn with_key_match(mut self, key_match: KeyMatch) -> Self {
        self.key_match = key_match;
        self
    }

    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        self.apply_with_stats(records).0
    }

    pub fn apply_with_stats(&self, records: Vec<Record>) -> (Vec<Record>, JoinStats) {
        let indexes: Vec<HashMap<Vec<String>, usize>> =
            self.rules.iter().map(|rule| self.index_rule(rule)).collect();
        let mut stats = JoinStats {
            filled_by_rule: vec![0; self.rules.len()],
            unresolved: 0,
        };

        let joined = records
            .into_iter()
            .map(|mut record| {
                for output in &self.outputs {
                    record.ensure(&output.field);
                }
                let matches: Vec<Option<usize>> = self
                    .rules
                    .iter()
                    .zip(&indexes)
                    .map(|(rule, index)| {
                        let key = self.record_key(&record, rule)?;
                        index.get(&key).copied()
                    })
                    .collect();

                for output in &self.outputs {
                    if record.provenance(&output.field).is_set() {
                        continue;
                    }
                    for (rule_idx, matched) in matches.iter().enumerate() {
                        let Some(row) = matched else {
                            continue;
                        };
                        let value = self.reference.value(*row, &output.column);
                        if record.fill_if_blank(
                            &output.field,
                            value,
                            Provenance::rule(self.stage.as_str(), rule_idx),
                        ) {
                            stats.filled_by_rule[rule_idx] += 1;
                            break;
                        }
                    }
                }

                if self
                    .outputs
                    .iter()
                    .all(|output| record.is_blank(&output.field))
                {
                    stats.unresolved += 1;
                }
                record
            })
            .collect();

        debug!(
            stage = %self.stage,
            reference = %self.reference.name(),
            filled = ?stats.filled_by_rule,
            unresolved = stats.unresolved,
            "fallback join"
        );
        (joined, stats)
    }

    // First row per key tuple; later duplicates never win.
    fn index_rule(&self, rule: &PrecedenceRule) -> HashMap<Vec<String>, usize> {
        let mut index = HashMap::new();
        if rule.keys.is_empty() {
            return index;
        }
        for row in self.reference.rows() {
            let key: Vec<String> = rule
                .keys
                .iter()
                .map(|pair| self.key_match.key(row.get(&pair.column)))
                .collect();
            index.entry(key).or_insert(row.index());
        }
        index
    }

    /// Record side of a rule; `None` when every key value is blank.
    fn record_key(&self, record: &Record, rule: &PrecedenceRule) -> Option<Vec<String>> {
        if rule.keys.is_empty() {
            return None;
        }
        let key: Vec<String> = rule
            .keys
            .iter()
            .map(|pair| self.key_match.key(&record.text(&pair.field)))
            .collect();
        key.iter().any(|part| !part.is_empty()).then_some(key)
    }
}
