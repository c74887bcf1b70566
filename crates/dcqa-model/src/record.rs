//! Ordered records with per-field provenance.

use std::collections::BTreeMap;

use crate::value::Value;

/// Where the current value of a field came from.
///
/// Fill operations only write into `Unset` fields, so the first stage that
/// resolves a field wins and later fallbacks become no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Provenance {
    #[default]
    Unset,
    /// Non-blank value present on the raw input.
    Input,
    /// Written by a pipeline stage, optionally naming the precedence rule index.
    Stage { stage: String, rule: Option<usize> },
}

impl Provenance {
    pub fn stage(stage: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            rule: None,
        }
    }

    pub fn rule(stage: impl Into<String>, rule: usize) -> Self {
        Self::Stage {
            stage: stage.into(),
            rule: Some(rule),
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// Short label used by the mapping-diff audit view.
    pub fn label(&self) -> String {
        match self {
            Self::Unset => String::new(),
            Self::Input => "input".to_string(),
            Self::Stage { stage, rule: None } => stage.clone(),
            Self::Stage {
                stage,
                rule: Some(rule),
            } => format!("{stage}#{rule}"),
        }
    }
}

/// One source row: field names in source order mapped to values.
///
/// `row` is the position within the source batch and is not unique across
/// batches.
#[derive(Debug, Clone, Default)]
pub struct Record {
    row: usize,
    fields: Vec<(String, Value)>,
    provenance: BTreeMap<String, Provenance>,
}

impl Record {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            ..Self::default()
        }
    }

    pub fn from_pairs<I, K, V>(row: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Self::new(row);
        for (name, value) in pairs {
            record.set(name, value);
        }
        record
    }

    /// Builder form of [`Record::set`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.position(name).map(|idx| &self.fields[idx].1)
    }

    /// Rendered, trimmed value; empty when the field is absent.
    pub fn text(&self, name: &str) -> String {
        self.get(name)
            .map(|value| value.to_string().trim().to_string())
            .unwrap_or_default()
    }

    pub fn is_blank(&self, name: &str) -> bool {
        self.get(name).is_none_or(Value::is_blank)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Replaces the value in place, or appends the field when absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.fields[idx].1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Adds the field as `Null` when it does not exist yet.
    pub fn ensure(&mut self, name: &str) {
        if !self.contains(name) {
            self.fields.push((name.to_string(), Value::Null));
        }
    }

    /// Inserts a new field right after `anchor`, or at the front when the
    /// anchor is absent. An existing field of the same name is moved.
    pub fn insert_after(&mut self, anchor: &str, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if let Some(idx) = self.position(&name) {
            self.fields.remove(idx);
        }
        let at = self.position(anchor).map_or(0, |idx| idx + 1);
        self.fields.insert(at, (name, value.into()));
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.provenance.remove(name);
        self.position(name).map(|idx| self.fields.remove(idx).1)
    }

    pub fn provenance(&self, name: &str) -> Provenance {
        if let Some(provenance) = self.provenance.get(name) {
            return provenance.clone();
        }
        if self.is_blank(name) {
            Provenance::Unset
        } else {
            Provenance::Input
        }
    }

    /// Writes `value` only when the field is still unresolved.
    ///
    /// Returns true when the write happened. Blank candidate values never
    /// count as a fill.
    pub fn fill_if_blank(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        provenance: Provenance,
    ) -> bool {
        let value = value.into();
        if value.is_blank() {
            return false;
        }
        match self.provenance(name) {
            Provenance::Unset => {
                self.set(name, value);
                self.provenance.insert(name.to_string(), provenance);
                true
            }
            current => {
                self.provenance.entry(name.to_string()).or_insert(current);
                false
            }
        }
    }

    /// Unconditional overwrite that records which stage made it.
    pub fn set_by(&mut self, name: &str, value: impl Into<Value>, provenance: Provenance) {
        self.set(name, value);
        self.provenance.insert(name.to_string(), provenance);
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(field, _)| field == name)
    }
}
