use std::sync::LazyLock;

use regex::Regex;

use dcqa_model::{ExceptionLedger, Record, Value};
use dcqa_transform::normalization::{parse_date_value, parse_number_value};

use crate::context::PipelineContext;
use crate::pipeline::Stage;

static NUMERIC_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(cost|spend|views|impressions|fee|percent|rate|eur|dkk|cpm|vcr|reach|frequency|budget)")
        .expect("valid numeric column pattern")
});

static METRIC_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(cost|spend|views|impressions|fee|eur|dkk|cpm|vcr|reach|frequency|budget)")
        .expect("valid metric column pattern")
});

/// Columns parsed as numbers during coercion.
pub fn is_numeric_column(name: &str) -> bool {
    NUMERIC_COLUMN.is_match(name)
}

/// Columns that count towards "this row carries values".
pub fn is_metric_column(name: &str) -> bool {
    METRIC_COLUMN.is_match(name)
}

/// Day-first dates and tolerant numbers. Unparseable values become null.
pub struct CoercionStage {
    date_fields: Vec<String>,
}

impl CoercionStage {
    pub fn plans() -> Self {
        Self {
            date_fields: vec!["Start Date".to_string(), "End Date".to_string()],
        }
    }

    pub fn numeric_only() -> Self {
        Self {
            date_fields: Vec::new(),
        }
    }

    fn coerce(&self, record: &mut Record) {
        for field in &self.date_fields {
            if let Some(value) = record.get(field) {
                let parsed = parse_date_value(value).map_or(Value::Null, Value::Date);
                record.set(field.as_str(), parsed);
            }
        }
        let numeric: Vec<String> = record
            .names()
            .filter(|name| is_numeric_column(name))
            .filter(|name| !self.date_fields.iter().any(|field| field == name))
            .map(str::to_string)
            .collect();
        for name in numeric {
            let parsed = record
                .get(&name)
                .and_then(parse_number_value)
                .map_or(Value::Null, Value::Number);
            record.set(name, parsed);
        }
    }
}

impl Stage for CoercionStage {
    fn run(
        &self,
        mut records: Vec<Record>,
        _ctx: &PipelineContext,
        _ledger: &ExceptionLedger,
    ) -> Vec<Record> {
        for record in &mut records {
            self.coerce(record);
        }
        records
    }

    fn name(&self) -> &str {
        "coercion"
    }
}
