//! Conservation properties of the proration expander.

use chrono::{Duration, NaiveDate};
use dcqa_model::{Record, Value};
use dcqa_transform::normalization::parse_number;
use dcqa_transform::proration::{ProrationLayout, RangeSource, expand};
use proptest::prelude::*;

fn plan(start: NaiveDate, end: NaiveDate, cost: f64, views: &str) -> Record {
    Record::new(0)
        .with("Plan ID", "P-1")
        .with("Start_Date", start)
        .with("End_Date", end)
        .with("Total_Cost_to_Client_Local", cost)
        .with("Views", views)
}

fn sum_field(rows: &[Record], field: &str) -> f64 {
    rows.iter()
        .filter_map(|row| row.get(field).and_then(Value::as_number))
        .sum()
}

proptest! {
    #[test]
    fn daily_values_sum_to_the_original(
        offset in 0i64..3000,
        span in 0i64..120,
        cost in -1.0e7f64..1.0e7,
        views in 0u32..5_000_000,
    ) {
        let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap() + Duration::days(offset);
        let end = start + Duration::days(span);
        let views_text = format!("{views}");
        let expansion = expand(&plan(start, end, cost, &views_text), &ProrationLayout::plans());

        prop_assert_eq!(expansion.source, RangeSource::Explicit);
        prop_assert_eq!(expansion.rows.len() as i64, span + 1);

        let cost_sum = sum_field(&expansion.rows, "Total_Cost_to_Client_Local");
        prop_assert!((cost_sum - cost).abs() <= 1e-6 * cost.abs().max(1.0));

        let expected_views = parse_number(&views_text).unwrap();
        let views_sum = sum_field(&expansion.rows, "Views");
        prop_assert!((views_sum - expected_views).abs() <= 1e-6 * expected_views.max(1.0));
    }

    #[test]
    fn rows_cover_every_day_in_order(offset in 0i64..3000, span in 0i64..60) {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Duration::days(offset);
        let end = start + Duration::days(span);
        let expansion = expand(&plan(start, end, 1.0, "1"), &ProrationLayout::plans());
        for (idx, row) in expansion.rows.iter().enumerate() {
            let expected = start + Duration::days(idx as i64);
            prop_assert_eq!(row.get("Date").and_then(Value::as_date), Some(expected));
        }
    }
}

#[test]
fn plans_layout_ignores_absent_fields() {
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let expansion = expand(&plan(start, start, 10.0, "4"), &ProrationLayout::plans());
    assert_eq!(expansion.rows.len(), 1);
    assert!(!expansion.rows[0].contains("Agency_Fee"));
    assert_eq!(
        expansion.rows[0].get("Views"),
        Some(&Value::Number(4.0))
    );
}

#[test]
fn header_variants_with_unicode_spaces_still_prorate() {
    let record = Record::new(0)
        .with("Min Start Date", "01/03/2024")
        .with("Max End Date", "02/03/2024")
        .with("Planned\u{a0}(Local)", "(100)");
    let expansion = expand(&record, &ProrationLayout::budgets());
    assert_eq!(expansion.rows.len(), 2);
    assert_eq!(
        expansion.rows[1].get("Planned\u{a0}(Local)"),
        Some(&Value::Number(-50.0))
    );
}
