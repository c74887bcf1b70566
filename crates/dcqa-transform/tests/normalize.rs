//! Properties of the text normalizer.

use dcqa_transform::normalize_text;
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalization_is_idempotent(raw in "[a-zA-Z0-9 éèüÅøÆçñ™®©.,'&()/_\\-]{0,40}") {
        let once = normalize_text(&raw);
        prop_assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn output_has_no_edge_or_double_spaces(raw in "\\PC{0,40}") {
        let normalized = normalize_text(&raw);
        prop_assert!(!normalized.starts_with(' '));
        prop_assert!(!normalized.ends_with(' '));
        prop_assert!(!normalized.contains("  "));
    }
}

#[test]
fn visually_identical_inputs_match() {
    assert_eq!(normalize_text("Brand™"), normalize_text("brand"));
    assert_eq!(normalize_text("BRAND  X"), normalize_text("brand-x"));
    assert_eq!(normalize_text("Café"), normalize_text("cafe"));
    assert_eq!(normalize_text("“Acme”"), "acme");
}
