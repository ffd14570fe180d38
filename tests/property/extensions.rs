use css_sourcemap::constants::EXTENSIONS;
use css_sourcemap::has_valid_extension;
use proptest::prelude::*;

fn extension() -> impl Strategy<Value = String> {
    "\\.[a-z]{1,5}"
}

proptest! {
    #[test]
    fn test_suffix_match_is_exact(stem in "[a-zA-Z0-9_/]{0,24}", ext in extension(), exts in prop::collection::vec(extension(), 0..4)) {
        let id = format!("{}{}", stem, ext);
        let expected = exts.iter().any(|e| id.ends_with(e.as_str()));
        prop_assert_eq!(has_valid_extension(&id, &exts), expected);
    }

    #[test]
    fn test_configured_extension_always_matches(stem in "[a-zA-Z0-9_/]{0,24}", exts in prop::collection::vec(extension(), 1..4), pick in any::<prop::sample::Index>()) {
        let ext = pick.get(&exts);
        let id = format!("{}{}", stem, ext);
        prop_assert!(has_valid_extension(&id, &exts));
    }

    #[test]
    fn test_default_set_rejects_less(stem in "[a-zA-Z0-9_/]{0,24}") {
        let id = format!("{}.less", stem);
        prop_assert!(!has_valid_extension(&id, EXTENSIONS));
        let css = format!("{}.css", stem);
        prop_assert!(has_valid_extension(&css, EXTENSIONS));
        let scss = format!("{}.scss", stem);
        prop_assert!(has_valid_extension(&scss, EXTENSIONS));
    }
}
