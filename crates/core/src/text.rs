//! Name normalization for duplicate detection.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize a display name for comparison.
///
/// Decomposes to NFD, strips combining marks (accents), lowercases and
/// collapses whitespace: `"  Pão  de Queijo "` becomes `"pao de queijo"`.
pub fn normalize_name(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case- and accent-insensitive name equality.
pub fn same_name(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_accents_case_and_extra_spaces() {
        assert_eq!(normalize_name("  Pão  de Queijo "), "pao de queijo");
        assert_eq!(normalize_name("CAFÉ"), "cafe");
        assert!(same_name("Açúcar Refinado", "acucar refinado"));
        assert!(!same_name("Bolo", "Bolos"));
    }

    #[test]
    fn keeps_non_latin_letters() {
        assert_eq!(normalize_name("Хлеб"), "хлеб");
        assert!(!same_name("Хлеб", "Сыр"));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: normalizing twice changes nothing.
        #[test]
        fn normalization_is_idempotent(name in "[\\p{L}\\p{M} ]{0,40}") {
            let once = normalize_name(&name);
            prop_assert_eq!(normalize_name(&once), once.clone());
        }

        /// Property: case never distinguishes two names.
        #[test]
        fn case_is_ignored(name in "[A-Za-z ]{1,30}") {
            prop_assert!(same_name(&name.to_uppercase(), &name.to_lowercase()));
        }
    }
}
