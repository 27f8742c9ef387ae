//! Whitelist and range predicates for generation-request fields.
//!
//! Every predicate is pure and total: any non-coercible or out-of-range input
//! returns `false`, never an error. Route handlers turn `false` into a 400
//! response; nothing here ever reaches the client directly.
//!
//! Numeric fields accept both JSON numbers and numeric strings because the
//! browser client historically sent either depending on the form control.

use serde_json::Value;

/// Business categories the response templates know about.
pub const BUSINESS_TYPES: [&str; 7] = [
    "restaurant",
    "retail",
    "hospitality",
    "healthcare",
    "automotive",
    "beauty",
    "professional-services",
];

/// Supported response tones.
pub const TONES: [&str; 5] = [
    "professional",
    "friendly",
    "formal",
    "apologetic",
    "enthusiastic",
];

/// Supported response lengths.
pub const RESPONSE_LENGTHS: [&str; 3] = ["short", "medium", "long"];

/// Supported generation providers. `auto` lets the service pick.
pub const PROVIDERS: [&str; 3] = ["openai", "claude", "auto"];

/// Inclusive bounds for the variations count.
pub const VARIATIONS_RANGE: (i64, i64) = (1, 5);

/// Inclusive bounds for the tone-adjustment slider.
pub const TONE_ADJUSTMENT_RANGE: (f64, f64) = (0.0, 10.0);

/// A star rating between 1 and 5, as a number or a numeric string.
pub fn is_valid_rating(value: &Value) -> bool {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(|r| (1..=5).contains(&r))
            .unwrap_or(false),
        Value::String(s) => matches!(s.as_str(), "1" | "2" | "3" | "4" | "5"),
        _ => false,
    }
}

/// Membership in the fixed business-type whitelist.
pub fn is_valid_business_type(value: &str) -> bool {
    BUSINESS_TYPES.contains(&value)
}

/// Membership in the fixed tone whitelist.
pub fn is_valid_tone(value: &str) -> bool {
    TONES.contains(&value)
}

/// One of `short`, `medium`, `long`.
pub fn is_valid_response_length(value: &str) -> bool {
    RESPONSE_LENGTHS.contains(&value)
}

/// One of `openai`, `claude`, `auto`.
pub fn is_valid_provider(value: &str) -> bool {
    PROVIDERS.contains(&value)
}

/// An integer variations count in `[1, 5]`, after numeric coercion.
///
/// `3` and `"3"` pass; `3.5`, `"3.5"`, `0` and `6` do not.
pub fn is_valid_variations(value: &Value) -> bool {
    coerce_i64(value)
        .map(|n| (VARIATIONS_RANGE.0..=VARIATIONS_RANGE.1).contains(&n))
        .unwrap_or(false)
}

/// A tone-adjustment value in `[0.0, 10.0]` inclusive, after numeric coercion.
pub fn is_valid_tone_adjustment(value: &Value) -> bool {
    coerce_f64(value)
        .map(|n| n >= TONE_ADJUSTMENT_RANGE.0 && n <= TONE_ADJUSTMENT_RANGE.1)
        .unwrap_or(false)
}

/// Coerces a JSON number or numeric string into an integer.
///
/// Floats only coerce when they are whole (`3.0` is an integer, `3.5` is not).
fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Some(i)
            } else {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            }
        }
        _ => None,
    }
}

/// Coerces a JSON number or numeric string into a float.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    // ========================================================================
    // Rating
    // ========================================================================

    #[test]
    fn test_rating_accepts_numbers_and_numeric_strings() {
        for r in 1..=5 {
            assert!(is_valid_rating(&json!(r)));
            assert!(is_valid_rating(&json!(r.to_string())));
        }
    }

    #[test]
    fn test_rating_boundaries() {
        assert!(!is_valid_rating(&json!("0")));
        assert!(is_valid_rating(&json!("5")));
        assert!(!is_valid_rating(&json!(0)));
        assert!(!is_valid_rating(&json!(6)));
    }

    #[test]
    fn test_rating_rejects_non_coercible() {
        assert!(!is_valid_rating(&json!(null)));
        assert!(!is_valid_rating(&json!(true)));
        assert!(!is_valid_rating(&json!("five")));
        assert!(!is_valid_rating(&json!(3.5)));
        assert!(!is_valid_rating(&json!([3])));
    }

    // ========================================================================
    // Whitelists
    // ========================================================================

    #[test]
    fn test_business_type_whitelist() {
        assert!(is_valid_business_type("restaurant"));
        assert!(is_valid_business_type("professional-services"));
        assert!(!is_valid_business_type("Restaurant"));
        assert!(!is_valid_business_type("bank"));
        assert!(!is_valid_business_type(""));
    }

    #[test]
    fn test_tone_whitelist() {
        assert!(is_valid_tone("professional"));
        assert!(is_valid_tone("apologetic"));
        assert!(!is_valid_tone("sarcastic"));
        assert!(!is_valid_tone("PROFESSIONAL"));
    }

    #[test]
    fn test_response_length_whitelist() {
        for len in ["short", "medium", "long"] {
            assert!(is_valid_response_length(len));
        }
        assert!(!is_valid_response_length("extra-long"));
    }

    #[test]
    fn test_provider_whitelist() {
        for p in ["openai", "claude", "auto"] {
            assert!(is_valid_provider(p));
        }
        assert!(!is_valid_provider("gemini"));
        assert!(!is_valid_provider("Claude"));
    }

    // ========================================================================
    // Numeric ranges
    // ========================================================================

    #[test]
    fn test_variations_boundaries() {
        assert!(!is_valid_variations(&json!(0)));
        assert!(is_valid_variations(&json!(1)));
        assert!(is_valid_variations(&json!(5)));
        assert!(!is_valid_variations(&json!(6)));
    }

    #[test]
    fn test_variations_coercion() {
        assert!(is_valid_variations(&json!("3")));
        assert!(is_valid_variations(&json!(3.0)));
        assert!(!is_valid_variations(&json!(3.5)));
        assert!(!is_valid_variations(&json!("3.5")));
        assert!(!is_valid_variations(&json!("three")));
        assert!(!is_valid_variations(&json!(null)));
    }

    #[test]
    fn test_tone_adjustment_boundaries() {
        assert!(is_valid_tone_adjustment(&json!(0)));
        assert!(is_valid_tone_adjustment(&json!(0.0)));
        assert!(is_valid_tone_adjustment(&json!(10)));
        assert!(is_valid_tone_adjustment(&json!(10.0)));
        assert!(!is_valid_tone_adjustment(&json!(10.01)));
        assert!(!is_valid_tone_adjustment(&json!(-0.01)));
    }

    #[test]
    fn test_tone_adjustment_accepts_fractional_values() {
        assert!(is_valid_tone_adjustment(&json!(7.25)));
        assert!(is_valid_tone_adjustment(&json!("7.25")));
    }

    #[test]
    fn test_tone_adjustment_rejects_non_coercible() {
        assert!(!is_valid_tone_adjustment(&json!("loud")));
        assert!(!is_valid_tone_adjustment(&json!(null)));
        assert!(!is_valid_tone_adjustment(&json!({})));
    }

    // ========================================================================
    // Properties
    // ========================================================================

    proptest! {
        /// In-range integers always validate, as numbers or strings
        #[test]
        fn variations_in_range_pass(n in 1i64..=5) {
            prop_assert!(is_valid_variations(&json!(n)));
            prop_assert!(is_valid_variations(&json!(n.to_string())));
        }

        /// Out-of-range integers never validate
        #[test]
        fn variations_out_of_range_fail(n in prop_oneof![i64::MIN..=0, 6..=i64::MAX]) {
            prop_assert!(!is_valid_variations(&json!(n)));
        }

        /// Tone adjustment acceptance matches the closed interval exactly
        #[test]
        fn tone_adjustment_matches_interval(x in -100.0f64..200.0) {
            let expected = (0.0..=10.0).contains(&x);
            prop_assert_eq!(is_valid_tone_adjustment(&json!(x)), expected);
        }

        /// Predicates never panic on arbitrary strings
        #[test]
        fn predicates_total_over_strings(s in ".*") {
            let v = json!(s.clone());
            let _ = is_valid_rating(&v);
            let _ = is_valid_variations(&v);
            let _ = is_valid_tone_adjustment(&v);
            let _ = is_valid_business_type(&s);
            let _ = is_valid_tone(&s);
        }
    }
}
