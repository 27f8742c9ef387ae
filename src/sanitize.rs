//! Type-aware cleansing of untrusted JSON payloads.
//!
//! Every function here is total: bad input degrades to an empty string or
//! passes through untouched, it never produces an error. Validation is a
//! separate concern (see [`crate::validate`]); sanitization only removes
//! content that must never reach a template, a log line or an LLM prompt.
//!
//! The HTML handling is a naive tag-bracket strip, not a real parser. It can
//! be bypassed by sufficiently malformed markup; the whitelist in
//! [`sanitize_review_text`] is the stronger guarantee for text that gets
//! interpolated into prompts.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Hard cap on sanitized string length, in characters.
pub const MAX_STRING_LEN: usize = 10_000;

static JS_SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)javascript:").unwrap());

static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)on\w+=").unwrap());

/// Characters allowed in review text: word characters, whitespace and basic
/// punctuation. Everything else is dropped before prompt interpolation.
static REVIEW_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,!?-]").unwrap());

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Cleanses a single untrusted string.
///
/// The order of operations is fixed and observable: trim, strip `<`/`>`,
/// strip the `javascript:` scheme (case-insensitive), strip inline `on*=`
/// event handlers (case-insensitive), then truncate to [`MAX_STRING_LEN`]
/// characters.
///
/// # Examples
///
/// ```
/// use replyguard::sanitize_string;
///
/// assert_eq!(sanitize_string("<script>alert(1)</script>"), "scriptalert(1)/script");
/// assert_eq!(sanitize_string("JavaScript:alert(1)"), "alert(1)");
/// assert_eq!(sanitize_string("onclick=alert(1)"), "alert(1)");
/// ```
pub fn sanitize_string(input: &str) -> String {
    let trimmed = input.trim();
    let without_brackets: String = trimmed.chars().filter(|c| *c != '<' && *c != '>').collect();
    let without_scheme = JS_SCHEME.replace_all(&without_brackets, "");
    let without_handlers = EVENT_HANDLER.replace_all(&without_scheme, "");
    truncate_chars(&without_handlers, MAX_STRING_LEN)
}

/// Cleanses review text destined for prompt interpolation.
///
/// Stricter than [`sanitize_string`]: after the generic pass, everything
/// outside the word/whitespace/`. , ! ? -` whitelist is dropped and runs of
/// whitespace collapse to single spaces.
pub fn sanitize_review_text(input: &str) -> String {
    let cleaned = sanitize_string(input);
    let whitelisted = REVIEW_DISALLOWED.replace_all(&cleaned, "");
    let collapsed = WHITESPACE_RUN.replace_all(&whitelisted, " ");
    collapsed.trim().to_string()
}

/// Normalizes and validates an email address.
///
/// Returns the lower-cased address when it matches a simple
/// `local@domain.tld` shape, or the empty string otherwise. Never errors.
pub fn sanitize_email(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    if EMAIL_SHAPE.is_match(&lowered) {
        lowered
    } else {
        String::new()
    }
}

/// Recursively sanitizes an arbitrary JSON value.
///
/// The match is exhaustive over the JSON value tree: strings are cleansed
/// with [`sanitize_string`], arrays map element-wise, objects map value-wise
/// preserving keys, and null/bool/number scalars pass through unchanged.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_string(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, sanitize_value(v)))
                .collect(),
        ),
        other @ (Value::Null | Value::Bool(_) | Value::Number(_)) => other,
    }
}

/// Extracts a sanitized string from a JSON value.
///
/// Non-string values (including null and numbers) yield the empty string,
/// which is the totality guarantee at the dynamic boundary: a field that was
/// supposed to be text but arrived as something else becomes `""` and then
/// fails validation, rather than panicking or erroring here.
pub fn sanitize_text_field(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize_string(s),
        _ => String::new(),
    }
}

/// Char-boundary-safe truncation.
fn truncate_chars(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        input.to_string()
    } else {
        input.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    // ========================================================================
    // sanitize_string
    // ========================================================================

    #[test]
    fn test_strips_tag_brackets() {
        assert_eq!(
            sanitize_string("<script>alert(1)</script>"),
            "scriptalert(1)/script"
        );
        assert_eq!(sanitize_string("a < b > c"), "a  b  c");
    }

    #[test]
    fn test_strips_javascript_scheme_case_insensitive() {
        assert_eq!(sanitize_string("javascript:alert(1)"), "alert(1)");
        assert_eq!(sanitize_string("JaVaScRiPt:alert(1)"), "alert(1)");
        assert_eq!(sanitize_string("JAVASCRIPT:void(0)"), "void(0)");
    }

    #[test]
    fn test_strips_event_handlers_case_insensitive() {
        assert_eq!(sanitize_string("onclick=alert(1)"), "alert(1)");
        assert_eq!(sanitize_string("OnMouseOver=steal()"), "steal()");
        assert_eq!(sanitize_string("onerror=x onload=y"), "x y");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(sanitize_string("  hello  "), "hello");
        assert_eq!(sanitize_string("\n\thello\n"), "hello");
    }

    #[test]
    fn test_truncates_to_max_chars() {
        let long = "a".repeat(MAX_STRING_LEN + 500);
        assert_eq!(sanitize_string(&long).chars().count(), MAX_STRING_LEN);
    }

    #[test]
    fn test_truncation_is_char_boundary_safe() {
        let long = "é".repeat(MAX_STRING_LEN + 10);
        let out = sanitize_string(&long);
        assert_eq!(out.chars().count(), MAX_STRING_LEN);
    }

    #[test]
    fn test_idempotent_on_representative_payloads() {
        for payload in [
            "<script>alert(1)</script>",
            "javascript:alert(1)",
            "onclick=alert(1)",
            "  <img src=x onerror=alert(1)>  ",
            "plain text stays plain",
        ] {
            let once = sanitize_string(payload);
            let twice = sanitize_string(&once);
            assert_eq!(once, twice, "sanitizer not idempotent for {payload:?}");
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize_string(""), "");
        assert_eq!(sanitize_string("   "), "");
    }

    // ========================================================================
    // sanitize_review_text
    // ========================================================================

    #[test]
    fn test_review_text_whitelist() {
        assert_eq!(
            sanitize_review_text("Great food!! 5/5 stars; would return & recommend."),
            "Great food!! 55 stars would return recommend."
        );
    }

    #[test]
    fn test_review_text_collapses_whitespace() {
        assert_eq!(
            sanitize_review_text("too    many\n\n spaces\there"),
            "too many spaces here"
        );
    }

    #[test]
    fn test_review_text_keeps_basic_punctuation() {
        assert_eq!(
            sanitize_review_text("Good, but slow. Really?! Sub-par."),
            "Good, but slow. Really?! Sub-par."
        );
    }

    #[test]
    fn test_review_text_strips_injection_attempts() {
        let out = sanitize_review_text("<script>alert('x')</script> javascript:run()");
        assert!(!out.contains('<'));
        assert!(!out.contains('\''));
        assert!(!out.to_lowercase().contains("javascript:"));
    }

    // ========================================================================
    // sanitize_email
    // ========================================================================

    #[test]
    fn test_email_valid_is_lowercased() {
        assert_eq!(sanitize_email("User@Example.COM"), "user@example.com");
        assert_eq!(sanitize_email("  a.b@c.io  "), "a.b@c.io");
    }

    #[test]
    fn test_email_invalid_becomes_empty() {
        for bad in ["not-an-email", "missing@tld", "two@@example.com", "sp ace@x.io", ""] {
            assert_eq!(sanitize_email(bad), "", "expected {bad:?} to be rejected");
        }
    }

    // ========================================================================
    // sanitize_value / sanitize_text_field
    // ========================================================================

    #[test]
    fn test_value_scalars_pass_through() {
        assert_eq!(sanitize_value(json!(null)), json!(null));
        assert_eq!(sanitize_value(json!(true)), json!(true));
        assert_eq!(sanitize_value(json!(42)), json!(42));
        assert_eq!(sanitize_value(json!(4.5)), json!(4.5));
    }

    #[test]
    fn test_value_strings_are_cleansed() {
        assert_eq!(
            sanitize_value(json!("<b>bold</b>")),
            json!("bbold/b")
        );
    }

    #[test]
    fn test_value_arrays_map_element_wise() {
        assert_eq!(
            sanitize_value(json!(["<a>", 1, null, "ok"])),
            json!(["a", 1, null, "ok"])
        );
    }

    #[test]
    fn test_value_objects_preserve_keys_and_recurse() {
        let input = json!({
            "review_text": "  <script>bad</script>  ",
            "rating": 5,
            "nested": { "note": "javascript:x", "flags": [true, "onload=y"] }
        });
        let expected = json!({
            "review_text": "scriptbad/script",
            "rating": 5,
            "nested": { "note": "x", "flags": [true, "y"] }
        });
        assert_eq!(sanitize_value(input), expected);
    }

    #[test]
    fn test_text_field_non_string_is_empty() {
        assert_eq!(sanitize_text_field(&json!(null)), "");
        assert_eq!(sanitize_text_field(&json!(42)), "");
        assert_eq!(sanitize_text_field(&json!(true)), "");
        assert_eq!(sanitize_text_field(&json!([1, 2])), "");
        assert_eq!(sanitize_text_field(&json!({"a": 1})), "");
    }

    #[test]
    fn test_text_field_string_is_cleansed() {
        assert_eq!(sanitize_text_field(&json!(" <i>hey</i> ")), "ihey/i");
    }

    // ========================================================================
    // Properties
    // ========================================================================

    proptest! {
        /// The sanitizer never panics on arbitrary input
        #[test]
        fn sanitize_never_panics(s in ".*") {
            let _ = sanitize_string(&s);
            let _ = sanitize_review_text(&s);
            let _ = sanitize_email(&s);
        }

        /// Output never contains angle brackets
        #[test]
        fn sanitize_removes_brackets(s in ".*") {
            let out = sanitize_string(&s);
            prop_assert!(!out.contains('<'));
            prop_assert!(!out.contains('>'));
        }

        /// Output never exceeds the length cap
        #[test]
        fn sanitize_respects_length_cap(s in ".{0,12000}") {
            prop_assert!(sanitize_string(&s).chars().count() <= MAX_STRING_LEN);
        }

        /// Review text never retains characters useful for injection
        #[test]
        fn review_text_drops_dangerous_characters(s in ".*") {
            let out = sanitize_review_text(&s);
            for c in out.chars() {
                prop_assert!(
                    !r##"<>&;:/\'"`(){}[]=#$%^*+|~@"##.contains(c),
                    "unexpected character {c:?} in {out:?}"
                );
            }
        }
    }
}
