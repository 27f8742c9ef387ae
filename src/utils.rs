//!
//! Utility types and functions shared across the service core.
//!
//! This module provides:
//! - [`Sensitive`] - A wrapper type for sensitive data that hides values in debug output
//! - [`RequestIdGenerator`] - Generates or preserves request IDs for correlation
//! - [`replace_handlebars_with_env`] - Template substitution for environment variables
//!

use {
    http::{HeaderValue, Request},
    regex::{Captures, Regex},
    serde::Deserialize,
    std::{env, sync::LazyLock},
    tower_http::request_id::{MakeRequestId, RequestId},
    uuid::{ContextV7, Timestamp, Uuid},
    zeroize::{Zeroize, ZeroizeOnDrop},
};

/// Matches handlebars-style environment variable references like `{{ VAR_NAME }}`,
/// with optional whitespace around the name. Names are restricted to the usual
/// uppercase/digit/underscore env-var alphabet.
static HANDLEBAR_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z0-9_]+)\s*\}\}").unwrap());

/// A wrapper type for sensitive data that obscures the value in debug output
/// and securely zeros memory when dropped.
///
/// Used for the encryption passphrase and anything else that must not leak
/// into logs or error messages. The inner value remains accessible through
/// field `0`, but `Debug` prints `Sensitive(****)`.
///
/// # Examples
///
/// ```
/// use replyguard::Sensitive;
///
/// let passphrase = Sensitive::from("correct-horse-battery-staple-0123");
/// assert_eq!(format!("{:?}", passphrase), "Sensitive(****)");
///
/// // Access the actual value when needed
/// let value: &str = &passphrase.0;
/// ```
///
/// # Limitations
///
/// This type does not encrypt the value in memory or prevent it from being
/// read through the wrapper. It only guards against accidental exposure via
/// `Debug` formatting and lingering heap contents after drop.
#[derive(Clone, Deserialize, Default, Zeroize, ZeroizeOnDrop)]
pub struct Sensitive<T: Default + Zeroize>(pub T);

impl Sensitive<String> {
    /// Creates a new `Sensitive<String>` from a string slice.
    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<T: Default + Zeroize + PartialEq> PartialEq for Sensitive<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Default + Zeroize> std::fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sensitive(****)")
    }
}

/// Request ID generator for request correlation.
///
/// Implements `MakeRequestId` from `tower-http` to either preserve an existing
/// `x-request-id` header from the incoming request or generate a new UUIDv7
/// (time-ordered, collision-resistant) when none is present.
///
/// # Examples
///
/// ```
/// use replyguard::RequestIdGenerator;
/// use tower_http::request_id::SetRequestIdLayer;
///
/// let layer = SetRequestIdLayer::x_request_id(RequestIdGenerator);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, req: &Request<B>) -> Option<RequestId> {
        match req.headers().get("x-request-id") {
            Some(value) => Some(RequestId::new(value.clone())),
            None => {
                let cx = ContextV7::new().with_additional_precision();
                let uuid = Uuid::new_v7(Timestamp::now(cx));
                let value = HeaderValue::from_str(&uuid.to_string()).ok()?;
                Some(RequestId::new(value))
            }
        }
    }
}

/// Replaces handlebars-style placeholders with environment variable values.
///
/// Searches the input for patterns like `{{ VAR_NAME }}` and substitutes the
/// corresponding environment variable. This is how the encryption passphrase
/// and the CORS allow-list stay out of checked-in TOML files.
///
/// If an environment variable is not set, the placeholder is replaced with an
/// empty string and a warning is logged.
///
/// # Examples
///
/// ```
/// use replyguard::replace_handlebars_with_env;
///
/// let template = "Value: {{ MISSING_VAR }}";
/// let result = replace_handlebars_with_env(template);
/// assert_eq!(result, "Value: ");
/// ```
pub fn replace_handlebars_with_env(input: &str) -> String {
    HANDLEBAR_REGEXP
        .replace_all(input, |caps: &Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!(
                    variable = %var_name,
                    "Environment variable not found, substituting with empty string"
                );
                String::new()
            })
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ========================================================================
    // Property-based tests for replace_handlebars_with_env
    // ========================================================================

    proptest! {
        /// Strings without handlebars patterns should pass through unchanged
        #[test]
        fn handlebars_no_pattern_unchanged(s in "[^{}]*") {
            let result = replace_handlebars_with_env(&s);
            prop_assert_eq!(result, s);
        }

        /// The function should never panic on arbitrary input
        #[test]
        fn handlebars_never_panics(s in ".*") {
            let _ = replace_handlebars_with_env(&s);
        }

        /// Single braces should pass through unchanged
        #[test]
        fn handlebars_single_braces_unchanged(
            prefix in "[^{}]*",
            middle in "[^{}]*",
            suffix in "[^{}]*"
        ) {
            let input = format!("{prefix}{{{middle}}}{suffix}");
            let result = replace_handlebars_with_env(&input);
            prop_assert_eq!(result, input);
        }

        /// Valid patterns with set env vars should be substituted
        #[test]
        fn handlebars_valid_pattern_substituted(
            var_name in "[A-Z][A-Z0-9_]{0,10}",
            var_value in "[a-zA-Z0-9_]{1,20}",
            prefix in "[^{}]{0,10}",
            suffix in "[^{}]{0,10}"
        ) {
            // Unique name to avoid collisions with parallel tests
            let test_var = format!("PROPTEST_{var_name}");
            unsafe { std::env::set_var(&test_var, &var_value); }

            let input = format!("{prefix}{{{{ {test_var} }}}}{suffix}");
            let result = replace_handlebars_with_env(&input);
            let expected = format!("{prefix}{var_value}{suffix}");

            unsafe { std::env::remove_var(&test_var); }

            prop_assert_eq!(result, expected);
        }

        /// Missing env vars should become empty strings
        #[test]
        fn handlebars_missing_var_empty(
            var_name in "[A-Z][A-Z0-9_]{5,15}"
        ) {
            let test_var = format!("PROPTEST_MISSING_{var_name}");
            unsafe { std::env::remove_var(&test_var); }

            let input = format!("value={{{{ {test_var} }}}}");
            let result = replace_handlebars_with_env(&input);

            prop_assert_eq!(result, "value=");
        }
    }

    // ========================================================================
    // Sensitive wrapper tests
    // ========================================================================

    proptest! {
        /// Sensitive wrapper preserves the inner value
        #[test]
        fn sensitive_preserves_value(s in ".*") {
            let sensitive = Sensitive::from(s.as_str());
            prop_assert_eq!(&sensitive.0, &s);
        }

        /// Sensitive Debug output never contains the actual value
        #[test]
        fn sensitive_debug_hides_value(s in "[a-zA-Z0-9]{1,50}") {
            let sensitive = Sensitive::from(s.as_str());
            let debug_output = format!("{:?}", sensitive);

            prop_assert!(debug_output.contains("****"));
            if s.len() > 4 {
                prop_assert!(!debug_output.contains(&s));
            }
        }
    }

    #[test]
    fn sensitive_drop_zeros_memory() {
        // We can't inspect memory after drop in safe Rust, but we can verify
        // the Drop implementation runs without panicking.
        let secret = "super-secret-passphrase-12345";
        let sensitive = Sensitive::from(secret);
        assert_eq!(sensitive.0, secret);
        drop(sensitive);
    }

    #[test]
    fn sensitive_clone_creates_independent_copy() {
        let original = Sensitive::from("original-secret");
        let cloned = original.clone();
        assert_eq!(original.0, cloned.0);
        drop(original);
        assert_eq!(cloned.0, "original-secret");
    }
}
