//! Rule primitives shared by every rule set.
//!
//! Each primitive answers pass/fail with a human reason; callers attach the
//! path and field when turning a violation into a [`ValidationError`].

use crate::error::ValidationError;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

/// A regular expression compiled on first use.
pub struct Pattern {
    source: &'static str,
    compiled: OnceLock<Result<Regex, String>>,
}

impl Pattern {
    /// Declare a pattern; compilation is deferred.
    #[must_use]
    pub const fn new(source: &'static str) -> Self {
        Self {
            source,
            compiled: OnceLock::new(),
        }
    }

    /// Pattern text.
    #[must_use]
    pub const fn source(&self) -> &'static str {
        self.source
    }

    fn regex(&self) -> Result<&Regex, &str> {
        self.compiled
            .get_or_init(|| Regex::new(self.source).map_err(|error| error.to_string()))
            .as_ref()
            .map_err(String::as_str)
    }

    /// Compile error, if the pattern is not a valid regex.
    pub fn compile_error(&self) -> Option<String> {
        self.regex().err().map(str::to_string)
    }

    /// True when `value` matches. An uncompilable pattern matches nothing.
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex().is_ok_and(|regex| regex.is_match(value))
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// Reason a single rule did not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    /// Human-readable reason.
    pub reason: String,
}

impl RuleViolation {
    /// Violation with a reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.reason)
    }
}

/// Outcome of a rule primitive.
pub type Rule = Result<(), RuleViolation>;

/// Attach a location to a failed rule.
pub trait RuleExt {
    /// Map a violation to [`ValidationError::InvalidValue`].
    fn or_invalid(self, path: &str, field: &str) -> Result<(), ValidationError>;
}

impl RuleExt for Rule {
    fn or_invalid(self, path: &str, field: &str) -> Result<(), ValidationError> {
        self.map_err(|violation| ValidationError::invalid(path, field, violation.reason))
    }
}

/// `value` must match `pattern`.
pub fn matches(value: &str, pattern: &Pattern) -> Rule {
    if let Some(error) = pattern.compile_error() {
        return Err(RuleViolation::new(format!(
            "validation pattern '{}' is invalid: {error}",
            pattern.source()
        )));
    }
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(RuleViolation::new(format!(
            "`{value}` is invalid, regex used for validation is '{}'",
            pattern.source()
        )))
    }
}

/// `value` must be one of `allowed`.
pub fn one_of(value: &str, allowed: &[&str], noun: &str) -> Rule {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(RuleViolation::new(format!(
            "`{value}`, supported {noun}: {}",
            allowed.join(", ")
        )))
    }
}

/// `value` must lie in `[min, max]`.
pub fn in_range(value: i64, min: i64, max: i64) -> Rule {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(RuleViolation::new(format!("must be between {min} and {max}")))
    }
}

/// `value` must parse as an integer.
pub fn integer(value: &str) -> Result<i64, RuleViolation> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| RuleViolation::new(format!("`{value}` must be an integer")))
}

/// First item whose key was already seen. Items without a key are skipped.
pub fn first_duplicate<'a, T, K, F>(items: &'a [T], key: F) -> Option<(usize, K)>
where
    K: Ord + Clone,
    F: Fn(&'a T) -> Option<K>,
{
    let mut seen = BTreeSet::new();
    items.iter().enumerate().find_map(|(index, item)| {
        let value = key(item)?;
        if seen.insert(value.clone()) {
            None
        } else {
            Some((index, value))
        }
    })
}

/// Keys produced by `key` must not repeat.
pub fn unique_by<'a, T, K, F>(items: &'a [T], key: F) -> Rule
where
    K: Ord + Clone + fmt::Display,
    F: Fn(&'a T) -> Option<K>,
{
    match first_duplicate(items, key) {
        None => Ok(()),
        Some((_, value)) => Err(RuleViolation::new(format!("`{value}` is duplicated"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static DIGITS: Pattern = Pattern::new(r"^\d+$");
    static BROKEN: Pattern = Pattern::new(r"^(unclosed$");

    #[test]
    fn patterns_compile_lazily_and_match() {
        assert!(DIGITS.compile_error().is_none());
        assert_eq!(matches("123", &DIGITS), Ok(()));
        let violation = matches("12a", &DIGITS).err();
        assert!(violation.is_some_and(|v| v.reason.contains(r"^\d+$")));
    }

    #[test]
    fn broken_patterns_fail_closed() {
        assert!(BROKEN.compile_error().is_some());
        assert!(!BROKEN.is_match("unclosed"));
        assert!(matches("unclosed", &BROKEN).is_err());
    }

    #[test]
    fn one_of_lists_the_allowed_values() {
        assert_eq!(one_of("gp3", &["gp2", "gp3"], "types"), Ok(()));
        assert_eq!(
            one_of("st9", &["gp2", "gp3"], "types"),
            Err(RuleViolation::new("`st9`, supported types: gp2, gp3"))
        );
    }

    #[test]
    fn ranges_are_inclusive() {
        assert!(in_range(3000, 3000, 16000).is_ok());
        assert!(in_range(16000, 3000, 16000).is_ok());
        assert!(in_range(2999, 3000, 16000).is_err());
        assert!(integer("12x").is_err());
        assert_eq!(integer(" 42 "), Ok(42));
    }

    #[test]
    fn unique_by_ignores_missing_keys() {
        let labels = [Some("data"), None, None, Some("logs")];
        assert!(unique_by(&labels, |label| *label).is_ok());

        let labels = [Some("data"), Some("logs"), Some("data")];
        assert_eq!(first_duplicate(&labels, |label| *label), Some((2, "data")));
        assert!(unique_by(&labels, |label| *label).is_err());
    }

    #[test]
    fn or_invalid_attaches_location() {
        let error = one_of("x", &["y"], "values").or_invalid("spec", "field").err();
        assert_eq!(
            error.map(|e| e.to_string()),
            Some("spec: Invalid value: \"field\": `x`, supported values: y".to_string())
        );
    }
}
