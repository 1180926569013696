//! Validation constraint IR.
//!
//! Constraints are the JSON-Schema validation keywords attached to a
//! property. All clauses are conjunctive; the order in which backends render
//! them is fixed for readability only.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Optional bounds attached to a property.
///
/// When both bounds of the same kind are present the IR author is
/// responsible for `min <= max`; generators encode whatever they are given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// `minLength`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    /// `maxLength`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    /// `minimum` (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,

    /// `maximum` (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,

    /// `exclusiveMinimum`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,

    /// `exclusiveMaximum`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,

    /// `pattern` (regular expression, unanchored unless the pattern anchors itself)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// `minItems`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    /// `maxItems`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
}

impl Constraints {
    /// Check whether no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.min_length.is_none()
            && self.max_length.is_none()
            && self.minimum.is_none()
            && self.maximum.is_none()
            && self.exclusive_minimum.is_none()
            && self.exclusive_maximum.is_none()
            && self.pattern.is_none()
            && self.min_items.is_none()
            && self.max_items.is_none()
    }

    /// Set `minLength`.
    pub fn with_min_length(mut self, n: u64) -> Self {
        self.min_length = Some(n);
        self
    }

    /// Set `maxLength`.
    pub fn with_max_length(mut self, n: u64) -> Self {
        self.max_length = Some(n);
        self
    }

    /// Set `minimum`.
    pub fn with_minimum(mut self, n: impl Into<Number>) -> Self {
        self.minimum = Some(n.into());
        self
    }

    /// Set `maximum`.
    pub fn with_maximum(mut self, n: impl Into<Number>) -> Self {
        self.maximum = Some(n.into());
        self
    }

    /// Set `pattern`.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set `minItems`.
    pub fn with_min_items(mut self, n: u64) -> Self {
        self.min_items = Some(n);
        self
    }

    /// Set `maxItems`.
    pub fn with_max_items(mut self, n: u64) -> Self {
        self.max_items = Some(n);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(Constraints::default().is_empty());
    }

    #[test]
    fn test_any_bound_makes_non_empty() {
        assert!(!Constraints::default().with_min_length(1).is_empty());
        assert!(!Constraints::default().with_maximum(5).is_empty());
        assert!(!Constraints::default().with_pattern("^a$").is_empty());
        assert!(!Constraints::default().with_max_items(3).is_empty());
    }
}
