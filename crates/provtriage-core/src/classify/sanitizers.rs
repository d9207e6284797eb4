//! Sanitizer registry for the attacker model
//!
//! Operations that reduce how much of a string the attacker still controls.
//! Labels are matched loosely: instrumentation versions name the same
//! operation differently (`precise:string.replace`, `replace`, `Replace`), so a
//! label matches a pattern when either one contains the other, ignoring case.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizerCategory {
    /// Reshapes the string, dropping one attacker-controlled fragment.
    Implicit,
    /// Encodes or escapes the string for a specific context.
    Explicit,
    ObjectAccess,
}

impl SanitizerCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SanitizerCategory::Implicit => "implicit",
            SanitizerCategory::Explicit => "explicit",
            SanitizerCategory::ObjectAccess => "object_access",
        }
    }
}

/// Bidirectional, case-insensitive containment between a label and a pattern.
pub fn operation_matches(operation: &str, pattern: &str) -> bool {
    let operation = operation.to_lowercase();
    let pattern = pattern.to_lowercase();
    operation.contains(&pattern) || pattern.contains(&operation)
}

pub fn operation_matches_any<'a>(
    operation: &str,
    patterns: impl IntoIterator<Item = &'a str>,
) -> bool {
    patterns
        .into_iter()
        .any(|pattern| operation_matches(operation, pattern))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizerPattern {
    pub name: String,
    pub category: SanitizerCategory,
    pub description: String,
}

impl SanitizerPattern {
    pub fn new(name: &str, category: SanitizerCategory, description: &str) -> Self {
        Self {
            name: name.to_string(),
            category,
            description: description.to_string(),
        }
    }

    pub fn matches(&self, operation: &str) -> bool {
        operation_matches(operation, &self.name)
    }
}

#[derive(Debug, Clone)]
pub struct SanitizersRegistry {
    patterns: Vec<SanitizerPattern>,
}

impl Default for SanitizersRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SanitizersRegistry {
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Registers the built-in patterns. Registration order is match precedence.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_implicit_sanitizers();
        registry.register_explicit_sanitizers();
        registry.register_object_access();
        registry
    }

    fn register_implicit_sanitizers(&mut self) {
        let implicit = [
            ("stringify", "Serialization to a string"),
            ("replace", "Substring replacement"),
            ("substr", "Substring extraction"),
            ("indexOf", "Substring search"),
        ];
        for (name, description) in implicit {
            self.register_pattern(SanitizerPattern::new(
                name,
                SanitizerCategory::Implicit,
                description,
            ));
        }
    }

    fn register_explicit_sanitizers(&mut self) {
        let explicit = [
            ("htmlencode", "HTML entity encoding"),
            ("urlencode", "URL encoding"),
            ("encode", "Generic encoding"),
            ("escape", "Escaping"),
            ("sanitize", "Sanitizer call"),
            ("queryString", "Query string parsing"),
            ("paramString", "Route parameter parsing"),
            ("bodyString", "Request body parsing"),
            ("headerString", "Request header parsing"),
        ];
        for (name, description) in explicit {
            self.register_pattern(SanitizerPattern::new(
                name,
                SanitizerCategory::Explicit,
                description,
            ));
        }
    }

    fn register_object_access(&mut self) {
        for name in ["getField", "putField"] {
            self.register_pattern(SanitizerPattern::new(
                name,
                SanitizerCategory::ObjectAccess,
                "Object property access",
            ));
        }
    }

    pub fn register_pattern(&mut self, pattern: SanitizerPattern) {
        self.patterns.push(pattern);
    }

    /// First pattern, in precedence order, matching `operation`.
    pub fn pattern_for(&self, operation: &str) -> Option<&SanitizerPattern> {
        self.patterns
            .iter()
            .find(|pattern| pattern.matches(operation))
    }

    pub fn category_of(&self, operation: &str) -> Option<SanitizerCategory> {
        self.pattern_for(operation).map(|pattern| pattern.category)
    }

    /// Whether any pattern of `category` matches, regardless of precedence.
    pub fn matches_category(&self, operation: &str, category: SanitizerCategory) -> bool {
        self.patterns_for_category(category)
            .any(|pattern| pattern.matches(operation))
    }

    pub fn patterns(&self) -> &[SanitizerPattern] {
        &self.patterns
    }

    pub fn patterns_for_category(
        &self,
        category: SanitizerCategory,
    ) -> impl Iterator<Item = &SanitizerPattern> {
        self.patterns
            .iter()
            .filter(move |pattern| pattern.category == category)
    }
}
