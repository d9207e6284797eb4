//! Operation classification
//!
//! Operation labels overlap (`imprecise:concat` is both a string operation and
//! an imprecise one), so classification runs an ordered rule list and the
//! first matching rule decides the category.

pub mod sanitizers;
pub mod sinks;

pub use sanitizers::{
    SanitizerCategory, SanitizerPattern, SanitizersRegistry, operation_matches,
    operation_matches_any,
};
pub use sinks::{
    SinkKind, SinkMarker, SinkTier, SinkTierRegistry, default_sink_markers, find_sink_marker,
};

/// Reduction target of a string-construction operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringOpKind {
    /// Joins every operand.
    Concat,
    /// Derives a string from its first operand (replace, slice, split).
    Base,
}

impl StringOpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StringOpKind::Concat => "concat",
            StringOpKind::Base => "base",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    /// Attacker-controlled value.
    Input,
    Constant,
}

impl LiteralKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiteralKind::Input => "input",
            LiteralKind::Constant => "constant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationCategory {
    StringOp(StringOpKind),
    Literal(LiteralKind),
    Sink(SinkKind),
    Call,
    Imprecise,
    /// `object.GetField` and friends; the tree builder follows the tainted side.
    FieldAccess,
    Unary,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelPredicate {
    Contains(String),
    Equals(String),
}

impl LabelPredicate {
    pub fn contains(pattern: &str) -> Self {
        LabelPredicate::Contains(pattern.to_string())
    }

    pub fn equals(pattern: &str) -> Self {
        LabelPredicate::Equals(pattern.to_string())
    }

    pub fn test(&self, operation: &str) -> bool {
        match self {
            LabelPredicate::Contains(pattern) => operation.contains(pattern.as_str()),
            LabelPredicate::Equals(pattern) => operation == pattern,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierRule {
    pub predicate: LabelPredicate,
    pub category: OperationCategory,
}

#[derive(Debug, Clone)]
pub struct OperationClassifier {
    rules: Vec<ClassifierRule>,
}

impl Default for OperationClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl OperationClassifier {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_defaults() -> Self {
        let mut classifier = Self::new();
        classifier.register_string_ops();
        classifier.register_literals();
        classifier.register_sinks();
        classifier.register(LabelPredicate::contains("call"), OperationCategory::Call);
        classifier.register(
            LabelPredicate::contains("imprecise"),
            OperationCategory::Imprecise,
        );
        classifier.register_other_subcases();
        classifier
    }

    fn register_string_ops(&mut self) {
        let string_ops = [
            ("precise:string.concat", StringOpKind::Concat),
            ("imprecise:concat", StringOpKind::Concat),
            ("+", StringOpKind::Concat),
            ("imprecise:join", StringOpKind::Concat),
            ("model:array.join", StringOpKind::Concat),
            ("precise:string.replace", StringOpKind::Base),
            ("precise:string.slice", StringOpKind::Base),
            ("model:string.split", StringOpKind::Base),
        ];
        for (pattern, kind) in string_ops {
            self.register(
                LabelPredicate::contains(pattern),
                OperationCategory::StringOp(kind),
            );
        }
    }

    fn register_literals(&mut self) {
        self.register(
            LabelPredicate::equals("Tainted"),
            OperationCategory::Literal(LiteralKind::Input),
        );
        self.register(
            LabelPredicate::equals("Untainted"),
            OperationCategory::Literal(LiteralKind::Constant),
        );
    }

    fn register_sinks(&mut self) {
        for marker in default_sink_markers() {
            self.register(
                LabelPredicate::Equals(marker.operation),
                OperationCategory::Sink(marker.kind),
            );
        }
    }

    fn register_other_subcases(&mut self) {
        for field_access in [
            "object.GetField",
            "object.putField",
            "string.GetField",
            "string.putField",
        ] {
            self.register(
                LabelPredicate::equals(field_access),
                OperationCategory::FieldAccess,
            );
        }
        self.register(LabelPredicate::equals("object.Unary"), OperationCategory::Unary);
    }

    pub fn register(&mut self, predicate: LabelPredicate, category: OperationCategory) {
        self.rules.push(ClassifierRule {
            predicate,
            category,
        });
    }

    pub fn classify(&self, operation: &str) -> OperationCategory {
        self.rules
            .iter()
            .find(|rule| rule.predicate.test(operation))
            .map(|rule| rule.category)
            .unwrap_or(OperationCategory::Other)
    }

    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(operation: &str) -> OperationCategory {
        OperationClassifier::with_defaults().classify(operation)
    }

    #[test]
    fn string_op_wins_over_imprecise() {
        assert_eq!(
            classify("imprecise:concat"),
            OperationCategory::StringOp(StringOpKind::Concat)
        );
        assert_eq!(
            classify("imprecise:join"),
            OperationCategory::StringOp(StringOpKind::Concat)
        );
    }

    #[test]
    fn plus_anywhere_in_label_is_concat() {
        assert_eq!(
            classify("precise:+"),
            OperationCategory::StringOp(StringOpKind::Concat)
        );
    }

    #[test]
    fn replace_slice_split_reduce_to_base() {
        for label in [
            "precise:string.replace",
            "precise:string.slice",
            "model:string.split",
        ] {
            assert_eq!(
                classify(label),
                OperationCategory::StringOp(StringOpKind::Base),
                "{label}"
            );
        }
    }

    #[test]
    fn first_declared_string_pattern_decides_target() {
        // Contains both "+" (concat) and "precise:string.replace" (base).
        assert_eq!(
            classify("precise:string.replace+"),
            OperationCategory::StringOp(StringOpKind::Concat)
        );
    }

    #[test]
    fn literal_markers_are_exact() {
        assert_eq!(
            classify("Tainted"),
            OperationCategory::Literal(LiteralKind::Input)
        );
        assert_eq!(
            classify("Untainted"),
            OperationCategory::Literal(LiteralKind::Constant)
        );
        assert_eq!(classify("Tainted value"), OperationCategory::Other);
    }

    #[test]
    fn sink_markers_are_exact() {
        assert_eq!(classify("call:eval"), OperationCategory::Sink(SinkKind::Eval));
        assert_eq!(
            classify("call:Function"),
            OperationCategory::Sink(SinkKind::Eval)
        );
        assert_eq!(classify("call:exec"), OperationCategory::Sink(SinkKind::Exec));
        assert_eq!(
            classify("call:execSync"),
            OperationCategory::Sink(SinkKind::Exec)
        );
    }

    #[test]
    fn other_calls_are_transparent_calls() {
        assert_eq!(classify("call:evaluate"), OperationCategory::Call);
        assert_eq!(classify("call:toString"), OperationCategory::Call);
    }

    #[test]
    fn imprecise_without_string_pattern() {
        assert_eq!(classify("imprecise:assign"), OperationCategory::Imprecise);
    }

    #[test]
    fn field_access_and_unary_subcases() {
        assert_eq!(classify("object.GetField"), OperationCategory::FieldAccess);
        assert_eq!(classify("string.putField"), OperationCategory::FieldAccess);
        assert_eq!(classify("object.Unary"), OperationCategory::Unary);
    }

    #[test]
    fn unknown_label_is_other() {
        assert_eq!(classify("object.Binary"), OperationCategory::Other);
        assert_eq!(classify("set_taint"), OperationCategory::Other);
    }

    #[test]
    fn rules_are_kept_in_precedence_order() {
        let classifier = OperationClassifier::with_defaults();
        let first = &classifier.rules()[0];
        assert_eq!(
            first.category,
            OperationCategory::StringOp(StringOpKind::Concat)
        );
        assert!(OperationClassifier::new().rules().is_empty());
    }
}
