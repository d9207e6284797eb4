//! Solver query synthesis
//!
//! Turns an operation tree rooted at a sink into an SMT-LIB string-theory
//! query asking whether the attacker inputs can be chosen so that the string
//! reaching the sink contains a known exploit payload.

use std::fmt;

use tracing::debug;

use crate::classify::{LiteralKind, SinkKind};
use crate::error::{Result, TriageError};
use crate::optree::{OperationKind, OperationTreeNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverQuery {
    pub sink: SinkKind,
    /// Number of symbolic inputs, named `input0..inputN`.
    pub input_count: usize,
    pub term: String,
}

impl SolverQuery {
    pub fn input_names(&self) -> impl Iterator<Item = String> {
        (0..self.input_count).map(|index| format!("input{index}"))
    }

    /// Renders declarations, the containment assertion, `check-sat` and `get-model`.
    pub fn to_smtlib(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SolverQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in self.input_names() {
            writeln!(f, "(declare-const {name} String)")?;
        }
        writeln!(
            f,
            "(assert (str.contains {} {}))",
            self.term,
            quote(self.sink.exploit_payload())
        )?;
        f.write_str("(check-sat)\n(get-model)")
    }
}

#[derive(Debug, Default)]
pub struct ConstraintSynthesizer {
    next_input: usize,
}

impl ConstraintSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the query for a tree whose root is an `exec` or `eval` wrapper.
    pub fn synthesize(root: &OperationTreeNode) -> Result<SolverQuery> {
        let sink = match root {
            OperationTreeNode::Operation { kind, .. } => {
                kind.sink().ok_or(TriageError::UnsupportedQuery {
                    kind: kind.as_str(),
                })?
            }
            OperationTreeNode::Literal { kind, .. } => {
                return Err(TriageError::UnsupportedQuery {
                    kind: kind.as_str(),
                });
            }
        };

        let mut synthesizer = Self::new();
        let term = synthesizer.term(root)?;
        debug!(
            sink = sink.as_str(),
            inputs = synthesizer.next_input,
            "synthesized solver query"
        );
        Ok(SolverQuery {
            sink,
            input_count: synthesizer.next_input,
            term,
        })
    }

    /// Emits the string term for `node`, numbering inputs left to right.
    pub fn term(&mut self, node: &OperationTreeNode) -> Result<String> {
        match node {
            OperationTreeNode::Operation { kind, operands } => match kind {
                OperationKind::Concat if operands.is_empty() => Ok(self.fresh_input()),
                OperationKind::Concat => {
                    let terms = operands
                        .iter()
                        .map(|operand| self.term(operand))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(format!("(str.++ {})", terms.join(" ")))
                }
                OperationKind::Base => match operands.first() {
                    Some(base) => self.term(base),
                    None => Err(TriageError::MissingOperand { kind: kind.as_str() }),
                },
                OperationKind::Exec | OperationKind::Eval => match operands.as_slice() {
                    [argument] => self.term(argument),
                    _ => Err(TriageError::MissingOperand { kind: kind.as_str() }),
                },
            },
            OperationTreeNode::Literal { kind, value } => match kind {
                LiteralKind::Input => Ok(self.fresh_input()),
                LiteralKind::Constant => Ok(quote(value)),
            },
        }
    }

    fn fresh_input(&mut self) -> String {
        let name = format!("input{}", self.next_input);
        self.next_input += 1;
        name
    }
}

/// SMT-LIB string literal: embedded double quotes are doubled.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(kind: OperationKind, operands: Vec<OperationTreeNode>) -> OperationTreeNode {
        OperationTreeNode::operation(kind, operands)
    }

    #[test]
    fn concat_keeps_operand_order() {
        let mut synthesizer = ConstraintSynthesizer::new();
        let term = synthesizer
            .term(&op(
                OperationKind::Concat,
                vec![
                    OperationTreeNode::constant("a"),
                    OperationTreeNode::constant("b"),
                ],
            ))
            .unwrap();
        assert_eq!(term, r#"(str.++ "a" "b")"#);
    }

    #[test]
    fn empty_concat_is_one_fresh_input() {
        let mut synthesizer = ConstraintSynthesizer::new();
        let term = synthesizer.term(&op(OperationKind::Concat, vec![])).unwrap();
        assert_eq!(term, "input0");
    }

    #[test]
    fn inputs_are_numbered_left_to_right() {
        let tree = op(
            OperationKind::Eval,
            vec![op(
                OperationKind::Concat,
                vec![
                    OperationTreeNode::input("x"),
                    OperationTreeNode::constant("="),
                    OperationTreeNode::input("y"),
                ],
            )],
        );
        let query = ConstraintSynthesizer::synthesize(&tree).unwrap();
        assert_eq!(query.input_count, 2);
        assert_eq!(query.term, r#"(str.++ input0 "=" input1)"#);
    }

    #[test]
    fn base_uses_first_operand_only() {
        let mut synthesizer = ConstraintSynthesizer::new();
        let term = synthesizer
            .term(&op(
                OperationKind::Base,
                vec![
                    OperationTreeNode::input("s"),
                    OperationTreeNode::constant("ignored"),
                ],
            ))
            .unwrap();
        assert_eq!(term, "input0");
    }

    #[test]
    fn base_without_operand_fails() {
        let mut synthesizer = ConstraintSynthesizer::new();
        let err = synthesizer.term(&op(OperationKind::Base, vec![])).unwrap_err();
        assert_eq!(err, TriageError::MissingOperand { kind: "base" });
    }

    #[test]
    fn exec_query_uses_shell_payload() {
        let tree = op(OperationKind::Exec, vec![OperationTreeNode::input("cmd")]);
        let text = ConstraintSynthesizer::synthesize(&tree).unwrap().to_smtlib();
        assert_eq!(
            text,
            "(declare-const input0 String)\n\
             (assert (str.contains input0 \"$(touch success);#\"))\n\
             (check-sat)\n\
             (get-model)"
        );
        assert!(!text.contains("__proto__"));
    }

    #[test]
    fn eval_query_uses_prototype_pollution_payload() {
        let tree = op(OperationKind::Eval, vec![OperationTreeNode::input("code")]);
        let text = ConstraintSynthesizer::synthesize(&tree).unwrap().to_smtlib();
        assert!(text.contains(r#"(assert (str.contains input0 "__proto__+global.CTF();//"))"#));
        assert!(!text.contains("touch success"));
    }

    #[test]
    fn non_sink_root_is_unsupported() {
        let tree = op(OperationKind::Concat, vec![OperationTreeNode::input("x")]);
        let err = ConstraintSynthesizer::synthesize(&tree).unwrap_err();
        assert_eq!(err, TriageError::UnsupportedQuery { kind: "concat" });

        let err = ConstraintSynthesizer::synthesize(&OperationTreeNode::constant("x")).unwrap_err();
        assert_eq!(err, TriageError::UnsupportedQuery { kind: "constant" });
    }

    #[test]
    fn sink_with_pruned_argument_fails() {
        let tree = op(OperationKind::Exec, vec![]);
        let err = ConstraintSynthesizer::synthesize(&tree).unwrap_err();
        assert_eq!(err, TriageError::MissingOperand { kind: "exec" });
    }

    #[test]
    fn constants_escape_double_quotes() {
        let mut synthesizer = ConstraintSynthesizer::new();
        let term = synthesizer
            .term(&OperationTreeNode::constant(r#"say "hi""#))
            .unwrap();
        assert_eq!(term, r#""say ""hi""""#);
    }

    #[test]
    fn query_without_inputs_declares_nothing() {
        let tree = op(OperationKind::Exec, vec![OperationTreeNode::constant("ls")]);
        let text = ConstraintSynthesizer::synthesize(&tree).unwrap().to_smtlib();
        assert!(text.starts_with("(assert"));
    }

    #[test]
    fn display_writes_declarations_in_input_order() {
        let tree = op(
            OperationKind::Exec,
            vec![op(
                OperationKind::Concat,
                vec![OperationTreeNode::input("a"), OperationTreeNode::input("b")],
            )],
        );
        let query = ConstraintSynthesizer::synthesize(&tree).unwrap();
        let text = format!("{query}");
        assert_eq!(text, query.to_smtlib());
        assert!(text.starts_with(
            "(declare-const input0 String)\n(declare-const input1 String)\n(assert"
        ));
        assert!(text.ends_with("(check-sat)\n(get-model)"));
    }
}
