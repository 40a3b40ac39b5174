//! Validation routines for dialect grammars.
//!
//! This module performs structural checks over a [`Grammar`] before any input
//! is matched: the root and every referenced rule must exist, non-terminals
//! must have non-empty alternatives, and terminal patterns must compile. Rules
//! that cannot be reached from the root are reported as warnings only.

use std::collections::HashSet;

use crate::engine::anchored;
use crate::grammar::{Grammar, GrammarError, Rule, RuleKind};

/// Performs structural validation of a [`Grammar`].
///
/// This function runs several consistency passes over the grammar:
///
/// - Rejects rule names registered more than once.
/// - Checks that the root rule is defined.
/// - Checks the shape of every rule and that its patterns compile.
/// - Checks that all referenced rules are defined.
/// - Warns about unreachable rules.
///
/// # Errors
///
/// Returns the first [`GrammarError`] detected.
pub fn validate<M>(grammar: &Grammar<M>) -> Result<(), GrammarError> {
    if let Some(rule) = grammar.duplicates().first() {
        return Err(GrammarError::DuplicateRule { rule: rule.clone() });
    }

    if grammar.get(&grammar.root).is_none() {
        return Err(GrammarError::UndefinedRoot {
            root: grammar.root.clone(),
        });
    }

    for rule in sorted(grammar) {
        check_shape(rule)?;
    }

    check_undefined_rules(grammar)?;

    check_unreachable_rules(grammar);

    Ok(())
}

/// Rules in name order, so the reported error does not depend on hashing.
fn sorted<M>(grammar: &Grammar<M>) -> Vec<&Rule<M>> {
    let mut rules: Vec<_> = grammar.rules().collect();
    rules.sort_by(|a, b| a.name.cmp(&b.name));
    rules
}

fn check_shape<M>(rule: &Rule<M>) -> Result<(), GrammarError> {
    match &rule.kind {
        RuleKind::Terminal(terminal) => {
            anchored(&rule.name, &terminal.pattern)?;
        }

        RuleKind::NonTerminal(non_terminal) => {
            if non_terminal.alternatives.is_empty() {
                return Err(GrammarError::EmptyRule {
                    rule: rule.name.clone(),
                });
            }
            for (index, sequence) in non_terminal.alternatives.iter().enumerate() {
                if sequence.is_empty() {
                    return Err(GrammarError::EmptySequence {
                        rule: rule.name.clone(),
                        index,
                    });
                }
            }
        }
    }
    Ok(())
}

fn check_undefined_rules<M>(grammar: &Grammar<M>) -> Result<(), GrammarError> {
    for rule in sorted(grammar) {
        for constituent in rule.constituents() {
            if grammar.get(&constituent.rule).is_none() {
                return Err(GrammarError::UndefinedRule {
                    rule: constituent.rule.clone(),
                    referenced_by: rule.name.clone(),
                });
            }
        }
    }

    Ok(())
}

fn check_unreachable_rules<M>(grammar: &Grammar<M>) {
    let mut reachable = HashSet::new();
    let mut to_visit = vec![grammar.root.as_str()];

    while let Some(rule_name) = to_visit.pop() {
        if !reachable.insert(rule_name) {
            continue; // Already visited
        }

        if let Some(rule) = grammar.get(rule_name) {
            to_visit.extend(rule.constituents().map(|c| c.rule.as_str()));
        }
    }

    for rule in sorted(grammar) {
        if !reachable.contains(rule.name.as_str()) {
            log::warn!("unreachable rule '{}' in grammar '{}'", rule.name, grammar.title);
        }
    }
}
