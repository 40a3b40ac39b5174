//! The grammar model of a dialect.
//!
//! A [`Grammar`] is an immutable description of a language: a map of named
//! [`Rule`]s, the name of the root rule, and descriptive metadata. It is pure
//! data apart from the callbacks attached to individual rules, which receive
//! the model type `M` the dialect builds while parsing.
//!
//! Grammars are usually written in Rust with the builder methods below. The
//! structural part can alternatively be loaded from JSON via [`spec`], with
//! callbacks attached afterwards by rule name.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::tree::PartRef;

pub mod rules;
pub mod spec;

pub use rules::{
    Constituent, Formatter, Handler, NonTerminal, Quantifier, Rule, RuleKind, Terminal, Validator,
};
pub use spec::{parse_grammar, GrammarSpec, RuleSpec};

/// A complete dialect grammar over the model type `M`.
pub struct Grammar<M> {
    /// Short human-readable name of the dialect.
    pub title: String,

    /// Longer description of what the dialect expresses.
    pub description: String,

    /// Named example inputs, useful for documentation and smoke tests.
    pub examples: BTreeMap<String, String>,

    /// Version number of the dialect definition.
    pub version: f64,

    /// Name of the rule every parse starts from.
    pub root: String,

    rules: HashMap<String, Rule<M>>,
    duplicates: Vec<String>,
}

/// Possible errors raised while building or validating a grammar.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// The input JSON was syntactically invalid or structurally mismatched.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// The declared root rule does not exist.
    #[error("root rule '{root}' is not defined")]
    UndefinedRoot {
        /// Name of the missing root rule.
        root: String,
    },

    /// A constituent refers to a rule that does not exist.
    #[error("undefined rule '{rule}' referenced in rule '{referenced_by}'")]
    UndefinedRule {
        /// Name of the missing rule.
        rule: String,
        /// Rule whose sequence holds the dangling reference.
        referenced_by: String,
    },

    /// A callback was attached by name to a rule that does not exist.
    #[error("cannot attach {callback} to unknown rule '{rule}'")]
    UnknownCallbackTarget {
        /// Name that did not resolve.
        rule: String,
        /// Kind of callback being attached.
        callback: &'static str,
    },

    /// A callback was attached to a rule of the wrong kind.
    #[error("cannot attach {callback} to {kind} rule '{rule}'")]
    CallbackKindMismatch {
        /// Target rule.
        rule: String,
        /// Kind of callback being attached.
        callback: &'static str,
        /// Kind of the target rule.
        kind: &'static str,
    },

    /// Two rules were registered under the same name.
    #[error("rule '{rule}' is defined more than once")]
    DuplicateRule {
        /// The repeated name.
        rule: String,
    },

    /// A non-terminal has no alternatives.
    #[error("rule '{rule}' has no alternative sequences")]
    EmptyRule {
        /// Offending rule.
        rule: String,
    },

    /// A non-terminal alternative has no constituents.
    #[error("alternative {index} of rule '{rule}' is empty")]
    EmptySequence {
        /// Offending rule.
        rule: String,
        /// Zero-based position of the alternative.
        index: usize,
    },

    /// A rule spec declares both or neither of `sequences` and `regex`.
    #[error("rule '{rule}' must define exactly one of sequences or regex")]
    AmbiguousRule {
        /// Offending rule.
        rule: String,
    },

    /// A terminal pattern is empty or not a valid regular expression.
    #[error("invalid pattern for terminal '{rule}': {message}")]
    InvalidPattern {
        /// Offending rule.
        rule: String,
        /// Reason reported by the regex compiler.
        message: String,
    },
}

impl<M> Grammar<M> {
    /// Creates an empty grammar with the given title and root rule name.
    pub fn new(title: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            examples: BTreeMap::new(),
            version: 0.0,
            root: root.into(),
            rules: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a named example input.
    #[must_use]
    pub fn example(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.examples.insert(name.into(), text.into());
        self
    }

    /// Sets the version number.
    #[must_use]
    pub fn version(mut self, version: f64) -> Self {
        self.version = version;
        self
    }

    /// Adds a rule. A second rule with the same name replaces the first and
    /// is reported when the grammar is validated.
    #[must_use]
    pub fn rule(mut self, rule: Rule<M>) -> Self {
        self.insert(rule);
        self
    }

    pub(crate) fn insert(&mut self, rule: Rule<M>) {
        if let Some(previous) = self.rules.insert(rule.name.clone(), rule) {
            self.duplicates.push(previous.name);
        }
    }

    /// Looks up a rule by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule<M>> {
        self.rules.get(name)
    }

    /// Iterates over all rules in unspecified order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule<M>> {
        self.rules.values()
    }

    /// Number of rules in the grammar.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the grammar has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    /// Attaches a semantic action to an existing non-terminal.
    ///
    /// # Errors
    ///
    /// Fails if the rule does not exist or is a terminal.
    pub fn on_match<F>(&mut self, rule: &str, handler: F) -> Result<&mut Self, GrammarError>
    where
        F: Fn(PartRef<'_>, &mut M) -> bool + 'static,
    {
        match &mut self.target(rule, "handler")?.kind {
            RuleKind::NonTerminal(non_terminal) => non_terminal.handler = Some(Box::new(handler)),
            RuleKind::Terminal(_) => return Err(mismatch(rule, "handler", "terminal")),
        }
        Ok(self)
    }

    /// Attaches a validator to an existing terminal.
    ///
    /// # Errors
    ///
    /// Fails if the rule does not exist or is a non-terminal.
    pub fn validate_with<F>(&mut self, rule: &str, validator: F) -> Result<&mut Self, GrammarError>
    where
        F: Fn(&[&str]) -> Result<(), Option<String>> + 'static,
    {
        match &mut self.target(rule, "validator")?.kind {
            RuleKind::Terminal(terminal) => terminal.validator = Some(Box::new(validator)),
            RuleKind::NonTerminal(_) => return Err(mismatch(rule, "validator", "non-terminal")),
        }
        Ok(self)
    }

    /// Attaches a formatter to an existing terminal.
    ///
    /// # Errors
    ///
    /// Fails if the rule does not exist or is a non-terminal.
    pub fn format_with<F>(&mut self, rule: &str, formatter: F) -> Result<&mut Self, GrammarError>
    where
        F: Fn(&[&str]) -> String + 'static,
    {
        match &mut self.target(rule, "formatter")?.kind {
            RuleKind::Terminal(terminal) => terminal.formatter = Some(Box::new(formatter)),
            RuleKind::NonTerminal(_) => return Err(mismatch(rule, "formatter", "non-terminal")),
        }
        Ok(self)
    }

    fn target(&mut self, rule: &str, callback: &'static str) -> Result<&mut Rule<M>, GrammarError> {
        self.rules
            .get_mut(rule)
            .ok_or_else(|| GrammarError::UnknownCallbackTarget {
                rule: rule.to_string(),
                callback,
            })
    }
}

fn mismatch(rule: &str, callback: &'static str, kind: &'static str) -> GrammarError {
    GrammarError::CallbackKindMismatch {
        rule: rule.to_string(),
        callback,
        kind,
    }
}

impl<M> std::fmt::Debug for Grammar<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("title", &self.title)
            .field("root", &self.root)
            .field("version", &self.version)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}
