//! Core types for representing dialect grammar rules.
//!
//! A rule is either a terminal, matched directly against the input with a
//! regular expression, or a non-terminal, an ordered choice between sequences
//! of quantified references to other rules.

use std::fmt;

use crate::tree::PartRef;

/// Inspects the capture groups of a terminal match and accepts or rejects it.
///
/// Index 0 holds the full match. Groups that did not participate are empty
/// strings. Returning `Err(None)` rejects without a diagnostic message.
pub type Validator = Box<dyn Fn(&[&str]) -> Result<(), Option<String>>>;

/// Maps the capture groups of a terminal match to the value stored on its part.
pub type Formatter = Box<dyn Fn(&[&str]) -> String>;

/// Semantic action run when a non-terminal matches. Returning `false` vetoes
/// the match.
///
/// Changes a handler makes to the model are kept even when an enclosing rule
/// later fails and the matched part is discarded by backtracking. Handlers on
/// rules that can be abandoned this way should tolerate being run for matches
/// that never reach the final tree, or be idempotent.
pub type Handler<M> = Box<dyn Fn(PartRef<'_>, &mut M) -> bool>;

/// A named grammar production.
pub struct Rule<M> {
    /// Unique key of the rule within its grammar.
    pub name: String,

    /// Free-form human description.
    pub description: String,

    /// Whether matches are consumed but left out of the parent's children.
    pub ignore: bool,

    /// Terminal or non-terminal body.
    pub kind: RuleKind<M>,
}

/// The two mutually exclusive shapes of a [`Rule`].
pub enum RuleKind<M> {
    /// Matched against the input by a regular expression.
    Terminal(Terminal),

    /// Composed of other rules via ordered alternative sequences.
    NonTerminal(NonTerminal<M>),
}

/// Body of a terminal rule.
pub struct Terminal {
    /// Regular expression source, anchored at the cursor when matched.
    pub pattern: String,

    /// Optional hook that can reject a syntactically valid match.
    pub validator: Option<Validator>,

    /// Optional hook computing the stored value; defaults to the full match.
    pub formatter: Option<Formatter>,
}

/// Body of a non-terminal rule.
pub struct NonTerminal<M> {
    /// Alternative sequences, tried in declaration order.
    pub alternatives: Vec<Vec<Constituent>>,

    /// Optional semantic action run after a structural match.
    pub handler: Option<Handler<M>>,
}

/// A quantified reference to another rule inside a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constituent {
    /// Name of the referenced rule.
    pub rule: String,

    /// How many times the referenced rule may match.
    pub quantifier: Quantifier,
}

/// PEG repetition operators applied to a [`Constituent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// Exactly one match, no suffix.
    One,
    /// Zero or one match, `?` suffix.
    Optional,
    /// Any number of matches, `*` suffix.
    ZeroOrMore,
    /// At least one match, `+` suffix.
    OneOrMore,
}

impl Quantifier {
    /// Returns the suffix character used for this quantifier in grammar text.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Quantifier::One => "",
            Quantifier::Optional => "?",
            Quantifier::ZeroOrMore => "*",
            Quantifier::OneOrMore => "+",
        }
    }
}

impl Constituent {
    /// Parses the textual form `name`, `name?`, `name*` or `name+`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let (rule, quantifier) = match text.as_bytes().last() {
            Some(b'?') => (&text[..text.len() - 1], Quantifier::Optional),
            Some(b'*') => (&text[..text.len() - 1], Quantifier::ZeroOrMore),
            Some(b'+') => (&text[..text.len() - 1], Quantifier::OneOrMore),
            _ => (text, Quantifier::One),
        };
        Self {
            rule: rule.to_string(),
            quantifier,
        }
    }
}

impl fmt::Display for Constituent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rule, self.quantifier.suffix())
    }
}

impl<M> Rule<M> {
    /// Creates a terminal rule matching `pattern` at the cursor.
    pub fn terminal(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            ignore: false,
            kind: RuleKind::Terminal(Terminal {
                pattern: pattern.into(),
                validator: None,
                formatter: None,
            }),
        }
    }

    /// Creates a non-terminal rule from alternative sequences of constituent
    /// strings such as `["key", "ws?", "value+"]`.
    pub fn non_terminal<A, S>(name: impl Into<String>, alternatives: A) -> Self
    where
        A: IntoIterator<Item = S>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let alternatives = alternatives
            .into_iter()
            .map(|sequence| {
                sequence
                    .into_iter()
                    .map(|c| Constituent::parse(c.as_ref()))
                    .collect()
            })
            .collect();
        Self {
            name: name.into(),
            description: String::new(),
            ignore: false,
            kind: RuleKind::NonTerminal(NonTerminal {
                alternatives,
                handler: None,
            }),
        }
    }

    /// Marks the rule so its matches are excluded from parent children.
    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Sets the human description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attaches a validator. Has no effect on non-terminals.
    #[must_use]
    pub fn validate<F>(mut self, validator: F) -> Self
    where
        F: Fn(&[&str]) -> Result<(), Option<String>> + 'static,
    {
        match &mut self.kind {
            RuleKind::Terminal(terminal) => terminal.validator = Some(Box::new(validator)),
            RuleKind::NonTerminal(_) => {
                log::warn!("validator ignored on non-terminal rule '{}'", self.name);
            }
        }
        self
    }

    /// Attaches a formatter. Has no effect on non-terminals.
    #[must_use]
    pub fn format<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&[&str]) -> String + 'static,
    {
        match &mut self.kind {
            RuleKind::Terminal(terminal) => terminal.formatter = Some(Box::new(formatter)),
            RuleKind::NonTerminal(_) => {
                log::warn!("formatter ignored on non-terminal rule '{}'", self.name);
            }
        }
        self
    }

    /// Attaches a semantic action. Has no effect on terminals.
    #[must_use]
    pub fn handle<F>(mut self, handler: F) -> Self
    where
        F: Fn(PartRef<'_>, &mut M) -> bool + 'static,
    {
        match &mut self.kind {
            RuleKind::NonTerminal(non_terminal) => non_terminal.handler = Some(Box::new(handler)),
            RuleKind::Terminal(_) => {
                log::warn!("handler ignored on terminal rule '{}'", self.name);
            }
        }
        self
    }

    /// Returns `true` if this rule is matched by a regular expression.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, RuleKind::Terminal(_))
    }

    /// Iterates over every constituent referenced by this rule.
    pub fn constituents(&self) -> impl Iterator<Item = &Constituent> {
        let alternatives: &[Vec<Constituent>] = match &self.kind {
            RuleKind::NonTerminal(non_terminal) => &non_terminal.alternatives,
            RuleKind::Terminal(_) => &[],
        };
        alternatives.iter().flatten()
    }
}

impl<M> fmt::Debug for Rule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Rule");
        out.field("name", &self.name).field("ignore", &self.ignore);
        match &self.kind {
            RuleKind::Terminal(terminal) => out
                .field("pattern", &terminal.pattern)
                .field("validator", &terminal.validator.is_some())
                .field("formatter", &terminal.formatter.is_some()),
            RuleKind::NonTerminal(non_terminal) => out
                .field("alternatives", &non_terminal.alternatives)
                .field("handler", &non_terminal.handler.is_some()),
        };
        out.finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantifiers() {
        assert_eq!(Constituent::parse("ws").quantifier, Quantifier::One);
        assert_eq!(Constituent::parse("ws?").quantifier, Quantifier::Optional);
        assert_eq!(Constituent::parse("ws*").quantifier, Quantifier::ZeroOrMore);
        let plus = Constituent::parse("NUMBER+");
        assert_eq!(plus.rule, "NUMBER");
        assert_eq!(plus.quantifier, Quantifier::OneOrMore);
        assert_eq!(plus.to_string(), "NUMBER+");
    }

    #[test]
    fn test_non_terminal_constituents() {
        let rule: Rule<()> = Rule::non_terminal("pair", [vec!["key", "ws?", "value"], vec!["key"]]);
        let names: Vec<_> = rule.constituents().map(|c| c.rule.as_str()).collect();
        assert_eq!(names, ["key", "ws", "value", "key"]);
        assert!(!rule.is_terminal());
    }

    #[test]
    fn test_callbacks_attach_by_kind() {
        let rule: Rule<()> = Rule::terminal("NUMBER", "[0-9]+")
            .validate(|_| Ok(()))
            .handle(|_, _| true);
        match rule.kind {
            RuleKind::Terminal(terminal) => {
                assert!(terminal.validator.is_some());
                assert!(terminal.formatter.is_none());
            }
            RuleKind::NonTerminal(_) => panic!("expected terminal"),
        }
    }
}
