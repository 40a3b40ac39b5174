//! Declarative grammar documents.
//!
//! The structure of a grammar can be written as JSON and deserialized with
//! [`facet_json`]. Callbacks cannot be expressed in JSON, so they are attached
//! after conversion with [`Grammar::on_match`], [`Grammar::validate_with`] and
//! [`Grammar::format_with`].
//!
//! ```json
//! {
//!   "title": "Numbers",
//!   "root": "list",
//!   "rules": {
//!     "list":   { "sequences": [["NUMBER+"]] },
//!     "NUMBER": { "regex": "[0-9]+" },
//!     "ws":     { "regex": "\\s+", "ignore": true }
//!   }
//! }
//! ```

use facet::Facet;
use std::collections::HashMap;

use super::{Grammar, GrammarError, Rule};

/// Serialized form of a [`Grammar`] without callbacks.
#[derive(Debug, Clone, Facet)]
pub struct GrammarSpec {
    /// Short human-readable name of the dialect.
    pub title: String,

    /// Longer description of the dialect.
    #[facet(default)]
    pub description: String,

    /// Named example inputs.
    #[facet(default)]
    pub examples: HashMap<String, String>,

    /// Version number of the dialect definition.
    #[facet(default)]
    pub version: f64,

    /// Name of the root rule.
    pub root: String,

    /// Rule bodies keyed by rule name.
    pub rules: HashMap<String, RuleSpec>,
}

/// Serialized form of a single [`Rule`].
///
/// Exactly one of `sequences` and `regex` must be present.
#[derive(Debug, Clone, Facet)]
pub struct RuleSpec {
    /// Free-form human description.
    #[facet(default)]
    pub description: String,

    /// Whether matches are excluded from parent children.
    #[facet(default)]
    pub ignore: bool,

    /// Alternative sequences of constituent strings, for non-terminals.
    #[facet(default)]
    pub sequences: Vec<Vec<String>>,

    /// Regular expression, for terminals.
    #[facet(default)]
    pub regex: Option<String>,
}

/// Parse a JSON grammar document into a [`GrammarSpec`].
///
/// # Errors
///
/// Returns [`GrammarError::JsonParse`] if the provided string is not valid JSON
/// or fails schema deserialization.
pub fn parse_grammar(json: &str) -> Result<GrammarSpec, GrammarError> {
    facet_json::from_str(json).map_err(|e| GrammarError::JsonParse(e.to_string()))
}

impl GrammarSpec {
    /// Converts the document into a [`Grammar`] over the model type `M`.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::AmbiguousRule`] when a rule defines both or
    /// neither of `sequences` and `regex`.
    pub fn into_grammar<M>(self) -> Result<Grammar<M>, GrammarError> {
        let mut grammar = Grammar::new(self.title, self.root)
            .describe(self.description)
            .version(self.version);
        grammar.examples.extend(self.examples);

        for (name, spec) in self.rules {
            let rule = match (spec.sequences.is_empty(), spec.regex) {
                (true, Some(regex)) => Rule::terminal(name, regex),
                (false, None) => Rule::non_terminal(name, spec.sequences),
                _ => return Err(GrammarError::AmbiguousRule { rule: name }),
            };
            let rule = rule.describe(spec.description);
            grammar.insert(if spec.ignore { rule.ignored() } else { rule });
        }

        Ok(grammar)
    }
}
