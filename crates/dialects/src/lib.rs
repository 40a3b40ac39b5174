//! A PEG engine for building domain-specific language parsers.
//!
//! A dialect describes its language as a map of named rules: terminals
//! matched by regular expressions, and non-terminals that are ordered choices
//! between sequences of quantified references to other rules. Semantic-action
//! handlers attached to rules accumulate results into a caller-defined model
//! while parsing, and the dialect finally renders that model to text.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]

/// The cursor shared by every matching call of one parse.
pub mod cursor;

/// The recursive matching engine: ordered choice, quantified sequences and
/// anchored terminal matching with backtracking.
mod engine;

/// Error types for fatal parse outcomes.
pub mod error;

/// Core structures describing a dialect's grammar.
///
/// Everything the engine knows about a language lives here: rules, their
/// constituents and quantifiers, and the callbacks attached to them.
pub mod grammar;

/// Line and column resolution for diagnostics.
pub mod location;

/// Per-parse configuration.
pub mod options;

/// The driver and the [`Dialect`] plugin contract.
pub mod parser;

/// Diagnostic trace of rule attempts.
pub mod trace;

/// The arena-backed parse tree.
pub mod tree;

/// Grammar validation and consistency checking.
///
/// Validation protects the engine from malformed grammars by enforcing the
/// invariants it relies on before any input is matched.
pub mod validate;

pub use error::{ParseError, RenderError, Result};
pub use grammar::{parse_grammar, Constituent, Grammar, GrammarError, Quantifier, Rule};
pub use location::Location;
pub use options::ParseOptions;
pub use parser::{parse, Dialect, ParseOutcome, Parsed, Parser};
pub use trace::{Trace, TraceEvent};
pub use tree::{ParseTree, Part, PartId, PartNode, PartRef};
pub use validate::validate;
