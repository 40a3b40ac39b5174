//! The driver: the entry point embedding applications call.
//!
//! A [`Dialect`] supplies a grammar, a fresh model and a render step. The
//! driver validates the grammar, matches the root rule against the input with
//! a fresh matching state and, on success, hands the populated
//! model to the dialect's renderer.

use crate::engine::Matcher;
use crate::error::{ParseError, RenderError, Result};
use crate::grammar::Grammar;
use crate::location::Location;
use crate::options::ParseOptions;
use crate::trace::Trace;
use crate::tree::ParseTree;
use crate::validate::validate;

/// Contract implemented by each domain-specific language definition.
pub trait Dialect {
    /// Accumulator populated by the grammar's handlers while parsing.
    type Model;

    /// Returns the grammar of the language.
    fn grammar(&self) -> Grammar<Self::Model>;

    /// Returns a fresh, empty model for one parse.
    fn model(&self) -> Self::Model;

    /// Converts the finished model into the dialect's textual output.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] if the model cannot be rendered.
    fn render(&self, model: Self::Model) -> std::result::Result<String, RenderError>;
}

/// Result of a successful [`Parser::parse`].
#[derive(Debug, Clone)]
pub struct Parsed {
    /// Text produced by the dialect's render step.
    pub output: String,

    /// The parse tree rooted at the root rule.
    pub tree: ParseTree,

    /// Diagnostic trace of rule attempts.
    pub trace: Trace,
}

/// Result of a successful [`Parser::parse_model`].
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// The parse tree rooted at the root rule.
    pub tree: ParseTree,

    /// Diagnostic trace of rule attempts.
    pub trace: Trace,

    /// Byte offset just past the input the root consumed.
    pub consumed: usize,
}

/// Runs dialect grammars over input text.
///
/// A `Parser` only carries [`ParseOptions`]; every call builds its own
/// cursor, pattern cache and tree, so one parser can be reused freely.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    /// Creates a parser with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with the given options.
    #[must_use]
    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    /// The options in effect.
    #[must_use]
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parses `input` with `dialect` and renders the resulting model.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Grammar`] if the dialect's grammar is malformed.
    /// - [`ParseError::RootNotFound`] if the root rule does not match.
    /// - [`ParseError::RecursionLimit`] if rule nesting exceeds the limit.
    /// - [`ParseError::TrailingInput`] if a full match is required but input
    ///   remains.
    /// - [`ParseError::Render`] if the dialect's render step fails.
    pub fn parse<D: Dialect>(&self, dialect: &D, input: &str) -> Result<Parsed> {
        let grammar = dialect.grammar();
        let mut model = dialect.model();
        let ParseOutcome { tree, trace, .. } = self.parse_model(&grammar, &mut model, input)?;
        let output = dialect.render(model)?;
        Ok(Parsed {
            output,
            tree,
            trace,
        })
    }

    /// Validates `grammar` and matches its root rule against `input`,
    /// running handlers against `model`. No render step is involved.
    ///
    /// # Errors
    ///
    /// Same as [`Parser::parse`], except for render failures.
    pub fn parse_model<M>(
        &self,
        grammar: &Grammar<M>,
        model: &mut M,
        input: &str,
    ) -> Result<ParseOutcome> {
        validate(grammar)?;

        let mut matcher = Matcher::new(
            grammar,
            input,
            self.options.max_depth,
            self.options.trace,
        );
        let Some(root) = matcher.match_one(&grammar.root, model)? else {
            return Err(ParseError::RootNotFound {
                title: grammar.title.clone(),
                root: grammar.root.clone(),
                furthest: Location::resolve(input, matcher.furthest()),
            });
        };

        let consumed = matcher.cursor().offset();
        if self.options.require_full_match && consumed < input.len() {
            return Err(ParseError::TrailingInput {
                root: grammar.root.clone(),
                location: Location::resolve(input, consumed),
            });
        }

        matcher.set_root(root);
        let (tree, trace) = matcher.into_parts();
        log::debug!(
            "parsed {} bytes of {} input with root '{}'",
            consumed,
            grammar.title,
            grammar.root
        );
        Ok(ParseOutcome {
            tree,
            trace,
            consumed,
        })
    }
}

/// Parses `input` with `dialect` using default options.
///
/// # Errors
///
/// See [`Parser::parse`].
pub fn parse<D: Dialect>(dialect: &D, input: &str) -> Result<Parsed> {
    Parser::new().parse(dialect, input)
}
