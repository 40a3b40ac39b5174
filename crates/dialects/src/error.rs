//! Error types for parsing with a dialect.
//!
//! Only fatal conditions are errors. A validator or handler rejecting a match
//! is ordinary backtracking and shows up in the [`Trace`](crate::Trace)
//! instead.

use thiserror::Error;

use crate::grammar::GrammarError;
use crate::location::Location;

/// Result type alias using [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;

/// Boxed error a render step may wrap.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal outcome of a parse.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The root rule did not match at offset 0.
    #[error("unable to find root part ({root}) of {title}; furthest match reached {furthest}")]
    RootNotFound {
        /// Title of the grammar.
        title: String,
        /// Name of the root rule.
        root: String,
        /// Furthest position any terminal matched up to.
        furthest: Location,
    },

    /// Rule nesting exceeded the configured limit, typically because of left
    /// recursion.
    #[error("recursion limit of {limit} exceeded while matching '{rule}' at {location}")]
    RecursionLimit {
        /// Rule that would have exceeded the limit.
        rule: String,
        /// Configured maximum depth.
        limit: usize,
        /// Cursor position at the time.
        location: Location,
    },

    /// The root matched but input was left over and a full match was required.
    #[error("root part ({root}) matched but input remains at {location}")]
    TrailingInput {
        /// Name of the root rule.
        root: String,
        /// Where unconsumed input begins.
        location: Location,
    },

    /// The grammar violates a structural invariant.
    #[error("invalid grammar: {0}")]
    Grammar(#[from] GrammarError),

    /// The dialect failed to render its model.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Failure reported by a dialect's render step. Displayed verbatim.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RenderError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl RenderError {
    /// Creates a render error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a render error wrapping an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The message given by the dialect.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_root_not_found_message() {
        let err = ParseError::RootNotFound {
            title: "Numbers".into(),
            root: "list".into(),
            furthest: Location::resolve("12,34", 2),
        };
        assert_eq!(
            err.to_string(),
            "unable to find root part (list) of Numbers; furthest match reached line 1, column 3"
        );
    }

    #[test]
    fn test_render_error_is_verbatim() {
        let cause = std::fmt::Error;
        let err: ParseError = RenderError::with_source("no entries to render", cause).into();
        assert_eq!(err.to_string(), "no entries to render");
        assert!(err.source().is_some());
    }
}
