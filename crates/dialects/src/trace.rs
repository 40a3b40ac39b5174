//! Diagnostic trace of rule attempts.
//!
//! The trace is append-only and purely informational: the engine never reads
//! it back. Its [`Display`](fmt::Display) output is an indented log in which
//! every attempted sequence is followed by either `found` or a `missing`
//! line naming the constituent that stopped it.

use std::fmt;

/// Spaces added per nesting level in the rendered log.
const INDENT: usize = 2;

/// One recorded step of a parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A sequence of constituents is about to be attempted.
    Sequence {
        /// Nesting level.
        depth: usize,
        /// Constituents in grammar notation, comma separated.
        constituents: String,
    },

    /// A required constituent did not match, failing its sequence.
    Missing {
        /// Nesting level.
        depth: usize,
        /// The constituent in grammar notation.
        constituent: String,
        /// Line the cursor was on.
        line: usize,
    },

    /// The sequence at this level matched.
    Found {
        /// Nesting level.
        depth: usize,
    },

    /// A terminal validator rejected a regex match.
    Invalid {
        /// Nesting level.
        depth: usize,
        /// Terminal rule name.
        rule: String,
        /// Line the match started on.
        line: usize,
        /// Reason given by the validator, if any.
        message: Option<String>,
    },

    /// A semantic-action handler vetoed a structural match.
    Vetoed {
        /// Nesting level.
        depth: usize,
        /// Non-terminal rule name.
        rule: String,
        /// Line the match started on.
        line: usize,
    },
}

/// Recorded history of one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    enabled: bool,
    depth: usize,
    events: Vec<TraceEvent>,
}

impl Trace {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Recorded events in order.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub(crate) fn sequence(&mut self, constituents: &[impl fmt::Display]) {
        if self.enabled {
            let constituents = constituents
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            log::trace!("{:width$}{constituents}", "", width = self.depth * INDENT);
            self.events.push(TraceEvent::Sequence {
                depth: self.depth,
                constituents,
            });
        }
        self.depth += 1;
    }

    pub(crate) fn missing(&mut self, constituent: &impl fmt::Display, line: usize) {
        self.depth -= 1;
        if self.enabled {
            log::trace!("missing {constituent} on line {line}");
            self.events.push(TraceEvent::Missing {
                depth: self.depth,
                constituent: constituent.to_string(),
                line,
            });
        }
    }

    pub(crate) fn found(&mut self) {
        self.depth -= 1;
        if self.enabled {
            self.events.push(TraceEvent::Found { depth: self.depth });
        }
    }

    pub(crate) fn invalid(&mut self, rule: &str, line: usize, message: Option<String>) {
        if self.enabled {
            log::debug!("invalid {rule} starting on line {line}");
            self.events.push(TraceEvent::Invalid {
                depth: self.depth,
                rule: rule.to_string(),
                line,
                message,
            });
        }
    }

    pub(crate) fn vetoed(&mut self, rule: &str, line: usize) {
        if self.enabled {
            log::debug!("handler rejected {rule} starting on line {line}");
            self.events.push(TraceEvent::Vetoed {
                depth: self.depth,
                rule: rule.to_string(),
                line,
            });
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Sequence {
                depth,
                constituents,
            } => write!(f, "{:w$}{constituents}", "", w = depth * INDENT),
            TraceEvent::Missing {
                depth,
                constituent,
                line,
            } => write!(
                f,
                "{:w$}missing {constituent} on line {line}",
                "",
                w = depth * INDENT
            ),
            TraceEvent::Found { depth } => write!(f, "{:w$}found", "", w = depth * INDENT),
            TraceEvent::Invalid {
                depth,
                rule,
                line,
                message,
            } => {
                write!(
                    f,
                    "{:w$}invalid {rule} starting on line {line}",
                    "",
                    w = depth * INDENT
                )?;
                match message {
                    Some(message) => write!(f, ": {message}"),
                    None => Ok(()),
                }
            }
            TraceEvent::Vetoed { depth, rule, line } => write!(
                f,
                "{:w$}rejected {rule} starting on line {line}",
                "",
                w = depth * INDENT
            ),
        }
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "{event}")?;
        }
        Ok(())
    }
}
