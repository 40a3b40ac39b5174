//! Per-parse configuration.

/// Default limit on rule nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options controlling one parse.
///
/// ```text
/// let options = ParseOptions::default().max_depth(64).require_full_match(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting of rule matches before the parse is aborted.
    pub max_depth: usize,

    /// Whether rule attempts are recorded in the trace.
    pub trace: bool,

    /// Whether input left over after the root matched is an error.
    pub require_full_match: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            trace: true,
            require_full_match: false,
        }
    }
}

impl ParseOptions {
    /// Sets the recursion limit.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enables or disables tracing.
    #[must_use]
    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Requires the root rule to consume the whole input.
    #[must_use]
    pub fn require_full_match(mut self, require: bool) -> Self {
        self.require_full_match = require;
        self
    }
}
