//! The matching engine.
//!
//! A recursive-descent interpreter over a [`Grammar`]. All state of one parse
//! lives in a [`Matcher`]: the cursor, the compiled pattern cache, the parse
//! tree arena and the trace. Every function that can consume input either
//! succeeds with the cursor advanced exactly past what it consumed, or fails
//! leaving it where it found it. Failure to match is `Ok(None)`; `Err` is
//! reserved for conditions that abort the whole parse.
//!
//! Backtracking happens in two places: [`Matcher::match_alternatives`]
//! restores its snapshot after every failed alternative, and
//! [`Matcher::match_one`] restores the rule's entry snapshot when a
//! non-terminal fails or its handler vetoes the match. Sequences themselves
//! never restore.

use regex::Regex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::cursor::{Cursor, Snapshot};
use crate::error::{ParseError, Result};
use crate::grammar::{
    Constituent, Grammar, GrammarError, NonTerminal, Quantifier, Rule, RuleKind, Terminal,
};
use crate::location::Location;
use crate::trace::Trace;
use crate::tree::{ParseTree, PartId};

/// Compiled terminal patterns keyed by rule name, valid for one parse.
#[derive(Debug, Default)]
pub(crate) struct PatternCache {
    compiled: HashMap<String, Regex>,
}

impl PatternCache {
    /// Returns the anchored regex for `rule`, compiling it on first use.
    pub(crate) fn get(&mut self, rule: &str, pattern: &str) -> Result<&Regex> {
        match self.compiled.entry(rule.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(anchored(rule, pattern)?)),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.compiled.len()
    }
}

/// Compiles `pattern` so it only matches at the start of the haystack.
///
/// The pattern is wrapped in a non-capturing group, which keeps its capture
/// group numbering and scopes any inline flags it sets.
pub(crate) fn anchored(rule: &str, pattern: &str) -> std::result::Result<Regex, GrammarError> {
    if pattern.is_empty() {
        return Err(GrammarError::InvalidPattern {
            rule: rule.to_string(),
            message: "pattern is empty".to_string(),
        });
    }
    Regex::new(&format!("^(?:{pattern})")).map_err(|e| GrammarError::InvalidPattern {
        rule: rule.to_string(),
        message: e.to_string(),
    })
}

/// Mutable state of a single parse.
pub(crate) struct Matcher<'g, 'i, M> {
    grammar: &'g Grammar<M>,
    input: &'i str,
    cursor: Cursor,
    patterns: PatternCache,
    tree: ParseTree,
    trace: Trace,
    parent: Option<PartId>,
    depth: usize,
    max_depth: usize,
    furthest: usize,
}

impl<'g, 'i, M> Matcher<'g, 'i, M> {
    pub(crate) fn new(
        grammar: &'g Grammar<M>,
        input: &'i str,
        max_depth: usize,
        trace: bool,
    ) -> Self {
        Self {
            grammar,
            input,
            cursor: Cursor::default(),
            patterns: PatternCache::default(),
            tree: ParseTree::new(),
            trace: Trace::new(trace),
            parent: None,
            depth: 0,
            max_depth,
            furthest: 0,
        }
    }

    pub(crate) fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Furthest offset any terminal has matched up to.
    pub(crate) fn furthest(&self) -> usize {
        self.furthest
    }

    pub(crate) fn into_parts(self) -> (ParseTree, Trace) {
        (self.tree, self.trace)
    }

    pub(crate) fn set_root(&mut self, id: PartId) {
        self.tree.set_root(id);
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            cursor: self.cursor,
            parts: self.tree.len(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.cursor = snapshot.cursor;
        self.tree.truncate(snapshot.parts);
    }

    /// Attempts rule `name` at the cursor.
    pub(crate) fn match_one(&mut self, name: &str, model: &mut M) -> Result<Option<PartId>> {
        if self.cursor.at_end(self.input) {
            return Ok(None);
        }
        let grammar = self.grammar;
        let rule = grammar.get(name).ok_or_else(|| GrammarError::UndefinedRule {
            rule: name.to_string(),
            referenced_by: self.parent.map_or_else(
                || "<root>".to_string(),
                |id| self.tree.part(id).name().to_string(),
            ),
        })?;

        if self.depth >= self.max_depth {
            return Err(ParseError::RecursionLimit {
                rule: name.to_string(),
                limit: self.max_depth,
                location: Location::resolve(self.input, self.cursor.offset()),
            });
        }

        self.depth += 1;
        let matched = match &rule.kind {
            RuleKind::Terminal(terminal) => self.match_terminal(rule, terminal),
            RuleKind::NonTerminal(non_terminal) => {
                self.match_non_terminal(rule, non_terminal, model)
            }
        };
        self.depth -= 1;
        matched
    }

    fn match_terminal(&mut self, rule: &Rule<M>, terminal: &Terminal) -> Result<Option<PartId>> {
        let input = self.input;
        let start = self.cursor.offset();
        let groups: Vec<&'i str> = {
            let regex = self.patterns.get(&rule.name, &terminal.pattern)?;
            match regex.captures(&input[start..]) {
                Some(captures) => captures
                    .iter()
                    .map(|group| group.map_or("", |m| m.as_str()))
                    .collect(),
                None => return Ok(None),
            }
        };

        if let Some(validator) = &terminal.validator {
            if let Err(message) = validator(groups.as_slice()) {
                self.trace.invalid(&rule.name, self.cursor.line(), message);
                return Ok(None);
            }
        }

        let consumed = groups[0];
        let value = match &terminal.formatter {
            Some(formatter) => formatter(groups.as_slice()),
            None => consumed.to_string(),
        };
        self.cursor.advance(consumed);
        let end = self.cursor.offset();
        self.furthest = self.furthest.max(end);

        Ok(Some(self.tree.push_terminal(
            &rule.name,
            start..end,
            rule.ignore,
            self.parent,
            value,
        )))
    }

    fn match_non_terminal(
        &mut self,
        rule: &Rule<M>,
        non_terminal: &NonTerminal<M>,
        model: &mut M,
    ) -> Result<Option<PartId>> {
        let entry = self.snapshot();
        let id = self
            .tree
            .reserve(&rule.name, self.cursor.offset(), rule.ignore, self.parent);

        let outer = self.parent.replace(id);
        let children = self.match_alternatives(&non_terminal.alternatives, model);
        self.parent = outer;

        let Some(children) = children? else {
            self.restore(entry);
            return Ok(None);
        };
        self.tree.complete(id, self.cursor.offset(), children);

        if let Some(handler) = &non_terminal.handler {
            if !handler(self.tree.get(id), model) {
                self.trace.vetoed(&rule.name, entry.cursor.line());
                self.restore(entry);
                return Ok(None);
            }
        }

        Ok(Some(id))
    }

    /// Ordered choice: the first alternative that matches wins.
    pub(crate) fn match_alternatives(
        &mut self,
        alternatives: &[Vec<Constituent>],
        model: &mut M,
    ) -> Result<Option<Vec<PartId>>> {
        for sequence in alternatives {
            let snapshot = self.snapshot();
            if let Some(children) = self.match_sequence(sequence, model)? {
                return Ok(Some(children));
            }
            self.restore(snapshot);
        }
        Ok(None)
    }

    /// Matches each constituent in order. Leaves the cursor wherever the
    /// failing constituent stopped; restoring is the caller's job.
    pub(crate) fn match_sequence(
        &mut self,
        sequence: &[Constituent],
        model: &mut M,
    ) -> Result<Option<Vec<PartId>>> {
        self.trace.sequence(sequence);
        let mut children = Vec::new();

        for constituent in sequence {
            let matched = match constituent.quantifier {
                Quantifier::One | Quantifier::Optional => {
                    self.match_one(&constituent.rule, model)?
                        .into_iter()
                        .collect()
                }
                Quantifier::ZeroOrMore | Quantifier::OneOrMore => {
                    self.match_many(&constituent.rule, model)?
                }
            };

            let required = matches!(
                constituent.quantifier,
                Quantifier::One | Quantifier::OneOrMore
            );
            if required && matched.is_empty() {
                self.trace.missing(constituent, self.cursor.line());
                return Ok(None);
            }

            let ignored = matched
                .first()
                .is_some_and(|&id| self.tree.part(id).is_ignored());
            if !ignored {
                children.extend(matched);
            }
        }

        self.trace.found();
        Ok(Some(children))
    }

    /// Repeats `name` until it fails or stops consuming input.
    fn match_many(&mut self, name: &str, model: &mut M) -> Result<Vec<PartId>> {
        let mut matched = Vec::new();
        loop {
            let before = self.cursor.offset();
            let Some(id) = self.match_one(name, model)? else {
                break;
            };
            matched.push(id);
            if self.cursor.offset() == before {
                break;
            }
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceEvent;

    fn run<M>(
        grammar: &Grammar<M>,
        input: &str,
        model: &mut M,
    ) -> (Option<PartId>, usize, ParseTree) {
        let mut matcher = Matcher::new(grammar, input, 64, true);
        let id = matcher.match_one(&grammar.root, model).unwrap();
        let offset = matcher.cursor().offset();
        let (tree, _) = matcher.into_parts();
        (id, offset, tree)
    }

    #[test]
    fn test_terminal_is_anchored_at_cursor() {
        let grammar: Grammar<()> =
            Grammar::new("t", "NUMBER").rule(Rule::terminal("NUMBER", "[0-9]+"));
        let (id, offset, _) = run(&grammar, "ab12", &mut ());
        assert!(id.is_none());
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_failed_alternative_restores_cursor() {
        // "ab" consumes "a" before failing on "b"; the rule must report no
        // match with the cursor back at 0.
        let grammar: Grammar<()> = Grammar::new("t", "word")
            .rule(Rule::non_terminal("word", [["a", "b"], ["a", "c"]]))
            .rule(Rule::terminal("a", "a"))
            .rule(Rule::terminal("b", "b"))
            .rule(Rule::terminal("c", "c"));

        let (id, offset, tree) = run(&grammar, "ax", &mut ());
        assert!(id.is_none());
        assert_eq!(offset, 0);
        assert_eq!(tree.len(), 0);

        let (id, offset, tree) = run(&grammar, "ac", &mut ());
        let word = tree.get(id.unwrap());
        assert_eq!(offset, 2);
        assert_eq!(word.values(), ["a", "c"]);
    }

    #[test]
    fn test_ordered_choice_prefers_first() {
        let grammar: Grammar<()> = Grammar::new("t", "token")
            .rule(Rule::non_terminal("token", [["word"], ["ident"]]))
            .rule(Rule::terminal("word", "[a-z]+"))
            .rule(Rule::terminal("ident", "[a-z][a-z0-9]*"));

        let (id, _, tree) = run(&grammar, "abc", &mut ());
        let token = tree.get(id.unwrap());
        assert_eq!(token.children().next().unwrap().name(), "word");
    }

    #[test]
    fn test_quantifiers() {
        let grammar: Grammar<()> = Grammar::new("t", "start")
            .rule(Rule::non_terminal("start", [["x*", "y?", "z+"]]))
            .rule(Rule::terminal("x", "x"))
            .rule(Rule::terminal("y", "y"))
            .rule(Rule::terminal("z", "z"));

        let (id, offset, tree) = run(&grammar, "zz", &mut ());
        assert_eq!(tree.get(id.unwrap()).values(), ["z", "z"]);
        assert_eq!(offset, 2);

        let (id, _, tree) = run(&grammar, "xxyz", &mut ());
        assert_eq!(tree.get(id.unwrap()).values(), ["x", "x", "y", "z"]);

        let (id, offset, _) = run(&grammar, "xxy", &mut ());
        assert!(id.is_none());
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_ignored_children_consume_input() {
        let grammar: Grammar<()> = Grammar::new("t", "pair")
            .rule(Rule::non_terminal("pair", [["word", "ws", "word"]]))
            .rule(Rule::terminal("word", "[a-z]+"))
            .rule(Rule::terminal("ws", r"\s+").ignored());

        let (id, offset, tree) = run(&grammar, "ab   cd", &mut ());
        let pair = tree.get(id.unwrap());
        assert_eq!(offset, 7);
        assert_eq!(pair.children().count(), 2);
        assert_eq!(pair.values(), ["ab", "cd"]);
    }

    #[test]
    fn test_pattern_cache_reuses_compilation() {
        let grammar: Grammar<()> = Grammar::new("t", "list")
            .rule(Rule::non_terminal("list", [["d+"]]))
            .rule(Rule::terminal("d", "[0-9]"));

        let mut matcher = Matcher::new(&grammar, "123", 64, false);
        let id = matcher.match_one("list", &mut ()).unwrap().unwrap();
        assert_eq!(matcher.patterns.len(), 1);
        let (tree, _) = matcher.into_parts();
        assert_eq!(tree.get(id).values(), ["1", "2", "3"]);
    }

    #[test]
    fn test_validator_rejection_is_no_match() {
        let grammar: Grammar<()> = Grammar::new("t", "NUMBER").rule(
            Rule::terminal("NUMBER", "[0-9]+").validate(|groups| match groups[0].parse::<u32>() {
                Ok(n) if n <= 99 => Ok(()),
                _ => Err(Some(format!("{} is greater than 99", groups[0]))),
            }),
        );

        let mut matcher = Matcher::new(&grammar, "150", 64, true);
        assert!(matcher.match_one("NUMBER", &mut ()).unwrap().is_none());
        assert_eq!(matcher.cursor().offset(), 0);
        let (_, trace) = matcher.into_parts();
        assert_eq!(
            trace.to_string(),
            "invalid NUMBER starting on line 1: 150 is greater than 99\n"
        );
    }

    #[test]
    fn test_validator_rejection_without_message() {
        let grammar: Grammar<()> = Grammar::new("t", "lines")
            .rule(Rule::non_terminal("lines", [["NL", "WORD"]]))
            .rule(Rule::terminal("NL", "\n"))
            .rule(Rule::terminal("WORD", "[a-z]+").validate(|groups| {
                if groups[0] == "reserved" {
                    Err(None)
                } else {
                    Ok(())
                }
            }));

        let mut matcher = Matcher::new(&grammar, "\nreserved", 64, true);
        assert!(matcher.match_one("lines", &mut ()).unwrap().is_none());
        let (_, trace) = matcher.into_parts();
        assert!(trace.events().iter().any(|event| matches!(
            event,
            TraceEvent::Invalid { rule, line: 2, message: None, .. } if rule == "WORD"
        )));
        assert!(trace
            .to_string()
            .lines()
            .any(|line| line.trim_start() == "invalid WORD starting on line 2"));
    }

    #[test]
    fn test_formatter_uses_capture_groups() {
        let grammar: Grammar<()> = Grammar::new("t", "quoted")
            .rule(
                Rule::terminal("quoted", r#""([^"]*)""#)
                    .format(|groups| groups[1].to_uppercase()),
            );

        let (id, offset, tree) = run(&grammar, "\"hi\" rest", &mut ());
        assert_eq!(tree.get(id.unwrap()).value(), Some("HI"));
        assert_eq!(offset, 4);
    }

    #[test]
    fn test_handler_veto_tries_next_alternative() {
        let grammar: Grammar<Vec<String>> = Grammar::new("t", "entry")
            .rule(Rule::non_terminal("entry", [["keyword"], ["name"]]))
            .rule(
                Rule::non_terminal("keyword", [["WORD"]]).handle(|part, model: &mut Vec<String>| {
                    let word = part.values()[0];
                    if word == "if" || word == "else" {
                        model.push(format!("keyword {word}"));
                        true
                    } else {
                        false
                    }
                }),
            )
            .rule(
                Rule::non_terminal("name", [["WORD"]]).handle(|part, model: &mut Vec<String>| {
                    model.push(format!("name {}", part.values()[0]));
                    true
                }),
            )
            .rule(Rule::terminal("WORD", "[a-z]+"));

        let mut model = Vec::new();
        let (id, offset, tree) = run(&grammar, "total", &mut model);
        assert_eq!(model, ["name total"]);
        assert_eq!(offset, 5);
        let entry = tree.get(id.unwrap());
        assert_eq!(entry.children().next().unwrap().name(), "name");

        let mut model = Vec::new();
        run(&grammar, "if", &mut model);
        assert_eq!(model, ["keyword if"]);
    }

    #[test]
    fn test_handler_veto_restores_entry_state() {
        let grammar: Grammar<()> = Grammar::new("t", "pair")
            .rule(Rule::non_terminal("pair", [["A", "A"]]).handle(|_, _| false))
            .rule(Rule::terminal("A", "a"));

        let mut matcher = Matcher::new(&grammar, "aa\n", 64, true);
        assert!(matcher.match_one("pair", &mut ()).unwrap().is_none());
        assert_eq!(matcher.cursor(), Cursor::default());
        let (tree, trace) = matcher.into_parts();
        assert_eq!(tree.len(), 0);
        assert!(matches!(
            trace.events().last(),
            Some(TraceEvent::Vetoed { rule, .. }) if rule == "pair"
        ));
    }

    #[test]
    fn test_handler_effects_survive_enclosing_failure() {
        let grammar: Grammar<Vec<String>> = Grammar::new("t", "line")
            .rule(Rule::non_terminal("line", [vec!["word", "SEMI"], vec!["WORD"]]))
            .rule(
                Rule::non_terminal("word", [["WORD"]]).handle(|part, model: &mut Vec<String>| {
                    model.push(part.values()[0].to_string());
                    true
                }),
            )
            .rule(Rule::terminal("WORD", "[a-z]+"))
            .rule(Rule::terminal("SEMI", ";"));

        let mut model = Vec::new();
        let (id, offset, tree) = run(&grammar, "abc", &mut model);
        assert_eq!(tree.get(id.unwrap()).children().next().unwrap().name(), "WORD");
        assert_eq!(offset, 3);
        assert_eq!(model, ["abc"]);
    }

    #[test]
    fn test_zero_width_repetition_terminates() {
        let grammar: Grammar<()> = Grammar::new("t", "start")
            .rule(Rule::non_terminal("start", [["blank*", "word"]]))
            .rule(Rule::terminal("blank", " *"))
            .rule(Rule::terminal("word", "[a-z]+"));

        let (id, offset, _) = run(&grammar, "abc", &mut ());
        assert!(id.is_some());
        assert_eq!(offset, 3);
    }

    #[test]
    fn test_end_of_input_stops_matching() {
        let grammar: Grammar<()> = Grammar::new("t", "start")
            .rule(Rule::non_terminal("start", [["word", "tail?"]]))
            .rule(Rule::terminal("word", "[a-z]+"))
            .rule(Rule::terminal("tail", ".*"));

        let mut matcher = Matcher::new(&grammar, "abc", 64, true);
        let id = matcher.match_one("start", &mut ()).unwrap().unwrap();
        let (tree, _) = matcher.into_parts();
        assert_eq!(tree.get(id).children().count(), 1);
    }

    #[test]
    fn test_left_recursion_hits_depth_limit() {
        let grammar: Grammar<()> = Grammar::new("t", "expr")
            .rule(Rule::non_terminal("expr", [vec!["expr", "PLUS", "NUM"], vec!["NUM"]]))
            .rule(Rule::terminal("PLUS", r"\+"))
            .rule(Rule::terminal("NUM", "[0-9]+"));

        let mut matcher = Matcher::new(&grammar, "1+2", 32, false);
        let err = matcher.match_one("expr", &mut ()).unwrap_err();
        assert!(matches!(err, ParseError::RecursionLimit { limit: 32, .. }));
    }

    #[test]
    fn test_line_counter_restored_on_backtrack() {
        let grammar: Grammar<()> = Grammar::new("t", "doc")
            .rule(Rule::non_terminal("doc", [vec!["NL", "NL", "X"], vec!["NL", "Y"]]))
            .rule(Rule::terminal("NL", "\n"))
            .rule(Rule::terminal("X", "x"))
            .rule(Rule::terminal("Y", "y"));

        let mut matcher = Matcher::new(&grammar, "\ny", 64, false);
        assert!(matcher.match_one("doc", &mut ()).unwrap().is_some());
        assert_eq!(matcher.cursor().line(), 2);
        assert_eq!(matcher.cursor().offset(), 2);
    }

    #[test]
    fn test_parent_links() {
        let grammar: Grammar<()> = Grammar::new("t", "outer")
            .rule(Rule::non_terminal("outer", [["inner"]]))
            .rule(Rule::non_terminal("inner", [["x"]]))
            .rule(Rule::terminal("x", "x"));

        let (id, _, tree) = run(&grammar, "x", &mut ());
        let outer = tree.get(id.unwrap());
        let inner = outer.child("inner").unwrap();
        let x = inner.child("x").unwrap();
        assert_eq!(x.parent().unwrap().id(), inner.id());
        assert_eq!(inner.parent().unwrap().id(), outer.id());
        assert!(outer.parent().is_none());
    }
}
