use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

pub const COMMANDS: [&str; 3] = ["/heuristics", "/history", "/reload"];

/// Completion, highlighting and hints for REPL commands and heuristic
/// shortcodes.
#[derive(Clone)]
pub struct ReplHelper {
    candidates: Vec<String>,
}

impl ReplHelper {
    pub fn new<'a>(heuristic_ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut helper = Self {
            candidates: Vec::new(),
        };
        helper.set_heuristics(heuristic_ids);
        helper
    }

    /// Replaces the shortcode candidates after a catalog reload.
    pub fn set_heuristics<'a>(&mut self, heuristic_ids: impl IntoIterator<Item = &'a str>) {
        self.candidates = COMMANDS.iter().map(|c| c.to_string()).collect();
        self.candidates
            .extend(heuristic_ids.into_iter().map(|id| format!("/{id}")));
    }

    fn matching<'s>(&'s self, word: &'s str) -> impl Iterator<Item = &'s String> + 's {
        self.candidates
            .iter()
            .filter(move |candidate| candidate.starts_with(word))
    }
}

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        // Only the first word is a command or shortcode.
        if line.starts_with('/') && !line.contains(char::is_whitespace) {
            let candidates = self
                .matching(line)
                .map(|candidate| Pair {
                    display: candidate.clone(),
                    replacement: format!("{candidate} "),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.starts_with('/') {
            return Borrowed(line);
        }
        let split = line.find(char::is_whitespace).unwrap_or(line.len());
        let (word, rest) = line.split_at(split);
        if self.candidates.iter().any(|c| c == word) {
            Owned(format!("{}{rest}", word.bright_cyan()))
        } else {
            Owned(format!("{}{rest}", word.bright_black()))
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.matching(line)
                .find(|candidate| candidate.len() > line.len())
                .map(|candidate| candidate[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ReplHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::DefaultHistory;

    fn helper() -> ReplHelper {
        ReplHelper::new(["negotiation", "kidnapping"])
    }

    #[test]
    fn test_completes_shortcodes_and_commands() {
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (start, pairs) = helper().complete("/ne", 3, &ctx).unwrap();
        assert_eq!(start, 0);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].replacement, "/negotiation ");

        let (_, pairs) = helper().complete("/h", 2, &ctx).unwrap();
        let names: Vec<_> = pairs.iter().map(|p| p.display.as_str()).collect();
        assert_eq!(names, vec!["/heuristics", "/history"]);
    }

    #[test]
    fn test_no_completion_after_first_word() {
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (_, pairs) = helper().complete("/negotiation /k", 15, &ctx).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_reload_replaces_shortcodes() {
        let mut helper = helper();
        helper.set_heuristics(["trade"]);
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        assert!(helper.complete("/ne", 3, &ctx).unwrap().1.is_empty());
        assert_eq!(helper.hint("/tr", 3, &ctx), Some("ade".to_string()));
    }
}
