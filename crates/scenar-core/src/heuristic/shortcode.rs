//! Explicit heuristic selection via `/<id>` tokens.

use super::catalog::HeuristicCatalog;

/// The reserved character that introduces a shortcode.
pub const SHORTCODE_PREFIX: char = '/';

/// Scans user input for a shortcode naming a catalog heuristic.
#[derive(Debug, Clone, Copy)]
pub struct ShortcodeMatcher<'a> {
    catalog: &'a HeuristicCatalog,
}

impl<'a> ShortcodeMatcher<'a> {
    pub fn new(catalog: &'a HeuristicCatalog) -> Self {
        Self { catalog }
    }

    /// Returns the id of the first token (left to right) of the form `/<id>`
    /// where `<id>` is a known heuristic. Matching is case-insensitive.
    pub fn find(&self, text: &str) -> Option<&'a str> {
        text.split_whitespace()
            .filter_map(|token| token.strip_prefix(SHORTCODE_PREFIX))
            .map(str::to_lowercase)
            .find_map(|candidate| {
                self.catalog
                    .lookup(&candidate)
                    .ok()
                    .map(|definition| definition.id.as_str())
            })
    }
}
