//! Event name resolution from noisy header lines.

use crate::error::{AppError, Result};
use crate::models::{HeaderLayout, NameTables};
use crate::services::normalize::contains_hebrew;

/// Canonical event descriptor resolved from a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEvent {
    /// `"{name} {pool_length}"`, or the caller's override verbatim
    pub event_name: String,

    pub pool_length: Option<String>,
}

/// Resolves `"{name} {pool_length}"` descriptors using the configured tables.
pub struct EventNameResolver<'a> {
    tables: &'a NameTables,
    header_includes_gender: bool,
}

impl<'a> EventNameResolver<'a> {
    pub fn new(tables: &'a NameTables) -> Self {
        Self {
            tables,
            header_includes_gender: false,
        }
    }

    /// Treat trailing gender words of a space-joined header as noise.
    pub fn with_trailing_gender(mut self, enabled: bool) -> Self {
        self.header_includes_gender = enabled;
        self
    }

    /// Resolve the event name and pool length of `header_line`.
    ///
    /// An `event_override` is returned as-is without looking at the line.
    pub fn resolve(
        &self,
        header_line: &str,
        layout: HeaderLayout,
        event_override: Option<&str>,
    ) -> Result<ResolvedEvent> {
        if let Some(name) = event_override {
            return Ok(ResolvedEvent {
                event_name: name.to_string(),
                pool_length: None,
            });
        }

        let (root, pool_length) = match layout {
            HeaderLayout::DashJoined => Self::split_dash_joined(header_line),
            HeaderLayout::SpaceJoined => self.split_space_joined(header_line),
        }
        .ok_or_else(|| AppError::parse("event header", format!("no event name in '{header_line}'")))?;

        let name = self.tables.translate(&root).unwrap_or(&root);
        let event_name = match &pool_length {
            Some(pool) => format!("{name} {pool}"),
            None => name.to_string(),
        };

        Ok(ResolvedEvent {
            event_name,
            pool_length,
        })
    }

    /// `"50 גב -1- ..."`: the first dash segment (the last one when the
    /// first holds no name) carries the name, led by the pool length.
    fn split_dash_joined(line: &str) -> Option<(String, Option<String>)> {
        let segments: Vec<&str> = line.split('-').collect();
        let first = segments.first().copied().unwrap_or("");
        let candidate = if strip_event_root(first).is_empty() {
            segments.last().copied().unwrap_or("")
        } else {
            first
        };

        let root = strip_event_root(candidate);
        if root.is_empty() {
            return None;
        }
        let pool_length = candidate.split_whitespace().next().map(str::to_string);
        Some((root, pool_length))
    }

    /// `"... 50 מעורב אישי"`: the last word that is not a pool length,
    /// joined with a preceding Hebrew word, with the pool length right
    /// before it.
    fn split_space_joined(&self, line: &str) -> Option<(String, Option<String>)> {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        let mut end = tokens.len();
        if self.header_includes_gender {
            while end > 0 && self.tables.gender.is_gender_word(tokens[end - 1]) {
                end -= 1;
            }
        }

        let name_idx = (0..end)
            .rev()
            .find(|&i| !is_pool_length(tokens[i]) && !strip_event_root(tokens[i]).is_empty())?;

        let mut start = name_idx;
        if name_idx > 0 {
            let prev = tokens[name_idx - 1];
            if contains_hebrew(prev) && !is_pool_length(prev) {
                start -= 1;
            }
        }

        let root = strip_event_root(&tokens[start..=name_idx].concat());
        let pool_length = start.checked_sub(1).map(|i| tokens[i].to_string());
        Some((root, pool_length))
    }
}

/// Drop digits, dashes, Latin letters and whitespace from a name candidate.
fn strip_event_root(text: &str) -> String {
    text.chars()
        .filter(|c| !(c.is_ascii_digit() || c.is_ascii_alphabetic() || c.is_whitespace() || *c == '-'))
        .collect()
}

fn is_pool_length(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit())
}
