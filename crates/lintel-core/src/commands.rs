//! Inline disable commands
//!
//! Comments such as
//!
//! ```text
//! // lintel:disable:next force_cast - legacy API
//! // lintel:disable trailing_semicolon duplicate_enum_cases
//! // lintel:enable all
//! ```
//!
//! switch rules off and back on from the comment's position onwards. The
//! `previous`, `this` and `next` modifiers restrict a command to one line.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use rowan::NodeOrToken;

use crate::source::{LineCol, SourceFile};

/// Identifier that matches every rule
pub const ALL_RULES: &str = "all";

const COMMENT_DELIMITER: &str = " - ";

static COMMAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"lintel:(?P<action>[a-z]+)(?::(?P<modifier>[a-z]+))?(?P<rest>[^\n]*)").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Enable,
    Disable,
}

impl Action {
    fn inverse(self) -> Self {
        match self {
            Action::Enable => Action::Disable,
            Action::Disable => Action::Enable,
        }
    }
}

/// Line restriction of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Previous,
    This,
    Next,
}

/// A parsed command comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub action: Action,
    pub rule_ids: BTreeSet<String>,
    /// Where the command takes effect
    pub location: LineCol,
    pub modifier: Option<Modifier>,
    /// Text after the ` - ` delimiter
    pub trailing_comment: Option<String>,
}

impl Command {
    /// Parse the command text starting at `lintel:`
    ///
    /// Returns `None` for unknown actions or modifiers and for commands that
    /// name no rule.
    pub fn parse(text: &str, location: LineCol) -> Option<Self> {
        let captures = COMMAND_PATTERN.captures(text)?;
        let action = match &captures["action"] {
            "enable" => Action::Enable,
            "disable" => Action::Disable,
            _ => return None,
        };
        let modifier = match captures.name("modifier").map(|m| m.as_str()) {
            None => None,
            Some("previous") => Some(Modifier::Previous),
            Some("this") => Some(Modifier::This),
            Some("next") => Some(Modifier::Next),
            Some(_) => return None,
        };

        let rest = &captures["rest"];
        // Commands need whitespace between the verb and the identifiers
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let (ids, trailing_comment) = match rest.split_once(COMMENT_DELIMITER) {
            Some((ids, comment)) => (ids, Some(comment.trim().to_string())),
            None => (rest, None),
        };
        let rule_ids: BTreeSet<String> = ids
            .split_whitespace()
            .filter(|id| *id != "*/")
            .map(str::to_string)
            .collect();
        if rule_ids.is_empty() {
            return None;
        }

        Some(Self {
            action,
            rule_ids,
            location,
            modifier,
            trailing_comment,
        })
    }

    fn applies_to(&self, ids: &[&str]) -> bool {
        self.rule_ids.contains(ALL_RULES) || ids.iter().any(|id| self.rule_ids.contains(*id))
    }

    /// Unmodified commands equivalent to this one
    fn expand(&self) -> Vec<Command> {
        let Some(modifier) = self.modifier else {
            return vec![self.clone()];
        };
        let line = match modifier {
            Modifier::Previous => self.location.line.saturating_sub(1).max(1),
            Modifier::This => self.location.line,
            Modifier::Next => self.location.line + 1,
        };
        let at = |column, action| Command {
            action,
            rule_ids: self.rule_ids.clone(),
            location: LineCol { line, column },
            modifier: None,
            trailing_comment: None,
        };
        vec![at(0, self.action), at(usize::MAX, self.action.inverse())]
    }
}

/// The expanded commands of one file, in source order
#[derive(Debug, Clone, Default)]
pub struct DisabledRegions {
    commands: Vec<Command>,
}

impl DisabledRegions {
    /// Collect commands from the comments of `file`
    pub fn from_file(file: &SourceFile) -> Self {
        let mut commands = Vec::new();
        let tokens = file
            .syntax()
            .descendants_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .filter(|token| token.kind().is_comment());
        for token in tokens {
            let text = token.text();
            let Some(start) = text.find("lintel:") else {
                continue;
            };
            let offset = usize::from(token.text_range().start()) + start;
            match Command::parse(&text[start..], file.line_col(offset)) {
                Some(command) => commands.extend(command.expand()),
                None => tracing::debug!("Ignoring invalid command at offset {}: {}", offset, text),
            }
        }
        Self::from_commands(commands)
    }

    pub fn from_commands(mut commands: Vec<Command>) -> Self {
        commands.sort_by_key(|command| command.location);
        Self { commands }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether a rule known under `ids` is disabled at `location`
    pub fn is_disabled(&self, ids: &[&str], location: LineCol) -> bool {
        self.commands
            .iter()
            .take_while(|command| command.location <= location)
            .filter(|command| command.applies_to(ids))
            .last()
            .is_some_and(|command| command.action == Action::Disable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize, column: usize) -> LineCol {
        LineCol { line, column }
    }

    #[test]
    fn test_parse_command() {
        let command = Command::parse(
            "lintel:disable:next force_cast trailing_semicolon - legacy code",
            at(3, 4),
        )
        .unwrap();
        assert_eq!(command.action, Action::Disable);
        assert_eq!(command.modifier, Some(Modifier::Next));
        assert_eq!(
            command.rule_ids.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["force_cast", "trailing_semicolon"]
        );
        assert_eq!(command.trailing_comment.as_deref(), Some("legacy code"));
    }

    #[test]
    fn test_invalid_commands() {
        assert!(Command::parse("lintel:ignore foo", at(1, 1)).is_none());
        assert!(Command::parse("lintel:disable:later foo", at(1, 1)).is_none());
        assert!(Command::parse("lintel:disable", at(1, 1)).is_none());
        assert!(Command::parse("lintel:disable */", at(1, 1)).is_none());
    }

    #[test]
    fn test_block_region() {
        let file = SourceFile::parse(
            "a;\n// lintel:disable trailing_semicolon\nb;\n// lintel:enable trailing_semicolon\nc;\n",
        );
        let regions = DisabledRegions::from_file(&file);
        let ids = ["trailing_semicolon"];
        assert!(!regions.is_disabled(&ids, at(1, 2)));
        assert!(regions.is_disabled(&ids, at(3, 2)));
        assert!(!regions.is_disabled(&ids, at(5, 2)));
        assert!(!regions.is_disabled(&["other_rule"], at(3, 2)));
    }

    #[test]
    fn test_line_modifiers() {
        let file = SourceFile::parse(
            "// lintel:disable:next all\nx;\ny; // lintel:disable:this trailing_semicolon\nz;\n// lintel:disable:previous trailing_semicolon\n",
        );
        let regions = DisabledRegions::from_file(&file);
        let ids = ["trailing_semicolon"];
        assert!(regions.is_disabled(&ids, at(2, 2)));
        assert!(regions.is_disabled(&["anything"], at(2, 2)));
        assert!(regions.is_disabled(&ids, at(3, 2)));
        assert!(regions.is_disabled(&ids, at(4, 2)));
        assert!(!regions.is_disabled(&["anything"], at(4, 2)));
    }

    #[test]
    fn test_aliases_match_commands() {
        let regions = DisabledRegions::from_commands(vec![
            Command::parse("lintel:disable old_name", at(1, 1)).unwrap(),
        ]);
        assert!(regions.is_disabled(&["new_name", "old_name"], at(2, 1)));
        assert!(!regions.is_disabled(&["new_name"], at(2, 1)));
    }
}
