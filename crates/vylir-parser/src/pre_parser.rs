use crate::config::{EntityKind, PreParserConfig};
use crate::tokens::{tokenize, Token, TokenKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use vylir_core::{CompileError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreParseOutput {
    /// Declared contract and struct names, keyed by name.
    pub entity_kinds: IndexMap<String, EntityKind>,
    /// Function names listed by `unlock [...]` directives, in source order.
    pub unlocked_functions: Vec<String>,
    /// The rewritten source, ready for the host parser.
    pub source: String,
}

/// Pre-parses `source` against the crate's own compiler version.
pub fn pre_parse(source: &str) -> Result<PreParseOutput> {
    pre_parse_with_config(source, &PreParserConfig::default())
}

pub fn pre_parse_with_config(source: &str, config: &PreParserConfig) -> Result<PreParseOutput> {
    let tokens = tokenize(source)?;
    let mut pre_parser = PreParser::new(source, config);
    for token in &tokens {
        pre_parser.process(token)?;
    }
    pre_parser.finish()
}

/// Checks a `@version` pragma comment body against the compiler version. Only major and minor
/// must agree.
pub fn validate_version_pragma(
    pragma: &str,
    start: (usize, usize),
    compiler_version: &str,
) -> Result<()> {
    let file_version = pragma.split("@version").nth(1).unwrap_or_default().trim();
    let file = parse_version(file_version, start)?;
    let compiler = parse_version(compiler_version, start)?;

    if file != compiler {
        return Err(version_error(
            format!(
                "File version \"{}\" is not compatible with compiler version \"{}\"",
                file_version, compiler_version
            ),
            start,
        ));
    }
    Ok(())
}

/// `<digits>.<digits>.<word>`, yielding the major and minor digit strings as written, so `0.01`
/// and `0.1` do not match.
fn parse_version(version: &str, start: (usize, usize)) -> Result<(&str, &str)> {
    let invalid = || version_error(format!("Could not parse given version string \"{}\"", version), start);

    let mut parts = version.splitn(3, '.');
    let (major, minor, patch) = match (parts.next(), parts.next(), parts.next()) {
        (Some(major), Some(minor), Some(patch)) => (major, minor, patch),
        _ => return Err(invalid()),
    };
    let is_number = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !is_number(major)
        || !is_number(minor)
        || !patch.chars().all(|c| c.is_alphanumeric() || c == '_')
    {
        return Err(invalid());
    }
    Ok((major, minor))
}

fn version_error(message: String, (line, column): (usize, usize)) -> CompileError {
    CompileError::Version {
        message,
        line,
        column,
    }
}

fn syntax_error(message: impl Into<String>, (line, column): (usize, usize)) -> CompileError {
    CompileError::Syntax {
        message: message.into(),
        line,
        column,
    }
}

/// Progress through an `unlock [a, b]` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnlockState {
    Idle,
    ExpectOpen,
    ExpectName,
    ExpectSeparator,
    ExpectNewline,
}

struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

struct PreParser<'a> {
    source: &'a str,
    config: &'a PreParserConfig,
    entity_kinds: IndexMap<String, EntityKind>,
    unlocked_functions: Vec<String>,
    pending_entity: Option<EntityKind>,
    unlock: UnlockState,
    directive_start: usize,
    at_line_start: bool,
    edits: Vec<Edit>,
}

impl<'a> PreParser<'a> {
    fn new(source: &'a str, config: &'a PreParserConfig) -> Self {
        Self {
            source,
            config,
            entity_kinds: IndexMap::new(),
            unlocked_functions: Vec::new(),
            pending_entity: None,
            unlock: UnlockState::Idle,
            directive_start: 0,
            at_line_start: true,
            edits: Vec::new(),
        }
    }

    fn process(&mut self, token: &Token) -> Result<()> {
        if self.unlock != UnlockState::Idle {
            return self.process_unlock(token);
        }

        let line_start = self.at_line_start;
        self.at_line_start = match token.kind {
            TokenKind::Newline => true,
            TokenKind::Nl | TokenKind::Comment => line_start,
            _ => false,
        };

        match token.kind {
            TokenKind::Comment if token.text.contains("@version") => {
                validate_version_pragma(&token.text[1..], token.start, &self.config.compiler_version)
            }
            TokenKind::Name => self.process_name(token, line_start),
            TokenKind::Op if token.text == self.config.banned_separator => {
                let message = if token.text == ";" {
                    "Semi-colon statements not allowed".to_string()
                } else {
                    format!("Statement separator \"{}\" not allowed", token.text)
                };
                Err(syntax_error(message, token.start))
            }
            _ => Ok(()),
        }
    }

    fn process_name(&mut self, token: &Token, line_start: bool) -> Result<()> {
        let at_column_zero = token.start.1 == 0;

        if at_column_zero && token.text == "class" {
            let keywords = self
                .config
                .entity_keywords
                .keys()
                .map(|k| format!("`{}`", k))
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(syntax_error(
                format!("The `class` keyword is not allowed. Perhaps you meant {}?", keywords),
                token.start,
            ));
        }

        if line_start && token.text == self.config.unlock_keyword {
            trace!(line = token.start.0, "entering unlock directive");
            self.unlock = UnlockState::ExpectOpen;
            self.directive_start = token.span.0;
            return Ok(());
        }

        if let Some(kind) = self.pending_entity.take() {
            debug!(name = %token.text, %kind, "recorded entity declaration");
            self.entity_kinds.insert(token.text.clone(), kind);
        }

        if at_column_zero {
            if let Some(kind) = self.config.entity_kind(&token.text) {
                self.edits.push(Edit {
                    start: token.span.0,
                    end: token.span.1,
                    replacement: "class".to_string(),
                });
                self.pending_entity = Some(kind);
            }
        }
        Ok(())
    }

    fn process_unlock(&mut self, token: &Token) -> Result<()> {
        use UnlockState::*;

        let next = match (self.unlock, token.kind) {
            (_, TokenKind::Comment) | (ExpectName | ExpectSeparator, TokenKind::Nl) => self.unlock,
            (ExpectOpen, TokenKind::Op) if token.text == "[" => ExpectName,
            (ExpectName, TokenKind::Name) => {
                debug!(function = %token.text, "unlocked function");
                self.unlocked_functions.push(token.text.clone());
                ExpectSeparator
            }
            (ExpectSeparator, TokenKind::Op) if token.text == "," => ExpectName,
            (ExpectName | ExpectSeparator, TokenKind::Op) if token.text == "]" => ExpectNewline,
            (ExpectNewline, TokenKind::Newline) => {
                self.blank_directive(token.span.1);
                self.at_line_start = true;
                Idle
            }
            (state, _) => return Err(self.unlock_error(state, token)),
        };
        self.unlock = next;
        Ok(())
    }

    /// Drops the directive text but keeps its line breaks so later line numbers do not shift.
    fn blank_directive(&mut self, end: usize) {
        let replacement = self.source[self.directive_start..end]
            .chars()
            .filter(|c| matches!(c, '\n' | '\r'))
            .collect();
        self.edits.push(Edit {
            start: self.directive_start,
            end,
            replacement,
        });
    }

    fn unlock_error(&self, state: UnlockState, token: &Token) -> CompileError {
        let keyword = &self.config.unlock_keyword;
        let found = match token.kind {
            TokenKind::Newline | TokenKind::Nl => "end of line".to_string(),
            TokenKind::EndMarker => "end of file".to_string(),
            _ => format!("\"{}\"", token.text),
        };
        let expected = match state {
            UnlockState::ExpectOpen => format!("'[' after `{}`", keyword),
            UnlockState::ExpectName => "a function name".to_string(),
            UnlockState::ExpectSeparator => "',' or ']'".to_string(),
            UnlockState::ExpectNewline | UnlockState::Idle => "end of line".to_string(),
        };
        syntax_error(
            format!("Malformed `{}` directive: expected {}, found {}", keyword, expected, found),
            token.start,
        )
    }

    fn finish(self) -> Result<PreParseOutput> {
        let mut source = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for edit in &self.edits {
            source.push_str(&self.source[cursor..edit.start]);
            source.push_str(&edit.replacement);
            cursor = edit.end;
        }
        source.push_str(&self.source[cursor..]);

        Ok(PreParseOutput {
            entity_kinds: self.entity_kinds,
            unlocked_functions: self.unlocked_functions,
            source,
        })
    }
}
