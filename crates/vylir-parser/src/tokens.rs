use pest::Parser;
use pest_derive::Parser;
use serde::{Deserialize, Serialize};
use vylir_core::{CompileError, Result};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct SourceLexer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Name,
    Number,
    String,
    Op,
    Comment,
    /// End of a logical line.
    Newline,
    /// Line break that does not end a logical line: blank lines, comment-only lines and breaks
    /// inside brackets.
    Nl,
    EndMarker,
}

/// A lexical token. Lines are one-based, columns zero-based and counted in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: (usize, usize),
    pub end: (usize, usize),
    /// The physical line the token starts on.
    pub line: String,
    /// Byte offsets into the source.
    pub span: (usize, usize),
}

impl Token {
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Op && self.text == op
    }

    pub fn is_name(&self, name: &str) -> bool {
        self.kind == TokenKind::Name && self.text == name
    }
}

fn syntax_error(message: impl Into<String>, (line, column): (usize, usize)) -> CompileError {
    CompileError::Syntax {
        message: message.into(),
        line,
        column,
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut pairs = SourceLexer::parse(Rule::file, source).map_err(|e| {
        let (line, column) = match e.line_col {
            pest::error::LineColLocation::Pos(pos) => pos,
            pest::error::LineColLocation::Span(start, _) => start,
        };
        syntax_error(e.variant.message().to_string(), (line, column.saturating_sub(1)))
    })?;
    let file = pairs
        .next()
        .ok_or_else(|| CompileError::panic("lexer produced no file rule"))?;

    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut line_has_content = false;

    for pair in file.into_inner() {
        let span = pair.as_span();
        let (start_line, start_col) = span.start_pos().line_col();
        let (end_line, end_col) = span.end_pos().line_col();
        let start = (start_line, start_col - 1);
        let end = (end_line, end_col - 1);
        let text = span.as_str();

        let kind = match pair.as_rule() {
            Rule::newline => {
                if depth > 0 || !line_has_content {
                    TokenKind::Nl
                } else {
                    line_has_content = false;
                    TokenKind::Newline
                }
            }
            Rule::comment => TokenKind::Comment,
            Rule::string => TokenKind::String,
            Rule::number => TokenKind::Number,
            Rule::name => TokenKind::Name,
            Rule::operator => {
                match text {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    _ => {}
                }
                TokenKind::Op
            }
            Rule::unterminated_string => {
                let message = if text.ends_with("\"\"\"") || text.ends_with("'''") {
                    "EOF in multi-line string"
                } else {
                    "unterminated string literal"
                };
                return Err(syntax_error(message, start));
            }
            Rule::invalid => {
                let message = if text == "\\" {
                    "unexpected character after line continuation character".to_string()
                } else {
                    format!("invalid character {:?} in source", text)
                };
                return Err(syntax_error(message, start));
            }
            _ => continue,
        };

        if !matches!(kind, TokenKind::Newline | TokenKind::Nl | TokenKind::Comment) {
            line_has_content = true;
        }

        tokens.push(Token {
            kind,
            text: text.to_string(),
            start,
            end,
            line: span.start_pos().line_of().to_string(),
            span: (span.start(), span.end()),
        });
    }

    let eof_line = source.lines().count() + 1;
    if depth > 0 {
        return Err(syntax_error("EOF in multi-line statement", (eof_line, 0)));
    }

    let eof = tokens
        .last()
        .map(|t| (t.end, t.span.1))
        .unwrap_or(((1, 0), 0));
    if line_has_content {
        tokens.push(Token {
            kind: TokenKind::Newline,
            text: String::new(),
            start: eof.0,
            end: eof.0,
            line: String::new(),
            span: (eof.1, eof.1),
        });
    }
    tokens.push(Token {
        kind: TokenKind::EndMarker,
        text: String::new(),
        start: (eof_line, 0),
        end: (eof_line, 0),
        line: String::new(),
        span: (source.len(), source.len()),
    });

    Ok(tokens)
}
