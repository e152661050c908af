use serde::{Deserialize, Serialize};
use std::fmt;

/// Source span of an AST node: one-based line, zero-based column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub end_line: Option<u32>,
    pub end_column: Option<u32>,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            end_line: None,
            end_column: None,
        }
    }

    pub fn with_end(mut self, end_line: u32, end_column: u32) -> Self {
        self.end_line = Some(end_line);
        self.end_column = Some(end_column);
        self
    }

    pub fn extract_snippet(&self, source_code: &str) -> Option<String> {
        let lines: Vec<&str> = source_code.lines().collect();
        let start_line = (self.line as usize).checked_sub(1)?;
        if start_line >= lines.len() {
            return None;
        }

        let end_line = self
            .end_line
            .map(|l| l as usize)
            .unwrap_or(self.line as usize)
            .min(lines.len());

        if start_line + 1 >= end_line {
            Some(lines[start_line].to_string())
        } else {
            Some(lines[start_line..end_line].join("\n"))
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
